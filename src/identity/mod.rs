pub mod dto;
pub mod error;
pub mod services;

pub use error::ApiError;
pub use services::IdentityService;
