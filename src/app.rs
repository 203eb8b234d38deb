use std::net::SocketAddr;

use axum::{middleware, routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::routes::{auth, extractors, roles, users};
use crate::state::AppState;

pub fn build_app(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(|| async { "ok" }))
        .merge(auth::public_routes());

    let protected = Router::new()
        .merge(auth::protected_routes())
        .merge(users::user_routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            extractors::require_token,
        ));

    let admin = roles::role_routes().route_layer(middleware::from_fn_with_state(
        state.clone(),
        extractors::require_admin,
    ));

    Router::new()
        .merge(public)
        .merge(protected)
        .merge(admin)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     _latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::info!(%status, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router, host: &str, port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{host}:{port}").parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
