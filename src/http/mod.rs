//! HTTP service
//!
//! | Route | Handler |
//! |-------|---------|
//! | `GET /api/interactions/:id?mode=&confidence=` | interactions of a protein |
//! | `GET /api/complexes?mode=` | complexes with interaction counts |
//! | `GET /api/complex-interactions/:id?mode=&confidence=` | predictions of a complex |
//! | `GET /api/baits` | bait proteins |
//! | `GET /api/structure/:id` | CIF file of an interaction |
//! | `GET /api/structure/:id/pae` | PAE contact data |
//! | `GET /api/debug` | store diagnostics |

mod error;
mod routes;

pub use error::ApiError;
pub use routes::{FilterParams, IMMUTABLE_CACHE};

use crate::api::InteractomeApi;
use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Build the application router
pub fn router(api: InteractomeApi) -> Router {
    Router::new()
        .route("/api/interactions/:id", get(routes::interactions))
        .route("/api/complexes", get(routes::complexes))
        .route("/api/complex-interactions/:id", get(routes::complex_interactions))
        .route("/api/baits", get(routes::baits))
        .route("/api/structure/:id", get(routes::structure))
        .route("/api/structure/:id/pae", get(routes::pae))
        .route("/api/debug", get(routes::debug))
        .layer(TraceLayer::new_for_http())
        .with_state(api)
}

/// Serve until the listener fails or Ctrl-C is received
pub async fn serve(api: InteractomeApi, bind: &str) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(addr = %listener.local_addr()?, "interactome API listening");

    let server = axum::serve(listener, router(api));
    tokio::select! {
        result = server => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
    }
    Ok(())
}
