//! DesignGym · Low-Level Design Practice Backend
//!
//! - Axum HTTP API for problems, leveled submissions, and AI grading
//! - Optional Gemini integration (via environment variables)
//! - Static SPA fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT          : u16 (default 3000)
//!   GEMINI_API_KEY    : enables AI grading if present
//!   GEMINI_BASE_URL    : default "https://generativelanguage.googleapis.com/v1beta"
//!   GEMINI_MODEL  : default "gemini-1.5-flash-latest"
//!   APP_CONFIG_PATH  : path to TOML config (grading prompt + optional problem bank)
//!   LOG_LEVEL    : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT      : "pretty" (default) or "json"

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, instrument};

use designgym_backend::routes::build_router;
use designgym_backend::state::AppState;
use designgym_backend::telemetry;

#[instrument(level = "info", skip_all)]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  // Build shared application state (in-memory stores, grading client, prompts).
  let state = Arc::new(AppState::new().await);

  // Build the HTTP router with routes, CORS and tracing layers.
  let app = build_router(state.clone());

  // Read port from env or default to 3000.
  let addr: SocketAddr = std::env::var("PORT")
    .ok()
    .and_then(|p| p.parse::<u16>().ok())
    .map(|port| SocketAddr::from(([0, 0, 0, 0], port)))
    .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000)));

  let listener = TcpListener::bind(addr).await?;
  info!(target: "designgym_backend", %addr, "HTTP server listening");
  axum::serve(listener, app).await?;
  Ok(())
}
