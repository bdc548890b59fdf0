//! Minibank is a small demo banking service with customer and banker roles.
//!
//! This library provides a JSON REST API for checking account balances,
//! posting deposit and withdrawal transactions, and browsing transaction
//! history. The balance/transaction consistency logic lives behind the
//! [stores::LedgerStore] trait so that the SQLite backend and the in-memory
//! backend share one contract.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod auth;
mod error;
mod logging;
pub mod models;
mod routes;
mod state;
pub mod stores;

pub use error::Error;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use models::{PasswordHash, ValidatedPassword};
pub use routes::build_router;
pub use state::{AppState, create_cookie_key};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}
