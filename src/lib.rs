//! # Scan History
//!
//! A bounded, self-expiring history of nutrition scans.
//!
//! ## Behaviour
//! - **Expire on load** - records older than eight weeks are dropped when
//!   the history is first read, and storage is healed to match
//! - **Cap on insert** - at most fifty records survive an insert, newest first
//! - **Write-through** - every change is persisted before the call returns
//!
//! ## Architecture
//! - `core` - The history store and persistence backends
//! - `error` - User-friendly error types

pub mod core;
pub mod error;

// Re-export commonly used types at the crate root
pub use error::{HistoryError, Result};

/// Initialize tracing for the library
///
/// This should be called by the application entry point. `default_filter`
/// applies when `RUST_LOG` is unset.
pub fn init_tracing(default_filter: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    // A subscriber may already be installed by an embedding application
    let _ = tracing::subscriber::set_global_default(subscriber);
}
