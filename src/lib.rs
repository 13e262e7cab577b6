//! Ledgerscan digitizes photographed material in/out ledgers.
//!
//! A batch of ledger photos runs through a fixed per-task chain: sensitive
//! regions are redacted ([`pipeline::masking`]), the masked page goes to a
//! vision-language service that reads the table ([`pipeline::gemini`]), and
//! the service's variable-width rows are flattened into uniform records
//! ([`pipeline::normalize`]). The [`pipeline::batch`] coordinator fans tasks
//! over a bounded worker pool with per-task failure isolation and returns a
//! single [`pipeline::BatchOutcome`], which boundary layers serialize, export
//! as CSV ([`export`]), or persist ([`session`]).

pub mod config;
pub mod discover;
pub mod export;
pub mod pipeline;
pub mod session;

use tracing_subscriber::EnvFilter;

/// Initialize tracing for an embedding application. `RUST_LOG` wins;
/// otherwise the crate's default filter applies.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();
}
