//! Salon Server - appointment scheduling and commission settlement
//!
//! # Modules
//!
//! ```text
//! salon-server/src/
//! ├── core/          # config, state, server
//! ├── auth/          # JWT caller identity
//! ├── db/            # SQLite pool, migrations, repositories
//! ├── scheduling/    # booking ledger, conflicts, commission, facade
//! ├── payments/      # card payment webhook relay
//! ├── api/           # HTTP routes and handlers
//! └── utils/         # logging, validation, time
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod payments;
pub mod scheduling;
pub mod utils;

pub use api::build_app;
pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use db::DbService;
pub use scheduling::{Caller, SchedulingError, SchedulingService};
pub use utils::{AppError, AppResult, ErrorCategory, ErrorCode, ErrorResponse};

pub use utils::logger::{init_logger, init_logger_with_file};

// Security logging macro - supports tracing format specifiers
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}
