//! API Lambda handler and request processing

pub mod conf_handlers;
pub mod context;
pub mod error;
pub mod handler;
pub mod helpers;
pub mod oauth;
pub mod parsing;
pub mod security_handlers;
pub mod session;

// Re-export the main handler for convenience
pub use context::AppContext;
pub use handler::{function_handler as handler, route};
