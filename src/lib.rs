/// Watchbot - the web API behind a Slack monitoring bot's settings page.
///
/// A team member signs in with Slack, picks which channels and private groups
/// the bot should watch (optionally by name pattern), and saves the selection.
/// The API runs as a single AWS Lambda behind API Gateway:
///
/// - `/login`, `/auth`, `/logout`, `/user`: Slack OAuth sign-in and the encrypted session cookie
/// - `/info`, `/match`, `/save`: read, preview and persist the team's configuration
/// - `/join`: captcha-gated invitation to the community Slack channel
///
/// # Architecture
///
/// The system uses:
/// - AWS Lambda for serverless execution
/// - SSM Parameter Store for team, user and configuration records
/// - SQS to notify the bot of configuration changes
/// - slack-morphism and reqwest for Slack API interactions
/// - Tokio for async runtime
///
/// # Example
///
/// ```no_run
/// use watchbot::api::{AppContext, handler};
///
/// #[tokio::main]
/// async fn main() -> Result<(), lambda_runtime::Error> {
///     watchbot::setup_logging();
///     let ctx = AppContext::from_env().await?;
///     let shared = &ctx;
///     lambda_runtime::run(lambda_runtime::service_fn(move |event| async move {
///         handler(shared, event).await
///     }))
///     .await
/// }
/// ```
// Module declarations
pub mod api;
pub mod clients;
pub mod core;
pub mod errors;
pub mod slack;

pub use errors::ServiceError;

/// Configure structured logging with JSON format for AWS Lambda environments.
///
/// This function sets up tracing-subscriber with a JSON formatter suitable for
/// `CloudWatch` Logs integration, filtered by `RUST_LOG` (default `info`).
/// Calling it again after a subscriber is installed is a no-op.
///
/// # Example
///
/// ```
/// // Initialize structured logging at the start of your Lambda handler
/// watchbot::setup_logging();
/// ```
pub fn setup_logging() {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().json().with_target(true);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
