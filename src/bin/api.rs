use watchbot::api::{AppContext, handler};

#[tokio::main]
async fn main() -> Result<(), lambda_runtime::Error> {
    watchbot::setup_logging();

    let ctx = AppContext::from_env()
        .await
        .map_err(|e| lambda_runtime::Error::from(format!("Config error: {e}")))?;
    let shared = &ctx;

    lambda_runtime::run(lambda_runtime::service_fn(
        move |event| async move { handler(shared, event).await },
    ))
    .await
}
