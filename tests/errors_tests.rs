use std::error::Error;
use watchbot::api::error::{HandlerError, HttpError};
use watchbot::errors::ServiceError;

#[test]
fn test_service_error_implements_error_trait() {
    // Verify ServiceError implements the Error trait
    fn assert_error<T: Error>(_: &T) {}

    let error = ServiceError::ParseError("test error".to_string());
    assert_error(&error);
    assert_error(&HttpError::bad_request());
}

#[test]
fn test_service_error_display() {
    let error = ServiceError::ApiError("invalid_auth".to_string());
    assert_eq!(format!("{error}"), "Failed to access Slack API: invalid_auth");

    let error = ServiceError::AwsError("throttled".to_string());
    assert_eq!(
        format!("{error}"),
        "Failed to interact with AWS services: throttled"
    );

    let error = ServiceError::HttpError("Connection error".to_string());
    assert_eq!(
        format!("{error}"),
        "Failed to send HTTP request: Connection error"
    );
}

#[test]
fn test_service_error_from_conversions() {
    let err = anyhow::anyhow!("test error");
    let service_err: ServiceError = err.into();
    match service_err {
        ServiceError::GeneralError(msg) => assert!(msg.contains("test error")),
        _ => panic!("Unexpected error type"),
    }

    let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    assert!(matches!(
        ServiceError::from(json_err),
        ServiceError::ParseError(_)
    ));

    // Compile-time check that reqwest errors convert
    #[allow(unused)]
    #[allow(clippy::items_after_statements)]
    fn _check_reqwest_conversion(err: reqwest::Error) -> ServiceError {
        ServiceError::from(err)
    }
}

#[test]
fn test_handler_error_status_mapping() {
    let client: HandlerError = HttpError::oauth_err("access_denied").into();
    assert_eq!(client.into_response()["statusCode"], 401);

    let internal: HandlerError = ServiceError::CryptoError("bad tag".to_string()).into();
    assert_eq!(internal.into_response()["statusCode"], 500);
}
