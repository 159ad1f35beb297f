use crate::appender::{AppendError, Appended, RecordAppender};
use crate::domain::{InvalidPayload, LocationRecord};
use lambda_http::http::header::CONTENT_TYPE;
use lambda_http::http::{HeaderValue, StatusCode};
use lambda_http::{Body, Request, Response};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{error, info, instrument};

pub const RECORD_SAVED: &str = "Record saved successfully";
pub const INVALID_INPUT: &str = "Invalid input payload";
pub const INTERNAL_SERVER_ERROR: &str = "Internal Server Error";

/// Handles one invocation. Every outcome is mapped to a response, so this never fails.
#[instrument(skip_all)]
pub async fn handle(appender: &RecordAppender, request: Request) -> Response<Body> {
    match process(appender, request.body()).await {
        Ok(appended) => {
            info!(entries = appended.entries, caller_reference = ?appended.caller_reference, "✅ Record saved");
            json_response(StatusCode::OK, json!({ "message": RECORD_SAVED }))
        }
        Err(RequestError::InvalidPayload(e)) => {
            info!("Rejected request: {}", e);
            json_response(StatusCode::BAD_REQUEST, json!({ "error": INVALID_INPUT }))
        }
        Err(RequestError::Append(e)) if e.is_persisted() => {
            error!(persisted = true, "❌ Error processing request: {}", e);
            json_response(StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": INTERNAL_SERVER_ERROR }))
        }
        Err(e) => {
            error!("❌ Error processing request: {}", e);
            json_response(StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": INTERNAL_SERVER_ERROR }))
        }
    }
}

async fn process(appender: &RecordAppender, body: &Body) -> Result<Appended, RequestError> {
    let payload = parse_body(body)?;
    let record = LocationRecord::from_payload(&payload)?;
    Ok(appender.append(record).await?)
}

/// An absent body, malformed JSON and a literal `null` are request failures, not invalid payloads.
fn parse_body(body: &Body) -> Result<Value, RequestError> {
    let content = match body {
        Body::Empty => return Err(RequestError::MissingBody),
        Body::Text(text) => text.as_bytes(),
        Body::Binary(bytes) => bytes.as_slice(),
    };

    match serde_json::from_slice(content)? {
        Value::Null => Err(RequestError::NullBody),
        payload => Ok(payload),
    }
}

fn json_response(status: StatusCode, body: Value) -> Response<Body> {
    let mut response = Response::new(Body::from(body.to_string()));
    *response.status_mut() = status;
    response.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

#[derive(Error, Debug)]
pub enum RequestError {
    #[error("request has no body")]
    MissingBody,
    #[error("request body is not valid JSON: {0}")]
    MalformedBody(#[from] serde_json::Error),
    #[error("request body is null")]
    NullBody,
    #[error("invalid payload: {0}")]
    InvalidPayload(#[from] InvalidPayload),
    #[error(transparent)]
    Append(#[from] AppendError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cdn::testing::RecordingInvalidator;
    use crate::storage::testing::RecordingStore;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::sync::Arc;
    use test_log::test;

    const KEY: &str = "locations.json";

    fn request(body: &str) -> Request {
        Request::new(Body::from(body))
    }

    fn body_json(response: &Response<Body>) -> Value {
        match response.body() {
            Body::Text(text) => serde_json::from_str(text).unwrap(),
            Body::Binary(bytes) => serde_json::from_slice(bytes).unwrap(),
            Body::Empty => Value::Null,
        }
    }

    #[test(tokio::test)]
    async fn saves_a_valid_record() {
        let store = Arc::new(RecordingStore::new());
        let appender = RecordAppender::new(store.clone(), KEY);

        let response = handle(&appender, request(r#"{"timestamp":"t1","latitude":1.0,"longitude":2.0}"#)).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(&response), json!({ "message": "Record saved successfully" }));
        assert_eq!(response.headers().get(CONTENT_TYPE).unwrap(), "application/json");
        assert_eq!(store.json(KEY), Some(json!([{ "timestamp": "t1", "latitude": 1.0, "longitude": 2.0 }])));
    }

    #[test(tokio::test)]
    async fn stores_submitted_coordinates_exactly_as_sent() {
        let store = Arc::new(RecordingStore::new());
        let appender = RecordAppender::new(store.clone(), KEY);

        handle(&appender, request(r#"{"timestamp":"t1","latitude":21.770003002833562,"longitude":120.86546748472085}"#)).await;
        let response = handle(&appender, request(r#"{"timestamp":"t2","latitude":52,"longitude":-3}"#)).await;

        assert_eq!(response.status(), StatusCode::OK);
        let content = String::from_utf8(store.document(KEY).unwrap().content).unwrap();
        assert!(content.contains("\"latitude\": 21.770003002833562,"), "{content}");
        assert!(content.contains("\"longitude\": 120.86546748472085\n"), "{content}");
        assert!(content.contains("\"latitude\": 52,"), "{content}");
        assert!(content.contains("\"longitude\": -3\n"), "{content}");
    }

    #[rstest]
    #[case::missing_timestamp(r#"{"latitude":1.0,"longitude":2.0}"#)]
    #[case::empty_timestamp(r#"{"timestamp":"","latitude":1.0,"longitude":2.0}"#)]
    #[case::zero_timestamp(r#"{"timestamp":0,"latitude":1.0,"longitude":2.0}"#)]
    #[case::string_latitude(r#"{"timestamp":"t1","latitude":"1.0","longitude":2.0}"#)]
    #[case::missing_longitude(r#"{"timestamp":"t1","latitude":1.0}"#)]
    #[case::array_body("[]")]
    #[case::string_body(r#""t1""#)]
    #[tokio::test]
    async fn rejects_invalid_input_without_touching_storage(#[case] body: &str) {
        let store = Arc::new(RecordingStore::new().with_document(KEY, "[]"));
        let appender = RecordAppender::new(store.clone(), KEY);

        let response = handle(&appender, request(body)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(&response), json!({ "error": "Invalid input payload" }));
        assert_eq!(store.gets(), 0);
        assert_eq!(store.puts(), 0);
    }

    #[rstest]
    #[case::malformed_json(r#"{"timestamp":"t1","#)]
    #[case::null_body("null")]
    #[tokio::test]
    async fn unparseable_bodies_are_internal_errors(#[case] body: &str) {
        let store = Arc::new(RecordingStore::new());
        let appender = RecordAppender::new(store.clone(), KEY);

        let response = handle(&appender, request(body)).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(&response), json!({ "error": "Internal Server Error" }));
        assert_eq!(store.puts(), 0);
    }

    #[test(tokio::test)]
    async fn a_missing_body_is_an_internal_error() {
        let store = Arc::new(RecordingStore::new());
        let appender = RecordAppender::new(store.clone(), KEY);

        let response = handle(&appender, Request::new(Body::Empty)).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test(tokio::test)]
    async fn a_storage_failure_does_not_leak_details() {
        let store = Arc::new(RecordingStore::new().failing_reads());
        let appender = RecordAppender::new(store.clone(), KEY);

        let response = handle(&appender, request(r#"{"timestamp":"t1","latitude":1.0,"longitude":2.0}"#)).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(&response), json!({ "error": "Internal Server Error" }));
    }

    #[test(tokio::test)]
    async fn a_corrupt_stored_document_is_an_internal_error() {
        let store = Arc::new(RecordingStore::new().with_document(KEY, "not json"));
        let appender = RecordAppender::new(store.clone(), KEY);

        let response = handle(&appender, request(r#"{"timestamp":"t1","latitude":1.0,"longitude":2.0}"#)).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(store.puts(), 0);
    }

    #[test(tokio::test)]
    async fn a_failed_invalidation_reports_an_error_although_the_record_is_saved() {
        let store = Arc::new(RecordingStore::new());
        let invalidator = Arc::new(RecordingInvalidator::failing());
        let appender = RecordAppender::new(store.clone(), KEY).with_invalidation(invalidator.clone(), "no-cache");

        let response = handle(&appender, request(r#"{"timestamp":"t1","latitude":1.0,"longitude":2.0}"#)).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(&response), json!({ "error": "Internal Server Error" }));
        assert_eq!(store.json(KEY), Some(json!([{ "timestamp": "t1", "latitude": 1.0, "longitude": 2.0 }])));
    }

    #[test(tokio::test)]
    async fn a_cache_aware_save_invalidates_once() {
        let store = Arc::new(RecordingStore::new());
        let invalidator = Arc::new(RecordingInvalidator::new());
        let appender = RecordAppender::new(store.clone(), KEY).with_invalidation(invalidator.clone(), "no-cache");

        let response = handle(&appender, request(r#"{"timestamp":"t1","latitude":1.0,"longitude":2.0}"#)).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(invalidator.calls().len(), 1);
        assert_eq!(invalidator.calls()[0].paths, vec!["/locations.json".to_string()]);
    }
}
