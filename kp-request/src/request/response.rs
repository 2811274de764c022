//! Response interpretation.

use serde_json::Value;

use crate::{
    error::{ApiError, Result},
    transport::{OutboundRequest, TransportResponse},
};

/// Turns a received HTTP response into the call result.
///
/// - `200..=299` with a JSON body: `Ok(Some(body))`, unvalidated.
/// - `200..=299` with an empty or non-JSON body: `Ok(None)`.
/// - anything else: [`ApiError`] with the status as code, the message from
///   [`error_message`], and `URL: {url} - {request args}` as context.
///
/// # Errors
///
/// Returns [`ClientError::Api`](crate::error::ClientError::Api) for non-2xx
/// statuses.
///
/// # Examples
///
/// ```
/// use kp_request::{
///     error::ClientError,
///     request::interpret_response,
///     transport::{HttpMethod, OutboundRequest, TransportResponse},
/// };
///
/// let request = OutboundRequest::new(HttpMethod::Post, "https://api.klarna.com/payments/v1/sessions");
/// let response = TransportResponse {
///     status: 402,
///     body: br#"{"error_messages":["insufficient_funds"]}"#.to_vec(),
///     headers: vec![],
/// };
///
/// match interpret_response(&request, &response) {
///     Err(ClientError::Api(err)) => {
///         assert_eq!(err.code, 402);
///         assert_eq!(err.message, "insufficient_funds");
///     }
///     other => panic!("unexpected: {other:?}"),
/// }
/// ```
pub fn interpret_response(
    request: &OutboundRequest,
    response: &TransportResponse,
) -> Result<Option<Value>> {
    if response.is_success() {
        return Ok(serde_json::from_slice(&response.body).ok());
    }

    Err(ApiError {
        code: response.status,
        message: error_message(response),
        context: format!("URL: {} - {}", request.url, request.redacted_args()),
    }
    .into())
}

/// Builds the failure message for a non-2xx response.
///
/// Entries of the body's `error_messages` list are joined with single
/// spaces. Without such a list, the status reason phrase is used.
pub fn error_message(response: &TransportResponse) -> String {
    let messages = serde_json::from_slice::<Value>(&response.body).ok().and_then(|body| {
        match body.get("error_messages") {
            Some(Value::Array(entries)) => Some(
                entries
                    .iter()
                    .map(|entry| match entry {
                        Value::String(text) => text.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>(),
            ),
            _ => None,
        }
    });

    match messages {
        Some(messages) => messages.join(" "),
        None => response.reason().to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{error::ClientError, transport::HttpMethod};

    fn request() -> OutboundRequest {
        OutboundRequest {
            method: HttpMethod::Post,
            url: "https://api.klarna.com/payments/v1/sessions".to_owned(),
            headers: vec![("Authorization".to_owned(), "Basic c2VjcmV0".to_owned())],
            user_agent: None,
            body: Some(json!({"purchase_country": "SE"})),
        }
    }

    fn response(status: u16, body: &str) -> TransportResponse {
        TransportResponse { status, body: body.as_bytes().to_vec(), headers: vec![] }
    }

    fn api_error(result: Result<Option<Value>>) -> ApiError {
        match result {
            Err(ClientError::Api(err)) => err,
            other => panic!("expected API error, got {other:?}"),
        }
    }

    #[test]
    fn test_success_returns_decoded_body() {
        let result = interpret_response(&request(), &response(200, r#"{"order_id":"abc"}"#));
        assert_eq!(result.unwrap(), Some(json!({"order_id": "abc"})));
    }

    #[test]
    fn test_success_without_json_is_none() {
        assert_eq!(interpret_response(&request(), &response(204, "")).unwrap(), None);
        assert_eq!(interpret_response(&request(), &response(200, "OK")).unwrap(), None);
    }

    #[test]
    fn test_success_array_body_kept() {
        let result = interpret_response(&request(), &response(201, "[1,2]"));
        assert_eq!(result.unwrap(), Some(json!([1, 2])));
    }

    #[test]
    fn test_error_messages_single_entry() {
        let err = api_error(interpret_response(
            &request(),
            &response(402, r#"{"error_messages":["insufficient_funds"]}"#),
        ));
        assert_eq!(err.code, 402);
        assert_eq!(err.message, "insufficient_funds");
    }

    #[test]
    fn test_error_messages_joined_without_leading_space() {
        let body = r#"{"error_code":"BAD_VALUE","error_messages":["Bad value: order_amount","Bad value: order_lines"],"correlation_id":"c-1"}"#;
        let err = api_error(interpret_response(&request(), &response(400, body)));
        assert_eq!(err.message, "Bad value: order_amount Bad value: order_lines");
    }

    #[test]
    fn test_non_string_error_messages() {
        let err = api_error(interpret_response(
            &request(),
            &response(400, r#"{"error_messages":["a", 7]}"#),
        ));
        assert_eq!(err.message, "a 7");
    }

    #[test]
    fn test_empty_error_messages_list() {
        let err =
            api_error(interpret_response(&request(), &response(400, r#"{"error_messages":[]}"#)));
        assert_eq!(err.message, "");
    }

    #[test]
    fn test_falls_back_to_reason_phrase() {
        let err = api_error(interpret_response(&request(), &response(401, "")));
        assert_eq!(err.code, 401);
        assert_eq!(err.message, "Unauthorized");

        let err = api_error(interpret_response(&request(), &response(503, "<html></html>")));
        assert_eq!(err.message, "Service Unavailable");

        let err = api_error(interpret_response(
            &request(),
            &response(404, r#"{"error_messages":"not a list"}"#),
        ));
        assert_eq!(err.message, "Not Found");
    }

    #[test]
    fn test_error_context_has_url_and_redacted_args() {
        let err = api_error(interpret_response(&request(), &response(500, "")));
        assert!(err.context.starts_with("URL: https://api.klarna.com/payments/v1/sessions - {"));
        assert!(err.context.contains("\"purchase_country\":\"SE\""));
        assert!(err.context.contains("[REDACTED]"));
        assert!(!err.context.contains("c2VjcmV0"));
    }

    #[test]
    fn test_redirect_status_is_failure() {
        let err = api_error(interpret_response(&request(), &response(302, "")));
        assert_eq!(err.code, 302);
        assert_eq!(err.message, "Found");
    }
}
