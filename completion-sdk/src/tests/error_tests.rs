//! Tests for error construction and HTTP error mapping

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;
    use serde_json::json;

    use crate::error::mapping::{classify_http_error, map_http_error, map_openai_error};
    use crate::error::{ErrorContext, ServiceError};
    use crate::resilience::RetryableError;

    #[test]
    fn test_error_display() {
        assert_eq!(
            ServiceError::rate_limit("slow down").to_string(),
            "Rate limit exceeded: slow down"
        );
        assert_eq!(
            ServiceError::parsing("bad json").to_string(),
            "Parsing error: bad json"
        );
    }

    #[test]
    fn test_context_is_transparent_for_display() {
        let error = ServiceError::service("boom").with_context(
            ErrorContext::for_service("openai")
                .status_code(502)
                .error_code("server_error"),
        );

        assert_eq!(error.to_string(), "Service error: boom");
        assert_eq!(error.status_code(), Some(502));
        assert_eq!(error.error_code(), Some("server_error"));
        assert_eq!(error.service_name(), Some("openai"));
        assert!(matches!(error.root(), ServiceError::Service(_)));
    }

    #[test]
    fn test_status_found_in_nested_context() {
        let error = ServiceError::service("boom")
            .with_status(500)
            .with_context_value("attempt", 3);

        assert_eq!(error.status_code(), Some(500));
    }

    #[test]
    fn test_rate_limit_status_is_inferred() {
        let error = ServiceError::rate_limit("quota");
        assert_eq!(RetryableError::status_code(&error), Some(429));

        let plain = ServiceError::validation("nope");
        assert_eq!(RetryableError::status_code(&plain), None);
    }

    #[test]
    fn test_map_openai_error_body() {
        let body = json!({
            "error": {
                "message": "Rate limit reached for requests",
                "type": "requests",
                "code": "rate_limit_exceeded"
            }
        });
        let mut context = ErrorContext::for_service("openai").status_code(429);

        let error = map_openai_error(StatusCode::TOO_MANY_REQUESTS, &body, &mut context);

        assert!(matches!(error, ServiceError::RateLimit(ref m) if m.contains("Rate limit reached")));
        assert_eq!(context.error_code.as_deref(), Some("rate_limit_exceeded"));
        assert_eq!(context.data.get("error_type").map(String::as_str), Some("requests"));
    }

    #[test]
    fn test_map_http_error_plain_body() {
        let mut context = ErrorContext::for_service("gateway");

        let error = map_http_error(StatusCode::BAD_GATEWAY, "upstream unavailable", &mut context);
        assert!(matches!(error, ServiceError::Service(ref m) if m.contains("upstream unavailable")));

        let error = map_http_error(StatusCode::UNAUTHORIZED, "", &mut context);
        assert!(matches!(error, ServiceError::Authentication(_)));

        let error = map_http_error(StatusCode::GATEWAY_TIMEOUT, "", &mut context);
        assert!(matches!(error, ServiceError::Timeout(_)));
    }

    #[test]
    fn test_classify_http_error() {
        assert_eq!(classify_http_error(StatusCode::TOO_MANY_REQUESTS), "rate_limit");
        assert_eq!(classify_http_error(StatusCode::SERVICE_UNAVAILABLE), "server");
        assert_eq!(classify_http_error(StatusCode::FORBIDDEN), "authorization");
        assert_eq!(classify_http_error(StatusCode::IM_A_TEAPOT), "unknown");
    }

    #[test]
    fn test_from_serde_json_error() {
        let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let error: ServiceError = err.into();

        assert!(matches!(error.root(), ServiceError::Parsing(_)));
        assert_eq!(error.service_name(), Some("json"));
    }
}
