//! Tests for fallback reply synthesis

#[cfg(test)]
mod tests {
    use crate::config::ResilienceConfig;
    use crate::error::ServiceError;
    use crate::models::{ChatCompletionRequest, ChatMessage};
    use crate::resilience::{
        synthesize_response, FallbackKind, Resilience, CONNECTIVITY_MESSAGE,
        FALLBACK_FINISH_REASON, LATENCY_MESSAGE, RATE_LIMIT_MESSAGE, UNAVAILABLE_MESSAGE,
    };

    fn request_with_user(text: &str) -> ChatCompletionRequest {
        ChatCompletionRequest::new(
            "gpt-4",
            vec![ChatMessage::system("be kind"), ChatMessage::user(text)],
        )
    }

    #[test]
    fn test_rate_limit_fallback() {
        let request = request_with_user("hello");
        let error = ServiceError::rate_limit("too many requests").with_status(429);

        let response = synthesize_response(&request, &error).unwrap();

        assert_eq!(response.first_content(), Some(RATE_LIMIT_MESSAGE));
        assert_eq!(response.finish_reason(), Some(FALLBACK_FINISH_REASON));
        assert_eq!(response.model, "gpt-4");
        assert_eq!(response.usage.total_tokens, 0);
        assert_eq!(response.choices[0].message.role, "assistant");
        assert!(response.id.starts_with("fallback-"));
    }

    #[test]
    fn test_no_user_message_means_no_fallback() {
        let request = ChatCompletionRequest::new("gpt-4", vec![ChatMessage::system("only system")]);
        let error = ServiceError::service("down").with_status(503);

        assert!(synthesize_response(&request, &error).is_none());
    }

    #[test]
    fn test_classification_order() {
        assert_eq!(
            FallbackKind::classify(&ServiceError::service("bad gateway").with_status(502)),
            FallbackKind::ServiceUnavailable
        );
        // status wins over a timeout mention
        assert_eq!(
            FallbackKind::classify(&ServiceError::timeout("gateway timeout").with_status(504)),
            FallbackKind::ServiceUnavailable
        );
        assert_eq!(
            FallbackKind::classify(&ServiceError::internal("operation TIMEOUT reached")),
            FallbackKind::Timeout
        );
        assert_eq!(
            FallbackKind::classify(&ServiceError::authentication("bad key").with_status(401)),
            FallbackKind::Unavailable
        );
    }

    #[test]
    fn test_messages_per_kind() {
        let request = request_with_user("are you there?");

        let server = synthesize_response(&request, &ServiceError::service("oops").with_status(500));
        assert_eq!(server.unwrap().first_content(), Some(CONNECTIVITY_MESSAGE));

        let slow = synthesize_response(&request, &ServiceError::timeout("read"));
        assert_eq!(slow.unwrap().first_content(), Some(LATENCY_MESSAGE));

        let other = synthesize_response(&request, &ServiceError::validation("nope"));
        assert_eq!(other.unwrap().first_content(), Some(UNAVAILABLE_MESSAGE));
    }

    #[test]
    fn test_fallback_disabled() {
        let resilience = Resilience::new(ResilienceConfig {
            fallback_enabled: false,
            ..ResilienceConfig::default()
        });
        let request = request_with_user("hello");
        let error = ServiceError::rate_limit("slow down");

        assert!(resilience.fallback_response(&request, &error).is_none());
        assert!(Resilience::default()
            .fallback_response(&request, &error)
            .is_some());
    }
}
