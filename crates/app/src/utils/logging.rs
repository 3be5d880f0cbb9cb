use dispatch_domain::DispatchError;

/// Convert a `DispatchError` into a stable label suitable for logging.
#[inline]
pub fn error_label(error: &DispatchError) -> &'static str {
    match error {
        DispatchError::Config(_) => "config",
        DispatchError::Connection(_) => "connection",
        DispatchError::NotConnected(_) => "not_connected",
        DispatchError::Serialization(_) => "serialization",
        DispatchError::Broker(_) => "broker",
        DispatchError::Timeout(_) => "timeout",
        DispatchError::CircuitOpen(_) => "circuit_open",
        DispatchError::PublishFailed { .. } => "publish_failed",
        DispatchError::Internal(_) => "internal",
    }
}

#[cfg(test)]
mod tests {
    use dispatch_domain::DeadLetterOutcome;

    use super::*;

    #[test]
    fn test_error_labels_are_stable() {
        assert_eq!(error_label(&DispatchError::Timeout("slow".into())), "timeout");
        assert_eq!(
            error_label(&DispatchError::PublishFailed {
                topic: "orders".into(),
                attempts: 5,
                reason: "down".into(),
                dead_letter: DeadLetterOutcome::Forwarded,
            }),
            "publish_failed"
        );
    }
}
