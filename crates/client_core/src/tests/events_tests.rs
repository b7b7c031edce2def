use super::*;
use anyhow::anyhow;

#[test]
fn classifies_status_codes() {
    assert_eq!(
        ErrorCategory::from_code(ErrorCode::Unauthorized),
        ErrorCategory::Auth
    );
    assert_eq!(
        ErrorCategory::from_code(ErrorCode::Forbidden),
        ErrorCategory::Auth
    );
    assert_eq!(
        ErrorCategory::from_code(ErrorCode::NotFound),
        ErrorCategory::NotFound
    );
    assert_eq!(
        ErrorCategory::from_code(ErrorCode::RateLimited),
        ErrorCategory::Transport
    );
}

#[test]
fn classifies_plain_messages() {
    assert_eq!(
        ErrorCategory::from_message("request timed out"),
        ErrorCategory::Transport
    );
    assert_eq!(
        ErrorCategory::from_message("HTTP 403 Forbidden"),
        ErrorCategory::Auth
    );
    assert_eq!(
        ErrorCategory::from_message("missing field `title`"),
        ErrorCategory::Validation
    );
    assert_eq!(
        ErrorCategory::from_message("something odd"),
        ErrorCategory::Unknown
    );
}

#[test]
fn api_exception_wins_over_message_text() {
    let err: anyhow::Error = ApiException::from_status(422, "connection field invalid").into();
    assert_eq!(ErrorCategory::classify(&err), ErrorCategory::Validation);

    let err = anyhow!("connection reset by peer");
    assert_eq!(ErrorCategory::classify(&err), ErrorCategory::Transport);
}

#[test]
fn notification_mirrors_mutation_error() {
    let err = MutationError::from_error(MutationKind::Update, &anyhow!("network down"));
    let notification = Notification::from(&err);

    assert_eq!(notification.kind(), MutationKind::Update);
    assert_eq!(notification.category(), ErrorCategory::Transport);
    assert_eq!(notification.message(), "network down");
    assert_eq!(
        notification.summary(),
        "Could not update post (the service is unreachable; try again): network down"
    );
    assert_eq!(err.to_string(), "update post failed: network down");
}
