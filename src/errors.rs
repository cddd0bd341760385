use actix_web::{
    HttpResponse,
    error::ResponseError,
    http::{StatusCode, header},
};
use derive_more::Display;

use crate::mailer::MailerError;

/// Every outcome of a contact submission that is not a success. Each
/// variant maps to exactly one HTTP status and one stable error code, so
/// the static site can switch on `error` without parsing prose.
#[derive(Debug, Display)]
pub enum ContactError {
    #[display("method not allowed")]
    MethodNotAllowed,

    #[display("rate limited, retry in {_0}s")]
    RateLimited(u64),

    #[display("name, email and message are required")]
    MissingFields,

    #[display("email address is not valid")]
    InvalidEmail,

    #[display("a field exceeds its length limit")]
    FieldTooLong,

    #[display("message exceeds its length limit")]
    MessageTooLong,

    #[display("mail relay is not configured")]
    NotConfigured,

    #[display("sending failed: {_0}")]
    SendFailed(String),
}

impl ContactError {
    pub fn code(&self) -> &'static str {
        match self {
            ContactError::MethodNotAllowed => "method_not_allowed",
            ContactError::RateLimited(_) => "rate_limited",
            ContactError::MissingFields => "missing_fields",
            ContactError::InvalidEmail => "invalid_email",
            ContactError::FieldTooLong => "field_too_long",
            ContactError::MessageTooLong => "message_too_long",
            ContactError::NotConfigured => "server_not_configured",
            ContactError::SendFailed(_) => "send_failed",
        }
    }
}

impl ResponseError for ContactError {
    fn status_code(&self) -> StatusCode {
        match self {
            ContactError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ContactError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            ContactError::MissingFields
            | ContactError::InvalidEmail
            | ContactError::FieldTooLong
            | ContactError::MessageTooLong => StatusCode::BAD_REQUEST,
            ContactError::NotConfigured | ContactError::SendFailed(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        if let ContactError::RateLimited(secs) = self {
            builder.insert_header((header::RETRY_AFTER, secs.to_string()));
        }
        // Relay internals stay in the logs; the caller only sees the code.
        builder.json(serde_json::json!({
            "ok": false,
            "error": self.code(),
        }))
    }
}

impl From<MailerError> for ContactError {
    fn from(err: MailerError) -> Self {
        match err {
            MailerError::NotConfigured => ContactError::NotConfigured,
            other => ContactError::SendFailed(other.to_string()),
        }
    }
}
