use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::{
    constants::{
        COMPANY_MAX_CHARS, MESSAGE_MAX_CHARS, NAME_MAX_CHARS, PHONE_MAX_CHARS, WEBSITE_MAX_CHARS,
    },
    errors::ContactError,
};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s]+$").expect("email regex"));

static HEADER_BREAK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\r\n]+").expect("header regex"));

/// A contact form submission as posted by the website. `hp` is the hidden
/// honeypot field; humans never fill it.
#[derive(Debug, Clone, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub message: String,

    #[serde(default)]
    pub company: Option<String>,

    #[serde(default)]
    pub website: Option<String>,

    #[serde(default)]
    pub phone: Option<String>,

    #[serde(default, rename = "hp")]
    pub honeypot: Option<String>,
}

impl ContactForm {
    /// Trims every field; optional fields collapse to `None` when empty.
    /// All downstream checks and mail composition assume this ran.
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.email = self.email.trim().to_string();
        self.message = self.message.trim().to_string();
        self.company = normalize_optional(self.company);
        self.website = normalize_optional(self.website);
        self.phone = normalize_optional(self.phone);
        self.honeypot = normalize_optional(self.honeypot);
        self
    }

    pub fn is_honeypot(&self) -> bool {
        self.honeypot.as_deref().is_some_and(|v| !v.trim().is_empty())
    }

    /// Ordered field checks, first failure wins.
    pub fn validate(&self) -> Result<(), ContactError> {
        if self.name.is_empty() || self.email.is_empty() || self.message.is_empty() {
            return Err(ContactError::MissingFields);
        }
        if !EMAIL_RE.is_match(&self.email) {
            return Err(ContactError::InvalidEmail);
        }
        if char_len(&self.name) > NAME_MAX_CHARS
            || opt_char_len(&self.company) > COMPANY_MAX_CHARS
            || opt_char_len(&self.website) > WEBSITE_MAX_CHARS
            || opt_char_len(&self.phone) > PHONE_MAX_CHARS
        {
            return Err(ContactError::FieldTooLong);
        }
        if char_len(&self.message) > MESSAGE_MAX_CHARS {
            return Err(ContactError::MessageTooLong);
        }
        Ok(())
    }

    /// Name as it may appear in a mail header.
    pub fn header_name(&self) -> String {
        sanitize_header_value(&self.name)
    }

    /// Email as it may appear in a mail header.
    pub fn header_email(&self) -> String {
        sanitize_header_value(&self.email)
    }
}

/// Collapses CR/LF runs to a single space. Values embedded in subjects or
/// address headers must pass through here, otherwise a crafted name could
/// inject additional headers into the outbound mail.
pub fn sanitize_header_value(value: &str) -> String {
    HEADER_BREAK_RE.replace_all(value, " ").into_owned()
}

/// First `max_chars` characters of `message`, with an ellipsis when the
/// original is longer. The acknowledgement quotes this instead of the full
/// message to limit how much submitted content travels back out.
pub fn summarize(message: &str, max_chars: usize) -> String {
    if char_len(message) <= max_chars {
        return message.to_string();
    }
    let mut summary: String = message.chars().take(max_chars).collect();
    summary.push('…');
    summary
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn char_len(value: &str) -> usize {
    value.chars().count()
}

fn opt_char_len(value: &Option<String>) -> usize {
    value.as_deref().map(char_len).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> ContactForm {
        ContactForm {
            name: "Jane Doe".into(),
            email: "jane@example.com".into(),
            message: "Hello, I would like a quote.".into(),
            company: None,
            website: None,
            phone: None,
            honeypot: None,
        }
    }

    #[test]
    fn accepts_a_plain_valid_submission() {
        assert!(valid_form().validate().is_ok());
    }

    #[test]
    fn missing_required_fields_win_over_everything_else() {
        for field in ["name", "email", "message"] {
            let mut form = valid_form();
            match field {
                "name" => form.name.clear(),
                "email" => form.email.clear(),
                _ => form.message.clear(),
            }
            assert!(
                matches!(form.validate(), Err(ContactError::MissingFields)),
                "empty {field} should be missing_fields"
            );
        }
    }

    #[test]
    fn rejects_malformed_email_addresses() {
        let mut form = valid_form();
        form.email = "not-an-email".into();
        assert!(matches!(form.validate(), Err(ContactError::InvalidEmail)));

        form.email = "two@signs@example.com".into();
        assert!(matches!(form.validate(), Err(ContactError::InvalidEmail)));

        form.email = "a@b.co".into();
        assert!(form.validate().is_ok());
    }

    #[test]
    fn name_length_is_bounded_at_80_chars() {
        let mut form = valid_form();
        form.name = "x".repeat(80);
        assert!(form.validate().is_ok());

        form.name = "x".repeat(81);
        assert!(matches!(form.validate(), Err(ContactError::FieldTooLong)));
    }

    #[test]
    fn optional_fields_have_their_own_bounds() {
        let mut form = valid_form();
        form.company = Some("c".repeat(121));
        assert!(matches!(form.validate(), Err(ContactError::FieldTooLong)));

        let mut form = valid_form();
        form.website = Some("w".repeat(201));
        assert!(matches!(form.validate(), Err(ContactError::FieldTooLong)));

        let mut form = valid_form();
        form.phone = Some("1".repeat(81));
        assert!(matches!(form.validate(), Err(ContactError::FieldTooLong)));
    }

    #[test]
    fn message_length_is_bounded_at_5000_chars() {
        let mut form = valid_form();
        form.message = "m".repeat(5000);
        assert!(form.validate().is_ok());

        form.message = "m".repeat(5001);
        assert!(matches!(form.validate(), Err(ContactError::MessageTooLong)));
    }

    #[test]
    fn length_limits_count_characters_not_bytes() {
        let mut form = valid_form();
        form.name = "ü".repeat(80);
        assert!(form.validate().is_ok());
    }

    #[test]
    fn normalization_trims_and_drops_empty_optionals() {
        let form = ContactForm {
            name: "  Jane  ".into(),
            email: " jane@example.com ".into(),
            message: " hi ".into(),
            company: Some("   ".into()),
            website: Some(" https://example.com ".into()),
            phone: None,
            honeypot: Some("".into()),
        }
        .normalized();

        assert_eq!(form.name, "Jane");
        assert_eq!(form.email, "jane@example.com");
        assert_eq!(form.company, None);
        assert_eq!(form.website.as_deref(), Some("https://example.com"));
        assert!(!form.is_honeypot());
    }

    #[test]
    fn filled_honeypot_flags_the_submission() {
        let mut form = valid_form();
        form.honeypot = Some("gotcha".into());
        assert!(form.is_honeypot());

        form.honeypot = Some("   ".into());
        assert!(!form.is_honeypot());
    }

    #[test]
    fn header_values_lose_line_breaks() {
        let mut form = valid_form();
        form.name = "Evil\nBcc: attacker@x.com".into();
        let header = form.header_name();
        assert!(!header.contains('\n'));
        assert!(!header.contains('\r'));
        assert_eq!(header, "Evil Bcc: attacker@x.com");

        assert_eq!(sanitize_header_value("a\r\n\r\nb"), "a b");
    }

    #[test]
    fn summaries_cut_at_220_chars_with_ellipsis() {
        let long = "a".repeat(300);
        let summary = summarize(&long, 220);
        assert_eq!(summary.chars().count(), 221);
        assert!(summary.ends_with('…'));
        assert!(summary.starts_with(&"a".repeat(220)));

        let short = "b".repeat(100);
        assert_eq!(summarize(&short, 220), short);
    }
}
