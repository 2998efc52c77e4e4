use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// An outgoing email request.
///
/// Plain value record: two messages with the same recipient, subject and
/// creation timestamp are the same message as far as delivery is concerned.
/// Field names on the wire are PascalCase (`Email`, `Subject`, `HtmlMessage`,
/// `CreatedAt`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EmailMessage {
    pub email: String,
    pub subject: String,
    pub html_message: String,
    pub created_at: DateTime<Utc>,
}

impl EmailMessage {
    pub fn new(
        email: impl Into<String>,
        subject: impl Into<String>,
        html_message: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            subject: subject.into(),
            html_message: html_message.into(),
            created_at: Utc::now(),
        }
    }

    pub fn dedup_key(&self) -> DedupKey {
        DedupKey::new(&self.email, &self.subject, self.created_at)
    }
}

/// Composite key (recipient, subject, creation timestamp) used to suppress
/// duplicate sends. Fields compare exactly as sent; no case folding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    pub email: String,
    pub subject: String,
    pub created_at: DateTime<Utc>,
}

impl DedupKey {
    pub fn new(email: &str, subject: &str, created_at: DateTime<Utc>) -> Self {
        Self {
            email: email.to_string(),
            subject: subject.to_string(),
            created_at,
        }
    }
}

impl std::fmt::Display for DedupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}|{}|{}",
            self.email,
            self.subject,
            self.created_at.to_rfc3339_opts(SecondsFormat::Nanos, true)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_format_uses_pascal_case() {
        let message = EmailMessage::new("a@example.com", "Welcome", "<p>hi</p>");
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["Email"], "a@example.com");
        assert_eq!(json["Subject"], "Welcome");
        assert_eq!(json["HtmlMessage"], "<p>hi</p>");
        assert!(json["CreatedAt"].is_string());

        let parsed: EmailMessage = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, message);
    }

    #[test]
    fn dedup_key_ignores_body_but_not_timestamp() {
        let a = EmailMessage::new("a@example.com", "Reset", "<p>one</p>");
        let mut b = a.clone();
        b.html_message = "<p>two</p>".to_string();
        assert_eq!(a.dedup_key(), b.dedup_key());

        let mut c = a.clone();
        c.created_at = a.created_at + chrono::Duration::milliseconds(1);
        assert_ne!(a.dedup_key(), c.dedup_key());
    }

    #[test]
    fn dedup_key_is_case_sensitive_on_recipient() {
        let a = EmailMessage::new("Ann@Example.com", "Reset", "<p>one</p>");
        let mut b = a.clone();
        b.email = "ann@example.com".to_string();
        assert_ne!(a.dedup_key(), b.dedup_key());
        assert_eq!(a.dedup_key().email, "Ann@Example.com");
    }
}
