use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};

use crate::domain::{ContactField, ContactForm};

/// Text field that is guaranteed to contain something besides whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ContactText(String);

impl ContactText {
    pub fn parse(field: ContactField, s: String) -> Result<Self, String> {
        match s.trim().is_empty() {
            true => Err(format!("Please fill in the {} field", field.as_str())),
            false => Ok(Self(s)),
        }
    }
}

impl AsRef<str> for ContactText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A stamped contact message, shaped exactly like the row handed to the store.
#[derive(Debug, Clone, Serialize)]
pub struct ContactSubmission {
    pub name: ContactText,
    pub email: ContactText,
    pub subject: ContactText,
    pub message: ContactText,
    #[serde(serialize_with = "serialize_iso8601")]
    pub created_at: DateTime<Utc>,
}

impl ContactSubmission {
    /// Validates every field and stamps the submission with the current time.
    pub fn stamp(form: ContactForm) -> Result<Self, String> {
        Ok(Self {
            name: ContactText::parse(ContactField::Name, form.name)?,
            email: ContactText::parse(ContactField::Email, form.email)?,
            subject: ContactText::parse(ContactField::Subject, form.subject)?,
            message: ContactText::parse(ContactField::Message, form.message)?,
            created_at: Utc::now(),
        })
    }
}

fn serialize_iso8601<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&at.to_rfc3339_opts(SecondsFormat::Millis, true))
}
