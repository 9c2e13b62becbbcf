use chrono::{DateTime, Utc};
use html_escape::{encode_double_quoted_attribute, encode_text};
use serde::Deserialize;

/// Body the store posts to the notification function after an insert.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationRequest {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub created_at: String,
}

impl NotificationRequest {
    pub fn email_subject(&self) -> String {
        format!("New Contact Form Message: {}", self.subject)
    }

    /// `created_at` for humans; an unparseable timestamp is shown as sent.
    pub fn received_at(&self) -> String {
        DateTime::parse_from_rfc3339(&self.created_at)
            .map(|at| {
                at.with_timezone(&Utc)
                    .format("%Y-%m-%d %H:%M:%S UTC")
                    .to_string()
            })
            .unwrap_or_else(|_| self.created_at.clone())
    }

    pub fn html_body(&self) -> String {
        let received_at = self.received_at();
        let received_at = encode_text(&received_at);
        let name = encode_text(&self.name);
        let email = encode_text(&self.email);
        let mailto = encode_double_quoted_attribute(&self.email);
        let subject = encode_text(&self.subject);
        let message = encode_text(&self.message);

        format!(
            r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2 style="color: #10b981;">New Message from Contact Form</h2>
  <div style="background: #f3f4f6; padding: 20px; border-radius: 8px; margin: 20px 0;">
    <p><strong>Name:</strong> {name}</p>
    <p><strong>Email:</strong> <a href="mailto:{mailto}">{email}</a></p>
    <p><strong>Subject:</strong> {subject}</p>
    <p><strong>Date:</strong> {received_at}</p>
  </div>
  <hr style="border: 1px solid #e5e7eb; margin: 20px 0;">
  <div style="background: #ffffff; padding: 20px; border-left: 4px solid #10b981;">
    <p><strong>Message:</strong></p>
    <p style="white-space: pre-wrap;">{message}</p>
  </div>
  <hr style="border: 1px solid #e5e7eb; margin: 20px 0;">
  <p style="color: #6b7280; font-size: 12px;">
    <em>Reply directly to this email to respond to {email}</em>
  </p>
</div>"#
        )
    }

    pub fn text_body(&self) -> String {
        format!(
            "New Message from Contact Form\n\n\
             Name: {}\n\
             Email: {}\n\
             Subject: {}\n\
             Date: {}\n\n\
             Message:\n\
             {}\n\n\
             ---\n\
             Reply directly to this email to respond to {}\n",
            self.name,
            self.email,
            self.subject,
            self.received_at(),
            self.message,
            self.email,
        )
    }
}
