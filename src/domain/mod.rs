mod contact_form;
mod contact_submission;
mod notification_request;
mod recipient_email;

pub use contact_form::{ContactField, ContactForm};
pub use contact_submission::{ContactSubmission, ContactText};
pub use notification_request::NotificationRequest;
pub use recipient_email::RecipientEmail;
