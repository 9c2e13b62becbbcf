mod contact_notification;
mod health_check;
mod submission;
