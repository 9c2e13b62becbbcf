mod contact_notification;
mod health_check;

pub use contact_notification::*;
pub use health_check::*;
