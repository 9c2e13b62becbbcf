pub mod auto_dismiss;
pub mod clipboard;
pub mod configuration;
pub mod domain;
pub mod email_client;
pub mod error;
pub mod pipeline;
pub mod routes;
pub mod startup;
pub mod store_client;
pub mod telemetry;
