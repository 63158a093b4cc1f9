//! Delivery sink implementations.

pub mod log;
pub mod twilio;

pub use log::LogSink;
pub use twilio::{TwilioCredentials, TwilioSink};
