//! SMS delivery for Bharat Sanchar answers.
//!
//! Delivery sits outside the answer pipeline. A failed send never changes
//! an answer that was already produced.
//!
//! # Sinks
//! - **Twilio**: Programmable Messaging REST API
//! - **Log**: writes messages to the log instead of sending them

pub mod sink;
pub mod sinks;

pub use sink::{create_sink, DeliveryReceipt, DeliverySink};
pub use sinks::{LogSink, TwilioCredentials, TwilioSink};
