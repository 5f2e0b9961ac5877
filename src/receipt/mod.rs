//! Receipt capture utility
//!
//! A standalone client for an external receipt OCR service, unrelated to
//! the agent loop: upload an image, poll for the parsed result, render a
//! summary.

pub mod client;
pub mod summary;

pub use client::{Client, JobToken, PollConfig, ProcessOptions, ReceiptError};
pub use summary::{LineItem, Receipt, ScanPayload, ScanStatus};
