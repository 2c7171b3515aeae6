//! Integration glue for the RJN Clarity time-series ingestion API.
//!
//! The meaningful surface is [`client::RjnClient`]: authenticate once, then
//! upload batches of timestamped values per entity. Everything else is the
//! plumbing around it: secrets lookup, timestamp normalization, reachability
//! probes and artifact naming.

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod ping;
pub mod timefmt;
pub mod version;

pub use client::{RjnClient, Session};
pub use error::RjnError;
pub use timefmt::TimestampInput;
