//! EV Telemetry Decoder Library
//!
//! A stateless, reusable library for decoding the national EV
//! remote-monitoring wire format out of the vendor streaming envelopes that
//! carry it, producing typed telemetry records (vehicle status, motors,
//! position, extremes, alarms, battery-pack arrays, login/logout events)
//! for a metrics pipeline.
//!
//! # Architecture
//!
//! This library is intentionally minimal and focused on decoding:
//! - Detects the ingress envelope convention and locates the frame
//! - Parses the fixed frame header and validates the XOR checksum
//! - Dispatches by command byte into per-tag record decoders
//! - Returns explicit errors and data-quality diagnostics
//!
//! The library does NOT:
//! - Perform any network or storage I/O
//! - Scale raw values into physical units
//! - Buffer, persist or re-deliver decoded records
//!
//! All of that belongs to the surrounding ingestion pipeline
//! (ev-telemetry-cli is one such front end).
//!
//! # Example Usage
//!
//! ```no_run
//! use ev_telemetry_decoder::{Decoder, DecoderConfig, SourceHint};
//!
//! let decoder = Decoder::new(DecoderConfig::new());
//!
//! # let buffer: Vec<u8> = Vec::new();
//! match decoder.decode(&buffer, SourceHint::Streaming) {
//!     Ok(frame) => {
//!         for record in &frame.records {
//!             println!("{} {:?}", record.vin, record.data);
//!         }
//!     }
//!     Err(e) => eprintln!("Decode error: {}", e),
//! }
//! ```

// Public modules
pub mod commands;
pub mod config;
pub mod cursor;
pub mod decoder;
pub mod envelope;
pub mod frame;
pub mod records;
pub mod types;

// Re-export main types for convenience
pub use config::DecoderConfig;
pub use decoder::Decoder;
pub use envelope::{RawEnvelope, SourceHint};
pub use frame::FrameHeader;
pub use types::{
    DecodeError, DecodedFrame, Diagnostic, RecordData, Result, TelemetryRecord, Timestamp,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
