//! Core types for the telemetry decoder library
//!
//! This module defines everything the decoder emits when processing a wire
//! buffer: the typed telemetry records, the decode error taxonomy, and the
//! per-frame result. The decoder is stateless and only outputs decoded
//! records - scaling raw values into physical units is a sink concern.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::commands;

/// Timestamp type used throughout the decoder
///
/// The protocol specifies a fixed civil timezone for all wall-clock fields,
/// so timestamps carry their offset rather than being normalized to UTC.
pub type Timestamp = DateTime<FixedOffset>;

/// Result type for decoder operations
pub type Result<T> = std::result::Result<T, DecodeError>;

/// Errors that can occur during decoding
///
/// Every condition is returned as a value; no input, however malformed, may
/// terminate the host process.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("start marker 0x23 0x23 not found at computed frame offset {offset}")]
    EnvelopeMismatch { offset: usize },

    #[error("buffer truncated: needed {needed} byte(s), {remaining} remaining")]
    Truncated { needed: usize, remaining: usize },

    #[error("VIN field is not 17 bytes of ASCII")]
    InvalidVin,

    #[error("unsupported record tag 0x{0:02X}: stream position cannot be resynchronized")]
    UnsupportedTag(u8),

    #[error("checksum mismatch: computed 0x{computed:02X}, frame carries 0x{stored:02X}")]
    ChecksumMismatch { computed: u8, stored: u8 },
}

/// Data-quality findings attached to a frame result
///
/// Diagnostics never abort a frame on their own; they let the sink decide
/// what to do with degraded data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// Trailing XOR byte does not match the computed value
    ChecksumMismatch { computed: u8, stored: u8 },
    /// Envelope timestamp string did not parse as `YYYY-MM-DD HH:MM:SS`
    EnvelopeTimestampUnparsed { raw: String },
    /// Device timestamp bytes do not form a valid civil date/time
    DeviceTimestampInvalid,
}

/// Vehicle status record (tag 0x01) - 20 fixed bytes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleStatus {
    pub vehicle_status: u8,
    pub charging_status: u8,
    pub operation_mode: u8,
    pub speed: u16,
    pub mileage: u32,
    pub total_voltage: u16,
    pub total_current: u16,
    pub soc: u8,
    pub dc_dc_status: u8,
    pub gear: u8,
    pub insulation_resistance: u16,
    pub accelerator_pedal: u8,
    pub brake_status: u8,
}

/// One drive-motor entry (tag 0x02) - 12 bytes per motor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotorStatus {
    pub index: u8,
    pub status: u8,
    pub controller_temperature: u8,
    pub speed: u16,
    pub torque: u16,
    pub motor_temperature: u8,
    pub controller_input_voltage: u16,
    pub controller_bus_current: u16,
}

/// Position record (tag 0x05) - 9 bytes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub location_status: u8,
    pub longitude: u32,
    pub latitude: u32,
}

/// Cell voltage / probe temperature extremes (tag 0x06) - 14 bytes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extremes {
    pub max_voltage_subsystem: u8,
    pub max_voltage_cell: u8,
    pub max_cell_voltage: u16,
    pub min_voltage_subsystem: u8,
    pub min_voltage_cell: u8,
    pub min_cell_voltage: u16,
    pub max_temp_subsystem: u8,
    pub max_temp_probe: u8,
    pub max_temperature: u8,
    pub min_temp_subsystem: u8,
    pub min_temp_probe: u8,
    pub min_temperature: u8,
}

/// Alarm record (tag 0x07)
///
/// Four fault-code lists follow the fixed header in wire order; each list is
/// count-prefixed and is consumed even when its count is zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alarms {
    pub highest_level: u8,
    pub general_flags: u32,
    pub battery_faults: Vec<u32>,
    pub motor_faults: Vec<u32>,
    pub engine_faults: Vec<u32>,
    pub other_faults: Vec<u32>,
}

/// Battery-pack voltage sub-record (tag 0x08)
///
/// `cell_voltages` holds this frame's slice of the pack's cells, starting at
/// `frame_start_cell` out of `cell_total`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackVoltage {
    pub pack_id: u8,
    pub voltage: u16,
    pub current: u16,
    pub cell_total: u16,
    pub frame_start_cell: u16,
    pub cell_voltages: Vec<u16>,
}

/// Battery-pack temperature sub-record (tag 0x09)
///
/// Probe readings are stored as `raw byte - 40` (wire range -40..=215 degC).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackTemperature {
    pub pack_id: u8,
    pub probe_temperatures: Vec<i16>,
}

/// Vehicle login sub-record (command 0x01 body)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginEvent {
    pub serial: u16,
    pub iccid: String,
    pub pack_count: u8,
    pub pack_codes: Vec<String>,
}

/// Vehicle logout sub-record (command 0x04 body)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogoutEvent {
    pub serial: u16,
}

/// One decoded logical unit of telemetry - the payload of a [`TelemetryRecord`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecordData {
    VehicleStatus(VehicleStatus),
    MotorStatus { motors: Vec<MotorStatus> },
    Position(Position),
    Extremes(Extremes),
    Alarms(Alarms),
    PackVoltage { packs: Vec<PackVoltage> },
    PackTemperature { packs: Vec<PackTemperature> },
    Login(LoginEvent),
    Logout(LogoutEvent),
    /// Vendor-custom block skipped via its self-describing length prefix
    VendorCustom { tag: u8, payload: Vec<u8> },
    /// Observability record emitted once per dispatched frame
    CommandObserved { command: u8, name: String },
}

/// A decoded record with its identity keys and time association
///
/// Every record carries the VIN and ICCID of the reporting vehicle and, when
/// available, the device timestamp (preferred) or the envelope ingestion
/// timestamp (fallback).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    pub vin: String,
    pub iccid: String,
    pub time: Option<Timestamp>,
    pub data: RecordData,
}

/// The result of decoding one envelope-wrapped frame
///
/// "Zero records, no error" is a valid outcome (e.g. a heartbeat frame
/// produces only the `CommandObserved` record). A mid-stream failure leaves
/// the records decoded before it in `records` and the failure in `error`.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedFrame {
    pub vin: String,
    pub iccid: String,
    pub command: u8,
    pub response: u8,
    /// Timestamp reported by the on-board terminal (commands 0x01-0x04)
    pub device_time: Option<Timestamp>,
    /// Timestamp the ingestion layer stamped onto the envelope
    pub ingest_time: Option<Timestamp>,
    pub records: Vec<TelemetryRecord>,
    pub diagnostics: Vec<Diagnostic>,
    /// Mid-stream decode failure, if any; earlier records are still valid
    pub error: Option<DecodeError>,
}

impl DecodedFrame {
    /// Human-readable name of the frame's command byte
    pub fn command_name(&self) -> &'static str {
        commands::command_name(self.command)
    }

    /// Human-readable name of the frame's response byte
    pub fn response_name(&self) -> &'static str {
        commands::response_name(self.response)
    }

    /// True when the body stream failed partway through
    pub fn is_partial(&self) -> bool {
        self.error.is_some()
    }

    /// The time association telemetry records carry: device time when the
    /// frame has one, envelope ingestion time otherwise
    pub fn record_time(&self) -> Option<Timestamp> {
        self.device_time.or(self.ingest_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_error_display() {
        let err = DecodeError::Truncated {
            needed: 4,
            remaining: 1,
        };
        assert_eq!(
            err.to_string(),
            "buffer truncated: needed 4 byte(s), 1 remaining"
        );

        let err = DecodeError::UnsupportedTag(0x33);
        assert!(err.to_string().contains("0x33"));
    }

    #[test]
    fn test_record_time_prefers_device_time() {
        let tz = FixedOffset::east_opt(8 * 3600).unwrap();
        let device = tz.with_ymd_and_hms(2021, 4, 29, 11, 16, 39).unwrap();
        let ingest = tz.with_ymd_and_hms(2021, 4, 29, 11, 16, 41).unwrap();

        let mut frame = DecodedFrame {
            vin: "LEWTEB144KA000001".to_string(),
            iccid: String::new(),
            command: 0x02,
            response: 0xFE,
            device_time: Some(device),
            ingest_time: Some(ingest),
            records: Vec::new(),
            diagnostics: Vec::new(),
            error: None,
        };
        assert_eq!(frame.record_time(), Some(device));

        frame.device_time = None;
        assert_eq!(frame.record_time(), Some(ingest));
    }

    #[test]
    fn test_record_data_serializes_with_type_tag() {
        let data = RecordData::Position(Position {
            location_status: 0,
            longitude: 116_397_000,
            latitude: 39_916_000,
        });
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["type"], "position");
        assert_eq!(json["longitude"], 116_397_000);
    }
}
