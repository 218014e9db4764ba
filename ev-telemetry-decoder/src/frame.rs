//! Protocol frame header and checksum
//!
//! The fixed header sits at the start of every frame: two start-marker
//! bytes, command, response, a 17-byte VIN, one reserved encryption-mode
//! byte, and a two-byte length field. The declared frame length is the raw
//! length field plus the 25 bytes of fixed encapsulation overhead (24 header
//! bytes and the trailing checksum).
//!
//! Commands 0x01-0x04 additionally carry a six-byte device timestamp at the
//! head of the data unit (year-2000 offset, month, day, hour, minute,
//! second), interpreted in the configured fixed timezone.

use chrono::{FixedOffset, TimeZone};

use crate::commands::{CMD_LOGIN, CMD_LOGOUT};
use crate::cursor::Cursor;
use crate::types::{DecodeError, Diagnostic, Result, Timestamp};

/// The two bytes opening every protocol frame
pub const START_MARKER: [u8; 2] = [0x23, 0x23];

/// Fixed encapsulation overhead included in the declared length
pub const ENCAPSULATION_OVERHEAD: usize = 25;

/// Offset of the first data-unit record within the frame
pub const DATA_UNIT_OFFSET: usize = 30;

/// Offset of the device-timestamp bytes within the frame
const DEVICE_TIME_OFFSET: usize = 24;

/// Parsed fixed header of one protocol frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameHeader {
    pub command: u8,
    pub response: u8,
    pub vin: String,
    /// Total frame length in bytes, including header and checksum
    pub declared_len: usize,
    /// Device timestamp, present for commands 0x01-0x04
    pub device_time: Option<Timestamp>,
}

impl FrameHeader {
    /// Parse the header at the start of `tail` (the buffer beginning at the
    /// frame offset computed by the envelope reader)
    ///
    /// Validates that the declared length fits inside `tail`; the returned
    /// header therefore licenses slicing `tail[..declared_len]`.
    pub fn read(
        tail: &[u8],
        tz: FixedOffset,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<FrameHeader> {
        let mut cur = Cursor::new(tail);
        cur.advance(START_MARKER.len())?;

        let command = cur.read_u8()?;
        let response = cur.read_u8()?;

        let vin_bytes = cur.read_bytes(17)?;
        if !vin_bytes.is_ascii() {
            return Err(DecodeError::InvalidVin);
        }
        let vin = String::from_utf8(vin_bytes.to_vec()).map_err(|_| DecodeError::InvalidVin)?;

        // Reserved encryption-mode byte
        cur.advance(1)?;

        let declared_len = cur.read_u16()? as usize + ENCAPSULATION_OVERHEAD;
        if declared_len > tail.len() {
            return Err(DecodeError::Truncated {
                needed: declared_len,
                remaining: tail.len(),
            });
        }

        let device_time = if has_device_time(command) {
            if declared_len <= DATA_UNIT_OFFSET {
                return Err(DecodeError::Truncated {
                    needed: DATA_UNIT_OFFSET + 1,
                    remaining: declared_len,
                });
            }
            read_device_time(&tail[DEVICE_TIME_OFFSET..DATA_UNIT_OFFSET], tz, diagnostics)
        } else {
            None
        };

        Ok(FrameHeader {
            command,
            response,
            vin,
            declared_len,
            device_time,
        })
    }

    /// Byte range of the record stream: from the data-unit offset up to the
    /// byte before the checksum
    pub fn data_unit_range(&self) -> std::ops::Range<usize> {
        DATA_UNIT_OFFSET..self.declared_len - 1
    }
}

/// Commands whose frames carry a device timestamp
fn has_device_time(command: u8) -> bool {
    (CMD_LOGIN..=CMD_LOGOUT).contains(&command)
}

fn read_device_time(
    bytes: &[u8],
    tz: FixedOffset,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<Timestamp> {
    let [year, month, day, hour, minute, second] = bytes else {
        return None;
    };

    let parsed = tz
        .with_ymd_and_hms(
            2000 + i32::from(*year),
            u32::from(*month),
            u32::from(*day),
            u32::from(*hour),
            u32::from(*minute),
            u32::from(*second),
        )
        .single();

    if parsed.is_none() {
        log::debug!("device timestamp bytes {bytes:02X?} are not a valid civil time");
        diagnostics.push(Diagnostic::DeviceTimestampInvalid);
    }
    parsed
}

/// Compute the running XOR of a frame and return it with the stored value
///
/// The XOR covers every byte after the start marker up to, but excluding,
/// the trailing checksum byte. `frame` must already be trimmed to the
/// declared length.
pub fn checksum(frame: &[u8]) -> (u8, u8) {
    let stored = frame[frame.len() - 1];
    let computed = frame[2..frame.len() - 1].iter().fold(0, |acc, b| acc ^ b);
    (computed, stored)
}
