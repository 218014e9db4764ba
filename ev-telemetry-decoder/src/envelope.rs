//! Ingress envelope detection
//!
//! Frames arrive wrapped in one of three vendor streaming envelopes. The
//! envelope carries the device ICCID and the ingestion timestamp, and its
//! layout determines where the protocol frame begins:
//!
//! - platform aggregation feeds prefix a 24-byte packet id before the usual
//!   ICCID + timestamp (frame offset 63);
//! - some streams drop the ICCID and mark its absence with a single ASCII
//!   space (frame offset 20);
//! - the default convention is a 20-byte ICCID followed by a 19-byte
//!   formatted timestamp (frame offset 39).
//!
//! The choice is driven solely by the caller-supplied hint and the buffer
//! itself; the reader never guesses an alternate offset when the start
//! marker is missing.

use chrono::{FixedOffset, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};

use crate::cursor::Cursor;
use crate::frame::START_MARKER;
use crate::types::{DecodeError, Diagnostic, Result, Timestamp};

/// Length of the platform-aggregation packet-id prefix
const PACKET_ID_LEN: usize = 24;
/// Length of the ICCID field
const ICCID_LEN: usize = 20;
/// Length of the `YYYY-MM-DD HH:MM:SS` timestamp string
const TIMESTAMP_LEN: usize = 19;
/// Marker byte standing in for an absent ICCID
const MISSING_ICCID_MARKER: u8 = 0x20;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Ingestion-context hint selecting the envelope convention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceHint {
    /// Per-vehicle streaming feed (default convention)
    #[default]
    Streaming,
    /// Platform aggregation feed with a leading packet-id field
    PlatformAggregation,
}

/// Envelope metadata extracted from the head of a raw buffer
///
/// Ephemeral - derived per input buffer and never persisted. The ingestion
/// timestamp is advisory; the frame's own device timestamp, when present, is
/// authoritative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEnvelope {
    pub iccid: String,
    pub ingest_time: Option<Timestamp>,
    pub frame_offset: usize,
}

/// Detect the envelope convention and locate the protocol frame
///
/// Fails with [`DecodeError::EnvelopeMismatch`] when the two bytes at the
/// computed offset are not the frame start marker, and with
/// [`DecodeError::Truncated`] when the buffer is too short to hold the
/// envelope at all. An unparseable timestamp string only yields a
/// diagnostic.
pub fn read_envelope(
    buf: &[u8],
    hint: SourceHint,
    tz: FixedOffset,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<RawEnvelope> {
    let mut cur = Cursor::new(buf);

    let (iccid, raw_timestamp) = if hint == SourceHint::PlatformAggregation {
        cur.advance(PACKET_ID_LEN)?;
        let iccid = cur.read_bytes(ICCID_LEN)?;
        let ts = cur.read_bytes(TIMESTAMP_LEN)?;
        (String::from_utf8_lossy(iccid).into_owned(), ts)
    } else if cur.peek(0)? == MISSING_ICCID_MARKER {
        cur.advance(1)?;
        let ts = cur.read_bytes(TIMESTAMP_LEN)?;
        (String::new(), ts)
    } else {
        let iccid = cur.read_bytes(ICCID_LEN)?;
        let ts = cur.read_bytes(TIMESTAMP_LEN)?;
        (String::from_utf8_lossy(iccid).into_owned(), ts)
    };

    let frame_offset = cur.position();
    let marker = cur.read_bytes(START_MARKER.len())?;
    if marker != START_MARKER {
        log::warn!(
            "frame start marker missing at offset {frame_offset}: found {:02X?}",
            marker
        );
        return Err(DecodeError::EnvelopeMismatch {
            offset: frame_offset,
        });
    }

    let ingest_time = parse_ingest_time(raw_timestamp, tz, diagnostics);

    Ok(RawEnvelope {
        iccid,
        ingest_time,
        frame_offset,
    })
}

fn parse_ingest_time(
    raw: &[u8],
    tz: FixedOffset,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<Timestamp> {
    let text = std::str::from_utf8(raw).ok();
    let parsed = text
        .and_then(|s| NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT).ok())
        .and_then(|naive| tz.from_local_datetime(&naive).single());

    if parsed.is_none() {
        let raw = String::from_utf8_lossy(raw).into_owned();
        log::debug!("envelope timestamp did not parse: {raw:?}");
        diagnostics.push(Diagnostic::EnvelopeTimestampUnparsed { raw });
    }
    parsed
}
