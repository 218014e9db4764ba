//! Main decoder API
//!
//! The [`Decoder`] is the entry point for turning one envelope-wrapped wire
//! buffer into typed telemetry records. A decode call is a pure, synchronous
//! computation: envelope detection, header parse, checksum validation, then
//! command dispatch into the record-stream decoders. The decoder holds no
//! mutable state, so one instance may serve any number of threads.

use crate::commands::{self, CMD_LOGIN, CMD_LOGOUT, CMD_REALTIME_REPORT, CMD_REISSUED_REPORT};
use crate::config::DecoderConfig;
use crate::cursor::Cursor;
use crate::envelope::{read_envelope, SourceHint};
use crate::frame::{self, FrameHeader};
use crate::records::{data, session};
use crate::types::{
    DecodeError, DecodedFrame, Diagnostic, RecordData, Result, TelemetryRecord,
};

/// Stateless frame decoder
///
/// Construction captures the immutable configuration (timezone, checksum
/// policy); nothing else is resolved per call.
#[derive(Debug, Clone)]
pub struct Decoder {
    config: DecoderConfig,
}

impl Decoder {
    /// Create a decoder with the given configuration
    pub fn new(config: DecoderConfig) -> Self {
        Self { config }
    }

    /// The configuration this decoder was built with
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Decode one envelope-wrapped frame
    ///
    /// Envelope and header failures abort the whole frame and return the
    /// error with zero records. A failure inside the record stream returns
    /// `Ok` with the records decoded up to that point and the failure in
    /// [`DecodedFrame::error`], so one malformed trailing record does not
    /// discard a frame's already-valid data.
    pub fn decode(&self, buf: &[u8], hint: SourceHint) -> Result<DecodedFrame> {
        let tz = self.config.timezone();
        let mut diagnostics = Vec::new();

        let envelope = read_envelope(buf, hint, tz, &mut diagnostics)?;
        let tail = &buf[envelope.frame_offset..];
        let header = FrameHeader::read(tail, tz, &mut diagnostics)?;
        let frame = &tail[..header.declared_len];

        let (computed, stored) = frame::checksum(frame);
        if computed != stored {
            if self.config.enforce_checksum {
                return Err(DecodeError::ChecksumMismatch { computed, stored });
            }
            log::debug!(
                "checksum mismatch on frame from {}: computed 0x{computed:02X}, stored 0x{stored:02X}",
                header.vin
            );
            diagnostics.push(Diagnostic::ChecksumMismatch { computed, stored });
        }

        let time = header.device_time.or(envelope.ingest_time);
        let wrap = |data: RecordData| TelemetryRecord {
            vin: header.vin.clone(),
            iccid: envelope.iccid.clone(),
            time,
            data,
        };

        // Observability parity: every dispatched frame yields one command
        // record, whatever its body holds.
        let mut records = vec![wrap(RecordData::CommandObserved {
            command: header.command,
            name: commands::command_name(header.command).to_string(),
        })];

        let (body_records, error) = match header.command {
            CMD_LOGIN => {
                let mut cur = Cursor::new(&frame[header.data_unit_range()]);
                session::decode_login_stream(&mut cur)
            }
            CMD_REALTIME_REPORT | CMD_REISSUED_REPORT => {
                let mut cur = Cursor::new(&frame[header.data_unit_range()]);
                data::decode_report_stream(&mut cur)
            }
            CMD_LOGOUT => {
                let mut cur = Cursor::new(&frame[header.data_unit_range()]);
                session::decode_logout_stream(&mut cur)
            }
            other => {
                log::debug!(
                    "command 0x{other:02X} ({}) carries no decodable body",
                    commands::command_name(other)
                );
                (Vec::new(), None)
            }
        };

        records.extend(body_records.into_iter().map(wrap));

        log::debug!(
            "decoded frame: vin={} command={} records={} diagnostics={}",
            header.vin,
            commands::command_name(header.command),
            records.len(),
            diagnostics.len()
        );

        Ok(DecodedFrame {
            vin: header.vin,
            iccid: envelope.iccid,
            command: header.command,
            response: header.response,
            device_time: header.device_time,
            ingest_time: envelope.ingest_time,
            records,
            diagnostics,
            error,
        })
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new(DecoderConfig::default())
    }
}
