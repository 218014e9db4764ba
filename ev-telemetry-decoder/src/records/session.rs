//! Login and logout body grammars (commands 0x01 and 0x04)
//!
//! Neither stream is self-terminating: sub-records repeat until the offset
//! reaches the byte before the checksum, and the byte count consumed must
//! land on that boundary exactly.

use crate::cursor::Cursor;
use crate::types::{DecodeError, LoginEvent, LogoutEvent, RecordData};

/// Length of the ICCID field inside a login sub-record
const ICCID_LEN: usize = 20;

/// Decode the login stream: repeated sub-records of serial, ICCID, pack
/// count `C`, pack-code length `L` and `L x C` bytes of pack codes
pub fn decode_login_stream(cur: &mut Cursor) -> (Vec<RecordData>, Option<DecodeError>) {
    let mut records = Vec::new();

    while cur.remaining() > 0 {
        match login_event(cur) {
            Ok(event) => records.push(RecordData::Login(event)),
            Err(err) => {
                log::warn!("login sub-record failed to decode: {err}");
                return (records, Some(err));
            }
        }
    }

    (records, None)
}

fn login_event(cur: &mut Cursor) -> Result<LoginEvent, DecodeError> {
    let serial = cur.read_u16()?;
    let iccid = String::from_utf8_lossy(cur.read_bytes(ICCID_LEN)?).into_owned();
    let pack_count = cur.read_u8()?;
    let code_len = cur.read_u8()?;

    let code_bytes = cur.read_bytes(usize::from(pack_count) * usize::from(code_len))?;
    let pack_codes = code_bytes
        .chunks(usize::from(code_len).max(1))
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect();

    Ok(LoginEvent {
        serial,
        iccid,
        pack_count,
        pack_codes,
    })
}

/// Decode the logout stream: repeated two-byte serial fields, nothing else
pub fn decode_logout_stream(cur: &mut Cursor) -> (Vec<RecordData>, Option<DecodeError>) {
    let mut records = Vec::new();

    while cur.remaining() > 0 {
        match cur.read_u16() {
            Ok(serial) => records.push(RecordData::Logout(LogoutEvent { serial })),
            Err(err) => {
                log::warn!("logout sub-record failed to decode: {err}");
                return (records, Some(err));
            }
        }
    }

    (records, None)
}
