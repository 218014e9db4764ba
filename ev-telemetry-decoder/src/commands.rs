//! Protocol code tables
//!
//! Human-readable labels for command bytes, response bytes and data-unit
//! tags. These drive the `CommandObserved` record and diagnostic logging;
//! they are lookup tables only, never dispatch logic.

/// Vehicle login command
pub const CMD_LOGIN: u8 = 0x01;
/// Realtime information report
pub const CMD_REALTIME_REPORT: u8 = 0x02;
/// Reissued (store-and-forward) information report
pub const CMD_REISSUED_REPORT: u8 = 0x03;
/// Vehicle logout command
pub const CMD_LOGOUT: u8 = 0x04;

/// Name a command byte per the protocol's command table
pub fn command_name(command: u8) -> &'static str {
    match command {
        CMD_LOGIN => "vehicle login",
        CMD_REALTIME_REPORT => "realtime report",
        CMD_REISSUED_REPORT => "reissued report",
        CMD_LOGOUT => "vehicle logout",
        0x05 => "platform login",
        0x06 => "platform logout",
        0x07 => "heartbeat",
        0x08 => "terminal reserved",
        0x09..=0x7F => "upstream reserved",
        0x80..=0x82 => "terminal reserved",
        0x83..=0xBF => "downstream reserved",
        0xC0..=0xFE => "platform exchange",
        _ => "unassigned",
    }
}

/// Name a response byte
pub fn response_name(response: u8) -> &'static str {
    match response {
        0x01 => "success",
        0x02 => "error",
        0x03 => "duplicate VIN",
        0xFE => "command",
        _ => "unassigned",
    }
}

/// Name a data-unit tag for diagnostics and logging
pub fn record_tag_name(tag: u8) -> &'static str {
    match tag {
        0x01 => "vehicle status",
        0x02 => "motor status",
        0x03 => "fuel cell",
        0x04 => "engine",
        0x05 => "position",
        0x06 => "extremes",
        0x07 => "alarms",
        0x08 => "pack voltage",
        0x09 => "pack temperature",
        0x0A..=0x2F => "platform exchange custom",
        0x30..=0x7F => "reserved",
        0x80..=0xFE => "vendor custom",
        _ => "unassigned",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_names() {
        assert_eq!(command_name(0x01), "vehicle login");
        assert_eq!(command_name(0x02), "realtime report");
        assert_eq!(command_name(0x03), "reissued report");
        assert_eq!(command_name(0x04), "vehicle logout");
        assert_eq!(command_name(0x07), "heartbeat");
        // Range entries
        assert_eq!(command_name(0x09), "upstream reserved");
        assert_eq!(command_name(0x7F), "upstream reserved");
        assert_eq!(command_name(0x81), "terminal reserved");
        assert_eq!(command_name(0x90), "downstream reserved");
        assert_eq!(command_name(0xC0), "platform exchange");
        assert_eq!(command_name(0xFF), "unassigned");
    }

    #[test]
    fn test_response_names() {
        assert_eq!(response_name(0x01), "success");
        assert_eq!(response_name(0x03), "duplicate VIN");
        assert_eq!(response_name(0xFE), "command");
        assert_eq!(response_name(0x42), "unassigned");
    }

    #[test]
    fn test_record_tag_names() {
        assert_eq!(record_tag_name(0x01), "vehicle status");
        assert_eq!(record_tag_name(0x09), "pack temperature");
        assert_eq!(record_tag_name(0x0A), "platform exchange custom");
        assert_eq!(record_tag_name(0x30), "reserved");
        assert_eq!(record_tag_name(0xA0), "vendor custom");
    }
}
