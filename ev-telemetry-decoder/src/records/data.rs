//! Data-report record grammar (commands 0x02 and 0x03)
//!
//! The record stream starts at the fixed data-unit offset and must end
//! exactly at the byte before the checksum. Each record is one tag byte
//! followed by a tag-specific layout; count-prefixed arrays have length
//! exactly equal to their count field. Realtime (0x02) and reissued (0x03)
//! reports share this grammar and are decoded identically.

use crate::commands::record_tag_name;
use crate::cursor::Cursor;
use crate::records::{tag_handler, TagHandler};
use crate::types::{
    Alarms, DecodeError, Extremes, MotorStatus, PackTemperature, PackVoltage, Position,
    RecordData, Result, VehicleStatus,
};

/// Offset applied to every raw temperature-probe byte (wire range maps to
/// -40..=215 degC)
const PROBE_TEMPERATURE_OFFSET: i16 = 40;

/// Decode the record stream of one data-report body
///
/// The cursor is confined to the stream window, so a record that would
/// overrun the body fails with `Truncated` rather than reading into the
/// checksum or beyond. Records decoded before a mid-stream failure are
/// returned alongside the error.
pub fn decode_report_stream(cur: &mut Cursor) -> (Vec<RecordData>, Option<DecodeError>) {
    let mut records = Vec::new();

    while cur.remaining() > 0 {
        let tag = match cur.read_u8() {
            Ok(tag) => tag,
            Err(err) => return (records, Some(err)),
        };

        let decoded = match tag_handler(tag) {
            TagHandler::Decode(decode) => decode(cur),
            TagHandler::VendorLengthPrefixed => vendor_custom(tag, cur),
            TagHandler::Unsupported => {
                log::warn!(
                    "unsupported record tag 0x{tag:02X} ({}); dropping remainder of frame",
                    record_tag_name(tag)
                );
                return (records, Some(DecodeError::UnsupportedTag(tag)));
            }
        };

        match decoded {
            Ok(record) => records.push(record),
            Err(err) => {
                log::warn!(
                    "record tag 0x{tag:02X} ({}) failed to decode: {err}",
                    record_tag_name(tag)
                );
                return (records, Some(err));
            }
        }
    }

    (records, None)
}

/// Vehicle status (tag 0x01): 20 fixed bytes
pub fn vehicle_status(cur: &mut Cursor) -> Result<RecordData> {
    Ok(RecordData::VehicleStatus(VehicleStatus {
        vehicle_status: cur.read_u8()?,
        charging_status: cur.read_u8()?,
        operation_mode: cur.read_u8()?,
        speed: cur.read_u16()?,
        mileage: cur.read_u32()?,
        total_voltage: cur.read_u16()?,
        total_current: cur.read_u16()?,
        soc: cur.read_u8()?,
        dc_dc_status: cur.read_u8()?,
        gear: cur.read_u8()?,
        insulation_resistance: cur.read_u16()?,
        accelerator_pedal: cur.read_u8()?,
        brake_status: cur.read_u8()?,
    }))
}

/// Motor status (tag 0x02): count byte, then 12 bytes per motor
pub fn motor_status(cur: &mut Cursor) -> Result<RecordData> {
    let count = cur.read_u8()?;
    let mut motors = Vec::with_capacity(usize::from(count));

    for _ in 0..count {
        motors.push(MotorStatus {
            index: cur.read_u8()?,
            status: cur.read_u8()?,
            controller_temperature: cur.read_u8()?,
            speed: cur.read_u16()?,
            torque: cur.read_u16()?,
            motor_temperature: cur.read_u8()?,
            controller_input_voltage: cur.read_u16()?,
            controller_bus_current: cur.read_u16()?,
        });
    }

    Ok(RecordData::MotorStatus { motors })
}

/// Position (tag 0x05): 9 bytes
pub fn position(cur: &mut Cursor) -> Result<RecordData> {
    Ok(RecordData::Position(Position {
        location_status: cur.read_u8()?,
        longitude: cur.read_u32()?,
        latitude: cur.read_u32()?,
    }))
}

/// Voltage/temperature extremes (tag 0x06): 14 bytes
pub fn extremes(cur: &mut Cursor) -> Result<RecordData> {
    Ok(RecordData::Extremes(Extremes {
        max_voltage_subsystem: cur.read_u8()?,
        max_voltage_cell: cur.read_u8()?,
        max_cell_voltage: cur.read_u16()?,
        min_voltage_subsystem: cur.read_u8()?,
        min_voltage_cell: cur.read_u8()?,
        min_cell_voltage: cur.read_u16()?,
        max_temp_subsystem: cur.read_u8()?,
        max_temp_probe: cur.read_u8()?,
        max_temperature: cur.read_u8()?,
        min_temp_subsystem: cur.read_u8()?,
        min_temp_probe: cur.read_u8()?,
        min_temperature: cur.read_u8()?,
    }))
}

/// Alarms (tag 0x07): 5-byte header, then four count-prefixed u32 fault
/// lists in fixed order
///
/// Each list is consumed even when its count is zero (the count byte alone).
pub fn alarms(cur: &mut Cursor) -> Result<RecordData> {
    let highest_level = cur.read_u8()?;
    let general_flags = cur.read_u32()?;

    let battery_faults = fault_list(cur)?;
    let motor_faults = fault_list(cur)?;
    let engine_faults = fault_list(cur)?;
    let other_faults = fault_list(cur)?;

    Ok(RecordData::Alarms(Alarms {
        highest_level,
        general_flags,
        battery_faults,
        motor_faults,
        engine_faults,
        other_faults,
    }))
}

fn fault_list(cur: &mut Cursor) -> Result<Vec<u32>> {
    let count = cur.read_u8()?;
    let mut codes = Vec::with_capacity(usize::from(count));
    for _ in 0..count {
        codes.push(cur.read_u32()?);
    }
    Ok(codes)
}

/// Pack voltages (tag 0x08): count byte, then per pack a 10-byte header and
/// this frame's cell-voltage slice
pub fn pack_voltage(cur: &mut Cursor) -> Result<RecordData> {
    let count = cur.read_u8()?;
    let mut packs = Vec::with_capacity(usize::from(count));

    for _ in 0..count {
        let pack_id = cur.read_u8()?;
        let voltage = cur.read_u16()?;
        let current = cur.read_u16()?;
        let cell_total = cur.read_u16()?;
        let frame_start_cell = cur.read_u16()?;
        let frame_cell_count = cur.read_u8()?;

        let mut cell_voltages = Vec::with_capacity(usize::from(frame_cell_count));
        for _ in 0..frame_cell_count {
            cell_voltages.push(cur.read_u16()?);
        }

        packs.push(PackVoltage {
            pack_id,
            voltage,
            current,
            cell_total,
            frame_start_cell,
            cell_voltages,
        });
    }

    Ok(RecordData::PackVoltage { packs })
}

/// Pack temperatures (tag 0x09): count byte, then per pack a pack id, a u16
/// probe count and one byte per probe, each stored as `raw - 40`
pub fn pack_temperature(cur: &mut Cursor) -> Result<RecordData> {
    let count = cur.read_u8()?;
    let mut packs = Vec::with_capacity(usize::from(count));

    for _ in 0..count {
        let pack_id = cur.read_u8()?;
        let probe_count = cur.read_u16()?;

        let mut probe_temperatures = Vec::with_capacity(usize::from(probe_count));
        for _ in 0..probe_count {
            probe_temperatures.push(i16::from(cur.read_u8()?) - PROBE_TEMPERATURE_OFFSET);
        }

        packs.push(PackTemperature {
            pack_id,
            probe_temperatures,
        });
    }

    Ok(RecordData::PackTemperature { packs })
}

/// Vendor-custom block (tags 0xA0-0xA4): u16 length prefix, then that many
/// payload bytes, captured raw
fn vendor_custom(tag: u8, cur: &mut Cursor) -> Result<RecordData> {
    let len = cur.read_u16()?;
    let payload = cur.read_bytes(usize::from(len))?.to_vec();
    Ok(RecordData::VendorCustom { tag, payload })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vehicle_status_layout() {
        let mut body = vec![
            0x01, // running
            0x03, // not charging
            0x01, // pure electric
        ];
        body.extend_from_slice(&1200u16.to_be_bytes()); // speed
        body.extend_from_slice(&152_709u32.to_be_bytes()); // mileage
        body.extend_from_slice(&3521u16.to_be_bytes()); // total voltage
        body.extend_from_slice(&10_215u16.to_be_bytes()); // total current
        body.push(86); // SOC
        body.push(0x01); // DC-DC on
        body.push(0x0D); // gear
        body.extend_from_slice(&4092u16.to_be_bytes()); // insulation
        body.push(12); // accel pedal
        body.push(0); // brake

        let mut cur = Cursor::new(&body);
        let RecordData::VehicleStatus(status) = vehicle_status(&mut cur).unwrap() else {
            panic!("wrong variant");
        };

        assert_eq!(cur.remaining(), 0);
        assert_eq!(status.speed, 1200);
        assert_eq!(status.mileage, 152_709);
        assert_eq!(status.total_voltage, 3521);
        assert_eq!(status.soc, 86);
        assert_eq!(status.gear, 0x0D);
        assert_eq!(status.insulation_resistance, 4092);
    }

    #[test]
    fn test_motor_status_two_entries() {
        let mut body = vec![2u8];
        for index in 1..=2u8 {
            body.push(index);
            body.push(0x04);
            body.push(65);
            body.extend_from_slice(&8000u16.to_be_bytes());
            body.extend_from_slice(&21000u16.to_be_bytes());
            body.push(70);
            body.extend_from_slice(&3500u16.to_be_bytes());
            body.extend_from_slice(&10200u16.to_be_bytes());
        }

        let mut cur = Cursor::new(&body);
        let RecordData::MotorStatus { motors } = motor_status(&mut cur).unwrap() else {
            panic!("wrong variant");
        };

        assert_eq!(cur.remaining(), 0);
        assert_eq!(motors.len(), 2);
        assert_eq!(motors[0].index, 1);
        assert_eq!(motors[1].index, 2);
        assert_eq!(motors[0].speed, 8000);
        assert_eq!(motors[1].controller_bus_current, 10200);
    }

    #[test]
    fn test_alarms_all_counts_zero_consume_nine_bytes() {
        let mut body = vec![0x00];
        body.extend_from_slice(&0u32.to_be_bytes());
        body.extend_from_slice(&[0, 0, 0, 0]); // four empty fault lists

        let mut cur = Cursor::new(&body);
        let RecordData::Alarms(alarms) = alarms(&mut cur).unwrap() else {
            panic!("wrong variant");
        };

        assert_eq!(cur.position(), 9);
        assert!(alarms.battery_faults.is_empty());
        assert!(alarms.motor_faults.is_empty());
        assert!(alarms.engine_faults.is_empty());
        assert!(alarms.other_faults.is_empty());
    }

    #[test]
    fn test_alarms_with_fault_codes() {
        let mut body = vec![0x02];
        body.extend_from_slice(&0x0000_0010u32.to_be_bytes());
        body.push(2); // two battery faults
        body.extend_from_slice(&0x0001_0001u32.to_be_bytes());
        body.extend_from_slice(&0x0001_0002u32.to_be_bytes());
        body.push(0); // motor
        body.push(1); // engine
        body.extend_from_slice(&0x0002_0001u32.to_be_bytes());
        body.push(0); // other

        let mut cur = Cursor::new(&body);
        let RecordData::Alarms(alarms) = alarms(&mut cur).unwrap() else {
            panic!("wrong variant");
        };

        assert_eq!(cur.remaining(), 0);
        assert_eq!(alarms.highest_level, 2);
        assert_eq!(alarms.battery_faults, vec![0x0001_0001, 0x0001_0002]);
        assert!(alarms.motor_faults.is_empty());
        assert_eq!(alarms.engine_faults, vec![0x0002_0001]);
    }

    #[test]
    fn test_pack_voltage_sub_record_consumes_sixteen_bytes() {
        let mut body = vec![1u8]; // one pack
        body.push(1); // pack id
        body.extend_from_slice(&3521u16.to_be_bytes());
        body.extend_from_slice(&10000u16.to_be_bytes());
        body.extend_from_slice(&96u16.to_be_bytes()); // total cells
        body.extend_from_slice(&1u16.to_be_bytes()); // frame start cell
        body.push(3); // cells in this frame
        for v in [4101u16, 4102, 4099] {
            body.extend_from_slice(&v.to_be_bytes());
        }

        let mut cur = Cursor::new(&body);
        let RecordData::PackVoltage { packs } = pack_voltage(&mut cur).unwrap() else {
            panic!("wrong variant");
        };

        // Count byte plus the 10 + 6 byte sub-record
        assert_eq!(cur.position(), 17);
        assert_eq!(packs.len(), 1);
        assert_eq!(packs[0].cell_voltages, vec![4101, 4102, 4099]);
        assert_eq!(packs[0].cell_total, 96);
    }

    #[test]
    fn test_probe_temperature_offset() {
        let mut body = vec![1u8]; // one pack
        body.push(1); // pack id
        body.extend_from_slice(&2u16.to_be_bytes()); // two probes
        body.push(45);
        body.push(0);

        let mut cur = Cursor::new(&body);
        let RecordData::PackTemperature { packs } = pack_temperature(&mut cur).unwrap() else {
            panic!("wrong variant");
        };

        assert_eq!(cur.remaining(), 0);
        assert_eq!(packs[0].probe_temperatures, vec![5, -40]);
    }

    #[test]
    fn test_vendor_block_skips_by_length_prefix() {
        let mut body = vec![0xA1u8];
        body.extend_from_slice(&4u16.to_be_bytes());
        body.extend_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);

        let mut cur = Cursor::new(&body);
        let tag = cur.read_u8().unwrap();
        let RecordData::VendorCustom { tag, payload } = vendor_custom(tag, &mut cur).unwrap()
        else {
            panic!("wrong variant");
        };

        assert_eq!(cur.remaining(), 0);
        assert_eq!(tag, 0xA1);
        assert_eq!(payload, vec![0xDE, 0xAD, 0xBE, 0xEF]);
    }

    #[test]
    fn test_stream_stops_on_unsupported_tag() {
        // A well-formed position record followed by a fuel-cell record
        let mut body = vec![0x05, 0x00];
        body.extend_from_slice(&116_397_000u32.to_be_bytes());
        body.extend_from_slice(&39_916_000u32.to_be_bytes());
        body.push(0x03);
        body.extend_from_slice(&[0xAA; 8]);

        let mut cur = Cursor::new(&body);
        let (records, error) = decode_report_stream(&mut cur);

        assert_eq!(records.len(), 1);
        assert!(matches!(records[0], RecordData::Position(_)));
        assert_eq!(error, Some(DecodeError::UnsupportedTag(0x03)));
    }

    #[test]
    fn test_stream_truncated_record_keeps_earlier_records() {
        let mut body = vec![0x05, 0x00];
        body.extend_from_slice(&116_397_000u32.to_be_bytes());
        body.extend_from_slice(&39_916_000u32.to_be_bytes());
        // Vehicle status tag with only 3 of its 20 bytes present
        body.extend_from_slice(&[0x01, 0x01, 0x03, 0x01]);

        let mut cur = Cursor::new(&body);
        let (records, error) = decode_report_stream(&mut cur);

        assert_eq!(records.len(), 1);
        assert!(matches!(error, Some(DecodeError::Truncated { .. })));
    }

    #[test]
    fn test_empty_stream_yields_nothing() {
        let mut cur = Cursor::new(&[]);
        let (records, error) = decode_report_stream(&mut cur);
        assert!(records.is_empty());
        assert!(error.is_none());
    }
}
