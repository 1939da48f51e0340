//! Text records of bindings, one per line.
//!
//! Input binding: `uid, port, command, sensitivity, turbo[, slot[, dead_zone]]`.
//! Force feedback: `effect_id port, motor, slot[, axis_id, force]*`.
//! Integers are decimal or `0x` hex.

use std::fmt;
use std::str::FromStr;

use padweave_device::{ControlUid, MOTORS, PORTS, SLOTS};
use smallvec::SmallVec;

use crate::command::PadCommand;
use crate::RecordError;

const BINDING_FIELDS: [&str; 7] =
    ["uid", "port", "command", "sensitivity", "turbo", "slot", "dead_zone"];
const REQUIRED_BINDING_FIELDS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindingRecord {
    pub uid: ControlUid,
    pub port: usize,
    pub command: PadCommand,
    pub sensitivity: i32,
    pub turbo: u8,
    pub slot: usize,
    pub dead_zone: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectRecord {
    pub effect_id: Box<str>,
    pub port: usize,
    pub motor: u8,
    pub slot: usize,
    /// `(axis_id, force)` pairs.
    pub axes: SmallVec<[(i32, i32); 4]>,
}

fn parse_int(field: &'static str, value: &str) -> Result<i64, RecordError> {
    let value = value.trim();
    let (negative, digits) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value),
    };
    let parsed = match digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        Some(hex) => i64::from_str_radix(hex, 16),
        None => digits.parse::<i64>(),
    };
    let magnitude = parsed.map_err(|_| RecordError::InvalidNumber {
        field,
        value: value.to_owned(),
    })?;
    Ok(if negative { -magnitude } else { magnitude })
}

fn parse_i32(field: &'static str, value: &str) -> Result<i32, RecordError> {
    let parsed = parse_int(field, value)?;
    i32::try_from(parsed).map_err(|_| RecordError::InvalidNumber {
        field,
        value: value.trim().to_owned(),
    })
}

fn parse_port(value: &str) -> Result<usize, RecordError> {
    let port = parse_int("port", value)?;
    usize::try_from(port)
        .ok()
        .filter(|&port| port < PORTS)
        .ok_or(RecordError::PortOutOfRange(port))
}

fn parse_slot(value: &str) -> Result<usize, RecordError> {
    let slot = parse_int("slot", value)?;
    usize::try_from(slot)
        .ok()
        .filter(|&slot| slot < SLOTS)
        .ok_or(RecordError::SlotOutOfRange(slot))
}

impl FromStr for BindingRecord {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: SmallVec<[&str; 7]> = s.split(',').map(str::trim).collect();
        if fields.len() < REQUIRED_BINDING_FIELDS {
            return Err(RecordError::MissingField(BINDING_FIELDS[fields.len()]));
        }

        let uid = parse_int("uid", fields[0])?;
        let uid = u32::try_from(uid).map_err(|_| RecordError::InvalidNumber {
            field: "uid",
            value: fields[0].to_owned(),
        })?;
        let port = parse_port(fields[1])?;
        let command = parse_int("command", fields[2])?;
        let command = u8::try_from(command)
            .ok()
            .and_then(|id| PadCommand::try_from(id).ok())
            .ok_or(RecordError::UnknownCommand(command))?;
        let sensitivity = parse_i32("sensitivity", fields[3])?;
        let turbo = parse_int("turbo", fields[4])?;
        let turbo = u8::try_from(turbo).map_err(|_| RecordError::InvalidNumber {
            field: "turbo",
            value: fields[4].to_owned(),
        })?;
        let slot = fields.get(5).map_or(Ok(0), |value| parse_slot(value))?;
        let dead_zone = fields.get(6).map_or(Ok(0), |value| parse_i32("dead_zone", value))?;

        Ok(Self {
            uid: ControlUid::from_raw(uid),
            port,
            command,
            sensitivity,
            turbo,
            slot,
            dead_zone,
        })
    }
}

impl fmt::Display for BindingRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {}, {}, {}, {}, {}, {}",
            self.uid,
            self.port,
            self.command.id(),
            self.sensitivity,
            self.turbo,
            self.slot,
            self.dead_zone
        )
    }
}

impl FromStr for EffectRecord {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (effect_id, rest) = s
            .split_once(char::is_whitespace)
            .ok_or(RecordError::MissingField("port"))?;
        let fields: SmallVec<[&str; 8]> = rest.split(',').map(str::trim).collect();
        let mut fields = fields.into_iter();

        let port = parse_port(fields.next().ok_or(RecordError::MissingField("port"))?)?;
        let motor = parse_int("motor", fields.next().ok_or(RecordError::MissingField("motor"))?)?;
        let motor = u8::try_from(motor)
            .ok()
            .filter(|&motor| motor < MOTORS)
            .ok_or(RecordError::MotorOutOfRange(motor))?;
        let slot = parse_slot(fields.next().ok_or(RecordError::MissingField("slot"))?)?;

        let mut axes = SmallVec::new();
        // A trailing axis id without a force is ignored.
        while let (Some(axis_id), Some(force)) = (fields.next(), fields.next()) {
            axes.push((parse_i32("axis_id", axis_id)?, parse_i32("force", force)?));
        }

        Ok(Self {
            effect_id: effect_id.into(),
            port,
            motor,
            slot,
            axes,
        })
    }
}

impl fmt::Display for EffectRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}, {}, {}", self.effect_id, self.port, self.motor, self.slot)?;
        for (axis_id, force) in &self.axes {
            write!(f, ", {axis_id}, {force}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_binding_record() {
        let record: BindingRecord = "0x80040001, 1, 32, -65536, 1, 2, 4096".parse().unwrap();
        assert_eq!(record.uid.raw(), 0x8004_0001);
        assert_eq!(record.port, 1);
        assert_eq!(record.command, PadCommand::LeftStickUp);
        assert_eq!(record.sensitivity, -65536);
        assert_eq!(record.turbo, 1);
        assert_eq!(record.slot, 2);
        assert_eq!(record.dead_zone, 4096);
    }

    #[test]
    fn short_binding_record_defaults_slot_and_dead_zone() {
        let record: BindingRecord = "0x00010002, 0, 0x1F, 0x10000, 0".parse().unwrap();
        assert_eq!(record.command, PadCommand::Cross);
        assert_eq!(record.sensitivity, 0x10000);
        assert_eq!((record.slot, record.dead_zone), (0, 0));
    }

    #[test]
    fn rejects_malformed_binding_records() {
        assert_eq!(
            "0x00010002, 0, 31".parse::<BindingRecord>(),
            Err(RecordError::MissingField("sensitivity"))
        );
        assert_eq!(
            "0x00010002, 2, 31, 65536, 0".parse::<BindingRecord>(),
            Err(RecordError::PortOutOfRange(2))
        );
        assert_eq!(
            "0x00010002, 0, 31, 65536, 0, 4".parse::<BindingRecord>(),
            Err(RecordError::SlotOutOfRange(4))
        );
        assert_eq!(
            "0x00010002, 0, 0x40, 65536, 0".parse::<BindingRecord>(),
            Err(RecordError::UnknownCommand(0x40))
        );
        assert!(matches!(
            "button, 0, 31, 65536, 0".parse::<BindingRecord>(),
            Err(RecordError::InvalidNumber { field: "uid", .. })
        ));
        assert!("".parse::<BindingRecord>().is_err());
    }

    #[test]
    fn binding_record_display_matches_stored_layout() {
        let record = BindingRecord {
            uid: ControlUid::from_raw(0x0001_0002),
            port: 0,
            command: PadCommand::Cross,
            sensitivity: 65536,
            turbo: 0,
            slot: 3,
            dead_zone: 0,
        };
        assert_eq!(record.to_string(), "0x00010002, 0, 31, 65536, 0, 3, 0");
    }

    #[test]
    fn parses_effect_record_with_axes() {
        let record: EffectRecord = "constant 1, 0, 2, 0, 10000, 4, -500".parse().unwrap();
        assert_eq!(record.effect_id.as_ref(), "constant");
        assert_eq!((record.port, record.motor, record.slot), (1, 0, 2));
        assert_eq!(record.axes.as_slice(), &[(0, 10_000), (4, -500)]);
        assert_eq!(record.to_string(), "constant 1, 0, 2, 0, 10000, 4, -500");
    }

    #[test]
    fn effect_record_ignores_dangling_axis() {
        let record: EffectRecord = "sine 0, 1, 0, 7".parse().unwrap();
        assert!(record.axes.is_empty());
    }

    #[test]
    fn rejects_malformed_effect_records() {
        assert_eq!("constant".parse::<EffectRecord>(), Err(RecordError::MissingField("port")));
        assert_eq!(
            "constant 0, 1".parse::<EffectRecord>(),
            Err(RecordError::MissingField("slot"))
        );
        assert_eq!(
            "constant 0, 2, 0".parse::<EffectRecord>(),
            Err(RecordError::MotorOutOfRange(2))
        );
    }
}
