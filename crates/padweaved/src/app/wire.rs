//! Console side serialization of a pad's summed state.

use padweave_profile::PadType;
use smallvec::SmallVec;

use super::pad::{Pad, PadMode};
use super::sum::{cap, Button, ButtonSum, DPAD, LEFT_STICK, MAX_PRESSURE, RIGHT_STICK};

/// Command byte asking a pad for its buttons and sticks.
pub const READ_DATA: u8 = 0x42;
/// Second byte of every reply.
pub const REPLY_TAG: u8 = 0x5A;
/// Pressure at which a button reads as held in the digital bytes.
const PRESSED: i32 = 0x10;

/// Longest reply, sent in DS2 native mode.
pub const MAX_REPLY_LEN: usize = 20;

pub type Reply = SmallVec<[u8; MAX_REPLY_LEN]>;

/// Face and shoulder pressures, sent after the four D-pad pressures.
const PRESSURE_ORDER: [Button; 8] = [
    Button::Triangle,
    Button::Circle,
    Button::Square,
    Button::Cross,
    Button::L1,
    Button::R1,
    Button::L2,
    Button::R2,
];

/// Reply to [`READ_DATA`]: mode, tag, two active-low button bytes, then the
/// sticks outside digital mode and pressures in native mode.
#[must_use]
pub fn read_data_reply(pad: &Pad, pad_type: PadType, gh2: bool) -> Reply {
    let mut sum = *pad.sum();
    if pad_type == PadType::Guitar && !gh2 {
        // Guitars hold D-pad left to identify themselves.
        sum.sticks[DPAD].horiz = -MAX_PRESSURE;
    }
    let mode = pad.mode();
    let (low, high) = button_bytes(&sum);

    let mut reply = Reply::new();
    reply.extend_from_slice(&[mode.id(), REPLY_TAG, low, high]);
    if mode == PadMode::Digital {
        return reply;
    }
    for stick in [RIGHT_STICK, LEFT_STICK] {
        reply.push(stick_byte(sum.sticks[stick].horiz));
        reply.push(stick_byte(sum.sticks[stick].vert));
    }
    if mode == PadMode::Analog {
        return reply;
    }
    let dpad = sum.sticks[DPAD];
    reply.extend_from_slice(&[cap(dpad.horiz), cap(-dpad.horiz), cap(-dpad.vert), cap(dpad.vert)]);
    reply.extend(PRESSURE_ORDER.iter().map(|&button| cap(sum.button(button))));
    reply
}

/// Select, L3, R3, Start and the D-pad in the first byte, shoulders and
/// faces in the second. A cleared bit means pressed.
fn button_bytes(sum: &ButtonSum) -> (u8, u8) {
    let mut low = 0xFF_u8;
    let mut high = 0xFF_u8;
    for (bit, &value) in sum.buttons[..4].iter().enumerate() {
        if value >= PRESSED {
            low &= !(1 << bit);
        }
    }
    for (bit, &value) in sum.buttons[4..].iter().enumerate() {
        if value >= PRESSED {
            high &= !(1 << bit);
        }
    }
    let dpad = sum.sticks[DPAD];
    let directions = [
        dpad.vert <= -PRESSED,
        dpad.horiz >= PRESSED,
        dpad.vert >= PRESSED,
        dpad.horiz <= -PRESSED,
    ];
    for (bit, pressed) in directions.into_iter().enumerate() {
        if pressed {
            low &= !(1 << (bit + 4));
        }
    }
    (low, high)
}

#[inline]
fn stick_byte(value: i32) -> u8 {
    cap((value + MAX_PRESSURE) / 2)
}
