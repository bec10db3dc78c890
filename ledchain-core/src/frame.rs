//! MAX7219 register map and chained frame layout.
//!
//! ## Wire format
//!
//! Every chip takes a 16-bit frame, MSB first: register address byte, then
//! data byte. Chips are daisy-chained DOUT → DIN, so a frame clocked into the
//! first chip is pushed on to the next one by the following frame. Data is
//! latched by all chips together on the rising edge of chip-select, which is
//! why one *latch* is exactly one frame per chip sent in a single transport
//! write.
//!
//! ## Ordering
//!
//! Module 0 is the chip whose DIN is wired to the controller. Inside a latch
//! the frame for the furthest chip (index `N-1`) goes out first and module 0's
//! frame last. Chips that should not change receive a no-op frame.

use crate::font::{self, DIGITS};
use crate::types::ModuleState;

/// Bytes per chip frame.
pub const FRAME_LEN: usize = 2;

/// A MAX7219 register address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    NoOp,
    /// Digit register 0..=7; digit 0 is the rightmost position.
    Digit(u8),
    DecodeMode,
    Intensity,
    ScanLimit,
    Shutdown,
    DisplayTest,
}

impl Register {
    pub fn address(self) -> u8 {
        match self {
            Register::NoOp => 0x00,
            Register::Digit(n) => 0x01 + (n & 0x07),
            Register::DecodeMode => 0x09,
            Register::Intensity => 0x0A,
            Register::ScanLimit => 0x0B,
            Register::Shutdown => 0x0C,
            Register::DisplayTest => 0x0F,
        }
    }
}

/// Digit registers in address order.
pub const DIGIT_REGISTERS: [Register; DIGITS] = [
    Register::Digit(0),
    Register::Digit(1),
    Register::Digit(2),
    Register::Digit(3),
    Register::Digit(4),
    Register::Digit(5),
    Register::Digit(6),
    Register::Digit(7),
];

/// Registers written by a full flush, one latch each, in transmission order.
///
/// Configuration first so a chip that just powered up is in no-decode,
/// full-scan mode before digit data arrives; shutdown last so the display
/// only turns on once its content is in place.
pub const SWEEP: [Register; 13] = [
    Register::DisplayTest,
    Register::DecodeMode,
    Register::ScanLimit,
    Register::Intensity,
    Register::Digit(0),
    Register::Digit(1),
    Register::Digit(2),
    Register::Digit(3),
    Register::Digit(4),
    Register::Digit(5),
    Register::Digit(6),
    Register::Digit(7),
    Register::Shutdown,
];

pub const INTENSITY_REGISTERS: [Register; 1] = [Register::Intensity];
pub const POWER_REGISTERS: [Register; 1] = [Register::Shutdown];

/// Register contents of one chip, rendered from its [`ModuleState`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChipImage {
    digits: [u8; DIGITS],
    intensity: u8,
    powered: bool,
}

impl ChipImage {
    pub fn render(state: &ModuleState) -> Self {
        Self {
            digits: font::render_number(state.displayed()),
            intensity: state.brightness.level(),
            powered: state.powered,
        }
    }

    /// Data byte this chip should hold in `register`.
    pub fn data(&self, register: Register) -> u8 {
        match register {
            Register::NoOp => 0x00,
            Register::Digit(n) => self.digits[usize::from(n & 0x07)],
            Register::DecodeMode => 0x00,
            Register::Intensity => self.intensity,
            Register::ScanLimit => (DIGITS - 1) as u8,
            Register::Shutdown => u8::from(self.powered),
            Register::DisplayTest => 0x00,
        }
    }

    pub fn digits(&self) -> &[u8; DIGITS] {
        &self.digits
    }
}

/// One latch addressing `register` on every chip.
///
/// `images[i]` is module `i`; the furthest chip's frame is emitted first.
pub fn latch(images: &[ChipImage], register: Register) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(images.len() * FRAME_LEN);
    for image in images.iter().rev() {
        bytes.push(register.address());
        bytes.push(image.data(register));
    }
    bytes
}

/// One latch writing `data` to `register` on module `index` only.
///
/// Every other position gets a no-op frame so the addressed chip's frame is
/// shifted to the right place without disturbing the rest of the chain.
pub fn targeted_latch(count: usize, index: usize, register: Register, data: u8) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(count * FRAME_LEN);
    for position in (0..count).rev() {
        if position == index {
            bytes.push(register.address());
            bytes.push(data);
        } else {
            bytes.push(Register::NoOp.address());
            bytes.push(0x00);
        }
    }
    bytes
}

/// Split a latch back into per-module `(address, data)` frames, module 0 first.
pub fn decode_latch(bytes: &[u8]) -> Vec<(u8, u8)> {
    let mut frames: Vec<(u8, u8)> = bytes
        .chunks_exact(FRAME_LEN)
        .map(|f| (f[0], f[1]))
        .collect();
    frames.reverse();
    frames
}
