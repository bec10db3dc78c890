//! 7-segment font for MAX7219 no-decode mode.
//!
//! Segment bits, MSB first: `DP A B C D E F G`.

/// Number of digit registers per chip.
pub const DIGITS: usize = 8;

pub const BLANK: u8 = 0x00;
pub const MINUS: u8 = 0x01;

const NUMERALS: [u8; 10] = [
    0x7E, // 0
    0x30, // 1
    0x6D, // 2
    0x79, // 3
    0x33, // 4
    0x5B, // 5
    0x5F, // 6
    0x70, // 7
    0x7F, // 8
    0x7B, // 9
];

/// Segment pattern for an ASCII digit or `-`; anything else is blank.
pub fn glyph(c: char) -> u8 {
    match c {
        '0'..='9' => NUMERALS[(c as u8 - b'0') as usize],
        '-' => MINUS,
        _ => BLANK,
    }
}

/// Characters `value` shows on one chip: its decimal form, or
/// [`DIGITS`] dashes when that is wider than the display.
pub fn display_text(value: i32) -> String {
    let text = value.to_string();
    if text.len() > DIGITS {
        "-".repeat(DIGITS)
    } else {
        text
    }
}

/// Render `value` right-aligned into digit registers.
///
/// Index 0 of the result is digit register 0, the rightmost position.
/// `None` renders blank. Numbers wider than [`DIGITS`] render as all dashes.
pub fn render_number(value: Option<i32>) -> [u8; DIGITS] {
    let mut digits = [BLANK; DIGITS];
    let Some(value) = value else {
        return digits;
    };

    for (slot, c) in digits.iter_mut().zip(display_text(value).chars().rev()) {
        *slot = glyph(c);
    }
    digits
}
