/// Codecs for 18-bit words.
///
/// Paper tape ("ptr"): three bytes per word, six bits each, high bits
/// first; bit 7 of the first byte marks the start of a word.
/// SimH: four bytes per word, little-endian.
/// Text: two characters per word, 9 bits each, first character high.
use crate::layout::WORD_MASK;

pub fn ptr_encode(word: u32) -> [u8; 3] {
    [
        (((word >> 12) & 0o77) | 0o200) as u8,
        ((word >> 6) & 0o77) as u8,
        (word & 0o77) as u8,
    ]
}

pub fn ptr_decode(bytes: [u8; 3]) -> u32 {
    ((bytes[0] as u32 & 0o77) << 12) | ((bytes[1] as u32 & 0o77) << 6) | (bytes[2] as u32 & 0o77)
}

pub fn simh_encode(word: u32) -> [u8; 4] {
    (word & WORD_MASK).to_le_bytes()
}

#[cfg(test)]
pub fn simh_decode(bytes: [u8; 4]) -> u32 {
    u32::from_le_bytes(bytes) & WORD_MASK
}

pub fn pack_chars(first: u8, second: u8) -> u32 {
    ((first as u32 & 0o777) << 9) | (second as u32 & 0o777)
}

/// The two 9-bit halves of a word as characters. A half outside printable
/// ASCII, high bits included, shows as a space.
pub fn ascii_pair(word: u32) -> [char; 2] {
    let show = |c: u32| {
        if (0x20..=0x7e).contains(&c) {
            c as u8 as char
        } else {
            ' '
        }
    };
    [show((word >> 9) & 0o777), show(word & 0o777)]
}
