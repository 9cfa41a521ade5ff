//! Text Module — themed-string measurement and the shared decoder.
//!
//! Responsibilities:
//! - Decoding multi-byte sequences embedded in themed strings
//! - The display-width oracle wrapper
//! - Escape-aware column measurement (`themed_width`)
//!
//! The renderer consumes bytes through the same decode step used here, so
//! the wrap lookahead can never disagree with actual placement.

use unicode_width::UnicodeWidthChar;

/// Escape introducer for style/color control codes.
pub const ESCAPE: u8 = b'%';
/// Introducer for a literal next byte.
pub const LITERAL: u8 = b'\\';

/// Decode one multi-byte sequence (lead byte above 0x7F) at the head of
/// `bytes`. Sequences are at most 3 bytes (the two- and three-byte UTF-8
/// forms). Returns the decoded character and the byte length consumed, or
/// `None` when the bytes do not form a valid sequence.
pub fn decode_sequence(bytes: &[u8]) -> Option<(char, usize)> {
    let lead = *bytes.first()?;
    let (len, init) = match lead {
        0xC0..=0xDF => (2, (lead & 0x1F) as u32),
        0xE0..=0xEF => (3, (lead & 0x0F) as u32),
        // ASCII is not a sequence; four-byte leads are outside the grammar.
        _ => return None,
    };
    if bytes.len() < len {
        return None;
    }
    let mut cp = init;
    for &b in &bytes[1..len] {
        if b & 0xC0 != 0x80 {
            return None;
        }
        cp = (cp << 6) | (b & 0x3F) as u32;
    }
    char::from_u32(cp).map(|ch| (ch, len))
}

/// Display width of one character in terminal cells (0, 1, or 2).
pub fn char_cells(ch: char) -> i32 {
    UnicodeWidthChar::width(ch).unwrap_or(0) as i32
}

/// Column width of the rendered content of a themed string, up to (not
/// including) the first occurrence of `stop` or end of input.
///
/// Escape sequences measure zero columns; a `\`-escaped byte measures
/// exactly one; a byte consumed by an introducer is never tested against
/// `stop`. Newlines measure zero but do not end the scan.
pub fn themed_width(text: &[u8], stop: Option<u8>) -> i32 {
    let mut cols = 0;
    let mut i = 0;
    while i < text.len() {
        let b = text[i];
        if Some(b) == stop {
            break;
        }
        if b == ESCAPE {
            // Control byte consumed unseen; a trailing introducer ends the scan.
            i += 2;
        } else if b == LITERAL {
            if i + 1 < text.len() {
                cols += 1;
            }
            i += 2;
        } else if b > 0x7F {
            match decode_sequence(&text[i..]) {
                Some((ch, len)) => {
                    cols += char_cells(ch);
                    i += len;
                }
                None => {
                    // The renderer writes the raw byte as one cell; count it
                    // the same way.
                    cols += 1;
                    i += 1;
                }
            }
        } else {
            if b != b'\n' {
                cols += 1;
            }
            i += 1;
        }
    }
    cols
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_ascii_width() {
        assert_eq!(themed_width(b"hello", None), 5);
        assert_eq!(themed_width(b"", None), 0);
    }

    #[test]
    fn test_escapes_measure_zero() {
        assert_eq!(themed_width(b"%Bhot%b", None), 3);
        // Digits and suppress codes after the introducer are controls too.
        assert_eq!(themed_width(b"%1%N%n%Cab", None), 2);
    }

    #[test]
    fn test_literal_escape_measures_one() {
        // "\%B" is the two characters '%' 'B'.
        assert_eq!(themed_width(b"\\%B", None), 2);
        // The escaped byte counts one column whatever it is.
        assert_eq!(themed_width(b"\\\\", None), 1);
    }

    #[test]
    fn test_trailing_introducers_end_scan() {
        assert_eq!(themed_width(b"ab%", None), 2);
        assert_eq!(themed_width(b"ab\\", None), 2);
    }

    #[test]
    fn test_stop_byte_halts_measurement() {
        assert_eq!(themed_width(b"hello world", Some(b' ')), 5);
        // A stop byte hidden behind an introducer does not stop the scan.
        assert_eq!(themed_width(b"a\\ b c", Some(b' ')), 3);
        assert_eq!(themed_width(b"a% b", Some(b' ')), 2);
    }

    #[test]
    fn test_newline_measures_zero_and_continues() {
        assert_eq!(themed_width(b"ab\ncd", None), 4);
    }

    #[test]
    fn test_wide_chars_measure_by_cells_not_bytes() {
        // U+6F22 U+5B57: three bytes each, two columns each.
        assert_eq!(themed_width("漢字".as_bytes(), None), 4);
        // Two-byte sequence, one column.
        assert_eq!(themed_width("é".as_bytes(), None), 1);
    }

    #[test]
    fn test_malformed_sequence_counts_one_column() {
        // Lone continuation byte and truncated lead.
        assert_eq!(themed_width(&[0x80, b'a'], None), 2);
        assert_eq!(themed_width(&[0xE6, 0xBC], None), 2);
    }

    #[test]
    fn test_four_byte_lead_falls_back_per_byte() {
        // U+1F600 is outside the 3-byte grammar: the lead is a raw cell and
        // the continuation bytes fall back the same way.
        let emoji = "😀".as_bytes();
        assert_eq!(themed_width(emoji, None), 4);
    }

    #[test]
    fn test_decode_sequence_shapes() {
        assert_eq!(decode_sequence("é".as_bytes()), Some(('é', 2)));
        assert_eq!(decode_sequence("漢".as_bytes()), Some(('漢', 3)));
        assert_eq!(decode_sequence(&[0x41]), None);
        assert_eq!(decode_sequence(&[0xE6, 0x28, 0xBC]), None);
        assert_eq!(decode_sequence(&[]), None);
    }

    #[test]
    fn test_char_cells_oracle_range() {
        assert_eq!(char_cells('a'), 1);
        assert_eq!(char_cells('漢'), 2);
        // Control characters are zero columns, never negative.
        assert_eq!(char_cells('\u{7}'), 0);
    }
}
