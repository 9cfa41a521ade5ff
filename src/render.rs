//! Render Module — themed-string drawing with clipping and word wrap.
//!
//! Responsibilities:
//! - Byte-by-byte traversal of a themed string
//! - Escape dispatch into StyleState; literal escapes; multi-byte placement
//! - Width clipping, embedded line breaks, word-wrap lookahead
//!
//! The traversal consumes bytes with exactly the rules `themed_width` uses,
//! so the lookahead and actual placement always agree.

use crate::style::StyleState;
use crate::surface::Surface;
use crate::text::{self, char_cells, decode_sequence, themed_width};
use crate::types::DrawOutcome;

/// Draw the visible characters of `input` into `surface` starting at
/// `(row, col)`, never writing past column `col + width`.
///
/// Stops early on end-of-string, an embedded `\n` (after clearing the rest
/// of the line), or, with `wrap`, at a word boundary whose following word
/// would not fit on this line but would fit on a fresh one. Escape codes
/// advance `style` as they are encountered and never move the column.
///
/// With `surface = None` the same traversal runs against the style state
/// alone, which is how escape-aware measuring is done.
pub fn draw(
    mut surface: Option<&mut (dyn Surface + '_)>,
    style: &mut StyleState,
    row: i32,
    col: i32,
    width: i32,
    wrap: bool,
    input: &[u8],
) -> DrawOutcome {
    if width <= 0 {
        return DrawOutcome::partial(0, col);
    }

    let limit = col + width;
    let mut x = col;
    let mut i = 0usize;

    while x <= limit {
        let Some(&b) = input.get(i) else {
            return DrawOutcome::consumed(x);
        };
        match b {
            b'\n' => {
                // This line is done; the remainder starts after the break.
                i += 1;
                if let Some(s) = surface.as_deref_mut() {
                    s.move_cursor(row, x);
                    s.clear_to_eol();
                }
                break;
            }
            text::LITERAL => {
                if i + 1 >= input.len() {
                    // A trailing introducer is an end-of-string.
                    return DrawOutcome::consumed(x);
                }
                let start = i;
                i += 1;
                if !place_glyph(surface.as_deref_mut(), row, limit, &mut x, &mut i, input) {
                    i = start;
                    break;
                }
            }
            text::ESCAPE => {
                if i + 1 >= input.len() {
                    return DrawOutcome::consumed(x);
                }
                style.apply(input[i + 1], surface.as_deref_mut());
                i += 2;
            }
            _ => {
                let start = i;
                if !place_glyph(surface.as_deref_mut(), row, limit, &mut x, &mut i, input) {
                    i = start;
                    break;
                }
                if wrap && b == b' ' {
                    // Bail on the line unless the next word fits in what is
                    // left of it. Words wider than the whole line overflow
                    // instead of wrapping; neither arm of the condition
                    // breaks for them.
                    let pending = themed_width(&input[i..], Some(b' '));
                    if pending >= limit - x && pending < width {
                        break;
                    }
                }
            }
        }
    }

    DrawOutcome::partial(i, x)
}

/// Place one glyph at the current column and advance the cursor and byte
/// offset past it. Returns false, consuming nothing, when a multi-column
/// glyph does not fit before `limit`, so a wide character is never split
/// across the clip boundary.
fn place_glyph(
    mut surface: Option<&mut (dyn Surface + '_)>,
    row: i32,
    limit: i32,
    x: &mut i32,
    i: &mut usize,
    input: &[u8],
) -> bool {
    let b = input[*i];
    if b <= 0x7F {
        if let Some(s) = surface.as_deref_mut() {
            s.put_char(row, *x, b as char);
        }
        *x += 1;
        *i += 1;
        return true;
    }
    match decode_sequence(&input[*i..]) {
        Some((ch, len)) => {
            let w = char_cells(ch);
            if w > limit - *x {
                return false;
            }
            if let Some(s) = surface.as_deref_mut() {
                s.put_char(row, *x, ch);
            }
            *x += w;
            *i += len;
            true
        }
        None => {
            // Malformed sequence: the lead byte becomes an ordinary cell.
            if let Some(s) = surface {
                s.put_char(row, *x, b as char);
            }
            *x += 1;
            *i += 1;
            true
        }
    }
}
