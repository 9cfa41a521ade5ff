//! Style Module — escape-code state machine.
//!
//! Responsibilities:
//! - Nesting counters for the five display attributes
//! - Suppress-all regions (`%N` / `%n`)
//! - Color-pair selection with one slot of history

use crate::surface::Surface;
use crate::types::{Attr, ATTR_COUNT, DEFAULT_PAIR};

/// Running style of the surface being drawn into.
///
/// Attribute toggles are reference-counted rather than boolean so that
/// styled regions can nest: an inner `%b` must not switch bold off while an
/// outer `%B` region is still open. Counters are signed and unclamped; an
/// unbalanced stream simply drives them negative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleState {
    counts: [i32; ATTR_COUNT],
    suppress: i32,
    cur_pair: u8,
    prev_pair: u8,
}

impl Default for StyleState {
    fn default() -> Self {
        Self::new()
    }
}

impl StyleState {
    pub fn new() -> Self {
        Self {
            counts: [0; ATTR_COUNT],
            suppress: 0,
            cur_pair: DEFAULT_PAIR,
            prev_pair: DEFAULT_PAIR,
        }
    }

    /// Interpret one escape control byte. `surface` is `None` for a dry run;
    /// counters and color history advance either way. Unrecognized bytes are
    /// tolerated as no-ops.
    pub fn apply(&mut self, code: u8, surface: Option<&mut (dyn Surface + '_)>) {
        if let Some((attr, on)) = attr_for(code) {
            if on {
                self.attr_on(attr, surface);
            } else {
                self.attr_off(attr, surface);
            }
            return;
        }

        match code {
            b'N' => {
                self.suppress += 1;
                if let Some(s) = surface {
                    s.clear_attrs();
                }
            }
            b'n' => {
                self.suppress -= 1;
                if self.suppress == 0 {
                    if let Some(s) = surface {
                        for attr in Attr::ALL {
                            if self.counts[attr as usize] > 0 {
                                s.set_attr(attr, true);
                            }
                        }
                    }
                }
            }
            b'C' => self.reset_attrs(surface),
            b'0' => {
                std::mem::swap(&mut self.cur_pair, &mut self.prev_pair);
                if let Some(s) = surface {
                    s.set_color_pair(self.cur_pair);
                }
            }
            b'1'..=b'8' => {
                self.prev_pair = self.cur_pair;
                self.cur_pair = code - b'0';
                if let Some(s) = surface {
                    s.set_color_pair(self.cur_pair);
                }
            }
            _ => {}
        }
    }

    /// Zero the attribute counters and clear surface attributes; the color
    /// history is untouched. Shared by the `%C` escape and `ink_reset_style`.
    pub fn reset_attrs(&mut self, surface: Option<&mut (dyn Surface + '_)>) {
        self.counts = [0; ATTR_COUNT];
        if let Some(s) = surface {
            s.clear_attrs();
        }
    }

    fn attr_on(&mut self, attr: Attr, surface: Option<&mut (dyn Surface + '_)>) {
        self.counts[attr as usize] += 1;
        if self.suppress == 0 {
            if let Some(s) = surface {
                s.set_attr(attr, true);
            }
        }
    }

    // The turn-off is applied even inside a suppress region (the surface
    // attributes are already cleared there, so it cannot be observed).
    fn attr_off(&mut self, attr: Attr, surface: Option<&mut (dyn Surface + '_)>) {
        self.counts[attr as usize] -= 1;
        if self.counts[attr as usize] == 0 {
            if let Some(s) = surface {
                s.set_attr(attr, false);
            }
        }
    }

    pub fn depth(&self, attr: Attr) -> i32 {
        self.counts[attr as usize]
    }

    pub fn suppress_depth(&self) -> i32 {
        self.suppress
    }

    pub fn color_pair(&self) -> u8 {
        self.cur_pair
    }
}

/// Attribute toggle codes: upper case switches on, lower case off.
fn attr_for(code: u8) -> Option<(Attr, bool)> {
    match code {
        b'B' => Some((Attr::Bold, true)),
        b'b' => Some((Attr::Bold, false)),
        b'U' => Some((Attr::Underline, true)),
        b'u' => Some((Attr::Underline, false)),
        b'S' => Some((Attr::Standout, true)),
        b's' => Some((Attr::Standout, false)),
        b'R' => Some((Attr::Reverse, true)),
        b'r' => Some((Attr::Reverse, false)),
        b'D' => Some((Attr::Dim, true)),
        b'd' => Some((Attr::Dim, false)),
        _ => None,
    }
}
