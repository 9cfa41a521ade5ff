//! inkgrid — Native themed-text rendering core, FFI entry points.
//!
//! This file contains ONLY `extern "C"` FFI functions. Each function:
//! 1. Wraps its body in `catch_unwind`
//! 2. Validates inputs at the boundary
//! 3. Delegates to the appropriate module function
//! 4. Returns a status code
//!
//! No business logic lives here.

// All public functions in this file are `extern "C"` FFI entry points called
// across the C ABI boundary. The caller is already in unsafe territory by
// definition — raw-pointer arguments are part of the FFI contract. Marking
// every entry point `unsafe fn` would be incorrect (it would change the ABI
// signature) and unhelpful. Pointer validity is checked (null guards) inside
// each function body before dereferencing.
#![allow(clippy::not_unsafe_ptr_arg_deref)]

mod context;
mod render;
mod style;
mod surface;
mod text;
mod types;

use std::panic::{catch_unwind, AssertUnwindSafe};

use context::{
    clear_last_error, context_read, context_write, destroy_context, init_context,
    is_context_initialized, set_last_error,
};
use surface::{CrosstermSurface, HeadlessSurface, Surface};
use types::DrawOutcome;

// ============================================================================
// Safety wrapper: every FFI entry point uses this pattern
// ============================================================================

/// Wrap an FFI function body. Returns 0 on success, -1 on error, -2 on panic.
fn ffi_wrap(f: impl FnOnce() -> Result<i32, String>) -> i32 {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(code)) => code,
        Ok(Err(msg)) => {
            set_last_error(msg);
            -1
        }
        Err(_) => {
            set_last_error("internal panic".to_string());
            -2
        }
    }
}

/// Borrow the caller's themed-string bytes. Null or empty yields an empty
/// slice. The input is raw bytes, not validated UTF-8; malformed sequences
/// follow the renderer's fallback rules.
fn themed_bytes<'a>(ptr: *const u8, len: u32) -> &'a [u8] {
    if ptr.is_null() || len == 0 {
        &[]
    } else {
        unsafe { std::slice::from_raw_parts(ptr, len as usize) }
    }
}

/// Write a draw outcome into the caller's out-params. A fully consumed
/// string reports remainder -1; otherwise the byte offset of the first
/// unconsumed byte.
fn store_outcome(outcome: DrawOutcome, out_remainder: *mut i32, out_col: *mut i32) {
    unsafe {
        if !out_remainder.is_null() {
            *out_remainder = outcome.remainder.map(|off| off as i32).unwrap_or(-1);
        }
        if !out_col.is_null() {
            *out_col = outcome.col;
        }
    }
}

// ============================================================================
// Lifecycle
// ============================================================================

#[no_mangle]
pub extern "C" fn ink_init() -> i32 {
    ffi_wrap(|| {
        if is_context_initialized()? {
            return Err("Context already initialized. Call ink_shutdown() first.".to_string());
        }
        let mut surface = Box::new(CrosstermSurface::new());
        surface.init()?;
        init_context(surface)?;
        Ok(0)
    })
}

/// Headless init — creates the context on a grid-backed no-op surface.
/// For testing, CI, and environments without a terminal.
#[no_mangle]
pub extern "C" fn ink_init_headless(width: u16, height: u16) -> i32 {
    ffi_wrap(|| {
        let surface = Box::new(HeadlessSurface::new(width, height));
        init_context(surface)?;
        Ok(0)
    })
}

#[no_mangle]
pub extern "C" fn ink_shutdown() -> i32 {
    ffi_wrap(|| {
        if let Some(mut surface) = destroy_context()? {
            surface.shutdown()?;
        }
        Ok(0)
    })
}

#[no_mangle]
pub extern "C" fn ink_get_size(width: *mut i32, height: *mut i32) -> i32 {
    ffi_wrap(|| {
        let ctx = context_read()?;
        let (w, h) = ctx.surface.size();
        unsafe {
            if !width.is_null() {
                *width = w as i32;
            }
            if !height.is_null() {
                *height = h as i32;
            }
        }
        Ok(0)
    })
}

// ============================================================================
// Measurement & Drawing
// ============================================================================

/// Column width of a themed string up to (not including) the first
/// occurrence of `stop`, or of the whole string when `stop` is 0. Escape
/// sequences measure zero columns. Needs no context.
#[no_mangle]
pub extern "C" fn ink_measure(ptr: *const u8, len: u32, stop: u8, out_cols: *mut i32) -> i32 {
    ffi_wrap(|| {
        let input = themed_bytes(ptr, len);
        let cols = text::themed_width(input, (stop != 0).then_some(stop));
        unsafe {
            if !out_cols.is_null() {
                *out_cols = cols;
            }
        }
        Ok(0)
    })
}

/// Draw a themed string into the context surface at `(row, col)`, writing at
/// most `width` columns, optionally word-wrapped. `*out_remainder` receives
/// the byte offset of the first unconsumed byte (-1 when fully consumed);
/// `*out_col` the column reached.
#[no_mangle]
pub extern "C" fn ink_draw(
    row: i32,
    col: i32,
    width: i32,
    wrap: u8,
    ptr: *const u8,
    len: u32,
    out_remainder: *mut i32,
    out_col: *mut i32,
) -> i32 {
    ffi_wrap(|| {
        let input = themed_bytes(ptr, len);
        let mut ctx = context_write()?;
        let ctx = &mut *ctx;
        let outcome = render::draw(
            Some(ctx.surface.as_mut()),
            &mut ctx.style,
            row,
            col,
            width,
            wrap != 0,
            input,
        );
        ctx.debug_log(&format!(
            "draw: row {row} col {col} -> col {}, remainder {:?}",
            outcome.col, outcome.remainder
        ));
        store_outcome(outcome, out_remainder, out_col);
        Ok(0)
    })
}

/// Same traversal as `ink_draw` with no surface attached: style state
/// advances and the outcome is computed without touching any display.
/// Useful for measuring with escape-awareness.
#[no_mangle]
pub extern "C" fn ink_draw_dry(
    row: i32,
    col: i32,
    width: i32,
    wrap: u8,
    ptr: *const u8,
    len: u32,
    out_remainder: *mut i32,
    out_col: *mut i32,
) -> i32 {
    ffi_wrap(|| {
        let input = themed_bytes(ptr, len);
        let mut ctx = context_write()?;
        let outcome = render::draw(None, &mut ctx.style, row, col, width, wrap != 0, input);
        store_outcome(outcome, out_remainder, out_col);
        Ok(0)
    })
}

/// Hard reset of the running style: attribute counters zeroed and surface
/// attributes cleared. Color history is untouched, as with the `%C` escape.
#[no_mangle]
pub extern "C" fn ink_reset_style() -> i32 {
    ffi_wrap(|| {
        let mut ctx = context_write()?;
        let ctx = &mut *ctx;
        ctx.style.reset_attrs(Some(ctx.surface.as_mut()));
        Ok(0)
    })
}

/// Flush queued surface output to the terminal.
#[no_mangle]
pub extern "C" fn ink_flush() -> i32 {
    ffi_wrap(|| {
        let mut ctx = context_write()?;
        ctx.surface.flush()?;
        Ok(0)
    })
}

/// The cell recorded at (row, col): codepoint, attribute bits, and color
/// pair. Only grid-backed surfaces (headless init) have cells to read back;
/// a live terminal reports zeros. Lets hosts assert rendered output without
/// a tty.
#[no_mangle]
pub extern "C" fn ink_read_cell(
    row: i32,
    col: i32,
    out_cp: *mut u32,
    out_attrs: *mut u32,
    out_pair: *mut u32,
) -> i32 {
    ffi_wrap(|| {
        let ctx = context_read()?;
        let (cp, attrs, pair) = match ctx.surface.read_cell(row, col) {
            Some(cell) => (cell.ch as u32, cell.attrs.bits() as u32, cell.pair as u32),
            None => (0, 0, 0),
        };
        unsafe {
            if !out_cp.is_null() {
                *out_cp = cp;
            }
            if !out_attrs.is_null() {
                *out_attrs = attrs;
            }
            if !out_pair.is_null() {
                *out_pair = pair;
            }
        }
        Ok(0)
    })
}

// ============================================================================
// Diagnostics
// ============================================================================

/// Current nesting depth of one attribute counter (may be negative for an
/// unbalanced stream). `attr` is the counter slot: 0 bold, 1 underline,
/// 2 standout, 3 reverse, 4 dim.
#[no_mangle]
pub extern "C" fn ink_style_depth(attr: u8) -> i32 {
    ffi_wrap(|| {
        let a = types::Attr::from_u8(attr).ok_or_else(|| format!("Invalid attribute: {attr}"))?;
        let ctx = context_read()?;
        Ok(ctx.style.depth(a))
    })
}

#[no_mangle]
pub extern "C" fn ink_suppress_depth() -> i32 {
    ffi_wrap(|| {
        let ctx = context_read()?;
        Ok(ctx.style.suppress_depth())
    })
}

#[no_mangle]
pub extern "C" fn ink_color_pair() -> i32 {
    ffi_wrap(|| {
        let ctx = context_read()?;
        Ok(ctx.style.color_pair() as i32)
    })
}

#[no_mangle]
pub extern "C" fn ink_get_last_error() -> *const std::os::raw::c_char {
    match catch_unwind(AssertUnwindSafe(|| -> *const std::os::raw::c_char {
        match context_read() {
            Ok(ctx) => {
                if ctx.last_error.as_bytes().is_empty() {
                    std::ptr::null()
                } else {
                    ctx.last_error.as_ptr()
                }
            }
            Err(_) => std::ptr::null(),
        }
    })) {
        Ok(ptr) => ptr,
        Err(_) => std::ptr::null(),
    }
}

#[no_mangle]
pub extern "C" fn ink_clear_error() {
    let _ = catch_unwind(AssertUnwindSafe(clear_last_error));
}

#[no_mangle]
pub extern "C" fn ink_set_debug(enabled: u8) -> i32 {
    ffi_wrap(|| {
        let mut ctx = context_write()?;
        ctx.debug_mode = enabled != 0;
        Ok(0)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // The FFI entry points share one global context; tests serialize on this.
    static TEST_LOCK: Mutex<()> = Mutex::new(());

    fn ffi_lock() -> std::sync::MutexGuard<'static, ()> {
        TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner())
    }

    #[test]
    fn test_measure_needs_no_context() {
        let _guard = ffi_lock();

        let input = b"%Bhello%b \xe6\xbc\xa2";
        let mut cols = -1;
        assert_eq!(
            ink_measure(input.as_ptr(), input.len() as u32, 0, &mut cols),
            0
        );
        assert_eq!(cols, 8);

        // Null input measures zero.
        assert_eq!(ink_measure(std::ptr::null(), 0, 0, &mut cols), 0);
        assert_eq!(cols, 0);

        // Stop byte.
        let input = b"ab cd";
        assert_eq!(
            ink_measure(input.as_ptr(), input.len() as u32, b' ', &mut cols),
            0
        );
        assert_eq!(cols, 2);
    }

    #[test]
    fn test_draw_round_trip_headless() {
        let _guard = ffi_lock();

        assert_eq!(ink_init_headless(40, 4), 0);

        let input = b"hello world";
        let mut remainder = 0;
        let mut col = 0;
        assert_eq!(
            ink_draw(
                0,
                0,
                10,
                1,
                input.as_ptr(),
                input.len() as u32,
                &mut remainder,
                &mut col
            ),
            0
        );
        assert_eq!(remainder, 6);
        assert_eq!(col, 6);

        let mut cp = 0;
        let mut attrs = 0;
        let mut pair = 0;
        assert_eq!(ink_read_cell(0, 0, &mut cp, &mut attrs, &mut pair), 0);
        assert_eq!(cp, 'h' as u32);
        assert_eq!(attrs, 0);
        assert_eq!(ink_read_cell(0, 4, &mut cp, &mut attrs, &mut pair), 0);
        assert_eq!(cp, 'o' as u32);
        // Nothing was written past the break point.
        assert_eq!(ink_read_cell(0, 6, &mut cp, &mut attrs, &mut pair), 0);
        assert_eq!(cp, ' ' as u32);

        // Fully consumed reports the -1 sentinel.
        let rest = &input[remainder as usize..];
        assert_eq!(
            ink_draw(
                1,
                0,
                10,
                1,
                rest.as_ptr(),
                rest.len() as u32,
                &mut remainder,
                &mut col
            ),
            0
        );
        assert_eq!(remainder, -1);
        assert_eq!(col, 5);

        let mut w = 0;
        let mut h = 0;
        assert_eq!(ink_get_size(&mut w, &mut h), 0);
        assert_eq!((w, h), (40, 4));

        assert_eq!(ink_shutdown(), 0);
    }

    #[test]
    fn test_dry_run_matches_draw_outcome() {
        let _guard = ffi_lock();

        assert_eq!(ink_init_headless(80, 2), 0);

        let input = b"%2one %Btwo%b three";
        let (mut rem_a, mut col_a) = (0, 0);
        let (mut rem_b, mut col_b) = (0, 0);
        assert_eq!(
            ink_draw(
                0,
                0,
                40,
                0,
                input.as_ptr(),
                input.len() as u32,
                &mut rem_a,
                &mut col_a
            ),
            0
        );
        assert_eq!(ink_reset_style(), 0);
        assert_eq!(
            ink_draw_dry(
                0,
                0,
                40,
                0,
                input.as_ptr(),
                input.len() as u32,
                &mut rem_b,
                &mut col_b
            ),
            0
        );
        assert_eq!((rem_a, col_a), (rem_b, col_b));

        // Balanced toggles leave no depth; the color selection sticks.
        assert_eq!(ink_style_depth(0), 0);
        assert_eq!(ink_suppress_depth(), 0);
        assert_eq!(ink_color_pair(), 2);

        assert_eq!(ink_shutdown(), 0);
    }

    #[test]
    fn test_last_error_null_terminated() {
        let _guard = ffi_lock();

        assert_eq!(ink_init_headless(20, 2), 0);

        // Double init is a reportable error.
        assert_eq!(ink_init_headless(20, 2), -1);

        let ptr = ink_get_last_error();
        assert!(!ptr.is_null(), "error pointer should not be null");
        let c_str = unsafe { std::ffi::CStr::from_ptr(ptr) };
        let msg = c_str.to_str().expect("error should be valid UTF-8");
        assert!(
            msg.contains("already initialized"),
            "unexpected error: {msg}"
        );

        ink_clear_error();
        assert!(ink_get_last_error().is_null());

        assert_eq!(ink_shutdown(), 0);
    }

    #[test]
    fn test_draw_without_context_fails() {
        let _guard = ffi_lock();

        let input = b"abc";
        let mut remainder = 0;
        let mut col = 0;
        let rc = ink_draw(
            0,
            0,
            10,
            0,
            input.as_ptr(),
            input.len() as u32,
            &mut remainder,
            &mut col,
        );
        assert_eq!(rc, -1);
    }
}
