//! RenderContext struct and global state accessor.
//!
//! The context owns all mutable state for the rendering core: the active
//! surface and the running style of the themed text drawn into it.
//! A single global instance is managed via `ink_init()` / `ink_shutdown()`.

use std::ffi::CString;
use std::ops::{Deref, DerefMut};
use std::sync::{OnceLock, RwLock, RwLockReadGuard, RwLockWriteGuard};
#[cfg(not(test))]
use std::thread::ThreadId;

use crate::style::StyleState;
use crate::surface::Surface;

pub struct RenderContext {
    pub surface: Box<dyn Surface>,
    pub style: StyleState,

    // Diagnostics
    pub last_error: CString,
    pub debug_mode: bool,
}

// SAFETY: the core is single-threaded by contract. The lock exists for
// aliasing safety at the FFI boundary, not to introduce concurrent access;
// the context is owner-thread bound and never shared across threads in
// production paths.
unsafe impl Send for RenderContext {}
unsafe impl Sync for RenderContext {}

impl RenderContext {
    pub fn new(surface: Box<dyn Surface>) -> Self {
        Self {
            surface,
            style: StyleState::new(),
            last_error: CString::default(),
            debug_mode: false,
        }
    }

    pub fn debug_log(&self, msg: &str) {
        if self.debug_mode {
            eprintln!("[inkgrid] {msg}");
        }
    }
}

// ============================================================================
// Global State
// ============================================================================

static CONTEXT: OnceLock<RwLock<Option<RenderContext>>> = OnceLock::new();
#[cfg(not(test))]
static OWNER_THREAD: OnceLock<RwLock<Option<ThreadId>>> = OnceLock::new();

fn context_lock() -> &'static RwLock<Option<RenderContext>> {
    CONTEXT.get_or_init(|| RwLock::new(None))
}

#[cfg(not(test))]
fn owner_thread_lock() -> &'static RwLock<Option<ThreadId>> {
    OWNER_THREAD.get_or_init(|| RwLock::new(None))
}

fn lock_poisoned(name: &str, detail: impl std::fmt::Display) -> String {
    format!("{name} lock poisoned after panic: {detail}")
}

fn ensure_thread_affinity() -> Result<(), String> {
    #[cfg(test)]
    {
        return Ok(());
    }

    #[cfg(not(test))]
    {
        let current = std::thread::current().id();
        let owner = owner_thread_lock()
            .read()
            .map_err(|e| lock_poisoned("owner_thread", e))?;
        if let Some(owner_id) = *owner {
            if owner_id != current {
                return Err("Context access from non-owner thread is unsupported".to_string());
            }
        }
        Ok(())
    }
}

#[cfg(not(test))]
fn bind_owner_thread_current() -> Result<(), String> {
    let current = std::thread::current().id();
    let mut owner = owner_thread_lock()
        .write()
        .map_err(|e| lock_poisoned("owner_thread", e))?;
    if let Some(owner_id) = *owner {
        if owner_id != current {
            return Err("Context access from non-owner thread is unsupported".to_string());
        }
    }
    *owner = Some(current);
    Ok(())
}

#[cfg(test)]
fn bind_owner_thread_current() -> Result<(), String> {
    Ok(())
}

#[cfg(not(test))]
fn clear_owner_thread() -> Result<(), String> {
    let mut owner = owner_thread_lock()
        .write()
        .map_err(|e| lock_poisoned("owner_thread", e))?;
    *owner = None;
    Ok(())
}

#[cfg(test)]
fn clear_owner_thread() -> Result<(), String> {
    Ok(())
}

pub struct ContextReadGuard<'a> {
    guard: RwLockReadGuard<'a, Option<RenderContext>>,
}

impl Deref for ContextReadGuard<'_> {
    type Target = RenderContext;

    fn deref(&self) -> &Self::Target {
        self.guard
            .as_ref()
            .expect("ContextReadGuard is only constructed for initialized context")
    }
}

pub struct ContextWriteGuard<'a> {
    guard: RwLockWriteGuard<'a, Option<RenderContext>>,
}

impl Deref for ContextWriteGuard<'_> {
    type Target = RenderContext;

    fn deref(&self) -> &Self::Target {
        self.guard
            .as_ref()
            .expect("ContextWriteGuard is only constructed for initialized context")
    }
}

impl DerefMut for ContextWriteGuard<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.guard
            .as_mut()
            .expect("ContextWriteGuard is only constructed for initialized context")
    }
}

/// Acquire a read lock for the global context.
pub fn context_read() -> Result<ContextReadGuard<'static>, String> {
    ensure_thread_affinity()?;
    let guard = context_lock()
        .read()
        .map_err(|e| lock_poisoned("context", e))?;
    if guard.is_none() {
        return Err("Context not initialized. Call ink_init() first.".to_string());
    }
    Ok(ContextReadGuard { guard })
}

/// Acquire a write lock for the global context.
pub fn context_write() -> Result<ContextWriteGuard<'static>, String> {
    ensure_thread_affinity()?;
    let guard = context_lock()
        .write()
        .map_err(|e| lock_poisoned("context", e))?;
    if guard.is_none() {
        return Err("Context not initialized. Call ink_init() first.".to_string());
    }
    Ok(ContextWriteGuard { guard })
}

/// Initialize the global context with the given surface.
pub fn init_context(surface: Box<dyn Surface>) -> Result<(), String> {
    ensure_thread_affinity()?;
    bind_owner_thread_current()?;

    let mut guard = context_lock()
        .write()
        .map_err(|e| lock_poisoned("context", e))?;
    if guard.is_some() {
        return Err("Context already initialized. Call ink_shutdown() first.".to_string());
    }
    *guard = Some(RenderContext::new(surface));
    Ok(())
}

/// Check whether a context is currently initialized.
pub fn is_context_initialized() -> Result<bool, String> {
    ensure_thread_affinity()?;
    let guard = context_lock()
        .read()
        .map_err(|e| lock_poisoned("context", e))?;
    Ok(guard.is_some())
}

/// Destroy the global context and return the surface for shutdown.
pub fn destroy_context() -> Result<Option<Box<dyn Surface>>, String> {
    ensure_thread_affinity()?;
    let mut guard = context_lock()
        .write()
        .map_err(|e| lock_poisoned("context", e))?;
    let surface = guard.take().map(|ctx| ctx.surface);
    drop(guard);
    clear_owner_thread()?;
    Ok(surface)
}

/// Store an error message in the global context (best-effort; ignores if no
/// context). The message is kept NUL-terminated for `ink_get_last_error`.
pub fn set_last_error(msg: String) {
    if ensure_thread_affinity().is_err() {
        return;
    }
    if let Ok(mut guard) = context_lock().write() {
        if let Some(ctx) = guard.as_mut() {
            ctx.last_error = CString::new(msg.replace('\0', "?")).unwrap_or_default();
        }
    }
}

/// Clear the context-bound error message.
pub fn clear_last_error() {
    if ensure_thread_affinity().is_err() {
        return;
    }
    if let Ok(mut guard) = context_lock().write() {
        if let Some(ctx) = guard.as_mut() {
            ctx.last_error = CString::default();
        }
    }
}
