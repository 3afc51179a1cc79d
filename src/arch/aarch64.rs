//! aarch64 (AAPCS64) context switching.

use std::arch::naked_asm;

/// Saved execution state: sp, the resume address, and the AAPCS64
/// callee-saved registers (x19-x28, fp, and the low halves d8-d15).
///
/// The resume address lives in the struct (saved from `lr`, re-entered with
/// `ret`), so resuming never reads a code address out of stack memory that
/// may have been rewritten from a snapshot.
#[repr(C)]
#[derive(Debug, Clone, Default)]
pub(crate) struct Context {
    /// Stack pointer.
    sp: u64,
    /// Resume address (saved link register).
    lr: u64,
    /// Frame pointer (x29).
    fp: u64,
    x19: u64,
    x20: u64,
    x21: u64,
    x22: u64,
    x23: u64,
    x24: u64,
    x25: u64,
    x26: u64,
    x27: u64,
    x28: u64,
    d8: u64,
    d9: u64,
    d10: u64,
    d11: u64,
    d12: u64,
    d13: u64,
    d14: u64,
    d15: u64,
}

impl Context {
    /// Creates a context that starts executing `entry` on the stack whose
    /// highest address is `stack_top`.
    ///
    /// AAPCS64 keeps sp 16-byte aligned at all times. The entry function
    /// must never return.
    pub(crate) fn new(stack_top: usize, entry: usize) -> Self {
        Context {
            sp: (stack_top & !0xF) as u64,
            lr: entry as u64,
            ..Default::default()
        }
    }
}

/// Saves the current flow into `old` and resumes `new`.
///
/// Returns when some later switch targets `old` again.
///
/// # Safety
/// Both pointers must be valid. `new` must hold state produced by
/// [`Context::new`] or by a previous switch, and the stack it points into
/// must contain the bytes that were live when that state was saved.
#[unsafe(naked)]
pub(crate) unsafe extern "C" fn context_switch(_old: *mut Context, _new: *const Context) {
    // x0 = old, x1 = new.
    naked_asm!(
        "mov x9, sp",
        "str x9,  [x0, #0x00]",
        "str lr,  [x0, #0x08]",
        "str fp,  [x0, #0x10]",
        "str x19, [x0, #0x18]",
        "str x20, [x0, #0x20]",
        "str x21, [x0, #0x28]",
        "str x22, [x0, #0x30]",
        "str x23, [x0, #0x38]",
        "str x24, [x0, #0x40]",
        "str x25, [x0, #0x48]",
        "str x26, [x0, #0x50]",
        "str x27, [x0, #0x58]",
        "str x28, [x0, #0x60]",
        "str d8,  [x0, #0x68]",
        "str d9,  [x0, #0x70]",
        "str d10, [x0, #0x78]",
        "str d11, [x0, #0x80]",
        "str d12, [x0, #0x88]",
        "str d13, [x0, #0x90]",
        "str d14, [x0, #0x98]",
        "str d15, [x0, #0xa0]",
        "ldr x9,  [x1, #0x00]",
        "mov sp, x9",
        "ldr lr,  [x1, #0x08]",
        "ldr fp,  [x1, #0x10]",
        "ldr x19, [x1, #0x18]",
        "ldr x20, [x1, #0x20]",
        "ldr x21, [x1, #0x28]",
        "ldr x22, [x1, #0x30]",
        "ldr x23, [x1, #0x38]",
        "ldr x24, [x1, #0x40]",
        "ldr x25, [x1, #0x48]",
        "ldr x26, [x1, #0x50]",
        "ldr x27, [x1, #0x58]",
        "ldr x28, [x1, #0x60]",
        "ldr d8,  [x1, #0x68]",
        "ldr d9,  [x1, #0x70]",
        "ldr d10, [x1, #0x78]",
        "ldr d11, [x1, #0x80]",
        "ldr d12, [x1, #0x88]",
        "ldr d13, [x1, #0x90]",
        "ldr d14, [x1, #0x98]",
        "ldr d15, [x1, #0xa0]",
        // Resume through the saved link register.
        "ret",
    );
}
