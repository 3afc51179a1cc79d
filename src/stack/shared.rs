//! The one stack region every coroutine executes on.

/// The fixed-size byte region the scheduler mounts coroutines onto.
///
/// At most one coroutine's live frames occupy it at any instant; a
/// suspended coroutine's bytes have been copied out into its
/// [`StackSnapshot`](crate::stack::StackSnapshot) and the region may since
/// have been overwritten by another coroutine.
pub(crate) struct SharedStack {
    mem: Box<[u8]>,
}

impl SharedStack {
    /// Allocates a region of `size` bytes.
    pub(crate) fn new(size: usize) -> Self {
        if size == 0 {
            panic!("Cannot create SharedStack with size 0. Size must be > 0");
        }
        let mut v = Vec::with_capacity(size);
        unsafe { v.set_len(size) };
        SharedStack {
            mem: v.into_boxed_slice(),
        }
    }

    /// Total size of the region in bytes.
    #[inline(always)]
    pub(crate) fn size(&self) -> usize {
        self.mem.len()
    }

    /// The address one past the end of the region. Stacks grow downward,
    /// so this is where the occupied extent is measured from.
    #[inline(always)]
    pub(crate) fn bottom(&mut self) -> *mut u8 {
        unsafe { self.mem.as_mut_ptr().add(self.mem.len()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bottom_is_one_past_end() {
        let mut stack = SharedStack::new(4096);
        let base = stack.mem.as_ptr() as usize;
        assert_eq!(stack.bottom() as usize, base + 4096);
        assert_eq!(stack.size(), 4096);
    }

    #[test]
    #[should_panic(expected = "Cannot create SharedStack with size 0")]
    fn test_zero_size_panics() {
        SharedStack::new(0);
    }
}
