//! Byte counter for the comparator.
//!
//! The binary installs `CountingAlloc` as its global allocator; without it the
//! counter never moves and reports zero.
use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicU64, Ordering};

static ALLOCATED: AtomicU64 = AtomicU64::new(0);

/// Forwards to `System`, adding every requested size to a process-wide total.
pub struct CountingAlloc;

unsafe impl GlobalAlloc for CountingAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        ALLOCATED.fetch_add(layout.size() as u64, Ordering::Relaxed);
        unsafe { System.alloc(layout) }
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        ALLOCATED.fetch_add(layout.size() as u64, Ordering::Relaxed);
        unsafe { System.alloc_zeroed(layout) }
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        // a grown buffer counts as a fresh allocation of the new size
        ALLOCATED.fetch_add(new_size as u64, Ordering::Relaxed);
        unsafe { System.realloc(ptr, layout, new_size) }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) }
    }
}

/// Total bytes requested so far.
pub fn allocated() -> u64 {
    ALLOCATED.load(Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_requested_bytes() {
        let layout = Layout::from_size_align(4096, 8).unwrap();
        let before = allocated();
        unsafe {
            let ptr = CountingAlloc.alloc(layout);
            assert!(!ptr.is_null());
            let ptr = CountingAlloc.realloc(ptr, layout, 8192);
            CountingAlloc.dealloc(ptr, Layout::from_size_align(8192, 8).unwrap());
        }
        assert!(allocated() - before >= 4096 + 8192);
    }
}
