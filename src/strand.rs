//! Work serializer for handler linearization.
//!
//! A deadline arm and an I/O completion arm can both need to touch the same
//! transport state (notably: the completion reading a "did the deadline
//! close me?" bit just as the deadline sets it). On a multi-threaded
//! runtime those arms may run on different worker threads, so no-reentry is
//! not enough — the serializer provides true mutual exclusion, implemented
//! as a mutex held across each handler.
//!
//! Handlers submitted through one [`Strand`] run in some total order with
//! no interleaving, and a handler that starts after another completed sees
//! all of its effects. Handlers must be short and non-blocking: they run
//! under the lock and must not await.
//!
//! # Example
//!
//! ```
//! use wirecall::strand::Strand;
//!
//! let strand = Strand::new();
//! let mut hits = 0;
//! strand.run(|| hits += 1);
//! strand.run(|| hits += 1);
//! assert_eq!(hits, 2);
//! ```

use std::sync::{Arc, Mutex};

/// Linearizes a small set of handlers against each other.
///
/// Cloning is cheap; all clones serialize through the same lock. The strand
/// is held alive by whichever closures captured it until the last one runs.
#[derive(Debug, Clone, Default)]
pub struct Strand {
    lock: Arc<Mutex<()>>,
}

impl Strand {
    /// Create a new, idle strand.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` with the guarantee that no other handler on this strand is
    /// executing concurrently.
    pub fn run<T>(&self, f: impl FnOnce() -> T) -> T {
        // A poisoned lock only means a previous handler panicked; the unit
        // state it guards cannot be corrupted, so keep serializing.
        let _guard = self
            .lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn handlers_never_interleave() {
        let strand = Strand::new();
        let inside = Arc::new(AtomicBool::new(false));
        let overlaps = Arc::new(AtomicUsize::new(0));

        let mut threads = Vec::new();
        for _ in 0..8 {
            let strand = strand.clone();
            let inside = inside.clone();
            let overlaps = overlaps.clone();
            threads.push(std::thread::spawn(move || {
                for _ in 0..200 {
                    strand.run(|| {
                        if inside.swap(true, Ordering::SeqCst) {
                            overlaps.fetch_add(1, Ordering::SeqCst);
                        }
                        std::hint::spin_loop();
                        inside.store(false, Ordering::SeqCst);
                    });
                }
            }));
        }
        for t in threads {
            t.join().unwrap();
        }
        assert_eq!(overlaps.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn later_handler_sees_earlier_effects() {
        let strand = Strand::new();
        let mut value = 0u32;
        strand.run(|| value = 7);
        let seen = strand.run(|| value);
        assert_eq!(seen, 7);
    }

    #[test]
    fn survives_a_panicking_handler() {
        let strand = Strand::new();
        let clone = strand.clone();
        let _ = std::thread::spawn(move || clone.run(|| panic!("handler died"))).join();
        // The strand keeps serializing afterwards.
        assert_eq!(strand.run(|| 42), 42);
    }

    #[test]
    fn clones_share_the_same_lock() {
        let strand = Strand::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let a = strand.clone();
        let b = strand.clone();
        let ca = counter.clone();
        let cb = counter.clone();
        a.run(|| ca.fetch_add(1, Ordering::SeqCst));
        b.run(|| cb.fetch_add(1, Ordering::SeqCst));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }
}
