use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Width of the read-dedup sliding window, in tags.
const WINDOW_BITS: u64 = 32;

#[derive(Debug)]
struct ReadWindow {
    min_read_idx: u64,
    mask_read_bits: u32,
}

/// Monotonic write sequencer plus sliding read-dedup window, grounded on
/// `csocounter/counter_implement.go`.
///
/// `next_write_index` is safe to call from any thread (an atomic
/// fetch-add, matching the Go `atomic.AddUint64`). `mark_read_done` and
/// `mark_read_unused` are confined to the session dispatcher by contract
/// (spec.md §5) — the `Mutex` here exists only so `Counter` can be shared
/// behind an `Arc` with the write-side callers, not because the read side
/// is actually contended.
pub struct Counter {
    write_index: AtomicU64,
    read_window: Mutex<ReadWindow>,
}

impl Counter {
    /// `NewCounter`: the first index returned by `next_write_index` is
    /// `write_index` itself, so the stored atomic starts one below it.
    pub fn new(write_index: u64, min_read_idx: u64, mask_read_bits: u32) -> Counter {
        Counter {
            write_index: AtomicU64::new(write_index.wrapping_sub(1)),
            read_window: Mutex::new(ReadWindow {
                min_read_idx,
                mask_read_bits,
            }),
        }
    }

    /// Returns the next write index to assign to an outbound message.
    pub fn next_write_index(&self) -> u64 {
        self.write_index.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// `MarkReadDone`: returns `true` if `tag` should be delivered to the
    /// application (first time seen within the window), `false` if it is
    /// stale (below the window) or a duplicate (already marked).
    ///
    /// Preserves the documented quirk from `counter_implement.go`: the
    /// window always slides by exactly `WINDOW_BITS`, never more, even if
    /// `tag` lands far beyond it. A `tag` at or past `min_read_idx + 64`
    /// (i.e. `tag - min_read_idx >= 32` even after the slide) computes a
    /// shift of 32 or more; like the Go runtime's shift semantics for an
    /// out-of-range count, that shift is treated as zero rather than
    /// wrapping, so such a tag is accepted as "new" on every call. This
    /// matches server expectations (the hub never issues tags that far
    /// ahead of the watermark) and is preserved rather than silently
    /// patched — see spec.md §9.
    pub fn mark_read_done(&self, tag: u64) -> bool {
        let mut window = self.read_window.lock().expect("read window mutex poisoned");
        if tag < window.min_read_idx {
            return false;
        }
        if tag >= window.min_read_idx + WINDOW_BITS {
            window.min_read_idx += WINDOW_BITS;
            window.mask_read_bits = 0;
        }

        let shift = tag - window.min_read_idx;
        let mask = bit_for_shift(shift);
        if window.mask_read_bits & mask != 0 {
            return false;
        }
        window.mask_read_bits |= mask;
        true
    }

    /// `MarkReadUnused`: clears `tag`'s bit if it falls inside the current
    /// window (used to back out a delivery the user callback rejected).
    /// The window itself never slides here, matching the original.
    pub fn mark_read_unused(&self, tag: u64) {
        let mut window = self.read_window.lock().expect("read window mutex poisoned");
        if tag < window.min_read_idx || tag >= window.min_read_idx + WINDOW_BITS {
            return;
        }
        let shift = tag - window.min_read_idx;
        window.mask_read_bits &= !bit_for_shift(shift);
    }
}

fn bit_for_shift(shift: u64) -> u32 {
    if shift >= 32 {
        0
    } else {
        1u32 << shift
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_write_index_has_no_gaps_or_duplicates_across_threads() {
        use std::sync::Arc;
        use std::thread;

        let counter = Arc::new(Counter::new(100, 0, 0));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let counter = Arc::clone(&counter);
            handles.push(thread::spawn(move || {
                (0..50).map(|_| counter.next_write_index()).collect::<Vec<_>>()
            }));
        }

        let mut all: Vec<u64> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();
        all.sort_unstable();
        let expected: Vec<u64> = (100..100 + 400).collect();
        assert_eq!(all, expected);
    }

    // spec.md §8, fixture 5.
    #[test]
    fn dedup_slide_fixture() {
        let counter = Counter::new(100, 0, 0);
        assert!(counter.mark_read_done(0));
        assert!(!counter.mark_read_done(0));
        assert!(counter.mark_read_done(31));
        assert!(counter.mark_read_done(32)); // slides window to min_read_idx = 32
        assert!(!counter.mark_read_done(31)); // now stale
    }

    #[test]
    fn stale_tag_is_rejected() {
        let counter = Counter::new(100, 10, 0);
        assert!(!counter.mark_read_done(5));
    }

    #[test]
    fn mark_read_unused_lets_a_tag_be_redelivered() {
        let counter = Counter::new(100, 0, 0);
        assert!(counter.mark_read_done(3));
        counter.mark_read_unused(3);
        assert!(counter.mark_read_done(3));
    }

    #[test]
    fn mark_read_unused_outside_window_is_a_no_op() {
        let counter = Counter::new(100, 10, 0b1);
        counter.mark_read_unused(2); // below window
        counter.mark_read_unused(100); // above window
        assert!(!counter.mark_read_done(10)); // bit 0 still set from construction
    }

    #[test]
    fn tag_far_beyond_one_slide_is_always_accepted() {
        // Preserves the documented fixed-32-slide quirk: a single slide only
        // ever advances min_read_idx by 32, so a tag at min_read_idx+64 still
        // computes a shift >= 32 and is treated as "new" every time.
        let counter = Counter::new(100, 0, 0);
        assert!(counter.mark_read_done(64));
        assert!(counter.mark_read_done(64));
    }
}
