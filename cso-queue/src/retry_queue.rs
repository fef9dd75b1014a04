use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// How long an in-flight item waits before it becomes eligible for resend.
const RESEND_AFTER_SECS: u64 = 3;

/// An in-flight outbound item, owned by the retry queue between enqueue and
/// either acknowledgement (`clear_message`) or retry exhaustion. Matches
/// `csoqueue/queue_entity.go`'s `ItemQueue`.
#[derive(Debug, Clone)]
pub struct ItemQueue {
    pub msg_id: u64,
    pub msg_tag: u64,
    pub recv_name: String,
    pub content: Vec<u8>,
    pub is_encrypted: bool,
    pub is_cached: bool,
    pub is_first: bool,
    pub is_last: bool,
    pub is_request: bool,
    pub is_group: bool,
    pub number_retry: i32,
    pub timestamp: u64,
}

/// Fixed-capacity set of in-flight outbound items with resend timers,
/// grounded on `csoqueue/queue_implement.go`.
///
/// `take_index` is callable from any thread (an atomic counter reservation).
/// `push_message`/`next_message`/`clear_message` are confined to the session
/// dispatcher by contract (spec.md §5); the `Mutex` around the slot array
/// exists for `Arc`-sharing, not because the dispatcher actually contends
/// with itself.
pub struct RetryQueue {
    cap: i32,
    len: AtomicI32,
    items: Mutex<Vec<Option<ItemQueue>>>,
}

impl RetryQueue {
    pub fn new(cap: i32) -> RetryQueue {
        RetryQueue {
            cap,
            len: AtomicI32::new(0),
            items: Mutex::new(vec![None; cap.max(0) as usize]),
        }
    }

    /// Reserves one slot for a subsequent `push_message`. Must be called
    /// before `push_message` for the same item.
    pub fn take_index(&self) -> bool {
        if self.len.fetch_add(1, Ordering::SeqCst) + 1 > self.cap {
            self.len.fetch_sub(1, Ordering::SeqCst);
            return false;
        }
        true
    }

    /// Places `item` into the first empty slot. `take_index` must have
    /// reserved a slot for it already.
    pub fn push_message(&self, item: ItemQueue) {
        let mut items = self.items.lock().expect("retry queue mutex poisoned");
        for slot in items.iter_mut() {
            if slot.is_none() {
                *slot = Some(item);
                return;
            }
        }
    }

    /// Picks the first item due for resend (`now - timestamp >= 3s`),
    /// stamps it and decrements its retry budget, evicting any item whose
    /// retry budget has just reached zero in the same pass.
    pub fn next_message(&self) -> Option<ItemQueue> {
        let now = now_unix_secs();
        let mut items = self.items.lock().expect("retry queue mutex poisoned");
        let mut next_item = None;
        for slot in items.iter_mut() {
            if let Some(item) = slot {
                if next_item.is_none() && now.saturating_sub(item.timestamp) >= RESEND_AFTER_SECS {
                    item.timestamp = now;
                    item.number_retry -= 1;
                    next_item = Some(item.clone());
                }
                if item.number_retry == 0 {
                    *slot = None;
                    self.len.fetch_sub(1, Ordering::SeqCst);
                }
            }
        }
        next_item
    }

    /// Removes the item matching `msg_id`, called on receipt of its
    /// response.
    pub fn clear_message(&self, msg_id: u64) {
        let mut items = self.items.lock().expect("retry queue mutex poisoned");
        for slot in items.iter_mut() {
            if matches!(slot, Some(item) if item.msg_id == msg_id) {
                *slot = None;
                self.len.fetch_sub(1, Ordering::SeqCst);
                return;
            }
        }
    }
}

fn now_unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_secs()
}

#[cfg(test)]
fn fresh_item(msg_id: u64, number_retry: i32) -> ItemQueue {
    ItemQueue {
        msg_id,
        msg_tag: 0,
        recv_name: "peer".to_string(),
        content: vec![1, 2, 3],
        is_encrypted: true,
        is_cached: false,
        is_first: true,
        is_last: true,
        is_request: true,
        is_group: false,
        number_retry,
        timestamp: 0, // immediately due
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // spec.md §8, scenario 6.
    #[test]
    fn queue_bound_is_enforced() {
        let queue = RetryQueue::new(2);
        assert!(queue.take_index());
        queue.push_message(fresh_item(1, 1));
        assert!(queue.take_index());
        queue.push_message(fresh_item(2, 1));

        assert!(!queue.take_index());

        queue.clear_message(1);
        assert!(queue.take_index());
    }

    #[test]
    fn next_message_is_due_immediately_when_timestamp_is_zero() {
        let queue = RetryQueue::new(4);
        queue.take_index();
        queue.push_message(fresh_item(7, 2));

        let item = queue.next_message().expect("one item due");
        assert_eq!(item.msg_id, 7);
        assert_eq!(item.number_retry, 1);
    }

    #[test]
    fn next_message_skips_items_not_yet_due() {
        let queue = RetryQueue::new(4);
        queue.take_index();
        let mut item = fresh_item(7, 3);
        item.timestamp = now_unix_secs();
        queue.push_message(item);

        assert!(queue.next_message().is_none());
    }

    #[test]
    fn item_is_evicted_once_retries_are_exhausted() {
        let queue = RetryQueue::new(4);
        queue.take_index();
        queue.push_message(fresh_item(9, 1));

        let item = queue.next_message().expect("due on first scan");
        assert_eq!(item.number_retry, 0);

        // the same scan that decremented to zero also evicted the slot
        assert!(queue.next_message().is_none());
        assert!(queue.take_index());
    }

    #[test]
    fn clear_message_is_a_no_op_for_unknown_ids() {
        let queue = RetryQueue::new(4);
        queue.take_index();
        queue.push_message(fresh_item(1, 1));
        queue.clear_message(999);
        assert!(queue.next_message().is_some());
    }
}
