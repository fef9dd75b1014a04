//! The write-side sequencer and read-side dedup window (`Counter`,
//! grounded on `csocounter/counter_implement.go`) and the bounded retry
//! queue (`RetryQueue`/`ItemQueue`, grounded on `csoqueue/queue_implement.go`
//! and `queue_entity.go`).

mod counter;
mod retry_queue;

pub use counter::Counter;
pub use retry_queue::{ItemQueue, RetryQueue};
