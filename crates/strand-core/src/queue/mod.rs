//! Queue module: invocation records, dequeue policy, phases and the
//! in-memory ready queue.

mod memory;
mod policy;
mod record;
mod state;

pub use policy::QueuePolicy;
pub use state::Phase;

pub(crate) use memory::ReadyQueue;
pub(crate) use record::Invocation;
pub(crate) use state::LaunchOrigin;
