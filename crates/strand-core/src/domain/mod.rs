//! Domain model (ids, task kinds, descriptors, states, events).

pub mod descriptor;
pub mod events;
pub mod ids;
pub mod kind;
pub mod state;

pub use self::descriptor::TaskDescriptor;
pub use self::events::{EventRecord, ExecutorEvent};
pub use self::ids::InvocationId;
pub use self::kind::{KindConstraints, ProcessorConstraint, ProcessorKind, TaskKindId};
pub use self::state::InvocationState;
