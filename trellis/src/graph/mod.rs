//! Graph storage as seen by the evaluator: the `Producer` capability, a
//! simple in-memory store, the shared reader/writer lock and the loader
//! interface.

pub mod load;
pub mod lock;
pub mod memory;
pub mod producer;

pub use load::{LoadError, Loader};
pub use lock::{LockConflictError, LockMode, ReadGuard, SharedGraph, WriteGuard};
pub use memory::MemoryGraph;
pub use producer::{EdgePattern, GraphScope, GraphStore, Producer};
