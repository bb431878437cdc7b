//! Last-good snapshot store.
//!
//! Keeps the most recent successfully fetched snapshot per label so a failing
//! remote degrades to stale data instead of errors. Backends:
//! - Memory (in-process, bounded by label count)
//! - Disk (persistent across restarts)
//!
//! ```toml
//! [store]
//! enabled = true
//! backend = "memory"  # or "disk"
//!
//! [store.memory]
//! max_labels = 64
//!
//! [store.disk]
//! directory = "cache"
//! ```

mod disk;
mod error;
mod manager;
mod memory;
mod noop;
mod traits;

pub use disk::DiskStore;
pub use error::StoreError;
pub use manager::StoreManager;
pub use memory::MemoryStore;
pub use noop::NoOpStore;
pub use traits::SnapshotStore;
