//! magnetar-stats — the worker statistics store.
//!
//! Holds cumulative success/failure counters per worker. Ingestion writes
//! through [`StatsStore::record`]; the recommendation engine reads through
//! [`StatsStore::snapshot`].
//!
//! # Architecture
//!
//! ```text
//! StatsStore (cheap to clone, shared)
//!   └── RwLock<HashMap<WorkerId, WorkerStats>>
//!         ├── ensure()/record()  ← write lock, one entry touched
//!         └── snapshot()         ← read lock, copied out as StatsSnapshot
//! ```

pub mod store;

pub use store::{StatsSnapshot, StatsStore, WorkerStats};
