//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Location matched → routing rule's pool
//!     → pool.rs (refresh health if stale, in the background)
//!     → round_robin.rs (advance cursor, skip unhealthy backends)
//!     → backend.rs (selected base URL)
//!     → handed to the forwarder
//! ```
//!
//! # Design Decisions
//! - One pool per routing rule; no process-wide registry
//! - Cursor is a lock-free atomic counter
//! - Unhealthy backends are skipped, never excluded outright: if all are
//!   unhealthy the pool keeps rotating through them

pub mod backend;
pub mod pool;
pub mod round_robin;

pub use backend::BackendAddress;
pub use pool::BackendPool;
