//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Background refresh (active.rs):
//!     Backend selection notices stale records
//!     → claim refresh window
//!     → spawn one probe.rs task per backend
//!     → each task writes its result to state.rs
//!
//! On-demand report (active.rs):
//!     Admin request
//!     → probe every backend (longer timeout), await all
//!     → write results to state.rs and return them
//! ```
//!
//! # Design Decisions
//! - Probing is lazy: driven by traffic, not by a timer
//! - Health state is per pool: a backend shared by two locations is tracked twice
//! - Probe failures never surface; they only produce unhealthy records

pub mod active;
pub mod probe;
pub mod state;

pub use active::HealthChecker;
pub use probe::HealthProbe;
pub use state::HealthTable;
