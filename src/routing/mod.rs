//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request path
//!     → router.rs (location lookup)
//!     → matcher.rs (exact or subtree pattern)
//!     → Return: matched Location, Redirect, or NotFound
//!
//! Table Compilation (startup and reload):
//!     ServerConfig.locations
//!     → Resolve upstreams into backend pools
//!     → Sort by pattern length, longest first
//!     → Freeze as immutable LocationTable
//! ```
//!
//! # Design Decisions
//! - Tables compiled up front, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always matches same location

pub mod matcher;
pub mod router;

pub use matcher::PathPattern;
pub use router::{Handler, Location, LocationTable, Resolution, RouteError};
