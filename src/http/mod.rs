//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace span)
//!     → routing (location lookup)
//!     → proxy forwarder        or  static_files.rs
//!     → response.rs (gateway errors, 404)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;
pub mod static_files;

pub use request::{MakeRequestUuid, X_REQUEST_ID};
pub use response::GatewayError;
pub use server::{HttpServer, ServerState};
pub use static_files::StaticFiles;
