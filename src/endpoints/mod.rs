//! RPC endpoint management.
//!
//! # Data Flow
//! ```text
//! network.endpoints (config)
//!     → pool.rs (one bound client per endpoint, index 0 active)
//!     → every network-facing component asks pool.active()
//!     → on Transient/Timeout errors: pool.rotate() binds the next one
//! ```
//!
//! # Design Decisions
//! - Pool is an explicit object passed to components, not ambient state
//! - Pure round-robin; a failed endpoint is left, not scored
//! - Rotation never resets the pool; it wraps around

pub mod pool;

pub use pool::EndpointPool;
