//! Provider-facing descriptors (data) and the built-in provider set.
//!
//! `descriptor` exposes validated per-provider configuration: detection signal tables,
//! metadata endpoints, request headers, and the capability flags that select collector code
//! paths. `builtin` ships descriptors for AWS, Azure, and GCP.

pub mod builtin;
pub mod descriptor;
pub mod id;

pub use descriptor::*;
pub use id::*;
