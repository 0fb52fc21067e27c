#![deny(unsafe_code)]

//! Shared test utilities for the classmap workspace.
//!
//! Provides on-disk project fixtures, a recording host, config builders and
//! tracing helpers so that individual crate tests stay concise and
//! consistent.
//!
//! Add this crate as a `[dev-dependency]` in any workspace member:
//!
//! ```toml
//! [dev-dependencies]
//! classmap-test-utils = { workspace = true }
//! ```

pub mod config;
pub mod fixture;
pub mod host;
pub mod tracing_setup;

pub use fixture::ProjectFixture;
pub use host::RecordingHost;
