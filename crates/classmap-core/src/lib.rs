#![deny(unsafe_code)]

//! classmap core — manifest-driven symbol index and resolver.
//!
//! An [`IndexSource`] is rooted at one base directory. It discovers
//! `includepath.xml` manifests beneath that root, expands their literal and
//! pattern rules against the filesystem, and publishes three immutable
//! tables: symbol → file path, fallback autoloaders, and classpaths.
//!
//! The [`Resolver`] folds any number of sources into aggregate tables
//! (first contribution wins per key) and answers lookups. Symbols it does
//! not know are offered to the autoloader chain through a [`Host`].
//!
//! Built tables are memoized in a [`CacheBackend`] unless the
//! `DEBUG_MODE` runtime directive (developer mode) is on.

/// Compile-time build metadata (version, git hash, profile).
pub mod build_info;
/// Key/value cache backends for built indexes and resolver snapshots.
pub mod cache;
/// Runtime directive lookup (developer mode).
pub mod directives;
/// Recursive-descent file resolution (`...` path segments).
pub mod files;
/// Include and autoloader hooks supplied by the embedding host.
pub mod host;
/// Per-root index builder.
pub mod index;
/// `includepath.xml` parsing into a typed model.
pub mod manifest;
/// Aggregating resolver.
pub mod resolver;
/// Collaborator bundle handed to sources and the resolver.
pub mod services;
/// Symbol name folding.
pub mod symbol;

pub use cache::{CacheBackend, CacheError, FileCache, MemoryCache, NullCache};
pub use directives::{RuntimeDirectives, StaticDirectives, DEBUG_MODE};
pub use host::{Bindings, Host, HostError};
pub use index::{IndexError, IndexSource, IndexTables};
pub use manifest::Manifest;
pub use resolver::{ResolveError, Resolver, ResolverSnapshot};
pub use services::Services;
pub use symbol::fold;
