//! Runtime directives.
//!
//! The only directive the index consults is [`DEBUG_MODE`]: when it is set,
//! builds and resolver snapshots bypass the cache entirely so manifest edits
//! take effect without invalidation.

use std::collections::HashMap;

/// Directive name that switches developer mode on.
pub const DEBUG_MODE: &str = "DEBUG_MODE";

/// Lookup of boolean runtime directives.
pub trait RuntimeDirectives: Send + Sync {
    /// Whether the named directive is set. Unknown names are unset.
    fn directive(&self, name: &str) -> bool;
}

/// Map-backed directives, usually built from `[runtime]` in `classmap.toml`.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectives {
    values: HashMap<String, bool>,
}

impl StaticDirectives {
    /// Create an empty directive set (developer mode off).
    pub fn new() -> Self {
        Self::default()
    }

    /// Directives with only `DEBUG_MODE` set to `enabled`.
    pub fn developer_mode(enabled: bool) -> Self {
        Self::new().with(DEBUG_MODE, enabled)
    }

    /// Builder-style setter.
    pub fn with(mut self, name: impl Into<String>, value: bool) -> Self {
        self.set(name, value);
        self
    }

    /// Set a directive.
    pub fn set(&mut self, name: impl Into<String>, value: bool) {
        self.values.insert(name.into(), value);
    }
}

impl RuntimeDirectives for StaticDirectives {
    fn directive(&self, name: &str) -> bool {
        self.values.get(name).copied().unwrap_or(false)
    }
}
