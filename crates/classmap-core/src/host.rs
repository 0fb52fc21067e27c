//! Hooks into the embedding host.
//!
//! The resolver never loads code itself. When a symbol is mapped it hands the
//! file to [`Host::include`]; when it is not, each manifest-declared
//! autoloader is invoked through [`Host::call_autoloader`].

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// Error raised by an include hook or an autoloader.
pub type HostError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The host runtime as seen by the resolver.
pub trait Host {
    /// Load the file at `path`.
    fn include(&self, path: &Path) -> Result<(), HostError>;

    /// Invoke the autoloader `owner.method` with `symbol`.
    ///
    /// Returns `None` when nothing is bound to that identifier.
    fn call_autoloader(
        &self,
        owner: &str,
        method: &str,
        symbol: &str,
    ) -> Option<Result<bool, HostError>>;
}

type IncludeFn = Box<dyn Fn(&Path) -> Result<(), HostError> + Send + Sync>;
type AutoloadFn = Box<dyn Fn(&str) -> Result<bool, HostError> + Send + Sync>;

/// A [`Host`] built from plain function values.
///
/// Manifests name autoloaders by `(class, method)`; bind each identifier to
/// a closure with [`Bindings::bind`].
pub struct Bindings {
    include: IncludeFn,
    autoloaders: HashMap<(String, String), AutoloadFn>,
}

impl Bindings {
    /// Bindings whose include hook does nothing.
    pub fn new() -> Self {
        Self {
            include: Box::new(include_nothing),
            autoloaders: HashMap::new(),
        }
    }

    /// Replace the include hook.
    pub fn with_include<F>(mut self, include: F) -> Self
    where
        F: Fn(&Path) -> Result<(), HostError> + Send + Sync + 'static,
    {
        self.include = Box::new(include);
        self
    }

    /// Bind the autoloader declared as `<autoload class="owner" method="method"/>`.
    pub fn bind<F>(mut self, owner: impl Into<String>, method: impl Into<String>, f: F) -> Self
    where
        F: Fn(&str) -> Result<bool, HostError> + Send + Sync + 'static,
    {
        self.autoloaders
            .insert((owner.into(), method.into()), Box::new(f));
        self
    }

    pub fn is_bound(&self, owner: &str, method: &str) -> bool {
        self.autoloaders
            .contains_key(&(owner.to_string(), method.to_string()))
    }
}

fn include_nothing(_path: &Path) -> Result<(), HostError> {
    Ok(())
}

impl Default for Bindings {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bindings")
            .field("autoloaders", &self.autoloaders.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl Host for Bindings {
    fn include(&self, path: &Path) -> Result<(), HostError> {
        (self.include)(path)
    }

    fn call_autoloader(
        &self,
        owner: &str,
        method: &str,
        symbol: &str,
    ) -> Option<Result<bool, HostError>> {
        self.autoloaders
            .get(&(owner.to_string(), method.to_string()))
            .map(|f| f(symbol))
    }
}
