//! Aggregating resolver.
//!
//! The [`Resolver`] folds [`IndexSource`]s into one set of tables and answers
//! lookups against them. It is an explicitly constructed service: create one
//! per process with [`Resolver::open`] (which rehydrates the last snapshot
//! from the cache) and pass it by reference.
//!
//! Merging is first-write-wins: a source added later only fills symbols,
//! autoloader owners and classpaths that are not present yet.

use std::path::{Path, PathBuf};

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cache::{CacheError, RESOLVER_CACHE_KEY};
use crate::host::{Host, HostError};
use crate::index::{IndexError, IndexSource, IndexTables};
use crate::services::Services;
use crate::symbol::{SymbolMap, fold};

/// Errors surfaced by the resolver.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("include of {path} failed: {source}")]
    Include {
        path: PathBuf,
        #[source]
        source: HostError,
    },

    #[error("autoloader {owner}::{method} failed for {symbol}: {source}")]
    Autoloader {
        owner: String,
        method: String,
        symbol: String,
        #[source]
        source: HostError,
    },
}

/// Serializable aggregate state, cached under `__ClassLoader__`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverSnapshot {
    /// Base directories already folded in, as given to their sources.
    pub sources: IndexSet<String>,
    pub mapping: SymbolMap,
    pub autoloaders: IndexMap<String, String>,
    pub classpaths: Vec<String>,
}

impl ResolverSnapshot {
    /// Fill keys not present yet from `tables`.
    fn merge(&mut self, tables: &IndexTables) {
        for (symbol, path) in &tables.mapping {
            self.mapping
                .entry(symbol.clone())
                .or_insert_with(|| path.clone());
        }
        for (owner, method) in &tables.autoloaders {
            if !self.autoloaders.contains_key(owner) {
                self.autoloaders.insert(owner.clone(), method.clone());
            }
        }
        for classpath in &tables.classpaths {
            if !self.classpaths.contains(classpath) {
                self.classpaths.push(classpath.clone());
            }
        }
    }
}

/// Merged view over every registered [`IndexSource`].
#[derive(Debug)]
pub struct Resolver {
    services: Services,
    state: ResolverSnapshot,
}

impl Resolver {
    /// An empty resolver. Does not consult the cache.
    pub fn new(services: Services) -> Self {
        Self::from_snapshot(services, ResolverSnapshot::default())
    }

    /// A resolver seeded with previously captured state.
    pub fn from_snapshot(services: Services, snapshot: ResolverSnapshot) -> Self {
        Self {
            services,
            state: snapshot,
        }
    }

    /// Rehydrate from the cache, or start empty.
    ///
    /// In developer mode the cache is not read.
    pub fn open(services: Services) -> Result<Self, ResolveError> {
        if services.developer_mode() {
            return Ok(Self::new(services));
        }
        let Some(value) = services.cache().get_data(RESOLVER_CACHE_KEY)? else {
            return Ok(Self::new(services));
        };
        match serde_json::from_value::<ResolverSnapshot>(value) {
            Ok(snapshot) => {
                debug!(
                    sources = snapshot.sources.len(),
                    symbols = snapshot.mapping.len(),
                    "resolver restored from cache"
                );
                Ok(Self::from_snapshot(services, snapshot))
            }
            Err(e) => {
                warn!(error = %e, "discarding unreadable resolver snapshot");
                Ok(Self::new(services))
            }
        }
    }

    /// Fold `source` into the aggregate tables.
    ///
    /// Keyed on the source's base directory exactly as given; a second source
    /// with the same base is ignored and `Ok(false)` is returned. Builds the
    /// source if it has not been built yet.
    pub fn add_source(&mut self, source: &IndexSource) -> Result<bool, ResolveError> {
        let key = source.base_dir();
        if self.state.sources.contains(key) {
            debug!(base = key, "source already registered");
            return Ok(false);
        }

        let tables = source.tables()?;
        self.state.merge(tables);
        self.state.sources.insert(key.to_string());
        info!(
            base = key,
            contributed = tables.mapping.len(),
            symbols = self.state.mapping.len(),
            "source registered"
        );

        if !self.services.developer_mode() {
            let value = serde_json::to_value(&self.state).map_err(CacheError::from)?;
            self.services.cache().set_data(RESOLVER_CACHE_KEY, value)?;
        }
        Ok(true)
    }

    /// The file mapped to `symbol`, in any case.
    pub fn locate(&self, symbol: &str) -> Option<&Path> {
        self.state.mapping.get(&fold(symbol)).map(PathBuf::as_path)
    }

    /// Load `symbol` through `host`.
    ///
    /// A mapped symbol is included and yields `true`. Otherwise autoloaders
    /// are tried in order with the folded symbol until one accepts it. Errors
    /// from the include hook or an autoloader abort immediately.
    pub fn load(&self, symbol: &str, host: &dyn Host) -> Result<bool, ResolveError> {
        let folded = fold(symbol);
        if let Some(path) = self.state.mapping.get(&folded) {
            debug!(symbol = %folded, path = %path.display(), "including mapped file");
            host.include(path).map_err(|source| ResolveError::Include {
                path: path.clone(),
                source,
            })?;
            return Ok(true);
        }

        for (owner, method) in &self.state.autoloaders {
            match host.call_autoloader(owner, method, &folded) {
                Some(Ok(true)) => {
                    debug!(symbol = %folded, owner = %owner, method = %method, "autoloader accepted symbol");
                    return Ok(true);
                }
                Some(Ok(false)) => {}
                Some(Err(source)) => {
                    return Err(ResolveError::Autoloader {
                        owner: owner.clone(),
                        method: method.clone(),
                        symbol: folded,
                        source,
                    });
                }
                None => warn!(owner = %owner, method = %method, "no callable bound for autoloader"),
            }
        }
        Ok(false)
    }

    /// Number of mapped symbols.
    pub fn len(&self) -> usize {
        self.state.mapping.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.mapping.is_empty()
    }

    /// Every mapping, sorted by folded symbol.
    pub fn mappings(&self) -> Vec<(&str, &Path)> {
        let mut all: Vec<_> = self
            .state
            .mapping
            .iter()
            .map(|(symbol, path)| (symbol.as_str(), path.as_path()))
            .collect();
        all.sort_unstable_by_key(|(symbol, _)| *symbol);
        all
    }

    /// Autoloaders as `(owner, method)`, in the order they are tried.
    pub fn autoloaders(&self) -> impl Iterator<Item = (&str, &str)> {
        self.state
            .autoloaders
            .iter()
            .map(|(owner, method)| (owner.as_str(), method.as_str()))
    }

    pub fn classpaths(&self) -> &[String] {
        &self.state.classpaths
    }

    /// Base directories registered so far, in registration order.
    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.state.sources.iter().map(String::as_str)
    }

    pub fn snapshot(&self) -> &ResolverSnapshot {
        &self.state
    }
}
