//! The external collaborators an index build needs: a cache and the
//! runtime directives that gate it.

use std::fmt;
use std::sync::Arc;

use classmap_config::AppConfig;

use crate::cache::{CacheBackend, FileCache, MemoryCache, NullCache};
use crate::directives::{DEBUG_MODE, RuntimeDirectives, StaticDirectives};

/// Shared handles to the cache backend and the runtime directives.
///
/// Cheap to clone; every [`IndexSource`](crate::IndexSource) and the
/// [`Resolver`](crate::Resolver) of one process hold the same pair.
#[derive(Clone)]
pub struct Services {
    cache: Arc<dyn CacheBackend>,
    directives: Arc<dyn RuntimeDirectives>,
}

impl Services {
    pub fn new(cache: Arc<dyn CacheBackend>, directives: Arc<dyn RuntimeDirectives>) -> Self {
        Self { cache, directives }
    }

    /// A fresh in-memory cache with developer mode off.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryCache::new()),
            Arc::new(StaticDirectives::new()),
        )
    }

    /// Build the collaborators described by `[cache]` and `[runtime]`.
    pub fn from_config(config: &AppConfig) -> Self {
        let cache: Arc<dyn CacheBackend> = match config.cache.backend.as_str() {
            "file" => Arc::new(FileCache::new(&config.cache.dir)),
            "none" => Arc::new(NullCache),
            _ => Arc::new(MemoryCache::new()),
        };

        let mut directives = StaticDirectives::new();
        for (name, value) in &config.runtime.directives {
            directives.set(name.clone(), *value);
        }
        if config.runtime.developer_mode {
            directives.set(DEBUG_MODE, true);
        }

        Self::new(cache, Arc::new(directives))
    }

    pub fn cache(&self) -> &dyn CacheBackend {
        self.cache.as_ref()
    }

    pub fn directives(&self) -> &dyn RuntimeDirectives {
        self.directives.as_ref()
    }

    /// Whether `DEBUG_MODE` is set. Caching is bypassed while it is.
    pub fn developer_mode(&self) -> bool {
        self.directives.directive(DEBUG_MODE)
    }
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Services")
            .field("developer_mode", &self.developer_mode())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_defaults() {
        let services = Services::in_memory();
        assert!(!services.developer_mode());
        assert!(services.cache().get_data("missing").unwrap().is_none());
    }

    #[test]
    fn test_from_config_developer_mode() {
        let config = AppConfig::parse(
            r#"
            [runtime]
            developer_mode = true
        "#,
        )
        .unwrap();
        assert!(Services::from_config(&config).developer_mode());
    }

    #[test]
    fn test_from_config_extra_directives() {
        let config = AppConfig::parse(
            r#"
            [runtime.directives]
            TRACE_BUILDS = true
        "#,
        )
        .unwrap();
        let services = Services::from_config(&config);
        assert!(services.directives().directive("TRACE_BUILDS"));
        assert!(!services.developer_mode());
    }

    #[test]
    fn test_from_config_null_cache() {
        let config = AppConfig::parse(
            r#"
            [cache]
            backend = "none"
        "#,
        )
        .unwrap();
        let services = Services::from_config(&config);
        services
            .cache()
            .set_data("k", serde_json::json!(1))
            .unwrap();
        assert!(services.cache().get_data("k").unwrap().is_none());
    }
}
