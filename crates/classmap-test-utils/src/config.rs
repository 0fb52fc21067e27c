//! Configuration builders for tests.
//!
//! Use [`TestConfigBuilder`] to create customised [`AppConfig`] values without
//! repeating boilerplate across crate boundaries.

use classmap_config::AppConfig;

/// Fluent builder for [`AppConfig`] in tests.
///
/// # Example
///
/// ```ignore
/// let config = TestConfigBuilder::new()
///     .root(fixture.base_dir())
///     .developer_mode(true)
///     .build();
/// ```
pub struct TestConfigBuilder {
    config: AppConfig,
}

impl TestConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
        }
    }

    pub fn root(mut self, root: impl Into<String>) -> Self {
        self.config.index.roots.push(root.into());
        self
    }

    pub fn cache_backend(mut self, backend: &str) -> Self {
        self.config.cache.backend = backend.to_string();
        self
    }

    pub fn cache_dir(mut self, dir: impl Into<String>) -> Self {
        self.config.cache.dir = dir.into();
        self
    }

    pub fn developer_mode(mut self, enabled: bool) -> Self {
        self.config.runtime.developer_mode = enabled;
        self
    }

    pub fn directive(mut self, name: &str, value: bool) -> Self {
        self.config
            .runtime
            .directives
            .insert(name.to_string(), value);
        self
    }

    pub fn log_level(mut self, level: &str) -> Self {
        self.config.logging.level = level.to_string();
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}

impl Default for TestConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
