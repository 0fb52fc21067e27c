//! On-disk project fixtures.
//!
//! A [`ProjectFixture`] owns a temporary directory laid out like an index
//! root: `libs/**/includepath.xml`, `config/includepath.xml` and the class
//! files the manifests point at.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use classmap_core::manifest::MANIFEST_FILE_NAME;
use classmap_core::{CacheBackend, IndexSource, MemoryCache, Services, StaticDirectives};
use tempfile::TempDir;

/// A temporary index root. Deleted on drop, even on panic.
pub struct ProjectFixture {
    dir: TempDir,
}

impl ProjectFixture {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    /// The root directory.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// The root as a base-directory string for [`IndexSource::new`].
    pub fn base_dir(&self) -> String {
        self.root().to_string_lossy().into_owned()
    }

    /// Absolute path of `rel` under the root.
    pub fn path(&self, rel: &str) -> PathBuf {
        self.root().join(rel)
    }

    /// Write `contents` to `rel`, creating parent directories.
    pub fn write(&self, rel: &str, contents: &str) -> PathBuf {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("failed to create fixture dirs");
        }
        std::fs::write(&path, contents).expect("failed to write fixture file");
        path
    }

    /// Create an empty class file at each of `rels`.
    pub fn files(&self, rels: &[&str]) -> &Self {
        for rel in rels {
            self.write(rel, "");
        }
        self
    }

    /// Create an empty directory.
    pub fn dir(&self, rel: &str) -> PathBuf {
        let path = self.path(rel);
        std::fs::create_dir_all(&path).expect("failed to create fixture dir");
        path
    }

    /// Write `<rel_dir>/includepath.xml` with `body` wrapped in a root element.
    pub fn manifest(&self, rel_dir: &str, body: &str) -> PathBuf {
        self.write(
            &format!("{rel_dir}/{MANIFEST_FILE_NAME}"),
            &format!("<?xml version=\"1.0\"?>\n<includepath>\n{body}\n</includepath>\n"),
        )
    }

    /// Write `config/includepath.xml`.
    pub fn config_manifest(&self, body: &str) -> PathBuf {
        self.manifest("config", body)
    }

    /// An [`IndexSource`] rooted here.
    pub fn source(&self, services: &Services) -> IndexSource {
        IndexSource::new(self.base_dir(), services.clone())
    }
}

impl Default for ProjectFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Services over a fresh in-memory cache the test can inspect.
pub fn memory_services(developer_mode: bool) -> (Services, Arc<MemoryCache>) {
    let cache = Arc::new(MemoryCache::new());
    let services = Services::new(
        Arc::clone(&cache) as Arc<dyn CacheBackend>,
        Arc::new(StaticDirectives::developer_mode(developer_mode)),
    );
    (services, cache)
}
