//! Per-root index builder.
//!
//! An [`IndexSource`] is rooted at one base directory. On first access it
//! discovers manifests, expands their rules against the filesystem and
//! publishes an immutable [`IndexTables`]. Builds are memoized in the cache
//! under `indexsource_<normalized base>` unless developer mode is on.
//!
//! ## Manifest discovery
//!
//! - every `includepath.xml` anywhere below `<base>/libs`, depth-first in
//!   file-name order;
//! - then `<base>/config/includepath.xml` when it exists.
//!
//! The config manifest is applied last, so its literal rules win.
//!
//! ## Merge rules
//!
//! Literal rules assign directly; a later literal for the same folded symbol
//! replaces the earlier one. A literal rule naming a file that does not exist
//! is skipped with a warning. Pattern expansions only fill symbols that are
//! not mapped yet.

use std::collections::HashMap;
use std::path::{MAIN_SEPARATOR, MAIN_SEPARATOR_STR, Path, PathBuf};
use std::sync::OnceLock;

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::cache::{CacheError, INDEX_SOURCE_CACHE_PREFIX};
use crate::files::{RECURSIVE_SEGMENT, resolve_files};
use crate::manifest::{ClassRule, MANIFEST_FILE_NAME, Manifest, ManifestEntry};
use crate::services::Services;
use crate::symbol::{SymbolMap, fold};

/// Errors that abort an index build.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("error parsing includepath file {path}: {source}")]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: roxmltree::Error,
    },

    #[error("{path}: <{element}> is missing required attribute `{attribute}`")]
    ManifestSchema {
        path: PathBuf,
        element: &'static str,
        attribute: &'static str,
    },

    #[error("the directory {path} specified in the includepath does not exist or is not readable")]
    UnreadableDirectory { path: PathBuf },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid file pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// The three tables one source contributes. Built as a unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexTables {
    /// Folded symbol → file path.
    pub mapping: SymbolMap,
    /// Owner → method, in declaration order.
    pub autoloaders: IndexMap<String, String>,
    /// Extra search roots, passed through verbatim.
    pub classpaths: Vec<String>,
}

impl IndexTables {
    /// Fold one manifest's declarations into these tables.
    pub fn apply(&mut self, manifest: &Manifest, index_root: &Path) -> Result<(), IndexError> {
        for entry in &manifest.entries {
            match entry {
                ManifestEntry::Cluster(cluster) => {
                    let (dir, recursive) = cluster.directory(index_root, manifest.directory());
                    for rule in &cluster.rules {
                        if rule.is_pattern() {
                            for (symbol, path) in expand_pattern(rule, &dir, recursive)? {
                                self.mapping.entry(symbol).or_insert(path);
                            }
                        } else {
                            let path = dir.join(rule.file.trim_start_matches(['/', MAIN_SEPARATOR]));
                            if !path.is_file() {
                                warn!(
                                    symbol = %rule.name,
                                    path = %path.display(),
                                    manifest = %manifest.path.display(),
                                    "skipping rule for missing file"
                                );
                                continue;
                            }
                            self.mapping.insert(fold(&rule.name), path);
                        }
                    }
                }
                ManifestEntry::Autoload(decl) => {
                    self.autoloaders
                        .insert(decl.owner.clone(), decl.method.clone());
                }
                ManifestEntry::Classpath(path) => self.classpaths.push(path.clone()),
            }
        }
        Ok(())
    }
}

/// Index builder rooted at one base directory.
pub struct IndexSource {
    base_dir: String,
    normalized_base_dir: String,
    services: Services,
    tables: OnceLock<IndexTables>,
}

impl IndexSource {
    /// Create an unbuilt source. Performs no I/O.
    pub fn new(base_dir: impl Into<String>, services: Services) -> Self {
        let base_dir = base_dir.into();
        let normalized_base_dir = base_dir.trim_end_matches(MAIN_SEPARATOR).to_string();
        Self {
            base_dir,
            normalized_base_dir,
            services,
            tables: OnceLock::new(),
        }
    }

    /// The base directory as given.
    pub fn base_dir(&self) -> &str {
        &self.base_dir
    }

    /// The base directory without trailing separators.
    pub fn normalized_base_dir(&self) -> &str {
        &self.normalized_base_dir
    }

    /// Directory manifests and rooted clusters resolve against.
    ///
    /// A base made only of separators normalizes to `""` but still means the
    /// filesystem root.
    pub fn index_root(&self) -> &Path {
        if self.normalized_base_dir.is_empty() && !self.base_dir.is_empty() {
            Path::new(MAIN_SEPARATOR_STR)
        } else {
            Path::new(&self.normalized_base_dir)
        }
    }

    /// Key this source's build is cached under.
    pub fn cache_key(&self) -> String {
        format!("{INDEX_SOURCE_CACHE_PREFIX}{}", self.normalized_base_dir)
    }

    /// Whether the tables have been published.
    pub fn is_built(&self) -> bool {
        self.tables.get().is_some()
    }

    pub fn mapping(&self) -> Result<&SymbolMap, IndexError> {
        Ok(&self.tables()?.mapping)
    }

    pub fn autoloaders(&self) -> Result<&IndexMap<String, String>, IndexError> {
        Ok(&self.tables()?.autoloaders)
    }

    pub fn classpaths(&self) -> Result<&[String], IndexError> {
        Ok(&self.tables()?.classpaths)
    }

    /// All three tables, building them on first call.
    ///
    /// A failed build publishes nothing; the next call retries.
    pub fn tables(&self) -> Result<&IndexTables, IndexError> {
        if let Some(tables) = self.tables.get() {
            return Ok(tables);
        }
        let built = self.load()?;
        Ok(self.tables.get_or_init(|| built))
    }

    fn load(&self) -> Result<IndexTables, IndexError> {
        let developer_mode = self.services.developer_mode();
        let key = self.cache_key();

        if !developer_mode && let Some(value) = self.services.cache().get_data(&key)? {
            match serde_json::from_value::<IndexTables>(value) {
                Ok(tables) => {
                    debug!(base = %self.normalized_base_dir, "index loaded from cache");
                    return Ok(tables);
                }
                Err(e) => {
                    warn!(base = %self.normalized_base_dir, error = %e, "discarding unreadable cached index");
                }
            }
        }

        let tables = build_tables(self.index_root())?;

        if !developer_mode {
            let value = serde_json::to_value(&tables).map_err(CacheError::from)?;
            self.services.cache().set_data(&key, value)?;
        }
        Ok(tables)
    }
}

impl std::fmt::Debug for IndexSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexSource")
            .field("base_dir", &self.base_dir)
            .field("built", &self.is_built())
            .finish()
    }
}

/// Manifests contributing to the index rooted at `root`, in apply order.
pub fn discover_manifests(root: &Path) -> Vec<PathBuf> {
    let libs = root.join("libs");
    let mut manifests = if libs.is_dir() {
        resolve_files(&libs.join(RECURSIVE_SEGMENT).join(MANIFEST_FILE_NAME))
    } else {
        Vec::new()
    };

    let config = root.join("config").join(MANIFEST_FILE_NAME);
    if config.is_file() {
        manifests.push(config);
    }
    manifests
}

/// Build the tables for `root` from scratch, bypassing any cache.
pub fn build_tables(root: &Path) -> Result<IndexTables, IndexError> {
    let manifests = discover_manifests(root);
    let mut tables = IndexTables::default();
    for path in &manifests {
        debug!(manifest = %path.display(), "applying manifest");
        let manifest = Manifest::load(path)?;
        tables.apply(&manifest, root)?;
    }
    info!(
        base = %root.display(),
        manifests = manifests.len(),
        symbols = tables.mapping.len(),
        autoloaders = tables.autoloaders.len(),
        classpaths = tables.classpaths.len(),
        "index built"
    );
    Ok(tables)
}

/// Expand a pattern rule by scanning `dir`.
///
/// `*` in the rule's `file` captures one or more characters (non-greedy);
/// the first capture replaces every `*` in the rule's `name`. Dot-prefixed
/// entries are skipped, files and directories alike. Subdirectories are
/// descended only when `recursive`. The first file producing a symbol keeps
/// it.
pub fn expand_pattern(
    rule: &ClassRule,
    dir: &Path,
    recursive: bool,
) -> Result<SymbolMap, IndexError> {
    let matcher = file_pattern(&rule.file)?;
    if !dir.is_dir() {
        return Err(IndexError::UnreadableDirectory {
            path: dir.to_path_buf(),
        });
    }

    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(if recursive { usize::MAX } else { 1 })
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !entry.file_name().to_string_lossy().starts_with('.'));

    let mut expanded = HashMap::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 => {
                return Err(IndexError::UnreadableDirectory {
                    path: dir.to_path_buf(),
                });
            }
            Err(err) => {
                debug!(error = %err, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(file_name) = entry.file_name().to_str() else {
            continue;
        };
        let Some(captured) = matcher
            .captures(file_name)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
        else {
            continue;
        };
        expanded
            .entry(fold(&rule.name.replace('*', captured)))
            .or_insert_with(|| entry.path().to_path_buf());
    }
    Ok(expanded)
}

/// Anchored regex for a `file` attribute with `*` as a lazy capture.
fn file_pattern(file: &str) -> Result<Regex, IndexError> {
    let body = regex::escape(file).replace(r"\*", "(.+?)");
    Regex::new(&format!("^{body}$")).map_err(|source| IndexError::Pattern {
        pattern: file.to_string(),
        source,
    })
}
