//! `includepath.xml` manifests.
//!
//! The document element may have any name. Its element children are read in
//! document order; anything other than `cluster`, `autoload` and `classpath`
//! is ignored.
//!
//! ```xml
//! <includepath>
//!   <cluster path="/libs/auth">
//!     <class name="AuthService" file="AuthService.ext"/>
//!   </cluster>
//!   <cluster path="models/...">
//!     <class name="*Dao" file="*Dao.ext"/>
//!   </cluster>
//!   <autoload class="Legacy" method="load"/>
//!   <classpath path="vendor/lib"/>
//! </includepath>
//! ```

use std::path::{Path, PathBuf};

use roxmltree::{Document, Node};

use crate::index::IndexError;

/// File name searched for under `libs/` and `config/`.
pub const MANIFEST_FILE_NAME: &str = "includepath.xml";

/// Suffix on a cluster path that turns on recursive pattern scans.
const RECURSIVE_SUFFIX: &str = "/...";

/// A parsed manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    /// Where the manifest was read from. Relative cluster paths resolve
    /// against its parent directory.
    pub path: PathBuf,
    /// Recognised top-level declarations, in document order.
    pub entries: Vec<ManifestEntry>,
}

/// A top-level declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestEntry {
    Cluster(Cluster),
    Autoload(AutoloadDecl),
    Classpath(String),
}

/// A group of rules sharing one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    /// The trimmed `path` attribute as written.
    pub path: String,
    pub rules: Vec<ClassRule>,
}

/// Where a cluster's files live, derived from its `path` attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterLocation {
    /// Leading `/`: relative to the index root rather than the manifest.
    pub rooted: bool,
    /// The path with the leading `/` and any trailing `/...` removed.
    pub relative: String,
    /// Trailing `/...`: pattern rules descend into subdirectories.
    pub recursive: bool,
}

impl Cluster {
    pub fn location(&self) -> ClusterLocation {
        let rooted = self.path.starts_with('/');
        let (path, recursive) = match self.path.strip_suffix(RECURSIVE_SUFFIX) {
            Some(stripped) => (stripped, true),
            None => (self.path.as_str(), false),
        };
        ClusterLocation {
            rooted,
            relative: path.trim_start_matches('/').to_string(),
            recursive,
        }
    }

    /// The directory this cluster's rules resolve against.
    pub fn directory(&self, index_root: &Path, manifest_dir: &Path) -> (PathBuf, bool) {
        let location = self.location();
        let base = if location.rooted {
            index_root
        } else {
            manifest_dir
        };
        (base.join(&location.relative), location.recursive)
    }
}

/// Element a rule was declared with. Both map symbols the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    Class,
    Interface,
}

impl RuleKind {
    fn element(self) -> &'static str {
        match self {
            RuleKind::Class => "class",
            RuleKind::Interface => "interface",
        }
    }
}

/// A `class` or `interface` declaration inside a cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassRule {
    pub kind: RuleKind,
    pub name: String,
    pub file: String,
}

impl ClassRule {
    /// A `*` in the name makes this a pattern rule expanded by directory scan.
    pub fn is_pattern(&self) -> bool {
        self.name.contains('*')
    }
}

/// A fallback resolver named by owner and method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoloadDecl {
    pub owner: String,
    pub method: String,
}

impl Manifest {
    /// Read and parse the manifest at `path`.
    pub fn load(path: &Path) -> Result<Self, IndexError> {
        let text = std::fs::read_to_string(path).map_err(|source| IndexError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }

    /// Parse manifest text. `path` is recorded on the result and in errors.
    pub fn parse(text: &str, path: &Path) -> Result<Self, IndexError> {
        let document = Document::parse(text).map_err(|source| IndexError::ManifestParse {
            path: path.to_path_buf(),
            source,
        })?;

        let mut entries = Vec::new();
        for child in document.root_element().children().filter(Node::is_element) {
            match child.tag_name().name() {
                "cluster" => entries.push(ManifestEntry::Cluster(parse_cluster(child, path)?)),
                "autoload" => {
                    let owner = required(child, "autoload", "class", path)?;
                    let method = required(child, "autoload", "method", path)?;
                    entries.push(ManifestEntry::Autoload(AutoloadDecl { owner, method }));
                }
                "classpath" => {
                    entries.push(ManifestEntry::Classpath(required(
                        child,
                        "classpath",
                        "path",
                        path,
                    )?));
                }
                _ => {}
            }
        }

        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    /// Directory relative cluster paths resolve against.
    pub fn directory(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }
}

fn parse_cluster(node: Node<'_, '_>, path: &Path) -> Result<Cluster, IndexError> {
    let mut rules = Vec::new();
    for child in node.children().filter(Node::is_element) {
        let kind = match child.tag_name().name() {
            "class" => RuleKind::Class,
            "interface" => RuleKind::Interface,
            _ => continue,
        };
        let name = child.attribute("name").unwrap_or_default().to_string();
        let file = required(child, kind.element(), "file", path)?;
        rules.push(ClassRule { kind, name, file });
    }
    Ok(Cluster {
        path: node.attribute("path").unwrap_or_default().trim().to_string(),
        rules,
    })
}

fn required(
    node: Node<'_, '_>,
    element: &'static str,
    attribute: &'static str,
    path: &Path,
) -> Result<String, IndexError> {
    node.attribute(attribute)
        .map(str::to_string)
        .ok_or_else(|| IndexError::ManifestSchema {
            path: path.to_path_buf(),
            element,
            attribute,
        })
}
