//! Recursive-descent file resolution.
//!
//! A pattern is an ordinary path in which any component spelled `...`
//! matches zero or more directory levels, e.g.
//! `/srv/app/libs/.../includepath.xml`. Other components match literally.

use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

/// The path component that stands for "any number of directories".
pub const RECURSIVE_SEGMENT: &str = "...";

/// Every regular file matching `pattern`, depth-first in file-name order.
///
/// Entries that cannot be read while walking are skipped. A pattern without
/// a `...` component resolves to itself when it names an existing file.
pub fn resolve_files(pattern: &Path) -> Vec<PathBuf> {
    let components: Vec<Component<'_>> = pattern.components().collect();
    let Some(split) = components
        .iter()
        .position(|c| c.as_os_str() == OsStr::new(RECURSIVE_SEGMENT))
    else {
        return if pattern.is_file() {
            vec![pattern.to_path_buf()]
        } else {
            Vec::new()
        };
    };

    let root: PathBuf = components[..split].iter().collect();
    let tail: Vec<&OsStr> = components[split..].iter().map(|c| c.as_os_str()).collect();
    if !root.is_dir() {
        return Vec::new();
    }

    let mut found = Vec::new();
    for entry in WalkDir::new(&root).follow_links(true).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                debug!(error = %err, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(&root) else {
            continue;
        };
        let relative: Vec<&OsStr> = relative.components().map(|c| c.as_os_str()).collect();
        if segments_match(&tail, &relative) {
            found.push(entry.path().to_path_buf());
        }
    }
    found
}

fn segments_match(pattern: &[&OsStr], path: &[&OsStr]) -> bool {
    match pattern.split_first() {
        None => path.is_empty(),
        Some((head, rest)) if *head == OsStr::new(RECURSIVE_SEGMENT) => {
            (0..=path.len()).any(|skip| segments_match(rest, &path[skip..]))
        }
        Some((head, rest)) => path
            .split_first()
            .is_some_and(|(first, remaining)| first == head && segments_match(rest, remaining)),
    }
}
