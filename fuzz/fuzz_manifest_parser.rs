//! Fuzz target for the `includepath.xml` manifest parser.
//!
//! Run with: cargo +nightly fuzz run fuzz_manifest_parser
//!
//! Parses arbitrary input as a manifest and, when it parses, derives every
//! cluster's location. Neither step may panic.

#![no_main]

use std::path::Path;

use classmap_core::Manifest;
use classmap_core::manifest::ManifestEntry;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let path = Path::new("/fuzz/config/includepath.xml");
    if let Ok(manifest) = Manifest::parse(text, path) {
        for entry in &manifest.entries {
            if let ManifestEntry::Cluster(cluster) = entry {
                let _ = cluster.directory(Path::new("/fuzz"), manifest.directory());
                for rule in &cluster.rules {
                    let _ = rule.is_pattern();
                }
            }
        }
    }
});
