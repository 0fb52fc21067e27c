//! Build-time metadata embedded by the build script.
//!
//! Reported by `classmap version`.

/// The git commit hash at build time (short form).
pub const GIT_HASH: &str = env!("CLASSMAP_GIT_HASH");

/// The target triple.
pub const BUILD_TARGET: &str = env!("CLASSMAP_BUILD_TARGET");

/// The build profile (`debug` or `release`).
pub const BUILD_PROFILE: &str = env!("CLASSMAP_BUILD_PROFILE");

/// The crate version from Cargo.toml.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Return a formatted version string, e.g. `"0.1.0 (abc1234, debug, x86_64-unknown-linux-gnu)"`.
pub fn version_string() -> String {
    format!("{VERSION} ({GIT_HASH}, {BUILD_PROFILE}, {BUILD_TARGET})")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_string_contains_version_and_target() {
        let v = version_string();
        assert!(v.starts_with(VERSION));
        assert!(v.contains(BUILD_TARGET));
    }

    #[test]
    fn test_build_profile() {
        assert_eq!(BUILD_PROFILE, "debug");
    }
}
