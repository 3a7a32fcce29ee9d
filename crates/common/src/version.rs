use std::fmt;

/// Build metadata baked in by the binary's build script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInfo {
    pub name: &'static str,
    pub version: &'static str,
    /// `git describe` output, or the pinned release revision
    pub revision: &'static str,
    pub profile: &'static str,
    pub timestamp: &'static str,
    pub rustc: &'static str,
    pub target: Option<&'static str>,
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} {} ({})", self.name, self.version, self.revision)?;
        write!(f, "built {} [{}]", self.timestamp, self.profile)?;
        if let Some(target) = self.target {
            write!(f, " for {}", target)?;
        }
        write!(f, "\n{}", self.rustc)
    }
}

/// Collect [`BuildInfo`] from the calling crate's compile-time environment.
///
/// Expands `env!` at the call site, so the calling crate's `build.rs` must
/// export `BUILD_REVISION`, `BUILD_PROFILE`, `BUILD_TIMESTAMP` and
/// `BUILD_RUSTC`.
#[macro_export]
macro_rules! build_info {
    () => {
        $crate::version::BuildInfo {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            revision: env!("BUILD_REVISION"),
            profile: env!("BUILD_PROFILE"),
            timestamp: env!("BUILD_TIMESTAMP"),
            rustc: env!("BUILD_RUSTC"),
            target: option_env!("BUILD_TARGET"),
        }
    };
}

#[cfg(test)]
mod test {
    use super::*;

    fn info(target: Option<&'static str>) -> BuildInfo {
        BuildInfo {
            name: "postcrypt",
            version: "0.1.0",
            revision: "v0.1.0-3-gabcdef",
            profile: "debug",
            timestamp: "2024-01-01T00:00:00+00:00",
            rustc: "rustc 1.80.0",
            target,
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(
            info(None).to_string(),
            "postcrypt 0.1.0 (v0.1.0-3-gabcdef)\nbuilt 2024-01-01T00:00:00+00:00 [debug]\nrustc 1.80.0"
        );
    }

    #[test]
    fn test_display_with_target() {
        let text = info(Some("x86_64-unknown-linux-gnu")).to_string();
        assert!(text.contains("[debug] for x86_64-unknown-linux-gnu\n"));
    }
}
