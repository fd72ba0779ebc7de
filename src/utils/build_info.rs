use std::fmt;

/// Where and how this binary was built, as recorded by `build.rs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildInfo {
    pub version: &'static str,
    pub commit: &'static str,
    pub tree: &'static str,
    pub built_at: &'static str,
    pub target: &'static str,
    pub profile: &'static str,
    pub rustc: &'static str,
}

macro_rules! embedded {
    ($key:literal) => {
        match option_env!(concat!("BANKVIZ_BUILD_", $key)) {
            Some(value) => value,
            None => "unknown",
        }
    };
}

pub const CURRENT: BuildInfo = BuildInfo {
    version: env!("CARGO_PKG_VERSION"),
    commit: embedded!("HASH"),
    tree: embedded!("STATUS"),
    built_at: embedded!("TIMESTAMP"),
    target: embedded!("TARGET"),
    profile: embedded!("PROFILE"),
    rustc: embedded!("RUSTC"),
};

pub fn current() -> BuildInfo {
    CURRENT
}

impl BuildInfo {
    /// Built from a working tree with uncommitted changes.
    pub fn is_dirty(&self) -> bool {
        self.tree == "dirty"
    }
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "bankviz {} ({} {})", self.version, self.commit, self.tree)?;
        writeln!(f, "built {} for {} [{}]", self.built_at, self.target, self.profile)?;
        f.write_str(self.rustc)
    }
}
