//! Access levels and the features they unlock.
//!
//! Every level unlocks everything the levels below it do:
//! `Public < Restricted < Default < Private < Super`.

use std::fmt;
use std::str::FromStr;

/// Access level of the code running a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum AccessLevel {
    /// Read-only queries against the local graph.
    Public,
    /// Adds federated service calls.
    Restricted,
    /// Adds updates and loading remote resources.
    #[default]
    Default,
    /// Adds loading local files.
    Private,
    /// Everything.
    Super,
}

impl AccessLevel {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Restricted => "restricted",
            Self::Default => "default",
            Self::Private => "private",
            Self::Super => "super",
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AccessLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "public" => Ok(Self::Public),
            "restricted" => Ok(Self::Restricted),
            "default" => Ok(Self::Default),
            "private" => Ok(Self::Private),
            "super" => Ok(Self::Super),
            other => Err(format!("unknown access level '{other}'")),
        }
    }
}

/// An access-controlled operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    Service,
    Update,
    Load,
    LoadFile,
}

impl Feature {
    /// The lowest level allowed to use this feature.
    #[must_use]
    pub const fn required_level(self) -> AccessLevel {
        match self {
            Self::Service => AccessLevel::Restricted,
            Self::Update | Self::Load => AccessLevel::Default,
            Self::LoadFile => AccessLevel::Private,
        }
    }

    /// The feature needed to load `path`: local paths and `file:` IRIs
    /// need `LoadFile`, everything else `Load`.
    #[must_use]
    pub fn for_path(path: &str) -> Self {
        let remote = ["http://", "https://"]
            .iter()
            .any(|scheme| path.starts_with(scheme));
        if remote { Self::Load } else { Self::LoadFile }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Service => "service",
            Self::Update => "update",
            Self::Load => "load",
            Self::LoadFile => "load file",
        };
        f.write_str(name)
    }
}

/// An operation was rejected by the active access level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafetyError {
    pub feature: Feature,
    pub level: AccessLevel,
    /// Path or IRI the operation targeted.
    pub target: String,
}

impl fmt::Display for SafetyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} not allowed at access level {}: {}",
            self.feature, self.level, self.target
        )
    }
}

impl std::error::Error for SafetyError {}

/// Check that `level` may use `feature` on `target`.
pub fn check(level: AccessLevel, feature: Feature, target: &str) -> Result<(), SafetyError> {
    if level >= feature.required_level() {
        Ok(())
    } else {
        tracing::warn!("rejected {feature} at level {level}: {target}");
        Err(SafetyError {
            feature,
            level,
            target: target.to_owned(),
        })
    }
}
