//! # Agent Version Strings
//!
//! Agents report either a tagged release (`1.2.5`, `1.2.5i4`, `1.2.6b2p1`,
//! `1.2.4p3`) or a daily build identified by its build date, optionally
//! prefixed with the branch it was cut from (`2014.06.01` for master,
//! `1.2.4-2014.06.01` for a branch).
//!
//! Release ordering within one `major.minor.sub` triple is
//! innovation (`iN`) < beta (`bN`) < final < patch (`pN`).

use std::fmt;
use std::str::FromStr;

const DAILY_BUILD_LEN: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionError {
    #[error("invalid version '{0}': expected at most three dot-separated components")]
    TooManyComponents(String),
    #[error("invalid version '{0}': component '{1}' is not a number")]
    NotNumeric(String, String),
    #[error("invalid version '{0}': unknown suffix '{1}'")]
    UnknownSuffix(String, String),
    #[error("invalid daily build '{0}'")]
    InvalidDailyBuild(String),
}

/// Stage within a release line, declared in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Innovation { number: u32, patch: u32 },
    Beta { number: u32, patch: u32 },
    Final,
    Patch(u32),
}

/// A parsed release version, ordered component-wise.
///
/// # Examples
///
/// ```
/// use agentlink_common::version::Version;
///
/// let innovation: Version = "1.2.5i4".parse().unwrap();
/// let release: Version = "1.2.5".parse().unwrap();
/// let patch: Version = "1.2.5p1".parse().unwrap();
/// assert!(innovation < release);
/// assert!(release < patch);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub sub: u32,
    pub stage: Stage,
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() > 3 {
            return Err(VersionError::TooManyComponents(s.to_string()));
        }

        let numeric = |part: &str| -> Result<u32, VersionError> {
            part.parse::<u32>()
                .map_err(|_| VersionError::NotNumeric(s.to_string(), part.to_string()))
        };

        let major: u32 = numeric(parts[0])?;
        let minor: u32 = match parts.get(1).copied() {
            Some(part) => numeric(part)?,
            None => 0,
        };
        let (sub, rest): (u32, &str) = match parts.get(2).copied() {
            Some(part) => leading_number(s, part)?,
            None => (0, ""),
        };

        if rest.is_empty() {
            return Ok(Version {
                major,
                minor,
                sub,
                stage: Stage::Final,
            });
        }

        let stage: Stage = match rest.split_at_checked(1) {
            Some(("p", tail)) => Stage::Patch(leading_number(s, tail)?.0),
            Some((kind @ ("i" | "b"), tail)) => {
                let (number, tail) = leading_number(s, tail)?;
                let patch: u32 = match tail.strip_prefix('p') {
                    Some(p) => leading_number(s, p)?.0,
                    None => 0,
                };
                if kind == "i" {
                    Stage::Innovation { number, patch }
                } else {
                    Stage::Beta { number, patch }
                }
            }
            _ => return Err(VersionError::UnknownSuffix(s.to_string(), rest.to_string())),
        };

        Ok(Version {
            major,
            minor,
            sub,
            stage,
        })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.sub)?;
        match self.stage {
            Stage::Final => Ok(()),
            Stage::Patch(p) => write!(f, "p{p}"),
            Stage::Innovation { number, patch } => {
                write!(f, "i{number}")?;
                if patch > 0 { write!(f, "p{patch}") } else { Ok(()) }
            }
            Stage::Beta { number, patch } => {
                write!(f, "b{number}")?;
                if patch > 0 { write!(f, "p{patch}") } else { Ok(()) }
            }
        }
    }
}

/// Splits off the leading decimal digits of `s`; no digits reads as zero.
///
/// A digit run that does not fit a `u32` is an error against `version`.
fn leading_number<'a>(version: &str, s: &'a str) -> Result<(u32, &'a str), VersionError> {
    let end: usize = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let (digits, rest) = s.split_at(end);
    if digits.is_empty() {
        return Ok((0, rest));
    }
    let number: u32 = digits
        .parse()
        .map_err(|_| VersionError::NotNumeric(version.to_string(), digits.to_string()))?;
    Ok((number, rest))
}

/// Whether `version` names a daily build rather than a tagged release.
pub fn is_daily_build(version: &str) -> bool {
    version.len() == DAILY_BUILD_LEN || version.contains('-')
}

/// Branch a daily build was cut from; bare dates are master builds.
pub fn branch_of_daily_build(version: &str) -> &str {
    if version.len() == DAILY_BUILD_LEN {
        return "master";
    }
    version.split('-').next().unwrap_or(version)
}

/// Build date of a daily build as a sortable integer (`2014.06.01` → `20140601`).
///
/// Master builds use the whole string, branch builds the part after the branch.
pub fn daily_build_number(version: &str) -> Result<u64, VersionError> {
    let date: &str = if branch_of_daily_build(version) == "master" {
        version
    } else {
        version
            .split('-')
            .nth(1)
            .ok_or_else(|| VersionError::InvalidDailyBuild(version.to_string()))?
    };
    strip_dots_to_number(date).ok_or_else(|| VersionError::InvalidDailyBuild(version.to_string()))
}

/// A configured daily-build bound as a sortable integer.
pub fn daily_build_bound(bound: &str) -> Result<u64, VersionError> {
    strip_dots_to_number(bound).ok_or_else(|| VersionError::InvalidDailyBuild(bound.to_string()))
}

fn strip_dots_to_number(s: &str) -> Option<u64> {
    s.replace('.', "").parse().ok()
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
