use std::cmp::Ordering;

use agentlink_common::config::VersionSpec;
use agentlink_common::error::{AgentError, Result};
use agentlink_common::version::{self, Version, VersionError};

/// Version strings agents report when they cannot tell.
const UNKNOWN_VERSIONS: [&str; 3] = ["unknown", "(unknown)", "None"];

/// Whether the reported `agent_version` satisfies `expected`.
///
/// A missing or unknown agent version never does. For [`VersionSpec::AtLeast`]
/// the daily-build bound is used when both it and a daily-build agent are
/// present; otherwise the release bound applies, which no daily build meets.
///
/// # Errors
///
/// [`AgentError::Configuration`] when either side cannot be parsed for the
/// comparison it is needed in.
pub fn is_expected_agent_version(agent_version: Option<&str>, expected: &VersionSpec) -> Result<bool> {
    let agent: &str = match agent_version {
        Some(v) if !UNKNOWN_VERSIONS.contains(&v) => v,
        _ => return Ok(false),
    };

    compare(agent, expected).map_err(|err| {
        AgentError::Configuration(format!(
            "Unable to check agent version (Agent: {agent} Expected: {expected}, Error: {err})"
        ))
    })
}

fn compare(agent: &str, expected: &VersionSpec) -> std::result::Result<bool, VersionError> {
    match expected {
        VersionSpec::Exact(version) => Ok(agent == version),
        VersionSpec::AtLeast {
            daily_build,
            release,
        } => {
            let daily: bool = version::is_daily_build(agent);
            match (daily_build, release) {
                (Some(bound), _) if daily => {
                    Ok(version::daily_build_number(agent)? >= version::daily_build_bound(bound)?)
                }
                (_, Some(_)) if daily => Ok(false),
                (_, Some(bound)) => Ok(agent.parse::<Version>()? >= bound.parse::<Version>()?),
                (_, None) => Ok(true),
            }
        }
    }
}

/// Whether `agent_version` is older than the globally required `minimum`.
///
/// Release versions are compared structurally; anything that does not parse
/// as one (daily builds, vendor strings) is compared as plain text.
pub fn is_below_minimum(agent_version: &str, minimum: &str) -> bool {
    let ordering: Ordering = match (agent_version.parse::<Version>(), minimum.parse::<Version>()) {
        (Ok(agent), Ok(min)) => agent.cmp(&min),
        _ => agent_version.cmp(minimum),
    };
    ordering == Ordering::Less
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
