//! One-line monitoring verdict for a host's acquisition.

use std::fmt;

use agentlink_common::config::{Config, ExitCodeSpec};
use agentlink_common::error::Result;
use agentlink_common::state::ServiceState;
use tracing::debug;

use crate::data_source::Acquisition;
use crate::version_check;

#[derive(Debug, Clone, PartialEq)]
pub struct PerfValue {
    pub name: &'static str,
    pub value: f64,
}

impl fmt::Display for PerfValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={:.3}", self.name, self.value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub state: ServiceState,
    pub output: String,
    pub perfdata: Vec<PerfValue>,
}

impl fmt::Display for Summary {
    /// `STATE - output | name=value ...`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.state, self.output)?;
        if !self.perfdata.is_empty() {
            write!(f, " |")?;
            for perf in &self.perfdata {
                write!(f, " {perf}")?;
            }
        }
        Ok(())
    }
}

/// Outcome of the acquisition alone, before any version expectations.
pub fn base_summary(result: &Result<Acquisition>, exit_codes: &ExitCodeSpec) -> Summary {
    match result {
        Ok(acquisition) => Summary {
            state: ServiceState::Ok,
            output: format!(
                "Version: {}, OS: {}",
                acquisition.info.version.as_deref().unwrap_or("unknown"),
                acquisition.info.agent_os.as_deref().unwrap_or("unknown"),
            ),
            perfdata: vec![PerfValue {
                name: "execution_time",
                value: acquisition.elapsed.as_secs_f64(),
            }],
        },
        Err(e) => Summary {
            state: exit_codes.get(e.category()),
            output: e.to_string(),
            perfdata: Vec::new(),
        },
    }
}

/// Full verdict for `hostname`: the base summary plus the agent version layer.
///
/// A version that misses the host's expectation, or is older than the global
/// minimum, downgrades the state to the `wrong_version` exit code. An
/// expectation that cannot be evaluated turns into an `exception` verdict.
pub fn summarize(config: &Config, hostname: &str, result: &Result<Acquisition>) -> Summary {
    let exit_codes: ExitCodeSpec = config.exit_code_spec(hostname);
    let mut summary: Summary = base_summary(result, &exit_codes);

    let Ok(acquisition) = result else {
        return summary;
    };
    let Some(agent_version) = acquisition.info.version.as_deref() else {
        return summary;
    };

    if let Some(expected) = config.agent_target_version(hostname) {
        match version_check::is_expected_agent_version(Some(agent_version), expected) {
            Ok(true) => {}
            Ok(false) => {
                debug!(host = hostname, agent_version, expected = %expected, "Unexpected agent version");
                summary.output.push_str(&format!(
                    ", unexpected agent version {agent_version} (should be {expected})"
                ));
                summary.state = exit_codes.get("wrong_version");
                return summary;
            }
            Err(e) => {
                return Summary {
                    state: exit_codes.get(e.category()),
                    output: e.to_string(),
                    perfdata: summary.perfdata,
                };
            }
        }
    }

    if let Some(minimum) = config.agent_min_version.as_deref() {
        if version_check::is_below_minimum(agent_version, minimum) {
            summary.output.push_str(&format!(
                ", old plugin version {agent_version} (should be at least {minimum})"
            ));
            summary.state = exit_codes.get("wrong_version");
        }
    }

    summary
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
