//! What the agent says about itself in its `<<<check_mk>>>` section.

const INFO_SECTION: &str = "check_mk";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentInfo {
    pub version: Option<String>,
    pub agent_os: Option<String>,
}

/// Extracts the agent's self-description from decoded agent output.
///
/// Only the first non-empty occurrence of each field inside the info section counts.
/// Output that is not valid UTF-8 is read lossily.
pub fn parse(payload: &[u8]) -> AgentInfo {
    let text = String::from_utf8_lossy(payload);
    let mut info: AgentInfo = AgentInfo::default();
    let mut in_info_section: bool = false;

    for line in text.lines() {
        if let Some(header) = section_header(line) {
            in_info_section = header == INFO_SECTION;
            continue;
        }
        if !in_info_section {
            continue;
        }

        if let Some((key, value)) = line.split_once(':') {
            let slot: &mut Option<String> = match key.trim() {
                "Version" => &mut info.version,
                "AgentOS" => &mut info.agent_os,
                _ => continue,
            };
            let value: &str = value.trim();
            if slot.is_none() && !value.is_empty() {
                *slot = Some(value.to_string());
            }
        }
    }

    info
}

/// Name of the section a `<<<name[:options]>>>` line opens.
fn section_header(line: &str) -> Option<&str> {
    let inner: &str = line.trim_end().strip_prefix("<<<")?.strip_suffix(">>>")?;
    Some(inner.split(':').next().unwrap_or(inner))
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
