use serde::Deserialize;

/// Monitoring state of a summary, ordered from best to worst.
///
/// Configuration accepts either the numeric code (`2`) or the name (`"crit"`).
///
/// # Examples
///
/// ```
/// use agentlink_common::state::ServiceState;
///
/// let state: ServiceState = "warn".parse().unwrap();
/// assert_eq!(state, ServiceState::Warn);
/// assert_eq!(state.code(), 1);
/// assert_eq!(ServiceState::Crit.worst(ServiceState::Unknown), ServiceState::Crit);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(try_from = "StateRepr")]
pub enum ServiceState {
    #[default]
    Ok,
    Warn,
    Crit,
    Unknown,
}

impl ServiceState {
    pub fn code(self) -> u8 {
        match self {
            ServiceState::Ok => 0,
            ServiceState::Warn => 1,
            ServiceState::Crit => 2,
            ServiceState::Unknown => 3,
        }
    }

    /// Severity rank: OK < WARN < UNKNOWN < CRIT.
    fn rank(self) -> u8 {
        match self {
            ServiceState::Ok => 0,
            ServiceState::Warn => 1,
            ServiceState::Unknown => 2,
            ServiceState::Crit => 3,
        }
    }

    pub fn worst(self, other: ServiceState) -> ServiceState {
        if other.rank() > self.rank() { other } else { self }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StateRepr {
    Code(u8),
    Name(String),
}

impl TryFrom<StateRepr> for ServiceState {
    type Error = String;

    fn try_from(repr: StateRepr) -> Result<Self, Self::Error> {
        match repr {
            StateRepr::Code(code) => ServiceState::try_from(code),
            StateRepr::Name(name) => name.parse(),
        }
    }
}

impl TryFrom<u8> for ServiceState {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(ServiceState::Ok),
            1 => Ok(ServiceState::Warn),
            2 => Ok(ServiceState::Crit),
            3 => Ok(ServiceState::Unknown),
            _ => Err(format!("invalid state code {code}, expected 0-3")),
        }
    }
}

impl std::fmt::Display for ServiceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceState::Ok => write!(f, "OK"),
            ServiceState::Warn => write!(f, "WARN"),
            ServiceState::Crit => write!(f, "CRIT"),
            ServiceState::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

impl std::str::FromStr for ServiceState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ok" => Ok(ServiceState::Ok),
            "warn" | "warning" => Ok(ServiceState::Warn),
            "crit" | "critical" => Ok(ServiceState::Crit),
            "unknown" => Ok(ServiceState::Unknown),
            _ => Err(format!("unknown state: {s}")),
        }
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
