use agentlink_common::state::ServiceState;
use colored::Color;

pub const PRIMARY: Color = Color::BrightGreen;
pub const ACCENT: Color = Color::BrightCyan;
pub const SEPARATOR: Color = Color::BrightBlack;
pub const TEXT_DEFAULT: Color = Color::White;

pub fn of_state(state: ServiceState) -> Color {
    match state {
        ServiceState::Ok => Color::Green,
        ServiceState::Warn => Color::Yellow,
        ServiceState::Crit => Color::Red,
        ServiceState::Unknown => Color::Magenta,
    }
}
