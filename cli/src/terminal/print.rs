use colored::*;

use agentlink_core::summary::Summary;

use crate::terminal::colors;

pub const TOTAL_WIDTH: usize = 64;

pub fn header(msg: &str) {
    let formatted: String = format!("⟦ {} ⟧", msg);
    let msg_len: usize = formatted.chars().count();

    let dash_count: usize = TOTAL_WIDTH.saturating_sub(msg_len);
    let left: usize = dash_count / 2;
    let right: usize = dash_count - left;

    let line: ColoredString = format!(
        "{}{}{}",
        "─".repeat(left),
        formatted.to_uppercase().color(colors::PRIMARY),
        "─".repeat(right)
    )
    .color(colors::SEPARATOR);

    eprintln!("{}", line);
}

pub fn separator() {
    eprintln!("{}", "═".repeat(TOTAL_WIDTH).color(colors::SEPARATOR));
}

pub fn status_line(msg: &str) {
    let prefix: ColoredString = ">".color(colors::SEPARATOR);
    eprintln!("{} {}", prefix, msg.color(colors::TEXT_DEFAULT));
}

/// `host: STATE - output | perfdata`, on stdout so it can be piped.
pub fn summary_line(hostname: &str, summary: &Summary) {
    let state: ColoredString = summary.state.to_string().color(colors::of_state(summary.state)).bold();
    let mut line: String = format!("{}: {} - {}", hostname.color(colors::ACCENT), state, summary.output);
    if !summary.perfdata.is_empty() {
        let perf: Vec<String> = summary.perfdata.iter().map(ToString::to_string).collect();
        line.push_str(&format!(" {} {}", "|".color(colors::SEPARATOR), perf.join(" ")));
    }
    println!("{}", line);
}
