//! Terminal output: ANSI styling, progress lines and the sources table.

use sportsgpt_core::{ProgressEvent, ProgressStatus, Source};

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const DIM: &str = "\x1b[2m";

pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const CYAN: &str = "\x1b[36m";

const BAR_WIDTH: usize = 20;

/// Check if the terminal supports color output.
pub fn supports_color() -> bool {
    std::env::var("NO_COLOR").is_err()
        && (std::env::var("COLORTERM").is_ok()
            || std::env::var("TERM")
                .map(|t| t != "dumb")
                .unwrap_or(false))
}

fn paint(color: &str, text: &str, enabled: bool) -> String {
    if enabled {
        format!("{color}{text}{RESET}")
    } else {
        text.to_string()
    }
}

/// Print a formatted INFO note to stdout.
pub fn note_info(msg: &str) {
    if supports_color() {
        println!("{CYAN}{BOLD}ℹ{RESET} {msg}");
    } else {
        println!("INFO: {msg}");
    }
}

/// Print a formatted ERROR note.
pub fn note_error(msg: &str) {
    if supports_color() {
        eprintln!("{RED}{BOLD}✗{RESET} {msg}");
    } else {
        eprintln!("ERROR: {msg}");
    }
}

/// Print a formatted SUCCESS note.
pub fn note_success(msg: &str) {
    if supports_color() {
        println!("{GREEN}{BOLD}✓{RESET} {msg}");
    } else {
        println!("OK: {msg}");
    }
}

/// `[#####---------------]` for a 0-100 percentage.
pub fn progress_bar(pct: u8) -> String {
    let filled = (pct.min(100) as usize * BAR_WIDTH) / 100;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

/// One line per progress event: `  3 [##########----------]  50% retrieving    Trying openai`.
pub fn format_event(event: &ProgressEvent, color: bool) -> String {
    let status_color = match event.status {
        ProgressStatus::Completed => GREEN,
        ProgressStatus::Error => RED,
        ProgressStatus::Retrieving => YELLOW,
        _ => CYAN,
    };
    format!(
        "{:>3} {} {:>3}% {} {}",
        event.sequence,
        progress_bar(event.completed_pct),
        event.completed_pct,
        paint(status_color, &format!("{:<12}", event.status.as_str()), color),
        event.message
    )
}

/// Numbered list of cited sources.
pub fn render_sources(sources: &[Source], color: bool) -> String {
    let mut out = String::new();
    for (i, source) in sources.iter().enumerate() {
        out.push_str(&format!(
            "  {:>2}. {}\n      {}\n",
            i + 1,
            source.title,
            paint(DIM, &source.url, color)
        ));
    }
    out
}
