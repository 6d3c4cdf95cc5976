//! Terminal rendering of a running sunrise.
//!
//! [`TerminalProgress`] is the [`ProgressSink`] used by the CLI: a countdown
//! while waiting, one line per phase, a progress bar redrawn in place for
//! every step and a sun banner once the sunrise completes.

use chrono::{DateTime, Local};
use crossterm::{
    cursor::MoveTo,
    execute,
    style::{Color, Stylize},
    terminal::{self, Clear, ClearType},
};
use std::io::{self, Write};
use std::time::Duration;

use crate::constants::PROGRESS_BAR_WIDTH;
use crate::engine::{ProgressSink, RunOutcome, StepUpdate};
use crate::utils::format_wait;

const ORANGE: Color = Color::Rgb {
    r: 255,
    g: 135,
    b: 0,
};

const SUN: [&str; 5] = [
    "\\   |   /",
    " \\  |  / ",
    "────☀────",
    " /  |  \\ ",
    "/   |   \\",
];

/// Filled/empty cells for a brightness percentage.
pub fn progress_bar(brightness: u8) -> String {
    let filled = (usize::from(brightness.min(100)) * PROGRESS_BAR_WIDTH) / 100;
    format!(
        "{}{}",
        "█".repeat(filled),
        "░".repeat(PROGRESS_BAR_WIDTH - filled)
    )
}

/// Warm colors while dim, yellow once the room is bright.
pub fn bar_color(brightness: u8) -> Color {
    match brightness {
        0..30 => Color::Red,
        30..60 => ORANGE,
        _ => Color::Yellow,
    }
}

pub struct TerminalProgress {
    show_banner: bool,
    line_open: bool,
}

impl TerminalProgress {
    /// Renderer for a sunrise, ends with the completion banner.
    pub fn sunrise() -> Self {
        Self {
            show_banner: true,
            line_open: false,
        }
    }

    /// Renderer for the demo show, no banner.
    pub fn demo() -> Self {
        Self {
            show_banner: false,
            line_open: false,
        }
    }

    fn redraw(&mut self, line: &str) {
        let mut stdout = io::stdout();
        let _ = write!(stdout, "\r\x1b[2K{line}");
        let _ = stdout.flush();
        self.line_open = true;
    }

    fn close_line(&mut self) {
        if self.line_open {
            println!();
            self.line_open = false;
        }
    }
}

impl ProgressSink for TerminalProgress {
    fn on_countdown(&mut self, remaining: Duration, start: DateTime<Local>) {
        self.redraw(&format!(
            "┃   Sunrise begins at {} (in {})",
            start.format("%H:%M"),
            format_wait(remaining)
        ));
    }

    fn on_phase_start(&mut self, _index: usize, _total: usize, description: &str) {
        self.close_line();
        log_indented!("{}", description);
    }

    fn on_step(&mut self, update: &StepUpdate) {
        let bar = progress_bar(update.brightness).with(bar_color(update.brightness));
        self.redraw(&format!(
            "┃   {bar} {:3}% • {}K",
            update.brightness, update.temperature
        ));
    }

    fn on_finish(&mut self, outcome: &RunOutcome) {
        self.close_line();
        match outcome {
            RunOutcome::Completed if self.show_banner => show_sunrise_complete(Local::now()),
            RunOutcome::Failed(err) => log_error!("{}", err),
            other => log_block_start!("{}", finish_message(other)),
        }
    }
}

// Cancellation can land before the bulb was ever switched on, so the
// cancelled line says nothing about the light; the engine logs the turn-off.
fn finish_message(outcome: &RunOutcome) -> String {
    match outcome {
        RunOutcome::Completed => "Done, light off.".to_string(),
        RunOutcome::Cancelled => "Cancelled".to_string(),
        RunOutcome::Failed(err) => err.to_string(),
    }
}

/// Clear the screen and greet the morning.
pub fn show_sunrise_complete(now: DateTime<Local>) {
    let mut stdout = io::stdout();
    let _ = execute!(stdout, Clear(ClearType::All), MoveTo(0, 0));

    let width = terminal::size().map(|(cols, _)| usize::from(cols)).unwrap_or(80);
    let center = |text: &str| {
        let pad = width.saturating_sub(text.chars().count()) / 2;
        " ".repeat(pad)
    };

    println!();
    for row in SUN {
        if let Some((left, right)) = row.split_once('☀') {
            println!(
                "{}{}{}{}",
                center(row),
                left.yellow(),
                "☀".with(ORANGE).bold(),
                right.yellow()
            );
        } else {
            println!("{}{}", center(row), row.yellow());
        }
    }
    println!();

    let title = "Good morning!";
    println!("{}{}", center(title), title.yellow().bold());
    println!();

    let stamp = format!("☀ {} • {}", now.format("%A, %B %d"), now.format("%H:%M"));
    println!("{}{}", center(&stamp), stamp.as_str().dim());
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_bar_fill() {
        assert_eq!(progress_bar(0), "░".repeat(30));
        assert_eq!(progress_bar(100), "█".repeat(30));

        let half = progress_bar(50);
        assert_eq!(half.chars().filter(|c| *c == '█').count(), 15);
        assert_eq!(half.chars().count(), 30);

        // 42% of 30 cells floors to 12
        assert_eq!(progress_bar(42).chars().filter(|c| *c == '█').count(), 12);
    }

    #[test]
    fn test_cancelled_message_makes_no_claim_about_the_light() {
        let message = finish_message(&RunOutcome::Cancelled);
        assert_eq!(message, "Cancelled");
        assert!(!message.contains("light"));
        assert_eq!(finish_message(&RunOutcome::Completed), "Done, light off.");
    }

    #[test]
    fn test_bar_color_thresholds() {
        assert_eq!(bar_color(1), Color::Red);
        assert_eq!(bar_color(29), Color::Red);
        assert_eq!(bar_color(30), ORANGE);
        assert_eq!(bar_color(59), ORANGE);
        assert_eq!(bar_color(60), Color::Yellow);
        assert_eq!(bar_color(100), Color::Yellow);
    }
}
