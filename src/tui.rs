use ratatui::style::{Color, Modifier, Style};
use ratatui::DefaultTerminal;

use crate::error::Result;

pub const HEADER_STYLE: Style = Style::new()
    .fg(Color::Yellow)
    .add_modifier(Modifier::BOLD);

pub const FOOTER_STYLE: Style = Style::new().fg(Color::DarkGray);

pub const AMOUNT_STYLE: Style = Style::new().fg(Color::Rgb(80, 220, 100));

pub const SELECTED_STYLE: Style = Style::new()
    .bg(Color::Rgb(40, 40, 60))
    .add_modifier(Modifier::BOLD);

pub const CHECKED_STYLE: Style = Style::new().fg(Color::Cyan);

/// Badge color for a member status or transaction type.
pub fn badge_style(value: &str) -> Style {
    match value.to_ascii_lowercase().as_str() {
        "active" | "deposit" => Style::new().fg(Color::Green),
        "deactivated" | "withdrawal" => Style::new().fg(Color::Red),
        "pending" | "loan repayment" => Style::new().fg(Color::Yellow),
        "new" | "membership id" => Style::new().fg(Color::Blue),
        _ => Style::new(),
    }
}

/// Truncate to `width` display characters, marking the cut with an ellipsis.
pub fn truncate(text: &str, width: usize) -> String {
    if width == 0 || text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(1)).collect();
    format!("{kept}\u{2026}")
}

/// Run `body` on the alternate screen, restoring the terminal afterwards even
/// if it panics.
pub fn with_terminal<T>(body: impl FnOnce(&mut DefaultTerminal) -> Result<T>) -> Result<T> {
    let hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        ratatui::restore();
        hook(info);
    }));

    let mut terminal = ratatui::init();
    let result = body(&mut terminal);
    drop(terminal);
    ratatui::restore();
    result
}
