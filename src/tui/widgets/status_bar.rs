use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::widgets::Paragraph;

use crate::Config;
use crate::tui::widgets::color::{get_contrast_text_color, parse_color};

const SEPARATOR: &str = " • ";
const ELLIPSIS: &str = "...";

pub fn render_status_bar(
    f: &mut Frame,
    area: Rect,
    message: Option<&String>,
    key_hints: &[String],
    config: &Config,
) {
    let active_theme = config.get_active_theme();
    let fg_color = parse_color(&active_theme.fg);
    let bg_color = parse_color(&active_theme.bg);
    let highlight_bg = parse_color(&active_theme.highlight_bg);
    let max_width = area.width as usize;

    let (content, style) = match message {
        Some(msg) => {
            let msg_fg = get_contrast_text_color(highlight_bg);
            (
                truncate_with_ellipsis(msg, max_width),
                Style::default().fg(msg_fg).bg(highlight_bg).add_modifier(Modifier::BOLD),
            )
        }
        None => (fit_hints(key_hints, max_width), Style::default().fg(fg_color).bg(bg_color)),
    };

    let paragraph = Paragraph::new(content).style(style);
    f.render_widget(paragraph, area);
}

fn truncate_with_ellipsis(text: &str, max_width: usize) -> String {
    if text.chars().count() <= max_width {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max_width.saturating_sub(ELLIPSIS.len())).collect();
    truncated.push_str(ELLIPSIS);
    truncated
}

/// Join as many hints as fit in `max_width`, ending in "..." when some are dropped
pub fn fit_hints(key_hints: &[String], max_width: usize) -> String {
    let separator_len = SEPARATOR.chars().count();
    let mut hints_text = String::new();

    for (i, hint) in key_hints.iter().enumerate() {
        let hint_len = hint.chars().count();
        let current_len = hints_text.chars().count();
        let would_be_len = if i == 0 { hint_len } else { current_len + separator_len + hint_len };

        if would_be_len > max_width {
            if i == 0 {
                return truncate_with_ellipsis(hint, max_width);
            }
            if current_len + ELLIPSIS.len() <= max_width {
                hints_text.push_str(ELLIPSIS);
            } else {
                hints_text = truncate_with_ellipsis(&hints_text, max_width);
            }
            break;
        }

        if i > 0 {
            hints_text.push_str(SEPARATOR);
        }
        hints_text.push_str(hint);
    }
    hints_text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hints(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_fit_hints_all_fit() {
        assert_eq!(fit_hints(&hints(&["q: Quit", "n: New"]), 40), "q: Quit • n: New");
    }

    #[test]
    fn test_fit_hints_drops_overflow() {
        let text = fit_hints(&hints(&["q: Quit", "n: New", "Space: Done"]), 20);
        assert_eq!(text, "q: Quit • n: New...");
    }

    #[test]
    fn test_fit_hints_truncates_first_hint() {
        assert_eq!(fit_hints(&hints(&["Enter: Open selected day"]), 10), "Enter: ...");
    }

    #[test]
    fn test_truncate_message() {
        assert_eq!(truncate_with_ellipsis("Chore updated", 20), "Chore updated");
        assert_eq!(truncate_with_ellipsis("Resyncing reminders", 10), "Resynci...");
    }
}
