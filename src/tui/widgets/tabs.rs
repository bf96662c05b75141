use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Tabs;

use crate::Config;
use crate::tui::app::Tab;
use crate::tui::widgets::color::{get_contrast_text_color, parse_color};

const TAB_TITLES: [&str; 2] = ["Chores", "Calendar"];

pub fn render_tabs(f: &mut Frame, area: Rect, current_tab: Tab, overdue_count: usize, config: &Config) {
    let active_theme = config.get_active_theme();
    let highlight_bg = parse_color(&active_theme.highlight_bg);
    let fg_color = parse_color(&active_theme.fg);
    let bg_color = parse_color(&active_theme.bg);
    let tab_bg = parse_color(&active_theme.tab_bg);
    let tab_fg = get_contrast_text_color(tab_bg);
    let overdue_color = parse_color(&active_theme.overdue);

    // padded spans on tab_bg make each title look like a box
    let titles: Vec<Line> = TAB_TITLES
        .iter()
        .enumerate()
        .map(|(i, title)| {
            let mut spans = vec![
                Span::styled("  ", Style::default().bg(tab_bg)),
                Span::styled(*title, Style::default().fg(tab_fg).bg(tab_bg)),
            ];
            if i == Tab::Chores.index() && overdue_count > 0 {
                spans.push(Span::styled(
                    format!(" ({})", overdue_count),
                    Style::default().fg(overdue_color).bg(tab_bg),
                ));
            }
            spans.push(Span::styled("  ", Style::default().bg(tab_bg)));
            Line::from(spans)
        })
        .collect();

    let highlight_fg = get_contrast_text_color(highlight_bg);

    let tabs = Tabs::new(titles)
        .select(current_tab.index())
        .style(Style::default().fg(fg_color).bg(bg_color))
        .highlight_style(
            Style::default()
                .fg(highlight_fg)
                .bg(highlight_bg)
                .add_modifier(Modifier::BOLD),
        )
        .divider("  ")
        .padding("", "");

    f.render_widget(tabs, area);
}
