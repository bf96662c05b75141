use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::Style;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::Config;
use crate::tui::widgets::color::parse_color;
use crate::tui::widgets::popup_area;
use crate::utils::format_key_binding_for_display as display;

pub fn render_help(f: &mut Frame, area: Rect, config: &Config) {
    let active_theme = config.get_active_theme();
    let fg_color = parse_color(&active_theme.fg);
    let bg_color = parse_color(&active_theme.bg);

    let popup_area = popup_area(area, 60, 80);
    f.render_widget(Clear, popup_area);

    let paragraph = Paragraph::new(build_help_text(config))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Help - Key Bindings")
                .title_alignment(Alignment::Center)
                .style(Style::default().fg(fg_color).bg(bg_color)),
        )
        .style(Style::default().fg(fg_color).bg(bg_color))
        .wrap(Wrap { trim: false });

    f.render_widget(paragraph, popup_area);
}

pub fn build_help_text(config: &Config) -> String {
    let keys = &config.key_bindings;
    let mut text = String::new();

    text.push_str("Chores:\n");
    text.push_str(&format!(
        "  {} / {}: Move selection\n",
        display(&keys.list_up),
        display(&keys.list_down)
    ));
    text.push_str(&format!("  {}: Mark done today\n", display(&keys.complete)));
    text.push_str(&format!("  {}: Postpone one day\n", display(&keys.postpone)));
    text.push_str(&format!("  {}: Bring forward one day\n", display(&keys.bring_forward)));
    text.push_str(&format!("  {}: Reschedule to a date\n", display(&keys.reschedule)));
    text.push_str(&format!("  {} / Enter: Edit\n", display(&keys.edit)));
    text.push_str(&format!("  {}: Delete\n", display(&keys.delete)));
    text.push_str(&format!("  {}: New chore\n", display(&keys.new)));
    text.push('\n');

    text.push_str("Calendar:\n");
    text.push_str("  Arrows: Move by day / week\n");
    text.push_str("  PageUp / PageDown: Previous / next month\n");
    text.push_str("  Home: Today\n");
    text.push_str("  Enter: Show the day's first chore in the list\n");
    text.push_str(&format!("  {}: New chore due on the selected day\n", display(&keys.new)));
    text.push('\n');

    text.push_str("Forms:\n");
    text.push_str("  Tab / ↑↓: Next / previous field\n");
    text.push_str("  ←→ on Interval: Cycle presets\n");
    text.push_str("  ←→ on Due date: One day earlier / later\n");
    text.push_str("  Enter: Save, Esc: Cancel\n");
    text.push('\n');

    text.push_str("General:\n");
    text.push_str(&format!(
        "  Tab / {} / {}: Switch tabs\n",
        display(&keys.tab_left),
        display(&keys.tab_right)
    ));
    text.push_str(&format!("  {}: Resync reminders\n", display(&keys.resync)));
    text.push_str(&format!("  {}: Help\n", display(&keys.help)));
    text.push_str(&format!("  {}: Quit\n", display(&keys.quit)));
    text
}
