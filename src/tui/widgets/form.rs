use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::Config;
use crate::tui::app::{ChoreForm, FormField, ReschedulePrompt};
use crate::tui::widgets::color::parse_color;
use crate::tui::widgets::popup_area;

/// Add/edit popup: name, interval and due date, then any validation errors
pub fn render_chore_form(f: &mut Frame, area: Rect, form: &ChoreForm, config: &Config) {
    let active_theme = config.get_active_theme();
    let fg_color = parse_color(&active_theme.fg);
    let bg_color = parse_color(&active_theme.bg);
    let highlight_bg = parse_color(&active_theme.highlight_bg);
    let error_color = parse_color(&active_theme.overdue);
    let normal = Style::default().fg(fg_color).bg(bg_color);

    let popup_area = popup_area(area, 60, 70);
    f.render_widget(Clear, popup_area);

    let title = if form.is_editing() { "Edit Chore" } else { "New Chore" };
    let outer = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .title_alignment(Alignment::Center)
        .style(normal);
    let inner = outer.inner(popup_area);
    f.render_widget(outer, popup_area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Name
            Constraint::Length(3), // Interval
            Constraint::Length(3), // Due date
            Constraint::Min(1),    // Errors
            Constraint::Length(1), // Hints
        ])
        .split(inner);

    let interval_title = match form.preset_label() {
        Some(label) => format!("Every N days ({})", label),
        None => "Every N days".to_string(),
    };
    let fields = [
        (FormField::Name, "Name".to_string(), &form.name),
        (FormField::Interval, interval_title, &form.interval),
        (FormField::DueDate, "Due date (YYYY-MM-DD)".to_string(), &form.due_date),
    ];

    for (chunk, (field, title, value)) in chunks.iter().zip(fields.iter()) {
        let is_current = form.current_field == *field;
        let border_style = if is_current {
            Style::default().fg(highlight_bg).bg(bg_color).add_modifier(Modifier::BOLD)
        } else {
            normal
        };
        let paragraph = Paragraph::new(value.as_str()).style(normal).block(
            Block::default()
                .borders(Borders::ALL)
                .title(title.as_str())
                .border_style(border_style)
                .style(normal),
        );
        f.render_widget(paragraph, *chunk);

        if is_current {
            let cursor_x = chunk.x + 1 + value.chars().count() as u16;
            f.set_cursor_position((cursor_x.min(chunk.right().saturating_sub(2)), chunk.y + 1));
        }
    }

    let error_lines: Vec<Line> = form
        .errors
        .iter()
        .map(|e| Line::from(Span::styled(e.clone(), Style::default().fg(error_color).bg(bg_color))))
        .collect();
    f.render_widget(Paragraph::new(error_lines).style(normal).wrap(Wrap { trim: true }), chunks[3]);

    f.render_widget(
        Paragraph::new("Enter: Save • Esc: Cancel • Tab: Next field")
            .style(normal)
            .alignment(Alignment::Center),
        chunks[4],
    );
}

pub fn render_reschedule_prompt(f: &mut Frame, area: Rect, prompt: &ReschedulePrompt, config: &Config) {
    let active_theme = config.get_active_theme();
    let fg_color = parse_color(&active_theme.fg);
    let bg_color = parse_color(&active_theme.bg);
    let error_color = parse_color(&active_theme.overdue);
    let normal = Style::default().fg(fg_color).bg(bg_color);

    let popup_area = popup_area(area, 50, 30);
    f.render_widget(Clear, popup_area);

    let mut lines = vec![
        Line::from(Span::styled(format!("New due date for '{}'", prompt.chore_name), normal)),
        Line::from(""),
        Line::from(Span::styled(
            prompt.input.clone(),
            normal.add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    match &prompt.error {
        Some(error) => lines.push(Line::from(Span::styled(
            error.clone(),
            Style::default().fg(error_color).bg(bg_color),
        ))),
        None => lines.push(Line::from(Span::styled("←→ one day • Enter: Save • Esc: Cancel", normal))),
    }

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Reschedule")
                .title_alignment(Alignment::Center)
                .style(normal),
        )
        .style(normal)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });

    f.render_widget(paragraph, popup_area);
}
