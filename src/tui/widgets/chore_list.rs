use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, Borders, List, ListItem, ListState, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState,
    StatefulWidget, Wrap,
};

use crate::Config;
use crate::models::ChoreRecord;
use crate::scheduler::{DueStatus, Scheduler};
use crate::tui::widgets::color::{get_contrast_text_color, parse_color};

/// One line of the chore list: a bucket heading or a chore
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ListRow<'a> {
    Header { title: &'static str, count: usize },
    Chore { index: usize, chore: &'a ChoreRecord },
}

/// Rows for chores already in display order, with a heading before each
/// non-empty bucket
pub fn build_rows<'a>(chores: &'a [ChoreRecord], scheduler: &Scheduler) -> Vec<ListRow<'a>> {
    let buckets = scheduler.bucketize(chores);
    let mut rows = Vec::with_capacity(chores.len() + 3);
    let mut current: Option<&'static str> = None;

    for (index, chore) in chores.iter().enumerate() {
        let (title, count) = match scheduler.status(chore) {
            DueStatus::Overdue(_) => ("Overdue", buckets.overdue.len()),
            DueStatus::Today => ("Today", buckets.today.len()),
            DueStatus::Upcoming(_) => ("Upcoming", buckets.upcoming.len()),
        };
        if current != Some(title) {
            rows.push(ListRow::Header { title, count });
            current = Some(title);
        }
        rows.push(ListRow::Chore { index, chore });
    }
    rows
}

/// Row position of the chore at `chore_index`
pub fn row_for_chore(rows: &[ListRow], chore_index: usize) -> Option<usize> {
    rows.iter()
        .position(|row| matches!(row, ListRow::Chore { index, .. } if *index == chore_index))
}

fn truncate(text: String, max_width: usize) -> String {
    if text.chars().count() > max_width {
        text.chars().take(max_width.saturating_sub(3)).collect::<String>() + "..."
    } else {
        text
    }
}

pub fn render_chore_list(
    f: &mut Frame,
    area: Rect,
    chores: &[ChoreRecord],
    selected_index: usize,
    list_state: &mut ListState,
    scheduler: &Scheduler,
    config: &Config,
) {
    let max_width = area.width.saturating_sub(4) as usize;

    let active_theme = config.get_active_theme();
    let fg_color = parse_color(&active_theme.fg);
    let tab_bg = parse_color(&active_theme.tab_bg);
    let overdue_color = parse_color(&active_theme.overdue);
    let due_today_color = parse_color(&active_theme.due_today);
    let highlight_bg = parse_color(&active_theme.highlight_bg);
    let highlight_fg = if active_theme.highlight_fg.is_empty() {
        get_contrast_text_color(highlight_bg)
    } else {
        parse_color(&active_theme.highlight_fg)
    };

    if chores.is_empty() {
        let empty = Paragraph::new(format!(
            "No chores yet. Press {} to add one.",
            config.key_bindings.new
        ))
        .block(Block::default().borders(Borders::ALL).title("Chores"))
        .style(Style::default().fg(fg_color))
        .wrap(Wrap { trim: true });
        f.render_widget(empty, area);
        list_state.select(None);
        return;
    }

    let rows = build_rows(chores, scheduler);
    let items: Vec<ListItem> = rows
        .iter()
        .map(|row| match row {
            ListRow::Header { title, count } => ListItem::new(format!("{} ({})", title, count))
                .style(Style::default().fg(tab_bg).add_modifier(Modifier::BOLD)),
            ListRow::Chore { chore, .. } => {
                let status = scheduler.status(chore);
                let status_color = match status {
                    DueStatus::Overdue(_) => overdue_color,
                    DueStatus::Today => due_today_color,
                    DueStatus::Upcoming(_) => fg_color,
                };
                let name = truncate(format!("  {}", chore.name), max_width.saturating_sub(16));
                ListItem::new(Line::from(vec![
                    Span::raw(name),
                    Span::styled(format!("  {}", status), Style::default().fg(status_color)),
                ]))
            }
        })
        .collect();

    list_state.select(row_for_chore(&rows, selected_index));

    let list_areas = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(area);
    let list_area = list_areas[0];
    let scrollbar_area = list_areas[1];

    let buckets = scheduler.bucketize(chores);
    let title = if buckets.overdue.is_empty() {
        format!("Chores ({})", chores.len())
    } else {
        format!("Chores ({}, {} overdue)", chores.len(), buckets.overdue.len())
    };
    let total_rows = items.len();
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .style(Style::default().fg(fg_color))
        .highlight_style(Style::default().fg(highlight_fg).bg(highlight_bg));

    StatefulWidget::render(list, list_area, f.buffer_mut(), list_state);

    let visible_rows = list_area.height.saturating_sub(2) as usize;
    if total_rows > visible_rows && visible_rows > 0 && scrollbar_area.width > 0 {
        let scrollbar_inner_area = Rect::new(
            scrollbar_area.x,
            list_area.y + 1,
            scrollbar_area.width,
            list_area.height.saturating_sub(2),
        );
        let mut scrollbar_state = ScrollbarState::new(total_rows)
            .viewport_content_length(visible_rows)
            .position(list_state.offset());
        let scrollbar = Scrollbar::default()
            .orientation(ScrollbarOrientation::VerticalRight)
            .begin_symbol(Some("↑"))
            .end_symbol(Some("↓"))
            .track_symbol(Some("│"))
            .thumb_symbol("█");
        f.render_stateful_widget(scrollbar, scrollbar_inner_area, &mut scrollbar_state);
    }
}

/// Detail pane for the selected chore
pub fn render_chore_details(
    f: &mut Frame,
    area: Rect,
    chore: Option<&ChoreRecord>,
    scheduler: &Scheduler,
    config: &Config,
) {
    if area.width == 0 {
        return;
    }
    let active_theme = config.get_active_theme();
    let fg_color = parse_color(&active_theme.fg);
    let label_style = Style::default().fg(parse_color(&active_theme.tab_bg));

    let lines: Vec<Line> = match chore {
        None => vec![Line::from("Nothing selected")],
        Some(chore) => {
            let status = scheduler.status(chore);
            let status_color = match status {
                DueStatus::Overdue(_) => parse_color(&active_theme.overdue),
                DueStatus::Today => parse_color(&active_theme.due_today),
                DueStatus::Upcoming(_) => fg_color,
            };
            let last_done = chore
                .last_completed
                .map(|d| d.format("%a %b %-d, %Y").to_string())
                .unwrap_or_else(|| "never".to_string());
            let reminder = if config.reminders.enabled {
                format!("{:02}:{:02} on the due day", config.reminders.hour, config.reminders.minute)
            } else {
                "off".to_string()
            };

            vec![
                Line::from(Span::styled(chore.name.clone(), Style::default().add_modifier(Modifier::BOLD))),
                Line::from(""),
                Line::from(vec![
                    Span::styled("Status:    ", label_style),
                    Span::styled(status.to_string(), Style::default().fg(status_color)),
                ]),
                Line::from(vec![
                    Span::styled("Due:       ", label_style),
                    Span::raw(chore.next_due.format("%a %b %-d, %Y").to_string()),
                ]),
                Line::from(vec![
                    Span::styled("Every:     ", label_style),
                    Span::raw(format!("{} days", chore.interval_days)),
                ]),
                Line::from(vec![Span::styled("Last done: ", label_style), Span::raw(last_done)]),
                Line::from(vec![Span::styled("Reminder:  ", label_style), Span::raw(reminder)]),
                Line::from(vec![Span::styled("ID:        ", label_style), Span::raw(chore.id.short())]),
            ]
        }
    };

    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Details"))
        .style(Style::default().fg(fg_color))
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn chore(name: &str, due: NaiveDate) -> ChoreRecord {
        let created = day(2026, 1, 1).and_hms_opt(0, 0, 0).unwrap().and_utc();
        ChoreRecord::new(name.to_string(), 7, due, created)
    }

    #[test]
    fn test_rows_have_bucket_headers() {
        let scheduler = Scheduler::new(Arc::new(FixedClock::at_day(day(2026, 2, 15))));
        let mut chores = vec![
            chore("later", day(2026, 2, 20)),
            chore("late", day(2026, 2, 10)),
            chore("later still", day(2026, 3, 1)),
        ];
        scheduler.sort_for_display(&mut chores);

        let rows = build_rows(&chores, &scheduler);
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0], ListRow::Header { title: "Overdue", count: 1 });
        assert!(matches!(rows[1], ListRow::Chore { index: 0, .. }));
        assert_eq!(rows[2], ListRow::Header { title: "Upcoming", count: 2 });
        assert_eq!(row_for_chore(&rows, 2), Some(4));
        assert_eq!(row_for_chore(&rows, 3), None);
    }

    #[test]
    fn test_truncate_long_names() {
        assert_eq!(truncate("short".to_string(), 10), "short");
        assert_eq!(truncate("a very long chore name".to_string(), 10), "a very ...");
    }
}
