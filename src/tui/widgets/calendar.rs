use chrono::{Datelike, NaiveDate};
use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use crate::Config;
use crate::models::ChoreRecord;
use crate::scheduler::{Scheduler, month_grid};
use crate::tui::widgets::color::{get_contrast_text_color, parse_color};

const WEEKDAY_HEADER: &str = " Su  Mo  Tu  We  Th  Fr  Sa";

/// The month containing `day`, split into Sunday-first weeks. The last
/// week is padded with `None`.
pub fn month_weeks(day: NaiveDate) -> Vec<[Option<NaiveDate>; 7]> {
    let cells = month_grid(day.year(), day.month());
    cells
        .chunks(7)
        .map(|chunk| {
            let mut week = [None; 7];
            week[..chunk.len()].copy_from_slice(chunk);
            week
        })
        .collect()
}

pub fn render_calendar(
    f: &mut Frame,
    area: Rect,
    selected_day: NaiveDate,
    chores: &[ChoreRecord],
    scheduler: &Scheduler,
    config: &Config,
) {
    let active_theme = config.get_active_theme();
    let fg_color = parse_color(&active_theme.fg);
    let bg_color = parse_color(&active_theme.bg);
    let highlight_bg = parse_color(&active_theme.highlight_bg);
    let highlight_fg = get_contrast_text_color(highlight_bg);
    let overdue_color = parse_color(&active_theme.overdue);
    let due_today_color = parse_color(&active_theme.due_today);
    let upcoming_color = parse_color(&active_theme.tab_bg);
    let today = scheduler.today();

    let day_color = |day: NaiveDate| -> Option<Color> {
        if scheduler.chores_on(day, chores).is_empty() {
            return None;
        }
        Some(if day < today {
            overdue_color
        } else if day == today {
            due_today_color
        } else {
            upcoming_color
        })
    };

    let mut lines = vec![
        Line::from(Span::styled(WEEKDAY_HEADER, Style::default().add_modifier(Modifier::BOLD))),
    ];

    for week in month_weeks(selected_day) {
        let mut spans = Vec::with_capacity(7);
        for cell in week {
            let Some(day) = cell else {
                spans.push(Span::raw("    "));
                continue;
            };
            let marker = if day_color(day).is_some() { "•" } else { " " };
            let text = format!("{:>3}{}", day.day(), marker);

            let mut style = Style::default().fg(day_color(day).unwrap_or(fg_color)).bg(bg_color);
            if day == today {
                style = style.add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
            }
            if day == selected_day {
                style = style.fg(highlight_fg).bg(highlight_bg);
            }
            spans.push(Span::styled(text, style));
        }
        lines.push(Line::from(spans));
    }

    let title = selected_day.format("%B %Y").to_string();
    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .title_alignment(Alignment::Center),
        )
        .style(Style::default().fg(fg_color).bg(bg_color));

    f.render_widget(paragraph, area);
}

/// Chores due on the selected calendar day
pub fn render_day_agenda(
    f: &mut Frame,
    area: Rect,
    day: NaiveDate,
    chores_on_day: &[&ChoreRecord],
    scheduler: &Scheduler,
    config: &Config,
) {
    if area.width == 0 {
        return;
    }
    let active_theme = config.get_active_theme();
    let fg_color = parse_color(&active_theme.fg);

    let lines: Vec<Line> = if chores_on_day.is_empty() {
        vec![Line::from("Nothing due")]
    } else {
        chores_on_day
            .iter()
            .map(|chore| {
                Line::from(vec![
                    Span::raw(format!("• {}", chore.name)),
                    Span::styled(
                        format!("  every {}d", chore.interval_days),
                        Style::default().add_modifier(Modifier::DIM),
                    ),
                ])
            })
            .collect()
    };

    let title = if day == scheduler.today() {
        "Today".to_string()
    } else {
        day.format("%a %b %-d").to_string()
    };
    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(title))
        .style(Style::default().fg(fg_color))
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_month_weeks_pads_last_week() {
        // March 2026 starts on a Sunday and has 31 days
        let weeks = month_weeks(day(2026, 3, 14));
        assert_eq!(weeks.len(), 5);
        assert_eq!(weeks[0][0], Some(day(2026, 3, 1)));
        assert_eq!(weeks[4][2], Some(day(2026, 3, 31)));
        assert_eq!(weeks[4][3], None);
    }

    #[test]
    fn test_month_weeks_leading_blanks() {
        // April 2026 starts on a Wednesday
        let weeks = month_weeks(day(2026, 4, 1));
        assert!(weeks[0][..3].iter().all(Option::is_none));
        assert_eq!(weeks[0][3], Some(day(2026, 4, 1)));
    }
}
