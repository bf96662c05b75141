use ratatui::Frame;
use ratatui::layout::Alignment;
use ratatui::style::Style;
use ratatui::widgets::{Block, Borders};

use crate::tui::app::{Mode, Tab};
use crate::tui::widgets::{
    calendar::{render_calendar, render_day_agenda},
    chore_list::{render_chore_details, render_chore_list},
    color::parse_color,
    confirm_delete::render_confirm_delete,
    form::{render_chore_form, render_reschedule_prompt},
    help::render_help,
    status_bar::render_status_bar,
    tabs::render_tabs,
};
use crate::tui::{App, Layout};
use crate::utils::format_key_binding_for_display as display;

pub fn render(f: &mut Frame, app: &mut App, layout: &Layout) {
    let active_theme = app.config.get_active_theme();
    let fg_color = parse_color(&active_theme.fg);
    let bg_color = parse_color(&active_theme.bg);
    let outer_block = Block::default()
        .borders(Borders::ALL)
        .title("Chorely")
        .title_alignment(Alignment::Center)
        .style(Style::default().fg(fg_color).bg(bg_color));
    f.render_widget(outer_block, f.area());

    let scheduler = app.scheduler();
    let overdue_count = scheduler.filter_overdue(&app.chores).len();
    render_tabs(f, layout.tabs_area, app.ui.current_tab, overdue_count, &app.config);

    match app.ui.current_tab {
        Tab::Chores => {
            render_chore_list(
                f,
                layout.main_area,
                &app.chores,
                app.ui.selected_index,
                &mut app.ui.list_state,
                scheduler,
                &app.config,
            );
            render_chore_details(f, layout.detail_area, app.selected_chore(), scheduler, &app.config);
        }
        Tab::Calendar => {
            render_calendar(f, layout.main_area, app.ui.calendar_day, &app.chores, scheduler, &app.config);
            let on_day = app.chores_on_calendar_day();
            render_day_agenda(f, layout.detail_area, app.ui.calendar_day, &on_day, scheduler, &app.config);
        }
    }

    // overlays go after the normal content
    match app.ui.mode {
        Mode::Help => render_help(f, f.area(), &app.config),
        Mode::Create | Mode::Edit => {
            if let Some(form) = &app.form {
                render_chore_form(f, f.area(), form, &app.config);
            }
        }
        Mode::Reschedule => {
            if let Some(prompt) = &app.reschedule {
                render_reschedule_prompt(f, f.area(), prompt, &app.config);
            }
        }
        Mode::ConfirmDelete => {
            if let Some(chore) = &app.modals.delete_confirmation {
                render_confirm_delete(f, f.area(), chore, app.modals.delete_modal_selection, &app.config);
            }
        }
        Mode::View => {}
    }

    let key_hints = get_key_hints(app);
    render_status_bar(f, layout.status_area, app.status.message.as_ref(), &key_hints, &app.config);
}

pub fn get_key_hints(app: &App) -> Vec<String> {
    let keys = &app.config.key_bindings;
    match app.ui.mode {
        Mode::Help => vec![format!("Esc or {}: Exit help", display(&keys.help))],
        Mode::Create | Mode::Edit => vec![
            "Enter: Save".to_string(),
            "Esc: Cancel".to_string(),
            "Tab: Next field".to_string(),
            "←→: Adjust".to_string(),
        ],
        Mode::Reschedule => vec![
            "Enter: Save".to_string(),
            "Esc: Cancel".to_string(),
            "←→: One day".to_string(),
        ],
        Mode::ConfirmDelete => vec!["y: Delete".to_string(), "n/Esc: Cancel".to_string()],
        Mode::View => match app.ui.current_tab {
            Tab::Chores => vec![
                format!("{}: Done", display(&keys.complete)),
                format!("{}/{}: ±1 day", display(&keys.postpone), display(&keys.bring_forward)),
                format!("{}: Reschedule", display(&keys.reschedule)),
                format!("{}: New", display(&keys.new)),
                format!("{}: Edit", display(&keys.edit)),
                format!("{}: Delete", display(&keys.delete)),
                "Tab: Calendar".to_string(),
                format!("{}: Help", display(&keys.help)),
                format!("{}: Quit", display(&keys.quit)),
            ],
            Tab::Calendar => vec![
                "Arrows: Move".to_string(),
                "PgUp/PgDn: Month".to_string(),
                "Enter: Open".to_string(),
                format!("{}: New", display(&keys.new)),
                "Tab: Chores".to_string(),
                format!("{}: Help", display(&keys.help)),
                format!("{}: Quit", display(&keys.quit)),
            ],
        },
    }
}
