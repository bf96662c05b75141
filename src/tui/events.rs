use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode, size as terminal_size,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use std::io;
use tracing::debug;

use crate::config::KeyBindings;
use crate::tui::App;
use crate::tui::app::{FormField, Mode, Tab};
use crate::tui::error::TuiError;
use crate::tui::layout::Layout;
use crate::utils::{ParsedKeyBinding, has_primary_modifier, parse_key_binding};

/// Restores the terminal when dropped, including on panic
struct TerminalGuard {
    raw_mode_enabled: bool,
    alternate_screen_enabled: bool,
}

impl TerminalGuard {
    fn new() -> Result<Self, TuiError> {
        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen)?;

        Ok(Self {
            raw_mode_enabled: true,
            alternate_screen_enabled: true,
        })
    }

    /// Restore explicitly on normal exit; the drop becomes a no-op
    fn restore(&mut self) -> Result<(), TuiError> {
        if self.raw_mode_enabled {
            disable_raw_mode()?;
            self.raw_mode_enabled = false;
        }
        if self.alternate_screen_enabled {
            execute!(io::stdout(), LeaveAlternateScreen)?;
            self.alternate_screen_enabled = false;
        }
        Ok(())
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        // errors are ignored here, we're already cleaning up
        if self.raw_mode_enabled {
            let _ = disable_raw_mode();
        }
        if self.alternate_screen_enabled {
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
        }
    }
}

pub fn run_event_loop(mut app: App) -> Result<(), TuiError> {
    // checked before entering the alternate screen so the error is readable
    let (width, height) = terminal_size()?;
    let min_width_with_border = Layout::MIN_WIDTH + 2;
    let min_height_with_border = Layout::MIN_HEIGHT + 2;

    if width < min_width_with_border || height < min_height_with_border {
        return Err(TuiError::RenderError(format!(
            "Terminal size too small. Current: {}x{}, Minimum required: {}x{}. Please resize your terminal window.",
            width, height, min_width_with_border, min_height_with_border
        )));
    }

    let mut guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;

    loop {
        app.check_status_message_timeout();

        let terminal_size = terminal.size()?;
        let terminal_rect = Rect::new(0, 0, terminal_size.width, terminal_size.height);
        terminal.draw(|f| {
            let layout = Layout::calculate(terminal_rect);
            crate::tui::render::render(f, &mut app, &layout);
        })?;

        if event::poll(std::time::Duration::from_millis(16))? {
            // Press only: Windows also reports Release
            if let Event::Key(key_event) = event::read()? {
                if key_event.kind == KeyEventKind::Press && handle_key_event(&mut app, key_event)? {
                    break;
                }
            }
        }
    }

    guard.restore()?;

    Ok(())
}

/// Bindings from the config, parsed once per key press
struct Bindings {
    quit: ParsedKeyBinding,
    new: ParsedKeyBinding,
    edit: ParsedKeyBinding,
    delete: ParsedKeyBinding,
    complete: ParsedKeyBinding,
    postpone: ParsedKeyBinding,
    bring_forward: ParsedKeyBinding,
    reschedule: ParsedKeyBinding,
    list_up: ParsedKeyBinding,
    list_down: ParsedKeyBinding,
    tab_left: ParsedKeyBinding,
    tab_right: ParsedKeyBinding,
    help: ParsedKeyBinding,
    resync: ParsedKeyBinding,
}

impl Bindings {
    fn from_config(keys: &KeyBindings) -> Result<Self, TuiError> {
        let parse = |raw: &str| parse_key_binding(raw).map_err(TuiError::KeyBindingError);
        Ok(Self {
            quit: parse(&keys.quit)?,
            new: parse(&keys.new)?,
            edit: parse(&keys.edit)?,
            delete: parse(&keys.delete)?,
            complete: parse(&keys.complete)?,
            postpone: parse(&keys.postpone)?,
            bring_forward: parse(&keys.bring_forward)?,
            reschedule: parse(&keys.reschedule)?,
            list_up: parse(&keys.list_up)?,
            list_down: parse(&keys.list_down)?,
            tab_left: parse(&keys.tab_left)?,
            tab_right: parse(&keys.tab_right)?,
            help: parse(&keys.help)?,
            resync: parse(&keys.resync)?,
        })
    }
}

/// Returns `Ok(true)` when the user asked to quit
pub fn handle_key_event(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    let bindings = Bindings::from_config(&app.config.key_bindings)?;

    match app.ui.mode {
        Mode::View => handle_view_mode(app, &bindings, key_event),
        Mode::Help => handle_help_mode(app, &bindings, key_event),
        Mode::Create | Mode::Edit => handle_form_mode(app, key_event),
        Mode::Reschedule => handle_reschedule_mode(app, key_event),
        Mode::ConfirmDelete => handle_delete_confirmation_modal(app, key_event),
    }
}

fn handle_view_mode(app: &mut App, bindings: &Bindings, key_event: KeyEvent) -> Result<bool, TuiError> {
    let code = key_event.code;
    let modifiers = key_event.modifiers;

    if bindings.quit.matches(code, modifiers) {
        return Ok(true);
    }
    if bindings.help.matches(code, modifiers) {
        app.enter_help_mode();
        return Ok(false);
    }
    if bindings.resync.matches(code, modifiers) {
        app.resync_reminders();
        return Ok(false);
    }
    if bindings.new.matches(code, modifiers) {
        app.enter_create_mode();
        return Ok(false);
    }
    if matches!(code, KeyCode::Tab | KeyCode::BackTab) {
        app.switch_tab(app.ui.current_tab.next());
        return Ok(false);
    }

    match app.ui.current_tab {
        Tab::Chores => handle_chores_tab(app, bindings, key_event),
        Tab::Calendar => handle_calendar_tab(app, bindings, key_event),
    }
    Ok(false)
}

fn handle_chores_tab(app: &mut App, bindings: &Bindings, key_event: KeyEvent) {
    let code = key_event.code;
    let modifiers = key_event.modifiers;

    if bindings.tab_left.matches(code, modifiers) || bindings.tab_right.matches(code, modifiers) {
        app.switch_tab(Tab::Calendar);
    } else if code == KeyCode::Up || bindings.list_up.matches(code, modifiers) {
        app.move_selection_up();
    } else if code == KeyCode::Down || bindings.list_down.matches(code, modifiers) {
        app.move_selection_down();
    } else if bindings.complete.matches(code, modifiers) {
        app.complete_selected();
    } else if bindings.postpone.matches(code, modifiers) {
        app.adjust_selected(1);
    } else if bindings.bring_forward.matches(code, modifiers) {
        app.adjust_selected(-1);
    } else if bindings.reschedule.matches(code, modifiers) {
        app.enter_reschedule_mode();
    } else if code == KeyCode::Enter || bindings.edit.matches(code, modifiers) {
        app.enter_edit_mode();
    } else if bindings.delete.matches(code, modifiers) {
        app.request_delete();
    }
}

/// Arrows move the selected day here, so the tab bindings give way to them
fn handle_calendar_tab(app: &mut App, bindings: &Bindings, key_event: KeyEvent) {
    let code = key_event.code;
    let modifiers = key_event.modifiers;

    match code {
        KeyCode::Left => app.move_calendar_day(-1),
        KeyCode::Right => app.move_calendar_day(1),
        KeyCode::Up => app.move_calendar_day(-7),
        KeyCode::Down => app.move_calendar_day(7),
        KeyCode::PageUp => app.move_calendar_month(-1),
        KeyCode::PageDown => app.move_calendar_month(1),
        KeyCode::Home => app.calendar_today(),
        KeyCode::Enter => app.open_calendar_day(),
        _ => {
            if bindings.list_up.matches(code, modifiers) {
                app.move_calendar_day(-7);
            } else if bindings.list_down.matches(code, modifiers) {
                app.move_calendar_day(7);
            } else if bindings.tab_left.matches(code, modifiers) || bindings.tab_right.matches(code, modifiers) {
                app.switch_tab(Tab::Chores);
            }
        }
    }
}

fn handle_help_mode(app: &mut App, bindings: &Bindings, key_event: KeyEvent) -> Result<bool, TuiError> {
    let code = key_event.code;
    if code == KeyCode::Esc
        || bindings.help.matches(code, key_event.modifiers)
        || bindings.quit.matches(code, key_event.modifiers)
    {
        app.exit_to_view();
    }
    Ok(false)
}

fn handle_form_mode(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    if key_event.code == KeyCode::Esc {
        app.exit_to_view();
        return Ok(false);
    }
    if key_event.code == KeyCode::Enter {
        app.save_form();
        return Ok(false);
    }

    let Some(form) = app.form.as_mut() else {
        app.exit_to_view();
        return Ok(false);
    };

    match key_event.code {
        KeyCode::Tab | KeyCode::Down => form.current_field = form.current_field.next(),
        KeyCode::BackTab | KeyCode::Up => form.current_field = form.current_field.previous(),
        KeyCode::Left | KeyCode::Right => {
            let forward = key_event.code == KeyCode::Right;
            match form.current_field {
                FormField::Interval => form.cycle_preset(forward),
                FormField::DueDate => form.shift_due_date(if forward { 1 } else { -1 }),
                FormField::Name => {}
            }
        }
        KeyCode::Backspace => form.backspace(),
        KeyCode::Char(c) if !has_primary_modifier(key_event.modifiers) => {
            form.insert_char(c);
            form.errors.clear();
        }
        _ => {}
    }
    Ok(false)
}

fn handle_reschedule_mode(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    match key_event.code {
        KeyCode::Esc => app.exit_to_view(),
        KeyCode::Enter => app.confirm_reschedule(),
        code => {
            if let Some(prompt) = app.reschedule.as_mut() {
                match code {
                    KeyCode::Left | KeyCode::Down => prompt.shift(-1),
                    KeyCode::Right | KeyCode::Up => prompt.shift(1),
                    KeyCode::Backspace => {
                        prompt.input.pop();
                    }
                    KeyCode::Char(c) if c.is_ascii_digit() || c == '-' => {
                        prompt.input.push(c);
                        prompt.error = None;
                    }
                    _ => {}
                }
            }
        }
    }
    Ok(false)
}

fn handle_delete_confirmation_modal(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    match key_event.code {
        KeyCode::Up | KeyCode::Down | KeyCode::Left | KeyCode::Right | KeyCode::Tab => {
            app.modals.delete_modal_selection = 1 - app.modals.delete_modal_selection.min(1);
        }
        KeyCode::Enter => app.confirm_delete(),
        KeyCode::Char('y') | KeyCode::Char('Y') => {
            app.modals.delete_modal_selection = 0;
            app.confirm_delete();
        }
        KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
            debug!("delete cancelled");
            app.exit_to_view();
        }
        _ => {}
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crossterm::event::KeyModifiers;
    use crate::database::{ChoreStore, Database};
    use crate::notifications::{AuthorizationState, MemoryNotificationCenter};
    use crate::reminders::{ReminderDispatcher, ReminderQueue, ReminderTime};
    use crate::{ChoreActions, ChoreRecord, Config, Scheduler};
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn setup() -> (Database, Scheduler, ReminderQueue) {
        let clock = Arc::new(FixedClock::at_day(day(2026, 2, 15)));
        let center = Arc::new(MemoryNotificationCenter::with_state(AuthorizationState::Granted));
        let dispatcher = Arc::new(ReminderDispatcher::new(center, clock.clone(), ReminderTime::default()));
        let db = Database::open_in_memory().unwrap();
        let created = day(2026, 1, 1).and_hms_opt(0, 0, 0).unwrap().and_utc();
        db.save(&ChoreRecord::new("Vacuum".to_string(), 7, day(2026, 2, 15), created))
            .unwrap();
        db.save(&ChoreRecord::new("Plants".to_string(), 3, day(2026, 2, 17), created))
            .unwrap();
        (db, Scheduler::new(clock), ReminderQueue::start(dispatcher))
    }

    #[test]
    fn test_quit_key() {
        let (db, scheduler, queue) = setup();
        let actions = ChoreActions::new(&db, &scheduler, &queue);
        let mut app = App::new(Config::default(), &actions).unwrap();

        assert!(!handle_key_event(&mut app, key(KeyCode::Char('j'))).unwrap());
        assert_eq!(app.ui.selected_index, 1);
        assert!(handle_key_event(&mut app, key(KeyCode::Char('q'))).unwrap());
    }

    #[test]
    fn test_space_completes_and_plus_postpones() {
        let (db, scheduler, queue) = setup();
        let actions = ChoreActions::new(&db, &scheduler, &queue);
        let mut app = App::new(Config::default(), &actions).unwrap();

        handle_key_event(&mut app, key(KeyCode::Char(' '))).unwrap();
        let vacuum = app.chores.iter().find(|c| c.name == "Vacuum").unwrap();
        assert_eq!(vacuum.next_due, day(2026, 2, 22));

        let plants_index = app.chores.iter().position(|c| c.name == "Plants").unwrap();
        app.ui.selected_index = plants_index;
        handle_key_event(&mut app, KeyEvent::new(KeyCode::Char('+'), KeyModifiers::SHIFT)).unwrap();
        assert_eq!(app.selected_chore().unwrap().next_due, day(2026, 2, 18));
    }

    #[test]
    fn test_form_typing_does_not_trigger_bindings() {
        let (db, scheduler, queue) = setup();
        let actions = ChoreActions::new(&db, &scheduler, &queue);
        let mut app = App::new(Config::default(), &actions).unwrap();

        handle_key_event(&mut app, key(KeyCode::Char('n'))).unwrap();
        assert_eq!(app.ui.mode, Mode::Create);
        for c in "quiet".chars() {
            handle_key_event(&mut app, key(KeyCode::Char(c))).unwrap();
        }
        handle_key_event(&mut app, key(KeyCode::Tab)).unwrap();
        handle_key_event(&mut app, key(KeyCode::Right)).unwrap();
        handle_key_event(&mut app, key(KeyCode::Enter)).unwrap();

        assert_eq!(app.ui.mode, Mode::View);
        let created = app.chores.iter().find(|c| c.name == "quiet").unwrap();
        assert_eq!(created.interval_days, 14);
    }

    #[test]
    fn test_calendar_arrows_move_day() {
        let (db, scheduler, queue) = setup();
        let actions = ChoreActions::new(&db, &scheduler, &queue);
        let mut app = App::new(Config::default(), &actions).unwrap();

        handle_key_event(&mut app, key(KeyCode::Tab)).unwrap();
        assert_eq!(app.ui.current_tab, Tab::Calendar);
        handle_key_event(&mut app, key(KeyCode::Right)).unwrap();
        handle_key_event(&mut app, key(KeyCode::Right)).unwrap();
        assert_eq!(app.ui.calendar_day, day(2026, 2, 17));
        assert_eq!(app.ui.current_tab, Tab::Calendar);

        handle_key_event(&mut app, key(KeyCode::Enter)).unwrap();
        assert_eq!(app.ui.current_tab, Tab::Chores);
        assert_eq!(app.selected_chore().unwrap().name, "Plants");
    }

    #[test]
    fn test_delete_modal_escape_keeps_chore() {
        let (db, scheduler, queue) = setup();
        let actions = ChoreActions::new(&db, &scheduler, &queue);
        let mut app = App::new(Config::default(), &actions).unwrap();

        handle_key_event(&mut app, key(KeyCode::Char('d'))).unwrap();
        assert_eq!(app.ui.mode, Mode::ConfirmDelete);
        handle_key_event(&mut app, key(KeyCode::Esc)).unwrap();
        assert_eq!(app.chores.len(), 2);

        handle_key_event(&mut app, key(KeyCode::Char('d'))).unwrap();
        handle_key_event(&mut app, key(KeyCode::Char('y'))).unwrap();
        assert_eq!(app.chores.len(), 1);
    }

    #[test]
    fn test_invalid_binding_reports_error() {
        let (db, scheduler, queue) = setup();
        let actions = ChoreActions::new(&db, &scheduler, &queue);
        let mut config = Config::default();
        config.key_bindings.quit = "Hyper+q".to_string();
        let mut app = App::new(config, &actions).unwrap();

        let result = handle_key_event(&mut app, key(KeyCode::Char('x')));
        assert!(matches!(result, Err(TuiError::KeyBindingError(_))));
    }
}
