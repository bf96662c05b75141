use chrono::{Datelike, NaiveDate};
use ratatui::widgets::ListState;
use std::time::Instant;

use crate::actions::{ActionError, ChoreActions};
use crate::models::{ChoreDraft, ChoreEdit, ChoreId, ChoreRecord, FREQUENCY_PRESETS};
use crate::scheduler::{Scheduler, add_days, shift_month};
use crate::tui::error::TuiError;
use crate::utils::parse_date;
use crate::{Config, Database};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Chores,
    Calendar,
}

impl Tab {
    pub fn index(self) -> usize {
        match self {
            Tab::Chores => 0,
            Tab::Calendar => 1,
        }
    }

    pub fn next(self) -> Self {
        match self {
            Tab::Chores => Tab::Calendar,
            Tab::Calendar => Tab::Chores,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    View,
    Help,
    Create,
    Edit,
    Reschedule,
    ConfirmDelete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Name,
    Interval,
    DueDate,
}

impl FormField {
    pub fn next(self) -> Self {
        match self {
            FormField::Name => FormField::Interval,
            FormField::Interval => FormField::DueDate,
            FormField::DueDate => FormField::Name,
        }
    }

    pub fn previous(self) -> Self {
        match self {
            FormField::Name => FormField::DueDate,
            FormField::Interval => FormField::Name,
            FormField::DueDate => FormField::Interval,
        }
    }
}

/// Add/edit form; fields are kept as typed and parsed on save
#[derive(Debug, Clone)]
pub struct ChoreForm {
    pub current_field: FormField,
    pub name: String,
    pub interval: String,
    pub due_date: String,
    /// Present when editing an existing chore
    pub editing: Option<(ChoreId, ChoreEdit)>,
    pub errors: Vec<String>,
}

impl ChoreForm {
    pub fn for_draft(draft: &ChoreDraft) -> Self {
        Self {
            current_field: FormField::Name,
            name: draft.name.clone(),
            interval: draft.interval_days.to_string(),
            due_date: draft.next_due.format("%Y-%m-%d").to_string(),
            editing: None,
            errors: Vec::new(),
        }
    }

    pub fn for_edit(record: &ChoreRecord) -> Self {
        Self {
            current_field: FormField::Name,
            name: record.name.clone(),
            interval: record.interval_days.to_string(),
            due_date: record.next_due.format("%Y-%m-%d").to_string(),
            editing: Some((record.id, ChoreEdit::new(record))),
            errors: Vec::new(),
        }
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    pub fn current_value_mut(&mut self) -> &mut String {
        match self.current_field {
            FormField::Name => &mut self.name,
            FormField::Interval => &mut self.interval,
            FormField::DueDate => &mut self.due_date,
        }
    }

    pub fn insert_char(&mut self, c: char) {
        if self.current_field == FormField::Interval && !(c.is_ascii_digit() || c == '-') {
            return;
        }
        self.current_value_mut().push(c);
    }

    pub fn backspace(&mut self) {
        self.current_value_mut().pop();
    }

    /// Step the interval through the presets, wrapping around
    pub fn cycle_preset(&mut self, forward: bool) {
        let current = self.interval.trim().parse::<i64>().ok();
        let position = current.and_then(|days| FREQUENCY_PRESETS.iter().position(|(_, d)| *d == days));
        let len = FREQUENCY_PRESETS.len();
        let next = match (position, forward) {
            (Some(i), true) => (i + 1) % len,
            (Some(i), false) => (i + len - 1) % len,
            (None, true) => 0,
            (None, false) => len - 1,
        };
        self.interval = FREQUENCY_PRESETS[next].1.to_string();
    }

    pub fn preset_label(&self) -> Option<&'static str> {
        let days = self.interval.trim().parse::<i64>().ok()?;
        FREQUENCY_PRESETS
            .iter()
            .find(|(_, d)| *d == days)
            .map(|(label, _)| *label)
    }

    /// Shift the due date field by whole days when it holds a valid date
    pub fn shift_due_date(&mut self, delta: i64) {
        if let Some(day) = parse_date(&self.due_date).ok().and_then(|d| add_days(d, delta)) {
            self.due_date = day.format("%Y-%m-%d").to_string();
        }
    }

    fn parse_fields(&self) -> Result<(i64, NaiveDate), Vec<String>> {
        let mut errors = Vec::new();
        let interval = self.interval.trim().parse::<i64>();
        if interval.is_err() {
            errors.push("Interval must be a whole number of days".to_string());
        }
        let due = parse_date(&self.due_date);
        if due.is_err() {
            errors.push("Due date must be YYYY-MM-DD".to_string());
        }
        match (interval, due) {
            (Ok(interval), Ok(due)) => Ok((interval, due)),
            _ => Err(errors),
        }
    }
}

/// Date prompt for moving the selected chore
#[derive(Debug, Clone)]
pub struct ReschedulePrompt {
    pub chore_id: ChoreId,
    pub chore_name: String,
    pub input: String,
    pub error: Option<String>,
}

impl ReschedulePrompt {
    pub fn shift(&mut self, delta: i64) {
        if let Some(day) = parse_date(&self.input).ok().and_then(|d| add_days(d, delta)) {
            self.input = day.format("%Y-%m-%d").to_string();
            self.error = None;
        }
    }
}

#[derive(Debug, Clone)]
pub struct UiState {
    pub current_tab: Tab,
    pub mode: Mode,
    /// Index into `App::chores`
    pub selected_index: usize,
    /// Scroll state of the chore list; its selection counts header rows
    pub list_state: ListState,
    /// Selected day on the calendar tab
    pub calendar_day: NaiveDate,
}

#[derive(Debug, Clone, Default)]
pub struct ModalState {
    pub delete_confirmation: Option<ChoreRecord>,
    /// 0 = Delete, 1 = Cancel
    pub delete_modal_selection: usize,
}

#[derive(Debug, Clone, Default)]
pub struct StatusState {
    pub message: Option<String>,
    pub message_time: Option<Instant>,
}

pub struct App<'a> {
    pub config: Config,
    actions: &'a ChoreActions<'a, Database>,

    /// Every chore in display order: overdue, today, upcoming
    pub chores: Vec<ChoreRecord>,

    pub ui: UiState,
    pub form: Option<ChoreForm>,
    pub reschedule: Option<ReschedulePrompt>,
    pub modals: ModalState,
    pub status: StatusState,
}

impl<'a> App<'a> {
    pub fn new(config: Config, actions: &'a ChoreActions<'a, Database>) -> Result<Self, TuiError> {
        let today = actions.scheduler().today();
        let mut app = Self {
            config,
            actions,
            chores: Vec::new(),
            ui: UiState {
                current_tab: Tab::Chores,
                mode: Mode::View,
                selected_index: 0,
                list_state: ListState::default(),
                calendar_day: today,
            },
            form: None,
            reschedule: None,
            modals: ModalState::default(),
            status: StatusState::default(),
        };
        app.load_data()?;
        Ok(app)
    }

    pub fn scheduler(&self) -> &'a Scheduler {
        self.actions.scheduler()
    }

    pub fn today(&self) -> NaiveDate {
        self.scheduler().today()
    }

    pub fn load_data(&mut self) -> Result<(), TuiError> {
        self.chores = self.actions.load_sorted()?;
        self.adjust_selected_index();
        Ok(())
    }

    /// Reload and keep the selection on `id` if it still exists
    fn reload_selecting(&mut self, id: Option<ChoreId>) -> Result<(), TuiError> {
        self.load_data()?;
        if let Some(index) = id.and_then(|id| self.chores.iter().position(|c| c.id == id)) {
            self.ui.selected_index = index;
        }
        Ok(())
    }

    pub fn selected_chore(&self) -> Option<&ChoreRecord> {
        self.chores.get(self.ui.selected_index)
    }

    pub fn adjust_selected_index(&mut self) {
        if self.chores.is_empty() {
            self.ui.selected_index = 0;
        } else if self.ui.selected_index >= self.chores.len() {
            self.ui.selected_index = self.chores.len() - 1;
        }
    }

    pub fn move_selection_up(&mut self) {
        if self.ui.selected_index > 0 {
            self.ui.selected_index -= 1;
        }
    }

    pub fn move_selection_down(&mut self) {
        if self.ui.selected_index + 1 < self.chores.len() {
            self.ui.selected_index += 1;
        }
    }

    pub fn switch_tab(&mut self, tab: Tab) {
        self.ui.current_tab = tab;
    }

    pub fn set_status_message(&mut self, message: String) {
        self.status.message = Some(message);
        self.status.message_time = Some(Instant::now());
    }

    pub fn clear_status_message(&mut self) {
        self.status.message = None;
        self.status.message_time = None;
    }

    /// Clear the status message after a few seconds
    pub fn check_status_message_timeout(&mut self) {
        const STATUS_MESSAGE_TIMEOUT_SECS: u64 = 3;
        if let Some(time) = self.status.message_time {
            if time.elapsed().as_secs() >= STATUS_MESSAGE_TIMEOUT_SECS {
                self.clear_status_message();
            }
        }
    }

    fn report(&mut self, result: Result<String, TuiError>) {
        match result {
            Ok(message) => self.set_status_message(message),
            Err(e) => self.set_status_message(format!("Error: {}", e)),
        }
    }

    pub fn enter_help_mode(&mut self) {
        self.ui.mode = Mode::Help;
    }

    pub fn exit_to_view(&mut self) {
        self.ui.mode = Mode::View;
        self.form = None;
        self.reschedule = None;
        self.modals = ModalState::default();
    }

    pub fn complete_selected(&mut self) {
        let Some(mut chore) = self.selected_chore().cloned() else {
            return;
        };
        let result = self
            .actions
            .complete(&mut chore)
            .map_err(TuiError::from)
            .and_then(|()| self.reload_selecting(Some(chore.id)))
            .map(|()| format!("'{}' done, next due {}", chore.name, chore.next_due));
        self.report(result);
    }

    /// Shift the selected chore's due date by `delta` days
    pub fn adjust_selected(&mut self, delta: i64) {
        let Some(mut chore) = self.selected_chore().cloned() else {
            return;
        };
        let result = self
            .actions
            .adjust(&mut chore, delta)
            .map_err(TuiError::from)
            .and_then(|()| self.reload_selecting(Some(chore.id)))
            .map(|()| format!("'{}' now due {}", chore.name, chore.next_due));
        self.report(result);
    }

    pub fn resync_reminders(&mut self) {
        let result = self
            .actions
            .resync()
            .map(|count| format!("Resyncing reminders for {} chores", count))
            .map_err(TuiError::from);
        self.report(result);
    }

    /// New chore form, due on `due` (today from the list, the selected day
    /// from the calendar)
    pub fn enter_create_mode(&mut self) {
        let due = match self.ui.current_tab {
            Tab::Chores => self.today(),
            Tab::Calendar => self.ui.calendar_day,
        };
        let mut draft = ChoreDraft::new(self.today());
        draft.next_due = due;
        self.form = Some(ChoreForm::for_draft(&draft));
        self.ui.mode = Mode::Create;
    }

    pub fn enter_edit_mode(&mut self) {
        let Some(chore) = self.selected_chore() else {
            return;
        };
        self.form = Some(ChoreForm::for_edit(chore));
        self.ui.mode = Mode::Edit;
    }

    /// Validate and save the open form. On failure the form stays open with
    /// its errors filled in.
    pub fn save_form(&mut self) {
        let Some(mut form) = self.form.take() else {
            return;
        };

        let (interval, due) = match form.parse_fields() {
            Ok(values) => values,
            Err(errors) => {
                form.errors = errors;
                self.form = Some(form);
                return;
            }
        };

        let outcome = match form.editing.as_mut() {
            None => {
                let mut draft = ChoreDraft::new(self.today());
                draft.name = form.name.clone();
                draft.interval_days = interval;
                draft.next_due = due;
                self.actions.create(draft).map(|record| (record.id, "Chore added"))
            }
            Some((id, edit)) => {
                edit.name = form.name.clone();
                edit.interval_days = interval;
                edit.next_due = due;
                let id = *id;
                match self.chores.iter().find(|c| c.id == id).cloned() {
                    Some(mut record) => self
                        .actions
                        .apply_edit(&mut record, edit)
                        .map(|_| (id, "Chore updated")),
                    None => {
                        self.set_status_message("Chore no longer exists".to_string());
                        self.exit_to_view();
                        return;
                    }
                }
            }
        };

        match outcome {
            Ok((id, message)) => {
                self.exit_to_view();
                let result = self.reload_selecting(Some(id)).map(|()| message.to_string());
                self.report(result);
            }
            Err(ActionError::Invalid(errors)) => {
                form.errors = errors.iter().map(|e| e.to_string()).collect();
                self.form = Some(form);
            }
            Err(e) => {
                form.errors = vec![e.to_string()];
                self.form = Some(form);
            }
        }
    }

    pub fn enter_reschedule_mode(&mut self) {
        let Some(chore) = self.selected_chore() else {
            return;
        };
        self.reschedule = Some(ReschedulePrompt {
            chore_id: chore.id,
            chore_name: chore.name.clone(),
            input: chore.next_due.format("%Y-%m-%d").to_string(),
            error: None,
        });
        self.ui.mode = Mode::Reschedule;
    }

    pub fn confirm_reschedule(&mut self) {
        let Some(mut prompt) = self.reschedule.take() else {
            return;
        };
        let day = match parse_date(&prompt.input) {
            Ok(day) => day,
            Err(_) => {
                prompt.error = Some("Enter a date as YYYY-MM-DD".to_string());
                self.reschedule = Some(prompt);
                return;
            }
        };
        let Some(mut chore) = self.chores.iter().find(|c| c.id == prompt.chore_id).cloned() else {
            self.exit_to_view();
            return;
        };

        self.exit_to_view();
        let result = self
            .actions
            .reschedule(&mut chore, day)
            .map_err(TuiError::from)
            .and_then(|()| self.reload_selecting(Some(chore.id)))
            .map(|()| format!("'{}' now due {}", chore.name, day));
        self.report(result);
    }

    pub fn request_delete(&mut self) {
        let Some(chore) = self.selected_chore().cloned() else {
            return;
        };
        self.modals.delete_confirmation = Some(chore);
        self.modals.delete_modal_selection = 0;
        self.ui.mode = Mode::ConfirmDelete;
    }

    pub fn confirm_delete(&mut self) {
        let chore = self.modals.delete_confirmation.take();
        let delete = self.modals.delete_modal_selection == 0;
        self.exit_to_view();
        let Some(chore) = chore.filter(|_| delete) else {
            return;
        };
        let result = self
            .actions
            .delete(&chore)
            .map_err(TuiError::from)
            .and_then(|()| self.reload_selecting(None))
            .map(|()| format!("Deleted '{}'", chore.name));
        self.report(result);
    }

    pub fn move_calendar_day(&mut self, delta: i64) {
        if let Some(day) = add_days(self.ui.calendar_day, delta) {
            self.ui.calendar_day = day;
        }
    }

    /// Move to the same day of another month, clamped to its length
    pub fn move_calendar_month(&mut self, delta: i32) {
        let first = shift_month(self.ui.calendar_day, delta);
        let wanted = self.ui.calendar_day.day();
        let mut day = first;
        while let Some(next) = day.succ_opt() {
            if next.month() != first.month() || day.day() >= wanted {
                break;
            }
            day = next;
        }
        self.ui.calendar_day = day;
    }

    pub fn calendar_today(&mut self) {
        self.ui.calendar_day = self.today();
    }

    pub fn chores_on_calendar_day(&self) -> Vec<&ChoreRecord> {
        self.scheduler().chores_on(self.ui.calendar_day, &self.chores)
    }

    /// Jump to the list with the first chore of the selected day selected
    pub fn open_calendar_day(&mut self) {
        let Some(id) = self.chores_on_calendar_day().first().map(|c| c.id) else {
            return;
        };
        if let Some(index) = self.chores.iter().position(|c| c.id == id) {
            self.ui.selected_index = index;
        }
        self.switch_tab(Tab::Chores);
    }
}
