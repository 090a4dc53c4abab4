use chrono::NaiveDate;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::error::LeaseError;
use crate::models::{validate_building_name, Apartment, ApartmentDraft, LEASE_DATE_FORMAT};
use crate::reminder::{Reminder, SenderCredentials};

/// Style for a form value: highlighted when focused, dimmed when empty.
fn field_style(is_active: bool, is_empty: bool) -> Style {
    if is_active {
        Style::default().fg(Color::Yellow)
    } else if is_empty {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    }
}

/// Single-field form used to add or rename a building.
#[derive(Default, Clone)]
pub(crate) struct BuildingForm {
    pub(crate) name: String,
    pub(crate) error: Option<String>,
}

impl BuildingForm {
    pub(crate) fn from_name(name: &str) -> Self {
        Self {
            name: name.to_string(),
            error: None,
        }
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        self.name.push(ch);
        true
    }

    pub(crate) fn backspace(&mut self) {
        self.name.pop();
    }

    pub(crate) fn parse_inputs(&self) -> Result<String, LeaseError> {
        validate_building_name(&self.name)
    }

    pub(crate) fn build_line(&self) -> Line<'static> {
        let display = if self.name.is_empty() {
            "<required>".to_string()
        } else {
            self.name.clone()
        };
        Line::from(vec![
            Span::raw("Building Name: "),
            Span::styled(display, field_style(true, self.name.is_empty())),
        ])
    }

    pub(crate) fn value_len(&self) -> usize {
        self.name.chars().count()
    }
}

/// Fields of the apartment form, in tab order.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub(crate) enum ApartmentField {
    #[default]
    Number,
    Tenant,
    Email,
    LeaseStart,
    LeaseEnd,
}

impl ApartmentField {
    pub(crate) const ALL: [ApartmentField; 5] = [
        ApartmentField::Number,
        ApartmentField::Tenant,
        ApartmentField::Email,
        ApartmentField::LeaseStart,
        ApartmentField::LeaseEnd,
    ];

    pub(crate) fn label(self) -> &'static str {
        match self {
            ApartmentField::Number => "Apartment Number",
            ApartmentField::Tenant => "Name",
            ApartmentField::Email => "Tenant Email",
            ApartmentField::LeaseStart => "Lease Start",
            ApartmentField::LeaseEnd => "Lease End",
        }
    }

    fn placeholder(self) -> &'static str {
        match self {
            ApartmentField::LeaseStart | ApartmentField::LeaseEnd => "<MM/DD/YYYY>",
            _ => "<required>",
        }
    }

    fn next(self) -> Self {
        match self {
            ApartmentField::Number => ApartmentField::Tenant,
            ApartmentField::Tenant => ApartmentField::Email,
            ApartmentField::Email => ApartmentField::LeaseStart,
            ApartmentField::LeaseStart => ApartmentField::LeaseEnd,
            ApartmentField::LeaseEnd => ApartmentField::Number,
        }
    }

    fn previous(self) -> Self {
        match self {
            ApartmentField::Number => ApartmentField::LeaseEnd,
            ApartmentField::Tenant => ApartmentField::Number,
            ApartmentField::Email => ApartmentField::Tenant,
            ApartmentField::LeaseStart => ApartmentField::Email,
            ApartmentField::LeaseEnd => ApartmentField::LeaseStart,
        }
    }

    /// Line offset of the field inside the form.
    pub(crate) fn row(self) -> u16 {
        match self {
            ApartmentField::Number => 0,
            ApartmentField::Tenant => 1,
            ApartmentField::Email => 2,
            ApartmentField::LeaseStart => 3,
            ApartmentField::LeaseEnd => 4,
        }
    }
}

/// Form state for adding or editing an apartment.
#[derive(Default, Clone)]
pub(crate) struct ApartmentForm {
    pub(crate) draft: ApartmentDraft,
    pub(crate) active: ApartmentField,
    pub(crate) error: Option<String>,
}

impl ApartmentForm {
    /// Empty form with both lease dates preset to `today`.
    pub(crate) fn new(today: NaiveDate) -> Self {
        let date = today.format(LEASE_DATE_FORMAT).to_string();
        Self {
            draft: ApartmentDraft {
                lease_start: date.clone(),
                lease_end: date,
                ..ApartmentDraft::default()
            },
            active: ApartmentField::Number,
            error: None,
        }
    }

    pub(crate) fn from_apartment(apartment: &Apartment) -> Self {
        Self {
            draft: apartment.to_draft(),
            active: ApartmentField::Number,
            error: None,
        }
    }

    pub(crate) fn next_field(&mut self) {
        self.active = self.active.next();
    }

    pub(crate) fn previous_field(&mut self) {
        self.active = self.active.previous();
    }

    fn value(&self, field: ApartmentField) -> &String {
        match field {
            ApartmentField::Number => &self.draft.number,
            ApartmentField::Tenant => &self.draft.tenant,
            ApartmentField::Email => &self.draft.email,
            ApartmentField::LeaseStart => &self.draft.lease_start,
            ApartmentField::LeaseEnd => &self.draft.lease_end,
        }
    }

    fn value_mut(&mut self, field: ApartmentField) -> &mut String {
        match field {
            ApartmentField::Number => &mut self.draft.number,
            ApartmentField::Tenant => &mut self.draft.tenant,
            ApartmentField::Email => &mut self.draft.email,
            ApartmentField::LeaseStart => &mut self.draft.lease_start,
            ApartmentField::LeaseEnd => &mut self.draft.lease_end,
        }
    }

    /// Append a character to the active field. Date fields only take digits
    /// and slashes.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        let is_date = matches!(
            self.active,
            ApartmentField::LeaseStart | ApartmentField::LeaseEnd
        );
        if is_date && !(ch.is_ascii_digit() || ch == '/') {
            return false;
        }
        let active = self.active;
        self.value_mut(active).push(ch);
        true
    }

    pub(crate) fn backspace(&mut self) {
        let active = self.active;
        self.value_mut(active).pop();
    }

    pub(crate) fn parse_inputs(&self) -> Result<ApartmentDraft, LeaseError> {
        self.draft.clone().validate()
    }

    pub(crate) fn build_line(&self, field: ApartmentField) -> Line<'static> {
        let value = self.value(field);
        let display = if value.is_empty() {
            field.placeholder().to_string()
        } else {
            value.clone()
        };
        Line::from(vec![
            Span::raw(format!("{}: ", field.label())),
            Span::styled(display, field_style(self.active == field, value.is_empty())),
        ])
    }

    pub(crate) fn value_len(&self, field: ApartmentField) -> usize {
        self.value(field).chars().count()
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub(crate) enum LoginField {
    #[default]
    Username,
    Secret,
}

/// Startup dialog collecting the sender account and its password or API key.
#[derive(Default, Clone)]
pub(crate) struct LoginForm {
    pub(crate) username: String,
    pub(crate) secret: String,
    pub(crate) active: LoginField,
    pub(crate) error: Option<String>,
}

impl LoginForm {
    pub(crate) fn with_username(username: Option<&str>) -> Self {
        let username = username.unwrap_or_default().to_string();
        let active = if username.is_empty() {
            LoginField::Username
        } else {
            LoginField::Secret
        };
        Self {
            username,
            active,
            ..Self::default()
        }
    }

    pub(crate) fn toggle_field(&mut self) {
        self.active = match self.active {
            LoginField::Username => LoginField::Secret,
            LoginField::Secret => LoginField::Username,
        };
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        match self.active {
            LoginField::Username => self.username.push(ch),
            LoginField::Secret => self.secret.push(ch),
        }
        true
    }

    pub(crate) fn backspace(&mut self) {
        match self.active {
            LoginField::Username => {
                self.username.pop();
            }
            LoginField::Secret => {
                self.secret.pop();
            }
        }
    }

    pub(crate) fn parse_inputs(&self) -> Result<SenderCredentials, LeaseError> {
        let username = self.username.trim();
        if username.is_empty() {
            return Err(LeaseError::MissingField("Email"));
        }
        if self.secret.is_empty() {
            return Err(LeaseError::MissingField("Password / API key"));
        }
        Ok(SenderCredentials::new(username, self.secret.clone()))
    }

    /// The secret is rendered as asterisks.
    pub(crate) fn build_line(&self, field: LoginField) -> Line<'static> {
        let (label, value) = match field {
            LoginField::Username => ("Email", self.username.clone()),
            LoginField::Secret => ("Password / API key", "*".repeat(self.secret.chars().count())),
        };
        let display = if value.is_empty() {
            "<required>".to_string()
        } else {
            value.clone()
        };
        Line::from(vec![
            Span::raw(format!("{label}: ")),
            Span::styled(display, field_style(self.active == field, value.is_empty())),
        ])
    }

    pub(crate) fn cursor_offset(&self) -> (u16, u16) {
        match self.active {
            LoginField::Username => (
                ("Email: ".len() + self.username.chars().count()) as u16,
                0,
            ),
            LoginField::Secret => (
                ("Password / API key: ".len() + self.secret.chars().count()) as u16,
                1,
            ),
        }
    }
}

/// Prompt for the path of a file to attach.
#[derive(Default, Clone)]
pub(crate) struct PathForm {
    pub(crate) path: String,
    pub(crate) error: Option<String>,
}

impl PathForm {
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        self.path.push(ch);
        true
    }

    pub(crate) fn backspace(&mut self) {
        self.path.pop();
    }
}

/// Plain multi-line editor for the reminder template.
#[derive(Clone)]
pub(crate) struct TemplateEditor {
    pub(crate) text: String,
}

impl TemplateEditor {
    pub(crate) fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
        }
    }

    pub(crate) fn push_char(&mut self, ch: char) {
        if !ch.is_control() {
            self.text.push(ch);
        }
    }

    pub(crate) fn newline(&mut self) {
        self.text.push('\n');
    }

    pub(crate) fn backspace(&mut self) {
        self.text.pop();
    }

    /// Cursor position relative to the editor's inner area.
    pub(crate) fn cursor_offset(&self) -> (u16, u16) {
        let row = self.text.matches('\n').count();
        let col = self
            .text
            .rsplit('\n')
            .next()
            .map(|line| line.chars().count())
            .unwrap_or(0);
        (col as u16, row as u16)
    }
}

/// What the delete confirmation will remove.
#[derive(Clone)]
pub(crate) enum ConfirmDelete {
    Building {
        index: usize,
        name: String,
        apartments: usize,
    },
    Apartment {
        building: usize,
        apartment: usize,
        label: String,
    },
}

/// Reminder waiting for the user to confirm the send.
pub(crate) struct ConfirmSend {
    pub(crate) reminder: Reminder,
}

/// Tracks the user's choice when quitting with unsaved edits.
pub(crate) struct ConfirmExit {
    pub(crate) selection: ExitChoice,
}

impl ConfirmExit {
    pub(crate) fn new() -> Self {
        Self {
            selection: ExitChoice::Save,
        }
    }

    /// Move the selection forward (Save → Discard → Cancel).
    pub(crate) fn next(&mut self) {
        self.selection = match self.selection {
            ExitChoice::Save => ExitChoice::Discard,
            ExitChoice::Discard => ExitChoice::Cancel,
            ExitChoice::Cancel => ExitChoice::Save,
        };
    }

    /// Move the selection backward (Save ← Discard ← Cancel).
    pub(crate) fn previous(&mut self) {
        self.selection = match self.selection {
            ExitChoice::Save => ExitChoice::Cancel,
            ExitChoice::Discard => ExitChoice::Save,
            ExitChoice::Cancel => ExitChoice::Discard,
        };
    }

    pub(crate) fn labels(&self) -> [&'static str; 3] {
        ["Save & Quit", "Discard & Quit", "Cancel"]
    }

    pub(crate) fn selected_index(&self) -> usize {
        match self.selection {
            ExitChoice::Save => 0,
            ExitChoice::Discard => 1,
            ExitChoice::Cancel => 2,
        }
    }
}

/// Options presented in the exit dialog.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) enum ExitChoice {
    Save,
    Discard,
    Cancel,
}
