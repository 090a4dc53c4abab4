use std::mem;

use anyhow::Result;
use chrono::{Local, NaiveDate};
use crossterm::event::KeyCode;
use open::that as open_path;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, Borders, Cell, Clear, List, ListItem, ListState, Paragraph, Row, Table, TableState,
    Wrap,
};
use ratatui::Frame;
use rusqlite::Connection;

use crate::config::AppConfig;
use crate::db::{insert_apartment, insert_building};
use crate::error::LeaseError;
use crate::models::{lease_status, Apartment, Building};
use crate::reminder::{self, MailTransport, SenderCredentials};
use crate::sync::save_portfolio;

use super::forms::{
    ApartmentField, ApartmentForm, BuildingForm, ConfirmDelete, ConfirmExit, ConfirmSend,
    ExitChoice, LoginField, LoginForm, PathForm, TemplateEditor,
};
use super::helpers::{centered_rect, display_name, lease_style, surface_error};
use super::screens::{AttachmentList, TreeRow, TreeView};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Rows skipped by PageUp/PageDown.
const PAGE: isize = 5;

const TREE_KEYS: &[(&str, &str)] = &[
    ("[↑↓]", "Select"),
    ("[Space]", "Fold"),
    ("[b]", "Add Building"),
    ("[a]", "Add Apartment"),
    ("[e]", "Edit"),
    ("[-]", "Delete"),
    ("[o]", "Sort"),
    ("[w]", "Save"),
    ("[r]", "Remind"),
    ("[t]", "Template"),
    ("[q]", "Quit"),
];
const REMINDER_KEYS: &[(&str, &str)] = &[
    ("[e]", "Edit Template"),
    ("[d]", "Reset"),
    ("[+]", "Attach"),
    ("[-]", "Remove"),
    ("[o]", "Open"),
    ("[s]", "Send"),
    ("[L]", "Login"),
    ("[Esc]", "Back"),
    ("[q]", "Quit"),
];
const EDITOR_KEYS: &[(&str, &str)] = &[("[Enter]", "New Line"), ("[Esc]", "Done")];
const FORM_KEYS: &[(&str, &str)] = &[("[Enter]", "Confirm"), ("[Tab]", "Switch"), ("[Esc]", "Cancel")];

/// Top-level views.
enum Screen {
    Tree,
    Reminder,
}

/// Modal state layered over the current screen.
enum Mode {
    Normal,
    AddingBuilding(BuildingForm),
    RenamingBuilding {
        index: usize,
        form: BuildingForm,
    },
    AddingApartment {
        building: usize,
        form: ApartmentForm,
    },
    EditingApartment {
        building: usize,
        apartment: usize,
        form: ApartmentForm,
    },
    ConfirmDelete(ConfirmDelete),
    ConfirmSave,
    ConfirmExit(ConfirmExit),
    ConfirmSend(ConfirmSend),
    EditingTemplate(TemplateEditor),
    AttachingFile(PathForm),
    Login(LoginForm),
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state shared across the TUI.
pub struct App {
    conn: Connection,
    buildings: Vec<Building>,
    tree: TreeView,
    screen: Screen,
    mode: Mode,
    status: Option<StatusMessage>,
    /// Set by renames, edits, deletes and sorting; cleared by a save.
    dirty: bool,
    template: String,
    default_template: String,
    subject: String,
    warning_days: i64,
    attachments: AttachmentList,
    credentials: Option<SenderCredentials>,
    transport: Box<dyn MailTransport>,
    today: NaiveDate,
}

impl App {
    /// Build the application state. Opens on the login dialog when the
    /// config does not provide sender credentials.
    pub fn new(
        conn: Connection,
        buildings: Vec<Building>,
        config: &AppConfig,
        transport: Box<dyn MailTransport>,
    ) -> Self {
        let credentials = SenderCredentials::from_config(&config.mail);
        let mode = if credentials.is_some() {
            Mode::Normal
        } else {
            Mode::Login(LoginForm::with_username(config.mail.username.as_deref()))
        };

        Self {
            conn,
            buildings,
            tree: TreeView::default(),
            screen: Screen::Tree,
            mode,
            status: None,
            dirty: false,
            template: config.reminder.template.clone(),
            default_template: config.reminder.template.clone(),
            subject: config.mail.subject.clone(),
            warning_days: config.reminder.warning_days,
            attachments: AttachmentList::default(),
            credentials,
            transport,
            today: Local::now().date_naive(),
        }
    }

    /// Dispatch one key press. Returns `true` when the application should
    /// exit.
    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit),
            Mode::AddingBuilding(form) => self.handle_add_building(code, form),
            Mode::RenamingBuilding { index, form } => {
                self.handle_rename_building(code, index, form)
            }
            Mode::AddingApartment { building, form } => {
                self.handle_add_apartment(code, building, form)
            }
            Mode::EditingApartment {
                building,
                apartment,
                form,
            } => self.handle_edit_apartment(code, building, apartment, form),
            Mode::ConfirmDelete(confirm) => self.handle_confirm_delete(code, confirm),
            Mode::ConfirmSave => self.handle_confirm_save(code),
            Mode::ConfirmExit(confirm) => self.handle_confirm_exit(code, confirm, &mut exit),
            Mode::ConfirmSend(confirm) => self.handle_confirm_send(code, confirm),
            Mode::EditingTemplate(editor) => self.handle_edit_template(code, editor),
            Mode::AttachingFile(form) => self.handle_attach_file(code, form),
            Mode::Login(form) => self.handle_login(code, form),
        };

        Ok(exit)
    }

    /// Ctrl-S: open the save confirmation from any screen.
    pub(crate) fn handle_ctrl_s(&mut self) {
        if matches!(self.mode, Mode::Normal) {
            self.mode = Mode::ConfirmSave;
        }
    }

    /// Ctrl-C: quit, going through the unsaved-changes prompt when needed.
    pub(crate) fn handle_ctrl_c(&mut self) -> bool {
        let mut exit = false;
        self.mode = self.request_exit(&mut exit);
        exit
    }

    fn request_exit(&mut self, exit: &mut bool) -> Mode {
        if self.dirty {
            Mode::ConfirmExit(ConfirmExit::new())
        } else {
            *exit = true;
            Mode::Normal
        }
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Mode {
        match self.screen {
            Screen::Tree => match code {
                KeyCode::Char('q') | KeyCode::Esc => return self.request_exit(exit),
                KeyCode::Up => self.tree.move_selection(&self.buildings, -1),
                KeyCode::Down => self.tree.move_selection(&self.buildings, 1),
                KeyCode::PageUp => self.tree.move_selection(&self.buildings, -PAGE),
                KeyCode::PageDown => self.tree.move_selection(&self.buildings, PAGE),
                KeyCode::Home => self.tree.select_first(),
                KeyCode::End => self.tree.select_last(&self.buildings),
                KeyCode::Char(' ') => {
                    if let Some(collapsed) = self.tree.toggle_collapsed(&self.buildings) {
                        let text = if collapsed { "Collapsed." } else { "Expanded." };
                        self.set_status(text, StatusKind::Info);
                    }
                }
                KeyCode::Char('b') | KeyCode::Char('+') => {
                    self.clear_status();
                    return Mode::AddingBuilding(BuildingForm::default());
                }
                KeyCode::Char('a') => match self.current_row() {
                    Some(row) => {
                        self.clear_status();
                        return Mode::AddingApartment {
                            building: row.building_index(),
                            form: ApartmentForm::new(self.today),
                        };
                    }
                    None => {
                        self.report(LeaseError::NoBuildingSelected);
                    }
                },
                KeyCode::Char('e') | KeyCode::Char('E') | KeyCode::Enter => {
                    match self.current_row() {
                        Some(TreeRow::Building(index)) => {
                            self.clear_status();
                            return Mode::RenamingBuilding {
                                index,
                                form: BuildingForm::from_name(&self.buildings[index].name),
                            };
                        }
                        Some(TreeRow::Apartment(building, apartment)) => {
                            self.clear_status();
                            let form = ApartmentForm::from_apartment(
                                &self.buildings[building].apartments[apartment],
                            );
                            return Mode::EditingApartment {
                                building,
                                apartment,
                                form,
                            };
                        }
                        None => self.set_status("Nothing selected to edit.", StatusKind::Error),
                    }
                }
                KeyCode::Char('-') | KeyCode::Delete => match self.current_row() {
                    Some(row) => {
                        self.clear_status();
                        return Mode::ConfirmDelete(self.delete_target(row));
                    }
                    None => self.set_status("Nothing selected to delete.", StatusKind::Error),
                },
                KeyCode::Char('o') | KeyCode::Char('O') => self.sort_apartments(),
                KeyCode::Char('w') | KeyCode::Char('W') => return Mode::ConfirmSave,
                KeyCode::Char('r') | KeyCode::Char('R') => return self.start_reminder(),
                KeyCode::Char('t') | KeyCode::Char('T') | KeyCode::Tab => {
                    self.clear_status();
                    self.screen = Screen::Reminder;
                }
                KeyCode::Char('L') => return self.open_login(),
                _ => {}
            },
            Screen::Reminder => match code {
                KeyCode::Char('q') => return self.request_exit(exit),
                KeyCode::Esc | KeyCode::Char('t') | KeyCode::Char('T') | KeyCode::Tab => {
                    self.clear_status();
                    self.screen = Screen::Tree;
                }
                KeyCode::Up => self.attachments.move_selection(-1),
                KeyCode::Down => self.attachments.move_selection(1),
                KeyCode::Char('e') | KeyCode::Char('E') => {
                    self.clear_status();
                    return Mode::EditingTemplate(TemplateEditor::new(&self.template));
                }
                KeyCode::Char('d') | KeyCode::Char('D') => {
                    self.template = self.default_template.clone();
                    self.set_status("Template reset to default.", StatusKind::Info);
                }
                KeyCode::Char('+') | KeyCode::Char('a') => {
                    self.clear_status();
                    return Mode::AttachingFile(PathForm::default());
                }
                KeyCode::Char('-') | KeyCode::Delete => match self.attachments.remove_current() {
                    Some(path) => self.set_status(
                        format!("Removed {}.", display_name(&path)),
                        StatusKind::Info,
                    ),
                    None => self.set_status("No attachment selected.", StatusKind::Error),
                },
                KeyCode::Char('o') | KeyCode::Char('O') | KeyCode::Enter => {
                    match self.attachments.current().map(|path| path.to_path_buf()) {
                        Some(path) => {
                            if let Err(err) = open_path(&path) {
                                self.set_status(
                                    format!("Failed to open {}: {err}", display_name(&path)),
                                    StatusKind::Error,
                                );
                            } else {
                                self.set_status(
                                    format!("Opened {}.", display_name(&path)),
                                    StatusKind::Info,
                                );
                            }
                        }
                        None => self.set_status("No attachment selected.", StatusKind::Error),
                    }
                }
                KeyCode::Char('s') | KeyCode::Char('S') | KeyCode::Char('r') => {
                    return self.start_reminder();
                }
                KeyCode::Char('L') => return self.open_login(),
                _ => {}
            },
        }
        Mode::Normal
    }

    fn handle_add_building(&mut self, code: KeyCode, mut form: BuildingForm) -> Mode {
        match code {
            KeyCode::Esc => {
                self.set_status("Add building cancelled.", StatusKind::Info);
                return Mode::Normal;
            }
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.add_building(&form) {
                Ok(()) => return Mode::Normal,
                Err(message) => form.error = Some(message),
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }
        Mode::AddingBuilding(form)
    }

    fn handle_rename_building(
        &mut self,
        code: KeyCode,
        index: usize,
        mut form: BuildingForm,
    ) -> Mode {
        match code {
            KeyCode::Esc => {
                self.set_status("Edit cancelled.", StatusKind::Info);
                return Mode::Normal;
            }
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match form.parse_inputs() {
                Ok(name) => {
                    if let Some(building) = self.buildings.get_mut(index) {
                        if building.name != name {
                            building.name = name;
                            self.dirty = true;
                        }
                    }
                    self.set_status("Building renamed. Save to keep the change.", StatusKind::Info);
                    return Mode::Normal;
                }
                Err(err) => form.error = Some(self.report(err)),
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }
        Mode::RenamingBuilding { index, form }
    }

    fn handle_add_apartment(
        &mut self,
        code: KeyCode,
        building: usize,
        mut form: ApartmentForm,
    ) -> Mode {
        match code {
            KeyCode::Esc => {
                self.set_status("Add apartment cancelled.", StatusKind::Info);
                return Mode::Normal;
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.previous_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.add_apartment(building, &form) {
                Ok(()) => return Mode::Normal,
                Err(message) => form.error = Some(message),
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }
        Mode::AddingApartment { building, form }
    }

    fn handle_edit_apartment(
        &mut self,
        code: KeyCode,
        building: usize,
        apartment: usize,
        mut form: ApartmentForm,
    ) -> Mode {
        match code {
            KeyCode::Esc => {
                self.set_status("Edit cancelled.", StatusKind::Info);
                return Mode::Normal;
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.previous_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match form.parse_inputs() {
                Ok(draft) => {
                    if let Some(target) = self
                        .buildings
                        .get_mut(building)
                        .and_then(|b| b.apartments.get_mut(apartment))
                    {
                        target.apply(draft);
                        self.dirty = true;
                    }
                    self.set_status("Apartment updated. Save to keep the change.", StatusKind::Info);
                    return Mode::Normal;
                }
                Err(err) => form.error = Some(self.report(err)),
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }
        Mode::EditingApartment {
            building,
            apartment,
            form,
        }
    }

    fn handle_confirm_delete(&mut self, code: KeyCode, confirm: ConfirmDelete) -> Mode {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Mode::Normal
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                self.perform_delete(&confirm);
                Mode::Normal
            }
            _ => Mode::ConfirmDelete(confirm),
        }
    }

    fn handle_confirm_save(&mut self, code: KeyCode) -> Mode {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Save cancelled.", StatusKind::Info);
                Mode::Normal
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                self.save();
                Mode::Normal
            }
            _ => Mode::ConfirmSave,
        }
    }

    fn handle_confirm_exit(
        &mut self,
        code: KeyCode,
        mut confirm: ConfirmExit,
        exit: &mut bool,
    ) -> Mode {
        match code {
            KeyCode::Esc => Mode::Normal,
            KeyCode::Left | KeyCode::Up | KeyCode::BackTab => {
                confirm.previous();
                Mode::ConfirmExit(confirm)
            }
            KeyCode::Right | KeyCode::Down | KeyCode::Tab => {
                confirm.next();
                Mode::ConfirmExit(confirm)
            }
            KeyCode::Enter => {
                match confirm.selection {
                    ExitChoice::Save => {
                        if self.save() {
                            *exit = true;
                        }
                    }
                    ExitChoice::Discard => {
                        tracing::info!("discarding unsaved changes on exit");
                        *exit = true;
                    }
                    ExitChoice::Cancel => {}
                }
                Mode::Normal
            }
            _ => Mode::ConfirmExit(confirm),
        }
    }

    fn handle_confirm_send(&mut self, code: KeyCode, confirm: ConfirmSend) -> Mode {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Reminder cancelled.", StatusKind::Info);
                Mode::Normal
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                match reminder::send(
                    self.transport.as_ref(),
                    &confirm.reminder,
                    self.credentials.as_ref(),
                ) {
                    Ok(()) => {
                        self.set_status(
                            format!(
                                "The reminder email has been sent successfully to {}.",
                                confirm.reminder.to
                            ),
                            StatusKind::Info,
                        );
                        Mode::Normal
                    }
                    Err(LeaseError::MissingCredentials) => {
                        self.report(LeaseError::MissingCredentials);
                        self.open_login()
                    }
                    Err(err) => {
                        self.report(err);
                        Mode::Normal
                    }
                }
            }
            _ => Mode::ConfirmSend(confirm),
        }
    }

    fn handle_edit_template(&mut self, code: KeyCode, mut editor: TemplateEditor) -> Mode {
        match code {
            KeyCode::Esc => {
                if editor.text != self.template {
                    self.template = editor.text;
                    self.set_status("Template updated.", StatusKind::Info);
                }
                return Mode::Normal;
            }
            KeyCode::Enter => editor.newline(),
            KeyCode::Backspace => editor.backspace(),
            KeyCode::Char(ch) => editor.push_char(ch),
            _ => {}
        }
        Mode::EditingTemplate(editor)
    }

    fn handle_attach_file(&mut self, code: KeyCode, mut form: PathForm) -> Mode {
        match code {
            KeyCode::Esc => {
                self.set_status("Attach cancelled.", StatusKind::Info);
                return Mode::Normal;
            }
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match self.attachments.add(&form.path) {
                Ok(path) => {
                    self.set_status(format!("Attached {}.", display_name(&path)), StatusKind::Info);
                    return Mode::Normal;
                }
                Err(err) => form.error = Some(self.report(err)),
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }
        Mode::AttachingFile(form)
    }

    fn handle_login(&mut self, code: KeyCode, mut form: LoginForm) -> Mode {
        match code {
            KeyCode::Esc => {
                if self.credentials.is_none() {
                    self.set_status(
                        "Login skipped. Press 'L' before sending reminders.",
                        StatusKind::Info,
                    );
                }
                return Mode::Normal;
            }
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => form.toggle_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => match form.parse_inputs() {
                Ok(credentials) => {
                    tracing::info!(username = %credentials.username, "sender credentials set");
                    self.set_status(
                        format!("Signed in as {}.", credentials.username),
                        StatusKind::Info,
                    );
                    self.credentials = Some(credentials);
                    return Mode::Normal;
                }
                Err(err) => form.error = Some(self.report(err)),
            },
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }
        Mode::Login(form)
    }

    fn open_login(&mut self) -> Mode {
        let username = self
            .credentials
            .as_ref()
            .map(|credentials| credentials.username.as_str());
        Mode::Login(LoginForm::with_username(username))
    }

    fn start_reminder(&mut self) -> Mode {
        let selection = self.selected_apartment();
        match reminder::compose(
            selection,
            &self.template,
            &self.subject,
            self.attachments.files(),
        ) {
            Ok(reminder) => {
                self.clear_status();
                Mode::ConfirmSend(ConfirmSend { reminder })
            }
            Err(err) => {
                self.report(err);
                Mode::Normal
            }
        }
    }

    fn add_building(&mut self, form: &BuildingForm) -> std::result::Result<(), String> {
        let name = form.parse_inputs().map_err(|err| self.report(err))?;
        let row = insert_building(&self.conn, &name).map_err(|err| self.report_store(err))?;

        self.buildings.push(Building::new(row.id, row.name));
        let index = self.buildings.len() - 1;
        self.tree.focus(&self.buildings, TreeRow::Building(index));
        self.set_status(format!("Added building '{name}'."), StatusKind::Info);
        Ok(())
    }

    fn add_apartment(
        &mut self,
        building: usize,
        form: &ApartmentForm,
    ) -> std::result::Result<(), String> {
        let draft = form.parse_inputs().map_err(|err| self.report(err))?;
        let Some(building_id) = self.buildings.get(building).map(|b| b.id) else {
            return Err(self.report(LeaseError::NoBuildingSelected));
        };
        let row = insert_apartment(&self.conn, building_id, draft)
            .map_err(|err| self.report_store(err))?;

        let number = row.number.clone();
        let target = &mut self.buildings[building];
        target.apartments.push(Apartment::from(row));
        let row = TreeRow::Apartment(building, target.apartments.len() - 1);
        let name = target.name.clone();
        self.tree.focus(&self.buildings, row);
        self.set_status(
            format!("Added apartment {number} to {name}."),
            StatusKind::Info,
        );
        Ok(())
    }

    fn perform_delete(&mut self, confirm: &ConfirmDelete) {
        match confirm {
            ConfirmDelete::Building {
                index,
                name,
                apartments,
            } => {
                if *index < self.buildings.len() {
                    self.buildings.remove(*index);
                    self.dirty = true;
                    tracing::info!(name = %name, apartments, "deleted building");
                    self.set_status(
                        format!("Deleted '{name}' and {apartments} apartment(s). Save to apply."),
                        StatusKind::Info,
                    );
                }
            }
            ConfirmDelete::Apartment {
                building,
                apartment,
                label,
            } => {
                if let Some(target) = self.buildings.get_mut(*building) {
                    if *apartment < target.apartments.len() {
                        target.apartments.remove(*apartment);
                        self.dirty = true;
                        tracing::info!(label = %label, "deleted apartment");
                        self.set_status(
                            format!("Deleted {label}. Save to apply."),
                            StatusKind::Info,
                        );
                    }
                }
            }
        }
        self.tree.ensure_in_bounds(&self.buildings);
    }

    /// Flush the whole tree to the store. Returns whether it succeeded; on
    /// failure the tree and the dirty flag are left untouched.
    fn save(&mut self) -> bool {
        match save_portfolio(&mut self.conn, &self.buildings) {
            Ok(reloaded) => {
                self.tree.carry_over(&self.buildings, &reloaded);
                self.buildings = reloaded;
                self.dirty = false;
                self.set_status("Changes have been saved.", StatusKind::Info);
                true
            }
            Err(err) => {
                if let Some(validation) = err.downcast_ref::<LeaseError>() {
                    tracing::warn!(reason = %validation, "save rejected");
                    self.set_status(validation.to_string(), StatusKind::Error);
                } else {
                    self.report_store(err);
                }
                false
            }
        }
    }

    fn sort_apartments(&mut self) {
        let before: Vec<Vec<i64>> = self
            .buildings
            .iter()
            .map(|b| b.apartments.iter().map(|a| a.id).collect())
            .collect();
        for building in &mut self.buildings {
            building.sort_apartments();
        }
        let changed = self
            .buildings
            .iter()
            .zip(&before)
            .any(|(b, ids)| b.apartments.iter().map(|a| a.id).ne(ids.iter().copied()));
        if changed {
            self.dirty = true;
            self.set_status("Apartments sorted by number.", StatusKind::Info);
        } else {
            self.set_status("Apartments already in order.", StatusKind::Info);
        }
    }

    fn delete_target(&self, row: TreeRow) -> ConfirmDelete {
        match row {
            TreeRow::Building(index) => {
                let building = &self.buildings[index];
                ConfirmDelete::Building {
                    index,
                    name: building.name.clone(),
                    apartments: building.apartments.len(),
                }
            }
            TreeRow::Apartment(building, apartment) => ConfirmDelete::Apartment {
                building,
                apartment,
                label: self.buildings[building].apartments[apartment].label(),
            },
        }
    }

    fn current_row(&self) -> Option<TreeRow> {
        self.tree.current(&self.buildings)
    }

    fn selected_apartment(&self) -> Option<&Apartment> {
        match self.current_row()? {
            TreeRow::Apartment(building, apartment) => {
                self.buildings.get(building)?.apartments.get(apartment)
            }
            TreeRow::Building(_) => None,
        }
    }

    /// Show a validation failure in the footer and hand the text back for
    /// the open form.
    fn report(&mut self, err: LeaseError) -> String {
        tracing::warn!(reason = %err, "operation rejected");
        let message = err.to_string();
        self.set_status(message.clone(), StatusKind::Error);
        message
    }

    fn report_store(&mut self, err: anyhow::Error) -> String {
        tracing::error!(error = %format!("{err:#}"), "store operation failed");
        let message = surface_error(&err);
        self.set_status(message.clone(), StatusKind::Error);
        message
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let footer_height = FOOTER_HEIGHT.min(area.height);

        let (content_area, footer_area) = if area.height > footer_height {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(footer_height)])
                .split(area);
            (chunks[0], chunks[1])
        } else {
            (area, area)
        };

        match self.screen {
            Screen::Tree => self.draw_tree(frame, content_area),
            Screen::Reminder => self.draw_reminder(frame, content_area),
        }

        if area.height >= footer_height {
            self.draw_footer(frame, footer_area);
        }

        match &self.mode {
            Mode::AddingBuilding(form) => self.draw_building_form(frame, area, "Add Building", form),
            Mode::RenamingBuilding { form, .. } => {
                self.draw_building_form(frame, area, "Rename Building", form)
            }
            Mode::AddingApartment { building, form } => {
                let title = match self.buildings.get(*building) {
                    Some(b) => format!("Add Apartment to {}", b.name),
                    None => "Add Apartment".to_string(),
                };
                self.draw_apartment_form(frame, area, &title, form)
            }
            Mode::EditingApartment { form, .. } => {
                self.draw_apartment_form(frame, area, "Edit Apartment", form)
            }
            Mode::ConfirmDelete(confirm) => self.draw_confirm_delete(frame, area, confirm),
            Mode::ConfirmSave => self.draw_confirm_save(frame, area),
            Mode::ConfirmExit(confirm) => self.draw_confirm_exit(frame, area, confirm),
            Mode::ConfirmSend(confirm) => self.draw_confirm_send(frame, area, confirm),
            Mode::EditingTemplate(editor) => self.draw_template_editor(frame, area, editor),
            Mode::AttachingFile(form) => self.draw_path_form(frame, area, form),
            Mode::Login(form) => self.draw_login_form(frame, area, form),
            Mode::Normal => {}
        }
    }

    fn draw_tree(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0)])
            .split(area);

        let apartment_count: usize = self.buildings.iter().map(|b| b.apartments.len()).sum();
        let mut summary = vec![Span::styled(
            "Lease Navigator",
            Style::default().add_modifier(Modifier::BOLD),
        )];
        summary.push(Span::raw(format!(
            "   {} building(s), {} apartment(s)",
            self.buildings.len(),
            apartment_count
        )));
        if self.dirty {
            summary.push(Span::styled(
                "   [unsaved changes]",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ));
        }
        let header = Paragraph::new(Line::from(summary))
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Left);
        frame.render_widget(header, chunks[0]);

        if self.buildings.is_empty() {
            let message = Paragraph::new("No buildings yet. Press 'b' to add one.")
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL).title("Buildings"));
            frame.render_widget(message, chunks[1]);
            return;
        }

        let rows: Vec<Row> = self
            .tree
            .rows(&self.buildings)
            .into_iter()
            .map(|row| match row {
                TreeRow::Building(index) => {
                    let building = &self.buildings[index];
                    let marker = if self.tree.is_collapsed(building) {
                        "▸"
                    } else {
                        "▾"
                    };
                    Row::new(vec![Cell::from(format!(
                        "{marker} {} ({})",
                        building.name,
                        building.apartments.len()
                    ))])
                    .style(Style::default().add_modifier(Modifier::BOLD))
                }
                TreeRow::Apartment(b_idx, a_idx) => {
                    let apartment = &self.buildings[b_idx].apartments[a_idx];
                    let status = lease_status(&apartment.lease_end, self.today, self.warning_days);
                    Row::new(vec![
                        Cell::from(""),
                        Cell::from(apartment.number.clone()),
                        Cell::from(apartment.tenant.clone()),
                        Cell::from(apartment.email.clone()),
                        Cell::from(apartment.lease_start.clone()),
                        Cell::from(apartment.lease_end.clone()),
                    ])
                    .style(lease_style(status))
                }
            })
            .collect();

        let header_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let table = Table::new(
            rows,
            [
                Constraint::Length(26),
                Constraint::Length(10),
                Constraint::Length(20),
                Constraint::Min(20),
                Constraint::Length(12),
                Constraint::Length(12),
            ],
        )
        .header(
            Row::new(vec![
                "Building Name",
                "Apartment",
                "Name",
                "Email",
                "Lease Start",
                "Lease End",
            ])
            .style(header_style),
        )
        .block(Block::default().borders(Borders::ALL).title("Buildings"))
        .row_highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol("> ");

        let mut state = TableState::default().with_selected(Some(self.tree.selected));
        frame.render_stateful_widget(table, chunks[1], &mut state);
    }

    fn draw_reminder(&self, frame: &mut Frame, area: Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(area);

        let template = Paragraph::new(self.template.clone())
            .block(Block::default().borders(Borders::ALL).title("Email Template"))
            .wrap(Wrap { trim: false });
        frame.render_widget(template, columns[0]);

        let side = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Min(0)])
            .split(columns[1]);

        let recipient = match self.selected_apartment() {
            Some(apartment) => Line::from(format!(
                "To: {} <{}>",
                apartment.tenant, apartment.email
            )),
            None => Line::from(Span::styled(
                "Select an apartment on the tree screen.",
                Style::default().fg(Color::DarkGray),
            )),
        };
        let sender = match &self.credentials {
            Some(credentials) => Line::from(format!("From: {}", credentials.username)),
            None => Line::from(Span::styled(
                "Not signed in (press L).",
                Style::default().fg(Color::Red),
            )),
        };
        let details = Paragraph::new(vec![
            recipient,
            Line::from(format!("Subject: {}", self.subject)),
            sender,
        ])
        .block(Block::default().borders(Borders::ALL).title("Send Lease Reminder"))
        .wrap(Wrap { trim: true });
        frame.render_widget(details, side[0]);

        let block = Block::default().borders(Borders::ALL).title("Attachments");
        if self.attachments.is_empty() {
            let message = Paragraph::new("No files attached. Press '+' to add one.")
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(message, side[1]);
            return;
        }

        let items: Vec<ListItem> = self
            .attachments
            .files()
            .iter()
            .map(|path| ListItem::new(display_name(path)))
            .collect();
        let list = List::new(items)
            .block(block)
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");
        let mut state = ListState::default();
        state.select(Some(self.attachments.selected));
        frame.render_stateful_widget(list, side[1], &mut state);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let instructions = self.footer_instructions();

        let paragraph = Paragraph::new(vec![status_line, instructions]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let keys: &[(&str, &str)] = match (&self.screen, &self.mode) {
            (_, Mode::EditingTemplate(_)) => EDITOR_KEYS,
            (Screen::Tree, Mode::Normal | Mode::ConfirmSave | Mode::ConfirmDelete(_)) => TREE_KEYS,
            (Screen::Reminder, Mode::Normal) => REMINDER_KEYS,
            _ => FORM_KEYS,
        };

        let mut spans = Vec::with_capacity(keys.len() * 2);
        for (idx, (key, label)) in keys.iter().enumerate() {
            spans.push(Span::styled(*key, key_style));
            let suffix = if idx + 1 == keys.len() { "" } else { "   " };
            spans.push(Span::raw(format!(" {label}{suffix}")));
        }
        Line::from(spans)
    }

    fn draw_building_form(&self, frame: &mut Frame, area: Rect, title: &str, form: &BuildingForm) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = vec![form.build_line(), Line::from("")];
        lines.push(error_or_hint(
            form.error.as_deref(),
            "Enter to save • Esc to cancel",
        ));

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        let prefix = "Building Name: ".len() as u16;
        frame.set_cursor_position((inner.x + prefix + form.value_len() as u16, inner.y));
    }

    fn draw_apartment_form(
        &self,
        frame: &mut Frame,
        area: Rect,
        title: &str,
        form: &ApartmentForm,
    ) {
        let popup_area = centered_rect(70, 50, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines: Vec<Line> = ApartmentField::ALL
            .iter()
            .map(|field| form.build_line(*field))
            .collect();
        lines.push(Line::from(""));
        lines.push(error_or_hint(
            form.error.as_deref(),
            "Enter to save • Tab to switch • Esc to cancel",
        ));

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        let prefix = format!("{}: ", form.active.label()).len() as u16;
        frame.set_cursor_position((
            inner.x + prefix + form.value_len(form.active) as u16,
            inner.y + form.active.row(),
        ));
    }

    fn draw_confirm_delete(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmDelete) {
        let (question, detail) = match confirm {
            ConfirmDelete::Building {
                name, apartments, ..
            } => (
                format!("Delete building '{name}'?"),
                format!("This will also delete its {apartments} apartment(s)."),
            ),
            ConfirmDelete::Apartment { label, .. } => (
                format!("Delete {label}?"),
                "The tenant's lease details will be removed.".to_string(),
            ),
        };
        self.draw_yes_no(frame, area, "Confirm Deletion", vec![
            Line::from(question),
            Line::from(detail),
            Line::from("Nothing is written until you save."),
        ]);
    }

    fn draw_confirm_save(&self, frame: &mut Frame, area: Rect) {
        let detail = if self.dirty {
            "The stored data will be replaced with what you see."
        } else {
            "There are no unsaved edits; the data will be rewritten as is."
        };
        self.draw_yes_no(frame, area, "Save Changes", vec![
            Line::from("Are you sure you want to save the changes?"),
            Line::from(detail),
        ]);
    }

    fn draw_yes_no(&self, frame: &mut Frame, area: Rect, title: &str, mut lines: Vec<Line<'static>>) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title.to_string()).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Press Y to confirm or N / Esc to cancel.",
            Style::default().fg(Color::Gray),
        )));

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn draw_confirm_exit(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmExit) {
        let popup_area = centered_rect(70, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Exit").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut option_spans = Vec::new();
        for (idx, label) in confirm.labels().iter().enumerate() {
            if idx > 0 {
                option_spans.push(Span::raw("   "));
            }
            let style = if confirm.selected_index() == idx {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            option_spans.push(Span::styled(*label, style));
        }

        let lines = vec![
            Line::from("Do you want to save the changes before exiting?"),
            Line::from(""),
            Line::from(option_spans),
            Line::from(""),
            Line::from(Span::styled(
                "Use ←/→ to choose • Enter to confirm • Esc to cancel",
                Style::default().fg(Color::Gray),
            )),
        ];

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn draw_confirm_send(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmSend) {
        let popup_area = centered_rect(80, 70, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Send Lease Reminder")
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let reminder = &confirm.reminder;
        let mut lines = vec![
            Line::from(format!("To: {}", reminder.to)),
            Line::from(format!("Subject: {}", reminder.subject)),
            Line::from(format!("Attachments: {}", reminder.attachments.len())),
            Line::from(""),
        ];
        lines.extend(reminder.body.lines().map(|line| Line::from(line.to_string())));
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Press Y to send or N / Esc to cancel.",
            Style::default().fg(Color::Gray),
        )));

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });
        frame.render_widget(paragraph, inner);
    }

    fn draw_template_editor(&self, frame: &mut Frame, area: Rect, editor: &TemplateEditor) {
        let popup_area = centered_rect(80, 70, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Edit Template ({Name}, {Lease Start}, {Lease End})")
            .borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let paragraph = Paragraph::new(editor.text.clone());
        frame.render_widget(paragraph, inner);

        let (col, row) = editor.cursor_offset();
        frame.set_cursor_position((inner.x + col, inner.y + row));
    }

    fn draw_path_form(&self, frame: &mut Frame, area: Rect, form: &PathForm) {
        let popup_area = centered_rect(70, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Attach File").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            Line::from(vec![
                Span::raw("Path: "),
                Span::styled(form.path.clone(), Style::default().fg(Color::Yellow)),
            ]),
            Line::from(""),
            error_or_hint(form.error.as_deref(), "Enter to attach • Esc to cancel"),
        ];
        let paragraph = Paragraph::new(lines);
        frame.render_widget(paragraph, inner);

        let prefix = "Path: ".len() as u16;
        frame.set_cursor_position((
            inner.x + prefix + form.path.chars().count() as u16,
            inner.y,
        ));
    }

    fn draw_login_form(&self, frame: &mut Frame, area: Rect, form: &LoginForm) {
        let popup_area = centered_rect(60, 35, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Login").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            form.build_line(LoginField::Username),
            form.build_line(LoginField::Secret),
            Line::from(""),
            error_or_hint(
                form.error.as_deref(),
                "Enter to sign in • Tab to switch • Esc to skip",
            ),
        ];
        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        let (col, row) = form.cursor_offset();
        frame.set_cursor_position((inner.x + col, inner.y + row));
    }
}

/// Red error text when present, otherwise a gray key hint.
fn error_or_hint(error: Option<&str>, hint: &'static str) -> Line<'static> {
    match error {
        Some(error) => Line::from(Span::styled(
            error.to_string(),
            Style::default().fg(Color::Red),
        )),
        None => Line::from(Span::styled(hint, Style::default().fg(Color::Gray))),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::rc::Rc;

    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    use super::*;
    use crate::db::{create_schema, list_buildings};
    use crate::reminder::testing::RecordingTransport;
    use crate::sync::load_portfolio;

    fn config() -> AppConfig {
        let mut config = AppConfig::default();
        config.mail.username = Some("pm@example.com".into());
        config.mail.password = Some("pw".into());
        config
    }

    fn app_with(config: &AppConfig) -> (App, Rc<RecordingTransport>) {
        let conn = Connection::open_in_memory().unwrap();
        create_schema(&conn).unwrap();
        let transport = Rc::new(RecordingTransport::default());
        let app = App::new(conn, Vec::new(), config, Box::new(Rc::clone(&transport)));
        (app, transport)
    }

    fn app() -> (App, Rc<RecordingTransport>) {
        app_with(&config())
    }

    fn press(app: &mut App, code: KeyCode) -> bool {
        app.handle_key(code).unwrap()
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            press(app, KeyCode::Char(ch));
        }
    }

    fn replace_field(app: &mut App, text: &str) {
        for _ in 0..12 {
            press(app, KeyCode::Backspace);
        }
        type_text(app, text);
    }

    fn apartment_rows(app: &App) -> i64 {
        app.conn
            .query_row("SELECT COUNT(*) FROM apartments", [], |row| row.get(0))
            .unwrap()
    }

    fn status_text(app: &App) -> String {
        app.status
            .as_ref()
            .map(|status| status.text.clone())
            .unwrap_or_default()
    }

    fn add_oak_hall_with_tenant(app: &mut App) {
        press(app, KeyCode::Char('b'));
        type_text(app, "Oak Hall");
        press(app, KeyCode::Enter);

        press(app, KeyCode::Char('a'));
        type_text(app, "1A");
        press(app, KeyCode::Tab);
        type_text(app, "J. Doe");
        press(app, KeyCode::Tab);
        type_text(app, "j@x.com");
        press(app, KeyCode::Tab);
        replace_field(app, "01/01/2024");
        press(app, KeyCode::Tab);
        replace_field(app, "12/31/2024");
        press(app, KeyCode::Enter);
    }

    #[test]
    fn starts_on_login_without_configured_credentials() {
        let (mut app, _) = app_with(&AppConfig::default());
        assert!(matches!(app.mode, Mode::Login(_)));
        type_text(&mut app, "pm@example.com");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "secret");
        press(&mut app, KeyCode::Enter);
        assert!(matches!(app.mode, Mode::Normal));
        assert_eq!(
            app.credentials,
            Some(SenderCredentials::new("pm@example.com", "secret"))
        );
    }

    #[test]
    fn add_save_reload_round_trip() {
        let (mut app, _) = app();
        add_oak_hall_with_tenant(&mut app);
        assert!(matches!(app.mode, Mode::Normal), "{}", status_text(&app));

        press(&mut app, KeyCode::Char('w'));
        press(&mut app, KeyCode::Char('y'));
        assert_eq!(status_text(&app), "Changes have been saved.");

        let reloaded = load_portfolio(&app.conn).unwrap();
        assert_eq!(reloaded, app.buildings);
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded[0].name, "Oak Hall");
        let apartment = &reloaded[0].apartments[0];
        assert_eq!(
            (
                apartment.number.as_str(),
                apartment.tenant.as_str(),
                apartment.email.as_str(),
                apartment.lease_start.as_str(),
                apartment.lease_end.as_str()
            ),
            ("1A", "J. Doe", "j@x.com", "01/01/2024", "12/31/2024")
        );
    }

    #[test]
    fn add_apartment_without_building_is_rejected() {
        let (mut app, _) = app();
        press(&mut app, KeyCode::Char('a'));
        assert!(matches!(app.mode, Mode::Normal));
        assert_eq!(status_text(&app), "Please select a building.");
        assert_eq!(apartment_rows(&app), 0);
    }

    #[test]
    fn blank_building_name_keeps_form_open() {
        let (mut app, _) = app();
        press(&mut app, KeyCode::Char('b'));
        type_text(&mut app, "   ");
        press(&mut app, KeyCode::Enter);
        assert!(matches!(
            &app.mode,
            Mode::AddingBuilding(form) if form.error.as_deref() == Some("Building name cannot be empty.")
        ));
        assert!(list_buildings(&app.conn).unwrap().is_empty());
    }

    #[test]
    fn rename_to_blank_is_rejected() {
        let (mut app, _) = app();
        press(&mut app, KeyCode::Char('b'));
        type_text(&mut app, "Oak");
        press(&mut app, KeyCode::Enter);

        press(&mut app, KeyCode::Char('e'));
        for _ in 0..3 {
            press(&mut app, KeyCode::Backspace);
        }
        press(&mut app, KeyCode::Enter);
        assert!(matches!(app.mode, Mode::RenamingBuilding { .. }));
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.buildings[0].name, "Oak");
        assert!(!app.dirty);
    }

    #[test]
    fn reminder_without_selection_leaves_state_alone() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("notice.pdf");
        std::fs::write(&file, b"pdf").unwrap();

        let (mut app, transport) = app();
        app.attachments.add(file.to_str().unwrap()).unwrap();
        app.template = "{Name} owes rent".into();

        press(&mut app, KeyCode::Char('r'));
        assert!(matches!(app.mode, Mode::Normal));
        assert_eq!(status_text(&app), "Please select an apartment.");
        assert_eq!(app.template, "{Name} owes rent");
        assert_eq!(app.attachments.files(), &[file]);
        assert!(transport.sent.borrow().is_empty());
    }

    #[test]
    fn reminder_on_a_building_row_is_refused() {
        let (mut app, transport) = app();
        add_oak_hall_with_tenant(&mut app);
        press(&mut app, KeyCode::Home);
        press(&mut app, KeyCode::Char('r'));
        assert_eq!(status_text(&app), "Please select an apartment.");
        assert!(transport.sent.borrow().is_empty());
    }

    #[test]
    fn reminder_is_sent_after_confirmation() {
        let (mut app, transport) = app();
        add_oak_hall_with_tenant(&mut app);
        app.template = "{Name} owes rent".into();

        press(&mut app, KeyCode::Char('r'));
        assert!(matches!(app.mode, Mode::ConfirmSend(_)));
        press(&mut app, KeyCode::Char('y'));

        let sent = transport.sent.borrow();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "j@x.com");
        assert_eq!(sent[0].body, "J. Doe owes rent");
        assert_eq!(sent[0].subject, "Lease Expiration Reminder");
    }

    #[test]
    fn send_without_credentials_opens_login() {
        let (mut app, transport) = app_with(&AppConfig::default());
        press(&mut app, KeyCode::Esc);
        add_oak_hall_with_tenant(&mut app);

        press(&mut app, KeyCode::Char('r'));
        press(&mut app, KeyCode::Char('y'));
        assert!(matches!(app.mode, Mode::Login(_)));
        assert!(transport.sent.borrow().is_empty());
    }

    #[test]
    fn failed_send_is_reported() {
        let conn = Connection::open_in_memory().unwrap();
        create_schema(&conn).unwrap();
        let mut app = App::new(
            conn,
            Vec::new(),
            &config(),
            Box::new(RecordingTransport::failing("connection refused")),
        );
        add_oak_hall_with_tenant(&mut app);
        press(&mut app, KeyCode::Char('r'));
        press(&mut app, KeyCode::Enter);
        assert_eq!(
            status_text(&app),
            "An error occurred while sending the email: connection refused"
        );
    }

    #[test]
    fn deleting_a_building_cascades_on_save() {
        let (mut app, _) = app();
        add_oak_hall_with_tenant(&mut app);
        press(&mut app, KeyCode::Home);
        press(&mut app, KeyCode::Char('-'));
        assert!(matches!(
            app.mode,
            Mode::ConfirmDelete(ConfirmDelete::Building { apartments: 1, .. })
        ));
        press(&mut app, KeyCode::Char('y'));
        assert!(app.dirty);
        assert_eq!(apartment_rows(&app), 1);

        press(&mut app, KeyCode::Char('w'));
        press(&mut app, KeyCode::Enter);
        assert!(!app.dirty);
        assert_eq!(apartment_rows(&app), 0);
        assert!(list_buildings(&app.conn).unwrap().is_empty());
    }

    #[test]
    fn quitting_with_unsaved_edits_prompts() {
        let (mut app, _) = app();
        add_oak_hall_with_tenant(&mut app);
        press(&mut app, KeyCode::Char('-'));
        press(&mut app, KeyCode::Char('y'));

        assert!(!press(&mut app, KeyCode::Char('q')));
        assert!(matches!(app.mode, Mode::ConfirmExit(_)));
        press(&mut app, KeyCode::Esc);
        assert!(matches!(app.mode, Mode::Normal));

        press(&mut app, KeyCode::Char('q'));
        press(&mut app, KeyCode::Right);
        assert!(press(&mut app, KeyCode::Enter));
        assert_eq!(apartment_rows(&app), 1);
    }

    #[test]
    fn save_and_quit_writes_before_exiting() {
        let (mut app, _) = app();
        add_oak_hall_with_tenant(&mut app);
        press(&mut app, KeyCode::Char('-'));
        press(&mut app, KeyCode::Char('y'));
        press(&mut app, KeyCode::Char('q'));
        assert!(press(&mut app, KeyCode::Enter));
        assert_eq!(apartment_rows(&app), 0);
    }

    #[test]
    fn quitting_clean_exits_immediately() {
        let (mut by_key, _) = app();
        assert!(press(&mut by_key, KeyCode::Char('q')));

        let (mut by_ctrl_c, _) = app();
        assert!(by_ctrl_c.handle_ctrl_c());
    }

    #[test]
    fn editing_an_apartment_marks_the_tree_dirty() {
        let (mut app, _) = app();
        add_oak_hall_with_tenant(&mut app);
        press(&mut app, KeyCode::Char('e'));
        press(&mut app, KeyCode::Tab);
        replace_field(&mut app, "Jane Doe");
        press(&mut app, KeyCode::Enter);
        assert!(app.dirty);
        assert_eq!(app.buildings[0].apartments[0].tenant, "Jane Doe");
        assert_eq!(
            load_portfolio(&app.conn).unwrap()[0].apartments[0].tenant,
            "J. Doe"
        );
    }

    #[test]
    fn template_edits_and_reset() {
        let (mut app, _) = app();
        press(&mut app, KeyCode::Char('t'));
        press(&mut app, KeyCode::Char('e'));
        for _ in 0..app.template.chars().count() {
            press(&mut app, KeyCode::Backspace);
        }
        type_text(&mut app, "Hi {Name}");
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.template, "Hi {Name}");

        press(&mut app, KeyCode::Char('d'));
        assert_eq!(app.template, crate::reminder::DEFAULT_TEMPLATE);
    }

    #[test]
    fn attach_and_remove_files() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("lease.pdf");
        std::fs::write(&file, b"pdf").unwrap();

        let (mut app, _) = app();
        press(&mut app, KeyCode::Char('t'));
        press(&mut app, KeyCode::Char('+'));
        type_text(&mut app, "/definitely/not/here.pdf");
        press(&mut app, KeyCode::Enter);
        assert!(matches!(app.mode, Mode::AttachingFile(_)));
        press(&mut app, KeyCode::Esc);

        press(&mut app, KeyCode::Char('+'));
        type_text(&mut app, file.to_str().unwrap());
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.attachments.files(), &[PathBuf::from(&file)]);

        press(&mut app, KeyCode::Char('-'));
        assert!(app.attachments.is_empty());
    }

    #[test]
    fn sorting_orders_apartment_numbers_naturally() {
        let (mut app, _) = app();
        add_oak_hall_with_tenant(&mut app);
        app.buildings[0].apartments[0].number = "10".into();
        let mut second = app.buildings[0].apartments[0].clone();
        second.id = 99;
        second.number = "2".into();
        app.buildings[0].apartments.push(second);

        press(&mut app, KeyCode::Char('o'));
        let numbers: Vec<&str> = app.buildings[0]
            .apartments
            .iter()
            .map(|a| a.number.as_str())
            .collect();
        assert_eq!(numbers, vec!["2", "10"]);
        assert!(app.dirty);
    }

    #[test]
    fn draws_every_screen_without_panicking() {
        let (mut app, _) = app();
        add_oak_hall_with_tenant(&mut app);
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|frame| app.draw(frame)).unwrap();

        let rendered: String = terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect();
        assert!(rendered.contains("Oak Hall"));
        assert!(rendered.contains("j@x.com"));

        press(&mut app, KeyCode::Char('r'));
        terminal.draw(|frame| app.draw(frame)).unwrap();
        press(&mut app, KeyCode::Esc);
        press(&mut app, KeyCode::Char('t'));
        terminal.draw(|frame| app.draw(frame)).unwrap();
        press(&mut app, KeyCode::Char('e'));
        terminal.draw(|frame| app.draw(frame)).unwrap();
    }
}
