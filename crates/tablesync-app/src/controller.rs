// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Keeps a row collection, one modal form, and the notification area in
//! step with a remote REST resource.
//!
//! The controller never performs I/O. Each operation returns [`SyncEvent`]s:
//! `Send` asks the runtime to issue a request, everything else describes a
//! view change. The runtime reports back through [`SyncController::complete`]
//! with the ticket it was given. Completions may arrive in any order and the
//! last one to land wins.

use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::i18n::{ADD_TITLE, CONFIRM_DELETE, DELETED, EDIT_TITLE, SAVED, SEARCH};
use crate::{
    FieldSpec, FormPayload, FormState, ModalMode, Notification, NotificationCenter,
    RenderOptions, ResourceError, Row, RowCollection, RowId, Ticket,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    List,
    Get(RowId),
    Save(FormPayload),
    Delete(RowId),
}

impl Request {
    pub const fn method(&self) -> &'static str {
        match self {
            Self::List | Self::Get(_) => "GET",
            Self::Save(_) => "POST",
            Self::Delete(_) => "DELETE",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Rows(Vec<Row>),
    Row(Row),
    Done,
}

pub type Outcome = Result<Response, ResourceError>;

#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    Send { ticket: Ticket, request: Request },
    TableRedrawn { rows: usize },
    ModalOpened { mode: ModalMode, title: String },
    ModalClosed,
    ConfirmRequested { id: RowId, prompt: String },
    ConfirmDismissed,
    Notified(Notification),
    NotificationClosed { token: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modal {
    pub mode: ModalMode,
    pub title: String,
    pub form: FormState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    Refresh,
    Edit(RowId),
    Save,
    Delete(RowId),
}

#[derive(Debug, Clone)]
pub struct SyncController {
    resource_url: String,
    options: RenderOptions,
    rows: RowCollection,
    modal: Option<Modal>,
    pending_delete: Option<RowId>,
    notifications: NotificationCenter,
    in_flight: BTreeMap<Ticket, Pending>,
    last_ticket: Ticket,
}

impl SyncController {
    /// Configures the endpoint and issues the initial fetch.
    pub fn initialize(resource_url: &str, options: RenderOptions) -> (Self, Vec<SyncEvent>) {
        let mut controller = Self {
            resource_url: resource_url.trim_end_matches('/').to_owned(),
            options,
            rows: RowCollection::default(),
            modal: None,
            pending_delete: None,
            notifications: NotificationCenter::default(),
            in_flight: BTreeMap::new(),
            last_ticket: Ticket::new(0),
        };
        debug!(url = %controller.resource_url, "table sync initialized");
        let events = controller.refresh();
        (controller, events)
    }

    pub fn resource_url(&self) -> &str {
        &self.resource_url
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn columns(&self) -> &[FieldSpec] {
        &self.options.columns
    }

    pub fn string<'a>(&'a self, key: &'a str) -> &'a str {
        self.options.strings.get(key)
    }

    pub fn search_label(&self) -> &str {
        self.string(SEARCH)
    }

    pub fn rows(&self) -> &RowCollection {
        &self.rows
    }

    pub fn modal(&self) -> Option<&Modal> {
        self.modal.as_ref()
    }

    pub fn pending_delete(&self) -> Option<RowId> {
        self.pending_delete
    }

    pub fn notification(&self) -> Option<&Notification> {
        self.notifications.active()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn refresh(&mut self) -> Vec<SyncEvent> {
        vec![self.issue(Pending::Refresh, Request::List)]
    }

    pub fn open_create_form(&mut self) -> Vec<SyncEvent> {
        let title = self.string(ADD_TITLE).to_owned();
        self.modal = Some(Modal {
            mode: ModalMode::Create,
            title: title.clone(),
            form: FormState::blank(&self.options.form_fields),
        });
        vec![SyncEvent::ModalOpened {
            mode: ModalMode::Create,
            title,
        }]
    }

    pub fn open_edit_form(&mut self, id: RowId) -> Vec<SyncEvent> {
        vec![self.issue(Pending::Edit(id), Request::Get(id))]
    }

    /// Asks for confirmation; nothing is sent until [`Self::confirm_delete`].
    pub fn delete_row(&mut self, id: RowId) -> Vec<SyncEvent> {
        self.pending_delete = Some(id);
        vec![SyncEvent::ConfirmRequested {
            id,
            prompt: self.string(CONFIRM_DELETE).to_owned(),
        }]
    }

    pub fn confirm_delete(&mut self) -> Vec<SyncEvent> {
        match self.pending_delete.take() {
            Some(id) => vec![self.issue(Pending::Delete(id), Request::Delete(id))],
            None => Vec::new(),
        }
    }

    pub fn cancel_delete(&mut self) -> Vec<SyncEvent> {
        match self.pending_delete.take() {
            Some(_) => vec![SyncEvent::ConfirmDismissed],
            None => Vec::new(),
        }
    }

    /// Edits one form input. No effect while the modal is closed.
    pub fn set_field(&mut self, name: &str, value: &str) -> bool {
        self.modal
            .as_mut()
            .is_some_and(|modal| modal.form.set(name, value))
    }

    pub fn close_form(&mut self) -> Vec<SyncEvent> {
        match self.modal.take() {
            Some(_) => vec![SyncEvent::ModalClosed],
            None => Vec::new(),
        }
    }

    /// Posts whatever the form currently holds. The modal stays open until
    /// the server accepts it.
    pub fn save(&mut self) -> Vec<SyncEvent> {
        let Some(modal) = &self.modal else {
            debug!("save ignored: modal is closed");
            return Vec::new();
        };
        let payload = modal.form.payload(modal.mode);
        vec![self.issue(Pending::Save, Request::Save(payload))]
    }

    /// Auto-dismiss for a success notification.
    pub fn expire(&mut self, token: u64) -> Vec<SyncEvent> {
        if self.notifications.expire(token) {
            vec![SyncEvent::NotificationClosed { token }]
        } else {
            Vec::new()
        }
    }

    pub fn complete(&mut self, ticket: Ticket, outcome: Outcome) -> Vec<SyncEvent> {
        let Some(pending) = self.in_flight.remove(&ticket) else {
            debug!(%ticket, "completion for unknown ticket ignored");
            return Vec::new();
        };

        match outcome {
            Ok(response) => self.apply(pending, response),
            Err(error) => self.fail(pending, &error),
        }
    }

    fn apply(&mut self, pending: Pending, response: Response) -> Vec<SyncEvent> {
        match (pending, response) {
            (Pending::Refresh, Response::Rows(rows)) => {
                if let Some(error) = self.check_rows(&rows) {
                    return self.fail(pending, &error);
                }
                self.adopt_columns(&rows);
                debug!(rows = rows.len(), "table refreshed");
                self.rows.replace(rows);
                let mut events = self.close_error();
                events.push(SyncEvent::TableRedrawn {
                    rows: self.rows.len(),
                });
                events
            }
            (Pending::Edit(id), Response::Row(row)) => {
                if row.id != id {
                    let error = ResourceError::Decode(format!(
                        "requested row {id} but the server returned row {}",
                        row.id
                    ));
                    return self.fail(pending, &error);
                }
                if let Some(error) = self.check_rows(std::slice::from_ref(&row)) {
                    return self.fail(pending, &error);
                }
                let title = self.string(EDIT_TITLE).to_owned();
                self.modal = Some(Modal {
                    mode: ModalMode::Edit(id),
                    title: title.clone(),
                    form: FormState::from_row(&self.options.form_fields, &row),
                });
                let mut events = self.close_error();
                events.push(SyncEvent::ModalOpened {
                    mode: ModalMode::Edit(id),
                    title,
                });
                events
            }
            (Pending::Save, Response::Done) => {
                let mut events = Vec::new();
                if self.modal.take().is_some() {
                    events.push(SyncEvent::ModalClosed);
                }
                events.extend(self.refresh());
                events.extend(self.succeed(SAVED));
                events
            }
            (Pending::Delete(_), Response::Done) => {
                let mut events = self.refresh();
                events.extend(self.succeed(DELETED));
                events
            }
            (pending, response) => {
                let error = ResourceError::Decode(format!(
                    "response {} does not match request {pending:?}",
                    response_kind(&response)
                ));
                self.fail(pending, &error)
            }
        }
    }

    /// Every failed request lands here, whichever operation issued it.
    fn fail(&mut self, pending: Pending, error: &ResourceError) -> Vec<SyncEvent> {
        warn!(request = ?pending, %error, "request failed");
        let mut events = self.close_active();
        events.push(SyncEvent::Notified(
            self.notifications.error(error.notification_text()),
        ));
        events
    }

    fn succeed(&mut self, key: &str) -> Vec<SyncEvent> {
        let text = self.string(key).to_owned();
        let mut events = self.close_active();
        events.push(SyncEvent::Notified(self.notifications.success(text)));
        events
    }

    fn close_active(&self) -> Vec<SyncEvent> {
        self.notifications
            .active()
            .map(|note| SyncEvent::NotificationClosed { token: note.token })
            .into_iter()
            .collect()
    }

    fn close_error(&mut self) -> Vec<SyncEvent> {
        self.notifications
            .close_error()
            .map(|token| SyncEvent::NotificationClosed { token })
            .into_iter()
            .collect()
    }

    /// With no declared columns, the first listed row decides them. Form
    /// fields follow the columns unless they were declared separately.
    fn adopt_columns(&mut self, rows: &[Row]) {
        if !self.options.columns.is_empty() {
            return;
        }
        let Some(first) = rows.first() else {
            return;
        };
        self.options.columns = first
            .fields
            .keys()
            .map(|name| FieldSpec::new(name, ""))
            .collect();
        if self.options.form_fields.is_empty() {
            self.options.form_fields = self.options.columns.clone();
        }
        debug!(columns = self.options.columns.len(), "columns taken from first row");
    }

    fn check_rows(&self, rows: &[Row]) -> Option<ResourceError> {
        rows.iter().find_map(|row| {
            let missing = row.missing_columns(&self.options.columns);
            (!missing.is_empty()).then(|| {
                ResourceError::Decode(format!(
                    "row {} is missing column(s): {}",
                    row.id,
                    missing.join(", ")
                ))
            })
        })
    }

    fn issue(&mut self, pending: Pending, request: Request) -> SyncEvent {
        self.last_ticket = self.last_ticket.next();
        let ticket = self.last_ticket;
        self.in_flight.insert(ticket, pending);
        debug!(%ticket, method = request.method(), url = %self.resource_url, "request issued");
        SyncEvent::Send { ticket, request }
    }
}

fn response_kind(response: &Response) -> &'static str {
    match response {
        Response::Rows(_) => "rows",
        Response::Row(_) => "row",
        Response::Done => "done",
    }
}
