// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row as TableRow, Table, Wrap};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use tablesync_app::{
    Modal, NotificationKind, Outcome, Request, Resource, Row, RowId, SyncController, SyncEvent,
    Ticket, execute as execute_request,
};
use tracing::debug;

const TOAST_WIDTH: u16 = 48;

#[derive(Debug)]
pub enum InternalEvent {
    Completed { ticket: Ticket, outcome: Outcome },
    Expire { token: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct SearchState {
    editing: bool,
    query: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct ViewData {
    selected: usize,
    form_cursor: usize,
    search: SearchState,
}

#[derive(Debug, Clone, PartialEq, Default)]
struct KeyOutcome {
    events: Vec<SyncEvent>,
    quit: bool,
}

impl KeyOutcome {
    fn events(events: Vec<SyncEvent>) -> Self {
        Self {
            events,
            quit: false,
        }
    }
}

/// Runs the table until the user quits. Requests go to a worker thread that
/// owns `resource`; completions come back over a channel so the event loop
/// keeps drawing while a request is in flight.
pub fn run_app<R>(
    mut controller: SyncController,
    initial: Vec<SyncEvent>,
    resource: R,
) -> Result<()>
where
    R: Resource + Send + 'static,
{
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let (internal_tx, internal_rx) = mpsc::channel();
    let (request_tx, request_rx) = mpsc::channel();
    spawn_worker(resource, request_rx, internal_tx.clone());

    let mut view_data = ViewData::default();
    apply_events(&controller, &mut view_data, &request_tx, &internal_tx, initial);

    let mut result = Ok(());
    loop {
        process_internal_events(
            &mut controller,
            &mut view_data,
            &request_tx,
            &internal_tx,
            &internal_rx,
        );

        if let Err(error) = terminal.draw(|frame| render(frame, &controller, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = event::poll(Duration::from_millis(120)).context("poll event")?;
        if has_event && let Event::Key(key) = event::read().context("read event")? {
            let outcome = handle_key_event(&mut controller, &mut view_data, key);
            apply_events(
                &controller,
                &mut view_data,
                &request_tx,
                &internal_tx,
                outcome.events,
            );
            if outcome.quit {
                break;
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn spawn_worker<R>(
    mut resource: R,
    requests: Receiver<(Ticket, Request)>,
    tx: Sender<InternalEvent>,
) where
    R: Resource + Send + 'static,
{
    thread::spawn(move || {
        for (ticket, request) in requests {
            let outcome = execute_request(&mut resource, &request);
            if tx.send(InternalEvent::Completed { ticket, outcome }).is_err() {
                break;
            }
        }
    });
}

fn process_internal_events(
    controller: &mut SyncController,
    view_data: &mut ViewData,
    request_tx: &Sender<(Ticket, Request)>,
    internal_tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        let events = match event {
            InternalEvent::Completed { ticket, outcome } => controller.complete(ticket, outcome),
            InternalEvent::Expire { token } => controller.expire(token),
        };
        apply_events(controller, view_data, request_tx, internal_tx, events);
    }
}

fn apply_events(
    controller: &SyncController,
    view_data: &mut ViewData,
    request_tx: &Sender<(Ticket, Request)>,
    internal_tx: &Sender<InternalEvent>,
    events: Vec<SyncEvent>,
) {
    for event in events {
        match event {
            SyncEvent::Send { ticket, request } => {
                if request_tx.send((ticket, request)).is_err() {
                    debug!(%ticket, "request dropped: worker stopped");
                }
            }
            SyncEvent::Notified(note) => {
                if let Some(timeout) = note.timeout {
                    schedule_expire(internal_tx, note.token, timeout);
                }
            }
            SyncEvent::TableRedrawn { .. } => clamp_selection(controller, view_data),
            SyncEvent::ModalOpened { .. } => view_data.form_cursor = 0,
            SyncEvent::ModalClosed
            | SyncEvent::ConfirmRequested { .. }
            | SyncEvent::ConfirmDismissed
            | SyncEvent::NotificationClosed { .. } => {}
        }
    }
}

fn schedule_expire(internal_tx: &Sender<InternalEvent>, token: u64, timeout: Duration) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(timeout);
        let _ = sender.send(InternalEvent::Expire { token });
    });
}

fn visible_rows<'a>(controller: &'a SyncController, view_data: &ViewData) -> Vec<&'a Row> {
    controller
        .rows()
        .filtered(&view_data.search.query, controller.columns())
}

fn selected_row_id(controller: &SyncController, view_data: &ViewData) -> Option<RowId> {
    visible_rows(controller, view_data)
        .get(view_data.selected)
        .map(|row| row.id)
}

fn clamp_selection(controller: &SyncController, view_data: &mut ViewData) {
    let len = visible_rows(controller, view_data).len();
    view_data.selected = view_data.selected.min(len.saturating_sub(1));
}

fn move_selection(controller: &SyncController, view_data: &mut ViewData, delta: isize) {
    let len = visible_rows(controller, view_data).len();
    if len == 0 {
        view_data.selected = 0;
        return;
    }
    let next = (view_data.selected as isize + delta).clamp(0, len as isize - 1);
    view_data.selected = next as usize;
}

fn handle_key_event(
    controller: &mut SyncController,
    view_data: &mut ViewData,
    key: KeyEvent,
) -> KeyOutcome {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return KeyOutcome {
            events: Vec::new(),
            quit: true,
        };
    }

    if controller.pending_delete().is_some() {
        return KeyOutcome::events(match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => controller.confirm_delete(),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => controller.cancel_delete(),
            _ => Vec::new(),
        });
    }

    if controller.modal().is_some() {
        return KeyOutcome::events(handle_form_key(controller, view_data, key));
    }

    if view_data.search.editing {
        handle_search_key(controller, view_data, key);
        return KeyOutcome::default();
    }

    let events = match key.code {
        KeyCode::Char('q') => {
            return KeyOutcome {
                events: Vec::new(),
                quit: true,
            };
        }
        KeyCode::Char('j') | KeyCode::Down => {
            move_selection(controller, view_data, 1);
            Vec::new()
        }
        KeyCode::Char('k') | KeyCode::Up => {
            move_selection(controller, view_data, -1);
            Vec::new()
        }
        KeyCode::Char('a') => controller.open_create_form(),
        KeyCode::Char('e') | KeyCode::Enter => match selected_row_id(controller, view_data) {
            Some(id) => controller.open_edit_form(id),
            None => Vec::new(),
        },
        KeyCode::Char('d') => match selected_row_id(controller, view_data) {
            Some(id) => controller.delete_row(id),
            None => Vec::new(),
        },
        KeyCode::Char('r') => controller.refresh(),
        KeyCode::Char('/') => {
            view_data.search.editing = true;
            Vec::new()
        }
        _ => Vec::new(),
    };
    KeyOutcome::events(events)
}

fn handle_form_key(
    controller: &mut SyncController,
    view_data: &mut ViewData,
    key: KeyEvent,
) -> Vec<SyncEvent> {
    let field_count = controller
        .modal()
        .map_or(0, |modal| modal.form.fields().len());
    let save_chord =
        key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('s');
    if save_chord || key.code == KeyCode::Enter {
        return controller.save();
    }

    match key.code {
        KeyCode::Esc => return controller.close_form(),
        KeyCode::Tab | KeyCode::Down if field_count > 0 => {
            view_data.form_cursor = (view_data.form_cursor + 1) % field_count;
        }
        KeyCode::BackTab | KeyCode::Up if field_count > 0 => {
            view_data.form_cursor = (view_data.form_cursor + field_count - 1) % field_count;
        }
        KeyCode::Backspace => edit_current_field(controller, view_data, |value| {
            value.pop();
        }),
        KeyCode::Char(c) if !is_chord(key) => {
            edit_current_field(controller, view_data, |value| value.push(c));
        }
        _ => {}
    }
    Vec::new()
}

fn edit_current_field(
    controller: &mut SyncController,
    view_data: &ViewData,
    edit: impl FnOnce(&mut String),
) {
    let Some(field) = controller
        .modal()
        .and_then(|modal| modal.form.fields().get(view_data.form_cursor))
    else {
        return;
    };
    let name = field.name.clone();
    let mut value = field.value.clone();
    edit(&mut value);
    controller.set_field(&name, &value);
}

/// Control and Alt combinations never type into a text input.
fn is_chord(key: KeyEvent) -> bool {
    key.modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
}

fn handle_search_key(controller: &SyncController, view_data: &mut ViewData, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            view_data.search = SearchState::default();
        }
        KeyCode::Enter => view_data.search.editing = false,
        KeyCode::Backspace => {
            view_data.search.query.pop();
        }
        KeyCode::Char(c) if !is_chord(key) => view_data.search.query.push(c),
        _ => return,
    }
    clamp_selection(controller, view_data);
}

fn render(frame: &mut ratatui::Frame<'_>, controller: &SyncController, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(frame.area());

    let search = Paragraph::new(search_text(controller, view_data))
        .block(Block::default().title(controller.resource_url()).borders(Borders::ALL));
    frame.render_widget(search, layout[0]);

    render_table(frame, layout[1], controller, view_data);

    let hints = Paragraph::new(hint_text(controller, view_data))
        .style(Style::default().fg(Color::Yellow));
    frame.render_widget(hints, layout[2]);

    if let Some(modal) = controller.modal() {
        let area = centered_rect(60, 50, frame.area());
        frame.render_widget(Clear, area);
        let form = Paragraph::new(form_text(controller, modal, view_data.form_cursor))
            .block(Block::default().title(modal.title.as_str()).borders(Borders::ALL));
        frame.render_widget(form, area);
    }

    if controller.pending_delete().is_some() {
        let area = centered_rect(40, 20, frame.area());
        frame.render_widget(Clear, area);
        let prompt = Paragraph::new(format!(
            "{}\n\n[y] yes   [n] no",
            controller.string(tablesync_app::i18n::CONFIRM_DELETE)
        ))
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(prompt, area);
    }

    if let Some(note) = controller.notification() {
        let text = Paragraph::new(note.text.as_str()).wrap(Wrap { trim: false });
        let inner_width = TOAST_WIDTH.min(frame.area().width).saturating_sub(2);
        let lines = u16::try_from(text.line_count(inner_width)).unwrap_or(u16::MAX);
        let area = toast_rect(frame.area(), lines);
        let color = match note.kind {
            NotificationKind::Success => Color::Green,
            NotificationKind::Error => Color::Red,
        };
        frame.render_widget(Clear, area);
        let toast = text.block(
                Block::default()
                    .borders(Borders::ALL)
                    .style(Style::default().fg(color)),
            );
        frame.render_widget(toast, area);
    }
}

fn render_table(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    controller: &SyncController,
    view_data: &ViewData,
) {
    let columns = controller.columns();
    let widths = vec![Constraint::Min(8); columns.len().max(1)];
    let header = TableRow::new(columns.iter().map(|column| {
        Cell::from(column.label().to_owned()).style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
    }));

    let visible = visible_rows(controller, view_data);
    let title = format!("{} of {}", visible.len(), controller.rows().len());
    let rows = visible.iter().enumerate().map(|(index, row)| {
        let style = if index == view_data.selected {
            Style::default().fg(Color::Black).bg(Color::Cyan)
        } else {
            Style::default()
        };
        TableRow::new(
            columns
                .iter()
                .map(|column| Cell::from(row.cell(&column.name)))
                .collect::<Vec<_>>(),
        )
        .style(style)
    });

    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(Block::default().title(title).borders(Borders::ALL));
    frame.render_widget(table, area);
}

fn search_text(controller: &SyncController, view_data: &ViewData) -> String {
    let cursor = if view_data.search.editing { "_" } else { "" };
    format!(
        "{} {}{cursor}",
        controller.search_label(),
        view_data.search.query
    )
}

fn hint_text(controller: &SyncController, view_data: &ViewData) -> String {
    let mut hint = if controller.pending_delete().is_some() {
        "y confirm | n cancel".to_owned()
    } else if controller.modal().is_some() {
        "tab next | shift+tab prev | enter/ctrl+s save | esc close".to_owned()
    } else if view_data.search.editing {
        "type to filter | enter keep | esc clear".to_owned()
    } else {
        "j/k move | a add | e edit | d delete | r refresh | / search | q quit".to_owned()
    };
    if controller.in_flight() > 0 {
        hint.push_str(&format!(" | {} pending", controller.in_flight()));
    }
    hint
}

fn form_text(controller: &SyncController, modal: &Modal, cursor: usize) -> String {
    let specs = &controller.options().form_fields;
    modal
        .form
        .fields()
        .iter()
        .enumerate()
        .map(|(index, field)| {
            let label = specs
                .iter()
                .find(|spec| spec.name == field.name)
                .map_or(field.name.as_str(), |spec| spec.label());
            let marker = if index == cursor { ">" } else { " " };
            format!("{marker} {label}: {}", field.value)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn toast_rect(area: Rect, lines: u16) -> Rect {
    let width = TOAST_WIDTH.min(area.width);
    let height = lines.max(1).saturating_add(2).min(area.height);
    Rect {
        x: area.x + area.width - width,
        y: area.y + area.height.saturating_sub(height + 1),
        width,
        height,
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
