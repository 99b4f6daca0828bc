// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use tablesync_app::{
    ErrorInfo, FieldSpec, ModalMode, NotificationKind, RenderOptions, Request, ResourceError, Row,
    RowId, StringTable, SyncController, SyncEvent, run_until_idle,
};
use tablesync_testkit::{MEALS_URL, StubResource, meal_options, seed_meals};

fn items_options() -> RenderOptions {
    RenderOptions {
        columns: vec![FieldSpec::new("name", "Name")],
        form_fields: vec![FieldSpec::new("name", "Name")],
        strings: StringTable::english(),
    }
}

fn started(stub: &mut StubResource, options: RenderOptions) -> SyncController {
    let (mut controller, events) = SyncController::initialize(MEALS_URL, options);
    run_until_idle(&mut controller, stub, events);
    controller
}

fn is_list(request: &Request) -> bool {
    matches!(request, Request::List)
}

#[test]
fn initialize_fetches_and_shows_rows() {
    let mut stub = StubResource::new(vec![Row::new(RowId::new(1)).with_field("name", "A")]);
    let (mut controller, events) = SyncController::initialize("/api/items", items_options());
    assert!(matches!(
        events.as_slice(),
        [SyncEvent::Send {
            request: Request::List,
            ..
        }]
    ));

    let log = run_until_idle(&mut controller, &mut stub, events);
    assert!(log.contains(&SyncEvent::TableRedrawn { rows: 1 }));
    assert_eq!(controller.rows().len(), 1);
    assert_eq!(controller.rows().rows()[0].cell("name"), "A");
}

#[test]
fn refresh_mirrors_last_response_in_server_order() {
    let mut stub = StubResource::new(seed_meals(4));
    let mut controller = started(&mut stub, meal_options());
    assert_eq!(controller.rows().rows(), stub.rows());

    stub.fail_next(ResourceError::Transport("connection reset".to_owned()));
    let events = controller.refresh();
    run_until_idle(&mut controller, &mut stub, events);
    assert_eq!(controller.rows().rows(), stub.rows());

    let mut reversed = StubResource::new(seed_meals(4).into_iter().rev().collect());
    let events = controller.refresh();
    run_until_idle(&mut controller, &mut reversed, events);
    let ids = controller
        .rows()
        .rows()
        .iter()
        .map(|row| row.id.get())
        .collect::<Vec<_>>();
    assert_eq!(ids, vec![4, 3, 2, 1]);
}

#[test]
fn open_create_form_is_local_and_blank() {
    let mut stub = StubResource::new(seed_meals(2));
    let mut controller = started(&mut stub, meal_options());
    let before = stub.requests().len();

    let events = controller.open_create_form();
    assert_eq!(
        events,
        vec![SyncEvent::ModalOpened {
            mode: ModalMode::Create,
            title: "Add".to_owned(),
        }]
    );
    let modal = controller.modal().expect("modal should be open");
    assert!(modal.form.fields().iter().all(|field| field.value.is_empty()));
    assert_eq!(stub.requests().len(), before);
}

#[test]
fn open_edit_form_populates_fields_from_server_row() {
    let mut stub = StubResource::new(vec![Row::new(RowId::new(1)).with_field("name", "A")]);
    let mut controller = started(&mut stub, items_options());

    let events = controller.open_edit_form(RowId::new(1));
    let log = run_until_idle(&mut controller, &mut stub, events);

    assert!(log.contains(&SyncEvent::ModalOpened {
        mode: ModalMode::Edit(RowId::new(1)),
        title: "Edit".to_owned(),
    }));
    let modal = controller.modal().expect("modal should be open");
    assert_eq!(modal.form.value("name"), Some("A"));
    assert_eq!(stub.requests().last(), Some(&Request::Get(RowId::new(1))));
}

#[test]
fn open_edit_form_for_missing_row_notifies_and_keeps_modal_closed() {
    let mut stub = StubResource::new(seed_meals(1));
    let mut controller = started(&mut stub, meal_options());

    let events = controller.open_edit_form(RowId::new(42));
    run_until_idle(&mut controller, &mut stub, events);

    assert!(controller.modal().is_none());
    let note = controller.notification().expect("error notification");
    assert_eq!(note.kind, NotificationKind::Error);
    assert!(note.text.contains("Not found entity with id=42"));
}

#[test]
fn successful_save_closes_modal_and_refreshes_once() -> Result<()> {
    let mut stub = StubResource::new(seed_meals(2));
    let mut controller = started(&mut stub, meal_options());
    let lists_before = stub.count(is_list);

    controller.open_create_form();
    controller.set_field("description", "Midnight snack");
    controller.set_field("calories", "250");
    let events = controller.save();
    let log = run_until_idle(&mut controller, &mut stub, events);

    assert!(controller.modal().is_none());
    assert!(log.contains(&SyncEvent::ModalClosed));
    assert_eq!(stub.count(is_list), lists_before + 1);
    assert_eq!(controller.rows().len(), 3);
    let created = controller
        .rows()
        .rows()
        .iter()
        .find(|row| row.cell("description") == "Midnight snack")
        .ok_or_else(|| anyhow::anyhow!("created row should be listed"))?;
    assert_eq!(created.cell("calories"), "250");

    let note = controller.notification().expect("success notification");
    assert_eq!(note.kind, NotificationKind::Success);
    assert_eq!(note.text, "Record saved");
    assert!(note.timeout.is_some());
    Ok(())
}

#[test]
fn failed_save_keeps_modal_open_and_skips_refresh() {
    let mut stub = StubResource::new(Vec::new()).require("name");
    let mut controller = started(&mut stub, items_options());
    let lists_before = stub.count(is_list);

    controller.open_create_form();
    let events = controller.save();
    run_until_idle(&mut controller, &mut stub, events);

    assert_eq!(stub.count(is_list), lists_before);
    let modal = controller.modal().expect("modal should stay open");
    assert_eq!(modal.mode, ModalMode::Create);

    let note = controller.notification().expect("error notification");
    assert_eq!(note.kind, NotificationKind::Error);
    assert!(note.text.contains("Validation"));
    assert!(note.text.contains("name required"));
    assert!(note.timeout.is_none());
}

#[test]
fn failed_save_preserves_entered_values_for_retry() {
    let mut stub = StubResource::new(seed_meals(1));
    let mut controller = started(&mut stub, meal_options());

    controller.open_create_form();
    controller.set_field("description", "Retry me");
    stub.fail_next(ResourceError::Api {
        status: 400,
        info: ErrorInfo {
            type_message: "Validation".to_owned(),
            details: vec!["name required".to_owned()],
        },
    });
    let events = controller.save();
    run_until_idle(&mut controller, &mut stub, events);
    assert_eq!(
        controller
            .modal()
            .and_then(|modal| modal.form.value("description")),
        Some("Retry me")
    );

    let events = controller.save();
    run_until_idle(&mut controller, &mut stub, events);
    assert!(controller.modal().is_none());
    assert_eq!(controller.rows().len(), 2);
    assert_eq!(
        controller.notification().map(|note| note.kind),
        Some(NotificationKind::Success)
    );
}

#[test]
fn editing_updates_the_existing_row() {
    let mut stub = StubResource::new(seed_meals(3));
    let mut controller = started(&mut stub, meal_options());

    let events = controller.open_edit_form(RowId::new(2));
    run_until_idle(&mut controller, &mut stub, events);
    controller.set_field("calories", "999");
    let events = controller.save();
    run_until_idle(&mut controller, &mut stub, events);

    assert_eq!(controller.rows().len(), 3);
    let updated = controller.rows().get(RowId::new(2)).expect("row 2");
    assert_eq!(updated.cell("calories"), "999");
    assert_eq!(updated.cell("description"), "Lunch");
}

#[test]
fn unconfirmed_delete_sends_nothing() {
    let mut stub = StubResource::new(seed_meals(2));
    let mut controller = started(&mut stub, meal_options());
    let before = stub.requests().len();
    let rows_before = controller.rows().clone();

    let events = controller.delete_row(RowId::new(1));
    assert_eq!(controller.pending_delete(), Some(RowId::new(1)));
    run_until_idle(&mut controller, &mut stub, events);
    let events = controller.cancel_delete();
    run_until_idle(&mut controller, &mut stub, events);

    assert_eq!(stub.requests().len(), before);
    assert_eq!(controller.rows(), &rows_before);
    assert!(controller.notification().is_none());
}

#[test]
fn confirmed_delete_removes_row_from_next_fetch() {
    let mut stub = StubResource::new(seed_meals(3));
    let mut controller = started(&mut stub, meal_options());

    controller.delete_row(RowId::new(2));
    let events = controller.confirm_delete();
    let log = run_until_idle(&mut controller, &mut stub, events);

    assert!(stub.requests().contains(&Request::Delete(RowId::new(2))));
    assert!(controller.rows().get(RowId::new(2)).is_none());
    assert_eq!(controller.rows().len(), 2);
    assert!(log.contains(&SyncEvent::TableRedrawn { rows: 2 }));
    assert_eq!(
        controller.notification().map(|note| note.text.as_str()),
        Some("Record deleted")
    );
}

#[test]
fn failed_delete_leaves_rows_unchanged() {
    let mut stub = StubResource::new(seed_meals(2));
    let mut controller = started(&mut stub, meal_options());
    let rows_before = controller.rows().clone();
    let lists_before = stub.count(is_list);

    controller.delete_row(RowId::new(7));
    let events = controller.confirm_delete();
    run_until_idle(&mut controller, &mut stub, events);

    assert_eq!(controller.rows(), &rows_before);
    assert_eq!(stub.count(is_list), lists_before);
    assert_eq!(
        controller.notification().map(|note| note.kind),
        Some(NotificationKind::Error)
    );
}

#[test]
fn only_one_notification_is_visible() {
    let mut stub = StubResource::new(seed_meals(2));
    let mut controller = started(&mut stub, meal_options());

    let events = controller.open_edit_form(RowId::new(9));
    run_until_idle(&mut controller, &mut stub, events);
    let error_token = controller.notification().expect("error shown").token;

    controller.delete_row(RowId::new(1));
    let events = controller.confirm_delete();
    let log = run_until_idle(&mut controller, &mut stub, events);

    let closed_at = log
        .iter()
        .position(|event| *event == SyncEvent::NotificationClosed { token: error_token })
        .expect("error should be closed");
    let shown_at = log
        .iter()
        .position(|event| {
            matches!(event, SyncEvent::Notified(note) if note.kind == NotificationKind::Success)
        })
        .expect("success should be shown");
    assert!(closed_at < shown_at);
    assert_eq!(
        controller.notification().map(|note| note.kind),
        Some(NotificationKind::Success)
    );
}

#[test]
fn malformed_error_body_becomes_generic_notification() {
    let mut stub = StubResource::new(seed_meals(1));
    let mut controller = started(&mut stub, meal_options());

    stub.fail_next(ResourceError::from_response(500, "Internal Server Error"));
    let events = controller.refresh();
    run_until_idle(&mut controller, &mut stub, events);

    let note = controller.notification().expect("error notification");
    assert!(note.text.starts_with("request failed (HTTP 500)"));
    assert!(note.text.contains("Internal Server Error"));
}
