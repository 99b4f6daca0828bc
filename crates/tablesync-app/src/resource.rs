// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::VecDeque;

use crate::{
    FormPayload, Outcome, Request, ResourceError, Response, Row, RowId, SyncController, SyncEvent,
};

/// The REST resource a table is mirrored from.
pub trait Resource {
    /// `GET {url}`
    fn list(&mut self) -> Result<Vec<Row>, ResourceError>;
    /// `GET {url}/{id}`
    fn get(&mut self, id: RowId) -> Result<Row, ResourceError>;
    /// `POST {url}`, form-encoded, for both create and update.
    fn save(&mut self, payload: &FormPayload) -> Result<(), ResourceError>;
    /// `DELETE {url}/{id}`
    fn delete(&mut self, id: RowId) -> Result<(), ResourceError>;
}

pub fn execute<R: Resource + ?Sized>(resource: &mut R, request: &Request) -> Outcome {
    match request {
        Request::List => resource.list().map(Response::Rows),
        Request::Get(id) => resource.get(*id).map(Response::Row),
        Request::Save(payload) => resource.save(payload).map(|()| Response::Done),
        Request::Delete(id) => resource.delete(*id).map(|()| Response::Done),
    }
}

/// Executes every `Send` in `events`, and every `Send` those completions
/// produce, in issue order. Returns the full event log, requests included.
pub fn run_until_idle<R: Resource + ?Sized>(
    controller: &mut SyncController,
    resource: &mut R,
    events: Vec<SyncEvent>,
) -> Vec<SyncEvent> {
    let mut queue: VecDeque<SyncEvent> = events.into();
    let mut log = Vec::new();
    while let Some(event) = queue.pop_front() {
        if let SyncEvent::Send { ticket, request } = &event {
            let outcome = execute(resource, request);
            queue.extend(controller.complete(*ticket, outcome));
        }
        log.push(event);
    }
    log
}
