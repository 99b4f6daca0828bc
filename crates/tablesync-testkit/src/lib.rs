// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::VecDeque;
use tablesync_app::{
    ErrorInfo, FieldSpec, FieldValue, FormPayload, RenderOptions, Request, Resource,
    ResourceError, Row, RowId, StringTable,
};
use time::macros::{datetime, format_description};
use time::{Duration, PrimitiveDateTime};

const MEAL_DESCRIPTIONS: [&str; 7] = [
    "Breakfast",
    "Lunch",
    "Dinner",
    "Snack",
    "Brunch",
    "Late supper",
    "Tea",
];
const MEAL_CALORIES: [i64; 7] = [500, 1000, 510, 200, 750, 410, 90];

pub const MEALS_URL: &str = "/api/meals";

/// In-memory stand-in for a REST resource. Records every call it receives.
#[derive(Debug, Clone, Default)]
pub struct StubResource {
    rows: Vec<Row>,
    next_id: i64,
    required: Vec<String>,
    failures: VecDeque<ResourceError>,
    requests: Vec<Request>,
}

impl StubResource {
    pub fn new(rows: Vec<Row>) -> Self {
        let next_id = rows.iter().map(|row| row.id.get()).max().unwrap_or(0) + 1;
        Self {
            rows,
            next_id,
            ..Self::default()
        }
    }

    /// Saves with an empty value for `name` fail with a validation error.
    pub fn require(mut self, name: &str) -> Self {
        self.required.push(name.to_owned());
        self
    }

    pub fn fail_next(&mut self, error: ResourceError) {
        self.failures.push_back(error);
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn requests(&self) -> &[Request] {
        &self.requests
    }

    pub fn count(&self, matches: impl Fn(&Request) -> bool) -> usize {
        self.requests.iter().filter(|request| matches(request)).count()
    }

    fn record(&mut self, request: Request) -> Result<(), ResourceError> {
        self.requests.push(request);
        match self.failures.pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl Resource for StubResource {
    fn list(&mut self) -> Result<Vec<Row>, ResourceError> {
        self.record(Request::List)?;
        Ok(self.rows.clone())
    }

    fn get(&mut self, id: RowId) -> Result<Row, ResourceError> {
        self.record(Request::Get(id))?;
        self.rows
            .iter()
            .find(|row| row.id == id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    fn save(&mut self, payload: &FormPayload) -> Result<(), ResourceError> {
        self.record(Request::Save(payload.clone()))?;

        let missing = self
            .required
            .iter()
            .filter(|name| payload.value(name).is_none_or(|value| value.trim().is_empty()))
            .map(|name| format!("{name} required"))
            .collect::<Vec<_>>();
        if !missing.is_empty() {
            return Err(ResourceError::Api {
                status: 422,
                info: ErrorInfo {
                    type_message: "Validation".to_owned(),
                    details: missing,
                },
            });
        }

        let id = match payload.id {
            Some(id) => {
                let index = self
                    .rows
                    .iter()
                    .position(|row| row.id == id)
                    .ok_or_else(|| not_found(id))?;
                self.rows.remove(index);
                id
            }
            None => {
                let id = RowId::new(self.next_id);
                self.next_id += 1;
                id
            }
        };

        let mut row = Row::new(id);
        for (name, value) in &payload.fields {
            row.fields.insert(name.clone(), parse_field(value));
        }
        self.rows.push(row);
        self.rows.sort_by_key(|row| row.id);
        Ok(())
    }

    fn delete(&mut self, id: RowId) -> Result<(), ResourceError> {
        self.record(Request::Delete(id))?;
        let before = self.rows.len();
        self.rows.retain(|row| row.id != id);
        if self.rows.len() == before {
            return Err(not_found(id));
        }
        Ok(())
    }
}

pub fn not_found(id: RowId) -> ResourceError {
    ResourceError::Api {
        status: 404,
        info: ErrorInfo {
            type_message: "Data not found".to_owned(),
            details: vec![format!("Not found entity with id={id}")],
        },
    }
}

fn parse_field(raw: &str) -> FieldValue {
    if raw.is_empty() {
        return FieldValue::Null;
    }
    match raw.parse::<i64>() {
        Ok(value) => FieldValue::Integer(value),
        Err(_) => FieldValue::Text(raw.to_owned()),
    }
}

pub fn meal_options() -> RenderOptions {
    RenderOptions {
        columns: vec![
            FieldSpec::new("dateTime", "Date/Time"),
            FieldSpec::new("description", "Description"),
            FieldSpec::new("calories", "Calories"),
        ],
        form_fields: vec![
            FieldSpec::new("dateTime", "Date/Time"),
            FieldSpec::new("description", "Description"),
            FieldSpec::new("calories", "Calories"),
        ],
        strings: StringTable::english(),
    }
}

/// `count` meals, one every six hours from a fixed start.
pub fn seed_meals(count: usize) -> Vec<Row> {
    let start: PrimitiveDateTime = datetime!(2020-01-30 10:00);
    let format = format_description!("[year]-[month]-[day]T[hour]:[minute]");
    (0..count)
        .map(|index| {
            let at = start + Duration::hours(6 * index as i64);
            let date_time = at.format(&format).unwrap_or_default();
            Row::new(RowId::new(index as i64 + 1))
                .with_field("dateTime", date_time)
                .with_field(
                    "description",
                    MEAL_DESCRIPTIONS[index % MEAL_DESCRIPTIONS.len()],
                )
                .with_field("calories", MEAL_CALORIES[index % MEAL_CALORIES.len()])
        })
        .collect()
}
