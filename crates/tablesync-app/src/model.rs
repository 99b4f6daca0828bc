// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;
use std::fmt;

use crate::RowId;
use crate::i18n::StringTable;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum FieldValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl FieldValue {
    pub fn display(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(value) => value.to_string(),
            Self::Integer(value) => value.to_string(),
            Self::Float(value) => value.to_string(),
            Self::Text(value) => value.clone(),
        }
    }

    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl TryFrom<Value> for FieldValue {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Null => Ok(Self::Null),
            Value::Bool(value) => Ok(Self::Bool(value)),
            Value::Number(number) => {
                if let Some(value) = number.as_i64() {
                    Ok(Self::Integer(value))
                } else if let Some(value) = number.as_f64() {
                    Ok(Self::Float(value))
                } else {
                    Err(format!("number {number} is out of range"))
                }
            }
            Value::String(value) => Ok(Self::Text(value)),
            Value::Array(_) => Err("nested arrays are not supported as field values".to_owned()),
            Value::Object(_) => {
                Err("nested objects are not supported as field values".to_owned())
            }
        }
    }
}

impl From<FieldValue> for Value {
    fn from(value: FieldValue) -> Self {
        match value {
            FieldValue::Null => Value::Null,
            FieldValue::Bool(value) => Value::Bool(value),
            FieldValue::Integer(value) => Value::Number(value.into()),
            FieldValue::Float(value) => Number::from_f64(value).map_or(Value::Null, Value::Number),
            FieldValue::Text(value) => Value::String(value),
        }
    }
}

/// One record of the managed resource. `id` is kept out of `fields`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct Row {
    pub id: RowId,
    pub fields: BTreeMap<String, FieldValue>,
}

impl Row {
    pub fn new(id: RowId) -> Self {
        Self {
            id,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: &str, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.to_owned(), value.into());
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Display text for a column; `id` resolves to the row id.
    pub fn cell(&self, name: &str) -> String {
        if name == "id" {
            return self.id.to_string();
        }
        self.field(name).map(FieldValue::display).unwrap_or_default()
    }

    pub fn missing_columns<'a>(&self, columns: &'a [FieldSpec]) -> Vec<&'a str> {
        columns
            .iter()
            .map(|column| column.name.as_str())
            .filter(|name| *name != "id" && !self.fields.contains_key(*name))
            .collect()
    }
}

impl TryFrom<Map<String, Value>> for Row {
    type Error = String;

    fn try_from(mut object: Map<String, Value>) -> Result<Self, Self::Error> {
        let id = match object.remove("id") {
            Some(Value::Number(number)) => number
                .as_i64()
                .map(RowId::new)
                .ok_or_else(|| format!("row id {number} is not an integer"))?,
            Some(other) => return Err(format!("row id must be an integer, got {other}")),
            None => return Err("row is missing an `id` field".to_owned()),
        };

        let mut fields = BTreeMap::new();
        for (name, value) in object {
            let value =
                FieldValue::try_from(value).map_err(|error| format!("field `{name}`: {error}"))?;
            fields.insert(name, value);
        }
        Ok(Self { id, fields })
    }
}

impl From<Row> for Map<String, Value> {
    fn from(row: Row) -> Self {
        let mut object = Map::new();
        object.insert("id".to_owned(), Value::Number(row.id.get().into()));
        for (name, value) in row.fields {
            object.insert(name, value.into());
        }
        object
    }
}

/// Rows in the order the server returned them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RowCollection {
    rows: Vec<Row>,
}

impl RowCollection {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    pub fn replace(&mut self, rows: Vec<Row>) {
        self.rows = rows;
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, id: RowId) -> Option<&Row> {
        self.rows.iter().find(|row| row.id == id)
    }

    /// Rows whose visible cells contain `query`, case-insensitively. An empty
    /// query matches everything.
    pub fn filtered<'a>(&'a self, query: &str, columns: &[FieldSpec]) -> Vec<&'a Row> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.rows.iter().collect();
        }
        self.rows
            .iter()
            .filter(|row| {
                columns
                    .iter()
                    .any(|column| row.cell(&column.name).to_lowercase().contains(&needle))
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(default)]
    pub label: String,
}

impl FieldSpec {
    pub fn new(name: &str, label: &str) -> Self {
        Self {
            name: name.to_owned(),
            label: label.to_owned(),
        }
    }

    pub fn label(&self) -> &str {
        if self.label.is_empty() {
            &self.name
        } else {
            &self.label
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderOptions {
    pub columns: Vec<FieldSpec>,
    pub form_fields: Vec<FieldSpec>,
    pub strings: StringTable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalMode {
    Create,
    Edit(RowId),
}
