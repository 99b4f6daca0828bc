// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{FieldSpec, ModalMode, Row, RowId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub name: String,
    pub value: String,
}

/// Current input values of the modal form, in declared field order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormState {
    fields: Vec<FormField>,
}

impl FormState {
    pub fn blank(specs: &[FieldSpec]) -> Self {
        Self {
            fields: editable(specs)
                .map(|spec| FormField {
                    name: spec.name.clone(),
                    value: String::new(),
                })
                .collect(),
        }
    }

    pub fn from_row(specs: &[FieldSpec], row: &Row) -> Self {
        Self {
            fields: editable(specs)
                .map(|spec| FormField {
                    name: spec.name.clone(),
                    value: row.cell(&spec.name),
                })
                .collect(),
        }
    }

    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| field.value.as_str())
    }

    /// Returns false when the form has no field called `name`.
    pub fn set(&mut self, name: &str, value: &str) -> bool {
        match self.fields.iter_mut().find(|field| field.name == name) {
            Some(field) => {
                field.value = value.to_owned();
                true
            }
            None => false,
        }
    }

    pub fn payload(&self, mode: ModalMode) -> FormPayload {
        let id = match mode {
            ModalMode::Create => None,
            ModalMode::Edit(id) => Some(id),
        };
        FormPayload {
            id,
            fields: self
                .fields
                .iter()
                .map(|field| (field.name.clone(), field.value.clone()))
                .collect(),
        }
    }
}

// `id` travels with the modal mode, never as a user-editable input.
fn editable(specs: &[FieldSpec]) -> impl Iterator<Item = &FieldSpec> {
    specs.iter().filter(|spec| spec.name != "id")
}

/// Body of a save request. The server tells create from update by `id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormPayload {
    pub id: Option<RowId>,
    pub fields: Vec<(String, String)>,
}

impl FormPayload {
    pub fn is_create(&self) -> bool {
        self.id.is_none()
    }

    /// Name/value pairs in wire order, `id` first when present.
    pub fn pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::with_capacity(self.fields.len() + 1);
        if let Some(id) = self.id {
            pairs.push(("id".to_owned(), id.to_string()));
        }
        pairs.extend(self.fields.iter().cloned());
        pairs
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }
}
