// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeMap;

pub const ADD_TITLE: &str = "addTitle";
pub const EDIT_TITLE: &str = "editTitle";
pub const CONFIRM_DELETE: &str = "common.confirm";
pub const SEARCH: &str = "common.search";
pub const SAVED: &str = "common.saved";
pub const DELETED: &str = "common.deleted";

const ENGLISH: [(&str, &str); 6] = [
    (ADD_TITLE, "Add"),
    (EDIT_TITLE, "Edit"),
    (CONFIRM_DELETE, "Are you sure?"),
    (SEARCH, "Search:"),
    (SAVED, "Record saved"),
    (DELETED, "Record deleted"),
];

/// Display strings keyed by lookup key.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StringTable {
    entries: BTreeMap<String, String>,
}

impl StringTable {
    pub fn english() -> Self {
        Self {
            entries: ENGLISH
                .iter()
                .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
                .collect(),
        }
    }

    /// Returns the key itself when no string is registered for it.
    pub fn get<'a>(&'a self, key: &'a str) -> &'a str {
        self.entries.get(key).map_or(key, String::as_str)
    }

    pub fn insert(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_owned(), value.to_owned());
    }

    pub fn with_overrides<I, K, V>(mut self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in overrides {
            self.insert(key.as_ref(), value.as_ref());
        }
        self
    }
}
