// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::time::Duration;

pub const SUCCESS_TIMEOUT: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub token: u64,
    pub kind: NotificationKind,
    pub text: String,
    /// `None` keeps the notification up until something replaces it.
    pub timeout: Option<Duration>,
}

/// Holds the one notification currently on screen.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NotificationCenter {
    active: Option<Notification>,
    last_token: u64,
}

impl NotificationCenter {
    pub fn active(&self) -> Option<&Notification> {
        self.active.as_ref()
    }

    pub fn success(&mut self, text: impl Into<String>) -> Notification {
        self.show(NotificationKind::Success, text.into(), Some(SUCCESS_TIMEOUT))
    }

    pub fn error(&mut self, text: impl Into<String>) -> Notification {
        self.show(NotificationKind::Error, text.into(), None)
    }

    /// Closes a pending error; a visible success toast is left to expire.
    pub fn close_error(&mut self) -> Option<u64> {
        match &self.active {
            Some(note) if note.kind == NotificationKind::Error => {
                let token = note.token;
                self.active = None;
                Some(token)
            }
            _ => None,
        }
    }

    /// Dismisses the success toast `token`. Errors and stale tokens are ignored.
    pub fn expire(&mut self, token: u64) -> bool {
        match &self.active {
            Some(note) if note.token == token && note.kind == NotificationKind::Success => {
                self.active = None;
                true
            }
            _ => false,
        }
    }

    fn show(
        &mut self,
        kind: NotificationKind,
        text: String,
        timeout: Option<Duration>,
    ) -> Notification {
        self.last_token = self.last_token.saturating_add(1);
        let note = Notification {
            token: self.last_token,
            kind,
            text,
            timeout,
        };
        self.active = Some(note.clone());
        note
    }
}
