// This file is part of the product Campanile.
// SPDX-FileCopyrightText: 2025-2026 Campanile Maintainers
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Support tickets raised by account holders and contact messages from the
//! public form.

use crate::store::{self, StoreError};
use crate::validation::{FieldErrors, trim_to_option};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use uuid::Uuid;

const TICKETS_FILE_NAME: &str = "tickets.yaml";
const MESSAGES_FILE_NAME: &str = "messages.yaml";

pub const MAX_SUBJECT_CHARS: usize = 255;
pub const MAX_BODY_CHARS: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl TicketStatus {
    pub fn parse(value: &str) -> Option<TicketStatus> {
        match value {
            "open" => Some(TicketStatus::Open),
            "in_progress" => Some(TicketStatus::InProgress),
            "resolved" => Some(TicketStatus::Resolved),
            "closed" => Some(TicketStatus::Closed),
            _ => None,
        }
    }

    pub fn is_open(self) -> bool {
        matches!(self, TicketStatus::Open | TicketStatus::InProgress)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketPriority {
    Low,
    Normal,
    High,
    Urgent,
}

impl TicketPriority {
    pub fn parse(value: &str) -> Option<TicketPriority> {
        match value {
            "low" => Some(TicketPriority::Low),
            "normal" => Some(TicketPriority::Normal),
            "high" => Some(TicketPriority::High),
            "urgent" => Some(TicketPriority::Urgent),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketReply {
    pub author_id: Uuid,
    pub body: String,
    /// Set when the reply came from a staff account; rendered differently
    /// and used for response-time reporting.
    pub is_staff: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportTicket {
    pub id: u64,
    pub subject: String,
    pub body: String,
    pub status: TicketStatus,
    pub priority: TicketPriority,
    pub created_by: Uuid,
    /// Replies stay in creation order.
    #[serde(default)]
    pub replies: Vec<TicketReply>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    New,
    Processing,
    Resolved,
    Spam,
}

impl MessageStatus {
    pub fn parse(value: &str) -> Option<MessageStatus> {
        match value {
            "new" => Some(MessageStatus::New),
            "processing" => Some(MessageStatus::Processing),
            "resolved" => Some(MessageStatus::Resolved),
            "spam" => Some(MessageStatus::Spam),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactMessage {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub body: String,
    pub status: MessageStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_by: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct SupportStoreError {
    message: String,
}

impl SupportStoreError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for SupportStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for SupportStoreError {}

impl From<StoreError> for SupportStoreError {
    fn from(err: StoreError) -> Self {
        SupportStoreError::new(err.to_string())
    }
}

pub struct TicketStore {
    tickets_file: PathBuf,
    tickets: RwLock<BTreeMap<u64, SupportTicket>>,
}

impl TicketStore {
    pub fn new(state_dir: &Path) -> Result<Self, SupportStoreError> {
        let tickets_file = state_dir.join(TICKETS_FILE_NAME);
        let raw: Option<BTreeMap<u64, SupportTicket>> =
            store::read_yaml_file(&tickets_file, "tickets")?;
        Ok(Self {
            tickets_file,
            tickets: RwLock::new(raw.unwrap_or_default()),
        })
    }

    pub fn snapshot(&self) -> Result<BTreeMap<u64, SupportTicket>, SupportStoreError> {
        self.tickets
            .read()
            .map(|guard| guard.clone())
            .map_err(|_| SupportStoreError::new("Ticket store lock poisoned"))
    }

    pub fn persist(&self, tickets: BTreeMap<u64, SupportTicket>) -> Result<(), SupportStoreError> {
        store::write_yaml_file(&self.tickets_file, "tickets", &tickets)?;
        let mut guard = self
            .tickets
            .write()
            .map_err(|_| SupportStoreError::new("Ticket store lock poisoned"))?;
        *guard = tickets;
        Ok(())
    }

    pub fn get(&self, id: u64) -> Result<Option<SupportTicket>, SupportStoreError> {
        Ok(self.snapshot()?.get(&id).cloned())
    }

    pub fn create(
        &self,
        created_by: Uuid,
        subject: String,
        body: String,
        priority: TicketPriority,
    ) -> Result<SupportTicket, SupportStoreError> {
        let mut tickets = self.snapshot()?;
        let now = Utc::now();
        let ticket = SupportTicket {
            id: tickets.keys().next_back().copied().unwrap_or(0) + 1,
            subject,
            body,
            status: TicketStatus::Open,
            priority,
            created_by,
            replies: vec![],
            created_at: now,
            updated_at: now,
        };
        tickets.insert(ticket.id, ticket.clone());
        self.persist(tickets)?;
        Ok(ticket)
    }

    /// Newest first for staff; a requester sees only their own tickets.
    pub fn list_for(&self, requester: Option<Uuid>) -> Result<Vec<SupportTicket>, SupportStoreError> {
        let mut tickets: Vec<SupportTicket> = self
            .snapshot()?
            .into_values()
            .filter(|ticket| requester.is_none_or(|user| ticket.created_by == user))
            .collect();
        tickets.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(tickets)
    }

    pub fn add_reply(
        &self,
        id: u64,
        author_id: Uuid,
        body: String,
        is_staff: bool,
    ) -> Result<Option<SupportTicket>, SupportStoreError> {
        let mut tickets = self.snapshot()?;
        let Some(ticket) = tickets.get_mut(&id) else {
            return Ok(None);
        };
        let now = Utc::now();
        ticket.replies.push(TicketReply {
            author_id,
            body,
            is_staff,
            created_at: now,
        });
        // A staff reply moves a fresh ticket into progress.
        if is_staff && ticket.status == TicketStatus::Open {
            ticket.status = TicketStatus::InProgress;
        }
        ticket.updated_at = now;
        let updated = ticket.clone();
        self.persist(tickets)?;
        Ok(Some(updated))
    }

    pub fn update(
        &self,
        id: u64,
        status: Option<TicketStatus>,
        priority: Option<TicketPriority>,
    ) -> Result<Option<SupportTicket>, SupportStoreError> {
        let mut tickets = self.snapshot()?;
        let Some(ticket) = tickets.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(status) = status {
            ticket.status = status;
        }
        if let Some(priority) = priority {
            ticket.priority = priority;
        }
        ticket.updated_at = Utc::now();
        let updated = ticket.clone();
        self.persist(tickets)?;
        Ok(Some(updated))
    }

    pub fn open_count(&self) -> Result<usize, SupportStoreError> {
        Ok(self
            .snapshot()?
            .values()
            .filter(|ticket| ticket.status.is_open())
            .count())
    }
}

pub struct MessageStore {
    messages_file: PathBuf,
    messages: RwLock<BTreeMap<u64, ContactMessage>>,
}

impl MessageStore {
    pub fn new(state_dir: &Path) -> Result<Self, SupportStoreError> {
        let messages_file = state_dir.join(MESSAGES_FILE_NAME);
        let raw: Option<BTreeMap<u64, ContactMessage>> =
            store::read_yaml_file(&messages_file, "messages")?;
        Ok(Self {
            messages_file,
            messages: RwLock::new(raw.unwrap_or_default()),
        })
    }

    pub fn snapshot(&self) -> Result<BTreeMap<u64, ContactMessage>, SupportStoreError> {
        self.messages
            .read()
            .map(|guard| guard.clone())
            .map_err(|_| SupportStoreError::new("Message store lock poisoned"))
    }

    pub fn persist(
        &self,
        messages: BTreeMap<u64, ContactMessage>,
    ) -> Result<(), SupportStoreError> {
        store::write_yaml_file(&self.messages_file, "messages", &messages)?;
        let mut guard = self
            .messages
            .write()
            .map_err(|_| SupportStoreError::new("Message store lock poisoned"))?;
        *guard = messages;
        Ok(())
    }

    pub fn get(&self, id: u64) -> Result<Option<ContactMessage>, SupportStoreError> {
        Ok(self.snapshot()?.get(&id).cloned())
    }

    pub fn create(
        &self,
        name: String,
        email: String,
        subject: String,
        body: String,
    ) -> Result<ContactMessage, SupportStoreError> {
        let mut messages = self.snapshot()?;
        let message = ContactMessage {
            id: messages.keys().next_back().copied().unwrap_or(0) + 1,
            name,
            email,
            subject,
            body,
            status: MessageStatus::New,
            processed_by: None,
            processed_at: None,
            created_at: Utc::now(),
        };
        messages.insert(message.id, message.clone());
        self.persist(messages)?;
        Ok(message)
    }

    pub fn list(&self, status: Option<MessageStatus>) -> Result<Vec<ContactMessage>, SupportStoreError> {
        let mut messages: Vec<ContactMessage> = self
            .snapshot()?
            .into_values()
            .filter(|message| status.is_none_or(|s| message.status == s))
            .collect();
        messages.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(messages)
    }

    /// The first transition away from `new` stamps who handled it and when;
    /// later status changes keep the original handler.
    pub fn set_status(
        &self,
        id: u64,
        status: MessageStatus,
        handler: Uuid,
    ) -> Result<Option<ContactMessage>, SupportStoreError> {
        let mut messages = self.snapshot()?;
        let Some(message) = messages.get_mut(&id) else {
            return Ok(None);
        };
        message.status = status;
        if status != MessageStatus::New && message.processed_by.is_none() {
            message.processed_by = Some(handler);
            message.processed_at = Some(Utc::now());
        }
        let updated = message.clone();
        self.persist(messages)?;
        Ok(Some(updated))
    }

    pub fn new_count(&self) -> Result<usize, SupportStoreError> {
        Ok(self
            .snapshot()?
            .values()
            .filter(|message| message.status == MessageStatus::New)
            .count())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTicketPayload {
    pub subject: String,
    pub body: String,
    #[serde(default)]
    pub priority: Option<String>,
}

impl NewTicketPayload {
    pub fn validate(&self) -> Result<(String, String, TicketPriority), FieldErrors> {
        let mut errors = FieldErrors::new();
        let subject = trim_to_option(Some(&self.subject));
        if subject.is_none() {
            errors.add("subject", "A subject is required");
        } else if self.subject.chars().count() > MAX_SUBJECT_CHARS {
            errors.add(
                "subject",
                format!("The subject must be at most {} characters", MAX_SUBJECT_CHARS),
            );
        }
        let body = trim_to_option(Some(&self.body));
        if body.is_none() {
            errors.add("body", "A message body is required");
        } else if self.body.chars().count() > MAX_BODY_CHARS {
            errors.add(
                "body",
                format!("The body must be at most {} characters", MAX_BODY_CHARS),
            );
        }
        let priority = match self.priority.as_deref() {
            None => Some(TicketPriority::Normal),
            Some(value) => {
                let parsed = TicketPriority::parse(value);
                if parsed.is_none() {
                    errors.add("priority", "Unknown priority");
                }
                parsed
            }
        };
        let (Some(subject), Some(body), Some(priority)) = (subject, body, priority) else {
            return Err(errors);
        };
        errors.into_result((subject, body, priority))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReplyPayload {
    pub body: String,
}

impl ReplyPayload {
    pub fn validate(&self) -> Result<String, FieldErrors> {
        let mut errors = FieldErrors::new();
        let body = trim_to_option(Some(&self.body));
        if body.is_none() {
            errors.add("body", "A reply body is required");
        } else if self.body.chars().count() > MAX_BODY_CHARS {
            errors.add(
                "body",
                format!("The body must be at most {} characters", MAX_BODY_CHARS),
            );
        }
        match body {
            Some(body) => errors.into_result(body),
            None => Err(errors),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContactPayload {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub body: String,
}

impl ContactPayload {
    pub fn validate(&self) -> Result<(String, String, String, String), FieldErrors> {
        let mut errors = FieldErrors::new();
        let name = trim_to_option(Some(&self.name));
        if name.is_none() {
            errors.add("name", "A name is required");
        }
        let email = trim_to_option(Some(&self.email));
        match &email {
            None => errors.add("email", "An email address is required"),
            Some(email) => {
                let plausible = email
                    .split_once('@')
                    .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
                if !plausible {
                    errors.add("email", "The email address is not valid");
                }
            }
        }
        let subject = trim_to_option(Some(&self.subject));
        if subject.is_none() {
            errors.add("subject", "A subject is required");
        } else if self.subject.chars().count() > MAX_SUBJECT_CHARS {
            errors.add(
                "subject",
                format!("The subject must be at most {} characters", MAX_SUBJECT_CHARS),
            );
        }
        let body = trim_to_option(Some(&self.body));
        if body.is_none() {
            errors.add("body", "A message body is required");
        } else if self.body.chars().count() > MAX_BODY_CHARS {
            errors.add(
                "body",
                format!("The body must be at most {} characters", MAX_BODY_CHARS),
            );
        }
        let (Some(name), Some(email), Some(subject), Some(body)) = (name, email, subject, body)
        else {
            return Err(errors);
        };
        errors.into_result((name, email, subject, body))
    }
}
