use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use alive_db::models::NewUser;
use alive_db::{Database, SharedStore, format_timestamp};

use crate::channels::{Channel, ChannelKind, OutboundMessage};

pub(crate) fn store() -> SharedStore {
    Arc::new(Database::open_in_memory().unwrap())
}

pub(crate) fn add_user(store: &SharedStore, email: &str, username: &str) -> Uuid {
    let id = Uuid::new_v4();
    store
        .create_user(&NewUser {
            id: id.to_string(),
            email: email.into(),
            phone: None,
            password_hash: "not-a-real-hash".into(),
            username: username.into(),
            created_at: format_timestamp(Utc::now()),
        })
        .unwrap();
    id
}

enum Behaviour {
    Deliver,
    FailFor(String),
    Hang,
}

/// Channel double that remembers every target it was asked to reach and
/// every message it delivered.
pub(crate) struct RecordingChannel {
    kind: ChannelKind,
    behaviour: Behaviour,
    attempted: Mutex<Vec<String>>,
    sent: Mutex<Vec<OutboundMessage>>,
}

impl RecordingChannel {
    pub(crate) fn new(kind: ChannelKind) -> Self {
        Self {
            kind,
            behaviour: Behaviour::Deliver,
            attempted: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing_for(kind: ChannelKind, target: &str) -> Self {
        Self {
            behaviour: Behaviour::FailFor(target.to_string()),
            ..Self::new(kind)
        }
    }

    pub(crate) fn hanging(kind: ChannelKind) -> Self {
        Self {
            behaviour: Behaviour::Hang,
            ..Self::new(kind)
        }
    }

    pub(crate) fn attempted(&self) -> Vec<String> {
        self.attempted.lock().unwrap().clone()
    }

    pub(crate) fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Channel for RecordingChannel {
    fn kind(&self) -> ChannelKind {
        self.kind
    }

    async fn send(&self, message: &OutboundMessage) -> anyhow::Result<()> {
        self.attempted.lock().unwrap().push(message.target.clone());
        match &self.behaviour {
            Behaviour::FailFor(target) if *target == message.target => {
                anyhow::bail!("mailbox {} does not exist", target)
            }
            Behaviour::Hang => std::future::pending().await,
            _ => {
                self.sent.lock().unwrap().push(message.clone());
                Ok(())
            }
        }
    }
}
