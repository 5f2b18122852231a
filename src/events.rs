//! Browser events mapped to follow-up actions.
//!
//! [`plan_actions`] is pure: given what the store holds and what happened, it
//! says what should run. [`crate::background::Background`] executes the plan.
use serde::Serialize;
use serde_json::Value;

use crate::config::{ACTIVE_SESSION_KEY, SESSIONS_KEY, SETTINGS_KEY};
use crate::session_data::Session;
use crate::storage::StorageChange;

#[derive(Debug, Clone, PartialEq)]
pub enum BrowserEvent {
    TabActivated { tab_id: i32 },
    TabUpdated { tab_id: i32 },
    StorageChanged(StorageChange),
}

/// Pushed to UI surfaces so they stay in sync with storage
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum UiNotification {
    SessionsChanged { sessions: Vec<Session> },
    #[serde(rename_all = "camelCase")]
    ActiveSessionChanged {
        session_id: Option<String>,
        /// The pointer names a session that no longer exists
        stale: bool,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventAction {
    RefreshBadge,
    ApplyBadgeStyle,
    Notify(UiNotification),
}

/// What the store held when the event arrived
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreSnapshot {
    pub sessions: Vec<Session>,
    pub active_session_id: Option<String>,
}

fn sessions_from(value: &Option<Value>) -> Vec<Session> {
    value
        .clone()
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default()
}

pub fn plan_actions(snapshot: &StoreSnapshot, event: &BrowserEvent) -> Vec<EventAction> {
    match event {
        BrowserEvent::TabActivated { .. } | BrowserEvent::TabUpdated { .. } => {
            vec![EventAction::RefreshBadge]
        }
        BrowserEvent::StorageChanged(change) => match change.key.as_str() {
            SESSIONS_KEY => {
                let sessions = sessions_from(&change.new_value);
                let mut actions = vec![
                    EventAction::RefreshBadge,
                    EventAction::Notify(UiNotification::SessionsChanged {
                        sessions: sessions.clone(),
                    }),
                ];
                // a deleted session can leave the pointer dangling
                if let Some(active) = &snapshot.active_session_id {
                    if !sessions.iter().any(|s| &s.id == active) {
                        actions.push(EventAction::Notify(UiNotification::ActiveSessionChanged {
                            session_id: Some(active.clone()),
                            stale: true,
                        }));
                    }
                }
                actions
            }
            ACTIVE_SESSION_KEY => {
                let session_id = change
                    .new_value
                    .as_ref()
                    .and_then(|v| v.as_str())
                    .map(str::to_string);
                let stale = session_id
                    .as_ref()
                    .is_some_and(|id| !snapshot.sessions.iter().any(|s| &s.id == id));
                vec![EventAction::Notify(UiNotification::ActiveSessionChanged {
                    session_id,
                    stale,
                })]
            }
            SETTINGS_KEY => vec![EventAction::ApplyBadgeStyle, EventAction::RefreshBadge],
            _ => Vec::new(),
        },
    }
}
