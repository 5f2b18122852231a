//! Command router: decodes UI requests and answers with a uniform envelope
use std::rc::Rc;

use log::{error, info};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::badge::BadgeUpdater;
use crate::browser::{BrowserTabs, Clock, default_title};
use crate::config::DEFAULT_ICON_URL;
use crate::domain::parse_url;
use crate::error::{Result, SessionError, UrlRejection};
use crate::matching::{matching_sessions, validate_target_url};
use crate::session_data::{Session, TabInfo};
use crate::site_state::SiteStateAccessor;
use crate::storage::SessionStore;

/// Raw wire request, `{action, payload?}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Request {
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl Request {
    pub fn new(action: &str, payload: Option<Value>) -> Request {
        Request {
            action: action.to_string(),
            payload,
        }
    }
}

/// Wire response, `{success, message, data?}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Response {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Response {
    pub fn ok(message: &str, data: Option<Value>) -> Response {
        Response {
            success: true,
            message: message.to_string(),
            data,
        }
    }

    pub fn failure(message: impl Into<String>) -> Response {
        Response {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommandPayload {
    session_id: Option<String>,
    title: Option<String>,
}

/// Every action the core understands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    ListSessionsForActiveTab,
    SaveCurrentTabAsSession { title: Option<String> },
    SwitchSession { session_id: Option<String> },
    UpdateSessionTitle { session_id: Option<String>, title: Option<String> },
    DeleteSession { session_id: Option<String> },
    CreateBlankSession,
    RefreshActiveTab,
    GetActiveSessionPointer,
}

impl Command {
    pub const LIST_SESSIONS: &'static str = "list-sessions-for-active-tab";
    pub const SAVE_SESSION: &'static str = "save-current-tab-as-session";
    pub const SWITCH_SESSION: &'static str = "switch-session";
    pub const UPDATE_TITLE: &'static str = "update-session-title";
    pub const DELETE_SESSION: &'static str = "delete-session";
    pub const CREATE_BLANK: &'static str = "create-blank-session";
    pub const REFRESH_TAB: &'static str = "refresh-active-tab";
    pub const GET_ACTIVE: &'static str = "get-active-session-pointer";

    pub const ACTIONS: [&'static str; 8] = [
        Self::LIST_SESSIONS,
        Self::SAVE_SESSION,
        Self::SWITCH_SESSION,
        Self::UPDATE_TITLE,
        Self::DELETE_SESSION,
        Self::CREATE_BLANK,
        Self::REFRESH_TAB,
        Self::GET_ACTIVE,
    ];

    /// Decode a wire request. Unknown actions are an error, never ignored.
    pub fn from_request(request: &Request) -> Result<Command> {
        // name first, so a bad payload on an unknown action still reads as unknown
        if !Self::ACTIONS.contains(&request.action.as_str()) {
            return Err(SessionError::UnknownCommand(request.action.clone()));
        }

        let payload: CommandPayload = match &request.payload {
            Some(Value::Null) | None => CommandPayload::default(),
            Some(value) => serde_json::from_value(value.clone())?,
        };
        // empty strings count as absent, matching how the UI sends blanks
        let session_id = payload.session_id.filter(|id| !id.is_empty());
        let title = payload.title.filter(|t| !t.trim().is_empty());

        Ok(match request.action.as_str() {
            Self::LIST_SESSIONS => Command::ListSessionsForActiveTab,
            Self::SAVE_SESSION => Command::SaveCurrentTabAsSession { title },
            Self::SWITCH_SESSION => Command::SwitchSession { session_id },
            Self::UPDATE_TITLE => Command::UpdateSessionTitle { session_id, title },
            Self::DELETE_SESSION => Command::DeleteSession { session_id },
            Self::CREATE_BLANK => Command::CreateBlankSession,
            Self::REFRESH_TAB => Command::RefreshActiveTab,
            Self::GET_ACTIVE => Command::GetActiveSessionPointer,
            other => return Err(SessionError::UnknownCommand(other.to_string())),
        })
    }

    pub fn action(&self) -> &'static str {
        match self {
            Command::ListSessionsForActiveTab => Self::LIST_SESSIONS,
            Command::SaveCurrentTabAsSession { .. } => Self::SAVE_SESSION,
            Command::SwitchSession { .. } => Self::SWITCH_SESSION,
            Command::UpdateSessionTitle { .. } => Self::UPDATE_TITLE,
            Command::DeleteSession { .. } => Self::DELETE_SESSION,
            Command::CreateBlankSession => Self::CREATE_BLANK,
            Command::RefreshActiveTab => Self::REFRESH_TAB,
            Command::GetActiveSessionPointer => Self::GET_ACTIVE,
        }
    }
}

fn require_session_id(session_id: Option<String>) -> Result<String> {
    session_id.ok_or(SessionError::MissingRequiredField("session ID"))
}

/// Stateless handler for UI commands; each call stands alone
#[derive(Clone)]
pub struct CommandRouter {
    store: SessionStore,
    site: SiteStateAccessor,
    tabs: Rc<dyn BrowserTabs>,
    badge: BadgeUpdater,
    clock: Rc<dyn Clock>,
}

impl CommandRouter {
    pub fn new(
        store: SessionStore,
        site: SiteStateAccessor,
        tabs: Rc<dyn BrowserTabs>,
        badge: BadgeUpdater,
        clock: Rc<dyn Clock>,
    ) -> Self {
        CommandRouter {
            store,
            site,
            tabs,
            badge,
            clock,
        }
    }

    /// Entry point for the message channel. Never fails: every error comes
    /// back as `{success: false, message}`.
    pub async fn dispatch(&self, request: Request) -> Response {
        let result = match Command::from_request(&request) {
            Ok(command) => self.handle(command).await,
            Err(e) => Err(e),
        };

        result.unwrap_or_else(|e| {
            error!("[{}] {}", request.action, e);
            Response::failure(e.to_string())
        })
    }

    pub async fn handle(&self, command: Command) -> Result<Response> {
        match command {
            Command::ListSessionsForActiveTab => self.list_sessions().await,
            Command::SaveCurrentTabAsSession { title } => self.save_current_tab(title).await,
            Command::SwitchSession { session_id } => self.switch_session(session_id).await,
            Command::UpdateSessionTitle { session_id, title } => {
                self.update_session_title(session_id, title).await
            }
            Command::DeleteSession { session_id } => self.delete_session(session_id).await,
            Command::CreateBlankSession => self.create_blank_session().await,
            Command::RefreshActiveTab => self.refresh_active_tab().await,
            Command::GetActiveSessionPointer => self.get_active_session().await,
        }
    }

    async fn active_tab(&self) -> Result<TabInfo> {
        self.tabs.active_tab().await?.ok_or(SessionError::NoActiveTab)
    }

    async fn list_sessions(&self) -> Result<Response> {
        let tab = self.active_tab().await?;
        let raw_url = tab.url.as_deref().ok_or(SessionError::NoActiveTab)?;
        let url = validate_target_url(raw_url)?;

        let data = self.store.load().await?;
        let sessions = matching_sessions(&url, &data.sessions, tab.fav_icon_url.as_deref());

        self.badge.refresh().await;

        Ok(Response::ok(
            "Sessions retrieved successfully",
            Some(serde_json::to_value(&sessions)?),
        ))
    }

    async fn save_current_tab(&self, title: Option<String>) -> Result<Response> {
        let tab = self.active_tab().await?;
        let raw_url = tab.url.clone().ok_or(SessionError::NoActiveTab)?;
        let url = url::Url::parse(&raw_url).map_err(|_| UrlRejection::InvalidUrl)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(UrlRejection::UnsupportedPageType.into());
        }

        let state = self.site.capture().await.map_err(|e| {
            error!("Failed to capture site state: {}", e);
            SessionError::from(UrlRejection::UnsupportedPageType)
        })?;

        let now = self.clock.now_millis();
        let session = Session {
            id: Uuid::new_v4().to_string(),
            title: title.unwrap_or_else(|| default_title(self.clock.as_ref())),
            icon_url: tab
                .fav_icon_url
                .filter(|f| !f.is_empty())
                .unwrap_or_else(|| DEFAULT_ICON_URL.to_string()),
            domain: parse_url(&raw_url),
            created_at: now,
            updated_at: now,
            state,
        };

        let mut data = self.store.load().await?;
        data.add_session(session.clone());
        self.store.save(&data).await?;
        self.store.set_active_session_id(&session.id).await?;
        info!("Saved session {} for {}", session.id, session.domain.fully_qualified_hostname);

        self.badge.refresh().await;

        Ok(Response::ok(
            "Session saved successfully",
            Some(serde_json::to_value(&session)?),
        ))
    }

    async fn switch_session(&self, session_id: Option<String>) -> Result<Response> {
        let session_id = require_session_id(session_id)?;

        let data = self.store.load().await?;
        let session = data
            .get_session(&session_id)
            .ok_or_else(|| SessionError::SessionNotFound(session_id.clone()))?;

        self.site.replace(&session.state).await?;
        self.store.set_active_session_id(&session_id).await?;
        info!("Switched to session {}", session_id);

        self.badge.refresh().await;

        Ok(Response::ok("Session switched successfully", Some(Value::String(session_id))))
    }

    async fn update_session_title(
        &self,
        session_id: Option<String>,
        title: Option<String>,
    ) -> Result<Response> {
        let session_id = require_session_id(session_id)?;
        let title = title.unwrap_or_else(|| default_title(self.clock.as_ref()));

        let mut data = self.store.load().await?;
        let updated = data
            .update_session_title(&session_id, title, self.clock.now_millis())
            .ok_or_else(|| SessionError::SessionNotFound(session_id.clone()))?;
        self.store.save(&data).await?;

        self.badge.refresh().await;

        Ok(Response::ok(
            "Session updated successfully",
            Some(serde_json::to_value(&updated)?),
        ))
    }

    async fn delete_session(&self, session_id: Option<String>) -> Result<Response> {
        let session_id = require_session_id(session_id)?;

        let mut data = self.store.load().await?;
        if data.remove_session(&session_id) {
            self.store.save(&data).await?;
            info!("Deleted session {}", session_id);
        }

        self.badge.refresh().await;

        Ok(Response::ok("Session deleted successfully", Some(Value::String(session_id))))
    }

    async fn create_blank_session(&self) -> Result<Response> {
        let tab = self.active_tab().await?;
        if tab.id.is_none() {
            return Err(SessionError::NoActiveTab);
        }

        self.site.clear().await?;
        self.store.clear_active_session_id().await?;

        self.badge.refresh().await;

        Ok(Response::ok("New session created successfully", None))
    }

    async fn refresh_active_tab(&self) -> Result<Response> {
        let tab_id = self.active_tab().await?.id.ok_or(SessionError::NoActiveTab)?;

        self.tabs.reload(tab_id).await?;

        Ok(Response::ok("Current tab refreshed successfully", None))
    }

    async fn get_active_session(&self) -> Result<Response> {
        let active = self.store.active_session_id().await?;

        Ok(Response::ok(
            "Active session ID retrieved successfully",
            Some(active.map(Value::String).unwrap_or(Value::Null)),
        ))
    }
}
