//! Toolbar badge showing how many saved sessions match the active tab
use std::rc::Rc;

use log::{debug, warn};

use crate::browser::{BadgeSink, BrowserTabs};
use crate::error::{Result, SessionError};
use crate::matching::{filter_sessions_for_host, validate_target_url};
use crate::storage::SessionStore;

/// Counter text: empty for zero, capped as `max+`
pub fn badge_text(count: usize, max_count: usize) -> String {
    match count {
        0 => String::new(),
        n if n > max_count => format!("{}+", max_count),
        n => n.to_string(),
    }
}

/// Derived view; safe to recompute at any time
#[derive(Clone)]
pub struct BadgeUpdater {
    store: SessionStore,
    tabs: Rc<dyn BrowserTabs>,
    sink: Rc<dyn BadgeSink>,
}

impl BadgeUpdater {
    pub fn new(store: SessionStore, tabs: Rc<dyn BrowserTabs>, sink: Rc<dyn BadgeSink>) -> Self {
        BadgeUpdater { store, tabs, sink }
    }

    /// Push the configured badge colors
    pub async fn apply_style(&self) {
        if let Err(e) = self.try_apply_style().await {
            warn!("Failed to apply badge style: {}", e);
        }
    }

    async fn try_apply_style(&self) -> Result<()> {
        let settings = self.store.settings().await?;
        self.sink
            .set_colors(&settings.badge_color, &settings.badge_text_color)
            .await
    }

    /// Recompute the counter. Failures fall back to an empty badge.
    pub async fn refresh(&self) {
        let text = match self.compute_text().await {
            Ok(text) => text,
            Err(e) => {
                debug!("Clearing badge: {}", e);
                String::new()
            }
        };

        if let Err(e) = self.sink.set_text(&text).await {
            warn!("Failed to set badge text: {}", e);
        }
    }

    async fn compute_text(&self) -> Result<String> {
        let settings = self.store.settings().await?;
        if !settings.show_badge {
            return Ok(String::new());
        }

        let tab = self.tabs.active_tab().await?;
        let raw_url = tab.and_then(|t| t.url).ok_or(SessionError::NoActiveTab)?;
        let url = validate_target_url(&raw_url)?;

        let data = self.store.load().await?;
        let count = filter_sessions_for_host(url.host_str().unwrap_or_default(), &data.sessions).len();

        Ok(badge_text(count, settings.badge_max_count))
    }
}
