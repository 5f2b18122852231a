//! Capture, clear and apply a tab's Web Storage and cookies
use std::rc::Rc;

use log::{debug, warn};
use url::Url;

use crate::browser::{BrowserTabs, CookieJar, SitePageAccess, WebStorageMutation};
use crate::error::{Result, SessionError};
use crate::session_data::{CookieSetDetails, SiteState, TabInfo};

/// Bridges the session layer to the live active tab
#[derive(Clone)]
pub struct SiteStateAccessor {
    tabs: Rc<dyn BrowserTabs>,
    page: Rc<dyn SitePageAccess>,
    cookies: Rc<dyn CookieJar>,
}

impl SiteStateAccessor {
    pub fn new(
        tabs: Rc<dyn BrowserTabs>,
        page: Rc<dyn SitePageAccess>,
        cookies: Rc<dyn CookieJar>,
    ) -> Self {
        SiteStateAccessor { tabs, page, cookies }
    }

    /// Active tab that has both an id and a URL
    async fn target_tab(&self) -> Result<Option<(i32, String)>> {
        Ok(match self.tabs.active_tab().await? {
            Some(TabInfo {
                id: Some(id),
                url: Some(url),
                ..
            }) if !url.is_empty() => Some((id, url)),
            _ => None,
        })
    }

    /// Snapshot the active tab. No tab means an empty state, not an error.
    pub async fn capture(&self) -> Result<SiteState> {
        let Some((tab_id, url)) = self.target_tab().await? else {
            return Ok(SiteState::default());
        };

        let storage = self.page.read_web_storage(tab_id).await?;
        let cookies = self.cookies.get_all(&url).await?;
        debug!(
            "Captured {} local, {} session entries and {} cookies",
            storage.local_storage.len(),
            storage.session_storage.len(),
            cookies.len()
        );

        Ok(SiteState::new(storage, cookies))
    }

    /// Wipe Web Storage and every cookie scoped to the tab URL
    pub async fn clear(&self) -> Result<()> {
        let Some((tab_id, url)) = self.target_tab().await? else {
            return Ok(());
        };

        self.page
            .write_web_storage(tab_id, WebStorageMutation::Clear)
            .await?;

        let cookies = self.cookies.get_all(&url).await?;
        for cookie in &cookies {
            if let Err(e) = self.cookies.remove(&url, &cookie.name).await {
                warn!("Failed to remove cookie {}: {}", cookie.name, e);
            }
        }
        debug!("Cleared site state, removed {} cookies", cookies.len());

        Ok(())
    }

    /// Write `state` into the active tab: cookies first, then Web Storage.
    ///
    /// A cookie the browser refuses is skipped; the rest still go through.
    /// Nothing is rolled back if the storage write fails afterwards.
    pub async fn apply(&self, state: &SiteState) -> Result<()> {
        let Some((tab_id, url)) = self.target_tab().await? else {
            return Ok(());
        };

        let origin = Url::parse(&url)
            .map(|u| u.origin().ascii_serialization())
            .map_err(|e| SessionError::storage("resolve tab origin", e.to_string()))?;

        let mut failed = 0;
        for cookie in &state.cookies {
            let details = CookieSetDetails::for_origin(&origin, cookie);
            if let Err(e) = self.cookies.set(details).await {
                warn!("Failed to set cookie {}: {}", cookie.name, e);
                failed += 1;
            }
        }
        debug!(
            "Applied {}/{} cookies",
            state.cookies.len() - failed,
            state.cookies.len()
        );

        self.page
            .write_web_storage(tab_id, WebStorageMutation::Insert(state.web_storage()))
            .await
    }

    /// Replace the tab's state with `state`.
    ///
    /// Clear and apply run back to back in this one task so a late clear can
    /// never wipe freshly applied values.
    pub async fn replace(&self, state: &SiteState) -> Result<()> {
        self.clear().await?;
        self.apply(state).await
    }
}
