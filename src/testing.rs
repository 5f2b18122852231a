//! In-memory stand-ins for the browser capabilities, shared by unit tests
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;

use async_trait::async_trait;

use crate::browser::{BadgeSink, BrowserTabs, Clock, CookieJar, SitePageAccess, WebStorageMutation};
use crate::config::DEFAULT_ICON_URL;
use crate::domain::parse_hostname;
use crate::error::{Result, SessionError};
use crate::session_data::{Cookie, CookieSetDetails, SameSite, Session, SiteState, TabInfo, WebStorage};

pub fn create_test_session(id: &str, host: &str, created_at: i64) -> Session {
    Session {
        id: id.to_string(),
        title: format!("Session {}", id),
        icon_url: DEFAULT_ICON_URL.to_string(),
        domain: parse_hostname(host),
        created_at,
        updated_at: created_at,
        state: SiteState::default(),
    }
}

pub fn create_test_cookie(name: &str, value: &str) -> Cookie {
    Cookie {
        name: name.to_string(),
        value: value.to_string(),
        domain: "app.example.com".to_string(),
        path: "/".to_string(),
        secure: true,
        http_only: false,
        same_site: SameSite::Lax,
        expiration_date: None,
        host_only: true,
        session: true,
        store_id: None,
    }
}

#[derive(Default)]
struct FakeState {
    active_tab: Option<TabInfo>,
    storage: WebStorage,
    cookies: Vec<Cookie>,
    set_requests: Vec<CookieSetDetails>,
    rejected_cookies: HashSet<String>,
    page_access_fails: bool,
    tab_query_fails: bool,
    reloaded: Vec<i32>,
    badge_text: Option<String>,
    badge_colors: Option<(String, String)>,
    badge_fails: bool,
    /// Every mutation in order, for sequencing assertions
    log: Vec<String>,
}

/// One fake tab with its page storage, cookie jar and the toolbar badge
#[derive(Clone, Default)]
pub struct FakeBrowser {
    state: Rc<RefCell<FakeState>>,
}

impl FakeBrowser {
    pub fn with_tab(id: i32, url: &str) -> FakeBrowser {
        let browser = FakeBrowser::default();
        browser.set_active_tab(Some(TabInfo::new(id, url)));
        browser
    }

    pub fn set_active_tab(&self, tab: Option<TabInfo>) {
        self.state.borrow_mut().active_tab = tab;
    }

    pub fn put_local(&self, key: &str, value: &str) {
        self.state
            .borrow_mut()
            .storage
            .local_storage
            .insert(key.to_string(), value.to_string());
    }

    pub fn put_session(&self, key: &str, value: &str) {
        self.state
            .borrow_mut()
            .storage
            .session_storage
            .insert(key.to_string(), value.to_string());
    }

    pub fn put_cookie(&self, cookie: Cookie) {
        self.state.borrow_mut().cookies.push(cookie);
    }

    pub fn reject_cookie(&self, name: &str) {
        self.state.borrow_mut().rejected_cookies.insert(name.to_string());
    }

    pub fn fail_page_access(&self) {
        self.state.borrow_mut().page_access_fails = true;
    }

    pub fn fail_tab_queries(&self) {
        self.state.borrow_mut().tab_query_fails = true;
    }

    pub fn fail_badge(&self) {
        self.state.borrow_mut().badge_fails = true;
    }

    pub fn web_storage(&self) -> WebStorage {
        self.state.borrow().storage.clone()
    }

    pub fn cookies(&self) -> Vec<Cookie> {
        self.state.borrow().cookies.clone()
    }

    pub fn set_requests(&self) -> Vec<CookieSetDetails> {
        self.state.borrow().set_requests.clone()
    }

    pub fn reloaded(&self) -> Vec<i32> {
        self.state.borrow().reloaded.clone()
    }

    pub fn badge_text(&self) -> Option<String> {
        self.state.borrow().badge_text.clone()
    }

    pub fn badge_colors(&self) -> Option<(String, String)> {
        self.state.borrow().badge_colors.clone()
    }

    pub fn log(&self) -> Vec<String> {
        self.state.borrow().log.clone()
    }
}

#[async_trait(?Send)]
impl BrowserTabs for FakeBrowser {
    async fn active_tab(&self) -> Result<Option<TabInfo>> {
        let state = self.state.borrow();
        if state.tab_query_fails {
            return Err(SessionError::storage("query active tab", "tabs API unavailable"));
        }
        Ok(state.active_tab.clone())
    }

    async fn reload(&self, tab_id: i32) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.reloaded.push(tab_id);
        state.log.push(format!("reload:{}", tab_id));
        Ok(())
    }
}

#[async_trait(?Send)]
impl SitePageAccess for FakeBrowser {
    async fn read_web_storage(&self, _tab_id: i32) -> Result<WebStorage> {
        let state = self.state.borrow();
        if state.page_access_fails {
            return Err(SessionError::storage("read web storage", "cannot access page"));
        }
        Ok(state.storage.clone())
    }

    async fn write_web_storage(&self, _tab_id: i32, mutation: WebStorageMutation) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if state.page_access_fails {
            return Err(SessionError::storage("write web storage", "cannot access page"));
        }
        match mutation {
            WebStorageMutation::Clear => {
                state.storage = WebStorage::default();
                state.log.push("storage:clear".to_string());
            }
            WebStorageMutation::Insert(values) => {
                state.storage.local_storage.extend(values.local_storage);
                state.storage.session_storage.extend(values.session_storage);
                state.log.push("storage:insert".to_string());
            }
        }
        Ok(())
    }
}

#[async_trait(?Send)]
impl CookieJar for FakeBrowser {
    async fn get_all(&self, _url: &str) -> Result<Vec<Cookie>> {
        Ok(self.state.borrow().cookies.clone())
    }

    async fn set(&self, details: CookieSetDetails) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.set_requests.push(details.clone());
        if state.rejected_cookies.contains(&details.name) {
            return Err(SessionError::storage("set cookie", "rejected"));
        }
        state.cookies.retain(|c| c.name != details.name);
        state.log.push(format!("cookie:set:{}", details.name));
        state.cookies.push(Cookie {
            name: details.name,
            value: details.value,
            domain: details.domain.unwrap_or_default(),
            path: details.path,
            secure: details.secure,
            http_only: details.http_only,
            same_site: details.same_site,
            expiration_date: details.expiration_date,
            host_only: false,
            session: details.expiration_date.is_none(),
            store_id: None,
        });
        Ok(())
    }

    async fn remove(&self, _url: &str, name: &str) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if state.rejected_cookies.contains(name) {
            return Err(SessionError::storage("remove cookie", "rejected"));
        }
        state.cookies.retain(|c| c.name != name);
        state.log.push(format!("cookie:remove:{}", name));
        Ok(())
    }
}

#[async_trait(?Send)]
impl BadgeSink for FakeBrowser {
    async fn set_text(&self, text: &str) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if state.badge_fails {
            return Err(SessionError::storage("set badge text", "action API unavailable"));
        }
        state.badge_text = Some(text.to_string());
        Ok(())
    }

    async fn set_colors(&self, background: &str, text: &str) -> Result<()> {
        self.state.borrow_mut().badge_colors = Some((background.to_string(), text.to_string()));
        Ok(())
    }
}

/// Clock that only moves when told to
#[derive(Clone)]
pub struct FixedClock {
    now: Rc<Cell<i64>>,
}

impl FixedClock {
    pub fn new(now: i64) -> FixedClock {
        FixedClock {
            now: Rc::new(Cell::new(now)),
        }
    }

    pub fn advance(&self, millis: i64) {
        self.now.set(self.now.get() + millis);
    }
}

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.now.get()
    }
}
