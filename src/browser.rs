//! Capabilities the core consumes from the extension runtime.
//!
//! Each trait is an opaque bridge to a browser API. The WASM build backs them
//! with the JS glue in `background.js`; tests back them with in-memory fakes.
//! Futures coming from JS are not `Send`, so every trait is `?Send`.
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Offset, Utc};

use crate::error::Result;
use crate::session_data::{Cookie, CookieSetDetails, TabInfo, WebStorage};

/// Tab queries and control
#[async_trait(?Send)]
pub trait BrowserTabs {
    /// The active tab of the current window, if any
    async fn active_tab(&self) -> Result<Option<TabInfo>>;

    async fn reload(&self, tab_id: i32) -> Result<()>;
}

/// How to change a page's Web Storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebStorageMutation {
    /// Empty both localStorage and sessionStorage
    Clear,
    /// `setItem` every entry, leaving other keys in place
    Insert(WebStorage),
}

/// Script execution inside a tab's page context
#[async_trait(?Send)]
pub trait SitePageAccess {
    async fn read_web_storage(&self, tab_id: i32) -> Result<WebStorage>;

    async fn write_web_storage(&self, tab_id: i32, mutation: WebStorageMutation) -> Result<()>;
}

/// Cookie API scoped by URL
#[async_trait(?Send)]
pub trait CookieJar {
    async fn get_all(&self, url: &str) -> Result<Vec<Cookie>>;

    async fn set(&self, details: CookieSetDetails) -> Result<()>;

    async fn remove(&self, url: &str, name: &str) -> Result<()>;
}

/// The toolbar badge
#[async_trait(?Send)]
pub trait BadgeSink {
    async fn set_text(&self, text: &str) -> Result<()>;

    async fn set_colors(&self, background: &str, text: &str) -> Result<()>;
}

/// Wall clock, injected so timestamps are deterministic under test
pub trait Clock {
    fn now_millis(&self) -> i64;

    /// Minutes east of UTC for the user's local time
    fn utc_offset_minutes(&self) -> i32 {
        0
    }
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Render a timestamp as a default session title, e.g. `Oct 18, 2026, 3:04:05`
pub fn format_title_timestamp(millis: i64, utc_offset_minutes: i32) -> String {
    let offset = FixedOffset::east_opt(utc_offset_minutes.saturating_mul(60))
        .unwrap_or_else(|| Utc.fix());

    DateTime::<Utc>::from_timestamp_millis(millis)
        .unwrap_or_default()
        .with_timezone(&offset)
        .format("%b %-d, %Y, %-I:%M:%S")
        .to_string()
}

/// Default title for a session created or renamed now
pub fn default_title(clock: &dyn Clock) -> String {
    format_title_timestamp(clock.now_millis(), clock.utc_offset_minutes())
}
