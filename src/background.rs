//! Background service: owns the router and reacts to browser events
use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, warn};

use crate::badge::BadgeUpdater;
use crate::browser::{BadgeSink, BrowserTabs, Clock, CookieJar, SitePageAccess};
use crate::commands::{CommandRouter, Request, Response};
use crate::events::{BrowserEvent, EventAction, StoreSnapshot, UiNotification, plan_actions};
use crate::site_state::SiteStateAccessor;
use crate::storage::{KeyValueStore, SessionStore};

/// Every capability the background needs from the runtime
#[derive(Clone)]
pub struct Platform {
    pub store: Rc<dyn KeyValueStore>,
    pub tabs: Rc<dyn BrowserTabs>,
    pub page: Rc<dyn SitePageAccess>,
    pub cookies: Rc<dyn CookieJar>,
    pub badge: Rc<dyn BadgeSink>,
    pub clock: Rc<dyn Clock>,
}

pub type UiListener = Rc<dyn Fn(&UiNotification)>;

pub struct Background {
    store: SessionStore,
    router: CommandRouter,
    badge: BadgeUpdater,
    listeners: RefCell<Vec<UiListener>>,
}

impl Background {
    pub fn new(platform: Platform) -> Self {
        let store = SessionStore::new(platform.store);
        let site = SiteStateAccessor::new(platform.tabs.clone(), platform.page, platform.cookies);
        let badge = BadgeUpdater::new(store.clone(), platform.tabs.clone(), platform.badge);
        let router = CommandRouter::new(
            store.clone(),
            site,
            platform.tabs,
            badge.clone(),
            platform.clock,
        );

        Background {
            store,
            router,
            badge,
            listeners: RefCell::new(Vec::new()),
        }
    }

    /// Startup: style the badge and show the count for whatever tab is open
    pub async fn init(&self) {
        self.badge.apply_style().await;
        self.badge.refresh().await;
    }

    pub async fn handle_message(&self, request: Request) -> Response {
        debug!("Handling {}", request.action);
        self.router.dispatch(request).await
    }

    pub fn subscribe(&self, listener: UiListener) {
        self.listeners.borrow_mut().push(listener);
    }

    async fn snapshot(&self) -> StoreSnapshot {
        let sessions = match self.store.load().await {
            Ok(data) => data.sessions,
            Err(e) => {
                warn!("Failed to load sessions for event: {}", e);
                Vec::new()
            }
        };
        let active_session_id = self.store.active_session_id().await.unwrap_or_else(|e| {
            warn!("Failed to load active session for event: {}", e);
            None
        });

        StoreSnapshot {
            sessions,
            active_session_id,
        }
    }

    /// Run the plan for one event. Event handling never fails outward.
    pub async fn handle_event(&self, event: BrowserEvent) {
        let snapshot = self.snapshot().await;

        for action in plan_actions(&snapshot, &event) {
            match action {
                EventAction::RefreshBadge => self.badge.refresh().await,
                EventAction::ApplyBadgeStyle => self.badge.apply_style().await,
                EventAction::Notify(notification) => {
                    // listeners may subscribe more listeners while running
                    let listeners: Vec<UiListener> = self.listeners.borrow().clone();
                    for listener in listeners {
                        listener(&notification);
                    }
                }
            }
        }
    }
}
