//! Storage keys, defaults and user settings
use serde::{Deserialize, Serialize};

/// Persisted session list
pub const SESSIONS_KEY: &str = "sessions";
/// Id of the session most recently applied to the browser
pub const ACTIVE_SESSION_KEY: &str = "activeSessionId";
pub const SETTINGS_KEY: &str = "settings";

/// Icon used when the tab has no favicon at save time
pub const DEFAULT_ICON_URL: &str = "/icon32.png";

pub const DEFAULT_BADGE_MAX_COUNT: usize = 99;
pub const DEFAULT_BADGE_COLOR: &str = "#000000";
pub const DEFAULT_BADGE_TEXT_COLOR: &str = "#FFFFFF";

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
    System,
}

/// User-facing settings, edited by the options page.
///
/// Only the badge fields are read here. `theme` and the `confirm_before_*`
/// flags belong to the popup and options page, which share this one typed
/// shape with the background. Unknown or missing fields fall back
/// to defaults so an older stored blob keeps loading.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub theme: Theme,
    pub confirm_before_delete: bool,
    pub confirm_before_switch: bool,
    pub confirm_before_new_session: bool,
    pub show_badge: bool,
    pub badge_color: String,
    pub badge_text_color: String,
    pub badge_max_count: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            theme: Theme::Light,
            confirm_before_delete: true,
            confirm_before_switch: false,
            confirm_before_new_session: false,
            show_badge: true,
            badge_color: DEFAULT_BADGE_COLOR.to_string(),
            badge_text_color: DEFAULT_BADGE_TEXT_COLOR.to_string(),
            badge_max_count: DEFAULT_BADGE_MAX_COUNT,
        }
    }
}

impl Settings {
    /// Settings from a stored value; malformed blobs fall back to defaults.
    pub fn from_stored(value: Option<serde_json::Value>) -> Settings {
        match value {
            Some(value) => serde_json::from_value(value).unwrap_or_else(|e| {
                log::warn!("Ignoring malformed settings: {}", e);
                Settings::default()
            }),
            None => Settings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();

        assert!(settings.show_badge);
        assert!(settings.confirm_before_delete);
        assert_eq!(settings.badge_max_count, 99);
        assert_eq!(settings.badge_color, "#000000");
        assert_eq!(settings.badge_text_color, "#FFFFFF");
    }

    #[test]
    fn test_partial_settings_fill_defaults() {
        let settings = Settings::from_stored(Some(json!({
            "showBadge": false,
            "badgeMaxCount": 9,
            "theme": "dark"
        })));

        assert!(!settings.show_badge);
        assert_eq!(settings.badge_max_count, 9);
        assert_eq!(settings.theme, Theme::Dark);
        assert_eq!(settings.badge_color, DEFAULT_BADGE_COLOR);
    }

    #[test]
    fn test_ui_fields_round_trip() {
        let stored = json!({
            "theme": "system",
            "confirmBeforeDelete": false,
            "confirmBeforeSwitch": true,
            "confirmBeforeNewSession": true
        });

        let settings = Settings::from_stored(Some(stored));
        let written = serde_json::to_value(&settings).unwrap();

        assert_eq!(written["theme"], "system");
        assert_eq!(written["confirmBeforeDelete"], false);
        assert_eq!(written["confirmBeforeSwitch"], true);
        assert_eq!(written["confirmBeforeNewSession"], true);
    }

    #[test]
    fn test_malformed_settings() {
        let settings = Settings::from_stored(Some(json!({ "badgeMaxCount": "lots" })));
        assert_eq!(settings, Settings::default());

        assert_eq!(Settings::from_stored(None), Settings::default());
    }
}
