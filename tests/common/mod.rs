#![allow(dead_code)]

use settings_page::host::{
    AdminHost, FieldRegistration, MenuEntry, RequestContext, SectionRegistration, SettingRegistration,
};
use settings_page::ValidationError;

pub const SPOTIFY: &str = r#"
settings_name = "spotify_api"

[page]
id = "spotify-api"
title = "Spotify API Settings"

[menu]
title = "Spotify API"
position = "options-general.php"

[sections.general]
title = "General Settings"

[sections.general.fields.client_id]
title = "Spotify API Client ID"
sanitize_func = "sanitize_title"
is_required = true

[sections.general.fields.client_secret]
title = "Spotify API Client Secret"
sanitize_func = "sanitize_title"
is_required = true
default = "pending"
"#;

/// Records every registration call in order.
#[derive(Debug, Default)]
pub struct RecordingHost {
    pub calls: Vec<String>,
    pub menu_entries: Vec<(Option<String>, MenuEntry)>,
    pub setting: Option<SettingRegistration>,
    pub fields: Vec<FieldRegistration>,
}

impl AdminHost for RecordingHost {
    fn add_menu_page(&mut self, entry: &MenuEntry) -> String {
        self.calls.push(format!("menu:{}", entry.menu_slug));
        self.menu_entries.push((None, entry.clone()));
        format!("toplevel_page_{}", entry.menu_slug)
    }

    fn add_submenu_page(&mut self, parent: &str, entry: &MenuEntry) -> String {
        self.calls.push(format!("submenu:{parent}:{}", entry.menu_slug));
        self.menu_entries.push((Some(parent.to_string()), entry.clone()));
        format!("settings_page_{}", entry.menu_slug)
    }

    fn register_setting(&mut self, registration: SettingRegistration) {
        self.calls.push(format!("setting:{}:{}", registration.group, registration.settings_name));
        self.setting = Some(registration);
    }

    fn add_settings_section(&mut self, registration: SectionRegistration) {
        self.calls.push(format!("section:{}", registration.slug));
    }

    fn add_settings_field(&mut self, registration: FieldRegistration) {
        self.calls.push(format!("field:{}:{}", registration.section, registration.slug));
        self.fields.push(registration);
    }
}

/// A scripted request with an in-memory notice queue.
#[derive(Debug, Default)]
pub struct FakeRequest {
    pub capabilities: Vec<String>,
    pub updated: bool,
    pub notices: Vec<(String, ValidationError)>,
    pub actions: Vec<(String, String)>,
}

impl FakeRequest {
    pub fn admin() -> Self {
        Self {
            capabilities: vec!["manage_options".to_string()],
            ..Self::default()
        }
    }
}

impl RequestContext for FakeRequest {
    fn current_user_can(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|c| c == capability)
    }

    fn settings_updated(&self) -> bool {
        self.updated
    }

    fn add_settings_error(&mut self, settings_name: &str, error: ValidationError) {
        self.notices.push((settings_name.to_string(), error));
    }

    fn settings_errors(&mut self, settings_name: &str) -> String {
        let mut out = String::new();
        self.notices.retain(|(name, error)| {
            if name == settings_name {
                out.push_str(&format!(
                    "<div class=\"notice notice-{}\">{}</div>\n",
                    error.severity, error.message
                ));
                false
            } else {
                true
            }
        });
        out
    }

    fn form_fields(&self, group: &str) -> String {
        format!("<input type=\"hidden\" name=\"option_page\" value=\"{group}\">\n")
    }

    fn do_action(&mut self, hook: &str, arg: &str) {
        self.actions.push((hook.to_string(), arg.to_string()));
    }
}
