use std::collections::HashMap;

use settings_page::host::{
    AdminHost, FieldRegistration, MenuEntry, RequestContext, SectionRegistration, SettingRegistration,
};
use settings_page::{Config, MemoryStore, SettingsPage, SettingsStore, ValidationError};
use tracing_subscriber::EnvFilter;

const GENERAL: &str = r#"
settings_name = "spotify_api"

[page]
id = "spotify-api"
title = "Spotify API Settings"

[menu]
title = "Spotify API"
position = "options-general.php"

[sections.general]
title = "General Settings"
description = "Credentials from the Spotify developer dashboard."

[sections.general.fields.client_id]
title = "Spotify API Client ID"
sanitize_func = "sanitize_title"
is_required = true

[sections.general.fields.client_secret]
title = "Spotify API Client Secret"
sanitize_func = "sanitize_title"
is_required = true
"#;

#[derive(Default)]
struct ConsoleHost {
    setting: Option<SettingRegistration>,
    notices: Vec<ValidationError>,
}

impl AdminHost for ConsoleHost {
    fn add_menu_page(&mut self, entry: &MenuEntry) -> String {
        println!("menu page: {}", entry.menu_title);
        format!("toplevel_page_{}", entry.menu_slug)
    }

    fn add_submenu_page(&mut self, parent: &str, entry: &MenuEntry) -> String {
        println!("submenu page under {parent}: {}", entry.menu_title);
        format!("settings_page_{}", entry.menu_slug)
    }

    fn register_setting(&mut self, registration: SettingRegistration) {
        println!("setting: {}", registration.settings_name);
        self.setting = Some(registration);
    }

    fn add_settings_section(&mut self, registration: SectionRegistration) {
        println!("  section: {}", registration.slug);
    }

    fn add_settings_field(&mut self, registration: FieldRegistration) {
        println!("    field: {}", registration.slug);
    }
}

impl RequestContext for ConsoleHost {
    fn current_user_can(&self, _capability: &str) -> bool {
        true
    }

    fn settings_updated(&self) -> bool {
        true
    }

    fn add_settings_error(&mut self, _settings_name: &str, error: ValidationError) {
        self.notices.push(error);
    }

    fn settings_errors(&mut self, _settings_name: &str) -> String {
        self.notices
            .drain(..)
            .map(|n| format!("[{}] {}\n", n.severity, n.message))
            .collect()
    }

    fn form_fields(&self, group: &str) -> String {
        format!("<input type=\"hidden\" name=\"option_page\" value=\"{group}\">\n")
    }

    fn do_action(&mut self, hook: &str, arg: &str) {
        println!("action {hook}({arg})");
    }
}

fn main() -> Result<(), settings_page::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut store = MemoryStore::new();
    let mut host = ConsoleHost::default();

    let mut page = SettingsPage::builder()
        .with_config(Config::from_toml_str(GENERAL)?)
        .with_store(&store)
        .with_admin_url("https://example.com/wp-admin/")
        .build()?;

    page.on_register_menu(&mut host);
    page.on_register_fields(&mut host);
    println!("page url: {}", page.page().url);

    // Submission through the entry point the host was handed.
    let submitted = HashMap::from([
        ("client_id".to_string(), "My App!".to_string()),
        ("client_secret".to_string(), String::new()),
    ]);
    let sanitized = match &host.setting {
        Some(setting) => setting.sanitize.sanitize(&submitted),
        None => page.sanitize(&submitted),
    };
    sanitized.report(page.settings_name(), &mut host);
    store.save(page.settings_name(), sanitized.to_table())?;

    // Next request: a fresh page over the saved blob.
    let page = SettingsPage::builder()
        .with_config(Config::from_toml_str(GENERAL)?)
        .with_store(&store)
        .build()?;
    println!("client_id resolves to {:?}", page.resolve("client_id"));
    println!("{}", page.render_page(&mut host));
    // Mounted under the options screen, which prints notices itself.
    print!("{}", host.settings_errors(page.settings_name()));

    Ok(())
}
