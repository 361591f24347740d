//! Interfaces the host application implements.
//!
//! The page never reaches for ambient host state: menu and settings
//! registration go through [`AdminHost`], per-request facts and notices
//! through [`RequestContext`].

use indexmap::IndexMap;
use toml::Value;

use crate::sanitize::{SanitizationPipeline, ValidationError};

/// Action fired by `render_page` after a completed save, with the page id.
pub const UPDATED_ACTION: &str = "settings_page/updated";

/// Host page whose own screen already prints settings notices.
pub const OPTIONS_PAGE: &str = "options-general.php";

/// A menu entry to register.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub page_title: String,
    pub menu_title: String,
    pub capability: String,
    /// Page id, used as the menu slug.
    pub menu_slug: String,
    pub icon: Option<String>,
    pub position: Option<i64>,
}

/// The settings blob registration, carrying the sanitize entry point.
#[derive(Debug, Clone)]
pub struct SettingRegistration {
    /// Option group, the page id.
    pub group: String,
    pub settings_name: String,
    pub defaults: IndexMap<String, Value>,
    pub sanitize: SanitizationPipeline,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionRegistration {
    pub slug: String,
    pub title: String,
    pub page: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRegistration {
    pub slug: String,
    pub title: String,
    pub page: String,
    pub section: String,
    pub label_for: String,
    pub class: String,
}

/// Registration side of the host: menus and the settings API.
pub trait AdminHost {
    /// Registers a top-level page; returns its registration handle.
    fn add_menu_page(&mut self, entry: &MenuEntry) -> String;

    /// Registers a page under `parent`; returns its registration handle.
    fn add_submenu_page(&mut self, parent: &str, entry: &MenuEntry) -> String;

    fn register_setting(&mut self, registration: SettingRegistration);

    fn add_settings_section(&mut self, registration: SectionRegistration);

    fn add_settings_field(&mut self, registration: FieldRegistration);
}

/// The current request, as seen while rendering.
pub trait RequestContext {
    fn current_user_can(&self, capability: &str) -> bool;

    /// Whether this request follows a completed save.
    fn settings_updated(&self) -> bool;

    /// Queues a notice for `settings_name`.
    fn add_settings_error(&mut self, settings_name: &str, error: ValidationError);

    /// Markup for the notices queued for `settings_name`; drains the queue.
    fn settings_errors(&mut self, settings_name: &str) -> String;

    /// Hidden form fields the host needs to accept a submission for `group`.
    fn form_fields(&self, group: &str) -> String;

    fn do_action(&mut self, hook: &str, arg: &str);
}
