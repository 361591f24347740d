use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use toml::{Table, Value};

/// The declarative description of one settings page.
///
/// Page, section and field bodies are kept as raw tables: the normalizer fills
/// in whatever they leave out, and keys it does not recognize pass through
/// untouched.
///
/// ```toml
/// settings_name = "spotify_api"
///
/// [page]
/// id = "spotify-api"
/// title = "Spotify API Settings"
///
/// [menu]
/// title = "Spotify API"
/// position = "options-general.php"
///
/// [sections.general]
/// title = "General Settings"
///
/// [sections.general.fields.client_id]
/// title = "Spotify API Client ID"
/// sanitize_func = "sanitize_title"
/// is_required = true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Key under which the host persists the settings blob.
    pub settings_name: String,
    #[serde(default)]
    pub page: Table,
    #[serde(default)]
    pub menu: MenuSpec,
    #[serde(default)]
    pub sections: IndexMap<String, SectionSpec>,
}

impl Config {
    /// Starts an empty config for the given settings name.
    pub fn new(settings_name: impl Into<String>) -> Self {
        Self {
            settings_name: settings_name.into(),
            ..Self::default()
        }
    }

    /// Sets a page attribute.
    pub fn page_attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.page.insert(key.into(), value.into());
        self
    }

    pub fn with_menu(mut self, menu: MenuSpec) -> Self {
        self.menu = menu;
        self
    }

    /// Appends a section. Re-using a slug replaces the body but keeps its position.
    pub fn with_section(mut self, slug: impl Into<String>, section: SectionSpec) -> Self {
        self.sections.insert(slug.into(), section);
        self
    }
}

/// Where the page is mounted in the host's admin menu.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MenuSpec {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<MenuPosition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl MenuSpec {
    /// A submenu entry under the given parent page.
    pub fn submenu(title: impl Into<String>, parent: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            position: Some(MenuPosition::Parent(parent.into())),
            icon: None,
        }
    }

    /// A top-level entry at an optional slot.
    pub fn top_level(title: impl Into<String>, slot: Option<i64>, icon: Option<String>) -> Self {
        Self {
            title: title.into(),
            position: slot.map(MenuPosition::Slot),
            icon,
        }
    }

    /// Parent page path when the entry is a submenu.
    pub fn parent(&self) -> Option<&str> {
        match &self.position {
            Some(MenuPosition::Parent(parent)) => Some(parent),
            _ => None,
        }
    }

    pub fn slot(&self) -> Option<i64> {
        match self.position {
            Some(MenuPosition::Slot(slot)) => Some(slot),
            _ => None,
        }
    }
}

/// A string position names a parent page; an integer is a top-level slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MenuPosition {
    Parent(String),
    Slot(i64),
}

/// One section declaration: its own attributes plus its fields in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionSpec {
    #[serde(default)]
    pub fields: IndexMap<String, Table>,
    #[serde(flatten)]
    pub attributes: Table,
}

impl SectionSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Appends a field body. Re-using a slug replaces the body but keeps its position.
    pub fn field(mut self, slug: impl Into<String>, body: Table) -> Self {
        self.fields.insert(slug.into(), body);
        self
    }
}
