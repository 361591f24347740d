//! Default-filling for the three levels of a page declaration.
//!
//! Each level has a built-in default table. Keys already present in the
//! declaration are never overwritten; missing ones are copied from the table
//! after `${slug}`/`${settings_name}` interpolation.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::Serialize;
use toml::{Table, Value};

use super::{flatten_fields, FieldIndex, FieldModel, PageModel, SectionModel};
use crate::config::resolve::interpolate;
use crate::config::{Config, ConfigError, MenuSpec, SectionSpec};

const PAGE_DEFAULTS: &str = r#"
id = ""
title = ""
hook = ""
required_capability = "manage_options"
template = "settings-page"
"#;

const SECTION_DEFAULTS: &str = r#"
slug = "${slug}"
id = "section-${slug}"
title = ""
description = ""
template = "settings-section"
"#;

const FIELD_DEFAULTS: &str = r#"
slug = "${slug}"
id = "field-${slug}"
type = "text"
title = ""
description = ""
class = "field-${slug}"
name = "${settings_name}[${slug}]"
default = ""
is_required = false
is_required_type = "error"
is_json = false
template = "field-text"
"#;

static PAGE_TABLE: Lazy<Table> = Lazy::new(|| builtin_table(PAGE_DEFAULTS));
static SECTION_TABLE: Lazy<Table> = Lazy::new(|| builtin_table(SECTION_DEFAULTS));
static FIELD_TABLE: Lazy<Table> = Lazy::new(|| builtin_table(FIELD_DEFAULTS));

fn builtin_table(source: &str) -> Table {
    toml::from_str(source).expect("built-in default table is valid TOML")
}

/// Host page used as the URL base for top-level menu entries.
const TOP_LEVEL_PAGE: &str = "admin.php";

/// The runtime model built from one [`Config`].
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub settings_name: String,
    pub menu: MenuSpec,
    pub page: PageModel,
    /// Sections in declaration order.
    pub sections: IndexMap<String, SectionModel>,
    pub fields: FieldIndex,
}

/// Fills in every unspecified key of `config` and derives the computed ones.
///
/// `admin_base` is the host's admin URL that menu positions are relative to.
/// Fails only when a declared value has the wrong type for its key.
pub fn normalize(config: &Config, admin_base: &str) -> Result<Normalized, ConfigError> {
    let page = normalize_page(&config.page, &config.menu, admin_base)?;

    let sections = config
        .sections
        .iter()
        .map(|(slug, spec)| Ok((slug.clone(), normalize_section(slug, spec)?)))
        .collect::<Result<IndexMap<_, _>, ConfigError>>()?;

    let fields = flatten_fields(&config.sections)
        .into_iter()
        .map(|(slug, body)| Ok((slug.clone(), normalize_field(&config.settings_name, &slug, body)?)))
        .collect::<Result<FieldIndex, ConfigError>>()?;

    tracing::debug!(
        settings_name = %config.settings_name,
        page = %page.id,
        sections = sections.len(),
        fields = fields.len(),
        "settings page normalized"
    );

    Ok(Normalized {
        settings_name: config.settings_name.clone(),
        menu: config.menu.clone(),
        page,
        sections,
        fields,
    })
}

impl Normalized {
    /// Rebuilds a [`Config`] that declares every key of this model explicitly.
    ///
    /// Normalizing the result yields this model again.
    pub fn to_config(&self) -> Result<Config, ConfigError> {
        let page = to_table("page", &self.page.id, &self.page)?;

        let mut sections = IndexMap::new();
        for (slug, section) in &self.sections {
            let mut attributes = to_table("section", slug, section)?;
            attributes.remove("fields");

            let mut fields = IndexMap::new();
            for field_slug in &section.fields {
                if let Some(field) = self.fields.get(field_slug) {
                    fields.insert(field_slug.clone(), to_table("field", field_slug, field)?);
                }
            }
            sections.insert(slug.clone(), SectionSpec { fields, attributes });
        }

        Ok(Config {
            settings_name: self.settings_name.clone(),
            page,
            menu: self.menu.clone(),
            sections,
        })
    }
}

fn normalize_page(raw: &Table, menu: &MenuSpec, admin_base: &str) -> Result<PageModel, ConfigError> {
    let mut data = raw.clone();
    take_alias(&mut data, "file", "template");
    fill_missing(&mut data, &PAGE_TABLE, &Table::new())?;

    let id = data
        .get("id")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let base = admin_url(admin_base, menu.parent().unwrap_or(TOP_LEVEL_PAGE));
    data.insert("url".into(), Value::String(page_url(&base, &id)));

    into_model("page", &id, data)
}

fn normalize_section(slug: &str, spec: &SectionSpec) -> Result<SectionModel, ConfigError> {
    let mut data = spec.attributes.clone();
    take_alias(&mut data, "file", "template");
    fill_missing(&mut data, &SECTION_TABLE, &scope(&[("slug", slug)]))?;

    let field_slugs = spec.fields.keys().cloned().map(Value::String).collect();
    data.insert("fields".into(), Value::Array(field_slugs));

    into_model("section", slug, data)
}

fn normalize_field(settings_name: &str, slug: &str, mut data: Table) -> Result<FieldModel, ConfigError> {
    take_alias(&mut data, "file", "template");
    let scope = scope(&[("slug", slug), ("settings_name", settings_name)]);
    fill_missing(&mut data, &FIELD_TABLE, &scope)?;

    if let Some(id) = data.get("id").cloned() {
        data.insert("label_for".into(), id);
    }

    into_model("field", slug, data)
}

/// Copies defaults for keys `data` does not declare.
fn fill_missing(data: &mut Table, defaults: &Table, scope: &Table) -> Result<(), ConfigError> {
    for (key, value) in defaults {
        if data.contains_key(key) {
            continue;
        }
        let value = match value {
            Value::String(s) => Value::String(interpolate(s, scope)?),
            other => other.clone(),
        };
        data.insert(key.clone(), value);
    }
    Ok(())
}

/// Moves a legacy key onto its current name unless the current name is set.
fn take_alias(data: &mut Table, legacy: &str, current: &str) {
    if data.contains_key(current) {
        return;
    }
    if let Some(value) = data.remove(legacy) {
        data.insert(current.to_string(), value);
    }
}

fn scope(pairs: &[(&str, &str)]) -> Table {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
        .collect()
}

fn into_model<T: DeserializeOwned>(kind: &'static str, slug: &str, data: Table) -> Result<T, ConfigError> {
    Value::Table(data)
        .try_into()
        .map_err(|source| ConfigError::InvalidEntity {
            kind,
            slug: slug.to_string(),
            source,
        })
}

fn to_table<T: Serialize>(kind: &'static str, slug: &str, model: &T) -> Result<Table, ConfigError> {
    let value = Value::try_from(model).map_err(|source| ConfigError::SerializeEntity {
        kind,
        slug: slug.to_string(),
        source,
    })?;
    match value {
        Value::Table(table) => Ok(table),
        _ => Ok(Table::new()),
    }
}

/// Joins the host's admin base with a page path.
fn admin_url(base: &str, path: &str) -> String {
    if base.is_empty() {
        return path.to_string();
    }
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Appends a form-encoded `page=<id>` with `?` or `&` depending on whether
/// `base` already has a query.
fn page_url(base: &str, id: &str) -> String {
    let separator = if base.contains('?') { '&' } else { '?' };
    let id: String = url::form_urlencoded::byte_serialize(id.as_bytes()).collect();
    format!("{base}{separator}page={id}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Severity;

    const ADMIN: &str = "https://example.com/wp-admin/";

    fn normalized(source: &str) -> Normalized {
        normalize(&Config::from_toml_str(source).unwrap(), ADMIN).unwrap()
    }

    #[test]
    fn test_field_computed_keys() {
        let model = normalized(
            r#"
            settings_name = "spotify_api"
            [sections.general.fields.client_id]
            title = "Client ID"
            "#,
        );

        let field = model.fields.get("client_id").unwrap();
        assert_eq!(field.slug, "client_id");
        assert_eq!(field.id, "field-client_id");
        assert_eq!(field.class, "field-client_id");
        assert_eq!(field.name, "spotify_api[client_id]");
        assert_eq!(field.label_for, "field-client_id");
        assert_eq!(field.field_type, "text");
        assert_eq!(field.default, Value::String(String::new()));
        assert_eq!(field.template, "field-text");
        assert_eq!(field.is_required_type, Severity::Error);
        assert!(!field.is_required);
        assert!(!field.is_json);
        assert_eq!(field.sanitize_func, None);
    }

    #[test]
    fn test_explicit_keys_are_never_overwritten() {
        let model = normalized(
            r#"
            settings_name = "opts"
            [sections.general.fields.token]
            id = "api-token"
            class = "regular-text"
            name = "custom_name"
            type = "password"
            default = "abc"
            "#,
        );

        let field = model.fields.get("token").unwrap();
        assert_eq!(field.id, "api-token");
        assert_eq!(field.label_for, "api-token");
        assert_eq!(field.class, "regular-text");
        assert_eq!(field.name, "custom_name");
        assert_eq!(field.field_type, "password");
        assert_eq!(field.default.as_str(), Some("abc"));
    }

    #[test]
    fn test_section_keeps_ordered_slugs_only() {
        let model = normalized(
            r#"
            settings_name = "opts"
            [sections.general]
            title = "General"
            [sections.general.fields.b]
            [sections.general.fields.a]
            [sections.advanced.fields.c]
            "#,
        );

        let order: Vec<_> = model.sections.keys().cloned().collect();
        assert_eq!(order, ["general", "advanced"]);

        let general = &model.sections["general"];
        assert_eq!(general.id, "section-general");
        assert_eq!(general.title, "General");
        assert_eq!(general.fields, ["b", "a"]);
        assert_eq!(general.template, "settings-section");
        assert_eq!(model.sections["advanced"].fields, ["c"]);
    }

    #[test]
    fn test_page_defaults_and_submenu_url() {
        let model = normalized(
            r#"
            settings_name = "spotify_api"
            [page]
            id = "spotify-api"
            title = "Spotify API Settings"
            [menu]
            title = "Spotify API"
            position = "options-general.php"
            "#,
        );

        assert_eq!(model.page.required_capability, "manage_options");
        assert_eq!(model.page.template, "settings-page");
        assert_eq!(model.page.hook, "");
        assert_eq!(
            model.page.url,
            "https://example.com/wp-admin/options-general.php?page=spotify-api"
        );
    }

    #[test]
    fn test_url_separator_when_parent_has_query() {
        let model = normalized(
            r#"
            settings_name = "opts"
            [page]
            id = "my page"
            [menu]
            position = "edit.php?post_type=track"
            "#,
        );

        assert_eq!(
            model.page.url,
            "https://example.com/wp-admin/edit.php?post_type=track&page=my+page"
        );
        assert_eq!(model.page.url.matches("page=my+page").count(), 1);
    }

    #[test]
    fn test_top_level_url_uses_admin_page() {
        let model = normalized(
            r#"
            settings_name = "opts"
            [page]
            id = "opts"
            [menu]
            title = "Opts"
            position = 81
            "#,
        );
        assert_eq!(model.page.url, "https://example.com/wp-admin/admin.php?page=opts");
    }

    #[test]
    fn test_empty_admin_base() {
        let config = Config::from_toml_str("settings_name = \"o\"\n[page]\nid = \"o\"").unwrap();
        let model = normalize(&config, "").unwrap();
        assert_eq!(model.page.url, "admin.php?page=o");
    }

    #[test]
    fn test_legacy_file_key() {
        let model = normalized(
            r#"
            settings_name = "opts"
            [page]
            file = "custom-page"
            [sections.general]
            file = "custom-section"
            [sections.general.fields.a]
            file = "field-textarea"
            "#,
        );
        assert_eq!(model.page.template, "custom-page");
        assert_eq!(model.sections["general"].template, "custom-section");
        assert_eq!(model.fields.get("a").unwrap().template, "field-textarea");
        assert!(!model.page.extra.contains_key("file"));
    }

    #[test]
    fn test_unrecognized_keys_pass_through() {
        let model = normalized(
            r#"
            settings_name = "opts"
            [page]
            parent_slug = "tools"
            [sections.general]
            collapsible = true
            [sections.general.fields.a]
            placeholder = "Paste here"
            "#,
        );
        assert_eq!(model.page.extra["parent_slug"].as_str(), Some("tools"));
        assert_eq!(model.sections["general"].extra["collapsible"].as_bool(), Some(true));
        assert_eq!(
            model.fields.get("a").unwrap().extra["placeholder"].as_str(),
            Some("Paste here")
        );
    }

    #[test]
    fn test_wrong_type_is_reported() {
        let config = Config::from_toml_str(
            r#"
            settings_name = "opts"
            [sections.general.fields.a]
            is_required = "yes"
            "#,
        )
        .unwrap();
        let result = normalize(&config, ADMIN);
        assert!(matches!(
            result,
            Err(ConfigError::InvalidEntity { kind: "field", .. })
        ));
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let first = normalized(
            r#"
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
            title = "Client ID"
            sanitize_func = "sanitize_title"
            is_required = true
            [sections.general.fields.payload]
            is_json = true
            default = 5
            "#,
        );

        let second = normalize(&first.to_config().unwrap(), ADMIN).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_page_url_encodes_id() {
        assert_eq!(page_url("admin.php", "a b/c~"), "admin.php?page=a+b%2Fc%7E");
        assert_eq!(page_url("admin.php", "spotify-api_1.0"), "admin.php?page=spotify-api_1.0");
    }

    #[test]
    fn test_severity_names_pass_through() {
        let model = normalized(
            r#"
            settings_name = "opts"
            [sections.general.fields.a]
            is_required_type = "success"
            [sections.general.fields.b]
            is_required_type = "notice-me"
            "#,
        );
        assert_eq!(model.fields.get("a").unwrap().is_required_type, Severity::Success);
        assert_eq!(model.fields.get("b").unwrap().is_required_type, Severity::Error);
    }
}
