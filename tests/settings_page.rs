mod common;

use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;

use common::{FakeRequest, RecordingHost, SPOTIFY};
use settings_page::host::UPDATED_ACTION;
use settings_page::{
    Config, FileStore, MemoryStore, MemoryTemplates, SettingsPage, SettingsStore, Severity, ValidationKind,
};
use toml::{Table, Value};

fn spotify_page() -> SettingsPage {
    SettingsPage::builder()
        .with_config(Config::from_toml_str(SPOTIFY).unwrap())
        .with_admin_url("https://example.com/wp-admin/")
        .build()
        .unwrap()
}

fn submission(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

#[test]
fn submission_is_sanitized_and_validated_end_to_end() {
    let page = spotify_page();
    let out = page.sanitize(&submission(&[("client_id", "My App!"), ("client_secret", "")]));

    assert_eq!(out.values["client_id"], "my-app");
    assert_eq!(out.values["client_secret"], "pending");
    assert_eq!(out.errors.len(), 1);
    assert_eq!(out.errors[0].field_slug, "client_secret");
    assert_eq!(out.errors[0].kind, ValidationKind::Required);
    assert_eq!(out.errors[0].severity, Severity::Error);
    assert_eq!(out.errors[0].message, "The field Spotify API Client Secret is required");
}

#[test]
fn every_field_is_returned_even_when_all_fail() {
    let page = spotify_page();
    let out = page.sanitize(&HashMap::new());

    assert_eq!(out.values.keys().collect::<Vec<_>>(), ["client_id", "client_secret"]);
    assert_eq!(out.values["client_id"], "");
    let failing: Vec<_> = out.errors.iter().map(|e| e.field_slug.as_str()).collect();
    assert_eq!(failing, ["client_id", "client_secret"]);
}

#[test]
fn computed_field_keys_follow_slug_and_settings_name() {
    let page = spotify_page();
    for field in page.fields() {
        assert_eq!(field.id, format!("field-{}", field.slug));
        assert_eq!(field.class, format!("field-{}", field.slug));
        assert_eq!(field.name, format!("spotify_api[{}]", field.slug));
        assert_eq!(field.label_for, field.id);
    }
    assert_eq!(
        page.page().url,
        "https://example.com/wp-admin/options-general.php?page=spotify-api"
    );
}

#[test]
fn normalizing_a_normalized_model_is_identity() {
    let page = spotify_page();
    let again = settings_page::model::normalize(
        &page.model().to_config().unwrap(),
        "https://example.com/wp-admin/",
    )
    .unwrap();
    assert_eq!(page.model(), &again);
}

#[test]
fn falsy_stored_value_is_masked_by_truthy_default() {
    let config = Config::from_toml_str(
        r#"
        settings_name = "opts"
        [sections.general.fields.limit]
        default = "5"
        "#,
    )
    .unwrap();
    let mut stored = Table::new();
    stored.insert("limit".into(), Value::Integer(0));
    let store = MemoryStore::new().with("opts", stored);

    let page = SettingsPage::builder()
        .with_config(config)
        .with_store(&store)
        .build()
        .unwrap();

    assert_eq!(page.resolve("limit"), Some(&Value::String("5".into())));
}

#[test]
fn registration_follows_declaration_order() {
    let config = Config::from_toml_str(
        r#"
        settings_name = "opts"
        [page]
        id = "opts-page"
        title = "Options"
        [menu]
        title = "Opts"
        position = 81
        icon = "dashicons-admin-generic"
        [sections.b]
        title = "B"
        [sections.b.fields.z]
        [sections.b.fields.y]
        [sections.a.fields.x]
        "#,
    )
    .unwrap();
    let mut page = SettingsPage::builder().with_config(config).build().unwrap();
    let mut host = RecordingHost::default();

    let hook = page.on_register_menu(&mut host).to_string();
    page.on_register_fields(&mut host);

    assert_eq!(hook, "toplevel_page_opts-page");
    assert_eq!(page.page().hook, hook);
    assert_eq!(
        host.calls,
        [
            "menu:opts-page",
            "setting:opts-page:opts",
            "section:b",
            "field:b:z",
            "field:b:y",
            "section:a",
            "field:a:x",
        ]
    );

    let (parent, entry) = &host.menu_entries[0];
    assert_eq!(parent, &None);
    assert_eq!(entry.position, Some(81));
    assert_eq!(entry.icon.as_deref(), Some("dashicons-admin-generic"));
    assert_eq!(entry.capability, "manage_options");

    let setting = host.setting.as_ref().unwrap();
    assert_eq!(setting.defaults.keys().collect::<Vec<_>>(), ["z", "y", "x"]);
    let out = setting.sanitize.sanitize(&submission(&[("y", " <i>v</i> ")]));
    assert_eq!(out.values["y"], "v");

    assert_eq!(host.fields[0].label_for, "field-z");
    assert_eq!(host.fields[0].class, "field-z");
}

#[test]
fn submenu_registration_and_asset_gate() {
    let mut page = spotify_page();
    let mut host = RecordingHost::default();

    assert!(!page.on_render_assets(""));
    page.on_register_menu(&mut host);

    assert_eq!(host.calls, ["submenu:options-general.php:spotify-api"]);
    assert!(page.on_render_assets("settings_page_spotify-api"));
    assert!(!page.on_render_assets("toplevel_page_other"));
}

#[test]
fn render_page_requires_capability() {
    let page = spotify_page();
    let mut request = FakeRequest::default();
    assert_eq!(page.render_page(&mut request), "");
    assert!(request.actions.is_empty());
}

#[test]
fn render_page_outputs_sections_and_fields() {
    let mut stored = Table::new();
    stored.insert("client_id".into(), Value::String("my-app".into()));
    let store = MemoryStore::new().with("spotify_api", stored);
    let page = SettingsPage::builder()
        .with_config(Config::from_toml_str(SPOTIFY).unwrap())
        .with_store(&store)
        .build()
        .unwrap();

    let html = page.render_page(&mut FakeRequest::admin());

    assert!(html.contains("<h1>Spotify API Settings</h1>"));
    assert!(html.contains("name=\"option_page\" value=\"spotify-api\""));
    assert!(html.contains("<h2>General Settings</h2>"));
    assert!(html.contains("<label for=\"field-client_id\">Spotify API Client ID</label>"));
    assert!(html.contains("name=\"spotify_api[client_id]\" value=\"my-app\""));
    assert!(html.contains("name=\"spotify_api[client_secret]\" value=\"pending\""));
    let id_pos = html.find("field-client_id").unwrap();
    let secret_pos = html.find("field-client_secret").unwrap();
    assert!(id_pos < secret_pos);
}

#[test]
fn saved_notice_and_action_after_update() {
    let config = Config::from_toml_str(&SPOTIFY.replace("options-general.php", "tools.php")).unwrap();
    let page = SettingsPage::builder().with_config(config).build().unwrap();
    let mut request = FakeRequest::admin();
    request.updated = true;

    let html = page.render_page(&mut request);

    assert_eq!(
        request.actions,
        [(UPDATED_ACTION.to_string(), "spotify-api".to_string())]
    );
    assert!(html.starts_with("<div class=\"notice notice-updated\">Settings saved.</div>"));
    assert!(request.notices.is_empty());
}

#[test]
fn options_screen_prints_its_own_notices() {
    let page = spotify_page();
    let mut request = FakeRequest::admin();
    request.updated = true;

    let html = page.render_page(&mut request);

    assert!(!html.contains("Settings saved."));
    assert_eq!(request.notices.len(), 1);
    assert_eq!(request.notices[0].1.kind, ValidationKind::Notice);
    assert_eq!(request.notices[0].1.severity, Severity::Updated);
}

#[test]
fn missing_templates_render_nothing() {
    let page = SettingsPage::builder()
        .with_config(Config::from_toml_str(SPOTIFY).unwrap())
        .with_templates(Arc::new(MemoryTemplates::new()))
        .build()
        .unwrap();

    assert_eq!(page.render_field("client_id"), "");
    assert_eq!(page.render_section("general"), "");
    assert_eq!(page.render_field("no_such_field"), "");
    assert!(!page.render_page(&mut FakeRequest::admin()).contains("<h1>"));
}

#[test]
fn custom_sanitizer_from_host_registry() {
    let config = Config::from_toml_str(
        r#"
        settings_name = "opts"
        [sections.general.fields.code]
        sanitize_func = "upper"
        "#,
    )
    .unwrap();
    let page = SettingsPage::builder()
        .with_config(config)
        .with_sanitizers(settings_page::SanitizerRegistry::default().with("upper", |s: &str| s.trim().to_uppercase()))
        .build()
        .unwrap();

    let out = page.sanitize(&submission(&[("code", " ab-1 ")]));
    assert_eq!(out.values["code"], "AB-1");
}

#[test]
fn file_config_and_file_store_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("general.toml");
    let mut file = std::fs::File::create(&config_path).unwrap();
    file.write_all(SPOTIFY.as_bytes()).unwrap();

    let mut store = FileStore::new(dir.path().join("options.toml"));
    let config = Config::builder().with_file(&config_path, true).build().unwrap();

    let sanitized = {
        let page = SettingsPage::builder()
            .with_config(config.clone())
            .with_store(&store)
            .build()
            .unwrap();
        page.sanitize(&submission(&[("client_id", "My App!"), ("client_secret", "S3cret")]))
    };
    assert!(sanitized.is_valid());
    store.save("spotify_api", sanitized.to_table()).unwrap();

    let page = SettingsPage::builder()
        .with_config(config)
        .with_store(&store)
        .build()
        .unwrap();
    assert_eq!(page.resolve("client_id"), Some(&Value::String("my-app".into())));
    assert_eq!(page.resolve("client_secret"), Some(&Value::String("s3cret".into())));
}

#[test]
fn submission_errors_reach_the_next_render() {
    let config = Config::from_toml_str(&SPOTIFY.replace("options-general.php", "tools.php")).unwrap();
    let page = SettingsPage::builder().with_config(config).build().unwrap();
    let mut request = FakeRequest::admin();

    let sanitized = page.submit(&mut request, &HashMap::new());
    assert_eq!(sanitized.errors.len(), 2);
    assert_eq!(request.notices.len(), 2);

    request.updated = true;
    let html = page.render_page(&mut request);

    let id_error = html
        .find("<div class=\"notice notice-error\">The field Spotify API Client ID is required</div>")
        .unwrap();
    let secret_error = html.find("The field Spotify API Client Secret is required").unwrap();
    let saved = html.find("Settings saved.").unwrap();
    assert!(id_error < secret_error && secret_error < saved);
    assert!(request.notices.is_empty());
}

#[test]
fn overridden_slugs_keep_their_declared_keys() {
    let config = Config::from_toml_str(
        r#"
        settings_name = "opts"
        [page]
        id = "opts"
        [sections.general]
        slug = "main"
        description = "Main options."
        [sections.general.fields.client_id]
        slug = "cid"
        title = "Client ID"
        [sections.general.fields.other]
        slug = "cid"
        "#,
    )
    .unwrap();
    let mut stored = Table::new();
    stored.insert("client_id".into(), Value::String("abc".into()));
    let store = MemoryStore::new().with("opts", stored);
    let page = SettingsPage::builder()
        .with_config(config)
        .with_store(&store)
        .build()
        .unwrap();
    let mut host = RecordingHost::default();

    page.on_register_fields(&mut host);
    assert_eq!(
        host.calls,
        [
            "setting:opts:opts",
            "section:general",
            "field:general:client_id",
            "field:general:other",
        ]
    );

    assert!(page
        .render_field("client_id")
        .contains("name=\"opts[client_id]\" value=\"abc\""));
    let html = page.render_page(&mut FakeRequest::admin());
    assert!(html.contains("<p>Main options.</p>"));
    assert!(html.contains("name=\"opts[other]\""));

    let out = page.sanitize(&submission(&[("client_id", "xyz")]));
    assert_eq!(out.values.keys().collect::<Vec<_>>(), ["client_id", "other"]);
    assert_eq!(out.values["client_id"], "xyz");
}
