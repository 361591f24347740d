use super::SettingsPage;
use crate::host::{AdminHost, FieldRegistration, MenuEntry, SectionRegistration, SettingRegistration};

impl SettingsPage {
    /// Registers the page in the host menu and records the returned handle.
    ///
    /// A string menu position mounts the page as a submenu of that parent;
    /// otherwise it becomes a top-level entry.
    pub fn on_register_menu(&mut self, host: &mut dyn AdminHost) -> &str {
        let page = &self.model.page;
        let menu = &self.model.menu;
        let entry = MenuEntry {
            page_title: page.title.clone(),
            menu_title: menu.title.clone(),
            capability: page.required_capability.clone(),
            menu_slug: page.id.clone(),
            icon: menu.icon.clone(),
            position: menu.slot(),
        };

        let hook = match menu.parent() {
            Some(parent) => host.add_submenu_page(parent, &entry),
            None => host.add_menu_page(&entry),
        };
        tracing::debug!(page = %page.id, %hook, "settings page registered in menu");

        self.model.page.hook = hook;
        &self.model.page.hook
    }

    /// Registers the settings blob, then every section and its fields in
    /// declaration order.
    pub fn on_register_fields(&self, host: &mut dyn AdminHost) {
        let page_id = &self.model.page.id;

        host.register_setting(SettingRegistration {
            group: page_id.clone(),
            settings_name: self.model.settings_name.clone(),
            defaults: self.defaults.clone(),
            sanitize: self.pipeline.clone(),
        });

        for (section_slug, section) in &self.model.sections {
            host.add_settings_section(SectionRegistration {
                slug: section_slug.clone(),
                title: section.title.clone(),
                page: page_id.clone(),
            });

            for field_slug in &section.fields {
                let Some(field) = self.model.fields.get(field_slug) else {
                    continue;
                };
                host.add_settings_field(FieldRegistration {
                    slug: field_slug.clone(),
                    title: field.title.clone(),
                    page: page_id.clone(),
                    section: section_slug.clone(),
                    label_for: field.label_for.clone(),
                    class: field.class.clone(),
                });
            }
        }

        tracing::debug!(
            page = %page_id,
            sections = self.model.sections.len(),
            fields = self.model.fields.len(),
            "settings registered"
        );
    }

    /// Asset hook. Returns whether `hook` is this page's own screen; nothing
    /// is enqueued yet.
    pub fn on_render_assets(&self, hook: &str) -> bool {
        let own = &self.model.page.hook;
        !own.is_empty() && own == hook
    }
}
