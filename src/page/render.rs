use std::fmt::Write as _;

use html_escape::{encode_double_quoted_attribute, encode_text};

use super::SettingsPage;
use crate::host::{RequestContext, OPTIONS_PAGE, UPDATED_ACTION};
use crate::model::{Severity, SectionModel};
use crate::sanitize::{ValidationError, ValidationKind};
use crate::template::Entity;

impl SettingsPage {
    /// Renders the whole page for the current request.
    ///
    /// Renders nothing for users without the page's capability. After a
    /// completed save a confirmation notice is queued and the updated action
    /// fires. Queued notices are printed unless the page lives under the
    /// host's options screen, which prints them itself.
    pub fn render_page(&self, request: &mut dyn RequestContext) -> String {
        let page = &self.model.page;
        if !request.current_user_can(&page.required_capability) {
            tracing::debug!(page = %page.id, capability = %page.required_capability, "render denied");
            return String::new();
        }

        let settings_name = self.settings_name();
        if request.settings_updated() {
            request.add_settings_error(
                settings_name,
                ValidationError {
                    field_slug: "settings-saved".to_string(),
                    kind: ValidationKind::Notice,
                    message: "Settings saved.".to_string(),
                    severity: Severity::Updated,
                },
            );
            request.do_action(UPDATED_ACTION, &page.id);
        }

        let mut out = String::new();
        if self.menu().parent() != Some(OPTIONS_PAGE) {
            out.push_str(&request.settings_errors(settings_name));
        }

        let content = self.form_content(&*request);
        out.push_str(&self.templates.render(&Entity::Page {
            page,
            content: &content,
        }));
        out
    }

    /// Renders one section's template; accepts the section slug or id.
    pub fn render_section(&self, section_id: &str) -> String {
        match self.section(section_id) {
            Some(section) => self.templates.render(&Entity::Section(section)),
            None => {
                tracing::debug!(section = %section_id, "unknown section, rendering nothing");
                String::new()
            }
        }
    }

    /// Renders one field's template with its display value.
    pub fn render_field(&self, field_slug: &str) -> String {
        let Some(field) = self.field(field_slug) else {
            tracing::debug!(field = %field_slug, "unknown field, rendering nothing");
            return String::new();
        };
        let value = crate::value::display_value(&self.settings, field_slug, field);
        self.templates.render(&Entity::Field { field, value })
    }

    /// Host form fields followed by every section with its field rows.
    fn form_content(&self, request: &dyn RequestContext) -> String {
        let mut content = request.form_fields(&self.model.page.id);
        for (section_slug, section) in &self.model.sections {
            self.write_section(&mut content, section_slug, section);
        }
        content
    }

    fn write_section(&self, out: &mut String, section_slug: &str, section: &SectionModel) {
        if !section.title.is_empty() {
            let _ = writeln!(out, "<h2>{}</h2>", encode_text(&section.title));
        }
        out.push_str(&self.render_section(section_slug));

        if section.fields.is_empty() {
            return;
        }
        out.push_str("<table class=\"form-table\" role=\"presentation\">\n");
        for slug in &section.fields {
            let Some(field) = self.field(slug) else {
                continue;
            };
            let label = if field.label_for.is_empty() {
                encode_text(&field.title).into_owned()
            } else {
                format!(
                    "<label for=\"{}\">{}</label>",
                    encode_double_quoted_attribute(&field.label_for),
                    encode_text(&field.title)
                )
            };
            let _ = writeln!(
                out,
                "<tr class=\"{}\"><th scope=\"row\">{}</th><td>{}</td></tr>",
                encode_double_quoted_attribute(&field.class),
                label,
                self.render_field(slug)
            );
        }
        out.push_str("</table>\n");
    }
}
