//! Template resolution for pages, sections and fields.
//!
//! Every normalized entity names a template. Resolution is a plain lookup in a
//! [`TemplateRegistry`]; an identifier with no target renders nothing, so a
//! missing template can never abort a page render.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use toml::{Table, Value};

use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::model::{FieldModel, PageModel, SectionModel};
use crate::sanitize::strip_tags;
use crate::value::value_to_string;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Page,
    Section,
    Field,
}

/// A normalized entity, ready to hand to its render target.
#[derive(Debug, Clone, Copy)]
pub enum Entity<'a> {
    /// `content` is the already rendered form body.
    Page { page: &'a PageModel, content: &'a str },
    Section(&'a SectionModel),
    /// `value` is the field's display value.
    Field { field: &'a FieldModel, value: &'a Value },
}

impl Entity<'_> {
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Page { .. } => EntityKind::Page,
            Entity::Section(_) => EntityKind::Section,
            Entity::Field { .. } => EntityKind::Field,
        }
    }

    pub fn template_id(&self) -> &str {
        match self {
            Entity::Page { page, .. } => &page.template,
            Entity::Section(section) => &section.template,
            Entity::Field { field, .. } => &field.template,
        }
    }

    /// Flat attribute table of the entity, including unrecognized keys.
    ///
    /// Pages add `content`, fields add `value`.
    pub fn attributes(&self) -> Table {
        let (serialized, extra) = match self {
            Entity::Page { page, content } => (
                Value::try_from(page),
                Some(("content", Value::String(content.to_string()))),
            ),
            Entity::Section(section) => (Value::try_from(section), None),
            Entity::Field { field, value } => (
                Value::try_from(field),
                Some(("value", Value::String(value_to_string(value)))),
            ),
        };
        let mut table = match serialized {
            Ok(Value::Table(table)) => table,
            _ => Table::new(),
        };
        if let Some((key, value)) = extra {
            table.insert(key.to_string(), value);
        }
        table
    }
}

/// Something that turns an entity into markup.
pub trait RenderTarget: Send + Sync {
    fn render(&self, entity: &Entity<'_>) -> String;
}

impl<F> RenderTarget for F
where
    F: Fn(&Entity<'_>) -> String + Send + Sync,
{
    fn render(&self, entity: &Entity<'_>) -> String {
        self(entity)
    }
}

/// Host-provided lookup from template identifier to render target.
pub trait TemplateRegistry: Send + Sync {
    fn lookup(&self, id: &str) -> Option<Arc<dyn RenderTarget>>;
}

/// Templates registered in memory.
#[derive(Clone, Default)]
pub struct MemoryTemplates {
    targets: HashMap<String, Arc<dyn RenderTarget>>,
}

impl MemoryTemplates {
    pub fn new() -> Self {
        Self::default()
    }

    /// The default `settings-page`, `settings-section` and `field-text` views.
    pub fn builtin() -> Self {
        Self::new()
            .with("settings-page", render_page_view)
            .with("settings-section", render_section_view)
            .with("field-text", render_text_field_view)
    }

    pub fn insert(&mut self, id: impl Into<String>, target: impl RenderTarget + 'static) {
        self.targets.insert(id.into(), Arc::new(target));
    }

    pub fn with(mut self, id: impl Into<String>, target: impl RenderTarget + 'static) -> Self {
        self.insert(id, target);
        self
    }
}

impl fmt::Debug for MemoryTemplates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<_> = self.targets.keys().collect();
        ids.sort();
        f.debug_struct("MemoryTemplates").field("ids", &ids).finish()
    }
}

impl TemplateRegistry for MemoryTemplates {
    fn lookup(&self, id: &str) -> Option<Arc<dyn RenderTarget>> {
        self.targets.get(id).cloned()
    }
}

/// Templates stored as Liquid files under a root directory.
///
/// The identifier `field-text` maps to `<root>/field-text.html`. A file is
/// read when it is looked up; missing or unreadable files are misses. The
/// template sees every key of [`Entity::attributes`] as a string variable,
/// already HTML-escaped except the page's `content`.
#[derive(Debug, Clone)]
pub struct DirTemplates {
    root: PathBuf,
    extension: String,
}

impl DirTemplates {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            extension: "html".to_string(),
        }
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    fn path_for(&self, id: &str) -> Option<PathBuf> {
        let name = Path::new(id);
        // Identifiers are single file stems; anything path-like is a miss.
        if id.is_empty() || name.components().count() != 1 || id.contains("..") {
            return None;
        }
        Some(self.root.join(format!("{id}.{}", self.extension)))
    }
}

impl TemplateRegistry for DirTemplates {
    fn lookup(&self, id: &str) -> Option<Arc<dyn RenderTarget>> {
        let path = self.path_for(id)?;
        match std::fs::read_to_string(&path) {
            Ok(source) => Some(Arc::new(FileTemplate { source })),
            Err(e) => {
                tracing::trace!(path = %path.display(), error = %e, "template file not readable");
                None
            }
        }
    }
}

struct FileTemplate {
    source: String,
}

impl FileTemplate {
    fn globals(entity: &Entity<'_>) -> liquid::Object {
        let mut globals = liquid::Object::new();
        for (key, value) in entity.attributes() {
            let text = value_to_string(&value);
            let text = if key == "content" {
                text
            } else {
                encode_double_quoted_attribute(&text).into_owned()
            };
            globals.insert(
                key.into(),
                liquid::model::to_value(&text).unwrap_or(liquid::model::Value::Nil),
            );
        }
        globals
    }
}

impl RenderTarget for FileTemplate {
    fn render(&self, entity: &Entity<'_>) -> String {
        let rendered = liquid::ParserBuilder::with_stdlib()
            .build()
            .and_then(|parser| parser.parse(&self.source))
            .and_then(|template| template.render(&Self::globals(entity)));
        match rendered {
            Ok(markup) => markup,
            Err(e) => {
                tracing::warn!(template = %entity.template_id(), error = %e, "template did not render");
                String::new()
            }
        }
    }
}

/// Resolves entities against a registry.
#[derive(Clone)]
pub struct TemplateResolver {
    registry: Arc<dyn TemplateRegistry>,
}

impl TemplateResolver {
    pub fn new(registry: Arc<dyn TemplateRegistry>) -> Self {
        Self { registry }
    }

    /// The render target for `entity`, if its template is registered.
    pub fn resolve(&self, entity: &Entity<'_>) -> Option<Arc<dyn RenderTarget>> {
        let target = self.registry.lookup(entity.template_id());
        if target.is_none() {
            tracing::debug!(
                kind = ?entity.kind(),
                template = %entity.template_id(),
                "no template registered, rendering nothing"
            );
        }
        target
    }

    /// Renders `entity`, or returns an empty string on a miss.
    pub fn render(&self, entity: &Entity<'_>) -> String {
        self.resolve(entity)
            .map(|target| target.render(entity))
            .unwrap_or_default()
    }
}

impl Default for TemplateResolver {
    fn default() -> Self {
        Self::new(Arc::new(MemoryTemplates::builtin()))
    }
}

impl fmt::Debug for TemplateResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateResolver").finish_non_exhaustive()
    }
}

fn render_page_view(entity: &Entity<'_>) -> String {
    let Entity::Page { page, content } = entity else {
        return String::new();
    };
    format!(
        "<div class=\"wrap\">\n<h1>{}</h1>\n<form action=\"options.php\" method=\"post\">\n{}\n\
         <p class=\"submit\"><input type=\"submit\" name=\"submit\" class=\"button button-primary\" value=\"Save Changes\"></p>\n\
         </form>\n</div>\n",
        encode_text(&page.title),
        content
    )
}

fn render_section_view(entity: &Entity<'_>) -> String {
    match entity {
        Entity::Section(section) if !section.description.is_empty() => {
            format!("<p>{}</p>\n", strip_tags(&section.description))
        }
        _ => String::new(),
    }
}

fn render_text_field_view(entity: &Entity<'_>) -> String {
    let Entity::Field { field, value } = entity else {
        return String::new();
    };
    let mut out = format!(
        "<input type=\"{}\" id=\"{}\" class=\"large-text\" name=\"{}\" value=\"{}\">\n",
        encode_double_quoted_attribute(&field.field_type),
        encode_double_quoted_attribute(&field.id),
        encode_double_quoted_attribute(&field.name),
        encode_double_quoted_attribute(&value_to_string(value)),
    );
    if !field.description.is_empty() {
        out.push_str(&format!("<p class=\"description\">{}</p>\n", strip_tags(&field.description)));
    }
    out
}
