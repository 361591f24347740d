use indexmap::IndexMap;
use toml::{Table, Value};

use super::FieldModel;
use crate::config::SectionSpec;

/// Flattens every section's raw field bodies into one slug-keyed map.
///
/// A slug declared by more than one section keeps the position of its first
/// declaration and the body of its last.
pub fn flatten_fields<'a, I>(sections: I) -> IndexMap<String, Table>
where
    I: IntoIterator<Item = (&'a String, &'a SectionSpec)>,
{
    let mut flat = IndexMap::new();
    for (section_slug, section) in sections {
        for (slug, body) in &section.fields {
            if flat.insert(slug.clone(), body.clone()).is_some() {
                tracing::warn!(
                    field = %slug,
                    section = %section_slug,
                    "field slug redeclared, later declaration wins"
                );
            }
        }
    }
    flat
}

/// Every normalized field across all sections, keyed by the slug it was
/// declared under.
///
/// A field body may override its own `slug` attribute; the declared key still
/// identifies it for registration, rendering, submitted form values and the
/// stored blob. Iteration order is the flattened declaration order and drives
/// both the sanitization pass and the order of reported validation errors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldIndex {
    fields: IndexMap<String, FieldModel>,
}

impl FieldIndex {
    pub fn get(&self, slug: &str) -> Option<&FieldModel> {
        self.fields.get(slug)
    }

    pub fn contains(&self, slug: &str) -> bool {
        self.fields.contains_key(slug)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldModel> {
        self.fields.values()
    }

    pub fn slugs(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Declared slug and field, in index order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &FieldModel)> {
        self.fields.iter().map(|(slug, field)| (slug.as_str(), field))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Slug to declared default value.
    pub fn defaults(&self) -> IndexMap<String, Value> {
        self.fields
            .iter()
            .map(|(slug, field)| (slug.clone(), field.default.clone()))
            .collect()
    }
}

impl FromIterator<(String, FieldModel)> for FieldIndex {
    fn from_iter<T: IntoIterator<Item = (String, FieldModel)>>(iter: T) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a FieldIndex {
    type Item = &'a FieldModel;
    type IntoIter = indexmap::map::Values<'a, String, FieldModel>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.values()
    }
}
