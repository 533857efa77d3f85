//! Built-in catalog of learning-path templates.

use thiserror::Error;

use crate::model::PathTemplate;

const BUILTIN_CATALOG: &str = include_str!("../data/learning_paths.json");

const FALLBACK_ICON: &str = "📚";
const FALLBACK_COLOR: &str = "blue";

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("catalog is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("catalog entry {index} has an empty category")]
    EmptyCategory { index: usize },

    #[error("catalog lists category twice: {0}")]
    DuplicateCategory(String),
}

/// Read-only, ordered list of path templates offered to every user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    templates: Vec<PathTemplate>,
}

/// Display metadata looked up by category at render time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayMetadata<'a> {
    pub icon: &'a str,
    pub color_tag: &'a str,
    pub description: &'a str,
}

impl Catalog {
    /// The catalog shipped with the crate.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the embedded data is malformed.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_CATALOG)
    }

    /// Parse and validate a catalog from a JSON array of templates.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` on malformed JSON, blank categories or repeated categories.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let templates: Vec<PathTemplate> = serde_json::from_str(json)?;
        Self::new(templates)
    }

    /// # Errors
    ///
    /// Returns `CatalogError` on blank or repeated categories.
    pub fn new(templates: Vec<PathTemplate>) -> Result<Self, CatalogError> {
        for (index, template) in templates.iter().enumerate() {
            if template.category.trim().is_empty() {
                return Err(CatalogError::EmptyCategory { index });
            }
            if templates[..index]
                .iter()
                .any(|t| t.category == template.category)
            {
                return Err(CatalogError::DuplicateCategory(template.category.clone()));
            }
        }
        Ok(Self { templates })
    }

    #[must_use]
    pub fn list_templates(&self) -> &[PathTemplate] {
        &self.templates
    }

    #[must_use]
    pub fn find_template(&self, category: &str) -> Option<&PathTemplate> {
        self.templates.iter().find(|t| t.category == category)
    }

    /// Icon, color and description for a category, with defaults for
    /// categories that are no longer in the catalog.
    #[must_use]
    pub fn display_metadata(&self, category: &str) -> DisplayMetadata<'_> {
        match self.find_template(category) {
            Some(t) => DisplayMetadata {
                icon: &t.icon,
                color_tag: &t.color_tag,
                description: &t.description,
            },
            None => DisplayMetadata {
                icon: FALLBACK_ICON,
                color_tag: FALLBACK_COLOR,
                description: "",
            },
        }
    }
}
