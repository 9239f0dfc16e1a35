//! Static provider catalog
//!
//! The catalog ships embedded in the binary and can be replaced by a JSON
//! file of the same shape. It is loaded once at startup and checked before
//! any provider is built.

use provider::ProviderDescriptor;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

const EMBEDDED: &str = include_str!("catalog.json");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub slug: String,
    pub name: String,
    pub description: String,
}

#[derive(Deserialize)]
struct CatalogFile {
    categories: Vec<Category>,
    providers: Vec<ProviderDescriptor>,
}

/// A category with the providers filed under it, for listings.
#[derive(Debug, Serialize)]
pub struct CategoryGroup<'a> {
    #[serde(flatten)]
    pub category: &'a Category,
    pub providers: Vec<&'a ProviderDescriptor>,
}

#[derive(Debug, Clone)]
pub struct Catalog {
    categories: Vec<Category>,
    providers: Vec<ProviderDescriptor>,
}

impl Catalog {
    /// The catalog compiled into the binary.
    pub fn embedded() -> common::Result<Self> {
        Self::from_json_str(EMBEDDED)
    }

    pub fn from_json_str(content: &str) -> common::Result<Self> {
        let file: CatalogFile = serde_json::from_str(content)?;
        let catalog = Self {
            categories: file.categories,
            providers: file.providers,
        };
        catalog.check()?;
        Ok(catalog)
    }

    pub fn from_path(path: &Path) -> common::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let catalog = Self::from_json_str(&content)?;
        info!(
            path = %path.display(),
            providers = catalog.providers.len(),
            "loaded provider catalog from file"
        );
        Ok(catalog)
    }

    /// File catalog when a path is configured, embedded otherwise.
    pub fn load(path: Option<&Path>) -> common::Result<Self> {
        match path {
            Some(path) => Self::from_path(path),
            None => Self::embedded(),
        }
    }

    fn check(&self) -> common::Result<()> {
        let mut category_slugs = HashSet::new();
        for category in &self.categories {
            if !is_url_safe(&category.slug) {
                return Err(common::Error::Config(format!(
                    "category slug `{}` must be lowercase letters, digits and dashes",
                    category.slug
                )));
            }
            if !category_slugs.insert(category.slug.as_str()) {
                return Err(common::Error::Config(format!(
                    "duplicate category slug: {}",
                    category.slug
                )));
            }
        }

        let mut provider_slugs = HashSet::new();
        for descriptor in &self.providers {
            if !is_url_safe(&descriptor.slug) {
                return Err(common::Error::Config(format!(
                    "provider slug `{}` must be lowercase letters, digits and dashes",
                    descriptor.slug
                )));
            }
            if !provider_slugs.insert(descriptor.slug.as_str()) {
                return Err(common::Error::Config(format!(
                    "duplicate provider slug: {}",
                    descriptor.slug
                )));
            }
            if !category_slugs.contains(descriptor.category.as_str()) {
                return Err(common::Error::Config(format!(
                    "provider `{}` references unknown category `{}`",
                    descriptor.slug, descriptor.category
                )));
            }
            if descriptor.required_fields.is_empty() {
                return Err(common::Error::Config(format!(
                    "provider `{}` declares no required fields",
                    descriptor.slug
                )));
            }
        }
        Ok(())
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Descriptors in catalog order.
    pub fn providers(&self) -> &[ProviderDescriptor] {
        &self.providers
    }

    pub fn get(&self, slug: &str) -> Option<&ProviderDescriptor> {
        self.providers.iter().find(|descriptor| descriptor.slug == slug)
    }

    /// Providers grouped by category, in category order. Categories without
    /// providers are left out.
    pub fn grouped(&self) -> Vec<CategoryGroup<'_>> {
        self.categories
            .iter()
            .map(|category| CategoryGroup {
                category,
                providers: self
                    .providers
                    .iter()
                    .filter(|descriptor| descriptor.category == category.slug)
                    .collect(),
            })
            .filter(|group| !group.providers.is_empty())
            .collect()
    }
}

fn is_url_safe(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && slug
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}
