//! Page view models handed to the templates.
//!
//! Everything here is plain serializable data; the builders in [`pages`]
//! read the catalog and fill these in.

pub mod pages;

pub use pages::*;

use serde::Serialize;

/// Group items that share a name.
///
/// A new group starts whenever an item's name differs from the previous
/// item's, so callers must keep namesakes contiguous. Non-adjacent items
/// with the same name end up in separate groups.
pub fn group_namesakes<T>(items: Vec<T>, name_of: impl Fn(&T) -> &str) -> Vec<Vec<T>> {
    let mut groups: Vec<Vec<T>> = Vec::new();
    for item in items {
        let continues = groups
            .last()
            .and_then(|g| g.last())
            .map_or(false, |prev| name_of(prev) == name_of(&item));
        if continues {
            if let Some(group) = groups.last_mut() {
                group.push(item);
            }
        } else {
            groups.push(vec![item]);
        }
    }
    groups
}

/// Project, version and navigation shared by every page
#[derive(Debug, Clone, Serialize)]
pub struct PageContext {
    pub project: String,
    pub version: String,
    pub version_url: String,
    pub versions: Vec<VersionLink>,
    /// Every module of the version with its classes, for the side navigation
    pub nav: Vec<ModuleListing>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VersionLink {
    pub version_number: String,
    pub url: String,
    pub is_current: bool,
}

/// A class in a list
#[derive(Debug, Clone, Serialize)]
pub struct KlassLink {
    pub name: String,
    pub url: String,
    pub module: String,
    pub is_secondary: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModuleListing {
    pub name: String,
    pub short_name: String,
    pub url: String,
    pub docstring: String,
    pub klasses: Vec<KlassLink>,
}

/// One row of the ancestors list. The subject itself comes first.
#[derive(Debug, Clone, Serialize)]
pub struct AncestorEntry {
    pub name: String,
    pub url: String,
    pub is_direct: bool,
    pub is_subject: bool,
    pub is_secondary: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttributeRow {
    pub name: String,
    pub value: String,
    pub klass_name: String,
    /// `None` when defined on the subject class
    pub klass_url: Option<String>,
    pub overridden: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct MethodEntry {
    pub name: String,
    pub kwargs: String,
    pub docstring: String,
    pub code: String,
    pub line_number: usize,
    pub klass_name: String,
    /// `None` when defined on the subject class
    pub klass_url: Option<String>,
    pub source_url: Option<String>,
}

/// Namesake methods, in resolution order
#[derive(Debug, Clone, Serialize)]
pub struct MethodGroup {
    pub name: String,
    pub methods: Vec<MethodEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct KlassSummary {
    pub name: String,
    pub docstring: String,
    pub module: String,
    pub module_url: String,
    pub url: String,
    pub import_path: String,
    pub import_statement: String,
    pub line_number: usize,
    pub is_secondary: bool,
}

/// Everything the class detail page shows
#[derive(Debug, Clone, Serialize)]
pub struct KlassDetail {
    pub page: PageContext,
    pub klass: KlassSummary,
    pub docs_url: Option<String>,
    pub source_url: Option<String>,
    pub diagram_url: Option<String>,
    pub direct_ancestors: Vec<KlassLink>,
    pub ancestors: Vec<AncestorEntry>,
    pub descendants: Vec<KlassLink>,
    pub attributes: Vec<AttributeRow>,
    pub method_groups: Vec<MethodGroup>,
    /// Same class in the other imported versions
    pub other_versions: Vec<VersionLink>,
    /// The class has bases
    pub show_ancestors: bool,
    /// The class has subclasses
    pub show_descendants: bool,
    pub ancestors_full_width: bool,
    pub descendants_full_width: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct HomePage {
    pub page: PageContext,
    pub klass_count: usize,
    pub search_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct VersionPage {
    pub page: PageContext,
    pub modules: Vec<ModuleListing>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModulePage {
    pub page: PageContext,
    pub module: ModuleListing,
    pub source_url: Option<String>,
}

/// Entry of the jump-to-class index
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchEntry {
    pub name: String,
    pub kind: String,
    pub path: String,
    pub url: String,
    pub description: String,
}
