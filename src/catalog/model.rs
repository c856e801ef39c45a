// Catalog records
//
// Every record carries its own id; foreign keys are plain ids into the
// same catalog.

use serde::{Deserialize, Serialize};

/// Unique identifier for a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectId(pub usize);

/// Unique identifier for a project version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VersionId(pub usize);

/// Unique identifier for a module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleId(pub usize);

/// Unique identifier for a class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KlassId(pub usize);

/// A documented framework, e.g. "Django"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
}

/// One imported release of a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectVersion {
    pub id: VersionId,
    pub project: ProjectId,
    pub version_number: String,
}

impl ProjectVersion {
    /// `4.2.7` becomes `4.2`; used by documentation links
    pub fn short_version(&self) -> String {
        self.version_number
            .split('.')
            .take(2)
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Sort key comparing numeric components numerically
    pub fn sort_key(&self) -> Vec<(u64, String)> {
        self.version_number
            .split(['.', '-'])
            .map(|part| {
                let digits: String = part.chars().take_while(|c| c.is_ascii_digit()).collect();
                let number = digits.parse().unwrap_or(0);
                (number, part[digits.len()..].to_string())
            })
            .collect()
    }
}

/// A Python module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub id: ModuleId,
    pub version: VersionId,
    /// Dotted name
    pub name: String,
    pub docstring: String,
    /// Path relative to the source root, `/`-separated
    pub filename: String,
}

impl Module {
    /// Last dotted component
    pub fn short_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }
}

/// A class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Klass {
    pub id: KlassId,
    pub module: ModuleId,
    pub name: String,
    pub docstring: String,
    pub line_number: usize,
    /// Shortest public module the class can be imported from
    pub import_path: String,
    /// Full dotted path of the defining module plus the class name
    pub path: String,
}

impl Klass {
    /// Helper classes shown only on request in class lists
    pub fn is_secondary(&self) -> bool {
        self.name.starts_with("Base") || self.name.ends_with("Mixin")
    }

    pub fn import_statement(&self) -> String {
        format!("from {} import {}", self.import_path, self.name)
    }
}

/// A class attribute, recorded on the class that defines its value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KlassAttribute {
    pub klass: KlassId,
    pub name: String,
    pub value: String,
    pub line_number: usize,
}

/// A method defined in a class body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Method {
    pub klass: KlassId,
    pub name: String,
    pub docstring: String,
    pub code: String,
    /// Argument list without parentheses
    pub kwargs: String,
    pub line_number: usize,
}

/// `child` lists `parent` as its `order`-th base
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inheritance {
    pub parent: KlassId,
    pub child: KlassId,
    pub order: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn version(number: &str) -> ProjectVersion {
        ProjectVersion {
            id: VersionId(0),
            project: ProjectId(0),
            version_number: number.to_string(),
        }
    }

    fn klass(name: &str) -> Klass {
        Klass {
            id: KlassId(0),
            module: ModuleId(0),
            name: name.to_string(),
            docstring: String::new(),
            line_number: 1,
            import_path: "django.views.generic".to_string(),
            path: format!("django.views.generic.base.{}", name),
        }
    }

    #[test]
    fn test_short_version() {
        assert_eq!(version("4.2.7").short_version(), "4.2");
        assert_eq!(version("5.0").short_version(), "5.0");
    }

    #[test]
    fn test_version_sort_key_is_numeric() {
        assert!(version("4.10").sort_key() > version("4.9").sort_key());
        assert!(version("5.0").sort_key() > version("4.2.7").sort_key());
    }

    #[test]
    fn test_is_secondary() {
        assert!(klass("BaseDetailView").is_secondary());
        assert!(klass("ContextMixin").is_secondary());
        assert!(!klass("UpdateView").is_secondary());
    }

    #[test]
    fn test_import_statement() {
        assert_eq!(
            klass("View").import_statement(),
            "from django.views.generic import View"
        );
    }

    #[test]
    fn test_module_short_name() {
        let module = Module {
            id: ModuleId(0),
            version: VersionId(0),
            name: "django.views.generic.edit".to_string(),
            docstring: String::new(),
            filename: "django/views/generic/edit.py".to_string(),
        };
        assert_eq!(module.short_name(), "edit");
    }
}
