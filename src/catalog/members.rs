// Records produced by source ingestion and consumed by
// `Catalog::import_project_version`.
//
// Classes, attributes and methods refer to each other by full dotted path
// since they have no catalog ids yet.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Member {
    Module(ModuleMember),
    Klass(KlassMember),
    Attribute(AttributeMember),
    Method(MethodMember),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleMember {
    pub name: String,
    pub docstring: String,
    pub filename: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KlassMember {
    pub name: String,
    /// Dotted name of the defining module
    pub module: String,
    pub docstring: String,
    pub line_number: usize,
    pub path: String,
    /// Full paths of the declared bases, in declaration order
    pub bases: Vec<String>,
    pub best_import_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeMember {
    pub name: String,
    pub value: String,
    pub line_number: usize,
    pub klass_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodMember {
    pub name: String,
    pub docstring: String,
    pub code: String,
    pub kwargs: String,
    pub line_number: usize,
    pub klass_path: String,
}

impl KlassMember {
    /// Convenience for building hierarchies by hand
    pub fn new(module: &str, name: &str, bases: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            module: module.to_string(),
            docstring: String::new(),
            line_number: 1,
            path: format!("{}.{}", module, name),
            bases: bases.iter().map(|b| b.to_string()).collect(),
            best_import_path: module.to_string(),
        }
    }
}

impl ModuleMember {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            docstring: String::new(),
            filename: format!("{}.py", name.replace('.', "/")),
        }
    }
}

impl AttributeMember {
    pub fn new(klass_path: &str, name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            line_number: 1,
            klass_path: klass_path.to_string(),
        }
    }
}

impl MethodMember {
    pub fn new(klass_path: &str, name: &str) -> Self {
        Self {
            name: name.to_string(),
            docstring: String::new(),
            code: format!("def {}(self):\n    pass\n", name),
            kwargs: "self".to_string(),
            line_number: 1,
            klass_path: klass_path.to_string(),
        }
    }
}
