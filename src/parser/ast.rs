// Syntax types for parsed Python code
//
// These types carry exactly what the catalog needs from a source file:
// module docstring, imports (for base and import-path resolution), and
// classes with their attributes and methods.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A parsed Python file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParsedFile {
    /// File path relative to the source root
    pub path: PathBuf,
    /// Dotted module name derived from path
    pub module_name: String,
    /// Module-level docstring
    pub docstring: Option<String>,
    /// All top-level imports in the file
    pub imports: Vec<Import>,
    /// Top-level classes defined in the file
    pub classes: Vec<Class>,
}

impl ParsedFile {
    /// Create a new parsed file with basic info
    pub fn new(path: PathBuf, module_name: String) -> Self {
        Self {
            path,
            module_name,
            docstring: None,
            imports: Vec::new(),
            classes: Vec::new(),
        }
    }

    /// Whether this file is a package `__init__`
    pub fn is_package(&self) -> bool {
        self.path.file_stem().map_or(false, |s| s == "__init__")
    }
}

/// An import statement
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Import {
    /// The module being imported (without leading dots for relative imports)
    pub module: String,
    /// Specific names imported (for `from x import y`)
    pub names: Vec<ImportedName>,
    /// Import kind
    pub kind: ImportKind,
    /// Line number
    pub line: usize,
}

impl Import {
    /// Create a `from x import y` style import
    pub fn from_import(module: &str, names: Vec<ImportedName>, line: usize) -> Self {
        Self {
            module: module.to_string(),
            names,
            kind: ImportKind::From,
            line,
        }
    }

    /// Create a relative import
    pub fn relative(module: &str, names: Vec<ImportedName>, level: usize, line: usize) -> Self {
        Self {
            module: module.to_string(),
            names,
            kind: ImportKind::Relative { level },
            line,
        }
    }

    /// Absolute module this import refers to, given the importing module.
    ///
    /// `from_package` is true when the importing file is an `__init__`,
    /// which shifts relative resolution by one level.
    pub fn absolute_module(&self, importer: &str, from_package: bool) -> Option<String> {
        match self.kind {
            ImportKind::Relative { level } => {
                let mut parts: Vec<&str> = importer.split('.').collect();
                let drop = if from_package { level - 1 } else { level };
                if drop > parts.len() {
                    return None;
                }
                parts.truncate(parts.len() - drop);
                if !self.module.is_empty() {
                    parts.push(&self.module);
                }
                let joined = parts.join(".");
                (!joined.is_empty()).then_some(joined)
            }
            _ => Some(self.module.clone()),
        }
    }
}

/// A single imported name with optional alias
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImportedName {
    /// Original name
    pub name: String,
    /// Alias (from `as` clause)
    pub alias: Option<String>,
}

impl ImportedName {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            alias: None,
        }
    }

    pub fn with_alias(name: &str, alias: &str) -> Self {
        Self {
            name: name.to_string(),
            alias: Some(alias.to_string()),
        }
    }

    /// Get the name as used in code (alias if present, otherwise original)
    pub fn used_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// Kind of import statement
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ImportKind {
    /// `import x` or `import x as y`
    Direct,
    /// `from x import y`
    From,
    /// `from . import y` or `from ..x import y`
    Relative { level: usize },
}

/// A class definition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Class {
    /// Class name
    pub name: String,
    /// Cleaned class docstring
    pub docstring: Option<String>,
    /// Base classes (as written, not resolved)
    pub bases: Vec<String>,
    /// Methods defined in the class body
    pub methods: Vec<Function>,
    /// Class attributes assigned in the class body
    pub attributes: Vec<Attribute>,
    /// Starting line number
    pub line_start: usize,
    /// Ending line number
    pub line_end: usize,
}

impl Class {
    pub fn new(name: &str, line_start: usize) -> Self {
        Self {
            name: name.to_string(),
            docstring: None,
            bases: Vec::new(),
            methods: Vec::new(),
            attributes: Vec::new(),
            line_start,
            line_end: line_start,
        }
    }
}

/// A class attribute assignment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Attribute {
    pub name: String,
    /// Value in Python repr form
    pub value: String,
    pub line: usize,
}

impl Attribute {
    pub fn new(name: &str, value: &str, line: usize) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            line,
        }
    }
}

/// A method definition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Function {
    /// Function name
    pub name: String,
    /// Cleaned docstring
    pub docstring: Option<String>,
    /// Argument list without the surrounding parentheses
    pub arguments: String,
    /// Dedented source, decorators included
    pub code: String,
    /// Decorators applied
    pub decorators: Vec<String>,
    /// Starting line number (first decorator when decorated)
    pub line_start: usize,
    /// Ending line number
    pub line_end: usize,
}

impl Function {
    pub fn new(name: &str, line_start: usize) -> Self {
        Self {
            name: name.to_string(),
            docstring: None,
            arguments: String::new(),
            code: String::new(),
            decorators: Vec::new(),
            line_start,
            line_end: line_start,
        }
    }
}
