// Static name resolution across parsed modules
//
// Follows `from x import y` chains (including wildcard imports) to find
// where a class is really defined.

use crate::parser::{ImportKind, ParsedFile};
use std::collections::HashMap;

/// Longest re-export chain followed before giving up
const MAX_REEXPORT_DEPTH: usize = 10;

/// Parsed files keyed by dotted module name
pub struct ModuleIndex<'a> {
    files: HashMap<&'a str, &'a ParsedFile>,
}

impl<'a> ModuleIndex<'a> {
    pub fn new(files: &'a [ParsedFile]) -> Self {
        Self {
            files: files.iter().map(|f| (f.module_name.as_str(), f)).collect(),
        }
    }

    pub fn get(&self, module: &str) -> Option<&'a ParsedFile> {
        self.files.get(module).copied()
    }

    pub fn contains(&self, module: &str) -> bool {
        self.files.contains_key(module)
    }

    /// Full path of the class that `name` refers to inside `module`
    pub fn canonical_class_path(&self, module: &str, name: &str) -> Option<String> {
        self.canonical_at_depth(module, name, 0)
    }

    fn canonical_at_depth(&self, module: &str, name: &str, depth: usize) -> Option<String> {
        if depth > MAX_REEXPORT_DEPTH {
            return None;
        }
        let file = self.get(module)?;
        let local = file
            .classes
            .iter()
            .filter(|c| c.name == name)
            .map(|c| c.line_start)
            .max();

        // the last binding in the file wins
        for import in file.imports.iter().rev() {
            if local.is_some_and(|line| line > import.line) {
                break;
            }
            if import.kind == ImportKind::Direct {
                continue;
            }
            let Some(target) = import.absolute_module(module, file.is_package()) else {
                continue;
            };
            for imported in import.names.iter().rev() {
                if imported.name == "*" {
                    if let Some(found) = self.canonical_at_depth(&target, name, depth + 1) {
                        return Some(found);
                    }
                } else if imported.used_name() == name {
                    if self.contains(&format!("{}.{}", target, imported.name)) {
                        // a submodule, not a class
                        return None;
                    }
                    return self.canonical_at_depth(&target, &imported.name, depth + 1);
                }
            }
        }

        local.map(|_| format!("{}.{}", module, name))
    }

    /// Full path of a base class as written in `file`.
    ///
    /// Bases that cannot be found in the index still get a best-effort path
    /// so that they can be told apart from imported classes later.
    pub fn resolve_base(&self, file: &ParsedFile, base: &str) -> String {
        let base = base
            .split(['[', '('])
            .next()
            .unwrap_or(base)
            .trim();

        match base.rsplit_once('.') {
            Some((qualifier, attr)) => {
                let module = self.resolve_qualifier(file, qualifier);
                self.canonical_class_path(&module, attr)
                    .unwrap_or_else(|| format!("{}.{}", module, attr))
            }
            None => self
                .canonical_class_path(&file.module_name, base)
                .or_else(|| self.external_binding(file, base))
                .unwrap_or_else(|| format!("builtins.{}", base)),
        }
    }

    /// Module a dotted qualifier such as `generic` or `views.generic` names
    fn resolve_qualifier(&self, file: &ParsedFile, qualifier: &str) -> String {
        let (head, rest) = match qualifier.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (qualifier, None),
        };
        let with_rest = |module: String| match rest {
            Some(rest) => format!("{}.{}", module, rest),
            None => module,
        };

        for import in file.imports.iter().rev() {
            for imported in &import.names {
                match import.kind {
                    ImportKind::Direct => {
                        if imported.alias.as_deref() == Some(head) {
                            return with_rest(import.module.clone());
                        }
                        if imported.alias.is_none() && imported.name == qualifier {
                            return qualifier.to_string();
                        }
                    }
                    _ if imported.used_name() == head => {
                        if let Some(target) =
                            import.absolute_module(&file.module_name, file.is_package())
                        {
                            return with_rest(format!("{}.{}", target, imported.name));
                        }
                    }
                    _ => {}
                }
            }
        }

        qualifier.to_string()
    }

    /// Path for a name imported from a module outside the index
    fn external_binding(&self, file: &ParsedFile, name: &str) -> Option<String> {
        file.imports
            .iter()
            .rev()
            .filter(|i| i.kind != ImportKind::Direct)
            .find_map(|import| {
                let imported = import.names.iter().find(|n| n.used_name() == name)?;
                let target = import.absolute_module(&file.module_name, file.is_package())?;
                Some(format!("{}.{}", target, imported.name))
            })
    }

    /// Highest parent package that re-exports the class, or its own module
    pub fn best_import_path(&self, module: &str, name: &str) -> String {
        let full_path = format!("{}.{}", module, name);
        let mut best = module.to_string();
        let mut current = module;

        while let Some((parent, _)) = current.rsplit_once('.') {
            if self.canonical_class_path(parent, name).as_deref() == Some(full_path.as_str()) {
                best = parent.to_string();
            }
            current = parent;
        }
        best
    }
}
