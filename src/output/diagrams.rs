// Diagram generation
//
// Generates a Mermaid class diagram of a class and everything it inherits from.

use crate::catalog::{Catalog, Klass, KlassId};
use crate::config::DiagramDirection;
use crate::error::Result;
use std::collections::HashSet;

/// Diagram generator for creating Mermaid diagrams
pub struct DiagramGenerator {
    /// Methods listed per class before the rest are summarised
    max_methods: usize,
    /// Layout direction (TB, LR, BT, RL)
    direction: String,
}

impl DiagramGenerator {
    /// Create a new diagram generator
    pub fn new() -> Self {
        Self {
            max_methods: 5,
            direction: DiagramDirection::default().as_str().to_string(),
        }
    }

    /// Set how many methods each class box lists
    pub fn with_max_methods(mut self, max: usize) -> Self {
        self.max_methods = max;
        self
    }

    /// Set layout direction
    pub fn with_direction(mut self, dir: DiagramDirection) -> Self {
        self.direction = dir.as_str().to_string();
        self
    }

    /// Generate the inheritance diagram of `klass`
    ///
    /// Classes appear in resolution order. Edges are listed child by child,
    /// each child's bases in declared order.
    pub fn generate_klass_hierarchy(&self, catalog: &Catalog, klass: &Klass) -> Result<String> {
        let mro = catalog.mro(klass.id)?;
        let members: HashSet<KlassId> = mro.iter().copied().collect();

        let mut lines = Vec::new();
        lines.push("classDiagram".to_string());
        lines.push(format!("    direction {}", self.direction));

        for &id in &mro {
            if let Some(node) = catalog.klass(id) {
                self.push_class(catalog, node, &mut lines);
            }
        }

        for &id in &mro {
            let Some(child) = catalog.klass(id) else {
                continue;
            };
            for parent in catalog.direct_ancestors(id) {
                if members.contains(&parent.id) {
                    lines.push(format!(
                        "    {} <|-- {}",
                        sanitize_id(&parent.path),
                        sanitize_id(&child.path)
                    ));
                }
            }
        }

        lines.push(format!(
            "    style {} stroke-width:3px",
            sanitize_id(&klass.path)
        ));

        Ok(lines.join("\n"))
    }

    fn push_class(&self, catalog: &Catalog, klass: &Klass, lines: &mut Vec<String>) {
        let mut names: Vec<&str> = catalog.methods_of(klass.id).map(|m| m.name.as_str()).collect();
        names.sort_unstable();

        let id = sanitize_id(&klass.path);
        lines.push(format!("    class {}[\"{}\"]", id, klass.name));
        for name in names.iter().take(self.max_methods) {
            let visibility = if name.starts_with('_') { "-" } else { "+" };
            lines.push(format!("    {} : {}{}()", id, visibility, name));
        }
        if names.len() > self.max_methods {
            lines.push(format!("    {} : +... {} more", id, names.len() - self.max_methods));
        }
    }
}

impl Default for DiagramGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Sanitize a string for use as a Mermaid node ID
fn sanitize_id(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}
