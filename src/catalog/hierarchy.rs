// Inheritance queries over the catalog
//
// Ancestors follow Python's C3 method resolution order. Descendants are
// found by walking parent -> child edges.

use super::{Catalog, Klass, KlassAttribute, KlassId, Method};
use crate::error::{Error, Result};
use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;
use std::collections::{HashMap, HashSet};

/// Inheritance edges as a petgraph graph, parent pointing to child
pub struct HierarchyGraph {
    pub graph: DiGraph<KlassId, usize>,
    nodes: HashMap<KlassId, NodeIndex>,
}

impl HierarchyGraph {
    pub fn node(&self, klass: KlassId) -> Option<NodeIndex> {
        self.nodes.get(&klass).copied()
    }

    pub fn is_cyclic(&self) -> bool {
        is_cyclic_directed(&self.graph)
    }

    /// Every class reachable below `klass`, in DFS order
    pub fn descendants_of(&self, klass: KlassId) -> Vec<KlassId> {
        let Some(start) = self.node(klass) else {
            return Vec::new();
        };

        let mut found = Vec::new();
        let mut dfs = Dfs::new(&self.graph, start);
        while let Some(node) = dfs.next(&self.graph) {
            if node != start {
                found.push(self.graph[node]);
            }
        }
        found
    }
}

/// An attribute visible on a class, with the class that defines it
#[derive(Debug, Clone)]
pub struct ResolvedAttribute<'a> {
    pub attribute: &'a KlassAttribute,
    pub klass: &'a Klass,
    /// Shadowed by a class earlier in the resolution order
    pub overridden: bool,
}

/// A method visible on a class, with the class that defines it
#[derive(Debug, Clone)]
pub struct ResolvedMethod<'a> {
    pub method: &'a Method,
    pub klass: &'a Klass,
}

impl Catalog {
    pub fn hierarchy_graph(&self) -> HierarchyGraph {
        let mut graph = DiGraph::new();
        let mut nodes = HashMap::new();
        for klass in &self.klasses {
            nodes.insert(klass.id, graph.add_node(klass.id));
        }
        for link in &self.inheritance {
            if let (Some(&parent), Some(&child)) = (nodes.get(&link.parent), nodes.get(&link.child)) {
                graph.add_edge(parent, child, link.order);
            }
        }
        HierarchyGraph { graph, nodes }
    }

    /// Graph of the current links, rejected if it contains a cycle
    pub(crate) fn acyclic_hierarchy(&self) -> Result<HierarchyGraph> {
        let hierarchy = self.hierarchy_graph();
        if hierarchy.is_cyclic() {
            return Err(Error::hierarchy("inheritance contains a cycle"));
        }
        Ok(hierarchy)
    }

    /// Declared bases that were imported, in declaration order
    pub fn direct_ancestors(&self, klass: KlassId) -> Vec<&Klass> {
        let mut links: Vec<_> = self
            .inheritance
            .iter()
            .filter(|i| i.child == klass)
            .collect();
        links.sort_by_key(|i| i.order);
        links
            .into_iter()
            .filter_map(|i| self.klass(i.parent))
            .collect()
    }

    /// Method resolution order, starting with the class itself
    pub fn mro(&self, klass: KlassId) -> Result<Vec<KlassId>> {
        let mut memo = HashMap::new();
        let mut visiting = HashSet::new();
        self.linearize(klass, &mut memo, &mut visiting)
    }

    /// Every ancestor in resolution order, without the class itself
    pub fn ancestors(&self, klass: KlassId) -> Result<Vec<&Klass>> {
        Ok(self
            .mro(klass)?
            .into_iter()
            .skip(1)
            .filter_map(|id| self.klass(id))
            .collect())
    }

    fn linearize(
        &self,
        klass: KlassId,
        memo: &mut HashMap<KlassId, Vec<KlassId>>,
        visiting: &mut HashSet<KlassId>,
    ) -> Result<Vec<KlassId>> {
        if let Some(done) = memo.get(&klass) {
            return Ok(done.clone());
        }
        if !visiting.insert(klass) {
            return Err(Error::hierarchy(format!(
                "class {} inherits from itself",
                self.describe(klass)
            )));
        }

        let parents: Vec<KlassId> = self.direct_ancestors(klass).iter().map(|k| k.id).collect();
        let mut sequences = Vec::with_capacity(parents.len() + 1);
        for &parent in &parents {
            sequences.push(self.linearize(parent, memo, visiting)?);
        }
        sequences.push(parents);

        let mut result = vec![klass];
        result.extend(c3_merge(sequences).ok_or_else(|| {
            Error::hierarchy(format!(
                "cannot create a consistent method resolution order for {}",
                self.describe(klass)
            ))
        })?);

        visiting.remove(&klass);
        memo.insert(klass, result.clone());
        Ok(result)
    }

    fn describe(&self, klass: KlassId) -> String {
        self.klass(klass)
            .map(|k| k.path.clone())
            .unwrap_or_else(|| format!("#{}", klass.0))
    }

    /// Every class inheriting from `klass`, directly or not, sorted by name
    pub fn descendants(&self, klass: KlassId) -> Vec<&Klass> {
        let mut descendants: Vec<&Klass> = self
            .hierarchy_graph()
            .descendants_of(klass)
            .into_iter()
            .filter_map(|id| self.klass(id))
            .collect();
        descendants.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.path.cmp(&b.path)));
        descendants
    }

    /// Attributes of the class and its ancestors, sorted by name and then by
    /// resolution order. All but the first of each name are overridden.
    pub fn attributes(&self, klass: KlassId) -> Result<Vec<ResolvedAttribute<'_>>> {
        let mro = self.mro(klass)?;
        let mut resolved = Vec::new();
        for (index, &id) in mro.iter().enumerate() {
            let Some(owner) = self.klass(id) else { continue };
            for attribute in self.attributes_of(id) {
                resolved.push((index, ResolvedAttribute {
                    attribute,
                    klass: owner,
                    overridden: false,
                }));
            }
        }
        resolved.sort_by(|(ia, a), (ib, b)| {
            a.attribute.name.cmp(&b.attribute.name).then(ia.cmp(ib))
        });

        let mut previous: Option<String> = None;
        Ok(resolved
            .into_iter()
            .map(|(_, mut entry)| {
                let name = &entry.attribute.name;
                entry.overridden = previous.as_deref() == Some(name.as_str());
                previous = Some(name.clone());
                entry
            })
            .collect())
    }

    /// Methods of the class and its ancestors. Namesakes are contiguous,
    /// ordered by resolution order.
    pub fn methods(&self, klass: KlassId) -> Result<Vec<ResolvedMethod<'_>>> {
        let mro = self.mro(klass)?;
        let mut resolved = Vec::new();
        for (index, &id) in mro.iter().enumerate() {
            let Some(owner) = self.klass(id) else { continue };
            for method in self.methods_of(id) {
                resolved.push((index, ResolvedMethod { method, klass: owner }));
            }
        }
        resolved.sort_by(|(ia, a), (ib, b)| a.method.name.cmp(&b.method.name).then(ia.cmp(ib)));
        Ok(resolved.into_iter().map(|(_, entry)| entry).collect())
    }
}

/// C3 merge; `None` when no consistent order exists
fn c3_merge(mut sequences: Vec<Vec<KlassId>>) -> Option<Vec<KlassId>> {
    let mut result = Vec::new();
    loop {
        sequences.retain(|s| !s.is_empty());
        if sequences.is_empty() {
            return Some(result);
        }

        let head = sequences
            .iter()
            .map(|s| s[0])
            .find(|candidate| !sequences.iter().any(|s| s[1..].contains(candidate)))?;

        result.push(head);
        for sequence in &mut sequences {
            if sequence[0] == head {
                sequence.remove(0);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::super::{KlassMember, Member, ModuleMember};
    use super::*;

    fn names(klasses: &[&Klass]) -> Vec<String> {
        klasses.iter().map(|k| k.name.clone()).collect()
    }

    #[test]
    fn test_update_view_mro() {
        let catalog = django_catalog();
        let update = klass(&catalog, "UpdateView").id;
        let ancestors = catalog.ancestors(update).unwrap();
        assert_eq!(
            names(&ancestors),
            vec![
                "SingleObjectTemplateResponseMixin",
                "TemplateResponseMixin",
                "BaseUpdateView",
                "ModelFormMixin",
                "FormMixin",
                "SingleObjectMixin",
                "ContextMixin",
                "ProcessFormView",
                "View",
                "object",
            ]
        );
    }

    #[test]
    fn test_direct_ancestors_subset_of_ancestors() {
        let catalog = django_catalog();
        for k in catalog.klasses() {
            let all: Vec<KlassId> = catalog.ancestors(k.id).unwrap().iter().map(|a| a.id).collect();
            for direct in catalog.direct_ancestors(k.id) {
                assert!(all.contains(&direct.id), "{} missing {}", k.name, direct.name);
            }
        }
    }

    #[test]
    fn test_root_has_no_ancestors() {
        let catalog = django_catalog();
        let object = klass(&catalog, "object").id;
        assert!(catalog.ancestors(object).unwrap().is_empty());
        assert!(catalog.direct_ancestors(object).is_empty());
    }

    #[test]
    fn test_inconsistent_mro() {
        // class X(A, B) and class Y(B, A), then class Z(X, Y)
        let mut catalog = Catalog::new();
        let members = vec![
            Member::Module(ModuleMember::new("m")),
            Member::Klass(KlassMember::new("m", "A", &[])),
            Member::Klass(KlassMember::new("m", "B", &[])),
            Member::Klass(KlassMember::new("m", "X", &["m.A", "m.B"])),
            Member::Klass(KlassMember::new("m", "Y", &["m.B", "m.A"])),
            Member::Klass(KlassMember::new("m", "Z", &["m.X", "m.Y"])),
        ];
        catalog.import_project_version(members, "P", "1").unwrap();
        let z = klass(&catalog, "Z").id;
        assert!(matches!(catalog.mro(z), Err(Error::Hierarchy(_))));
    }

    #[test]
    fn test_descendants_sorted_by_name() {
        let catalog = django_catalog();
        let mixin = klass(&catalog, "SingleObjectMixin").id;
        assert_eq!(
            names(&catalog.descendants(mixin)),
            vec!["BaseDetailView", "BaseUpdateView", "ModelFormMixin", "UpdateView"]
        );

        let update = klass(&catalog, "UpdateView").id;
        assert!(catalog.descendants(update).is_empty());
    }

    #[test]
    fn test_attributes_overridden_flags() {
        let catalog = django_catalog();
        let update = klass(&catalog, "UpdateView").id;
        let attributes = catalog.attributes(update).unwrap();

        let suffixes: Vec<(&str, &str, bool)> = attributes
            .iter()
            .filter(|a| a.attribute.name == "template_name_suffix")
            .map(|a| (a.klass.name.as_str(), a.attribute.value.as_str(), a.overridden))
            .collect();
        assert_eq!(
            suffixes,
            vec![
                ("UpdateView", "'_form'", false),
                ("SingleObjectTemplateResponseMixin", "'_detail'", true),
            ]
        );

        let names: Vec<&str> = attributes.iter().map(|a| a.attribute.name.as_str()).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[test]
    fn test_attribute_only_on_subject() {
        let catalog = django_catalog();
        let update = klass(&catalog, "UpdateView").id;
        let attributes = catalog.attributes(update).unwrap();
        let own: Vec<_> = attributes
            .iter()
            .filter(|a| a.attribute.name == "template_name" && a.klass.id == update)
            .collect();
        assert_eq!(own.len(), 1);
        assert!(!own[0].overridden);
    }

    #[test]
    fn test_methods_namesakes_contiguous() {
        let catalog = django_catalog();
        let update = klass(&catalog, "UpdateView").id;
        let methods = catalog.methods(update).unwrap();

        let context: Vec<&str> = methods
            .iter()
            .filter(|m| m.method.name == "get_context_data")
            .map(|m| m.klass.name.as_str())
            .collect();
        assert_eq!(context, vec!["FormMixin", "SingleObjectMixin", "ContextMixin"]);

        let positions: Vec<usize> = methods
            .iter()
            .enumerate()
            .filter(|(_, m)| m.method.name == "get_context_data")
            .map(|(i, _)| i)
            .collect();
        assert_eq!(positions[2] - positions[0], 2);
    }

    #[test]
    fn test_c3_merge_simple() {
        let a = KlassId(1);
        let b = KlassId(2);
        let o = KlassId(0);
        let merged = c3_merge(vec![vec![a, o], vec![b, o], vec![a, b]]).unwrap();
        assert_eq!(merged, vec![a, b, o]);
    }

    #[test]
    fn test_hierarchy_graph_edges() {
        let catalog = django_catalog();
        let graph = catalog.hierarchy_graph();
        assert_eq!(graph.graph.edge_count(), catalog.inheritance().len());
        assert!(!graph.is_cyclic());
    }

    #[test]
    fn test_graph_descendants_of() {
        let catalog = django_catalog();
        let graph = catalog.hierarchy_graph();
        let mixin = klass(&catalog, "SingleObjectMixin").id;

        let mut names: Vec<&str> = graph
            .descendants_of(mixin)
            .into_iter()
            .filter_map(|id| catalog.klass(id))
            .map(|k| k.name.as_str())
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec!["BaseDetailView", "BaseUpdateView", "ModelFormMixin", "UpdateView"]
        );
        assert!(graph.descendants_of(klass(&catalog, "UpdateView").id).is_empty());
    }
}
