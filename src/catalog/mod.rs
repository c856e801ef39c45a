//! Catalog of documented projects, their classes and class members.
//!
//! The catalog is the single data provider for rendering. It is filled by
//! [`Catalog::import_project_version`] from a stream of [`Member`]s and
//! persisted as a JSON snapshot.

pub mod hierarchy;
pub mod members;
pub mod model;

pub use hierarchy::*;
pub use members::*;
pub use model::*;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{debug, info};

/// In-memory store of every imported project version
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    projects: Vec<Project>,
    versions: Vec<ProjectVersion>,
    modules: Vec<Module>,
    klasses: Vec<Klass>,
    attributes: Vec<KlassAttribute>,
    methods: Vec<Method>,
    inheritance: Vec<Inheritance>,
    next_id: usize,
}

/// Counts of what an import created
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub modules: usize,
    pub klasses: usize,
    pub attributes: usize,
    pub methods: usize,
    pub inheritance: usize,
}

impl ImportSummary {
    pub fn summary(&self) -> String {
        format!(
            "{} modules, {} classes, {} attributes, {} methods, {} inheritance links",
            self.modules, self.klasses, self.attributes, self.methods, self.inheritance
        )
    }
}

impl Catalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a catalog snapshot
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::PathNotFound(path.to_path_buf()));
        }
        let contents = std::fs::read_to_string(path)?;
        let catalog: Catalog = serde_json::from_str(&contents)?;
        debug!(path = %path.display(), klasses = catalog.klasses.len(), "catalog loaded");
        Ok(catalog)
    }

    /// Load a snapshot, or start empty when the file does not exist yet
    pub fn load_or_new(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::new())
        }
    }

    /// Write the catalog snapshot
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        debug!(path = %path.display(), "catalog saved");
        Ok(())
    }

    fn next_id(&mut self) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Replace any existing data for `project_name` at `version_number` with
    /// the given members.
    ///
    /// The catalog is left untouched when the import fails.
    pub fn import_project_version(
        &mut self,
        members: impl IntoIterator<Item = Member>,
        project_name: &str,
        version_number: &str,
    ) -> Result<ImportSummary> {
        let mut staged = self.clone();
        let summary = staged.import_staged(members, project_name, version_number)?;
        *self = staged;

        info!(
            project = project_name,
            version = version_number,
            "{}",
            summary.summary()
        );
        Ok(summary)
    }

    fn import_staged(
        &mut self,
        members: impl IntoIterator<Item = Member>,
        project_name: &str,
        version_number: &str,
    ) -> Result<ImportSummary> {
        self.wipe_clashing_data(project_name, version_number);

        let project = match self.project_by_name(project_name).map(|p| p.id) {
            Some(id) => id,
            None => {
                let id = ProjectId(self.next_id());
                self.projects.push(Project {
                    id,
                    name: project_name.to_string(),
                });
                id
            }
        };
        let version = VersionId(self.next_id());
        self.versions.push(ProjectVersion {
            id: version,
            project,
            version_number: version_number.to_string(),
        });

        let mut summary = ImportSummary::default();
        let mut module_lookup: HashMap<String, ModuleId> = HashMap::new();
        let mut klass_lookup: HashMap<String, KlassId> = HashMap::new();
        let mut declared_bases: Vec<(KlassId, Vec<String>)> = Vec::new();
        let mut attribute_groups: Vec<((String, String), Vec<(String, usize)>)> = Vec::new();
        let mut attribute_index: HashMap<(String, String), usize> = HashMap::new();

        for member in members {
            match member {
                Member::Module(m) => {
                    let id = ModuleId(self.next_id());
                    self.modules.push(Module {
                        id,
                        version,
                        name: m.name.clone(),
                        docstring: m.docstring,
                        filename: m.filename,
                    });
                    module_lookup.insert(m.name, id);
                    summary.modules += 1;
                }
                Member::Klass(k) => {
                    let module = *module_lookup
                        .get(&k.module)
                        .ok_or_else(|| Error::not_found(format!("module {}", k.module)))?;
                    let id = KlassId(self.next_id());
                    self.klasses.push(Klass {
                        id,
                        module,
                        name: k.name,
                        docstring: k.docstring,
                        line_number: k.line_number,
                        import_path: k.best_import_path,
                        path: k.path.clone(),
                    });
                    klass_lookup.insert(k.path, id);
                    declared_bases.push((id, k.bases));
                    summary.klasses += 1;
                }
                Member::Attribute(a) => {
                    let key = (a.name, a.value);
                    let slot = *attribute_index.entry(key.clone()).or_insert_with(|| {
                        attribute_groups.push((key, Vec::new()));
                        attribute_groups.len() - 1
                    });
                    attribute_groups[slot].1.push((a.klass_path, a.line_number));
                }
                Member::Method(m) => {
                    let klass = *klass_lookup
                        .get(&m.klass_path)
                        .ok_or_else(|| Error::not_found(format!("class {}", m.klass_path)))?;
                    self.methods.push(Method {
                        klass,
                        name: m.name,
                        docstring: m.docstring,
                        code: m.code,
                        kwargs: m.kwargs,
                        line_number: m.line_number,
                    });
                    summary.methods += 1;
                }
            }
        }

        summary.inheritance = self.create_inheritance(&declared_bases, &klass_lookup);
        let hierarchy = self.acyclic_hierarchy()?;
        summary.attributes = self.create_attributes(attribute_groups, &klass_lookup, &hierarchy)?;

        Ok(summary)
    }

    /// Remove the version being re-imported together with everything that
    /// hangs off it
    fn wipe_clashing_data(&mut self, project_name: &str, version_number: &str) {
        let Some(project) = self.project_by_name(project_name).map(|p| p.id) else {
            return;
        };

        let versions: HashSet<VersionId> = self
            .versions
            .iter()
            .filter(|v| v.project == project && v.version_number == version_number)
            .map(|v| v.id)
            .collect();
        if versions.is_empty() {
            return;
        }

        let modules: HashSet<ModuleId> = self
            .modules
            .iter()
            .filter(|m| versions.contains(&m.version))
            .map(|m| m.id)
            .collect();
        let klasses: HashSet<KlassId> = self
            .klasses
            .iter()
            .filter(|k| modules.contains(&k.module))
            .map(|k| k.id)
            .collect();

        info!(
            project = project_name,
            version = version_number,
            klasses = klasses.len(),
            "wiping previously imported version"
        );

        self.versions.retain(|v| !versions.contains(&v.id));
        self.modules.retain(|m| !modules.contains(&m.id));
        self.klasses.retain(|k| !klasses.contains(&k.id));
        self.methods.retain(|m| !klasses.contains(&m.klass));
        self.attributes.retain(|a| !klasses.contains(&a.klass));
        self.inheritance
            .retain(|i| !klasses.contains(&i.parent) && !klasses.contains(&i.child));
    }

    /// Link every class to the bases that were imported alongside it
    fn create_inheritance(
        &mut self,
        declared_bases: &[(KlassId, Vec<String>)],
        klass_lookup: &HashMap<String, KlassId>,
    ) -> usize {
        let mut created = 0;
        for (child, bases) in declared_bases {
            for (order, base) in bases.iter().enumerate() {
                if let Some(&parent) = klass_lookup.get(base) {
                    self.inheritance.push(Inheritance {
                        parent,
                        child: *child,
                        order,
                    });
                    created += 1;
                }
            }
        }
        created
    }

    /// Record each `(name, value)` pair only on the classes that define it.
    ///
    /// A class seen with the same pair as one of its ancestors merely
    /// inherited it, so classes that descend from another holder are dropped.
    fn create_attributes(
        &mut self,
        groups: Vec<((String, String), Vec<(String, usize)>)>,
        klass_lookup: &HashMap<String, KlassId>,
        hierarchy: &HierarchyGraph,
    ) -> Result<usize> {
        let mut created = Vec::new();

        for ((name, value), holders) in groups {
            let holders: Vec<(KlassId, usize)> = holders
                .into_iter()
                .map(|(path, line)| {
                    klass_lookup
                        .get(&path)
                        .map(|&id| (id, line))
                        .ok_or_else(|| Error::not_found(format!("class {}", path)))
                })
                .collect::<Result<_>>()?;

            let mut descendants = HashSet::new();
            for (klass, _) in &holders {
                descendants.extend(hierarchy.descendants_of(*klass));
            }

            for (klass, line_number) in holders {
                if !descendants.contains(&klass) {
                    created.push(KlassAttribute {
                        klass,
                        name: name.clone(),
                        value: value.clone(),
                        line_number,
                    });
                }
            }
        }

        let count = created.len();
        self.attributes.extend(created);
        Ok(count)
    }

    // ------------------------------------------------------------------
    // Lookups
    // ------------------------------------------------------------------

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn klasses(&self) -> &[Klass] {
        &self.klasses
    }

    pub fn inheritance(&self) -> &[Inheritance] {
        &self.inheritance
    }

    pub fn is_empty(&self) -> bool {
        self.klasses.is_empty()
    }

    /// Find a project by name, ignoring case
    pub fn project_by_name(&self, name: &str) -> Option<&Project> {
        self.projects
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn project(&self, id: ProjectId) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn version(&self, id: VersionId) -> Option<&ProjectVersion> {
        self.versions.iter().find(|v| v.id == id)
    }

    pub fn module(&self, id: ModuleId) -> Option<&Module> {
        self.modules.iter().find(|m| m.id == id)
    }

    pub fn klass(&self, id: KlassId) -> Option<&Klass> {
        self.klasses.iter().find(|k| k.id == id)
    }

    /// Versions of a project, oldest first
    pub fn versions_of(&self, project: ProjectId) -> Vec<&ProjectVersion> {
        let mut versions: Vec<&ProjectVersion> = self
            .versions
            .iter()
            .filter(|v| v.project == project)
            .collect();
        versions.sort_by_key(|v| v.sort_key());
        versions
    }

    pub fn latest_version(&self, project: ProjectId) -> Option<&ProjectVersion> {
        self.versions_of(project).pop()
    }

    pub fn find_version(&self, project_name: &str, version_number: &str) -> Result<&ProjectVersion> {
        let project = self
            .project_by_name(project_name)
            .ok_or_else(|| Error::not_found(format!("project {}", project_name)))?;
        self.versions
            .iter()
            .find(|v| v.project == project.id && v.version_number == version_number)
            .ok_or_else(|| {
                Error::not_found(format!("version {} of {}", version_number, project_name))
            })
    }

    /// Modules of a version sorted by name
    pub fn modules_of(&self, version: VersionId) -> Vec<&Module> {
        let mut modules: Vec<&Module> = self
            .modules
            .iter()
            .filter(|m| m.version == version)
            .collect();
        modules.sort_by(|a, b| a.name.cmp(&b.name));
        modules
    }

    pub fn find_module(&self, version: VersionId, name: &str) -> Result<&Module> {
        self.modules
            .iter()
            .find(|m| m.version == version && m.name == name)
            .ok_or_else(|| Error::not_found(format!("module {}", name)))
    }

    /// Classes of a module sorted by name
    pub fn klasses_of_module(&self, module: ModuleId) -> Vec<&Klass> {
        let mut klasses: Vec<&Klass> = self
            .klasses
            .iter()
            .filter(|k| k.module == module)
            .collect();
        klasses.sort_by(|a, b| a.name.cmp(&b.name));
        klasses
    }

    /// Classes of every module in a version
    pub fn klasses_of_version(&self, version: VersionId) -> Vec<&Klass> {
        let modules: HashSet<ModuleId> = self.modules_of(version).iter().map(|m| m.id).collect();
        let mut klasses: Vec<&Klass> = self
            .klasses
            .iter()
            .filter(|k| modules.contains(&k.module))
            .collect();
        klasses.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.path.cmp(&b.path)));
        klasses
    }

    pub fn find_klass(
        &self,
        project_name: &str,
        version_number: &str,
        module_name: &str,
        klass_name: &str,
    ) -> Result<&Klass> {
        let version = self.find_version(project_name, version_number)?;
        let module = self.find_module(version.id, module_name)?;
        self.klasses
            .iter()
            .find(|k| k.module == module.id && k.name == klass_name)
            .ok_or_else(|| Error::not_found(format!("class {}.{}", module_name, klass_name)))
    }

    /// Resolve a bare class name, preferring the newest version that has it
    pub fn find_klass_by_name(&self, project: ProjectId, name: &str) -> Option<&Klass> {
        self.versions_of(project).into_iter().rev().find_map(|version| {
            self.klasses_of_version(version.id)
                .into_iter()
                .find(|k| k.name == name)
        })
    }

    /// Module, version and project a class belongs to
    pub fn lineage(&self, klass: &Klass) -> Result<(&Module, &ProjectVersion, &Project)> {
        let module = self
            .module(klass.module)
            .ok_or_else(|| Error::not_found(format!("module of {}", klass.path)))?;
        let version = self
            .version(module.version)
            .ok_or_else(|| Error::not_found(format!("version of {}", module.name)))?;
        let project = self
            .project(version.project)
            .ok_or_else(|| Error::not_found(format!("project of {}", module.name)))?;
        Ok((module, version, project))
    }

    /// The same class (by module and name) in every version of its project
    pub fn klass_in_versions(&self, klass: &Klass) -> Result<Vec<(&ProjectVersion, &Klass)>> {
        let (module, _, project) = self.lineage(klass)?;
        Ok(self
            .versions_of(project.id)
            .into_iter()
            .filter_map(|version| {
                let other_module = self.find_module(version.id, &module.name).ok()?;
                let other = self
                    .klasses
                    .iter()
                    .find(|k| k.module == other_module.id && k.name == klass.name)?;
                Some((version, other))
            })
            .collect())
    }

    /// Attributes recorded directly on a class
    pub fn attributes_of(&self, klass: KlassId) -> impl Iterator<Item = &KlassAttribute> {
        self.attributes.iter().filter(move |a| a.klass == klass)
    }

    /// Methods defined directly on a class
    pub fn methods_of(&self, klass: KlassId) -> impl Iterator<Item = &Method> {
        self.methods.iter().filter(move |m| m.klass == klass)
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_import_summary_counts() {
        let mut catalog = Catalog::new();
        let summary = catalog
            .import_project_version(django_members(), "Django", "4.2")
            .unwrap();
        assert_eq!(summary.modules, 4);
        assert_eq!(summary.klasses, 12);
        assert_eq!(summary.methods, 16);
        assert_eq!(summary.inheritance, 15);
        assert_eq!(summary.attributes, 10);
    }

    #[test]
    fn test_inheritance_keeps_declared_order() {
        let catalog = django_catalog();
        let update = klass(&catalog, "UpdateView").id;
        let mut links: Vec<&Inheritance> = catalog
            .inheritance()
            .iter()
            .filter(|i| i.child == update)
            .collect();
        links.sort_by_key(|i| i.order);
        assert_eq!(links.len(), 2);
        assert_eq!(
            catalog.klass(links[0].parent).unwrap().name,
            "SingleObjectTemplateResponseMixin"
        );
        assert_eq!(catalog.klass(links[1].parent).unwrap().name, "BaseUpdateView");
    }

    #[test]
    fn test_unknown_bases_are_ignored() {
        let mut catalog = Catalog::new();
        let members = vec![
            Member::Module(ModuleMember::new("app.views")),
            Member::Klass(KlassMember::new("app.views", "Home", &["builtins.object"])),
        ];
        let summary = catalog.import_project_version(members, "App", "1.0").unwrap();
        assert_eq!(summary.inheritance, 0);
    }

    #[test]
    fn test_attribute_inherited_value_recorded_once() {
        let mut catalog = Catalog::new();
        let members = vec![
            Member::Module(ModuleMember::new("m")),
            Member::Klass(KlassMember::new("m", "A", &[])),
            Member::Klass(KlassMember::new("m", "B", &["m.A"])),
            Member::Klass(KlassMember::new("m", "C", &["m.B"])),
            Member::Attribute(AttributeMember::new("m.A", "x", "1")),
            Member::Attribute(AttributeMember::new("m.B", "x", "1")),
            Member::Attribute(AttributeMember::new("m.C", "x", "2")),
        ];
        let summary = catalog.import_project_version(members, "P", "1").unwrap();
        assert_eq!(summary.attributes, 2);

        let b = klass(&catalog, "B").id;
        assert_eq!(catalog.attributes_of(b).count(), 0);
        let c = klass(&catalog, "C").id;
        assert_eq!(catalog.attributes_of(c).next().unwrap().value, "2");
    }

    #[test]
    fn test_reimport_wipes_clashing_version() {
        let mut catalog = django_catalog();
        let before = catalog.klasses().len();

        // case-insensitive project match
        catalog
            .import_project_version(django_members(), "django", "4.2")
            .unwrap();
        assert_eq!(catalog.klasses().len(), before);
        assert_eq!(catalog.projects().len(), 1);

        let project = catalog.project_by_name("Django").unwrap().id;
        assert_eq!(catalog.versions_of(project).len(), 1);
        assert_eq!(catalog.inheritance().len(), 15);
    }

    #[test]
    fn test_second_version_is_kept_alongside() {
        let mut catalog = django_catalog();
        catalog
            .import_project_version(django_members(), "Django", "5.0")
            .unwrap();

        let project = catalog.project_by_name("Django").unwrap().id;
        let versions: Vec<&str> = catalog
            .versions_of(project)
            .iter()
            .map(|v| v.version_number.as_str())
            .collect();
        assert_eq!(versions, vec!["4.2", "5.0"]);
        assert_eq!(catalog.latest_version(project).unwrap().version_number, "5.0");

        let update = catalog.find_klass("Django", "4.2", EDIT, "UpdateView").unwrap();
        let found = catalog.klass_in_versions(update).unwrap();
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_method_for_unknown_class_fails_atomically() {
        let mut catalog = django_catalog();
        let members = vec![
            Member::Module(ModuleMember::new("x")),
            Member::Method(MethodMember::new("x.Missing", "get")),
        ];
        let result = catalog.import_project_version(members, "Django", "4.2");
        assert!(result.unwrap_err().is_not_found());
        // the previous import is still intact
        assert!(catalog.find_klass("Django", "4.2", EDIT, "UpdateView").is_ok());
    }

    #[test]
    fn test_cyclic_inheritance_rejected() {
        let mut catalog = Catalog::new();
        let members = vec![
            Member::Module(ModuleMember::new("m")),
            Member::Klass(KlassMember::new("m", "A", &["m.B"])),
            Member::Klass(KlassMember::new("m", "B", &["m.A"])),
        ];
        let result = catalog.import_project_version(members, "P", "1");
        assert!(matches!(result, Err(Error::Hierarchy(_))));
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_find_klass_errors() {
        let catalog = django_catalog();
        assert!(catalog.find_klass("Flask", "4.2", EDIT, "UpdateView").unwrap_err().is_not_found());
        assert!(catalog.find_klass("Django", "1.0", EDIT, "UpdateView").unwrap_err().is_not_found());
        assert!(catalog.find_klass("Django", "4.2", "nope", "UpdateView").unwrap_err().is_not_found());
        assert!(catalog.find_klass("Django", "4.2", EDIT, "Nope").unwrap_err().is_not_found());
    }

    #[test]
    fn test_find_klass_by_name() {
        let catalog = django_catalog();
        let project = catalog.project_by_name("Django").unwrap().id;
        let klass = catalog.find_klass_by_name(project, "UpdateView").unwrap();
        assert_eq!(klass.path, format!("{}.UpdateView", EDIT));
        assert!(catalog.find_klass_by_name(project, "Nope").is_none());
    }

    #[test]
    fn test_listing_is_sorted() {
        let catalog = django_catalog();
        let project = catalog.project_by_name("Django").unwrap().id;
        let version = catalog.latest_version(project).unwrap().id;

        let modules: Vec<&str> = catalog.modules_of(version).iter().map(|m| m.name.as_str()).collect();
        assert_eq!(modules, vec!["builtins", BASE, DETAIL, EDIT]);

        let base = catalog.find_module(version, BASE).unwrap().id;
        let names: Vec<&str> = catalog
            .klasses_of_module(base)
            .iter()
            .map(|k| k.name.as_str())
            .collect();
        assert_eq!(names, vec!["ContextMixin", "TemplateResponseMixin", "View"]);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/classy.json");
        let catalog = django_catalog();
        catalog.save(&path).unwrap();

        let loaded = Catalog::load(&path).unwrap();
        assert_eq!(loaded.klasses(), catalog.klasses());
        assert_eq!(loaded.inheritance(), catalog.inheritance());
    }

    #[test]
    fn test_load_missing_file() {
        let result = Catalog::load(Path::new("/nonexistent/classy.json"));
        assert!(matches!(result, Err(Error::PathNotFound(_))));
        assert!(Catalog::load_or_new(Path::new("/nonexistent/classy.json"))
            .unwrap()
            .is_empty());
    }
}
