// Builders turning catalog records into page view models

use super::*;
use crate::catalog::{Catalog, Klass, KlassId, Module, ProjectVersion};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::routing::{self, LinkContext};
use std::collections::HashSet;

/// Builds view models for one catalog and configuration
pub struct Pages<'a> {
    catalog: &'a Catalog,
    config: &'a Config,
}

impl<'a> Pages<'a> {
    pub fn new(catalog: &'a Catalog, config: &'a Config) -> Self {
        Self { catalog, config }
    }

    /// Latest version of the configured project
    pub fn default_version(&self) -> Result<&'a ProjectVersion> {
        let name = &self.config.project.name;
        let project = self
            .catalog
            .project_by_name(name)
            .ok_or_else(|| Error::not_found(format!("project {}", name)))?;
        self.catalog
            .latest_version(project.id)
            .ok_or_else(|| Error::not_found(format!("any version of {}", name)))
    }

    pub fn home(&self) -> Result<HomePage> {
        let version = self.default_version()?;
        let page = self.page_context(version)?;
        let klass_count = page.nav.iter().map(|m| m.klasses.len()).sum();
        Ok(HomePage {
            page,
            klass_count,
            search_url: routing::SEARCH_INDEX.to_string(),
        })
    }

    pub fn version(&self, project: &str, version: &str) -> Result<VersionPage> {
        let version = self.catalog.find_version(project, version)?;
        let page = self.page_context(version)?;
        Ok(VersionPage {
            modules: page.nav.clone(),
            page,
        })
    }

    pub fn module(&self, project: &str, version: &str, module: &str) -> Result<ModulePage> {
        let version = self.catalog.find_version(project, version)?;
        let module = self.catalog.find_module(version.id, module)?;
        let page = self.page_context(version)?;

        let context = LinkContext {
            version,
            module,
            line: 1,
            import_path: &module.name,
            name: "",
        };
        Ok(ModulePage {
            module: self.module_listing(&page.project, version, module),
            source_url: context.source_url(&self.config.project),
            page,
        })
    }

    pub fn klass(
        &self,
        project: &str,
        version: &str,
        module: &str,
        klass: &str,
    ) -> Result<KlassDetail> {
        let klass = self.catalog.find_klass(project, version, module, klass)?;
        self.klass_detail(klass)
    }

    pub fn klass_detail(&self, klass: &Klass) -> Result<KlassDetail> {
        let (module, version, project) = self.catalog.lineage(klass)?;
        let page = self.page_context(version)?;
        let url = routing::url_for_klass(self.catalog, klass)?;

        let context = LinkContext {
            version,
            module,
            line: klass.line_number,
            import_path: &klass.import_path,
            name: &klass.name,
        };

        let direct: Vec<&Klass> = self.catalog.direct_ancestors(klass.id);
        let direct_ids: HashSet<KlassId> = direct.iter().map(|k| k.id).collect();

        let mut ancestors = vec![AncestorEntry {
            name: klass.name.clone(),
            url: url.clone(),
            is_direct: false,
            is_subject: true,
            is_secondary: klass.is_secondary(),
        }];
        for ancestor in self.catalog.ancestors(klass.id)? {
            ancestors.push(AncestorEntry {
                name: ancestor.name.clone(),
                url: routing::url_for_klass(self.catalog, ancestor)?,
                is_direct: direct_ids.contains(&ancestor.id),
                is_subject: false,
                is_secondary: ancestor.is_secondary(),
            });
        }

        let direct_ancestors = self.klass_links(&direct)?;
        let descendants = self.klass_links(&self.catalog.descendants(klass.id))?;

        let attributes = self
            .catalog
            .attributes(klass.id)?
            .into_iter()
            .map(|resolved| -> Result<AttributeRow> {
                Ok(AttributeRow {
                    name: resolved.attribute.name.clone(),
                    value: resolved.attribute.value.clone(),
                    klass_name: resolved.klass.name.clone(),
                    klass_url: self.link_unless_subject(resolved.klass, klass)?,
                    overridden: resolved.overridden,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let methods = self
            .catalog
            .methods(klass.id)?
            .into_iter()
            .map(|resolved| -> Result<MethodEntry> {
                let (owner_module, owner_version, _) = self.catalog.lineage(resolved.klass)?;
                let source = LinkContext {
                    version: owner_version,
                    module: owner_module,
                    line: resolved.method.line_number,
                    import_path: &resolved.klass.import_path,
                    name: &resolved.method.name,
                };
                Ok(MethodEntry {
                    name: resolved.method.name.clone(),
                    kwargs: resolved.method.kwargs.clone(),
                    docstring: resolved.method.docstring.clone(),
                    code: resolved.method.code.clone(),
                    line_number: resolved.method.line_number,
                    klass_name: resolved.klass.name.clone(),
                    klass_url: self.link_unless_subject(resolved.klass, klass)?,
                    source_url: source.source_url(&self.config.project),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let method_groups = group_namesakes(methods, |m| m.name.as_str())
            .into_iter()
            .map(|methods| MethodGroup {
                name: methods[0].name.clone(),
                methods,
            })
            .collect();

        let other_versions = self
            .catalog
            .klass_in_versions(klass)?
            .into_iter()
            .map(|(other_version, other)| -> Result<VersionLink> {
                Ok(VersionLink {
                    version_number: other_version.version_number.clone(),
                    url: routing::url_for_klass(self.catalog, other)?,
                    is_current: other_version.id == version.id,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let diagram_url = self.config.diagrams.enabled.then(|| {
            routing::diagram_url(&project.name, &version.version_number, &module.name, &klass.name)
        });

        Ok(KlassDetail {
            klass: KlassSummary {
                name: klass.name.clone(),
                docstring: klass.docstring.clone(),
                module: module.name.clone(),
                module_url: routing::module_url(&project.name, &version.version_number, &module.name),
                url,
                import_path: klass.import_path.clone(),
                import_statement: klass.import_statement(),
                line_number: klass.line_number,
                is_secondary: klass.is_secondary(),
            },
            docs_url: context.docs_url(&self.config.project),
            source_url: context.source_url(&self.config.project),
            diagram_url,
            show_ancestors: !direct_ancestors.is_empty(),
            show_descendants: !descendants.is_empty(),
            ancestors_full_width: descendants.is_empty(),
            descendants_full_width: direct_ancestors.is_empty(),
            direct_ancestors,
            ancestors,
            descendants,
            attributes,
            method_groups,
            other_versions,
            page,
        })
    }

    /// Detail URL of the newest class called `name` in the configured project
    pub fn shortcut_target(&self, name: &str) -> Result<String> {
        let project_name = &self.config.project.name;
        let project = self
            .catalog
            .project_by_name(project_name)
            .ok_or_else(|| Error::not_found(format!("project {}", project_name)))?;
        let klass = self
            .catalog
            .find_klass_by_name(project.id, name)
            .ok_or_else(|| Error::not_found(format!("class {}", name)))?;
        routing::url_for_klass(self.catalog, klass)
    }

    /// Modules and classes of the default version, for the jump box
    pub fn search_index(&self) -> Result<Vec<SearchEntry>> {
        let version = self.default_version()?;
        let project = self.project_name(version)?;
        let mut entries = Vec::new();
        for module in self.catalog.modules_of(version.id) {
            entries.push(SearchEntry {
                name: module.name.clone(),
                kind: "module".to_string(),
                path: module.name.clone(),
                url: routing::module_url(&project, &version.version_number, &module.name),
                description: first_line(&module.docstring),
            });
            for klass in self.catalog.klasses_of_module(module.id) {
                entries.push(SearchEntry {
                    name: klass.name.clone(),
                    kind: "class".to_string(),
                    path: klass.path.clone(),
                    url: routing::url_for_klass(self.catalog, klass)?,
                    description: first_line(&klass.docstring),
                });
            }
        }
        Ok(entries)
    }

    fn project_name(&self, version: &ProjectVersion) -> Result<String> {
        self.catalog
            .project(version.project)
            .map(|p| p.name.clone())
            .ok_or_else(|| Error::not_found(format!("project of version {}", version.version_number)))
    }

    fn page_context(&self, version: &ProjectVersion) -> Result<PageContext> {
        let project = self.project_name(version)?;
        let versions = self
            .catalog
            .versions_of(version.project)
            .into_iter()
            .map(|v| VersionLink {
                version_number: v.version_number.clone(),
                url: routing::version_url(&project, &v.version_number),
                is_current: v.id == version.id,
            })
            .collect();
        let nav = self
            .catalog
            .modules_of(version.id)
            .into_iter()
            .map(|m| self.module_listing(&project, version, m))
            .collect();

        Ok(PageContext {
            version_url: routing::version_url(&project, &version.version_number),
            version: version.version_number.clone(),
            project,
            versions,
            nav,
        })
    }

    fn module_listing(&self, project: &str, version: &ProjectVersion, module: &Module) -> ModuleListing {
        let klasses = self
            .catalog
            .klasses_of_module(module.id)
            .into_iter()
            .map(|k| KlassLink {
                name: k.name.clone(),
                url: routing::klass_url(project, &version.version_number, &module.name, &k.name),
                module: module.name.clone(),
                is_secondary: k.is_secondary(),
            })
            .collect();

        ModuleListing {
            name: module.name.clone(),
            short_name: module.short_name().to_string(),
            url: routing::module_url(project, &version.version_number, &module.name),
            docstring: module.docstring.clone(),
            klasses,
        }
    }

    fn klass_links(&self, klasses: &[&Klass]) -> Result<Vec<KlassLink>> {
        klasses
            .iter()
            .map(|k| -> Result<KlassLink> {
                let (module, _, _) = self.catalog.lineage(k)?;
                Ok(KlassLink {
                    name: k.name.clone(),
                    url: routing::url_for_klass(self.catalog, k)?,
                    module: module.name.clone(),
                    is_secondary: k.is_secondary(),
                })
            })
            .collect()
    }

    fn link_unless_subject(&self, owner: &Klass, subject: &Klass) -> Result<Option<String>> {
        if owner.id == subject.id {
            Ok(None)
        } else {
            routing::url_for_klass(self.catalog, owner).map(Some)
        }
    }
}

fn first_line(docstring: &str) -> String {
    docstring.lines().next().unwrap_or_default().trim().to_string()
}
