// Static site generator
//
// Writes every page of every imported version to disk, following the same
// URL scheme the server answers on, plus shortcut redirects, diagrams,
// assets and search.json.

use crate::catalog::{Catalog, Klass};
use crate::config::Config;
use crate::error::Result;
use crate::output::diagrams::DiagramGenerator;
use crate::output::templates::TemplateEngine;
use crate::routing;
use crate::views::Pages;
use rayon::prelude::*;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Embedded static assets, by file name under `/static/`
pub const ASSETS: &[(&str, &str)] = &[
    ("style.css", include_str!("../../assets/style.css")),
    ("classy.js", include_str!("../../assets/classy.js")),
];

/// Static site generator
pub struct SiteGenerator<'a> {
    catalog: &'a Catalog,
    config: &'a Config,
    template_engine: TemplateEngine,
    diagrams: DiagramGenerator,
}

impl<'a> SiteGenerator<'a> {
    pub fn new(catalog: &'a Catalog, config: &'a Config) -> Result<Self> {
        Ok(Self {
            catalog,
            config,
            template_engine: TemplateEngine::new()?,
            diagrams: DiagramGenerator::new().with_direction(config.diagrams.direction),
        })
    }

    /// Generate the complete static site
    pub fn generate(&self) -> Result<GenerationReport> {
        let mut report = GenerationReport::default();
        let pages = Pages::new(self.catalog, self.config);

        fs::create_dir_all(self.output_dir())?;
        info!(output = %self.output_dir().display(), "building site");

        self.copy_assets()?;
        report.assets_copied = true;

        let home = pages.home()?;
        self.write(&routing::home_url(), &self.template_engine.render_home(&home)?)?;
        report.pages_generated += 1;

        let not_found = self.template_engine.render_not_found("Page not found")?;
        fs::write(self.output_dir().join("404.html"), not_found)?;
        report.pages_generated += 1;

        for project in self.catalog.projects() {
            for version in self.catalog.versions_of(project.id) {
                let number = &version.version_number;
                let page = pages.version(&project.name, number)?;
                self.write(
                    &routing::version_url(&project.name, number),
                    &self.template_engine.render_version(&page)?,
                )?;
                report.pages_generated += 1;

                for module in self.catalog.modules_of(version.id) {
                    let page = pages.module(&project.name, number, &module.name)?;
                    self.write(
                        &routing::module_url(&project.name, number, &module.name),
                        &self.template_engine.render_module(&page)?,
                    )?;
                    report.pages_generated += 1;
                }

                let klasses = self.catalog.klasses_of_version(version.id);
                report.pages_generated += self.generate_klass_pages(&pages, &klasses)?;
                if self.config.diagrams.enabled {
                    report.diagrams_generated += self.generate_diagrams(&klasses)?;
                }
                debug!(project = %project.name, version = %number, klasses = klasses.len(), "version written");
            }
        }

        report.redirects_generated = self.generate_shortcuts(&pages)?;

        let entries = pages.search_index()?;
        let json = serde_json::to_string_pretty(&entries)?;
        self.write(routing::SEARCH_INDEX, &json)?;
        report.search_index_generated = true;

        info!("{}", report.summary());
        Ok(report)
    }

    /// Class pages are independent of each other, so render them in parallel
    fn generate_klass_pages(&self, pages: &Pages<'_>, klasses: &[&Klass]) -> Result<usize> {
        klasses
            .par_iter()
            .map(|klass| -> Result<()> {
                let detail = pages.klass_detail(klass)?;
                let html = self.template_engine.render_klass(&detail)?;
                self.write(&routing::url_for_klass(self.catalog, klass)?, &html)
            })
            .collect::<Result<Vec<()>>>()
            .map(|written| written.len())
    }

    fn generate_diagrams(&self, klasses: &[&Klass]) -> Result<usize> {
        let mut written = 0;
        for klass in klasses {
            let (module, version, project) = self.catalog.lineage(klass)?;
            let diagram = self.diagrams.generate_klass_hierarchy(self.catalog, klass)?;
            let url = routing::diagram_url(
                &project.name,
                &version.version_number,
                &module.name,
                &klass.name,
            );
            self.write(&url, &diagram)?;
            written += 1;
        }
        Ok(written)
    }

    /// `/{klass}/` pages forwarding to the newest version of each class
    fn generate_shortcuts(&self, pages: &Pages<'_>) -> Result<usize> {
        let version = pages.default_version()?;
        let names: BTreeSet<&str> = self
            .catalog
            .klasses_of_version(version.id)
            .into_iter()
            .map(|k| k.name.as_str())
            .collect();

        let mut written = 0;
        for name in names {
            if routing::is_reserved(name) {
                warn!(name, "class name clashes with a site path, no shortcut written");
                continue;
            }
            let target = pages.shortcut_target(name)?;
            let html = self.template_engine.render_redirect(name, &target)?;
            self.write(&routing::shortcut_url(name), &html)?;
            written += 1;
        }
        Ok(written)
    }

    fn copy_assets(&self) -> Result<()> {
        for (name, content) in ASSETS {
            self.write(&routing::static_url(name), content)?;
        }
        Ok(())
    }

    /// Write `contents` to the file serving `url`
    fn write(&self, url: &str, contents: &str) -> Result<()> {
        let path = self.output_dir().join(routing::output_path(url));
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(())
    }

    /// Get the output directory
    pub fn output_dir(&self) -> &Path {
        &self.config.output.directory
    }
}

/// Look up an embedded asset by file name
pub fn asset(name: &str) -> Option<&'static str> {
    ASSETS
        .iter()
        .find(|(asset, _)| *asset == name)
        .map(|(_, content)| *content)
}

/// Report of what was generated
#[derive(Debug, Default)]
pub struct GenerationReport {
    pub pages_generated: usize,
    pub redirects_generated: usize,
    pub diagrams_generated: usize,
    pub assets_copied: bool,
    pub search_index_generated: bool,
}

impl GenerationReport {
    pub fn summary(&self) -> String {
        format!(
            "Generated {} pages, {} shortcuts, {} diagrams, assets: {}, search: {}",
            self.pages_generated,
            self.redirects_generated,
            self.diagrams_generated,
            if self.assets_copied { "yes" } else { "no" },
            if self.search_index_generated {
                "yes"
            } else {
                "no"
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::{django_catalog, django_members, EDIT};
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> Config {
        let mut config = Config::default();
        config.output.directory = dir.path().join("site");
        config
    }

    fn site_file(config: &Config, url: &str) -> PathBuf {
        config.output.directory.join(routing::output_path(url))
    }

    #[test]
    fn test_generation_report_summary() {
        let report = GenerationReport {
            pages_generated: 5,
            redirects_generated: 2,
            diagrams_generated: 0,
            assets_copied: true,
            search_index_generated: true,
        };

        let summary = report.summary();
        assert!(summary.contains("5 pages"));
        assert!(summary.contains("2 shortcuts"));
        assert!(summary.contains("assets: yes"));
    }

    #[test]
    fn test_generate_writes_routing_scheme() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        let catalog = django_catalog();

        let report = SiteGenerator::new(&catalog, &config).unwrap().generate().unwrap();

        // home, 404, version, 4 modules, 12 classes
        assert_eq!(report.pages_generated, 19);
        assert_eq!(report.diagrams_generated, 12);
        assert_eq!(report.redirects_generated, 12);
        assert!(report.search_index_generated);

        assert!(site_file(&config, "/").exists());
        assert!(site_file(&config, "/projects/Django/4.2/").exists());
        assert!(site_file(&config, &routing::module_url("Django", "4.2", EDIT)).exists());
        let page = site_file(&config, &routing::klass_url("Django", "4.2", EDIT, "UpdateView"));
        let html = fs::read_to_string(page).unwrap();
        assert!(html.contains("<h1>class UpdateView</h1>"));
        assert!(site_file(&config, &routing::diagram_url("Django", "4.2", EDIT, "UpdateView")).exists());
        assert!(site_file(&config, "/static/style.css").exists());
        assert!(site_file(&config, "/static/classy.js").exists());
        assert!(config.output.directory.join("404.html").exists());
    }

    #[test]
    fn test_shortcuts_point_at_latest_version() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        let mut catalog = django_catalog();
        catalog
            .import_project_version(django_members(), "Django", "5.0")
            .unwrap();

        SiteGenerator::new(&catalog, &config).unwrap().generate().unwrap();

        let html = fs::read_to_string(site_file(&config, "/UpdateView/")).unwrap();
        assert!(html.contains("http-equiv=\"refresh\""));
        assert!(html.contains("5.0"));
        assert!(!html.contains("4.2"));
        assert!(site_file(&config, "/projects/Django/4.2/").exists());
        assert!(site_file(&config, "/projects/Django/5.0/").exists());
    }

    #[test]
    fn test_no_diagrams_when_disabled() {
        let dir = TempDir::new().unwrap();
        let mut config = config_in(&dir);
        config.diagrams.enabled = false;
        let catalog = django_catalog();

        let report = SiteGenerator::new(&catalog, &config).unwrap().generate().unwrap();

        assert_eq!(report.diagrams_generated, 0);
        assert!(!site_file(&config, &routing::diagram_url("Django", "4.2", EDIT, "UpdateView")).exists());
    }

    #[test]
    fn test_search_index_written() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        let catalog = django_catalog();

        SiteGenerator::new(&catalog, &config).unwrap().generate().unwrap();

        let json = fs::read_to_string(site_file(&config, routing::SEARCH_INDEX)).unwrap();
        let entries: serde_json::Value = serde_json::from_str(&json).unwrap();
        let entries = entries.as_array().unwrap();
        assert_eq!(entries.len(), 16);
        assert!(entries.iter().any(|e| e["name"] == "UpdateView" && e["kind"] == "class"));
    }

    #[test]
    fn test_unknown_project_fails() {
        let dir = TempDir::new().unwrap();
        let mut config = config_in(&dir);
        config.project.name = "Flask".to_string();
        let catalog = django_catalog();

        let err = SiteGenerator::new(&catalog, &config).unwrap().generate().unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_asset_lookup() {
        assert!(asset("classy.js").unwrap().contains("toggle"));
        assert!(asset("missing.css").is_none());
    }
}
