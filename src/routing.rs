// URL scheme shared by the static build and the server

use crate::catalog::{Catalog, Klass, Module, ProjectVersion};
use crate::config::ProjectConfig;
use crate::error::Result;
use std::path::PathBuf;

pub const STATIC_PREFIX: &str = "/static";
pub const DIAGRAM_FILE: &str = "diagram.mmd";
pub const SEARCH_INDEX: &str = "/search.json";

/// Top-level path segments that a class shortcut must not shadow
pub const RESERVED_SEGMENTS: &[&str] = &["projects", "static", "search.json"];

pub fn home_url() -> String {
    "/".to_string()
}

pub fn version_url(project: &str, version: &str) -> String {
    format!("/projects/{}/{}/", project, version)
}

pub fn module_url(project: &str, version: &str, module: &str) -> String {
    format!("{}{}/", version_url(project, version), module)
}

pub fn klass_url(project: &str, version: &str, module: &str, klass: &str) -> String {
    format!("{}{}/", module_url(project, version, module), klass)
}

pub fn diagram_url(project: &str, version: &str, module: &str, klass: &str) -> String {
    format!("{}{}", klass_url(project, version, module, klass), DIAGRAM_FILE)
}

/// Jump-to-class permalink, always pointing at the newest version
pub fn shortcut_url(klass: &str) -> String {
    format!("/{}/", klass)
}

pub fn static_url(asset: &str) -> String {
    format!("{}/{}", STATIC_PREFIX, asset)
}

pub fn is_reserved(segment: &str) -> bool {
    RESERVED_SEGMENTS.contains(&segment)
}

/// Canonical detail URL of a catalog class
pub fn url_for_klass(catalog: &Catalog, klass: &Klass) -> Result<String> {
    let (module, version, project) = catalog.lineage(klass)?;
    Ok(klass_url(
        &project.name,
        &version.version_number,
        &module.name,
        &klass.name,
    ))
}

/// File a page URL is written to in a static build
pub fn output_path(url: &str) -> PathBuf {
    let mut path: PathBuf = url.split('/').filter(|s| !s.is_empty()).collect();
    if url.ends_with('/') {
        path.push("index.html");
    }
    path
}

/// Values substituted into configured link patterns
#[derive(Debug, Clone)]
pub struct LinkContext<'a> {
    pub version: &'a ProjectVersion,
    pub module: &'a Module,
    pub line: usize,
    pub import_path: &'a str,
    pub name: &'a str,
}

impl LinkContext<'_> {
    /// Replace `{placeholder}`s; unknown placeholders are left as written
    pub fn expand(&self, pattern: &str) -> String {
        pattern
            .replace("{version}", &self.version.version_number)
            .replace("{short_version}", &self.version.short_version())
            .replace("{filename}", &self.module.filename)
            .replace("{line}", &self.line.to_string())
            .replace("{import_path}", self.import_path)
            .replace("{module}", &self.module.name)
            .replace("{name}", self.name)
    }

    pub fn source_url(&self, project: &ProjectConfig) -> Option<String> {
        project.source_url.as_deref().map(|p| self.expand(p))
    }

    pub fn docs_url(&self, project: &ProjectConfig) -> Option<String> {
        project.docs_url.as_deref().map(|p| self.expand(p))
    }
}
