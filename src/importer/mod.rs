// Source ingestion: walk a Python source tree and produce catalog members

pub mod resolve;

pub use resolve::ModuleIndex;

use crate::catalog::{AttributeMember, KlassMember, Member, MethodMember, ModuleMember};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::parser::{ParsedFile, PythonParser};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Directories never worth descending into
const SKIPPED_DIRS: &[&str] = &["__pycache__", ".git", "venv", ".venv", "node_modules", ".tox", ".eggs"];

/// Result of processing a source tree
#[derive(Debug)]
pub struct ImportResult {
    /// Members in catalog import order
    pub members: Vec<Member>,
    /// Files that failed to parse (path -> error message)
    pub parse_errors: HashMap<PathBuf, String>,
    /// Number of files parsed successfully
    pub files_parsed: usize,
}

impl ImportResult {
    pub fn count(&self, pred: impl Fn(&Member) -> bool) -> usize {
        self.members.iter().filter(|m| pred(m)).count()
    }
}

/// Turns a source tree into catalog members
pub struct Importer {
    config: Config,
    exclude: Vec<glob::Pattern>,
    verbose: bool,
}

impl Importer {
    pub fn new(config: Config) -> Result<Self> {
        let exclude = config
            .import
            .exclude
            .iter()
            .map(|p| glob::Pattern::new(p))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Self {
            config,
            exclude,
            verbose: false,
        })
    }

    /// Show a progress bar while parsing
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Parse everything under `root` and emit members for the documented
    /// modules
    pub fn process(&self, root: &Path) -> Result<ImportResult> {
        let root = root
            .canonicalize()
            .map_err(|_| Error::PathNotFound(root.to_path_buf()))?;

        let paths = self.discover_files(&root)?;
        if paths.is_empty() {
            return Err(Error::other(format!(
                "No Python files found under {}",
                root.display()
            )));
        }
        info!(files = paths.len(), root = %root.display(), "parsing source tree");

        let (files, parse_errors) = self.parse_files(&paths, &root);
        for (path, message) in &parse_errors {
            warn!(path = %path.display(), "{}", message);
        }

        let index = ModuleIndex::new(&files);
        let mut documented: Vec<&ParsedFile> = files
            .iter()
            .filter(|f| self.documents(&f.module_name))
            .collect();
        documented.sort_by(|a, b| a.module_name.cmp(&b.module_name));

        let mut members = Vec::new();
        for file in documented {
            members.extend(module_members(file, &index));
        }

        Ok(ImportResult {
            members,
            parse_errors,
            files_parsed: files.len(),
        })
    }

    /// Discover all Python files under `root`, honouring exclude patterns
    pub fn discover_files(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        let walker = WalkDir::new(root)
            .follow_links(true)
            .into_iter()
            .filter_entry(|e| {
                e.depth() == 0
                    || !(e.file_type().is_dir()
                        && SKIPPED_DIRS.iter().any(|d| e.file_name() == *d))
            });

        for entry in walker {
            let entry = entry?;
            let path = entry.path();
            if !entry.file_type().is_file() || path.extension().map_or(true, |e| e != "py") {
                continue;
            }
            if self.should_exclude(path, root) {
                debug!(path = %path.display(), "excluded");
                continue;
            }
            files.push(path.to_path_buf());
        }

        files.sort();
        Ok(files)
    }

    fn should_exclude(&self, path: &Path, root: &Path) -> bool {
        let relative = relative_filename(path, root);
        self.exclude.iter().any(|p| p.matches(&relative))
    }

    /// Whether a module falls under one of the configured prefixes
    fn documents(&self, module: &str) -> bool {
        let prefixes = &self.config.import.modules;
        prefixes.is_empty()
            || prefixes.iter().any(|p| {
                module == p
                    || module
                        .strip_prefix(p.as_str())
                        .map_or(false, |rest| rest.starts_with('.'))
            })
    }

    fn parse_files(
        &self,
        paths: &[PathBuf],
        root: &Path,
    ) -> (Vec<ParsedFile>, HashMap<PathBuf, String>) {
        let progress = self.verbose.then(|| {
            let pb = ProgressBar::new(paths.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            pb
        });

        let results: Vec<(PathBuf, Result<ParsedFile>)> = paths
            .par_iter()
            .map_init(PythonParser::new, |parser, path| {
                let parsed = match parser {
                    Ok(parser) => parser.parse_file(path, root),
                    Err(e) => Err(Error::parser(e.to_string())),
                };
                if let Some(pb) = &progress {
                    pb.inc(1);
                }
                (path.clone(), parsed)
            })
            .collect();

        if let Some(pb) = progress {
            pb.finish_with_message("Parsing complete");
        }

        let mut files = Vec::new();
        let mut errors = HashMap::new();
        for (path, result) in results {
            match result {
                Ok(mut file) => {
                    file.path = PathBuf::from(relative_filename(&path, root));
                    files.push(file);
                }
                Err(e) => {
                    errors.insert(path, e.to_string());
                }
            }
        }
        (files, errors)
    }
}

/// `/`-separated path relative to the source root
fn relative_filename(path: &Path, root: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .iter()
        .map(|s| s.to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Members for one module: the module, then each class followed by its
/// attributes and methods
fn module_members(file: &ParsedFile, index: &ModuleIndex) -> Vec<Member> {
    let module = &file.module_name;
    let mut members = vec![Member::Module(ModuleMember {
        name: module.clone(),
        docstring: file.docstring.clone().unwrap_or_default(),
        filename: file.path.to_string_lossy().replace('\\', "/"),
    })];

    for class in &file.classes {
        let path = format!("{}.{}", module, class.name);
        members.push(Member::Klass(KlassMember {
            name: class.name.clone(),
            module: module.clone(),
            docstring: class.docstring.clone().unwrap_or_default(),
            line_number: class.line_start,
            path: path.clone(),
            bases: class
                .bases
                .iter()
                .map(|b| index.resolve_base(file, b))
                .collect(),
            best_import_path: index.best_import_path(module, &class.name),
        }));

        for attribute in &class.attributes {
            members.push(Member::Attribute(AttributeMember {
                name: attribute.name.clone(),
                value: attribute.value.clone(),
                line_number: attribute.line,
                klass_path: path.clone(),
            }));
        }

        for method in &class.methods {
            members.push(Member::Method(MethodMember {
                name: method.name.clone(),
                docstring: method.docstring.clone().unwrap_or_default(),
                code: method.code.clone(),
                kwargs: method.arguments.clone(),
                line_number: method.line_start,
                klass_path: path.clone(),
            }));
        }
    }

    members
}
