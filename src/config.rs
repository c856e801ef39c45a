use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub project: ProjectConfig,
    pub import: ImportConfig,
    pub catalog: CatalogConfig,
    pub output: OutputConfig,
    pub server: ServerConfig,
    pub diagrams: DiagramConfig,
    pub logging: LoggingConfig,
}

/// Project metadata and external link patterns
///
/// Link patterns accept `{version}`, `{short_version}`, `{filename}`,
/// `{line}`, `{import_path}`, `{module}` and `{name}` placeholders.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub name: String,
    pub source_url: Option<String>,
    pub docs_url: Option<String>,
}

/// Source ingestion settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Dotted module prefixes to document; empty means everything
    pub modules: Vec<String>,
    pub exclude: Vec<String>,
}

/// Where the catalog snapshot lives
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub path: PathBuf,
}

/// Static site output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: PathBuf,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Diagram settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagramConfig {
    pub enabled: bool,
    pub direction: DiagramDirection,
}

/// Mermaid layout direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum DiagramDirection {
    #[default]
    Bt,
    Tb,
    Lr,
    Rl,
}

impl DiagramDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagramDirection::Bt => "BT",
            DiagramDirection::Tb => "TB",
            DiagramDirection::Lr => "LR",
            DiagramDirection::Rl => "RL",
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence
    pub level: String,
    pub format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: "Django".to_string(),
            source_url: Some(
                "https://github.com/django/django/blob/{version}/{filename}#L{line}".to_string(),
            ),
            docs_url: Some(
                "https://docs.djangoproject.com/en/{short_version}/ref/class-based-views/#{import_path}.{name}"
                    .to_string(),
            ),
        }
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            modules: vec![],
            exclude: vec![
                "**/tests/**".to_string(),
                "**/test_*.py".to_string(),
                "**/migrations/**".to_string(),
            ],
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("classy.json"),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./classy-site"),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

impl Default for DiagramConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            direction: DiagramDirection::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Merge CLI arguments into config (CLI takes precedence)
    pub fn merge_cli(&mut self, cli: CliOverrides) {
        if let Some(catalog) = cli.catalog {
            self.catalog.path = catalog;
        }

        if let Some(out) = cli.output {
            self.output.directory = out;
        }

        if !cli.exclude.is_empty() {
            self.import.exclude.extend(cli.exclude);
        }

        if let Some(host) = cli.host {
            self.server.host = host;
        }

        if let Some(port) = cli.port {
            self.server.port = port;
        }

        if cli.no_diagrams {
            self.diagrams.enabled = false;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.project.name.trim().is_empty() {
            return Err(Error::config_validation("project name must not be empty"));
        }

        if self.server.port == 0 {
            return Err(Error::config_validation("server port must be non-zero"));
        }

        for pattern in &self.import.exclude {
            glob::Pattern::new(pattern)?;
        }

        if let Some(module) = self
            .import
            .modules
            .iter()
            .find(|m| m.is_empty() || m.starts_with('.') || m.ends_with('.'))
        {
            return Err(Error::config_validation(format!(
                "invalid module prefix: '{}'",
                module
            )));
        }

        Ok(())
    }
}

/// Values from the command line that override the config file
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub catalog: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub exclude: Vec<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub no_diagrams: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.project.name, "Django");
        assert_eq!(config.catalog.path, PathBuf::from("classy.json"));
        assert_eq!(config.server.port, 8000);
        assert!(config.diagrams.enabled);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_valid_config() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[project]
name = "Shop"
source_url = "https://example.com/{{filename}}#L{{line}}"

[import]
modules = ["shop.views"]

[server]
port = 9000

[diagrams]
enabled = false
direction = "LR"

[logging]
level = "debug"
format = "json"
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.project.name, "Shop");
        assert_eq!(
            config.project.source_url.as_deref(),
            Some("https://example.com/{filename}#L{line}")
        );
        assert_eq!(config.import.modules, vec!["shop.views".to_string()]);
        assert_eq!(config.server.port, 9000);
        assert!(!config.diagrams.enabled);
        assert_eq!(config.diagrams.direction, DiagramDirection::Lr);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "debug");
        // untouched sections keep their defaults
        assert_eq!(config.catalog.path, PathBuf::from("classy.json"));
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load(Path::new("/nonexistent/classy.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_empty_project_name() {
        let mut config = Config::default();
        config.project.name = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_zero_port() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_bad_glob() {
        let mut config = Config::default();
        config.import.exclude.push("[".to_string());
        assert!(matches!(config.validate(), Err(Error::GlobPattern(_))));
    }

    #[test]
    fn test_validation_bad_module_prefix() {
        let mut config = Config::default();
        config.import.modules = vec!["django.views.".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_merge_cli_paths() {
        let mut config = Config::default();
        config.merge_cli(CliOverrides {
            catalog: Some(PathBuf::from("/tmp/cat.json")),
            output: Some(PathBuf::from("/tmp/site")),
            ..Default::default()
        });
        assert_eq!(config.catalog.path, PathBuf::from("/tmp/cat.json"));
        assert_eq!(config.output.directory, PathBuf::from("/tmp/site"));
    }

    #[test]
    fn test_merge_cli_exclude_extends() {
        let mut config = Config::default();
        let initial = config.import.exclude.len();
        config.merge_cli(CliOverrides {
            exclude: vec!["**/contrib/**".to_string()],
            ..Default::default()
        });
        assert_eq!(config.import.exclude.len(), initial + 1);
    }

    #[test]
    fn test_merge_cli_server_and_diagrams() {
        let mut config = Config::default();
        config.merge_cli(CliOverrides {
            host: Some("0.0.0.0".to_string()),
            port: Some(3000),
            no_diagrams: true,
            ..Default::default()
        });
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert!(!config.diagrams.enabled);
    }

    #[test]
    fn test_direction_parsing() {
        let diagram: DiagramConfig = toml::from_str(r#"direction = "TB""#).unwrap();
        assert_eq!(diagram.direction, DiagramDirection::Tb);
        assert_eq!(diagram.direction.as_str(), "TB");
    }
}
