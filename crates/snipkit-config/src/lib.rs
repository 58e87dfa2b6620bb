use serde::{Deserialize, Serialize};
use snipkit_engine::{InMemoryTemplateStore, PipelineSettings, StoreError, Template, TriggerKey};
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read library file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse library file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid template library at {config_path}: {source}")]
    InvalidLibrary {
        config_path: PathBuf,
        source: StoreError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub trigger_key: TriggerKey,
    pub case_sensitive: bool,
    /// Where the CLI writes its log; defaults next to the library file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            trigger_key: TriggerKey::Space,
            case_sensitive: false,
            log_file: None,
        }
    }
}

impl AppSettings {
    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            trigger_key: self.trigger_key,
            case_sensitive: self.case_sensitive,
        }
    }
}

/// Everything snipkit persists: templates, their categories and settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Library {
    pub settings: AppSettings,
    pub categories: Vec<Category>,
    pub templates: Vec<Template>,
}

impl Library {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut library: Library =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        // Reject libraries the store would refuse, e.g. duplicate triggers
        library
            .template_store()
            .map_err(|source| ConfigError::InvalidLibrary {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        if let Some(log_file) = library.settings.log_file.take() {
            library.settings.log_file = Some(Self::expand_path(&log_file).unwrap_or(log_file));
        }

        Ok(Some(library))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_dir() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/snipkit");
        PathBuf::from(config_dir.as_ref())
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("library.toml")
    }

    /// The configured log file, or `snipkit.log` in the config directory.
    pub fn log_path(&self) -> PathBuf {
        self.settings
            .log_file
            .clone()
            .unwrap_or_else(|| Self::config_dir().join("snipkit.log"))
    }

    pub fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }

    /// Loads the templates into a store the expansion pipeline can query.
    pub fn template_store(&self) -> Result<InMemoryTemplateStore, StoreError> {
        InMemoryTemplateStore::from_templates(self.templates.iter().cloned())
    }

    pub fn category(&self, id: Uuid) -> Option<&Category> {
        self.categories.iter().find(|category| category.id == id)
    }

    /// A small library to try things out with when none has been saved.
    pub fn sample() -> Self {
        let everyday = Category {
            id: Uuid::new_v4(),
            name: "Everyday".to_string(),
        };
        let templates = [
            ("Signature", "/sig", "Best regards,\n<input:Your name:Ada>"),
            ("Today", "/today", "<date:DD/MM/YYYY>"),
            ("Now", "/now", "<datetime>"),
            ("Quote clipboard", "/quote", "\"<clipboard:trim>\""),
            (
                "Reply",
                "/reply",
                "Hi <input:Name>,\n\nThanks for your note about <select:Topic:billing,support,sales>. <cursor>",
            ),
            (
                "Meeting",
                "/meet",
                "Meeting on <tab:1:date> at <tab:2:time> about <tab:3:topic>",
            ),
        ]
        .into_iter()
        .map(|(name, trigger, content)| Template {
            category_id: Some(everyday.id),
            ..Template::new(name, trigger, content)
        })
        .collect();

        Library {
            settings: AppSettings::default(),
            categories: vec![everyday],
            templates,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::env;
    use tempfile::TempDir;

    const LIBRARY_TOML: &str = r#"
[settings]
trigger_key = "none"
case_sensitive = true

[[categories]]
id = "67e55044-10b1-426f-9247-bb680e5fe0c8"
name = "Work"

[[templates]]
id = "a1a2a3a4-b1b2-4c1c-8d1d-e1e2e3e4e5e6"
name = "Signature"
trigger = ";sig"
content = "Best,\nAda"
category_id = "67e55044-10b1-426f-9247-bb680e5fe0c8"
"#;

    #[test]
    fn test_config_path() {
        let config_path = Library::config_path();
        let path_str = config_path.to_string_lossy();

        assert!(!path_str.starts_with('~'));
        assert!(path_str.ends_with(".config/snipkit/library.toml"));
    }

    #[test]
    fn test_parse_library() {
        let library: Library = toml::from_str(LIBRARY_TOML).unwrap();

        assert_eq!(library.settings.trigger_key, TriggerKey::None);
        assert!(library.settings.case_sensitive);
        assert_eq!(library.templates.len(), 1);
        assert_eq!(library.templates[0].trigger, ";sig");
        let category = library.templates[0]
            .category_id
            .and_then(|id| library.category(id));
        assert_eq!(category.map(|c| c.name.as_str()), Some("Work"));
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let library: Library = toml::from_str("").unwrap();

        assert_eq!(library.settings, AppSettings::default());
        assert_eq!(library.settings.trigger_key, TriggerKey::Space);
        assert!(!library.settings.case_sensitive);
        assert!(library.templates.is_empty());
    }

    #[test]
    fn test_pipeline_settings() {
        let settings = AppSettings {
            trigger_key: TriggerKey::Tab,
            case_sensitive: true,
            log_file: None,
        };
        assert_eq!(
            settings.pipeline_settings(),
            PipelineSettings {
                trigger_key: TriggerKey::Tab,
                case_sensitive: true,
            }
        );
    }

    #[test]
    fn test_load_library_file_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let non_existent = temp_dir.path().join("nonexistent.toml");

        let result = Library::load_from_path(&non_existent).unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn test_save_and_load_library() {
        let temp_dir = TempDir::new().unwrap();
        let library_file = temp_dir.path().join("nested").join("library.toml");
        let library = Library::sample();

        library.save_to_path(&library_file).unwrap();
        let loaded = Library::load_from_path(&library_file).unwrap().unwrap();

        assert_eq!(loaded, library);
    }

    #[test]
    fn test_load_rejects_duplicate_triggers() {
        let temp_dir = TempDir::new().unwrap();
        let library_file = temp_dir.path().join("library.toml");
        let mut library = Library::sample();
        let mut copy = library.templates[0].clone();
        copy.id = Uuid::new_v4();
        copy.trigger = copy.trigger.to_uppercase();
        library.templates.push(copy);
        library.save_to_path(&library_file).unwrap();

        let err = Library::load_from_path(&library_file).unwrap_err();

        assert!(matches!(
            err,
            ConfigError::InvalidLibrary {
                source: StoreError::DuplicateTrigger { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let temp_dir = TempDir::new().unwrap();
        let library_file = temp_dir.path().join("library.toml");
        std::fs::write(&library_file, "[settings]\ntrigger_key = \"meta\"\n").unwrap();

        let err = Library::load_from_path(&library_file).unwrap_err();

        assert!(matches!(err, ConfigError::ConfigParseError { .. }));
        assert!(err.to_string().contains("library.toml"));
    }

    #[test]
    fn test_log_file_is_expanded() {
        unsafe {
            env::set_var("SNIPKIT_TEST_LOGS", "/var/log/snipkit");
        }
        let temp_dir = TempDir::new().unwrap();
        let library_file = temp_dir.path().join("library.toml");
        std::fs::write(
            &library_file,
            "[settings]\nlog_file = \"$SNIPKIT_TEST_LOGS/cli.log\"\n",
        )
        .unwrap();

        let library = Library::load_from_path(&library_file).unwrap().unwrap();

        assert_eq!(library.log_path(), PathBuf::from("/var/log/snipkit/cli.log"));
        unsafe {
            env::remove_var("SNIPKIT_TEST_LOGS");
        }
    }

    #[test]
    fn test_default_log_path() {
        let log_path = Library::default().log_path();
        assert!(log_path.ends_with(".config/snipkit/snipkit.log"));
    }

    #[test]
    fn test_sample_library_builds_a_store() {
        let store = Library::sample().template_store().unwrap();
        assert_eq!(store.len(), 6);
    }
}
