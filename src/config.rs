use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::ConfigError;

const DEFAULT_CONFIG: &str = include_str!("default_config.toml");

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub markdown: MarkdownConfig,
    pub quiz: QuizConfig,
    pub slide: SlideConfig,
    pub highlight: HighlightConfig,
    pub sanitize: SanitizeConfig,
    pub payload: PayloadConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MarkdownConfig {
    /// Render single newlines as `<br>`
    pub breaks: bool,
    pub tables: bool,
    pub strikethrough: bool,
    pub tasklists: bool,
    pub strip_frontmatter: bool,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            breaks: true,
            tables: true,
            strikethrough: true,
            tasklists: true,
            strip_frontmatter: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QuizConfig {
    pub default_title: String,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            default_title: "Quiz".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SlideConfig {
    pub default_title: String,
}

impl Default for SlideConfig {
    fn default() -> Self {
        Self {
            default_title: "Presentation".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    pub enabled: bool,
    /// Theme used by the generated stylesheet
    pub theme: String,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            theme: "InspiredGitHub".to_string(),
        }
    }
}

/// Additions to the sanitizer allowlist on top of what the renderer emits.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct SanitizeConfig {
    pub extra_tags: Vec<String>,
    pub extra_generic_attributes: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PayloadConfig {
    /// Largest encoded placeholder payload, in bytes
    pub max_bytes: usize,
}

impl Default for PayloadConfig {
    fn default() -> Self {
        Self {
            max_bytes: 1024 * 1024,
        }
    }
}

impl Config {
    /// The configuration bundled with the crate (validated by build.rs).
    pub fn compiled_default() -> Self {
        toml::from_str(DEFAULT_CONFIG).unwrap_or_default()
    }

    /// Load config from a TOML file, or return defaults if not found.
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).unwrap_or_else(|e| {
                log::warn!("ignoring invalid config {}: {e}", path.display());
                Self::compiled_default()
            }),
            Err(_) => Self::compiled_default(),
        }
    }

    /// Load config from a TOML file, failing on a missing or invalid file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiled_default_matches_default_impl() {
        let compiled = Config::compiled_default();
        let default = Config::default();
        assert_eq!(compiled.markdown.breaks, default.markdown.breaks);
        assert_eq!(compiled.quiz.default_title, default.quiz.default_title);
        assert_eq!(compiled.slide.default_title, default.slide.default_title);
        assert_eq!(compiled.highlight.theme, default.highlight.theme);
        assert_eq!(compiled.payload.max_bytes, default.payload.max_bytes);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = Config::from_toml("[slide]\ndefault_title = \"Presentazione\"\n").unwrap();
        assert_eq!(config.slide.default_title, "Presentazione");
        assert_eq!(config.quiz.default_title, "Quiz");
        assert!(config.markdown.breaks);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        assert!(matches!(
            Config::from_toml("[markdown\nbreaks = 1"),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = Config::load(Path::new("/nonexistent/notemark.toml"));
        assert_eq!(config.payload.max_bytes, 1024 * 1024);
        assert!(matches!(
            Config::from_file(Path::new("/nonexistent/notemark.toml")),
            Err(ConfigError::Io { .. })
        ));
    }
}
