//! Category overrides and file filtering configuration.
//!
//! Configuration is read from a TOML file and covers two concerns:
//! - extension → category overrides layered over the built-in table
//! - filter rules deciding which files a sort even looks at
//!
//! # Configuration File Format
//!
//! ```toml
//! [categories]
//! psd = "Design"
//! ".nfo" = "Info"
//!
//! [filters]
//! include_hidden = true
//!
//! [filters.exclude]
//! filenames = ["desktop.ini", "Thumbs.db"]
//! patterns = ["~$*", "*.part"]
//! extensions = ["crdownload"]
//! regex = []
//!
//! [filters.include]
//! patterns = []
//! ```

use crate::file_category::{CategoryTable, extension_of, normalize_extension};
use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the per-directory configuration file.
pub const LOCAL_CONFIG_FILE: &str = ".dirsortrc.toml";

/// Errors that can occur while loading or compiling configuration.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),
    #[error("Invalid glob pattern '{0}'")]
    InvalidGlobPattern(String),
    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern { pattern: String, reason: String },
    /// A category override has an empty extension or an unusable folder name.
    #[error("Invalid category override '{extension}' = '{category}': {reason}")]
    InvalidCategoryOverride {
        extension: String,
        category: String,
        reason: &'static str,
    },
    #[error("IO error reading configuration: {0}")]
    IoError(String),
}

/// Top-level configuration, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SorterConfig {
    /// Extension → category overrides.
    #[serde(default)]
    pub categories: BTreeMap<String, String>,

    #[serde(default)]
    pub filters: FilterRules,
}

/// Rules deciding which files are considered for sorting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterRules {
    /// Whether dotfiles are sorted. Defaults to true; they land in "Others".
    #[serde(default = "default_include_hidden")]
    pub include_hidden: bool,

    #[serde(default)]
    pub exclude: ExcludeRules,

    /// Whitelist, overrides every exclude rule.
    #[serde(default)]
    pub include: IncludeRules,
}

fn default_include_hidden() -> bool {
    true
}

impl Default for FilterRules {
    fn default() -> Self {
        Self {
            include_hidden: default_include_hidden(),
            exclude: ExcludeRules::default(),
            include: IncludeRules::default(),
        }
    }
}

/// Rules for leaving files where they are.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExcludeRules {
    /// Exact file names (e.g. "desktop.ini").
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Glob patterns matched against the file name (e.g. "*.part").
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Extensions, case-insensitive, leading dot optional.
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Regex patterns matched against the file name.
    #[serde(default)]
    pub regex: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncludeRules {
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl SorterConfig {
    /// Loads configuration, falling back to defaults.
    ///
    /// Lookup order:
    /// 1. `config_path`, if given (must exist)
    /// 2. `.dirsortrc.toml` in the current directory
    /// 3. `~/.config/dirsort/config.toml`
    /// 4. built-in defaults
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("dirsort")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        tracing::debug!("loaded configuration from {}", path.display());
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }

    /// Builds the category table: built-in mappings plus validated overrides.
    ///
    /// Two keys naming the same extension (`psd` and `".PSD"`) are rejected.
    pub fn category_table(&self) -> Result<CategoryTable, ConfigError> {
        let mut table = CategoryTable::new();
        let mut seen = HashSet::new();
        for (ext, category) in &self.categories {
            validate_override(ext, category)?;
            if !seen.insert(normalize_extension(ext)) {
                return Err(ConfigError::InvalidCategoryOverride {
                    extension: ext.clone(),
                    category: category.clone(),
                    reason: "duplicate extension",
                });
            }
            table.set(ext, category.trim());
        }
        Ok(table)
    }

    /// Compiles the filter rules.
    pub fn compile_filters(&self) -> Result<CompiledFilters, ConfigError> {
        CompiledFilters::new(&self.filters)
    }
}

fn validate_override(ext: &str, category: &str) -> Result<(), ConfigError> {
    let invalid = |reason: &'static str| ConfigError::InvalidCategoryOverride {
        extension: ext.to_string(),
        category: category.to_string(),
        reason,
    };

    if normalize_extension(ext).is_empty() {
        return Err(invalid("extension is empty"));
    }
    let category = category.trim();
    if category.is_empty() {
        return Err(invalid("category is empty"));
    }
    if category == "." || category == ".." || category.contains(['/', '\\']) {
        return Err(invalid("category must be a plain folder name"));
    }
    Ok(())
}

fn compile_globs(patterns: &[String]) -> Result<Vec<Pattern>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| {
            Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
        })
        .collect()
}

/// Pre-compiled filter rules.
#[derive(Debug, Clone)]
pub struct CompiledFilters {
    include_hidden: bool,
    exclude_filenames: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
    include_patterns: Vec<Pattern>,
}

impl CompiledFilters {
    fn new(rules: &FilterRules) -> Result<Self, ConfigError> {
        let exclude_regexes = rules
            .exclude
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            include_hidden: rules.include_hidden,
            exclude_filenames: rules.exclude.filenames.iter().cloned().collect(),
            exclude_extensions: rules
                .exclude
                .extensions
                .iter()
                .map(|ext| normalize_extension(ext))
                .collect(),
            exclude_patterns: compile_globs(&rules.exclude.patterns)?,
            exclude_regexes,
            include_patterns: compile_globs(&rules.include.patterns)?,
        })
    }

    /// Filters that let every file through.
    pub fn allow_all() -> Self {
        Self {
            include_hidden: true,
            exclude_filenames: HashSet::new(),
            exclude_extensions: HashSet::new(),
            exclude_patterns: Vec::new(),
            exclude_regexes: Vec::new(),
            include_patterns: Vec::new(),
        }
    }

    /// Checks whether a file with this name should be sorted.
    ///
    /// Include patterns win outright; otherwise the hidden-file switch, exact
    /// names, extensions, globs and regexes are tried in that order.
    pub fn should_include(&self, file_name: &str) -> bool {
        if self.include_patterns.iter().any(|p| p.matches(file_name)) {
            return true;
        }

        if !self.include_hidden && file_name.starts_with('.') {
            return false;
        }

        if self.exclude_filenames.contains(file_name) {
            return false;
        }

        if let Some(ext) = extension_of(file_name)
            && self.exclude_extensions.contains(&ext)
        {
            return false;
        }

        if self.exclude_patterns.iter().any(|p| p.matches(file_name)) {
            return false;
        }

        !self.exclude_regexes.iter().any(|r| r.is_match(file_name))
    }
}

impl Default for CompiledFilters {
    fn default() -> Self {
        Self::allow_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filters_with(exclude: ExcludeRules) -> CompiledFilters {
        let rules = FilterRules {
            exclude,
            ..Default::default()
        };
        CompiledFilters::new(&rules).unwrap()
    }

    #[test]
    fn test_default_config_sorts_hidden_files() {
        let config = SorterConfig::default();
        assert!(config.filters.include_hidden);
        let compiled = config.compile_filters().unwrap();
        assert!(compiled.should_include(".hidden"));
    }

    #[test]
    fn test_missing_filters_section_keeps_hidden_default() {
        let config = SorterConfig::from_toml_str("[categories]\npsd = \"Design\"\n").unwrap();
        assert!(config.filters.include_hidden);
        let psd = config.categories.get("psd").map(String::as_str);
        assert_eq!(psd, Some("Design"));
    }

    #[test]
    fn test_hidden_files_excluded_when_disabled() {
        let config = SorterConfig::from_toml_str("[filters]\ninclude_hidden = false\n").unwrap();
        let compiled = config.compile_filters().unwrap();
        assert!(!compiled.should_include(".DS_Store"));
        assert!(compiled.should_include("photo.png"));
    }

    #[test]
    fn test_exclude_exact_filename() {
        let compiled = filters_with(ExcludeRules {
            filenames: vec!["desktop.ini".to_string()],
            ..Default::default()
        });
        assert!(!compiled.should_include("desktop.ini"));
        assert!(compiled.should_include("Desktop.ini.bak"));
    }

    #[test]
    fn test_exclude_extensions_case_insensitive() {
        let compiled = filters_with(ExcludeRules {
            extensions: vec![".PART".to_string(), "crdownload".to_string()],
            ..Default::default()
        });
        assert!(!compiled.should_include("movie.mkv.part"));
        assert!(!compiled.should_include("setup.exe.CRDOWNLOAD"));
        assert!(compiled.should_include("movie.mkv"));
    }

    #[test]
    fn test_exclude_glob_patterns() {
        let compiled = filters_with(ExcludeRules {
            patterns: vec!["~$*".to_string(), "[0-9]*.tmp".to_string()],
            ..Default::default()
        });
        assert!(!compiled.should_include("~$report.docx"));
        assert!(!compiled.should_include("1cache.tmp"));
        assert!(compiled.should_include("cache.tmp"));
        assert!(compiled.should_include("report.docx"));
    }

    #[test]
    fn test_exclude_regex() {
        let compiled = filters_with(ExcludeRules {
            regex: vec![r"^draft_.*\.txt$".to_string()],
            ..Default::default()
        });
        assert!(!compiled.should_include("draft_one.txt"));
        assert!(compiled.should_include("final.txt"));
    }

    #[test]
    fn test_include_overrides_exclude() {
        let rules = FilterRules {
            include_hidden: false,
            exclude: ExcludeRules {
                extensions: vec!["log".to_string()],
                ..Default::default()
            },
            include: IncludeRules {
                patterns: vec!["keep*.log".to_string(), ".important".to_string()],
            },
        };
        let compiled = CompiledFilters::new(&rules).unwrap();
        assert!(compiled.should_include("keep_me.log"));
        assert!(!compiled.should_include("debug.log"));
        assert!(compiled.should_include(".important"));
        assert!(!compiled.should_include(".other"));
    }

    #[test]
    fn test_invalid_regex_returns_error() {
        let rules = FilterRules {
            exclude: ExcludeRules {
                regex: vec!["[invalid(".to_string()],
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            CompiledFilters::new(&rules),
            Err(ConfigError::InvalidRegexPattern { .. })
        ));
    }

    #[test]
    fn test_invalid_glob_returns_error() {
        let rules = FilterRules {
            exclude: ExcludeRules {
                patterns: vec!["[invalid".to_string()],
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            CompiledFilters::new(&rules),
            Err(ConfigError::InvalidGlobPattern(_))
        ));
    }

    #[test]
    fn test_category_overrides_applied() {
        let config = SorterConfig::from_toml_str(
            r#"
[categories]
".PSD" = "Design"
log = "Logs"
"#,
        )
        .unwrap();
        let table = config.category_table().unwrap();
        assert_eq!(table.classify("mock.psd"), "Design");
        assert_eq!(table.classify("server.log"), "Logs");
        assert_eq!(table.classify("photo.png"), "Images");
    }

    #[test]
    fn test_category_override_rejects_bad_names() {
        for toml in [
            "[categories]\n\".\" = \"Design\"\n",
            "[categories]\npsd = \"  \"\n",
            "[categories]\npsd = \"a/b\"\n",
            "[categories]\npsd = \"..\"\n",
        ] {
            let config = SorterConfig::from_toml_str(toml).unwrap();
            assert!(
                matches!(
                    config.category_table(),
                    Err(ConfigError::InvalidCategoryOverride { .. })
                ),
                "should reject: {}",
                toml
            );
        }
    }

    #[test]
    fn test_category_override_rejects_duplicate_extension() {
        let config = SorterConfig::from_toml_str(
            r#"
[categories]
psd = "Design"
".PSD" = "Artwork"
"#,
        )
        .unwrap();
        match config.category_table() {
            Err(ConfigError::InvalidCategoryOverride { reason, .. }) => {
                assert_eq!(reason, "duplicate extension");
            }
            other => panic!("expected duplicate extension error, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let result = SorterConfig::from_toml_str("[filters\n");
        assert!(matches!(result, Err(ConfigError::ConfigInvalid(_))));
    }

    #[test]
    fn test_explicit_missing_config_is_error() {
        let result = SorterConfig::load(Some(Path::new("/non/existent/dirsort.toml")));
        assert!(matches!(result, Err(ConfigError::ConfigNotFound(_))));
    }
}
