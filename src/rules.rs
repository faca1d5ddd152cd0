use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::Deserialize;

pub const DEFAULT_RULES_FILE: &str = "rules.json";

const DEFAULT_SEPARATOR: &str = " | ";

// Raw file model. Every field is optional so that partial configurations
// (or an empty `{}`) still load.
#[derive(Debug, Deserialize)]
struct RuleFile {
    #[serde(default = "default_true")]
    enabled: bool,
    #[serde(default)]
    rules: RuleGroups,
    #[serde(default)]
    output_format: OutputFormat,
}

#[derive(Debug, Default, Deserialize)]
struct RuleGroups {
    #[serde(default)]
    simple_replacements: Vec<LiteralRule>,
    #[serde(default)]
    regex_replacements: Vec<PatternSpec>,
    #[serde(default)]
    custom_replacements: Vec<LiteralRule>,
    #[serde(default)]
    cleanup_options: CleanupOptions,
}

#[derive(Debug, Deserialize)]
struct PatternSpec {
    pattern: String,
    #[serde(default)]
    replace: String,
    #[serde(default = "default_true")]
    enabled: bool,
    #[serde(default)]
    full_replacement: bool,
}

#[derive(Debug, Deserialize)]
struct OutputFormat {
    #[serde(default = "default_separator")]
    separator: String,
}

impl Default for OutputFormat {
    fn default() -> Self {
        OutputFormat {
            separator: default_separator(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_separator() -> String {
    DEFAULT_SEPARATOR.to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LiteralRule {
    pub search: String,
    #[serde(default)]
    pub replace: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub full_replacement: bool,
}

#[derive(Debug, Clone)]
pub struct PatternRule {
    pub pattern: Regex,
    pub replace: String,
    pub enabled: bool,
    pub full_replacement: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CleanupOptions {
    #[serde(default = "default_true")]
    pub collapse_whitespace: bool,
    #[serde(default = "default_true")]
    pub strip_trailing_semicolon: bool,
    #[serde(default = "default_true")]
    pub strip_trailing_colon: bool,
    #[serde(default = "default_true")]
    pub remove_empty_parentheses: bool,
    #[serde(default = "default_true")]
    pub trim: bool,
    #[serde(default)]
    pub max_length: usize,
}

impl Default for CleanupOptions {
    fn default() -> Self {
        CleanupOptions {
            collapse_whitespace: true,
            strip_trailing_semicolon: true,
            strip_trailing_colon: true,
            remove_empty_parentheses: true,
            trim: true,
            max_length: 0,
        }
    }
}

// Compiled, read-only configuration shared across all rows of a run.
#[derive(Debug, Clone)]
pub struct RuleSet {
    pub enabled: bool,
    pub simple: Vec<LiteralRule>,
    pub patterns: Vec<PatternRule>,
    pub custom: Vec<LiteralRule>,
    pub cleanup: CleanupOptions,
    pub separator: String,
}

impl Default for RuleSet {
    fn default() -> Self {
        RuleSet {
            enabled: true,
            simple: Vec::new(),
            patterns: Vec::new(),
            custom: Vec::new(),
            cleanup: CleanupOptions::default(),
            separator: default_separator(),
        }
    }
}

// Loads the rule configuration. Never fails outward: a missing or broken
// file degrades to the built-in default so the conversion can proceed.
pub fn load(path: Option<&Path>) -> RuleSet {
    let (path, explicit) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_RULES_FILE), false),
    };

    let content = match fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) => {
            if explicit {
                eprintln!(
                    "Warning: cannot read rules file '{}': {} (using default configuration)",
                    path.display(),
                    e
                );
            }
            return RuleSet::default();
        }
    };

    parse(&content, &path)
}

fn parse(content: &str, path: &Path) -> RuleSet {
    let file: RuleFile = match serde_json::from_str(content) {
        Ok(f) => f,
        Err(e) => {
            eprintln!(
                "Warning: invalid rules file '{}': {} (using default configuration)",
                path.display(),
                e
            );
            return RuleSet::default();
        }
    };

    compile(file)
}

fn compile(file: RuleFile) -> RuleSet {
    let patterns = file
        .rules
        .regex_replacements
        .into_iter()
        .filter_map(|spec| match Regex::new(&spec.pattern) {
            Ok(re) => Some(PatternRule {
                pattern: re,
                replace: spec.replace,
                enabled: spec.enabled,
                full_replacement: spec.full_replacement,
            }),
            Err(e) => {
                eprintln!(
                    "Warning: invalid rule pattern '{}': {} (rule skipped)",
                    spec.pattern, e
                );
                None
            }
        })
        .collect();

    RuleSet {
        enabled: file.enabled,
        simple: file.rules.simple_replacements,
        patterns,
        custom: file.rules.custom_replacements,
        cleanup: file.rules.cleanup_options,
        separator: file.output_format.separator,
    }
}
