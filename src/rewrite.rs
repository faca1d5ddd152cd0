use std::sync::OnceLock;

use regex::Regex;

use crate::rules::{CleanupOptions, RuleSet};

fn whitespace_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid pattern"))
}

fn empty_parens() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\(\s*\)").expect("valid pattern"))
}

// Applies the configured substitution rules and cleanup to one composed
// description. Pure and total: any input string yields a string.
//
// Order is significant: earlier rules can rewrite text that later rules
// would otherwise have matched.
pub fn apply(text: &str, rules: &RuleSet) -> String {
    if !rules.enabled {
        return text.to_string();
    }

    let mut current = text.to_string();

    for rule in &rules.simple {
        if !rule.enabled {
            continue;
        }
        current = apply_literal(&current, &rule.search, &rule.replace, rule.full_replacement);
    }

    for rule in &rules.patterns {
        if !rule.enabled {
            continue;
        }
        if rule.full_replacement {
            if rule.pattern.is_match(&current) {
                current = rule.replace.clone();
            }
        } else {
            current = rule
                .pattern
                .replace_all(&current, rule.replace.as_str())
                .into_owned();
        }
    }

    for rule in &rules.custom {
        if !rule.enabled {
            continue;
        }
        current = apply_literal(&current, &rule.search, &rule.replace, rule.full_replacement);
    }

    cleanup(&current, &rules.cleanup)
}

fn apply_literal(text: &str, search: &str, replace: &str, full_replacement: bool) -> String {
    if full_replacement {
        if text.contains(search) {
            replace.to_string()
        } else {
            text.to_string()
        }
    } else {
        text.replace(search, replace)
    }
}

// Cleanup steps run in this fixed order regardless of how the options are
// declared in the configuration file.
fn cleanup(text: &str, options: &CleanupOptions) -> String {
    let mut s = text.to_string();

    if options.collapse_whitespace {
        s = whitespace_run().replace_all(&s, " ").into_owned();
    }
    if options.strip_trailing_semicolon {
        s = s.trim_end_matches(';').to_string();
    }
    if options.strip_trailing_colon {
        s = s.trim_end_matches(':').to_string();
    }
    if options.remove_empty_parentheses {
        s = empty_parens().replace_all(&s, "").into_owned();
    }
    if options.trim {
        s = s.trim().to_string();
    }
    if options.max_length > 0 && s.chars().count() > options.max_length {
        s = s.chars().take(options.max_length).collect();
        s = s.trim_end().to_string();
    }

    s
}
