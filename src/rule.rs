//! Declarative rules: a name, one or more selectors and a message.
//!
//! A [`RuleSet`] registers every rule's selectors with a single
//! [`NodeEventGenerator`] and subscribes each rule to its own patterns, so
//! one walk per file serves all rules. Patterns shared by several rules are
//! matched once and delivered to each subscriber.

use std::borrow::Cow;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};
use thiserror::Error;

use crate::config::{ResolvedConfig, RuleConfig};
use crate::diagnostic::{Diagnostic, Location, Severity};
use crate::generator::{NodeEventGenerator, RegistrationError};
use crate::tree::{NodeId, Tree};

pub const ADHOC_RULE_NAME: &str = "Adhoc/Selector";

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("rule `{rule}` has no selectors")]
    NoSelectors { rule: String },
    #[error("rule `{rule}`: {source}")]
    Selector {
        rule: String,
        #[source]
        source: RegistrationError,
    },
    #[error("rule `{rule}`: invalid exclude pattern `{pattern}`: {source}")]
    Exclude {
        rule: String,
        pattern: String,
        #[source]
        source: globset::Error,
    },
}

#[derive(Debug, Clone)]
pub struct Rule {
    pub name: String,
    pub selectors: Vec<String>,
    pub message: String,
    pub severity: Severity,
    exclude: GlobSet,
}

impl Rule {
    pub fn new(
        name: impl Into<String>,
        selectors: Vec<String>,
        message: impl Into<String>,
        severity: Severity,
    ) -> Result<Self, RuleError> {
        let name = name.into();
        if selectors.is_empty() {
            return Err(RuleError::NoSelectors { rule: name });
        }
        Ok(Self {
            name,
            selectors,
            message: message.into(),
            severity,
            exclude: GlobSet::empty(),
        })
    }

    pub fn from_config(name: &str, config: &RuleConfig) -> Result<Self, RuleError> {
        let message = config
            .message
            .clone()
            .unwrap_or_else(|| format!("matches `{}`", config.selectors.join("`, `")));
        let rule = Self::new(
            name,
            config.selectors.clone(),
            message,
            config.severity.unwrap_or(Severity::Warning),
        )?;
        rule.with_excludes(&config.exclude)
    }

    /// A rule for a single `--selector` given on the command line.
    pub fn adhoc(pattern: &str) -> Self {
        Self {
            name: ADHOC_RULE_NAME.to_string(),
            selectors: vec![pattern.to_string()],
            message: format!("matches `{pattern}`"),
            severity: Severity::Warning,
            exclude: GlobSet::empty(),
        }
    }

    pub fn with_excludes(mut self, patterns: &[String]) -> Result<Self, RuleError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = Glob::new(pattern).map_err(|source| RuleError::Exclude {
                rule: self.name.clone(),
                pattern: pattern.clone(),
                source,
            })?;
            builder.add(glob);
        }
        self.exclude = builder.build().map_err(|source| RuleError::Exclude {
            rule: self.name.clone(),
            pattern: patterns.join(", "),
            source,
        })?;
        Ok(self)
    }

    /// `path` is matched as given, minus a leading `./`. [`RuleSet::check`]
    /// passes paths relative to the config directory.
    pub fn is_excluded(&self, path: &str) -> bool {
        let path = path.strip_prefix("./").unwrap_or(path);
        self.exclude.is_match(path)
    }
}

/// Rule filter from `--only` / `--except`.
#[derive(Debug, Default, Clone)]
pub struct RuleFilter {
    pub only: Vec<String>,
    pub except: Vec<String>,
}

impl RuleFilter {
    pub fn allows(&self, name: &str) -> bool {
        (self.only.is_empty() || self.only.iter().any(|n| n == name))
            && !self.except.iter().any(|n| n == name)
    }
}

#[derive(Debug)]
pub struct RuleSet {
    rules: Vec<Rule>,
    generator: NodeEventGenerator,
    /// Registered pattern -> indices of the rules listening for it.
    listeners: HashMap<String, Vec<usize>>,
    /// Exclude globs are relative to this directory.
    base_dir: Option<PathBuf>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Result<Self, RuleError> {
        let mut listeners: HashMap<String, Vec<usize>> = HashMap::new();
        for (index, rule) in rules.iter().enumerate() {
            for pattern in &rule.selectors {
                let subscribers = listeners.entry(pattern.clone()).or_default();
                if !subscribers.contains(&index) {
                    subscribers.push(index);
                }
            }
        }

        let patterns = rules.iter().flat_map(|rule| rule.selectors.iter());
        let generator = NodeEventGenerator::new(patterns).map_err(|source| {
            let rule = rules
                .iter()
                .find(|rule| rule.selectors.contains(&source.pattern))
                .map(|rule| rule.name.clone())
                .unwrap_or_default();
            RuleError::Selector { rule, source }
        })?;

        Ok(Self {
            rules,
            generator,
            listeners,
            base_dir: None,
        })
    }

    /// Match exclude globs against paths relative to `dir`. Paths outside
    /// `dir` are matched as given.
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    fn exclude_path<'p>(&self, path: &'p str) -> Cow<'p, str> {
        let relative = self
            .base_dir
            .as_deref()
            .and_then(|base| Path::new(path).strip_prefix(base).ok());
        match relative {
            Some(rel) => rel.to_string_lossy(),
            None => Cow::Borrowed(path),
        }
    }

    /// Enabled config rules that pass `filter`, followed by one ad hoc rule
    /// per `--selector`.
    pub fn from_config(
        config: &ResolvedConfig,
        adhoc: &[String],
        filter: &RuleFilter,
    ) -> Result<Self, RuleError> {
        let mut rules = Vec::new();
        for (name, rule_config) in config.rules() {
            if !rule_config.enabled || !filter.allows(name) {
                continue;
            }
            rules.push(Rule::from_config(name, rule_config)?);
        }
        if filter.allows(ADHOC_RULE_NAME) {
            rules.extend(adhoc.iter().map(|pattern| Rule::adhoc(pattern)));
        }
        let set = Self::new(rules)?;
        Ok(match config.config_dir() {
            Some(dir) => set.with_base_dir(dir),
            None => set,
        })
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn generator(&self) -> &NodeEventGenerator {
        &self.generator
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Run every rule not excluded for `path` over `tree`.
    pub fn check(&self, path: &str, tree: &Tree) -> Vec<Diagnostic> {
        let exclude_path = self.exclude_path(path);
        let active: Vec<bool> = self
            .rules
            .iter()
            .map(|r| !r.is_excluded(&exclude_path))
            .collect();
        if !active.contains(&true) {
            return Vec::new();
        }

        let mut diagnostics = Vec::new();
        let mut deliver = |name: &str, node: NodeId| {
            let Some(subscribers) = self.listeners.get(name) else {
                return;
            };
            for &index in subscribers {
                if !active[index] {
                    continue;
                }
                let rule = &self.rules[index];
                diagnostics.push(Diagnostic {
                    path: path.to_string(),
                    location: Location::of_node(tree, node),
                    severity: rule.severity,
                    rule_name: rule.name.clone(),
                    message: rule.message.clone(),
                });
            }
        };
        self.generator.run(tree, &mut deliver);
        diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use crate::selector::SelectorErrorKind;
    use serde_json::json;

    fn tree() -> Tree {
        Tree::from_json(&json!({
            "type": "Program",
            "loc": { "start": { "line": 1, "column": 0 } },
            "body": [{
                "type": "VariableDeclaration",
                "kind": "var",
                "loc": { "start": { "line": 2, "column": 4 } },
                "declarations": []
            }]
        }))
        .unwrap()
    }

    fn rule(name: &str, selectors: &[&str]) -> Rule {
        Rule::new(
            name,
            selectors.iter().map(|s| s.to_string()).collect(),
            "msg",
            Severity::Warning,
        )
        .unwrap()
    }

    #[test]
    fn check_reports_matches_with_location() {
        let set = RuleSet::new(vec![rule("Style/NoVar", &["VariableDeclaration[kind=var]"])])
            .unwrap();
        let diagnostics = set.check("a.json", &tree());
        assert_eq!(diagnostics.len(), 1);
        let d = &diagnostics[0];
        assert_eq!(d.rule_name, "Style/NoVar");
        assert_eq!(d.location, Location { line: 2, column: 4 });
        assert_eq!(d.path, "a.json");
    }

    #[test]
    fn shared_patterns_reach_every_rule() {
        let set = RuleSet::new(vec![
            rule("A/One", &["Program"]),
            rule("B/Two", &["Program", "VariableDeclaration"]),
        ])
        .unwrap();
        assert_eq!(set.generator().len(), 2);
        let names: Vec<String> = set
            .check("a.json", &tree())
            .into_iter()
            .map(|d| d.rule_name)
            .collect();
        assert_eq!(names, vec!["A/One", "B/Two", "B/Two"]);
    }

    #[test]
    fn repeated_pattern_in_one_rule_reports_once() {
        let set = RuleSet::new(vec![rule("A/One", &["Program", "Program"])]).unwrap();
        assert_eq!(set.check("a.json", &tree()).len(), 1);
    }

    #[test]
    fn invalid_selector_names_the_rule() {
        let err = RuleSet::new(vec![rule("A/Good", &["Program"]), rule("B/Bad", &["[x"])])
            .unwrap_err();
        match err {
            RuleError::Selector { rule, source } => {
                assert_eq!(rule, "B/Bad");
                assert_eq!(source.pattern, "[x");
                assert_eq!(source.source.kind, SelectorErrorKind::UnexpectedEnd);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rule_without_selectors_is_rejected() {
        let err = Rule::new("A/Empty", Vec::new(), "m", Severity::Info).unwrap_err();
        assert!(matches!(err, RuleError::NoSelectors { .. }));
    }

    #[test]
    fn excludes_skip_matching_paths() {
        let excluded = rule("A/One", &["Program"])
            .with_excludes(&["legacy/**".to_string()])
            .unwrap();
        assert!(excluded.is_excluded("legacy/a.json"));
        assert!(excluded.is_excluded("./legacy/deep/b.json"));
        assert!(!excluded.is_excluded("src/a.json"));

        let set = RuleSet::new(vec![excluded, rule("B/Two", &["Program"])]).unwrap();
        let names: Vec<String> = set
            .check("legacy/a.json", &tree())
            .into_iter()
            .map(|d| d.rule_name)
            .collect();
        assert_eq!(names, vec!["B/Two"]);
    }

    #[test]
    fn excludes_are_relative_to_the_base_dir() {
        let excluded = rule("A/One", &["Program"])
            .with_excludes(&["legacy/**".to_string()])
            .unwrap();
        let set = RuleSet::new(vec![excluded]).unwrap().with_base_dir("/work/project");
        assert!(set.check("/work/project/legacy/a.json", &tree()).is_empty());
        assert_eq!(set.check("/work/project/src/a.json", &tree()).len(), 1);
        // Outside the base dir the path is matched as given.
        assert_eq!(set.check("/elsewhere/legacy/a.json", &tree()).len(), 1);
        assert!(set.check("legacy/a.json", &tree()).is_empty());
    }

    #[test]
    fn from_config_uses_the_config_directory() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join(".nodesel.yml");
        std::fs::write(
            &config_path,
            "Rules:\n  A/B:\n    Selector: Program\n    Exclude: ['legacy/**']\n",
        )
        .unwrap();
        let config = crate::config::load_config(Some(&config_path), None).unwrap();
        let set = RuleSet::from_config(&config, &[], &RuleFilter::default()).unwrap();

        let excluded = dir.path().join("legacy/old.json");
        assert!(set.check(&excluded.display().to_string(), &tree()).is_empty());
        let kept = dir.path().join("src/new.json");
        assert_eq!(set.check(&kept.display().to_string(), &tree()).len(), 1);
    }

    #[test]
    fn invalid_exclude_glob_is_an_error() {
        let err = rule("A/One", &["Program"])
            .with_excludes(&["a[".to_string()])
            .unwrap_err();
        assert!(matches!(err, RuleError::Exclude { .. }));
    }

    #[test]
    fn from_config_applies_enabled_and_filters() {
        let config = parse_config(
            "Rules:\n  A/On:\n    Selector: Program\n  B/Off:\n    Selector: Program\n    Enabled: false\n  C/Other:\n    Selector: Program\n",
        )
        .unwrap();
        let set = RuleSet::from_config(&config, &[], &RuleFilter::default()).unwrap();
        let names: Vec<&str> = set.rules().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["A/On", "C/Other"]);

        let only = RuleFilter {
            only: vec!["C/Other".to_string()],
            except: Vec::new(),
        };
        let set = RuleSet::from_config(&config, &[], &only).unwrap();
        assert_eq!(set.len(), 1);

        let except = RuleFilter {
            only: Vec::new(),
            except: vec!["A/On".to_string()],
        };
        let set = RuleSet::from_config(&config, &[], &except).unwrap();
        assert_eq!(set.rules()[0].name, "C/Other");
    }

    #[test]
    fn adhoc_selectors_become_rules() {
        let set = RuleSet::from_config(
            &ResolvedConfig::default(),
            &["Program".to_string()],
            &RuleFilter::default(),
        )
        .unwrap();
        let diagnostics = set.check("a.json", &tree());
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].rule_name, ADHOC_RULE_NAME);
        assert_eq!(diagnostics[0].message, "matches `Program`");
    }

    #[test]
    fn default_message_lists_selectors() {
        let config = parse_config("Rules:\n  A/B:\n    Selector: [X, Y]\n").unwrap();
        let rule = Rule::from_config("A/B", &config.rules()[0].1).unwrap();
        assert_eq!(rule.message, "matches `X`, `Y`");
        assert_eq!(rule.severity, Severity::Warning);
    }
}
