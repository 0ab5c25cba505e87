//! Ordered pattern-based rewriting of post bodies.
//!
//! A [`RuleSet`] is an ordered list of compiled regular expressions with
//! replacement templates. Applying a set runs every rule over the whole text
//! in list order, each rule seeing the output of the previous one.
//!
//! The engine uses three sets, bundled in a [`ContentPipeline`]:
//!
//! - **comment**: strips editor comment markup (`<!-- wp:... -->`)
//! - **spacer**: strips spacer blocks and padding markup
//! - **media**: rewrites upload URLs to their new location
//!
//! Post bodies go through all three in that order. Attachment GUIDs only go
//! through the media set.

mod source;

pub use source::{RuleSource, RulesConfig};

use std::borrow::Cow;
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{MigrateError, Result};

/// Uncompiled rule as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSpec {
    /// Regular expression (`regex` crate syntax).
    pub pattern: String,

    /// Replacement template. `$1` and `${name}` expand to captured groups.
    #[serde(default)]
    pub replacement: String,
}

impl RuleSpec {
    pub fn new(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            replacement: replacement.into(),
        }
    }
}

/// A compiled substitution rule.
#[derive(Debug, Clone)]
pub struct Rule {
    regex: Regex,
    replacement: String,
}

impl Rule {
    /// Replace every non-overlapping match in `text`.
    ///
    /// Returns `Cow::Borrowed` when nothing matched.
    pub fn apply<'t>(&self, text: &'t str) -> Cow<'t, str> {
        self.regex.replace_all(text, self.replacement.as_str())
    }
}

/// Named, ordered list of compiled rules.
#[derive(Debug, Clone)]
pub struct RuleSet {
    name: String,
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Compile a rule set. Fails on the first invalid pattern.
    pub fn compile(name: impl Into<String>, specs: &[RuleSpec]) -> Result<Self> {
        let name = name.into();
        let rules = specs
            .iter()
            .enumerate()
            .map(|(index, spec)| {
                Regex::new(&spec.pattern)
                    .map(|regex| Rule {
                        regex,
                        replacement: spec.replacement.clone(),
                    })
                    .map_err(|e| MigrateError::rule(name.as_str(), index, spec.pattern.as_str(), e))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { name, rules })
    }

    /// A set that leaves text untouched.
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rules: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Apply all rules in order and return the rewritten text.
    pub fn apply(&self, text: &str) -> String {
        let mut out = text.to_string();
        self.apply_in_place(&mut out);
        out
    }

    /// Apply all rules in order, replacing `text` with the result.
    pub fn apply_in_place(&self, text: &mut String) {
        for rule in &self.rules {
            let replaced = match rule.apply(text) {
                Cow::Borrowed(_) => continue,
                Cow::Owned(s) => s,
            };
            *text = replaced;
        }
    }
}

/// The three rule sets used for content migration, in application order.
#[derive(Debug, Clone)]
pub struct ContentPipeline {
    comment: RuleSet,
    spacer: RuleSet,
    media: RuleSet,
}

impl ContentPipeline {
    pub fn new(comment: RuleSet, spacer: RuleSet, media: RuleSet) -> Self {
        Self {
            comment,
            spacer,
            media,
        }
    }

    /// Load and compile the rule sets named in configuration.
    ///
    /// Relative rule file paths resolve against `base_dir`.
    pub fn from_config(rules: &RulesConfig, base_dir: &Path) -> Result<Self> {
        let comment = RuleSet::compile("comment", &rules.comment.load(base_dir)?)?;
        let spacer = RuleSet::compile("spacer", &rules.spacer.load(base_dir)?)?;
        let media = RuleSet::compile("media", &rules.media.load(base_dir)?)?;

        tracing::info!(
            "Loaded content rules: comment={}, spacer={}, media={}",
            comment.len(),
            spacer.len(),
            media.len()
        );

        Ok(Self::new(comment, spacer, media))
    }

    /// Rewrite a post body: comment, then spacer, then media rules.
    ///
    /// Spacer and media markup can sit inside comment markup, so the comment
    /// pass must run first.
    pub fn rewrite_body(&self, body: &str) -> String {
        let mut out = body.to_string();
        self.comment.apply_in_place(&mut out);
        self.spacer.apply_in_place(&mut out);
        self.media.apply_in_place(&mut out);
        out
    }

    /// Rewrite an attachment URL with the media rules only.
    pub fn rewrite_media_url(&self, url: &str) -> String {
        self.media.apply(url)
    }
}
