use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

pub trait NameNormalizer: fmt::Debug {
    fn normalize(&self, name: &str) -> String;
}

/// Keys by the source spelling, trimmed.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactNames;

impl NameNormalizer for ExactNames {
    fn normalize(&self, name: &str) -> String {
        name.trim().to_string()
    }
}

/// Case-folded, diacritic-free, whitespace-collapsed names with an alias table.
#[derive(Debug, Clone, Default)]
pub struct CanonicalNames {
    aliases: HashMap<String, String>,
}

/// Pairs of (alias, canonical) seen between variant feeds and country tables.
const BUILTIN_ALIASES: &[(&str, &str)] = &[
    ("USA", "United States"),
    ("United States of America", "United States"),
    ("UK", "United Kingdom"),
    ("Czech Republic", "Czechia"),
    ("Russian Federation", "Russia"),
    ("South Korea", "Korea, South"),
    ("Republic of Korea", "Korea, South"),
    ("Democratic Republic of the Congo", "Congo, Democratic Republic of the"),
    ("DRC", "Congo, Democratic Republic of the"),
    ("Republic of the Congo", "Congo, Republic of the"),
    ("Ivory Coast", "Cote d'Ivoire"),
    ("Turkiye", "Turkey"),
    ("Viet Nam", "Vietnam"),
    ("Eswatini", "Swaziland"),
    ("Myanmar", "Burma"),
    ("North Macedonia", "Macedonia"),
    ("Cabo Verde", "Cape Verde"),
    ("Timor-Leste", "East Timor"),
    ("Sint Maarten", "Sint Maarten (Dutch part)"),
    ("Bahamas", "The Bahamas"),
    ("Gambia", "The Gambia"),
];

impl CanonicalNames {
    pub fn new() -> Self {
        CanonicalNames::default()
    }

    pub fn with_builtin_aliases() -> Self {
        BUILTIN_ALIASES
            .iter()
            .fold(CanonicalNames::new(), |names, (alias, canonical)| {
                names.with_alias(alias, canonical)
            })
    }

    /// Both sides are stored folded, so aliases may be written in any case.
    pub fn with_alias(mut self, alias: &str, canonical: &str) -> Self {
        self.aliases.insert(fold(alias), fold(canonical));
        self
    }
}

impl NameNormalizer for CanonicalNames {
    fn normalize(&self, name: &str) -> String {
        let folded = fold(name);
        match self.aliases.get(&folded) {
            Some(canonical) => canonical.clone(),
            None => folded,
        }
    }
}

fn fold(name: &str) -> String {
    let stripped: String = name
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    #[default]
    Exact,
    Canonical,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NameMatching {
    pub policy: MatchPolicy,
    /// Extra alias → canonical pairs, applied on top of the built-in set.
    pub aliases: HashMap<String, String>,
}

impl NameMatching {
    pub fn normalizer(&self) -> Arc<dyn NameNormalizer + Send + Sync> {
        match self.policy {
            MatchPolicy::Exact => Arc::new(ExactNames),
            MatchPolicy::Canonical => Arc::new(
                self.aliases
                    .iter()
                    .fold(CanonicalNames::with_builtin_aliases(), |names, (a, c)| {
                        names.with_alias(a, c)
                    }),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_only_trims() {
        assert_eq!(ExactNames.normalize("  Peru "), "Peru");
        assert_ne!(ExactNames.normalize("peru"), ExactNames.normalize("Peru"));
    }

    #[test]
    fn canonical_folds_case_whitespace_and_diacritics() {
        let names = CanonicalNames::new();
        assert_eq!(names.normalize("Côte  d'Ivoire"), "cote d'ivoire");
        assert_eq!(names.normalize("CURAÇAO"), "curacao");
        assert_eq!(names.normalize("Réunion"), names.normalize("reunion"));
    }

    #[test]
    fn aliases_resolve_to_the_canonical_key() {
        let names = CanonicalNames::with_builtin_aliases();
        assert_eq!(names.normalize("USA"), names.normalize("United States"));
        assert_eq!(names.normalize("Czech Republic"), names.normalize("czechia"));
        assert_eq!(names.normalize("Ivory Coast"), names.normalize("Côte d'Ivoire"));
    }

    #[test]
    fn configured_aliases_extend_builtins() {
        let matching = NameMatching {
            policy: MatchPolicy::Canonical,
            aliases: HashMap::from([("Holland".to_string(), "Netherlands".to_string())]),
        };
        let names = matching.normalizer();
        assert_eq!(names.normalize("holland"), names.normalize("Netherlands"));
        assert_eq!(names.normalize("UK"), names.normalize("United Kingdom"));
    }
}
