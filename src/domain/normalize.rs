//! Canonical option lists for the selectors.
//!
//! Reference cells frequently hold several values ("France, Germany", "Europe and
//! Middle East"). They are split into single tokens, deduplicated and sorted. Known
//! multi-word names are shielded with a placeholder before splitting and put back
//! afterwards.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::domain::entities::filters::ANY_OPTION;

pub const CENTRAL_SOUTH_AMERICA: &str = "Central & South America";

/// Canonical regions in display order.
pub const REGION_VOCABULARY: [&str; 8] = [
    "Africa",
    "Asia Pacific",
    CENTRAL_SOUTH_AMERICA,
    "Eurasia",
    "Europe",
    "Global",
    "Middle East",
    "North America",
];

const CENTRAL_SOUTH_AMERICA_SYNONYMS: [&str; 6] = [
    "central & south america",
    "central and south america",
    "central/south america",
    "central south america",
    "south america",
    "central america",
];

const PROTECTED_COUNTRIES: [&str; 12] = [
    "Antigua and Barbuda",
    "Bosnia and Herzegovina",
    "Heard Island and McDonald Islands",
    "Saint Kitts and Nevis",
    "Saint Pierre and Miquelon",
    "Saint Vincent and the Grenadines",
    "Sao Tome and Principe",
    "South Georgia and the South Sandwich Islands",
    "Trinidad and Tobago",
    "Turks and Caicos Islands",
    "Wallis and Futuna",
    "Svalbard and Jan Mayen",
];

const PLACEHOLDER_MARK: char = '\u{1}';

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x01(\d+)\x01").expect("placeholder pattern"));

static DELIMITERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)[,/|;]|\s+and\s+").expect("delimiter pattern"));

static DELIMITERS_WITH_AMPERSAND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)[,/|;]|\s+and\s+|\s*&\s*").expect("delimiter pattern"));

static COUNTRY_RULES: LazyLock<SplitRules> = LazyLock::new(|| SplitRules {
    split_ampersand: false,
    protected: PROTECTED_COUNTRIES
        .iter()
        .map(|name| ProtectedPhrase::keep_literal(&phrase_pattern(name)))
        .collect(),
});

static REGION_RULES: LazyLock<SplitRules> = LazyLock::new(|| SplitRules {
    split_ampersand: true,
    protected: vec![ProtectedPhrase::replace_with(
        r"central\s*&\s*south\s*america|central\s+and\s+south\s+america|central\s*/\s*south\s*america|central\s+south\s+america",
        CENTRAL_SOUTH_AMERICA,
    )],
});

static PLAIN_RULES: LazyLock<SplitRules> = LazyLock::new(SplitRules::default);

pub struct ProtectedPhrase {
    pattern: Regex,
    replacement: Option<&'static str>,
}

impl ProtectedPhrase {
    /// Restores whatever text matched.
    pub fn keep_literal(pattern: &str) -> Self {
        Self {
            pattern: case_insensitive(pattern),
            replacement: None,
        }
    }

    /// Restores a fixed spelling for every variant the pattern matches.
    pub fn replace_with(pattern: &str, replacement: &'static str) -> Self {
        Self {
            pattern: case_insensitive(pattern),
            replacement: Some(replacement),
        }
    }
}

fn case_insensitive(pattern: &str) -> Regex {
    Regex::new(&format!("(?i){pattern}")).expect("protected phrase pattern")
}

/// "Trinidad and Tobago" matches any whitespace run and either "and" or "&".
fn phrase_pattern(phrase: &str) -> String {
    phrase
        .split_whitespace()
        .map(|word| {
            if word.eq_ignore_ascii_case("and") {
                "(?:and|&)".to_string()
            } else {
                regex::escape(word)
            }
        })
        .collect::<Vec<_>>()
        .join(r"\s+")
}

#[derive(Default)]
pub struct SplitRules {
    pub split_ampersand: bool,
    pub protected: Vec<ProtectedPhrase>,
}

impl SplitRules {
    pub fn tokens(&self, raw: &str) -> Vec<String> {
        let mut saved = Vec::<String>::new();
        let mut text = raw.to_string();
        for phrase in &self.protected {
            text = phrase
                .pattern
                .replace_all(&text, |caps: &Captures| {
                    let literal = phrase
                        .replacement
                        .map(str::to_string)
                        .unwrap_or_else(|| caps[0].to_string());
                    saved.push(literal);
                    format!("{PLACEHOLDER_MARK}{}{PLACEHOLDER_MARK}", saved.len() - 1)
                })
                .into_owned();
        }

        let delimiters = if self.split_ampersand {
            &*DELIMITERS_WITH_AMPERSAND
        } else {
            &*DELIMITERS
        };

        delimiters
            .split(&text)
            .map(|token| {
                PLACEHOLDER
                    .replace_all(token, |caps: &Captures| {
                        caps[1]
                            .parse::<usize>()
                            .ok()
                            .and_then(|idx| saved.get(idx))
                            .cloned()
                            .unwrap_or_default()
                    })
                    .trim()
                    .to_string()
            })
            .filter(|token| !token.is_empty())
            .collect()
    }

    /// Split, trim, drop blanks, dedupe and sort.
    pub fn normalize<I, S>(&self, raw_values: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        raw_values
            .into_iter()
            .flat_map(|raw| self.tokens(raw.as_ref()))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Generic list normalization: comma, slash, pipe, semicolon and " and ".
#[allow(dead_code)]
pub fn normalize<I, S>(raw_values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    PLAIN_RULES.normalize(raw_values)
}

pub fn normalize_countries<I, S>(raw_values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    COUNTRY_RULES.normalize(raw_values)
}

/// Provider names are never split; they may legitimately contain commas.
pub fn normalize_providers<I, S>(raw_values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    raw_values
        .into_iter()
        .map(|raw| raw.as_ref().trim().to_string())
        .filter(|name| !name.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn fold_region(token: &str) -> Option<&'static str> {
    let lowered = token.trim().to_lowercase();
    if lowered.is_empty() {
        return None;
    }
    if CENTRAL_SOUTH_AMERICA_SYNONYMS.contains(&lowered.as_str()) {
        return Some(CENTRAL_SOUTH_AMERICA);
    }
    REGION_VOCABULARY
        .iter()
        .find(|region| region.to_lowercase() == lowered)
        .copied()
}

/// Region options: the sentinel, then recognised regions in vocabulary order.
/// Unrecognised tokens are dropped.
pub fn normalize_regions<I, S>(raw_values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let positions = raw_values
        .into_iter()
        .flat_map(|raw| REGION_RULES.tokens(raw.as_ref()))
        .filter_map(|token| fold_region(&token))
        .filter_map(|region| REGION_VOCABULARY.iter().position(|known| *known == region))
        .collect::<BTreeSet<_>>();

    std::iter::once(ANY_OPTION.to_string())
        .chain(positions.into_iter().map(|idx| REGION_VOCABULARY[idx].to_string()))
        .collect()
}
