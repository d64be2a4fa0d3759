//! Naming & Pluralization Engine
//!
//! Derives the container identifier (`SwapStatus` -> `SwapStatuses`) and the
//! Go identifiers used for tag accessors.

use serde::Serialize;

/// Irregular singular -> plural mappings, sorted by singular for binary search.
static IRREGULARS: &[(&str, &str)] = &[
    ("alumnus", "alumni"),
    ("analysis", "analyses"),
    ("appendix", "appendices"),
    ("axis", "axes"),
    ("basis", "bases"),
    ("cactus", "cacti"),
    ("child", "children"),
    ("crisis", "crises"),
    ("criterion", "criteria"),
    ("datum", "data"),
    ("die", "dice"),
    ("focus", "foci"),
    ("foot", "feet"),
    ("fungus", "fungi"),
    ("goose", "geese"),
    ("index", "indices"),
    ("louse", "lice"),
    ("man", "men"),
    ("matrix", "matrices"),
    ("medium", "media"),
    ("mouse", "mice"),
    ("nucleus", "nuclei"),
    ("oasis", "oases"),
    ("ox", "oxen"),
    ("person", "people"),
    ("phenomenon", "phenomena"),
    ("quiz", "quizzes"),
    ("radius", "radii"),
    ("status", "statuses"),
    ("stimulus", "stimuli"),
    ("thesis", "theses"),
    ("tooth", "teeth"),
    ("vertex", "vertices"),
    ("woman", "women"),
];

/// Words that are the same in singular and plural form.
static UNCOUNTABLE: &[&str] = &[
    "aircraft",
    "deer",
    "equipment",
    "fish",
    "information",
    "news",
    "series",
    "sheep",
    "species",
];

/// Trailing words the `strip` strategy removes before pluralizing
const STRIPPED_SUFFIXES: &[&str] = &["Status", "Type", "Kind", "Enum"];

/// How the container name is derived from the type name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum NamingStrategy {
    /// Pluralize the last word: `SwapStatus` -> `SwapStatuses`
    #[default]
    Preserve,
    /// Drop a trailing `Status`/`Type`/`Kind`/`Enum` word first: `SwapStatus` -> `Swaps`
    Strip,
}

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
}

/// `true` when `stem` ends in a consonant
fn ends_in_consonant(stem: &str) -> bool {
    stem.chars().last().map_or(false, |c| !is_vowel(c))
}

/// Convert an English word to its plural form, lowercased.
///
/// # Examples
///
/// ```text
/// pluralize("status") == "statuses"
/// pluralize("city")   == "cities"
/// pluralize("leaf")   == "leaves"
/// ```
pub fn pluralize(word: &str) -> String {
    let word = word.to_lowercase();
    if word.is_empty() {
        return word;
    }

    if let Ok(idx) = IRREGULARS.binary_search_by_key(&word.as_str(), |&(singular, _)| singular) {
        return IRREGULARS[idx].1.to_string();
    }
    if UNCOUNTABLE.binary_search(&word.as_str()).is_ok() {
        return word;
    }

    // Sibilants
    if ["s", "sh", "ch", "x", "z"].iter().any(|suffix| word.ends_with(suffix)) {
        return format!("{}es", word);
    }

    if let Some(stem) = word.strip_suffix('y') {
        if ends_in_consonant(stem) {
            return format!("{}ies", stem);
        }
    }

    if let Some(stem) = word.strip_suffix('f') {
        return format!("{}ves", stem);
    }
    if let Some(stem) = word.strip_suffix("fe") {
        return format!("{}ves", stem);
    }

    if let Some(stem) = word.strip_suffix('o') {
        if ends_in_consonant(stem) {
            return format!("{}oes", stem);
        }
    }

    format!("{}s", word)
}

/// Upper-case the first character
pub fn first_upper(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Split a camel-cased identifier before its last interior ASCII capital.
///
/// Returns `None` when there is no interior capital.
fn split_last_word(name: &str) -> Option<(&str, &str)> {
    let (idx, _) = name
        .char_indices()
        .skip(1)
        .filter(|(_, c)| c.is_ascii_uppercase())
        .last()?;
    Some(name.split_at(idx))
}

/// Derive the container identifier for an enum type name.
///
/// Never returns the wrapper name itself: a type whose last word is
/// uncountable gets a `Values` suffix instead (`Sheep` -> `SheepValues`).
pub fn container_name(type_name: &str, strategy: NamingStrategy) -> String {
    let plural = match split_last_word(type_name) {
        Some((prefix, last)) => {
            if strategy == NamingStrategy::Strip && STRIPPED_SUFFIXES.contains(&last) {
                return container_name(prefix, NamingStrategy::Preserve);
            }
            first_upper(&format!("{}{}", prefix, first_upper(&pluralize(last))))
        }
        None => first_upper(&pluralize(type_name)),
    };

    if plural == first_upper(type_name) {
        format!("{}Values", plural)
    } else {
        plural
    }
}

/// Turn a free-form tag into an exported Go identifier.
///
/// Words separated by anything other than letters and digits are joined in
/// camel case: `needs-review` becomes `NeedsReview`.
pub fn to_identifier(tag: &str) -> String {
    let ident: String = tag
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(first_upper)
        .collect();

    match ident.chars().next() {
        Some(c) if c.is_alphabetic() => ident,
        _ => format!("Tag{}", ident),
    }
}
