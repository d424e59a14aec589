//! Dynamic finder names.
//!
//! A finder name encodes a query: `find_all_by_name_and_age` selects every
//! child whose `name` and `age` equal the call's first two arguments.
//! Recognized shapes:
//!
//! | Name                               | Cardinality | On miss             |
//! |------------------------------------|-------------|---------------------|
//! | `find_by_<attrs>`                  | first       | absent              |
//! | `find_first_by_<attrs>`            | first       | absent              |
//! | `find_last_by_<attrs>`             | last        | absent              |
//! | `find_all_by_<attrs>`              | all         | empty               |
//! | `find_[first_|last_]by_<attrs>!`   | first/last  | `DocumentNotFound`  |
//! | `find_or_initialize_by_<attrs>`    | first       | build               |
//! | `find_or_create_by_<attrs>`        | first       | create              |
//!
//! `<attrs>` is one or more attribute names joined by `_and_`.

use once_cell::sync::Lazy;
use regex::Regex;
use tether_core::Finder;

static FIND_BY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^find_(all_by|first_by|last_by|by)_([_a-zA-Z]\w*)$").expect("Invalid finder regex")
});

static FIND_BY_BANG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^find_(first_by|last_by|by)_([_a-zA-Z]\w*)!$").expect("Invalid bang finder regex")
});

static FIND_OR_INSTANTIATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^find_or_(initialize|create)_by_([_a-zA-Z]\w*)$")
        .expect("Invalid instantiating finder regex")
});

/// Separator between attribute names in a finder name.
pub const CONJUNCTION: &str = "_and_";

/// What a finder does when nothing matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instantiator {
    /// Build an unsaved child from the searched attributes.
    Initialize,
    /// Create (build and save) a child from the searched attributes.
    Create,
}

/// Parsed form of a dynamic finder name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicFinder {
    pub method: String,
    /// `First`, `Last` or `All`.
    pub finder: Finder,
    /// Attribute names in the order their values are passed.
    pub attributes: Vec<String>,
    /// Raise `DocumentNotFound` on a miss.
    pub bang: bool,
    pub instantiator: Option<Instantiator>,
}

impl DynamicFinder {
    /// Parse a method name. Returns `None` when the name is not a finder.
    pub fn parse(method: &str) -> Option<Self> {
        let (finder, names, bang, instantiator) =
            if let Some(caps) = FIND_BY.captures(method) {
                (cardinality(&caps[1]), caps[2].to_string(), false, None)
            } else if let Some(caps) = FIND_BY_BANG.captures(method) {
                (cardinality(&caps[1]), caps[2].to_string(), true, None)
            } else if let Some(caps) = FIND_OR_INSTANTIATE.captures(method) {
                let instantiator = match &caps[1] {
                    "initialize" => Instantiator::Initialize,
                    _ => Instantiator::Create,
                };
                (Finder::First, caps[2].to_string(), false, Some(instantiator))
            } else {
                return None;
            };

        let attributes: Vec<String> = names.split(CONJUNCTION).map(str::to_string).collect();
        if attributes.iter().any(String::is_empty) {
            return None;
        }

        Some(Self {
            method: method.to_string(),
            finder,
            attributes,
            bang,
            instantiator,
        })
    }
}

fn cardinality(prefix: &str) -> Finder {
    match prefix {
        "all_by" => Finder::All,
        "last_by" => Finder::Last,
        _ => Finder::First,
    }
}
