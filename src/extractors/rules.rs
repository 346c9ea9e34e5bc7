// src/extractors/rules.rs

// --- Imports ---
use regex::Regex;

// --- Field Values ---

/// Column type produced by a rule. Fixed per rule, independent of the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Text,
    Flag,
}

/// One extracted value. `None` is the explicit absent marker.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Integer(Option<i64>),
    Text(Option<String>),
    Flag(Option<bool>),
}

impl FieldValue {
    pub fn is_absent(&self) -> bool {
        match self {
            FieldValue::Integer(v) => v.is_none(),
            FieldValue::Text(v) => v.is_none(),
            FieldValue::Flag(v) => v.is_none(),
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(v) => *v,
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(v) => v.as_deref(),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            FieldValue::Flag(v) => *v,
            _ => None,
        }
    }
}

/// A named output column value for a single listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: &'static str,
    pub value: FieldValue,
}

impl Field {
    pub fn new(name: &'static str, value: FieldValue) -> Self {
        Self { name, value }
    }
}

/// Looks up a field by column name.
pub fn find_field<'a>(fields: &'a [Field], name: &str) -> Option<&'a FieldValue> {
    fields.iter().find(|f| f.name == name).map(|f| &f.value)
}

// --- Rules ---

/// How a pattern match becomes a value.
#[derive(Debug)]
pub enum Transform {
    /// First capture group parsed as an integer.
    Integer,
    /// First capture group, trimmed.
    Text,
    /// True when the pattern is found anywhere, false otherwise.
    Presence,
    /// As `Presence`, but a match of the inner pattern forces false.
    PresenceUnless(Regex),
    /// True on a match, false if only the inner pattern matches, absent if neither.
    TriState(Regex),
}

/// A single `(field, pattern, transform)` extraction rule.
#[derive(Debug)]
pub struct Rule {
    pub field: &'static str,
    pub pattern: Regex,
    pub transform: Transform,
}

impl Rule {
    /// Builds a rule from a literal pattern. Only used for the static rule tables.
    pub fn new(field: &'static str, pattern: &str, transform: Transform) -> Self {
        let pattern = Regex::new(pattern)
            .unwrap_or_else(|e| panic!("Failed to compile rule '{}': {}", field, e));
        Self { field, pattern, transform }
    }

    pub fn kind(&self) -> ColumnKind {
        match self.transform {
            Transform::Integer => ColumnKind::Integer,
            Transform::Text => ColumnKind::Text,
            Transform::Presence | Transform::PresenceUnless(_) | Transform::TriState(_) => ColumnKind::Flag,
        }
    }

    /// Evaluates the rule against already-normalised text.
    /// Search semantics: the first match anywhere in `text` wins.
    pub fn apply(&self, text: &str) -> FieldValue {
        match &self.transform {
            Transform::Integer => FieldValue::Integer(
                self.first_group(text).and_then(|g| g.parse::<i64>().ok()),
            ),
            Transform::Text => FieldValue::Text(
                self.first_group(text).map(|g| g.trim().to_string()),
            ),
            Transform::Presence => FieldValue::Flag(Some(self.pattern.is_match(text))),
            Transform::PresenceUnless(negation) => FieldValue::Flag(Some(
                !negation.is_match(text) && self.pattern.is_match(text),
            )),
            Transform::TriState(negative) => FieldValue::Flag(if self.pattern.is_match(text) {
                Some(true)
            } else if negative.is_match(text) {
                Some(false)
            } else {
                None
            }),
        }
    }

    fn first_group<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.pattern
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }
}

/// Joins scraped fragments into the single lowercase blob every rule searches.
pub fn normalize_fragments(fragments: &[String]) -> String {
    fragments.join(" ").to_lowercase()
}

/// Runs every rule independently over the fragments, in table order.
pub fn apply_rules(rules: &[Rule], fragments: &[String]) -> Vec<Field> {
    let text = normalize_fragments(fragments);
    rules
        .iter()
        .map(|rule| {
            let value = rule.apply(&text);
            tracing::trace!("Rule '{}' -> {:?}", rule.field, value);
            Field::new(rule.field, value)
        })
        .collect()
}
