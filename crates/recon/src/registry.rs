//! The seam between the driver and the public registers.
//!
//! A [`Registry`] turns one identifier into a [`LookupResult`]. Network
//! adapters live in the CLI crate; the driver only sees this trait.

use std::collections::BTreeMap;

use serde::Serialize;

// ── Logical columns ─────────────────────────────────────────────────

pub const LICENSE: &str = "license";
pub const REGISTRATION: &str = "registration";
pub const FIRST_NAME: &str = "first_name";
pub const SURNAME: &str = "surname";
pub const COMPANY: &str = "company";

// ── Lookup results ──────────────────────────────────────────────────

/// What a register reported for a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    /// Raw status text as the register shows it.
    pub status: String,
    /// Extra detail (holder name, licence class, registration types).
    pub fields: BTreeMap<String, String>,
}

impl Finding {
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, key: &str, value: impl Into<String>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum LookupResult {
    Found(Finding),
    NotFound,
    /// Matched, but the licence has lapsed.
    Expired(Finding),
    /// Transport failure or a response that could not be understood.
    QueryError { message: String },
}

impl LookupResult {
    pub fn query_error(message: impl Into<String>) -> Self {
        LookupResult::QueryError {
            message: message.into(),
        }
    }
}

// ── Identifiers ─────────────────────────────────────────────────────

/// Which row columns make up the lookup key, and how to name it in
/// status messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierSpec {
    /// A single logical column (`license`, `registration`).
    Column {
        column: &'static str,
        label: &'static str,
    },
    /// `first_name` + `surname`, falling back to `company`.
    NameOrCompany { label: &'static str },
}

impl IdentifierSpec {
    pub fn label(&self) -> &'static str {
        match self {
            IdentifierSpec::Column { label, .. } | IdentifierSpec::NameOrCompany { label } => {
                label
            }
        }
    }
}

/// A normalized lookup key extracted from a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identifier {
    Single(String),
    NameOrCompany { name: String, company: String },
}

impl Identifier {
    pub fn is_blank(&self) -> bool {
        match self {
            Identifier::Single(value) => value.is_empty(),
            Identifier::NameOrCompany { name, company } => name.is_empty() && company.is_empty(),
        }
    }

    /// Text used in log lines.
    pub fn display(&self) -> &str {
        match self {
            Identifier::Single(value) => value,
            Identifier::NameOrCompany { name, company } if name.is_empty() => company,
            Identifier::NameOrCompany { name, .. } => name,
        }
    }
}

// ── Registry trait ──────────────────────────────────────────────────

pub trait Registry {
    /// Stable name used on the command line and in config (`qbcc-individual`).
    fn name(&self) -> &str;

    /// Lowercase words that must all appear in a sheet name for this
    /// registry to own the sheet.
    fn keywords(&self) -> &[&'static str];

    fn identifier(&self) -> IdentifierSpec;

    /// First header cell of the header row when the sheet has a preamble.
    fn header_sentinel(&self) -> Option<&str> {
        None
    }

    /// Query the register with one normalized key.
    fn lookup(&self, key: &str) -> LookupResult;

    /// Resolve a row identifier. Single keys go straight to `lookup`.
    /// Name-or-company keys try the name first and fall back to the
    /// company only when the name was not found.
    fn resolve(&self, identifier: &Identifier) -> LookupResult {
        match identifier {
            Identifier::Single(key) => self.lookup(key),
            Identifier::NameOrCompany { name, company } => {
                if name.is_empty() {
                    return self.lookup(company);
                }
                match self.lookup(name) {
                    LookupResult::NotFound if !company.is_empty() => self.lookup(company),
                    other => other,
                }
            }
        }
    }
}

// ── Normalization ───────────────────────────────────────────────────

/// Trim, drop control characters and collapse internal whitespace.
pub fn normalize_identifier(raw: &str) -> String {
    raw.split(|c: char| c.is_whitespace() || c.is_control())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Title-case a status string word by word: `"  NOT current "` ->
/// `"Not Current"`.
pub fn title_case(raw: &str) -> String {
    raw.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
