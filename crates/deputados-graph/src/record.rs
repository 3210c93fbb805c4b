//! Validated legislator records.
//!
//! Rows arrive loosely typed (CSV cells, JSON values). They are turned into
//! [`LegislatorRecord`] once, at the table boundary; anything past that point
//! can rely on every key field being present and well-formed.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Column names as published by the open-data API (and kept in the CSV).
pub mod columns {
    pub const ID: &str = "id";
    pub const URI: &str = "uri";
    pub const NOME: &str = "nome";
    pub const SIGLA_PARTIDO: &str = "siglaPartido";
    pub const URI_PARTIDO: &str = "uriPartido";
    pub const SIGLA_UF: &str = "siglaUf";
    pub const ID_LEGISLATURA: &str = "idLegislatura";
    pub const URL_FOTO: &str = "urlFoto";
    pub const EMAIL: &str = "email";

    /// Columns a row must carry to become a record, in API order.
    pub const REQUIRED: [&str; 8] = [
        ID,
        URI,
        NOME,
        SIGLA_PARTIDO,
        URI_PARTIDO,
        SIGLA_UF,
        ID_LEGISLATURA,
        URL_FOTO,
    ];
}

/// One legislator–term association.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegislatorRecord {
    pub id: u64,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "siglaPartido")]
    pub party_acronym: String,
    #[serde(rename = "uriPartido")]
    pub party_uri: String,
    #[serde(rename = "siglaUf")]
    pub region_code: String,
    #[serde(rename = "idLegislatura")]
    pub legislature: u32,
    #[serde(rename = "uri")]
    pub profile_uri: String,
    #[serde(rename = "urlFoto")]
    pub photo_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MalformedReason {
    MissingFields(Vec<&'static str>),
    NotAnInteger {
        column: &'static str,
        value: String,
    },
    InvalidIri {
        column: &'static str,
        value: String,
    },
    ConflictingAttribute {
        key: String,
        predicate: String,
        existing: String,
        incoming: String,
    },
}

impl fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingFields(cols) => write!(f, "missing {}", cols.join(", ")),
            Self::NotAnInteger { column, value } => {
                write!(f, "{column} is not an integer: `{value}`")
            }
            Self::InvalidIri { column, value } => write!(f, "{column} is not an IRI: `{value}`"),
            Self::ConflictingAttribute {
                key,
                predicate,
                existing,
                incoming,
            } => write!(
                f,
                "conflicting {predicate} for <{key}>: `{existing}` already emitted, got `{incoming}`"
            ),
        }
    }
}

/// A row that could not become a record. `row` is 1-based over data rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedRecord {
    pub row: usize,
    pub id: Option<String>,
    pub reason: MalformedReason,
}

impl fmt::Display for MalformedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "row {} (id={id}): {}", self.row, self.reason),
            None => write!(f, "row {}: {}", self.row, self.reason),
        }
    }
}

impl std::error::Error for MalformedRecord {}

impl LegislatorRecord {
    /// Validate one loosely typed row.
    ///
    /// `field` returns the raw cell for a column; blank cells count as missing.
    pub fn from_fields<'a, F>(row: usize, field: F) -> Result<Self, MalformedRecord>
    where
        F: Fn(&str) -> Option<&'a str>,
    {
        let get = |col: &str| field(col).map(str::trim).filter(|v| !v.is_empty());
        let raw_id = get(columns::ID).map(str::to_string);
        let malformed = |reason| MalformedRecord {
            row,
            id: raw_id.clone(),
            reason,
        };

        let missing: Vec<&'static str> = columns::REQUIRED
            .into_iter()
            .filter(|col| get(*col).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(malformed(MalformedReason::MissingFields(missing)));
        }

        // Presence was checked above.
        let cell = |col: &str| get(col).unwrap_or_default().to_string();

        let id = parse_integer(&cell(columns::ID)).ok_or_else(|| {
            malformed(MalformedReason::NotAnInteger {
                column: columns::ID,
                value: cell(columns::ID),
            })
        })?;
        let legislature = parse_integer(&cell(columns::ID_LEGISLATURA))
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| {
                malformed(MalformedReason::NotAnInteger {
                    column: columns::ID_LEGISLATURA,
                    value: cell(columns::ID_LEGISLATURA),
                })
            })?;

        for col in [columns::URI_PARTIDO, columns::URI, columns::URL_FOTO] {
            let value = cell(col);
            if !is_plausible_iri(&value) {
                return Err(malformed(MalformedReason::InvalidIri { column: col, value }));
            }
        }

        Ok(Self {
            id,
            name: cell(columns::NOME),
            party_acronym: cell(columns::SIGLA_PARTIDO),
            party_uri: cell(columns::URI_PARTIDO),
            region_code: cell(columns::SIGLA_UF),
            legislature,
            profile_uri: cell(columns::URI),
            photo_url: cell(columns::URL_FOTO),
            email: get(columns::EMAIL).map(str::to_string),
        })
    }

    /// Raw cell values in [`columns::REQUIRED`] order followed by `email`.
    pub fn to_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            (columns::ID, self.id.to_string()),
            (columns::URI, self.profile_uri.clone()),
            (columns::NOME, self.name.clone()),
            (columns::SIGLA_PARTIDO, self.party_acronym.clone()),
            (columns::URI_PARTIDO, self.party_uri.clone()),
            (columns::SIGLA_UF, self.region_code.clone()),
            (columns::ID_LEGISLATURA, self.legislature.to_string()),
            (columns::URL_FOTO, self.photo_url.clone()),
            (columns::EMAIL, self.email.clone().unwrap_or_default()),
        ]
    }
}

/// Integers as written by the API or by a float-typed CSV export (`57.0`).
fn parse_integer(s: &str) -> Option<u64> {
    let s = s.trim();
    let s = s.strip_suffix(".0").unwrap_or(s);
    s.parse().ok()
}

/// Scheme present and no characters N-Triples forbids inside `<...>`.
pub fn is_plausible_iri(s: &str) -> bool {
    let Some((scheme, rest)) = s.split_once(':') else {
        return false;
    };
    let scheme_ok = scheme
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    scheme_ok
        && !rest.is_empty()
        && !s
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || "<>\"{}|^`\\".contains(c))
}
