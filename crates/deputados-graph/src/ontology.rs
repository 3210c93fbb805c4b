//! The fixed ontology used for the legislator graph.
//!
//! Every namespace, predicate and class the builder emits (and the canned
//! queries in `deputados-store` match on) is declared here exactly once.
//!
//! Vocabulary:
//! - `schema:` — <http://schema.org/> (Person, Organization, Place, name, ...)
//! - `foaf:`   — <http://xmlns.com/foaf/0.1/> (page)
//! - `pol:`    — <http://purl.org/ontology/politico/> (legislatura)
//! - `rdf:` / `xsd:` — the usual W3C namespaces

use serde::{Deserialize, Serialize};

pub const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema#";
pub const SCHEMA_NS: &str = "http://schema.org/";
pub const FOAF_NS: &str = "http://xmlns.com/foaf/0.1/";
pub const POL_NS: &str = "http://purl.org/ontology/politico/";

/// Default resource namespace of the Chamber's open-data portal.
pub const CAMARA_RESOURCE_NS: &str = "https://dadosabertos.camara.leg.br/recurso/";

pub const RDF_TYPE_IRI: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
pub const RDF_LANG_STRING_IRI: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";
pub const XSD_STRING_IRI: &str = "http://www.w3.org/2001/XMLSchema#string";
pub const XSD_INTEGER_IRI: &str = "http://www.w3.org/2001/XMLSchema#integer";

/// Prefixes used when rendering compact names (visualization, query preambles).
pub const PREFIXES: [(&str, &str); 5] = [
    ("rdf", RDF_NS),
    ("xsd", XSD_NS),
    ("schema", SCHEMA_NS),
    ("foaf", FOAF_NS),
    ("pol", POL_NS),
];

/// Entity classes (the object of `rdf:type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    Person,
    Organization,
    Place,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [Self::Person, Self::Organization, Self::Place];

    pub fn class_iri(self) -> &'static str {
        match self {
            Self::Person => "http://schema.org/Person",
            Self::Organization => "http://schema.org/Organization",
            Self::Place => "http://schema.org/Place",
        }
    }

    pub fn from_class_iri(iri: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.class_iri() == iri)
    }
}

/// Every predicate the builder is allowed to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Predicate {
    Type,
    Name,
    MemberOf,
    AddressRegion,
    Identifier,
    Page,
    Image,
    Legislatura,
    Email,
}

impl Predicate {
    pub const ALL: [Predicate; 9] = [
        Self::Type,
        Self::Name,
        Self::MemberOf,
        Self::AddressRegion,
        Self::Identifier,
        Self::Page,
        Self::Image,
        Self::Legislatura,
        Self::Email,
    ];

    pub fn iri(self) -> &'static str {
        match self {
            Self::Type => RDF_TYPE_IRI,
            Self::Name => "http://schema.org/name",
            Self::MemberOf => "http://schema.org/memberOf",
            Self::AddressRegion => "http://schema.org/addressRegion",
            Self::Identifier => "http://schema.org/identifier",
            Self::Page => "http://xmlns.com/foaf/0.1/page",
            Self::Image => "http://schema.org/image",
            Self::Legislatura => "http://purl.org/ontology/politico/legislatura",
            Self::Email => "http://schema.org/email",
        }
    }

    pub fn from_iri(iri: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.iri() == iri)
    }

    /// At most one value per subject. A second, different value for the same
    /// key is a conflict, not an additional fact.
    pub fn is_functional(self) -> bool {
        matches!(self, Self::Name | Self::Identifier)
    }
}

/// Last `#`- or `/`-separated segment of an IRI.
pub fn local_name(iri: &str) -> &str {
    let trimmed = iri.trim_end_matches(['/', '#']);
    trimmed.rsplit(['#', '/']).next().unwrap_or(trimmed)
}

/// `schema:name`-style compact form when the IRI falls under a known prefix.
pub fn compact_iri(iri: &str) -> String {
    for (prefix, ns) in PREFIXES {
        if let Some(rest) = iri.strip_prefix(ns) {
            if !rest.is_empty() {
                return format!("{prefix}:{rest}");
            }
        }
    }
    iri.to_string()
}

/// SPARQL `PREFIX` preamble for every known namespace.
pub fn sparql_prefixes() -> String {
    let mut out = String::new();
    for (prefix, ns) in PREFIXES {
        out.push_str(&format!("PREFIX {prefix}: <{ns}>\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predicates_round_trip_through_iris() {
        for p in Predicate::ALL {
            assert_eq!(Predicate::from_iri(p.iri()), Some(p));
        }
        assert_eq!(Predicate::from_iri("http://schema.org/unknown"), None);
    }

    #[test]
    fn classes_round_trip_through_iris() {
        for k in EntityKind::ALL {
            assert_eq!(EntityKind::from_class_iri(k.class_iri()), Some(k));
        }
    }

    #[test]
    fn local_name_takes_last_segment() {
        assert_eq!(local_name("http://schema.org/memberOf"), "memberOf");
        assert_eq!(local_name(RDF_TYPE_IRI), "type");
        assert_eq!(
            local_name("https://dadosabertos.camara.leg.br/recurso/uf/RN"),
            "RN"
        );
        assert_eq!(local_name("urn:plain"), "urn:plain");
    }

    #[test]
    fn compact_iri_uses_known_prefixes() {
        assert_eq!(compact_iri("http://schema.org/name"), "schema:name");
        assert_eq!(compact_iri(XSD_INTEGER_IRI), "xsd:integer");
        assert_eq!(
            compact_iri("https://example.org/x"),
            "https://example.org/x"
        );
    }
}
