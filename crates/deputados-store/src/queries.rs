//! Ready-made queries over the legislator graph.
//!
//! Built from the ontology table so predicate IRIs live in one place.

use deputados_graph::ontology::{sparql_prefixes, EntityKind, Predicate};
use deputados_graph::IdentityScheme;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CannedQuery {
    /// Legislators elected for one region (`siglaUf`), by name.
    PersonsByRegion(String),
    /// Legislators per party, largest first.
    PartySizes,
    /// Every predicate/object of one legislator.
    Profile(u64),
}

impl CannedQuery {
    pub const NAMES: [&'static str; 3] = ["by-region", "party-sizes", "profile"];

    /// `by-region:RN`, `party-sizes`, `profile:204445`.
    pub fn parse(spec: &str) -> Result<Self, String> {
        let (name, arg) = match spec.split_once(':') {
            Some((n, a)) => (n, Some(a.trim())),
            None => (spec, None),
        };
        match (name.trim(), arg) {
            ("by-region", Some(uf)) if !uf.is_empty() => Ok(Self::PersonsByRegion(uf.to_string())),
            ("party-sizes", None) => Ok(Self::PartySizes),
            ("profile", Some(id)) => id
                .parse()
                .map(Self::Profile)
                .map_err(|_| format!("profile expects a numeric id, got `{id}`")),
            _ => Err(format!(
                "unknown preset `{spec}` (expected by-region:<UF>, party-sizes, profile:<id>)"
            )),
        }
    }

    pub fn to_sparql(&self, scheme: &IdentityScheme) -> String {
        let person = EntityKind::Person.class_iri();
        let name = Predicate::Name.iri();
        let mut q = sparql_prefixes();
        match self {
            Self::PersonsByRegion(uf) => {
                q.push_str(&format!(
                    "SELECT ?id ?nome ?partido WHERE {{\n  \
                     ?p a <{person}> ;\n     \
                     <{name}> ?nome ;\n     \
                     <{ident}> ?id ;\n     \
                     <{member}> ?org ;\n     \
                     <{region}> ?uf .\n  \
                     ?org <{name}> ?partido .\n  \
                     ?uf <{name}> {lit} .\n}}\nORDER BY ?nome ?id\n",
                    ident = Predicate::Identifier.iri(),
                    member = Predicate::MemberOf.iri(),
                    region = Predicate::AddressRegion.iri(),
                    lit = string_literal(uf),
                ));
            }
            Self::PartySizes => {
                q.push_str(&format!(
                    "SELECT ?partido (COUNT(DISTINCT ?p) AS ?deputados) WHERE {{\n  \
                     ?p a <{person}> ;\n     \
                     <{member}> ?org .\n  \
                     ?org <{name}> ?partido .\n}}\n\
                     GROUP BY ?partido\nORDER BY DESC(?deputados) ?partido\n",
                    member = Predicate::MemberOf.iri(),
                ));
            }
            Self::Profile(id) => {
                q.push_str(&format!(
                    "SELECT ?predicate ?object WHERE {{\n  <{iri}> ?predicate ?object .\n}}\n\
                     ORDER BY ?predicate ?object\n",
                    iri = scheme.person_iri(*id),
                ));
            }
        }
        q
    }
}

/// Quoted SPARQL string literal.
fn string_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}
