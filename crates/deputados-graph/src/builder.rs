//! Record → graph mapping.
//!
//! For each record the builder emits a Person node, links it to a shared
//! Organization (party) and a shared Place (state), and attaches the party and
//! state names to those shared nodes:
//!
//! ```text
//!   deputado/{id} ──schema:memberOf──────► {uriPartido}   (schema:Organization, name=siglaPartido)
//!        │
//!        └────────schema:addressRegion───► uf/{siglaUf}   (schema:Place, name=siglaUf)
//! ```
//!
//! Malformed or conflicting records are skipped whole and reported; a build
//! never emits a partially keyed node.

use crate::identity::IdentityScheme;
use crate::model::{RdfGraph, RdfLiteral, RdfNode, RdfObject, RdfTriple};
use crate::ontology::{EntityKind, Predicate};
use crate::record::{columns, LegislatorRecord, MalformedReason, MalformedRecord};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    scheme: IdentityScheme,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildReport {
    pub records_seen: usize,
    pub records_applied: usize,
    pub persons: usize,
    pub organizations: usize,
    pub places: usize,
    pub triples: usize,
    #[serde(serialize_with = "serialize_skipped")]
    pub skipped: Vec<MalformedRecord>,
}

fn serialize_skipped<S: serde::Serializer>(
    skipped: &[MalformedRecord],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(skipped.iter().map(|m| m.to_string()))
}

#[derive(Debug, Clone, Default)]
pub struct BuildOutput {
    pub graph: RdfGraph,
    pub report: BuildReport,
}

impl GraphBuilder {
    pub fn new(scheme: IdentityScheme) -> Self {
        Self { scheme }
    }

    pub fn scheme(&self) -> &IdentityScheme {
        &self.scheme
    }

    /// Build from already validated records. Row numbers are 1-based positions.
    pub fn build<'r, I>(&self, records: I) -> BuildOutput
    where
        I: IntoIterator<Item = &'r LegislatorRecord>,
    {
        self.build_rows(
            records
                .into_iter()
                .enumerate()
                .map(|(i, rec)| Ok((i + 1, rec.clone()))),
        )
    }

    /// Build from rows that may have failed validation upstream; failures are
    /// carried into the report alongside the builder's own rejections.
    ///
    /// Single-valued attributes (names, identifiers) are checked across the
    /// whole input before anything is inserted. When two records disagree on
    /// one, every record carrying that attribute is skipped, so the result
    /// does not depend on row order.
    pub fn build_rows<I>(&self, rows: I) -> BuildOutput
    where
        I: IntoIterator<Item = Result<(usize, LegislatorRecord), MalformedRecord>>,
    {
        let mut graph = RdfGraph::new();
        let mut report = BuildReport::default();
        let mut candidates = Vec::new();
        let mut values: HashMap<FunctionalKey, BTreeSet<String>> = HashMap::new();

        for row in rows {
            report.records_seen += 1;
            let candidate = row.and_then(|(row, record)| self.candidate(row, record));
            match candidate {
                Ok(candidate) => {
                    for (key, value) in functional_values(&candidate.triples) {
                        values.entry(key).or_default().insert(value);
                    }
                    candidates.push(candidate);
                }
                Err(malformed) => {
                    warn!(%malformed, "skipping record");
                    report.skipped.push(malformed);
                }
            }
        }

        for candidate in candidates {
            if let Some(malformed) = conflict(&candidate, &values) {
                warn!(%malformed, "skipping record");
                report.skipped.push(malformed);
                continue;
            }
            let added = candidate
                .triples
                .into_iter()
                .filter(|t| graph.insert(t.clone()))
                .count();
            debug!(row = candidate.row, id = candidate.record.id, added, "record applied");
            report.records_applied += 1;
        }
        report.skipped.sort_by_key(|m| m.row);

        report.persons = graph.instances_of(EntityKind::Person.class_iri()).count();
        report.organizations = graph
            .instances_of(EntityKind::Organization.class_iri())
            .count();
        report.places = graph.instances_of(EntityKind::Place.class_iri()).count();
        report.triples = graph.len();

        info!(
            seen = report.records_seen,
            applied = report.records_applied,
            skipped = report.skipped.len(),
            persons = report.persons,
            organizations = report.organizations,
            places = report.places,
            triples = report.triples,
            "graph built"
        );

        BuildOutput { graph, report }
    }

    /// The triples one record maps to, in emission order.
    pub fn record_triples(&self, record: &LegislatorRecord) -> Vec<RdfTriple> {
        let person = self.scheme.person(record.id);
        let party = self.scheme.organization(&record.party_uri);
        let place = self.scheme.place(&record.region_code);

        let mut out = vec![
            RdfTriple::with(&person, Predicate::Type, class(EntityKind::Person)),
            RdfTriple::with(&person, Predicate::Name, RdfLiteral::string(&record.name)),
            RdfTriple::with(&person, Predicate::MemberOf, party.clone()),
            RdfTriple::with(&person, Predicate::AddressRegion, place.clone()),
            RdfTriple::with(
                &person,
                Predicate::Identifier,
                RdfLiteral::unsigned(record.id),
            ),
            RdfTriple::with(&person, Predicate::Page, RdfObject::iri(&record.profile_uri)),
            RdfTriple::with(&person, Predicate::Image, RdfObject::iri(&record.photo_url)),
            RdfTriple::with(
                &person,
                Predicate::Legislatura,
                RdfLiteral::integer(i64::from(record.legislature)),
            ),
        ];

        if let Some(email) = record.email.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
            out.push(RdfTriple::with(&person, Predicate::Email, RdfLiteral::string(email)));
        }

        out.push(RdfTriple::with(&party, Predicate::Type, class(EntityKind::Organization)));
        out.push(RdfTriple::with(
            &party,
            Predicate::Name,
            RdfLiteral::string(&record.party_acronym),
        ));

        out.push(RdfTriple::with(&place, Predicate::Type, class(EntityKind::Place)));
        out.push(RdfTriple::with(
            &place,
            Predicate::Name,
            RdfLiteral::string(&record.region_code),
        ));

        out
    }

    fn candidate(
        &self,
        row: usize,
        record: LegislatorRecord,
    ) -> Result<Candidate, MalformedRecord> {
        let missing: Vec<&'static str> = [
            (columns::URI_PARTIDO, record.party_uri.as_str()),
            (columns::SIGLA_UF, record.region_code.as_str()),
        ]
        .into_iter()
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(col, _)| col)
        .collect();
        if !missing.is_empty() {
            return Err(MalformedRecord {
                row,
                id: Some(record.id.to_string()),
                reason: MalformedReason::MissingFields(missing),
            });
        }

        let triples = self.record_triples(&record);
        Ok(Candidate {
            row,
            record,
            triples,
        })
    }
}

/// Subject key and predicate IRI of a single-valued attribute.
type FunctionalKey = (String, &'static str);

struct Candidate {
    row: usize,
    record: LegislatorRecord,
    triples: Vec<RdfTriple>,
}

fn functional_values(triples: &[RdfTriple]) -> impl Iterator<Item = (FunctionalKey, String)> + '_ {
    triples.iter().filter_map(|t| {
        let predicate = Predicate::from_iri(&t.predicate).filter(|p| p.is_functional())?;
        Some((
            (t.subject.key().to_string(), predicate.iri()),
            t.object.value().to_string(),
        ))
    })
}

/// The first attribute of `candidate` that some record in the input
/// disagrees with.
fn conflict(
    candidate: &Candidate,
    values: &HashMap<FunctionalKey, BTreeSet<String>>,
) -> Option<MalformedRecord> {
    functional_values(&candidate.triples).find_map(|(key, incoming)| {
        let seen = values.get(&key)?;
        let existing = seen.iter().find(|v| **v != incoming)?.clone();
        Some(MalformedRecord {
            row: candidate.row,
            id: Some(candidate.record.id.to_string()),
            reason: MalformedReason::ConflictingAttribute {
                predicate: key.1.to_string(),
                key: key.0,
                existing,
                incoming,
            },
        })
    })
}

fn class(kind: EntityKind) -> RdfNode {
    RdfNode::iri(kind.class_iri())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ontology::XSD_INTEGER_IRI;

    fn record(id: u64, name: &str, party: &str, party_id: u32, uf: &str) -> LegislatorRecord {
        LegislatorRecord {
            id,
            name: name.to_string(),
            party_acronym: party.to_string(),
            party_uri: format!("https://dadosabertos.camara.leg.br/api/v2/partidos/{party_id}"),
            region_code: uf.to_string(),
            legislature: 57,
            profile_uri: format!("https://dadosabertos.camara.leg.br/api/v2/deputados/{id}"),
            photo_url: format!("https://www.camara.leg.br/internet/deputado/bandep/{id}.jpg"),
            email: None,
        }
    }

    fn count_pred(graph: &RdfGraph, subject: &RdfNode, predicate: Predicate) -> usize {
        graph.objects(subject, predicate.iri()).count()
    }

    #[test]
    fn mineiro_scenario() {
        let builder = GraphBuilder::default();
        let rec = record(204445, "Fernando Mineiro", "PT", 77, "RN");
        let out = builder.build([&rec]);
        let g = &out.graph;

        let person = builder.scheme().person(204445);
        let party = RdfNode::iri(&rec.party_uri);
        let place = RdfNode::iri("https://dadosabertos.camara.leg.br/recurso/uf/RN");

        assert!(g.contains(&RdfTriple::with(
            &person,
            Predicate::Identifier,
            RdfLiteral::integer(204445)
        )));
        assert_eq!(count_pred(g, &person, Predicate::Email), 0);
        assert!(g.contains(&RdfTriple::with(&person, Predicate::MemberOf, party.clone())));
        assert!(g.contains(&RdfTriple::with(&person, Predicate::AddressRegion, place.clone())));
        assert!(g.contains(&RdfTriple::with(&party, Predicate::Name, RdfLiteral::string("PT"))));
        assert!(g.contains(&RdfTriple::with(&place, Predicate::Name, RdfLiteral::string("RN"))));

        let leg: Vec<_> = g.objects(&person, Predicate::Legislatura.iri()).collect();
        assert_eq!(leg.len(), 1);
        assert_eq!(
            leg[0].as_literal().and_then(|l| l.datatype.as_deref()),
            Some(XSD_INTEGER_IRI)
        );

        assert_eq!(out.report.persons, 1);
        assert_eq!(out.report.organizations, 1);
        assert_eq!(out.report.places, 1);
        assert!(out.report.skipped.is_empty());
        // 8 person triples + 2 party + 2 place
        assert_eq!(g.len(), 12);
    }

    #[test]
    fn shared_place_for_same_region() {
        let builder = GraphBuilder::default();
        let a = record(1, "A", "PT", 1, "GO");
        let b = record(2, "B", "PL", 2, "GO");
        let out = builder.build([&a, &b]);

        let places: Vec<_> = out
            .graph
            .instances_of(EntityKind::Place.class_iri())
            .collect();
        assert_eq!(places.len(), 1);
        let place = places[0].clone();
        for id in [1, 2] {
            let person = builder.scheme().person(id);
            assert!(out
                .graph
                .contains(&RdfTriple::with(&person, Predicate::AddressRegion, place.clone())));
        }
    }

    #[test]
    fn email_is_conditional() {
        let builder = GraphBuilder::default();
        let mut with = record(1, "A", "PT", 1, "SP");
        with.email = Some("dep.a@camara.leg.br".to_string());
        let mut blank = record(2, "B", "PT", 1, "SP");
        blank.email = Some("   ".to_string());
        let out = builder.build([&with, &blank]);

        assert_eq!(
            count_pred(&out.graph, &builder.scheme().person(1), Predicate::Email),
            1
        );
        assert_eq!(
            count_pred(&out.graph, &builder.scheme().person(2), Predicate::Email),
            0
        );
    }

    #[test]
    fn missing_keys_skip_the_record() {
        let builder = GraphBuilder::default();
        let good = record(1, "A", "PT", 1, "SP");
        let mut bad = record(2, "B", "PT", 1, "SP");
        bad.region_code = String::new();
        let out = builder.build([&good, &bad]);

        assert_eq!(out.report.records_seen, 2);
        assert_eq!(out.report.records_applied, 1);
        assert_eq!(out.report.skipped.len(), 1);
        assert_eq!(out.report.skipped[0].row, 2);
        assert_eq!(
            out.graph.triples_of(&builder.scheme().person(2)).count(),
            0
        );
    }

    #[test]
    fn conflicting_party_name_rejects_every_record_of_that_party() {
        let builder = GraphBuilder::default();
        let a = record(1, "A", "PT", 1, "SP");
        let b = record(2, "B", "PSDB", 1, "MG");
        let c = record(3, "C", "PL", 2, "SP");
        let out = builder.build([&a, &b, &c]);

        assert_eq!(out.report.records_applied, 1);
        let rows: Vec<usize> = out.report.skipped.iter().map(|m| m.row).collect();
        assert_eq!(rows, vec![1, 2]);
        assert!(out.report.skipped.iter().all(|m| matches!(
            m.reason,
            MalformedReason::ConflictingAttribute { .. }
        )));
        // Nothing of either record leaked, not even the new Place
        assert_eq!(out.graph.triples_of(&builder.scheme().person(1)).count(), 0);
        assert_eq!(out.graph.triples_of(&builder.scheme().person(2)).count(), 0);
        assert_eq!(out.graph.triples_of(&builder.scheme().place("MG")).count(), 0);
        assert_eq!(
            out.graph
                .triples_of(&builder.scheme().organization(&a.party_uri))
                .count(),
            0
        );
        assert_eq!(out.report.persons, 1);
    }

    #[test]
    fn conflict_outcome_does_not_depend_on_row_order() {
        let builder = GraphBuilder::default();
        let a = record(1, "A", "PT", 1, "SP");
        let b = record(2, "B", "PL", 2, "GO");
        let c = record(3, "C", "PSDB", 1, "MG");

        let forward = builder.build([&a, &b, &c]);
        let backward = builder.build([&c, &b, &a]);
        assert_eq!(forward.graph, backward.graph);

        let ids = |out: &BuildOutput| {
            let mut ids: Vec<Option<String>> =
                out.report.skipped.iter().map(|m| m.id.clone()).collect();
            ids.sort();
            ids
        };
        assert_eq!(ids(&forward), ids(&backward));
        assert_eq!(ids(&forward), vec![Some("1".into()), Some("3".into())]);
    }

    #[test]
    fn conflicting_person_name_reports_both_values() {
        let builder = GraphBuilder::default();
        let a = record(5, "Ana", "PT", 1, "SP");
        let mut b = a.clone();
        b.name = "Ana Maria".into();
        b.legislature = 56;
        let out = builder.build([&b, &a]);

        assert!(out.graph.is_empty());
        let reasons: Vec<(String, String)> = out
            .report
            .skipped
            .iter()
            .filter_map(|m| match &m.reason {
                MalformedReason::ConflictingAttribute { existing, incoming, .. } => {
                    Some((existing.clone(), incoming.clone()))
                }
                _ => None,
            })
            .collect();
        assert_eq!(
            reasons,
            vec![
                ("Ana".to_string(), "Ana Maria".to_string()),
                ("Ana Maria".to_string(), "Ana".to_string()),
            ]
        );
    }

    #[test]
    fn identifier_keeps_the_full_unsigned_range() {
        let builder = GraphBuilder::default();
        let rec = record(u64::MAX, "Max", "PT", 1, "SP");
        let out = builder.build([&rec]);
        let person = builder.scheme().person(u64::MAX);

        let ids: Vec<&RdfObject> = out.graph.objects(&person, Predicate::Identifier.iri()).collect();
        assert_eq!(
            ids,
            vec![&RdfObject::Literal(RdfLiteral::typed(
                "18446744073709551615",
                XSD_INTEGER_IRI
            ))]
        );
        assert!(person.key().ends_with("/18446744073709551615"));
    }

    #[test]
    fn same_legislator_in_two_terms_keeps_both_terms() {
        let builder = GraphBuilder::default();
        let a = record(7, "A", "PT", 1, "SP");
        let mut b = a.clone();
        b.legislature = 56;
        let out = builder.build([&a, &b]);

        assert!(out.report.skipped.is_empty());
        assert_eq!(out.report.persons, 1);
        assert_eq!(
            count_pred(&out.graph, &builder.scheme().person(7), Predicate::Legislatura),
            2
        );
    }

    #[test]
    fn upstream_rejections_are_reported() {
        let builder = GraphBuilder::default();
        let rows = vec![
            Ok((1, record(1, "A", "PT", 1, "SP"))),
            Err(MalformedRecord {
                row: 2,
                id: None,
                reason: MalformedReason::MissingFields(vec!["id"]),
            }),
        ];
        let out = builder.build_rows(rows);
        assert_eq!(out.report.records_seen, 2);
        assert_eq!(out.report.records_applied, 1);
        assert_eq!(out.report.skipped[0].row, 2);
    }
}
