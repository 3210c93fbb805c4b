//! Entity keys.
//!
//! Keys are pure functions of record fields: no counters, no randomness. Two
//! builds over the same records therefore agree on every node.
//!
//! - Person:       `{namespace}deputado/{id}`
//! - Place:        `{namespace}uf/{region code}`
//! - Organization: the party URI exactly as supplied

use crate::model::RdfNode;
use crate::ontology::CAMARA_RESOURCE_NS;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityScheme {
    /// Resource namespace; expected to end with `/`.
    pub resource_namespace: String,
}

impl Default for IdentityScheme {
    fn default() -> Self {
        Self::new(CAMARA_RESOURCE_NS)
    }
}

impl IdentityScheme {
    pub fn new(resource_namespace: impl Into<String>) -> Self {
        let mut resource_namespace = resource_namespace.into();
        if !resource_namespace.ends_with('/') && !resource_namespace.ends_with('#') {
            resource_namespace.push('/');
        }
        Self { resource_namespace }
    }

    pub fn person_iri(&self, id: u64) -> String {
        format!("{}deputado/{id}", self.resource_namespace)
    }

    pub fn place_iri(&self, region_code: &str) -> String {
        format!("{}uf/{region_code}", self.resource_namespace)
    }

    pub fn organization_iri(&self, party_uri: &str) -> String {
        party_uri.to_string()
    }

    pub fn person(&self, id: u64) -> RdfNode {
        RdfNode::Iri(self.person_iri(id))
    }

    pub fn place(&self, region_code: &str) -> RdfNode {
        RdfNode::Iri(self.place_iri(region_code))
    }

    pub fn organization(&self, party_uri: &str) -> RdfNode {
        RdfNode::Iri(self.organization_iri(party_uri))
    }

    /// Inverse of [`IdentityScheme::person_iri`].
    pub fn person_id_from_iri(&self, iri: &str) -> Option<u64> {
        iri.strip_prefix(&self.resource_namespace)?
            .strip_prefix("deputado/")?
            .parse()
            .ok()
    }
}
