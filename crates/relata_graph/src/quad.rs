//! The quad: storage unit for one relationship fact.

use crate::error::GraphResult;
use relata_model::Edge;
use serde::{Deserialize, Serialize};

/// Builds the synthetic vertex name for an entity, `/<kind>/<id>`.
#[must_use]
pub fn vertex(kind: &str, id: &str) -> String {
    format!("/{kind}/{id}")
}

/// Builds the predicate for a link instance, `<link>:<instance>`.
#[must_use]
pub fn predicate(link: &str, instance: &str) -> String {
    format!("{link}:{instance}")
}

/// One (subject, predicate, object, label) relationship fact.
///
/// The label carries the owning [`Edge`]'s full JSON serialization, so a
/// quad is self-contained: decoding the label reconstructs the edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quad {
    /// Source vertex, `/<kind>/<id>`.
    pub subject: String,
    /// `<link>:<instance>`.
    pub predicate: String,
    /// Target vertex, `/<kind>/<id>`.
    pub object: String,
    /// Serialized edge payload.
    pub label: String,
}

impl Quad {
    /// Builds the quad persisting one edge.
    pub fn for_edge(edge: &Edge) -> GraphResult<Self> {
        Ok(Self {
            subject: vertex(&edge.source, &edge.source_id),
            predicate: predicate(&edge.link, &edge.instance),
            object: vertex(&edge.target, &edge.target_id),
            label: serde_json::to_string(edge)?,
        })
    }

    /// Returns the instance suffix of the predicate, if well-formed.
    #[must_use]
    pub fn instance(&self) -> Option<&str> {
        self.predicate.rsplit_once(':').map(|(_, instance)| instance)
    }

    /// Returns the link-kind prefix of the predicate, if well-formed.
    #[must_use]
    pub fn link(&self) -> Option<&str> {
        self.predicate.rsplit_once(':').map(|(link, _)| link)
    }

    /// Decodes the label back into its edge.
    ///
    /// Edges persisted before the instance field existed carry an empty
    /// instance; it is backfilled from the edge id.
    pub fn decode_edge(&self) -> GraphResult<Edge> {
        let mut edge: Edge = serde_json::from_str(&self.label)?;
        if edge.instance.is_empty() {
            edge.instance = edge.id.clone();
        }
        Ok(edge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge() -> Edge {
        let mut edge = Edge::new("nodes", "u1", "nodes", "u2", "ref");
        edge.id = "i1".to_string();
        edge.instance = "i1".to_string();
        edge
    }

    #[test]
    fn vertex_and_predicate_shapes() {
        assert_eq!(vertex("nodes", "u1"), "/nodes/u1");
        assert_eq!(predicate("ref", "i1"), "ref:i1");
    }

    #[test]
    fn quad_carries_edge_identity() {
        let quad = Quad::for_edge(&edge()).unwrap();
        assert_eq!(quad.subject, "/nodes/u1");
        assert_eq!(quad.predicate, "ref:i1");
        assert_eq!(quad.object, "/nodes/u2");
        assert_eq!(quad.instance(), Some("i1"));
        assert_eq!(quad.link(), Some("ref"));
    }

    #[test]
    fn label_decodes_back_to_edge() {
        let original = edge();
        let quad = Quad::for_edge(&original).unwrap();
        let decoded = quad.decode_edge().unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn empty_instance_backfilled_from_id() {
        let mut original = edge();
        original.instance = String::new();
        let quad = Quad::for_edge(&original).unwrap();
        let decoded = quad.decode_edge().unwrap();
        assert_eq!(decoded.instance, "i1");
    }
}
