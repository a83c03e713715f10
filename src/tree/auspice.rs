//! Serde model of the Auspice v2 tree JSON used as the external tree format.
//!
//! Only the fields the placement engine needs are typed; everything else is
//! kept in flattened maps so that it survives a load/write cycle.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Key of the nucleotide entry in `branch_attrs.mutations`.
pub const NUC_KEY: &str = "nuc";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AuspiceNode {
    pub name: String,

    #[serde(default)]
    pub node_attrs: NodeAttrs,

    #[serde(default)]
    pub branch_attrs: BranchAttrs,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<AuspiceNode>,

    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct NodeAttrs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub div: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clade_membership: Option<AttrValue>,

    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AttrValue {
    pub value: String,

    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl AttrValue {
    pub fn new(value: &str) -> Self {
        Self {
            value: value.to_string(),
            other: Map::new(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct BranchAttrs {
    #[serde(default)]
    pub mutations: BTreeMap<String, Vec<String>>,

    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// A full Auspice document (`version`, `meta`, ...) or just its root node.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeDocument {
    pub root: AuspiceNode,
    /// Document-level fields other than `tree`; `None` for a bare root node.
    pub envelope: Option<Map<String, Value>>,
}

impl TreeDocument {
    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        match value {
            Value::Object(mut fields) if fields.contains_key("tree") => {
                let tree = fields.remove("tree").unwrap_or(Value::Null);
                Ok(Self {
                    root: serde_json::from_value(tree)?,
                    envelope: Some(fields),
                })
            }
            other => Ok(Self {
                root: serde_json::from_value(other)?,
                envelope: None,
            }),
        }
    }

    pub fn into_value(self) -> serde_json::Result<Value> {
        let root = serde_json::to_value(self.root)?;
        match self.envelope {
            Some(mut fields) => {
                fields.insert("tree".to_string(), root);
                Ok(Value::Object(fields))
            }
            None => Ok(root),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_fields_survive_a_round_trip() {
        let value = json!({
            "version": "v2",
            "meta": {"title": "demo"},
            "tree": {
                "name": "root",
                "node_attrs": {"div": 0.0, "country": {"value": "Chile"}},
                "branch_attrs": {"mutations": {"nuc": ["C72T"], "ORF1a": ["T10I"]}, "labels": {"clade": "20A"}},
                "children": []
            }
        });
        let doc = TreeDocument::from_value(value.clone()).unwrap();
        assert_eq!(doc.root.node_attrs.other["country"]["value"], "Chile");
        assert_eq!(doc.envelope.as_ref().unwrap()["meta"]["title"], "demo");

        let written = doc.into_value().unwrap();
        assert_eq!(written["tree"]["branch_attrs"]["mutations"]["ORF1a"], json!(["T10I"]));
        assert_eq!(written["tree"]["branch_attrs"]["labels"]["clade"], "20A");
        assert_eq!(written["version"], "v2");
    }

    #[test]
    fn bare_root_node_is_accepted() {
        let doc = TreeDocument::from_value(json!({"name": "root"})).unwrap();
        assert!(doc.envelope.is_none());
        assert_eq!(doc.root.name, "root");
        assert!(doc.root.children.is_empty());
    }

    #[test]
    fn missing_name_is_an_error() {
        assert!(TreeDocument::from_value(json!({"node_attrs": {"div": 0.0}})).is_err());
    }
}
