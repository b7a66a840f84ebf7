//! Lead-source taxonomy models matching the frontend LeadSourceNode interface.

use serde::{Deserialize, Serialize};

/// A node in the admin-configured lead-source taxonomy.
///
/// Nodes form a parent-linked forest of arbitrary depth. Admins soft-delete
/// nodes by clearing `active`, which can leave `parent_id` links dangling on
/// historic data; walkers must tolerate that.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadSourceNode {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// A lead's pointer into the taxonomy, plus free-text detail.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadSource {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    #[serde(default)]
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_defaults_to_active() {
        let node: LeadSourceNode =
            serde_json::from_str(r#"{"id":"src-1","name":"Website"}"#).unwrap();

        assert!(node.active);
        assert!(node.parent_id.is_none());
    }

    #[test]
    fn test_lead_source_wire_shape() {
        let source = LeadSource {
            source_id: Some("src-1".to_string()),
            detail: "Q3 campaign".to_string(),
        };

        let json = serde_json::to_value(&source).unwrap();
        assert_eq!(json["sourceId"], "src-1");
        assert_eq!(json["detail"], "Q3 campaign");
    }
}
