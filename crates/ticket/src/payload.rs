//! Issue payload types. The tracker wants the description as a structured
//! "doc" body rather than plain text.

use serde::Serialize;

/// Issue type id for incidents on the target instance.
const INCIDENT_ISSUE_TYPE: &str = "10049";

#[derive(Debug, Serialize)]
pub struct IssuePayload {
    pub fields: IssueFields,
}

#[derive(Debug, Serialize)]
pub struct IssueFields {
    pub project: ProjectRef,
    pub summary: String,
    pub description: DocBody,
    pub issuetype: IssueTypeRef,
}

#[derive(Debug, Serialize)]
pub struct ProjectRef {
    pub key: String,
}

#[derive(Debug, Serialize)]
pub struct IssueTypeRef {
    pub id: String,
}

/// Minimal document body: one paragraph of plain text.
#[derive(Debug, Serialize)]
pub struct DocBody {
    #[serde(rename = "type")]
    pub doc_type: String,
    pub version: u32,
    pub content: Vec<DocNode>,
}

#[derive(Debug, Serialize)]
pub struct DocNode {
    #[serde(rename = "type")]
    pub node_type: String,
    pub content: Vec<TextNode>,
}

#[derive(Debug, Serialize)]
pub struct TextNode {
    #[serde(rename = "type")]
    pub node_type: String,
    pub text: String,
}

impl IssuePayload {
    /// Build an incident ticket for the given project.
    pub fn incident(project_key: &str, summary: &str, description: &str) -> Self {
        Self {
            fields: IssueFields {
                project: ProjectRef {
                    key: project_key.to_string(),
                },
                summary: summary.to_string(),
                description: DocBody {
                    doc_type: "doc".to_string(),
                    version: 1,
                    content: vec![DocNode {
                        node_type: "paragraph".to_string(),
                        content: vec![TextNode {
                            node_type: "text".to_string(),
                            text: description.to_string(),
                        }],
                    }],
                },
                issuetype: IssueTypeRef {
                    id: INCIDENT_ISSUE_TYPE.to_string(),
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_to_tracker_document_shape() {
        let payload = IssuePayload::incident("PROJ", "Test Incident", "Created via API.");
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["fields"]["project"]["key"], "PROJ");
        assert_eq!(json["fields"]["summary"], "Test Incident");
        assert_eq!(json["fields"]["issuetype"]["id"], "10049");

        let description = &json["fields"]["description"];
        assert_eq!(description["type"], "doc");
        assert_eq!(description["version"], 1);
        assert_eq!(description["content"][0]["type"], "paragraph");
        assert_eq!(
            description["content"][0]["content"][0]["text"],
            "Created via API."
        );
    }
}
