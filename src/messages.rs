//! Extension Messages
//!
//! JSON shapes exchanged between the content script, the background worker
//! and the popup over `runtime.sendMessage` / `tabs.sendMessage`.

use board_engine::{ChildDescriptor, ChildFetch, FetchError, Flags, FlagsPatch, ItemId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ExtensionError;

pub const FETCH_ISSUE_DETAILS: &str = "fetchIssueDetails";
pub const FLAGS_UPDATED: &str = "flagsUpdated";
pub const RECENT_LOGS: &str = "recentLogs";

// ========================
// Content -> Background
// ========================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchIssueDetails {
    pub action: String,
    pub issue: ItemId,
    #[serde(default)]
    pub project: Option<String>,
}

impl FetchIssueDetails {
    pub fn new(fetch: &ChildFetch) -> Self {
        Self {
            action: FETCH_ISSUE_DETAILS.to_string(),
            issue: fetch.issue,
            project: fetch.project.clone(),
        }
    }
}

/// An issue and its direct children, as returned by the background worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueDetails {
    pub iid: ItemId,
    #[serde(default)]
    pub child_items: Vec<ChildDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FetchReply {
    Details(IssueDetails),
    Failed { error: String },
}

impl FetchReply {
    pub fn into_children(self) -> Result<Vec<ChildDescriptor>, FetchError> {
        match self {
            FetchReply::Details(details) => Ok(details.child_items),
            FetchReply::Failed { error } => Err(FetchError::Transport(error)),
        }
    }
}

impl From<Result<IssueDetails, FetchError>> for FetchReply {
    fn from(result: Result<IssueDetails, FetchError>) -> Self {
        match result {
            Ok(details) => FetchReply::Details(details),
            Err(e) => FetchReply::Failed { error: e.to_string() },
        }
    }
}

// ========================
// Popup -> Content
// ========================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagsUpdated {
    #[serde(rename = "type")]
    pub kind: String,
    pub flags: FlagsPatch,
}

impl FlagsUpdated {
    pub fn new(flags: Flags) -> Self {
        Self {
            kind: FLAGS_UPDATED.to_string(),
            flags: flags.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncomingMessage {
    FetchIssueDetails(FetchIssueDetails),
    FlagsUpdated(FlagsPatch),
    /// Asks for the worker's buffered log lines.
    RecentLogs,
    /// Meant for some other listener.
    Other,
}

/// Routes a raw runtime message by its `action` or `type` field.
pub fn parse_message(value: &Value) -> Result<IncomingMessage, ExtensionError> {
    if value.get("action").and_then(Value::as_str) == Some(FETCH_ISSUE_DETAILS) {
        let request: FetchIssueDetails = serde_json::from_value(value.clone())?;
        return Ok(IncomingMessage::FetchIssueDetails(request));
    }
    if value.get("action").and_then(Value::as_str) == Some(RECENT_LOGS) {
        return Ok(IncomingMessage::RecentLogs);
    }
    if value.get("type").and_then(Value::as_str) == Some(FLAGS_UPDATED) {
        return match value.get("flags") {
            Some(flags) if flags.is_object() => Ok(IncomingMessage::FlagsUpdated(Flags::patch_from_json(flags))),
            _ => Ok(IncomingMessage::Other),
        };
    }
    Ok(IncomingMessage::Other)
}

#[cfg(test)]
mod tests {
    use super::*;
    use board_engine::ItemKind;
    use serde_json::json;

    #[test]
    fn test_fetch_request_wire_shape() {
        let fetch = ChildFetch {
            issue: ItemId(100),
            project: Some("278964".into()),
        };
        let value = serde_json::to_value(FetchIssueDetails::new(&fetch)).unwrap();
        assert_eq!(value, json!({ "action": "fetchIssueDetails", "issue": 100, "project": "278964" }));
    }

    #[test]
    fn test_parse_routes_by_action_and_type() {
        let fetch = parse_message(&json!({ "action": "fetchIssueDetails", "issue": 7 })).unwrap();
        assert_eq!(
            fetch,
            IncomingMessage::FetchIssueDetails(FetchIssueDetails {
                action: FETCH_ISSUE_DETAILS.into(),
                issue: ItemId(7),
                project: None,
            })
        );

        let flags = parse_message(&json!({ "type": "flagsUpdated", "flags": { "muteDone": false } })).unwrap();
        let IncomingMessage::FlagsUpdated(patch) = flags else {
            panic!("expected flags update");
        };
        assert_eq!(patch.mute_done, Some(false));
        assert_eq!(patch.group_children, None);

        assert_eq!(parse_message(&json!({ "action": "recentLogs" })).unwrap(), IncomingMessage::RecentLogs);
        assert_eq!(parse_message(&json!({ "type": "flagsUpdated" })).unwrap(), IncomingMessage::Other);
        assert_eq!(parse_message(&json!({ "hello": 1 })).unwrap(), IncomingMessage::Other);
    }

    #[test]
    fn test_malformed_fetch_request_is_an_error() {
        let result = parse_message(&json!({ "action": "fetchIssueDetails", "issue": "abc" }));
        assert!(matches!(result, Err(ExtensionError::Serde(_))));
    }

    #[test]
    fn test_reply_decodes_details_or_failure() {
        let reply: FetchReply = serde_json::from_value(json!({
            "iid": 100,
            "child_items": [{ "identifier": 101, "kind": "task", "title": "Write docs" }]
        }))
        .unwrap();
        let children = reply.into_children().unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].identifier, ItemId(101));
        assert_eq!(children[0].kind, ItemKind::Task);

        let failed: FetchReply = serde_json::from_value(json!({ "error": "unexpected status 404" })).unwrap();
        assert_eq!(failed.into_children(), Err(FetchError::Transport("unexpected status 404".into())));
    }

    #[test]
    fn test_reply_from_result() {
        let reply = FetchReply::from(Err(FetchError::MissingHierarchy("#3".into())));
        let value = serde_json::to_value(&reply).unwrap();
        assert!(value["error"].as_str().unwrap().contains("#3"));
    }

    #[test]
    fn test_flags_updated_carries_every_key() {
        let value = serde_json::to_value(FlagsUpdated::new(Flags::default())).unwrap();
        assert_eq!(value["type"], "flagsUpdated");
        for key in Flags::KEYS {
            assert!(value["flags"].get(key).is_some(), "missing {}", key);
        }
    }
}
