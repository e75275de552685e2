//! GitLab Client
//!
//! Resolves an issue's global id over REST, then lists its direct children
//! through the work item hierarchy GraphQL query.

use board_engine::{ChildDescriptor, FetchError, ItemId, ItemKind};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use crate::messages::{FetchIssueDetails, IssueDetails};

/// Hierarchy query trimmed to the fields the overlay reads.
pub const WORK_ITEM_TREE_QUERY: &str = r#"
query workItemTreeQuery($id: WorkItemID!, $pageSize: Int = 100, $endCursor: String) {
  workItem(id: $id) {
    id
    widgets(onlyTypes: [HIERARCHY]) {
      ... on WorkItemWidgetHierarchy {
        type
        children(first: $pageSize, after: $endCursor) {
          count
          nodes {
            id
            iid
            workItemType { name }
            title
            state
            createdAt
            closedAt
            widgets(onlyTypes: [LABELS, WEIGHT]) {
              type
              ... on WorkItemWidgetLabels { labels { nodes { title } } }
              ... on WorkItemWidgetWeight { weight }
            }
          }
        }
      }
    }
  }
}
"#;

const OPERATION_NAME: &str = "workItemTreeQuery";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitLabConfig {
    pub api_base: String,
    pub graphql_url: String,
    pub page_size: u32,
}

impl Default for GitLabConfig {
    fn default() -> Self {
        Self {
            api_base: "https://gitlab.com/api/v4".to_string(),
            graphql_url: "https://gitlab.com/api/graphql".to_string(),
            page_size: 100,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GitLabClient {
    config: GitLabConfig,
    client: reqwest::Client,
}

impl GitLabClient {
    pub fn new(config: GitLabConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    pub fn config(&self) -> &GitLabConfig {
        &self.config
    }

    pub fn issue_url(&self, project: &str, iid: ItemId) -> String {
        format!(
            "{}/projects/{}/issues/{}",
            self.config.api_base.trim_end_matches('/'),
            utf8_percent_encode(project, NON_ALPHANUMERIC),
            iid.0
        )
    }

    /// The instance-wide work item id behind a project-scoped issue number.
    pub async fn issue_global_id(&self, project: &str, iid: ItemId) -> Result<u64, FetchError> {
        let url = self.issue_url(project, iid);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        let body = read_body(response, &url).await?;
        decode_issue(&body)
    }

    pub async fn child_items(&self, global_id: u64) -> Result<Vec<ChildDescriptor>, FetchError> {
        let url = &self.config.graphql_url;
        let response = self
            .client
            .post(url)
            .json(&json!({
                "operationName": OPERATION_NAME,
                "query": WORK_ITEM_TREE_QUERY,
                "variables": {
                    "id": format!("gid://gitlab/WorkItem/{}", global_id),
                    "endCursor": "",
                    "pageSize": self.config.page_size,
                },
            }))
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        let body = read_body(response, url).await?;
        decode_children(&body, global_id)
    }

    pub async fn fetch_issue_details(&self, request: &FetchIssueDetails) -> Result<IssueDetails, FetchError> {
        let project = request
            .project
            .as_deref()
            .ok_or_else(|| FetchError::Transport(format!("no project id for issue {}", request.issue)))?;
        let global_id = self.issue_global_id(project, request.issue).await?;
        let child_items = self.child_items(global_id).await?;
        debug!("issue {} has {} child item(s)", request.issue, child_items.len());
        Ok(IssueDetails {
            iid: request.issue,
            child_items,
        })
    }
}

async fn read_body(response: reqwest::Response, url: &str) -> Result<String, FetchError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| FetchError::Transport(e.to_string()))?;
    if !status.is_success() {
        warn!("{} returned {}: {}", url, status, truncate_for_error(&body));
        return Err(FetchError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }
    Ok(body)
}

// ========================
// Response Decoding
// ========================

#[derive(Deserialize)]
struct IssueRecord {
    id: u64,
}

#[derive(Deserialize)]
struct GraphqlEnvelope {
    data: Option<TreeData>,
    errors: Option<Vec<GraphqlError>>,
}

#[derive(Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Deserialize)]
struct TreeData {
    #[serde(rename = "workItem")]
    work_item: Option<WorkItemNode>,
}

#[derive(Deserialize)]
struct WorkItemNode {
    #[serde(default)]
    widgets: Vec<HierarchyWidget>,
}

#[derive(Deserialize)]
struct HierarchyWidget {
    #[serde(default)]
    children: Option<ChildConnection>,
}

#[derive(Deserialize)]
struct ChildConnection {
    #[serde(default)]
    nodes: Vec<ChildNode>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChildNode {
    iid: String,
    work_item_type: Option<TypeName>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    state: String,
    created_at: Option<String>,
    closed_at: Option<String>,
    #[serde(default)]
    widgets: Vec<MetadataWidget>,
}

#[derive(Deserialize)]
struct TypeName {
    name: String,
}

#[derive(Deserialize)]
struct MetadataWidget {
    labels: Option<LabelConnection>,
    weight: Option<u32>,
}

#[derive(Deserialize)]
struct LabelConnection {
    #[serde(default)]
    nodes: Vec<LabelNode>,
}

#[derive(Deserialize)]
struct LabelNode {
    title: String,
}

/// Reads the global `id` out of a REST issue body.
pub fn decode_issue(body: &str) -> Result<u64, FetchError> {
    serde_json::from_str::<IssueRecord>(body)
        .map(|issue| issue.id)
        .map_err(|e| FetchError::Decode(format!("{}: {}", e, truncate_for_error(body))))
}

/// Maps a `workItemTreeQuery` response to child descriptors.
pub fn decode_children(body: &str, global_id: u64) -> Result<Vec<ChildDescriptor>, FetchError> {
    let envelope: GraphqlEnvelope =
        serde_json::from_str(body).map_err(|e| FetchError::Decode(format!("{}: {}", e, truncate_for_error(body))))?;

    if let Some(errors) = envelope.errors.filter(|errors| !errors.is_empty()) {
        let message = errors
            .into_iter()
            .map(|error| error.message)
            .collect::<Vec<_>>()
            .join("; ");
        return Err(FetchError::Decode(message));
    }

    let connection = envelope
        .data
        .and_then(|data| data.work_item)
        .and_then(|item| item.widgets.into_iter().find_map(|widget| widget.children))
        .ok_or_else(|| FetchError::MissingHierarchy(format!("gid://gitlab/WorkItem/{}", global_id)))?;

    Ok(connection.nodes.into_iter().filter_map(to_descriptor).collect())
}

fn to_descriptor(node: ChildNode) -> Option<ChildDescriptor> {
    let Some(identifier) = ItemId::parse(&node.iid) else {
        warn!("skipping child with unreadable iid {:?}", node.iid);
        return None;
    };
    let kind = node
        .work_item_type
        .map(|t| ItemKind::from_type_name(&t.name))
        .unwrap_or(ItemKind::Task);
    let labels = node
        .widgets
        .iter()
        .filter_map(|w| w.labels.as_ref())
        .flat_map(|l| l.nodes.iter().map(|n| n.title.clone()))
        .collect();
    let weight = node.widgets.iter().find_map(|w| w.weight);
    Some(ChildDescriptor {
        identifier,
        kind,
        title: node.title,
        status: node.state,
        created_at: node.created_at,
        closed_at: node.closed_at,
        labels,
        weight,
    })
}

fn truncate_for_error(body: &str) -> String {
    const MAX_LEN: usize = 200;
    if body.chars().count() <= MAX_LEN {
        body.to_owned()
    } else {
        let truncated: String = body.chars().take(MAX_LEN).collect();
        format!("{}...", truncated)
    }
}
