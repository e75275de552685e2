//! Background Worker
//!
//! Answers `fetchIssueDetails` requests from content scripts with the issue's
//! direct children, and `recentLogs` with the buffered log lines.

use std::rc::Rc;

use futures::future::{FutureExt, LocalBoxFuture};
use tracing::{info, warn};

use crate::browser;
use crate::gitlab::{GitLabClient, GitLabConfig};
use crate::messages::{parse_message, FetchReply, IncomingMessage};

pub fn start() {
    start_with(GitLabConfig::default());
}

pub fn start_with(config: GitLabConfig) {
    let client = Rc::new(GitLabClient::new(config));
    info!("background worker ready, api {}", client.config().api_base);

    browser::on_runtime_message(Box::new(move |message| -> Option<LocalBoxFuture<'static, serde_json::Value>> {
        let request = match parse_message(&message) {
            Ok(IncomingMessage::FetchIssueDetails(request)) => request,
            Ok(IncomingMessage::RecentLogs) => {
                let lines = rolling_logger::recent_lines();
                return Some(async move { serde_json::json!({ "lines": lines }) }.boxed_local());
            }
            Ok(_) => return None,
            Err(e) => {
                warn!("malformed fetch request: {}", e);
                return Some(async move { reply_value(FetchReply::Failed { error: e.to_string() }) }.boxed_local());
            }
        };
        let client = Rc::clone(&client);
        Some(
            async move {
                let result = client.fetch_issue_details(&request).await;
                if let Err(e) = &result {
                    warn!("fetching children of issue {} failed: {}", request.issue, e);
                }
                reply_value(FetchReply::from(result))
            }
            .boxed_local(),
        )
    }));
}

fn reply_value(reply: FetchReply) -> serde_json::Value {
    serde_json::to_value(&reply).unwrap_or_else(|e| serde_json::json!({ "error": e.to_string() }))
}
