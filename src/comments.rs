use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    config::CommentsConfig,
    directory::LOCATIONS,
    traits::{Clock, DocumentStore},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub user: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// Rejections for a comment a user tried to post.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommentError {
    #[error("comment is empty")]
    Empty,
    #[error("comment is {len} characters, limit is {max}")]
    TooLong { len: usize, max: usize },
}

/// Sub-collection holding a building's comments.
pub fn comments_collection(building_id: &str) -> String {
    format!("{LOCATIONS}/{building_id}/comments")
}

/// Posting settings; defaults match the app's anonymous comments.
#[derive(Debug, Clone)]
pub struct CommentPolicy {
    pub default_user: String,
    pub max_length: usize,
}

impl Default for CommentPolicy {
    fn default() -> Self {
        Self {
            default_user: "Anonymous".to_string(),
            max_length: 500,
        }
    }
}

impl From<&CommentsConfig> for CommentPolicy {
    fn from(config: &CommentsConfig) -> Self {
        Self {
            default_user: config.default_user.clone(),
            max_length: config.max_length,
        }
    }
}

impl CommentPolicy {
    /// Trim and check a draft, returning the text to store.
    pub fn validate<'a>(&self, text: &'a str) -> Result<&'a str, CommentError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(CommentError::Empty);
        }
        let len = text.chars().count();
        if len > self.max_length {
            return Err(CommentError::TooLong {
                len,
                max: self.max_length,
            });
        }
        Ok(text)
    }
}

/// Post a comment on a building and return the new comment's id.
pub fn post_comment<S, C>(
    store: &S,
    clock: &C,
    policy: &CommentPolicy,
    building_id: &str,
    user: Option<&str>,
    text: &str,
) -> Result<String>
where
    S: DocumentStore + ?Sized,
    C: Clock + ?Sized,
{
    let text = policy.validate(text)?;
    let user = user
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .unwrap_or(policy.default_user.as_str());

    let comment = Comment {
        user: user.to_string(),
        text: text.to_string(),
        timestamp: clock.now_utc(),
    };
    let record = serde_json::to_value(&comment).context("Failed to serialize comment")?;
    let id = store
        .add(&comments_collection(building_id), record)
        .with_context(|| format!("Failed to post comment on building {building_id}"))?;

    tracing::info!(building_id, comment_id = %id, "Posted comment");
    Ok(id)
}

/// A building's comments, newest first. Unreadable entries are skipped.
pub fn list_comments<S: DocumentStore + ?Sized>(store: &S, building_id: &str) -> Result<Vec<Comment>> {
    let docs = store
        .list(&comments_collection(building_id))
        .with_context(|| format!("Failed to read comments for building {building_id}"))?;

    let mut comments: Vec<Comment> = docs
        .into_iter()
        .filter_map(|doc| match serde_json::from_value(doc.data) {
            Ok(comment) => Some(comment),
            Err(e) => {
                tracing::warn!(comment_id = %doc.id, "Skipping comment: {}", e);
                None
            }
        })
        .collect();
    comments.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    Ok(comments)
}
