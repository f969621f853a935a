use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

use crate::error::Result;

/// Explicit feedback a user left on a single bot response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserAction {
    Like,
    Dislike,
}

impl UserAction {
    /// Parse the wire label. Anything other than `like`/`dislike` means no action.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "like" => Some(Self::Like),
            "dislike" => Some(Self::Dislike),
            _ => None,
        }
    }
}

fn deserialize_user_action<'de, D>(deserializer: D) -> std::result::Result<Option<UserAction>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(UserAction::parse))
}

/// One query/response exchange within a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default)]
    pub credits_used: f64,
    #[serde(default)]
    pub model_used: String,
    #[serde(default)]
    pub query: String,
    /// Seconds since the Unix epoch.
    pub timestamp: i64,
    #[serde(default)]
    pub tool_used: String,
    /// Cost in paise (minor currency unit).
    #[serde(default)]
    pub total_cost_inr: f64,
    #[serde(default, deserialize_with = "deserialize_user_action")]
    pub user_action: Option<UserAction>,
    #[serde(default)]
    pub user_review: Option<String>,
}

impl Message {
    pub fn new(query: impl Into<String>, timestamp: i64) -> Self {
        Self {
            credits_used: 0.0,
            model_used: String::new(),
            query: query.into(),
            timestamp,
            tool_used: String::new(),
            total_cost_inr: 0.0,
            user_action: None,
            user_review: None,
        }
    }

    pub fn with_tool(mut self, tool: impl Into<String>) -> Self {
        self.tool_used = tool.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model_used = model.into();
        self
    }

    pub fn with_credits(mut self, credits: f64) -> Self {
        self.credits_used = credits;
        self
    }

    pub fn with_cost(mut self, cost_inr: f64) -> Self {
        self.total_cost_inr = cost_inr;
        self
    }

    pub fn with_action(mut self, action: UserAction) -> Self {
        self.user_action = Some(action);
        self
    }

    pub fn with_review(mut self, review: impl Into<String>) -> Self {
        self.user_review = Some(review.into());
        self
    }

    pub fn is_liked(&self) -> bool {
        self.user_action == Some(UserAction::Like)
    }

    pub fn is_disliked(&self) -> bool {
        self.user_action == Some(UserAction::Dislike)
    }

    /// The review text, if one was left. Empty strings count as no review.
    pub fn review(&self) -> Option<&str> {
        self.user_review.as_deref().filter(|r| !r.is_empty())
    }
}

/// One user conversation with the bot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub session_id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub email_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub session_url: String,
    #[serde(rename = "ssoID", default, skip_serializing_if = "Option::is_none")]
    pub sso_id: Option<String>,
    pub created_at: i64,
    #[serde(default)]
    pub last_updated_at: i64,
    // Denormalized by the upstream service; not recomputed from `messages`.
    #[serde(default)]
    pub like_count: u32,
    #[serde(default)]
    pub dislike_count: u32,
    #[serde(default)]
    pub message_count: u32,
    #[serde(default)]
    pub review_count: u32,
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl Session {
    pub fn new(session_id: impl Into<String>, created_at: i64) -> Self {
        Self {
            session_id: session_id.into(),
            user_id: String::new(),
            email_id: String::new(),
            title: String::new(),
            session_url: String::new(),
            sso_id: None,
            created_at,
            last_updated_at: created_at,
            like_count: 0,
            dislike_count: 0,
            message_count: 0,
            review_count: 0,
            messages: Vec::new(),
        }
    }

    /// Replace the messages and refresh the denormalized counters from them.
    pub fn with_messages(mut self, messages: Vec<Message>) -> Self {
        self.message_count = messages.len() as u32;
        self.like_count = messages.iter().filter(|m| m.is_liked()).count() as u32;
        self.dislike_count = messages.iter().filter(|m| m.is_disliked()).count() as u32;
        self.review_count = messages.iter().filter(|m| m.review().is_some()).count() as u32;
        if let Some(last) = messages.last() {
            self.last_updated_at = last.timestamp;
        }
        self.messages = messages;
        self
    }

    pub fn has_likes(&self) -> bool {
        self.messages.iter().any(Message::is_liked)
    }

    pub fn has_dislikes(&self) -> bool {
        self.messages.iter().any(Message::is_disliked)
    }

    pub fn total_credits(&self) -> f64 {
        self.messages.iter().map(|m| m.credits_used).sum()
    }

    pub fn total_cost_inr(&self) -> f64 {
        self.messages.iter().map(|m| m.total_cost_inr).sum()
    }
}

/// Server-side filter criteria for the session-data query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disliked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_reviewed: Option<bool>,
}

impl Filters {
    /// Build id filters from comma-separated search inputs.
    pub fn from_search(user_ids: &str, session_ids: &str, email_ids: &str) -> Self {
        Self {
            user_ids: parse_id_list(user_ids),
            session_ids: parse_id_list(session_ids),
            email_ids: parse_id_list(email_ids),
            ..Self::default()
        }
    }

    /// Set the boolean filters. Unchecked flags are omitted rather than sent as `false`.
    pub fn with_flags(mut self, liked: bool, disliked: bool, reviewed: bool) -> Self {
        self.liked = liked.then_some(true);
        self.disliked = disliked.then_some(true);
        self.user_reviewed = reviewed.then_some(true);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Split a comma-separated id list, trimming entries and dropping blanks.
/// Returns `None` when the input holds no ids at all.
pub fn parse_id_list(input: &str) -> Option<Vec<String>> {
    if input.trim().is_empty() {
        return None;
    }
    let ids: Vec<String> = input
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(String::from)
        .collect();
    Some(ids)
}

/// Page request and page metadata. The optional fields are only filled in responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_more: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u32>,
}

impl Pagination {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page,
            page_size,
            has_more: None,
            total_count: None,
            total_pages: None,
        }
    }

    /// Whether this is the last page. An unknown page total counts as a single page.
    pub fn is_last_page(&self) -> bool {
        self.page >= self.total_pages.unwrap_or(1)
    }

    pub fn next_page(&self) -> Option<u32> {
        (!self.is_last_page()).then(|| self.page + 1)
    }

    pub fn previous_page(&self) -> Option<u32> {
        (self.page > 1).then(|| self.page - 1)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(1, 20)
    }
}

/// Body of `POST /session-data`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionDataRequest {
    pub filters: Filters,
    pub pagination: Pagination,
}

impl SessionDataRequest {
    pub fn new(filters: Filters, page: u32, page_size: u32) -> Self {
        Self {
            filters,
            pagination: Pagination::new(page, page_size),
        }
    }
}

/// One page of sessions plus the echoed filters and page metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionDataResponse {
    #[serde(default)]
    pub filters: Filters,
    pub pagination: Pagination,
    #[serde(default)]
    pub sessions: Vec<Session>,
}

/// Session data read from disk: either a bare session array or a saved response.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SessionPayload {
    Response(SessionDataResponse),
    Sessions(Vec<Session>),
}

impl SessionPayload {
    /// Read a JSON session export from disk.
    pub fn read_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn into_sessions(self) -> Vec<Session> {
        match self {
            Self::Response(response) => response.sessions,
            Self::Sessions(sessions) => sessions,
        }
    }
}
