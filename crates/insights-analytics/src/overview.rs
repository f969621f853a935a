//! Quick metrics for a single page of sessions, shown above the session list.

use insights_core::Session;
use serde::{Deserialize, Serialize};

/// Page-level metrics bar.
///
/// Unlike [`crate::aggregations::SessionEngagement`], liked and disliked
/// counts overlap here: a session with both likes and dislikes counts in both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOverview {
    pub total_sessions: u64,
    /// Sum of each session's reported `messageCount`.
    pub total_messages: u64,
    pub total_credits: f64,
    pub liked_sessions: u64,
    pub disliked_sessions: u64,
    pub average_messages: f64,
    pub average_credits: f64,
    pub engagement_rate: f64,
}

impl SessionOverview {
    /// Compute the overview, or `None` for an empty page.
    pub fn from_sessions(sessions: &[Session]) -> Option<Self> {
        if sessions.is_empty() {
            return None;
        }

        let total_sessions = sessions.len() as u64;
        let total_messages: u64 = sessions.iter().map(|s| s.message_count as u64).sum();
        let total_credits: f64 = sessions.iter().map(Session::total_credits).sum();
        let liked_sessions = sessions.iter().filter(|s| s.has_likes()).count() as u64;
        let disliked_sessions = sessions.iter().filter(|s| s.has_dislikes()).count() as u64;
        let count = total_sessions as f64;

        Some(Self {
            total_sessions,
            total_messages,
            total_credits,
            liked_sessions,
            disliked_sessions,
            average_messages: total_messages as f64 / count,
            average_credits: total_credits / count,
            engagement_rate: (liked_sessions + disliked_sessions) as f64 / count * 100.0,
        })
    }
}
