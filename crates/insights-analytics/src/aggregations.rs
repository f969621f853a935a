//! Session analytics aggregation.
//!
//! Folds a batch of sessions (and their flattened messages) into a single
//! [`AnalyticsSummary`]: totals, engagement, per-tool efficiency, model
//! usage, time-bucketed histograms, review sentiment, and top queries.

use chrono::{Datelike, FixedOffset, NaiveDate, Timelike};
use insights_core::time::{at_offset, utc_offset};
use insights_core::{Message, Session};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Number of ranked queries kept in a summary.
pub const TOP_QUERIES_LIMIT: usize = 10;

/// Fixed, ordered session-length buckets.
pub const SESSION_LENGTH_BUCKETS: [&str; 4] =
    ["1 message", "2-3 messages", "4-5 messages", "6+ messages"];

const POSITIVE_KEYWORDS: [&str; 4] = ["good", "great", "excellent", "perfect"];
const NEGATIVE_KEYWORDS: [&str; 4] = ["bad", "poor", "not good", "terrible"];

/// Message-level feedback tally.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserActionBreakdown {
    pub likes: u64,
    pub dislikes: u64,
    pub no_action: u64,
}

/// Session-level feedback classification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionEngagement {
    pub liked_sessions: u64,
    pub disliked_sessions: u64,
    /// Sessions with no feedback, or with both likes and dislikes.
    pub neutral_sessions: u64,
    /// Percentage (0..100) of sessions that are liked or disliked.
    pub engagement_rate: f64,
}

/// Per-tool usage and outcome.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolEfficiency {
    pub usage: u64,
    pub average_credits: f64,
    /// Percentage (0..100) of the tool's messages that were liked.
    pub success_rate: f64,
}

/// Parallel label/count sequences, ready for a chart axis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub labels: Vec<String>,
    pub data: Vec<u64>,
}

impl Series {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Count for a label, if present.
    pub fn get(&self, label: &str) -> Option<u64> {
        self.labels
            .iter()
            .position(|l| l == label)
            .and_then(|i| self.data.get(i).copied())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.labels
            .iter()
            .map(String::as_str)
            .zip(self.data.iter().copied())
    }

    fn from_pairs(pairs: impl IntoIterator<Item = (String, u64)>) -> Self {
        let (labels, data) = pairs.into_iter().unzip();
        Self { labels, data }
    }
}

/// Review sentiment classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

/// Classify a free-text review by case-insensitive substring match.
/// Positive keywords win over negative ones.
pub fn classify_review(review: &str) -> Sentiment {
    let review = review.to_lowercase();
    if POSITIVE_KEYWORDS.iter().any(|k| review.contains(k)) {
        Sentiment::Positive
    } else if NEGATIVE_KEYWORDS.iter().any(|k| review.contains(k)) {
        Sentiment::Negative
    } else {
        Sentiment::Neutral
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewSentiment {
    pub positive: u64,
    pub negative: u64,
    pub neutral: u64,
}

impl ReviewSentiment {
    pub fn total(&self) -> u64 {
        self.positive + self.negative + self.neutral
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryCount {
    pub query: String,
    pub count: u64,
}

/// Bucket label for a session's reported message count.
pub fn session_length_bucket(message_count: u32) -> &'static str {
    // A count of zero falls through to the 2-3 bucket.
    match message_count {
        1 => SESSION_LENGTH_BUCKETS[0],
        0..=3 => SESSION_LENGTH_BUCKETS[1],
        4..=5 => SESSION_LENGTH_BUCKETS[2],
        _ => SESSION_LENGTH_BUCKETS[3],
    }
}

/// Aggregate analytics over a batch of sessions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub total_sessions: u64,
    pub total_messages: u64,
    pub total_credits_used: f64,
    pub average_messages_per_session: f64,
    pub average_credits_per_session: f64,
    pub user_action_breakdown: UserActionBreakdown,
    pub session_engagement: SessionEngagement,
    pub tool_usage_breakdown: BTreeMap<String, u64>,
    pub tool_efficiency: BTreeMap<String, ToolEfficiency>,
    pub model_usage_breakdown: BTreeMap<String, u64>,
    pub daily_sessions_data: Series,
    pub credits_usage_by_tool: BTreeMap<String, f64>,
    pub session_length_distribution: Series,
    pub review_sentiment: ReviewSentiment,
    pub hourly_distribution: Series,
    pub top_queries: Vec<QueryCount>,
}

/// Running totals for one tool label.
#[derive(Debug, Default)]
struct ToolTally {
    usage: u64,
    credits: f64,
    likes: u64,
}

/// Computes [`AnalyticsSummary`] values. Holds only presentation settings,
/// so one instance can be shared freely.
#[derive(Debug, Clone)]
pub struct Aggregator {
    /// Offset used to derive calendar days and hours from epoch seconds.
    offset: FixedOffset,
    top_queries: usize,
}

impl Aggregator {
    pub fn new(offset: FixedOffset) -> Self {
        Self {
            offset,
            top_queries: TOP_QUERIES_LIMIT,
        }
    }

    pub fn with_top_queries(mut self, limit: usize) -> Self {
        self.top_queries = limit;
        self
    }

    /// Aggregate a batch of sessions. Never fails; empty input yields zeroed totals
    /// and empty breakdowns.
    pub fn aggregate(&self, sessions: &[Session]) -> AnalyticsSummary {
        let messages: Vec<&Message> = sessions.iter().flat_map(|s| s.messages.iter()).collect();

        let total_sessions = sessions.len() as u64;
        let total_messages = messages.len() as u64;
        let total_credits_used: f64 = messages.iter().map(|m| m.credits_used).sum();

        let tools = tool_tallies(&messages);

        let summary = AnalyticsSummary {
            total_sessions,
            total_messages,
            total_credits_used,
            average_messages_per_session: ratio(total_messages as f64, total_sessions),
            average_credits_per_session: ratio(total_credits_used, total_sessions),
            user_action_breakdown: user_actions(&messages),
            session_engagement: session_engagement(sessions),
            tool_usage_breakdown: tools
                .iter()
                .map(|(tool, t)| (tool.clone(), t.usage))
                .collect(),
            tool_efficiency: tools
                .iter()
                .map(|(tool, t)| {
                    let efficiency = ToolEfficiency {
                        usage: t.usage,
                        average_credits: ratio(t.credits, t.usage),
                        success_rate: ratio(t.likes as f64, t.usage) * 100.0,
                    };
                    (tool.clone(), efficiency)
                })
                .collect(),
            model_usage_breakdown: count_by(&messages, |m| m.model_used.as_str()),
            daily_sessions_data: self.daily_sessions(sessions),
            credits_usage_by_tool: tools
                .iter()
                .map(|(tool, t)| (tool.clone(), t.credits))
                .collect(),
            session_length_distribution: session_lengths(sessions),
            review_sentiment: review_sentiment(&messages),
            hourly_distribution: self.hourly_distribution(&messages),
            top_queries: top_queries(&messages, self.top_queries),
        };

        tracing::debug!(
            sessions = total_sessions,
            messages = total_messages,
            tools = summary.tool_usage_breakdown.len(),
            "Aggregated session analytics"
        );

        summary
    }

    /// Sessions per creation day, ordered by date. Labels read "Jan 05". When the
    /// batch spans more than one year every label switches to "Jan 05, 2024", so
    /// the same day in different years never shares a label.
    fn daily_sessions(&self, sessions: &[Session]) -> Series {
        let mut by_day: BTreeMap<NaiveDate, u64> = BTreeMap::new();
        for session in sessions {
            let day = at_offset(session.created_at, self.offset).date_naive();
            *by_day.entry(day).or_insert(0) += 1;
        }

        let spans_years = match (by_day.keys().next(), by_day.keys().next_back()) {
            (Some(first), Some(last)) => first.year() != last.year(),
            _ => false,
        };
        let format = if spans_years { "%b %d, %Y" } else { "%b %d" };

        Series::from_pairs(
            by_day
                .into_iter()
                .map(|(day, count)| (day.format(format).to_string(), count)),
        )
    }

    /// Messages per hour of day ("00:00".."23:00"); dates collapse.
    fn hourly_distribution(&self, messages: &[&Message]) -> Series {
        let mut by_hour: BTreeMap<u32, u64> = BTreeMap::new();
        for msg in messages {
            let hour = at_offset(msg.timestamp, self.offset).hour();
            *by_hour.entry(hour).or_insert(0) += 1;
        }

        Series::from_pairs(
            by_hour
                .into_iter()
                .map(|(hour, count)| (format!("{:02}:00", hour), count)),
        )
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(utc_offset())
    }
}

/// Aggregate with UTC buckets and the default top-query limit.
pub fn process_session_data(sessions: &[Session]) -> AnalyticsSummary {
    Aggregator::default().aggregate(sessions)
}

/// `numerator / denominator`, or 0 when the denominator is 0.
fn ratio(numerator: f64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator / denominator as f64
    }
}

fn user_actions(messages: &[&Message]) -> UserActionBreakdown {
    let mut breakdown = UserActionBreakdown::default();
    for msg in messages {
        if msg.is_liked() {
            breakdown.likes += 1;
        } else if msg.is_disliked() {
            breakdown.dislikes += 1;
        } else {
            breakdown.no_action += 1;
        }
    }
    breakdown
}

fn session_engagement(sessions: &[Session]) -> SessionEngagement {
    let mut engagement = SessionEngagement::default();
    for session in sessions {
        match (session.has_likes(), session.has_dislikes()) {
            (true, false) => engagement.liked_sessions += 1,
            (false, true) => engagement.disliked_sessions += 1,
            _ => engagement.neutral_sessions += 1,
        }
    }
    let engaged = engagement.liked_sessions + engagement.disliked_sessions;
    engagement.engagement_rate = ratio(engaged as f64, sessions.len() as u64) * 100.0;
    engagement
}

fn tool_tallies(messages: &[&Message]) -> BTreeMap<String, ToolTally> {
    let mut tools: BTreeMap<String, ToolTally> = BTreeMap::new();
    for msg in messages {
        let tally = tools.entry(msg.tool_used.clone()).or_default();
        tally.usage += 1;
        tally.credits += msg.credits_used;
        if msg.is_liked() {
            tally.likes += 1;
        }
    }
    tools
}

fn count_by<'a>(
    messages: &[&'a Message],
    key: impl Fn(&'a Message) -> &'a str,
) -> BTreeMap<String, u64> {
    let mut counts = BTreeMap::new();
    for msg in messages {
        *counts.entry(key(*msg).to_string()).or_insert(0) += 1;
    }
    counts
}

/// All four buckets, in order, including empty ones.
fn session_lengths(sessions: &[Session]) -> Series {
    let mut counts = [0u64; SESSION_LENGTH_BUCKETS.len()];
    for session in sessions {
        let bucket = session_length_bucket(session.message_count);
        if let Some(i) = SESSION_LENGTH_BUCKETS.iter().position(|b| *b == bucket) {
            counts[i] += 1;
        }
    }
    Series::from_pairs(
        SESSION_LENGTH_BUCKETS
            .iter()
            .map(|b| b.to_string())
            .zip(counts),
    )
}

fn review_sentiment(messages: &[&Message]) -> ReviewSentiment {
    let mut sentiment = ReviewSentiment::default();
    for review in messages.iter().filter_map(|m| m.review()) {
        match classify_review(review) {
            Sentiment::Positive => sentiment.positive += 1,
            Sentiment::Negative => sentiment.negative += 1,
            Sentiment::Neutral => sentiment.neutral += 1,
        }
    }
    sentiment
}

/// Exact-text query ranking. Ties keep first-occurrence order.
fn top_queries(messages: &[&Message], limit: usize) -> Vec<QueryCount> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(&str, u64)> = Vec::new();
    for msg in messages {
        let query = msg.query.as_str();
        match index.get(query) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(query, counts.len());
                counts.push((query, 1));
            }
        }
    }

    // Stable sort keeps first-occurrence order among equal counts.
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(limit);
    counts
        .into_iter()
        .map(|(query, count)| QueryCount {
            query: query.to_string(),
            count,
        })
        .collect()
}
