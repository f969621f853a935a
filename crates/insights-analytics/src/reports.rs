//! Markdown and plain-text rendering of analytics summaries.

use crate::aggregations::AnalyticsSummary;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Report generator for analytics summaries.
pub struct ReportGenerator;

impl ReportGenerator {
    /// Full markdown report. `top_queries` caps the ranked query list.
    pub fn markdown_report(summary: &AnalyticsSummary, top_queries: usize) -> String {
        let mut report = String::new();

        report.push_str("# Session Analytics\n\n");

        // Overview.
        report.push_str("## Key Metrics\n\n");
        report.push_str(&format!("- **Sessions:** {}\n", summary.total_sessions));
        report.push_str(&format!("- **Messages:** {}\n", summary.total_messages));
        report.push_str(&format!(
            "- **Credits Used:** {}\n",
            format_credits(summary.total_credits_used)
        ));
        report.push_str(&format!(
            "- **Avg Messages / Session:** {:.1}\n",
            summary.average_messages_per_session
        ));
        report.push_str(&format!(
            "- **Avg Credits / Session:** {:.1}\n",
            summary.average_credits_per_session
        ));
        report.push_str(&format!(
            "- **Engagement Rate:** {}\n\n",
            format_percent(summary.session_engagement.engagement_rate)
        ));

        let engagement = &summary.session_engagement;
        report.push_str("## Session Engagement\n\n");
        report.push_str("| Liked | Disliked | Neutral |\n");
        report.push_str("|-------|----------|---------|\n");
        report.push_str(&format!(
            "| {} | {} | {} |\n\n",
            engagement.liked_sessions, engagement.disliked_sessions, engagement.neutral_sessions
        ));

        let actions = &summary.user_action_breakdown;
        let share = |n: u64| percent_of(n, summary.total_messages);
        report.push_str("## User Actions\n\n");
        report.push_str(&format!(
            "- **Likes:** {} ({})\n",
            actions.likes,
            share(actions.likes)
        ));
        report.push_str(&format!(
            "- **Dislikes:** {} ({})\n",
            actions.dislikes,
            share(actions.dislikes)
        ));
        report.push_str(&format!(
            "- **No Action:** {} ({})\n\n",
            actions.no_action,
            share(actions.no_action)
        ));

        if !summary.tool_efficiency.is_empty() {
            report.push_str("## Tool Efficiency\n\n");
            report.push_str("| Tool | Usage | Avg Credits | Success Rate | Total Credits |\n");
            report.push_str("|------|-------|-------------|--------------|---------------|\n");
            for (tool, usage) in ranked(&summary.tool_usage_breakdown) {
                let Some(efficiency) = summary.tool_efficiency.get(tool) else {
                    continue;
                };
                let credits = summary
                    .credits_usage_by_tool
                    .get(tool)
                    .copied()
                    .unwrap_or_default();
                report.push_str(&format!(
                    "| {} | {} | {:.1} | {} | {} |\n",
                    display_label(tool),
                    usage,
                    efficiency.average_credits,
                    format_percent(efficiency.success_rate),
                    format_credits(credits),
                ));
            }
            report.push('\n');
        }

        if !summary.model_usage_breakdown.is_empty() {
            report.push_str("## Model Usage\n\n");
            for (model, count) in ranked(&summary.model_usage_breakdown) {
                report.push_str(&format!(
                    "- `{}` - {} messages ({})\n",
                    display_label(model),
                    count,
                    share(count)
                ));
            }
            report.push('\n');
        }

        if !summary.daily_sessions_data.is_empty() {
            report.push_str("## Daily Activity\n\n");
            report.push_str("| Day | Sessions |\n");
            report.push_str("|-----|----------|\n");
            for (day, count) in summary.daily_sessions_data.iter() {
                report.push_str(&format!("| {} | {} |\n", day, count));
            }
            report.push('\n');
        }

        if !summary.hourly_distribution.is_empty() {
            report.push_str("## Hourly Distribution\n\n");
            report.push_str("| Hour | Messages |\n");
            report.push_str("|------|----------|\n");
            for (hour, count) in summary.hourly_distribution.iter() {
                report.push_str(&format!("| {} | {} |\n", hour, count));
            }
            report.push('\n');
        }

        if summary.total_sessions > 0 {
            report.push_str("## Session Length\n\n");
            report.push_str("| Length | Sessions |\n");
            report.push_str("|--------|----------|\n");
            for (bucket, count) in summary.session_length_distribution.iter() {
                report.push_str(&format!("| {} | {} |\n", bucket, count));
            }
            report.push('\n');
        }

        let sentiment = &summary.review_sentiment;
        if sentiment.total() > 0 {
            report.push_str("## Review Sentiment\n\n");
            report.push_str(&format!("- **Positive:** {}\n", sentiment.positive));
            report.push_str(&format!("- **Negative:** {}\n", sentiment.negative));
            report.push_str(&format!("- **Neutral:** {}\n\n", sentiment.neutral));
        }

        if !summary.top_queries.is_empty() && top_queries > 0 {
            report.push_str("## Top Queries\n\n");
            for (i, q) in summary.top_queries.iter().take(top_queries).enumerate() {
                report.push_str(&format!("{}. \"{}\" - {} times\n", i + 1, q.query, q.count));
            }
            report.push('\n');
        }

        report
    }

    /// Compact summary for terminal output.
    pub fn text_summary(summary: &AnalyticsSummary) -> String {
        if summary.total_sessions == 0 {
            return "  No sessions found\n".to_string();
        }

        let mut output = String::new();
        output.push_str(&format!(
            "  Sessions: {}  Messages: {}  Credits: {}\n",
            summary.total_sessions,
            summary.total_messages,
            format_credits(summary.total_credits_used)
        ));
        output.push_str(&format!(
            "  Engagement: {}  Liked: {}  Disliked: {}  Neutral: {}\n",
            format_percent(summary.session_engagement.engagement_rate),
            summary.session_engagement.liked_sessions,
            summary.session_engagement.disliked_sessions,
            summary.session_engagement.neutral_sessions,
        ));

        let tools = ranked(&summary.tool_usage_breakdown);
        if !tools.is_empty() {
            output.push_str("  Top tools:");
            for (tool, count) in tools.iter().take(5) {
                output.push_str(&format!(" {}({})", tool, count));
            }
            output.push('\n');
        }

        if let Some((hour, count)) = summary
            .hourly_distribution
            .iter()
            .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))
        {
            output.push_str(&format!("  Busiest hour: {} ({} messages)\n", hour, count));
        }

        output
    }
}

/// Entries sorted by value, largest first; ties keep key order.
fn ranked<V: Copy + PartialOrd>(map: &BTreeMap<String, V>) -> Vec<(&str, V)> {
    let mut entries: Vec<(&str, V)> = map.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    entries.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    entries
}

/// Blank category labels come from records with no tool/model attribution.
fn display_label(label: &str) -> &str {
    if label.is_empty() {
        "(none)"
    } else {
        label
    }
}

fn percent_of(part: u64, whole: u64) -> String {
    if whole == 0 {
        format_percent(0.0)
    } else {
        format_percent(part as f64 / whole as f64 * 100.0)
    }
}

/// Percentage with one decimal place.
pub fn format_percent(value: f64) -> String {
    format!("{:.1}%", value)
}

/// Credits are usually whole numbers; show decimals only when present.
pub fn format_credits(credits: f64) -> String {
    if credits.fract() == 0.0 {
        format!("{:.0}", credits)
    } else {
        format!("{:.2}", credits)
    }
}
