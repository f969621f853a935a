//! Terminal views for session listings: metrics bar, session cards, and paging footer.

use chrono::FixedOffset;
use insights_analytics::reports::format_credits;
use insights_analytics::SessionOverview;
use insights_core::config::DisplayConfig;
use insights_core::time::format_timestamp;
use insights_core::{Message, Pagination, Session, SessionDataResponse, UserAction};
use regex::{Captures, Regex};

/// Vendor prefixes shortened to an upper-case tag, e.g. "claude-3" -> "CLAUDE 3".
const MODEL_PREFIX_PATTERN: &str = r"(?i)^(gpt|gemini|claude)-?";

pub struct SessionRenderer {
    offset: FixedOffset,
    preview_messages: usize,
    show_all_messages: bool,
    model_prefix: Option<Regex>,
}

impl SessionRenderer {
    pub fn new(display: &DisplayConfig) -> Self {
        Self {
            offset: display.offset(),
            preview_messages: display.preview_messages,
            show_all_messages: false,
            model_prefix: Regex::new(MODEL_PREFIX_PATTERN).ok(),
        }
    }

    pub fn show_all_messages(mut self, show_all: bool) -> Self {
        self.show_all_messages = show_all;
        self
    }

    /// One listing page: metrics bar, session cards, and paging footer.
    pub fn listing(&self, response: &SessionDataResponse) -> String {
        let mut output = String::new();

        match SessionOverview::from_sessions(&response.sessions) {
            Some(overview) => {
                output.push_str(&self.overview_bar(&overview, &response.pagination));
                output.push_str("\n\n");
            }
            None => output.push_str("No sessions found for the current filters.\n\n"),
        }

        for session in &response.sessions {
            output.push_str(&self.session_card(session));
            output.push('\n');
        }

        output.push_str(&page_footer(&response.pagination));
        output
    }

    pub fn overview_bar(&self, overview: &SessionOverview, pagination: &Pagination) -> String {
        format!(
            "Sessions {} · Messages {} · Credits {} · Engaged {:.0}% · Liked {} · Disliked {} · Page {}/{} · {} total",
            overview.total_sessions,
            overview.total_messages,
            format_credits(overview.total_credits),
            overview.engagement_rate,
            overview.liked_sessions,
            overview.disliked_sessions,
            pagination.page,
            pagination.total_pages.unwrap_or(1),
            pagination.total_count.unwrap_or_default(),
        )
    }

    pub fn session_card(&self, session: &Session) -> String {
        let mut card = String::new();

        let title = if session.title.is_empty() {
            "(untitled)"
        } else {
            session.title.as_str()
        };
        card.push_str(&format!("{}\n", title));
        card.push_str(&format!(
            "  {} Likes · {} Dislikes · {} Messages · {} Credits · {}\n",
            session.like_count,
            session.dislike_count,
            session.message_count,
            format_credits(session.total_credits()),
            format_rupees(session.total_cost_inr()),
        ));

        let mut info = vec![
            format_timestamp(session.created_at, self.offset),
            session.email_id.clone(),
            format!("Session ID: {}", session.session_id),
            format!("User ID: {}", session.user_id),
        ];
        if let Some(sso) = &session.sso_id {
            info.push(format!("SSO: {}", sso));
        }
        card.push_str(&format!("  {}\n", info.join(" · ")));
        if !session.session_url.is_empty() {
            card.push_str(&format!("  View: {}\n", session.session_url));
        }

        let shown = if self.show_all_messages {
            session.messages.len()
        } else {
            self.preview_messages
        };
        for message in session.messages.iter().take(shown) {
            card.push_str(&self.message_row(message));
        }

        let hidden = (session.message_count as usize).saturating_sub(self.preview_messages);
        if !self.show_all_messages && hidden > 0 {
            card.push_str(&format!("  +{} more messages\n", hidden));
        }

        card
    }

    fn message_row(&self, message: &Message) -> String {
        let mut row = format!("  > {}\n", message.query);
        row.push_str(&format!(
            "    [{}] [{}] {} · {} credits · {}\n",
            tool_badge(&message.tool_used),
            self.model_display(&message.model_used),
            action_label(message.user_action),
            format_credits(message.credits_used),
            format_rupees(message.total_cost_inr),
        ));
        if let Some(review) = message.review() {
            row.push_str(&format!("    Review: {}\n", review));
        }
        row
    }

    /// Human-friendly model name.
    pub fn model_display(&self, model: &str) -> String {
        match model {
            "gpt-4.1-mini" => "GPT-4.1 Mini".to_string(),
            "gemini-2.5-pro" => "Gemini 2.5 Pro".to_string(),
            _ => match &self.model_prefix {
                Some(prefix) => prefix
                    .replace(model, |caps: &Captures| format!("{} ", caps[1].to_uppercase()))
                    .into_owned(),
                None => model.to_string(),
            },
        }
    }
}

/// "market_data" -> "MARKET DATA". Only the first underscore is replaced.
pub fn tool_badge(tool: &str) -> String {
    tool.replacen('_', " ", 1).to_uppercase()
}

pub fn action_label(action: Option<UserAction>) -> &'static str {
    match action {
        Some(UserAction::Like) => "LIKED",
        Some(UserAction::Dislike) => "DISLIKED",
        None => "NO ACTION",
    }
}

/// Paise to rupees with two decimals.
pub fn format_rupees(paise: f64) -> String {
    format!("₹{:.2}", paise / 100.0)
}

fn page_footer(pagination: &Pagination) -> String {
    let mut footer = format!(
        "Page {} of {}",
        pagination.page,
        pagination.total_pages.unwrap_or(1)
    );
    if let Some(prev) = pagination.previous_page() {
        footer.push_str(&format!(" · previous: --page {}", prev));
    }
    if let Some(next) = pagination.next_page() {
        footer.push_str(&format!(" · next: --page {}", next));
    }
    footer.push('\n');
    footer
}

#[cfg(test)]
mod tests {
    use super::*;
    use insights_core::Filters;

    fn renderer() -> SessionRenderer {
        SessionRenderer::new(&DisplayConfig::default())
    }

    fn sample_session() -> Session {
        let mut session = Session::new("s-1", 1_718_000_000).with_messages(vec![
            Message::new("nifty today", 1_718_000_000)
                .with_tool("market_data")
                .with_model("gpt-4.1-mini")
                .with_credits(4.0)
                .with_cost(120.0)
                .with_action(UserAction::Like)
                .with_review("great answer"),
            Message::new("top gainers", 1_718_000_100)
                .with_tool("screener")
                .with_model("gemini-2.5-pro")
                .with_credits(1.0)
                .with_cost(15.0),
            Message::new("thanks", 1_718_000_200)
                .with_tool("direct_response")
                .with_model("claude-3-haiku"),
        ]);
        session.title = "Nifty outlook".into();
        session.email_id = "trader@example.com".into();
        session.user_id = "u-1".into();
        session.sso_id = Some("sso-9".into());
        session.session_url = "https://example.com/s-1".into();
        session
    }

    #[test]
    fn test_session_card() {
        let card = renderer().session_card(&sample_session());
        assert!(card.starts_with("Nifty outlook\n"));
        assert!(card.contains("1 Likes · 0 Dislikes · 3 Messages · 5 Credits · ₹1.35"));
        assert!(card.contains(
            "Jun 10, 2024 06:13 · trader@example.com · Session ID: s-1 · User ID: u-1 · SSO: sso-9"
        ));
        assert!(card.contains("View: https://example.com/s-1"));
        assert!(card.contains("[MARKET DATA] [GPT-4.1 Mini] LIKED · 4 credits · ₹1.20"));
        assert!(card.contains("Review: great answer"));
        assert!(card.contains("[SCREENER] [Gemini 2.5 Pro] NO ACTION"));
        assert!(!card.contains("> thanks"));
        assert!(card.contains("+1 more messages"));
    }

    #[test]
    fn test_session_card_all_messages() {
        let card = renderer()
            .show_all_messages(true)
            .session_card(&sample_session());
        assert!(card.contains("> thanks"));
        assert!(card.contains("[DIRECT RESPONSE] [CLAUDE 3-haiku]"));
        assert!(!card.contains("more messages"));
    }

    #[test]
    fn test_model_display() {
        let r = renderer();
        assert_eq!(r.model_display("gpt-4.1-mini"), "GPT-4.1 Mini");
        assert_eq!(r.model_display("gpt-4o"), "GPT 4o");
        assert_eq!(r.model_display("Gemini-flash"), "GEMINI flash");
        assert_eq!(r.model_display("llama3"), "llama3");
    }

    #[test]
    fn test_badges_and_money() {
        assert_eq!(tool_badge("market_data"), "MARKET DATA");
        assert_eq!(tool_badge("a_b_c"), "A B_C");
        assert_eq!(action_label(Some(UserAction::Dislike)), "DISLIKED");
        assert_eq!(action_label(None), "NO ACTION");
        assert_eq!(format_rupees(1234.0), "₹12.34");
    }

    #[test]
    fn test_listing_with_paging() {
        let mut pagination = Pagination::new(2, 20);
        pagination.total_pages = Some(3);
        pagination.total_count = Some(45);
        let response = SessionDataResponse {
            filters: Filters::default(),
            pagination,
            sessions: vec![sample_session()],
        };

        let listing = renderer().listing(&response);
        assert!(listing.contains("Sessions 1 · Messages 3 · Credits 5 · Engaged 100% · Liked 1 · Disliked 0 · Page 2/3 · 45 total"));
        assert!(listing.contains("Nifty outlook"));
        assert!(listing.ends_with("Page 2 of 3 · previous: --page 1 · next: --page 3\n"));
    }

    #[test]
    fn test_empty_listing() {
        let response = SessionDataResponse {
            filters: Filters::default(),
            pagination: Pagination::new(1, 20),
            sessions: vec![],
        };
        let listing = renderer().listing(&response);
        assert!(listing.contains("No sessions found"));
        assert!(listing.ends_with("Page 1 of 1\n"));
    }
}
