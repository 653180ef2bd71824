//! Keyword-based market categorization.
//!
//! Rules are evaluated in order and the first match wins, so the order of
//! [`CATEGORY_KEYWORDS`] is part of the behavior: election terms are checked
//! before general politics, sports before culture, climate and science last
//! among the substantive categories.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Market category label.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
pub enum Category {
    Elections,
    Politics,
    Sports,
    Crypto,
    Finance,
    Geopolitics,
    Earnings,
    Tech,
    Culture,
    World,
    Economy,
    #[serde(rename = "Climate & Science")]
    #[strum(serialize = "Climate & Science")]
    ClimateScience,
    Mentions,
    Other,
}

/// Ordered (label, vocabulary) rules. Matching is on whole words.
pub const CATEGORY_KEYWORDS: &[(Category, &[&str])] = &[
    (
        Category::Elections,
        &[
            "election", "elect", "vote", "voter", "trump", "biden", "senate", "congress",
            "governor", "presidential", "primary", "ballot", "poll",
        ],
    ),
    (
        Category::Politics,
        &[
            "politics", "political", "government", "policy", "legislation", "senator",
            "congressman", "partisan",
        ],
    ),
    (
        Category::Sports,
        &[
            "sport", "game", "match", "team", "player", "win", "lose", "score", "tournament",
            "championship", "league", "nfl", "nba", "mlb", "soccer", "football", "tennis",
            "golf", "olympic", "world cup", "nhl", "fifa", "champions league", "la liga",
            "bundesliga", "serie a", "premier league",
        ],
    ),
    (
        Category::Crypto,
        &[
            "crypto", "bitcoin", "ethereum", "blockchain", "coin", "token", "defi", "nft",
            "web3", "btc", "eth", "solana", "cardano", "polkadot",
        ],
    ),
    (
        Category::Finance,
        &[
            "stock", "market", "bond", "interest", "rate", "inflation", "fed",
            "federal reserve", "bank", "investment", "trading", "dividend", "ipo", "merger",
            "acquisition",
        ],
    ),
    (
        Category::Geopolitics,
        &[
            "war", "conflict", "military", "army", "nation", "country", "alliance", "treaty",
            "invasion", "sanction", "un", "nato", "russia", "ukraine", "israel", "iran",
            "china", "taiwan", "putin", "zelenskyy", "erdoğan", "xi", "foreign",
        ],
    ),
    (
        Category::Earnings,
        &[
            "earnings", "revenue", "profit", "loss", "quarterly", "annual", "fiscal",
            "guidance", "earnings call", "eps", "net income",
        ],
    ),
    (
        Category::Tech,
        &[
            "tech", "technology", "software", "hardware", "startup", "ai",
            "artificial intelligence", "app", "application", "platform", "internet", "cloud",
            "data", "computing", "processor", "chip", "semiconductor", "megaeth",
        ],
    ),
    (
        Category::Culture,
        &[
            "movie", "film", "music", "award", "oscar", "grammy", "artist", "celebrity", "tv",
            "television", "streaming", "netflix", "disney", "hollywood", "entertainment",
        ],
    ),
    (
        Category::World,
        &[
            "world", "global", "international", "worldwide", "embassy", "diplomat",
            "united nations",
        ],
    ),
    (
        Category::Economy,
        &[
            "economy", "economic", "gdp", "unemployment", "jobs", "labor", "wage", "consumer",
            "spending", "recession", "growth", "deflation", "stagflation", "tariff", "revenue",
            "tax",
        ],
    ),
    (
        Category::ClimateScience,
        &[
            "climate", "environment", "carbon", "emission", "global warming", "temperature",
            "weather", "hurricane", "earthquake", "disaster", "pollution", "green",
            "sustainability", "renewable",
        ],
    ),
    (
        Category::ClimateScience,
        &[
            "science", "research", "discovery", "space", "nasa", "rocket", "physics",
            "biology", "chemistry", "medicine", "vaccine", "disease", "virus", "pandemic",
        ],
    ),
    (Category::Mentions, &["mentions", "mentioned"]),
];

/// A compiled classification rule.
#[derive(Debug)]
pub struct CategoryRule {
    /// Label returned when the pattern matches.
    pub category: Category,
    /// Whole-word alternation over the rule's vocabulary.
    pub pattern: Regex,
}

/// Compiled rules, in evaluation order.
pub static CATEGORY_RULES: Lazy<Vec<CategoryRule>> = Lazy::new(|| {
    CATEGORY_KEYWORDS
        .iter()
        .map(|(category, keywords)| {
            let alternation = keywords
                .iter()
                .map(|k| regex::escape(k))
                .collect::<Vec<_>>()
                .join("|");
            CategoryRule {
                category: *category,
                pattern: Regex::new(&format!(r"\b(?:{})\b", alternation))
                    .expect("valid category regex"),
            }
        })
        .collect()
});

/// Classify a market from its question and optional event slug.
pub fn classify(question: &str, event_slug: Option<&str>) -> Category {
    let text = format!("{} {}", question, event_slug.unwrap_or("")).to_lowercase();

    CATEGORY_RULES
        .iter()
        .find(|rule| rule.pattern.is_match(&text))
        .map(|rule| rule.category)
        .unwrap_or(Category::Other)
}
