//! Core data model: the closed category set, raw candidates coming out of
//! source adapters, and the canonical article shape the store persists.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Closed set of site sections. Serialized by the Arabic label the UI shows,
/// so anything that round-trips through serde is guaranteed to be a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "سياسة")]
    Politics,
    #[serde(rename = "اقتصاد")]
    Economy,
    #[serde(rename = "محافظات")]
    Governorates,
    #[serde(rename = "ذكاء اصطناعي")]
    Ai,
    #[serde(rename = "تكنولوجيا")]
    Technology,
    #[serde(rename = "عسكرية")]
    Military,
    #[serde(rename = "عالم")]
    World,
    #[serde(rename = "رياضة")]
    Sports,
    #[serde(rename = "فنون")]
    Arts,
    #[serde(rename = "سيارات")]
    Cars,
    #[serde(rename = "علوم")]
    Science,
    #[serde(rename = "تعليم")]
    Education,
    #[serde(rename = "حوادث")]
    Accidents,
    #[serde(rename = "أخبار")]
    News,
}

impl Category {
    pub const ALL: [Category; 14] = [
        Category::Politics,
        Category::Economy,
        Category::Governorates,
        Category::Ai,
        Category::Technology,
        Category::Military,
        Category::World,
        Category::Sports,
        Category::Arts,
        Category::Cars,
        Category::Science,
        Category::Education,
        Category::Accidents,
        Category::News,
    ];

    /// The Arabic label, identical to the serde representation.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Politics => "سياسة",
            Category::Economy => "اقتصاد",
            Category::Governorates => "محافظات",
            Category::Ai => "ذكاء اصطناعي",
            Category::Technology => "تكنولوجيا",
            Category::Military => "عسكرية",
            Category::World => "عالم",
            Category::Sports => "رياضة",
            Category::Arts => "فنون",
            Category::Cars => "سيارات",
            Category::Science => "علوم",
            Category::Education => "تعليم",
            Category::Accidents => "حوادث",
            Category::News => "أخبار",
        }
    }

    /// Parse an external label into the closed set. Tolerates surrounding
    /// whitespace and a few English aliases external classifiers tend to emit.
    pub fn parse_label(s: &str) -> Option<Category> {
        let t = s.trim();
        for c in Category::ALL {
            if c.label() == t {
                return Some(c);
            }
        }
        match t.to_ascii_lowercase().as_str() {
            "politics" => Some(Category::Politics),
            "economy" | "business" => Some(Category::Economy),
            "governorates" | "local" => Some(Category::Governorates),
            "ai" | "artificial intelligence" => Some(Category::Ai),
            "technology" | "tech" => Some(Category::Technology),
            "military" => Some(Category::Military),
            "world" => Some(Category::World),
            "sports" | "sport" => Some(Category::Sports),
            "arts" | "culture" => Some(Category::Arts),
            "cars" | "automotive" => Some(Category::Cars),
            "science" => Some(Category::Science),
            "education" => Some(Category::Education),
            "accidents" => Some(Category::Accidents),
            "news" | "general" => Some(Category::News),
            _ => None,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A raw, not-yet-validated record produced by a source adapter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candidate {
    pub title: String,
    pub content: String,
    pub source: String,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub original_link: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
}

impl Candidate {
    pub fn new(title: impl Into<String>, content: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            source: source.into(),
            date: Utc::now(),
            category: None,
            image: None,
            original_link: None,
            video_url: None,
        }
    }
}

/// A fully processed article meeting all store invariants.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Article {
    pub id: String,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub category: Category,
    pub date: DateTime<Utc>,
    pub source: String,
    pub image: String,
    #[serde(default)]
    pub featured: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub reading_time: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_translated: Option<bool>,
}

/// Build a unique article id: ingestion timestamp plus a short digest suffix.
/// The suffix is derived from title+source, so re-ingesting the same item in
/// the same millisecond cannot collide with a different one.
pub fn make_article_id(title: &str, source: &str, at: DateTime<Utc>) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    hasher.update(b"\x1f");
    hasher.update(source.as_bytes());
    let digest = hasher.finalize();
    let mut suffix = String::with_capacity(6);
    for b in digest.iter().take(3) {
        use std::fmt::Write as _;
        let _ = write!(&mut suffix, "{:02x}", b);
    }
    format!("{}-{}", at.timestamp_millis(), suffix)
}
