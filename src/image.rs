//! Image assurance: every article leaves the pipeline with a usable image.
//!
//! The fallback chain is an explicit ordered list of extraction strategies,
//! each a pure function producing candidate URLs; a small combinator walks
//! them in order and keeps the first URL that passes validity plus an
//! optional reachability probe. The final tier is a curated per-category
//! pool and cannot fail.

use once_cell::sync::OnceCell;
use regex::Regex;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use crate::article::{Candidate, Category};

const PROBE_TIMEOUT: Duration = Duration::from_secs(4);

/// Substrings that mark a URL as a known-broken placeholder.
const PLACEHOLDER_MARKERS: &[&str] = &[
    "via.placeholder",
    "placehold.it",
    "placekitten",
    "no_image",
    "noimage",
    "spacer.gif",
    "1x1.",
];

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "avif"];

/// Hosts that serve images without an extension in the path.
const IMAGE_HOSTS: &[&str] = &[
    "images.unsplash.com",
    "i.imgur.com",
    "pbs.twimg.com",
    "upload.wikimedia.org",
    "lh3.googleusercontent.com",
];

/// Reachability probe for image URLs. A probe failure or timeout is treated
/// as "invalid", never as an error that stops the chain.
pub trait ImageProbe: Send + Sync {
    fn head_check<'a>(
        &'a self,
        url: &'a str,
        timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = bool> + Send + 'a>>;
}

pub type DynImageProbe = Arc<dyn ImageProbe>;

/// HEAD request with short connect/total timeouts.
pub struct HttpImageProbe {
    http: reqwest::Client,
}

impl HttpImageProbe {
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .user_agent("nashra-sync-engine/0.1")
            .connect_timeout(Duration::from_secs(2))
            .timeout(PROBE_TIMEOUT)
            .build()
            .expect("reqwest client");
        Self { http }
    }
}

impl Default for HttpImageProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageProbe for HttpImageProbe {
    fn head_check<'a>(
        &'a self,
        url: &'a str,
        timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = bool> + Send + 'a>> {
        Box::pin(async move {
            let fut = self.http.head(url).send();
            match tokio::time::timeout(timeout, fut).await {
                Ok(Ok(resp)) => resp.status().is_success(),
                _ => false,
            }
        })
    }
}

/// Accepts every URL; keeps unit tests and offline runs off the network.
pub struct OfflineImageProbe;

impl ImageProbe for OfflineImageProbe {
    fn head_check<'a>(
        &'a self,
        _url: &'a str,
        _timeout: Duration,
    ) -> Pin<Box<dyn Future<Output = bool> + Send + 'a>> {
        Box::pin(async { true })
    }
}

/// Syntactic validity: parses, http(s), and either a recognized image
/// extension or a known image host. Placeholder patterns never pass.
pub fn is_valid_image_url(raw: &str) -> bool {
    let lower = raw.to_ascii_lowercase();
    if PLACEHOLDER_MARKERS.iter().any(|m| lower.contains(m)) {
        return false;
    }
    let parsed = match url::Url::parse(raw) {
        Ok(u) => u,
        Err(_) => return false,
    };
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return false;
    }
    let Some(host) = parsed.host_str() else {
        return false;
    };
    if IMAGE_HOSTS.iter().any(|h| host.eq_ignore_ascii_case(h)) {
        return true;
    }
    let path = parsed.path().to_ascii_lowercase();
    IMAGE_EXTENSIONS
        .iter()
        .any(|ext| path.ends_with(&format!(".{ext}")))
}

/// One extraction tier: a pure function from the candidate to URLs, in
/// preference order.
type Strategy = fn(&Candidate) -> Vec<String>;

/// Tier 1: the image the adapter already attached (enclosure/thumbnail).
fn existing_image(candidate: &Candidate) -> Vec<String> {
    candidate.image.iter().cloned().collect()
}

/// Tier 2: og:image / twitter:image meta declarations in the raw body.
fn meta_images(candidate: &Candidate) -> Vec<String> {
    static RE_META: OnceCell<Regex> = OnceCell::new();
    let re = RE_META.get_or_init(|| {
        Regex::new(
            r#"(?is)<meta[^>]+(?:property|name)=["'](?:og:image|twitter:image)["'][^>]+content=["']([^"']+)["']"#,
        )
        .unwrap()
    });
    re.captures_iter(&candidate.content)
        .map(|c| c[1].to_string())
        .collect()
}

/// Tier 3: inline `<img>` references, best-scored first.
fn inline_images(candidate: &Candidate) -> Vec<String> {
    static RE_IMG: OnceCell<Regex> = OnceCell::new();
    let re = RE_IMG
        .get_or_init(|| Regex::new(r#"(?is)<img[^>]+src=["']([^"']+)["']"#).unwrap());
    let mut scored: Vec<(i32, String)> = re
        .captures_iter(&candidate.content)
        .map(|c| {
            let url = c[1].to_string();
            (score_inline(&url), url)
        })
        .filter(|(score, _)| *score > 0)
        .collect();
    scored.sort_by_key(|(score, _)| -score);
    scored.into_iter().map(|(_, url)| url).collect()
}

/// Heuristic: penalize obvious icons/avatars/trackers, reward size hints.
fn score_inline(url: &str) -> i32 {
    let lower = url.to_ascii_lowercase();
    let mut score = 10;
    for bad in ["icon", "logo", "avatar", "sprite", "pixel", "ads", "banner", "emoji"] {
        if lower.contains(bad) {
            score -= 10;
        }
    }
    static RE_DIM: OnceCell<Regex> = OnceCell::new();
    let re = RE_DIM.get_or_init(|| Regex::new(r"(\d{3,4})x(\d{3,4})").unwrap());
    if let Some(c) = re.captures(&lower) {
        let w: i32 = c[1].parse().unwrap_or(0);
        if w >= 600 {
            score += 5;
        } else if w < 200 {
            score -= 5;
        }
    }
    score
}

const STRATEGIES: &[Strategy] = &[existing_image, meta_images, inline_images];

pub struct ImageAssurance {
    probe: DynImageProbe,
    probe_timeout: Duration,
}

impl ImageAssurance {
    pub fn new(probe: DynImageProbe) -> Self {
        Self {
            probe,
            probe_timeout: PROBE_TIMEOUT,
        }
    }

    pub fn offline() -> Self {
        Self::new(Arc::new(OfflineImageProbe))
    }

    /// Walk the strategy tiers in order; the curated pool closes the chain,
    /// so the result is never empty.
    pub async fn ensure_image(&self, candidate: &Candidate, category: Category) -> String {
        for strategy in STRATEGIES {
            for url in strategy(candidate) {
                if !is_valid_image_url(&url) {
                    continue;
                }
                if self.probe.head_check(&url, self.probe_timeout).await {
                    return url;
                }
                tracing::debug!(url = %url, "image probe rejected candidate url");
            }
        }
        fallback_image(category, &candidate.title).to_string()
    }
}

/// Curated per-category pool. The pick is deterministic for a given title
/// but spread across the pool, so repeated fallbacks do not all share one
/// photo.
pub fn fallback_image(category: Category, seed: &str) -> &'static str {
    let pool = fallback_pool(category);
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    std::hash::Hash::hash(&seed, &mut hasher);
    let idx = (std::hash::Hasher::finish(&hasher) as usize) % pool.len();
    pool[idx]
}

pub fn fallback_pool(category: Category) -> &'static [&'static str] {
    match category {
        Category::Economy => &[
            "https://images.unsplash.com/photo-1611974789855-9c2a0a7236a3?w=1200&q=80",
            "https://images.unsplash.com/photo-1590283603385-17ffb3a7f29f?w=1200&q=80",
            "https://images.unsplash.com/photo-1554224155-6726b3ff858f?w=1200&q=80",
        ],
        Category::Politics => &[
            "https://images.unsplash.com/photo-1529107386315-e1a2ed48a620?w=1200&q=80",
            "https://images.unsplash.com/photo-1555848962-6e79363ec58f?w=1200&q=80",
        ],
        Category::Sports => &[
            "https://images.unsplash.com/photo-1461896836934-ffe607ba8211?w=1200&q=80",
            "https://images.unsplash.com/photo-1574629810360-7efbbe195018?w=1200&q=80",
            "https://images.unsplash.com/photo-1522778119026-d647f0596c20?w=1200&q=80",
        ],
        Category::Ai | Category::Technology => &[
            "https://images.unsplash.com/photo-1518770660439-4636190af475?w=1200&q=80",
            "https://images.unsplash.com/photo-1485827404703-89b55fcc595e?w=1200&q=80",
        ],
        Category::Military => &[
            "https://images.unsplash.com/photo-1508444845599-5c89863b1c44?w=1200&q=80",
        ],
        Category::World => &[
            "https://images.unsplash.com/photo-1451187580459-43490279c0fa?w=1200&q=80",
            "https://images.unsplash.com/photo-1526470498-9ae73c665de8?w=1200&q=80",
        ],
        Category::Arts => &[
            "https://images.unsplash.com/photo-1499364615650-ec38552f4f34?w=1200&q=80",
        ],
        Category::Cars => &[
            "https://images.unsplash.com/photo-1492144534655-ae79c964c9d7?w=1200&q=80",
        ],
        Category::Science => &[
            "https://images.unsplash.com/photo-1532094349884-543bc11b234d?w=1200&q=80",
        ],
        Category::Education => &[
            "https://images.unsplash.com/photo-1523050854058-8df90110c9f1?w=1200&q=80",
        ],
        Category::Accidents => &[
            "https://images.unsplash.com/photo-1557862921-37829c790f19?w=1200&q=80",
        ],
        _ => &[
            "https://images.unsplash.com/photo-1504711434969-e33886168f5c?w=1200&q=80",
            "https://images.unsplash.com/photo-1495020689067-958852a7765e?w=1200&q=80",
        ],
    }
}
