//! Content enrichment: title cleanup, body rewrite (external capability with
//! a templated fallback), excerpt derivation, tag extraction, reading time.
//!
//! The fallback path never fabricates facts: it keeps every original
//! sentence verbatim and only frames the text with one category-appropriate
//! opening clause and one closing clause.

use once_cell::sync::OnceCell;
use regex::Regex;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::article::{Candidate, Category};
use crate::classify::rules::RuleSet;

pub const EXCERPT_MAX_CHARS: usize = 150;
pub const WORDS_PER_MINUTE: usize = 200;
pub const MAX_TAGS: usize = 5;
const MIN_TITLE_CHARS: usize = 10;

/// External rewrite capability. `None` (or an unusably short answer) sends
/// the pipeline down the template fallback.
pub trait RewriteProvider: Send + Sync {
    fn rewrite<'a>(
        &'a self,
        text: &'a str,
        category: Category,
        source: &'a str,
        tone: &'a str,
    ) -> Pin<Box<dyn Future<Output = Option<String>> + Send + 'a>>;
    fn name(&self) -> &'static str;
}

pub type DynRewriteProvider = Arc<dyn RewriteProvider>;

/// Always answers `None`; used when no rewrite capability is configured.
pub struct DisabledRewriteProvider;

impl RewriteProvider for DisabledRewriteProvider {
    fn rewrite<'a>(
        &'a self,
        _text: &'a str,
        _category: Category,
        _source: &'a str,
        _tone: &'a str,
    ) -> Pin<Box<dyn Future<Output = Option<String>> + Send + 'a>> {
        Box::pin(async { None })
    }
    fn name(&self) -> &'static str {
        "disabled"
    }
}

/// Remote rewrite service speaking a small JSON contract. Requires
/// `REWRITE_API_URL` (and optionally `REWRITE_API_KEY`); any transport or
/// decode problem resolves to `None` so the caller falls back.
pub struct HttpRewriteProvider {
    http: reqwest::Client,
    url: String,
    api_key: String,
}

impl HttpRewriteProvider {
    pub fn from_env() -> Option<Self> {
        let url = std::env::var("REWRITE_API_URL").ok()?;
        let api_key = std::env::var("REWRITE_API_KEY").unwrap_or_default();
        let http = reqwest::Client::builder()
            .user_agent("nashra-sync-engine/0.1")
            .connect_timeout(std::time::Duration::from_secs(4))
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("reqwest client");
        Some(Self { http, url, api_key })
    }
}

impl RewriteProvider for HttpRewriteProvider {
    fn rewrite<'a>(
        &'a self,
        text: &'a str,
        category: Category,
        source: &'a str,
        tone: &'a str,
    ) -> Pin<Box<dyn Future<Output = Option<String>> + Send + 'a>> {
        Box::pin(async move {
            #[derive(serde::Serialize)]
            struct Req<'a> {
                text: &'a str,
                category: &'a str,
                source: &'a str,
                tone: &'a str,
            }
            #[derive(serde::Deserialize)]
            struct Resp {
                text: String,
            }

            let req = Req {
                text,
                category: category.label(),
                source,
                tone,
            };
            let mut call = self.http.post(&self.url).json(&req);
            if !self.api_key.is_empty() {
                call = call.bearer_auth(&self.api_key);
            }
            let resp = call.send().await.ok()?;
            if !resp.status().is_success() {
                return None;
            }
            let body: Resp = resp.json().await.ok()?;
            let out = body.text.trim().to_string();
            if out.is_empty() {
                None
            } else {
                Some(out)
            }
        })
    }
    fn name(&self) -> &'static str {
        "http"
    }
}

/// Result of enriching one candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct Enriched {
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub tags: Vec<String>,
    pub reading_time: u32,
}

pub struct Enricher {
    provider: DynRewriteProvider,
    tone: String,
}

impl Enricher {
    pub fn new(provider: DynRewriteProvider, tone: impl Into<String>) -> Self {
        Self {
            provider,
            tone: tone.into(),
        }
    }

    /// Template-only enricher.
    pub fn offline() -> Self {
        Self::new(Arc::new(DisabledRewriteProvider), "خبري")
    }

    pub async fn enrich(&self, candidate: &Candidate, category: Category, rules: &RuleSet) -> Enriched {
        let title = clean_title(&candidate.title, &candidate.source);

        let content = match self
            .provider
            .rewrite(&candidate.content, category, &candidate.source, &self.tone)
            .await
        {
            Some(rewritten) if rewritten.trim().len() >= candidate.content.trim().len() / 2 => {
                rewritten
            }
            _ => template_fallback(&candidate.content, category),
        };

        let excerpt = derive_excerpt(&content, EXCERPT_MAX_CHARS);
        let tags = extract_tags(&title, &content, category, rules);
        let reading_time = reading_time_minutes(&content);

        Enriched {
            title,
            content,
            excerpt,
            tags,
            reading_time,
        }
    }
}

/// Strip embedded timestamps/dates and known boilerplate, collapse
/// whitespace. A result shorter than ten characters falls back to the
/// stripped original so we never ship a gutted title.
pub fn clean_title(raw: &str, source: &str) -> String {
    static RE_DATE: OnceCell<Regex> = OnceCell::new();
    static RE_TIME: OnceCell<Regex> = OnceCell::new();
    static RE_PREFIX: OnceCell<Regex> = OnceCell::new();

    let stripped = strip_markup(raw);

    let re_date = RE_DATE.get_or_init(|| {
        Regex::new(r"\b(\d{4}-\d{2}-\d{2}|\d{1,2}[/.-]\d{1,2}[/.-]\d{2,4})\b").unwrap()
    });
    let re_time = RE_TIME.get_or_init(|| Regex::new(r"\b\d{1,2}:\d{2}(:\d{2})?\b").unwrap());
    let re_prefix = RE_PREFIX.get_or_init(|| {
        Regex::new(r"^(عاجل|خبر عاجل|بالفيديو|بالصور|شاهد|حصري|تقرير|breaking)\s*[:|\-–]\s*").unwrap()
    });

    let mut out = stripped.clone();
    out = re_date.replace_all(&out, " ").to_string();
    out = re_time.replace_all(&out, " ").to_string();
    out = re_prefix.replace(out.trim(), "").to_string();

    // Drop a trailing source suffix like "… - اسم المصدر" or "… | اسم المصدر".
    for sep in [" - ", " | ", " – "] {
        if let Some(idx) = out.rfind(sep) {
            let tail = out[idx + sep.len()..].trim();
            if !tail.is_empty() && (tail == source || tail.eq_ignore_ascii_case(source)) {
                out.truncate(idx);
            }
        }
    }

    let cleaned = collapse_ws(&out);
    if cleaned.chars().count() < MIN_TITLE_CHARS {
        collapse_ws(&stripped)
    } else {
        cleaned
    }
}

/// Frame the original text with one opening and one closing clause. Original
/// sentences pass through untouched.
pub fn template_fallback(original: &str, category: Category) -> String {
    let (intro, outro) = category_clauses(category);
    format!("{intro}\n\n{}\n\n{outro}", original.trim())
}

fn category_clauses(category: Category) -> (&'static str, &'static str) {
    match category {
        Category::Economy => (
            "في تطور اقتصادي لافت،",
            "وتبقى التطورات الاقتصادية محل متابعة دقيقة من الأسواق والمراقبين.",
        ),
        Category::Politics => (
            "في سياق المشهد السياسي الراهن،",
            "وتتواصل المتابعة لتفاعلات هذا الملف على الساحة السياسية.",
        ),
        Category::Sports => (
            "في جديد الملاعب،",
            "وتتجه الأنظار إلى ما ستسفر عنه المنافسات المقبلة.",
        ),
        Category::Technology | Category::Ai => (
            "في أحدث تطورات التقنية،",
            "ويتوقع المراقبون مزيدا من التطورات في هذا المجال خلال الفترة المقبلة.",
        ),
        Category::Military => (
            "في التطورات الميدانية،",
            "وتبقى الأوضاع الميدانية قيد المتابعة المستمرة.",
        ),
        Category::Accidents => (
            "في حادث مؤسف،",
            "وباشرت الجهات المختصة التحقيق لمعرفة ملابسات الحادث.",
        ),
        _ => (
            "في تفاصيل الخبر،",
            "وسنوافيكم بمزيد من التفاصيل فور ورودها.",
        ),
    }
}

/// Strip markup, then truncate at the nearest word boundary before the cap,
/// appending an ellipsis when anything was cut.
pub fn derive_excerpt(content: &str, max_chars: usize) -> String {
    let plain = collapse_ws(&strip_markup(content));
    if plain.chars().count() <= max_chars {
        return plain;
    }
    let cut: String = plain.chars().take(max_chars).collect();
    let truncated = match cut.rfind(char::is_whitespace) {
        Some(idx) if idx > 0 => cut[..idx].trim_end().to_string(),
        _ => cut,
    };
    format!("{truncated}…")
}

/// Keyword-rule scan over title+content. The category label always leads,
/// then keywords in discovery order, deduplicated, capped.
pub fn extract_tags(title: &str, content: &str, category: Category, rules: &RuleSet) -> Vec<String> {
    let text = format!("{title} {content}").to_lowercase();
    let mut tags: Vec<String> = vec![category.label().to_string()];
    'outer: for rule in &rules.rules {
        for kw in &rule.keywords {
            if tags.len() >= MAX_TAGS {
                break 'outer;
            }
            if text.contains(&kw.to_lowercase()) && !tags.iter().any(|t| t == kw) {
                tags.push(kw.clone());
            }
        }
    }
    tags
}

/// Word count / 200 wpm, rounded up, never below one minute.
pub fn reading_time_minutes(content: &str) -> u32 {
    let words = strip_markup(content).split_whitespace().count();
    (words.div_ceil(WORDS_PER_MINUTE)).max(1) as u32
}

fn strip_markup(s: &str) -> String {
    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").unwrap());
    let decoded = html_escape::decode_html_entities(s).to_string();
    re.replace_all(&decoded, " ").to_string()
}

fn collapse_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_loses_dates_and_boilerplate() {
        let t = clean_title("عاجل: وزير المالية يعلن الميزانية 2024-05-01", "رويترز");
        assert_eq!(t, "وزير المالية يعلن الميزانية");
    }

    #[test]
    fn short_cleanup_falls_back_to_stripped_original() {
        let t = clean_title("عاجل: 12/05/2024", "وكالة");
        // Cleanup guts the title; the stripped original is kept instead.
        assert_eq!(t, "عاجل: 12/05/2024");
    }

    #[test]
    fn trailing_source_suffix_is_dropped() {
        let t = clean_title("افتتاح المعرض الدولي للكتاب في المدينة - رويترز", "رويترز");
        assert_eq!(t, "افتتاح المعرض الدولي للكتاب في المدينة");
    }

    #[test]
    fn excerpt_respects_word_boundaries() {
        let long = "كلمة ".repeat(100);
        let ex = derive_excerpt(&long, 150);
        assert!(ex.ends_with('…'));
        assert!(ex.chars().count() <= 151);
        assert!(!ex.trim_end_matches('…').ends_with(' '));
    }

    #[test]
    fn excerpt_keeps_short_text_untouched() {
        assert_eq!(derive_excerpt("نص قصير.", 150), "نص قصير.");
    }

    #[test]
    fn fallback_preserves_every_sentence() {
        let original = "الجملة الأولى. الجملة الثانية. الجملة الثالثة.";
        let out = template_fallback(original, Category::Economy);
        assert!(out.contains(original));
        let (intro, outro) = category_clauses(Category::Economy);
        assert!(out.starts_with(intro));
        assert!(out.ends_with(outro));
    }

    #[test]
    fn tags_lead_with_category_and_stay_capped() {
        let rules = RuleSet::default_seed();
        let title = "المنتخب يفوز في الدوري بعد مباراة قوية ضمن البطولة";
        let content = "سجل المنتخب هدف الفوز في كرة القدم أمام جمهور غفير.";
        let tags = extract_tags(title, content, Category::Sports, &rules);
        assert_eq!(tags[0], "رياضة");
        assert!(tags.len() <= MAX_TAGS);
        let mut deduped = tags.clone();
        deduped.dedup();
        assert_eq!(deduped, tags);
    }

    #[test]
    fn reading_time_never_below_one_minute() {
        assert_eq!(reading_time_minutes("كلمتان فقط"), 1);
        let long = "كلمة ".repeat(450);
        assert_eq!(reading_time_minutes(&long), 3);
    }

    #[tokio::test]
    async fn enricher_uses_fallback_when_provider_declines() {
        let enricher = Enricher::offline();
        let rules = RuleSet::default_seed();
        let cand = Candidate::new(
            "وزير المالية يعلن عن ميزانية جديدة",
            "أعلن وزير المالية عن الميزانية. وأكد أن النمو مستمر.",
            "رويترز",
        );
        let out = enricher.enrich(&cand, Category::Economy, &rules).await;
        assert!(out.content.contains("أعلن وزير المالية عن الميزانية. وأكد أن النمو مستمر."));
        assert!(out.reading_time >= 1);
        assert_eq!(out.tags[0], "اقتصاد");
        assert!(!out.excerpt.is_empty());
    }
}
