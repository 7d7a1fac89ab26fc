//! Duplicate detection between a fresh candidate batch and stored articles.
//!
//! Pure title equality is too strict for paraphrased republications, so the
//! scorer combines several cheap signals: normalized-title identity,
//! near-identical titles (normalized Levenshtein), word-overlap ratio,
//! permalink identity, content-prefix overlap, and a relaxed title bar for
//! items from the same source within a short time window.
//!
//! All thresholds are tunable parameters, not load-bearing constants; the
//! defaults below are what the duplicate corpus was validated against.

use once_cell::sync::OnceCell;
use regex::Regex;

use crate::article::Article;

/// Tunable thresholds for the duplicate rules.
#[derive(Clone, Copy, Debug)]
pub struct SimilarityParams {
    /// Word-overlap ratio on titles above which items are duplicates.
    pub title_ratio: f32,
    /// Relaxed title bar for same-source items inside the time window.
    pub same_source_title_ratio: f32,
    /// Word-overlap ratio on content prefixes above which items are duplicates.
    pub content_ratio: f32,
    /// How many characters of content to compare.
    pub content_prefix_chars: usize,
    /// Same-source window in hours for the relaxed title bar.
    pub same_source_window_hours: i64,
    /// Normalized Levenshtein similarity on titles treated as identical.
    pub near_identical_title: f64,
}

impl Default for SimilarityParams {
    fn default() -> Self {
        Self {
            title_ratio: 0.8,
            same_source_title_ratio: 0.6,
            content_ratio: 0.85,
            content_prefix_chars: 200,
            same_source_window_hours: 24,
            near_identical_title: 0.95,
        }
    }
}

impl SimilarityParams {
    /// Clamp ratios into [0,1] and keep the window/prefix sane.
    pub fn sanitized(mut self) -> Self {
        self.title_ratio = self.title_ratio.clamp(0.0, 1.0);
        self.same_source_title_ratio = self.same_source_title_ratio.clamp(0.0, 1.0);
        self.content_ratio = self.content_ratio.clamp(0.0, 1.0);
        self.near_identical_title = self.near_identical_title.clamp(0.0, 1.0);
        if self.content_prefix_chars == 0 {
            self.content_prefix_chars = 1;
        }
        if self.same_source_window_hours <= 0 {
            self.same_source_window_hours = 1;
        }
        self
    }
}

/// Lowercase, keep letters and whitespace only, collapse runs of whitespace.
/// Keeps Arabic and Latin scripts alike.
pub fn normalize_title(s: &str) -> String {
    static RE_NON_LETTER: OnceCell<Regex> = OnceCell::new();
    let re = RE_NON_LETTER.get_or_init(|| Regex::new(r"[^\p{L}\s]+").unwrap());
    let stripped = re.replace_all(s, " ");
    stripped
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Words longer than two characters, after normalization.
fn significant_words(normalized: &str) -> Vec<&str> {
    normalized
        .split_whitespace()
        .filter(|w| w.chars().count() > 2)
        .collect()
}

/// |common| / max(|a|, |b|). Zero when either side has no significant words.
fn overlap_ratio(a: &str, b: &str) -> f32 {
    let wa = significant_words(a);
    let wb = significant_words(b);
    if wa.is_empty() || wb.is_empty() {
        return 0.0;
    }
    let set_a: std::collections::HashSet<&str> = wa.iter().copied().collect();
    let set_b: std::collections::HashSet<&str> = wb.iter().copied().collect();
    let common = set_a.intersection(&set_b).count();
    common as f32 / set_a.len().max(set_b.len()) as f32
}

fn content_prefix(s: &str, chars: usize) -> String {
    normalize_title(&s.chars().take(chars).collect::<String>())
}

/// True when any duplicate rule fires. Symmetric in its arguments: every
/// rule is built from symmetric comparisons.
pub fn is_duplicate(a: &Article, b: &Article, params: &SimilarityParams) -> bool {
    // Permalink identity trumps all text comparison.
    if let (Some(la), Some(lb)) = (&a.original_link, &b.original_link) {
        if !la.is_empty() && la == lb {
            return true;
        }
    }

    let ta = normalize_title(&a.title);
    let tb = normalize_title(&b.title);
    if !ta.is_empty() && ta == tb {
        return true;
    }
    if strsim::normalized_levenshtein(&ta, &tb) >= params.near_identical_title {
        return true;
    }

    let title_overlap = overlap_ratio(&ta, &tb);
    if title_overlap > params.title_ratio {
        return true;
    }

    let ca = content_prefix(&a.content, params.content_prefix_chars);
    let cb = content_prefix(&b.content, params.content_prefix_chars);
    if overlap_ratio(&ca, &cb) > params.content_ratio {
        return true;
    }

    // Same-source items close in time are likely re-postings; lower the bar.
    if a.source == b.source {
        let gap = (a.date - b.date).num_hours().abs();
        if gap <= params.same_source_window_hours && title_overlap > params.same_source_title_ratio {
            return true;
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::article::{make_article_id, Category};
    use chrono::{Duration, Utc};

    fn art(title: &str, content: &str, source: &str, hours_ago: i64, link: Option<&str>) -> Article {
        let date = Utc::now() - Duration::hours(hours_ago);
        Article {
            id: make_article_id(title, source, date),
            title: title.to_string(),
            content: content.to_string(),
            excerpt: String::new(),
            category: Category::News,
            date,
            source: source.to_string(),
            image: "https://img.example.com/a.jpg".to_string(),
            featured: false,
            video_url: None,
            tags: vec![],
            reading_time: 1,
            original_link: link.map(|s| s.to_string()),
            is_translated: None,
        }
    }

    #[test]
    fn identical_titles_match() {
        let p = SimilarityParams::default();
        let a = art("وزير المالية يعلن عن ميزانية جديدة", "نص", "رويترز", 0, None);
        let b = art("وزير المالية يعلن عن ميزانية جديدة!", "نص آخر مختلف تماما", "وكالة", 48, None);
        assert!(is_duplicate(&a, &b, &p));
    }

    #[test]
    fn equal_permalinks_match_regardless_of_text() {
        let p = SimilarityParams::default();
        let a = art("عنوان أول", "محتوى أول", "أ", 0, Some("https://example.com/x"));
        let b = art("عنوان مختلف كليا", "محتوى ثان", "ب", 100, Some("https://example.com/x"));
        assert!(is_duplicate(&a, &b, &p));
    }

    #[test]
    fn unrelated_articles_do_not_match() {
        let p = SimilarityParams::default();
        let a = art(
            "المنتخب الوطني يفوز بكأس البطولة العربية لكرة القدم",
            "سجل المنتخب ثلاثة أهداف في المباراة النهائية أمام جمهور غفير.",
            "رياضة اليوم",
            0,
            None,
        );
        let b = art(
            "البنك المركزي يرفع أسعار الفائدة للمرة الثالثة",
            "قرر البنك المركزي رفع أسعار الفائدة بواقع نقطة مئوية واحدة.",
            "اقتصاد الشرق",
            0,
            None,
        );
        assert!(!is_duplicate(&a, &b, &p));
    }

    #[test]
    fn scorer_is_symmetric() {
        let p = SimilarityParams::default();
        let a = art(
            "وزير المالية يعلن عن ميزانية جديدة للعام المقبل",
            "أعلن وزير المالية اليوم عن تفاصيل الميزانية الجديدة.",
            "رويترز",
            1,
            None,
        );
        let b = art(
            "وزير المالية يكشف ميزانية جديدة للعام المقبل",
            "كشف الوزير عن الميزانية في مؤتمر صحفي.",
            "رويترز",
            3,
            None,
        );
        assert_eq!(is_duplicate(&a, &b, &p), is_duplicate(&b, &a, &p));
    }

    #[test]
    fn same_source_within_window_lowers_the_bar() {
        let p = SimilarityParams::default();
        // Overlap is above 0.6 but below 0.8: only the same-source rule fires.
        let a = art(
            "رئيس الوزراء يبحث خطة التنمية الاقتصادية الجديدة",
            "الأول",
            "الوكالة الوطنية",
            1,
            None,
        );
        let b = art(
            "رئيس الوزراء يبحث خطة التنمية الصناعية المقبلة",
            "الثاني",
            "الوكالة الوطنية",
            2,
            None,
        );
        assert!(is_duplicate(&a, &b, &p));

        // Same titles, distant dates: the relaxed rule must not apply.
        let c = art(
            "رئيس الوزراء يبحث خطة التنمية الاقتصادية الجديدة",
            "الأول",
            "الوكالة الوطنية",
            1,
            None,
        );
        let d = art(
            "رئيس الوزراء يبحث خطة التنمية الصناعية المقبلة",
            "الثاني",
            "الوكالة الوطنية",
            80,
            None,
        );
        assert!(!is_duplicate(&c, &d, &p));
    }

    #[test]
    fn content_prefix_overlap_matches() {
        let p = SimilarityParams::default();
        let body = "أكدت مصادر مطلعة أن الاجتماع الوزاري ناقش تفاصيل الاتفاقية الجديدة \
                    بين البلدين وسبل تعزيز التعاون الاقتصادي والتجاري خلال المرحلة المقبلة.";
        let a = art("عنوان صياغة أولى مختلف تماما هنا", body, "أ", 0, None);
        let b = art("صيغة ثانية للعنوان لا تشبه الأولى", body, "ب", 0, None);
        assert!(is_duplicate(&a, &b, &p));
    }
}
