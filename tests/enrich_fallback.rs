// tests/enrich_fallback.rs
// The enrichment fallback must preserve original sentences verbatim when the
// rewrite capability fails on every call.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use nashra_sync_engine::classify::rules::RuleSet;
use nashra_sync_engine::enrich::{Enricher, RewriteProvider};
use nashra_sync_engine::{Candidate, Category};

/// Rewrite capability that fails on every call and counts the attempts.
struct AlwaysFailingRewrite {
    calls: Arc<AtomicUsize>,
}

impl RewriteProvider for AlwaysFailingRewrite {
    fn rewrite<'a>(
        &'a self,
        _text: &'a str,
        _category: Category,
        _source: &'a str,
        _tone: &'a str,
    ) -> Pin<Box<dyn Future<Output = Option<String>> + Send + 'a>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async { None })
    }
    fn name(&self) -> &'static str {
        "always-failing"
    }
}

#[tokio::test]
async fn fallback_keeps_every_sentence_and_frames_it_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let enricher = Enricher::new(
        Arc::new(AlwaysFailingRewrite { calls: calls.clone() }),
        "خبري",
    );
    let rules = RuleSet::default_seed();

    let original = "أعلن وزير المالية عن الميزانية الجديدة. وأكد أن معدلات النمو ستتحسن. وأشار إلى زيادة الإنفاق على البنية التحتية.";
    let cand = Candidate::new("وزير المالية يعلن عن ميزانية جديدة", original, "رويترز");

    let out = enricher.enrich(&cand, Category::Economy, &rules).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1, "provider was consulted");

    // Every original sentence survives, in order, untouched.
    assert!(out.content.contains(original));

    // Exactly one prepended clause and one appended clause around it.
    let parts: Vec<&str> = out.content.split("\n\n").collect();
    assert_eq!(parts.len(), 3);
    assert_eq!(parts[1], original);
    assert!(!parts[0].is_empty() && parts[0] != original);
    assert!(!parts[2].is_empty() && parts[2] != original);
}

#[tokio::test]
async fn fallback_output_still_derives_excerpt_tags_and_reading_time() {
    let enricher = Enricher::offline();
    let rules = RuleSet::default_seed();
    let cand = Candidate::new(
        "المنتخب يتوج بلقب الدوري بعد مباراة حاسمة",
        "سجل المنتخب هدفين في المباراة النهائية ضمن البطولة أمام جمهور غفير في الملعب.",
        "رياضة اليوم",
    );

    let out = enricher.enrich(&cand, Category::Sports, &rules).await;
    assert!(!out.excerpt.is_empty());
    assert!(out.excerpt.chars().count() <= 151);
    assert_eq!(out.tags.first().map(String::as_str), Some("رياضة"));
    assert!(out.tags.len() <= 5);
    assert!(out.reading_time >= 1);
}
