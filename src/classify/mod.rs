//! Two-tier content classification.
//!
//! Tier 1 delegates to an external text-classification capability when one
//! is wired in; its answer is accepted only if it lands inside the closed
//! category set. Tier 2 is the deterministic keyword fallback that needs no
//! network and is always available. The denylist guards both tiers.

pub mod rules;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::article::{Candidate, Category};
use rules::RuleSet;

/// External classification capability. Returns a label or `None`; the label
/// is only used when it parses into the closed category set.
pub trait ClassifyProvider: Send + Sync {
    fn classify<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Option<String>> + Send + 'a>>;
    fn name(&self) -> &'static str;
}

pub type DynClassifyProvider = Arc<dyn ClassifyProvider>;

/// Always answers `None`; used when no external classifier is configured.
pub struct DisabledClassifyProvider;

impl ClassifyProvider for DisabledClassifyProvider {
    fn classify<'a>(
        &'a self,
        _text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Option<String>> + Send + 'a>> {
        Box::pin(async { None })
    }
    fn name(&self) -> &'static str {
        "disabled"
    }
}

/// Deterministic provider for tests.
pub struct FixedClassifyProvider {
    pub label: String,
}

impl ClassifyProvider for FixedClassifyProvider {
    fn classify<'a>(
        &'a self,
        _text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Option<String>> + Send + 'a>> {
        let out = self.label.clone();
        Box::pin(async move { Some(out) })
    }
    fn name(&self) -> &'static str {
        "fixed"
    }
}

pub struct Classifier {
    rules: RuleSet,
    provider: DynClassifyProvider,
}

impl Classifier {
    pub fn new(rules: RuleSet, provider: DynClassifyProvider) -> Self {
        Self { rules, provider }
    }

    /// Rules-only classifier with the default rule set.
    pub fn offline() -> Self {
        Self::new(RuleSet::load_default(), Arc::new(DisabledClassifyProvider))
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Classify a candidate. `None` means the candidate was rejected by the
    /// denylist and must not reach the store.
    pub async fn classify(&self, candidate: &Candidate) -> Option<Category> {
        let text = combined_text(candidate);

        if self.is_denylisted(&text) {
            tracing::debug!(source = %candidate.source, "candidate rejected by denylist");
            return None;
        }

        // Tier 1: external capability, answer validated against the closed set.
        if let Some(label) = self.provider.classify(&text).await {
            if let Some(cat) = Category::parse_label(&label) {
                return Some(cat);
            }
            tracing::debug!(
                provider = self.provider.name(),
                label = %label,
                "classifier returned an unknown label, falling back to rules"
            );
        }

        // Tier 2: deterministic keyword scoring.
        Some(self.score_rules(&text))
    }

    /// Denylist gate, applied to every candidate whether or not it already
    /// carries a category hint.
    pub fn rejects(&self, candidate: &Candidate) -> bool {
        self.is_denylisted(&combined_text(candidate))
    }

    fn is_denylisted(&self, text: &str) -> bool {
        self.rules
            .denylist
            .iter()
            .any(|phrase| !phrase.is_empty() && text.contains(&phrase.to_lowercase()))
    }

    /// Score every rule over the combined text; the highest score wins and
    /// an all-zero board falls through to the generic section.
    fn score_rules(&self, text: &str) -> Category {
        let mut best: Option<(Category, u32)> = None;
        for rule in &self.rules.rules {
            let mut score = 0u32;
            for kw in &rule.keywords {
                if text.contains(&kw.to_lowercase()) {
                    score += rule.weight;
                }
            }
            for kw in &rule.context {
                if text.contains(&kw.to_lowercase()) {
                    score += 1;
                }
            }
            if score > 0 && best.map_or(true, |(_, s)| score > s) {
                best = Some((rule.category, score));
            }
        }
        best.map(|(c, _)| c).unwrap_or(Category::News)
    }
}

fn combined_text(candidate: &Candidate) -> String {
    format!("{} {}", candidate.title, candidate.content).to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> Classifier {
        Classifier::new(RuleSet::default_seed(), Arc::new(DisabledClassifyProvider))
    }

    #[tokio::test]
    async fn finance_minister_maps_to_economy() {
        let c = classifier();
        let cand = Candidate::new(
            "وزير المالية يعلن عن ميزانية جديدة",
            "أعلن وزير المالية اليوم عن تفاصيل جديدة.",
            "رويترز",
        );
        assert_eq!(c.classify(&cand).await, Some(Category::Economy));
    }

    #[tokio::test]
    async fn zero_scores_fall_back_to_generic_news() {
        let c = classifier();
        let cand = Candidate::new("عنوان عام بلا كلمات مفتاحية", "نص قصير.", "وكالة");
        assert_eq!(c.classify(&cand).await, Some(Category::News));
    }

    #[tokio::test]
    async fn denylisted_candidate_is_rejected() {
        let c = classifier();
        let cand = Candidate::new(
            "عرض خاص لفترة محدودة",
            "اشترك الآن واحصل على الخدمة.",
            "مجهول",
        );
        assert_eq!(c.classify(&cand).await, None);
    }

    #[tokio::test]
    async fn provider_answer_used_only_when_in_the_closed_set() {
        let provider = Arc::new(FixedClassifyProvider {
            label: "رياضة".to_string(),
        });
        let c = Classifier::new(RuleSet::default_seed(), provider);
        let cand = Candidate::new("عنوان", "نص.", "وكالة");
        assert_eq!(c.classify(&cand).await, Some(Category::Sports));

        let bogus = Arc::new(FixedClassifyProvider {
            label: "not-a-section".to_string(),
        });
        let c = Classifier::new(RuleSet::default_seed(), bogus);
        let cand = Candidate::new(
            "المنتخب يستعد للمباراة في الدوري",
            "يخوض المنتخب مباراة ضمن البطولة.",
            "وكالة",
        );
        // Unknown label falls through to the keyword tier.
        assert_eq!(c.classify(&cand).await, Some(Category::Sports));
    }
}
