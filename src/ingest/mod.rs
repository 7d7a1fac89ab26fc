//! The ingestion pipeline: adapters → classify → enrich → image assurance →
//! dedup → store write → retention trim → change notification.
//!
//! Stage order matters. Classification reads the raw text so the context
//! keywords still match source vocabulary; dedup runs against final,
//! enriched titles and bodies so pre-enrichment phrasing differences cannot
//! produce false negatives.

pub mod adapters;

use chrono::Utc;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;
use std::sync::Arc;
use std::time::Duration;

use crate::article::{make_article_id, Article, Candidate};
use crate::classify::Classifier;
use crate::config::SyncConfig;
use crate::enrich::Enricher;
use crate::error::SyncResult;
use crate::events::{EventBus, SyncEvent};
use crate::image::ImageAssurance;
use crate::retention;
use crate::similarity::{is_duplicate, SimilarityParams};
use crate::store::{ArticleStore, DynArticleStore};
use adapters::SourceAdapter;

const ADAPTER_TIMEOUT: Duration = Duration::from_secs(15);

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("sync_candidates_total", "Raw candidates parsed from adapters.");
        describe_counter!("sync_added_total", "Articles added to the store.");
        describe_counter!(
            "sync_filtered_total",
            "Candidates rejected by the denylist or empty."
        );
        describe_counter!("sync_dedup_total", "Candidates discarded as duplicates.");
        describe_counter!("sync_adapter_errors_total", "Adapter fetch/parse errors.");
        describe_histogram!("sync_parse_ms", "Adapter parse time in milliseconds.");
        describe_gauge!("sync_last_run_ts", "Unix ts when the pipeline last ran.");
    });
}

/// Outcome of one pipeline run.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct RunReport {
    pub added: usize,
    pub dedup_skipped: usize,
    pub filtered: usize,
    pub errors: Vec<String>,
}

pub struct Pipeline {
    store: DynArticleStore,
    classifier: Classifier,
    enricher: Enricher,
    images: ImageAssurance,
    similarity: SimilarityParams,
    bus: EventBus,
    adapters: Vec<Arc<dyn SourceAdapter>>,
    adapter_timeout: Duration,
}

impl Pipeline {
    pub fn new(
        store: DynArticleStore,
        classifier: Classifier,
        enricher: Enricher,
        images: ImageAssurance,
        similarity: SimilarityParams,
        bus: EventBus,
        adapters: Vec<Arc<dyn SourceAdapter>>,
    ) -> Self {
        Self {
            store,
            classifier,
            enricher,
            images,
            similarity: similarity.sanitized(),
            bus,
            adapters,
            adapter_timeout: ADAPTER_TIMEOUT,
        }
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Run the whole pipeline once. Adapter failures never abort the batch;
    /// the store write is one atomic replace at the end.
    pub async fn run_once(&self, config: &SyncConfig) -> SyncResult<RunReport> {
        ensure_metrics_described();
        let mut report = RunReport::default();

        // 1) Fan out the enabled adapters together, join tolerating failures.
        let raw = self.fetch_all(config, &mut report).await;

        // 2..5) Classify, enrich, assure images.
        let mut processed: Vec<Article> = Vec::with_capacity(raw.len());
        for candidate in raw {
            if candidate.title.trim().is_empty() {
                report.filtered += 1;
                continue;
            }
            if self.classifier.rejects(&candidate) {
                counter!("sync_filtered_total").increment(1);
                report.filtered += 1;
                continue;
            }
            let category = match candidate.category {
                Some(c) => c,
                None => match self.classifier.classify(&candidate).await {
                    Some(c) => c,
                    None => {
                        counter!("sync_filtered_total").increment(1);
                        report.filtered += 1;
                        continue;
                    }
                },
            };

            let enriched = self
                .enricher
                .enrich(&candidate, category, self.classifier.rules())
                .await;
            let image = self.images.ensure_image(&candidate, category).await;

            processed.push(Article {
                id: make_article_id(&enriched.title, &candidate.source, Utc::now()),
                title: enriched.title,
                content: enriched.content,
                excerpt: enriched.excerpt,
                category,
                date: candidate.date,
                source: candidate.source,
                image,
                featured: false,
                video_url: candidate.video_url,
                tags: enriched.tags,
                reading_time: enriched.reading_time,
                original_link: candidate.original_link,
                is_translated: None,
            });
        }

        // 6) Dedup against the store and within the batch; first one wins.
        let existing = self.store.get_all().await?;
        let mut fresh: Vec<Article> = Vec::with_capacity(processed.len());
        for article in processed {
            let dup = existing
                .iter()
                .chain(fresh.iter())
                .any(|other| is_duplicate(other, &article, &self.similarity));
            if dup {
                counter!("sync_dedup_total").increment(1);
                report.dedup_skipped += 1;
                continue;
            }
            fresh.push(article);
        }

        // 7) Prepend newest-first, trim to the cap, single atomic write.
        report.added = fresh.len();
        let first_run = self.store.last_sync_at().await?.is_none();
        if !fresh.is_empty() {
            fresh.sort_by(|a, b| b.date.cmp(&a.date));
            let mut all = fresh;
            all.extend(existing);
            retention::trim(&mut all, config.max_articles);
            self.store.replace_all(all).await?;
        }
        let now = Utc::now();
        self.store.set_last_sync_at(now).await?;
        gauge!("sync_last_run_ts").set(now.timestamp() as f64);
        counter!("sync_added_total").increment(report.added as u64);

        // 8) Tell the UI layer what happened; zero is a valid outcome.
        self.bus.emit(SyncEvent {
            new_count: report.added,
            first_run,
            cleared: false,
        });

        tracing::info!(
            target: "sync",
            added = report.added,
            dedup = report.dedup_skipped,
            filtered = report.filtered,
            errors = report.errors.len(),
            "pipeline run finished"
        );
        Ok(report)
    }

    /// Spawn every enabled adapter, await them jointly, and tolerate each
    /// failure individually.
    async fn fetch_all(&self, config: &SyncConfig, report: &mut RunReport) -> Vec<Candidate> {
        let enabled: Vec<Arc<dyn SourceAdapter>> = self
            .adapters
            .iter()
            .filter(|a| {
                use adapters::SourceKind::*;
                match a.kind() {
                    Rss => config.sources.rss,
                    Social => config.sources.social,
                    Webhook => config.sources.webhook,
                    Sheets => config.sources.sheets,
                }
            })
            .cloned()
            .collect();

        let timeout = self.adapter_timeout;
        let handles: Vec<_> = enabled
            .into_iter()
            .map(|adapter| {
                tokio::spawn(async move {
                    let name = adapter.name().to_string();
                    let result = tokio::time::timeout(timeout, adapter.fetch()).await;
                    (name, result)
                })
            })
            .collect();

        let mut raw = Vec::new();
        for handle in handles {
            match handle.await {
                Ok((_, Ok(Ok(mut candidates)))) => raw.append(&mut candidates),
                Ok((name, Ok(Err(e)))) => {
                    tracing::warn!(error = ?e, adapter = %name, "adapter error");
                    counter!("sync_adapter_errors_total").increment(1);
                    report.errors.push(format!("{name}: {e}"));
                }
                Ok((name, Err(_elapsed))) => {
                    tracing::warn!(adapter = %name, "adapter timed out");
                    counter!("sync_adapter_errors_total").increment(1);
                    report.errors.push(format!("{name}: timed out"));
                }
                Err(join_err) => {
                    tracing::warn!(error = ?join_err, "adapter task panicked");
                    counter!("sync_adapter_errors_total").increment(1);
                    report.errors.push(format!("adapter task: {join_err}"));
                }
            }
        }
        raw
    }
}
