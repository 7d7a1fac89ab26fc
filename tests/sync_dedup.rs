// tests/sync_dedup.rs
// Dedup and retention behavior of the pipeline against a seeded store.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use nashra_sync_engine::article::make_article_id;
use nashra_sync_engine::classify::Classifier;
use nashra_sync_engine::enrich::Enricher;
use nashra_sync_engine::image::ImageAssurance;
use nashra_sync_engine::ingest::adapters::{SourceAdapter, SourceKind};
use nashra_sync_engine::similarity::SimilarityParams;
use nashra_sync_engine::{
    Article, ArticleStore, Candidate, Category, DynArticleStore, EventBus, MemoryStore, Pipeline,
    SyncConfig,
};

/// Adapter that serves a fixed candidate list.
struct FixedAdapter {
    items: Vec<Candidate>,
}

#[async_trait::async_trait]
impl SourceAdapter for FixedAdapter {
    async fn fetch(&self) -> anyhow::Result<Vec<Candidate>> {
        Ok(self.items.clone())
    }
    fn name(&self) -> &str {
        "fixed"
    }
    fn kind(&self) -> SourceKind {
        SourceKind::Rss
    }
}

fn pipeline_with(items: Vec<Candidate>, store: DynArticleStore) -> Pipeline {
    Pipeline::new(
        store,
        Classifier::offline(),
        Enricher::offline(),
        ImageAssurance::offline(),
        SimilarityParams::default(),
        EventBus::new(),
        vec![Arc::new(FixedAdapter { items })],
    )
}

fn candidate(title: &str, content: &str, day: u32) -> Candidate {
    Candidate {
        title: title.to_string(),
        content: content.to_string(),
        source: "وكالة الأنباء".to_string(),
        date: Utc.with_ymd_and_hms(2025, 7, day, 10, 0, 0).unwrap(),
        category: None,
        image: None,
        original_link: None,
        video_url: None,
    }
}

#[tokio::test]
async fn second_run_against_unchanged_sources_adds_nothing() {
    let store: DynArticleStore = Arc::new(MemoryStore::new());
    let items = vec![
        candidate(
            "وزير المالية يعلن عن ميزانية جديدة",
            "أعلن وزير المالية عن تفاصيل الميزانية الجديدة للعام المقبل.",
            1,
        ),
        candidate(
            "المنتخب الوطني يتأهل إلى النهائي",
            "حسم المنتخب تأهله بعد فوزه بهدفين في المباراة.",
            2,
        ),
    ];
    let pipeline = pipeline_with(items, store.clone());
    let config = SyncConfig::default();

    let first = pipeline.run_once(&config).await.unwrap();
    assert_eq!(first.added, 2);

    let second = pipeline.run_once(&config).await.unwrap();
    assert_eq!(second.added, 0, "idempotent dedup");
    assert_eq!(second.dedup_skipped, 2);
    assert_eq!(store.get_all().await.unwrap().len(), 2);
}

#[tokio::test]
async fn identical_permalinks_keep_only_the_first() {
    let store: DynArticleStore = Arc::new(MemoryStore::new());
    let mut a = candidate(
        "وزير المالية يعلن عن ميزانية جديدة",
        "النص الأول للخبر.",
        1,
    );
    a.original_link = Some("https://news.example.com/articles/budget".to_string());
    let mut b = candidate(
        "عنوان مختلف تماما عن الميزانية العامة",
        "صياغة أخرى للخبر نفسه بكلمات مغايرة.",
        2,
    );
    b.original_link = Some("https://news.example.com/articles/budget".to_string());

    let pipeline = pipeline_with(vec![a, b], store.clone());
    let report = pipeline.run_once(&SyncConfig::default()).await.unwrap();

    assert_eq!(report.added, 1);
    assert_eq!(report.dedup_skipped, 1);
    let all = store.get_all().await.unwrap();
    assert!(all[0].title.contains("وزير المالية"), "first one wins");
}

fn stored_article(title: &str, day: u32) -> Article {
    let date = Utc.with_ymd_and_hms(2025, 7, day, 12, 0, 0).unwrap();
    Article {
        id: make_article_id(title, "أرشيف", date),
        title: title.to_string(),
        content: format!("نص الخبر المخزن ليوم {day}."),
        excerpt: "نص".to_string(),
        category: Category::News,
        date,
        source: "أرشيف".to_string(),
        image: "https://img.example.com/a.jpg".to_string(),
        featured: false,
        video_url: None,
        tags: vec![],
        reading_time: 1,
        original_link: None,
        is_translated: None,
    }
}

#[tokio::test]
async fn retention_keeps_the_five_most_recent() {
    let store: DynArticleStore = Arc::new(MemoryStore::new());
    // Days 1..=5 already stored.
    let seeded: Vec<Article> = vec![
        stored_article("افتتاح معرض الكتاب في العاصمة", 1),
        stored_article("ارتفاع أسعار النفط عالميا", 2),
        stored_article("انطلاق مهرجان المسرح الوطني", 3),
        stored_article("تخريج دفعة جديدة من الجامعة", 4),
        stored_article("إطلاق خدمة حكومية إلكترونية", 5),
    ];
    store.replace_all(seeded).await.unwrap();

    // Two new, dissimilar items for days 6 and 7.
    let items = vec![
        candidate(
            "علماء يكشفون اكتشافا جديدا في الفضاء",
            "أعلن باحثون عن اكتشاف كوكب جديد خارج المجموعة الشمسية.",
            6,
        ),
        candidate(
            "المنتخب يفوز بالبطولة القارية",
            "توج المنتخب باللقب بعد مباراة نهائية مثيرة أمام جمهوره.",
            7,
        ),
    ];
    let pipeline = pipeline_with(items, store.clone());
    let mut config = SyncConfig::default();
    config.max_articles = 5;

    let report = pipeline.run_once(&config).await.unwrap();
    assert_eq!(report.added, 2);

    let all = store.get_all().await.unwrap();
    assert_eq!(all.len(), 5, "retention cap holds");
    let days: Vec<u32> = all.iter().map(|a| a.date.format("%d").to_string().parse().unwrap()).collect();
    assert_eq!(days, vec![7, 6, 5, 4, 3], "days 1 and 2 were dropped");
}
