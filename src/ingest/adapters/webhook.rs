//! Webhook adapter: external publishers POST article payloads to the API,
//! which lands them in a bounded in-memory queue; each pipeline run drains
//! the queue. Drop-oldest keeps memory flat when nobody is syncing.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::{SourceAdapter, SourceKind};
use crate::article::{Candidate, Category};

const QUEUE_CAPACITY: usize = 256;
const SOURCE_NAME: &str = "Webhook";

/// Incoming webhook body.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookPayload {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Default)]
pub struct WebhookQueue {
    inner: Mutex<VecDeque<Candidate>>,
}

impl WebhookQueue {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Enqueue a payload; ignores empty titles, evicts the oldest entry at
    /// capacity.
    pub fn push(&self, payload: WebhookPayload) -> bool {
        if payload.title.trim().is_empty() {
            return false;
        }
        let candidate = Candidate {
            title: payload.title.trim().to_string(),
            content: payload.content,
            source: payload.source.unwrap_or_else(|| SOURCE_NAME.to_string()),
            date: payload.published_at.unwrap_or_else(Utc::now),
            category: payload.category.as_deref().and_then(Category::parse_label),
            image: payload.image,
            original_link: payload.link,
            video_url: payload.video_url,
        };
        let mut q = self.inner.lock().expect("webhook queue mutex poisoned");
        if q.len() == QUEUE_CAPACITY {
            q.pop_front();
        }
        q.push_back(candidate);
        true
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("webhook queue mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn drain(&self) -> Vec<Candidate> {
        let mut q = self.inner.lock().expect("webhook queue mutex poisoned");
        q.drain(..).collect()
    }
}

pub struct WebhookAdapter {
    queue: Arc<WebhookQueue>,
}

impl WebhookAdapter {
    pub fn new(queue: Arc<WebhookQueue>) -> Self {
        Self { queue }
    }
}

#[async_trait]
impl SourceAdapter for WebhookAdapter {
    async fn fetch(&self) -> Result<Vec<Candidate>> {
        Ok(self.queue.drain())
    }

    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Webhook
    }
}
