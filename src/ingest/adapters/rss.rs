//! RSS 2.0 adapter. Fixture mode parses embedded/test XML; HTTP mode pulls
//! the live feed. Enclosure and media thumbnail declarations ride along on
//! the candidate so image assurance can trust them first.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use metrics::{counter, histogram};
use quick_xml::de::from_str;
use serde::Deserialize;
use time::{format_description::well_known::Rfc2822, OffsetDateTime, UtcOffset};

use super::{SourceAdapter, SourceKind};
use crate::article::Candidate;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
    enclosure: Option<Enclosure>,
    // quick-xml matches the qualified name, prefix included.
    #[serde(rename = "media:thumbnail")]
    thumbnail: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Enclosure {
    #[serde(rename = "@url")]
    url: Option<String>,
    #[serde(rename = "@type")]
    mime: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    #[serde(rename = "@url")]
    url: Option<String>,
}

fn parse_rfc2822_to_utc(ts: &str) -> Option<DateTime<Utc>> {
    let dt = OffsetDateTime::parse(ts, &Rfc2822).ok()?;
    let unix = dt.to_offset(UtcOffset::UTC).unix_timestamp();
    Utc.timestamp_opt(unix, 0).single()
}

enum Mode {
    Fixture(String),
    Http { url: String, client: reqwest::Client },
}

pub struct RssAdapter {
    feed_name: String,
    mode: Mode,
}

impl RssAdapter {
    pub fn from_fixture_str(feed_name: impl Into<String>, xml: &str) -> Self {
        Self {
            feed_name: feed_name.into(),
            mode: Mode::Fixture(xml.to_string()),
        }
    }

    pub fn from_url(feed_name: impl Into<String>, url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("nashra-sync-engine/0.1")
            .connect_timeout(std::time::Duration::from_secs(4))
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("reqwest client");
        Self {
            feed_name: feed_name.into(),
            mode: Mode::Http {
                url: url.into(),
                client,
            },
        }
    }

    fn parse_items_from_str(&self, s: &str) -> Result<Vec<Candidate>> {
        let t0 = std::time::Instant::now();
        let xml_clean = scrub_html_entities_for_xml(s);
        let rss: Rss = from_str(&xml_clean).context("parsing rss xml")?;

        let mut out = Vec::with_capacity(rss.channel.item.len());
        for it in rss.channel.item {
            let title = it.title.as_deref().unwrap_or_default().trim().to_string();
            if title.is_empty() {
                continue;
            }
            // Keep the raw description: image assurance mines its markup.
            let content = it.description.unwrap_or_default();

            let image = it
                .enclosure
                .and_then(|e| match e.mime {
                    Some(m) if !m.starts_with("image/") => None,
                    _ => e.url,
                })
                .or(it.thumbnail.and_then(|t| t.url));

            out.push(Candidate {
                title,
                content,
                source: self.feed_name.to_string(),
                date: it
                    .pub_date
                    .as_deref()
                    .and_then(parse_rfc2822_to_utc)
                    .unwrap_or_else(Utc::now),
                category: None,
                image,
                original_link: it.link,
                video_url: None,
            });
        }

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("sync_parse_ms").record(ms);
        counter!("sync_candidates_total").increment(out.len() as u64);
        Ok(out)
    }
}

#[async_trait]
impl SourceAdapter for RssAdapter {
    async fn fetch(&self) -> Result<Vec<Candidate>> {
        match &self.mode {
            Mode::Fixture(s) => self.parse_items_from_str(s),
            Mode::Http { url, client } => {
                let body = client
                    .get(url)
                    .send()
                    .await
                    .context("rss http get()")?
                    .text()
                    .await
                    .context("rss http .text()")?;
                self.parse_items_from_str(&body)
            }
        }
    }

    fn name(&self) -> &str {
        &self.feed_name
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Rss
    }
}

fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}
