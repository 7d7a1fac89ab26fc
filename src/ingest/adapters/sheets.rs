//! Spreadsheet import adapter. Understands the Google Sheets gviz JSON
//! export (the `google.visualization.Query.setResponse(...)` wrapper) with
//! columns: title, content, category, image, link. Fixture mode feeds the
//! same document from disk.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;

use super::{SourceAdapter, SourceKind};
use crate::article::{Candidate, Category};

const SOURCE_NAME: &str = "Google Sheets";

#[derive(Debug, Deserialize)]
struct Gviz {
    table: Table,
}

#[derive(Debug, Deserialize)]
struct Table {
    #[serde(default)]
    rows: Vec<Row>,
}

#[derive(Debug, Deserialize)]
struct Row {
    #[serde(default)]
    c: Vec<Option<Cell>>,
}

#[derive(Debug, Deserialize)]
struct Cell {
    #[serde(default)]
    v: Option<serde_json::Value>,
}

/// Strip the JSONP-style wrapper down to the JSON object inside.
fn unwrap_gviz(body: &str) -> Result<&str> {
    let start = body
        .find('(')
        .ok_or_else(|| anyhow!("gviz wrapper: no opening paren"))?;
    let end = body
        .rfind(')')
        .ok_or_else(|| anyhow!("gviz wrapper: no closing paren"))?;
    if end <= start {
        return Err(anyhow!("gviz wrapper: malformed"));
    }
    Ok(&body[start + 1..end])
}

fn cell_str(row: &Row, idx: usize) -> Option<String> {
    row.c
        .get(idx)?
        .as_ref()?
        .v
        .as_ref()
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

enum Mode {
    Fixture(String),
    Http { url: String, client: reqwest::Client },
}

pub struct SheetsAdapter {
    mode: Mode,
}

impl SheetsAdapter {
    pub fn from_fixture_str(body: &str) -> Self {
        Self {
            mode: Mode::Fixture(body.to_string()),
        }
    }

    pub fn from_url(url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("nashra-sync-engine/0.1")
            .connect_timeout(std::time::Duration::from_secs(4))
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("reqwest client");
        Self {
            mode: Mode::Http {
                url: url.into(),
                client,
            },
        }
    }

    fn parse_body(body: &str) -> Result<Vec<Candidate>> {
        let json = unwrap_gviz(body)?;
        let gviz: Gviz = serde_json::from_str(json).context("parsing gviz json")?;

        let mut out = Vec::with_capacity(gviz.table.rows.len());
        for row in &gviz.table.rows {
            let Some(title) = cell_str(row, 0) else {
                continue;
            };
            let content = cell_str(row, 1).unwrap_or_default();
            out.push(Candidate {
                title,
                content,
                source: SOURCE_NAME.to_string(),
                date: Utc::now(),
                category: cell_str(row, 2).as_deref().and_then(Category::parse_label),
                image: cell_str(row, 3),
                original_link: cell_str(row, 4),
                video_url: None,
            });
        }
        Ok(out)
    }
}

#[async_trait]
impl SourceAdapter for SheetsAdapter {
    async fn fetch(&self) -> Result<Vec<Candidate>> {
        match &self.mode {
            Mode::Fixture(s) => Self::parse_body(s),
            Mode::Http { url, client } => {
                let body = client
                    .get(url)
                    .send()
                    .await
                    .context("sheets http get()")?
                    .text()
                    .await
                    .context("sheets http .text()")?;
                Self::parse_body(&body)
            }
        }
    }

    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Sheets
    }
}
