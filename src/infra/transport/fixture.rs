//! Transport serving captured endpoint responses from a directory.
//!
//! Layout:
//! - `page-<offset>.json`: one batch page (`diff_files` + `pagination`)
//! - `lines-<slug>.json`: every line of a blob, served by range
//! - `file-<slug>.json`: a single linked-file response
//!
//! `<slug>` is the endpoint with every non-alphanumeric run replaced by `_`.

use super::traits::DiffTransport;
use crate::domain::{LinesRequest, PageRequest, PageResponse, RawLine, SingleFileResponse};
use anyhow::{Context, Result};
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

lazy_static! {
    static ref NON_ALNUM: Regex = Regex::new(r"[^A-Za-z0-9]+").unwrap();
}

pub struct FixtureTransport {
    root: PathBuf,
}

impl FixtureTransport {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn read_json<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let path = self.root.join(name);
        let contents = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("read fixture {}", path.display()))?;
        serde_json::from_str(&contents).with_context(|| format!("parse fixture {}", path.display()))
    }
}

pub fn endpoint_slug(endpoint: &str) -> String {
    NON_ALNUM
        .replace_all(endpoint, "_")
        .trim_matches('_')
        .to_string()
}

#[async_trait]
impl DiffTransport for FixtureTransport {
    fn id(&self) -> &str {
        "fixture"
    }

    async fn fetch_page(&self, _endpoint: &str, request: &PageRequest) -> Result<PageResponse> {
        let mut page: PageResponse = self.read_json(&format!("page-{}.json", request.page)).await?;
        // Captured pages may hold more files than this request asked for.
        page.diff_files.truncate(request.per_page as usize);
        Ok(page)
    }

    async fn fetch_lines(&self, endpoint: &str, request: &LinesRequest) -> Result<Vec<RawLine>> {
        let lines: Vec<RawLine> = self
            .read_json(&format!("lines-{}.json", endpoint_slug(endpoint)))
            .await?;
        if request.full {
            return Ok(lines);
        }
        Ok(lines
            .into_iter()
            .filter(|line| {
                line.new_line
                    .is_some_and(|new_line| new_line >= request.since && new_line <= request.to)
            })
            .collect())
    }

    async fn fetch_single_file(&self, url: &str) -> Result<SingleFileResponse> {
        self.read_json(&format!("file-{}.json", endpoint_slug(url)))
            .await
    }
}
