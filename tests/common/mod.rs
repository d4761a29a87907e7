#![allow(dead_code)]

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use diffstate::domain::{
    LinesRequest, PageRequest, PageResponse, Pagination, RawDiffFile, RawLine, RawMatchMeta,
    SingleFileResponse,
};
use diffstate::infra::app_config::EngineConfig;
use diffstate::{DiffEvent, DiffReviewSession, DiffTransport, SharedSession};
use parking_lot::Mutex;
use std::collections::HashMap;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

/// In-memory server: pages are slices of `files` at the requested offset.
#[derive(Default)]
pub struct FakeTransport {
    pub files: Vec<RawDiffFile>,
    pub total_pages: Option<u32>,
    pub blobs: HashMap<String, Vec<RawLine>>,
    pub single_files: HashMap<String, SingleFileResponse>,
    pub fail_at_offset: Option<u32>,
    pub fail_lines: bool,
    /// Resets this session when the page at the given offset is requested.
    pub reset_on_offset: Option<(u32, SharedSession)>,
    pub page_requests: Mutex<Vec<PageRequest>>,
    pub line_requests: Mutex<Vec<LinesRequest>>,
}

impl FakeTransport {
    pub fn paged(files: Vec<RawDiffFile>, total_pages: Option<u32>) -> Self {
        Self {
            files,
            total_pages,
            ..Default::default()
        }
    }

    pub fn page_sizes(&self) -> Vec<u32> {
        self.page_requests.lock().iter().map(|r| r.per_page).collect()
    }

    pub fn page_offsets(&self) -> Vec<u32> {
        self.page_requests.lock().iter().map(|r| r.page).collect()
    }
}

#[async_trait]
impl DiffTransport for FakeTransport {
    fn id(&self) -> &str {
        "fake"
    }

    async fn fetch_page(&self, _endpoint: &str, request: &PageRequest) -> Result<PageResponse> {
        self.page_requests.lock().push(request.clone());
        if let Some((offset, session)) = &self.reset_on_offset
            && *offset == request.page
        {
            session.lock().reset();
        }
        if self.fail_at_offset == Some(request.page) {
            return Err(anyhow!("500 Internal Server Error"));
        }
        let start = (request.page as usize).min(self.files.len());
        let end = (start + request.per_page as usize).min(self.files.len());
        Ok(PageResponse {
            diff_files: self.files[start..end].to_vec(),
            pagination: Pagination {
                total_pages: self.total_pages,
            },
        })
    }

    async fn fetch_lines(&self, endpoint: &str, request: &LinesRequest) -> Result<Vec<RawLine>> {
        self.line_requests.lock().push(request.clone());
        if self.fail_lines {
            return Err(anyhow!("connection reset"));
        }
        let blob = self
            .blobs
            .get(endpoint)
            .ok_or_else(|| anyhow!("no blob at {endpoint}"))?;
        if request.full {
            return Ok(blob.clone());
        }
        Ok(blob
            .iter()
            .filter(|line| {
                line.new_line
                    .is_some_and(|n| n >= request.since && n <= request.to)
            })
            .cloned()
            .collect())
    }

    async fn fetch_single_file(&self, url: &str) -> Result<SingleFileResponse> {
        self.single_files
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("404 for {url}"))
    }
}

pub fn session(config: EngineConfig) -> SharedSession {
    DiffReviewSession::new(config, Default::default()).shared()
}

pub fn channel() -> (UnboundedSender<DiffEvent>, UnboundedReceiver<DiffEvent>) {
    tokio::sync::mpsc::unbounded_channel()
}

pub fn drain(receiver: &mut UnboundedReceiver<DiffEvent>) -> Vec<DiffEvent> {
    let mut events = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        events.push(event);
    }
    events
}

pub fn context_line(file_hash: &str, old: u32, new: u32) -> RawLine {
    RawLine {
        line_code: Some(format!("{file_hash}_{old}_{new}")),
        kind: None,
        old_line: Some(old),
        new_line: Some(new),
        rich_text: Some(format!(" line {new}")),
        ..Default::default()
    }
}

pub fn match_line(old_pos: u32, new_pos: u32) -> RawLine {
    RawLine {
        kind: Some("match".into()),
        rich_text: Some("@@ -1,1 +1,1 @@".into()),
        meta_data: Some(RawMatchMeta { old_pos, new_pos }),
        ..Default::default()
    }
}

/// Blob lines numbered 1..=count, the way a context lines endpoint serves them.
pub fn blob(count: u32) -> Vec<RawLine> {
    (1..=count)
        .map(|n| RawLine {
            new_line: Some(n),
            old_line: Some(n),
            rich_text: Some(format!(" line {n}")),
            ..Default::default()
        })
        .collect()
}

pub fn file(file_hash: &str, path: &str) -> RawDiffFile {
    RawDiffFile {
        file_hash: Some(file_hash.into()),
        content_sha: Some(format!("sha-{file_hash}")),
        new_path: Some(path.into()),
        old_path: Some(path.into()),
        added_lines: 1,
        context_lines_path: Some(format!("/blob/{path}")),
        ..Default::default()
    }
}

/// A file with lines; the same lines back both representations.
pub fn file_with_lines(file_hash: &str, path: &str, lines: Vec<RawLine>) -> RawDiffFile {
    RawDiffFile {
        parallel_diff_lines: Some(
            lines
                .iter()
                .cloned()
                .map(|line| diffstate::domain::RawParallelLine {
                    left: Some(line.clone()),
                    right: Some(line),
                })
                .collect(),
        ),
        highlighted_diff_lines: Some(lines),
        ..file(file_hash, path)
    }
}

pub fn many_files(count: usize) -> Vec<RawDiffFile> {
    (0..count)
        .map(|i| file(&format!("hash{i}"), &format!("app/file_{i}.rb")))
        .collect()
}
