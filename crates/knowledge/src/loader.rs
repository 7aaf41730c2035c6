//! Document loading: turn a path or URL into a `RawDocument`.

use crate::types::{RawDocument, SourceKind};
use async_trait::async_trait;
use chrono::Utc;
use docqa_core::{AppError, AppResult};
use reqwest::Client;
use std::path::Path;
use std::time::Duration;

/// Source of raw document text.
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    /// Load the document registered as `id` from `location`.
    async fn load(&self, id: &str, location: &str) -> AppResult<RawDocument>;
}

/// `true` when `location` starts with an `http://` or `https://` scheme.
pub fn is_url(location: &str) -> bool {
    let lower = location.get(..8).unwrap_or(location).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Default loader: web pages over HTTP, PDF/HTML/text files from disk.
#[derive(Debug, Clone)]
pub struct SourceLoader {
    client: Client,
}

impl SourceLoader {
    pub fn new(timeout: Duration) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("docqa/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::DocumentLoad(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    async fn load_url(&self, id: &str, url: &str) -> AppResult<RawDocument> {
        tracing::debug!(document = id, "Fetching {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::DocumentLoad(format!("Failed to fetch {}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::DocumentLoad(format!(
                "Fetching {} returned HTTP {}",
                url, status
            )));
        }

        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.contains("html"))
            .unwrap_or(true);

        let body = response
            .text()
            .await
            .map_err(|e| AppError::DocumentLoad(format!("Failed to read body of {}: {}", url, e)))?;

        let content = if is_html { clean_html(&body) } else { body };
        Ok(document(id, url, SourceKind::Url, content, Vec::new()))
    }

    async fn load_file(&self, id: &str, location: &str) -> AppResult<RawDocument> {
        let path = Path::new(location);
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| AppError::DocumentLoad(format!("Failed to read {}: {}", location, e)))?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("pdf") => {
                let (content, page_starts) = extract_pdf(bytes, location).await?;
                Ok(document(id, location, SourceKind::File, content, page_starts))
            }
            Some("html") | Some("htm") => {
                let text = decode_utf8(bytes, location)?;
                Ok(document(id, location, SourceKind::File, clean_html(&text), Vec::new()))
            }
            _ => {
                let text = decode_utf8(bytes, location)?;
                Ok(document(id, location, SourceKind::File, text, Vec::new()))
            }
        }
    }
}

#[async_trait]
impl DocumentLoader for SourceLoader {
    async fn load(&self, id: &str, location: &str) -> AppResult<RawDocument> {
        let document = if is_url(location) {
            self.load_url(id, location).await?
        } else {
            self.load_file(id, location).await?
        };

        tracing::debug!(
            document = id,
            kind = document.source_kind.as_str(),
            chars = document.content.chars().count(),
            pages = document.page_starts.len(),
            "Loaded document"
        );
        Ok(document)
    }
}

fn document(
    id: &str,
    location: &str,
    source_kind: SourceKind,
    content: String,
    page_starts: Vec<usize>,
) -> RawDocument {
    RawDocument {
        id: id.to_string(),
        content,
        source_kind,
        location: location.to_string(),
        page_starts,
        loaded_at: Utc::now(),
    }
}

fn decode_utf8(bytes: Vec<u8>, location: &str) -> AppResult<String> {
    String::from_utf8(bytes).map_err(|_| {
        AppError::DocumentLoad(format!("{} is not UTF-8 text", location))
    })
}

/// Extract page texts and join them, recording the char offset of each page.
async fn extract_pdf(bytes: Vec<u8>, location: &str) -> AppResult<(String, Vec<usize>)> {
    let pages = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem_by_pages(&bytes))
        .await
        .map_err(|e| AppError::DocumentLoad(format!("PDF extraction task failed: {}", e)))?
        .map_err(|e| AppError::DocumentLoad(format!("Failed to extract text from {}: {}", location, e)))?;

    Ok(join_pages(&pages))
}

fn join_pages(pages: &[String]) -> (String, Vec<usize>) {
    let mut content = String::new();
    let mut page_starts = Vec::with_capacity(pages.len());
    let mut offset = 0;

    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            content.push('\n');
            offset += 1;
        }
        page_starts.push(offset);
        content.push_str(page);
        offset += page.chars().count();
    }

    (content, page_starts)
}

/// Strip tags, drop `<script>`/`<style>` bodies, decode common entities and
/// collapse whitespace.
pub fn clean_html(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut rest = html;

    while let Some(open) = rest.find('<') {
        text.push_str(&rest[..open]);
        text.push(' ');
        let tag = &rest[open..];

        let skip_to = ["script", "style"].iter().find_map(|name| {
            let opening = format!("<{}", name);
            let head = tag.get(..opening.len())?;
            if !head.eq_ignore_ascii_case(&opening) {
                return None;
            }
            let closing = format!("</{}", name);
            let lower = tag.to_ascii_lowercase();
            Some(lower.find(&closing).unwrap_or(tag.len()))
        });

        let after = match skip_to {
            Some(end) => &tag[end..],
            None => tag,
        };
        rest = match after.find('>') {
            Some(close) => &after[close + 1..],
            None => "",
        };
    }
    text.push_str(rest);

    let decoded = decode_entities(&text);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/sop"));
        assert!(is_url("HTTP://example.com"));
        assert!(!is_url("docs/HR_Handbook.pdf"));
        assert!(!is_url("httpdocs/file.txt"));
        assert!(!is_url(""));
    }

    #[test]
    fn test_clean_html() {
        let html = r#"<html><head><style>body { color: red; }</style>
<script>var x = "<b>";</script></head>
<body><h1>Vacation</h1><p>Employees get 20&nbsp;days &amp; holidays.</p></body></html>"#;

        assert_eq!(clean_html(html), "Vacation Employees get 20 days & holidays.");
    }

    #[test]
    fn test_clean_html_multibyte_and_unclosed() {
        assert_eq!(clean_html("<p>Olá São Paulo</p><br"), "Olá São Paulo");
        assert_eq!(clean_html("plain text"), "plain text");
    }

    #[test]
    fn test_join_pages_records_offsets() {
        let pages = vec!["first".to_string(), "sécond".to_string(), "third".to_string()];
        let (content, starts) = join_pages(&pages);

        assert_eq!(content, "first\nsécond\nthird");
        assert_eq!(starts, vec![0, 6, 13]);
    }

    #[tokio::test]
    async fn test_load_text_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("policy.txt");
        std::fs::write(&path, "Expense reports are due monthly.").unwrap();

        let loader = SourceLoader::new(Duration::from_secs(5)).unwrap();
        let doc = loader.load("Policy", path.to_str().unwrap()).await.unwrap();

        assert_eq!(doc.id, "Policy");
        assert_eq!(doc.source_kind, SourceKind::File);
        assert_eq!(doc.content, "Expense reports are due monthly.");
        assert!(doc.page_starts.is_empty());
    }

    #[tokio::test]
    async fn test_load_html_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("sop.HTML");
        std::fs::write(&path, "<h1>Deploys</h1><p>Use the checklist.</p>").unwrap();

        let loader = SourceLoader::new(Duration::from_secs(5)).unwrap();
        let doc = loader.load("SOP", path.to_str().unwrap()).await.unwrap();
        assert_eq!(doc.content, "Deploys Use the checklist.");
    }

    #[tokio::test]
    async fn test_missing_file_is_load_error() {
        let loader = SourceLoader::new(Duration::from_secs(5)).unwrap();
        let result = loader.load("Ghost", "/nonexistent/ghost.pdf").await;
        assert!(matches!(result, Err(AppError::DocumentLoad(_))));
    }

    #[tokio::test]
    async fn test_binary_file_is_load_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("blob.bin");
        std::fs::write(&path, [0xff, 0xfe, 0x00, 0x80]).unwrap();

        let loader = SourceLoader::new(Duration::from_secs(5)).unwrap();
        let result = loader.load("Blob", path.to_str().unwrap()).await;
        assert!(matches!(result, Err(AppError::DocumentLoad(_))));
    }

    #[tokio::test]
    async fn test_invalid_pdf_is_load_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.pdf");
        std::fs::write(&path, b"not a pdf").unwrap();

        let loader = SourceLoader::new(Duration::from_secs(5)).unwrap();
        let result = loader.load("Broken", path.to_str().unwrap()).await;
        assert!(matches!(result, Err(AppError::DocumentLoad(_))));
    }
}
