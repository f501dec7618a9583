//! PDF 텍스트 추출 모듈
//!
//! pdf-extract 크레이트를 사용하여 PDF에서 텍스트 레이어를 추출합니다.
//! 스캔 문서처럼 텍스트 레이어가 없으면 빈 텍스트를 반환합니다.

use std::path::Path;
use std::sync::OnceLock;

use anyhow::{Context, Result};
use regex::Regex;

/// 추출된 PDF 텍스트
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfText {
    /// 페이지를 빈 줄로 이어붙인 전체 텍스트
    pub text: String,
    /// 감지된 페이지 수 (텍스트가 없으면 0)
    pub page_count: usize,
}

/// PDF에서 텍스트 추출 (CPU 바운드, 블로킹)
pub fn extract_text_from_pdf(path: &Path) -> Result<PdfText> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read PDF: {:?}", path))?;

    let text = pdf_extract::extract_text_from_mem(&bytes)
        .with_context(|| format!("Failed to extract text from PDF: {:?}", path))?;

    if text.trim().is_empty() {
        tracing::warn!(
            "No text extracted from PDF: {:?}. It might be a scanned document.",
            path
        );
        return Ok(PdfText {
            text: String::new(),
            page_count: 0,
        });
    }

    let pages = split_pdf_pages(&text);
    tracing::debug!("Extracted {} pages from {:?}", pages.len(), path);

    Ok(PdfText {
        page_count: pages.len(),
        text: pages.join("\n\n"),
    })
}

fn page_marker() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    // 예: "--- Page 1 ---" 또는 "=== 2 ==="
    MARKER.get_or_init(|| {
        Regex::new(r"(?m)^[\s]*[-=]+[\s]*(?:Page[\s]*)?(\d+)[\s]*[-=]+[\s]*$")
            .expect("Invalid regex")
    })
}

/// PDF 텍스트를 페이지별로 분리
///
/// 폼피드(`\x0c`)를 먼저 시도하고, 없으면 페이지 구분자 줄을 찾습니다.
fn split_pdf_pages(text: &str) -> Vec<String> {
    let pages: Vec<String> = text
        .split('\x0c')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if pages.len() > 1 {
        return pages;
    }

    let marker = page_marker();
    if marker.is_match(text) {
        let pages: Vec<String> = marker
            .split(text)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        if pages.len() > 1 {
            return pages;
        }
    }

    vec![text.trim().to_string()]
}

// ============================================================================
// Tests
// ============================================================================
