//! 콘텐츠 추출 모듈
//!
//! 업로드된 파일에서 텍스트를 추출합니다.
//! - 텍스트 파일: 직접 읽기
//! - PDF 파일: pdf-extract (로컬) → 텍스트가 없으면 Gemini (원격 OCR)
//! - 이미지 파일: Gemini (원격 OCR)

pub mod pdf;
pub mod vision;

use std::path::Path;

use anyhow::{Context, Result};

use crate::llm::GeminiClient;

// ============================================================================
// File Types
// ============================================================================

/// 지원하는 파일 타입
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    /// 텍스트 파일 (마크다운, CSV, 코드 등)
    Text,
    /// 이미지 파일 (원격 OCR로 처리)
    Image,
    /// PDF 파일
    Pdf,
}

impl FileType {
    /// 확장자로 파일 타입 결정
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "md" | "txt" | "csv" | "tsv" | "json" | "html" | "htm" | "xml" | "yaml" | "yml"
            | "toml" | "log" | "rst" | "rs" | "py" | "js" | "ts" | "go" | "java" | "sql" => {
                Some(FileType::Text)
            }
            "png" | "jpg" | "jpeg" | "webp" | "gif" | "bmp" => Some(FileType::Image),
            "pdf" => Some(FileType::Pdf),
            _ => None,
        }
    }

    /// 파일 경로에서 타입 결정
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    pub fn label(&self) -> &'static str {
        match self {
            FileType::Text => "TXT",
            FileType::Image => "IMG",
            FileType::Pdf => "PDF",
        }
    }
}

// ============================================================================
// Extracted Content
// ============================================================================

/// 추출 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionMethod {
    /// 로컬 추출 (파일 읽기, pdf-extract)
    Local,
    /// 원격 OCR
    Remote,
}

/// 추출된 콘텐츠
#[derive(Debug, Clone)]
pub struct ExtractedContent {
    pub text: String,
    /// 원본 파일 타입
    pub source_type: FileType,
    pub method: ExtractionMethod,
    /// PDF 페이지 수 (로컬 추출 시)
    pub page_count: Option<usize>,
}

// ============================================================================
// Content Extractor
// ============================================================================

/// 콘텐츠 추출기
///
/// 원격 OCR 클라이언트가 없으면 이미지는 처리할 수 없고,
/// 텍스트 레이어가 없는 PDF는 빈 텍스트가 됩니다.
#[derive(Debug, Clone, Default)]
pub struct ContentExtractor {
    ocr: Option<GeminiClient>,
}

impl ContentExtractor {
    pub fn new(ocr: Option<GeminiClient>) -> Self {
        Self { ocr }
    }

    /// 로컬 추출만 사용
    pub fn local_only() -> Self {
        Self::new(None)
    }

    /// 환경변수에 API 키가 있으면 원격 OCR 사용
    pub fn from_env(model: &str) -> Self {
        match GeminiClient::from_env(model) {
            Ok(client) => Self::new(Some(client)),
            Err(e) => {
                tracing::debug!("Remote OCR disabled: {}", e);
                Self::local_only()
            }
        }
    }

    pub fn has_ocr(&self) -> bool {
        self.ocr.is_some()
    }

    /// 파일에서 콘텐츠 추출
    pub async fn extract(&self, path: &Path) -> Result<ExtractedContent> {
        let file_type = FileType::from_path(path)
            .ok_or_else(|| anyhow::anyhow!("Unsupported file type: {:?}", path))?;

        match file_type {
            FileType::Text => self.extract_text(path).await,
            FileType::Image => self.extract_image(path).await,
            FileType::Pdf => self.extract_pdf(path).await,
        }
    }

    /// 텍스트 파일에서 추출
    async fn extract_text(&self, path: &Path) -> Result<ExtractedContent> {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read text file: {:?}", path))?;

        Ok(ExtractedContent {
            text,
            source_type: FileType::Text,
            method: ExtractionMethod::Local,
            page_count: None,
        })
    }

    /// 이미지 파일에서 추출 (원격 전용)
    async fn extract_image(&self, path: &Path) -> Result<ExtractedContent> {
        let ocr = self.ocr.as_ref().ok_or_else(|| {
            anyhow::anyhow!("API key required for image extraction: {:?}", path)
        })?;

        let text = vision::extract_text_remote(ocr, path).await?;

        Ok(ExtractedContent {
            text,
            source_type: FileType::Image,
            method: ExtractionMethod::Remote,
            page_count: None,
        })
    }

    /// PDF 파일에서 추출 (로컬 우선, 원격 폴백)
    async fn extract_pdf(&self, path: &Path) -> Result<ExtractedContent> {
        // PDF 추출은 CPU 바운드이므로 spawn_blocking 사용
        // pdf-extract는 깨진 폰트/인코딩에서 패닉할 수 있음 → 원격 폴백 대상
        let owned = path.to_path_buf();
        let local = flatten_join(
            tokio::task::spawn_blocking(move || pdf::extract_text_from_pdf(&owned)).await,
        );

        match (local, &self.ocr) {
            (Ok(pdf), _) if !pdf.text.trim().is_empty() => Ok(ExtractedContent {
                text: pdf.text,
                source_type: FileType::Pdf,
                method: ExtractionMethod::Local,
                page_count: Some(pdf.page_count),
            }),
            (local, Some(ocr)) => {
                match &local {
                    Ok(_) => tracing::warn!("No text layer in {:?}, using remote OCR", path),
                    Err(e) => tracing::warn!(
                        "Local PDF extraction failed for {:?} ({}), using remote OCR",
                        path,
                        e
                    ),
                }

                let text = vision::extract_text_remote(ocr, path).await?;
                Ok(ExtractedContent {
                    text,
                    source_type: FileType::Pdf,
                    method: ExtractionMethod::Remote,
                    page_count: None,
                })
            }
            (Ok(pdf), None) => {
                tracing::warn!(
                    "No text layer in {:?} and remote OCR is not configured",
                    path
                );
                Ok(ExtractedContent {
                    text: pdf.text,
                    source_type: FileType::Pdf,
                    method: ExtractionMethod::Local,
                    page_count: Some(pdf.page_count),
                })
            }
            (Err(e), None) => Err(e),
        }
    }
}

/// 블로킹 작업 결과 평탄화 (패닉/취소도 추출 실패로 취급)
fn flatten_join<T>(joined: Result<Result<T>, tokio::task::JoinError>) -> Result<T> {
    match joined {
        Ok(result) => result,
        Err(e) => Err(anyhow::Error::new(e).context("PDF extraction task failed")),
    }
}

// ============================================================================
// Tests
// ============================================================================
