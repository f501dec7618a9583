//! 원격 텍스트 추출 모듈 (OCR)
//!
//! Gemini에 이미지나 스캔 PDF를 인라인 데이터로 보내 텍스트를 추출합니다.

use std::path::Path;

use anyhow::{Context, Result};

use crate::llm::{GeminiClient, Part};

/// 원격 추출 프롬프트
const EXTRACTION_PROMPT: &str = r#"이 파일에서 모든 텍스트 콘텐츠를 추출해주세요.

지시사항:
1. 보이는 모든 텍스트를 원래 읽는 순서대로 추출합니다
2. 표, 캡션, 각주도 포함합니다
3. 원본 언어를 유지하고 번역하지 않습니다
4. 설명이나 요약 없이 추출된 텍스트만 출력합니다
5. 텍스트가 없으면 "[텍스트 없음]"이라고 응답합니다

추출된 텍스트:"#;

/// 파일에서 원격으로 텍스트 추출
pub async fn extract_text_remote(client: &GeminiClient, path: &Path) -> Result<String> {
    let mime_type = get_mime_type(path)?;

    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read file: {:?}", path))?;

    let text = client
        .generate_content(vec![
            Part::text(EXTRACTION_PROMPT),
            Part::inline_data(mime_type, &data),
        ])
        .await
        .with_context(|| format!("Remote extraction failed: {:?}", path))?;

    if text.trim().is_empty() {
        tracing::warn!("No text extracted remotely from: {:?}", path);
    } else {
        tracing::debug!("Remote extraction returned {} chars for {:?}", text.len(), path);
    }

    Ok(text)
}

/// 파일 경로에서 MIME 타입 결정
pub fn get_mime_type(path: &Path) -> Result<&'static str> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "png" => Ok("image/png"),
        "jpg" | "jpeg" => Ok("image/jpeg"),
        "webp" => Ok("image/webp"),
        "gif" => Ok("image/gif"),
        "bmp" => Ok("image/bmp"),
        "pdf" => Ok("application/pdf"),
        _ => anyhow::bail!("Unsupported format for remote extraction: {}", ext),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_mime_type() {
        assert_eq!(get_mime_type(Path::new("scan.png")).unwrap(), "image/png");
        assert_eq!(get_mime_type(Path::new("photo.JPEG")).unwrap(), "image/jpeg");
        assert_eq!(get_mime_type(Path::new("scan.pdf")).unwrap(), "application/pdf");
        assert!(get_mime_type(Path::new("notes.txt")).is_err());
        assert!(get_mime_type(Path::new("noext")).is_err());
    }
}
