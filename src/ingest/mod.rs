//! 수집 모듈 - 파일 → 텍스트 추출 → 문서 저장소
//!
//! 파일 이름(경로의 마지막 구성요소)을 문서 키로 사용합니다.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::extractor::{ContentExtractor, ExtractedContent};
use crate::knowledge::{AddOutcome, DocumentStore, UserId};

/// 수집 결과
#[derive(Debug, Clone)]
pub struct IngestReport {
    pub outcome: AddOutcome,
    pub extracted_chars: usize,
    pub content: ExtractedContent,
}

/// 문서 수집기
pub struct Ingestor {
    store: Arc<DocumentStore>,
    extractor: ContentExtractor,
}

impl Ingestor {
    pub fn new(store: Arc<DocumentStore>, extractor: ContentExtractor) -> Self {
        Self { store, extractor }
    }

    pub fn store(&self) -> &Arc<DocumentStore> {
        &self.store
    }

    /// 파일을 추출하여 사용자 컬렉션에 추가
    pub async fn ingest_path(&self, uid: &UserId, path: &Path) -> Result<IngestReport> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow::anyhow!("Invalid file name: {:?}", path))?
            .to_string();

        let content = self
            .extractor
            .extract(path)
            .await
            .with_context(|| format!("Failed to extract {}", file_name))?;

        let outcome = self.ingest_text(uid, &file_name, &content.text)?;

        tracing::info!(
            "Ingested {} for user {} ({:?}, {} chunks)",
            file_name,
            uid,
            content.method,
            outcome.chunks_count
        );

        Ok(IngestReport {
            extracted_chars: content.text.chars().count(),
            outcome,
            content,
        })
    }

    /// 이미 추출된 텍스트를 추가
    pub fn ingest_text(&self, uid: &UserId, file_name: &str, text: &str) -> Result<AddOutcome> {
        let outcome = self
            .store
            .add_document(uid, file_name, text)
            .with_context(|| format!("Failed to store {}", file_name))?;
        Ok(outcome)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_ingestor() -> Ingestor {
        Ingestor::new(
            Arc::new(DocumentStore::with_defaults()),
            ContentExtractor::local_only(),
        )
    }

    #[tokio::test]
    async fn test_ingest_path_uses_file_name() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("minutes.txt");
        std::fs::write(&path, "Board met on Monday. Budget approved.").unwrap();

        let ingestor = create_ingestor();
        let uid = UserId::from("alice");
        let report = ingestor.ingest_path(&uid, &path).await.unwrap();

        assert_eq!(report.outcome.file_name, "minutes.txt");
        assert_eq!(report.outcome.total_documents, 1);
        assert_eq!(report.extracted_chars, 37);
        assert_eq!(ingestor.store().document_names(&uid), vec!["minutes.txt"]);
    }

    #[tokio::test]
    async fn test_reingest_overwrites() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("draft.md");
        let ingestor = create_ingestor();
        let uid = UserId::from("alice");

        std::fs::write(&path, "First draft.").unwrap();
        ingestor.ingest_path(&uid, &path).await.unwrap();
        std::fs::write(&path, "Second draft.").unwrap();
        let report = ingestor.ingest_path(&uid, &path).await.unwrap();

        assert_eq!(report.outcome.total_documents, 1);
        assert_eq!(ingestor.store().get_documents(&uid)[0].content, "Second draft.");
    }

    #[tokio::test]
    async fn test_extraction_failure_leaves_store_untouched() {
        let ingestor = create_ingestor();
        let uid = UserId::from("alice");

        let result = ingestor
            .ingest_path(&uid, Path::new("/nonexistent/missing.txt"))
            .await;
        assert!(result.is_err());
        assert_eq!(ingestor.store().document_count(&uid), 0);
    }

    #[test]
    fn test_ingest_text_rejects_empty_name() {
        let ingestor = create_ingestor();
        let err = ingestor
            .ingest_text(&UserId::from("alice"), "", "text")
            .unwrap_err();
        assert!(err.to_string().contains("Failed to store"));
    }
}
