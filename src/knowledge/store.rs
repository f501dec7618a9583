//! Document Store - 사용자별 인메모리 문서 저장소
//!
//! 사용자 ID마다 업로드 순서를 유지하는 문서 컬렉션을 관리합니다.
//! 문서는 추가 시점에 즉시 청킹되며, 청크 단위 키워드 검색을 제공합니다.
//! 저장은 프로세스 수명 동안만 유지됩니다.

use std::collections::HashMap;
use std::fmt;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::chunker::{default_chunker, Chunker};
use super::scorer::QueryTerms;

/// 검색 결과 기본 최대 개수
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

// ============================================================================
// Errors
// ============================================================================

/// 저장소 에러
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// 잘못된 입력 (예: 빈 파일 이름)
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

// ============================================================================
// Types
// ============================================================================

/// 사용자 식별자 (문자열 또는 숫자)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for UserId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<i64> for UserId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl From<u64> for UserId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

/// 저장된 문서
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// 파일 이름 (사용자 컬렉션 내 고유 키)
    pub file_name: String,
    /// 추출된 전체 텍스트
    pub content: String,
    /// 순서가 있는 청크 (content에서 파생)
    pub chunks: Vec<String>,
    pub uploaded_at: DateTime<Utc>,
}

impl Document {
    /// 문서 생성 및 청킹
    ///
    /// 파일 이름이 비어 있으면 `InvalidArgument`를 반환합니다.
    /// 내용이 비어 있는 것은 허용됩니다.
    pub fn new(
        file_name: impl Into<String>,
        content: impl Into<String>,
        chunker: &dyn Chunker,
    ) -> Result<Self, StoreError> {
        let file_name = file_name.into();
        if file_name.trim().is_empty() {
            return Err(StoreError::InvalidArgument(
                "file name must not be empty".to_string(),
            ));
        }

        let content = content.into();
        let chunks = chunker.chunk(&content);

        Ok(Self {
            file_name,
            content,
            chunks,
            uploaded_at: Utc::now(),
        })
    }
}

/// 문서 추가 결과
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddOutcome {
    pub file_name: String,
    pub chunks_count: usize,
    /// 추가 후 사용자의 전체 문서 수
    pub total_documents: usize,
}

/// 청크 검색 결과
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub file_name: String,
    pub chunk: String,
    pub score: u32,
}

/// 문서 전체 본문 (컨텍스트 조립용)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentContent {
    pub file_name: String,
    pub content: String,
}

/// 저장소 통계
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub user_count: usize,
    pub document_count: usize,
    pub chunk_count: usize,
    pub total_content_chars: usize,
}

// ============================================================================
// DocumentStore
// ============================================================================

/// 사용자별 문서 저장소
///
/// 전체 컬렉션 맵을 하나의 `RwLock`으로 보호합니다. 청킹은 잠금 밖에서
/// 수행되며, 같은 `(uid, file_name)`에 대한 동시 추가는 마지막 쓰기가 이깁니다.
pub struct DocumentStore {
    collections: RwLock<HashMap<UserId, Vec<Document>>>,
    chunker: Box<dyn Chunker>,
    search_limit: usize,
}

impl DocumentStore {
    /// 청커와 검색 결과 제한을 지정하여 생성
    pub fn new(chunker: Box<dyn Chunker>, search_limit: usize) -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            chunker,
            search_limit,
        }
    }

    /// 기본 청커(3000 / 500), 검색 결과 10개로 생성
    pub fn with_defaults() -> Self {
        Self::new(default_chunker(), DEFAULT_SEARCH_LIMIT)
    }

    pub fn chunker_name(&self) -> &'static str {
        self.chunker.name()
    }

    pub fn search_limit(&self) -> usize {
        self.search_limit
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<UserId, Vec<Document>>> {
        self.collections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<UserId, Vec<Document>>> {
        self.collections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// 문서 추가 (같은 파일 이름이면 같은 위치에 덮어쓰기)
    pub fn add_document(
        &self,
        uid: &UserId,
        file_name: &str,
        content: &str,
    ) -> Result<AddOutcome, StoreError> {
        let document = Document::new(file_name, content, self.chunker.as_ref())?;
        let chunks_count = document.chunks.len();

        let mut collections = self.write();
        let docs = collections.entry(uid.clone()).or_default();

        match docs.iter().position(|d| d.file_name == file_name) {
            Some(index) => {
                docs[index] = document;
                tracing::info!(
                    "Replaced document: {} (user={}, index={}, chunks={})",
                    file_name,
                    uid,
                    index,
                    chunks_count
                );
            }
            None => {
                docs.push(document);
                tracing::info!(
                    "Added document: {} (user={}, chunks={})",
                    file_name,
                    uid,
                    chunks_count
                );
            }
        }

        Ok(AddOutcome {
            file_name: file_name.to_string(),
            chunks_count,
            total_documents: docs.len(),
        })
    }

    /// 사용자의 문서 목록 (없으면 빈 목록)
    pub fn get_documents(&self, uid: &UserId) -> Vec<Document> {
        self.read().get(uid).cloned().unwrap_or_default()
    }

    /// 사용자의 문서 수
    pub fn document_count(&self, uid: &UserId) -> usize {
        self.read().get(uid).map(Vec::len).unwrap_or(0)
    }

    /// 컬렉션 순서대로 파일 이름 목록
    pub fn document_names(&self, uid: &UserId) -> Vec<String> {
        self.read()
            .get(uid)
            .map(|docs| docs.iter().map(|d| d.file_name.clone()).collect())
            .unwrap_or_default()
    }

    /// 문서 삭제 (첫 번째 일치 항목)
    pub fn delete_document(&self, uid: &UserId, file_name: &str) -> bool {
        let mut collections = self.write();
        let Some(docs) = collections.get_mut(uid) else {
            return false;
        };

        match docs.iter().position(|d| d.file_name == file_name) {
            Some(index) => {
                docs.remove(index);
                tracing::info!("Deleted document: {} (user={})", file_name, uid);
                true
            }
            None => false,
        }
    }

    /// 사용자 컬렉션 전체 삭제 (항상 true)
    pub fn clear_documents(&self, uid: &UserId) -> bool {
        let removed = self.write().remove(uid);
        tracing::info!(
            "Cleared documents for user {} ({} removed)",
            uid,
            removed.map(|docs| docs.len()).unwrap_or(0)
        );
        true
    }

    /// 청크 키워드 검색
    ///
    /// 모든 문서의 모든 청크를 점수화하고, 0점을 제외한 뒤 점수 내림차순으로
    /// 정렬합니다. 동점은 문서 → 청크 순서를 유지합니다 (안정 정렬).
    pub fn search_documents(&self, uid: &UserId, query: &str) -> Vec<SearchResult> {
        let terms = QueryTerms::parse(query);
        if terms.is_empty() {
            return vec![];
        }

        let collections = self.read();
        let Some(docs) = collections.get(uid) else {
            return vec![];
        };

        let mut results: Vec<SearchResult> = docs
            .iter()
            .flat_map(|doc| {
                doc.chunks.iter().map(move |chunk| (doc.file_name.as_str(), chunk))
            })
            .filter_map(|(file_name, chunk)| {
                let score = terms.score(chunk);
                (score > 0).then(|| SearchResult {
                    file_name: file_name.to_string(),
                    chunk: chunk.clone(),
                    score,
                })
            })
            .collect();
        drop(collections);

        results.sort_by(|a, b| b.score.cmp(&a.score));
        results.truncate(self.search_limit);

        tracing::debug!(
            "Search for {:?} (user={}) returned {} results",
            query,
            uid,
            results.len()
        );
        results
    }

    /// 전체 문서 본문 (청크 미사용, 잘림 없음)
    pub fn get_all_content(&self, uid: &UserId) -> Vec<DocumentContent> {
        self.read()
            .get(uid)
            .map(|docs| {
                docs.iter()
                    .map(|d| DocumentContent {
                        file_name: d.file_name.clone(),
                        content: d.content.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// 저장소 통계
    pub fn stats(&self) -> StoreStats {
        let collections = self.read();
        let mut stats = StoreStats {
            user_count: collections.len(),
            ..Default::default()
        };

        for doc in collections.values().flatten() {
            stats.document_count += 1;
            stats.chunk_count += doc.chunks.len();
            stats.total_content_chars += doc.content.chars().count();
        }

        stats
    }
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::with_defaults()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use crate::knowledge::chunker::{sentence_chunker, ChunkConfig};

    /// 문장 하나가 청크 하나가 되는 저장소
    fn sentence_per_chunk_store() -> DocumentStore {
        DocumentStore::new(sentence_chunker(ChunkConfig::new(1, 0)), DEFAULT_SEARCH_LIMIT)
    }

    #[test]
    fn test_add_and_get_document() {
        let store = DocumentStore::with_defaults();
        let uid = UserId::from("alice");

        let outcome = store
            .add_document(&uid, "report.pdf", "Quarterly results. Revenue grew.")
            .unwrap();
        assert_eq!(
            outcome,
            AddOutcome {
                file_name: "report.pdf".to_string(),
                chunks_count: 1,
                total_documents: 1,
            }
        );

        let docs = store.get_documents(&uid);
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].content, "Quarterly results. Revenue grew.");
        assert_eq!(docs[0].chunks, vec!["Quarterly results. Revenue grew.".to_string()]);
    }

    #[test]
    fn test_empty_file_name_rejected() {
        let store = DocumentStore::with_defaults();
        let uid = UserId::from("alice");

        let err = store.add_document(&uid, "  ", "content").unwrap_err();
        assert!(matches!(err, StoreError::InvalidArgument(_)));
        assert_eq!(store.document_count(&uid), 0);
    }

    #[test]
    fn test_empty_content_allowed() {
        let store = DocumentStore::with_defaults();
        let uid = UserId::from(7_i64);

        let outcome = store.add_document(&uid, "empty.txt", "").unwrap();
        assert_eq!(outcome.chunks_count, 1);
        assert_eq!(store.get_documents(&uid)[0].chunks, vec![String::new()]);
    }

    #[test]
    fn test_overwrite_keeps_index() {
        let store = DocumentStore::with_defaults();
        let uid = UserId::from("alice");

        store.add_document(&uid, "a.pdf", "X").unwrap();
        store.add_document(&uid, "b.pdf", "B").unwrap();
        let outcome = store.add_document(&uid, "a.pdf", "Y").unwrap();

        assert_eq!(outcome.total_documents, 2);
        assert_eq!(store.document_count(&uid), 2);
        assert_eq!(store.document_names(&uid), vec!["a.pdf", "b.pdf"]);
        assert_eq!(store.get_documents(&uid)[0].content, "Y");
    }

    #[test]
    fn test_unknown_user_is_empty() {
        let store = DocumentStore::with_defaults();
        let uid = UserId::from("nobody");

        assert!(store.get_documents(&uid).is_empty());
        assert_eq!(store.document_count(&uid), 0);
        assert!(store.document_names(&uid).is_empty());
        assert!(store.get_all_content(&uid).is_empty());
        assert!(store.search_documents(&uid, "anything").is_empty());
        assert!(!store.delete_document(&uid, "a.pdf"));
    }

    #[test]
    fn test_users_are_isolated() {
        let store = DocumentStore::with_defaults();
        let alice = UserId::from("alice");
        let bob = UserId::from(42_u64);

        store.add_document(&alice, "same.txt", "alice text").unwrap();
        store.add_document(&bob, "same.txt", "bob text").unwrap();

        assert_eq!(store.get_documents(&alice)[0].content, "alice text");
        assert_eq!(store.get_documents(&bob)[0].content, "bob text");
        assert!(store.search_documents(&alice, "bob").is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_adds_and_deletes_stay_consistent() {
        let store = Arc::new(DocumentStore::with_defaults());
        let uid = UserId::from("alice");

        let mut handles = Vec::new();
        for t in 0..8 {
            let store = store.clone();
            let uid = uid.clone();
            handles.push(tokio::task::spawn_blocking(move || {
                for i in 0..100 {
                    let name = format!("t{}-{}.txt", t, i);
                    store
                        .add_document(&uid, &name, &format!("Worker {} doc {}.", t, i))
                        .unwrap();
                }
                // 짝수 번호 문서 삭제
                for i in (0..100).step_by(2) {
                    assert!(store.delete_document(&uid, &format!("t{}-{}.txt", t, i)));
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.document_count(&uid), 400);
        let stats = store.stats();
        assert_eq!(stats.document_count, 400);
        assert_eq!(stats.user_count, 1);

        let names = store.document_names(&uid);
        assert!(names.iter().all(|n| {
            let i: usize = n.trim_end_matches(".txt").rsplit('-').next().unwrap().parse().unwrap();
            i % 2 == 1
        }));
    }

    #[test]
    fn test_delete_document() {
        let store = DocumentStore::with_defaults();
        let uid = UserId::from("alice");

        store.add_document(&uid, "a.pdf", "A").unwrap();
        store.add_document(&uid, "b.pdf", "B").unwrap();

        assert!(store.delete_document(&uid, "a.pdf"));
        assert!(!store.delete_document(&uid, "a.pdf"));
        assert_eq!(store.document_names(&uid), vec!["b.pdf"]);
    }

    #[test]
    fn test_clear_then_re_add() {
        let store = DocumentStore::with_defaults();
        let uid = UserId::from("alice");

        store.add_document(&uid, "old.txt", "Old budget notes.").unwrap();
        assert!(store.clear_documents(&uid));
        assert_eq!(store.document_count(&uid), 0);
        assert!(store.clear_documents(&uid));

        let outcome = store.add_document(&uid, "new.txt", "Fresh start.").unwrap();
        assert_eq!(outcome.total_documents, 1);
        assert!(store.search_documents(&uid, "budget").is_empty());
    }

    #[test]
    fn test_search_ordering_is_stable() {
        let store = sentence_per_chunk_store();
        let uid = UserId::from("alice");

        // 청크 점수: [5, 5, 3, 0, 8]
        store
            .add_document(
                &uid,
                "first.txt",
                "tax tax tax first. tax tax tax second. tax alone. nothing here.",
            )
            .unwrap();
        store
            .add_document(&uid, "second.txt", "tax tax tax tax tax tax last.")
            .unwrap();

        let results = store.search_documents(&uid, "tax");
        let scores: Vec<u32> = results.iter().map(|r| r.score).collect();
        assert_eq!(scores, vec![8, 5, 5, 3]);
        assert_eq!(results[0].file_name, "second.txt");
        assert_eq!(results[1].chunk, "tax tax tax first.");
        assert_eq!(results[2].chunk, "tax tax tax second.");
    }

    #[test]
    fn test_search_truncates_to_limit() {
        let store = sentence_per_chunk_store();
        let uid = UserId::from("alice");

        let text = (0..25)
            .map(|i| format!("Invoice line {}.", i))
            .collect::<Vec<_>>()
            .join(" ");
        store.add_document(&uid, "invoices.txt", &text).unwrap();

        let results = store.search_documents(&uid, "invoice");
        assert_eq!(results.len(), DEFAULT_SEARCH_LIMIT);
        assert_eq!(results[0].chunk, "Invoice line 0.");
    }

    #[test]
    fn test_custom_search_limit() {
        let store = DocumentStore::new(sentence_chunker(ChunkConfig::new(1, 0)), 3);
        assert_eq!(store.search_limit(), 3);
        assert_eq!(store.chunker_name(), "SentenceChunker");

        let uid = UserId::from("alice");
        store
            .add_document(&uid, "a.txt", "Tax one. Tax two. Tax three. Tax four.")
            .unwrap();
        assert_eq!(store.search_documents(&uid, "tax").len(), 3);
    }

    #[test]
    fn test_search_without_scoring_words() {
        let store = DocumentStore::with_defaults();
        let uid = UserId::from("alice");
        store.add_document(&uid, "a.txt", "an is to of").unwrap();

        assert!(store.search_documents(&uid, "an is to").is_empty());
        assert!(store.search_documents(&uid, "   ").is_empty());
    }

    #[test]
    fn test_get_all_content() {
        let store = sentence_per_chunk_store();
        let uid = UserId::from("alice");
        store.add_document(&uid, "a.txt", "One. Two. Three.").unwrap();
        store.add_document(&uid, "b.txt", "Four.").unwrap();

        let all = store.get_all_content(&uid);
        assert_eq!(
            all,
            vec![
                DocumentContent {
                    file_name: "a.txt".to_string(),
                    content: "One. Two. Three.".to_string(),
                },
                DocumentContent {
                    file_name: "b.txt".to_string(),
                    content: "Four.".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_stats() {
        let store = sentence_per_chunk_store();
        store.add_document(&UserId::from("a"), "x.txt", "One. Two.").unwrap();
        store.add_document(&UserId::from("b"), "y.txt", "세 글자.").unwrap();

        assert_eq!(
            store.stats(),
            StoreStats {
                user_count: 2,
                document_count: 2,
                chunk_count: 3,
                total_content_chars: 9 + 5,
            }
        );
    }

    #[test]
    fn test_user_id_conversions() {
        assert_eq!(UserId::from(12_i64), UserId::from("12"));
        assert_eq!(UserId::from(12_u64).to_string(), "12");
        assert_eq!(UserId::from(String::from("u")).as_str(), "u");
    }
}
