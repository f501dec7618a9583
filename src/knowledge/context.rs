//! 컨텍스트 조립 - 다중 문서 전체 본문을 크기 제한 내에서 연결
//!
//! 전체 예산을 문서 수로 균등 분배하고, 예산을 넘는 문서는 앞부분만
//! 남긴 뒤 잘림 표시를 붙입니다. 문서가 많을수록 문서당 허용량이 줄어듭니다.

use serde::Serialize;

use super::store::{DocumentContent, DocumentStore, UserId};

/// 기본 전체 컨텍스트 예산 (문자 수)
pub const DEFAULT_MAX_TOTAL_CONTEXT: usize = 100_000;

/// 잘린 문서 뒤에 붙는 표시
pub const TRUNCATION_MARKER: &str = "\n[... truncated ...]";

// ============================================================================
// Types
// ============================================================================

/// 조립된 컨텍스트
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssembledContext {
    /// 헤더로 구분된 문서 본문들
    pub context: String,
    /// 포함된 모든 파일 이름 (잘림 여부와 무관, 컬렉션 순서)
    pub sources: Vec<String>,
}

// ============================================================================
// ContextAssembler
// ============================================================================

/// 컨텍스트 조립기
#[derive(Debug, Clone, Copy)]
pub struct ContextAssembler {
    max_total_context: usize,
}

impl ContextAssembler {
    pub fn new(max_total_context: usize) -> Self {
        Self { max_total_context }
    }

    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_MAX_TOTAL_CONTEXT)
    }

    pub fn max_total_context(&self) -> usize {
        self.max_total_context
    }

    /// 사용자의 전체 문서로 컨텍스트 조립
    ///
    /// 문서가 없으면 `None` (호출자가 모델 호출 전에 중단해야 함).
    pub fn assemble(&self, store: &DocumentStore, uid: &UserId) -> Option<AssembledContext> {
        let docs = store.get_all_content(uid);
        if docs.is_empty() {
            return None;
        }
        Some(self.assemble_from(&docs))
    }

    /// 문서 본문 목록으로 컨텍스트 조립
    pub fn assemble_from(&self, docs: &[DocumentContent]) -> AssembledContext {
        let mut context = String::new();
        let mut sources = Vec::with_capacity(docs.len());

        if docs.is_empty() {
            return AssembledContext { context, sources };
        }

        let max_per_doc = self.max_total_context / docs.len();
        let mut truncated = 0usize;

        for doc in docs {
            context.push_str(&document_header(&doc.file_name));

            match truncate_chars(&doc.content, max_per_doc) {
                Some(head) => {
                    context.push_str(head);
                    context.push_str(TRUNCATION_MARKER);
                    truncated += 1;
                }
                None => context.push_str(&doc.content),
            }

            context.push_str("\n\n");
            sources.push(doc.file_name.clone());
        }

        tracing::debug!(
            "Assembled context from {} documents ({} truncated, {} chars per document)",
            docs.len(),
            truncated,
            max_per_doc
        );

        AssembledContext { context, sources }
    }
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self::with_defaults()
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn document_header(file_name: &str) -> String {
    format!("=== Document: {} ===\n", file_name)
}

/// 앞 `max_chars` 문자만 남김 (UTF-8 안전). 자를 필요가 없으면 `None`.
fn truncate_chars(text: &str, max_chars: usize) -> Option<&str> {
    text.char_indices()
        .nth(max_chars)
        .map(|(byte_index, _)| &text[..byte_index])
}

// ============================================================================
// Tests
// ============================================================================
