//! 질의응답 모듈 - 검색/컨텍스트 조립 결과로 답변 생성
//!
//! 두 가지 모드를 지원합니다:
//! - Full: 모든 문서 본문을 예산 내에서 조립 (전수 검색)
//! - Snippets: 관련도 상위 청크만 사용 (검색 결과가 없으면 Full로 폴백)

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;

use crate::knowledge::{AssembledContext, ContextAssembler, DocumentStore, SearchResult, UserId};
use crate::llm::AnswerGenerator;

// ============================================================================
// Types
// ============================================================================

/// 답변 모드
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerMode {
    /// 모든 문서 본문 사용
    #[default]
    Full,
    /// 관련 청크만 사용
    Snippets,
}

/// 생성된 답변
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Answer {
    pub text: String,
    /// 답변 근거 파일 이름
    pub sources: Vec<String>,
    /// 실제로 사용된 모드
    pub mode: AnswerMode,
}

// ============================================================================
// QaService
// ============================================================================

/// 질의응답 서비스
pub struct QaService {
    store: Arc<DocumentStore>,
    assembler: ContextAssembler,
    generator: Arc<dyn AnswerGenerator>,
}

impl QaService {
    pub fn new(
        store: Arc<DocumentStore>,
        assembler: ContextAssembler,
        generator: Arc<dyn AnswerGenerator>,
    ) -> Self {
        Self {
            store,
            assembler,
            generator,
        }
    }

    /// 질문에 답변
    ///
    /// 사용자에게 문서가 없으면 모델을 호출하지 않고 `None`을 반환합니다.
    pub async fn answer(
        &self,
        uid: &UserId,
        question: &str,
        mode: AnswerMode,
    ) -> Result<Option<Answer>> {
        if self.store.document_count(uid) == 0 {
            tracing::debug!("No documents for user {}, skipping generation", uid);
            return Ok(None);
        }

        let (grounding, mode) = match mode {
            AnswerMode::Full => (self.full_context(uid), AnswerMode::Full),
            AnswerMode::Snippets => {
                let hits = self.store.search_documents(uid, question);
                if hits.is_empty() {
                    tracing::debug!("No matching chunks for {:?}, using full context", question);
                    (self.full_context(uid), AnswerMode::Full)
                } else {
                    (Some(snippet_context(&hits)), AnswerMode::Snippets)
                }
            }
        };

        // 조회와 조립 사이에 컬렉션이 비워진 경우
        let Some(grounding) = grounding else {
            return Ok(None);
        };

        let prompt = build_prompt(&grounding.context, question);
        let text = self
            .generator
            .generate(&prompt)
            .await
            .with_context(|| format!("Answer generation failed ({})", self.generator.name()))?;

        Ok(Some(Answer {
            text: text.trim().to_string(),
            sources: grounding.sources,
            mode,
        }))
    }

    fn full_context(&self, uid: &UserId) -> Option<AssembledContext> {
        self.assembler.assemble(&self.store, uid)
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// 검색 결과를 번호 붙은 발췌로 조립
fn snippet_context(hits: &[SearchResult]) -> AssembledContext {
    let mut context = String::new();
    let mut sources: Vec<String> = Vec::new();

    for (i, hit) in hits.iter().enumerate() {
        context.push_str(&format!(
            "[{}] ({}, score {})\n{}\n\n",
            i + 1,
            hit.file_name,
            hit.score,
            hit.chunk
        ));

        if !sources.contains(&hit.file_name) {
            sources.push(hit.file_name.clone());
        }
    }

    AssembledContext { context, sources }
}

/// 모델 프롬프트 구성
fn build_prompt(context: &str, question: &str) -> String {
    format!(
        "Answer the question using only the documents below. \
         If the documents do not contain the answer, say so.\n\n\
         Documents:\n{}\nQuestion: {}",
        context, question
    )
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::knowledge::{sentence_chunker, ChunkConfig};

    /// 받은 프롬프트를 기록하는 가짜 생성기
    #[derive(Default)]
    struct RecordingGenerator {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl AnswerGenerator for RecordingGenerator {
        async fn generate(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok("  the answer \n".to_string())
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl AnswerGenerator for FailingGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            anyhow::bail!("quota exceeded")
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    fn create_service() -> (Arc<DocumentStore>, Arc<RecordingGenerator>, QaService) {
        let store = Arc::new(DocumentStore::new(
            sentence_chunker(ChunkConfig::new(1, 0)),
            10,
        ));
        let generator = Arc::new(RecordingGenerator::default());
        let service = QaService::new(
            store.clone(),
            ContextAssembler::with_defaults(),
            generator.clone(),
        );
        (store, generator, service)
    }

    #[tokio::test]
    async fn test_no_documents_short_circuits() {
        let (_store, generator, service) = create_service();

        let answer = service
            .answer(&UserId::from("alice"), "anything?", AnswerMode::Full)
            .await
            .unwrap();

        assert!(answer.is_none());
        assert!(generator.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_full_mode_uses_all_documents() {
        let (store, generator, service) = create_service();
        let uid = UserId::from("alice");
        store.add_document(&uid, "a.txt", "Alpha facts.").unwrap();
        store.add_document(&uid, "b.txt", "Beta facts.").unwrap();

        let answer = service
            .answer(&uid, "What is alpha?", AnswerMode::Full)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(answer.text, "the answer");
        assert_eq!(answer.sources, vec!["a.txt", "b.txt"]);
        assert_eq!(answer.mode, AnswerMode::Full);

        let prompts = generator.prompts.lock().unwrap();
        assert!(prompts[0].contains("=== Document: b.txt ==="));
        assert!(prompts[0].ends_with("Question: What is alpha?"));
    }

    #[tokio::test]
    async fn test_snippet_mode_uses_ranked_hits() {
        let (store, generator, service) = create_service();
        let uid = UserId::from("alice");
        store
            .add_document(&uid, "a.txt", "Revenue rose. Costs fell.")
            .unwrap();
        store
            .add_document(&uid, "b.txt", "Revenue revenue everywhere.")
            .unwrap();

        let answer = service
            .answer(&uid, "revenue", AnswerMode::Snippets)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(answer.mode, AnswerMode::Snippets);
        assert_eq!(answer.sources, vec!["b.txt", "a.txt"]);

        let prompts = generator.prompts.lock().unwrap();
        assert!(prompts[0].contains("[1] (b.txt, score 4)"));
        assert!(!prompts[0].contains("Costs fell."));
    }

    #[tokio::test]
    async fn test_snippet_mode_falls_back_to_full() {
        let (store, _generator, service) = create_service();
        let uid = UserId::from("alice");
        store.add_document(&uid, "a.txt", "Unrelated text.").unwrap();

        let answer = service
            .answer(&uid, "revenue", AnswerMode::Snippets)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(answer.mode, AnswerMode::Full);
        assert_eq!(answer.sources, vec!["a.txt"]);
    }

    #[tokio::test]
    async fn test_generator_failure_propagates() {
        let store = Arc::new(DocumentStore::with_defaults());
        let uid = UserId::from("alice");
        store.add_document(&uid, "a.txt", "Text.").unwrap();
        let service = QaService::new(
            store,
            ContextAssembler::with_defaults(),
            Arc::new(FailingGenerator),
        );

        let err = service
            .answer(&uid, "question", AnswerMode::Full)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("failing"));
    }

    #[test]
    fn test_snippet_context_dedupes_sources() {
        let hits = vec![
            SearchResult {
                file_name: "a.txt".to_string(),
                chunk: "one".to_string(),
                score: 3,
            },
            SearchResult {
                file_name: "a.txt".to_string(),
                chunk: "two".to_string(),
                score: 2,
            },
        ];
        let assembled = snippet_context(&hits);
        assert_eq!(assembled.sources, vec!["a.txt"]);
        assert!(assembled.context.starts_with("[1] (a.txt, score 3)\none\n\n[2]"));
    }
}
