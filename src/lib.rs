//! palank-docmem - 사용자별 문서 메모리와 검색 엔진
//!
//! 업로드된 문서의 텍스트를 문장 단위로 겹치게 분할하고, 키워드 관련도로
//! 청크를 검색하거나 전체 본문을 예산 내에서 조립하여 LLM 답변의 근거로
//! 제공합니다.

pub mod cli;
pub mod config;
pub mod extractor;
pub mod ingest;
pub mod knowledge;
pub mod llm;
pub mod qa;

// Re-exports
pub use config::{get_api_key, has_api_key, DocMemConfig};
pub use extractor::{ContentExtractor, ExtractedContent, ExtractionMethod, FileType};
pub use ingest::{IngestReport, Ingestor};
pub use knowledge::{
    default_chunker, query_words, score_chunk, sentence_chunker, split_sentences, AddOutcome,
    AssembledContext, ChunkConfig, Chunker, ContextAssembler, Document, DocumentContent,
    DocumentStore, QueryTerms, SearchResult, SentenceChunker, StoreError, StoreStats, UserId,
};
pub use llm::{create_generator, AnswerGenerator, GeminiClient};
pub use qa::{Answer, AnswerMode, QaService};
