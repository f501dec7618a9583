//! Knowledge 모듈 - 사용자별 문서 메모리와 검색 엔진
//!
//! - Chunker: 문장 경계 + 단어 오버랩 텍스트 분할
//! - Scorer: 단어 빈도 + 구문 보너스 관련도
//! - Store: 사용자별 문서 컬렉션 (CRUD + 청크 검색)
//! - Context: 문서 전체 본문을 예산 내에서 조립

mod chunker;
mod context;
mod scorer;
mod store;

// Re-exports
pub use chunker::{
    default_chunker, sentence_chunker, split_sentences, ChunkConfig, Chunker, SentenceChunker,
    DEFAULT_MAX_CHARACTERS, DEFAULT_OVERLAP_CHARACTERS,
};
pub use context::{AssembledContext, ContextAssembler, DEFAULT_MAX_TOTAL_CONTEXT, TRUNCATION_MARKER};
pub use scorer::{query_words, score_chunk, QueryTerms};
pub use store::{
    AddOutcome, Document, DocumentContent, DocumentStore, SearchResult, StoreError, StoreStats,
    UserId, DEFAULT_SEARCH_LIMIT,
};
