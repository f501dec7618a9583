//! Text Chunking Module
//!
//! 추출된 문서 텍스트를 문장 경계에서 겹치는(overlap) 청크로 분할합니다.
//!
//! ## 알고리즘
//! 1. `.` `!` `?` 뒤에 공백이 오는 위치에서 문장 분리 (구분자는 앞 문장에 유지)
//! 2. 버퍼에 문장을 누적하다가 최대 크기를 넘기면 청크를 닫음
//! 3. 새 버퍼는 직전 청크의 마지막 `overlap / 10` 개 단어로 시작
//! 4. 청크가 하나도 없으면 원문을 그대로 단일 청크로 반환
//!
//! 한 문장이 최대 크기보다 길어도 문장 중간에서 자르지 않습니다.

use std::sync::OnceLock;

use regex::Regex;

// ============================================================================
// Chunk Configuration
// ============================================================================

/// 기본 최대 청크 크기 (문자 수)
pub const DEFAULT_MAX_CHARACTERS: usize = 3000;

/// 기본 오버랩 예산 (문자 수)
pub const DEFAULT_OVERLAP_CHARACTERS: usize = 500;

/// 오버랩 예산을 단어 수로 환산하는 나눗수 (단어당 평균 약 10자)
///
/// 조정 가능한 비율이 아니라 고정된 휴리스틱입니다.
const CHARS_PER_OVERLAP_WORD: usize = 10;

/// 청킹 설정
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkConfig {
    /// 최대 청크 크기 (문자 수, 목표치)
    pub max_characters: usize,
    /// 오버랩 예산 (문자 수, 단어 수로 환산되어 사용됨)
    pub overlap_characters: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            max_characters: DEFAULT_MAX_CHARACTERS,
            overlap_characters: DEFAULT_OVERLAP_CHARACTERS,
        }
    }
}

impl ChunkConfig {
    /// 크기와 오버랩을 지정하여 생성
    pub fn new(max_characters: usize, overlap_characters: usize) -> Self {
        Self {
            max_characters,
            overlap_characters,
        }
    }

    /// 새 청크 앞에 이어붙일 단어 수
    pub fn overlap_words(&self) -> usize {
        self.overlap_characters / CHARS_PER_OVERLAP_WORD
    }
}

// ============================================================================
// Chunker Trait
// ============================================================================

/// 텍스트 청킹 전략 트레이트
pub trait Chunker: Send + Sync {
    /// 텍스트를 청크로 분할 (항상 1개 이상)
    fn chunk(&self, text: &str) -> Vec<String>;

    /// 청커 이름
    fn name(&self) -> &'static str;
}

// ============================================================================
// SentenceChunker
// ============================================================================

/// 문장 단위 누적 청커
///
/// 문장을 최대 크기까지 모으고, 청크 사이에 단어 기반 오버랩을 둡니다.
#[derive(Debug, Clone, Default)]
pub struct SentenceChunker {
    config: ChunkConfig,
}

impl SentenceChunker {
    /// 설정으로 생성
    pub fn new(config: ChunkConfig) -> Self {
        Self { config }
    }

    /// 기본 설정(3000 / 500)으로 생성
    pub fn with_defaults() -> Self {
        Self::new(ChunkConfig::default())
    }

    /// 현재 설정
    pub fn config(&self) -> ChunkConfig {
        self.config
    }
}

impl Chunker for SentenceChunker {
    fn chunk(&self, text: &str) -> Vec<String> {
        let max_characters = self.config.max_characters;
        let overlap_words = self.config.overlap_words();

        let mut chunks = Vec::new();
        let mut current = String::new();
        // 버퍼 길이 (문자 수)
        let mut current_len = 0usize;

        for sentence in split_sentences(text) {
            let sentence_len = sentence.chars().count();

            if !current.is_empty() && current_len + sentence_len > max_characters {
                chunks.push(current.trim().to_string());

                let overlap = tail_words(&current, overlap_words);
                current = if overlap.is_empty() {
                    String::new()
                } else {
                    format!("{} ", overlap)
                };
                current.push_str(sentence);
                current_len = current.chars().count();
            } else {
                if !current.is_empty() {
                    current.push(' ');
                    current_len += 1;
                }
                current.push_str(sentence);
                current_len += sentence_len;
            }
        }

        if !current.trim().is_empty() {
            chunks.push(current.trim().to_string());
        }

        if chunks.is_empty() {
            // 빈 입력도 청크 0개가 되지 않도록 원문 그대로
            return vec![text.to_string()];
        }

        chunks
    }

    fn name(&self) -> &'static str {
        "SentenceChunker"
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn sentence_boundary() -> &'static Regex {
    static BOUNDARY: OnceLock<Regex> = OnceLock::new();
    BOUNDARY.get_or_init(|| Regex::new(r"[.!?]\s+").expect("Invalid regex"))
}

/// 문장 분리
///
/// `.` `!` `?` 뒤에 공백이 연속되는 위치에서 나눕니다. 구분자는 앞 문장에
/// 남고 공백은 버려집니다. "Mr." 같은 약어도 경계로 취급하며,
/// "3.14" 처럼 공백이 없는 마침표는 경계가 아닙니다.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;

    for m in sentence_boundary().find_iter(text) {
        // 구분자는 ASCII 1바이트
        let end = m.start() + 1;
        sentences.push(&text[start..end]);
        start = m.end();
    }

    sentences.push(&text[start..]);
    sentences
}

/// 버퍼의 마지막 `count` 개 단어를 공백 하나로 연결
fn tail_words(buffer: &str, count: usize) -> String {
    if count == 0 {
        return String::new();
    }

    let words: Vec<&str> = buffer.split_whitespace().collect();
    let start = words.len().saturating_sub(count);
    words[start..].join(" ")
}

// ============================================================================
// Factory Functions
// ============================================================================

/// 기본 청커 생성
pub fn default_chunker() -> Box<dyn Chunker> {
    Box::new(SentenceChunker::with_defaults())
}

/// 문장 청커 생성 (설정 지정)
pub fn sentence_chunker(config: ChunkConfig) -> Box<dyn Chunker> {
    Box::new(SentenceChunker::new(config))
}

// ============================================================================
// Tests
// ============================================================================
