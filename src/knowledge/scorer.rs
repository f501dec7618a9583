//! 관련도 스코어링
//!
//! 쿼리 단어 빈도 + 정확한 구문 보너스로 청크를 점수화합니다.
//! TF-IDF, 어간 추출, 길이 정규화는 하지 않습니다.

/// 이 길이(문자 수) 이하의 쿼리 단어는 무시 (불용어 대용)
const MIN_WORD_LEN_EXCLUSIVE: usize = 2;

/// 구문 일치 시 단어당 보너스
const PHRASE_BONUS_PER_WORD: u32 = 2;

// ============================================================================
// QueryTerms
// ============================================================================

/// 토큰화된 검색 쿼리
///
/// 소문자 변환 후 공백으로 나누고, 3자 이상 단어만 남깁니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTerms {
    words: Vec<String>,
    phrase: String,
}

impl QueryTerms {
    /// 쿼리 문자열 토큰화
    pub fn parse(query: &str) -> Self {
        Self::from_words(query_words(query))
    }

    /// 이미 토큰화된 단어로 생성
    pub fn from_words(words: Vec<String>) -> Self {
        let phrase = words.join(" ");
        Self { words, phrase }
    }

    /// 점수화에 쓰일 단어가 없는지
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// 청크 점수 계산 (0 = 불일치)
    pub fn score(&self, chunk: &str) -> u32 {
        if self.words.is_empty() {
            return 0;
        }

        let haystack = chunk.to_lowercase();

        // 겹치지 않는 출현 횟수
        let mut score: u32 = self
            .words
            .iter()
            .map(|word| haystack.matches(word.as_str()).count() as u32)
            .sum();

        if haystack.contains(&self.phrase) {
            score += self.words.len() as u32 * PHRASE_BONUS_PER_WORD;
        }

        score
    }
}

// ============================================================================
// Functions
// ============================================================================

/// 쿼리를 점수화용 단어로 분리
pub fn query_words(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split_whitespace()
        .filter(|w| w.chars().count() > MIN_WORD_LEN_EXCLUSIVE)
        .map(str::to_string)
        .collect()
}

/// 청크 텍스트와 쿼리 단어로 관련도 점수 계산
pub fn score_chunk(chunk: &str, words: &[String]) -> u32 {
    QueryTerms::from_words(words.to_vec()).score(chunk)
}

// ============================================================================
// Tests
// ============================================================================
