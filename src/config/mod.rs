//! 설정 모듈 - 환경변수 기반 설정
//!
//! | 환경변수 | 기본값 |
//! |---|---|
//! | `DOCMEM_CHUNK_SIZE` | 3000 |
//! | `DOCMEM_CHUNK_OVERLAP` | 500 |
//! | `DOCMEM_MAX_CONTEXT` | 100000 |
//! | `DOCMEM_SEARCH_LIMIT` | 10 |
//! | `DOCMEM_MODEL` | gemini-2.0-flash |
//!
//! API 키는 `GEMINI_API_KEY` > `GOOGLE_AI_API_KEY` 순서로 읽습니다.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::knowledge::{
    ChunkConfig, DEFAULT_MAX_CHARACTERS, DEFAULT_MAX_TOTAL_CONTEXT, DEFAULT_OVERLAP_CHARACTERS,
    DEFAULT_SEARCH_LIMIT,
};

/// 기본 생성 모델
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

const ENV_CHUNK_SIZE: &str = "DOCMEM_CHUNK_SIZE";
const ENV_CHUNK_OVERLAP: &str = "DOCMEM_CHUNK_OVERLAP";
const ENV_MAX_CONTEXT: &str = "DOCMEM_MAX_CONTEXT";
const ENV_SEARCH_LIMIT: &str = "DOCMEM_SEARCH_LIMIT";
const ENV_MODEL: &str = "DOCMEM_MODEL";

// ============================================================================
// DocMemConfig
// ============================================================================

/// 전체 설정
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocMemConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    /// 전체 컨텍스트 예산 (문자 수)
    pub max_total_context: usize,
    pub search_limit: usize,
    /// Gemini 모델 이름
    pub model: String,
}

impl Default for DocMemConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_MAX_CHARACTERS,
            chunk_overlap: DEFAULT_OVERLAP_CHARACTERS,
            max_total_context: DEFAULT_MAX_TOTAL_CONTEXT,
            search_limit: DEFAULT_SEARCH_LIMIT,
            model: DEFAULT_MODEL.to_string(),
        }
    }
}

impl DocMemConfig {
    /// 환경변수에서 설정 로드 (없는 값은 기본값)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 조회 함수로 설정 로드
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            chunk_size: parse_usize(&lookup, ENV_CHUNK_SIZE, defaults.chunk_size)?,
            chunk_overlap: parse_usize(&lookup, ENV_CHUNK_OVERLAP, defaults.chunk_overlap)?,
            max_total_context: parse_usize(&lookup, ENV_MAX_CONTEXT, defaults.max_total_context)?,
            search_limit: parse_usize(&lookup, ENV_SEARCH_LIMIT, defaults.search_limit)?,
            model: lookup(ENV_MODEL)
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty())
                .unwrap_or(defaults.model),
        };

        if config.chunk_size == 0 {
            anyhow::bail!("{} must be greater than 0", ENV_CHUNK_SIZE);
        }
        if config.max_total_context == 0 {
            anyhow::bail!("{} must be greater than 0", ENV_MAX_CONTEXT);
        }
        if config.search_limit == 0 {
            anyhow::bail!("{} must be greater than 0", ENV_SEARCH_LIMIT);
        }

        tracing::debug!("Loaded config: {:?}", config);
        Ok(config)
    }

    /// 청킹 설정
    pub fn chunk_config(&self) -> ChunkConfig {
        ChunkConfig::new(self.chunk_size, self.chunk_overlap)
    }
}

fn parse_usize<F>(lookup: &F, name: &str, default: usize) -> Result<usize>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<usize>()
            .with_context(|| format!("Invalid value for {}: {:?}", name, raw)),
        _ => Ok(default),
    }
}

// ============================================================================
// API Key Management
// ============================================================================

/// API 키 로드 (환경변수에서)
///
/// 우선순위:
/// 1. `GEMINI_API_KEY` 환경변수
/// 2. `GOOGLE_AI_API_KEY` 환경변수
pub fn get_api_key() -> Result<String> {
    for name in ["GEMINI_API_KEY", "GOOGLE_AI_API_KEY"] {
        if let Ok(key) = std::env::var(name) {
            if !key.is_empty() {
                tracing::debug!("Using API key from {}", name);
                return Ok(key);
            }
        }
    }

    anyhow::bail!(
        "API key not found. Set GEMINI_API_KEY or GOOGLE_AI_API_KEY environment variable.\n\
         Get your API key at: https://aistudio.google.com/app/apikey"
    )
}

/// API 키 존재 여부 확인
pub fn has_api_key() -> bool {
    ["GEMINI_API_KEY", "GOOGLE_AI_API_KEY"]
        .iter()
        .any(|name| std::env::var(name).map(|k| !k.is_empty()).unwrap_or(false))
}

// ============================================================================
// Tests
// ============================================================================
