//! LLM 모듈 - 외부 텍스트 생성 서비스
//!
//! 프롬프트 텍스트를 넣고 답변 텍스트를 받는 블랙박스 인터페이스입니다.
//!
//! ## 사용법
//! ```rust,ignore
//! let generator = GeminiClient::from_env("gemini-2.0-flash")?;
//! let answer = generator.generate("Summarize: ...").await?;
//! ```

mod gemini;

use anyhow::Result;
use async_trait::async_trait;

pub use gemini::{GeminiClient, InlineData, Part};

// ============================================================================
// AnswerGenerator Trait
// ============================================================================

/// 답변 생성기 트레이트
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    /// 프롬프트로 답변 텍스트 생성
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// 생성기 이름 (모델 이름)
    fn name(&self) -> &str;
}

// ============================================================================
// Factory Function
// ============================================================================

/// 답변 생성기 생성 (Gemini API)
///
/// 환경변수에서 API 키를 읽습니다.
pub fn create_generator(model: &str) -> Result<GeminiClient> {
    if !crate::config::has_api_key() {
        anyhow::bail!(
            "GEMINI_API_KEY or GOOGLE_AI_API_KEY not set.\n\
             Set: export GEMINI_API_KEY=your-api-key\n\
             Get your API key at: https://aistudio.google.com/app/apikey"
        );
    }

    let generator = GeminiClient::from_env(model)?;
    tracing::info!("Using Gemini model: {}", generator.model());
    Ok(generator)
}
