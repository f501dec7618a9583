//! CLI 모듈
//!
//! palank-docmem CLI 명령어 정의 및 구현.
//! 저장소는 프로세스 수명 동안만 유지되므로, 일회성 명령은 매번 파일을
//! 새로 수집하고 `session` 명령은 대화형으로 컬렉션을 유지합니다.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::config::{has_api_key, DocMemConfig};
use crate::extractor::ContentExtractor;
use crate::ingest::Ingestor;
use crate::knowledge::{
    sentence_chunker, ChunkConfig, Chunker, ContextAssembler, DocumentStore, SearchResult,
    SentenceChunker, UserId,
};
use crate::llm::create_generator;
use crate::qa::{Answer, AnswerMode, QaService};

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Parser)]
#[command(name = "palank-docmem")]
#[command(version, about = "사용자별 문서 메모리 + 키워드 검색", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 파일을 청크로 분할하여 출력
    Chunk {
        /// 분할할 파일 경로
        #[arg(short, long)]
        file: PathBuf,

        /// 최대 청크 크기 (문자 수)
        #[arg(long)]
        max: Option<usize>,

        /// 오버랩 예산 (문자 수, 10자당 1단어)
        #[arg(long)]
        overlap: Option<usize>,
    },

    /// 파일을 수집한 뒤 키워드 검색
    Search {
        /// 수집할 파일 (여러 번 지정 가능)
        #[arg(short, long = "file", required = true)]
        files: Vec<PathBuf>,

        /// 검색 쿼리
        query: String,

        /// JSON으로 출력
        #[arg(long)]
        json: bool,
    },

    /// 파일을 수집한 뒤 질문에 답변
    Ask {
        /// 수집할 파일 (여러 번 지정 가능)
        #[arg(short, long = "file", required = true)]
        files: Vec<PathBuf>,

        /// 질문
        question: String,

        /// 답변 모드
        #[arg(short, long, value_enum, default_value_t = AnswerMode::Full)]
        mode: AnswerMode,
    },

    /// 대화형 세션 (/add, /search, /ask ...)
    Session {
        /// 사용자 ID
        #[arg(short, long, default_value = "local")]
        user: String,
    },

    /// 상태 확인
    Status,
}

// ============================================================================
// CLI Runner
// ============================================================================

/// CLI 명령어 실행
pub async fn run(cli: Cli) -> Result<()> {
    let config = DocMemConfig::from_env().context("설정 로드 실패")?;

    match cli.command {
        Commands::Chunk { file, max, overlap } => cmd_chunk(&config, &file, max, overlap).await,
        Commands::Search { files, query, json } => cmd_search(config, &files, &query, json).await,
        Commands::Ask {
            files,
            question,
            mode,
        } => cmd_ask(config, &files, &question, mode).await,
        Commands::Session { user } => cmd_session(config, UserId::from(user)).await,
        Commands::Status => cmd_status(&config),
    }
}

// ============================================================================
// Application Context
// ============================================================================

/// 명령 실행에 필요한 구성요소 묶음
struct App {
    config: DocMemConfig,
    ingestor: Ingestor,
    assembler: ContextAssembler,
}

impl App {
    fn new(config: DocMemConfig) -> Self {
        let store = Arc::new(DocumentStore::new(
            sentence_chunker(config.chunk_config()),
            config.search_limit,
        ));
        let extractor = ContentExtractor::from_env(&config.model);
        let assembler = ContextAssembler::new(config.max_total_context);

        Self {
            ingestor: Ingestor::new(store, extractor),
            assembler,
            config,
        }
    }

    fn store(&self) -> &Arc<DocumentStore> {
        self.ingestor.store()
    }

    fn qa_service(&self) -> Result<QaService> {
        let generator = create_generator(&self.config.model)?;
        Ok(QaService::new(
            self.store().clone(),
            self.assembler,
            Arc::new(generator),
        ))
    }

    /// 파일 목록 수집 (실패한 파일은 건너뜀)
    async fn ingest_files(&self, uid: &UserId, files: &[PathBuf]) -> usize {
        let mut success_count = 0;

        for (i, path) in files.iter().enumerate() {
            print!("[{}/{}] {}... ", i + 1, files.len(), path.display());

            match self.ingestor.ingest_path(uid, path).await {
                Ok(report) => {
                    println!(
                        "완료 ({}, {} 청크)",
                        report.content.source_type.label(),
                        report.outcome.chunks_count
                    );
                    success_count += 1;
                }
                Err(e) => println!("실패: {:#}", e),
            }
        }

        success_count
    }
}

// ============================================================================
// Command Implementations
// ============================================================================

/// 청크 명령어 (chunk)
async fn cmd_chunk(
    config: &DocMemConfig,
    file: &Path,
    max: Option<usize>,
    overlap: Option<usize>,
) -> Result<()> {
    let chunk_config = ChunkConfig::new(
        max.unwrap_or(config.chunk_size),
        overlap.unwrap_or(config.chunk_overlap),
    );
    if chunk_config.max_characters == 0 {
        bail!("--max는 0보다 커야 합니다");
    }

    let extractor = ContentExtractor::from_env(&config.model);
    let content = extractor
        .extract(file)
        .await
        .with_context(|| format!("텍스트 추출 실패: {}", file.display()))?;

    let chunker = SentenceChunker::new(chunk_config);
    let chunks = chunker.chunk(&content.text);

    println!(
        "[OK] {} 청크 (최대 {}자, 오버랩 {}단어)\n",
        chunks.len(),
        chunk_config.max_characters,
        chunk_config.overlap_words()
    );

    for (i, chunk) in chunks.iter().enumerate() {
        println!("--- #{} ({}자) ---", i + 1, chunk.chars().count());
        println!("{}\n", chunk);
    }

    Ok(())
}

/// 검색 명령어 (search)
async fn cmd_search(config: DocMemConfig, files: &[PathBuf], query: &str, json: bool) -> Result<()> {
    let app = App::new(config);
    let uid = UserId::from("cli");

    if app.ingest_files(&uid, files).await == 0 {
        bail!("수집된 문서가 없습니다");
    }

    let results = app.store().search_documents(&uid, query);

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    print_search_results(query, &results);
    Ok(())
}

/// 질문 명령어 (ask)
async fn cmd_ask(
    config: DocMemConfig,
    files: &[PathBuf],
    question: &str,
    mode: AnswerMode,
) -> Result<()> {
    let app = App::new(config);
    let qa = app.qa_service()?;
    let uid = UserId::from("cli");

    if app.ingest_files(&uid, files).await == 0 {
        bail!("수집된 문서가 없습니다");
    }

    println!("\n[*] 답변 생성 중...");
    match qa.answer(&uid, question, mode).await? {
        Some(answer) => print_answer(&answer),
        None => println!("[!] 문서가 없습니다."),
    }

    Ok(())
}

/// 상태 명령어 (status)
fn cmd_status(config: &DocMemConfig) -> Result<()> {
    println!("palank-docmem v{}", env!("CARGO_PKG_VERSION"));
    println!();

    if has_api_key() {
        println!("[OK] API 키: 설정됨 (답변 생성, 원격 OCR 사용 가능)");
    } else {
        println!("[!] API 키: 미설정 (검색만 가능)");
        println!("    설정: export GEMINI_API_KEY=your-key");
    }

    println!("[*] 청크 크기: {}자", config.chunk_size);
    println!(
        "[*] 오버랩: {}자 ({}단어)",
        config.chunk_overlap,
        config.chunk_config().overlap_words()
    );
    println!("[*] 컨텍스트 예산: {}자", config.max_total_context);
    println!("[*] 검색 결과 수: {}", config.search_limit);
    println!("[*] 모델: {}", config.model);

    Ok(())
}

// ============================================================================
// Session
// ============================================================================

/// 세션 명령
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Add(PathBuf),
    List,
    Delete(String),
    Clear,
    Search(String),
    Ask(String),
    Stats,
    Help,
    Quit,
    Empty,
}

impl SessionCommand {
    /// 입력 줄 해석 (슬래시 없는 줄은 질문)
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(SessionCommand::Empty);
        }

        if !line.starts_with('/') {
            return Ok(SessionCommand::Ask(line.to_string()));
        }

        let (command, arg) = match line.split_once(char::is_whitespace) {
            Some((command, arg)) => (command, arg.trim()),
            None => (line, ""),
        };

        let require_arg = |usage: &str| -> Result<String> {
            if arg.is_empty() {
                bail!("사용법: {}", usage);
            }
            Ok(arg.to_string())
        };

        let parsed = match command {
            "/add" => SessionCommand::Add(PathBuf::from(require_arg("/add <파일 경로>")?)),
            "/list" => SessionCommand::List,
            "/delete" => SessionCommand::Delete(require_arg("/delete <파일 이름>")?),
            "/clear" => SessionCommand::Clear,
            "/search" => SessionCommand::Search(require_arg("/search <검색어>")?),
            "/ask" => SessionCommand::Ask(require_arg("/ask <질문>")?),
            "/stats" => SessionCommand::Stats,
            "/help" => SessionCommand::Help,
            "/quit" | "/exit" => SessionCommand::Quit,
            other => bail!("알 수 없는 명령: {} (/help 참고)", other),
        };

        Ok(parsed)
    }
}

const SESSION_HELP: &str = "\
/add <경로>      파일 추가 (같은 이름이면 교체)
/list            문서 목록
/delete <이름>   문서 삭제
/clear           전체 삭제
/search <검색어> 관련 청크 검색
/ask <질문>      답변 생성 (슬래시 없이 입력해도 됨)
/stats           저장소 통계
/quit            종료";

/// 대화형 세션 명령어 (session)
async fn cmd_session(config: DocMemConfig, uid: UserId) -> Result<()> {
    let app = App::new(config);
    let qa = match app.qa_service() {
        Ok(qa) => Some(qa),
        Err(e) => {
            tracing::debug!("Answer generation disabled: {}", e);
            None
        }
    };

    println!("[*] 세션 시작 (사용자: {}). /help 로 명령 확인", uid);
    if qa.is_none() {
        println!("[!] API 키가 없어 답변 생성은 비활성화됩니다.");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        let command = match SessionCommand::parse(&line) {
            Ok(command) => command,
            Err(e) => {
                println!("[!] {}", e);
                continue;
            }
        };

        match command {
            SessionCommand::Empty => {}
            SessionCommand::Quit => break,
            SessionCommand::Help => println!("{}", SESSION_HELP),
            SessionCommand::Add(path) => {
                app.ingest_files(&uid, std::slice::from_ref(&path)).await;
            }
            SessionCommand::List => {
                let names = app.store().document_names(&uid);
                if names.is_empty() {
                    println!("[!] 저장된 문서가 없습니다.");
                }
                for (i, name) in names.iter().enumerate() {
                    println!("  {}. {}", i + 1, name);
                }
            }
            SessionCommand::Delete(name) => {
                if app.store().delete_document(&uid, &name) {
                    println!("[OK] {} 삭제됨", name);
                } else {
                    println!("[!] {} 문서를 찾을 수 없습니다", name);
                }
            }
            SessionCommand::Clear => {
                app.store().clear_documents(&uid);
                println!("[OK] 모든 문서가 삭제되었습니다");
            }
            SessionCommand::Search(query) => {
                let results = app.store().search_documents(&uid, &query);
                print_search_results(&query, &results);
            }
            SessionCommand::Stats => {
                let stats = app.store().stats();
                println!(
                    "[*] 내 문서: {} 건 / 전체: 사용자 {}, 문서 {}, 청크 {}, {}자",
                    app.store().document_count(&uid),
                    stats.user_count,
                    stats.document_count,
                    stats.chunk_count,
                    stats.total_content_chars
                );
                println!(
                    "[*] 청커: {} / 검색 결과 수: {} / 컨텍스트 예산: {}자",
                    app.store().chunker_name(),
                    app.store().search_limit(),
                    app.assembler.max_total_context()
                );
            }
            SessionCommand::Ask(question) => {
                let Some(qa) = qa.as_ref() else {
                    println!("[!] API 키가 설정되지 않았습니다.");
                    continue;
                };

                match qa.answer(&uid, &question, AnswerMode::Full).await {
                    Ok(Some(answer)) => print_answer(&answer),
                    Ok(None) => println!("[!] 먼저 /add 로 문서를 추가하세요."),
                    Err(e) => println!("[!] 답변 실패: {:#}", e),
                }
            }
        }
    }

    println!("[*] 세션 종료");
    Ok(())
}

// ============================================================================
// Output Helpers
// ============================================================================

fn print_search_results(query: &str, results: &[SearchResult]) {
    if results.is_empty() {
        println!("\n[!] \"{}\" 검색 결과가 없습니다.", query);
        return;
    }

    println!("\n[OK] 검색 결과 ({} 건):\n", results.len());

    for (i, result) in results.iter().enumerate() {
        println!("{}. [점수: {}] {}", i + 1, result.score, result.file_name);
        println!("   내용: {}", truncate_text(&result.chunk, 200));
        println!();
    }
}

fn print_answer(answer: &Answer) {
    println!("\n{}\n", answer.text);
    if !answer.sources.is_empty() {
        println!("출처: {}", answer.sources.join(", "));
    }
}

/// 텍스트 자르기 (UTF-8 안전)
fn truncate_text(text: &str, max_chars: usize) -> String {
    let cleaned = text.replace('\n', " ").replace('\r', "");
    let cleaned = cleaned.trim();

    if cleaned.chars().count() <= max_chars {
        cleaned.to_string()
    } else {
        let truncated: String = cleaned.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_session_commands() {
        assert_eq!(
            SessionCommand::parse("/add  docs/report.pdf ").unwrap(),
            SessionCommand::Add(PathBuf::from("docs/report.pdf"))
        );
        assert_eq!(SessionCommand::parse("/list").unwrap(), SessionCommand::List);
        assert_eq!(
            SessionCommand::parse("/delete annual report.pdf").unwrap(),
            SessionCommand::Delete("annual report.pdf".to_string())
        );
        assert_eq!(
            SessionCommand::parse("/search revenue growth").unwrap(),
            SessionCommand::Search("revenue growth".to_string())
        );
        assert_eq!(SessionCommand::parse("/exit").unwrap(), SessionCommand::Quit);
        assert_eq!(SessionCommand::parse("   ").unwrap(), SessionCommand::Empty);
    }

    #[test]
    fn test_plain_line_is_question() {
        assert_eq!(
            SessionCommand::parse("What changed in Q3?").unwrap(),
            SessionCommand::Ask("What changed in Q3?".to_string())
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(SessionCommand::parse("/add").is_err());
        assert!(SessionCommand::parse("/search   ").is_err());
        let err = SessionCommand::parse("/unknown").unwrap_err();
        assert!(err.to_string().contains("/unknown"));
    }

    #[test]
    fn test_cli_parses_search() {
        let cli = Cli::try_parse_from([
            "palank-docmem",
            "search",
            "-f",
            "a.txt",
            "--file",
            "b.pdf",
            "annual report",
        ])
        .unwrap();

        match cli.command {
            Commands::Search { files, query, json } => {
                assert_eq!(files, vec![PathBuf::from("a.txt"), PathBuf::from("b.pdf")]);
                assert_eq!(query, "annual report");
                assert!(!json);
            }
            _ => panic!("expected search command"),
        }
    }

    #[test]
    fn test_cli_parses_ask_mode() {
        let cli =
            Cli::try_parse_from(["palank-docmem", "ask", "-f", "a.txt", "-m", "snippets", "why?"])
                .unwrap();
        match cli.command {
            Commands::Ask { mode, .. } => assert_eq!(mode, AnswerMode::Snippets),
            _ => panic!("expected ask command"),
        }
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("hello", 10), "hello");
        assert_eq!(truncate_text("hello world", 5), "hello...");
        assert_eq!(truncate_text("hello\nworld", 20), "hello world");
    }

    #[test]
    fn test_truncate_unicode() {
        let korean = "안녕하세요 세계";
        assert_eq!(truncate_text(korean, 5), "안녕하세요...");
    }
}
