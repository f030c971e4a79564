use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use mombot::analysis::{Analyzer, AnalyzerConfig};
use mombot::config::AppConfig;
use mombot::interview::{
    InterviewRouteState, InterviewSession, LlmSummarizer, SessionHost, Summarizer, export,
    interview_routes,
};

/// Install the stderr subscriber, plus a daily rolling file when `log_dir` is set.
/// The returned guard must live until exit so buffered file logs are flushed.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "mombot.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(file_layer)
        .init();

    guard
}

/// Feed input lines to the session until it completes, input ends, or `/quit`.
/// Blank lines are turns like any other.
async fn run_repl<R>(session: &mut InterviewSession, input: R) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    while !session.is_complete() {
        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim() == "/quit" {
            break;
        }
        let reply = session.advance(&line).await;
        println!("\n{}\n", reply);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        eprintln!("  export OPENAI_API_KEY=sk-...");
        eprintln!("  export MOMBOT_FOUNDER_INPUTS=./founder.json");
        std::process::exit(1);
    });

    let _log_guard = init_tracing(config.log_dir.as_deref());

    // ── Founder inputs & script ─────────────────────────────────────────
    let session_config = config
        .load_session_config()
        .context("Failed to load founder inputs")?;
    let script = Arc::new(config.load_script()?);

    // ── LLM ─────────────────────────────────────────────────────────────
    let llm = config.llm_provider()?;
    let summarizer: Arc<dyn Summarizer> =
        Arc::new(LlmSummarizer::new(Arc::clone(&llm), config.summary_config()));

    eprintln!("🧪 MomBot v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", config.llm.model);
    eprintln!("   Problems: {}", session_config.problems().len());
    eprintln!(
        "   Script: {}",
        config
            .script
            .as_ref()
            .map_or_else(|| "built-in".to_string(), |p| p.display().to_string())
    );

    // ── REST API ────────────────────────────────────────────────────────
    if let Some(port) = config.http_port {
        let host = SessionHost::new(Arc::clone(&script), Arc::clone(&summarizer))
            .with_summary_timeout(config.summary_timeout);
        let analyzer = Analyzer::new(Arc::clone(&llm), AnalyzerConfig::default());
        let app = interview_routes(InterviewRouteState {
            host: Arc::new(host),
            analyzer: Some(Arc::new(analyzer)),
        });
        let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
            .await
            .with_context(|| format!("Failed to bind port {port}"))?;
        eprintln!("   Interview API: http://0.0.0.0:{}/api/interviews", port);
        tokio::spawn(async move {
            tracing::info!(port, "Interview API server started");
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "Interview API server stopped");
            }
        });
    }

    eprintln!("   Type your answer and press Enter. /quit to exit.\n");

    // ── Interview REPL ──────────────────────────────────────────────────
    eprintln!("{}\n", session_config.reflection());

    let mut session = InterviewSession::new(Arc::new(session_config), script, summarizer)
        .with_summary_timeout(config.summary_timeout);
    println!("{}\n", session.start_interview());

    run_repl(&mut session, BufReader::new(tokio::io::stdin())).await?;

    let stats = session.stats();
    eprintln!(
        "   Session {}: {} responses, {} of {} problems summarized",
        stats.session_id, stats.total_responses, stats.summaries, stats.total_problems
    );

    if let Some(dir) = &config.export_dir {
        let doc = export(&session);
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create export dir {}", dir.display()))?;
        let path = dir.join(doc.file_name());
        tokio::fs::write(&path, doc.to_json_pretty()?)
            .await
            .with_context(|| format!("Failed to write transcript to {}", path.display()))?;
        eprintln!("   Transcript: {}", path.display());
    }

    Ok(())
}
