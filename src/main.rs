//! Application entry point — vocatalk console client.
//!
//! # Startup sequence
//!
//! 1. Initialise logging.
//! 2. Load [`AppConfig`] from disk (defaults on first run, then saved so the
//!    learner has a `settings.toml` to edit).
//! 3. Create the tokio runtime.
//! 4. Wire the HTTP backend, session store, toast queue, navigator and
//!    speech seam into a turn controller.
//! 5. Create a session for the word ids given on the command line.
//! 6. Read turns from stdin until the session completes or input ends.

use std::io::Write as _;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use vocatalk::{
    client::{Backend, HttpBackend},
    config::AppConfig,
    nav::{LogNavigator, Navigator},
    notify::{ToastKind, ToastQueue},
    session::{new_shared_store, Role, SharedSessionStore},
    speech::{SilentSynthesizer, SpeechSynthesizer},
    turn::{ChatController, SpeakingController, StartOutcome, TurnOutcome},
};

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

/// Console modes map onto the two turn controllers.  Speaking mode feeds
/// typed lines through the client-recognition path, so the full speaking
/// session is exercised without a microphone.
enum ConsoleMode {
    Chat,
    Speaking,
}

fn parse_args() -> (ConsoleMode, Vec<String>) {
    let mut mode = ConsoleMode::Chat;
    let mut word_ids = Vec::new();
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--speaking" => mode = ConsoleMode::Speaking,
            _ => word_ids.push(arg),
        }
    }
    (mode, word_ids)
}

// ---------------------------------------------------------------------------
// Console rendering helpers
// ---------------------------------------------------------------------------

/// Print transcript entries appended since `from`; returns the new length.
fn print_transcript_from(store: &SharedSessionStore, from: usize) -> usize {
    let store = store.lock().unwrap();
    let messages = store.messages();
    for message in &messages[from.min(messages.len())..] {
        let speaker = match message.role {
            Role::User => "you",
            Role::Assistant => "tutor",
        };
        println!("{speaker}> {}", message.content);
        if message.role == Role::User {
            if let Some(correction) = &message.grammar_correction {
                println!("      corrected: {correction}");
            }
        }
        if let Some(feedback) = &message.feedback {
            println!("      score {}/10: {}", feedback.score, feedback.vocabulary);
        }
        if let Some(hint) = &message.hint {
            println!("      hint: {hint}");
        }
    }
    messages.len()
}

/// Print toasts with ids at or above `seen`; returns the next watermark.
fn print_toasts_from(toasts: &ToastQueue, seen: u64) -> u64 {
    let mut next = seen;
    for toast in toasts.active() {
        if toast.id < seen {
            continue;
        }
        let tag = match toast.kind {
            ToastKind::Info => "info",
            ToastKind::Success => "ok",
            ToastKind::Error => "error",
            ToastKind::Premium => "premium",
        };
        match &toast.action {
            Some(action) => println!("  [{tag}] {} ({})", toast.message, action.label),
            None => println!("  [{tag}] {}", toast.message),
        }
        next = next.max(toast.id + 1);
    }
    next
}

/// Print the end-of-session report.
fn print_summary(store: &SharedSessionStore) {
    let store = store.lock().unwrap();
    let Some(summary) = store.summary() else {
        return;
    };
    println!();
    println!(
        "Session complete: {} messages in {} s",
        summary.message_count, summary.duration_seconds
    );
    for detail in &summary.word_usage_details {
        match &detail.used_in {
            Some(sentence) => {
                println!("  {}: used in \"{sentence}\" ({})", detail.word, detail.feedback)
            }
            None => println!("  {}: not used ({})", detail.word, detail.feedback),
        }
    }
}

// ---------------------------------------------------------------------------
// Turn dispatch
// ---------------------------------------------------------------------------

/// The two controllers, unified for the console loop.
enum Turns {
    Chat(ChatController),
    Speaking(SpeakingController),
}

impl Turns {
    async fn create_session(&self, word_ids: &[String]) -> StartOutcome {
        match self {
            Turns::Chat(c) => c.create_session(word_ids).await,
            Turns::Speaking(c) => c.create_session(word_ids).await,
        }
    }

    async fn send(&self, line: &str) -> TurnOutcome {
        match self {
            Turns::Chat(c) => c.send_message(line).await,
            // Typed input stands in for on-device recognition; there is no
            // real utterance to time.
            Turns::Speaking(c) => c.submit_transcript(line, 0).await,
        }
    }
}

// ---------------------------------------------------------------------------
// Console loop
// ---------------------------------------------------------------------------

/// Create the session, then run the read, send, print loop until the
/// session completes or stdin closes.
async fn drive(
    store: &SharedSessionStore,
    toasts: &ToastQueue,
    config: &AppConfig,
    turns: Turns,
    word_ids: &[String],
) -> anyhow::Result<()> {
    // 5. Session creation
    match turns.create_session(word_ids).await {
        StartOutcome::Started => {}
        outcome => {
            print_toasts_from(toasts, 0);
            anyhow::bail!("could not start a session ({outcome:?})");
        }
    }
    let mut shown = print_transcript_from(store, 0);
    let mut seen_toasts = print_toasts_from(toasts, 0);

    // 6. Turn loop
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            log::info!("stdin closed; leaving the session");
            break;
        };

        let outcome = turns.send(&line).await;
        shown = print_transcript_from(store, shown);
        seen_toasts = print_toasts_from(toasts, seen_toasts);

        if outcome == TurnOutcome::Completed {
            // Let the deferred redirect fire so the handoff is logged before
            // the process exits.
            let delay = config
                .session
                .chat_redirect_delay_ms
                .max(config.session.speaking_redirect_delay_ms);
            tokio::time::sleep(std::time::Duration::from_millis(delay + 100)).await;
            print_summary(store);
            break;
        }
    }
    Ok(())
}

async fn run(config: AppConfig, mode: ConsoleMode, word_ids: Vec<String>) -> anyhow::Result<()> {
    // 4. Shared state and seams
    let store = new_shared_store();
    let toasts = ToastQueue::from_config(&config.session);
    let backend: Arc<dyn Backend> = Arc::new(HttpBackend::from_config(&config.api));
    let navigator: Arc<dyn Navigator> = Arc::new(LogNavigator);

    match mode {
        ConsoleMode::Chat => {
            let controller = ChatController::new(
                store.clone(),
                backend,
                toasts.clone(),
                navigator,
                config.session.clone(),
            );
            drive(&store, &toasts, &config, Turns::Chat(controller), &word_ids).await
        }
        ConsoleMode::Speaking => {
            let speech: Arc<dyn SpeechSynthesizer> = Arc::new(SilentSynthesizer);
            let controller = SpeakingController::new(
                store.clone(),
                backend,
                toasts.clone(),
                navigator,
                speech,
                config.session.clone(),
            );
            drive(
                &store,
                &toasts,
                &config,
                Turns::Speaking(controller),
                &word_ids,
            )
            .await
        }
    }
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> anyhow::Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("vocatalk starting up");

    // 2. Configuration
    let first_run = AppConfig::is_first_run();
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });
    if first_run {
        if let Err(e) = config.save() {
            log::warn!("Could not write default settings file: {e}");
        }
    }

    let (mode, word_ids) = parse_args();
    if word_ids.is_empty() {
        anyhow::bail!("usage: vocatalk [--speaking] <word-id>...");
    }

    // 3. Tokio runtime (2 workers; turns and deferred redirects)
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()?;

    rt.block_on(run(config, mode, word_ids))
}
