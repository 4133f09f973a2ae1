//! Speaking-mode turn controller — voice turns with placeholder
//! reconciliation and spoken replies.
//!
//! Two intake paths feed one reconciliation tail:
//!
//! ```text
//! submit_recording(clip)                 submit_transcript(text, dur)
//!   ├─ placeholder user message            ├─ final user message
//!   ├─ upload + transcribe                 ├─ send turn
//!   ├─ Ok  → amend placeholder             │
//!   │        with the transcript ──────────┤
//!   │                                      ▼
//!   │                            reconcile_reply
//!   │                              append tutor reply + feedback,
//!   │                              merge status, speak the reply,
//!   │                              completed? → summary handoff
//!   ├─ Err (entitlement) → /subscribe, placeholder left alone
//!   └─ Err (other)       → placeholder → "(recognition failed)"
//!                          + apology message
//! ```
//!
//! The placeholder exists because audio upload latency is long enough that
//! the transcript must show something immediately; it is the only message
//! whose text is ever rewritten.

use std::sync::Arc;
use std::time::Duration;

use crate::audio::AudioClip;
use crate::client::{Backend, TranscribeResponse, TurnResponse};
use crate::config::SessionConfig;
use crate::nav::{Navigator, Route};
use crate::notify::ToastQueue;
use crate::session::{
    Message, MessageId, MessagePatch, SessionMode, SessionStatus, SessionSummary,
    SharedSessionStore,
};
use crate::speech::SpeechSynthesizer;

use super::chat::SESSION_START_FAILED;
use super::handoff;
use super::outcome::{StartOutcome, TurnOutcome};

/// Stand-in user message shown while a recording is uploaded and transcribed.
pub const SPEECH_PLACEHOLDER: &str = "(processing speech...)";

/// Rewritten over the placeholder when transcription fails, so the
/// transcript never shows a stale processing line.
pub const RECOGNITION_FAILED: &str = "(recognition failed)";

/// Assistant-role apology appended when the recording could not be
/// transcribed.
pub const RECOGNITION_APOLOGY: &str =
    "Sorry, I couldn't make out what you said. Please try again.";

/// Assistant-role apology for failures on the already-transcribed path.
pub const SPEAKING_APOLOGY: &str = "Sorry, something went wrong. Please try again.";

// ---------------------------------------------------------------------------
// SpeakingController
// ---------------------------------------------------------------------------

/// Orchestrates speaking-mode turns: transcription, reconciliation, and
/// spoken tutor replies.
pub struct SpeakingController {
    store: SharedSessionStore,
    backend: Arc<dyn Backend>,
    toasts: ToastQueue,
    navigator: Arc<dyn Navigator>,
    speech: Arc<dyn SpeechSynthesizer>,
    config: SessionConfig,
}

impl SpeakingController {
    pub fn new(
        store: SharedSessionStore,
        backend: Arc<dyn Backend>,
        toasts: ToastQueue,
        navigator: Arc<dyn Navigator>,
        speech: Arc<dyn SpeechSynthesizer>,
        config: SessionConfig,
    ) -> Self {
        Self {
            store,
            backend,
            toasts,
            navigator,
            speech,
            config,
        }
    }

    // -----------------------------------------------------------------------
    // Session creation
    // -----------------------------------------------------------------------

    /// Create a speaking session and speak the tutor's greeting aloud.
    pub async fn create_session(&self, word_ids: &[String]) -> StartOutcome {
        let Some(token) = self.store.lock().unwrap().begin_turn() else {
            log::debug!("session creation ignored: a turn is in flight");
            return StartOutcome::Ignored;
        };

        let result = self
            .backend
            .create_session(SessionMode::Speaking, word_ids)
            .await;

        let opening = match result {
            Ok(opening) => opening,
            Err(err) => {
                self.store.lock().unwrap().finish_turn(token);
                return if err.is_upsell() {
                    log::info!("speaking session refused: {err}");
                    self.toasts.error(err.to_string());
                    self.navigator.go(Route::Subscribe);
                    StartOutcome::Upsell
                } else {
                    log::warn!("speaking session creation failed: {err}");
                    self.toasts.error(SESSION_START_FAILED);
                    StartOutcome::Failed
                };
            }
        };

        log::info!(
            "speaking session {} started ({} target words)",
            opening.session_id,
            opening.target_words.len()
        );
        let greeting = opening.initial_message.content.clone();
        {
            let mut store = self.store.lock().unwrap();
            store.finish_turn(token);
            store.start_session(
                opening.session_id,
                opening.mode,
                opening.target_words,
                opening.initial_message,
            );
        }
        self.speak(&greeting).await;
        StartOutcome::Started
    }

    // -----------------------------------------------------------------------
    // Recording path
    // -----------------------------------------------------------------------

    /// Upload a finished recording and reconcile the transcribed turn.
    pub async fn submit_recording(&self, clip: &AudioClip) -> TurnOutcome {
        // ── 1. Gate + placeholder insert (one lock) ──────────────────────
        let (session_id, token, placeholder_id) = {
            let mut store = self.store.lock().unwrap();
            let Some(session_id) = store.session_id().map(String::from) else {
                log::debug!("speaking turn ignored: no active session");
                return TurnOutcome::Ignored;
            };
            let Some(token) = store.begin_turn() else {
                log::debug!("speaking turn ignored: another turn is in flight");
                return TurnOutcome::Ignored;
            };
            let placeholder_id = store.add_message(Message::user(SPEECH_PLACEHOLDER));
            (session_id, token, placeholder_id)
        };

        // ── 2. Upload + transcription (lock released) ────────────────────
        let result = self.backend.transcribe_turn(&session_id, clip).await;

        // ── 3. Reconcile ─────────────────────────────────────────────────
        let outcome = match result {
            Ok(response) => {
                self.settle_transcribed(&session_id, placeholder_id, response)
                    .await
            }
            Err(err) if err.is_upsell() => {
                // Entitlement rejections skip reconciliation entirely; the
                // learner is routed away with the placeholder still showing.
                log::info!("speaking turn rejected: {err}");
                self.navigator.go(Route::Subscribe);
                TurnOutcome::Upsell
            }
            Err(err) => {
                log::warn!("transcription failed: {err}");
                {
                    let mut store = self.store.lock().unwrap();
                    store.amend_user_message(
                        &session_id,
                        placeholder_id,
                        &MessagePatch::content(RECOGNITION_FAILED),
                    );
                    store.add_message_for(&session_id, Message::assistant(RECOGNITION_APOLOGY));
                }
                self.toasts.error(err.to_string());
                TurnOutcome::Failed
            }
        };

        // ── 4. Release the gate ──────────────────────────────────────────
        self.store.lock().unwrap().finish_turn(token);
        outcome
    }

    /// Replace the placeholder with the transcript, then hand the reply to
    /// the shared reconciliation tail.
    async fn settle_transcribed(
        &self,
        session_id: &str,
        placeholder_id: MessageId,
        response: TranscribeResponse,
    ) -> TurnOutcome {
        let TranscribeResponse {
            transcription,
            message,
            session_status,
            summary,
        } = response;

        let amended = self.store.lock().unwrap().amend_user_message(
            session_id,
            placeholder_id,
            &MessagePatch::content(transcription.best()),
        );
        if !amended {
            log::debug!("transcription settled into replaced session {session_id}, dropped");
            return TurnOutcome::Ignored;
        }

        self.reconcile_reply(session_id, message, session_status, summary)
            .await
    }

    // -----------------------------------------------------------------------
    // Transcript path
    // -----------------------------------------------------------------------

    /// Send text already recognised on the client.  The text is final at
    /// insertion time, so no placeholder or amendment is involved.
    pub async fn submit_transcript(
        &self,
        transcript: &str,
        audio_duration_ms: u64,
    ) -> TurnOutcome {
        let content = transcript.trim();
        if content.is_empty() {
            return TurnOutcome::Ignored;
        }

        // ── 1. Gate + optimistic insert (one lock) ───────────────────────
        let (session_id, token) = {
            let mut store = self.store.lock().unwrap();
            let Some(session_id) = store.session_id().map(String::from) else {
                log::debug!("speaking turn ignored: no active session");
                return TurnOutcome::Ignored;
            };
            let Some(token) = store.begin_turn() else {
                log::debug!("speaking turn ignored: another turn is in flight");
                return TurnOutcome::Ignored;
            };
            store.add_message(Message::user(content));
            (session_id, token)
        };

        // ── 2. Backend round trip (lock released) ────────────────────────
        let result = self
            .backend
            .send_speaking_turn(&session_id, content, audio_duration_ms)
            .await;

        // ── 3. Reconcile ─────────────────────────────────────────────────
        let outcome = match result {
            Ok(response) => {
                let TurnResponse {
                    message,
                    session_status,
                    summary,
                } = response;
                self.reconcile_reply(&session_id, message, session_status, summary)
                    .await
            }
            Err(err) if err.is_upsell() => {
                log::info!("speaking turn rejected: {err}");
                self.navigator.go(Route::Subscribe);
                TurnOutcome::Upsell
            }
            Err(err) => {
                log::warn!("speaking turn failed: {err}");
                self.store
                    .lock()
                    .unwrap()
                    .add_message_for(&session_id, Message::assistant(SPEAKING_APOLOGY));
                self.toasts.error(err.to_string());
                TurnOutcome::Failed
            }
        };

        // ── 4. Release the gate ──────────────────────────────────────────
        self.store.lock().unwrap().finish_turn(token);
        outcome
    }

    // -----------------------------------------------------------------------
    // Shared reconciliation tail
    // -----------------------------------------------------------------------

    /// Append the tutor reply, merge status, speak the reply, and hand off
    /// to the results view on completion.
    async fn reconcile_reply(
        &self,
        session_id: &str,
        message: Message,
        session_status: SessionStatus,
        summary: Option<SessionSummary>,
    ) -> TurnOutcome {
        let spoken = message.content.clone();
        let completed = {
            let mut store = self.store.lock().unwrap();
            if store.add_message_for(session_id, message).is_none() {
                log::debug!("speaking turn settled into replaced session {session_id}, dropped");
                return TurnOutcome::Ignored;
            }
            store.update_status(session_id, &session_status);
            session_status.is_completed && summary.is_some()
        };

        self.speak(&spoken).await;

        if completed {
            if let Some(summary) = summary {
                let owned = handoff::complete_session(
                    &self.store,
                    &self.toasts,
                    &self.navigator,
                    session_id,
                    summary,
                    Duration::from_millis(self.config.speaking_redirect_delay_ms),
                );
                if owned {
                    return TurnOutcome::Completed;
                }
            }
        }
        TurnOutcome::Settled
    }

    /// Speak `text`, logging instead of failing the turn when synthesis
    /// breaks.
    async fn speak(&self, text: &str) {
        if let Err(err) = self.speech.speak(text).await {
            log::warn!("tutor reply not spoken: {err}");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ApiError, MockBackend, SessionCreateResponse, Transcription};
    use crate::nav::RecordingNavigator;
    use crate::session::{new_shared_store, Role, SpeakingFeedback, TargetWord};
    use crate::speech::MockSynthesizer;
    use std::sync::atomic::Ordering;

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn three_words() -> Vec<TargetWord> {
        ["resilient", "ambiguous", "concede"]
            .iter()
            .enumerate()
            .map(|(i, w)| TargetWord {
                id: format!("w{}", i + 1),
                word: (*w).to_string(),
                definition: format!("definition of {w}"),
            })
            .collect()
    }

    fn opening(session_id: &str) -> SessionCreateResponse {
        SessionCreateResponse {
            session_id: session_id.into(),
            mode: SessionMode::Speaking,
            target_words: three_words(),
            initial_message: Message::assistant("Hello! Let's practise out loud."),
        }
    }

    fn status(used: &[&str], completed: bool) -> SessionStatus {
        let mut status = SessionStatus::fresh(&three_words());
        for w in used {
            status.words_used.insert((*w).into(), true);
        }
        status.completed_count = used.len() as u32;
        status.is_completed = completed;
        status
    }

    fn scored_reply(text: &str, used: &[&str]) -> Message {
        let mut message = Message::assistant(text);
        message.feedback = Some(SpeakingFeedback {
            pronunciation: "clear".into(),
            grammar: "well formed".into(),
            vocabulary: "good range".into(),
            score: 8,
        });
        if !used.is_empty() {
            message.word_usage = Some(used.iter().map(|w| ((*w).to_string(), true)).collect());
        }
        message
    }

    fn transcribed(raw: &str, processed: &str, reply: &str, used: &[&str]) -> TranscribeResponse {
        TranscribeResponse {
            transcription: Transcription {
                raw: raw.into(),
                processed: processed.into(),
            },
            message: scored_reply(reply, used),
            session_status: status(used, false),
            summary: None,
        }
    }

    fn completing_turn(text: &str) -> TurnResponse {
        TurnResponse {
            message: scored_reply(text, &["resilient", "ambiguous", "concede"]),
            session_status: status(&["resilient", "ambiguous", "concede"], true),
            summary: Some(SessionSummary {
                session_id: "sess-1".into(),
                duration_seconds: 240,
                message_count: 9,
                word_usage_details: vec![],
            }),
        }
    }

    fn clip() -> AudioClip {
        AudioClip {
            data: vec![0; 64],
            duration_ms: 1_200,
            sample_rate: 16_000,
        }
    }

    fn make_controller(
        tts: MockSynthesizer,
    ) -> (
        SpeakingController,
        SharedSessionStore,
        Arc<MockBackend>,
        Arc<RecordingNavigator>,
        ToastQueue,
        Arc<MockSynthesizer>,
    ) {
        let store = new_shared_store();
        let mock = Arc::new(MockBackend::new());
        let nav = Arc::new(RecordingNavigator::new());
        let tts = Arc::new(tts);
        let toasts = ToastQueue::new();
        let config = SessionConfig {
            chat_redirect_delay_ms: 5,
            speaking_redirect_delay_ms: 5,
            toast_dedup_ms: 1_000,
        };

        let backend: Arc<dyn Backend> = mock.clone();
        let navigator: Arc<dyn Navigator> = nav.clone();
        let speech: Arc<dyn SpeechSynthesizer> = tts.clone();
        let controller = SpeakingController::new(
            Arc::clone(&store),
            backend,
            toasts.clone(),
            navigator,
            speech,
            config,
        );
        (controller, store, mock, nav, toasts, tts)
    }

    async fn started_controller() -> (
        SpeakingController,
        SharedSessionStore,
        Arc<MockBackend>,
        Arc<RecordingNavigator>,
        ToastQueue,
        Arc<MockSynthesizer>,
    ) {
        let (controller, store, mock, nav, toasts, tts) =
            make_controller(MockSynthesizer::new());
        mock.push_create(Ok(opening("sess-1")));
        assert_eq!(
            controller
                .create_session(&["w1".into(), "w2".into(), "w3".into()])
                .await,
            StartOutcome::Started
        );
        (controller, store, mock, nav, toasts, tts)
    }

    // -----------------------------------------------------------------------
    // Session creation
    // -----------------------------------------------------------------------

    /// The opening tutor message is both stored and spoken.
    #[tokio::test]
    async fn create_session_speaks_the_greeting() {
        let (_controller, store, _mock, _nav, _toasts, tts) = started_controller().await;

        let store = store.lock().unwrap();
        assert_eq!(store.session_id(), Some("sess-1"));
        assert_eq!(store.mode(), Some(SessionMode::Speaking));
        assert_eq!(store.messages().len(), 1);
        assert_eq!(tts.utterances(), vec!["Hello! Let's practise out loud."]);
    }

    #[tokio::test]
    async fn create_session_entitlement_routes_to_subscribe() {
        let (controller, store, mock, nav, _toasts, tts) =
            make_controller(MockSynthesizer::new());
        mock.push_create(Err(ApiError::NotEntitled {
            detail: "Speaking mode is a premium feature.".into(),
        }));

        let outcome = controller.create_session(&["w1".into()]).await;

        assert_eq!(outcome, StartOutcome::Upsell);
        assert!(store.lock().unwrap().session_id().is_none());
        assert_eq!(nav.routes(), vec![Route::Subscribe]);
        assert!(tts.utterances().is_empty());
    }

    // -----------------------------------------------------------------------
    // Recording path
    // -----------------------------------------------------------------------

    /// A finished recording first shows as the processing placeholder, then
    /// becomes the cleaned transcript once the server answers.
    #[tokio::test]
    async fn recording_replaces_placeholder_with_transcript() {
        let (controller, store, mock, _nav, _toasts, tts) = started_controller().await;
        mock.push_transcribe(Ok(transcribed(
            "um I felt resilient today",
            "I felt resilient today.",
            "Great use of 'resilient'!",
            &["resilient"],
        )));

        let outcome = controller.submit_recording(&clip()).await;

        assert_eq!(outcome, TurnOutcome::Settled);
        let store = store.lock().unwrap();
        assert_eq!(store.messages().len(), 3);
        let user = &store.messages()[1];
        assert_eq!(user.role, Role::User);
        assert_eq!(user.content, "I felt resilient today.");
        let reply = &store.messages()[2];
        assert_eq!(reply.content, "Great use of 'resilient'!");
        assert_eq!(reply.feedback.as_ref().unwrap().score, 8);
        assert!(store.status().words_used["resilient"]);
        assert!(!store.is_loading());
        assert_eq!(mock.transcribe_calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            tts.utterances().last().map(String::as_str),
            Some("Great use of 'resilient'!")
        );
    }

    /// When post-processing produced nothing usable the raw transcript is
    /// shown instead.
    #[tokio::test]
    async fn blank_processed_transcript_falls_back_to_raw() {
        let (controller, store, mock, _nav, _toasts, _tts) = started_controller().await;
        mock.push_transcribe(Ok(transcribed("I concede", "   ", "Good!", &["concede"])));

        controller.submit_recording(&clip()).await;

        assert_eq!(store.lock().unwrap().messages()[1].content, "I concede");
    }

    /// Transcription failure must never leave a stale processing line.
    #[tokio::test]
    async fn transcription_failure_rewrites_placeholder() {
        let (controller, store, mock, nav, toasts, _tts) = started_controller().await;
        mock.push_transcribe(Err(ApiError::Timeout));

        let outcome = controller.submit_recording(&clip()).await;

        assert_eq!(outcome, TurnOutcome::Failed);
        let store = store.lock().unwrap();
        assert_eq!(store.messages()[1].content, RECOGNITION_FAILED);
        let last = store.messages().last().unwrap();
        assert_eq!(last.role, Role::Assistant);
        assert_eq!(last.content, RECOGNITION_APOLOGY);
        assert!(!store.is_loading());
        assert_eq!(toasts.active().len(), 1);
        assert!(nav.routes().is_empty());
    }

    /// An entitlement rejection routes straight to subscribe and skips every
    /// reconciliation step, leaving the placeholder as it was.
    #[tokio::test]
    async fn entitlement_rejection_skips_reconciliation() {
        let (controller, store, mock, nav, _toasts, tts) = started_controller().await;
        mock.push_transcribe(Err(ApiError::NotEntitled {
            detail: "premium only".into(),
        }));

        let outcome = controller.submit_recording(&clip()).await;

        assert_eq!(outcome, TurnOutcome::Upsell);
        assert_eq!(nav.routes(), vec![Route::Subscribe]);
        let store = store.lock().unwrap();
        assert_eq!(store.messages().len(), 2);
        assert_eq!(store.messages()[1].content, SPEECH_PLACEHOLDER);
        assert!(!store.is_loading());
        assert_eq!(tts.utterances().len(), 1, "only the greeting was spoken");
    }

    /// With a turn already in flight no placeholder may appear.
    #[tokio::test]
    async fn recording_ignored_while_turn_in_flight() {
        let (controller, store, mock, _nav, _toasts, _tts) = started_controller().await;
        let _held = store.lock().unwrap().begin_turn().unwrap();

        let outcome = controller.submit_recording(&clip()).await;

        assert_eq!(outcome, TurnOutcome::Ignored);
        assert_eq!(store.lock().unwrap().messages().len(), 1);
        assert_eq!(mock.transcribe_calls.load(Ordering::SeqCst), 0);
    }

    // -----------------------------------------------------------------------
    // Transcript path
    // -----------------------------------------------------------------------

    /// Client-side recognition inserts final text directly; no placeholder,
    /// no amendment.
    #[tokio::test]
    async fn transcript_path_appends_directly() {
        let (controller, store, mock, _nav, _toasts, _tts) = started_controller().await;
        mock.push_speaking(Ok(TurnResponse {
            message: scored_reply("Nicely put.", &["concede"]),
            session_status: status(&["concede"], false),
            summary: None,
        }));

        let outcome = controller.submit_transcript("I concede the point", 900).await;

        assert_eq!(outcome, TurnOutcome::Settled);
        let store = store.lock().unwrap();
        assert_eq!(store.messages().len(), 3);
        assert_eq!(store.messages()[1].content, "I concede the point");
        assert_eq!(mock.speaking_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn blank_transcript_is_ignored() {
        let (controller, store, mock, _nav, _toasts, _tts) = started_controller().await;

        let outcome = controller.submit_transcript("  \n ", 500).await;

        assert_eq!(outcome, TurnOutcome::Ignored);
        assert_eq!(store.lock().unwrap().messages().len(), 1);
        assert_eq!(mock.speaking_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn transcript_failure_appends_apology() {
        let (controller, store, mock, _nav, toasts, _tts) = started_controller().await;
        mock.push_speaking(Err(ApiError::Status {
            status: 502,
            detail: "bad gateway".into(),
        }));

        let outcome = controller.submit_transcript("hello tutor", 700).await;

        assert_eq!(outcome, TurnOutcome::Failed);
        let store = store.lock().unwrap();
        let last = store.messages().last().unwrap();
        assert_eq!(last.content, SPEAKING_APOLOGY);
        assert!(!store.is_loading());
        drop(store);
        assert_eq!(toasts.active().len(), 1);
    }

    // -----------------------------------------------------------------------
    // Completion and speech
    // -----------------------------------------------------------------------

    /// Completion stores the summary and navigates to results after the
    /// speaking-mode delay.
    #[tokio::test]
    async fn completion_redirects_to_results() {
        let (controller, store, mock, nav, _toasts, _tts) = started_controller().await;
        mock.push_speaking(Ok(completing_turn("That was every word. Well done!")));

        let outcome = controller.submit_transcript("I concede.", 800).await;

        assert_eq!(outcome, TurnOutcome::Completed);
        assert_eq!(
            store.lock().unwrap().summary().unwrap().duration_seconds,
            240
        );
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(
            nav.routes(),
            vec![Route::SessionResults {
                session_id: "sess-1".into()
            }]
        );
    }

    /// Speech synthesis trouble is logged, never surfaced as a turn failure.
    #[tokio::test]
    async fn synthesis_failure_does_not_fail_the_turn() {
        let (controller, store, mock, _nav, _toasts, _tts) =
            make_controller(MockSynthesizer::failing());
        mock.push_create(Ok(opening("sess-1")));
        controller.create_session(&["w1".into()]).await;
        mock.push_speaking(Ok(TurnResponse {
            message: scored_reply("Still here.", &[]),
            session_status: status(&[], false),
            summary: None,
        }));

        let outcome = controller.submit_transcript("can you hear me", 600).await;

        assert_eq!(outcome, TurnOutcome::Settled);
        let store = store.lock().unwrap();
        assert_eq!(store.messages().last().unwrap().content, "Still here.");
        assert!(!store.is_loading());
    }
}
