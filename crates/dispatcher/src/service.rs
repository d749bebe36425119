use std::collections::HashSet;

use lingopane_core::{
    ControlRequest, EnhancedResult, FeatureConfig, FrameId, FrameTarget, FrameTransport,
    PageDirective, PageRequest, Settings, SettingsPatch, TabId, TranslationRequest,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::client::EndpointClient;
use crate::parse::parse_model_response;
use crate::prompt::{build_prompt, truncate_input};

pub const CREDENTIAL_MISSING: &str =
    "API key not found. Please set your Gemini API key in the extension preferences.";

pub const FORMAT_UNEXPECTED: &str = "Translation failed. API response format was unexpected.";

/// Explicit dispatcher configuration, injected rather than ambient. Mutated
/// only through `apply_settings_update`; in-flight requests use whatever
/// snapshot existed when their prompt was built.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    pub api_key: String,
    pub target_language: String,
    pub features: FeatureConfig,
    pub hotkeys_enabled: bool,
    pub hotkey_modifier: String,
    pub hotkey_key: String,
}

impl DispatcherConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            api_key: settings.gemini_api_key.clone(),
            target_language: settings.target_language.clone(),
            features: settings.features(),
            hotkeys_enabled: settings.hotkeys_enabled,
            hotkey_modifier: settings.hotkey_modifier.clone(),
            hotkey_key: settings.hotkey_key.clone(),
        }
    }

    pub fn has_credential(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

/// The privileged background agent: owns the credential, builds prompts,
/// calls the endpoint, parses the result, and fans it out to the requesting
/// tab's frames.
pub struct Dispatcher<T: FrameTransport> {
    config: DispatcherConfig,
    client: EndpointClient,
    transport: T,
    known_tabs: HashSet<TabId>,
}

impl<T: FrameTransport> Dispatcher<T> {
    pub fn new(config: DispatcherConfig, client: EndpointClient, transport: T) -> Self {
        Self {
            config,
            client,
            transport,
            known_tabs: HashSet::new(),
        }
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Handle one translation request, fire-and-forget. The outcome, good or
    /// bad, is delivered to the originating tab as a directive; this never
    /// returns an error to the caller.
    pub async fn handle_translation_request(
        &self,
        text: &str,
        target_language: Option<&str>,
        tab: TabId,
    ) {
        if !self.config.has_credential() {
            self.deliver_to_all_frames(
                tab,
                PageDirective::ShowError {
                    error: CREDENTIAL_MISSING.to_string(),
                },
            )
            .await;
            return;
        }

        // Snapshot taken at prompt-construction time; a settings update that
        // lands mid-flight does not affect this request.
        let request = TranslationRequest {
            source_text: truncate_input(text).to_string(),
            target_language: target_language.map(|s| s.to_string()),
            origin_tab: tab,
            features: self.config.features,
        };
        let features = request.features;
        let target = request
            .target_language
            .as_deref()
            .unwrap_or(&self.config.target_language);
        let prompt = build_prompt(&request.source_text, target, &features);

        info!(
            tab = tab.0,
            chars = request.source_text.chars().count(),
            target = %target,
            "Translation requested"
        );

        let raw = match self.client.generate(&self.config.api_key, &prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Endpoint call failed");
                self.deliver_to_all_frames(
                    tab,
                    PageDirective::ShowError {
                        error: format!("API error: {}", e),
                    },
                )
                .await;
                return;
            }
        };

        let directive = match parse_model_response(&raw) {
            Ok(parsed) if features.meanings => PageDirective::ShowEnhancedTranslation {
                original: text.to_string(),
                result: EnhancedResult {
                    translation: parsed.translation,
                    detected_language: parsed.detected_language,
                    meanings: parsed.meanings,
                },
                features,
            },
            Ok(parsed) => PageDirective::ShowTranslation {
                original: text.to_string(),
                translation: parsed.translation,
                detected_language: parsed.detected_language,
            },
            Err(e) => {
                warn!(error = %e, "Response not recoverable");
                PageDirective::ShowError {
                    error: FORMAT_UNEXPECTED.to_string(),
                }
            }
        };

        self.deliver_to_all_frames(tab, directive).await;
    }

    /// Field-wise overwrite of the in-memory configuration; absent fields
    /// are untouched. Last write wins. Page-relevant fields are re-broadcast
    /// to every tab seen so far.
    pub async fn apply_settings_update(&mut self, patch: &SettingsPatch) {
        if let Some(v) = &patch.gemini_api_key {
            self.config.api_key = v.clone();
        }
        if let Some(v) = &patch.target_language {
            self.config.target_language = v.clone();
        }
        if let Some(v) = patch.show_meanings {
            self.config.features.meanings = v;
        }
        if let Some(v) = patch.show_synonyms {
            self.config.features.synonyms = v;
        }
        if let Some(v) = patch.show_examples {
            self.config.features.examples = v;
        }
        if let Some(v) = patch.hotkeys_enabled {
            self.config.hotkeys_enabled = v;
        }
        if let Some(v) = &patch.hotkey_modifier {
            self.config.hotkey_modifier = v.clone();
        }
        if let Some(v) = &patch.hotkey_key {
            self.config.hotkey_key = v.clone();
        }

        info!("Settings update applied");

        let page_relevant = patch.target_language.is_some()
            || patch.hotkeys_enabled.is_some()
            || patch.hotkey_modifier.is_some()
            || patch.hotkey_key.is_some();
        if page_relevant {
            let directive = PageDirective::UpdateSettings {
                target_language: patch.target_language.clone(),
                hotkeys_enabled: patch.hotkeys_enabled,
                hotkey_modifier: patch.hotkey_modifier.clone(),
                hotkey_key: patch.hotkey_key.clone(),
            };
            let tabs: Vec<TabId> = self.known_tabs.iter().copied().collect();
            for tab in tabs {
                self.deliver_to_all_frames(tab, directive.clone()).await;
            }
        }
    }

    /// Best-effort fanout: top-level frame first, then every enumerated
    /// sub-frame, each attempt independent. If enumeration itself fails,
    /// fall back to a single untargeted attempt. Failures are logged and
    /// swallowed; frames without an active page agent are normal.
    pub async fn deliver_to_all_frames(&self, tab: TabId, directive: PageDirective) {
        if let Err(e) = self
            .transport
            .send(tab, FrameTarget::Frame(FrameId::TOP), directive.clone())
            .await
        {
            debug!(tab = tab.0, error = %e, "Delivery to top frame failed");
        }

        match self.transport.frames(tab).await {
            Ok(frames) => {
                for frame in frames {
                    if frame == FrameId::TOP {
                        continue;
                    }
                    if let Err(e) = self
                        .transport
                        .send(tab, FrameTarget::Frame(frame), directive.clone())
                        .await
                    {
                        debug!(tab = tab.0, frame = frame.0, error = %e, "Delivery to sub-frame failed");
                    }
                }
            }
            Err(e) => {
                debug!(tab = tab.0, error = %e, "Frame enumeration failed, trying untargeted delivery");
                if let Err(e) = self
                    .transport
                    .send(tab, FrameTarget::Unspecified, directive)
                    .await
                {
                    debug!(tab = tab.0, error = %e, "Untargeted delivery failed");
                }
            }
        }
    }

    async fn handle_request(&mut self, tab: TabId, request: PageRequest) {
        self.known_tabs.insert(tab);
        match request {
            PageRequest::TranslateSelection {
                text,
                target_language,
            } => {
                if text.trim().is_empty() {
                    debug!(tab = tab.0, "Ignoring empty selection");
                    return;
                }
                self.handle_translation_request(&text, target_language.as_deref(), tab)
                    .await;
            }
            PageRequest::Ping => {
                debug!(tab = tab.0, "Ping");
            }
            PageRequest::Wakeup { timestamp } => {
                debug!(tab = tab.0, timestamp, "Wakeup");
            }
        }
    }

    /// Event loop: consume page requests and control updates until the
    /// request channel closes.
    pub async fn run(
        mut self,
        mut request_rx: mpsc::Receiver<(TabId, PageRequest)>,
        mut control_rx: mpsc::Receiver<ControlRequest>,
    ) {
        info!("Dispatcher started");
        let mut control_open = true;
        loop {
            tokio::select! {
                req = request_rx.recv() => match req {
                    Some((tab, request)) => self.handle_request(tab, request).await,
                    None => break,
                },
                ctl = control_rx.recv(), if control_open => match ctl {
                    Some(ControlRequest::SettingsUpdated { settings }) => {
                        self.apply_settings_update(&settings).await;
                    }
                    None => control_open = false,
                },
            }
        }
        info!("Dispatcher stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use lingopane_core::{Error, LoopbackTransport, Result};
    use std::sync::Mutex;
    use wiremock::{matchers, Mock, MockServer, ResponseTemplate};

    fn config_with_key(key: &str) -> DispatcherConfig {
        DispatcherConfig {
            api_key: key.to_string(),
            target_language: "Bangla".to_string(),
            features: FeatureConfig::default(),
            hotkeys_enabled: true,
            hotkey_modifier: "alt".to_string(),
            hotkey_key: "t".to_string(),
        }
    }

    fn candidate_body(text: &str) -> String {
        serde_json::json!({
            "candidates": [{
                "content": {"parts": [{"text": text}], "role": "model"},
                "finishReason": "STOP"
            }]
        })
        .to_string()
    }

    async fn dispatch_one(
        config: DispatcherConfig,
        server_uri: &str,
        text: &str,
    ) -> PageDirective {
        let (tx, mut rx) = mpsc::channel(4);
        let dispatcher = Dispatcher::new(
            config,
            EndpointClient::new(Some(server_uri), None),
            LoopbackTransport::new(tx),
        );
        dispatcher
            .handle_translation_request(text, None, TabId(1))
            .await;
        rx.recv().await.expect("directive delivered")
    }

    #[tokio::test]
    async fn test_missing_credential_no_http_call() {
        let mock_server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string(candidate_body("x")))
            .expect(0)
            .mount(&mock_server)
            .await;

        let directive = dispatch_one(config_with_key(""), &mock_server.uri(), "hello").await;
        match directive {
            PageDirective::ShowError { error } => assert!(error.contains("API key")),
            other => panic!("unexpected directive: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_success_delivers_translation() {
        let mock_server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string(candidate_body(
                r#"{"detectedLanguage": "English", "translation": "হ্যালো বিশ্ব"}"#,
            )))
            .expect(1)
            .mount(&mock_server)
            .await;

        let directive =
            dispatch_one(config_with_key("k"), &mock_server.uri(), "hello world").await;
        match directive {
            PageDirective::ShowTranslation {
                original,
                translation,
                detected_language,
            } => {
                assert_eq!(original, "hello world");
                assert_eq!(translation, "হ্যালো বিশ্ব");
                assert_eq!(detected_language.as_deref(), Some("English"));
            }
            other => panic!("unexpected directive: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_meanings_enabled_delivers_enhanced() {
        let mock_server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string(candidate_body(
                r#"{"translation": "হ্যালো", "meanings": {"hello": {"english": "a greeting"}}}"#,
            )))
            .mount(&mock_server)
            .await;

        let mut config = config_with_key("k");
        config.features.meanings = true;
        let directive = dispatch_one(config, &mock_server.uri(), "hello").await;
        match directive {
            PageDirective::ShowEnhancedTranslation {
                result, features, ..
            } => {
                assert_eq!(result.translation, "হ্যালো");
                assert!(features.meanings);
                assert!(result.meanings.unwrap().contains_key("hello"));
            }
            other => panic!("unexpected directive: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_http_error_surfaces_status() {
        let mock_server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&mock_server)
            .await;

        let directive = dispatch_one(config_with_key("k"), &mock_server.uri(), "hello").await;
        match directive {
            PageDirective::ShowError { error } => {
                assert!(error.starts_with("API error:"));
                assert!(error.contains("500"));
            }
            other => panic!("unexpected directive: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unrecoverable_response_is_generic_format_error() {
        let mock_server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string(candidate_body("{}\n[]")))
            .mount(&mock_server)
            .await;

        let directive = dispatch_one(config_with_key("k"), &mock_server.uri(), "hello").await;
        assert_eq!(
            directive,
            PageDirective::ShowError {
                error: FORMAT_UNEXPECTED.to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_degraded_recovery_reaches_page() {
        let mock_server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(candidate_body("হ্যালো বিশ্ব")),
            )
            .mount(&mock_server)
            .await;

        let directive = dispatch_one(config_with_key("k"), &mock_server.uri(), "hello").await;
        match directive {
            PageDirective::ShowTranslation { translation, .. } => {
                assert_eq!(translation, "হ্যালো বিশ্ব");
            }
            other => panic!("unexpected directive: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_apply_settings_update_last_write_wins() {
        let (tx, _rx) = mpsc::channel(4);
        let mut dispatcher = Dispatcher::new(
            config_with_key("old"),
            EndpointClient::new(None, None),
            LoopbackTransport::new(tx),
        );
        dispatcher
            .apply_settings_update(&SettingsPatch {
                gemini_api_key: Some("new".to_string()),
                show_meanings: Some(true),
                ..Default::default()
            })
            .await;
        assert_eq!(dispatcher.config().api_key, "new");
        assert!(dispatcher.config().features.meanings);
        // untouched fields survive
        assert_eq!(dispatcher.config().target_language, "Bangla");
    }

    /// Transport double with a configurable frame list and per-frame
    /// failures, recording every attempt.
    struct RecordingTransport {
        frames: Vec<FrameId>,
        fail_frames: Vec<FrameId>,
        enumeration_fails: bool,
        sent: Mutex<Vec<FrameTarget>>,
    }

    #[async_trait]
    impl FrameTransport for RecordingTransport {
        async fn send(
            &self,
            _tab: TabId,
            target: FrameTarget,
            _directive: PageDirective,
        ) -> Result<()> {
            self.sent.lock().unwrap().push(target);
            if let FrameTarget::Frame(id) = target {
                if self.fail_frames.contains(&id) {
                    return Err(Error::Transport("no receiving end".to_string()));
                }
            }
            Ok(())
        }

        async fn frames(&self, _tab: TabId) -> Result<Vec<FrameId>> {
            if self.enumeration_fails {
                Err(Error::Transport("enumeration failed".to_string()))
            } else {
                Ok(self.frames.clone())
            }
        }
    }

    #[tokio::test]
    async fn test_fanout_continues_past_failing_frame() {
        let transport = RecordingTransport {
            frames: vec![FrameId(1), FrameId(2), FrameId(3)],
            fail_frames: vec![FrameId(2)],
            enumeration_fails: false,
            sent: Mutex::new(vec![]),
        };
        let dispatcher = Dispatcher::new(
            config_with_key("k"),
            EndpointClient::new(None, None),
            transport,
        );
        dispatcher
            .deliver_to_all_frames(
                TabId(7),
                PageDirective::ShowError {
                    error: "x".to_string(),
                },
            )
            .await;

        let sent = dispatcher.transport.sent.lock().unwrap().clone();
        assert_eq!(
            sent,
            vec![
                FrameTarget::Frame(FrameId::TOP),
                FrameTarget::Frame(FrameId(1)),
                FrameTarget::Frame(FrameId(2)),
                FrameTarget::Frame(FrameId(3)),
            ]
        );
    }

    #[tokio::test]
    async fn test_fanout_enumeration_failure_falls_back_untargeted() {
        let transport = RecordingTransport {
            frames: vec![],
            fail_frames: vec![],
            enumeration_fails: true,
            sent: Mutex::new(vec![]),
        };
        let dispatcher = Dispatcher::new(
            config_with_key("k"),
            EndpointClient::new(None, None),
            transport,
        );
        dispatcher
            .deliver_to_all_frames(
                TabId(7),
                PageDirective::ShowError {
                    error: "x".to_string(),
                },
            )
            .await;

        let sent = dispatcher.transport.sent.lock().unwrap().clone();
        assert_eq!(
            sent,
            vec![
                FrameTarget::Frame(FrameId::TOP),
                FrameTarget::Unspecified,
            ]
        );
    }

    #[tokio::test]
    async fn test_run_loop_answers_requests_and_settings() {
        let mock_server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string(candidate_body(
                r#"{"translation": "হ্যালো"}"#,
            )))
            .mount(&mock_server)
            .await;

        let (directive_tx, mut directive_rx) = mpsc::channel(4);
        let (request_tx, request_rx) = mpsc::channel(4);
        let (control_tx, control_rx) = mpsc::channel(4);

        let dispatcher = Dispatcher::new(
            config_with_key("k"),
            EndpointClient::new(Some(&mock_server.uri()), None),
            LoopbackTransport::new(directive_tx),
        );
        let handle = tokio::spawn(dispatcher.run(request_rx, control_rx));

        request_tx
            .send((
                TabId(1),
                PageRequest::TranslateSelection {
                    text: "hello".to_string(),
                    target_language: None,
                },
            ))
            .await
            .unwrap();

        match directive_rx.recv().await.unwrap() {
            PageDirective::ShowTranslation { translation, .. } => {
                assert_eq!(translation, "হ্যালো");
            }
            other => panic!("unexpected directive: {:?}", other),
        }

        // A page-relevant settings update is broadcast to the known tab.
        control_tx
            .send(ControlRequest::SettingsUpdated {
                settings: SettingsPatch {
                    target_language: Some("French".to_string()),
                    ..Default::default()
                },
            })
            .await
            .unwrap();

        match directive_rx.recv().await.unwrap() {
            PageDirective::UpdateSettings {
                target_language, ..
            } => assert_eq!(target_language.as_deref(), Some("French")),
            other => panic!("unexpected directive: {:?}", other),
        }

        drop(request_tx);
        handle.await.unwrap();
    }
}
