use std::sync::Arc;
use std::time::{Duration, Instant};

use lingopane_core::{Error, PageDirective, PageRequest, SettingsStore, TabId, TranslationResult};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::connection::{
    reconnect, ConnectionState, ACTIVITY_CHECK_INTERVAL, KEEPALIVE_INTERVAL, WAKE_DELAY,
};
use crate::overlay::{OverlayContent, OverlayManager};
use crate::selection::{Hotkey, KeyCombo, SelectionConfig, SelectionMonitor};

pub const CONNECTION_LOST: &str =
    "Connection to the translation service was lost. Trying to reconnect...";

/// Host-reported page events, one stream per frame.
#[derive(Debug, Clone)]
pub enum PageEvent {
    MouseUp { selection: String, over_overlay: bool },
    RightClick,
    KeyCombo { combo: KeyCombo, selection: String },
    PointerEnter,
    PointerLeave,
    ClickOutside,
    CloseClicked,
}

/// One instance per page frame: captures selections, talks to the
/// dispatcher, and owns the frame's overlay.
pub struct PageAgent<S: SettingsStore> {
    tab: TabId,
    store: Arc<S>,
    request_tx: mpsc::Sender<(TabId, PageRequest)>,
    selection: SelectionMonitor,
    connection: ConnectionState,
    overlay: OverlayManager,
    target_language: Option<String>,
    last_keepalive: Instant,
    last_idle_check: Instant,
}

impl<S: SettingsStore> PageAgent<S> {
    pub async fn new(
        tab: TabId,
        store: Arc<S>,
        request_tx: mpsc::Sender<(TabId, PageRequest)>,
    ) -> Self {
        let settings = store.load().await.unwrap_or_default();
        let now = Instant::now();
        Self {
            tab,
            store,
            request_tx,
            selection: SelectionMonitor::new(SelectionConfig {
                hotkeys_enabled: settings.hotkeys_enabled,
                hotkey_only: settings.hotkey_only,
                hotkey: Hotkey {
                    modifier: settings.hotkey_modifier.clone(),
                    key: settings.hotkey_key.clone(),
                },
            }),
            connection: ConnectionState::new(now),
            overlay: OverlayManager::new(),
            target_language: Some(settings.target_language),
            last_keepalive: now,
            last_idle_check: now,
        }
    }

    pub fn overlay(&self) -> &OverlayManager {
        &self.overlay
    }

    pub fn connection(&self) -> &ConnectionState {
        &self.connection
    }

    pub async fn handle_event(&mut self, event: PageEvent) {
        let now = Instant::now();
        match event {
            PageEvent::MouseUp {
                selection,
                over_overlay,
            } => {
                self.connection.record_activity(now);
                self.selection.on_mouse_up(&selection, over_overlay, now);
            }
            PageEvent::RightClick => {
                self.selection.on_right_click();
            }
            PageEvent::KeyCombo { combo, selection } => {
                self.connection.record_activity(now);
                if let Some(text) = self.selection.on_key_combo(&combo, &selection) {
                    self.refresh_target_language().await;
                    self.send_request(text).await;
                }
            }
            PageEvent::PointerEnter => self.overlay.pointer_enter(),
            PageEvent::PointerLeave => self.overlay.pointer_leave(now),
            PageEvent::ClickOutside | PageEvent::CloseClicked => {
                self.connection.record_activity(now);
                self.overlay.dismiss();
            }
        }
    }

    pub fn handle_directive(&mut self, directive: PageDirective) {
        let now = Instant::now();
        match directive {
            PageDirective::ShowTranslation {
                original,
                translation,
                detected_language,
            } => {
                self.connection.record_activity(now);
                self.overlay.show(
                    OverlayContent::Result(TranslationResult {
                        original_text: original,
                        translated_text: translation,
                        detected_language,
                        meanings: None,
                    }),
                    now,
                );
            }
            PageDirective::ShowEnhancedTranslation {
                original,
                result,
                features,
            } => {
                self.connection.record_activity(now);
                // render meanings only when the feature is actually on
                let meanings = if features.meanings {
                    result.meanings
                } else {
                    None
                };
                self.overlay.show(
                    OverlayContent::Result(TranslationResult {
                        original_text: original,
                        translated_text: result.translation,
                        detected_language: result.detected_language,
                        meanings,
                    }),
                    now,
                );
            }
            PageDirective::ShowError { error } => {
                self.overlay.show(OverlayContent::Error { message: error }, now);
            }
            PageDirective::UpdateSettings {
                target_language,
                hotkeys_enabled,
                hotkey_modifier,
                hotkey_key,
            } => {
                if let Some(v) = target_language {
                    self.target_language = Some(v);
                }
                if let Some(v) = hotkeys_enabled {
                    self.selection.config.hotkeys_enabled = v;
                }
                if let Some(v) = hotkey_modifier {
                    self.selection.config.hotkey.modifier = v;
                }
                if let Some(v) = hotkey_key {
                    self.selection.config.hotkey.key = v;
                }
                debug!("Page settings updated");
            }
        }
    }

    /// One scheduler tick: debounced selections, overlay timers, keep-alive
    /// and idle probes.
    pub async fn tick(&mut self) {
        let now = Instant::now();

        if let Some(text) = self.selection.poll(now) {
            self.refresh_target_language().await;
            self.send_request(text).await;
        }

        self.overlay.poll(now);

        if now.saturating_duration_since(self.last_keepalive) >= KEEPALIVE_INTERVAL {
            self.last_keepalive = now;
            // a single dropped probe is ignored to avoid flapping
            if self.request_tx.send((self.tab, PageRequest::Ping)).await.is_ok() {
                self.connection.record_activity(now);
            }
        }

        if now.saturating_duration_since(self.last_idle_check) >= ACTIVITY_CHECK_INTERVAL {
            self.last_idle_check = now;
            if self.connection.needs_probe(now) {
                debug!("Idle too long, probing dispatcher");
                match self.request_tx.send((self.tab, PageRequest::Ping)).await {
                    Ok(()) => self.connection.record_activity(now),
                    Err(_) => self.connection.mark_inactive(),
                }
            }
        }
    }

    async fn refresh_target_language(&mut self) {
        match self.store.load().await {
            Ok(settings) => self.target_language = Some(settings.target_language),
            Err(e) => debug!(error = %e, "Settings refresh failed, using cached target language"),
        }
    }

    async fn send_request(&mut self, text: String) {
        if !self.connection.is_active() {
            debug!("Connection inactive, reconnecting before send");
            if reconnect(self.store.as_ref(), &self.request_tx, self.tab)
                .await
                .is_ok()
            {
                self.connection.record_activity(Instant::now());
            }
            tokio::time::sleep(WAKE_DELAY).await;
        }

        let request = PageRequest::TranslateSelection {
            text,
            target_language: self.target_language.clone(),
        };
        if self.request_tx.send((self.tab, request)).await.is_err() {
            let err = Error::Transport("no receiving end".to_string());
            warn!(error = %err, "Translation request not delivered");
            self.connection.mark_inactive();
            self.overlay.show(
                OverlayContent::Error {
                    message: CONNECTION_LOST.to_string(),
                },
                Instant::now(),
            );
        }
    }

    /// Event loop. Runs until both the event stream and the directive
    /// channel close.
    pub async fn run(
        mut self,
        mut events: mpsc::Receiver<PageEvent>,
        mut directives: mpsc::Receiver<PageDirective>,
    ) {
        info!(tab = self.tab.0, "Page agent started");
        let mut tick = tokio::time::interval(Duration::from_millis(50));
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut events_open = true;
        let mut directives_open = true;
        while events_open || directives_open {
            tokio::select! {
                ev = events.recv(), if events_open => match ev {
                    Some(ev) => self.handle_event(ev).await,
                    None => events_open = false,
                },
                d = directives.recv(), if directives_open => match d {
                    Some(d) => self.handle_directive(d),
                    None => directives_open = false,
                },
                _ = tick.tick() => self.tick().await,
            }
        }
        info!(tab = self.tab.0, "Page agent stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::DEBOUNCE;
    use lingopane_core::{EnhancedResult, FeatureConfig, MemoryStore, Settings};

    async fn agent_with(
        settings: Settings,
    ) -> (
        PageAgent<MemoryStore>,
        mpsc::Receiver<(TabId, PageRequest)>,
    ) {
        let store = Arc::new(MemoryStore::new(settings));
        let (tx, rx) = mpsc::channel(8);
        (PageAgent::new(TabId(1), store, tx).await, rx)
    }

    #[tokio::test]
    async fn test_selection_round_trip_sends_request() {
        let (mut agent, mut rx) = agent_with(Settings {
            target_language: "Bangla".to_string(),
            ..Default::default()
        })
        .await;

        agent
            .handle_event(PageEvent::MouseUp {
                selection: "hello world".to_string(),
                over_overlay: false,
            })
            .await;
        tokio::time::sleep(DEBOUNCE + Duration::from_millis(20)).await;
        agent.tick().await;

        match rx.recv().await {
            Some((
                TabId(1),
                PageRequest::TranslateSelection {
                    text,
                    target_language,
                },
            )) => {
                assert_eq!(text, "hello world");
                assert_eq!(target_language.as_deref(), Some("Bangla"));
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_directive_renders_overlay() {
        let (mut agent, _rx) = agent_with(Settings::default()).await;
        agent.handle_directive(PageDirective::ShowTranslation {
            original: "hello world".to_string(),
            translation: "হ্যালো বিশ্ব".to_string(),
            detected_language: Some("English".to_string()),
        });
        match &agent.overlay().current().unwrap().content {
            OverlayContent::Result(result) => {
                assert_eq!(result.original_text, "hello world");
                assert_eq!(result.translated_text, "হ্যালো বিশ্ব");
                assert!(result.meanings.is_none());
            }
            other => panic!("unexpected content: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_enhanced_directive_hides_meanings_when_feature_off() {
        let (mut agent, _rx) = agent_with(Settings::default()).await;
        let mut meanings = std::collections::BTreeMap::new();
        meanings.insert(
            "hello".to_string(),
            lingopane_core::Meaning {
                english: "a greeting".to_string(),
                localized: None,
            },
        );
        agent.handle_directive(PageDirective::ShowEnhancedTranslation {
            original: "hello".to_string(),
            result: EnhancedResult {
                translation: "হ্যালো".to_string(),
                detected_language: None,
                meanings: Some(meanings),
            },
            features: FeatureConfig::default(),
        });
        match &agent.overlay().current().unwrap().content {
            OverlayContent::Result(result) => assert!(result.meanings.is_none()),
            other => panic!("unexpected content: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_send_failure_shows_connection_lost_overlay() {
        let (mut agent, rx) = agent_with(Settings::default()).await;
        drop(rx);
        agent
            .handle_event(PageEvent::KeyCombo {
                combo: KeyCombo {
                    alt: true,
                    ctrl: false,
                    shift: false,
                    meta: false,
                    key: "t".to_string(),
                },
                selection: "hello".to_string(),
            })
            .await;
        assert!(!agent.connection().is_active());
        match &agent.overlay().current().unwrap().content {
            OverlayContent::Error { message } => assert_eq!(message, CONNECTION_LOST),
            other => panic!("unexpected content: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_update_settings_directive_applies_hotkey() {
        let (mut agent, _rx) = agent_with(Settings::default()).await;
        agent.handle_directive(PageDirective::UpdateSettings {
            target_language: Some("French".to_string()),
            hotkeys_enabled: Some(false),
            hotkey_modifier: Some("ctrl".to_string()),
            hotkey_key: Some("space".to_string()),
        });
        assert_eq!(agent.target_language.as_deref(), Some("French"));
        assert!(!agent.selection.config.hotkeys_enabled);
        assert_eq!(agent.selection.config.hotkey.modifier, "ctrl");
    }

    #[tokio::test]
    async fn test_click_outside_dismisses_overlay() {
        let (mut agent, _rx) = agent_with(Settings::default()).await;
        agent.handle_directive(PageDirective::ShowError {
            error: "x".to_string(),
        });
        assert!(agent.overlay().is_visible());
        agent.handle_event(PageEvent::ClickOutside).await;
        assert!(!agent.overlay().is_visible());
    }
}
