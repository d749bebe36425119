use std::time::{Duration, Instant};

use tracing::debug;

/// Mouse-up to request delay, letting the browser finish extending the
/// selection before it is read.
pub const DEBOUNCE: Duration = Duration::from_millis(200);

/// A modifier+key press as reported by the host.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyCombo {
    pub alt: bool,
    pub ctrl: bool,
    pub shift: bool,
    pub meta: bool,
    pub key: String,
}

/// User-configured trigger combination. Modifier and key are independently
/// configurable and matched case-insensitively; the space key may be stored
/// as either `" "` or the name `"space"`.
#[derive(Debug, Clone, PartialEq)]
pub struct Hotkey {
    pub modifier: String,
    pub key: String,
}

impl Hotkey {
    pub fn matches(&self, combo: &KeyCombo) -> bool {
        let modifier_held = match self.modifier.to_ascii_lowercase().as_str() {
            "alt" => combo.alt,
            "ctrl" | "control" => combo.ctrl,
            "shift" => combo.shift,
            "meta" | "cmd" | "command" => combo.meta,
            _ => false,
        };
        modifier_held && key_name_eq(&self.key, &combo.key)
    }
}

fn key_name_eq(configured: &str, pressed: &str) -> bool {
    let normalize = |k: &str| {
        if k == " " {
            "space".to_string()
        } else {
            k.to_ascii_lowercase()
        }
    };
    normalize(configured) == normalize(pressed)
}

#[derive(Debug, Clone)]
pub struct SelectionConfig {
    pub hotkeys_enabled: bool,
    /// When set, mouse-up selections never auto-translate; only the hotkey
    /// triggers a request.
    pub hotkey_only: bool,
    pub hotkey: Hotkey,
}

/// Per-frame capture state machine: Idle until a debounced selection or a
/// hotkey press produces a request, then straight back to Idle (requests
/// are fire-and-forget).
#[derive(Debug)]
pub struct SelectionMonitor {
    pub config: SelectionConfig,
    suppress_next: bool,
    pending: Option<(String, Instant)>,
}

impl SelectionMonitor {
    pub fn new(config: SelectionConfig) -> Self {
        Self {
            config,
            suppress_next: false,
            pending: None,
        }
    }

    /// Mouse released. Ignored over the overlay; otherwise a non-empty
    /// selection arms the debounce timer. A pending right-click suppression
    /// consumes this selection instead (opening a native context menu must
    /// not also auto-translate).
    pub fn on_mouse_up(&mut self, selection: &str, over_overlay: bool, now: Instant) {
        if over_overlay {
            return;
        }
        let trimmed = selection.trim();
        if trimmed.is_empty() {
            self.pending = None;
            return;
        }
        if self.suppress_next {
            debug!("Selection suppressed after context-menu interaction");
            self.suppress_next = false;
            return;
        }
        if self.config.hotkey_only {
            return;
        }
        self.pending = Some((trimmed.to_string(), now + DEBOUNCE));
    }

    /// Secondary mouse button: arm the one-shot suppression flag.
    pub fn on_right_click(&mut self) {
        self.suppress_next = true;
    }

    /// Hotkey press with the current selection. Fires immediately when the
    /// combination matches, regardless of hotkey-only mode.
    pub fn on_key_combo(&mut self, combo: &KeyCombo, selection: &str) -> Option<String> {
        if !self.config.hotkeys_enabled {
            return None;
        }
        if !self.config.hotkey.matches(combo) {
            return None;
        }
        let trimmed = selection.trim();
        if trimmed.is_empty() {
            return None;
        }
        self.pending = None;
        Some(trimmed.to_string())
    }

    /// Returns the selection text once its debounce delay has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        match &self.pending {
            Some((_, deadline)) if now >= *deadline => {
                self.pending.take().map(|(text, _)| text)
            }
            _ => None,
        }
    }
}
