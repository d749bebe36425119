use std::time::{Duration, Instant};

use lingopane_core::TranslationResult;
use tracing::debug;

/// Result overlays dismiss quickly; error overlays stay up longer so the
/// message can actually be read.
pub const RESULT_DISMISS_AFTER: Duration = Duration::from_secs(3);
pub const ERROR_DISMISS_AFTER: Duration = Duration::from_secs(6);

pub const VIEWPORT_MARGIN: f64 = 20.0;

/// What the overlay panel displays. Styling is the host's concern; this is
/// the named-field contract only.
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayContent {
    Result(TranslationResult),
    Error { message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub content: OverlayContent,
}

impl Overlay {
    fn dismiss_after(&self) -> Duration {
        match self.content {
            OverlayContent::Result { .. } => RESULT_DISMISS_AFTER,
            OverlayContent::Error { .. } => ERROR_DISMISS_AFTER,
        }
    }

    /// Text placed on the clipboard by the copy action.
    pub fn copy_payload(&self) -> Option<&str> {
        match &self.content {
            OverlayContent::Result(result) => Some(&result.translated_text),
            OverlayContent::Error { .. } => None,
        }
    }
}

/// Owns the single overlay of a frame. Showing anything first removes
/// whatever is currently displayed; there is never more than one.
#[derive(Debug, Default)]
pub struct OverlayManager {
    current: Option<Overlay>,
    deadline: Option<Instant>,
    hovered: bool,
}

impl OverlayManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&Overlay> {
        self.current.as_ref()
    }

    pub fn is_visible(&self) -> bool {
        self.current.is_some()
    }

    pub fn show(&mut self, content: OverlayContent, now: Instant) {
        self.dismiss();
        let overlay = Overlay { content };
        self.deadline = Some(now + overlay.dismiss_after());
        self.hovered = false;
        self.current = Some(overlay);
    }

    /// Hovering keeps the overlay open indefinitely.
    pub fn pointer_enter(&mut self) {
        if self.current.is_some() {
            self.hovered = true;
            self.deadline = None;
        }
    }

    /// Leaving restarts a fresh full-duration timer.
    pub fn pointer_leave(&mut self, now: Instant) {
        if let Some(overlay) = &self.current {
            self.hovered = false;
            self.deadline = Some(now + overlay.dismiss_after());
        }
    }

    /// Click outside the panel, or on its close control.
    pub fn dismiss(&mut self) {
        if self.current.take().is_some() {
            debug!("Overlay dismissed");
        }
        self.deadline = None;
        self.hovered = false;
    }

    /// Drive the auto-dismiss timer. Returns true when the overlay was
    /// removed on this tick.
    pub fn poll(&mut self, now: Instant) -> bool {
        if self.hovered {
            return false;
        }
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.dismiss();
                true
            }
            _ => false,
        }
    }
}

/// Axis-aligned box in document coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// The visible region of the page: viewport dimensions plus scroll offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub scroll_x: f64,
    pub scroll_y: f64,
}

/// Shift (never resize) a box so it lies fully inside the visible viewport,
/// with a fixed margin. Left/top correction runs last so an oversized box
/// keeps its top-left corner visible.
pub fn fit_to_viewport(rect: &Rect, vp: &Viewport) -> Rect {
    let mut x = rect.x;
    let mut y = rect.y;

    if x + rect.width > vp.scroll_x + vp.width {
        x = vp.scroll_x + vp.width - rect.width - VIEWPORT_MARGIN;
    }
    if y + rect.height > vp.scroll_y + vp.height {
        y = vp.scroll_y + vp.height - rect.height - VIEWPORT_MARGIN;
    }
    if x < vp.scroll_x {
        x = vp.scroll_x + VIEWPORT_MARGIN;
    }
    if y < vp.scroll_y {
        y = vp.scroll_y + VIEWPORT_MARGIN;
    }

    Rect {
        x,
        y,
        width: rect.width,
        height: rect.height,
    }
}
