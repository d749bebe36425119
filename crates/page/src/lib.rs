pub mod agent;
pub mod connection;
pub mod overlay;
pub mod selection;

pub use agent::{PageAgent, PageEvent, CONNECTION_LOST};
pub use connection::{backoff_delay, reconnect, ConnectionState};
pub use overlay::{fit_to_viewport, Overlay, OverlayContent, OverlayManager, Rect, Viewport};
pub use selection::{Hotkey, KeyCombo, SelectionConfig, SelectionMonitor};
