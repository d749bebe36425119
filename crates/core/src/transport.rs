use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::{Error, Result};
use crate::message::{ControlRequest, PageDirective, PageRequest};
use crate::types::{FrameId, TabId};

/// Addressing for a single delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameTarget {
    Frame(FrameId),
    /// Untargeted delivery to the tab, used when frame enumeration fails.
    Unspecified,
}

/// The seam between the dispatcher and whatever runtime hosts the page
/// agents. Real extension messaging, loopback channels, and test doubles
/// all implement this.
#[async_trait]
pub trait FrameTransport: Send + Sync {
    async fn send(&self, tab: TabId, target: FrameTarget, directive: PageDirective) -> Result<()>;

    /// Enumerate the sub-frames of a tab, top-level frame excluded.
    async fn frames(&self, tab: TabId) -> Result<Vec<FrameId>>;
}

/// In-process transport for a single tab with a single top-level frame.
/// Every delivery lands on one channel, regardless of target.
pub struct LoopbackTransport {
    tx: mpsc::Sender<PageDirective>,
}

impl LoopbackTransport {
    pub fn new(tx: mpsc::Sender<PageDirective>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl FrameTransport for LoopbackTransport {
    async fn send(&self, tab: TabId, _target: FrameTarget, directive: PageDirective) -> Result<()> {
        self.tx.send(directive).await.map_err(|_| {
            Error::Transport(format!("no receiving end for tab {}", tab.0))
        })
    }

    async fn frames(&self, _tab: TabId) -> Result<Vec<FrameId>> {
        Ok(vec![])
    }
}

/// Channels wiring the two agents and the preferences surface together.
pub struct AgentBus {
    pub request_tx: mpsc::Sender<(TabId, PageRequest)>,
    pub request_rx: mpsc::Receiver<(TabId, PageRequest)>,
    pub control_tx: mpsc::Sender<ControlRequest>,
    pub control_rx: mpsc::Receiver<ControlRequest>,
    pub directive_tx: mpsc::Sender<PageDirective>,
    pub directive_rx: mpsc::Receiver<PageDirective>,
}

impl AgentBus {
    pub fn new(buffer_size: usize) -> Self {
        let (request_tx, request_rx) = mpsc::channel(buffer_size);
        let (control_tx, control_rx) = mpsc::channel(buffer_size);
        let (directive_tx, directive_rx) = mpsc::channel(buffer_size);
        Self {
            request_tx,
            request_rx,
            control_tx,
            control_rx,
            directive_tx,
            directive_rx,
        }
    }
}
