//! # Notification State
//!
//! The console's [`SyncEventEmitter`]: where channel state changes and user
//! notices end up.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SyncChannel ─── emit_state ───┐                                        │
//! │                                ▼                                        │
//! │                        ┌────────────────┐     tracing (info / warn)     │
//! │  Commands ─ emit_notice ► ConsoleEmitter ├──►                           │
//! │                        │                │     recent notices (ring)     │
//! │  InboundHandler ───────►  last state    │                               │
//! │     (shipper replies)  └────────────────┘                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::VecDeque;
use std::sync::RwLock;
use tracing::{info, warn};

use bakery_core::{Notice, NoticeLevel};
use bakery_sync::{ChannelState, SyncEventEmitter};

/// How many notices are kept for display.
const RECENT_NOTICES: usize = 50;

/// Logs everything and keeps the latest state and notices for display.
pub struct ConsoleEmitter {
    state: RwLock<ChannelState>,
    notices: RwLock<VecDeque<Notice>>,
}

impl ConsoleEmitter {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(ChannelState::Disconnected),
            notices: RwLock::new(VecDeque::with_capacity(RECENT_NOTICES)),
        }
    }

    /// Last state the channel reported.
    pub fn channel_state(&self) -> ChannelState {
        self.state
            .read()
            .map(|s| *s)
            .unwrap_or_default()
    }

    /// Notices, oldest first.
    pub fn recent_notices(&self) -> Vec<Notice> {
        self.notices
            .read()
            .map(|n| n.iter().cloned().collect())
            .unwrap_or_default()
    }
}

impl Default for ConsoleEmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncEventEmitter for ConsoleEmitter {
    fn emit_state(&self, state: ChannelState) {
        info!(%state, "Order channel state");
        if let Ok(mut s) = self.state.write() {
            *s = state;
        }
    }

    fn emit_notice(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Success => info!(notice = %notice.message, "✓"),
            NoticeLevel::Failure => warn!(notice = %notice.message, "✗"),
        }

        if let Ok(mut notices) = self.notices.write() {
            if notices.len() == RECENT_NOTICES {
                notices.pop_front();
            }
            notices.push_back(notice);
        }
    }
}
