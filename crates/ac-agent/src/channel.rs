//! Side channels — the agent's link to an external trainer or tool.
//!
//! The agent only depends on the [`SideChannel`] capability: outgoing
//! [`ChannelMessage`]s and incoming [`AgentCommand`]s.  Wire formats belong
//! to the implementations.  [`MemoryChannel`] keeps both directions in
//! memory and is what tests and the demo use.

use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;

use ac_core::{EpisodeEndReason, ProviderKind};
use ac_registry::DecisionMode;

use crate::{AgentResult, EpisodeSummary};

// ── Messages ──────────────────────────────────────────────────────────────────

/// Outgoing telemetry.
#[derive(Clone, Debug, PartialEq)]
pub enum ChannelMessage {
    /// Statistics that changed since the last report.
    Statistics {
        agent_id: String,
        step:     u64,
        values:   BTreeMap<String, f32>,
    },
    EpisodeEnded(EpisodeSummary),
}

/// Incoming control commands, applied at the start of the next fixed update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AgentCommand {
    EndEpisode(EpisodeEndReason),
    SetDecisionMode {
        mode:        DecisionMode,
        provider_id: Option<String>,
    },
    SetProviderActive {
        kind:   ProviderKind,
        name:   String,
        active: bool,
    },
}

// ── SideChannel ───────────────────────────────────────────────────────────────

pub trait SideChannel {
    fn name(&self) -> &str;

    fn send(&mut self, message: &ChannelMessage) -> AgentResult<()>;

    fn has_data(&self) -> bool;

    /// Next pending command, if any.
    fn receive(&mut self) -> Option<AgentCommand>;
}

// ── MemoryChannel ─────────────────────────────────────────────────────────────

#[derive(Default)]
struct ChannelState {
    sent:    Vec<ChannelMessage>,
    pending: VecDeque<AgentCommand>,
}

/// In-process channel.  Clones share the same buffers, so one clone can be
/// handed to the agent while another inspects traffic or injects commands.
#[derive(Clone)]
pub struct MemoryChannel {
    name:  String,
    state: Rc<RefCell<ChannelState>>,
}

impl MemoryChannel {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), state: Rc::default() }
    }

    /// Queue a command for the agent.
    pub fn push_command(&self, command: AgentCommand) {
        self.state.borrow_mut().pending.push_back(command);
    }

    /// Everything the agent has sent so far.
    pub fn sent(&self) -> Vec<ChannelMessage> {
        self.state.borrow().sent.clone()
    }

    /// Remove and return everything sent so far.
    pub fn drain_sent(&self) -> Vec<ChannelMessage> {
        std::mem::take(&mut self.state.borrow_mut().sent)
    }
}

impl SideChannel for MemoryChannel {
    fn name(&self) -> &str {
        &self.name
    }

    fn send(&mut self, message: &ChannelMessage) -> AgentResult<()> {
        self.state.borrow_mut().sent.push(message.clone());
        Ok(())
    }

    fn has_data(&self) -> bool {
        !self.state.borrow().pending.is_empty()
    }

    fn receive(&mut self) -> Option<AgentCommand> {
        self.state.borrow_mut().pending.pop_front()
    }
}
