//! Chat event sink port.
//!
//! Use cases report progress as typed [`ChatEvent`]s. The sink decides
//! where they go: a terminal printer, a channel feeding an SSE response,
//! or nowhere.

use deepseek_domain::ChatEvent;
use tokio::sync::mpsc;

/// Receiver of chat events. Emission must not block or fail.
pub trait ChatEventSink: Send + Sync {
    fn emit(&self, event: ChatEvent);
}

/// Discards every event.
pub struct NoChatEvents;

impl ChatEventSink for NoChatEvents {
    fn emit(&self, _event: ChatEvent) {}
}

/// Forwards events into an unbounded channel.
///
/// Events emitted after the receiver is dropped are silently discarded.
pub struct ChannelChatEvents {
    sender: mpsc::UnboundedSender<ChatEvent>,
}

impl ChannelChatEvents {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ChatEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl ChatEventSink for ChannelChatEvents {
    fn emit(&self, event: ChatEvent) {
        let _ = self.sender.send(event);
    }
}
