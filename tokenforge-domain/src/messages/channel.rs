use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::types::HostMessage;

/// Outbound queue towards the host. Sending never blocks; delivery and
/// acknowledgement belong to whoever drains the queue.
pub trait MessageChannel: Send + Sync {
    fn send(&self, message: HostMessage);

    fn notify_info(&self, message: &str) {
        self.send(HostMessage::info(message));
    }

    fn notify_error(&self, message: &str) {
        self.send(HostMessage::error(message));
    }
}

#[derive(Debug, Clone)]
pub struct QueuedMessageChannel {
    sender: mpsc::UnboundedSender<HostMessage>,
}

impl QueuedMessageChannel {
    /// A channel and the receiving end of its queue.
    pub fn unbounded() -> (Self, mpsc::UnboundedReceiver<HostMessage>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl MessageChannel for QueuedMessageChannel {
    fn send(&self, message: HostMessage) {
        let kind = message.kind();
        match self.sender.send(message) {
            Ok(()) => debug!("Queued '{}' message for host", kind),
            Err(_) => warn!("Host queue is closed; dropped '{}' message", kind),
        }
    }
}

/// Everything currently waiting in `receiver`.
pub fn drain(receiver: &mut mpsc::UnboundedReceiver<HostMessage>) -> Vec<HostMessage> {
    let mut messages = Vec::new();
    while let Ok(message) = receiver.try_recv() {
        messages.push(message);
    }
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::types::NotifyLevel;

    #[test]
    fn test_messages_arrive_in_order() {
        let (channel, mut receiver) = QueuedMessageChannel::unbounded();
        channel.notify_info("first");
        channel.notify_error("second");

        let messages = drain(&mut receiver);
        assert_eq!(messages.len(), 2);
        assert!(matches!(&messages[0], HostMessage::Notify { message, level: NotifyLevel::Info } if message == "first"));
        assert!(matches!(&messages[1], HostMessage::Notify { level: NotifyLevel::Error, .. }));
    }

    #[test]
    fn test_send_after_receiver_dropped_does_not_panic() {
        let (channel, receiver) = QueuedMessageChannel::unbounded();
        drop(receiver);
        channel.notify_info("nobody listens");
    }
}
