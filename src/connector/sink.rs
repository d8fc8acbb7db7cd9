use std::io::Write;

use tokio::sync::mpsc;

use crate::connector::types::CanonicalMessage;

/// Receives normalized messages in the order they were decoded.
pub trait DeliverySink: Send + Sync {
    fn deliver(&self, message: CanonicalMessage);
}

#[derive(Default)]
pub struct NoopDeliverySink;

impl DeliverySink for NoopDeliverySink {
    fn deliver(&self, _message: CanonicalMessage) {}
}

pub struct ChannelDeliverySink {
    tx: mpsc::UnboundedSender<CanonicalMessage>,
}

impl ChannelDeliverySink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<CanonicalMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl DeliverySink for ChannelDeliverySink {
    fn deliver(&self, message: CanonicalMessage) {
        if self.tx.send(message).is_err() {
            tracing::warn!(target: "connector", "delivery_receiver_dropped");
        }
    }
}

/// Writes one JSON document per line to stdout.
#[derive(Default)]
pub struct JsonLinesDeliverySink;

impl DeliverySink for JsonLinesDeliverySink {
    fn deliver(&self, message: CanonicalMessage) {
        let line = match serde_json::to_string(&message) {
            Ok(line) => line,
            Err(err) => {
                tracing::warn!(target: "connector", error = %err, "delivery_encode_failed");
                return;
            }
        };

        let mut stdout = std::io::stdout().lock();
        if let Err(err) = writeln!(stdout, "{}", line).and_then(|_| stdout.flush()) {
            tracing::warn!(target: "connector", error = %err, "delivery_write_failed");
        }
    }
}
