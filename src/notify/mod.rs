// src/notify/mod.rs
pub mod telegram;

use anyhow::Result;
use metrics::counter;

/// Chat delivery boundary. The bot platform behind it is a black box:
/// all we ask of it is "send this text to that recipient".
#[async_trait::async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<()>;
    fn name(&self) -> &'static str;
}

/// Outcome of one fan-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub failed: usize,
}

impl BroadcastReport {
    pub fn any_delivered(&self) -> bool {
        self.delivered > 0
    }
}

/// Fans one message out to every subscriber. Per-recipient failures are
/// logged and counted; the remaining recipients still get the message.
pub struct Broadcaster<T: ChatTransport> {
    transport: T,
}

impl<T: ChatTransport> Broadcaster<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn broadcast(&self, recipients: &[i64], text: &str) -> BroadcastReport {
        let mut report = BroadcastReport::default();
        for &chat_id in recipients {
            match self.transport.send_text(chat_id, text).await {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    report.failed += 1;
                    counter!("notify_delivery_failures_total").increment(1);
                    tracing::warn!(
                        chat_id,
                        transport = self.transport.name(),
                        error = %e,
                        "delivery failed"
                    );
                }
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct FlakyTransport {
        fail_for: i64,
        sent: Mutex<Vec<i64>>,
    }

    #[async_trait::async_trait]
    impl ChatTransport for FlakyTransport {
        async fn send_text(&self, chat_id: i64, _text: &str) -> Result<()> {
            if chat_id == self.fail_for {
                anyhow::bail!("boom");
            }
            self.sent.lock().unwrap().push(chat_id);
            Ok(())
        }
        fn name(&self) -> &'static str {
            "flaky"
        }
    }

    #[tokio::test]
    async fn one_failure_does_not_stop_fanout() {
        let b = Broadcaster::new(FlakyTransport {
            fail_for: 2,
            sent: Mutex::new(vec![]),
        });
        let report = b.broadcast(&[1, 2, 3], "hi").await;
        assert_eq!(report, BroadcastReport { delivered: 2, failed: 1 });
        assert!(report.any_delivered());
        assert_eq!(*b.transport().sent.lock().unwrap(), vec![1, 3]);
    }
}
