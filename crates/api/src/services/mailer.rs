//! Outgoing notifications
//!
//! The transport is created on first use. Sending never fails the request
//! that triggered it; errors are logged and dropped.

use async_trait::async_trait;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{OnceCell, RwLock};
use tracing::{info, warn};

const DEFAULT_OUTBOX_CAPACITY: usize = 200;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Notification {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, notification: Notification) -> anyhow::Result<()>;
}

/// Keeps the most recent messages in memory and logs each one
pub struct OutboxMailer {
    capacity: usize,
    outbox: RwLock<VecDeque<Notification>>,
}

impl OutboxMailer {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            outbox: RwLock::new(VecDeque::new()),
        }
    }

    pub async fn sent(&self) -> Vec<Notification> {
        self.outbox.read().await.iter().cloned().collect()
    }
}

impl Default for OutboxMailer {
    fn default() -> Self {
        Self::new(DEFAULT_OUTBOX_CAPACITY)
    }
}

#[async_trait]
impl Mailer for OutboxMailer {
    async fn send(&self, notification: Notification) -> anyhow::Result<()> {
        info!(to = %notification.to, subject = %notification.subject, "Notification queued");

        let mut outbox = self.outbox.write().await;
        if outbox.len() == self.capacity {
            outbox.pop_front();
        }
        outbox.push_back(notification);
        Ok(())
    }
}

type MailerFactory = Box<dyn Fn() -> Arc<dyn Mailer> + Send + Sync>;

/// Lazily initialized front for the configured mailer
pub struct Notifier {
    factory: MailerFactory,
    mailer: OnceCell<Arc<dyn Mailer>>,
}

impl Notifier {
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> Arc<dyn Mailer> + Send + Sync + 'static,
    {
        Self {
            factory: Box::new(factory),
            mailer: OnceCell::new(),
        }
    }

    /// Notifier backed by an already built mailer
    pub fn with_mailer(mailer: Arc<dyn Mailer>) -> Self {
        let fallback = mailer.clone();
        Self {
            factory: Box::new(move || fallback.clone()),
            mailer: OnceCell::from(mailer),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.mailer.initialized()
    }

    pub async fn notify(&self, notification: Notification) {
        let mailer = self
            .mailer
            .get_or_init(|| async {
                info!("Initializing mail transport");
                (self.factory)()
            })
            .await;

        let recipient = notification.to.clone();
        if let Err(e) = mailer.send(notification).await {
            warn!(to = %recipient, error = %e, "Failed to deliver notification");
        }
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(|| Arc::new(OutboxMailer::default()) as Arc<dyn Mailer>)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingMailer;

    #[async_trait]
    impl Mailer for FailingMailer {
        async fn send(&self, _notification: Notification) -> anyhow::Result<()> {
            anyhow::bail!("smtp unavailable")
        }
    }

    fn message(to: &str) -> Notification {
        Notification {
            to: to.to_string(),
            subject: "Welcome".to_string(),
            body: "Hello".to_string(),
        }
    }

    #[tokio::test]
    async fn test_lazy_initialization() {
        let notifier = Notifier::default();
        assert!(!notifier.is_initialized());
        notifier.notify(message("a@x.io")).await;
        assert!(notifier.is_initialized());
    }

    #[tokio::test]
    async fn test_outbox_is_bounded() {
        let outbox = Arc::new(OutboxMailer::new(2));
        let notifier = Notifier::with_mailer(outbox.clone());
        for to in ["a@x.io", "b@x.io", "c@x.io"] {
            notifier.notify(message(to)).await;
        }
        let sent: Vec<_> = outbox.sent().await.into_iter().map(|n| n.to).collect();
        assert_eq!(sent, vec!["b@x.io", "c@x.io"]);
    }

    #[tokio::test]
    async fn test_failures_are_swallowed() {
        let notifier = Notifier::with_mailer(Arc::new(FailingMailer));
        notifier.notify(message("a@x.io")).await;
    }
}
