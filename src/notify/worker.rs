use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::{
    sync::{mpsc, oneshot, watch},
    task::{self, JoinError, JoinHandle, JoinSet},
};

use super::{MailError, Mailer, Notification, OutgoingEmail};
use crate::config::MailConfig;

#[derive(Debug, Clone)]
pub struct DeliveryPolicy {
    /// Hold-back for order mail so partners can batch their processing.
    pub order_delay: Duration,
    pub max_attempts: u32,
    /// First retry wait; doubled after every failed attempt.
    pub backoff: Duration,
    /// How long shutdown waits for in-flight deliveries.
    pub shutdown_grace: Duration,
}

impl DeliveryPolicy {
    pub fn from_config(config: &MailConfig) -> Self {
        Self {
            order_delay: config.order_delay,
            max_attempts: config.max_attempts,
            backoff: Duration::from_secs(30),
            shutdown_grace: config.shutdown_grace,
        }
    }

    pub fn delay_for(&self, notification: &Notification) -> Duration {
        match notification {
            Notification::OrderPlaced { .. } => self.order_delay,
            _ => Duration::ZERO,
        }
    }
}

/// Handle to the running mail worker.
#[derive(Debug)]
pub struct MailWorker {
    handle: JoinHandle<()>,
    stop: oneshot::Sender<()>,
}

impl MailWorker {
    /// Stop consuming, send held-back mail right away and wait for pending
    /// deliveries up to the grace period. Mail still undelivered after that
    /// is logged and dropped.
    pub async fn shutdown(self) {
        if self.stop.send(()).is_err() {
            tracing::debug!("mail worker already stopped");
        }
        if let Err(err) = self.handle.await {
            tracing::error!(error = %err, "mail worker panicked");
        }
    }
}

/// In-flight deliveries, keyed by task so unfinished ones can be reported.
#[derive(Default)]
struct Pending {
    tasks: JoinSet<()>,
    queued: HashMap<task::Id, Notification>,
}

impl Pending {
    fn spawn(
        &mut self,
        notification: Notification,
        mailer: &Arc<dyn Mailer>,
        policy: &DeliveryPolicy,
        hurry: &watch::Receiver<bool>,
    ) {
        let handle = self.tasks.spawn(send_one(
            notification.clone(),
            Arc::clone(mailer),
            policy.clone(),
            hurry.clone(),
        ));
        self.queued.insert(handle.id(), notification);
    }

    fn finished(&mut self, joined: Result<(task::Id, ()), JoinError>) {
        let id = match joined {
            Ok((id, ())) => id,
            Err(err) => {
                tracing::error!(error = %err, "mail task failed");
                err.id()
            }
        };
        self.queued.remove(&id);
    }
}

/// Consume the queue until every [`super::Notifier`] is dropped or
/// [`MailWorker::shutdown`] is called. Each mail is delivered on its own task
/// so a delayed or retried mail does not hold up the rest.
pub fn spawn_mail_worker(
    rx: mpsc::UnboundedReceiver<Notification>,
    mailer: Arc<dyn Mailer>,
    policy: DeliveryPolicy,
) -> MailWorker {
    let (stop, stop_rx) = oneshot::channel();
    let handle = tokio::spawn(run(rx, mailer, policy, stop_rx));
    MailWorker { handle, stop }
}

async fn run(
    mut rx: mpsc::UnboundedReceiver<Notification>,
    mailer: Arc<dyn Mailer>,
    policy: DeliveryPolicy,
    mut stop: oneshot::Receiver<()>,
) {
    let (hurry, hurry_rx) = watch::channel(false);
    let mut pending = Pending::default();
    // Dropping the handle without calling shutdown leaves the worker running.
    let mut detached = false;

    loop {
        tokio::select! {
            received = rx.recv() => match received {
                Some(notification) => pending.spawn(notification, &mailer, &policy, &hurry_rx),
                None => break,
            },
            stopped = &mut stop, if !detached => match stopped {
                Ok(()) => break,
                Err(_) => detached = true,
            },
            Some(joined) = pending.tasks.join_next_with_id() => pending.finished(joined),
        }
    }

    rx.close();
    hurry.send_replace(true);
    while let Ok(notification) = rx.try_recv() {
        pending.spawn(notification, &mailer, &policy, &hurry_rx);
    }
    if !pending.queued.is_empty() {
        tracing::info!(pending = pending.queued.len(), "flushing pending mail");
    }

    let deadline = tokio::time::Instant::now() + policy.shutdown_grace;
    loop {
        match tokio::time::timeout_at(deadline, pending.tasks.join_next_with_id()).await {
            Ok(Some(joined)) => pending.finished(joined),
            Ok(None) => break,
            Err(_) => {
                for notification in pending.queued.values() {
                    tracing::warn!(
                        kind = notification.kind(),
                        to = notification.recipient(),
                        "mail not delivered before shutdown, dropped"
                    );
                }
                pending.tasks.abort_all();
                break;
            }
        }
    }
    tracing::info!("mail worker stopped");
}

async fn send_one(
    notification: Notification,
    mailer: Arc<dyn Mailer>,
    policy: DeliveryPolicy,
    mut hurry: watch::Receiver<bool>,
) {
    let delay = policy.delay_for(&notification);
    if !delay.is_zero() {
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = hurry.changed() => {
                tracing::debug!(kind = notification.kind(), "worker stopping, sending held-back mail now");
            }
        }
    }
    let email = notification.render();
    if let Err(err) = deliver(mailer.as_ref(), &email, &policy).await {
        tracing::error!(
            kind = notification.kind(),
            to = %email.to,
            error = %err,
            "mail delivery failed"
        );
    }
}

/// Send with retries. Returns the number of attempts used.
pub async fn deliver(
    mailer: &dyn Mailer,
    email: &OutgoingEmail,
    policy: &DeliveryPolicy,
) -> Result<u32, MailError> {
    let mut wait = policy.backoff;
    let mut attempt = 1;
    loop {
        match mailer.send(email).await {
            Ok(()) => {
                tracing::debug!(to = %email.to, attempt, "mail delivered");
                return Ok(attempt);
            }
            Err(err) if attempt < policy.max_attempts => {
                tracing::warn!(to = %email.to, attempt, error = %err, "mail delivery failed, retrying");
                tokio::time::sleep(wait).await;
                wait *= 2;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    struct FlakyMailer {
        failures_left: Mutex<u32>,
        sent: Mutex<Vec<OutgoingEmail>>,
    }

    impl FlakyMailer {
        fn new(failures: u32) -> Self {
            Self {
                failures_left: Mutex::new(failures),
                sent: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Mailer for FlakyMailer {
        async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
            let mut left = self.failures_left.lock().unwrap();
            if *left > 0 {
                *left -= 1;
                return Err(MailError::Delivery("connection refused".into()));
            }
            self.sent.lock().unwrap().push(email.clone());
            Ok(())
        }
    }

    fn policy(max_attempts: u32) -> DeliveryPolicy {
        DeliveryPolicy {
            order_delay: Duration::ZERO,
            max_attempts,
            backoff: Duration::from_millis(1),
            shutdown_grace: Duration::from_secs(5),
        }
    }

    fn email() -> OutgoingEmail {
        OutgoingEmail {
            to: "buyer@example.com".into(),
            subject: "s".into(),
            body: "b".into(),
        }
    }

    #[tokio::test]
    async fn retries_until_delivered() {
        let mailer = FlakyMailer::new(2);
        let attempts = deliver(&mailer, &email(), &policy(3)).await.unwrap();
        assert_eq!(attempts, 3);
        assert_eq!(mailer.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let mailer = FlakyMailer::new(5);
        let result = deliver(&mailer, &email(), &policy(2)).await;
        assert!(matches!(result, Err(MailError::Delivery(_))));
        assert!(mailer.sent.lock().unwrap().is_empty());
        assert_eq!(*mailer.failures_left.lock().unwrap(), 3);
    }

    fn order_mail() -> Notification {
        Notification::OrderPlaced {
            email: "buyer@example.com".into(),
            order_id: 7,
        }
    }

    #[tokio::test]
    async fn worker_delivers_queued_notifications() {
        let mailer = Arc::new(FlakyMailer::new(0));
        let (notifier, rx) = crate::notify::Notifier::channel();
        let worker = spawn_mail_worker(rx, mailer.clone(), policy(1));

        notifier.notify(Notification::ConfirmEmail {
            email: "new@example.com".into(),
            token: "abc".into(),
        });
        drop(notifier);
        worker.shutdown().await;

        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "new@example.com");
    }

    #[tokio::test]
    async fn shutdown_sends_held_back_order_mail() {
        let mailer = Arc::new(FlakyMailer::new(0));
        let (notifier, rx) = crate::notify::Notifier::channel();
        let worker = spawn_mail_worker(
            rx,
            mailer.clone(),
            DeliveryPolicy {
                order_delay: Duration::from_secs(3600),
                ..policy(1)
            },
        );

        notifier.notify(order_mail());
        tokio::task::yield_now().await;
        assert!(mailer.sent.lock().unwrap().is_empty());

        // the producer side is still alive, as it is in AppState during shutdown
        worker.shutdown().await;
        let sent = mailer.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].body.contains("#7"));
    }

    #[tokio::test]
    async fn closed_queue_flushes_held_back_mail() {
        let mailer = Arc::new(FlakyMailer::new(0));
        let (notifier, rx) = crate::notify::Notifier::channel();
        let worker = spawn_mail_worker(
            rx,
            mailer.clone(),
            DeliveryPolicy {
                order_delay: Duration::from_secs(3600),
                ..policy(1)
            },
        );

        notifier.notify(order_mail());
        drop(notifier);
        tokio::time::timeout(Duration::from_secs(5), worker.handle)
            .await
            .expect("worker stops once the queue closes")
            .unwrap();
        assert_eq!(mailer.sent.lock().unwrap().len(), 1);
    }

    struct StuckMailer;

    #[async_trait]
    impl Mailer for StuckMailer {
        async fn send(&self, _email: &OutgoingEmail) -> Result<(), MailError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn shutdown_gives_up_after_grace_period() {
        let (notifier, rx) = crate::notify::Notifier::channel();
        let worker = spawn_mail_worker(
            rx,
            Arc::new(StuckMailer),
            DeliveryPolicy {
                shutdown_grace: Duration::from_millis(50),
                ..policy(1)
            },
        );
        notifier.notify(order_mail());

        tokio::time::timeout(Duration::from_secs(5), worker.shutdown())
            .await
            .expect("shutdown is bounded by the grace period");
    }

    #[test]
    fn only_order_mail_is_delayed() {
        let policy = DeliveryPolicy {
            order_delay: Duration::from_secs(300),
            max_attempts: 1,
            backoff: Duration::ZERO,
            shutdown_grace: Duration::ZERO,
        };
        let order = Notification::OrderPlaced {
            email: "x@y.z".into(),
            order_id: 1,
        };
        let confirm = Notification::ConfirmEmail {
            email: "x@y.z".into(),
            token: "t".into(),
        };
        assert_eq!(policy.delay_for(&order), Duration::from_secs(300));
        assert_eq!(policy.delay_for(&confirm), Duration::ZERO);
    }
}
