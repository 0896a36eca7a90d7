//! Outgoing notifications.
//!
//! Services push [`Notification`] values through a [`Notifier`] once their
//! state change is committed; the mail worker consumes them on its own tasks,
//! so delivery never blocks or fails the request that produced them.

mod mailer;
mod worker;

use tokio::sync::mpsc;

pub use mailer::{LogMailer, MailError, Mailer, OutgoingEmail, SmtpMailer, mailer_from_config};
pub use worker::{DeliveryPolicy, MailWorker, deliver, spawn_mail_worker};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    ConfirmEmail { email: String, token: String },
    PasswordReset { email: String, token: String },
    OrderPlaced { email: String, order_id: i32 },
}

impl Notification {
    pub fn kind(&self) -> &'static str {
        match self {
            Notification::ConfirmEmail { .. } => "confirm_email",
            Notification::PasswordReset { .. } => "password_reset",
            Notification::OrderPlaced { .. } => "order_placed",
        }
    }

    pub fn recipient(&self) -> &str {
        match self {
            Notification::ConfirmEmail { email, .. }
            | Notification::PasswordReset { email, .. }
            | Notification::OrderPlaced { email, .. } => email,
        }
    }

    pub fn render(&self) -> OutgoingEmail {
        let (subject, body) = match self {
            Notification::ConfirmEmail { token, .. } => (
                "Confirm your email address".to_string(),
                format!("Your confirmation token: {token}"),
            ),
            Notification::PasswordReset { token, .. } => (
                "Password reset".to_string(),
                format!("Token {token}"),
            ),
            Notification::OrderPlaced { order_id, .. } => (
                "Order status update".to_string(),
                format!("Order #{order_id} has been placed"),
            ),
        };
        OutgoingEmail {
            to: self.recipient().to_string(),
            subject,
            body,
        }
    }
}

/// Producer side of the notification queue.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl Notifier {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Enqueue without waiting. A closed queue only loses the mail.
    pub fn notify(&self, notification: Notification) {
        let kind = notification.kind();
        match self.tx.send(notification) {
            Ok(()) => tracing::debug!(kind, "notification enqueued"),
            Err(_) => tracing::warn!(kind, "notification queue closed, mail dropped"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_placed_mail_names_the_order() {
        let email = Notification::OrderPlaced {
            email: "buyer@example.com".into(),
            order_id: 42,
        }
        .render();
        assert_eq!(email.to, "buyer@example.com");
        assert_eq!(email.subject, "Order status update");
        assert!(email.body.contains("#42"));
    }

    #[test]
    fn notify_after_receiver_dropped_does_not_panic() {
        let (notifier, rx) = Notifier::channel();
        drop(rx);
        notifier.notify(Notification::ConfirmEmail {
            email: "a@b.c".into(),
            token: "t".into(),
        });
    }
}
