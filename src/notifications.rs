use std::{
    io::Write,
    sync::{Arc, Mutex},
    thread::{self, JoinHandle},
    time::Duration,
};

use colored::Colorize;
use thiserror::Error;

use crate::models::contract::Contract;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("No recipients for notification '{0}'")]
    NoRecipients(String),

    #[error("Notification delivery failed: {0}")]
    DeliveryFailed(String),
}

/// Informational message sent after a lifecycle transition.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub recipients: Vec<String>,
    pub subject: String,
    pub body: String,
}

impl Notification {
    pub fn sent_for_signing(contract: &Contract, owner_email: &str) -> Self {
        let expires = contract
            .expires_at
            .map(|at| at.strftime("%B %-d, %Y").to_string())
            .unwrap_or_else(|| "N/A".to_string());

        Self {
            recipients: recipients(contract, owner_email),
            subject: format!("Contract {} is ready for signature", contract.contract_id),
            body: format!(
                "The contract for {} has been sent for signing.\nSign here: {}\nThe signing link expires on {}.",
                contract.draft.project.name, contract.signable_url, expires
            ),
        }
    }

    pub fn signed(contract: &Contract, owner_email: &str) -> Self {
        Self {
            recipients: recipients(contract, owner_email),
            subject: format!("Contract {} has been signed", contract.contract_id),
            body: format!(
                "The contract for {} has been signed by {}.",
                contract.draft.project.name, contract.draft.client.name
            ),
        }
    }
}

/// Client email (when present) and the owner, without duplicates.
fn recipients(contract: &Contract, owner_email: &str) -> Vec<String> {
    let mut recipients = Vec::new();
    for email in [contract.draft.client.email.trim(), owner_email.trim()] {
        if !email.is_empty() && !recipients.iter().any(|r: &String| r.eq_ignore_ascii_case(email)) {
            recipients.push(email.to_string());
        }
    }
    recipients
}

pub trait Notifier {
    fn notify(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Prints notifications to the terminal.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        if notification.recipients.is_empty() {
            return Err(NotifyError::NoRecipients(notification.subject.clone()));
        }

        writeln!(
            std::io::stdout(),
            "{} {} {}",
            "✉".cyan(),
            notification.subject.bold(),
            format!("→ {}", notification.recipients.join(", ")).dimmed()
        )
        .map_err(|e| NotifyError::DeliveryFailed(e.to_string()))
    }
}

/// Sends notifications on background threads after a fixed delay.
///
/// Delivery never blocks the caller and failures are only logged. Call
/// [`Dispatcher::wait`] before the process exits so queued messages are
/// not dropped.
pub struct Dispatcher {
    notifier: Arc<dyn Notifier + Send + Sync>,
    delay: Duration,
    pending: Mutex<Vec<JoinHandle<()>>>,
}

impl Dispatcher {
    pub fn new(notifier: Arc<dyn Notifier + Send + Sync>, delay: Duration) -> Self {
        Self {
            notifier,
            delay,
            pending: Mutex::new(vec![]),
        }
    }

    pub fn dispatch(&self, notification: Notification) {
        let notifier = Arc::clone(&self.notifier);
        let delay = self.delay;

        let handle = thread::spawn(move || {
            if !delay.is_zero() {
                thread::sleep(delay);
            }
            match notifier.notify(&notification) {
                Ok(()) => tracing::debug!(subject = %notification.subject, "Notification sent"),
                Err(e) => {
                    tracing::warn!(error = %e, subject = %notification.subject, "Notification failed")
                }
            }
        });

        if let Ok(mut pending) = self.pending.lock() {
            pending.push(handle);
        }
    }

    /// Blocks until every dispatched notification has been attempted.
    pub fn wait(&self) {
        let handles = match self.pending.lock() {
            Ok(mut pending) => std::mem::take(&mut *pending),
            Err(_) => return,
        };
        for handle in handles {
            if handle.join().is_err() {
                tracing::error!("Notification thread panicked");
            }
        }
    }
}
