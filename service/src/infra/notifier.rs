//! Chat-ops [`Notifier`] posting to a Slack-compatible incoming webhook.

use std::time::Duration;

use common::Handler;
use derive_more::{Display, Error as StdError, From};
pub use reqwest::Url;
use tracerr::Traced;
use tracing as log;

use crate::domain::{Payment, WorkOrder};

/// Notifier delivering [`Notification`]s to an incoming webhook.
///
/// Without a webhook configured, [`Notification`]s are dropped with a
/// warning.
#[derive(Clone, Debug)]
pub struct Notifier {
    /// HTTP client to deliver [`Notification`]s with.
    client: reqwest::Client,

    /// Webhook URL to deliver [`Notification`]s to.
    webhook: Option<Url>,
}

impl Notifier {
    /// Timeout of a single [`Notification`] delivery.
    const TIMEOUT: Duration = Duration::from_secs(10);

    /// Creates a new [`Notifier`] for the provided webhook URL.
    #[must_use]
    pub fn new(webhook: Option<Url>) -> Self {
        Self {
            client: reqwest::Client::new(),
            webhook,
        }
    }

    /// Creates a new [`Notifier`] which never delivers anything.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(None)
    }

    /// Indicates whether this [`Notifier`] has a webhook to deliver to.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.webhook.is_some()
    }

    /// Delivers the provided [`Notification`], logging any failure.
    pub async fn send(&self, notification: Notification) {
        if !self.is_enabled() {
            log::warn!(
                "chat-ops webhook is not configured, skipping notification: \
                 {notification}",
            );
            return;
        }

        _ = self.execute(notification).await.map_err(|e| {
            log::error!("failed to deliver chat-ops notification: {e}");
        });
    }
}

impl Handler<Notification> for Notifier {
    type Ok = ();
    type Err = Traced<Error>;

    async fn execute(
        &self,
        notification: Notification,
    ) -> Result<Self::Ok, Self::Err> {
        let Some(url) = self.webhook.clone() else {
            return Err(tracerr::new!(Error::NotConfigured));
        };

        self.client
            .post(url)
            .timeout(Self::TIMEOUT)
            .json(&serde_json::json!({ "text": notification.to_string() }))
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(tracerr::from_and_wrap!(=> Error))
            .map(drop)
    }
}

/// One-line chat-ops message.
#[derive(Clone, Debug, Display, Eq, PartialEq)]
#[display("{_0}")]
pub struct Notification(String);

impl Notification {
    /// Creates a [`Notification`] about the provided [`WorkOrder`] being
    /// published.
    #[must_use]
    pub fn published(wo: &WorkOrder) -> Self {
        Self(format!(
            "Work order {} published for {} - {} ({})",
            wo.number,
            wo.vendor.name,
            wo.project.name,
            wo.contract_value.formatted(),
        ))
    }

    /// Creates a [`Notification`] about a status change of the provided
    /// [`Payment`].
    #[must_use]
    pub fn payment_updated(wo: &WorkOrder, payment: &Payment) -> Self {
        let amount = common::Money {
            amount: payment.term.amount,
            currency: wo.contract_value.currency,
        };
        Self(format!(
            "Payment \"{}\" of work order {} ({}) is {} by {}",
            payment.term.name,
            wo.number,
            amount.formatted(),
            payment.status,
            payment.updated_by,
        ))
    }
}

/// [`Notifier`] error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    /// No webhook URL configured.
    #[display("No webhook URL configured")]
    NotConfigured,

    /// Webhook request failed.
    #[display("Webhook request failed: {_0}")]
    #[from]
    Request(reqwest::Error),
}
