//! Business logic of the work-order (SPK) backend: document number
//! allocation, payment-term reconciliation and the work-order workflow.
//!
//! List of available Cargo features:
#![doc = document_features::document_features!()]
#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::all,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![forbid(non_ascii_idents)]
#![warn(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    clippy::pedantic,
    clippy::wildcard_enum_match_arm,
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_crate_dependencies,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

pub mod command;
pub mod domain;
pub mod infra;
pub mod query;
pub mod read;
pub mod task;

use std::num::NonZeroUsize;

use common::{
    operations::{By, Start},
    Date,
};
use derive_more::{Debug, Error};
use time::UtcOffset;

#[cfg(doc)]
use infra::Database;

use self::{
    domain::work_order,
    infra::{notifier::Notification, Notifier},
};

pub use self::{command::Command, query::Query, task::Task};

/// [`Service`] configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// [`work_order::Prefix`] of the allocated [`work_order::Number`]s.
    pub number_prefix: work_order::Prefix,

    /// [`UtcOffset`] the business day is observed at.
    ///
    /// Determines the date segment of the allocated [`work_order::Number`]s
    /// and the default paid dates.
    pub utc_offset: UtcOffset,

    /// Number of attempts to allocate a free [`work_order::Number`] before
    /// giving up.
    pub number_allocation_attempts: NonZeroUsize,

    /// Person in charge of the [`WorkOrder`]s created without an explicit
    /// one.
    ///
    /// [`WorkOrder`]: domain::WorkOrder
    pub operator: work_order::Pic,

    /// Base URL of the vendor portal, which an access token is appended to.
    pub vendor_portal_url: String,

    /// [`task::MarkOverduePayments`] configuration.
    pub mark_overdue_payments: task::mark_overdue_payments::Config,
}

impl Config {
    /// Returns the current business [`Date`].
    #[must_use]
    pub fn today(&self) -> Date {
        Date::today(self.utc_offset)
    }

    /// Returns the vendor portal link for the provided access token.
    #[must_use]
    pub fn vendor_portal_link(
        &self,
        token: &domain::vendor::AccessToken,
    ) -> String {
        format!(
            "{}?token={token}",
            self.vendor_portal_url.trim_end_matches('/'),
        )
    }
}

/// Domain service.
#[derive(Clone, Debug)]
pub struct Service<Db> {
    /// Configuration of this [`Service`].
    config: Config,

    /// [`Database`] of this [`Service`].
    database: Db,

    /// [`Notifier`] of this [`Service`].
    notifier: Notifier,
}

impl<Db> Service<Db> {
    /// Creates a new [`Service`] with the provided parameters.
    ///
    /// The returned [`task::Background`] must be polled for the background
    /// [`Task`]s to run.
    pub fn new(
        config: Config,
        database: Db,
        notifier: Notifier,
    ) -> (Self, task::Background)
    where
        Self: Task<
                Start<
                    By<
                        task::MarkOverduePayments<Self>,
                        task::mark_overdue_payments::Config,
                    >,
                >,
                Ok = (),
                Err: Error,
            > + Clone
            + 'static,
    {
        let this = Service {
            config,
            database,
            notifier,
        };

        let mut bg = task::Background::default();
        let svc = this.clone();
        bg.spawn("MarkOverduePayments", async move {
            svc.execute(Start(By::new(svc.config().mark_overdue_payments)))
                .await
        });

        (this, bg)
    }

    /// Returns [`Config`] of this [`Service`].
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns [`Database`] of this [`Service`].
    #[must_use]
    pub fn database(&self) -> &Db {
        &self.database
    }

    /// Delivers the provided [`Notification`].
    ///
    /// Delivery failures are logged and never propagated.
    async fn notify(&self, notification: Notification) {
        self.notifier.send(notification).await;
    }
}
