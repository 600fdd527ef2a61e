//! [`MarkOverduePayments`] [`Task`].

use std::{convert::Infallible, error::Error, time::Duration};

use common::operations::{By, Perform, Start, Update};
use smart_default::SmartDefault;
use tokio::time::interval;
use tracerr::Traced;
use tracing as log;

#[cfg(doc)]
use crate::domain::{payment::Status, Payment};
use crate::{
    infra::{database, Database},
    read, Service,
};

use super::Task;

/// Configuration for [`MarkOverduePayments`] [`Task`].
#[derive(Clone, Copy, Debug, SmartDefault)]
pub struct Config {
    /// Interval between the checks.
    #[default(Duration::from_secs(60 * 60))]
    pub interval: Duration,
}

/// [`Task`] moving [`Status::Pending`] [`Payment`]s past their due date to
/// [`Status::Overdue`].
#[derive(Clone, Copy, Debug)]
pub struct MarkOverduePayments<S> {
    /// [`Config`] of this [`Task`].
    config: Config,

    /// [`Service`] instance.
    service: S,
}

impl<Db> Task<Start<By<MarkOverduePayments<Self>, Config>>> for Service<Db>
where
    MarkOverduePayments<Service<Db>>: Task<
            Perform<()>,
            Ok = read::payment::Affected,
            Err: Error,
        > + 'static,
    Self: Clone,
{
    type Ok = ();
    type Err = Infallible;

    async fn execute(
        &self,
        Start(by): Start<By<MarkOverduePayments<Self>, Config>>,
    ) -> Result<Self::Ok, Self::Err> {
        let task = MarkOverduePayments {
            config: by.into_inner(),
            service: self.clone(),
        };

        let mut interval = interval(task.config.interval);
        loop {
            let _ = interval.tick().await;
            match task.execute(Perform(())).await {
                Ok(affected) => {
                    let affected = u64::from(affected);
                    if affected > 0 {
                        log::info!("marked {affected} payment(s) as overdue");
                    }
                }
                Err(e) => {
                    log::error!("`task::MarkOverduePayments` failed: {e}");
                }
            }
        }
    }
}

impl<Db> Task<Perform<()>> for MarkOverduePayments<Service<Db>>
where
    Db: Database<
        Update<By<read::payment::Affected, read::payment::DueBefore>>,
        Ok = read::payment::Affected,
        Err = Traced<database::Error>,
    >,
{
    type Ok = read::payment::Affected;
    type Err = ExecutionError;

    async fn execute(&self, _: Perform<()>) -> Result<Self::Ok, Self::Err> {
        let today = self.service.config().today();
        self.service
            .database()
            .execute(Update(By::new(read::payment::DueBefore(today))))
            .await
            .map_err(tracerr::wrap!())
    }
}

/// Error of [`MarkOverduePayments`] execution.
pub type ExecutionError = Traced<database::Error>;
