//! [`Command`] for publishing a [`WorkOrder`].

use common::operations::{
    By, Commit, Insert, Lock, Select, Transact, Transacted,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        contact::Email, vendor::AccessToken, work_order, Payment, Vendor,
        WorkOrder,
    },
    infra::{database, notifier::Notification, Database},
    Service,
};

use super::{issue_vendor_token, Command, IssueVendorToken};

/// [`Command`] for publishing a [`WorkOrder`], making it visible in the
/// vendor portal.
///
/// Publishing an already published [`WorkOrder`] changes nothing.
#[derive(Clone, Copy, Debug)]
pub struct PublishWorkOrder {
    /// ID of the [`WorkOrder`] to publish.
    pub id: work_order::Id,
}

/// Result of the [`PublishWorkOrder`] [`Command`].
#[derive(Clone, Debug)]
pub struct Output {
    /// Published [`WorkOrder`].
    pub work_order: WorkOrder,

    /// [`Payment`]s of the published [`WorkOrder`], in their term order.
    pub payments: Vec<Payment>,

    /// [`AccessToken`] of the [`Vendor`], if it has an [`Email`].
    pub access_token: Option<AccessToken>,
}

impl<Db> Command<PublishWorkOrder> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<WorkOrder, work_order::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<WorkOrder>, work_order::Id>>,
            Ok = Option<WorkOrder>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Payment>, work_order::Id>>,
            Ok = Vec<Payment>,
            Err = Traced<database::Error>,
        > + Database<Insert<WorkOrder>, Err = Traced<database::Error>>
        + Database<Lock<By<Vendor, Email>>, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<Vendor>, Email>>,
            Ok = Option<Vendor>,
            Err = Traced<database::Error>,
        > + Database<Insert<Vendor>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: PublishWorkOrder,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let PublishWorkOrder { id } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent edits and publishing.
        tx.execute(Lock(By::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut work_order = tx
            .execute(Select(By::<Option<WorkOrder>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::WorkOrderNotExists(id))
            .map_err(tracerr::wrap!())?;

        let published = work_order.publish();
        if published {
            tx.execute(Insert(work_order.clone()))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
        }

        let access_token = if let Some(email) = work_order.vendor.email.clone()
        {
            let token = issue_vendor_token::ensure_access_token(
                &tx,
                IssueVendorToken {
                    name: work_order.vendor.name.clone(),
                    email,
                    phone: work_order.vendor.phone.clone(),
                },
            )
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
            Some(token)
        } else {
            None
        };

        let payments = tx
            .execute(Select(By::<Vec<Payment>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        if published {
            log::info!("published `WorkOrder` `{}`", work_order.number);
            self.notify(Notification::published(&work_order)).await;
        }

        Ok(Output {
            work_order,
            payments,
            access_token,
        })
    }
}

/// Error of [`PublishWorkOrder`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`WorkOrder`] with the provided ID does not exist.
    #[display("`WorkOrder(id: {_0})` does not exist")]
    WorkOrderNotExists(#[error(not(source))] work_order::Id),
}

#[cfg(test)]
mod spec {
    use common::Handler as _;

    use crate::{
        command::mock::{self, percentage, Memory, Webhook},
        domain::work_order,
    };

    use super::{ExecutionError, PublishWorkOrder};

    #[tokio::test]
    async fn publishes_once() {
        let (wo, payments) = mock::draft(100, &[percentage(40), percentage(60)]);
        let db = Memory::with_work_order(wo.clone(), payments);
        let webhook = Webhook::start().await;
        let svc = mock::service(db.clone(), Some(&webhook));

        let first = svc.execute(PublishWorkOrder { id: wo.id }).await.unwrap();
        let second =
            svc.execute(PublishWorkOrder { id: wo.id }).await.unwrap();

        assert_eq!(first.work_order.status, work_order::Status::Published);
        assert!(first.work_order.published_at.is_some());
        assert_eq!(second.work_order.status, work_order::Status::Published);
        assert_eq!(
            first.work_order.published_at,
            second.work_order.published_at,
        );
        assert_eq!(first.payments.len(), 2);
        assert_eq!(db.state().work_order_writes, 1);

        let received = webhook.received();
        assert_eq!(received.len(), 1);
        assert!(received[0].contains(&wo.number.to_string()));
        assert!(received[0].contains("published"));
    }

    #[tokio::test]
    async fn reuses_vendor_token() {
        let (wo, payments) = mock::draft(100, &[percentage(100)]);
        let db = Memory::with_work_order(wo.clone(), payments);
        let svc = mock::service(db.clone(), None);

        let first = svc.execute(PublishWorkOrder { id: wo.id }).await.unwrap();
        let second =
            svc.execute(PublishWorkOrder { id: wo.id }).await.unwrap();

        assert!(first.access_token.is_some());
        assert_eq!(first.access_token, second.access_token);
        assert_eq!(db.state().vendors.len(), 1);
    }

    #[tokio::test]
    async fn reports_missing_work_order() {
        let svc = mock::service(Memory::default(), None);
        let id = work_order::Id::new();

        let err = svc.execute(PublishWorkOrder { id }).await.unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::WorkOrderNotExists(missing) if *missing == id,
        ));
    }
}
