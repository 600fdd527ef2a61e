//! [`Command`] for changing a [`Payment`] status.

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    Date, DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        contact::PersonName,
        payment::{self, Reference},
        work_order, Payment, WorkOrder,
    },
    infra::{database, notifier::Notification, Database},
    Service,
};

use super::Command;

/// [`Command`] for changing a [`Payment`] status.
#[derive(Clone, Debug)]
pub struct UpdatePaymentStatus {
    /// ID of the [`Payment`] to update.
    pub id: payment::Id,

    /// New [`payment::Status`] of the [`Payment`].
    pub status: payment::Status,

    /// [`Date`] the [`Payment`] was paid on.
    ///
    /// Defaults to today for a [`payment::Status::Paid`] one, and is ignored
    /// for others.
    pub paid_date: Option<Date>,

    /// New [`Reference`] of the [`Payment`], if it changes.
    pub reference: Option<Reference>,

    /// Who updates the [`Payment`].
    ///
    /// The configured operator is used if [`None`].
    pub by: Option<PersonName>,
}

/// Result of the [`UpdatePaymentStatus`] [`Command`].
#[derive(Clone, Debug)]
pub struct Output {
    /// Updated [`Payment`].
    pub payment: Payment,

    /// [`WorkOrder`] the updated [`Payment`] belongs to.
    pub work_order: WorkOrder,
}

impl<Db> Command<UpdatePaymentStatus> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Payment, payment::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Payment>, payment::Id>>,
            Ok = Option<Payment>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<WorkOrder>, work_order::Id>>,
            Ok = Option<WorkOrder>,
            Err = Traced<database::Error>,
        > + Database<Insert<Payment>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: UpdatePaymentStatus,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdatePaymentStatus {
            id,
            status,
            paid_date,
            reference,
            by,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Lock(By::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut payment = tx
            .execute(Select(By::<Option<Payment>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PaymentNotExists(id))
            .map_err(tracerr::wrap!())?;
        let work_order = tx
            .execute(Select(By::<Option<WorkOrder>, _>::new(
                payment.work_order_id,
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::WorkOrderNotExists(payment.work_order_id))
            .map_err(tracerr::wrap!())?;

        payment.status = status;
        payment.paid_date = (status == payment::Status::Paid)
            .then(|| paid_date.unwrap_or_else(|| self.config().today()));
        if let Some(reference) = reference {
            payment.reference = Some(reference);
        }
        payment.updated_by =
            by.unwrap_or_else(|| self.config().operator.name.clone());
        payment.updated_at = DateTime::now().coerce();

        tx.execute(Insert(payment.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!(
            "`Payment` `{}` of `WorkOrder` `{}` is now `{status}`",
            payment.term.name,
            work_order.number,
        );
        self.notify(Notification::payment_updated(&work_order, &payment))
            .await;

        Ok(Output {
            payment,
            work_order,
        })
    }
}

/// Error of [`UpdatePaymentStatus`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Payment`] with the provided ID does not exist.
    #[display("`Payment(id: {_0})` does not exist")]
    PaymentNotExists(#[error(not(source))] payment::Id),

    /// [`WorkOrder`] of the [`Payment`] does not exist.
    #[display("`WorkOrder(id: {_0})` does not exist")]
    WorkOrderNotExists(#[error(not(source))] work_order::Id),
}

#[cfg(test)]
mod spec {
    use common::{Date, Handler as _};

    use crate::{
        command::mock::{self, percentage, Memory, Webhook},
        domain::{
            contact::PersonName,
            payment::{self, Reference},
        },
    };

    use super::{ExecutionError, UpdatePaymentStatus};

    fn command(id: payment::Id, status: payment::Status) -> UpdatePaymentStatus {
        UpdatePaymentStatus {
            id,
            status,
            paid_date: None,
            reference: None,
            by: None,
        }
    }

    #[tokio::test]
    async fn defaults_paid_date_to_today() {
        let (wo, payments) = mock::draft(100, &[percentage(30), percentage(70)]);
        let id = payments[0].id;
        let db = Memory::with_work_order(wo.clone(), payments);
        let webhook = Webhook::start().await;
        let svc = mock::service(db.clone(), Some(&webhook));

        let out = svc
            .execute(command(id, payment::Status::Paid))
            .await
            .unwrap();

        assert_eq!(out.payment.status, payment::Status::Paid);
        assert_eq!(out.payment.paid_date, Some(svc.config().today()));
        assert_eq!(out.payment.updated_by.to_string(), "Admin User");
        assert_eq!(out.work_order.id, wo.id);

        let stored = db
            .state()
            .payments
            .iter()
            .find(|p| p.id == id)
            .map(|p| p.status);
        assert_eq!(stored, Some(payment::Status::Paid));

        let received = webhook.received();
        assert_eq!(received.len(), 1);
        assert!(received[0].contains("PAID"));
        assert!(received[0].contains(&wo.number.to_string()));
    }

    #[tokio::test]
    async fn records_paid_date_reference_and_editor() {
        let (wo, payments) = mock::draft(100, &[percentage(100)]);
        let id = payments[0].id;
        let svc = mock::service(Memory::with_work_order(wo, payments), None);
        let paid_on = Date::from_ymd(2026, 2, 3).unwrap();

        let out = svc
            .execute(UpdatePaymentStatus {
                paid_date: Some(paid_on),
                reference: Reference::new("TRF-0042"),
                by: PersonName::new("Finance Team"),
                ..command(id, payment::Status::Paid)
            })
            .await
            .unwrap();

        assert_eq!(out.payment.paid_date, Some(paid_on));
        assert_eq!(
            out.payment.reference.map(|r| r.to_string()).as_deref(),
            Some("TRF-0042"),
        );
        assert_eq!(out.payment.updated_by.to_string(), "Finance Team");
    }

    #[tokio::test]
    async fn clears_paid_date_when_no_longer_paid() {
        let (wo, payments) = mock::draft(100, &[percentage(100)]);
        let id = payments[0].id;
        let svc = mock::service(Memory::with_work_order(wo, payments), None);

        _ = svc
            .execute(command(id, payment::Status::Paid))
            .await
            .unwrap();
        let out = svc
            .execute(command(id, payment::Status::Pending))
            .await
            .unwrap();

        assert_eq!(out.payment.status, payment::Status::Pending);
        assert_eq!(out.payment.paid_date, None);
    }

    #[tokio::test]
    async fn reports_missing_payment() {
        let svc = mock::service(Memory::default(), None);
        let id = payment::Id::new();

        let err = svc
            .execute(command(id, payment::Status::Paid))
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::PaymentNotExists(missing) if *missing == id,
        ));
    }
}
