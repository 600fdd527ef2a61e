//! [`Command`] for editing a draft [`WorkOrder`].

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    Date, DateTime, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        payment::term,
        work_order::{self, Notes, Pic, Project, SignatureUrl, VendorDetails},
        Payment, WorkOrder,
    },
    infra::{database, Database},
    read::work_order::WithPayments,
    Service,
};

use super::Command;

/// [`Command`] for editing a [`work_order::Status::Draft`] [`WorkOrder`].
///
/// Its [`work_order::Number`] and payment terms stay intact. A changed
/// contract value re-resolves the stored terms against it.
#[derive(Clone, Debug)]
pub struct UpdateWorkOrder {
    /// ID of the [`WorkOrder`] to edit.
    pub id: work_order::Id,

    /// New [`VendorDetails`] of the [`WorkOrder`].
    pub vendor: VendorDetails,

    /// New [`Project`] of the [`WorkOrder`].
    pub project: Project,

    /// New contract value of the [`WorkOrder`].
    pub contract_value: Money,

    /// New start [`Date`] of the [`WorkOrder`].
    pub start_date: Date,

    /// New end [`Date`] of the [`WorkOrder`].
    pub end_date: Option<Date>,

    /// New [`Pic`] of the [`WorkOrder`], if it changes.
    pub pic: Option<Pic>,

    /// New [`Notes`] of the [`WorkOrder`].
    pub notes: Option<Notes>,

    /// New [`SignatureUrl`] of the [`WorkOrder`].
    pub signature_url: Option<SignatureUrl>,
}

impl<Db> Command<UpdateWorkOrder> for Service<Db>
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
        + Database<Insert<Payment>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = WithPayments;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: UpdateWorkOrder,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateWorkOrder {
            id,
            vendor,
            project,
            contract_value,
            start_date,
            end_date,
            pic,
            notes,
            signature_url,
        } = cmd;

        if contract_value.amount.is_sign_negative()
            && !contract_value.amount.is_zero()
        {
            return Err(tracerr::new!(E::NegativeContractValue(
                contract_value
            )));
        }
        if end_date.is_some_and(|end| end < start_date) {
            return Err(tracerr::new!(E::EndsBeforeStart));
        }

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
        if !work_order.is_draft() {
            return Err(tracerr::new!(E::AlreadyPublished(id)));
        }

        let mut payments = tx
            .execute(Select(By::<Vec<Payment>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let now = DateTime::now();
        if work_order.contract_value != contract_value {
            let drafts = payments
                .iter()
                .map(|p| term::Draft::from(p.term.clone()))
                .collect::<Vec<_>>();
            let terms = term::validate(contract_value.amount, &drafts)
                .map_err(tracerr::from_and_wrap!(=> E))?
                .into_terms();

            let editor = &self.config().operator.name;
            for (p, t) in payments.iter_mut().zip(terms) {
                if p.term == t {
                    continue;
                }
                p.term = t;
                p.updated_at = now.coerce();
                p.updated_by = editor.clone();
                tx.execute(Insert(p.clone()))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))
                    .map(drop)?;
            }
        }

        work_order.vendor = vendor;
        work_order.project = project;
        work_order.contract_value = contract_value;
        work_order.start_date = start_date;
        work_order.end_date = end_date;
        if let Some(pic) = pic {
            work_order.pic = pic;
        }
        work_order.notes = notes;
        work_order.signature_url = signature_url;
        work_order.updated_at = now.coerce();

        tx.execute(Insert(work_order.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!("updated `WorkOrder` `{}`", work_order.number);

        Ok(WithPayments {
            work_order,
            payments,
        })
    }
}

/// Error of [`UpdateWorkOrder`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`WorkOrder`] is published and cannot be edited anymore.
    #[display("`WorkOrder(id: {_0})` is published already")]
    AlreadyPublished(#[error(not(source))] work_order::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// End [`Date`] precedes the start one.
    #[display("`WorkOrder` cannot end before its start")]
    EndsBeforeStart,

    /// Stored payment terms don't reconcile with the new contract value.
    #[display("Invalid payment terms: {_0}")]
    #[from]
    InvalidPaymentTerms(term::Invalid),

    /// Contract value is negative.
    #[display("Contract value `{_0}` is negative")]
    NegativeContractValue(#[error(not(source))] Money),

    /// [`WorkOrder`] with the provided ID does not exist.
    #[display("`WorkOrder(id: {_0})` does not exist")]
    WorkOrderNotExists(#[error(not(source))] work_order::Id),
}

#[cfg(test)]
mod spec {
    use common::Handler as _;
    use rust_decimal::Decimal;

    use crate::{
        command::mock::{self, fixed, percentage, Memory},
        domain::{payment::term, work_order::Notes, Payment, WorkOrder},
    };

    use super::{ExecutionError, UpdateWorkOrder};

    fn command(wo: &WorkOrder, value: i64) -> UpdateWorkOrder {
        let mut contract_value = wo.contract_value;
        contract_value.amount = Decimal::from(value);
        UpdateWorkOrder {
            id: wo.id,
            vendor: wo.vendor.clone(),
            project: wo.project.clone(),
            contract_value,
            start_date: wo.start_date,
            end_date: wo.end_date,
            pic: None,
            notes: wo.notes.clone(),
            signature_url: wo.signature_url.clone(),
        }
    }

    #[tokio::test]
    async fn re_resolves_percentages_on_new_contract_value() {
        let (wo, payments) = mock::draft(100, &[percentage(30), percentage(70)]);
        let db = Memory::with_work_order(wo.clone(), payments);
        let svc = mock::service(db.clone(), None);

        let out = svc.execute(command(&wo, 200)).await.unwrap();

        let amounts = |ps: &[Payment]| {
            ps.iter().map(|p| p.term.amount).collect::<Vec<_>>()
        };
        assert_eq!(out.work_order.contract_value.amount, Decimal::from(200));
        assert_eq!(out.work_order.number, wo.number);
        assert_eq!(
            amounts(&out.payments),
            [Decimal::from(60), Decimal::from(140)],
        );

        let mut stored = db.state().payments.clone();
        stored.sort_by_key(|p| p.term.order);
        assert_eq!(amounts(&stored), [Decimal::from(60), Decimal::from(140)]);
    }

    #[tokio::test]
    async fn rejects_terms_not_reconciling_with_new_contract_value() {
        let (wo, payments) = mock::draft(100, &[fixed(50), percentage(50)]);
        let db = Memory::with_work_order(wo.clone(), payments);
        let svc = mock::service(db.clone(), None);

        let err = svc.execute(command(&wo, 200)).await.unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::InvalidPaymentTerms(term::Invalid::TotalMismatch {
                total,
                expected,
            }) if *total == Decimal::from(150)
                && *expected == Decimal::from(200),
        ));
        assert_eq!(
            db.state().work_orders[0].contract_value.amount,
            Decimal::from(100),
        );
    }

    #[tokio::test]
    async fn keeps_terms_when_contract_value_is_unchanged() {
        let (wo, payments) = mock::draft(100, &[fixed(50), percentage(50)]);
        let db = Memory::with_work_order(wo.clone(), payments);
        let svc = mock::service(db, None);

        let mut cmd = command(&wo, 100);
        cmd.notes = Notes::new("Bring ID cards");

        let out = svc.execute(cmd).await.unwrap();

        assert_eq!(
            out.work_order.notes.map(|n| n.to_string()).as_deref(),
            Some("Bring ID cards"),
        );
        assert_eq!(out.payments.len(), 2);
    }

    #[tokio::test]
    async fn refuses_to_edit_published() {
        let (mut wo, payments) = mock::draft(100, &[percentage(100)]);
        assert!(wo.publish());
        let db = Memory::with_work_order(wo.clone(), payments);
        let svc = mock::service(db.clone(), None);

        let err = svc.execute(command(&wo, 200)).await.unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::AlreadyPublished(id) if *id == wo.id,
        ));
        assert_eq!(db.state().work_order_writes, 0);
    }

    #[tokio::test]
    async fn reports_missing_work_order() {
        let (wo, _) = mock::draft(100, &[percentage(100)]);
        let svc = mock::service(Memory::default(), None);

        let err = svc.execute(command(&wo, 100)).await.unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::WorkOrderNotExists(id) if *id == wo.id,
        ));
    }
}
