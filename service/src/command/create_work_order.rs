//! [`Command`] for creating a new [`WorkOrder`].

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    Date, DateTime, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        contact::Email,
        payment::term,
        vendor::AccessToken,
        work_order::{
            self, DateSegment, Notes, Number, Pic, Project, SignatureUrl,
            VendorDetails,
        },
        Payment, Vendor, WorkOrder,
    },
    infra::{
        database::{self, WORK_ORDER_NUMBER_CONSTRAINT},
        Database,
    },
    Service,
};

use super::{issue_vendor_token, Command, IssueVendorToken};

/// [`Command`] for creating a new [`WorkOrder`] together with its
/// [`Payment`]s.
#[derive(Clone, Debug)]
pub struct CreateWorkOrder {
    /// [`VendorDetails`] of a new [`WorkOrder`].
    pub vendor: VendorDetails,

    /// [`Project`] of a new [`WorkOrder`].
    pub project: Project,

    /// Contract value of a new [`WorkOrder`].
    pub contract_value: Money,

    /// [`Date`] the work starts on.
    pub start_date: Date,

    /// [`Date`] the work is expected to end on.
    pub end_date: Option<Date>,

    /// [`Pic`] of a new [`WorkOrder`].
    ///
    /// The configured operator is used if [`None`].
    pub pic: Option<Pic>,

    /// [`Notes`] of a new [`WorkOrder`].
    pub notes: Option<Notes>,

    /// [`SignatureUrl`] of a new [`WorkOrder`].
    pub signature_url: Option<SignatureUrl>,

    /// Payment [`term::Draft`]s to split the contract value into.
    pub terms: Vec<term::Draft>,
}

/// Result of the [`CreateWorkOrder`] [`Command`].
#[derive(Clone, Debug)]
pub struct Output {
    /// Created [`WorkOrder`].
    pub work_order: WorkOrder,

    /// [`Payment`]s of the created [`WorkOrder`], in their term order.
    pub payments: Vec<Payment>,

    /// [`AccessToken`] of the [`Vendor`], if it has an [`Email`].
    pub access_token: Option<AccessToken>,
}

impl<Db> Command<CreateWorkOrder> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Vec<Number>, DateSegment>>,
            Ok = Vec<Number>,
            Err = Traced<database::Error>,
        > + Database<Insert<WorkOrder>, Err = Traced<database::Error>>
        + Database<Insert<Payment>, Err = Traced<database::Error>>
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
        cmd: CreateWorkOrder,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateWorkOrder {
            vendor,
            project,
            contract_value,
            start_date,
            end_date,
            pic,
            notes,
            signature_url,
            terms,
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
        let terms = term::validate(contract_value.amount, &terms)
            .map_err(tracerr::from_and_wrap!(=> E))?
            .into_terms();

        let config = self.config();
        let pic = pic.unwrap_or_else(|| config.operator.clone());
        let today = config.today();
        let segment = DateSegment::new(&config.number_prefix, today);

        for attempt in 1..=config.number_allocation_attempts.get() {
            let tx = self
                .database()
                .execute(Transact)
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;

            let issued = tx
                .execute(Select(By::new(segment.clone())))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            let number =
                Number::allocate(&config.number_prefix, today, &issued);

            let now = DateTime::now();
            let work_order = WorkOrder {
                id: work_order::Id::new(),
                number,
                vendor: vendor.clone(),
                project: project.clone(),
                contract_value,
                start_date,
                end_date,
                status: work_order::Status::Draft,
                pic: pic.clone(),
                notes: notes.clone(),
                signature_url: signature_url.clone(),
                published_at: None,
                created_at: now.coerce(),
                updated_at: now.coerce(),
            };

            let inserted = tx.execute(Insert(work_order.clone())).await;
            if let Err(e) = &inserted {
                if e.as_ref().is_unique_violation(WORK_ORDER_NUMBER_CONSTRAINT)
                {
                    log::warn!(
                        "`{}` number is taken concurrently, retrying \
                         (attempt {attempt})",
                        work_order.number,
                    );
                    continue;
                }
            }
            inserted
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;

            let mut payments = Vec::with_capacity(terms.len());
            for t in &terms {
                let p = Payment::pending(
                    work_order.id,
                    t.clone(),
                    pic.name.clone(),
                );
                tx.execute(Insert(p.clone()))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))
                    .map(drop)?;
                payments.push(p);
            }
            payments.sort_by_key(|p| p.term.order);

            let access_token = if let Some(email) = vendor.email.clone() {
                let token = issue_vendor_token::ensure_access_token(
                    &tx,
                    IssueVendorToken {
                        name: vendor.name.clone(),
                        email,
                        phone: vendor.phone.clone(),
                    },
                )
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
                Some(token)
            } else {
                None
            };

            tx.execute(Commit)
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;

            log::info!("created `WorkOrder` `{}`", work_order.number);

            return Ok(Output {
                work_order,
                payments,
                access_token,
            });
        }

        Err(tracerr::new!(E::NumberOccupied))
    }
}

/// Error of [`CreateWorkOrder`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// End [`Date`] precedes the start one.
    #[display("`WorkOrder` cannot end before its start")]
    EndsBeforeStart,

    /// Payment [`term::Draft`]s don't reconcile with the contract value.
    #[display("Invalid payment terms: {_0}")]
    #[from]
    InvalidPaymentTerms(term::Invalid),

    /// Contract value is negative.
    #[display("Contract value `{_0}` is negative")]
    NegativeContractValue(#[error(not(source))] Money),

    /// Every allocated [`Number`] was taken concurrently.
    #[display("`WorkOrder` number already exists, please retry")]
    NumberOccupied,
}

#[cfg(test)]
mod spec {
    use common::{money::Currency, Date, Handler as _, Money};
    use rust_decimal::Decimal;

    use crate::{
        command::mock::{self, Memory},
        domain::{
            contact::Email,
            payment::term,
            vendor,
            work_order::{DateSegment, Number, Project, ProjectName, VendorDetails},
        },
        Service,
    };

    use super::{CreateWorkOrder, ExecutionError};

    fn service(db: Memory) -> Service<Memory> {
        mock::service(db, None)
    }

    fn command(email: Option<&str>) -> CreateWorkOrder {
        CreateWorkOrder {
            vendor: VendorDetails {
                name: vendor::Name::new("PT Sinar Jaya").unwrap(),
                email: email.map(|e| Email::new(e).unwrap()),
                phone: None,
            },
            project: Project {
                name: ProjectName::new("Office renovation").unwrap(),
                description: None,
            },
            contract_value: Money {
                amount: Decimal::from(100_000_000),
                currency: Currency::Idr,
            },
            start_date: Date::from_ymd(2026, 1, 21).unwrap(),
            end_date: None,
            pic: None,
            notes: None,
            signature_url: None,
            terms: [(1, 30), (2, 40), (3, 30)]
                .into_iter()
                .map(|(order, pct)| term::Draft {
                    name: format!("Term {order}"),
                    order,
                    input: term::Input::Percentage(Decimal::from(pct)),
                    due_date: None,
                    description: None,
                })
                .collect(),
        }
    }

    fn issued(svc: &Service<Memory>, seq: &[u64]) -> Vec<Number> {
        let config = svc.config();
        let segment = DateSegment::new(&config.number_prefix, config.today());
        seq.iter()
            .map(|s| format!("{segment}{s:03}").parse().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn allocates_next_number() {
        let svc = service(Memory::default());
        let numbers = issued(&svc, &[1, 2, 5]);
        let svc = service(Memory::with_numbers(&numbers, 0));

        let out = svc.execute(command(None)).await.unwrap();

        assert_eq!(out.work_order.number.sequence(), Some(6));
        assert_eq!(out.payments.len(), 3);
        assert_eq!(
            out.payments.iter().map(|p| p.term.amount).collect::<Vec<_>>(),
            [
                Decimal::from(30_000_000),
                Decimal::from(40_000_000),
                Decimal::from(30_000_000),
            ],
        );
        assert!(out.access_token.is_none());
    }

    #[tokio::test]
    async fn retries_on_number_collision() {
        let svc = service(Memory::default());
        let numbers = issued(&svc, &[1]);
        let db = Memory::with_numbers(&numbers, 1);
        let svc = service(db.clone());

        let out = svc.execute(command(None)).await.unwrap();

        assert_eq!(out.work_order.number.sequence(), Some(2));
        assert_eq!(db.state().reads, 2);
    }

    #[tokio::test]
    async fn gives_up_after_configured_attempts() {
        let svc = service(Memory::default());
        let numbers = issued(&svc, &[1]);
        let db = Memory::with_numbers(&numbers, 10);
        let svc = service(db.clone());

        let err = svc.execute(command(None)).await.unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::NumberOccupied));
        assert_eq!(db.state().reads, 3);
        assert!(db.state().payments.is_empty());
    }

    #[tokio::test]
    async fn rejects_unreconciled_terms() {
        let svc = service(Memory::default());
        let mut cmd = command(None);
        cmd.terms.truncate(2);

        let err = svc.execute(cmd).await.unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::InvalidPaymentTerms(
                term::Invalid::PercentageTotalMismatch { .. }
            ),
        ));
    }

    #[tokio::test]
    async fn issues_vendor_token_once() {
        let db = Memory::default();
        let svc = service(db.clone());

        let first = svc
            .execute(command(Some("sales@sinarjaya.co.id")))
            .await
            .unwrap();
        let second = svc
            .execute(command(Some("Sales@SinarJaya.co.id")))
            .await
            .unwrap();

        assert!(first.access_token.is_some());
        assert_eq!(first.access_token, second.access_token);
        assert_eq!(db.state().vendors.len(), 1);
        assert_eq!(second.work_order.number.sequence(), Some(2));
    }
}
