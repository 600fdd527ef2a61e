//! In-memory [`Database`] and chat-ops webhook for [`Command`] tests.
//!
//! [`Command`]: super::Command

use std::{
    collections::HashSet,
    iter,
    num::NonZeroUsize,
    sync::{Arc, Mutex, MutexGuard},
};

use common::{
    money::Currency,
    operations::{By, Commit, Insert, Lock, Select, Transact},
    Date, DateTime, Handler, Money,
};
use rust_decimal::Decimal;
use time::UtcOffset;
use tokio::{
    io::{AsyncReadExt as _, AsyncWriteExt as _},
    net::{TcpListener, TcpStream},
};
use tracerr::Traced;

use crate::{
    domain::{
        contact::{Email, PersonName},
        payment::{self, term},
        vendor,
        work_order::{
            self, DateSegment, Number, Pic, Prefix, Project, ProjectName,
            VendorDetails,
        },
        Payment, Vendor, WorkOrder,
    },
    infra::{
        database::{self, WORK_ORDER_NUMBER_CONSTRAINT},
        notifier::Url,
        Notifier,
    },
    task, Config, Service,
};

#[cfg(doc)]
use crate::infra::Database;

/// In-memory [`Database`], whose number reads may lag behind its writes.
///
/// Transactions share the state with the [`Memory`] they're started from,
/// and are never rolled back.
#[derive(Clone, Debug, Default)]
pub(crate) struct Memory(Arc<Mutex<State>>);

/// State of a [`Memory`] database.
#[derive(Debug, Default)]
pub(crate) struct State {
    /// Taken [`Number`]s, including ones of unknown [`WorkOrder`]s.
    pub(crate) numbers: HashSet<Number>,

    /// Stored [`WorkOrder`]s.
    pub(crate) work_orders: Vec<WorkOrder>,

    /// Stored [`Payment`]s.
    pub(crate) payments: Vec<Payment>,

    /// Stored [`Vendor`]s.
    pub(crate) vendors: Vec<Vendor>,

    /// Number of upcoming [`Number`] reads returning nothing.
    pub(crate) stale_reads: usize,

    /// Number of performed [`Number`] reads.
    pub(crate) reads: usize,

    /// Number of performed [`WorkOrder`] writes.
    pub(crate) work_order_writes: usize,
}

impl Memory {
    /// Creates a new [`Memory`] database with the provided [`Number`]s taken
    /// and the provided number of `stale_reads` ahead.
    pub(crate) fn with_numbers(numbers: &[Number], stale_reads: usize) -> Self {
        let this = Self::default();
        {
            let mut st = this.state();
            st.numbers.extend(numbers.iter().cloned());
            st.stale_reads = stale_reads;
        }
        this
    }

    /// Creates a new [`Memory`] database storing the provided [`WorkOrder`]
    /// and its [`Payment`]s.
    pub(crate) fn with_work_order(wo: WorkOrder, payments: Vec<Payment>) -> Self {
        let this = Self::default();
        {
            let mut st = this.state();
            _ = st.numbers.insert(wo.number.clone());
            st.work_orders.push(wo);
            st.payments = payments;
        }
        this
    }

    /// Locks the [`State`] of this [`Memory`] database.
    pub(crate) fn state(&self) -> MutexGuard<'_, State> {
        self.0.lock().unwrap()
    }
}

impl Handler<Transact> for Memory {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(self.clone())
    }
}

impl Handler<Commit> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        Ok(())
    }
}

impl Handler<Select<By<Vec<Number>, DateSegment>>> for Memory {
    type Ok = Vec<Number>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Number>, DateSegment>>,
    ) -> Result<Self::Ok, Self::Err> {
        let segment = by.into_inner();
        let mut st = self.state();
        st.reads += 1;
        if st.stale_reads > 0 {
            st.stale_reads -= 1;
            return Ok(vec![]);
        }
        Ok(st
            .numbers
            .iter()
            .filter(|n| n.to_string().starts_with(&segment.to_string()))
            .cloned()
            .collect())
    }
}

impl Handler<Lock<By<WorkOrder, work_order::Id>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<WorkOrder, work_order::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(())
    }
}

impl Handler<Select<By<Option<WorkOrder>, work_order::Id>>> for Memory {
    type Ok = Option<WorkOrder>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<WorkOrder>, work_order::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.state().work_orders.iter().find(|wo| wo.id == id).cloned())
    }
}

impl Handler<Insert<WorkOrder>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(wo): Insert<WorkOrder>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut st = self.state();
        if let Some(stored) = st.work_orders.iter_mut().find(|s| s.id == wo.id)
        {
            *stored = wo;
        } else if st.numbers.insert(wo.number.clone()) {
            st.work_orders.push(wo);
        } else {
            return Err(tracerr::new!(database::Error::UniqueViolation(
                WORK_ORDER_NUMBER_CONSTRAINT.to_owned(),
            )));
        }
        st.work_order_writes += 1;
        Ok(())
    }
}

impl Handler<Select<By<Vec<Payment>, work_order::Id>>> for Memory {
    type Ok = Vec<Payment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Payment>, work_order::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        let mut payments = self
            .state()
            .payments
            .iter()
            .filter(|p| p.work_order_id == id)
            .cloned()
            .collect::<Vec<_>>();
        payments.sort_by_key(|p| p.term.order);
        Ok(payments)
    }
}

impl Handler<Lock<By<Payment, payment::Id>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<Payment, payment::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(())
    }
}

impl Handler<Select<By<Option<Payment>, payment::Id>>> for Memory {
    type Ok = Option<Payment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Payment>, payment::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.state().payments.iter().find(|p| p.id == id).cloned())
    }
}

impl Handler<Insert<Payment>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(p): Insert<Payment>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut st = self.state();
        st.payments.retain(|s| s.id != p.id);
        st.payments.push(p);
        Ok(())
    }
}

impl Handler<Lock<By<Vendor, Email>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<Vendor, Email>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(())
    }
}

impl Handler<Select<By<Option<Vendor>, Email>>> for Memory {
    type Ok = Option<Vendor>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Vendor>, Email>>,
    ) -> Result<Self::Ok, Self::Err> {
        let email = by.into_inner();
        Ok(self
            .state()
            .vendors
            .iter()
            .find(|v| v.email.as_ref().is_some_and(|e| e.is_same(&email)))
            .cloned())
    }
}

impl Handler<Insert<Vendor>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(v): Insert<Vendor>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut st = self.state();
        st.vendors.retain(|e| e.id != v.id);
        st.vendors.push(v);
        Ok(())
    }
}

/// Local chat-ops webhook recording the messages it receives.
#[derive(Debug)]
pub(crate) struct Webhook {
    /// [`Url`] to deliver messages to.
    pub(crate) url: Url,

    /// Bodies of the received messages.
    received: Arc<Mutex<Vec<String>>>,
}

impl Webhook {
    /// Starts listening on a random local port.
    pub(crate) async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/hook", listener.local_addr().unwrap())
            .parse()
            .unwrap();

        let received = Arc::<Mutex<Vec<String>>>::default();
        let messages = Arc::clone(&received);
        drop(tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let body = read_body(&mut stream).await;
                messages.lock().unwrap().push(body);
                _ = stream
                    .write_all(
                        b"HTTP/1.1 200 OK\r\n\
                          content-length: 0\r\n\
                          connection: close\r\n\r\n",
                    )
                    .await;
            }
        }));

        Self { url, received }
    }

    /// Returns bodies of the messages received so far.
    pub(crate) fn received(&self) -> Vec<String> {
        self.received.lock().unwrap().clone()
    }
}

/// Reads the body of a single HTTP request from the provided `stream`.
async fn read_body(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0; 1024];
    loop {
        let n = stream.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            return String::from_utf8_lossy(&buf).into_owned();
        }
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf);
        if let Some((head, body)) = text.split_once("\r\n\r\n") {
            let len = head
                .lines()
                .filter_map(|l| l.split_once(':'))
                .find(|(k, _)| k.trim().eq_ignore_ascii_case("content-length"))
                .and_then(|(_, v)| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if body.len() >= len {
                return body.to_owned();
            }
        }
    }
}

/// Creates a new [`Service`] over the provided [`Memory`] database,
/// notifying the provided [`Webhook`], if any.
pub(crate) fn service(db: Memory, webhook: Option<&Webhook>) -> Service<Memory> {
    Service {
        config: Config {
            number_prefix: Prefix::default(),
            utc_offset: UtcOffset::UTC,
            number_allocation_attempts: NonZeroUsize::new(3).unwrap(),
            operator: Pic {
                name: PersonName::new("Admin User").unwrap(),
                email: Email::new("admin@company.com").unwrap(),
            },
            vendor_portal_url: "http://localhost:3000/vendor".into(),
            mark_overdue_payments: task::mark_overdue_payments::Config::default(),
        },
        database: db,
        notifier: Notifier::new(webhook.map(|w| w.url.clone())),
    }
}

/// Creates a new [`work_order::Status::Draft`] [`WorkOrder`] of the provided
/// `value` in IDR, along with its [`Payment`]s defined by the provided
/// [`term::Input`]s.
pub(crate) fn draft(
    value: i64,
    inputs: &[term::Input],
) -> (WorkOrder, Vec<Payment>) {
    let today = Date::today(UtcOffset::UTC);
    let now = DateTime::now();
    let wo = WorkOrder {
        id: work_order::Id::new(),
        number: Number::allocate(&Prefix::default(), today, iter::empty::<&str>()),
        vendor: VendorDetails {
            name: vendor::Name::new("PT Sinar Jaya").unwrap(),
            email: Some(Email::new("sales@sinarjaya.co.id").unwrap()),
            phone: None,
        },
        project: Project {
            name: ProjectName::new("Office renovation").unwrap(),
            description: None,
        },
        contract_value: Money {
            amount: Decimal::from(value),
            currency: Currency::Idr,
        },
        start_date: today,
        end_date: None,
        status: work_order::Status::Draft,
        pic: Pic {
            name: PersonName::new("Admin User").unwrap(),
            email: Email::new("admin@company.com").unwrap(),
        },
        notes: None,
        signature_url: None,
        published_at: None,
        created_at: now.coerce(),
        updated_at: now.coerce(),
    };

    let drafts = inputs
        .iter()
        .zip(1..)
        .map(|(input, order)| term::Draft {
            name: format!("Term {order}"),
            order,
            input: *input,
            due_date: None,
            description: None,
        })
        .collect::<Vec<_>>();
    let payments = term::validate(wo.contract_value.amount, &drafts)
        .unwrap()
        .into_terms()
        .into_iter()
        .map(|t| {
            Payment::pending(wo.id, t, PersonName::new("Admin User").unwrap())
        })
        .collect();

    (wo, payments)
}

/// Creates a [`term::Input::Percentage`] of the provided value.
pub(crate) fn percentage(pct: i64) -> term::Input {
    term::Input::Percentage(Decimal::from(pct))
}

/// Creates a [`term::Input::FixedAmount`] of the provided value.
pub(crate) fn fixed(amount: i64) -> term::Input {
    term::Input::FixedAmount(Decimal::from(amount))
}
