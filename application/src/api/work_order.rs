//! [`WorkOrder`]-related definitions.

use common::{Date, DateTime, Money};
use derive_more::{AsRef, Display, From, Into};
use juniper::{
    graphql_object, GraphQLEnum, GraphQLInputObject, GraphQLObject,
    GraphQLScalar,
};
use rust_decimal::Decimal;
use service::{
    domain::{self, payment},
    query,
    read::work_order::WithPayments,
    Query as _,
};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::{
    api::{self, scalar},
    AsError, Context, Error,
};

/// Work order ("SPK") issued to a vendor.
#[derive(Clone, Debug)]
pub struct WorkOrder {
    /// Underlying [`domain::WorkOrder`].
    work_order: domain::WorkOrder,

    /// [`domain::Payment`]s of this [`WorkOrder`], loaded on demand.
    payments: OnceCell<Vec<domain::Payment>>,
}

impl From<domain::WorkOrder> for WorkOrder {
    fn from(work_order: domain::WorkOrder) -> Self {
        Self {
            work_order,
            payments: OnceCell::new(),
        }
    }
}

impl From<WithPayments> for WorkOrder {
    fn from(wp: WithPayments) -> Self {
        Self {
            work_order: wp.work_order,
            payments: OnceCell::new_with(Some(wp.payments)),
        }
    }
}

impl WorkOrder {
    /// Returns [`domain::Payment`]s of this [`WorkOrder`], in their term
    /// order.
    ///
    /// # Errors
    ///
    /// If the [`domain::Payment`]s cannot be loaded.
    async fn load_payments(
        &self,
        ctx: &Context,
    ) -> Result<&[domain::Payment], Error> {
        self.payments
            .get_or_try_init(|| async {
                ctx.service()
                    .execute(query::work_order::Payments::by(
                        self.work_order.id,
                    ))
                    .await
                    .map_err(AsError::into_error)
                    .map_err(ctx.error())
            })
            .await
            .map(Vec::as_slice)
    }
}

/// Work order ("SPK") issued to a vendor.
#[graphql_object(context = Context)]
impl WorkOrder {
    /// Unique identifier of this `WorkOrder`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "WorkOrder.id",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn id(&self) -> Id {
        self.work_order.id.into()
    }

    /// Document number of this `WorkOrder`, like `ELX/SPK/20260121/001`.
    pub fn number(&self) -> Number {
        self.work_order.number.clone().into()
    }

    /// Vendor this `WorkOrder` is issued to.
    pub fn vendor(&self) -> VendorDetails {
        self.work_order.vendor.clone().into()
    }

    /// Project this `WorkOrder` is issued for.
    pub fn project(&self) -> Project {
        self.work_order.project.clone().into()
    }

    /// Total value of this `WorkOrder`.
    pub fn contract_value(&self) -> Money {
        self.work_order.contract_value
    }

    /// Total value of this `WorkOrder`, formatted for display, like
    /// `IDR 100,000,000`.
    pub fn contract_value_formatted(&self) -> String {
        self.work_order.contract_value.formatted()
    }

    /// `Date` the work starts on.
    pub fn start_date(&self) -> Date {
        self.work_order.start_date
    }

    /// `Date` the work is expected to end on.
    pub fn end_date(&self) -> Option<Date> {
        self.work_order.end_date
    }

    /// Status of this `WorkOrder`.
    pub fn status(&self) -> Status {
        self.work_order.status.into()
    }

    /// Person in charge of this `WorkOrder` on the issuer side.
    pub fn pic(&self) -> Pic {
        self.work_order.pic.clone().into()
    }

    /// Notes to this `WorkOrder`.
    pub fn notes(&self) -> Option<&str> {
        self.work_order.notes.as_ref().map(AsRef::as_ref)
    }

    /// Link to the signature rendered on this `WorkOrder` document.
    pub fn signature_url(&self) -> Option<SignatureUrl> {
        self.work_order.signature_url.clone().map(Into::into)
    }

    /// `DateTime` when this `WorkOrder` was published.
    pub fn published_at(&self) -> Option<DateTime> {
        self.work_order.published_at.map(|at| at.coerce())
    }

    /// `DateTime` when this `WorkOrder` was created.
    pub fn created_at(&self) -> DateTime {
        self.work_order.created_at.coerce()
    }

    /// `DateTime` when this `WorkOrder` was last modified.
    pub fn updated_at(&self) -> DateTime {
        self.work_order.updated_at.coerce()
    }

    /// `Payment`s of this `WorkOrder`, in their term order.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "WorkOrder.payments",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn payments(
        &self,
        ctx: &Context,
    ) -> Result<Vec<api::Payment>, Error> {
        let currency = self.work_order.contract_value.currency;
        Ok(self
            .load_payments(ctx)
            .await?
            .iter()
            .cloned()
            .map(|p| api::Payment::new(p, currency))
            .collect())
    }

    /// Sum of the already paid `Payment`s of this `WorkOrder`.
    pub async fn paid_amount(&self, ctx: &Context) -> Result<Money, Error> {
        let amount = self
            .load_payments(ctx)
            .await?
            .iter()
            .filter(|p| p.status == payment::Status::Paid)
            .map(|p| p.term.amount)
            .sum::<Decimal>();
        Ok(Money {
            amount,
            currency: self.work_order.contract_value.currency,
        })
    }
}

/// Unique identifier of a `WorkOrder`.
#[derive(Clone, Copy, Debug, Display, Into, From, GraphQLScalar)]
#[from(domain::work_order::Id)]
#[into(domain::work_order::Id)]
#[graphql(name = "WorkOrderId", transparent)]
pub struct Id(Uuid);

/// Document number of a `WorkOrder`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "WorkOrderNumber",
    with = scalar::Via::<domain::work_order::Number>,
)]
pub struct Number(domain::work_order::Number);

/// Name of a `Project`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(with = scalar::Via::<domain::work_order::ProjectName>)]
pub struct ProjectName(domain::work_order::ProjectName);

/// HTTP(S) link to a signature image.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(with = scalar::Via::<domain::work_order::SignatureUrl>)]
pub struct SignatureUrl(domain::work_order::SignatureUrl);

/// Status of a `WorkOrder`.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "WorkOrderStatus")]
pub enum Status {
    /// Editable, not visible to the vendor.
    Draft,

    /// Frozen and visible in the vendor portal.
    Published,
}

impl From<domain::work_order::Status> for Status {
    fn from(status: domain::work_order::Status) -> Self {
        use domain::work_order::Status as S;
        match status {
            S::Draft => Self::Draft,
            S::Published => Self::Published,
        }
    }
}

impl From<Status> for domain::work_order::Status {
    fn from(status: Status) -> Self {
        match status {
            Status::Draft => Self::Draft,
            Status::Published => Self::Published,
        }
    }
}

/// Vendor as written on a `WorkOrder`.
#[derive(Clone, Debug, GraphQLObject)]
#[graphql(name = "WorkOrderVendor")]
pub struct VendorDetails {
    /// Name of the vendor.
    pub name: api::vendor::Name,

    /// E-mail of the vendor.
    pub email: Option<api::contact::Email>,

    /// Phone of the vendor.
    pub phone: Option<api::contact::Phone>,
}

impl From<domain::work_order::VendorDetails> for VendorDetails {
    fn from(v: domain::work_order::VendorDetails) -> Self {
        Self {
            name: v.name.into(),
            email: v.email.map(Into::into),
            phone: v.phone.map(Into::into),
        }
    }
}

/// Project a `WorkOrder` is issued for.
#[derive(Clone, Debug, GraphQLObject)]
pub struct Project {
    /// Name of the project.
    pub name: ProjectName,

    /// Description of the project.
    pub description: Option<String>,
}

impl From<domain::work_order::Project> for Project {
    fn from(p: domain::work_order::Project) -> Self {
        Self {
            name: p.name.into(),
            description: p.description.as_ref().map(ToString::to_string),
        }
    }
}

/// Person in charge of a `WorkOrder`.
#[derive(Clone, Debug, GraphQLObject)]
#[graphql(name = "WorkOrderPic")]
pub struct Pic {
    /// Name of the person.
    pub name: api::contact::PersonName,

    /// E-mail of the person.
    pub email: api::contact::Email,
}

impl From<domain::work_order::Pic> for Pic {
    fn from(p: domain::work_order::Pic) -> Self {
        Self {
            name: p.name.into(),
            email: p.email.into(),
        }
    }
}

/// Vendor to issue a `WorkOrder` to.
#[derive(Clone, Debug, GraphQLInputObject)]
#[graphql(name = "WorkOrderVendorInput")]
pub struct VendorInput {
    /// Name of the vendor.
    pub name: api::vendor::Name,

    /// E-mail of the vendor, required for the vendor portal access.
    pub email: Option<api::contact::Email>,

    /// Phone of the vendor.
    pub phone: Option<api::contact::Phone>,
}

impl From<VendorInput> for domain::work_order::VendorDetails {
    fn from(v: VendorInput) -> Self {
        Self {
            name: v.name.into(),
            email: v.email.map(Into::into),
            phone: v.phone.map(Into::into),
        }
    }
}

/// Project to issue a `WorkOrder` for.
#[derive(Clone, Debug, GraphQLInputObject)]
#[graphql(name = "ProjectInput")]
pub struct ProjectInput {
    /// Name of the project.
    pub name: ProjectName,

    /// Description of the project.
    pub description: Option<String>,
}

impl From<ProjectInput> for domain::work_order::Project {
    fn from(p: ProjectInput) -> Self {
        Self {
            name: p.name.into(),
            description: p
                .description
                .as_deref()
                .and_then(domain::work_order::Notes::new),
        }
    }
}

/// Person in charge of a `WorkOrder`.
#[derive(Clone, Debug, GraphQLInputObject)]
#[graphql(name = "WorkOrderPicInput")]
pub struct PicInput {
    /// Name of the person.
    pub name: api::contact::PersonName,

    /// E-mail of the person.
    pub email: api::contact::Email,
}

impl From<PicInput> for domain::work_order::Pic {
    fn from(p: PicInput) -> Self {
        Self {
            name: p.name.into(),
            email: p.email.into(),
        }
    }
}

/// `WorkOrder` along with the vendor portal access issued for it.
#[derive(Clone, Debug)]
pub struct Issued {
    /// Issued [`WorkOrder`].
    pub work_order: WorkOrder,

    /// Vendor portal access, if the vendor has an e-mail.
    pub vendor_access: Option<api::vendor::Access>,
}

/// `WorkOrder` along with the vendor portal access issued for it.
#[graphql_object(name = "IssuedWorkOrder", context = Context)]
impl Issued {
    /// Issued `WorkOrder`.
    pub fn work_order(&self) -> &WorkOrder {
        &self.work_order
    }

    /// Vendor portal access, if the vendor has an e-mail.
    pub fn vendor_access(&self) -> &Option<api::vendor::Access> {
        &self.vendor_access
    }
}

pub mod list {
    //! Definitions related to the [`WorkOrder`] list.

    use derive_more::{AsRef, From, Into};
    use juniper::{graphql_object, GraphQLScalar};
    use service::{query, read, Query as _};

    use super::WorkOrder;
    use crate::{api::scalar, AsError, Context, Error};

    /// Cursor for the `WorkOrder` list.
    #[derive(AsRef, Clone, Copy, Debug, From, GraphQLScalar, Into)]
    #[graphql(
        name = "WorkOrderListCursor",
        with = scalar::Via::<read::work_order::list::Cursor>,
    )]
    pub struct Cursor(read::work_order::list::Cursor);

    /// Edge in the [`WorkOrder`] list.
    #[derive(Clone, Debug, From, Into)]
    pub struct Edge(read::work_order::list::Edge);

    /// Edge in the `WorkOrder` list.
    #[graphql_object(name = "WorkOrderListEdge", context = Context)]
    impl Edge {
        /// Cursor of this `WorkOrderListEdge`.
        #[must_use]
        pub fn cursor(&self) -> Cursor {
            self.0.cursor.into()
        }

        /// Node of this `WorkOrderListEdge`.
        #[must_use]
        pub fn node(&self) -> WorkOrder {
            self.0.node.clone().into()
        }
    }

    /// Connection of the [`WorkOrder`] list.
    #[derive(Clone, Debug)]
    pub struct Connection {
        /// Underlying [`read::work_order::list::Connection`].
        page: read::work_order::list::Connection,

        /// [`read::work_order::list::Filter`] the page was selected with.
        filter: read::work_order::list::Filter,
    }

    impl Connection {
        /// Creates a new [`Connection`] out of the provided page and the
        /// [`read::work_order::list::Filter`] it was selected with.
        #[must_use]
        pub fn new(
            page: read::work_order::list::Connection,
            filter: read::work_order::list::Filter,
        ) -> Self {
            Self { page, filter }
        }
    }

    /// Connection of the `WorkOrder` list.
    #[graphql_object(name = "WorkOrderListConnection", context = Context)]
    impl Connection {
        /// Edges of this `WorkOrderListConnection`.
        #[must_use]
        pub fn edges(&self) -> Vec<Edge> {
            self.page.edges.iter().cloned().map(Into::into).collect()
        }

        /// Information about the page.
        #[must_use]
        pub fn page_info(&self) -> PageInfo {
            PageInfo(self.page.page_info())
        }

        /// Total count of `WorkOrder`s matching the list filter.
        pub async fn total_count(&self, ctx: &Context) -> Result<i32, Error> {
            ctx.service()
                .execute(query::work_orders::TotalCount::by(
                    self.filter.clone(),
                ))
                .await
                .map_err(AsError::into_error)
                .map_err(ctx.error())
                .map(Into::into)
        }
    }

    /// Information about a [`Connection`] page.
    #[derive(Clone, Copy, Debug)]
    pub struct PageInfo(read::work_order::list::PageInfo);

    /// Information about a `WorkOrderListConnection` page.
    #[graphql_object(name = "WorkOrderListPageInfo", context = Context)]
    impl PageInfo {
        /// Indicator whether there is a next page.
        #[must_use]
        pub fn has_next_page(&self) -> bool {
            self.0.has_next_page
        }

        /// Indicator whether there is a previous page.
        #[must_use]
        pub fn has_previous_page(&self) -> bool {
            self.0.has_previous_page
        }

        /// Start cursor of the page.
        #[must_use]
        pub fn start_cursor(&self) -> Option<Cursor> {
            self.0.start_cursor.map(Into::into)
        }

        /// End cursor of the page.
        #[must_use]
        pub fn end_cursor(&self) -> Option<Cursor> {
            self.0.end_cursor.map(Into::into)
        }
    }
}
