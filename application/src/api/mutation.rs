//! GraphQL [`Mutation`]s definitions.

use common::{Date, Money};
use juniper::graphql_object;
use service::{command, Command as _};

use crate::{api, define_error, AsError, Context, Error};

/// Root of all GraphQL mutations.
#[derive(Clone, Copy, Debug)]
pub struct Mutation;

impl Mutation {
    /// Name of the [`tracing::Span`] for the mutations.
    const SPAN_NAME: &'static str = "GraphQL mutation";
}

#[graphql_object(context = Context)]
impl Mutation {
    /// Creates a new draft `WorkOrder` with the provided payment terms,
    /// allocating it the next free number of today.
    ///
    /// `pic` defaults to the configured operator. If the vendor has an
    /// e-mail, it's issued a vendor portal access.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `WORK_ORDER_NEGATIVE_CONTRACT_VALUE` - the `contractValue` is
    ///                                          negative;
    /// - `WORK_ORDER_ENDS_BEFORE_START` - the `endDate` precedes the
    ///                                    `startDate`;
    /// - `PAYMENT_TERMS_*`, `PAYMENT_TERM_*` - the `terms` don't reconcile
    ///                                         with the `contractValue`;
    /// - `WORK_ORDER_NUMBER_OCCUPIED` - no free number could be allocated.
    #[expect(clippy::too_many_arguments, reason = "GraphQL arguments")]
    #[tracing::instrument(
        skip_all,
        fields(
            contract_value = %contract_value,
            gql.name = "createWorkOrder",
            otel.name = Self::SPAN_NAME,
            project = %project.name,
            terms = terms.len(),
            vendor = %vendor.name,
        ),
    )]
    pub async fn create_work_order(
        vendor: api::work_order::VendorInput,
        project: api::work_order::ProjectInput,
        contract_value: Money,
        start_date: Date,
        end_date: Option<Date>,
        pic: Option<api::work_order::PicInput>,
        notes: Option<String>,
        signature_url: Option<api::work_order::SignatureUrl>,
        terms: Vec<api::payment::TermInput>,
        ctx: &Context,
    ) -> Result<api::work_order::Issued, Error> {
        let terms = api::payment::TermInput::into_drafts(terms, ctx)?;
        let output = ctx
            .service()
            .execute(command::CreateWorkOrder {
                vendor: vendor.into(),
                project: project.into(),
                contract_value,
                start_date,
                end_date,
                pic: pic.map(Into::into),
                notes: notes.as_deref().and_then(
                    service::domain::work_order::Notes::new,
                ),
                signature_url: signature_url.map(Into::into),
                terms,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;

        Ok(api::work_order::Issued {
            vendor_access: output
                .access_token
                .map(|t| api::vendor::Access::new(t, ctx)),
            work_order: service::read::work_order::WithPayments {
                work_order: output.work_order,
                payments: output.payments,
            }
            .into(),
        })
    }

    /// Edits the draft `WorkOrder` with the specified ID.
    ///
    /// Its number and payment terms stay intact, though a changed
    /// `contractValue` re-resolves the stored terms against it. `pic` is left
    /// as is if omitted.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `WORK_ORDER_NOT_EXISTS` - the `WorkOrder` does not exist;
    /// - `WORK_ORDER_ALREADY_PUBLISHED` - the `WorkOrder` is published;
    /// - `WORK_ORDER_NEGATIVE_CONTRACT_VALUE` - the `contractValue` is
    ///                                          negative;
    /// - `WORK_ORDER_ENDS_BEFORE_START` - the `endDate` precedes the
    ///                                    `startDate`;
    /// - `PAYMENT_TERMS_*` - the stored terms don't reconcile with the new
    ///                       `contractValue`.
    #[expect(clippy::too_many_arguments, reason = "GraphQL arguments")]
    #[tracing::instrument(
        skip_all,
        fields(
            contract_value = %contract_value,
            gql.name = "updateWorkOrder",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn update_work_order(
        id: api::work_order::Id,
        vendor: api::work_order::VendorInput,
        project: api::work_order::ProjectInput,
        contract_value: Money,
        start_date: Date,
        end_date: Option<Date>,
        pic: Option<api::work_order::PicInput>,
        notes: Option<String>,
        signature_url: Option<api::work_order::SignatureUrl>,
        ctx: &Context,
    ) -> Result<api::WorkOrder, Error> {
        ctx.service()
            .execute(command::UpdateWorkOrder {
                id: id.into(),
                vendor: vendor.into(),
                project: project.into(),
                contract_value,
                start_date,
                end_date,
                pic: pic.map(Into::into),
                notes: notes.as_deref().and_then(
                    service::domain::work_order::Notes::new,
                ),
                signature_url: signature_url.map(Into::into),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Publishes the `WorkOrder` with the specified ID, making it visible in
    /// the vendor portal.
    ///
    /// Publishing an already published `WorkOrder` changes nothing.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `WORK_ORDER_NOT_EXISTS` - the `WorkOrder` does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "publishWorkOrder",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn publish_work_order(
        id: api::work_order::Id,
        ctx: &Context,
    ) -> Result<api::work_order::Issued, Error> {
        let output = ctx
            .service()
            .execute(command::PublishWorkOrder { id: id.into() })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;

        Ok(api::work_order::Issued {
            vendor_access: output
                .access_token
                .map(|t| api::vendor::Access::new(t, ctx)),
            work_order: service::read::work_order::WithPayments {
                work_order: output.work_order,
                payments: output.payments,
            }
            .into(),
        })
    }

    /// Deletes the `WorkOrder` with the specified ID along with its
    /// `Payment`s.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `WORK_ORDER_NOT_EXISTS` - the `WorkOrder` does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "deleteWorkOrder",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn delete_work_order(
        id: api::work_order::Id,
        ctx: &Context,
    ) -> Result<api::work_order::Id, Error> {
        ctx.service()
            .execute(command::DeleteWorkOrder { id: id.into() })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|wo| wo.id.into())
    }

    /// Changes the status of the `Payment` with the specified ID.
    ///
    /// A `PAID` `Payment` without `paidDate` is considered paid today. The
    /// `reference` is left as is if omitted. `by` defaults to the configured
    /// operator.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `PAYMENT_NOT_EXISTS` - the `Payment` does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "updatePaymentStatus",
            id = %id,
            otel.name = Self::SPAN_NAME,
            status = ?status,
        ),
    )]
    pub async fn update_payment_status(
        id: api::payment::Id,
        status: api::payment::Status,
        paid_date: Option<Date>,
        reference: Option<api::payment::Reference>,
        by: Option<api::contact::PersonName>,
        ctx: &Context,
    ) -> Result<api::Payment, Error> {
        ctx.service()
            .execute(command::UpdatePaymentStatus {
                id: id.into(),
                status: status.into(),
                paid_date,
                reference: reference.map(Into::into),
                by: by.map(Into::into),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|out| {
                api::Payment::new(
                    out.payment,
                    out.work_order.contract_value.currency,
                )
            })
    }

    /// Issues the vendor with the provided e-mail a vendor portal access,
    /// reusing the already issued one.
    #[tracing::instrument(
        skip_all,
        fields(
            email = %email,
            gql.name = "issueVendorToken",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn issue_vendor_token(
        name: api::vendor::Name,
        email: api::contact::Email,
        phone: Option<api::contact::Phone>,
        ctx: &Context,
    ) -> Result<api::vendor::Access, Error> {
        ctx.service()
            .execute(command::IssueVendorToken {
                name: name.into(),
                email: email.into(),
                phone: phone.map(Into::into),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|t| api::vendor::Access::new(t, ctx))
    }
}

impl AsError for command::create_work_order::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::EndsBeforeStart => {
                Some(api::WorkOrderError::EndsBeforeStart.into())
            }
            Self::InvalidPaymentTerms(e) => e.try_as_error(),
            Self::NegativeContractValue(_) => {
                Some(api::WorkOrderError::NegativeContractValue.into())
            }
            Self::NumberOccupied => {
                Some(api::WorkOrderError::NumberOccupied.into())
            }
        }
    }
}

impl AsError for command::update_work_order::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::AlreadyPublished(_) => {
                Some(api::WorkOrderError::AlreadyPublished.into())
            }
            Self::Db(e) => e.try_as_error(),
            Self::EndsBeforeStart => {
                Some(api::WorkOrderError::EndsBeforeStart.into())
            }
            Self::InvalidPaymentTerms(e) => e.try_as_error(),
            Self::NegativeContractValue(_) => {
                Some(api::WorkOrderError::NegativeContractValue.into())
            }
            Self::WorkOrderNotExists(_) => {
                Some(api::WorkOrderError::NotExists.into())
            }
        }
    }
}

impl AsError for command::publish_work_order::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::WorkOrderNotExists(_) => {
                Some(api::WorkOrderError::NotExists.into())
            }
        }
    }
}

impl AsError for command::delete_work_order::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::WorkOrderNotExists(_) => {
                Some(api::WorkOrderError::NotExists.into())
            }
        }
    }
}

impl AsError for command::update_payment_status::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "PAYMENT_NOT_EXISTS"]
                #[status = NOT_FOUND]
                #[message = "`Payment` does not exist"]
                PaymentNotExists,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::PaymentNotExists(_) => Some(Error::PaymentNotExists.into()),
            Self::WorkOrderNotExists(_) => {
                Some(api::WorkOrderError::NotExists.into())
            }
        }
    }
}

impl AsError for command::issue_vendor_token::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
        }
    }
}
