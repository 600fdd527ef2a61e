//! GraphQL [`Query`]s definitions.

use juniper::graphql_object;
use service::{query, read, Query as _};

use crate::{api, define_error, AsError, Context, Error};

/// Root of all GraphQL queries.
#[derive(Clone, Copy, Debug)]
pub struct Query;

impl Query {
    /// Name of the [`tracing::Span`] for the queries.
    pub(crate) const SPAN_NAME: &'static str = "GraphQL query";

    /// Default number of entries in an autocomplete history.
    const HISTORY_LIMIT: i32 = 20;
}

#[graphql_object(context = Context)]
impl Query {
    /// Returns the `WorkOrder` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `WORK_ORDER_NOT_EXISTS` - the `WorkOrder` with the specified ID does
    ///                             not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "workOrder",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn work_order(
        id: api::work_order::Id,
        ctx: &Context,
    ) -> Result<api::WorkOrder, Error> {
        ctx.service()
            .execute(query::work_order::ById::by(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| api::WorkOrderError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Fetches the page of `WorkOrder`s, most recently created first.
    ///
    /// `search` fuzzy matches numbers, vendor and project names.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AMBIGUOUS_PAGINATION_ARGUMENTS` - the pagination arguments are
    ///                                      ambiguous.
    #[tracing::instrument(
        skip_all,
        fields(
            after = ?after.map(|c| c.as_ref().to_string()),
            before = ?before.map(|c| c.as_ref().to_string()),
            first = ?first,
            gql.name = "workOrders",
            last = ?last,
            otel.name = Self::SPAN_NAME,
            search = ?search,
            status = ?status,
        ),
    )]
    pub async fn work_orders(
        first: Option<i32>,
        after: Option<api::work_order::list::Cursor>,
        last: Option<i32>,
        before: Option<api::work_order::list::Cursor>,
        status: Option<api::work_order::Status>,
        search: Option<String>,
        ctx: &Context,
    ) -> Result<api::work_order::list::Connection, Error> {
        const DEFAULT_PAGE_SIZE: i32 = 20;

        let arguments = read::work_order::list::Arguments::new(
            first,
            after.map(Into::into),
            last,
            before.map(Into::into),
            DEFAULT_PAGE_SIZE,
        )
        .ok_or_else(|| api::PaginationError::Ambiguous.into())
        .map_err(ctx.error())?;
        let filter = read::work_order::list::Filter {
            status: status.map(Into::into),
            search: search.filter(|s| !s.trim().is_empty()),
        };

        ctx.service()
            .execute(query::work_orders::List::by(
                read::work_order::list::Selector {
                    arguments,
                    filter: filter.clone(),
                },
            ))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|page| api::work_order::list::Connection::new(page, filter))
    }

    /// Previews the number the next created `WorkOrder` will get.
    ///
    /// The number is not reserved, so a concurrently created `WorkOrder` may
    /// take it.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "nextWorkOrderNumber",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn next_work_order_number(
        ctx: &Context,
    ) -> Result<api::work_order::Number, Error> {
        ctx.service()
            .execute(query::NextWorkOrderNumber)
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Reconciles the provided payment terms against the `contractValue`
    /// without persisting anything.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `PAYMENT_TERM_ORDER_OUT_OF_RANGE` - some term order doesn't fit into
    ///                                       the supported range.
    #[tracing::instrument(
        skip_all,
        fields(
            contract_value = %contract_value,
            gql.name = "validatePaymentTerms",
            otel.name = Self::SPAN_NAME,
            terms = terms.len(),
        ),
    )]
    pub async fn validate_payment_terms(
        contract_value: api::scalar::Decimal,
        terms: Vec<api::payment::TermInput>,
        ctx: &Context,
    ) -> Result<api::payment::TermsCheck, Error> {
        let contract_value = contract_value.into();
        let terms = api::payment::TermInput::into_drafts(terms, ctx)?;
        ctx.service()
            .execute(query::ValidatePaymentTerms {
                contract_value,
                terms,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|res| api::payment::TermsCheck::new(res, contract_value))
    }

    /// Returns vendors used in `WorkOrder`s before, most recently used first.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `INVALID_HISTORY_LIMIT` - the `limit` is not positive.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "vendorHistory",
            limit = ?limit,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn vendor_history(
        limit: Option<i32>,
        ctx: &Context,
    ) -> Result<Vec<api::work_order::VendorDetails>, Error> {
        let limit = history_limit(limit, ctx)?;
        ctx.service()
            .execute(query::history::VendorsUsed::by(
                read::history::Vendors { limit },
            ))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|h| h.into_iter().map(Into::into).collect())
    }

    /// Returns projects used in `WorkOrder`s before, most recently used
    /// first.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `INVALID_HISTORY_LIMIT` - the `limit` is not positive.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "projectHistory",
            limit = ?limit,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn project_history(
        limit: Option<i32>,
        ctx: &Context,
    ) -> Result<Vec<api::work_order::Project>, Error> {
        let limit = history_limit(limit, ctx)?;
        ctx.service()
            .execute(query::history::ProjectsUsed::by(
                read::history::Projects { limit },
            ))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|h| h.into_iter().map(Into::into).collect())
    }

    /// Opens the vendor portal with the provided access token.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `INVALID_VENDOR_ACCESS_TOKEN` - no `Vendor` holds the token.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "vendorPortal",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn vendor_portal(
        token: api::vendor::AccessToken,
        ctx: &Context,
    ) -> Result<api::vendor::Portal, Error> {
        ctx.service()
            .execute(query::VendorPortal {
                token: token.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| VendorError::InvalidToken.into())
            .map_err(ctx.error())
            .map(Into::into)
    }
}

/// Converts the requested history `limit`, falling back to the
/// [`Query::HISTORY_LIMIT`].
fn history_limit(limit: Option<i32>, ctx: &Context) -> Result<usize, Error> {
    usize::try_from(limit.unwrap_or(Query::HISTORY_LIMIT))
        .ok()
        .filter(|l| *l > 0)
        .ok_or_else(|| HistoryError::InvalidLimit.into())
        .map_err(ctx.error())
}

define_error! {
    enum HistoryError {
        #[code = "INVALID_HISTORY_LIMIT"]
        #[status = BAD_REQUEST]
        #[message = "History limit must be positive"]
        InvalidLimit,
    }
}

define_error! {
    enum VendorError {
        #[code = "INVALID_VENDOR_ACCESS_TOKEN"]
        #[status = NOT_FOUND]
        #[message = "Vendor access token is invalid"]
        InvalidToken,
    }
}
