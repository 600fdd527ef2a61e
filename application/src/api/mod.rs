//! GraphQL API definitions.

pub mod contact;
mod mutation;
pub mod payment;
mod query;
pub mod scalar;
pub mod vendor;
pub mod work_order;

use juniper::EmptySubscription;

use crate::{define_error, Context};

pub use self::{
    mutation::Mutation, payment::Payment, query::Query, vendor::Vendor,
    work_order::WorkOrder,
};

/// GraphQL schema.
pub type Schema =
    juniper::RootNode<'static, Query, Mutation, EmptySubscription<Context>>;

define_error! {
    enum PaginationError {
        #[code = "AMBIGUOUS_PAGINATION_ARGUMENTS"]
        #[status = BAD_REQUEST]
        #[message = "Ambiguous pagination arguments"]
        Ambiguous,
    }
}

define_error! {
    enum WorkOrderError {
        #[code = "WORK_ORDER_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`WorkOrder` does not exist"]
        NotExists,

        #[code = "WORK_ORDER_ALREADY_PUBLISHED"]
        #[status = CONFLICT]
        #[message = "`WorkOrder` is published and cannot be edited"]
        AlreadyPublished,

        #[code = "WORK_ORDER_ENDS_BEFORE_START"]
        #[status = BAD_REQUEST]
        #[message = "`WorkOrder` cannot end before its start"]
        EndsBeforeStart,

        #[code = "WORK_ORDER_NEGATIVE_CONTRACT_VALUE"]
        #[status = BAD_REQUEST]
        #[message = "`WorkOrder` contract value must not be negative"]
        NegativeContractValue,

        #[code = "WORK_ORDER_NUMBER_OCCUPIED"]
        #[status = CONFLICT]
        #[message = "`WorkOrder` number already exists, please retry"]
        NumberOccupied,
    }
}
