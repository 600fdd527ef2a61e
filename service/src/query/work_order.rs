//! [`Query`] collection related to a single [`WorkOrder`].

use common::operations::By;

use crate::domain::{work_order, Payment, WorkOrder};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a [`WorkOrder`] by its [`work_order::Id`].
pub type ById = DatabaseQuery<By<Option<WorkOrder>, work_order::Id>>;

/// Queries [`Payment`]s of a [`WorkOrder`], in their term order.
pub type Payments = DatabaseQuery<By<Vec<Payment>, work_order::Id>>;
