//! [`Query`] collection related to the multiple [`WorkOrder`]s.

use common::operations::By;

use crate::read::work_order::list;
#[cfg(doc)]
use crate::{domain::WorkOrder, Query};

use super::DatabaseQuery;

/// Queries a list of [`WorkOrder`]s.
pub type List = DatabaseQuery<By<list::Page, list::Selector>>;

/// Queries total count of [`WorkOrder`] list items.
pub type TotalCount = DatabaseQuery<By<list::TotalCount, list::Filter>>;
