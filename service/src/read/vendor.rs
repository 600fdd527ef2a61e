//! [`Vendor`] read model definitions.

use crate::{domain::Vendor, read::work_order::WithPayments};

/// Everything the vendor portal shows to a [`Vendor`].
#[derive(Clone, Debug)]
pub struct Portal {
    /// [`Vendor`] the portal is opened by.
    pub vendor: Vendor,

    /// Published work orders issued to the [`Vendor`], most recent first.
    pub work_orders: Vec<WithPayments>,
}
