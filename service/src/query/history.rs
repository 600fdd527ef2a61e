//! [`Query`] collection of autocomplete histories.

use common::operations::By;

use crate::read::history::{ProjectHistory, Projects, VendorHistory, Vendors};
#[cfg(doc)]
use crate::{domain::WorkOrder, Query};

use super::DatabaseQuery;

/// Queries vendors previously used in [`WorkOrder`]s.
pub type VendorsUsed = DatabaseQuery<By<VendorHistory, Vendors>>;

/// Queries projects previously used in [`WorkOrder`]s.
pub type ProjectsUsed = DatabaseQuery<By<ProjectHistory, Projects>>;
