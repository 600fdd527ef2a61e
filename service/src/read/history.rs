//! Autocomplete history definitions.
//!
//! Histories are distinct (case-insensitively by name) and list the most
//! recently used entries first.

use crate::domain::{
    work_order::{Project, VendorDetails},
    WorkOrder,
};

/// Selector of [`VendorDetails`] previously used in [`WorkOrder`]s.
#[derive(Clone, Copy, Debug)]
pub struct Vendors {
    /// Maximum number of entries to return.
    pub limit: usize,
}

/// Selector of [`Project`]s previously used in [`WorkOrder`]s.
#[derive(Clone, Copy, Debug)]
pub struct Projects {
    /// Maximum number of entries to return.
    pub limit: usize,
}

/// [`VendorDetails`] history.
pub type VendorHistory = Vec<VendorDetails>;

/// [`Project`] history.
pub type ProjectHistory = Vec<Project>;
