//! Domain definitions.

pub mod contact;
pub mod payment;
pub mod vendor;
pub mod work_order;

pub use self::{payment::Payment, vendor::Vendor, work_order::WorkOrder};
