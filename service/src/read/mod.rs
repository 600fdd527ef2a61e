//! Read entities definitions.

pub mod history;
pub mod payment;
pub mod vendor;
pub mod work_order;
