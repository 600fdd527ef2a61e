//! [`Command`] definition.

pub mod create_work_order;
pub mod delete_work_order;
pub mod issue_vendor_token;
#[cfg(test)]
mod mock;
pub mod publish_work_order;
pub mod update_payment_status;
pub mod update_work_order;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    create_work_order::CreateWorkOrder, delete_work_order::DeleteWorkOrder,
    issue_vendor_token::IssueVendorToken,
    publish_work_order::PublishWorkOrder,
    update_payment_status::UpdatePaymentStatus,
    update_work_order::UpdateWorkOrder,
};
