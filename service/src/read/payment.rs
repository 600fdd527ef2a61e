//! [`Payment`] read model definitions.

use common::Date;
use derive_more::{From, Into};

#[cfg(doc)]
use crate::domain::{payment::Status, Payment};

/// Selector of the [`Status::Pending`] [`Payment`]s due before the provided
/// [`Date`].
#[derive(Clone, Copy, Debug)]
pub struct DueBefore(pub Date);

/// Number of [`Payment`]s affected by an operation.
#[derive(Clone, Copy, Debug, Eq, From, Hash, Into, PartialEq)]
pub struct Affected(u64);
