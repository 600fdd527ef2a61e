//! [`Handler`] abstraction.

use std::future::Future;

/// Asynchronous unit of work taking `Args` and producing a [`Result`].
///
/// Commands, queries, database operations and background tasks are all
/// expressed as [`Handler`]s of their argument types, so a single type may
/// handle many of them.
pub trait Handler<Args = ()> {
    /// Type of successful [`Handler`] result.
    type Ok;

    /// Type of this [`Handler`] error.
    type Err;

    /// Executes this [`Handler`] with the provided arguments.
    fn execute(
        &self,
        args: Args,
    ) -> impl Future<Output = Result<Self::Ok, Self::Err>>;
}
