//! Abstract operations a [`Handler`] may be executed with.

use std::marker::PhantomData;

use crate::Handler;

/// Operation inserting a new value.
#[derive(Clone, Copy, Debug)]
pub struct Insert<T>(pub T);

/// Operation overwriting an existing value.
#[derive(Clone, Copy, Debug)]
pub struct Update<T>(pub T);

/// Operation deleting a value.
#[derive(Clone, Copy, Debug)]
pub struct Delete<T>(pub T);

/// Operation selecting a value.
#[derive(Clone, Copy, Debug)]
pub struct Select<T>(pub T);

/// Operation selecting a value and locking it until the end of the current
/// transaction.
#[derive(Clone, Copy, Debug)]
pub struct Lock<T>(pub T);

/// Operation starting a long-running value, like a background task.
#[derive(Clone, Copy, Debug)]
pub struct Start<T>(pub T);

/// Operation performing a single run of a value.
#[derive(Clone, Copy, Debug)]
pub struct Perform<T>(pub T);

/// Operation opening a new transaction.
#[derive(Clone, Copy, Debug)]
pub struct Transact;

/// [`Transact`]ed value.
pub type Transacted<T> = <T as Handler<Transact>>::Ok;

/// Operation committing the current transaction.
#[derive(Clone, Copy, Debug)]
pub struct Commit;

/// Selector of `W` by `B`.
#[derive(Clone, Copy, Debug)]
pub struct By<W, B> {
    /// Type of the value being selected.
    _what: PhantomData<W>,

    /// Value to select by.
    by: B,
}

impl<W, B> By<W, B> {
    /// Creates a new [`By`] with the given value.
    #[must_use]
    pub fn new(by: B) -> Self {
        Self {
            _what: PhantomData,
            by,
        }
    }

    /// Returns a reference to the value to select by.
    #[must_use]
    pub fn by(&self) -> &B {
        &self.by
    }

    /// Consumes this [`By`] and returns the inner value.
    #[must_use]
    pub fn into_inner(self) -> B {
        self.by
    }
}
