//! Background environment running long-lived [`Task`]s.

use std::{
    error::Error,
    future::{Future, IntoFuture},
};

use derive_more::Display;
use futures::{
    future::{self, LocalBoxFuture},
    FutureExt as _, TryFutureExt as _,
};
use tokio::task;

#[cfg(doc)]
use crate::Task;

/// Background environment running long-lived [`Task`]s on a single thread.
///
/// Resolves once every spawned [`Task`] finishes, or with the first
/// [`Failed`] one.
#[derive(Debug, Default)]
pub struct Background {
    /// Local set the [`Task`]s are spawned onto.
    set: task::LocalSet,

    /// Spawned [`Task`]s along with their names.
    tasks: Vec<(&'static str, task::JoinHandle<Result<(), Box<dyn Error>>>)>,
}

impl Background {
    /// Spawns the provided [`Task`] future under the provided `name`.
    pub fn spawn<F, E>(&mut self, name: &'static str, future: F)
    where
        F: Future<Output = Result<(), E>> + 'static,
        E: Error + 'static,
    {
        let handle = self
            .set
            .spawn_local(future.map_err(Box::<dyn Error>::from));
        self.tasks.push((name, handle));
    }
}

impl IntoFuture for Background {
    type Output = Result<(), Failed>;
    type IntoFuture = LocalBoxFuture<'static, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        let Self { set, tasks } = self;

        let tasks = tasks.into_iter().map(|(name, handle)| {
            handle
                .map(move |res| {
                    res.map_err(Box::<dyn Error>::from)
                        .and_then(|r| r)
                        .map_err(|source| Failed { task: name, source })
                })
                .boxed_local()
        });

        future::try_join(set.map(Ok), future::try_join_all(tasks))
            .map_ok(drop)
            .boxed_local()
    }
}

/// [`Task`] spawned in a [`Background`] that failed or panicked.
#[derive(Debug, Display)]
#[display("`{task}` task failed: {source}")]
pub struct Failed {
    /// Name of the failed [`Task`].
    pub task: &'static str,

    /// Cause of the failure.
    pub source: Box<dyn Error>,
}

impl Error for Failed {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&*self.source)
    }
}
