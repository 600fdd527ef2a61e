//! [`Command`] for deleting a [`WorkOrder`].

use common::operations::{
    By, Commit, Delete, Lock, Select, Transact, Transacted,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

#[cfg(doc)]
use crate::domain::Payment;
use crate::{
    domain::{work_order, WorkOrder},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for deleting a [`WorkOrder`] along with its [`Payment`]s.
#[derive(Clone, Copy, Debug)]
pub struct DeleteWorkOrder {
    /// ID of the [`WorkOrder`] to delete.
    pub id: work_order::Id,
}

impl<Db> Command<DeleteWorkOrder> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<WorkOrder, work_order::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<WorkOrder>, work_order::Id>>,
            Ok = Option<WorkOrder>,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<WorkOrder, work_order::Id>>,
            Err = Traced<database::Error>,
        > + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = WorkOrder;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: DeleteWorkOrder,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteWorkOrder { id } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Lock(By::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let work_order = tx
            .execute(Select(By::<Option<WorkOrder>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::WorkOrderNotExists(id))
            .map_err(tracerr::wrap!())?;

        tx.execute(Delete(By::<WorkOrder, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!("deleted `WorkOrder` `{}`", work_order.number);

        Ok(work_order)
    }
}

/// Error of [`DeleteWorkOrder`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`WorkOrder`] with the provided ID does not exist.
    #[display("`WorkOrder(id: {_0})` does not exist")]
    WorkOrderNotExists(#[error(not(source))] work_order::Id),
}
