//! [`Tx`] client definitions.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_postgres::{types::ToSql, Row, ToStatement};
use tracerr::Traced;

use crate::infra::database::{
    self,
    postgres::{self, connection, Connection},
};

use super::NonTx;

/// Transactional Postgres database client.
///
/// Clones share the same transaction. Once the last clone is dropped without
/// [`Tx::commit()`]ting, the transaction is rolled back.
#[derive(Clone, Debug)]
pub struct Tx {
    /// Open transaction, if not committed yet.
    inner: Arc<Mutex<Option<connection::Tx>>>,
}

impl Tx {
    /// Begins a new [`Tx`] on a connection of the provided [`NonTx`] client.
    ///
    /// # Errors
    ///
    /// If failed to check a connection out or to begin the transaction.
    pub async fn begin(client: &NonTx) -> Result<Self, Traced<database::Error>> {
        let conn = client.connection().await.map_err(tracerr::wrap!())?;
        let tx = connection::Tx::begin(conn)
            .await
            .map_err(tracerr::wrap!())?;
        Ok(Self {
            inner: Arc::new(Mutex::new(Some(tx))),
        })
    }

    /// Commits this [`Tx`] client.
    ///
    /// # Errors
    ///
    /// If the transaction is finished already or failed to commit.
    pub async fn commit(&self) -> Result<(), Traced<database::Error>> {
        self.inner
            .lock()
            .await
            .take()
            .ok_or_else(|| tracerr::new!(postgres::Error::TxFinished))
            .map_err(tracerr::map_from)?
            .commit()
            .await
            .map_err(tracerr::wrap!())
    }
}

impl Connection for Tx {
    async fn query<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<Row>, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        self.inner
            .lock()
            .await
            .as_ref()
            .ok_or_else(|| tracerr::new!(postgres::Error::TxFinished))
            .map_err(tracerr::map_from)?
            .query(stmt, params)
            .await
            .map_err(tracerr::wrap!())
    }

    async fn query_opt<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Option<Row>, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        self.inner
            .lock()
            .await
            .as_ref()
            .ok_or_else(|| tracerr::new!(postgres::Error::TxFinished))
            .map_err(tracerr::map_from)?
            .query_opt(stmt, params)
            .await
            .map_err(tracerr::wrap!())
    }

    async fn exec<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<u64, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        self.inner
            .lock()
            .await
            .as_ref()
            .ok_or_else(|| tracerr::new!(postgres::Error::TxFinished))
            .map_err(tracerr::map_from)?
            .exec(stmt, params)
            .await
            .map_err(tracerr::wrap!())
    }
}
