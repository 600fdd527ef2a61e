//! [`Command`] for issuing a [`Vendor`] an [`AccessToken`].

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        contact::{Email, Phone},
        vendor::{self, AccessToken},
        Vendor,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for issuing a [`Vendor`] an [`AccessToken`] to the vendor
/// portal.
///
/// The [`Vendor`] is created if none is known by the [`Email`] yet. An
/// already issued [`AccessToken`] is reused.
#[derive(Clone, Debug)]
pub struct IssueVendorToken {
    /// [`vendor::Name`] to create the [`Vendor`] with.
    pub name: vendor::Name,

    /// [`Email`] identifying the [`Vendor`].
    pub email: Email,

    /// [`Phone`] to create the [`Vendor`] with.
    pub phone: Option<Phone>,
}

impl<Db> Command<IssueVendorToken> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Vendor, Email>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Vendor>, Email>>,
            Ok = Option<Vendor>,
            Err = Traced<database::Error>,
        > + Database<Insert<Vendor>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = AccessToken;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: IssueVendorToken,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let token = ensure_access_token(&tx, cmd)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(token)
    }
}

/// Gets or creates the [`Vendor`] described by the provided
/// [`IssueVendorToken`], returning its [`AccessToken`].
///
/// Must run inside a transaction, as it [`Lock`]s the [`Email`].
pub(crate) async fn ensure_access_token<Tx>(
    tx: &Tx,
    details: IssueVendorToken,
) -> Result<AccessToken, Traced<database::Error>>
where
    Tx: Database<Lock<By<Vendor, Email>>, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<Vendor>, Email>>,
            Ok = Option<Vendor>,
            Err = Traced<database::Error>,
        > + Database<Insert<Vendor>, Err = Traced<database::Error>>,
{
    let IssueVendorToken { name, email, phone } = details;

    // Avoid concurrent creation of the same `Vendor`.
    tx.execute(Lock(By::new(email.clone())))
        .await
        .map_err(tracerr::wrap!())
        .map(drop)?;

    let existing = tx
        .execute(Select(By::<Option<Vendor>, _>::new(email.clone())))
        .await
        .map_err(tracerr::wrap!())?;

    if let Some(token) =
        existing.as_ref().and_then(|v| v.access_token.clone())
    {
        return Ok(token);
    }

    let token = AccessToken::generate();
    let vendor = if let Some(mut v) = existing {
        v.access_token = Some(token.clone());
        v
    } else {
        log::debug!("creating `Vendor` for `{email}`");
        Vendor {
            id: vendor::Id::new(),
            name,
            email: Some(email),
            phone,
            access_token: Some(token.clone()),
            created_at: DateTime::now().coerce(),
        }
    };

    tx.execute(Insert(vendor))
        .await
        .map_err(tracerr::wrap!())
        .map(drop)?;

    Ok(token)
}

/// Error of [`IssueVendorToken`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),
}
