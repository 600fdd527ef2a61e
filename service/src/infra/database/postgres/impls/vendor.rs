//! [`Vendor`]-related [`Database`] implementations.

use common::operations::{By, Insert, Lock, Select};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{contact::Email, vendor, Vendor},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

/// Columns of the `vendors` table a [`Vendor`] is read from.
const COLUMNS: &str = "id, name, email, phone, access_token, created_at";

impl<C> Database<Select<By<Option<Vendor>, Email>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Vendor>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Vendor>, Email>>,
    ) -> Result<Self::Ok, Self::Err> {
        let email = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM vendors \
             WHERE LOWER(email) = LOWER($1::VARCHAR)"
        );
        self.query_opt(&sql, &[&email])
            .await
            .map_err(tracerr::wrap!())
            .map(|row| row.as_ref().map(vendor_from))
    }
}

impl<C> Database<Select<By<Option<Vendor>, vendor::AccessToken>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Vendor>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Vendor>, vendor::AccessToken>>,
    ) -> Result<Self::Ok, Self::Err> {
        let token = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM vendors \
             WHERE access_token = $1::VARCHAR"
        );
        self.query_opt(&sql, &[&token])
            .await
            .map_err(tracerr::wrap!())
            .map(|row| row.as_ref().map(vendor_from))
    }
}

impl<C> Database<Insert<Vendor>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(vendor): Insert<Vendor>,
    ) -> Result<Self::Ok, Self::Err> {
        let Vendor {
            id,
            name,
            email,
            phone,
            access_token,
            created_at,
        } = vendor;

        const SQL: &str = "\
            INSERT INTO vendors (\
                id, name, email, phone, access_token, created_at \
            ) VALUES (\
                $1::UUID, $2::VARCHAR, $3::VARCHAR, $4::VARCHAR, \
                $5::VARCHAR, $6::TIMESTAMPTZ \
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET name = EXCLUDED.name, \
                email = EXCLUDED.email, \
                phone = EXCLUDED.phone, \
                access_token = EXCLUDED.access_token";
        self.exec(
            SQL,
            &[&id, &name, &email, &phone, &access_token, &created_at],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Lock<By<Vendor, Email>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Vendor, Email>>,
    ) -> Result<Self::Ok, Self::Err> {
        let email = by.into_inner();

        // Vendor may not exist yet, so its e-mail is locked rather than a row.
        const SQL: &str = "\
            SELECT pg_advisory_xact_lock(\
                hashtext('vendors:' || LOWER($1::VARCHAR))\
            )";
        self.exec(SQL, &[&email])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

/// Reads a [`Vendor`] out of the provided [`Row`] selected with [`COLUMNS`].
fn vendor_from(row: &Row) -> Vendor {
    Vendor {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        phone: row.get("phone"),
        access_token: row.get("access_token"),
        created_at: row.get("created_at"),
    }
}
