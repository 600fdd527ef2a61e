//! [`Payment`]-related [`Database`] implementations.

use common::operations::{By, Insert, Lock, Select, Update};
use rust_decimal::Decimal;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{
        payment::{
            self,
            term::{self, Input, Term},
        },
        work_order, Payment,
    },
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

/// Columns of the `payments` table a [`Payment`] is read from.
const COLUMNS: &str = "\
    id, work_order_id, \
    term_name, term_order, input_kind, input_value, amount, \
    due_date, description, \
    status, paid_date, reference, \
    updated_at, updated_by";

/// `input_kind` of a [`Input::Percentage`].
const PERCENTAGE: i16 = 1;

/// `input_kind` of a [`Input::FixedAmount`].
const FIXED_AMOUNT: i16 = 2;

impl<C> Database<Select<By<Vec<Payment>, work_order::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Payment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Payment>, work_order::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let work_order_id: work_order::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM payments \
             WHERE work_order_id = $1::UUID \
             ORDER BY term_order ASC"
        );
        Ok(self
            .query(&sql, &[&work_order_id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(payment_from)
            .collect())
    }
}

impl<C> Database<Select<By<Option<Payment>, payment::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Payment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Payment>, payment::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: payment::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM payments \
             WHERE id = $1::UUID"
        );
        self.query_opt(&sql, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(|row| row.as_ref().map(payment_from))
    }
}

impl<C> Database<Insert<Payment>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(payment): Insert<Payment>,
    ) -> Result<Self::Ok, Self::Err> {
        let Payment {
            id,
            work_order_id,
            term:
                Term {
                    name,
                    order,
                    input,
                    amount,
                    due_date,
                    description,
                },
            status,
            paid_date,
            reference,
            updated_at,
            updated_by,
        } = payment;

        let order = order.to_i16();
        let (input_kind, input_value) = match input {
            Input::Percentage(p) => (PERCENTAGE, p),
            Input::FixedAmount(a) => (FIXED_AMOUNT, a),
        };

        const SQL: &str = "\
            INSERT INTO payments (\
                id, work_order_id, \
                term_name, term_order, input_kind, input_value, amount, \
                due_date, description, \
                status, paid_date, reference, \
                updated_at, updated_by \
            ) VALUES (\
                $1::UUID, $2::UUID, \
                $3::VARCHAR, $4::INT2, $5::INT2, $6::NUMERIC, $7::NUMERIC, \
                $8::DATE, $9::TEXT, \
                $10::INT2, $11::DATE, $12::VARCHAR, \
                $13::TIMESTAMPTZ, $14::VARCHAR \
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET term_name = EXCLUDED.term_name, \
                term_order = EXCLUDED.term_order, \
                input_kind = EXCLUDED.input_kind, \
                input_value = EXCLUDED.input_value, \
                amount = EXCLUDED.amount, \
                due_date = EXCLUDED.due_date, \
                description = EXCLUDED.description, \
                status = EXCLUDED.status, \
                paid_date = EXCLUDED.paid_date, \
                reference = EXCLUDED.reference, \
                updated_at = EXCLUDED.updated_at, \
                updated_by = EXCLUDED.updated_by";
        self.exec(
            SQL,
            &[
                &id,
                &work_order_id,
                &name,
                &order,
                &input_kind,
                &input_value,
                &amount,
                &due_date,
                &description,
                &status,
                &paid_date,
                &reference,
                &updated_at,
                &updated_by,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Lock<By<Payment, payment::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Payment, payment::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: payment::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM payments \
            WHERE id = $1::UUID \
            FOR UPDATE";
        self.query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C>
    Database<Update<By<read::payment::Affected, read::payment::DueBefore>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = read::payment::Affected;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(by): Update<
            By<read::payment::Affected, read::payment::DueBefore>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::payment::DueBefore(today) = by.into_inner();

        const SQL: &str = "\
            UPDATE payments \
            SET status = $1::INT2, \
                updated_at = NOW() \
            WHERE status = $2::INT2 \
              AND due_date < $3::DATE";
        self.exec(
            SQL,
            &[&payment::Status::Overdue, &payment::Status::Pending, &today],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(Into::into)
    }
}

/// Reads a [`Payment`] out of the provided [`Row`] selected with
/// [`COLUMNS`].
fn payment_from(row: &Row) -> Payment {
    let value: Decimal = row.get("input_value");
    let input = if row.get::<_, i16>("input_kind") == PERCENTAGE {
        Input::Percentage(value)
    } else {
        Input::FixedAmount(value)
    };
    let order = term::Order::from_i16(row.get("term_order"))
        .expect("`term_order` is positive by `CHECK` constraint");

    Payment {
        id: row.get("id"),
        work_order_id: row.get("work_order_id"),
        term: Term {
            name: row.get("term_name"),
            order,
            input,
            amount: row.get("amount"),
            due_date: row.get("due_date"),
            description: row.get("description"),
        },
        status: row.get("status"),
        paid_date: row.get("paid_date"),
        reference: row.get("reference"),
        updated_at: row.get("updated_at"),
        updated_by: row.get("updated_by"),
    }
}
