//! [`WorkOrder`]-related [`Database`] implementations.

use common::{
    operations::{By, Delete, Insert, Lock, Select},
    Money,
};
use itertools::Itertools as _;
use postgres_types::ToSql;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{
        work_order::{self, DateSegment, Number, Pic, Project, VendorDetails},
        WorkOrder,
    },
    infra::{
        database::{
            self,
            postgres::{Connection, FuzzPattern},
            Postgres,
        },
        Database,
    },
    read::{
        self,
        history::{ProjectHistory, VendorHistory},
        work_order::list,
    },
};

/// Columns of the `work_orders` table a [`WorkOrder`] is read from.
const COLUMNS: &str = "\
    id, number, \
    vendor_name, vendor_email, vendor_phone, \
    project_name, project_description, \
    contract_value, currency, \
    start_date, end_date, \
    status, \
    pic_name, pic_email, \
    notes, signature_url, \
    published_at, created_at, updated_at";

impl<C> Database<Select<By<Vec<Number>, DateSegment>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Number>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Number>, DateSegment>>,
    ) -> Result<Self::Ok, Self::Err> {
        let segment = by.into_inner();
        let segment: &str = segment.as_ref();

        const SQL: &str = "\
            SELECT number \
            FROM work_orders \
            WHERE LEFT(number, LENGTH($1::VARCHAR)) = $1::VARCHAR";
        Ok(self
            .query(SQL, &[&segment])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| row.get("number"))
            .collect())
    }
}

impl<C> Database<Select<By<Option<WorkOrder>, work_order::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<WorkOrder>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<WorkOrder>, work_order::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: work_order::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM work_orders \
             WHERE id = $1::UUID"
        );
        self.query_opt(&sql, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(|row| row.as_ref().map(work_order_from))
    }
}

impl<C> Database<Select<By<Vec<WorkOrder>, read::work_order::PublishedFor>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<WorkOrder>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<WorkOrder>, read::work_order::PublishedFor>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::work_order::PublishedFor(email) = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM work_orders \
             WHERE LOWER(vendor_email) = LOWER($1::VARCHAR) \
               AND status = $2::INT2 \
             ORDER BY created_at DESC, id DESC"
        );
        Ok(self
            .query(&sql, &[&email, &work_order::Status::Published])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(work_order_from)
            .collect())
    }
}

impl<C> Database<Select<By<list::Page, list::Selector>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<list::Page, list::Selector>>,
    ) -> Result<Self::Ok, Self::Err> {
        let list::Selector { arguments, filter } = by.into_inner();

        let limit =
            i32::try_from(arguments.limit()).unwrap_or(i32::MAX - 1) + 1;
        let pattern = filter.search.as_deref().and_then(FuzzPattern::new);

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![&limit];

        let cursor_idx = arguments.cursor().map(|c| {
            ps.push(&c.created_at);
            ps.push(&c.id);
            ps.len() - 1
        });
        let status_idx = filter.status.as_ref().map(|s| {
            ps.push(s);
            ps.len()
        });
        let pattern_idx = pattern.as_ref().map(|p| {
            ps.push(p);
            ps.len()
        });

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM work_orders \
             WHERE true \
                   {cursor} \
                   {status} \
                   {search} \
             ORDER BY created_at {order}, id {order} \
             LIMIT $1::INT4",
            cursor = cursor_idx.into_iter().format_with("", |idx, f| {
                let op = arguments.kind().operator();
                f(&format_args!(
                    "AND (created_at, id) {op} \
                         (${idx}::TIMESTAMPTZ, ${}::UUID)",
                    idx + 1,
                ))
            }),
            status = status_idx.into_iter().format_with("", |idx, f| {
                f(&format_args!("AND status = ${idx}::INT2"))
            }),
            search = pattern_idx.into_iter().format_with("", |idx, f| {
                f(&format_args!(
                    "AND LOWER(number || ' ' || vendor_name || ' ' || \
                               project_name) \
                         SIMILAR TO LOWER(${idx}::VARCHAR)"
                ))
            }),
            order = arguments.kind().order().sql(),
        );
        let rows = self
            .query(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())?;

        let has_more = rows.len() > arguments.limit();
        let edges = rows
            .iter()
            .take(arguments.limit())
            .map(|row| {
                let wo = work_order_from(row);
                (list::Cursor::from(&wo), wo)
            })
            .collect::<Vec<_>>();

        Ok(list::Page::new(&arguments, edges, has_more))
    }
}

impl<C> Database<Select<By<list::TotalCount, list::Filter>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = list::TotalCount;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<list::TotalCount, list::Filter>>,
    ) -> Result<Self::Ok, Self::Err> {
        let list::Filter { status, search } = by.into_inner();
        let pattern = search.as_deref().and_then(FuzzPattern::new);

        const SQL: &str = "\
            SELECT COUNT(*)::INT4 \
            FROM work_orders \
            WHERE ($1::INT2 IS NULL OR status = $1::INT2) \
              AND ($2::VARCHAR IS NULL \
                   OR LOWER(number || ' ' || vendor_name || ' ' || \
                            project_name) \
                      SIMILAR TO LOWER($2::VARCHAR))";
        self.query_opt(SQL, &[&status, &pattern])
            .await
            .map_err(tracerr::wrap!())
            .map(|row| row.map_or(0, |r| r.get::<_, i32>(0)).into())
    }
}

impl<C> Database<Select<By<VendorHistory, read::history::Vendors>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = VendorHistory;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<VendorHistory, read::history::Vendors>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::history::Vendors { limit } = by.into_inner();
        let limit = i32::try_from(limit).unwrap_or(i32::MAX);

        const SQL: &str = "\
            SELECT vendor_name, vendor_email, vendor_phone \
            FROM (SELECT DISTINCT ON (LOWER(vendor_name)) \
                         vendor_name, vendor_email, vendor_phone, \
                         created_at \
                  FROM work_orders \
                  ORDER BY LOWER(vendor_name), created_at DESC) AS h \
            ORDER BY created_at DESC \
            LIMIT $1::INT4";
        Ok(self
            .query(SQL, &[&limit])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| VendorDetails {
                name: row.get("vendor_name"),
                email: row.get("vendor_email"),
                phone: row.get("vendor_phone"),
            })
            .collect())
    }
}

impl<C> Database<Select<By<ProjectHistory, read::history::Projects>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = ProjectHistory;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<ProjectHistory, read::history::Projects>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::history::Projects { limit } = by.into_inner();
        let limit = i32::try_from(limit).unwrap_or(i32::MAX);

        const SQL: &str = "\
            SELECT project_name, project_description \
            FROM (SELECT DISTINCT ON (LOWER(project_name)) \
                         project_name, project_description, created_at \
                  FROM work_orders \
                  ORDER BY LOWER(project_name), created_at DESC) AS h \
            ORDER BY created_at DESC \
            LIMIT $1::INT4";
        Ok(self
            .query(SQL, &[&limit])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| Project {
                name: row.get("project_name"),
                description: row.get("project_description"),
            })
            .collect())
    }
}

impl<C> Database<Insert<WorkOrder>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(wo): Insert<WorkOrder>,
    ) -> Result<Self::Ok, Self::Err> {
        let WorkOrder {
            id,
            number,
            vendor,
            project,
            contract_value,
            start_date,
            end_date,
            status,
            pic,
            notes,
            signature_url,
            published_at,
            created_at,
            updated_at,
        } = wo;

        const SQL: &str = "\
            INSERT INTO work_orders (\
                id, number, \
                vendor_name, vendor_email, vendor_phone, \
                project_name, project_description, \
                contract_value, currency, \
                start_date, end_date, \
                status, \
                pic_name, pic_email, \
                notes, signature_url, \
                published_at, created_at, updated_at \
            ) VALUES (\
                $1::UUID, $2::VARCHAR, \
                $3::VARCHAR, $4::VARCHAR, $5::VARCHAR, \
                $6::VARCHAR, $7::TEXT, \
                $8::NUMERIC, $9::INT2, \
                $10::DATE, $11::DATE, \
                $12::INT2, \
                $13::VARCHAR, $14::VARCHAR, \
                $15::TEXT, $16::TEXT, \
                $17::TIMESTAMPTZ, $18::TIMESTAMPTZ, $19::TIMESTAMPTZ \
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET vendor_name = EXCLUDED.vendor_name, \
                vendor_email = EXCLUDED.vendor_email, \
                vendor_phone = EXCLUDED.vendor_phone, \
                project_name = EXCLUDED.project_name, \
                project_description = EXCLUDED.project_description, \
                contract_value = EXCLUDED.contract_value, \
                currency = EXCLUDED.currency, \
                start_date = EXCLUDED.start_date, \
                end_date = EXCLUDED.end_date, \
                status = EXCLUDED.status, \
                pic_name = EXCLUDED.pic_name, \
                pic_email = EXCLUDED.pic_email, \
                notes = EXCLUDED.notes, \
                signature_url = EXCLUDED.signature_url, \
                published_at = EXCLUDED.published_at, \
                updated_at = EXCLUDED.updated_at";
        self.exec(
            SQL,
            &[
                &id,
                &number,
                &vendor.name,
                &vendor.email,
                &vendor.phone,
                &project.name,
                &project.description,
                &contract_value.amount,
                &contract_value.currency,
                &start_date,
                &end_date,
                &status,
                &pic.name,
                &pic.email,
                &notes,
                &signature_url,
                &published_at,
                &created_at,
                &updated_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Delete<By<WorkOrder, work_order::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<WorkOrder, work_order::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: work_order::Id = by.into_inner();

        // `payments` are removed by the `ON DELETE CASCADE`.
        const SQL: &str = "\
            DELETE FROM work_orders \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Lock<By<WorkOrder, work_order::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<WorkOrder, work_order::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: work_order::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM work_orders \
            WHERE id = $1::UUID \
            FOR UPDATE";
        self.query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

/// Reads a [`WorkOrder`] out of the provided [`Row`] selected with
/// [`COLUMNS`].
fn work_order_from(row: &Row) -> WorkOrder {
    WorkOrder {
        id: row.get("id"),
        number: row.get("number"),
        vendor: VendorDetails {
            name: row.get("vendor_name"),
            email: row.get("vendor_email"),
            phone: row.get("vendor_phone"),
        },
        project: Project {
            name: row.get("project_name"),
            description: row.get("project_description"),
        },
        contract_value: Money {
            amount: row.get("contract_value"),
            currency: row.get("currency"),
        },
        start_date: row.get("start_date"),
        end_date: row.get("end_date"),
        status: row.get("status"),
        pic: Pic {
            name: row.get("pic_name"),
            email: row.get("pic_email"),
        },
        notes: row.get("notes"),
        signature_url: row.get("signature_url"),
        published_at: row.get("published_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
