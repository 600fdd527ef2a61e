//! [`Query`] of the vendor portal contents.

use common::operations::{By, Select};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{vendor::AccessToken, work_order, Payment, Vendor, WorkOrder},
    infra::{database, Database},
    read::{
        self,
        work_order::{PublishedFor, WithPayments},
    },
    Service,
};

use super::Query;

/// [`Query`] of the [`read::vendor::Portal`] opened with an [`AccessToken`].
///
/// [`None`] is returned if no [`Vendor`] has the [`AccessToken`].
#[derive(Clone, Debug)]
pub struct VendorPortal {
    /// [`AccessToken`] the portal is opened with.
    pub token: AccessToken,
}

impl<Db> Query<VendorPortal> for Service<Db>
where
    Db: Database<
            Select<By<Option<Vendor>, AccessToken>>,
            Ok = Option<Vendor>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<WorkOrder>, PublishedFor>>,
            Ok = Vec<WorkOrder>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Payment>, work_order::Id>>,
            Ok = Vec<Payment>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = Option<read::vendor::Portal>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        VendorPortal { token }: VendorPortal,
    ) -> Result<Self::Ok, Self::Err> {
        let Some(vendor) = self
            .database()
            .execute(Select(By::<Option<Vendor>, _>::new(token)))
            .await
            .map_err(tracerr::wrap!())?
        else {
            log::debug!("vendor portal opened with unknown token");
            return Ok(None);
        };

        let Some(email) = vendor.email.clone() else {
            return Ok(Some(read::vendor::Portal {
                vendor,
                work_orders: vec![],
            }));
        };

        let orders = self
            .database()
            .execute(Select(By::<Vec<WorkOrder>, _>::new(PublishedFor(email))))
            .await
            .map_err(tracerr::wrap!())?;

        let mut work_orders = Vec::with_capacity(orders.len());
        for work_order in orders {
            let payments = self
                .database()
                .execute(Select(By::<Vec<Payment>, _>::new(work_order.id)))
                .await
                .map_err(tracerr::wrap!())?;
            work_orders.push(WithPayments {
                work_order,
                payments,
            });
        }

        Ok(Some(read::vendor::Portal {
            vendor,
            work_orders,
        }))
    }
}
