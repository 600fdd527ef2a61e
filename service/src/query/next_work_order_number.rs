//! [`Query`] previewing the next [`Number`].

use common::operations::{By, Select};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::WorkOrder;
use crate::{
    domain::work_order::{DateSegment, Number},
    infra::{database, Database},
    Service,
};

use super::Query;

/// [`Query`] previewing the [`Number`] the next created [`WorkOrder`] would
/// get.
///
/// Nothing is reserved, so a concurrent creation may take it first.
#[derive(Clone, Copy, Debug)]
pub struct NextWorkOrderNumber;

impl<Db> Query<NextWorkOrderNumber> for Service<Db>
where
    Db: Database<
        Select<By<Vec<Number>, DateSegment>>,
        Ok = Vec<Number>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Number;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: NextWorkOrderNumber,
    ) -> Result<Self::Ok, Self::Err> {
        let config = self.config();
        let today = config.today();

        let issued = self
            .database()
            .execute(Select(By::new(DateSegment::new(
                &config.number_prefix,
                today,
            ))))
            .await
            .map_err(tracerr::wrap!())?;

        Ok(Number::allocate(&config.number_prefix, today, &issued))
    }
}
