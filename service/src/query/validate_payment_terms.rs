//! [`Query`] reconciling payment terms without persisting anything.

use std::convert::Infallible;

use rust_decimal::Decimal;

use crate::{domain::payment::term, Service};

use super::Query;

/// [`Query`] checking whether the provided [`term::Draft`]s reconcile with
/// a contract value.
///
/// Used for the live feedback while the terms are being edited.
#[derive(Clone, Debug)]
pub struct ValidatePaymentTerms {
    /// Contract value to reconcile against.
    pub contract_value: Decimal,

    /// [`term::Draft`]s to reconcile.
    pub terms: Vec<term::Draft>,
}

impl<Db> Query<ValidatePaymentTerms> for Service<Db> {
    type Ok = Result<term::TermSet, term::Invalid>;
    type Err = Infallible;

    async fn execute(
        &self,
        query: ValidatePaymentTerms,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(term::validate(query.contract_value, &query.terms))
    }
}
