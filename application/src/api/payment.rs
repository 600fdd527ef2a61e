//! [`Payment`]-related definitions.

use common::{money::Currency, Date, DateTime, Money};
use derive_more::{AsRef, Display, From, Into};
use juniper::{
    graphql_object, GraphQLEnum, GraphQLInputObject, GraphQLObject,
    GraphQLScalar,
};
use service::domain::{self, payment::term};
use uuid::Uuid;

use crate::{
    api::{self, scalar},
    define_error, AsError as _, Context, Error,
};

/// Installment of a `WorkOrder` being tracked.
#[derive(Clone, Debug)]
pub struct Payment {
    /// Underlying [`domain::Payment`].
    payment: domain::Payment,

    /// [`Currency`] of the `WorkOrder` this [`Payment`] belongs to.
    currency: Currency,
}

impl Payment {
    /// Wraps the provided [`domain::Payment`] of a `WorkOrder` valued in the
    /// provided [`Currency`].
    #[must_use]
    pub fn new(payment: domain::Payment, currency: Currency) -> Self {
        Self { payment, currency }
    }
}

/// Installment of a `WorkOrder` being tracked.
#[graphql_object(context = Context)]
impl Payment {
    /// Unique identifier of this `Payment`.
    pub fn id(&self) -> Id {
        self.payment.id.into()
    }

    /// ID of the `WorkOrder` this `Payment` belongs to.
    pub fn work_order_id(&self) -> api::work_order::Id {
        self.payment.work_order_id.into()
    }

    /// Name of the payment term, like `Down Payment`.
    pub fn name(&self) -> &str {
        self.payment.term.name.as_ref()
    }

    /// 1-based position of this `Payment` within its `WorkOrder`.
    pub fn order(&self) -> i32 {
        self.payment.term.order.get().into()
    }

    /// How the amount of this `Payment` is derived.
    pub fn input(&self) -> TermInputValue {
        self.payment.term.input.into()
    }

    /// Resolved amount of this `Payment`.
    pub fn amount(&self) -> Money {
        Money {
            amount: self.payment.term.amount,
            currency: self.currency,
        }
    }

    /// `Date` this `Payment` is due on.
    pub fn due_date(&self) -> Option<Date> {
        self.payment.term.due_date
    }

    /// Description of the payment term.
    pub fn description(&self) -> Option<&str> {
        self.payment.term.description.as_ref().map(AsRef::as_ref)
    }

    /// Status of this `Payment`.
    pub fn status(&self) -> Status {
        self.payment.status.into()
    }

    /// Indicator whether this `Payment` is past its due date while still
    /// pending.
    pub fn is_overdue(&self, ctx: &Context) -> bool {
        self.payment.is_overdue(ctx.service().config().today())
    }

    /// `Date` this `Payment` was paid on.
    pub fn paid_date(&self) -> Option<Date> {
        self.payment.paid_date
    }

    /// Bank transfer reference this `Payment` was paid with.
    pub fn reference(&self) -> Option<Reference> {
        self.payment.reference.clone().map(Into::into)
    }

    /// `DateTime` when this `Payment` was last modified.
    pub fn updated_at(&self) -> DateTime {
        self.payment.updated_at.coerce()
    }

    /// Who last modified this `Payment`.
    pub fn updated_by(&self) -> api::contact::PersonName {
        self.payment.updated_by.clone().into()
    }
}

/// Unique identifier of a `Payment`.
#[derive(Clone, Copy, Debug, Display, Into, From, GraphQLScalar)]
#[from(domain::payment::Id)]
#[into(domain::payment::Id)]
#[graphql(name = "PaymentId", transparent)]
pub struct Id(Uuid);

/// Bank transfer reference of a `Payment`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "PaymentReference",
    with = scalar::Via::<domain::payment::Reference>,
)]
pub struct Reference(domain::payment::Reference);

/// Status of a `Payment`.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "PaymentStatus")]
pub enum Status {
    /// Awaiting the transfer.
    Pending,

    /// Transfer received.
    Paid,

    /// Due date passed without a transfer.
    Overdue,
}

impl From<domain::payment::Status> for Status {
    fn from(status: domain::payment::Status) -> Self {
        use domain::payment::Status as S;
        match status {
            S::Pending => Self::Pending,
            S::Paid => Self::Paid,
            S::Overdue => Self::Overdue,
        }
    }
}

impl From<Status> for domain::payment::Status {
    fn from(status: Status) -> Self {
        match status {
            Status::Pending => Self::Pending,
            Status::Paid => Self::Paid,
            Status::Overdue => Self::Overdue,
        }
    }
}

/// Kind of a payment term amount.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "PaymentTermInputKind")]
pub enum TermInputKind {
    /// Share of the contract value, in percents.
    Percentage,

    /// Exact amount, independent of the contract value.
    FixedAmount,
}

/// How the amount of a payment term is derived.
#[derive(Clone, Copy, Debug, GraphQLObject)]
#[graphql(name = "PaymentTermInputValue")]
pub struct TermInputValue {
    /// Kind of the amount.
    pub kind: TermInputKind,

    /// Percentage or exact amount, depending on the `kind`.
    pub value: scalar::Decimal,
}

impl From<term::Input> for TermInputValue {
    fn from(input: term::Input) -> Self {
        let (kind, value) = match input {
            term::Input::Percentage(p) => (TermInputKind::Percentage, p),
            term::Input::FixedAmount(a) => (TermInputKind::FixedAmount, a),
        };
        Self {
            kind,
            value: value.into(),
        }
    }
}

/// Payment term as submitted in a form.
#[derive(Clone, Debug, GraphQLInputObject)]
#[graphql(name = "PaymentTermInput")]
pub struct TermInput {
    /// Name of the term, like `Down Payment`.
    pub name: String,

    /// 1-based position of the term within its set.
    pub order: i32,

    /// Kind of the amount.
    pub kind: TermInputKind,

    /// Percentage or exact amount, depending on the `kind`.
    pub value: scalar::Decimal,

    /// `Date` the installment is due on.
    pub due_date: Option<Date>,

    /// Description of the term.
    pub description: Option<String>,
}

impl TermInput {
    /// Converts the provided [`TermInput`]s into [`term::Draft`]s.
    ///
    /// # Errors
    ///
    /// With `PAYMENT_TERM_ORDER_OUT_OF_RANGE` if some order doesn't fit into
    /// the supported range.
    pub fn into_drafts(
        inputs: Vec<Self>,
        ctx: &Context,
    ) -> Result<Vec<term::Draft>, Error> {
        inputs
            .into_iter()
            .map(|i| {
                let order = u16::try_from(i.order)
                    .ok()
                    .filter(|o| *o <= term::Order::MAX)
                    .ok_or_else(|| TermError::OrderOutOfRange.into())
                    .map_err(ctx.error())?;
                let value = i.value.into();
                Ok(term::Draft {
                    name: i.name,
                    order,
                    input: match i.kind {
                        TermInputKind::Percentage => {
                            term::Input::Percentage(value)
                        }
                        TermInputKind::FixedAmount => {
                            term::Input::FixedAmount(value)
                        }
                    },
                    due_date: i.due_date,
                    description: i.description,
                })
            })
            .collect()
    }
}

/// Payment term resolved against a contract value.
#[derive(Clone, Debug)]
pub struct ResolvedTerm(term::Term);

/// Payment term resolved against a contract value.
#[graphql_object(name = "ResolvedPaymentTerm", context = Context)]
impl ResolvedTerm {
    /// Name of this term.
    pub fn name(&self) -> &str {
        self.0.name.as_ref()
    }

    /// 1-based position of this term within its set.
    pub fn order(&self) -> i32 {
        self.0.order.get().into()
    }

    /// How the amount of this term is derived, normalized.
    pub fn input(&self) -> TermInputValue {
        self.0.input.into()
    }

    /// Resolved amount of this term.
    pub fn amount(&self) -> scalar::Decimal {
        self.0.amount.into()
    }

    /// `Date` this term is due on.
    pub fn due_date(&self) -> Option<Date> {
        self.0.due_date
    }
}

/// Outcome of reconciling payment terms against a contract value.
#[derive(Clone, Debug)]
pub struct TermsCheck {
    /// Reconciled terms, or the reason they don't reconcile.
    result: Result<term::TermSet, term::Invalid>,

    /// Contract value the terms were reconciled against.
    contract_value: rust_decimal::Decimal,
}

impl TermsCheck {
    /// Wraps the provided reconciliation `result` of terms checked against
    /// the provided `contract_value`.
    #[must_use]
    pub const fn new(
        result: Result<term::TermSet, term::Invalid>,
        contract_value: rust_decimal::Decimal,
    ) -> Self {
        Self {
            result,
            contract_value,
        }
    }
}

/// Outcome of reconciling payment terms against a contract value.
#[graphql_object(name = "PaymentTermsCheck", context = Context)]
impl TermsCheck {
    /// Indicator whether the terms reconcile.
    pub fn is_valid(&self) -> bool {
        self.result.is_ok()
    }

    /// Computed total of the terms.
    ///
    /// Sum of the resolved amounts, or the sum of percentages if the
    /// `errorCode` is `PAYMENT_TERMS_PERCENTAGE_MISMATCH`. Absent if the
    /// terms are rejected before any total is computed.
    pub fn total(&self) -> Option<scalar::Decimal> {
        use term::Invalid as E;

        match &self.result {
            Ok(set) => Some(set.total()),
            Err(
                E::TotalMismatch { total, .. }
                | E::PercentageTotalMismatch { total, .. },
            ) => Some(*total),
            Err(_) => None,
        }
        .map(Into::into)
    }

    /// Total the `total` is expected to match.
    ///
    /// The contract value, or `100` if the `errorCode` is
    /// `PAYMENT_TERMS_PERCENTAGE_MISMATCH`.
    pub fn expected(&self) -> scalar::Decimal {
        match &self.result {
            Err(term::Invalid::PercentageTotalMismatch { expected, .. }) => {
                *expected
            }
            _ => self.contract_value,
        }
        .into()
    }

    /// Resolved terms, if they reconcile.
    pub fn terms(&self) -> Vec<ResolvedTerm> {
        self.result
            .as_ref()
            .map(|set| set.terms().iter().cloned().map(ResolvedTerm).collect())
            .unwrap_or_default()
    }

    /// Error code explaining why the terms don't reconcile.
    pub fn error_code(&self) -> Option<&str> {
        self.result.as_ref().err().map(|e| e.as_error().code)
    }

    /// Human-readable message explaining why the terms don't reconcile.
    pub fn error_message(&self) -> Option<String> {
        self.result.as_ref().err().map(ToString::to_string)
    }
}

define_error! {
    enum TermError {
        #[code = "PAYMENT_TERM_ORDER_OUT_OF_RANGE"]
        #[status = BAD_REQUEST]
        #[message = "Payment term order must be within `[1, 32767]` range"]
        OrderOutOfRange,
    }
}

#[cfg(test)]
mod spec {
    use rust_decimal::Decimal;
    use service::domain::payment::term;

    use super::TermsCheck;

    fn draft(order: u16, input: term::Input) -> term::Draft {
        term::Draft {
            name: format!("Term {order}"),
            order,
            input,
            due_date: None,
            description: None,
        }
    }

    fn check(value: Decimal, drafts: &[term::Draft]) -> TermsCheck {
        TermsCheck::new(term::validate(value, drafts), value)
    }

    #[test]
    fn explains_unreconciled_terms() {
        let check = check(
            Decimal::ONE_HUNDRED,
            &[
                draft(1, term::Input::Percentage(Decimal::TEN)),
                draft(2, term::Input::Percentage(Decimal::TEN)),
            ],
        );

        assert!(!check.is_valid());
        assert_eq!(check.error_code(), Some("PAYMENT_TERMS_PERCENTAGE_MISMATCH"));
        assert!(check.terms().is_empty());
        assert_eq!(
            check.total().map(Decimal::from),
            Some(Decimal::new(20, 0)),
        );
        assert_eq!(Decimal::from(check.expected()), Decimal::ONE_HUNDRED);
    }

    #[test]
    fn exposes_both_totals_of_amount_mismatch() {
        let check = check(
            Decimal::new(500, 0),
            &[
                draft(1, term::Input::FixedAmount(Decimal::ONE_HUNDRED)),
                draft(2, term::Input::Percentage(Decimal::TEN)),
            ],
        );

        assert_eq!(check.error_code(), Some("PAYMENT_TERMS_TOTAL_MISMATCH"));
        assert_eq!(
            check.total().map(Decimal::from),
            Some(Decimal::new(150, 0)),
        );
        assert_eq!(Decimal::from(check.expected()), Decimal::new(500, 0));
    }

    #[test]
    fn omits_total_of_structurally_invalid_terms() {
        let check = check(Decimal::ONE_HUNDRED, &[]);

        assert_eq!(check.error_code(), Some("PAYMENT_TERMS_EMPTY"));
        assert_eq!(check.total().map(Decimal::from), None);
        assert_eq!(Decimal::from(check.expected()), Decimal::ONE_HUNDRED);
    }

    #[test]
    fn lists_resolved_terms() {
        let check = check(
            Decimal::ONE_HUNDRED,
            &[
                draft(1, term::Input::FixedAmount(Decimal::TEN)),
                draft(2, term::Input::Percentage(Decimal::new(90, 0))),
            ],
        );

        assert!(check.is_valid());
        assert_eq!(check.error_code(), None);
        assert_eq!(check.terms().len(), 2);
        assert_eq!(
            check.total().map(Decimal::from),
            Some(Decimal::ONE_HUNDRED),
        );
    }
}
