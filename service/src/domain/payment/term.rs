//! Payment [`Term`] reconciliation.
//!
//! A work order's contract value is split into installments. Every
//! installment is either a percentage of the contract value or a fixed
//! amount, and the resolved amounts must add up to the contract value.

use std::{collections::HashSet, num::NonZeroI16, str::FromStr};

use common::{Date, Percent};
use derive_more::{AsRef, Display, Error, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rust_decimal::Decimal;

/// Greatest difference between two amounts still considered equal.
pub const EPSILON: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// How the amount of a [`Term`] is derived.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Input {
    /// Share of the contract value, in percents.
    ///
    /// Values outside the `[0, 100]` range are clamped into it.
    Percentage(Decimal),

    /// Exact amount, independent of the contract value.
    FixedAmount(Decimal),
}

impl Input {
    /// Returns this [`Input`] with its percentage clamped into the `[0, 100]`
    /// range.
    #[must_use]
    pub fn normalized(self) -> Self {
        match self {
            Self::Percentage(p) => {
                Self::Percentage(Percent::saturating(p).value())
            }
            Self::FixedAmount(_) => self,
        }
    }

    /// Indicates whether this [`Input`] is a percentage.
    #[must_use]
    pub const fn is_percentage(&self) -> bool {
        matches!(self, Self::Percentage(_))
    }
}

/// Computes the amount the provided [`Input`] stands for.
///
/// [`None`] is returned if the amount doesn't fit into a [`Decimal`].
#[must_use]
pub fn resolve(contract_value: Decimal, input: &Input) -> Option<Decimal> {
    match *input {
        Input::Percentage(p) => Percent::saturating(p).of(contract_value),
        Input::FixedAmount(amount) => Some(amount),
    }
}

/// Unvalidated payment term, as submitted by a user.
#[derive(Clone, Debug, PartialEq)]
pub struct Draft {
    /// Free-form name, like `Down Payment`.
    pub name: String,

    /// 1-based position of the term within its set.
    pub order: u16,

    /// [`Input`] of the term amount.
    pub input: Input,

    /// Date the installment is due on.
    pub due_date: Option<Date>,

    /// Free-form description.
    pub description: Option<String>,
}

/// Validated payment term with its amount resolved.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Term {
    /// [`Name`] of this [`Term`].
    pub name: Name,

    /// [`Order`] of this [`Term`] within its [`TermSet`].
    pub order: Order,

    /// [`Input`] this [`Term`] was defined with, normalized.
    pub input: Input,

    /// Resolved amount of this [`Term`].
    pub amount: Decimal,

    /// Date this [`Term`] is due on.
    pub due_date: Option<Date>,

    /// [`Description`] of this [`Term`].
    pub description: Option<Description>,
}

impl From<Term> for Draft {
    fn from(term: Term) -> Self {
        Self {
            name: term.name.into(),
            order: term.order.get(),
            input: term.input,
            due_date: term.due_date,
            description: term.description.map(Into::into),
        }
    }
}

/// Set of [`Term`]s reconciled against a contract value.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TermSet {
    /// Reconciled [`Term`]s, in their input order.
    terms: Vec<Term>,

    /// Sum of all the [`Term`] amounts.
    total: Decimal,
}

impl TermSet {
    /// Returns the reconciled [`Term`]s.
    #[must_use]
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// Returns the sum of all the [`Term`] amounts.
    #[must_use]
    pub const fn total(&self) -> Decimal {
        self.total
    }

    /// Consumes this [`TermSet`] returning its [`Term`]s.
    #[must_use]
    pub fn into_terms(self) -> Vec<Term> {
        self.terms
    }
}

/// Reason a set of [`Draft`]s doesn't reconcile.
///
/// Indices point into the validated slice.
#[derive(Clone, Debug, Display, Error, Eq, PartialEq)]
pub enum Invalid {
    /// No terms at all.
    #[display("At least one payment term is required")]
    EmptyTermSet,

    /// A term has a blank name.
    #[display("Payment term at index {index} has an empty name")]
    EmptyName {
        /// Index of the offending term.
        index: usize,
    },

    /// A term has a name longer than [`Name::MAX_LEN`] characters.
    #[display(
        "Payment term at index {index} has a name longer than {} characters",
        Name::MAX_LEN
    )]
    NameTooLong {
        /// Index of the offending term.
        index: usize,
    },

    /// A term has order `0`.
    #[display("Payment term at index {index} has zero order")]
    ZeroOrder {
        /// Index of the offending term.
        index: usize,
    },

    /// A term has order greater than [`Order::MAX`].
    #[display(
        "Payment term at index {index} has order {order} greater than {}",
        Order::MAX
    )]
    OrderOutOfRange {
        /// Index of the offending term.
        index: usize,

        /// The offending order.
        order: u16,
    },

    /// A term reuses the order of a previous one.
    #[display("Payment term at index {index} duplicates order {order}")]
    DuplicateOrder {
        /// Index of the offending term.
        index: usize,

        /// The duplicated order.
        order: u16,
    },

    /// A fixed-amount term is negative.
    #[display("Payment term at index {index} has negative amount {amount}")]
    NegativeAmount {
        /// Index of the offending term.
        index: usize,

        /// The offending amount.
        amount: Decimal,
    },

    /// An amount or a sum of amounts doesn't fit into a [`Decimal`].
    #[display("Payment term amounts are too large")]
    AmountOverflow,

    /// Percentages of a percentage-only set don't sum up to `100`.
    #[display("Payment percentages sum up to {total}%, expected {expected}%")]
    PercentageTotalMismatch {
        /// Computed sum of percentages.
        total: Decimal,

        /// Expected sum of percentages.
        expected: Decimal,
    },

    /// Resolved amounts don't sum up to the contract value.
    #[display("Payment terms sum up to {total}, expected {expected}")]
    TotalMismatch {
        /// Computed sum of amounts.
        total: Decimal,

        /// Contract value.
        expected: Decimal,
    },
}

/// Validates the provided [`Draft`]s against the `contract_value`.
///
/// # Errors
///
/// With the first [`Invalid`] reason found. Structural problems of single
/// terms are reported before any sum mismatch.
pub fn validate(
    contract_value: Decimal,
    drafts: &[Draft],
) -> Result<TermSet, Invalid> {
    use Invalid as E;

    if drafts.is_empty() {
        return Err(E::EmptyTermSet);
    }

    let mut seen = HashSet::with_capacity(drafts.len());
    let mut terms = Vec::with_capacity(drafts.len());
    for (index, d) in drafts.iter().enumerate() {
        let name = Name::new(&d.name).ok_or_else(|| {
            if d.name.trim().is_empty() {
                E::EmptyName { index }
            } else {
                E::NameTooLong { index }
            }
        })?;
        let order = Order::new(d.order).ok_or(if d.order == 0 {
            E::ZeroOrder { index }
        } else {
            E::OrderOutOfRange {
                index,
                order: d.order,
            }
        })?;
        if !seen.insert(order) {
            return Err(E::DuplicateOrder {
                index,
                order: d.order,
            });
        }
        if let Input::FixedAmount(amount) = d.input {
            if amount.is_sign_negative() && !amount.is_zero() {
                return Err(E::NegativeAmount { index, amount });
            }
        }

        let input = d.input.normalized();
        terms.push(Term {
            name,
            order,
            input,
            amount: resolve(contract_value, &input)
                .ok_or(E::AmountOverflow)?,
            due_date: d.due_date,
            description: d.description.as_deref().and_then(Description::new),
        });
    }

    if terms.iter().all(|t| t.input.is_percentage()) {
        let total = terms
            .iter()
            .map(|t| match t.input {
                Input::Percentage(p) => p,
                Input::FixedAmount(_) => Decimal::ZERO,
            })
            .try_fold(Decimal::ZERO, Decimal::checked_add)
            .ok_or(E::AmountOverflow)?;
        if !approx_eq(total, Decimal::ONE_HUNDRED) {
            return Err(E::PercentageTotalMismatch {
                total,
                expected: Decimal::ONE_HUNDRED,
            });
        }
    }

    let total = terms
        .iter()
        .map(|t| t.amount)
        .try_fold(Decimal::ZERO, Decimal::checked_add)
        .ok_or(E::AmountOverflow)?;
    if !approx_eq(total, contract_value) {
        return Err(E::TotalMismatch {
            total,
            expected: contract_value,
        });
    }

    Ok(TermSet { terms, total })
}

/// Compares amounts with the [`EPSILON`] tolerance.
fn approx_eq(a: Decimal, b: Decimal) -> bool {
    a.checked_sub(b).is_some_and(|d| d.abs() < EPSILON)
}

/// Name of a [`Term`].
#[derive(AsRef, Clone, Debug, Display, Eq, Into, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Name(String);

impl Name {
    /// Maximum length of a [`Name`], in characters.
    pub const MAX_LEN: usize = 256;

    /// Creates a new [`Name`] out of the provided `name` with its surrounding
    /// whitespace trimmed.
    ///
    /// [`None`] is returned if nothing is left after trimming, or if the
    /// trimmed `name` is longer than [`Name::MAX_LEN`] characters.
    #[must_use]
    pub fn new(name: impl AsRef<str>) -> Option<Self> {
        let name = name.as_ref().trim();
        (!name.is_empty() && name.chars().count() <= Self::MAX_LEN)
            .then(|| Self(name.to_owned()))
    }
}

impl FromStr for Name {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `term::Name`")
    }
}

/// 1-based position of a [`Term`] within its [`TermSet`].
///
/// Always within the `[1, Order::MAX]` range, so it fits an `INT2` column.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Order(NonZeroI16);

impl Order {
    /// Greatest possible [`Order`].
    pub const MAX: u16 = i16::MAX.unsigned_abs();

    /// Creates a new [`Order`] if the provided one is within the
    /// `[1, Order::MAX]` range.
    #[must_use]
    pub fn new(order: u16) -> Option<Self> {
        i16::try_from(order).ok().and_then(Self::from_i16)
    }

    /// Creates a new [`Order`] out of its stored representation, if it's
    /// positive.
    #[must_use]
    pub fn from_i16(order: i16) -> Option<Self> {
        NonZeroI16::new(order).filter(|o| o.is_positive()).map(Self)
    }

    /// Returns the numeric value of this [`Order`].
    #[must_use]
    pub const fn get(self) -> u16 {
        self.0.get().unsigned_abs()
    }

    /// Returns the stored representation of this [`Order`].
    #[must_use]
    pub const fn to_i16(self) -> i16 {
        self.0.get()
    }
}

/// Description of a [`Term`].
#[derive(AsRef, Clone, Debug, Display, Eq, Into, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Description(String);

impl Description {
    /// Creates a new [`Description`] out of the provided trimmed `text`.
    ///
    /// [`None`] is returned if the `text` is blank.
    #[must_use]
    pub fn new(text: impl AsRef<str>) -> Option<Self> {
        let text = text.as_ref().trim();
        (!text.is_empty()).then(|| Self(text.to_owned()))
    }
}

#[cfg(test)]
mod spec {
    use rust_decimal::Decimal;

    use super::{validate, Draft, Input, Invalid};

    fn decimal(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn draft(order: u16, input: Input) -> Draft {
        Draft {
            name: format!("Term {order}"),
            order,
            input,
            due_date: None,
            description: None,
        }
    }

    fn percentage(order: u16, p: &str) -> Draft {
        draft(order, Input::Percentage(decimal(p)))
    }

    fn fixed(order: u16, amount: &str) -> Draft {
        draft(order, Input::FixedAmount(decimal(amount)))
    }

    #[test]
    fn resolves_percentages() {
        let set = validate(
            decimal("100000000"),
            &[
                percentage(1, "30"),
                percentage(2, "40"),
                percentage(3, "30"),
            ],
        )
        .unwrap();

        assert_eq!(
            set.terms().iter().map(|t| t.amount).collect::<Vec<_>>(),
            [decimal("30000000"), decimal("40000000"), decimal("30000000")],
        );
        assert_eq!(set.total(), decimal("100000000"));
    }

    #[test]
    fn rejects_fixed_amounts_not_summing_up() {
        assert_eq!(
            validate(decimal("100"), &[fixed(1, "40"), fixed(2, "40")]),
            Err(Invalid::TotalMismatch {
                total: decimal("80"),
                expected: decimal("100"),
            }),
        );
    }

    #[test]
    fn accepts_mixed_terms() {
        let set = validate(
            decimal("100"),
            &[percentage(1, "50"), fixed(2, "50")],
        )
        .unwrap();

        assert_eq!(set.terms()[0].amount, decimal("50"));
        assert_eq!(set.terms()[1].amount, decimal("50"));
    }

    #[test]
    fn rejects_percentages_not_summing_up() {
        assert_eq!(
            validate(
                decimal("100"),
                &[percentage(1, "30"), percentage(2, "60")],
            ),
            Err(Invalid::PercentageTotalMismatch {
                total: decimal("90"),
                expected: Decimal::ONE_HUNDRED,
            }),
        );
    }

    #[test]
    fn tolerates_sub_cent_difference() {
        assert!(validate(
            decimal("100"),
            &[fixed(1, "60"), fixed(2, "39.991")],
        )
        .is_ok());

        assert_eq!(
            validate(decimal("100"), &[fixed(1, "60"), fixed(2, "39.98")]),
            Err(Invalid::TotalMismatch {
                total: decimal("99.98"),
                expected: decimal("100"),
            }),
        );
    }

    #[test]
    fn reports_distinct_reasons() {
        let value = decimal("100");

        let mut blank = fixed(1, "100");
        blank.name = "  ".into();

        let reasons = [
            validate(value, &[]),
            validate(value, &[fixed(1, "50"), fixed(1, "50")]),
            validate(value, &[blank]),
            validate(value, &[fixed(1, "150"), fixed(2, "-50")]),
        ]
        .map(Result::unwrap_err);

        assert_eq!(reasons[0], Invalid::EmptyTermSet);
        assert_eq!(reasons[1], Invalid::DuplicateOrder { index: 1, order: 1 });
        assert_eq!(reasons[2], Invalid::EmptyName { index: 0 });
        assert_eq!(
            reasons[3],
            Invalid::NegativeAmount {
                index: 1,
                amount: decimal("-50"),
            },
        );
    }

    #[test]
    fn reports_structural_problems_first() {
        assert_eq!(
            validate(decimal("100"), &[fixed(1, "10"), fixed(0, "10")]),
            Err(Invalid::ZeroOrder { index: 1 }),
        );
    }

    #[test]
    fn clamps_out_of_range_percentages() {
        let set = validate(
            decimal("200"),
            &[percentage(1, "120"), percentage(2, "-5")],
        )
        .unwrap();

        assert_eq!(set.terms()[0].input, Input::Percentage(decimal("100")));
        assert_eq!(set.terms()[0].amount, decimal("200"));
        assert_eq!(set.terms()[1].amount, Decimal::ZERO);
    }

    #[test]
    fn rejects_too_long_names() {
        let mut long = fixed(1, "100");
        long.name = "A".repeat(300);
        let mut longest = fixed(1, "100");
        longest.name = "Ä".repeat(256);

        assert_eq!(
            validate(decimal("100"), &[long]),
            Err(Invalid::NameTooLong { index: 0 }),
        );
        assert!(validate(decimal("100"), &[longest]).is_ok());
    }

    #[test]
    fn rejects_orders_beyond_storable_range() {
        assert_eq!(
            validate(
                decimal("100"),
                &[fixed(40000, "50"), fixed(50000, "50")],
            ),
            Err(Invalid::OrderOutOfRange {
                index: 0,
                order: 40000,
            }),
        );
        assert!(validate(
            decimal("100"),
            &[fixed(1, "50"), fixed(32767, "50")],
        )
        .is_ok());
    }

    #[test]
    fn resolves_huge_amounts_without_panicking() {
        let huge = decimal("10000000000000000000000000000");

        let set = validate(huge, &[percentage(1, "100")]).unwrap();
        assert_eq!(set.total(), huge);

        assert_eq!(
            validate(
                Decimal::MAX,
                &[
                    fixed(1, &Decimal::MAX.to_string()),
                    fixed(2, &Decimal::MAX.to_string()),
                ],
            ),
            Err(Invalid::AmountOverflow),
        );
    }

    #[test]
    fn trims_names() {
        let mut d = fixed(1, "100");
        d.name = "  Down Payment ".into();

        let set = validate(decimal("100"), &[d]).unwrap();

        assert_eq!(set.terms()[0].name.to_string(), "Down Payment");
    }
}
