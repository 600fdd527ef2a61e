//! [`Payment`] definitions.

pub mod term;

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, Date, DateTimeOf};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use uuid::Uuid;

use crate::domain::{contact, work_order};
#[cfg(doc)]
use crate::domain::WorkOrder;

pub use self::term::Term;

/// Tracked installment of a [`WorkOrder`].
#[derive(Clone, Debug)]
pub struct Payment {
    /// ID of this [`Payment`].
    pub id: Id,

    /// ID of the [`WorkOrder`] this [`Payment`] belongs to.
    pub work_order_id: work_order::Id,

    /// Resolved [`Term`] this [`Payment`] tracks.
    pub term: Term,

    /// [`Status`] of this [`Payment`].
    pub status: Status,

    /// [`Date`] this [`Payment`] was paid on.
    pub paid_date: Option<Date>,

    /// [`Reference`] of the bank transfer this [`Payment`] was paid with.
    pub reference: Option<Reference>,

    /// [`DateTime`] when this [`Payment`] was last modified.
    pub updated_at: ModificationDateTime,

    /// Who last modified this [`Payment`].
    pub updated_by: contact::PersonName,
}

impl Payment {
    /// Creates a new [`Status::Pending`] [`Payment`] tracking the provided
    /// [`Term`].
    #[must_use]
    pub fn pending(
        work_order_id: work_order::Id,
        term: Term,
        by: contact::PersonName,
    ) -> Self {
        Self {
            id: Id::new(),
            work_order_id,
            term,
            status: Status::Pending,
            paid_date: None,
            reference: None,
            updated_at: ModificationDateTime::now(),
            updated_by: by,
        }
    }

    /// Indicates whether this [`Payment`] is past its due date as of the
    /// provided `today`.
    #[must_use]
    pub fn is_overdue(&self, today: Date) -> bool {
        self.status == Status::Pending
            && self.term.due_date.is_some_and(|d| d < today)
    }
}

/// ID of a [`Payment`].
#[derive(
    Clone, Copy, Debug, Default, Display, Eq, From, FromStr, Hash, Into, PartialEq,
)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

define_kind! {
    #[doc = "Status of a [`Payment`]."]
    enum Status {
        #[doc = "Awaiting the transfer."]
        Pending = 1,

        #[doc = "Transfer received."]
        Paid = 2,

        #[doc = "Due date passed without a transfer."]
        Overdue = 3,
    }
}

/// Bank transfer reference of a [`Payment`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Reference(String);

impl Reference {
    /// Creates a new [`Reference`] out of the provided trimmed `reference`.
    ///
    /// [`None`] is returned if it's blank or longer than 128 bytes.
    #[must_use]
    pub fn new(reference: impl AsRef<str>) -> Option<Self> {
        let reference = reference.as_ref().trim();
        (!reference.is_empty() && reference.len() <= 128)
            .then(|| Self(reference.to_owned()))
    }
}

impl std::str::FromStr for Reference {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `payment::Reference`")
    }
}

/// [`DateTime`] when a [`Payment`] was last modified.
pub type ModificationDateTime = DateTimeOf<(Payment, unit::Modification)>;

#[cfg(test)]
mod spec {
    use common::Date;
    use rust_decimal::Decimal;

    use crate::domain::{contact::PersonName, work_order};

    use super::{term, Payment, Status};

    fn payment(due_date: Option<Date>) -> Payment {
        let set = term::validate(
            Decimal::ONE_HUNDRED,
            &[term::Draft {
                name: "Final".into(),
                order: 1,
                input: term::Input::Percentage(Decimal::ONE_HUNDRED),
                due_date,
                description: None,
            }],
        )
        .unwrap();

        Payment::pending(
            work_order::Id::new(),
            set.into_terms().remove(0),
            PersonName::new("Admin User").unwrap(),
        )
    }

    #[test]
    fn becomes_overdue_after_due_date() {
        let due = Date::from_ymd(2026, 2, 1).unwrap();
        let p = payment(Some(due));

        assert!(!p.is_overdue(due));
        assert!(p.is_overdue(Date::from_ymd(2026, 2, 2).unwrap()));
        assert!(!payment(None).is_overdue(Date::from_ymd(2030, 1, 1).unwrap()));
    }

    #[test]
    fn paid_is_never_overdue() {
        let mut p = payment(Some(Date::from_ymd(2026, 2, 1).unwrap()));
        p.status = Status::Paid;

        assert!(!p.is_overdue(Date::from_ymd(2026, 3, 1).unwrap()));
    }
}
