//! [`WorkOrder`] read model definitions.

use crate::domain::{contact::Email, Payment, WorkOrder};

/// [`WorkOrder`] together with its [`Payment`]s, ordered by their term order.
#[derive(Clone, Debug)]
pub struct WithPayments {
    /// The [`WorkOrder`] itself.
    pub work_order: WorkOrder,

    /// [`Payment`]s of the [`WorkOrder`].
    pub payments: Vec<Payment>,
}

/// Selector of the published [`WorkOrder`]s issued to the vendor with the
/// provided [`Email`], most recent first.
#[derive(Clone, Debug)]
pub struct PublishedFor(pub Email);

pub mod list {
    //! [`WorkOrder`]s list definitions.

    use std::{fmt, str::FromStr};

    use common::define_pagination;
    use derive_more::{From, Into};

    use crate::domain::{work_order, WorkOrder};

    define_pagination!(Cursor, Node, Filter);

    /// Node in a [`Connection`].
    pub type Node = WorkOrder;

    /// Cursor pointing to a specific [`WorkOrder`] in a list.
    ///
    /// Lists are ordered by creation time, newest first, with the ID
    /// breaking ties.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct Cursor {
        /// [`work_order::CreationDateTime`] of the [`WorkOrder`].
        pub created_at: work_order::CreationDateTime,

        /// ID of the [`WorkOrder`].
        pub id: work_order::Id,
    }

    impl From<&WorkOrder> for Cursor {
        fn from(wo: &WorkOrder) -> Self {
            Self {
                created_at: wo.created_at,
                id: wo.id,
            }
        }
    }

    impl fmt::Display for Cursor {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}~{}", self.created_at.to_rfc3339(), self.id)
        }
    }

    impl FromStr for Cursor {
        type Err = &'static str;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            let (at, id) = s.split_once('~').ok_or("invalid `Cursor`")?;
            Ok(Self {
                created_at: work_order::CreationDateTime::from_rfc3339(at)
                    .map_err(|_| "invalid `Cursor` date")?,
                id: id.parse().map_err(|_| "invalid `Cursor` ID")?,
            })
        }
    }

    /// Filter for [`Selector`].
    #[derive(Clone, Debug, Default)]
    pub struct Filter {
        /// [`work_order::Status`] to list only.
        pub status: Option<work_order::Status>,

        /// Text to fuzzy search for in numbers, vendor and project names.
        pub search: Option<String>,
    }

    /// Total count of [`WorkOrder`]s matching a [`Filter`].
    #[derive(Clone, Copy, Debug, Eq, From, Hash, Into, PartialEq)]
    pub struct TotalCount(i32);

    #[cfg(test)]
    mod spec {
        use common::DateTime;

        use crate::domain::work_order;

        use super::Cursor;

        #[test]
        fn cursor_survives_text_form() {
            let cursor = Cursor {
                created_at: DateTime::from_rfc3339("2026-01-21T03:04:05.123456Z")
                    .unwrap()
                    .coerce(),
                id: work_order::Id::new(),
            };

            assert_eq!(cursor.to_string().parse::<Cursor>(), Ok(cursor));
            assert!("2026-01-21T03:04:05Z".parse::<Cursor>().is_err());
        }
    }
}
