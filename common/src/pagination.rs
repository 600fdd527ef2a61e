//! Cursor-based pagination.

/// Page of nodes selected by some [`Arguments`].
#[derive(Clone, Debug)]
pub struct Connection<C, I> {
    /// [`Edge`]s on this page, in the order they should be displayed.
    pub edges: Vec<Edge<C, I>>,

    /// [`Kind`] of the pagination this page was selected with.
    pub kind: Kind,

    /// Indicator whether more nodes exist past this page.
    pub has_more: bool,
}

/// A page in a [`Connection`].
pub type Page<C, I> = Connection<C, I>;

impl<C, I> Connection<C, I> {
    /// Creates a new [`Connection`] from the provided [`Edge`]s.
    ///
    /// Backward pages are selected in reversed order, so their [`Edge`]s are
    /// flipped back here.
    #[must_use]
    pub fn new(
        args: &Arguments<C>,
        edges: impl IntoIterator<Item = impl Into<Edge<C, I>>>,
        has_more: bool,
    ) -> Self {
        let kind = args.kind();
        let mut edges = edges.into_iter().map(Into::into).collect::<Vec<_>>();
        if kind == Kind::Backward {
            edges.reverse();
        }
        Self {
            edges,
            kind,
            has_more,
        }
    }

    /// Returns [`PageInfo`] of this [`Connection`].
    #[must_use]
    pub fn page_info(&self) -> PageInfo<C>
    where
        C: Clone,
    {
        PageInfo {
            start_cursor: self.edges.first().map(|e| e.cursor.clone()),
            end_cursor: self.edges.last().map(|e| e.cursor.clone()),
            has_next_page: self.has_more && self.kind == Kind::Forward,
            has_previous_page: self.has_more && self.kind == Kind::Backward,
        }
    }
}

/// Information about a page in a [`Connection`].
#[derive(Clone, Copy, Debug)]
pub struct PageInfo<C> {
    /// First cursor on this page.
    pub start_cursor: Option<C>,

    /// Last cursor on this page.
    pub end_cursor: Option<C>,

    /// Indicator whether [`Connection`] has a next page.
    pub has_next_page: bool,

    /// Indicator whether [`Connection`] has a previous page.
    pub has_previous_page: bool,
}

/// An edge in a [`Connection`].
#[derive(Clone, Copy, Debug)]
pub struct Edge<C, I> {
    /// Cursor of this [`Edge`].
    pub cursor: C,

    /// Node of this [`Edge`].
    pub node: I,
}

impl<C, I> From<(C, I)> for Edge<C, I> {
    fn from((cursor, node): (C, I)) -> Self {
        Self { cursor, node }
    }
}

/// Pagination arguments.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Arguments<C> {
    /// Forward pagination.
    Forward {
        /// Number of items to return.
        first: usize,

        /// Cursor after which to return items.
        after: Option<C>,
    },

    /// Backward pagination.
    Backward {
        /// Number of items to return.
        last: usize,

        /// Cursor before which to return items.
        before: Option<C>,
    },
}

impl<C> Arguments<C> {
    /// Creates new [`Arguments`] out of the raw GraphQL-style parameters.
    ///
    /// [`None`] is returned if the parameters mix both directions, or if a
    /// count doesn't fit into [`usize`].
    pub fn new<Num>(
        first: Option<Num>,
        after: Option<C>,
        last: Option<Num>,
        before: Option<C>,
        default: Num,
    ) -> Option<Self>
    where
        Num: TryInto<usize>,
    {
        Some(match (first, after, last, before) {
            (first, after, None, None) => Self::Forward {
                first: first.unwrap_or(default).try_into().ok()?,
                after,
            },
            (None, None, Some(last), before) => Self::Backward {
                last: last.try_into().ok()?,
                before,
            },
            _ => return None,
        })
    }

    /// Returns cursor requested by this [`Arguments`].
    #[must_use]
    pub fn cursor(&self) -> Option<&C> {
        match self {
            Self::Forward { after, .. } => after.as_ref(),
            Self::Backward { before, .. } => before.as_ref(),
        }
    }

    /// Returns [`Kind`] of pagination this [`Arguments`] requests.
    pub fn kind(&self) -> Kind {
        match self {
            Self::Forward { .. } => Kind::Forward,
            Self::Backward { .. } => Kind::Backward,
        }
    }

    /// Returns limit requested by this [`Arguments`].
    #[must_use]
    pub fn limit(&self) -> usize {
        match *self {
            Self::Forward { first, .. } => first,
            Self::Backward { last, .. } => last,
        }
    }
}

/// Pagination selector.
#[derive(Clone, Debug)]
pub struct Selector<C, F> {
    /// Pagination [`Arguments`].
    pub arguments: Arguments<C>,

    /// Additional filter being applied to the result.
    pub filter: F,
}

/// Kind of pagination.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Kind {
    /// Forward pagination.
    Forward,

    /// Backward pagination.
    Backward,
}

impl Kind {
    /// Returns comparison operator representing this [`Kind`].
    ///
    /// Nodes are listed newest first, so "forward" walks towards smaller
    /// cursors.
    #[must_use]
    pub const fn operator(&self) -> &'static str {
        match self {
            Self::Forward => "<",
            Self::Backward => ">",
        }
    }

    /// Returns order representing this [`Kind`].
    #[must_use]
    pub const fn order(&self) -> Order {
        match self {
            Self::Forward => Order::Descending,
            Self::Backward => Order::Ascending,
        }
    }
}

/// Order of pagination.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Order {
    /// Ascending order.
    Ascending,

    /// Descending order.
    Descending,
}

impl Order {
    /// Returns SQL keyword representing this [`Order`].
    #[cfg(feature = "postgres")]
    #[must_use]
    pub const fn sql(&self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

/// Defines pagination types for the provided cursor, node and filter types.
#[expect(clippy::module_name_repetitions, reason = "more readable")]
#[macro_export]
macro_rules! define_pagination {
    ($cursor:ty, $node:ty, $filter:ty) => {
        #[doc = "Edge of a [`Connection`]."]
        pub type Edge = $crate::pagination::Edge<$cursor, $node>;

        #[doc = "A [`Connection`] of nodes."]
        pub type Connection = $crate::pagination::Connection<$cursor, $node>;

        #[doc = "A [`Page`] of nodes."]
        pub type Page = $crate::pagination::Page<$cursor, $node>;

        #[doc = "An information about a [`Page`]."]
        pub type PageInfo = $crate::pagination::PageInfo<$cursor>;

        #[doc = "Arguments for selecting a [`Page`]."]
        pub type Arguments = $crate::pagination::Arguments<$cursor>;

        #[doc = "[`Page`] selector."]
        pub type Selector = $crate::pagination::Selector<$cursor, $filter>;
    };
}

#[cfg(test)]
mod spec {
    use super::{Arguments, Connection, Kind};

    #[test]
    fn builds_arguments() {
        assert_eq!(
            Arguments::<u8>::new(None, None, None, None, 10),
            Some(Arguments::Forward {
                first: 10,
                after: None,
            }),
        );
        assert_eq!(
            Arguments::new(Some(3), Some(7), None, None, 10),
            Some(Arguments::Forward {
                first: 3,
                after: Some(7),
            }),
        );
        assert_eq!(
            Arguments::new(None, None, Some(2), Some(7), 10),
            Some(Arguments::Backward {
                last: 2,
                before: Some(7),
            }),
        );

        assert_eq!(Arguments::<u8>::new(Some(1), None, Some(1), None, 10), None);
        assert_eq!(Arguments::<u8>::new(Some(-1), None, None, None, 10), None);
    }

    #[test]
    fn reverses_backward_page() {
        let args = Arguments::Backward {
            last: 2,
            before: Some(1),
        };
        let page = Connection::<u8, &str>::new(&args, [(2, "b"), (3, "c")], true);

        assert_eq!(page.kind, Kind::Backward);
        assert_eq!(
            page.edges.iter().map(|e| e.cursor).collect::<Vec<_>>(),
            [3, 2],
        );

        let info = page.page_info();
        assert_eq!(info.start_cursor, Some(3));
        assert_eq!(info.end_cursor, Some(2));
        assert!(info.has_previous_page);
        assert!(!info.has_next_page);
    }
}
