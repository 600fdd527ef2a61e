//! [`WorkOrder`] definitions.

pub mod number;

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, Date, DateTimeOf, Money};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use uuid::Uuid;

use crate::domain::{
    contact::{Email, PersonName, Phone},
    vendor,
};

pub use self::number::{DateSegment, Number, Prefix};

/// Work order ("SPK") issued to a vendor.
#[derive(Clone, Debug)]
pub struct WorkOrder {
    /// ID of this [`WorkOrder`].
    pub id: Id,

    /// Document [`Number`] of this [`WorkOrder`].
    pub number: Number,

    /// [`VendorDetails`] this [`WorkOrder`] is issued to.
    pub vendor: VendorDetails,

    /// [`Project`] this [`WorkOrder`] is issued for.
    pub project: Project,

    /// Total value of this [`WorkOrder`].
    pub contract_value: Money,

    /// [`Date`] the work starts on.
    pub start_date: Date,

    /// [`Date`] the work is expected to end on.
    pub end_date: Option<Date>,

    /// [`Status`] of this [`WorkOrder`].
    pub status: Status,

    /// Person in charge of this [`WorkOrder`] on the issuer side.
    pub pic: Pic,

    /// [`Notes`] to this [`WorkOrder`].
    pub notes: Option<Notes>,

    /// [`SignatureUrl`] of this [`WorkOrder`].
    pub signature_url: Option<SignatureUrl>,

    /// [`DateTime`] when this [`WorkOrder`] was published.
    pub published_at: Option<PublicationDateTime>,

    /// [`DateTime`] when this [`WorkOrder`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`WorkOrder`] was last modified.
    pub updated_at: ModificationDateTime,
}

impl WorkOrder {
    /// Indicates whether this [`WorkOrder`] may still be edited.
    #[must_use]
    pub fn is_draft(&self) -> bool {
        self.status == Status::Draft
    }

    /// Publishes this [`WorkOrder`].
    ///
    /// Returns `false` if it has been published already, leaving it intact.
    pub fn publish(&mut self) -> bool {
        if !self.is_draft() {
            return false;
        }
        let now = DateTimeOf::<()>::now();
        self.status = Status::Published;
        self.published_at = Some(now.coerce());
        self.updated_at = now.coerce();
        true
    }
}

/// ID of a [`WorkOrder`].
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
    #[doc = "Status of a [`WorkOrder`]."]
    enum Status {
        #[doc = "Editable, not visible to the vendor."]
        Draft = 1,

        #[doc = "Frozen and visible in the vendor portal."]
        Published = 2,
    }
}

/// Vendor a [`WorkOrder`] is issued to, as written on the document.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VendorDetails {
    /// [`vendor::Name`] of the vendor.
    pub name: vendor::Name,

    /// [`Email`] of the vendor.
    pub email: Option<Email>,

    /// [`Phone`] of the vendor.
    pub phone: Option<Phone>,
}

/// Project a [`WorkOrder`] is issued for.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Project {
    /// [`ProjectName`] of the project.
    pub name: ProjectName,

    /// [`Notes`] describing the project.
    pub description: Option<Notes>,
}

/// Person in charge of a [`WorkOrder`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Pic {
    /// [`PersonName`] of the person.
    pub name: PersonName,

    /// [`Email`] of the person.
    pub email: Email,
}

/// Name of a [`Project`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct ProjectName(String);

impl ProjectName {
    /// Creates a new [`ProjectName`] out of the provided trimmed `name`.
    #[must_use]
    pub fn new(name: impl AsRef<str>) -> Option<Self> {
        let name = name.as_ref().trim();
        (!name.is_empty() && name.len() <= 256)
            .then(|| Self(name.to_owned()))
    }
}

impl std::str::FromStr for ProjectName {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `ProjectName`")
    }
}

/// Free-form multiline text.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Notes(String);

impl Notes {
    /// Creates new [`Notes`] out of the provided trimmed `text`.
    ///
    /// [`None`] is returned if it's blank, so an empty form field means "no
    /// notes".
    #[must_use]
    pub fn new(text: impl AsRef<str>) -> Option<Self> {
        let text = text.as_ref().trim();
        (!text.is_empty() && text.len() <= 10_000)
            .then(|| Self(text.to_owned()))
    }
}

/// Link to the signature image rendered on a [`WorkOrder`] document.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct SignatureUrl(String);

impl SignatureUrl {
    /// Creates a new [`SignatureUrl`] if the provided `url` is an HTTP(S)
    /// one.
    #[must_use]
    pub fn new(url: impl AsRef<str>) -> Option<Self> {
        let url = url.as_ref().trim();
        let rest = url
            .strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"))?;
        (!rest.is_empty() && !url.contains(char::is_whitespace))
            .then(|| Self(url.to_owned()))
    }
}

impl std::str::FromStr for SignatureUrl {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `SignatureUrl`")
    }
}

/// [`DateTime`] when a [`WorkOrder`] was created.
pub type CreationDateTime = DateTimeOf<(WorkOrder, unit::Creation)>;

/// [`DateTime`] when a [`WorkOrder`] was last modified.
pub type ModificationDateTime = DateTimeOf<(WorkOrder, unit::Modification)>;

/// [`DateTime`] when a [`WorkOrder`] was published.
pub type PublicationDateTime = DateTimeOf<(WorkOrder, unit::Publication)>;

#[cfg(test)]
mod spec {
    use super::{Notes, SignatureUrl};

    #[test]
    fn treats_blank_notes_as_none() {
        assert!(Notes::new(" \n ").is_none());
        assert_eq!(
            Notes::new(" Use safety gear\n").unwrap().to_string(),
            "Use safety gear",
        );
    }

    #[test]
    fn accepts_only_http_signature_urls() {
        assert!(SignatureUrl::new("https://cdn.example.com/sig.png").is_some());
        assert!(SignatureUrl::new("http://").is_none());
        assert!(SignatureUrl::new("ftp://example.com/sig.png").is_none());
        assert!(SignatureUrl::new("https://example.com/a b.png").is_none());
    }
}
