//! [`Vendor`]-related definitions.

use common::DateTime;
use derive_more::{AsRef, Display, From, Into};
use juniper::{graphql_object, GraphQLScalar};
use service::{domain, read};
use uuid::Uuid;

use crate::{
    api::{self, scalar},
    Context,
};

/// Contractor work orders are issued to.
#[derive(Clone, Debug, From)]
pub struct Vendor(domain::Vendor);

/// Contractor work orders are issued to.
#[graphql_object(context = Context)]
impl Vendor {
    /// Unique identifier of this `Vendor`.
    pub fn id(&self) -> Id {
        self.0.id.into()
    }

    /// Name of this `Vendor`.
    pub fn name(&self) -> Name {
        self.0.name.clone().into()
    }

    /// E-mail identifying this `Vendor`.
    pub fn email(&self) -> Option<api::contact::Email> {
        self.0.email.clone().map(Into::into)
    }

    /// Phone of this `Vendor`.
    pub fn phone(&self) -> Option<api::contact::Phone> {
        self.0.phone.clone().map(Into::into)
    }

    /// `DateTime` when this `Vendor` was first seen.
    pub fn created_at(&self) -> DateTime {
        self.0.created_at.coerce()
    }
}

/// Unique identifier of a `Vendor`.
#[derive(Clone, Copy, Debug, Display, Into, From, GraphQLScalar)]
#[from(domain::vendor::Id)]
#[into(domain::vendor::Id)]
#[graphql(name = "VendorId", transparent)]
pub struct Id(Uuid);

/// Name of a `Vendor`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(name = "VendorName", with = scalar::Via::<domain::vendor::Name>)]
pub struct Name(domain::vendor::Name);

/// Opaque token granting a `Vendor` access to the vendor portal.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "VendorAccessToken",
    with = scalar::Via::<domain::vendor::AccessToken>,
)]
pub struct AccessToken(domain::vendor::AccessToken);

/// Access to the vendor portal issued to a `Vendor`.
#[derive(Clone, Debug)]
pub struct Access {
    /// Issued [`AccessToken`].
    pub token: AccessToken,

    /// Link to the vendor portal carrying the [`AccessToken`].
    pub link: String,
}

impl Access {
    /// Creates a new [`Access`] for the provided [`AccessToken`].
    ///
    /// [`AccessToken`]: domain::vendor::AccessToken
    #[must_use]
    pub fn new(token: domain::vendor::AccessToken, ctx: &Context) -> Self {
        Self {
            link: ctx.service().config().vendor_portal_link(&token),
            token: token.into(),
        }
    }
}

/// Access to the vendor portal issued to a `Vendor`.
#[graphql_object(name = "VendorAccess", context = Context)]
impl Access {
    /// Token granting the access.
    pub fn token(&self) -> &AccessToken {
        &self.token
    }

    /// Link to the vendor portal carrying the `token`.
    pub fn link(&self) -> &str {
        &self.link
    }
}

/// Contents of the vendor portal.
#[derive(Clone, Debug, From)]
pub struct Portal(read::vendor::Portal);

/// Contents of the vendor portal.
#[graphql_object(name = "VendorPortal", context = Context)]
impl Portal {
    /// `Vendor` the portal is opened by.
    pub fn vendor(&self) -> Vendor {
        self.0.vendor.clone().into()
    }

    /// Published `WorkOrder`s issued to the `Vendor`, most recent first.
    pub fn work_orders(&self) -> Vec<api::WorkOrder> {
        self.0.work_orders.iter().cloned().map(Into::into).collect()
    }
}
