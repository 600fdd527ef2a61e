//! Contact details shared by vendors and persons in charge.

use derive_more::{AsRef, Display, From, Into};
use juniper::GraphQLScalar;
use service::domain::contact;

use crate::api::scalar;

/// E-mail address.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(with = scalar::Via::<contact::Email>)]
pub struct Email(contact::Email);

/// Phone number, optionally starting with `+`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(with = scalar::Via::<contact::Phone>)]
pub struct Phone(contact::Phone);

/// Full name of a person.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(with = scalar::Via::<contact::PersonName>)]
pub struct PersonName(contact::PersonName);
