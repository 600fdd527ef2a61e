//! Marker types for [`DateTimeOf`].
//!
//! [`DateTimeOf`]: crate::DateTimeOf

/// Moment an entity was created.
#[derive(Clone, Copy, Debug)]
pub struct Creation;

/// Moment an entity was last modified.
#[derive(Clone, Copy, Debug)]
pub struct Modification;

/// Moment a work order was published.
#[derive(Clone, Copy, Debug)]
pub struct Publication;
