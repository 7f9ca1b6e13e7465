//! [`Query`] collection related to a single [`User`].

use common::operations::By;

use crate::domain::{freight, user, TrackingConsent, User};
#[cfg(doc)]
use crate::{domain::Freight, Query};

use super::DatabaseQuery;

/// Queries a [`User`] by its [`user::Id`].
pub type ById = DatabaseQuery<By<Option<User>, user::Id>>;

/// Queries a [`TrackingConsent`] a driver [`User`] granted on a [`Freight`].
pub type TrackingConsentOn =
    DatabaseQuery<By<Option<TrackingConsent>, (freight::Id, user::Id)>>;
