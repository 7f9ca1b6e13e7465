//! [`TrackingConsent`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf};

#[cfg(doc)]
use crate::domain::{Freight, User};
use crate::domain::{freight, user};

/// Consent of a driver to share their location while carrying a
/// [`Freight`].
#[derive(Clone, Copy, Debug)]
pub struct TrackingConsent {
    /// ID of the [`Freight`] the consent is given for.
    pub freight_id: freight::Id,

    /// ID of the driver [`User`] giving the consent.
    pub driver_id: user::Id,

    /// [`DateTime`] when the consent was given.
    pub granted_at: GrantDateTime,
}

/// [`DateTime`] when a [`TrackingConsent`] was given.
pub type GrantDateTime = DateTimeOf<(TrackingConsent, unit::Creation)>;
