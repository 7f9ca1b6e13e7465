//! [`Command`] for granting a [`TrackingConsent`].

use common::operations::{By, Insert, Select};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        freight,
        tracking_consent,
        user::{self, Role},
        Freight, TrackingConsent, User,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for granting a location-sharing [`TrackingConsent`] on a
/// [`Freight`] by a driver.
///
/// Granting it again is a no-op.
#[derive(Clone, Copy, Debug)]
pub struct GrantTrackingConsent {
    /// ID of the [`Freight`] to share the location on.
    pub freight_id: freight::Id,

    /// ID of the driver [`User`] granting.
    pub initiator_id: user::Id,
}

impl<Db> Command<GrantTrackingConsent> for Service<Db>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Freight>, freight::Id>>,
            Ok = Option<Freight>,
            Err = Traced<database::Error>,
        > + Database<
            Insert<TrackingConsent>,
            Ok = (),
            Err = Traced<database::Error>,
        >,
{
    type Ok = TrackingConsent;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: GrantTrackingConsent,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let GrantTrackingConsent {
            freight_id,
            initiator_id,
        } = cmd;

        let driver = self
            .database()
            .execute(Select(By::<Option<User>, _>::new(initiator_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(initiator_id))
            .map_err(tracerr::wrap!())?;
        if driver.role != Role::Driver {
            return Err(tracerr::new!(E::NotDriver(driver.id)));
        }

        let freight = self
            .database()
            .execute(Select(By::<Option<Freight>, _>::new(freight_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::FreightNotExists(freight_id))
            .map_err(tracerr::wrap!())?;

        let consent = TrackingConsent {
            freight_id: freight.id,
            driver_id: driver.id,
            granted_at: tracking_consent::GrantDateTime::now(),
        };
        self.database()
            .execute(Insert(consent))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(consent)
    }
}

/// Error of [`GrantTrackingConsent`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Freight`] with the provided ID does not exist.
    #[display("`Freight(id: {_0})` does not exist")]
    #[from(ignore)]
    FreightNotExists(#[error(not(source))] freight::Id),

    /// [`User`] is not a driver.
    #[display("`User(id: {_0})` is not a driver")]
    #[from(ignore)]
    NotDriver(#[error(not(source))] user::Id),

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    #[from(ignore)]
    UserNotExists(#[error(not(source))] user::Id),
}
