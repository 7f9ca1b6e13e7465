//! Preconditions of bidding on a [`Freight`].

use derive_more::{Display, Error};

use crate::domain::{
    assignment, user, user::Role, Assignment, Freight, TrackingConsent, User,
};

use super::Status;

/// Reason a driver may not bid on a [`Freight`].
#[derive(Clone, Copy, Debug, Display, Eq, Error, PartialEq)]
pub enum Ineligibility {
    /// [`User`] is not a driver.
    #[display("`User(id: {_0})` is not a driver")]
    NotDriver(#[error(not(source))] user::Id),

    /// Driver profile has not passed onboarding yet.
    #[display("`User(id: {_0})` profile is not approved")]
    NotApproved(#[error(not(source))] user::Id),

    /// [`Freight`] is not on the market.
    #[display("`Freight` is {_0} and takes no bids")]
    NotBiddable(#[error(not(source))] Status),

    /// All the required trucks are assigned already.
    #[display("`Freight` is fully staffed")]
    FullyStaffed,

    /// Driver is assigned to the [`Freight`] already.
    #[display("`User(id: {_0})` is assigned already")]
    AlreadyAssigned(#[error(not(source))] user::Id),

    /// Driver has not consented to share the location for the [`Freight`].
    #[display("`User(id: {_0})` has not granted tracking consent")]
    NoTrackingConsent(#[error(not(source))] user::Id),

    /// Offer was decided already.
    #[display("offer is not pending anymore")]
    OfferNotPending,
}

/// Checks whether the provided `driver` may bid on the provided [`Freight`].
///
/// # Errors
///
/// With the first failed precondition.
pub fn check(
    freight: &Freight,
    driver: &User,
    consent: Option<&TrackingConsent>,
    assignments: &[Assignment],
) -> Result<(), Ineligibility> {
    use Ineligibility as I;

    if driver.role != Role::Driver {
        return Err(I::NotDriver(driver.id));
    }
    if !driver.is_approved {
        return Err(I::NotApproved(driver.id));
    }
    if !Status::BIDDABLE.contains(&freight.status) {
        return Err(I::NotBiddable(freight.status));
    }
    if freight.is_fully_staffed() {
        return Err(I::FullyStaffed);
    }
    if freight.is_occupied_by(driver.id)
        || assignments.iter().any(|a| {
            a.driver_id == driver.id
                && a.status == assignment::Status::Accepted
        })
    {
        return Err(I::AlreadyAssigned(driver.id));
    }
    if consent.map_or(true, |c| {
        c.freight_id != freight.id || c.driver_id != driver.id
    }) {
        return Err(I::NoTrackingConsent(driver.id));
    }
    Ok(())
}

#[cfg(test)]
mod spec {
    use common::Money;

    use crate::domain::{
        assignment,
        freight::{self, Status},
        tracking_consent,
        user::{self, Role},
        Assignment, TrackingConsent, User,
    };

    use super::{check, Ineligibility};

    fn driver() -> User {
        User {
            id: user::Id::new(),
            role: Role::Driver,
            name: user::Name::new("Joana").unwrap(),
            is_approved: true,
            company_id: None,
            created_at: user::CreationDateTime::now(),
        }
    }

    #[test]
    fn eligible_driver_passes() {
        let freight = freight::spec::freight(2);
        let driver = driver();
        let consent = TrackingConsent {
            freight_id: freight.id,
            driver_id: driver.id,
            granted_at: tracking_consent::GrantDateTime::now(),
        };

        assert_eq!(check(&freight, &driver, Some(&consent), &[]), Ok(()));
        assert_eq!(
            check(&freight, &driver, None, &[]),
            Err(Ineligibility::NoTrackingConsent(driver.id)),
        );
    }

    #[test]
    fn reports_first_failed_precondition() {
        let mut freight = freight::spec::freight(1);
        let mut driver = driver();
        let consent = TrackingConsent {
            freight_id: freight.id,
            driver_id: driver.id,
            granted_at: tracking_consent::GrantDateTime::now(),
        };

        driver.is_approved = false;
        assert_eq!(
            check(&freight, &driver, Some(&consent), &[]),
            Err(Ineligibility::NotApproved(driver.id)),
        );

        driver.is_approved = true;
        freight.status = Status::Accepted;
        assert_eq!(
            check(&freight, &driver, Some(&consent), &[]),
            Err(Ineligibility::NotBiddable(Status::Accepted)),
        );

        freight.status = Status::Open;
        let assignment = Assignment {
            id: assignment::Id::new(),
            freight_id: freight.id,
            driver_id: driver.id,
            company_id: None,
            status: assignment::Status::Accepted,
            agreed_price: "100BRL".parse::<Money>().unwrap(),
            created_at: assignment::CreationDateTime::now(),
            updated_at: assignment::ModificationDateTime::now(),
        };
        assert_eq!(
            check(&freight, &driver, Some(&consent), &[assignment]),
            Err(Ineligibility::AlreadyAssigned(driver.id)),
        );

        freight.required_trucks = 2;
        freight.accepted_trucks = 1;
        freight.occupant_ids = vec![driver.id];
        assert_eq!(
            check(&freight, &driver, Some(&consent), &[]),
            Err(Ineligibility::AlreadyAssigned(driver.id)),
        );

        driver.role = Role::Company;
        assert_eq!(
            check(&freight, &driver, Some(&consent), &[]),
            Err(Ineligibility::NotDriver(driver.id)),
        );
    }
}
