//! Cancellation policy of a [`Freight`].

#[cfg(doc)]
use crate::domain::Freight;
use crate::domain::user::Role;

use super::Status;

/// Outcome of the cancellation policy for a [`Role`] in a [`Status`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Decision {
    /// [`Freight`] may be cancelled right away.
    DirectCancel,

    /// Freight owner must confirm the cancellation.
    RequestApproval,

    /// Cancellation is possible only through the platform support.
    ContactSupport,

    /// Cancellation is not possible.
    None,
}

/// Decides how a [`User`] with the provided [`Role`] may cancel a [`Freight`]
/// in the provided [`Status`].
///
/// [`User`]: crate::domain::User
#[must_use]
pub const fn decide(role: Role, status: Status) -> Decision {
    use Decision as D;
    use Status as S;

    match role {
        Role::Producer | Role::Admin => match status {
            S::Open | S::InNegotiation | S::Accepted => D::DirectCancel,
            S::Loading
            | S::Loaded
            | S::InTransit
            | S::DeliveredPendingConfirmation => D::ContactSupport,
            S::Delivered | S::Completed | S::Cancelled | S::Rejected => {
                D::None
            }
        },
        Role::Driver => match status {
            S::Accepted => D::DirectCancel,
            S::Loading
            | S::Loaded
            | S::InTransit
            | S::DeliveredPendingConfirmation => D::RequestApproval,
            S::Open
            | S::InNegotiation
            | S::Delivered
            | S::Completed
            | S::Cancelled
            | S::Rejected => D::None,
        },
        Role::Company => D::None,
    }
}

#[cfg(test)]
mod spec {
    use crate::domain::user::Role;

    use super::{decide, Decision, Status};

    #[test]
    fn decision_table() {
        use Decision as D;
        use Status as S;

        assert_eq!(decide(Role::Driver, S::InTransit), D::RequestApproval);
        assert_eq!(decide(Role::Producer, S::InTransit), D::ContactSupport);
        assert_eq!(decide(Role::Driver, S::Accepted), D::DirectCancel);
        assert_eq!(decide(Role::Driver, S::Open), D::None);
        assert_eq!(decide(Role::Producer, S::InNegotiation), D::DirectCancel);
        assert_eq!(decide(Role::Admin, S::Accepted), D::DirectCancel);
        assert_eq!(decide(Role::Admin, S::Loaded), D::ContactSupport);

        for status in Status::ALL {
            assert_eq!(decide(Role::Company, status), D::None, "{status}");
            if status.is_final() {
                for role in Role::ALL {
                    assert_eq!(
                        decide(*role, status),
                        D::None,
                        "{role} {status}",
                    );
                }
            }
        }
    }
}
