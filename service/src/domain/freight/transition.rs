//! Conditional [`Transition`] of a [`Freight`].

use crate::domain::{freight, user, Freight};

use super::{Status, TruckCount};

/// Conditional write upon a [`Freight`]: the [`Change`] is applied only if
/// the current [`Freight`] state still matches the [`Expected`] one.
///
/// This is the only way a [`Freight`] state is mutated after its creation.
#[derive(Clone, Debug)]
pub struct Transition {
    /// ID of the [`Freight`] to transition.
    pub freight_id: freight::Id,

    /// State the [`Freight`] is expected to be in.
    pub expected: Expected,

    /// [`Change`] to apply.
    pub change: Change,
}

impl Transition {
    /// Creates a new [`Transition`] expecting the [`Freight`] to be in one
    /// of the provided [`Status`]es.
    #[must_use]
    pub fn new(
        freight_id: freight::Id,
        statuses: impl Into<Vec<Status>>,
        change: Change,
    ) -> Self {
        Self {
            freight_id,
            expected: Expected {
                statuses: statuses.into(),
                accepted_trucks: None,
            },
            change,
        }
    }

    /// Applies this [`Transition`] to the provided [`Freight`] if its
    /// predicate holds.
    ///
    /// Returns `false` and leaves the [`Freight`] untouched otherwise.
    pub fn apply_to(&self, freight: &mut Freight) -> bool {
        if freight.id != self.freight_id
            || !self.expected.matches(freight)
            || !self.change.is_applicable(freight)
        {
            return false;
        }
        self.change.apply(freight);
        true
    }
}

/// Expected state of a [`Freight`] in a [`Transition`].
#[derive(Clone, Debug)]
pub struct Expected {
    /// [`Status`]es the [`Freight`] may be in.
    pub statuses: Vec<Status>,

    /// Exact number of accepted trucks, if it matters.
    pub accepted_trucks: Option<TruckCount>,
}

impl Expected {
    /// Checks whether the provided [`Freight`] matches this [`Expected`]
    /// state.
    #[must_use]
    pub fn matches(&self, freight: &Freight) -> bool {
        self.statuses.contains(&freight.status)
            && self
                .accepted_trucks
                .map_or(true, |n| freight.accepted_trucks == n)
    }
}

/// Change of a [`Freight`] in a [`Transition`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Change {
    /// Sets the [`Status`].
    Status(Status),

    /// Occupies one free truck slot.
    ///
    /// A driver already occupying a slot can't occupy another one. The
    /// [`Freight`] becomes [`Status::Accepted`] once all slots are occupied.
    /// The driver and the company are recorded on the [`Freight`] itself
    /// only for a single-truck [`Freight`].
    Occupy {
        /// ID of the driver occupying the slot.
        driver_id: user::Id,

        /// ID of the company the driver works for, if any.
        company_id: Option<user::Id>,
    },

    /// Puts the [`Freight`] back on the market, clearing its assignment
    /// state.
    Reset,
}

impl Change {
    /// Checks the guard inherent to this [`Change`].
    #[must_use]
    pub fn is_applicable(&self, freight: &Freight) -> bool {
        match self {
            Self::Occupy { driver_id, .. } => {
                !freight.is_fully_staffed()
                    && !freight.is_occupied_by(*driver_id)
            }
            Self::Status(_) | Self::Reset => true,
        }
    }

    /// Applies this [`Change`] to the provided [`Freight`] unconditionally.
    pub fn apply(&self, freight: &mut Freight) {
        match *self {
            Self::Status(status) => freight.status = status,
            Self::Occupy {
                driver_id,
                company_id,
            } => {
                freight.accepted_trucks += 1;
                freight.occupant_ids.push(driver_id);
                if freight.required_trucks == 1 {
                    freight.driver_id = Some(driver_id);
                    freight.company_id = company_id;
                }
                if freight.is_fully_staffed() {
                    freight.status = Status::Accepted;
                }
            }
            Self::Reset => {
                freight.status = Status::Open;
                freight.driver_id = None;
                freight.company_id = None;
                freight.accepted_trucks = 0;
                freight.occupant_ids.clear();
            }
        }
        freight.updated_at = freight::ModificationDateTime::now();
    }
}

#[cfg(test)]
mod spec {
    use crate::domain::{freight, user};

    use super::{Change, Status, Transition};

    #[test]
    fn occupies_slots_until_full() {
        let mut freight = freight::spec::freight(2);
        let id = freight.id;
        let occupy = |driver_id| {
            Transition::new(
                id,
                Status::BIDDABLE,
                Change::Occupy {
                    driver_id,
                    company_id: None,
                },
            )
        };
        let (a, b, c) = (user::Id::new(), user::Id::new(), user::Id::new());

        assert!(occupy(a).apply_to(&mut freight));
        assert_eq!(freight.status, Status::Open);
        assert_eq!(freight.accepted_trucks, 1);
        assert_eq!(freight.driver_id, None);

        assert!(occupy(b).apply_to(&mut freight));
        assert_eq!(freight.status, Status::Accepted);
        assert_eq!(freight.accepted_trucks, 2);

        assert!(!occupy(c).apply_to(&mut freight));
        assert_eq!(freight.accepted_trucks, 2);
    }

    #[test]
    fn driver_occupies_one_slot_at_most() {
        let mut freight = freight::spec::freight(3);
        let occupy = Transition::new(
            freight.id,
            Status::BIDDABLE,
            Change::Occupy {
                driver_id: user::Id::new(),
                company_id: None,
            },
        );

        assert!(occupy.apply_to(&mut freight));
        assert!(!occupy.apply_to(&mut freight));
        assert_eq!(freight.accepted_trucks, 1);
        assert_eq!(freight.occupant_ids.len(), 1);
    }

    #[test]
    fn single_truck_records_driver() {
        let mut freight = freight::spec::freight(1);
        let (driver_id, company_id) = (user::Id::new(), Some(user::Id::new()));

        assert!(Transition::new(
            freight.id,
            Status::BIDDABLE,
            Change::Occupy {
                driver_id,
                company_id,
            },
        )
        .apply_to(&mut freight));
        assert_eq!(freight.status, Status::Accepted);
        assert_eq!(freight.driver_id, Some(driver_id));
        assert_eq!(freight.company_id, company_id);
    }

    #[test]
    fn respects_expected_state() {
        let mut freight = freight::spec::freight(1);

        let mut to_loading = Transition::new(
            freight.id,
            [Status::Accepted],
            Change::Status(Status::Loading),
        );
        assert!(!to_loading.apply_to(&mut freight));
        assert_eq!(freight.status, Status::Open);

        freight.status = Status::Accepted;
        to_loading.expected.accepted_trucks = Some(1);
        assert!(!to_loading.apply_to(&mut freight));

        to_loading.expected.accepted_trucks = Some(0);
        assert!(to_loading.apply_to(&mut freight));
        assert_eq!(freight.status, Status::Loading);
    }

    #[test]
    fn reset_clears_assignment_state() {
        let mut freight = freight::spec::freight(1);
        freight.status = Status::Cancelled;
        freight.driver_id = Some(user::Id::new());
        freight.accepted_trucks = 1;
        freight.occupant_ids = vec![freight.driver_id.unwrap()];

        assert!(Transition::new(freight.id, [Status::Cancelled], Change::Reset)
            .apply_to(&mut freight));
        assert!(freight.occupant_ids.is_empty());
        assert_eq!(freight.status, Status::Open);
        assert_eq!(freight.driver_id, None);
        assert_eq!(freight.accepted_trucks, 0);
    }
}
