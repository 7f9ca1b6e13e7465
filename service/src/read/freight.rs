//! [`Freight`] read model definitions.

use common::Date;

use crate::domain::{freight::Bucket, Freight};

/// [`Freight`]s grouped by their list [`Bucket`]s.
#[derive(Clone, Debug, Default)]
pub struct Board {
    /// [`Freight`]s on the market.
    pub open: Vec<Freight>,

    /// [`Freight`]s being executed.
    pub active: Vec<Freight>,

    /// Assigned [`Freight`]s waiting for their pickup date.
    pub scheduled: Vec<Freight>,

    /// [`Freight`]s in a terminal status.
    pub completed: Vec<Freight>,
}

impl Board {
    /// Groups the provided [`Freight`]s into a [`Board`] as of `today`.
    ///
    /// Each group keeps the order of the provided [`Freight`]s.
    #[must_use]
    pub fn new(
        freights: impl IntoIterator<Item = Freight>,
        today: Date,
    ) -> Self {
        let mut board = Self::default();
        for freight in freights {
            match freight.bucket(today) {
                Bucket::Open => board.open.push(freight),
                Bucket::Active => board.active.push(freight),
                Bucket::Scheduled => board.scheduled.push(freight),
                Bucket::Completed => board.completed.push(freight),
            }
        }
        board
    }
}

pub mod list {
    //! [`Freight`]s list definitions.

    #[cfg(doc)]
    use crate::domain::Freight;
    use crate::domain::{freight, user};

    /// Filter of a [`Freight`]s list.
    ///
    /// Unset criteria match everything. Lists are ordered by creation, the
    /// most recent first.
    #[derive(Clone, Debug, Default)]
    pub struct Filter {
        /// [`freight::Status`]es to match.
        pub statuses: Option<Vec<freight::Status>>,

        /// ID of the producer owning the [`Freight`]s.
        pub producer_id: Option<user::Id>,

        /// ID of the driver or company having an assignment on the
        /// [`Freight`]s.
        pub carrier_id: Option<user::Id>,

        /// Moment the [`Freight`]s must be created before.
        pub created_before: Option<freight::CreationDateTime>,
    }
}

#[cfg(test)]
mod spec {
    use common::Date;

    use crate::domain::freight::{self, Status};

    use super::Board;

    #[test]
    fn groups_by_bucket() {
        let today = Date::from_ymd(2024, 3, 10).unwrap();
        let with = |status, pickup: Date| {
            let mut f = freight::spec::freight(1);
            f.status = status;
            f.pickup_date = pickup;
            f
        };
        let later = today.add_days(3).unwrap();

        let board = Board::new(
            [
                with(Status::Open, today),
                with(Status::Accepted, later),
                with(Status::Accepted, today),
                with(Status::InTransit, later),
                with(Status::Cancelled, today),
                with(Status::InNegotiation, later),
            ],
            today,
        );

        assert_eq!(board.open.len(), 2);
        assert_eq!(board.scheduled.len(), 1);
        assert_eq!(board.active.len(), 2);
        assert_eq!(board.completed.len(), 1);
        assert_eq!(board.scheduled[0].pickup_date, later);
    }
}
