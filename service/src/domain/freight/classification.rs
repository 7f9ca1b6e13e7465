//! Classification of a [`Freight`] into a list [`Bucket`].

use common::{define_kind, Date};

#[cfg(doc)]
use crate::domain::Freight;

use super::Status;

define_kind! {
    #[doc = "List bucket a [`Freight`] is placed into."]
    enum Bucket {
        #[doc = "Freight is on the market."]
        Open = 1,

        #[doc = "Freight is being executed."]
        Active = 2,

        #[doc = "Freight is assigned and waits for its pickup date."]
        Scheduled = 3,

        #[doc = "Freight reached a terminal status."]
        Completed = 4,
    }
}

/// Classifies a [`Freight`] with the provided [`Status`] and pickup [`Date`]
/// into a [`Bucket`], as of `today`.
#[must_use]
pub fn classify(status: Status, pickup_date: Date, today: Date) -> Bucket {
    use Status as S;

    match status {
        S::Open | S::InNegotiation => Bucket::Open,
        S::Accepted if pickup_date > today => Bucket::Scheduled,
        S::Accepted
        | S::Loading
        | S::Loaded
        | S::InTransit
        | S::DeliveredPendingConfirmation => Bucket::Active,
        S::Delivered | S::Completed | S::Cancelled | S::Rejected => {
            Bucket::Completed
        }
    }
}

#[cfg(test)]
mod spec {
    use common::Date;

    use super::{classify, Bucket, Status};

    fn today() -> Date {
        Date::from_ymd(2024, 6, 15).unwrap()
    }

    #[test]
    fn on_the_road_is_always_active() {
        for status in Status::ON_THE_ROAD {
            for days in [-30, 0, 30] {
                let pickup = today().add_days(days).unwrap();
                assert_eq!(
                    classify(status, pickup, today()),
                    Bucket::Active,
                    "{status} {pickup}",
                );
            }
        }
    }

    #[test]
    fn accepted_depends_on_pickup_date() {
        let tomorrow = today().add_days(1).unwrap();
        let yesterday = today().add_days(-1).unwrap();

        assert_eq!(
            classify(Status::Accepted, tomorrow, today()),
            Bucket::Scheduled,
        );
        assert_eq!(
            classify(Status::Accepted, yesterday, today()),
            Bucket::Active,
        );
        assert_eq!(
            classify(Status::Accepted, today(), today()),
            Bucket::Active,
        );
    }

    #[test]
    fn biddable_is_open_and_terminal_is_completed() {
        for status in Status::ALL {
            let bucket = classify(status, today(), today());
            if Status::BIDDABLE.contains(&status) {
                assert_eq!(bucket, Bucket::Open, "{status}");
            }
            if status.is_final() {
                assert_eq!(bucket, Bucket::Completed, "{status}");
            }
        }
    }
}
