//! Expiration policy of a [`Freight`].

use std::time::Duration;

use common::define_kind;

#[cfg(doc)]
use crate::domain::Freight;

use super::Status;

/// Number of seconds in a day.
const DAY: u64 = 24 * 60 * 60;

define_kind! {
    #[doc = "Cargo or service category of a [`Freight`]."]
    enum Category {
        #[doc = "Urgent courier-like delivery."]
        Express = 1,

        #[doc = "Live animals."]
        Livestock = 2,

        #[doc = "Temperature-controlled cargo."]
        Refrigerated = 3,

        #[doc = "General cargo."]
        General = 4,

        #[doc = "Bulk grain."]
        Grain = 5,

        #[doc = "Transport-related service."]
        Service = 6,
    }
}

impl Category {
    /// Returns the time-to-live of a [`Freight`] of this [`Category`] on the
    /// market, counted from its creation.
    #[must_use]
    pub const fn ttl(self) -> Duration {
        let days = match self {
            Self::Express => 1,
            Self::Livestock => 2,
            Self::Refrigerated => 3,
            Self::General => 7,
            Self::Grain => 15,
            Self::Service => 30,
        };
        Duration::from_secs(days * DAY)
    }

    /// Returns the shortest [`Category::ttl()`] among all [`Category`]s.
    #[must_use]
    pub fn min_ttl() -> Duration {
        Self::ALL
            .iter()
            .map(|c| c.ttl())
            .min()
            .unwrap_or(Duration::from_secs(DAY))
    }
}

/// Indicates whether a [`Freight`] in the provided [`Status`] may be
/// cancelled automatically once its time-to-live lapses.
///
/// Once any party committed to the [`Freight`], it never expires.
#[must_use]
pub const fn can_auto_cancel(status: Status) -> bool {
    matches!(status, Status::Open | Status::InNegotiation)
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use super::{can_auto_cancel, Category, Status};

    #[test]
    fn auto_cancels_only_biddable() {
        for status in Status::ALL {
            assert_eq!(
                can_auto_cancel(status),
                matches!(status, Status::Open | Status::InNegotiation),
                "{status}",
            );
        }
        assert!(!can_auto_cancel(Status::Accepted));
    }

    #[test]
    fn ttl_per_category() {
        let days = |d: u64| Duration::from_secs(d * 24 * 60 * 60);

        assert_eq!(Category::Express.ttl(), days(1));
        assert_eq!(Category::Livestock.ttl(), days(2));
        assert_eq!(Category::Refrigerated.ttl(), days(3));
        assert_eq!(Category::General.ttl(), days(7));
        assert_eq!(Category::Grain.ttl(), days(15));
        assert_eq!(Category::Service.ttl(), days(30));
        assert_eq!(Category::min_ttl(), days(1));
    }
}
