//! Pricing and price visibility of a [`Freight`].

use common::{define_kind, Money};
use derive_more::{Display, Error as StdError};
use rust_decimal::Decimal;

use crate::domain::{
    user::{self, Role, User},
    Assignment, Freight,
};

/// Pricing scheme of a [`Freight`] with its rate.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Pricing {
    /// Listed price is the per-truck price.
    Fixed(Money),

    /// Per-truck price is the rate multiplied by the distance in kilometers.
    PerKm(Money),

    /// Per-truck price is the rate multiplied by the weight in tons.
    PerTon(Money),
}

impl Pricing {
    /// Creates a new [`Pricing`] of the provided [`Kind`] and rate.
    #[must_use]
    pub const fn new(kind: Kind, rate: Money) -> Self {
        match kind {
            Kind::Fixed => Self::Fixed(rate),
            Kind::PerKm => Self::PerKm(rate),
            Kind::PerTon => Self::PerTon(rate),
        }
    }

    /// Returns [`Kind`] of this [`Pricing`].
    #[must_use]
    pub const fn kind(&self) -> Kind {
        match self {
            Self::Fixed(_) => Kind::Fixed,
            Self::PerKm(_) => Kind::PerKm,
            Self::PerTon(_) => Kind::PerTon,
        }
    }

    /// Returns the rate of this [`Pricing`].
    #[must_use]
    pub const fn rate(&self) -> Money {
        match self {
            Self::Fixed(m) | Self::PerKm(m) | Self::PerTon(m) => *m,
        }
    }

    /// Computes the per-truck price from this [`Pricing`] and the provided
    /// cargo quantities.
    ///
    /// # Errors
    ///
    /// If the quantity required by the scheme is missing, or the computation
    /// overflows.
    pub fn unit_price(
        &self,
        distance_km: Option<Decimal>,
        weight_tons: Option<Decimal>,
    ) -> Result<Money, Error> {
        match *self {
            Self::Fixed(price) => Ok(price),
            Self::PerKm(rate) => rate
                .times(distance_km.ok_or(Error::MissingDistance)?)
                .ok_or(Error::Overflow),
            Self::PerTon(rate) => rate
                .times(weight_tons.ok_or(Error::MissingWeight)?)
                .ok_or(Error::Overflow),
        }
    }
}

define_kind! {
    #[doc = "Kind of a [`Pricing`] scheme."]
    enum Kind {
        #[doc = "Fixed per-truck price."]
        Fixed = 1,

        #[doc = "Price per kilometer."]
        PerKm = 2,

        #[doc = "Price per ton."]
        PerTon = 3,
    }
}

/// Checks that the provided per-truck `price` is positive and not under the
/// provided regulatory `floor` (if any).
///
/// # Errors
///
/// If the `price` is not positive or is under the `floor`.
pub fn check_price(price: Money, floor: Option<Money>) -> Result<(), Error> {
    if !price.is_positive() {
        return Err(Error::NotPositive(price));
    }
    if let Some(floor) = floor {
        if floor.currency != price.currency {
            return Err(Error::CurrencyMismatch {
                price,
                expected: floor,
            });
        }
        if price.amount < floor.amount {
            return Err(Error::BelowFloor { price, floor });
        }
    }
    Ok(())
}

/// Error of a [`Freight`] price computation or validation.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, StdError)]
pub enum Error {
    /// Price is under the regulatory floor.
    #[display("price {price} is under the floor of {floor}")]
    BelowFloor {
        /// Offending price.
        price: Money,

        /// Applicable floor.
        floor: Money,
    },

    /// Price is in an unexpected currency.
    #[display("price {price} is not in the currency of {expected}")]
    CurrencyMismatch {
        /// Offending price.
        price: Money,

        /// Amount in the expected currency.
        expected: Money,
    },

    /// Per-kilometer pricing without a distance.
    #[display("distance is required for per-kilometer pricing")]
    MissingDistance,

    /// Per-ton pricing without a weight.
    #[display("weight is required for per-ton pricing")]
    MissingWeight,

    /// Price is zero or negative.
    #[display("price {_0} must be positive")]
    NotPositive(#[error(not(source))] Money),

    /// Price computation overflowed.
    #[display("price computation overflowed")]
    Overflow,
}

/// Party looking at a [`Freight`] price.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Viewer {
    /// Freight owner (or an administrator) seeing the aggregate cost.
    Owner,

    /// Driver seeing only the per-truck price.
    Driver(user::Id),

    /// Transport company seeing only the per-truck price of its trucks.
    Company(user::Id),

    /// Producer not owning the [`Freight`], seeing only the listed per-truck
    /// price.
    Outsider,
}

impl Viewer {
    /// Returns the [`Viewer`] the provided [`User`] acts as upon the
    /// provided [`Freight`].
    #[must_use]
    pub fn of(user: &User, freight: &Freight) -> Self {
        match user.role {
            Role::Admin => Self::Owner,
            Role::Producer if freight.is_owned_by(user) => Self::Owner,
            Role::Producer => Self::Outsider,
            Role::Driver => Self::Driver(user.id),
            Role::Company => Self::Company(user.id),
        }
    }

    /// Indicates whether the provided [`Assignment`] belongs to this
    /// [`Viewer`].
    fn owns(&self, assignment: &Assignment) -> bool {
        match *self {
            Self::Owner | Self::Outsider => false,
            Self::Driver(id) => assignment.driver_id == id,
            Self::Company(id) => assignment.company_id == Some(id),
        }
    }
}

/// Price of a [`Freight`] as a specific [`Viewer`] is allowed to see it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Price {
    /// Amount to display.
    pub display: Money,

    /// Amount due on settlement, if anything is agreed for the [`Viewer`].
    pub payable: Option<Money>,
}

/// Computes the [`Price`] of the provided [`Freight`] as the provided
/// [`Viewer`] is allowed to see it.
///
/// An owner sees the aggregate cost across all trucks: the sum of agreed
/// prices of accepted [`Assignment`]s, or the per-truck price times required
/// trucks while none is accepted. A carrier sees only the per-truck price:
/// its own agreed price once assigned, the listed one otherwise.
///
/// # Errors
///
/// If the per-truck price cannot be computed.
pub fn visible_price(
    freight: &Freight,
    assignments: &[Assignment],
    viewer: Viewer,
) -> Result<Price, Error> {
    let billable = assignments
        .iter()
        .filter(|a| a.freight_id == freight.id && a.is_billable())
        .collect::<Vec<_>>();

    if viewer == Viewer::Owner {
        if let Some(agreed) =
            Money::sum(billable.iter().map(|a| a.agreed_price))
        {
            return Ok(Price {
                display: agreed,
                payable: Some(agreed),
            });
        }
        let total = freight
            .unit_price()?
            .times(Decimal::from(freight.required_trucks))
            .ok_or(Error::Overflow)?;
        return Ok(Price {
            display: total,
            payable: None,
        });
    }

    let own = billable
        .into_iter()
        .filter(|a| viewer.owns(a))
        .collect::<Vec<_>>();
    match own.first() {
        Some(first) => Ok(Price {
            display: first.agreed_price,
            payable: Money::sum(own.iter().map(|a| a.agreed_price)),
        }),
        None => Ok(Price {
            display: freight.unit_price()?,
            payable: None,
        }),
    }
}

#[cfg(test)]
mod spec {
    use common::{money::Currency, Money};
    use rust_decimal::Decimal;

    use crate::domain::{
        assignment::{self, Assignment},
        freight::{self, Freight},
        user::{self, Role, User},
    };

    use super::{check_price, visible_price, Error, Pricing, Viewer};

    fn brl(s: &str) -> Money {
        Money {
            amount: s.parse().unwrap(),
            currency: Currency::Brl,
        }
    }

    fn assignment(
        freight: &Freight,
        driver_id: user::Id,
        price: &str,
        status: assignment::Status,
    ) -> Assignment {
        Assignment {
            id: assignment::Id::new(),
            freight_id: freight.id,
            driver_id,
            company_id: None,
            status,
            agreed_price: brl(price),
            created_at: assignment::CreationDateTime::now(),
            updated_at: assignment::ModificationDateTime::now(),
        }
    }

    #[test]
    fn computes_unit_price_per_scheme() {
        let km = Some(Decimal::from(250));
        let tons = Some("32.5".parse().unwrap());

        assert_eq!(
            Pricing::Fixed(brl("1500")).unit_price(None, None),
            Ok(brl("1500")),
        );
        assert_eq!(
            Pricing::PerKm(brl("4.20")).unit_price(km, None),
            Ok(brl("1050")),
        );
        assert_eq!(
            Pricing::PerTon(brl("80")).unit_price(km, tons),
            Ok(brl("2600")),
        );
        assert_eq!(
            Pricing::PerKm(brl("4.20")).unit_price(None, tons),
            Err(Error::MissingDistance),
        );
        assert_eq!(
            Pricing::PerTon(brl("80")).unit_price(km, None),
            Err(Error::MissingWeight),
        );
    }

    #[test]
    fn owner_sees_aggregate_and_drivers_see_their_own() {
        let mut freight = freight::spec::freight(3);
        freight.pricing = Pricing::Fixed(brl("100"));

        let (a, b, c) = (user::Id::new(), user::Id::new(), user::Id::new());
        let assignments = [
            assignment(&freight, a, "100", assignment::Status::Accepted),
            assignment(&freight, b, "120", assignment::Status::Accepted),
            assignment(&freight, c, "90", assignment::Status::Accepted),
        ];

        let owner =
            visible_price(&freight, &assignments, Viewer::Owner).unwrap();
        assert_eq!(owner.display, brl("310"));
        assert_eq!(owner.payable, Some(brl("310")));

        for (driver, price) in [(a, "100"), (b, "120"), (c, "90")] {
            let seen =
                visible_price(&freight, &assignments, Viewer::Driver(driver))
                    .unwrap();
            assert_eq!(seen.display, brl(price));
            assert_eq!(seen.payable, Some(brl(price)));
        }
    }

    #[test]
    fn owner_sees_list_total_before_acceptance() {
        let mut freight = freight::spec::freight(2);
        freight.pricing = Pricing::PerKm(brl("3.5"));
        freight.distance_km = Some(Decimal::from(100));

        let cancelled = [assignment(
            &freight,
            user::Id::new(),
            "999",
            assignment::Status::Cancelled,
        )];

        let owner = visible_price(&freight, &cancelled, Viewer::Owner).unwrap();
        assert_eq!(owner.display, brl("700"));
        assert_eq!(owner.payable, None);

        let stranger =
            visible_price(&freight, &cancelled, Viewer::Driver(user::Id::new()))
                .unwrap();
        assert_eq!(stranger.display, brl("350"));
        assert_eq!(stranger.payable, None);
    }

    #[test]
    fn agreed_price_overrides_list_price() {
        let mut freight = freight::spec::freight(1);
        freight.pricing = Pricing::Fixed(brl("100"));
        let driver = user::Id::new();
        let assignments =
            [assignment(&freight, driver, "135", assignment::Status::Accepted)];

        freight.pricing = Pricing::Fixed(brl("80"));

        let seen =
            visible_price(&freight, &assignments, Viewer::Driver(driver))
                .unwrap();
        assert_eq!(seen.display, brl("135"));
        let owner =
            visible_price(&freight, &assignments, Viewer::Owner).unwrap();
        assert_eq!(owner.display, brl("135"));
    }

    #[test]
    fn company_sees_per_truck_price() {
        let mut freight = freight::spec::freight(3);
        freight.pricing = Pricing::Fixed(brl("100"));
        let company = user::Id::new();

        let mut own = assignment(
            &freight,
            user::Id::new(),
            "110",
            assignment::Status::Accepted,
        );
        own.company_id = Some(company);
        let mut own2 = assignment(
            &freight,
            user::Id::new(),
            "105",
            assignment::Status::Accepted,
        );
        own2.company_id = Some(company);
        let other = assignment(
            &freight,
            user::Id::new(),
            "95",
            assignment::Status::Accepted,
        );

        let seen = visible_price(
            &freight,
            &[own, own2, other],
            Viewer::Company(company),
        )
        .unwrap();
        assert_eq!(seen.display, brl("110"));
        assert_eq!(seen.payable, Some(brl("215")));
    }

    #[test]
    fn validates_price() {
        assert_eq!(check_price(brl("10"), None), Ok(()));
        assert_eq!(check_price(brl("10"), Some(brl("10"))), Ok(()));
        assert_eq!(
            check_price(brl("0"), None),
            Err(Error::NotPositive(brl("0"))),
        );
        assert_eq!(
            check_price(brl("9.99"), Some(brl("10"))),
            Err(Error::BelowFloor {
                price: brl("9.99"),
                floor: brl("10"),
            }),
        );
    }

    #[test]
    fn only_owner_and_admin_see_aggregate() {
        let mut freight = freight::spec::freight(2);
        freight.pricing = Pricing::Fixed(brl("100"));
        let user = |role, id| User {
            id,
            role,
            name: user::Name::new("Someone").unwrap(),
            is_approved: true,
            company_id: None,
            created_at: user::CreationDateTime::now(),
        };
        let owner = user(Role::Producer, freight.producer_id);
        let admin = user(Role::Admin, user::Id::new());
        let other = user(Role::Producer, user::Id::new());

        assert_eq!(Viewer::of(&owner, &freight), Viewer::Owner);
        assert_eq!(Viewer::of(&admin, &freight), Viewer::Owner);
        assert_eq!(Viewer::of(&other, &freight), Viewer::Outsider);

        let seen =
            visible_price(&freight, &[], Viewer::of(&other, &freight))
                .unwrap();
        assert_eq!(seen.display, brl("100"));
        assert_eq!(seen.payable, None);
    }
}
