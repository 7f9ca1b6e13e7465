//! [`Status`] registry of a [`Freight`] lifecycle.

#[cfg(feature = "postgres")]
use std::error::Error as StdError;

#[cfg(feature = "postgres")]
use postgres_types::{
    accepts, private::BytesMut, to_sql_checked, FromSql, IsNull, ToSql, Type,
};
use strum::{Display, EnumString, IntoStaticStr};
use tracing as log;

#[cfg(doc)]
use crate::domain::Freight;

/// Status of a [`Freight`].
///
/// [`Display`]ed and parsed as the stable wire tokens (`OPEN`,
/// `IN_NEGOTIATION`, etc.), which is a compatibility contract.
///
/// [`Display`]: std::fmt::Display
#[derive(
    Clone,
    Copy,
    Debug,
    Display,
    EnumString,
    Eq,
    Hash,
    IntoStaticStr,
    Ord,
    PartialEq,
    PartialOrd,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    /// Published and waiting for carriers.
    Open,

    /// At least one price proposal is under consideration.
    InNegotiation,

    /// All the required trucks are assigned.
    Accepted,

    /// Cargo is being loaded.
    Loading,

    /// Cargo is loaded.
    Loaded,

    /// Cargo is on the way.
    InTransit,

    /// Driver reported the delivery, producer has not confirmed it yet.
    DeliveredPendingConfirmation,

    /// Delivery is confirmed.
    Delivered,

    /// Freight is settled and closed.
    Completed,

    /// Freight is cancelled.
    Cancelled,

    /// Freight is rejected.
    Rejected,
}

impl Status {
    /// All the [`Status`]es, in lifecycle order.
    pub const ALL: [Self; 11] = [
        Self::Open,
        Self::InNegotiation,
        Self::Accepted,
        Self::Loading,
        Self::Loaded,
        Self::InTransit,
        Self::DeliveredPendingConfirmation,
        Self::Delivered,
        Self::Completed,
        Self::Cancelled,
        Self::Rejected,
    ];

    /// [`Status`]es a carrier may still bid on.
    pub const BIDDABLE: [Self; 2] = [Self::Open, Self::InNegotiation];

    /// [`Status`]es of a freight being executed on the road.
    pub const ON_THE_ROAD: [Self; 4] = [
        Self::Loading,
        Self::Loaded,
        Self::InTransit,
        Self::DeliveredPendingConfirmation,
    ];

    /// Indicates whether this [`Status`] is terminal.
    ///
    /// No transition leaves a terminal [`Status`], except an administrative
    /// override.
    #[must_use]
    pub const fn is_final(self) -> bool {
        matches!(
            self,
            Self::Delivered
                | Self::Completed
                | Self::Cancelled
                | Self::Rejected,
        )
    }

    /// Returns the [`Status`]es this one may transition to.
    #[must_use]
    pub const fn next(self) -> &'static [Self] {
        use Status as S;

        match self {
            S::Open => {
                &[S::InNegotiation, S::Accepted, S::Cancelled, S::Rejected]
            }
            S::InNegotiation => {
                &[S::Open, S::Accepted, S::Cancelled, S::Rejected]
            }
            S::Accepted => &[S::Loading, S::Cancelled, S::Rejected],
            S::Loading => &[S::Loaded, S::Cancelled, S::Rejected],
            S::Loaded => &[S::InTransit, S::Cancelled, S::Rejected],
            S::InTransit => {
                &[S::DeliveredPendingConfirmation, S::Cancelled, S::Rejected]
            }
            S::DeliveredPendingConfirmation => {
                &[S::Delivered, S::Cancelled, S::Rejected]
            }
            S::Delivered | S::Completed | S::Cancelled | S::Rejected => &[],
        }
    }

    /// Checks whether transitioning from `self` to the provided [`Status`]
    /// is allowed.
    #[must_use]
    pub fn can_transition_to(self, to: Self) -> bool {
        self.next().contains(&to)
    }

    /// Returns the human-facing label of this [`Status`].
    #[must_use]
    pub const fn label(self) -> &'static str {
        use Status as S;

        match self {
            S::Open => "Aberto",
            S::InNegotiation => "Em negociação",
            S::Accepted => "Aceito",
            S::Loading => "Carregando",
            S::Loaded => "Carregado",
            S::InTransit => "Em trânsito",
            S::DeliveredPendingConfirmation => "Aguardando confirmação",
            S::Delivered => "Entregue",
            S::Completed => "Concluído",
            S::Cancelled => "Cancelado",
            S::Rejected => "Rejeitado",
        }
    }

    /// Looks up the [`Status`] by its exact human-facing [`label`].
    ///
    /// [`label`]: Status::label
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL.into_iter().find(|s| s.label() == label)
    }

    /// Normalizes the provided raw status string coming from legacy data or
    /// human input into a canonical [`Status`].
    ///
    /// Never fails: exact wire tokens and labels are accepted as is, then
    /// known legacy spellings, then keywords, falling back to
    /// [`Status::Open`]. Any non-exact match is logged as a warning.
    #[must_use]
    pub fn normalize(raw: &str) -> Self {
        let trimmed = raw.trim();
        if let Ok(status) = trimmed.parse() {
            return status;
        }
        if let Some(status) = Self::from_label(trimmed) {
            return status;
        }

        let token = trimmed.to_uppercase().replace([' ', '-'], "_");
        let (status, how) = token
            .parse()
            .ok()
            .map(|s| (s, "spelling"))
            .or_else(|| Self::from_alias(&token).map(|s| (s, "alias")))
            .or_else(|| Self::from_keyword(&token).map(|s| (s, "keyword")))
            .unwrap_or((Self::Open, "fallback"));
        log::warn!(
            raw,
            status = %status,
            "non-canonical freight status normalized by {how}",
        );
        status
    }

    /// Returns the canonical [`Status`] the provided stored string must be
    /// rewritten to, or [`None`] if it's canonical already.
    #[must_use]
    pub fn rewrite_of(stored: &str) -> Option<Self> {
        let status = Self::normalize(stored);
        (stored != <&'static str>::from(status)).then_some(status)
    }

    /// Looks up the [`Status`] by its known legacy spelling.
    fn from_alias(token: &str) -> Option<Self> {
        use Status as S;

        Some(match token {
            "PENDING" | "AVAILABLE" | "PUBLISHED" | "ABERTO" | "DISPONIVEL"
            | "DISPONÍVEL" => S::Open,
            "NEGOTIATING" | "NEGOTIATION" | "EM_NEGOCIACAO"
            | "EM_NEGOCIAÇÃO" => S::InNegotiation,
            "ASSIGNED" | "ACEITO" | "ATRIBUIDO" | "ATRIBUÍDO" => S::Accepted,
            "CARREGANDO" => S::Loading,
            "PICKED_UP" | "CARREGADO" | "COLETADO" => S::Loaded,
            "IN_PROGRESS" | "ON_THE_WAY" | "EN_ROUTE" | "EM_TRANSITO"
            | "EM_TRÂNSITO" => S::InTransit,
            "PENDING_CONFIRMATION" | "AWAITING_CONFIRMATION"
            | "AGUARDANDO_CONFIRMACAO" | "AGUARDANDO_CONFIRMAÇÃO" => {
                S::DeliveredPendingConfirmation
            }
            "ENTREGUE" => S::Delivered,
            "FINISHED" | "DONE" | "CONCLUIDO" | "CONCLUÍDO" | "FINALIZADO" => {
                S::Completed
            }
            "CANCELED" | "CANCELADO" => S::Cancelled,
            "DECLINED" | "REJEITADO" | "RECUSADO" => S::Rejected,
            _ => return None,
        })
    }

    /// Guesses the [`Status`] by keywords contained in the provided token.
    ///
    /// Order matters: more specific keywords are checked first.
    fn from_keyword(token: &str) -> Option<Self> {
        use Status as S;

        const KEYWORDS: &[(&str, Status)] = &[
            ("CANCEL", S::Cancelled),
            ("REJECT", S::Rejected),
            ("REJEIT", S::Rejected),
            ("RECUS", S::Rejected),
            ("CONFIRM", S::DeliveredPendingConfirmation),
            ("DELIVER", S::Delivered),
            ("ENTREG", S::Delivered),
            ("TRANSIT", S::InTransit),
            ("TRÂNSIT", S::InTransit),
            ("LOADED", S::Loaded),
            ("CARREGADO", S::Loaded),
            ("LOAD", S::Loading),
            ("CARREG", S::Loading),
            ("COMPLET", S::Completed),
            ("CONCLU", S::Completed),
            ("FINALIZ", S::Completed),
            ("NEGOC", S::InNegotiation),
            ("NEGOT", S::InNegotiation),
            ("ACCEPT", S::Accepted),
            ("ACEIT", S::Accepted),
            ("OPEN", S::Open),
            ("ABERT", S::Open),
        ];

        KEYWORDS
            .iter()
            .find_map(|(kw, s)| token.contains(kw).then_some(*s))
    }
}

#[cfg(feature = "postgres")]
impl FromSql<'_> for Status {
    accepts!(TEXT, VARCHAR);

    fn from_sql(
        ty: &Type,
        raw: &[u8],
    ) -> Result<Self, Box<dyn StdError + Sync + Send>> {
        <&str>::from_sql(ty, raw).map(Self::normalize)
    }
}

#[cfg(feature = "postgres")]
impl ToSql for Status {
    accepts!(TEXT, VARCHAR);
    to_sql_checked!();

    fn to_sql(
        &self,
        ty: &Type,
        w: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn StdError + Sync + Send>> {
        <&'static str>::from(*self).to_sql(ty, w)
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use super::Status;

    #[test]
    fn transition_table() {
        use Status as S;

        let allowed = |from: S, to: S| match (from, to) {
            (S::Open, S::InNegotiation | S::Accepted)
            | (S::InNegotiation, S::Open | S::Accepted)
            | (S::Accepted, S::Loading)
            | (S::Loading, S::Loaded)
            | (S::Loaded, S::InTransit)
            | (S::InTransit, S::DeliveredPendingConfirmation)
            | (S::DeliveredPendingConfirmation, S::Delivered) => true,
            (f, S::Cancelled | S::Rejected) => !f.is_final(),
            _ => false,
        };

        for from in Status::ALL {
            for to in Status::ALL {
                assert_eq!(
                    from.can_transition_to(to),
                    allowed(from, to),
                    "{from} -> {to}",
                );
            }
        }
    }

    #[test]
    fn terminal_statuses_have_no_exits() {
        for from in Status::ALL.into_iter().filter(|s| s.is_final()) {
            assert!(from.next().is_empty(), "{from}");
            for to in Status::ALL {
                assert!(!from.can_transition_to(to), "{from} -> {to}");
            }
        }
        assert_eq!(Status::ALL.into_iter().filter(|s| s.is_final()).count(), 4);
    }

    #[test]
    fn wire_tokens_are_stable() {
        let tokens = Status::ALL.map(|s| s.to_string());
        assert_eq!(
            tokens,
            [
                "OPEN",
                "IN_NEGOTIATION",
                "ACCEPTED",
                "LOADING",
                "LOADED",
                "IN_TRANSIT",
                "DELIVERED_PENDING_CONFIRMATION",
                "DELIVERED",
                "COMPLETED",
                "CANCELLED",
                "REJECTED",
            ],
        );
        for s in Status::ALL {
            assert_eq!(Status::from_str(&s.to_string()).unwrap(), s);
        }
        assert!(Status::from_str("open").is_err());
    }

    #[test]
    fn labels_are_bidirectional() {
        for s in Status::ALL {
            assert_eq!(Status::from_label(s.label()), Some(s));
        }
        assert_eq!(
            Status::from_label("  Em trânsito "),
            Some(Status::InTransit),
        );
        assert_eq!(Status::from_label("em transito"), None);
    }

    #[test]
    fn normalizes_leniently() {
        use Status as S;

        for (raw, expected) in [
            ("IN_TRANSIT", S::InTransit),
            (" ACCEPTED ", S::Accepted),
            ("Entregue", S::Delivered),
            ("in transit", S::InTransit),
            ("in-negotiation", S::InNegotiation),
            ("canceled", S::Cancelled),
            ("pending", S::Open),
            ("assigned", S::Accepted),
            ("finalizado", S::Completed),
            (
                "delivered - pending confirmation",
                S::DeliveredPendingConfirmation,
            ),
            ("cancelled by driver", S::Cancelled),
            ("loaded at farm", S::Loaded),
            ("", S::Open),
            ("whatever", S::Open),
        ] {
            assert_eq!(Status::normalize(raw), expected, "{raw:?}");
        }
    }

    #[test]
    fn rewrites_only_non_canonical_spellings() {
        assert_eq!(Status::rewrite_of("pending"), Some(Status::Open));
        assert_eq!(Status::rewrite_of("Aberto"), Some(Status::Open));
        assert_eq!(Status::rewrite_of(" ACCEPTED "), Some(Status::Accepted));
        for s in Status::ALL {
            assert_eq!(Status::rewrite_of(&s.to_string()), None, "{s}");
        }
    }
}
