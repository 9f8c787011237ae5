//! Typed IDs for type-safe entity references.
//!
//! Using typed IDs prevents accidentally passing a `ShipmentId` where a `TrackingId` is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to generate typed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Creates a new random ID using UUID v7 (time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates an ID from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

typed_id!(UserId, "Unique identifier for a back-office user.");
typed_id!(CustomerId, "Unique identifier for a customer in the directory.");
typed_id!(PartnerId, "Unique identifier for a carrier or subcontracting partner.");
typed_id!(ShipmentId, "Unique identifier for a shipment.");
typed_id!(InvoiceId, "Unique identifier for an invoice owned by the billing module.");
typed_id!(TrackingId, "Unique identifier for an incoming invoice tracking row.");
typed_id!(StatementId, "Unique identifier for a statement of accounts snapshot.");
typed_id!(DunningConfigId, "Unique identifier for a dunning configuration override.");

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_new_ids_are_v7() {
        assert_eq!(TrackingId::new().into_inner().get_version_num(), 7);
    }

    #[test]
    fn test_id_round_trips_through_string() {
        let id = ShipmentId::new();
        assert_eq!(ShipmentId::from_str(&id.to_string()).unwrap(), id);
        assert!(ShipmentId::from_str("not-a-uuid").is_err());
    }

    #[test]
    fn test_id_serializes_transparently() {
        let id = CustomerId::from_uuid(Uuid::nil());
        assert_eq!(
            serde_json::to_string(&id).unwrap(),
            "\"00000000-0000-0000-0000-000000000000\""
        );
    }
}
