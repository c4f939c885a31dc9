//! Enumerated attribute values and their wire representations.

use crate::query::{QueryValue, WireValue};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Declares a string-valued enum whose serde name and query wire value
/// are the same literal.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($variant:ident => $wire:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];
        }

        impl WireValue for $name {
            fn wire_value(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.wire_value())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok($name::$variant),)+
                    other => Err(format!("invalid {} value: {other}", stringify!($name))),
                }
            }
        }

        impl From<$name> for QueryValue {
            fn from(value: $name) -> Self {
                QueryValue::wire(&value)
            }
        }
    };
}

wire_enum! {
    /// Target demographic of a manga.
    pub enum PublicationDemographic {
        Shounen => "shounen",
        Shoujo => "shoujo",
        Josei => "josei",
        Seinen => "seinen",
    }
}

wire_enum! {
    /// Publication status of a manga.
    pub enum Status {
        Ongoing => "ongoing",
        Completed => "completed",
        Hiatus => "hiatus",
        Cancelled => "cancelled",
    }
}

wire_enum! {
    pub enum ContentRating {
        Safe => "safe",
        Suggestive => "suggestive",
        Erotica => "erotica",
        Pornographic => "pornographic",
    }
}

wire_enum! {
    /// A user's reading status for a followed manga.
    pub enum ReadingStatus {
        Reading => "reading",
        OnHold => "on_hold",
        PlanToRead => "plan_to_read",
        Dropped => "dropped",
        ReReading => "re_reading",
        Completed => "completed",
    }
}

wire_enum! {
    pub enum CustomListVisibility {
        Public => "public",
        Private => "private",
    }
}

wire_enum! {
    /// How multiple tag filters combine.
    pub enum MultiMode {
        And => "AND",
        Or => "OR",
    }
}

wire_enum! {
    /// Resource families that have legacy numeric ids.
    pub enum LegacyType {
        Group => "group",
        Manga => "manga",
        Chapter => "chapter",
        Tag => "tag",
    }
}

wire_enum! {
    pub enum SortOrder {
        Asc => "asc",
        Desc => "desc",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_value_differs_from_variant_name() {
        assert_eq!(ReadingStatus::PlanToRead.wire_value(), "plan_to_read");
        assert_eq!(MultiMode::And.wire_value(), "AND");
        assert_eq!(QueryValue::from(Status::Hiatus), QueryValue::Str("hiatus".into()));
    }

    #[test]
    fn test_serde_matches_wire_value() {
        for status in ReadingStatus::ALL {
            let json = serde_json::to_value(status).unwrap();
            assert_eq!(json, serde_json::Value::String(status.wire_value().into()));
            let back: ReadingStatus = serde_json::from_value(json).unwrap();
            assert_eq!(back, *status);
        }
    }

    #[test]
    fn test_from_str() {
        assert_eq!("seinen".parse::<PublicationDemographic>(), Ok(PublicationDemographic::Seinen));
        assert!("Seinen".parse::<PublicationDemographic>().is_err());
    }
}
