use crate::config::NOMINAL_DAYS_PER_MONTH;
use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(CyclePeriod {
    Daily => "daily",
    Weekly => "weekly",
    Monthly => "monthly",
});

str_enum!(ReorderStatus {
    Requested => "requested",
    Ordered => "ordered",
    Received => "received",
});

str_enum!(RegimenSource {
    Prescription => "prescription",
    Schedule => "schedule",
    PersonMedicine => "person_medicine",
    PersonMedication => "person_medication",
});

impl Default for CyclePeriod {
    fn default() -> Self {
        Self::Daily
    }
}

impl CyclePeriod {
    /// Fixed day count used to normalise demand to a per-day rate.
    /// Months are nominal, not calendar-accurate.
    pub fn nominal_days(&self) -> u32 {
        match self {
            Self::Daily => 1,
            Self::Weekly => 7,
            Self::Monthly => NOMINAL_DAYS_PER_MONTH,
        }
    }

    /// Singular noun for user-facing messages ("per day").
    pub fn noun(&self) -> &'static str {
        match self {
            Self::Daily => "day",
            Self::Weekly => "week",
            Self::Monthly => "month",
        }
    }
}

impl Default for RegimenSource {
    fn default() -> Self {
        Self::Prescription
    }
}

impl RegimenSource {
    /// Non-prescription sources never carry a configurable cycle.
    pub fn is_prescribed(&self) -> bool {
        matches!(self, Self::Prescription | Self::Schedule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn cycle_period_round_trip() {
        for (variant, s) in [
            (CyclePeriod::Daily, "daily"),
            (CyclePeriod::Weekly, "weekly"),
            (CyclePeriod::Monthly, "monthly"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(CyclePeriod::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn reorder_status_round_trip() {
        for (variant, s) in [
            (ReorderStatus::Requested, "requested"),
            (ReorderStatus::Ordered, "ordered"),
            (ReorderStatus::Received, "received"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(ReorderStatus::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn cycle_period_defaults_to_daily() {
        assert_eq!(CyclePeriod::default(), CyclePeriod::Daily);
    }

    #[test]
    fn nominal_days_per_cycle() {
        assert_eq!(CyclePeriod::Daily.nominal_days(), 1);
        assert_eq!(CyclePeriod::Weekly.nominal_days(), 7);
        assert_eq!(CyclePeriod::Monthly.nominal_days(), 30);
    }

    #[test]
    fn serde_uses_storage_strings() {
        let json = serde_json::to_string(&RegimenSource::PersonMedicine).unwrap();
        assert_eq!(json, "\"person_medicine\"");
        let back: CyclePeriod = serde_json::from_str("\"weekly\"").unwrap();
        assert_eq!(back, CyclePeriod::Weekly);
    }

    #[test]
    fn only_prescribed_sources_are_prescribed() {
        assert!(RegimenSource::Prescription.is_prescribed());
        assert!(RegimenSource::Schedule.is_prescribed());
        assert!(!RegimenSource::PersonMedicine.is_prescribed());
        assert!(!RegimenSource::PersonMedication.is_prescribed());
    }

    #[test]
    fn invalid_enum_returns_error() {
        assert!(CyclePeriod::from_str("fortnightly").is_err());
        assert!(ReorderStatus::from_str("").is_err());
        assert!(RegimenSource::from_str("otc").is_err());
    }
}
