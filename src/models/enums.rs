use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Availability status for catalog products
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityStatus {
    #[default]
    Available,
    OutOfStock,
    Discontinued,
    PreOrder,
}

impl AvailabilityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AvailabilityStatus::Available => "available",
            AvailabilityStatus::OutOfStock => "out_of_stock",
            AvailabilityStatus::Discontinued => "discontinued",
            AvailabilityStatus::PreOrder => "pre_order",
        }
    }
}

impl fmt::Display for AvailabilityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AvailabilityStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "available" => Ok(AvailabilityStatus::Available),
            "out_of_stock" => Ok(AvailabilityStatus::OutOfStock),
            "discontinued" => Ok(AvailabilityStatus::Discontinued),
            "pre_order" => Ok(AvailabilityStatus::PreOrder),
            _ => Err(format!("Invalid availability status: {}", s)),
        }
    }
}

/// Price ordering requested on the product listing.
///
/// Anything other than `asc` or `desc` leaves the store order untouched,
/// but the raw value is still echoed back in navigation links.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
    #[default]
    Unsorted,
}

impl SortOrder {
    /// Lenient parse used for query strings; never fails.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw {
            "asc" => SortOrder::Asc,
            "desc" => SortOrder::Desc,
            _ => SortOrder::Unsorted,
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Asc => write!(f, "asc"),
            SortOrder::Desc => write!(f, "desc"),
            SortOrder::Unsorted => write!(f, ""),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_availability_string_conversion() {
        assert_eq!(AvailabilityStatus::Available.to_string(), "available");
        assert_eq!(AvailabilityStatus::OutOfStock.to_string(), "out_of_stock");
        assert_eq!(AvailabilityStatus::PreOrder.to_string(), "pre_order");

        assert_eq!(
            "OUT_OF_STOCK".parse::<AvailabilityStatus>().unwrap(),
            AvailabilityStatus::OutOfStock
        );
        assert_eq!(
            "discontinued".parse::<AvailabilityStatus>().unwrap(),
            AvailabilityStatus::Discontinued
        );
        assert!("sold".parse::<AvailabilityStatus>().is_err());
    }

    #[test]
    fn test_sort_order_parse_lenient() {
        assert_eq!(SortOrder::parse_lenient("asc"), SortOrder::Asc);
        assert_eq!(SortOrder::parse_lenient("desc"), SortOrder::Desc);
        assert_eq!(SortOrder::parse_lenient("ASC"), SortOrder::Unsorted);
        assert_eq!(SortOrder::parse_lenient(""), SortOrder::Unsorted);
        assert_eq!(SortOrder::parse_lenient("price"), SortOrder::Unsorted);
    }

    #[test]
    fn test_serde_serialization() {
        let json = serde_json::to_string(&AvailabilityStatus::OutOfStock).unwrap();
        assert_eq!(json, "\"out_of_stock\"");

        let deserialized: AvailabilityStatus = serde_json::from_str("\"pre_order\"").unwrap();
        assert_eq!(deserialized, AvailabilityStatus::PreOrder);
    }
}
