// Data model for inventory records
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

/// Id carried by a component that has not been stored yet
pub const UNSAVED_ID: i64 = -1;

/// Date format used for storage and the structured map (`2024-03-07`)
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One inventory line item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    /// Assigned by the store; `UNSAVED_ID` until persisted
    pub id: i64,
    pub name: String,
    pub category: String,
    /// Units on hand, never negative once stored
    pub quantity: i64,
    /// Physical location (shelf, bin, drawer)
    pub location: String,
    pub acquired_on: NaiveDate,
}

impl Component {
    pub fn new(
        id: i64,
        name: impl Into<String>,
        category: impl Into<String>,
        quantity: i64,
        location: impl Into<String>,
        acquired_on: NaiveDate,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            category: category.into(),
            quantity,
            location: location.into(),
            acquired_on,
        }
    }

    /// Whether the store has assigned this component an id
    pub fn is_persisted(&self) -> bool {
        self.id >= 0
    }

    /// Whether the quantity is at or below `threshold`
    pub fn is_low_stock(&self, threshold: i64) -> bool {
        self.quantity <= threshold
    }

    /// Structured map with `id, name, category, quantity, location, acquiredOn` keys
    pub fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "category": self.category,
            "quantity": self.quantity,
            "location": self.location,
            "acquiredOn": format_date(&self.acquired_on),
        })
    }

    /// Build a component from a structured map.
    ///
    /// Never fails: missing or mistyped keys fall back to `0`, the empty
    /// string, or the epoch date.
    pub fn from_json(json: &Value) -> Self {
        let int = |key: &str| json.get(key).and_then(Value::as_i64).unwrap_or(0);
        let text = |key: &str| {
            json.get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        Self {
            id: int("id"),
            name: text("name"),
            category: text("category"),
            quantity: int("quantity"),
            location: text("location"),
            acquired_on: json
                .get("acquiredOn")
                .and_then(Value::as_str)
                .and_then(parse_date)
                .unwrap_or_else(epoch_date),
        }
    }
}

impl Default for Component {
    fn default() -> Self {
        Self {
            id: UNSAVED_ID,
            name: String::new(),
            category: String::new(),
            quantity: 0,
            location: String::new(),
            acquired_on: epoch_date(),
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Component [id: {}, name: {}, category: {}, quantity: {}, location: {}, acquired: {}]",
            self.id,
            self.name,
            self.category,
            self.quantity,
            self.location,
            format_date(&self.acquired_on),
        )
    }
}

pub fn format_date(date: &NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).ok()
}

/// 1970-01-01
pub fn epoch_date() -> NaiveDate {
    NaiveDate::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resistor() -> Component {
        Component::new(
            7,
            "Resistor 10k",
            "Passive",
            3,
            "Shelf A1",
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        )
    }

    #[test]
    fn test_default_is_unsaved_sentinel() {
        let c = Component::default();
        assert_eq!(c.id, UNSAVED_ID);
        assert_eq!(c.quantity, 0);
        assert!(c.name.is_empty());
        assert!(!c.is_persisted());
    }

    #[test]
    fn test_to_json_uses_iso_date() {
        let mut c = resistor();
        c.acquired_on = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        let json = c.to_json();

        assert_eq!(json["acquiredOn"], "2024-03-07");
        assert_eq!(json["id"], 7);
        assert_eq!(json["quantity"], 3);
        assert_eq!(json["category"], "Passive");
    }

    #[test]
    fn test_json_round_trip() {
        let c = resistor();
        assert_eq!(Component::from_json(&c.to_json()), c);
    }

    #[test]
    fn test_from_json_tolerates_missing_and_bad_keys() {
        let c = Component::from_json(&json!({
            "name": "LED",
            "quantity": "lots",
            "acquiredOn": "15/01/2024",
        }));

        assert_eq!(c.id, 0);
        assert_eq!(c.name, "LED");
        assert_eq!(c.category, "");
        assert_eq!(c.quantity, 0);
        assert_eq!(c.acquired_on, epoch_date());
    }

    #[test]
    fn test_from_json_of_non_object() {
        let c = Component::from_json(&Value::Null);
        assert_eq!(c.id, 0);
        assert_eq!(c.acquired_on, NaiveDate::from_ymd_opt(1970, 1, 1).unwrap());
    }

    #[test]
    fn test_serde_matches_structured_map() {
        let c = resistor();
        assert_eq!(serde_json::to_value(&c).unwrap(), c.to_json());
    }

    #[test]
    fn test_display_lists_fields_in_order() {
        assert_eq!(
            resistor().to_string(),
            "Component [id: 7, name: Resistor 10k, category: Passive, quantity: 3, location: Shelf A1, acquired: 2024-01-15]"
        );
    }

    #[test]
    fn test_is_low_stock_is_inclusive() {
        let c = resistor();
        assert!(c.is_low_stock(3));
        assert!(!c.is_low_stock(2));
    }
}
