//! Tri-state write instructions for optional contact attributes.
//!
//! A partial-update API must be able to clear a field without being forced to
//! also clear every other field, and must be able to omit a field without
//! accidentally nulling it. `Field<T>` keeps those three cases apart:
//! [`Field::Missing`] (not in the request), [`Field::Null`] (explicitly
//! clear), [`Field::Value`] (set).

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Tri-state value for a single optional attribute.
///
/// `Missing` is the serde default; containing structs mark every `Field`
/// member with `#[serde(default, skip_serializing_if = "Field::is_missing")]`
/// so an omitted key deserializes to `Missing` and `Missing` never appears on
/// the wire. `Null` round-trips as JSON `null`, `Value` as the value itself.
#[derive(Clone, Debug, PartialEq)]
pub enum Field<T> {
    Missing,
    Null,
    Value(T),
}

// Hand-written so `Field<T>: Default` holds without a `T: Default` bound
// (timestamps have no default value).
impl<T> Default for Field<T> {
    fn default() -> Self {
        Field::Missing
    }
}

impl<T> Field<T> {
    pub fn is_missing(&self) -> bool {
        matches!(self, Field::Missing)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Field::Null)
    }

    /// The write instruction for an insert: `Missing` and `Null` both land as
    /// SQL NULL, `Value` as the value.
    pub fn into_option(self) -> Option<T> {
        match self {
            Field::Missing | Field::Null => None,
            Field::Value(v) => Some(v),
        }
    }

    /// The write instruction for an update, applied over the existing column:
    /// `Missing` keeps the stored value, `Null` clears it, `Value` replaces it.
    pub fn resolve(self, existing: Option<T>) -> Option<T> {
        match self {
            Field::Missing => existing,
            Field::Null => None,
            Field::Value(v) => Some(v),
        }
    }

    /// Inverse of the database read: a NULL column is `Null`, anything else
    /// `Value`. `Missing` only exists on the request side.
    pub fn from_option(opt: Option<T>) -> Self {
        match opt {
            None => Field::Null,
            Some(v) => Field::Value(v),
        }
    }

    pub fn as_ref(&self) -> Field<&T> {
        match self {
            Field::Missing => Field::Missing,
            Field::Null => Field::Null,
            Field::Value(v) => Field::Value(v),
        }
    }
}

impl<T> From<T> for Field<T> {
    fn from(v: T) -> Self {
        Field::Value(v)
    }
}

impl<T: Serialize> Serialize for Field<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            // Missing is skipped by the containing struct; if serialized
            // anyway it degrades to null rather than inventing a value.
            Field::Missing | Field::Null => serializer.serialize_none(),
            Field::Value(v) => serializer.serialize_some(v),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Field<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Field::from_option(Option::<T>::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Patch {
        #[serde(default, skip_serializing_if = "Field::is_missing")]
        first_name: Field<String>,
        #[serde(default, skip_serializing_if = "Field::is_missing")]
        orders: Field<i64>,
    }

    #[test]
    fn missing_keeps_existing_on_update() {
        let f: Field<&str> = Field::Missing;
        assert_eq!(f.resolve(Some("Old")), Some("Old"));
        assert_eq!(Field::<&str>::Missing.resolve(None), None);
    }

    #[test]
    fn null_clears_existing_on_update() {
        let f: Field<&str> = Field::Null;
        assert_eq!(f.resolve(Some("Old")), None);
    }

    #[test]
    fn value_replaces_existing_on_update() {
        assert_eq!(Field::Value("New").resolve(Some("Old")), Some("New"));
    }

    #[test]
    fn insert_path_collapses_missing_and_null() {
        assert_eq!(Field::<i64>::Missing.into_option(), None);
        assert_eq!(Field::<i64>::Null.into_option(), None);
        assert_eq!(Field::Value(7).into_option(), Some(7));
    }

    #[test]
    fn omitted_key_deserializes_to_missing() {
        let patch: Patch = serde_json::from_str("{}").unwrap();
        assert!(patch.first_name.is_missing());
        assert!(patch.orders.is_missing());
    }

    #[test]
    fn explicit_null_deserializes_to_null() {
        let patch: Patch = serde_json::from_str(r#"{"first_name": null}"#).unwrap();
        assert!(patch.first_name.is_null());
        assert!(patch.orders.is_missing());
    }

    #[test]
    fn value_deserializes_to_value() {
        let patch: Patch = serde_json::from_str(r#"{"first_name": "Ada", "orders": 3}"#).unwrap();
        assert_eq!(patch.first_name, Field::Value("Ada".to_string()));
        assert_eq!(patch.orders, Field::Value(3));
    }

    #[test]
    fn serialization_preserves_the_three_way_distinction() {
        let patch = Patch {
            first_name: Field::Null,
            orders: Field::Missing,
        };
        let json = serde_json::to_string(&patch).unwrap();
        assert_eq!(json, r#"{"first_name":null}"#);

        let back: Patch = serde_json::from_str(&json).unwrap();
        assert_eq!(back, patch);
    }
}
