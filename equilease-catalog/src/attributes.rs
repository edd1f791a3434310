use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Upper bound on the combinations one attribute set may expand to
pub const DEFAULT_MAX_COMBINATIONS: usize = 10_000;

/// One named attribute and its allowed values, in display order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub values: Vec<String>,
}

/// Variation attributes of a catalog item (e.g. `{"color": ["Red", "Blue"]}`).
///
/// Attributes keep their insertion order. That order drives enumeration:
/// the first attribute varies slowest. On the wire the set is a JSON object
/// and document order is preserved when deserializing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeSet {
    attributes: Vec<Attribute>,
}

impl AttributeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an attribute, or replace the values of an existing one in place.
    pub fn insert<N, I, V>(&mut self, name: N, values: I)
    where
        N: Into<String>,
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let name = name.into();
        let values: Vec<String> = values.into_iter().map(Into::into).collect();

        match self.attributes.iter_mut().find(|a| a.name == name) {
            Some(existing) => existing.values = values,
            None => self.attributes.push(Attribute { name, values }),
        }
    }

    /// Builder form of [`AttributeSet::insert`]
    pub fn with<N, I, V>(mut self, name: N, values: I) -> Self
    where
        N: Into<String>,
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.insert(name, values);
        self
    }

    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.values.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.attributes.iter().map(|a| a.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Number of combinations `enumerate` will produce, `None` if it does
    /// not fit in a `usize`.
    pub fn combination_count(&self) -> Option<usize> {
        if self.attributes.is_empty() {
            return Some(0);
        }
        self.attributes
            .iter()
            .try_fold(1usize, |count, a| count.checked_mul(a.values.len()))
    }

    /// Fails when enumerating this set would produce more than `limit`
    /// combinations.
    pub fn check_size(&self, limit: usize) -> Result<usize, CatalogError> {
        match self.combination_count() {
            Some(count) if count <= limit => Ok(count),
            _ => Err(CatalogError::TooManyCombinations { limit }),
        }
    }

    /// Structural checks run before a set is stored on a product, with the
    /// default combination limit.
    pub fn validate(&self) -> Result<(), CatalogError> {
        self.validate_with_limit(DEFAULT_MAX_COMBINATIONS)
    }

    pub fn validate_with_limit(&self, max_combinations: usize) -> Result<(), CatalogError> {
        let mut seen_names = HashSet::new();

        for attribute in &self.attributes {
            if attribute.name.trim().is_empty() {
                return Err(CatalogError::BlankAttributeName);
            }
            if !seen_names.insert(attribute.name.as_str()) {
                return Err(CatalogError::DuplicateAttribute(attribute.name.clone()));
            }
            if attribute.values.is_empty() {
                return Err(CatalogError::EmptyAttribute(attribute.name.clone()));
            }

            let mut seen_values = HashSet::new();
            for value in &attribute.values {
                if !seen_values.insert(value.to_lowercase()) {
                    return Err(CatalogError::DuplicateValue {
                        attribute: attribute.name.clone(),
                        value: value.clone(),
                    });
                }
            }
        }

        self.check_size(max_combinations)?;
        Ok(())
    }

    /// Whether `combination` picks exactly one allowed value for every
    /// attribute of this set and nothing else.
    pub fn admits(&self, combination: &Combination) -> Result<(), CatalogError> {
        if combination.len() != self.attributes.len() {
            return Err(CatalogError::AttributeMismatch {
                expected: self.names().map(String::from).collect(),
                found: combination.names().map(String::from).collect(),
            });
        }

        for attribute in &self.attributes {
            let chosen = combination.get(&attribute.name).ok_or_else(|| {
                CatalogError::AttributeMismatch {
                    expected: self.names().map(String::from).collect(),
                    found: combination.names().map(String::from).collect(),
                }
            })?;

            let allowed = attribute
                .values
                .iter()
                .any(|v| v.to_lowercase() == chosen.to_lowercase());
            if !allowed {
                return Err(CatalogError::ValueNotAllowed {
                    attribute: attribute.name.clone(),
                    value: chosen.to_string(),
                });
            }
        }

        Ok(())
    }
}

impl Serialize for AttributeSet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.attributes.len()))?;
        for attribute in &self.attributes {
            map.serialize_entry(&attribute.name, &attribute.values)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for AttributeSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct AttributeSetVisitor;

        impl<'de> Visitor<'de> for AttributeSetVisitor {
            type Value = AttributeSet;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of attribute name to a list of values")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut set = AttributeSet::new();
                while let Some((name, values)) = access.next_entry::<String, Vec<String>>()? {
                    set.insert(name, values);
                }
                Ok(set)
            }
        }

        deserializer.deserialize_map(AttributeSetVisitor)
    }
}

/// One chosen value per attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Combination(BTreeMap<String, String>);

impl Combination {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Identity used for duplicate detection: same attribute names, values
    /// compared without regard to case.
    pub fn key(&self) -> CombinationKey {
        CombinationKey(
            self.0
                .iter()
                .map(|(name, value)| (name.clone(), value.to_lowercase()))
                .collect(),
        )
    }

    pub fn matches(&self, other: &Combination) -> bool {
        self.key() == other.key()
    }

    /// Human readable label, e.g. `color: Red / size: M`
    pub fn label(&self) -> String {
        self.0
            .iter()
            .map(|(k, v)| format!("{}: {}", k, v))
            .collect::<Vec<_>>()
            .join(" / ")
    }
}

impl fmt::Display for Combination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Combination {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CombinationKey(Vec<(String, String)>);

impl CombinationKey {
    /// Flat text form stored next to a priced combination, so the database
    /// enforces the same identity as [`Combination::key`]. Names and values
    /// are joined with ASCII unit/record separators.
    pub fn to_storage_key(&self) -> String {
        self.0
            .iter()
            .map(|(name, value)| format!("{}\u{1f}{}", name, value))
            .collect::<Vec<_>>()
            .join("\u{1e}")
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum CatalogError {
    #[error("Attribute name must not be blank")]
    BlankAttributeName,

    #[error("Attribute declared twice: {0}")]
    DuplicateAttribute(String),

    #[error("Attribute has no values: {0}")]
    EmptyAttribute(String),

    #[error("Value '{value}' listed twice for attribute {attribute}")]
    DuplicateValue {
        attribute: String,
        value: String,
    },

    #[error("Combination attributes {found:?} do not match {expected:?}")]
    AttributeMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("Value '{value}' is not allowed for attribute {attribute}")]
    ValueNotAllowed {
        attribute: String,
        value: String,
    },

    #[error("Attribute set yields more than {limit} combinations")]
    TooManyCombinations { limit: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_keeps_document_order() {
        let set: AttributeSet =
            serde_json::from_str(r#"{"size": ["S", "M"], "color": ["Red"], "grade": ["A"]}"#)
                .unwrap();

        let names: Vec<&str> = set.names().collect();
        assert_eq!(names, vec!["size", "color", "grade"]);

        let round = serde_json::to_string(&set).unwrap();
        assert_eq!(round, r#"{"size":["S","M"],"color":["Red"],"grade":["A"]}"#);
    }

    #[test]
    fn test_validate_rejects_bad_sets() {
        let empty = AttributeSet::new().with("color", Vec::<String>::new());
        assert_eq!(
            empty.validate(),
            Err(CatalogError::EmptyAttribute("color".to_string()))
        );

        let blank = AttributeSet::new().with("  ", ["x"]);
        assert_eq!(blank.validate(), Err(CatalogError::BlankAttributeName));

        let dup = AttributeSet::new().with("color", ["Red", "red"]);
        assert!(matches!(dup.validate(), Err(CatalogError::DuplicateValue { .. })));

        let ok = AttributeSet::new()
            .with("color", ["Red", "Blue"])
            .with("size", ["S"]);
        assert!(ok.validate().is_ok());
        assert_eq!(ok.combination_count(), Some(2));
    }

    #[test]
    fn test_oversized_sets_are_rejected() {
        let mut wide = AttributeSet::new();
        for i in 0..40 {
            wide.insert(format!("option_{}", i), ["x", "y"]);
        }
        assert_eq!(wide.combination_count(), Some(1 << 40));
        assert_eq!(
            wide.validate(),
            Err(CatalogError::TooManyCombinations {
                limit: DEFAULT_MAX_COMBINATIONS
            })
        );

        for i in 40..64 {
            wide.insert(format!("option_{}", i), ["x", "y"]);
        }
        assert_eq!(wide.combination_count(), None);
        assert!(wide.check_size(usize::MAX).is_err());

        let small = AttributeSet::new()
            .with("color", ["Red", "Blue"])
            .with("size", ["S", "M", "L"]);
        assert_eq!(small.check_size(6), Ok(6));
        assert_eq!(
            small.validate_with_limit(5),
            Err(CatalogError::TooManyCombinations { limit: 5 })
        );
    }

    #[test]
    fn test_admits_checks_keys_and_values() {
        let set = AttributeSet::new()
            .with("color", ["Red", "Blue"])
            .with("size", ["S", "M"]);

        let good = Combination::new().with("color", "red").with("size", "M");
        assert!(set.admits(&good).is_ok());

        let missing = Combination::new().with("color", "Red");
        assert!(matches!(
            set.admits(&missing),
            Err(CatalogError::AttributeMismatch { .. })
        ));

        let extra = Combination::new()
            .with("color", "Red")
            .with("size", "S")
            .with("ram", "8GB");
        assert!(set.admits(&extra).is_err());

        let unknown = Combination::new().with("color", "Green").with("size", "S");
        assert_eq!(
            set.admits(&unknown),
            Err(CatalogError::ValueNotAllowed {
                attribute: "color".to_string(),
                value: "Green".to_string(),
            })
        );
    }

    #[test]
    fn test_combination_matching_ignores_case() {
        let a = Combination::new().with("color", "Red").with("size", "XL");
        let b = Combination::new().with("size", "xl").with("color", "RED");
        let c = Combination::new().with("color", "Red").with("size", "L");

        assert!(a.matches(&b));
        assert!(!a.matches(&c));
        assert_eq!(a.label(), "color: Red / size: XL");
    }

    #[test]
    fn test_storage_key_folds_values_but_not_names() {
        let a = Combination::new().with("color", "Red").with("size", "XL");
        let b = Combination::new().with("size", "xl").with("color", "RED");
        assert_eq!(a.key().to_storage_key(), b.key().to_storage_key());
        assert_eq!(a.key().to_storage_key(), "color\u{1f}red\u{1e}size\u{1f}xl");

        let renamed = Combination::new().with("Color", "Red").with("size", "XL");
        assert_ne!(a.key().to_storage_key(), renamed.key().to_storage_key());
    }
}
