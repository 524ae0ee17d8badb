//! Directory record resolution
//!
//! Resolution runs in two stages: directory attribute names to intermediate
//! keys (first present, non-empty source wins), then intermediate keys to
//! store columns through the fixed [`Projection`].

use std::collections::BTreeMap;

use crate::mapping::{AttributeMapping, Projection};

/// Store column to resolved value
pub type ResolvedAttributes = BTreeMap<String, String>;

/// Pseudo-attribute addressing the entry DN
const DN_ATTRIBUTE: &str = "dn";

/// Attributes of exactly one matched directory entry
///
/// Attribute names are compared ASCII case-insensitively, as LDAP attribute
/// descriptions are.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawDirectoryRecord {
    dn: String,
    attributes: BTreeMap<String, Vec<String>>,
}

impl RawDirectoryRecord {
    /// Create an empty record for the entry at `dn`
    #[must_use]
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Builder-style [`Self::insert`]
    #[must_use]
    pub fn with_attribute<I, V>(mut self, name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.insert(name, values);
        self
    }

    /// Add values for an attribute, appending to any existing values
    pub fn insert<I, V>(&mut self, name: &str, values: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.attributes
            .entry(name.to_ascii_lowercase())
            .or_default()
            .extend(values.into_iter().map(Into::into));
    }

    /// Distinguished name of the entry
    #[must_use]
    pub fn dn(&self) -> &str {
        &self.dn
    }

    /// Value of an attribute, non-empty values joined by a single space
    ///
    /// Returns `None` when the attribute is absent or every value is empty.
    /// `dn` falls back to the entry DN unless the entry carries a real
    /// attribute of that name.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<String> {
        let joined = match self.attributes.get(&name.to_ascii_lowercase()) {
            Some(values) => values
                .iter()
                .filter(|value| !value.is_empty())
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(" "),
            None if name.eq_ignore_ascii_case(DN_ATTRIBUTE) => self.dn.clone(),
            None => return None,
        };

        if joined.is_empty() { None } else { Some(joined) }
    }
}

/// Outcome of resolving one directory record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Projected store columns with their values
    pub attributes: ResolvedAttributes,
    /// Intermediate keys for which no source had a value
    pub unresolved: Vec<String>,
}

/// Resolves raw directory records into store columns
pub struct DirectoryResolver;

impl DirectoryResolver {
    /// Resolve one value per intermediate key
    ///
    /// For each key the sources are scanned in order and the first present,
    /// non-empty value wins. Keys without any value are left out.
    #[must_use]
    pub fn resolve_intermediate(
        mapping: &AttributeMapping,
        raw: &RawDirectoryRecord,
    ) -> BTreeMap<String, String> {
        mapping
            .iter()
            .filter_map(|(key, sources)| {
                sources
                    .iter()
                    .find_map(|source| raw.value(source))
                    .map(|value| (key.to_string(), value))
            })
            .collect()
    }

    /// Resolve and project a raw record onto store columns
    ///
    /// Intermediate keys the projection does not know are dropped silently.
    #[must_use]
    pub fn resolve(
        mapping: &AttributeMapping,
        projection: &Projection,
        raw: &RawDirectoryRecord,
    ) -> Resolution {
        let intermediate = Self::resolve_intermediate(mapping, raw);

        let unresolved = mapping
            .iter()
            .map(|(key, _)| key)
            .filter(|key| !intermediate.contains_key(*key))
            .map(str::to_string)
            .collect();

        let attributes = intermediate
            .into_iter()
            .filter_map(|(key, value)| {
                projection
                    .column_for(&key)
                    .map(|column| (column.to_string(), value))
            })
            .collect();

        Resolution {
            attributes,
            unresolved,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::keys;

    fn alice() -> RawDirectoryRecord {
        RawDirectoryRecord::new("uid=alice,ou=people,dc=example,dc=org")
            .with_attribute("cn", ["Alice Liddell"])
            .with_attribute("mail", ["alice@example.org"])
            .with_attribute("uid", ["alice"])
    }

    #[test]
    fn test_value_joins_multiple_values() {
        let raw = RawDirectoryRecord::new("cn=x").with_attribute("cn", ["Alice", "Liddell"]);
        assert_eq!(raw.value("cn").as_deref(), Some("Alice Liddell"));
    }

    #[test]
    fn test_value_is_case_insensitive() {
        let raw = RawDirectoryRecord::new("cn=x").with_attribute("givenName", ["Alice"]);
        assert_eq!(raw.value("givenname").as_deref(), Some("Alice"));
        assert_eq!(raw.value("GIVENNAME").as_deref(), Some("Alice"));
    }

    #[test]
    fn test_value_dn_pseudo_attribute() {
        let raw = alice();
        assert_eq!(
            raw.value("dn").as_deref(),
            Some("uid=alice,ou=people,dc=example,dc=org")
        );
        assert_eq!(RawDirectoryRecord::new("").value("dn"), None);
    }

    #[test]
    fn test_value_empty_is_absent() {
        let raw = RawDirectoryRecord::new("cn=x").with_attribute("mail", [""]);
        assert_eq!(raw.value("mail"), None);
        assert_eq!(raw.value("missing"), None);
    }

    #[test]
    fn test_value_all_empty_values_are_absent() {
        let raw = RawDirectoryRecord::new("cn=x")
            .with_attribute("mail", ["", ""])
            .with_attribute("cn", ["", "Alice", ""]);

        assert_eq!(raw.value("mail"), None);
        assert_eq!(raw.value("cn").as_deref(), Some("Alice"));

        let resolution =
            DirectoryResolver::resolve(&AttributeMapping::defaults(), &Projection::GREENLIGHT, &raw);
        assert!(!resolution.attributes.contains_key("email"));
        assert!(resolution.unresolved.contains(&"email".to_string()));
    }

    #[test]
    fn test_resolve_default_mapping() {
        let resolution =
            DirectoryResolver::resolve(&AttributeMapping::defaults(), &Projection::GREENLIGHT, &alice());

        assert_eq!(resolution.attributes["name"], "Alice Liddell");
        assert_eq!(resolution.attributes["email"], "alice@example.org");
        assert_eq!(resolution.attributes["username"], "alice");
        assert!(!resolution.attributes.contains_key("image"));
        assert!(resolution.unresolved.contains(&keys::IMAGE.to_string()));
    }

    #[test]
    fn test_first_present_source_wins() {
        let mapping = AttributeMapping::defaults();
        let raw = RawDirectoryRecord::new("cn=x")
            .with_attribute("mail", ["first@example.org"])
            .with_attribute("userPrincipalName", ["third@example.org"]);

        let intermediate = DirectoryResolver::resolve_intermediate(&mapping, &raw);
        assert_eq!(intermediate[keys::EMAIL], "first@example.org");
    }

    #[test]
    fn test_empty_preferred_source_falls_back() {
        let mapping = AttributeMapping::build("email=primaryMail").unwrap();
        let raw = RawDirectoryRecord::new("cn=x")
            .with_attribute("primaryMail", [""])
            .with_attribute("mail", ["fallback@example.org"]);

        let intermediate = DirectoryResolver::resolve_intermediate(&mapping, &raw);
        assert_eq!(intermediate[keys::EMAIL], "fallback@example.org");
    }

    #[test]
    fn test_unresolved_key_is_omitted() {
        let raw = RawDirectoryRecord::new("cn=x").with_attribute("cn", ["Alice"]);
        let resolution =
            DirectoryResolver::resolve(&AttributeMapping::defaults(), &Projection::GREENLIGHT, &raw);

        assert_eq!(resolution.attributes.len(), 1);
        assert!(!resolution.attributes.contains_key("email"));
        assert!(!resolution.attributes.values().any(String::is_empty));
    }

    #[test]
    fn test_unprojected_key_is_resolved_but_not_emitted() {
        let mapping = AttributeMapping::defaults();
        let raw = alice().with_attribute("givenName", ["Alice"]);

        let intermediate = DirectoryResolver::resolve_intermediate(&mapping, &raw);
        assert_eq!(intermediate[keys::FIRST_NAME], "Alice");
        assert_eq!(intermediate[keys::UID], "uid=alice,ou=people,dc=example,dc=org");

        let resolution = DirectoryResolver::resolve(&mapping, &Projection::GREENLIGHT, &raw);
        assert!(!resolution.attributes.values().any(|v| v == "Alice"));
        assert!(!resolution.unresolved.contains(&keys::FIRST_NAME.to_string()));
    }

    #[test]
    fn test_override_takes_precedence_end_to_end() {
        let mapping = AttributeMapping::build("email=userPrincipalName").unwrap();
        let raw = RawDirectoryRecord::new("cn=x")
            .with_attribute("mail", ["a@x.com"])
            .with_attribute("userPrincipalName", ["b@x.com"]);

        let resolution = DirectoryResolver::resolve(&mapping, &Projection::GREENLIGHT, &raw);
        assert_eq!(resolution.attributes["email"], "b@x.com");
    }
}
