//! dApp catalog: the immutable, name-keyed set of descriptors loaded at startup.
//!
//! Records are deserialized leniently. Only `name` is required at load time; a
//! field that is absent or holds a value of the wrong type loads as `None`, and
//! everything the unit renderer needs is checked when content is generated. A
//! single malformed record therefore never prevents the rest of the catalog from
//! mounting.

use crate::error::CatalogError;
use crate::path::is_valid_name;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

/// Deserialize a field, loading a value of the wrong type as `None`
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// A port exposed by a dApp container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    #[serde(default, deserialize_with = "lenient")]
    pub port: Option<u16>,

    #[serde(default, deserialize_with = "lenient")]
    pub protocol: Option<String>,

    /// Exposure type: `public`, `private`, ...
    #[serde(default, rename = "type", deserialize_with = "lenient")]
    pub kind: Option<String>,
}

impl Port {
    pub fn new(port: u16, protocol: &str, kind: &str) -> Self {
        Self {
            port: Some(port),
            protocol: Some(protocol.to_string()),
            kind: Some(kind.to_string()),
        }
    }

    /// Public ports get a `forward-port@` dependency in the generated unit.
    pub fn is_public(&self) -> bool {
        self.kind.as_deref() == Some("public")
    }
}

/// One catalog record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DappDescriptor {
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub image: Option<String>,

    #[serde(default)]
    pub ports: Option<Vec<Port>>,
}

impl DappDescriptor {
    pub fn new(name: &str, description: &str, image: &str, ports: Vec<Port>) -> Self {
        Self {
            name: name.to_string(),
            description: Some(description.to_string()),
            image: Some(image.to_string()),
            ports: Some(ports),
        }
    }
}

/// Raw record shape; `name` is optional here so a missing name is reported
/// with its position instead of as an opaque serde error.
#[derive(Deserialize)]
struct RawRecord {
    #[serde(default, deserialize_with = "lenient")]
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    description: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    image: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    ports: Option<Vec<Port>>,
}

/// Immutable mapping from dApp name to descriptor.
///
/// Iteration follows the order in which each name first appeared in the source.
/// When a name appears more than once the last record wins.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<DappDescriptor>,
    index: HashMap<String, usize>,
}

impl Catalog {
    /// Build a catalog from already-parsed descriptors
    pub fn from_descriptors<I>(descriptors: I) -> Self
    where
        I: IntoIterator<Item = DappDescriptor>,
    {
        let mut catalog = Catalog::default();
        for descriptor in descriptors {
            catalog.insert(descriptor);
        }
        catalog
    }

    /// Parse a catalog from a JSON array of records
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let records: Vec<RawRecord> = serde_json::from_str(json)?;
        let mut descriptors = Vec::with_capacity(records.len());

        for (index, record) in records.into_iter().enumerate() {
            let name = record.name.ok_or_else(|| CatalogError::InvalidRecord {
                index,
                reason: "missing or invalid field `name`".to_string(),
            })?;
            if !is_valid_name(&name) {
                return Err(CatalogError::InvalidRecord {
                    index,
                    reason: format!(
                        "name {:?} must contain only letters, digits, '-' and '_'",
                        name
                    ),
                });
            }
            descriptors.push(DappDescriptor {
                name,
                description: record.description,
                image: record.image,
                ports: record.ports,
            });
        }

        Ok(Self::from_descriptors(descriptors))
    }

    /// Load a catalog from a JSON file on disk
    pub fn load_from_file(path: &Path) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_json_str(&json)?;
        debug!(path = %path.display(), entries = catalog.len(), "Loaded catalog");
        Ok(catalog)
    }

    fn insert(&mut self, descriptor: DappDescriptor) {
        match self.index.get(&descriptor.name) {
            Some(&slot) => {
                warn!(name = %descriptor.name, "Duplicate dApp name in catalog; last record wins");
                self.entries[slot] = descriptor;
            }
            None => {
                self.index
                    .insert(descriptor.name.clone(), self.entries.len());
                self.entries.push(descriptor);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&DappDescriptor> {
        self.index.get(name).map(|&slot| &self.entries[slot])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Names in catalog iteration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|d| d.name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &DappDescriptor> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
