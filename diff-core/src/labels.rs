use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use snitch_diff_client::NodeRecord;
use snitch_diff_client::display_value;

/// Display property per model type.
const DEFAULT_LABELS: &[(&str, &str)] = &[
    ("AptPackage", "name"),
    ("ConfigFile", "name"),
    ("Device", "name"),
    ("Environment", "name"),
    ("GitRemote", "name"),
    ("GitRepo", "path"),
    ("GitUntrackedFile", "path"),
    ("GitUrl", "url"),
    ("Host", "hostname"),
    ("Interface", "device"),
    ("Mount", "mount"),
    ("NameServer", "ip"),
    ("Partition", "name"),
    ("PythonPackage", "name"),
    ("Uservar", "name"),
    ("Virtualenv", "path"),
];

/// Which property names a node of a given model type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabelRules(BTreeMap<String, String>);

impl Default for LabelRules {
    fn default() -> Self {
        Self(
            DEFAULT_LABELS
                .iter()
                .map(|(model, prop)| ((*model).to_string(), (*prop).to_string()))
                .collect(),
        )
    }
}

impl LabelRules {
    /// No model has a display property; every label falls back to the id.
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    pub fn property_for(&self, model: &str) -> Option<&str> {
        self.0.get(model).map(String::as_str)
    }

    pub fn insert(&mut self, model: impl Into<String>, property: impl Into<String>) {
        self.0.insert(model.into(), property.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(m, p)| (m.as_str(), p.as_str()))
    }

    /// `"{model}: {value}"` when the record is loaded and the model has a
    /// display property, otherwise `"{model}: {id}"`.
    ///
    /// A display property missing from all three sides yields an empty value
    /// rather than falling back to the id.
    pub fn label(&self, model: &str, id: &str, record: Option<&NodeRecord>) -> String {
        match (record, self.property_for(model)) {
            (Some(record), Some(prop)) => {
                let value = record.lookup(prop).map(display_value).unwrap_or_default();
                format!("{model}: {value}")
            }
            _ => format!("{model}: {id}"),
        }
    }
}

impl Extend<(String, String)> for LabelRules {
    fn extend<T: IntoIterator<Item = (String, String)>>(&mut self, iter: T) {
        self.0.extend(iter);
    }
}
