//! Display names for features with arbitrary property schemas.
//!
//! Datasets come from GADM, geoBoundaries, HDX and national agencies, each
//! naming its columns differently, so the name is looked up heuristically.

use serde_json::Value;

use crate::models::PropertyBag;

/// Shown when a feature has neither a name nor a traceable code.
pub const NO_NAME: &str = "(no name)";

/// Name-like keys, most specific first.
const PRIORITY_KEYS: &[&str] = &[
    "name",
    "NAME",
    "NAME_EN",
    "NAME_ENG",
    "NAME_LOCAL",
    "NAME_1",
    "NAME_2",
    "NAME_3",
    "NAME_4",
    "NL_NAME_1",
    "NL_NAME_2",
    "NL_NAME_3",
    "NL_NAME_4",
    "shapeName",
    "shapeName_en",
    "shapeName_local",
    "ADM1_EN",
    "ADM2_EN",
    "ADM3_EN",
    "ADM4_EN",
    "ADM1_LC",
    "ADM2_LC",
    "ADM3_LC",
    "ADM4_LC",
    "PROV_NAME",
    "DIST_NAME",
    "TAM_NAME",
    "VIL_NAME",
];

/// Identifier keys used to label anonymous features.
const CODE_KEYS: &[&str] = &[
    "GID_0",
    "GID_1",
    "GID_2",
    "GID_3",
    "GID_4",
    "HASC_1",
    "HASC_2",
    "shapeID",
    "shapeGroup",
];

/// Which rule produced a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameSource {
    PriorityKey,
    KeyScan,
    Code,
    Placeholder,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedName {
    pub name: String,
    pub source: NameSource,
}

impl ResolvedName {
    fn new(name: String, source: NameSource) -> Self {
        Self { name, source }
    }

    pub fn is_placeholder(&self) -> bool {
        self.source == NameSource::Placeholder
    }
}

/// Resolve a display name from a property bag. Never returns an empty string.
pub fn resolve_name(props: &PropertyBag) -> ResolvedName {
    for key in PRIORITY_KEYS {
        if let Some(name) = props.get(*key).and_then(non_empty) {
            return ResolvedName::new(name, NameSource::PriorityKey);
        }
    }

    for (key, value) in props {
        if key.to_lowercase().contains("name") {
            if let Some(name) = non_empty(value) {
                return ResolvedName::new(name, NameSource::KeyScan);
            }
        }
    }

    for key in CODE_KEYS {
        if let Some(value) = props.get(*key) {
            let code = value_text(value);
            return ResolvedName::new(format!("(no name: {}={})", key, code), NameSource::Code);
        }
    }

    ResolvedName::new(NO_NAME.to_string(), NameSource::Placeholder)
}

/// Up to ten keys of the bag, for dataset-quality diagnostics.
pub fn sample_keys(props: &PropertyBag) -> String {
    props.keys().take(10).map(String::as_str).collect::<Vec<_>>().join(", ")
}

fn non_empty(value: &Value) -> Option<String> {
    if value.is_null() {
        return None;
    }
    let text = value_text(value).trim().to_string();
    (!text.is_empty()).then_some(text)
}

/// Display text of a property value. Floats print in shortest form, so `1.0` is `1`.
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) if n.is_f64() => n.as_f64().map(|f| f.to_string()).unwrap_or_default(),
        other => other.to_string(),
    }
}
