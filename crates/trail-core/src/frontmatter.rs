//! Front matter codec: a YAML header between `---` delimiters, then an opaque body.
//!
//! Header values are restricted to scalars (string, integer, float, boolean)
//! and one level of nested scalar maps, which is all artifacts carry (the
//! `related` map being the only nested field in practice).

use crate::error::{Result, TrailError};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Header key holding paths of artifacts this one depends on or supersedes.
pub const RELATED: &str = "related";

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Int(n) => write!(f, "{n}"),
            Scalar::Float(x) => write!(f, "{x}"),
            Scalar::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Text(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::Text(s)
    }
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self {
        Scalar::Int(n)
    }
}

impl From<f64> for Scalar {
    fn from(x: f64) -> Self {
        Scalar::Float(x)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Scalar(Scalar),
    Map(BTreeMap<String, Scalar>),
}

impl From<Scalar> for FieldValue {
    fn from(s: Scalar) -> Self {
        FieldValue::Scalar(s)
    }
}

impl From<BTreeMap<String, Scalar>> for FieldValue {
    fn from(m: BTreeMap<String, Scalar>) -> Self {
        FieldValue::Map(m)
    }
}

macro_rules! scalar_field {
    ($($t:ty),*) => {
        $(impl From<$t> for FieldValue {
            fn from(v: $t) -> Self {
                FieldValue::Scalar(Scalar::from(v))
            }
        })*
    };
}

scalar_field!(&str, String, i64, f64, bool);

// ---------------------------------------------------------------------------
// FrontMatter
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrontMatter(BTreeMap<String, FieldValue>);

impl FrontMatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<FieldValue> {
        self.0.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.0.get(key)? {
            FieldValue::Scalar(s) => s.as_str(),
            FieldValue::Map(_) => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn related(&self) -> Option<&BTreeMap<String, Scalar>> {
        match self.0.get(RELATED)? {
            FieldValue::Map(m) => Some(m),
            FieldValue::Scalar(_) => None,
        }
    }

    /// Path recorded under `related.<name>`, if any.
    pub fn related_path(&self, name: &str) -> Option<&str> {
        self.related()?.get(name)?.as_str()
    }

    /// Record `related.<name> = path`. A scalar `related` field is replaced by a map.
    pub fn set_related(&mut self, name: impl Into<String>, path: impl Into<String>) {
        let entry = self
            .0
            .entry(RELATED.to_string())
            .or_insert_with(|| FieldValue::Map(BTreeMap::new()));
        if let FieldValue::Scalar(_) = entry {
            *entry = FieldValue::Map(BTreeMap::new());
        }
        if let FieldValue::Map(m) = entry {
            m.insert(name.into(), Scalar::Text(path.into()));
        }
    }

    /// Overlay `other` onto `self`: its fields win, `related` maps are unioned.
    pub fn merge(&mut self, other: FrontMatter) {
        for (key, value) in other.0 {
            match (self.0.get_mut(&key), value) {
                (Some(FieldValue::Map(mine)), FieldValue::Map(theirs)) if key == RELATED => {
                    mine.extend(theirs);
                }
                (_, value) => {
                    self.0.insert(key, value);
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Codec
// ---------------------------------------------------------------------------

/// Split `raw` into header text and body. `None` when the delimiters are missing.
fn split(raw: &str) -> Option<(&str, &str)> {
    let rest = raw.strip_prefix("---")?;
    let rest = rest
        .strip_prefix('\n')
        .or_else(|| rest.strip_prefix("\r\n"))?;

    // Closing delimiter: a line consisting of exactly `---`.
    let mut line_start = 0;
    loop {
        let line_end = rest[line_start..]
            .find('\n')
            .map(|i| line_start + i)
            .unwrap_or(rest.len());
        let line = rest[line_start..line_end].trim_end_matches('\r');
        if line == "---" {
            let body_start = (line_end + 1).min(rest.len());
            return Some((&rest[..line_start], &rest[body_start..]));
        }
        if line_end >= rest.len() {
            return None;
        }
        line_start = line_end + 1;
    }
}

fn scalar_from(value: Value, field: &str) -> std::result::Result<Option<Scalar>, String> {
    match value {
        Value::Null => Ok(None),
        Value::Bool(b) => Ok(Some(Scalar::Bool(b))),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Ok(Some(Scalar::Int(i))),
            None => n
                .as_f64()
                .map(|x| Some(Scalar::Float(x)))
                .ok_or_else(|| format!("field '{field}': unrepresentable number")),
        },
        Value::String(s) => Ok(Some(Scalar::Text(s))),
        Value::Sequence(_) => Err(format!("field '{field}': lists are not supported")),
        Value::Mapping(_) => Err(format!("field '{field}': nesting deeper than one level")),
        Value::Tagged(_) => Err(format!("field '{field}': tagged values are not supported")),
    }
}

fn header_from(text: &str) -> std::result::Result<FrontMatter, String> {
    let value: Value = serde_yaml::from_str(text).map_err(|e| e.to_string())?;
    let mapping = match value {
        Value::Null => return Ok(FrontMatter::new()),
        Value::Mapping(m) => m,
        _ => return Err("header is not a key/value mapping".to_string()),
    };

    let mut fm = FrontMatter::new();
    for (key, value) in mapping {
        let Some(key) = key.as_str().map(str::to_string) else {
            return Err("header keys must be strings".to_string());
        };
        match value {
            Value::Mapping(inner) => {
                let mut map = BTreeMap::new();
                for (k, v) in inner {
                    let Some(k) = k.as_str().map(str::to_string) else {
                        return Err(format!("field '{key}': keys must be strings"));
                    };
                    if let Some(s) = scalar_from(v, &format!("{key}.{k}"))? {
                        map.insert(k, s);
                    }
                }
                fm.0.insert(key, FieldValue::Map(map));
            }
            other => {
                if let Some(s) = scalar_from(other, &key)? {
                    fm.0.insert(key, FieldValue::Scalar(s));
                }
            }
        }
    }
    Ok(fm)
}

/// Parse a raw artifact into its header and body.
///
/// `origin` names the document in error messages (usually its path).
pub fn parse(raw: &str, origin: &str) -> Result<(FrontMatter, String)> {
    let malformed = |reason: String| TrailError::MalformedArtifact {
        path: origin.to_string(),
        reason,
    };
    let (header, body) =
        split(raw).ok_or_else(|| malformed("missing '---' header delimiters".to_string()))?;
    let fm = header_from(header).map_err(malformed)?;
    Ok((fm, body.to_string()))
}

/// Render header and body in the format [`parse`] reads.
pub fn serialize(fm: &FrontMatter, body: &str) -> Result<String> {
    let header = serde_yaml::to_string(fm)?;
    let mut out = String::with_capacity(header.len() + body.len() + 8);
    out.push_str("---\n");
    out.push_str(&header);
    if !header.ends_with('\n') {
        out.push('\n');
    }
    out.push_str("---\n");
    out.push_str(body);
    Ok(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
