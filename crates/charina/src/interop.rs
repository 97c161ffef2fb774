//! JSON interop and host-value re-ingestion.
//!
//! The surrounding runtime marshals callback payloads as JSON, so source
//! graphs are frequently built from [`serde_json::Value`]s
//! (`PyValue::from`) and converted results inspected as JSON
//! ([`JsValue::to_json`]). Re-ingestion ([`PyValue::from_js`]) turns a host
//! value back into a source value, unwrapping proxies to their original
//! referents, which is what makes round-tripping across the boundary
//! possible.

use std::collections::HashSet;

use crate::bridge::MAX_SAFE_INTEGER;
use crate::converter::property_key;
use crate::error::{ConversionError, CyclicStructureError, PathSegment, ValuePath};
use crate::js::JsValue;
use crate::value::{PyDict, PyList, PySet, PyValue};

/// Errors raised while rendering a host value as JSON.
#[derive(Debug, thiserror::Error)]
pub enum JsonError {
    /// The value has no JSON representation (a proxy, or a map key that is
    /// not coercible to a property name).
    #[error("{type_name} at {path} has no JSON representation")]
    Unrepresentable {
        /// JavaScript type name of the offending value.
        type_name: String,
        /// Where the value sits in the host graph.
        path: ValuePath,
    },

    /// The value graph is cyclic; JSON is strictly a tree.
    #[error(transparent)]
    Cyclic(#[from] CyclicStructureError),
}

impl From<serde_json::Value> for PyValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::None,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Int(i)
                } else {
                    Self::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Self::Str(s),
            serde_json::Value::Array(items) => {
                let list = PyList::new();
                for item in items {
                    list.push(Self::from(item));
                }
                Self::List(list)
            }
            serde_json::Value::Object(map) => {
                let dict = PyDict::new();
                for (key, value) in map {
                    dict.insert(Self::Str(key), Self::from(value));
                }
                Self::Dict(dict)
            }
        }
    }
}

impl JsValue {
    /// Render this value as JSON.
    ///
    /// Follows `JSON.stringify` conventions where they exist: `undefined`
    /// and non-finite numbers become `null`, sets and byte buffers are
    /// rendered as arrays, map keys are coerced to property names.
    ///
    /// # Errors
    ///
    /// Returns [`JsonError::Unrepresentable`] for proxies and uncoercible
    /// map keys, and [`JsonError::Cyclic`] for cyclic graphs.
    pub fn to_json(&self) -> Result<serde_json::Value, JsonError> {
        let mut cx = ExtractCx {
            in_progress: HashSet::new(),
            path: Vec::new(),
        };
        cx.extract(self)
    }
}

impl TryFrom<&JsValue> for serde_json::Value {
    type Error = JsonError;

    fn try_from(value: &JsValue) -> Result<Self, Self::Error> {
        value.to_json()
    }
}

struct ExtractCx {
    /// Identities of containers currently on the traversal stack.
    in_progress: HashSet<usize>,
    path: Vec<PathSegment>,
}

impl ExtractCx {
    fn current_path(&self) -> ValuePath {
        ValuePath::from_segments(&self.path)
    }

    fn enter(&mut self, id: usize, type_name: &str) -> Result<(), JsonError> {
        if !self.in_progress.insert(id) {
            return Err(CyclicStructureError {
                type_name: type_name.to_string(),
                path: self.current_path(),
            }
            .into());
        }
        Ok(())
    }

    fn extract(&mut self, value: &JsValue) -> Result<serde_json::Value, JsonError> {
        match value {
            JsValue::Undefined | JsValue::Null => Ok(serde_json::Value::Null),
            JsValue::Bool(b) => Ok(serde_json::Value::Bool(*b)),
            JsValue::Number(n) => {
                // Integral numbers render without a fractional part, and
                // non-finite numbers as null, as JSON.stringify does.
                if n.is_finite() && n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER as f64 {
                    Ok(serde_json::Value::from(*n as i64))
                } else {
                    Ok(serde_json::Number::from_f64(*n)
                        .map_or(serde_json::Value::Null, serde_json::Value::Number))
                }
            }
            JsValue::BigInt(n) => Ok(serde_json::Value::Number((*n).into())),
            JsValue::Str(s) => Ok(serde_json::Value::String(s.clone())),
            JsValue::Bytes(b) => Ok(serde_json::Value::Array(
                b.iter().map(|byte| serde_json::Value::from(*byte)).collect(),
            )),
            JsValue::Array(array) => {
                self.enter(array.ptr_id(), "array")?;
                let mut items = Vec::with_capacity(array.len());
                for (index, item) in array.values().iter().enumerate() {
                    self.path.push(PathSegment::Index(index));
                    items.push(self.extract(item)?);
                    self.path.pop();
                }
                self.in_progress.remove(&array.ptr_id());
                Ok(serde_json::Value::Array(items))
            }
            JsValue::Map(map) => {
                self.enter(map.ptr_id(), "map")?;
                let mut object = serde_json::Map::new();
                for (key, entry) in map.entries() {
                    let Some(name) = property_key(&key) else {
                        self.path.push(PathSegment::Key(key.type_name().to_string()));
                        return Err(JsonError::Unrepresentable {
                            type_name: key.type_name().to_string(),
                            path: self.current_path(),
                        });
                    };
                    self.path.push(PathSegment::Key(name.clone()));
                    object.insert(name, self.extract(&entry)?);
                    self.path.pop();
                }
                self.in_progress.remove(&map.ptr_id());
                Ok(serde_json::Value::Object(object))
            }
            JsValue::Object(record) => {
                self.enter(record.ptr_id(), "object")?;
                let mut object = serde_json::Map::new();
                for (name, entry) in record.entries() {
                    self.path.push(PathSegment::Key(name.clone()));
                    object.insert(name, self.extract(&entry)?);
                    self.path.pop();
                }
                self.in_progress.remove(&record.ptr_id());
                Ok(serde_json::Value::Object(object))
            }
            JsValue::Set(set) => {
                self.enter(set.ptr_id(), "set")?;
                let mut items = Vec::with_capacity(set.len());
                for member in set.values() {
                    self.path.push(PathSegment::SetMember);
                    items.push(self.extract(&member)?);
                    self.path.pop();
                }
                self.in_progress.remove(&set.ptr_id());
                Ok(serde_json::Value::Array(items))
            }
            JsValue::Proxy(_) => Err(JsonError::Unrepresentable {
                type_name: "proxy".to_string(),
                path: self.current_path(),
            }),
        }
    }
}

impl PyValue {
    /// Re-ingest a host value as a source value.
    ///
    /// Arrays become lists, maps and plain objects become dicts, sets
    /// become sets, and a proxy unwraps back to the source value it
    /// references, preserving identity across a round trip. Integral
    /// numbers within the f64-safe range become `int`.
    ///
    /// # Errors
    ///
    /// * [`ConversionError::ProxyDestroyed`] when a destroyed proxy is
    ///   encountered.
    /// * [`ConversionError::Cyclic`] when a cycle re-enters through a set
    ///   member.
    pub fn from_js(value: &JsValue) -> Result<Self, ConversionError> {
        let mut cx = IngestCx {
            memo: std::collections::HashMap::new(),
            path: Vec::new(),
        };
        cx.ingest(value)
    }
}

enum IngestMemo {
    InProgress,
    Done(PyValue),
}

struct IngestCx {
    memo: std::collections::HashMap<usize, IngestMemo>,
    path: Vec<PathSegment>,
}

impl IngestCx {
    fn current_path(&self) -> ValuePath {
        ValuePath::from_segments(&self.path)
    }

    fn check_memo(&self, id: usize, type_name: &str) -> Option<Result<PyValue, ConversionError>> {
        match self.memo.get(&id) {
            Some(IngestMemo::Done(value)) => Some(Ok(value.clone())),
            Some(IngestMemo::InProgress) => Some(Err(CyclicStructureError {
                type_name: type_name.to_string(),
                path: self.current_path(),
            }
            .into())),
            None => None,
        }
    }

    fn ingest(&mut self, value: &JsValue) -> Result<PyValue, ConversionError> {
        match value {
            JsValue::Undefined | JsValue::Null => Ok(PyValue::None),
            JsValue::Bool(b) => Ok(PyValue::Bool(*b)),
            JsValue::Number(n) => Ok(ingest_number(*n)),
            JsValue::BigInt(n) => Ok(PyValue::Int(*n)),
            JsValue::Str(s) => Ok(PyValue::Str(s.clone())),
            JsValue::Bytes(b) => Ok(PyValue::Bytes(b.clone())),
            JsValue::Array(array) => {
                if let Some(seen) = self.check_memo(array.ptr_id(), "array") {
                    return seen;
                }
                let list = PyList::new();
                self.memo
                    .insert(array.ptr_id(), IngestMemo::Done(PyValue::List(list.clone())));
                for (index, item) in array.values().iter().enumerate() {
                    self.path.push(PathSegment::Index(index));
                    list.push(self.ingest(item)?);
                    self.path.pop();
                }
                Ok(PyValue::List(list))
            }
            JsValue::Map(map) => {
                if let Some(seen) = self.check_memo(map.ptr_id(), "map") {
                    return seen;
                }
                let dict = PyDict::new();
                self.memo
                    .insert(map.ptr_id(), IngestMemo::Done(PyValue::Dict(dict.clone())));
                for (key, entry) in map.entries() {
                    self.path
                        .push(PathSegment::Key(key.type_name().to_string()));
                    let ingested_key = self.ingest(&key)?;
                    let ingested_value = self.ingest(&entry)?;
                    self.path.pop();
                    dict.insert(ingested_key, ingested_value);
                }
                Ok(PyValue::Dict(dict))
            }
            JsValue::Object(record) => {
                if let Some(seen) = self.check_memo(record.ptr_id(), "object") {
                    return seen;
                }
                let dict = PyDict::new();
                self.memo.insert(
                    record.ptr_id(),
                    IngestMemo::Done(PyValue::Dict(dict.clone())),
                );
                for (name, entry) in record.entries() {
                    self.path.push(PathSegment::Key(name.clone()));
                    let ingested = self.ingest(&entry)?;
                    self.path.pop();
                    dict.insert(PyValue::Str(name), ingested);
                }
                Ok(PyValue::Dict(dict))
            }
            JsValue::Set(set) => {
                if let Some(seen) = self.check_memo(set.ptr_id(), "set") {
                    return seen;
                }
                self.memo.insert(set.ptr_id(), IngestMemo::InProgress);
                let target = PySet::new();
                for member in set.values() {
                    self.path.push(PathSegment::SetMember);
                    let ingested = self.ingest(&member)?;
                    self.path.pop();
                    target.insert(ingested);
                }
                self.memo
                    .insert(set.ptr_id(), IngestMemo::Done(PyValue::Set(target.clone())));
                Ok(PyValue::Set(target))
            }
            JsValue::Proxy(proxy) => proxy.value(),
        }
    }
}

/// Narrow a host number back to the source numeric model.
fn ingest_number(n: f64) -> PyValue {
    if n.is_finite() && n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER as f64 {
        PyValue::Int(n as i64)
    } else {
        PyValue::Float(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::convert;
    use crate::js::JsArray;

    #[test]
    fn json_round_trips_through_the_bridge() {
        let source = PyValue::from(serde_json::json!({
            "status": 204,
            "headers": {"Access-Control-Allow-Origin": "*"},
            "tags": ["a", "b"],
            "ratio": 0.5,
            "ok": true,
            "body": null,
        }));
        let converted = convert(&source).unwrap();
        let back = converted.to_json().unwrap();
        assert_eq!(
            back,
            serde_json::json!({
                "status": 204,
                "headers": {"Access-Control-Allow-Origin": "*"},
                "tags": ["a", "b"],
                "ratio": 0.5,
                "ok": true,
                "body": null,
            })
        );
    }

    #[test]
    fn non_finite_numbers_render_as_null() {
        assert_eq!(
            JsValue::Number(f64::NAN).to_json().unwrap(),
            serde_json::Value::Null
        );
    }

    #[test]
    fn cyclic_host_values_do_not_serialize() {
        let array = JsArray::new();
        array.push(JsValue::Array(array.clone()));
        assert!(matches!(
            JsValue::Array(array).to_json(),
            Err(JsonError::Cyclic(_))
        ));
    }

    #[test]
    fn ingest_narrows_integral_numbers() {
        assert_eq!(
            PyValue::from_js(&JsValue::Number(3.0)).unwrap(),
            PyValue::Int(3)
        );
        assert_eq!(
            PyValue::from_js(&JsValue::Number(3.5)).unwrap(),
            PyValue::Float(3.5)
        );
    }

    #[test]
    fn ingest_ties_cyclic_arrays() {
        let array = JsArray::new();
        array.push(JsValue::Array(array.clone()));
        let PyValue::List(list) = PyValue::from_js(&JsValue::Array(array)).unwrap() else {
            panic!("expected a list");
        };
        let PyValue::List(inner) = list.get(0).unwrap() else {
            panic!("expected a nested list");
        };
        assert!(inner.ptr_eq(&list));
    }
}
