//! The target (JavaScript-side) value model.
//!
//! [`JsValue`] models what the host runtime receives from a conversion:
//! primitives, `Array`, `Map` (the default mapping target), plain `Object`
//! records (the `Object.fromEntries` shape a dict converter selects), `Set`,
//! byte buffers, and [`PyProxy`] handles back into the source graph.
//!
//! Like the source model, containers are reference-counted with interior
//! mutability so that a conversion of a cyclic source graph can produce a
//! correctly cyclic target graph.

use std::sync::{Arc, RwLock};

use crate::proxy::PyProxy;
use crate::value::{read_lock, write_lock};

/// A value in the host runtime's value model.
///
/// Equality is structural, with a pointer fast path for shared containers
/// and id equality for proxies. Comparing two *distinct* cyclic graphs may
/// not terminate.
#[derive(Debug, Clone)]
pub enum JsValue {
    /// `undefined`. Python `None` converts to this, matching the original
    /// runtime's boundary behavior.
    Undefined,
    /// `null`. Never produced by the bridge itself, but representable so
    /// that host-built values round-trip.
    Null,
    /// `boolean`.
    Bool(bool),
    /// `number` (IEEE 754 double).
    Number(f64),
    /// `bigint`, used for integers outside the f64-safe range.
    BigInt(i64),
    /// `string`.
    Str(String),
    /// A byte buffer (`Uint8Array`-like).
    Bytes(Vec<u8>),
    /// `Array`.
    Array(JsArray),
    /// `Map`, insertion-ordered. The default target for mappings.
    Map(JsMap),
    /// A plain object record with string keys.
    Object(JsObject),
    /// `Set`.
    Set(JsSet),
    /// A live reference back to the source value.
    Proxy(PyProxy),
}

impl JsValue {
    /// The JavaScript type name of this value, e.g. `"map"`.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::BigInt(_) => "bigint",
            Self::Str(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::Array(_) => "array",
            Self::Map(_) => "map",
            Self::Object(_) => "object",
            Self::Set(_) => "set",
            Self::Proxy(_) => "proxy",
        }
    }

    /// Whether this is `undefined`.
    #[must_use]
    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// The boolean payload, if this is a boolean.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The numeric payload, if this is a number.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The integer payload, if this is a bigint.
    #[must_use]
    pub fn as_bigint(&self) -> Option<i64> {
        match self {
            Self::BigInt(n) => Some(*n),
            _ => None,
        }
    }

    /// The string payload, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The byte payload, if this is a byte buffer.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// The array, if this is an array.
    #[must_use]
    pub fn as_array(&self) -> Option<&JsArray> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    /// The map, if this is a map.
    #[must_use]
    pub fn as_map(&self) -> Option<&JsMap> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    /// The object record, if this is a plain object.
    #[must_use]
    pub fn as_object(&self) -> Option<&JsObject> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    /// The set, if this is a set.
    #[must_use]
    pub fn as_set(&self) -> Option<&JsSet> {
        match self {
            Self::Set(s) => Some(s),
            _ => None,
        }
    }

    /// The proxy, if this is a proxy.
    #[must_use]
    pub fn as_proxy(&self) -> Option<&PyProxy> {
        match self {
            Self::Proxy(p) => Some(p),
            _ => None,
        }
    }
}

impl PartialEq for JsValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) | (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::BigInt(a), Self::BigInt(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Bytes(a), Self::Bytes(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a == b,
            (Self::Set(a), Self::Set(b)) => a == b,
            (Self::Proxy(a), Self::Proxy(b)) => a.id() == b.id(),
            _ => false,
        }
    }
}

impl From<bool> for JsValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for JsValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for JsValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for JsValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

/// A host-side ordered sequence.
#[derive(Clone, Default)]
pub struct JsArray(Arc<RwLock<Vec<JsValue>>>);

impl JsArray {
    /// Create an empty array.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value.
    pub fn push(&self, value: JsValue) {
        write_lock(&self.0).push(value);
    }

    /// The value at `index`, if present.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<JsValue> {
        read_lock(&self.0).get(index).cloned()
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        read_lock(&self.0).len()
    }

    /// Whether the array is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        read_lock(&self.0).is_empty()
    }

    /// A snapshot of the current elements.
    #[must_use]
    pub fn values(&self) -> Vec<JsValue> {
        read_lock(&self.0).clone()
    }

    /// Whether `self` and `other` are the same array object.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn ptr_id(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }
}

impl From<Vec<JsValue>> for JsArray {
    fn from(values: Vec<JsValue>) -> Self {
        Self(Arc::new(RwLock::new(values)))
    }
}

impl PartialEq for JsArray {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || *read_lock(&self.0) == *read_lock(&other.0)
    }
}

impl std::fmt::Debug for JsArray {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsArray").field("len", &self.len()).finish()
    }
}

/// A host-side keyed collection, insertion-ordered.
#[derive(Clone, Default)]
pub struct JsMap(Arc<RwLock<Vec<(JsValue, JsValue)>>>);

impl JsMap {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or update an entry. An existing key keeps its position.
    pub fn set(&self, key: JsValue, value: JsValue) {
        let mut entries = write_lock(&self.0);
        if let Some(slot) = entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            entries.push((key, value));
        }
    }

    /// The value stored under `key`, if any.
    #[must_use]
    pub fn get(&self, key: &JsValue) -> Option<JsValue> {
        read_lock(&self.0)
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    /// The value stored under a string key, if any.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<JsValue> {
        self.get(&JsValue::from(key))
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        read_lock(&self.0).len()
    }

    /// Whether the map is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        read_lock(&self.0).is_empty()
    }

    /// A snapshot of the entries in insertion order.
    #[must_use]
    pub fn entries(&self) -> Vec<(JsValue, JsValue)> {
        read_lock(&self.0).clone()
    }

    /// Whether `self` and `other` are the same map object.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn ptr_id(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }
}

impl PartialEq for JsMap {
    /// Order-insensitive: same keys, same values.
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        let a = self.entries();
        if a.len() != other.len() {
            return false;
        }
        a.iter().all(|(k, v)| other.get(k).as_ref() == Some(v))
    }
}

impl std::fmt::Debug for JsMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsMap").field("len", &self.len()).finish()
    }
}

/// A host-side plain object record with string keys.
#[derive(Clone, Default)]
pub struct JsObject(Arc<RwLock<Vec<(String, JsValue)>>>);

impl JsObject {
    /// Create an empty object.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a property, replacing any existing value.
    pub fn set(&self, name: impl Into<String>, value: JsValue) {
        let name = name.into();
        let mut entries = write_lock(&self.0);
        if let Some(slot) = entries.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            entries.push((name, value));
        }
    }

    /// Read a property.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<JsValue> {
        read_lock(&self.0)
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }

    /// Number of properties.
    #[must_use]
    pub fn len(&self) -> usize {
        read_lock(&self.0).len()
    }

    /// Whether the object has no properties.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        read_lock(&self.0).is_empty()
    }

    /// A snapshot of the properties in insertion order.
    #[must_use]
    pub fn entries(&self) -> Vec<(String, JsValue)> {
        read_lock(&self.0).clone()
    }

    /// Whether `self` and `other` are the same object.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn ptr_id(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }
}

impl PartialEq for JsObject {
    /// Order-insensitive: same properties, same values.
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        let a = self.entries();
        if a.len() != other.len() {
            return false;
        }
        a.iter().all(|(n, v)| other.get(n).as_ref() == Some(v))
    }
}

impl std::fmt::Debug for JsObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsObject").field("len", &self.len()).finish()
    }
}

/// A host-side set-like collection.
#[derive(Clone, Default)]
pub struct JsSet(Arc<RwLock<Vec<JsValue>>>);

impl JsSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value. Returns `false` if an equal value was already present.
    pub fn add(&self, value: JsValue) -> bool {
        let mut values = write_lock(&self.0);
        if values.contains(&value) {
            false
        } else {
            values.push(value);
            true
        }
    }

    /// Whether an equal value is present.
    #[must_use]
    pub fn has(&self, value: &JsValue) -> bool {
        read_lock(&self.0).contains(value)
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        read_lock(&self.0).len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        read_lock(&self.0).is_empty()
    }

    /// A snapshot of the current members.
    #[must_use]
    pub fn values(&self) -> Vec<JsValue> {
        read_lock(&self.0).clone()
    }

    /// Whether `self` and `other` are the same set object.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn ptr_id(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }
}

impl PartialEq for JsSet {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        self.len() == other.len() && self.values().iter().all(|v| other.has(v))
    }
}

impl std::fmt::Debug for JsSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsSet").field("len", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_set_replaces_and_keeps_position() {
        let map = JsMap::new();
        map.set(JsValue::from("a"), JsValue::Number(1.0));
        map.set(JsValue::from("b"), JsValue::Number(2.0));
        map.set(JsValue::from("a"), JsValue::Number(3.0));

        let entries = map.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, JsValue::from("a"));
        assert_eq!(entries[0].1, JsValue::Number(3.0));
    }

    #[test]
    fn object_get_reads_latest_value() {
        let object = JsObject::new();
        object.set("status", JsValue::Number(200.0));
        object.set("status", JsValue::Number(204.0));
        assert_eq!(object.get("status"), Some(JsValue::Number(204.0)));
        assert_eq!(object.len(), 1);
    }

    #[test]
    fn set_deduplicates() {
        let set = JsSet::new();
        assert!(set.add(JsValue::Number(1.0)));
        assert!(!set.add(JsValue::Number(1.0)));
        assert_eq!(set.len(), 1);
    }
}
