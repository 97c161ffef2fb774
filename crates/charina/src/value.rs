//! The source (Python-side) value model.
//!
//! [`PyValue`] models the guest value graph handed to the bridge: primitives,
//! ordered sequences, mappings with insertion order, sets, and opaque
//! caller-defined objects. Composite values are reference-counted with
//! interior mutability, so the same node can appear in several places (or in
//! a cycle) and mutations made after conversion remain visible through any
//! proxy that references it.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Acquire a read guard, recovering from poisoning.
///
/// A panic while a graph node was locked must not make the node permanently
/// unreadable; the stored data is still structurally valid.
pub(crate) fn read_lock<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

/// Acquire a write guard, recovering from poisoning.
pub(crate) fn write_lock<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// A value in the guest Python runtime's object model.
///
/// Equality is structural for primitives and containers (with a pointer
/// fast path for shared nodes) and identity-based for [`PyValue::Object`].
/// Comparing two *distinct* cyclic graphs for equality may not terminate;
/// comparing a cyclic value with itself is fine.
#[derive(Debug, Clone)]
pub enum PyValue {
    /// Python `None`.
    None,
    /// `bool`.
    Bool(bool),
    /// `int`. Arbitrary precision is out of scope; `i64` covers the range
    /// the boundary actually carries.
    Int(i64),
    /// `float`.
    Float(f64),
    /// `str`.
    Str(String),
    /// `bytes`.
    Bytes(Vec<u8>),
    /// `list`.
    List(PyList),
    /// `tuple`. Shares the sequence representation with `list`; the bridge
    /// treats both as ordered sequences.
    Tuple(PyList),
    /// `dict`. Keys unique, insertion order preserved.
    Dict(PyDict),
    /// `set`.
    Set(PySet),
    /// A caller-defined composite object with no structural host equivalent.
    Object(PyObjectRef),
}

impl PyValue {
    /// The Python type name of this value, e.g. `"dict"`.
    ///
    /// Objects report their class name.
    #[must_use]
    pub fn type_name(&self) -> String {
        match self {
            Self::None => "NoneType".to_string(),
            Self::Bool(_) => "bool".to_string(),
            Self::Int(_) => "int".to_string(),
            Self::Float(_) => "float".to_string(),
            Self::Str(_) => "str".to_string(),
            Self::Bytes(_) => "bytes".to_string(),
            Self::List(_) => "list".to_string(),
            Self::Tuple(_) => "tuple".to_string(),
            Self::Dict(_) => "dict".to_string(),
            Self::Set(_) => "set".to_string(),
            Self::Object(o) => o.class_name(),
        }
    }

    /// Pointer identity of a composite value, `None` for primitives.
    ///
    /// This is the key of the bridge's per-call visitation map.
    #[must_use]
    pub fn identity(&self) -> Option<usize> {
        match self {
            Self::List(l) | Self::Tuple(l) => Some(l.ptr_id()),
            Self::Dict(d) => Some(d.ptr_id()),
            Self::Set(s) => Some(s.ptr_id()),
            Self::Object(o) => Some(o.ptr_id()),
            _ => None,
        }
    }
}

impl PartialEq for PyValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::None, Self::None) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Bytes(a), Self::Bytes(b)) => a == b,
            (Self::List(a), Self::List(b)) | (Self::Tuple(a), Self::Tuple(b)) => a == b,
            (Self::Dict(a), Self::Dict(b)) => a == b,
            (Self::Set(a), Self::Set(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl From<bool> for PyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for PyValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for PyValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for PyValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for PyValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<Vec<PyValue>> for PyValue {
    fn from(values: Vec<PyValue>) -> Self {
        Self::List(PyList::from(values))
    }
}

impl From<PyList> for PyValue {
    fn from(list: PyList) -> Self {
        Self::List(list)
    }
}

impl From<PyDict> for PyValue {
    fn from(dict: PyDict) -> Self {
        Self::Dict(dict)
    }
}

impl From<PySet> for PyValue {
    fn from(set: PySet) -> Self {
        Self::Set(set)
    }
}

impl From<PyObjectRef> for PyValue {
    fn from(object: PyObjectRef) -> Self {
        Self::Object(object)
    }
}

/// A shared, mutable ordered sequence.
#[derive(Clone, Default)]
pub struct PyList(Arc<RwLock<Vec<PyValue>>>);

impl PyList {
    /// Create an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value.
    pub fn push(&self, value: PyValue) {
        write_lock(&self.0).push(value);
    }

    /// The value at `index`, if present.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<PyValue> {
        read_lock(&self.0).get(index).cloned()
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        read_lock(&self.0).len()
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        read_lock(&self.0).is_empty()
    }

    /// A snapshot of the current elements.
    #[must_use]
    pub fn values(&self) -> Vec<PyValue> {
        read_lock(&self.0).clone()
    }

    /// Whether `self` and `other` are the same list object.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn ptr_id(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }
}

impl From<Vec<PyValue>> for PyList {
    fn from(values: Vec<PyValue>) -> Self {
        Self(Arc::new(RwLock::new(values)))
    }
}

impl FromIterator<PyValue> for PyList {
    fn from_iter<I: IntoIterator<Item = PyValue>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<_>>())
    }
}

impl PartialEq for PyList {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || *read_lock(&self.0) == *read_lock(&other.0)
    }
}

impl std::fmt::Debug for PyList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PyList").field("len", &self.len()).finish()
    }
}

/// A shared, mutable mapping with unique keys and insertion order.
///
/// Lookups are linear scans; the bridge only ever iterates entries, so the
/// mapping is optimized for faithful ordering rather than lookup speed.
#[derive(Clone, Default)]
pub struct PyDict(Arc<RwLock<Vec<(PyValue, PyValue)>>>);

impl PyDict {
    /// Create an empty dict.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or update an entry.
    ///
    /// An existing key keeps its original position, as in Python.
    pub fn insert(&self, key: PyValue, value: PyValue) {
        let mut entries = write_lock(&self.0);
        if let Some(slot) = entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            entries.push((key, value));
        }
    }

    /// The value stored under `key`, if any.
    #[must_use]
    pub fn get(&self, key: &PyValue) -> Option<PyValue> {
        read_lock(&self.0)
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        read_lock(&self.0).len()
    }

    /// Whether the dict is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        read_lock(&self.0).is_empty()
    }

    /// A snapshot of the entries in insertion order.
    #[must_use]
    pub fn entries(&self) -> Vec<(PyValue, PyValue)> {
        read_lock(&self.0).clone()
    }

    /// Whether `self` and `other` are the same dict object.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn ptr_id(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }
}

impl PartialEq for PyDict {
    /// Order-insensitive, as in Python: same keys, same values.
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

impl std::fmt::Debug for PyDict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PyDict").field("len", &self.len()).finish()
    }
}

/// A shared, mutable set of unique values.
#[derive(Clone, Default)]
pub struct PySet(Arc<RwLock<Vec<PyValue>>>);

impl PySet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value. Returns `false` if an equal value was already present.
    pub fn insert(&self, value: PyValue) -> bool {
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
    pub fn contains(&self, value: &PyValue) -> bool {
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
    pub fn values(&self) -> Vec<PyValue> {
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

impl PartialEq for PySet {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        self.len() == other.len() && self.values().iter().all(|v| other.contains(v))
    }
}

impl std::fmt::Debug for PySet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PySet").field("len", &self.len()).finish()
    }
}

struct PyObjectInner {
    class_name: String,
    attrs: Vec<(String, PyValue)>,
}

/// A reference to a caller-defined composite object.
///
/// Objects have no structural host equivalent; the bridge converts them to
/// live proxies (or hands them to a
/// [`DefaultConverter`](crate::DefaultConverter)). Attribute reads through a
/// proxy observe mutations made after conversion.
#[derive(Clone)]
pub struct PyObjectRef(Arc<RwLock<PyObjectInner>>);

impl PyObjectRef {
    /// Create an object of the given class with no attributes.
    #[must_use]
    pub fn new(class_name: impl Into<String>) -> Self {
        Self(Arc::new(RwLock::new(PyObjectInner {
            class_name: class_name.into(),
            attrs: Vec::new(),
        })))
    }

    /// The object's class name.
    #[must_use]
    pub fn class_name(&self) -> String {
        read_lock(&self.0).class_name.clone()
    }

    /// Set an attribute, replacing any existing value.
    pub fn set_attr(&self, name: impl Into<String>, value: PyValue) {
        let name = name.into();
        let mut inner = write_lock(&self.0);
        if let Some(slot) = inner.attrs.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = value;
        } else {
            inner.attrs.push((name, value));
        }
    }

    /// Read an attribute.
    #[must_use]
    pub fn get_attr(&self, name: &str) -> Option<PyValue> {
        read_lock(&self.0)
            .attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }

    /// A snapshot of the attributes in definition order.
    #[must_use]
    pub fn attrs(&self) -> Vec<(String, PyValue)> {
        read_lock(&self.0).attrs.clone()
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

impl std::fmt::Debug for PyObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PyObjectRef")
            .field("class", &self.class_name())
            .field("attrs", &read_lock(&self.0).attrs.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dict_insert_replaces_and_keeps_position() {
        let dict = PyDict::new();
        dict.insert(PyValue::from("a"), PyValue::from(1));
        dict.insert(PyValue::from("b"), PyValue::from(2));
        dict.insert(PyValue::from("a"), PyValue::from(3));

        let entries = dict.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, PyValue::from("a"));
        assert_eq!(entries[0].1, PyValue::from(3));
        assert_eq!(entries[1].0, PyValue::from("b"));
    }

    #[test]
    fn set_deduplicates() {
        let set = PySet::new();
        assert!(set.insert(PyValue::from(1)));
        assert!(!set.insert(PyValue::from(1)));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn list_equality_uses_pointer_fast_path() {
        let list = PyList::new();
        list.push(PyValue::from(1));
        // A self-referential list compared with itself must not recurse.
        list.push(PyValue::List(list.clone()));
        assert_eq!(PyValue::List(list.clone()), PyValue::List(list.clone()));
    }

    #[test]
    fn dict_equality_is_order_insensitive() {
        let a = PyDict::new();
        a.insert(PyValue::from("x"), PyValue::from(1));
        a.insert(PyValue::from("y"), PyValue::from(2));
        let b = PyDict::new();
        b.insert(PyValue::from("y"), PyValue::from(2));
        b.insert(PyValue::from("x"), PyValue::from(1));
        assert_eq!(a, b);
    }

    #[test]
    fn objects_compare_by_identity() {
        let a = PyObjectRef::new("Thing");
        let b = PyObjectRef::new("Thing");
        assert_ne!(PyValue::Object(a.clone()), PyValue::Object(b));
        assert_eq!(PyValue::Object(a.clone()), PyValue::Object(a));
    }
}
