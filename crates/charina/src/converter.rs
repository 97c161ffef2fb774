//! Converter hooks for overriding the default mapping strategies.
//!
//! A [`DictConverter`] decides how mapping-like source values are rendered
//! on the host side. Without one, the bridge produces an insertion-ordered
//! [`JsMap`](crate::JsMap); the stock [`ObjectFromEntries`] converter
//! instead produces the plain-object shape a host caller gets from
//! `Object.fromEntries`, and [`ArrayFromEntries`] the `Array.from` pair
//! list. A [`DefaultConverter`] can intercept caller-defined objects before
//! the proxy fallback.
//!
//! Both traits are object-safe capabilities injected through the
//! [`BridgeBuilder`](crate::BridgeBuilder) and are implemented for plain
//! closures with the matching signature.

use crate::js::{JsArray, JsObject, JsValue};
use crate::value::PyObjectRef;

/// A failure raised by a converter hook.
///
/// The bridge wraps this in
/// [`ConversionError::Hook`](crate::ConversionError::Hook) together with the
/// path of the node the hook was invoked for.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct HookError(String);

impl HookError {
    /// Create a hook error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Strategy for rendering mapping-like source values on the host side.
///
/// The hook receives the mapping's entries with keys and values already
/// converted, in insertion order, and returns the host value representing
/// the mapping. It is invoked for every mapping encountered during a
/// conversion, including nested ones; it does not affect how sequences,
/// sets, or primitives convert.
///
/// # Example
///
/// ```rust
/// use charina::{convert_with, HookError, JsArray, JsValue, PyDict, PyValue};
///
/// let dict = PyDict::new();
/// dict.insert(PyValue::from("status"), PyValue::from(200));
///
/// // Render mappings as arrays of [key, value] pairs.
/// let js = convert_with(
///     &PyValue::Dict(dict),
///     |entries: Vec<(JsValue, JsValue)>| -> Result<JsValue, HookError> {
///         let pairs = JsArray::new();
///         for (key, value) in entries {
///             pairs.push(JsValue::Array(JsArray::from(vec![key, value])));
///         }
///         Ok(JsValue::Array(pairs))
///     },
/// )
/// .unwrap();
/// assert!(js.as_array().is_some());
/// ```
pub trait DictConverter: Send + Sync {
    /// Render one mapping from its converted entries.
    ///
    /// # Errors
    ///
    /// Returns a [`HookError`] if the entries cannot be rendered; the
    /// bridge aborts the whole conversion with the failing node's path.
    fn convert_dict(&self, entries: Vec<(JsValue, JsValue)>) -> Result<JsValue, HookError>;
}

impl<F> DictConverter for F
where
    F: Fn(Vec<(JsValue, JsValue)>) -> Result<JsValue, HookError> + Send + Sync,
{
    fn convert_dict(&self, entries: Vec<(JsValue, JsValue)>) -> Result<JsValue, HookError> {
        self(entries)
    }
}

/// Fallback strategy for caller-defined objects.
///
/// Consulted before the proxy fallback. Returning `Ok(None)` declines the
/// value, letting the bridge proceed with its normal proxy handling.
pub trait DefaultConverter: Send + Sync {
    /// Render one object, or decline it with `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns a [`HookError`] to abort the conversion.
    fn convert_object(&self, object: &PyObjectRef) -> Result<Option<JsValue>, HookError>;
}

impl<F> DefaultConverter for F
where
    F: Fn(&PyObjectRef) -> Result<Option<JsValue>, HookError> + Send + Sync,
{
    fn convert_object(&self, object: &PyObjectRef) -> Result<Option<JsValue>, HookError> {
        self(object)
    }
}

/// Render a converted key as a JavaScript property name.
///
/// Mirrors JS string coercion for the primitive key types; returns `None`
/// for keys that have no sensible property-name form (containers, proxies).
pub(crate) fn property_key(key: &JsValue) -> Option<String> {
    match key {
        JsValue::Str(s) => Some(s.clone()),
        JsValue::Number(n) => {
            if n.is_finite() && n.fract() == 0.0 && n.abs() <= crate::bridge::MAX_SAFE_INTEGER as f64
            {
                Some(format!("{}", *n as i64))
            } else {
                Some(format!("{n}"))
            }
        }
        JsValue::BigInt(n) => Some(n.to_string()),
        JsValue::Bool(b) => Some(b.to_string()),
        JsValue::Null => Some("null".to_string()),
        JsValue::Undefined => Some("undefined".to_string()),
        _ => None,
    }
}

/// The `Object.fromEntries` strategy: mappings become plain objects.
///
/// Keys are coerced to property names the way JS coerces primitives to
/// strings; a key with no property-name form (a container or proxy key)
/// fails the conversion.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectFromEntries;

impl DictConverter for ObjectFromEntries {
    fn convert_dict(&self, entries: Vec<(JsValue, JsValue)>) -> Result<JsValue, HookError> {
        let object = JsObject::new();
        for (key, value) in entries {
            let name = property_key(&key).ok_or_else(|| {
                HookError::new(format!("cannot use {} as a property name", key.type_name()))
            })?;
            object.set(name, value);
        }
        Ok(JsValue::Object(object))
    }
}

/// The `Array.from` strategy: mappings become arrays of `[key, value]`
/// pairs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArrayFromEntries;

impl DictConverter for ArrayFromEntries {
    fn convert_dict(&self, entries: Vec<(JsValue, JsValue)>) -> Result<JsValue, HookError> {
        let pairs = JsArray::new();
        for (key, value) in entries {
            pairs.push(JsValue::Array(JsArray::from(vec![key, value])));
        }
        Ok(JsValue::Array(pairs))
    }
}
