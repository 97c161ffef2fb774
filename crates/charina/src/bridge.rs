//! The value bridge: recursive conversion of source values to host values.
//!
//! The conversion is a pure function of the source value and the bridge's
//! configuration. Each call owns a private visitation map from source node
//! identity to the already-produced target node, which both deduplicates
//! shared nodes and ties cycles back together; nothing persists between
//! calls.

use std::collections::HashMap;
use std::sync::Arc;

use crate::converter::{DefaultConverter, DictConverter};
use crate::error::{ConversionError, CyclicStructureError, PathSegment, ValuePath};
use crate::js::{JsArray, JsMap, JsSet, JsValue};
use crate::proxy::{ProxyRegistry, PyProxy};
use crate::value::{PyDict, PyList, PyObjectRef, PySet, PyValue};

/// Largest integer magnitude exactly representable in an f64.
///
/// Integers beyond this convert to [`JsValue::BigInt`] instead of
/// [`JsValue::Number`].
pub(crate) const MAX_SAFE_INTEGER: i64 = 9_007_199_254_740_991;

/// Default hard bound on traversal depth.
///
/// Matches CPython's default recursion limit; pathological inputs fail with
/// [`ConversionError::RecursionLimitExceeded`] instead of exhausting the
/// call stack.
pub const DEFAULT_RECURSION_LIMIT: usize = 1000;

/// Convert a source value with the default configuration.
///
/// Equivalent to `Bridge::builder().build().convert(value)`.
///
/// # Errors
///
/// See [`Bridge::convert`].
pub fn convert(value: &PyValue) -> Result<JsValue, ConversionError> {
    Bridge::default().convert(value)
}

/// Convert a source value, rendering mappings with the given hook.
///
/// # Errors
///
/// See [`Bridge::convert`].
pub fn convert_with(
    value: &PyValue,
    dict_converter: impl DictConverter + 'static,
) -> Result<JsValue, ConversionError> {
    Bridge::builder()
        .with_dict_converter(dict_converter)
        .build()
        .convert(value)
}

/// A configured value bridge.
///
/// Bridges are cheap to build, hold no per-conversion state, and can be
/// shared freely between threads; [`convert`](Self::convert) may be called
/// concurrently from independent call sites as long as the source graph is
/// not mutated during traversal.
pub struct Bridge {
    dict_converter: Option<Arc<dyn DictConverter>>,
    default_converter: Option<Arc<dyn DefaultConverter>>,
    depth: Option<usize>,
    recursion_limit: usize,
    create_proxies: bool,
    registry: Option<ProxyRegistry>,
}

impl std::fmt::Debug for Bridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("has_dict_converter", &self.dict_converter.is_some())
            .field("has_default_converter", &self.default_converter.is_some())
            .field("depth", &self.depth)
            .field("recursion_limit", &self.recursion_limit)
            .field("create_proxies", &self.create_proxies)
            .field("tracks_proxies", &self.registry.is_some())
            .finish()
    }
}

impl Default for Bridge {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Bridge {
    /// Create a bridge builder.
    #[must_use]
    pub fn builder() -> BridgeBuilder {
        BridgeBuilder::new()
    }

    /// Convert a source value into its host representation.
    ///
    /// Follows the default dispatch table (primitives map directly, `None`
    /// becomes `undefined`, sequences become arrays, mappings become maps
    /// unless a dict converter is installed, sets become sets, objects
    /// become proxies) with keys and elements converted recursively.
    ///
    /// # Errors
    ///
    /// * [`ConversionError::Cyclic`] for a cycle the bridge cannot tie back
    ///   (through a hook-rendered mapping or a set member).
    /// * [`ConversionError::RecursionLimitExceeded`] when nesting passes
    ///   the configured bound.
    /// * [`ConversionError::ProxyCreationDisabled`] when a proxy would be
    ///   needed but proxy creation is off.
    /// * [`ConversionError::Hook`] when a converter hook fails.
    #[tracing::instrument(skip_all, fields(root_type = %value.type_name()), level = "debug")]
    pub fn convert(&self, value: &PyValue) -> Result<JsValue, ConversionError> {
        let mut cx = ConvertCx {
            bridge: self,
            memo: HashMap::new(),
            path: Vec::new(),
        };
        let converted = cx.convert_value(value, 0)?;
        tracing::debug!(
            visited = cx.memo.len(),
            "conversion complete"
        );
        Ok(converted)
    }
}

/// Builder for a [`Bridge`].
#[derive(Default)]
pub struct BridgeBuilder {
    dict_converter: Option<Arc<dyn DictConverter>>,
    default_converter: Option<Arc<dyn DefaultConverter>>,
    depth: Option<usize>,
    recursion_limit: Option<usize>,
    proxies_disabled: bool,
    registry: Option<ProxyRegistry>,
}

impl std::fmt::Debug for BridgeBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeBuilder")
            .field("has_dict_converter", &self.dict_converter.is_some())
            .field("has_default_converter", &self.default_converter.is_some())
            .field("depth", &self.depth)
            .field("recursion_limit", &self.recursion_limit)
            .finish()
    }
}

impl BridgeBuilder {
    /// Create a builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override how mapping-like values are rendered.
    #[must_use]
    pub fn with_dict_converter(mut self, converter: impl DictConverter + 'static) -> Self {
        self.dict_converter = Some(Arc::new(converter));
        self
    }

    /// Intercept caller-defined objects before the proxy fallback.
    #[must_use]
    pub fn with_default_converter(mut self, converter: impl DefaultConverter + 'static) -> Self {
        self.default_converter = Some(Arc::new(converter));
        self
    }

    /// Convert only `depth` container levels; deeper composites become
    /// proxies instead of being descended into.
    #[must_use]
    pub fn depth(mut self, depth: usize) -> Self {
        self.depth = Some(depth);
        self
    }

    /// Hard bound on traversal depth (default
    /// [`DEFAULT_RECURSION_LIMIT`]).
    #[must_use]
    pub fn recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = Some(limit);
        self
    }

    /// Whether values without a structural equivalent may become proxies
    /// (default `true`). When disabled, such values fail the conversion.
    #[must_use]
    pub fn create_proxies(mut self, create: bool) -> Self {
        self.proxies_disabled = !create;
        self
    }

    /// Record every proxy allocated during conversions in `registry`.
    #[must_use]
    pub fn track_proxies(mut self, registry: &ProxyRegistry) -> Self {
        self.registry = Some(registry.clone());
        self
    }

    /// Build the bridge.
    #[must_use]
    pub fn build(self) -> Bridge {
        Bridge {
            dict_converter: self.dict_converter,
            default_converter: self.default_converter,
            depth: self.depth,
            recursion_limit: self.recursion_limit.unwrap_or(DEFAULT_RECURSION_LIMIT),
            create_proxies: !self.proxies_disabled,
            registry: self.registry,
        }
    }
}

/// Visitation state for one composite source node.
enum Memo {
    /// The node is being converted and its target is not yet available for
    /// back-references (hook-rendered mappings, set members).
    InProgress,
    /// The node's target value; back-references reuse it.
    Done(JsValue),
}

/// Per-call conversion state.
struct ConvertCx<'a> {
    bridge: &'a Bridge,
    /// Source identity -> produced target, scoped to this call.
    memo: HashMap<usize, Memo>,
    path: Vec<PathSegment>,
}

impl ConvertCx<'_> {
    fn current_path(&self) -> ValuePath {
        ValuePath::from_segments(&self.path)
    }

    fn convert_value(&mut self, value: &PyValue, level: usize) -> Result<JsValue, ConversionError> {
        match value {
            PyValue::None => Ok(JsValue::Undefined),
            PyValue::Bool(b) => Ok(JsValue::Bool(*b)),
            PyValue::Int(n) => Ok(convert_int(*n)),
            PyValue::Float(f) => Ok(JsValue::Number(*f)),
            PyValue::Str(s) => Ok(JsValue::Str(s.clone())),
            PyValue::Bytes(b) => Ok(JsValue::Bytes(b.clone())),
            composite => self.convert_composite(composite, level),
        }
    }

    fn convert_composite(
        &mut self,
        value: &PyValue,
        level: usize,
    ) -> Result<JsValue, ConversionError> {
        if level >= self.bridge.recursion_limit {
            return Err(ConversionError::RecursionLimitExceeded {
                limit: self.bridge.recursion_limit,
                path: self.current_path(),
            });
        }

        // A composite already seen this call either has a finished target
        // (shared node or resolvable cycle) or is still in flight, which
        // means traversal re-entered it along a path that cannot be tied
        // back.
        let id = value.identity().unwrap_or_default();
        if let Some(memo) = self.memo.get(&id) {
            return match memo {
                Memo::Done(target) => Ok(target.clone()),
                Memo::InProgress => Err(CyclicStructureError {
                    type_name: value.type_name(),
                    path: self.current_path(),
                }
                .into()),
            };
        }

        // Containers past the requested depth are not descended into.
        if let Some(depth) = self.bridge.depth
            && level >= depth
        {
            let proxy = self.make_proxy(value.clone())?;
            self.memo.insert(id, Memo::Done(proxy.clone()));
            return Ok(proxy);
        }

        tracing::trace!(type_name = %value.type_name(), depth = level, "converting composite");

        match value {
            PyValue::List(list) | PyValue::Tuple(list) => self.convert_sequence(id, list, level),
            PyValue::Dict(dict) => self.convert_dict(id, dict, level),
            PyValue::Set(set) => self.convert_set(id, set, level),
            PyValue::Object(object) => self.convert_object(id, object),
            _ => unreachable!("primitives handled in convert_value"),
        }
    }

    fn convert_sequence(
        &mut self,
        id: usize,
        list: &PyList,
        level: usize,
    ) -> Result<JsValue, ConversionError> {
        // Allocate first so back-references into this sequence resolve.
        let array = JsArray::new();
        self.memo.insert(id, Memo::Done(JsValue::Array(array.clone())));

        for (index, item) in list.values().iter().enumerate() {
            self.path.push(PathSegment::Index(index));
            let converted = self.convert_value(item, level + 1)?;
            self.path.pop();
            array.push(converted);
        }
        Ok(JsValue::Array(array))
    }

    fn convert_dict(
        &mut self,
        id: usize,
        dict: &PyDict,
        level: usize,
    ) -> Result<JsValue, ConversionError> {
        if let Some(hook) = self.bridge.dict_converter.clone() {
            // The hook fabricates the node only after its entries are fully
            // converted, so there is no placeholder a cycle could point at.
            self.memo.insert(id, Memo::InProgress);
            let entries = self.convert_entries(dict, level)?;
            let rendered = hook.convert_dict(entries).map_err(|source| {
                ConversionError::Hook {
                    source,
                    path: self.current_path(),
                }
            })?;
            self.memo.insert(id, Memo::Done(rendered.clone()));
            return Ok(rendered);
        }

        let map = JsMap::new();
        self.memo.insert(id, Memo::Done(JsValue::Map(map.clone())));
        for (key, value) in dict.entries() {
            let label = key_label(&key);
            self.path.push(PathSegment::Key(label));
            let converted_key = self.convert_value(&key, level + 1)?;
            let converted_value = self.convert_value(&value, level + 1)?;
            self.path.pop();
            map.set(converted_key, converted_value);
        }
        Ok(JsValue::Map(map))
    }

    fn convert_entries(
        &mut self,
        dict: &PyDict,
        level: usize,
    ) -> Result<Vec<(JsValue, JsValue)>, ConversionError> {
        let mut entries = Vec::with_capacity(dict.len());
        for (key, value) in dict.entries() {
            let label = key_label(&key);
            self.path.push(PathSegment::Key(label));
            let converted_key = self.convert_value(&key, level + 1)?;
            let converted_value = self.convert_value(&value, level + 1)?;
            self.path.pop();
            entries.push((converted_key, converted_value));
        }
        Ok(entries)
    }

    fn convert_set(
        &mut self,
        id: usize,
        set: &PySet,
        level: usize,
    ) -> Result<JsValue, ConversionError> {
        // Members must be complete before insertion, so a cycle through a
        // set cannot be tied back.
        self.memo.insert(id, Memo::InProgress);
        let target = JsSet::new();
        for member in set.values() {
            self.path.push(PathSegment::SetMember);
            let converted = self.convert_value(&member, level + 1)?;
            self.path.pop();
            target.add(converted);
        }
        self.memo.insert(id, Memo::Done(JsValue::Set(target.clone())));
        Ok(JsValue::Set(target))
    }

    fn convert_object(
        &mut self,
        id: usize,
        object: &PyObjectRef,
    ) -> Result<JsValue, ConversionError> {
        if let Some(hook) = self.bridge.default_converter.clone() {
            self.memo.insert(id, Memo::InProgress);
            match hook.convert_object(object) {
                Ok(Some(rendered)) => {
                    self.memo.insert(id, Memo::Done(rendered.clone()));
                    return Ok(rendered);
                }
                Ok(None) => {
                    self.memo.remove(&id);
                }
                Err(source) => {
                    return Err(ConversionError::Hook {
                        source,
                        path: self.current_path(),
                    });
                }
            }
        }

        let proxy = self.make_proxy(PyValue::Object(object.clone()))?;
        self.memo.insert(id, Memo::Done(proxy.clone()));
        Ok(proxy)
    }

    fn make_proxy(&mut self, value: PyValue) -> Result<JsValue, ConversionError> {
        if !self.bridge.create_proxies {
            return Err(ConversionError::ProxyCreationDisabled {
                type_name: value.type_name(),
                path: self.current_path(),
            });
        }
        let proxy = PyProxy::new(value);
        tracing::debug!(id = proxy.id(), "created proxy");
        if let Some(registry) = &self.bridge.registry {
            registry.track(proxy.clone());
        }
        Ok(JsValue::Proxy(proxy))
    }
}

/// Widen a source integer to the host's number model.
fn convert_int(n: i64) -> JsValue {
    if (-MAX_SAFE_INTEGER..=MAX_SAFE_INTEGER).contains(&n) {
        JsValue::Number(n as f64)
    } else {
        JsValue::BigInt(n)
    }
}

/// Short textual form of a mapping key for path reporting.
fn key_label(key: &PyValue) -> String {
    match key {
        PyValue::Str(s) => s.clone(),
        PyValue::Int(n) => n.to_string(),
        PyValue::Float(f) => f.to_string(),
        PyValue::Bool(b) => b.to_string(),
        PyValue::None => "None".to_string(),
        other => format!("<{}>", other.type_name()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_integers_become_numbers() {
        assert_eq!(convert_int(42), JsValue::Number(42.0));
        assert_eq!(
            convert_int(MAX_SAFE_INTEGER),
            JsValue::Number(MAX_SAFE_INTEGER as f64)
        );
        assert_eq!(
            convert_int(-MAX_SAFE_INTEGER),
            JsValue::Number(-(MAX_SAFE_INTEGER as f64))
        );
    }

    #[test]
    fn oversized_integers_become_bigints() {
        assert_eq!(
            convert_int(MAX_SAFE_INTEGER + 1),
            JsValue::BigInt(MAX_SAFE_INTEGER + 1)
        );
        assert_eq!(convert_int(i64::MIN), JsValue::BigInt(i64::MIN));
    }

    #[test]
    fn key_labels_render_primitives() {
        assert_eq!(key_label(&PyValue::from("k")), "k");
        assert_eq!(key_label(&PyValue::from(3)), "3");
        assert_eq!(key_label(&PyValue::None), "None");
        assert_eq!(key_label(&PyValue::Set(PySet::new())), "<set>");
    }
}
