//! # Charina
//!
//! Python-to-JavaScript value bridging for WebAssembly-sandboxed Python.
//!
//! When Python code runs inside a JavaScript host, every value that crosses
//! the boundary has to be re-expressed in the host's value model. Charina
//! implements that marshaling contract:
//!
//! - **Structural conversion** - primitives, sequences, mappings, and sets
//!   map to their nearest host equivalents, recursively
//! - **Converter hooks** - callers override how mappings are rendered
//!   (keyed `Map` by default, `Object.fromEntries`-style records on demand)
//! - **Cycle support** - cyclic source graphs produce correctly cyclic
//!   target graphs via a per-call visitation map, never a hang or stack
//!   overflow
//! - **Live proxies** - values with no structural equivalent become handles
//!   that keep the source alive and observe later mutations, with explicit
//!   release semantics
//!
//! ## Quick Start
//!
//! ```rust
//! use charina::{Bridge, PyValue};
//!
//! fn main() -> Result<(), charina::ConversionError> {
//!     let value = PyValue::from(serde_json::json!({
//!         "status": 200,
//!         "headers": {"Content-Type": "application/json"},
//!     }));
//!
//!     let bridge = Bridge::builder().build();
//!     let js = bridge.convert(&value)?;
//!
//!     assert_eq!(js.as_map().unwrap().len(), 2);
//!     Ok(())
//! }
//! ```
//!
//! ## Rendering mappings as plain objects
//!
//! The default mapping target is an insertion-ordered `Map`. Host APIs that
//! expect plain objects get them through the stock
//! [`ObjectFromEntries`] converter:
//!
//! ```rust
//! use charina::{Bridge, ObjectFromEntries, PyDict, PyValue};
//!
//! let init = PyDict::new();
//! init.insert(PyValue::from("status"), PyValue::from(204));
//!
//! let bridge = Bridge::builder()
//!     .with_dict_converter(ObjectFromEntries)
//!     .build();
//! let js = bridge.convert(&PyValue::Dict(init)).unwrap();
//! assert_eq!(js.as_object().unwrap().get("status").unwrap().as_number(), Some(204.0));
//! ```

#![forbid(unsafe_code)]

mod bridge;
mod converter;
mod error;
mod interop;
mod js;
mod proxy;
mod value;

pub use bridge::{Bridge, BridgeBuilder, DEFAULT_RECURSION_LIMIT, convert, convert_with};
pub use converter::{
    ArrayFromEntries, DefaultConverter, DictConverter, HookError, ObjectFromEntries,
};
pub use error::{ConversionError, CyclicStructureError, PathSegment, ValuePath};
pub use interop::JsonError;
pub use js::{JsArray, JsMap, JsObject, JsSet, JsValue};
pub use proxy::{ProxyRegistry, PyProxy};
pub use value::{PyDict, PyList, PyObjectRef, PySet, PyValue};
