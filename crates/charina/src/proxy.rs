//! Live proxy handles into the source value graph.
//!
//! When a source value has no structural host equivalent (a caller-defined
//! object, or a container beyond the configured conversion depth), the
//! bridge produces a [`PyProxy`]: a handle that keeps the source value alive
//! and observes later mutations, rather than a deep copy. Proxies are
//! host-side resources the caller is responsible for releasing; a
//! [`ProxyRegistry`] can be attached to a bridge to collect every proxy a
//! conversion allocates so they can be destroyed in one sweep.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use crate::error::ConversionError;
use crate::value::{PyValue, read_lock, write_lock};

static NEXT_PROXY_ID: AtomicU64 = AtomicU64::new(1);

/// A live reference from the host side back to a source value.
///
/// Cloning a proxy clones the handle, not the referent: all clones share the
/// destroyed state, so destroying through a registry invalidates the copy
/// embedded in a converted value as well.
#[derive(Clone)]
pub struct PyProxy {
    id: u64,
    target: Arc<RwLock<Option<PyValue>>>,
}

impl PyProxy {
    /// Wrap a source value in a new proxy.
    #[must_use]
    pub fn new(value: PyValue) -> Self {
        Self {
            id: NEXT_PROXY_ID.fetch_add(1, Ordering::Relaxed),
            target: Arc::new(RwLock::new(Some(value))),
        }
    }

    /// The proxy's unique identifier.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The referenced source value.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::ProxyDestroyed`] if the proxy has been
    /// destroyed.
    pub fn value(&self) -> Result<PyValue, ConversionError> {
        read_lock(&self.target)
            .clone()
            .ok_or(ConversionError::ProxyDestroyed { id: self.id })
    }

    /// Read an attribute of the referenced object.
    ///
    /// This is a live read: mutations made on the source side after the
    /// proxy was created are observed. Returns `None` for a missing
    /// attribute or when the referent is not an object.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::ProxyDestroyed`] if the proxy has been
    /// destroyed.
    pub fn get_attr(&self, name: &str) -> Result<Option<PyValue>, ConversionError> {
        match self.value()? {
            PyValue::Object(object) => Ok(object.get_attr(name)),
            _ => Ok(None),
        }
    }

    /// Whether [`destroy`](Self::destroy) has been called.
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        read_lock(&self.target).is_none()
    }

    /// Release the referenced source value.
    ///
    /// After this the source value is no longer kept alive by the proxy and
    /// every access through any clone of the handle fails. Destroying an
    /// already-destroyed proxy is a no-op.
    pub fn destroy(&self) {
        write_lock(&self.target).take();
    }
}

impl PartialEq for PyProxy {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl std::fmt::Debug for PyProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PyProxy")
            .field("id", &self.id)
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}

/// Collects the proxies allocated during tracked conversions.
///
/// Attach a registry with
/// [`BridgeBuilder::track_proxies`](crate::BridgeBuilder::track_proxies);
/// every proxy the bridge creates is recorded here in addition to being
/// embedded in the converted value, so the caller can release all of them
/// with a single [`destroy_all`](Self::destroy_all).
#[derive(Clone, Default)]
pub struct ProxyRegistry(Arc<RwLock<Vec<PyProxy>>>);

impl ProxyRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn track(&self, proxy: PyProxy) {
        write_lock(&self.0).push(proxy);
    }

    /// Number of tracked proxies.
    #[must_use]
    pub fn len(&self) -> usize {
        read_lock(&self.0).len()
    }

    /// Whether no proxies have been tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        read_lock(&self.0).is_empty()
    }

    /// A snapshot of the tracked proxies.
    #[must_use]
    pub fn proxies(&self) -> Vec<PyProxy> {
        read_lock(&self.0).clone()
    }

    /// Destroy every tracked proxy and clear the registry.
    ///
    /// Returns the number of proxies that were still live.
    pub fn destroy_all(&self) -> usize {
        let proxies = {
            let mut tracked = write_lock(&self.0);
            std::mem::take(&mut *tracked)
        };
        let mut live = 0;
        for proxy in &proxies {
            if !proxy.is_destroyed() {
                live += 1;
            }
            proxy.destroy();
        }
        live
    }
}

impl std::fmt::Debug for ProxyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyRegistry")
            .field("tracked", &self.len())
            .finish()
    }
}
