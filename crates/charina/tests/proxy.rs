//! Integration tests for proxy semantics and lifetime coupling.

use charina::{
    Bridge, ConversionError, JsonError, ProxyRegistry, PyObjectRef, PyValue, convert,
};

#[test]
fn objects_convert_to_live_references() {
    let request = PyObjectRef::new("Request");
    request.set_attr("method", PyValue::from("GET"));

    let js = convert(&PyValue::Object(request.clone())).unwrap();
    let proxy = js.as_proxy().unwrap();

    // Mutations made after conversion are observed through the proxy.
    request.set_attr("method", PyValue::from("POST"));
    assert_eq!(
        proxy.get_attr("method").unwrap(),
        Some(PyValue::from("POST"))
    );
}

#[test]
fn proxies_reference_rather_than_copy() {
    let object = PyObjectRef::new("Env");
    let js = convert(&PyValue::Object(object.clone())).unwrap();

    let PyValue::Object(referent) = js.as_proxy().unwrap().value().unwrap() else {
        panic!("expected the proxy to hold an object");
    };
    assert!(referent.ptr_eq(&object));
}

#[test]
fn repeated_references_share_one_proxy() {
    let object = PyObjectRef::new("Logger");
    let source = PyValue::from(vec![
        PyValue::Object(object.clone()),
        PyValue::Object(object),
    ]);

    let js = convert(&source).unwrap();
    let array = js.as_array().unwrap();
    let first = array.get(0).unwrap();
    let second = array.get(1).unwrap();
    assert_eq!(
        first.as_proxy().unwrap().id(),
        second.as_proxy().unwrap().id()
    );
}

#[test]
fn registry_tracks_every_allocated_proxy() {
    let registry = ProxyRegistry::new();
    let bridge = Bridge::builder().track_proxies(&registry).build();

    let source = PyValue::from(vec![
        PyValue::Object(PyObjectRef::new("A")),
        PyValue::Object(PyObjectRef::new("B")),
        PyValue::from(1),
    ]);
    let js = bridge.convert(&source).unwrap();

    assert_eq!(registry.len(), 2);

    // Destroying through the registry invalidates the proxies embedded in
    // the converted value.
    assert_eq!(registry.destroy_all(), 2);
    let embedded = js.as_array().unwrap().get(0).unwrap();
    let proxy = embedded.as_proxy().unwrap().clone();
    assert!(proxy.is_destroyed());
    assert!(matches!(
        proxy.value(),
        Err(ConversionError::ProxyDestroyed { .. })
    ));
}

#[test]
fn registry_is_empty_when_nothing_needed_a_proxy() {
    let registry = ProxyRegistry::new();
    let bridge = Bridge::builder().track_proxies(&registry).build();
    bridge
        .convert(&PyValue::from(serde_json::json!({"k": [1, 2]})))
        .unwrap();
    assert!(registry.is_empty());
}

#[test]
fn depth_limited_proxies_are_tracked_too() {
    let registry = ProxyRegistry::new();
    let bridge = Bridge::builder()
        .depth(1)
        .track_proxies(&registry)
        .build();

    let inner = PyValue::from(vec![PyValue::from(1)]);
    bridge
        .convert(&PyValue::from(vec![inner]))
        .unwrap();
    assert_eq!(registry.len(), 1);
}

#[test]
fn proxies_unwrap_across_reingestion() {
    let object = PyObjectRef::new("Session");
    let js = convert(&PyValue::Object(object.clone())).unwrap();

    // Passing the proxy back across the boundary yields the original
    // object, not a wrapper around a wrapper.
    let PyValue::Object(round_tripped) = PyValue::from_js(&js).unwrap() else {
        panic!("expected an object");
    };
    assert!(round_tripped.ptr_eq(&object));
}

#[test]
fn destroyed_proxies_fail_reingestion() {
    let js = convert(&PyValue::Object(PyObjectRef::new("Gone"))).unwrap();
    js.as_proxy().unwrap().destroy();
    assert!(matches!(
        PyValue::from_js(&js),
        Err(ConversionError::ProxyDestroyed { .. })
    ));
}

#[test]
fn proxies_have_no_json_representation() {
    let js = convert(&PyValue::Object(PyObjectRef::new("Widget"))).unwrap();
    assert!(matches!(
        js.to_json(),
        Err(JsonError::Unrepresentable { .. })
    ));
}

#[test]
fn proxy_keeps_source_reachable() {
    let js = {
        let object = PyObjectRef::new("Ephemeral");
        object.set_attr("alive", PyValue::from(true));
        convert(&PyValue::Object(object)).unwrap()
        // The only direct handle to the object is dropped here.
    };

    let proxy = js.as_proxy().unwrap();
    assert_eq!(proxy.get_attr("alive").unwrap(), Some(PyValue::from(true)));

    // Explicit release drops the reference.
    proxy.destroy();
    assert!(proxy.is_destroyed());
}
