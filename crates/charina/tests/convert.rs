//! Integration tests for the default dispatch table and bridge options.

use charina::{
    ArrayFromEntries, Bridge, ConversionError, HookError, JsValue, ObjectFromEntries, PyDict,
    PyList, PyObjectRef, PySet, PyValue, convert, convert_with,
};

#[test]
fn primitives_convert_directly() {
    assert!(convert(&PyValue::None).unwrap().is_undefined());
    assert_eq!(convert(&PyValue::from(true)).unwrap(), JsValue::Bool(true));
    assert_eq!(
        convert(&PyValue::from(42)).unwrap(),
        JsValue::Number(42.0)
    );
    assert_eq!(
        convert(&PyValue::from(0.25)).unwrap(),
        JsValue::Number(0.25)
    );
    assert_eq!(
        convert(&PyValue::from("hello")).unwrap(),
        JsValue::from("hello")
    );
    assert_eq!(
        convert(&PyValue::Bytes(vec![1, 2, 3])).unwrap(),
        JsValue::Bytes(vec![1, 2, 3])
    );
}

#[test]
fn oversized_integers_become_bigints() {
    let big = 9_007_199_254_740_993_i64;
    assert_eq!(convert(&PyValue::from(big)).unwrap(), JsValue::BigInt(big));
}

#[test]
fn sequences_preserve_length_and_order() {
    let source = PyValue::from(vec![
        PyValue::from(1),
        PyValue::from("two"),
        PyValue::from(3.0),
    ]);
    let js = convert(&source).unwrap();
    let array = js.as_array().unwrap();
    assert_eq!(array.len(), 3);
    assert_eq!(array.get(0), Some(JsValue::Number(1.0)));
    assert_eq!(array.get(1), Some(JsValue::from("two")));
    assert_eq!(array.get(2), Some(JsValue::Number(3.0)));
}

#[test]
fn tuples_convert_like_sequences() {
    let tuple = PyValue::Tuple(PyList::from(vec![PyValue::from(1), PyValue::from(2)]));
    let js = convert(&tuple).unwrap();
    assert_eq!(js.as_array().unwrap().len(), 2);
}

#[test]
fn mappings_default_to_maps() {
    let dict = PyDict::new();
    dict.insert(PyValue::from("k"), PyValue::from(vec![PyValue::from(1)]));
    let js = convert(&PyValue::Dict(dict)).unwrap();

    let map = js.as_map().unwrap();
    assert_eq!(map.len(), 1);
    let nested = map.get_str("k").unwrap();
    assert_eq!(nested.as_array().unwrap().get(0), Some(JsValue::Number(1.0)));
}

#[test]
fn map_entries_keep_insertion_order() {
    let dict = PyDict::new();
    dict.insert(PyValue::from("z"), PyValue::from(1));
    dict.insert(PyValue::from("a"), PyValue::from(2));
    let js = convert(&PyValue::Dict(dict)).unwrap();

    let entries = js.as_map().unwrap().entries();
    assert_eq!(entries[0].0, JsValue::from("z"));
    assert_eq!(entries[1].0, JsValue::from("a"));
}

#[test]
fn non_string_keys_convert_recursively() {
    let dict = PyDict::new();
    dict.insert(
        PyValue::Tuple(PyList::from(vec![PyValue::from(1), PyValue::from(2)])),
        PyValue::from("pair"),
    );
    let js = convert(&PyValue::Dict(dict)).unwrap();

    let entries = js.as_map().unwrap().entries();
    assert_eq!(entries[0].0.as_array().unwrap().len(), 2);
    assert_eq!(entries[0].1, JsValue::from("pair"));
}

#[test]
fn sets_convert_membership() {
    let set = PySet::new();
    set.insert(PyValue::from(1));
    set.insert(PyValue::from("one"));
    let js = convert(&PyValue::Set(set)).unwrap();

    let target = js.as_set().unwrap();
    assert_eq!(target.len(), 2);
    assert!(target.has(&JsValue::Number(1.0)));
    assert!(target.has(&JsValue::from("one")));
}

#[test]
fn dict_converter_selects_plain_objects() {
    let headers = PyDict::new();
    headers.insert(PyValue::from("Content-Type"), PyValue::from("application/json"));
    let init = PyDict::new();
    init.insert(PyValue::from("status"), PyValue::from(200));
    init.insert(PyValue::from("headers"), PyValue::Dict(headers));

    let js = convert_with(&PyValue::Dict(init), ObjectFromEntries).unwrap();

    let object = js.as_object().unwrap();
    assert_eq!(object.get("status").unwrap().as_number(), Some(200.0));
    // The hook applies to nested mappings as well.
    let nested = object.get("headers").unwrap();
    assert_eq!(
        nested.as_object().unwrap().get("Content-Type"),
        Some(JsValue::from("application/json"))
    );
}

#[test]
fn dict_converter_scope_is_limited_to_mappings() {
    let dict = PyDict::new();
    dict.insert(
        PyValue::from("values"),
        PyValue::from(vec![PyValue::from(1), PyValue::from(2)]),
    );
    let js = convert_with(&PyValue::Dict(dict), ObjectFromEntries).unwrap();

    // Sequence and primitive conversion is unchanged by the hook.
    let values = js.as_object().unwrap().get("values").unwrap();
    let array = values.as_array().unwrap();
    assert_eq!(array.get(0), Some(JsValue::Number(1.0)));
    assert_eq!(array.get(1), Some(JsValue::Number(2.0)));
}

#[test]
fn array_from_entries_renders_pair_lists() {
    let dict = PyDict::new();
    dict.insert(PyValue::from("k"), PyValue::from(1));
    let js = convert_with(&PyValue::Dict(dict), ArrayFromEntries).unwrap();

    let pairs = js.as_array().unwrap();
    assert_eq!(pairs.len(), 1);
    let pair = pairs.get(0).unwrap();
    assert_eq!(pair.as_array().unwrap().get(0), Some(JsValue::from("k")));
}

#[test]
fn hook_errors_carry_the_failing_path() {
    let inner = PyDict::new();
    inner.insert(PyValue::from("x"), PyValue::from(1));
    let outer = PyDict::new();
    outer.insert(PyValue::from("inner"), PyValue::Dict(inner));

    let bridge = Bridge::builder()
        .with_dict_converter(
            |_entries: Vec<(JsValue, JsValue)>| -> Result<JsValue, HookError> {
                Err(HookError::new("refused"))
            },
        )
        .build();
    let err = bridge.convert(&PyValue::Dict(outer)).unwrap_err();

    // The innermost mapping is rendered first, so the error points at it.
    match err {
        ConversionError::Hook { path, .. } => {
            assert_eq!(path.to_string(), "$[\"inner\"]");
        }
        other => panic!("expected a hook error, got {other}"),
    }
}

#[test]
fn conversion_is_repeatable() {
    let source = PyValue::from(serde_json::json!({
        "nested": {"list": [1, 2, 3]},
        "flag": true,
    }));
    let first = convert(&source).unwrap();
    let second = convert(&source).unwrap();
    assert_eq!(first, second);
}

#[test]
fn reingested_conversions_are_idempotent() {
    let source = PyValue::from(serde_json::json!({
        "k": [1, 2, {"deep": "value"}],
        "n": 1.5,
    }));
    let first = convert(&source).unwrap();

    // Re-ingest the host representation as a source value and convert again.
    let reingested = PyValue::from_js(&first).unwrap();
    let second = convert(&reingested).unwrap();

    assert_eq!(first, second);
}

#[test]
fn depth_limits_produce_proxies_for_deeper_containers() {
    let inner = PyValue::from(vec![PyValue::from(1)]);
    let outer = PyValue::from(vec![PyValue::from(0), inner]);

    let bridge = Bridge::builder().depth(1).build();
    let js = bridge.convert(&outer).unwrap();

    let array = js.as_array().unwrap();
    assert_eq!(array.get(0), Some(JsValue::Number(0.0)));
    let proxied = array.get(1).unwrap();
    let proxy = proxied.as_proxy().unwrap();
    assert_eq!(proxy.value().unwrap().type_name(), "list");
}

#[test]
fn depth_zero_proxies_the_root() {
    let bridge = Bridge::builder().depth(0).build();
    let js = bridge.convert(&PyValue::from(vec![PyValue::from(1)])).unwrap();
    assert!(js.as_proxy().is_some());
}

#[test]
fn disabled_proxies_fail_with_context() {
    let holder = PyDict::new();
    holder.insert(
        PyValue::from("obj"),
        PyValue::Object(PyObjectRef::new("Widget")),
    );

    let bridge = Bridge::builder().create_proxies(false).build();
    let err = bridge.convert(&PyValue::Dict(holder)).unwrap_err();

    match err {
        ConversionError::ProxyCreationDisabled { type_name, path } => {
            assert_eq!(type_name, "Widget");
            assert_eq!(path.to_string(), "$[\"obj\"]");
        }
        other => panic!("expected proxy creation failure, got {other}"),
    }
}

#[test]
fn default_converter_overrides_the_proxy_fallback() {
    let object = PyObjectRef::new("Instant");
    object.set_attr("epoch", PyValue::from(1_700_000_000));

    let bridge = Bridge::builder()
        .with_default_converter(
            |object: &PyObjectRef| -> Result<Option<JsValue>, HookError> {
                Ok(object.get_attr("epoch").map(|epoch| {
                    JsValue::Number(match epoch {
                        PyValue::Int(n) => n as f64,
                        _ => f64::NAN,
                    })
                }))
            },
        )
        .build();

    let js = bridge.convert(&PyValue::Object(object)).unwrap();
    assert_eq!(js.as_number(), Some(1_700_000_000.0));
}

#[test]
fn declined_objects_still_become_proxies() {
    let bridge = Bridge::builder()
        .with_default_converter(
            |_object: &PyObjectRef| -> Result<Option<JsValue>, HookError> { Ok(None) },
        )
        .build();
    let js = bridge
        .convert(&PyValue::Object(PyObjectRef::new("Widget")))
        .unwrap();
    assert!(js.as_proxy().is_some());
}

#[test]
fn recursion_limit_fails_safely() {
    // Build a 50-deep nested list and convert with a much smaller bound.
    let mut value = PyValue::from(vec![PyValue::from(1)]);
    for _ in 0..50 {
        value = PyValue::from(vec![value]);
    }

    let bridge = Bridge::builder().recursion_limit(10).build();
    let err = bridge.convert(&value).unwrap_err();
    assert!(matches!(
        err,
        ConversionError::RecursionLimitExceeded { limit: 10, .. }
    ));
}

#[test]
fn pathological_nesting_does_not_overflow_the_stack() {
    // Much deeper than the default limit; must error, not crash.
    let mut value = PyValue::from(vec![PyValue::from(1)]);
    for _ in 0..5_000 {
        value = PyValue::from(vec![value]);
    }
    assert!(matches!(
        convert(&value),
        Err(ConversionError::RecursionLimitExceeded { .. })
    ));
}
