//! Example demonstrating converter hooks.
//!
//! The default mapping target is a keyed `Map`. Host APIs that expect plain
//! objects (e.g. a `Response` constructor taking an init record) select the
//! `Object.fromEntries` shape through a dict converter instead.
//!
//! Run with: `cargo run --example dict_converter`

use charina::{ArrayFromEntries, Bridge, ObjectFromEntries, PyDict, PyValue};

fn main() -> anyhow::Result<()> {
    let headers = PyDict::new();
    headers.insert(
        PyValue::from("Content-Type"),
        PyValue::from("application/json"),
    );
    let init = PyDict::new();
    init.insert(PyValue::from("status"), PyValue::from(200));
    init.insert(PyValue::from("headers"), PyValue::Dict(headers));
    let source = PyValue::Dict(init);

    println!("=== Default: keyed Map ===");
    let js = Bridge::builder().build().convert(&source)?;
    println!("target type: {}", js.type_name());

    println!();
    println!("=== Object.fromEntries: plain object ===");
    let bridge = Bridge::builder()
        .with_dict_converter(ObjectFromEntries)
        .build();
    let js = bridge.convert(&source)?;
    println!("target type: {}", js.type_name());
    println!("as JSON: {}", serde_json::to_string_pretty(&js.to_json()?)?);

    println!();
    println!("=== Array.from: [key, value] pairs ===");
    let bridge = Bridge::builder()
        .with_dict_converter(ArrayFromEntries)
        .build();
    let js = bridge.convert(&source)?;
    println!("target type: {}", js.type_name());
    println!("as JSON: {}", serde_json::to_string_pretty(&js.to_json()?)?);

    Ok(())
}
