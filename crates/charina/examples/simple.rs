//! Simple example demonstrating basic value conversion.
//!
//! Run with: `cargo run --example simple`

use charina::{Bridge, PyValue};

fn main() -> anyhow::Result<()> {
    // A response-init structure as a Python worker would build it.
    let init = PyValue::from(serde_json::json!({
        "status": 204,
        "headers": {
            "Access-Control-Allow-Origin": "*",
            "Access-Control-Allow-Methods": "GET, POST, OPTIONS",
        },
    }));

    let bridge = Bridge::builder().build();

    // Example 1: the default mapping strategy produces Maps.
    println!("=== Example 1: default conversion ===");
    let js = bridge.convert(&init)?;
    println!("target type: {}", js.type_name());
    println!("as JSON: {}", serde_json::to_string_pretty(&js.to_json()?)?);
    println!();

    // Example 2: sequences convert position-wise.
    println!("=== Example 2: sequences ===");
    let tags = PyValue::from(vec![
        PyValue::from("alpha"),
        PyValue::from(2),
        PyValue::from(3.5),
    ]);
    let js = bridge.convert(&tags)?;
    let array = js.as_array().expect("sequences convert to arrays");
    println!("length: {}", array.len());
    for (index, value) in array.values().iter().enumerate() {
        println!("  [{index}] = {value:?}");
    }

    Ok(())
}
