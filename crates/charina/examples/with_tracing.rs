//! Example demonstrating tracing integration.
//!
//! The bridge emits `tracing` events at debug/trace level for composite
//! dispatch and proxy creation.
//!
//! Run with: `RUST_LOG=charina=trace cargo run --example with_tracing`

use charina::{Bridge, PyObjectRef, PyValue};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("charina=trace")),
        )
        .init();

    let source = PyValue::from(serde_json::json!({
        "items": [1, 2, 3],
        "meta": {"origin": "worker"},
    }));

    let bridge = Bridge::builder().build();
    let js = bridge.convert(&source)?;
    println!("converted to {}", js.type_name());

    // Proxy creation is logged at debug level.
    let js = bridge.convert(&PyValue::Object(PyObjectRef::new("Opaque")))?;
    println!("converted to {}", js.type_name());

    Ok(())
}
