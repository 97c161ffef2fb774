//! Example demonstrating proxy lifetime management.
//!
//! Values with no structural host equivalent convert to live proxies. The
//! proxies are host-side resources: attach a registry to collect them and
//! release them in one sweep once the host is done with the converted value.
//!
//! Run with: `cargo run --example proxies`

use charina::{Bridge, ProxyRegistry, PyObjectRef, PyValue};

fn main() -> anyhow::Result<()> {
    let registry = ProxyRegistry::new();
    let bridge = Bridge::builder().track_proxies(&registry).build();

    let env = PyObjectRef::new("Env");
    env.set_attr("stage", PyValue::from("production"));

    let source = PyValue::from(vec![
        PyValue::from("plain data"),
        PyValue::Object(env.clone()),
    ]);
    let js = bridge.convert(&source)?;

    let array = js.as_array().expect("sequences convert to arrays");
    let proxy = array
        .get(1)
        .and_then(|v| v.as_proxy().cloned())
        .expect("objects convert to proxies");

    println!("tracked proxies: {}", registry.len());
    println!("proxy id: {}", proxy.id());

    // The proxy is a live view: source-side mutations are observed.
    env.set_attr("stage", PyValue::from("staging"));
    println!("stage seen through proxy: {:?}", proxy.get_attr("stage")?);

    // Release everything the conversion allocated.
    let released = registry.destroy_all();
    println!("released {released} live proxies");
    println!("proxy destroyed: {}", proxy.is_destroyed());

    Ok(())
}
