//! Brings up a small LooCast manager tree and tears it down again.
//!
//! Run with `RUST_LOG=debug` to see every namespace, type and instance being registered,
//! or `RUST_LOG=trace` to also see every phase transition.

use std::error::Error as _;

use loocast_runtime::{tracer, Builder, Catalog, Manager, Result};

mod enemy;
mod mission;

/// The root manager.
struct LooCast;

impl Manager for LooCast {
    fn name(&self) -> &str { "LooCast" }
}

/// Modules loaded from the catalog, in load order.
const MODULES: [&str; 1] = ["loocast.enemy"];

fn catalog() -> Result<Catalog> {
    let mut catalog = Catalog::new();
    catalog.insert::<enemy::Enemy>("loocast.enemy")?;
    catalog.insert::<enemy::Health>("loocast.enemy.health")?;
    Ok(catalog)
}

fn run() -> Result<()> {
    let catalog = catalog()?;

    let mut builder = Builder::new(LooCast);
    let root = builder.root();
    for key in MODULES {
        let module = builder.from_catalog(root, &catalog, key)?;
        for sub_key in catalog.keys().filter(|sub_key| sub_key.starts_with(&format!("{key}."))) {
            builder.from_catalog(module, &catalog, sub_key)?;
        }
    }
    builder.bundle(&mission::Bundle);

    let mut runtime = builder.build();
    let tracer = tracer::Log(log::Level::Trace);

    runtime.start(&tracer)?;
    for namespace in runtime.context().namespaces().iter() {
        log::info!("Namespace {}", namespace.id());
    }
    if let Some(target) = runtime.manager::<mission::Target>().and_then(|target| target.current()) {
        log::info!("Current mission target: {target}");
    }
    runtime.shutdown(&tracer)?;

    Ok(())
}

fn main() {
    env_logger::init();

    if let Err(err) = run() {
        log::error!("{err}");
        let mut source = err.source();
        while let Some(cause) = source {
            log::error!("Caused by: {cause}");
            source = cause.source();
        }
        std::process::exit(1);
    }
}
