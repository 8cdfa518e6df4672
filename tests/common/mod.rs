pub mod assets;
pub mod clients;

pub use assets::*;
pub use clients::*;

use assetgraph::types::MaterializeArgs;

pub fn house_args() -> MaterializeArgs {
    vec!["house".to_string(), "118".to_string()]
}

/// Opt-in tracing for debugging: `RUST_LOG=debug cargo test -- --nocapture`.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
