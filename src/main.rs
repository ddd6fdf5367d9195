// Thin driver over the library: inspects a saved network or a NetworkSpec.
// Training runs through the library API, see `cargo run --example xor`.
use std::process::ExitCode;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use strata_nn::{Network, NetworkSpec};
use tracing::{error, info, Level};

fn main() -> ExitCode {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let Some(path) = std::env::args().nth(1) else {
        println!("strata-nn: dense feedforward networks with per-weight optimizers.");
        println!("usage: strata-nn <network.json | spec.json>");
        println!("Run `cargo run --example xor` for a training demo.");
        return ExitCode::SUCCESS;
    };

    match inspect(&path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%path, error = %err, "could not read network");
            ExitCode::FAILURE
        }
    }
}

fn inspect(path: &str) -> strata_nn::Result<()> {
    if let Ok(network) = Network::load_json(path) {
        info!(%path, "trained network");
        network.log_summary();
        return Ok(());
    }
    let spec = NetworkSpec::load_json(path)?;
    let network = spec.build(&mut ChaCha8Rng::seed_from_u64(0))?;
    info!(%path, name = %spec.name, "network spec");
    network.log_summary();
    Ok(())
}
