use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use strata_nn::{train_loop, Dataset, Network, TrainConfig};
use tracing::Level;

fn main() -> strata_nn::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let mut network = Network::new(&[2, 3, 1], &mut ChaCha8Rng::seed_from_u64(7))?;
    network.settings.set_test_fraction(0.0);

    let inputs = vec![
        vec![1.0, 0.0],
        vec![1.0, 1.0],
        vec![0.0, 1.0],
        vec![0.0, 0.0],
    ];
    let expected_outputs = vec![
        vec![1.0],
        vec![0.0],
        vec![1.0],
        vec![0.0],
    ];
    let data = Dataset::from_pairs(&inputs, &expected_outputs)?;

    let config = TrainConfig::new(5000, 1.0, 0).with_seed(7);
    let summary = train_loop(&mut network, &data, &config)?;
    println!("final batch loss = {:.6}", summary.train_loss);

    for input in &inputs {
        println!("Input: {:?} -> Output: {:.4}", input, network.forward(input)?[0]);
    }
    let eval = network.evaluate(&data)?;
    println!("mean absolute error = {:.4}", eval.error);
    Ok(())
}
