use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use strata_nn::{
    train_loop, ActivationFunction, AdamSettings, Dataset, Layer, Network, OptimizerSettings, Sample,
    SummationMode, TrainConfig,
};

fn half_squared_error(net: &Network, sample: &Sample) -> f64 {
    let out = net.forward(sample.input()).unwrap();
    0.5 * out
        .iter()
        .zip(sample.target())
        .map(|(o, t)| (o - t) * (o - t))
        .sum::<f64>()
}

fn check_gradients(activation: ActivationFunction, mode: SummationMode, seed: u64) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let layers = vec![
        Layer::new(3, 4, Some(activation), &mut rng).unwrap(),
        Layer::new(4, 2, Some(activation), &mut rng).unwrap(),
    ];
    let mut net = Network::from_layers(layers).unwrap();
    net.settings.summation = mode;
    let sample = Sample::new(vec![0.3, -0.8, 0.5], vec![0.25, 0.75]);

    let analytic: Vec<Vec<Vec<f64>>> = {
        let session = net.begin_training().unwrap();
        session.accumulate(&[&sample]).unwrap();
        let grads = session
            .network()
            .layers()
            .iter()
            .map(|l| l.neurons().iter().map(|n| n.gradients()).collect())
            .collect();
        grads
    };

    let h = 1e-6;
    for (l, layer_grads) in analytic.iter().enumerate() {
        for (n, neuron_grads) in layer_grads.iter().enumerate() {
            for (w, &a) in neuron_grads.iter().enumerate() {
                let original = net.layers()[l].neurons()[n].weights()[w];

                net.layers_mut()[l].neurons_mut()[n].weights_mut()[w] = original + h;
                let up = half_squared_error(&net, &sample);
                net.layers_mut()[l].neurons_mut()[n].weights_mut()[w] = original - h;
                let down = half_squared_error(&net, &sample);
                net.layers_mut()[l].neurons_mut()[n].weights_mut()[w] = original;

                let numeric = (up - down) / (2.0 * h);
                assert!(
                    (a - numeric).abs() < 1e-6 * (1.0 + a.abs()),
                    "{} layer {l} neuron {n} weight {w}: analytic {a}, numeric {numeric}",
                    activation.name()
                );
            }
        }
    }
}

#[test]
fn sigmoid_gradients_match_finite_differences() {
    check_gradients(ActivationFunction::Sigmoid, SummationMode::Naive, 1);
    check_gradients(ActivationFunction::Sigmoid, SummationMode::Sorted, 2);
}

#[test]
fn relu_gradients_match_finite_differences() {
    check_gradients(ActivationFunction::ReLU, SummationMode::Naive, 3);
    check_gradients(ActivationFunction::ReLU, SummationMode::Sorted, 4);
}

#[test]
fn tanh_gradients_match_finite_differences() {
    check_gradients(ActivationFunction::Tanh, SummationMode::Naive, 5);
    check_gradients(ActivationFunction::Tanh, SummationMode::Sorted, 6);
}

fn xor() -> Dataset {
    Dataset::from_pairs(
        &[vec![1.0, 0.0], vec![1.0, 1.0], vec![0.0, 1.0], vec![0.0, 0.0]],
        &[vec![1.0], vec![0.0], vec![1.0], vec![0.0]],
    )
    .unwrap()
}

fn train_xor(seed: u64) -> f64 {
    let data = xor();
    let mut net = Network::new(&[2, 3, 1], &mut ChaCha8Rng::seed_from_u64(seed)).unwrap();
    net.settings.set_test_fraction(0.0);
    train_loop(&mut net, &data, &TrainConfig::new(5000, 1.0, 0).with_seed(seed)).unwrap();
    net.evaluate(&data).unwrap().error
}

#[test]
fn xor_converges_with_plain_sgd() {
    let error = train_xor(7);
    assert!(error < 0.1, "xor error {error}");
}

fn trajectory(settings: OptimizerSettings) -> Vec<Vec<f64>> {
    let data = xor();
    let mut net = Network::new(&[2, 3, 1], &mut ChaCha8Rng::seed_from_u64(99)).unwrap();
    net.settings.optimizer = settings;
    net.settings.set_test_fraction(0.0);
    train_loop(&mut net, &data, &TrainConfig::new(20, 0.5, 0).with_seed(1)).unwrap();
    net.layers().iter().flat_map(Layer::weights).collect()
}

#[test]
fn optimizers_take_different_paths() {
    let plain = trajectory(OptimizerSettings::sgd());
    let momentum = trajectory(OptimizerSettings::momentum(0.9));
    let adam = trajectory(OptimizerSettings::adam(AdamSettings::default()));
    assert_ne!(plain, momentum);
    assert_ne!(plain, adam);
    assert_ne!(momentum, adam);
}

#[test]
fn training_is_reproducible_across_thread_counts() {
    let data = xor();
    let run = |threads: usize| {
        let mut net = Network::new(&[2, 4, 1], &mut ChaCha8Rng::seed_from_u64(5)).unwrap();
        net.settings.threads = threads;
        net.settings.set_test_fraction(0.0);
        train_loop(&mut net, &data, &TrainConfig::new(50, 0.5, 0).with_seed(5)).unwrap();
        net.layers().iter().flat_map(Layer::weights).flatten().collect::<Vec<f64>>()
    };
    let single = run(1);
    let multi = run(4);
    for (a, b) in single.iter().zip(&multi) {
        assert!((a - b).abs() < 1e-9, "{a} vs {b}");
    }
}

#[test]
fn network_stays_usable_after_training() {
    let data = xor();
    let mut net = Network::new(&[2, 3, 1], &mut ChaCha8Rng::seed_from_u64(1)).unwrap();
    train_loop(&mut net, &data, &TrainConfig::new(10, 0.5, 2).with_seed(3)).unwrap();
    assert!(net
        .layers()
        .iter()
        .flat_map(Layer::neurons)
        .all(|n| !n.is_training()));
    let out = net.forward(&[1.0, 0.0]).unwrap();
    assert_eq!(out.len(), 1);
    assert!(out[0].is_finite());
}
