use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::activation::activation::ActivationFunction;
use crate::error::Result;
use crate::layers::dense::Layer;
use crate::network::network::Network;
use crate::network::settings::NetworkSettings;

/// Describes one layer of a `NetworkSpec`.
///
/// Fields:
/// - `size`      : number of neurons in this layer
/// - `input_size`: output width of the previous layer, or the raw input
///   width for the first layer
/// - `activation`: shared activation; sigmoid when omitted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub size: usize,
    pub input_size: usize,
    #[serde(default)]
    pub activation: ActivationFunction,
}

/// Architecture and settings of a network, without weights.
///
/// `NetworkSpec` can be kept as a JSON file before any training happens and
/// turned into a randomly initialized [`Network`] with [`build`](Self::build).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpec {
    /// Human-readable name used as the model file stem.
    pub name: String,
    /// Ordered list of layer descriptions (input → output).
    pub layers: Vec<LayerSpec>,
    #[serde(default)]
    pub settings: NetworkSettings,
}

impl NetworkSpec {
    /// A spec with sigmoid layers between consecutive `widths`.
    pub fn from_widths(name: &str, widths: &[usize]) -> NetworkSpec {
        let layers = widths
            .windows(2)
            .map(|pair| LayerSpec {
                size: pair[1],
                input_size: pair[0],
                activation: ActivationFunction::Sigmoid,
            })
            .collect();
        NetworkSpec { name: name.to_string(), layers, settings: NetworkSettings::default() }
    }

    /// Creates a network with random weights matching this spec.
    ///
    /// # Errors
    /// `EmptyNetwork` without layers, `InvalidWidth` for zero sizes and
    /// `ShapeMismatch` when consecutive layers do not chain.
    pub fn build<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Network> {
        let layers = self
            .layers
            .iter()
            .map(|l| Layer::new(l.input_size, l.size, Some(l.activation), rng))
            .collect::<Result<Vec<_>>>()?;
        let mut network = Network::from_layers(layers)?;
        network.settings = self.settings.clone();
        Ok(network)
    }

    /// Serializes the spec to a pretty-printed JSON file.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a `NetworkSpec` from a JSON file.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<NetworkSpec> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}
