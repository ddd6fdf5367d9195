use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One training example: an input vector and the output it should produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    input: Vec<f64>,
    target: Vec<f64>,
}

impl Sample {
    pub fn new(input: Vec<f64>, target: Vec<f64>) -> Sample {
        Sample { input, target }
    }

    pub fn input(&self) -> &[f64] {
        &self.input
    }

    pub fn target(&self) -> &[f64] {
        &self.target
    }
}

/// An ordered collection of samples sharing one input width and one target
/// width.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DatasetRecord", into = "DatasetRecord")]
pub struct Dataset {
    samples: Vec<Sample>,
}

#[derive(Serialize, Deserialize)]
struct DatasetRecord {
    samples: Vec<Sample>,
}

impl TryFrom<DatasetRecord> for Dataset {
    type Error = Error;

    fn try_from(record: DatasetRecord) -> Result<Dataset> {
        Dataset::new(record.samples)
    }
}

impl From<Dataset> for DatasetRecord {
    fn from(dataset: Dataset) -> DatasetRecord {
        DatasetRecord { samples: dataset.samples }
    }
}

impl Dataset {
    pub fn new(samples: Vec<Sample>) -> Result<Dataset> {
        let dataset = Dataset { samples };
        dataset.validate()?;
        Ok(dataset)
    }

    /// Pairs `inputs[i]` with `targets[i]`.
    pub fn from_pairs(inputs: &[Vec<f64>], targets: &[Vec<f64>]) -> Result<Dataset> {
        if inputs.len() != targets.len() {
            return Err(Error::shape("target count", inputs.len(), targets.len()));
        }
        let samples = inputs
            .iter()
            .zip(targets)
            .map(|(i, t)| Sample::new(i.clone(), t.clone()))
            .collect();
        Dataset::new(samples)
    }

    fn validate(&self) -> Result<()> {
        let Some(first) = self.samples.first() else {
            return Ok(());
        };
        let (n_in, n_out) = (first.input.len(), first.target.len());
        for s in &self.samples[1..] {
            if s.input.len() != n_in {
                return Err(Error::shape("sample input", n_in, s.input.len()));
            }
            if s.target.len() != n_out {
                return Err(Error::shape("sample target", n_out, s.target.len()));
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sample> {
        self.samples.iter()
    }

    pub fn input_width(&self) -> Option<usize> {
        self.samples.first().map(|s| s.input.len())
    }

    pub fn target_width(&self) -> Option<usize> {
        self.samples.first().map(|s| s.target.len())
    }

    pub fn push(&mut self, sample: Sample) -> Result<()> {
        if let Some(first) = self.samples.first() {
            if first.input.len() != sample.input.len() {
                return Err(Error::shape("sample input", first.input.len(), sample.input.len()));
            }
            if first.target.len() != sample.target.len() {
                return Err(Error::shape("sample target", first.target.len(), sample.target.len()));
            }
        }
        self.samples.push(sample);
        Ok(())
    }

    /// Draws one training batch.
    ///
    /// - `batch_size == 0` or `>= len`: the whole dataset, in order;
    /// - `batch_size == 1`            : one sample picked uniformly;
    /// - otherwise                    : a random subset without replacement.
    pub fn draw<R: Rng + ?Sized>(&self, batch_size: usize, rng: &mut R) -> Vec<&Sample> {
        if batch_size == 0 || batch_size >= self.samples.len() {
            return self.samples.iter().collect();
        }
        if batch_size == 1 {
            return self.samples.choose(rng).into_iter().collect();
        }
        self.samples.choose_multiple(rng, batch_size).collect()
    }

    /// Shuffles and splits into disjoint `(train, test)` sets, the test set
    /// holding `floor(len * test_fraction)` samples.
    pub fn split<R: Rng + ?Sized>(&self, test_fraction: f64, rng: &mut R) -> (Dataset, Dataset) {
        let fraction = test_fraction.clamp(0.0, 1.0);
        let test_size = ((self.samples.len() as f64) * fraction).floor() as usize;

        let mut shuffled = self.samples.clone();
        shuffled.shuffle(rng);
        let train = shuffled.split_off(test_size);
        (Dataset { samples: train }, Dataset { samples: shuffled })
    }

    /// The first `n` samples (all of them if `n >= len`).
    pub fn first_n(&self, n: usize) -> Dataset {
        let n = n.min(self.samples.len());
        Dataset { samples: self.samples[..n].to_vec() }
    }

    /// Serializes the dataset to a pretty-printed JSON file.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a dataset previously written by `save_json`.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Dataset> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Sample;
    type IntoIter = std::slice::Iter<'a, Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}
