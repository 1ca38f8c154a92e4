//! Provides fillers that initialize the values of a tensor.
//!
//! Fillers are used to create reproducible batches of scores and label codes,
//! e.g. for checking the gradients of a layer.
use rand::{SeedableRng, XorShiftRng};
use rand::distributions::{IndependentSample, Normal, Range};
use co::{IBackend, ITensorDesc, SharedTensor};
use error::Error;
use util::native_backend;

#[derive(Debug, Copy, Clone)]
/// Enum for specifing the type of Filler.
pub enum FillerType {
    /// Fills the tensor with a constant `value` (all values are the same).
    Constant {
        /// The value that will be used to fill the tensor.
        value: f32
    },
    /// Fills the tensor with samples of a normal distribution.
    Gaussian {
        /// Mean of the distribution.
        mean: f32,
        /// Standard deviation of the distribution.
        std: f32,
        /// Seed of the random number generator.
        seed: u32,
    },
    /// Fills the tensor with integral codes drawn uniformly from `[low, high)`.
    ///
    /// Useful for random label codes.
    UniformCodes {
        /// Smallest code.
        low: i32,
        /// One past the largest code.
        high: i32,
        /// Seed of the random number generator.
        seed: u32,
    },
}

impl FillerType {
    /// Uses a filler as specified by this FillerType to fill the values in a SharedTensor
    ///
    /// The tensor has to live on the native device.
    pub fn fill(&self, tensor: &mut SharedTensor<f32>) -> Result<(), Error> {
        let native = try!(native_backend());
        let size = tensor.desc().size();
        let memory = try!(tensor.get_mut(native.device())
            .and_then(|memory| memory.as_mut_native())
            .ok_or_else(|| Error::Backend("tensor has no native memory to fill".to_owned())));

        self.fill_slice(&mut memory.as_mut_slice::<f32>()[..size]);
        Ok(())
    }

    /// Fill a slice of host memory.
    pub fn fill_slice(&self, values: &mut [f32]) {
        match *self {
            FillerType::Constant { value } => {
                for e in values.iter_mut() {
                    *e = value;
                }
            }
            FillerType::Gaussian { mean, std, seed } => {
                let normal = Normal::new(mean as f64, std as f64);
                let mut rng = Self::rng(seed);
                for e in values.iter_mut() {
                    *e = normal.ind_sample(&mut rng) as f32;
                }
            }
            FillerType::UniformCodes { low, high, seed } => {
                let between = Range::new(low, high);
                let mut rng = Self::rng(seed);
                for e in values.iter_mut() {
                    *e = between.ind_sample(&mut rng) as f32;
                }
            }
        }
    }

    fn rng(seed: u32) -> XorShiftRng {
        // xorshift must not be seeded with zeros only
        XorShiftRng::from_seed([seed, seed ^ 0x9E37_79B9, 0x2545_F491, 0x6C07_8965])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gaussian_is_reproducible() {
        let filler = FillerType::Gaussian { mean: 0f32, std: 10f32, seed: 1701 };
        let mut one = [0f32; 16];
        let mut two = [0f32; 16];
        filler.fill_slice(&mut one);
        filler.fill_slice(&mut two);
        assert_eq!(one, two);
        assert!(one.iter().any(|&v| v != 0f32));
    }

    #[test]
    fn codes_stay_in_range() {
        let filler = FillerType::UniformCodes { low: -1, high: 2, seed: 1701 };
        let mut codes = [5f32; 64];
        filler.fill_slice(&mut codes);
        assert!(codes.iter().all(|&c| c == -1f32 || c == 0f32 || c == 1f32));
    }

    #[test]
    fn constant() {
        let mut values = [0f32; 3];
        FillerType::Constant { value: 2.5f32 }.fill_slice(&mut values);
        assert_eq!([2.5f32; 3], values);
    }
}
