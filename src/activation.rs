//! Activation functions applied between the random layers.
//!
//! Every function maps an array to an array of the same shape. All of them
//! work elementwise except `softmax`, which normalizes over the whole array
//! at once rather than per row. Functions are looked up by a stable string
//! identifier through a static registry.

use crate::error::{GenerationError, Result};
use ndarray::{Array, Dimension};
use std::fmt;
use std::str::FromStr;

/// Activation functions available to the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Activation {
    /// f(x) = tanh(x)
    Tanh,
    /// f(x) = 1 / (1 + e^(-x))
    Sigmoid,
    /// f(x) = max(x, 0)
    Relu,
    /// f(x) = e^x / sum(e^x), summed over every element of the array
    Softmax,
    /// f(x) = 1 / cosh(x)
    Sech,
    /// f(x) = x
    Identity,
    /// f(x) = sin(x)
    Sin,
    /// f(x) = cos(x)
    Cos,
    /// f(x) = e^(-x^2)
    Gaussian,
    /// f(x) = |x|
    Abs,
}

/// Identifier to function mapping. Names are what users type and what
/// appears in generated filenames, so they must never change.
const REGISTRY: [(&str, Activation); 10] = [
    ("tanh", Activation::Tanh),
    ("sigmoid", Activation::Sigmoid),
    ("relu", Activation::Relu),
    ("softmax", Activation::Softmax),
    ("sech", Activation::Sech),
    ("identity", Activation::Identity),
    ("sin", Activation::Sin),
    ("cos", Activation::Cos),
    ("gaussian", Activation::Gaussian),
    ("abs", Activation::Abs),
];

impl Activation {
    /// Resolve an activation by identifier.
    pub fn from_name(name: &str) -> Result<Self> {
        REGISTRY
            .iter()
            .find(|(id, _)| *id == name)
            .map(|(_, activation)| *activation)
            .ok_or_else(|| GenerationError::UnknownActivation {
                name: name.to_string(),
            })
    }

    /// Stable identifier of this activation.
    pub fn name(self) -> &'static str {
        REGISTRY
            .iter()
            .find(|(_, activation)| *activation == self)
            .map(|(id, _)| *id)
            .unwrap_or("unknown")
    }

    /// Every registered identifier, in registry order.
    pub fn names() -> impl Iterator<Item = &'static str> {
        REGISTRY.iter().map(|(id, _)| *id)
    }

    /// Apply the activation to an array of any shape.
    pub fn apply<D: Dimension>(self, mut values: Array<f64, D>) -> Array<f64, D> {
        match self {
            Self::Softmax => softmax(values),
            Self::Identity => values,
            _ => {
                values.mapv_inplace(|x| self.apply_scalar(x));
                values
            }
        }
    }

    #[inline]
    fn apply_scalar(self, x: f64) -> f64 {
        match self {
            Self::Tanh => x.tanh(),
            Self::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            Self::Relu => x.max(0.0),
            Self::Sech => 1.0 / x.cosh(),
            Self::Identity => x,
            Self::Sin => x.sin(),
            Self::Cos => x.cos(),
            Self::Gaussian => (-x * x).exp(),
            Self::Abs => x.abs(),
            // Not elementwise; handled in `apply`.
            Self::Softmax => x,
        }
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Activation {
    type Err = GenerationError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
    }
}

/// Global softmax. Exponents are shifted by the array maximum, which leaves
/// every ratio unchanged but keeps large pre-activations from overflowing.
fn softmax<D: Dimension>(mut values: Array<f64, D>) -> Array<f64, D> {
    if values.is_empty() {
        return values;
    }
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    values.mapv_inplace(|x| (x - max).exp());
    let sum = values.sum();
    values /= sum;
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2, ArrayD, IxDyn};
    use proptest::prelude::*;

    #[test]
    fn test_lookup_roundtrips_every_name() {
        for name in Activation::names() {
            let activation = Activation::from_name(name).unwrap();
            assert_eq!(activation.name(), name);
        }
    }

    #[test]
    fn test_unknown_activation_names_identifier() {
        let err = Activation::from_name("swish").unwrap_err();
        assert!(matches!(
            &err,
            GenerationError::UnknownActivation { name } if name == "swish"
        ));
        assert!(err.to_string().contains("swish"));
        assert!(err.is_config_error());
    }

    #[test]
    fn test_elementwise_formulas() {
        let x = array![[-1.0, 0.0, 2.0]];

        let tanh = Activation::Tanh.apply(x.clone());
        assert!((tanh[[0, 2]] - 2.0f64.tanh()).abs() < 1e-12);

        let sigmoid = Activation::Sigmoid.apply(x.clone());
        assert!((sigmoid[[0, 1]] - 0.5).abs() < 1e-12);
        assert!((sigmoid[[0, 0]] - 1.0 / (1.0 + 1.0f64.exp())).abs() < 1e-12);

        let relu = Activation::Relu.apply(x.clone());
        assert_eq!(relu, array![[0.0, 0.0, 2.0]]);

        let sech = Activation::Sech.apply(x.clone());
        assert!((sech[[0, 1]] - 1.0).abs() < 1e-12);
        assert!((sech[[0, 2]] - 1.0 / 2.0f64.cosh()).abs() < 1e-12);

        let gaussian = Activation::Gaussian.apply(x);
        assert!((gaussian[[0, 1]] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_softmax_sums_to_one_over_whole_array() {
        let x = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
        let y = Activation::Softmax.apply(x);
        assert!((y.sum() - 1.0).abs() < 1e-12);

        // A row-wise softmax would make each row sum to one instead.
        let first_row: f64 = y.row(0).sum();
        assert!(first_row < 0.5);
    }

    #[test]
    fn test_softmax_matches_unshifted_formula() {
        let x: Array2<f64> = array![[0.5, -1.0], [2.0, 0.25]];
        let expected_sum: f64 = x.iter().map(|v| v.exp()).sum();
        let y = Activation::Softmax.apply(x.clone());
        for (out, input) in y.iter().zip(x.iter()) {
            assert!((out - input.exp() / expected_sum).abs() < 1e-12);
        }
    }

    #[test]
    fn test_softmax_survives_large_inputs() {
        let y = Activation::Softmax.apply(array![1000.0, 1000.0]);
        assert!((y[0] - 0.5).abs() < 1e-12);
    }

    fn any_activation() -> impl Strategy<Value = Activation> {
        (0..REGISTRY.len()).prop_map(|i| REGISTRY[i].1)
    }

    proptest! {
        #[test]
        fn prop_activation_preserves_shape(
            activation in any_activation(),
            shape in proptest::collection::vec(1usize..5, 1..4),
            seed in -3.0f64..3.0,
        ) {
            let len: usize = shape.iter().product();
            let data: Vec<f64> = (0..len).map(|i| seed + i as f64 * 0.1).collect();
            let input = ArrayD::from_shape_vec(IxDyn(&shape), data).unwrap();
            let output = activation.apply(input);
            prop_assert_eq!(output.shape(), shape.as_slice());
        }
    }
}
