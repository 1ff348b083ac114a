use burn::{
    nn::loss::{MseLoss, Reduction},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Regression criterion, mean-reduced over every element of the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LossKind {
    /// Mean squared error
    #[default]
    Mse,
    /// Mean absolute error
    Mae,
}

impl LossKind {
    pub fn forward<B: Backend>(&self, output: Tensor<B, 2>, target: Tensor<B, 2>) -> Tensor<B, 1> {
        match self {
            LossKind::Mse => MseLoss::new().forward(output, target, Reduction::Mean),
            LossKind::Mae => (output - target).abs().mean(),
        }
    }
}

impl FromStr for LossKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mse" => Ok(LossKind::Mse),
            "mae" | "l1" => Ok(LossKind::Mae),
            other => Err(format!("unknown loss '{other}' (expected mse or mae)")),
        }
    }
}

impl fmt::Display for LossKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LossKind::Mse => write!(f, "mse"),
            LossKind::Mae => write!(f, "mae"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    fn pair() -> (Tensor<TestBackend, 2>, Tensor<TestBackend, 2>) {
        let device = Default::default();
        let out = Tensor::from_data(TensorData::new(vec![1.0f32, 2.0, 3.0, 4.0], [2, 2]), &device);
        let tgt = Tensor::from_data(TensorData::new(vec![0.0f32, 2.0, 5.0, 4.0], [2, 2]), &device);
        (out, tgt)
    }

    #[test]
    fn test_mse_value() {
        let (out, tgt) = pair();
        let v: f64 = LossKind::Mse.forward(out, tgt).into_scalar().elem();
        // (1 + 0 + 4 + 0) / 4
        assert!((v - 1.25).abs() < 1e-6);
    }

    #[test]
    fn test_mae_value() {
        let (out, tgt) = pair();
        let v: f64 = LossKind::Mae.forward(out, tgt).into_scalar().elem();
        // (1 + 0 + 2 + 0) / 4
        assert!((v - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_parse() {
        assert_eq!("MSE".parse::<LossKind>().unwrap(), LossKind::Mse);
        assert_eq!("l1".parse::<LossKind>().unwrap(), LossKind::Mae);
        assert!("huber".parse::<LossKind>().is_err());
    }
}
