// ============================================================
// Layer 6 - Traced Export and Native Runtime
// ============================================================
// Export runs the model once on a random input of the right
// shape, records each executed op together with its parameter
// values, and writes that graph as JSON.
//
// The file is self-contained:
//   {
//     "input_size": 8, "output_size": 2,
//     "ops": [ {"op": "linear", ...}, {"op": "relu"}, ... ],
//     "example_input":  [...],   // the tracing input
//     "example_output": [...]    // what the model produced for it
//   }
//
// TracedModel::forward executes the graph with plain Rust on
// the CPU. Loading an artifact needs neither Burn nor a GPU.
// The stored example pair lets a consumer check that its
// execution matches the model that was traced.
//
// Writing overwrites any existing file at the path.

use anyhow::{anyhow, ensure, Context, Result};
use burn::{prelude::*, tensor::Distribution};
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}};

use crate::ml::model::Mlp;

/// Where the scalers for the model at `model_path` live:
/// `mlp_model_traced.json` → `mlp_model_traced.scalers.json`
pub fn scaler_path(model_path: &Path) -> PathBuf {
    model_path.with_extension("scalers.json")
}

/// One executed operation of the traced graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum TracedOp {
    /// y = x · W + b, W stored row-major as [in_features, out_features]
    Linear {
        in_features:  usize,
        out_features: usize,
        weight:       Vec<f32>,
        bias:         Vec<f32>,
    },
    /// y = max(x, 0)
    Relu,
}

impl TracedOp {
    fn apply(&self, x: &[f32]) -> Result<Vec<f32>> {
        match self {
            TracedOp::Linear { in_features, out_features, weight, bias } => {
                ensure!(
                    x.len() == *in_features,
                    "Linear op expects {} inputs, got {}",
                    in_features,
                    x.len()
                );
                ensure!(
                    weight.len() == in_features * out_features && bias.len() == *out_features,
                    "Linear op parameters do not match [{in_features}, {out_features}]"
                );
                let mut y = bias.clone();
                for (i, &xi) in x.iter().enumerate() {
                    let row = &weight[i * out_features..(i + 1) * out_features];
                    for (yj, &w) in y.iter_mut().zip(row) {
                        *yj += xi * w;
                    }
                }
                Ok(y)
            }
            TracedOp::Relu => Ok(x.iter().map(|&v| v.max(0.0)).collect()),
        }
    }
}

/// A traced, frozen model that runs without the training framework.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TracedModel {
    pub input_size:     usize,
    pub output_size:    usize,
    pub ops:            Vec<TracedOp>,
    pub example_input:  Vec<f32>,
    pub example_output: Vec<f32>,
}

impl TracedModel {
    /// Run one sample (scaled features) through the graph.
    pub fn forward(&self, input: &[f32]) -> Result<Vec<f32>> {
        ensure!(
            input.len() == self.input_size,
            "Model expects {} features, got {}",
            self.input_size,
            input.len()
        );
        let mut x = input.to_vec();
        for op in &self.ops {
            x = op.apply(&x)?;
        }
        ensure!(
            x.len() == self.output_size,
            "Graph produced {} outputs, expected {}",
            x.len(),
            self.output_size
        );
        Ok(x)
    }

    /// Replay the tracing input and compare against the recorded output.
    pub fn verify(&self, tolerance: f32) -> Result<()> {
        ensure!(
            self.example_output.len() == self.output_size,
            "Recorded example has {} outputs, expected {}",
            self.example_output.len(),
            self.output_size
        );
        let replay = self.forward(&self.example_input)?;
        for (i, (got, want)) in replay.iter().zip(&self.example_output).enumerate() {
            let allowed = tolerance * want.abs().max(1.0);
            ensure!(
                (got - want).abs() <= allowed,
                "Output {i} diverges from trace: {got} vs {want}"
            );
        }
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string(self)?;
        fs::write(path, json)
            .with_context(|| format!("Cannot write traced model to '{}'", path.display()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Cannot read traced model '{}'", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Malformed traced model '{}'", path.display()))
    }
}

/// Trace `model` with a random [1, input_size] input on the model's own
/// device and write the captured graph to `path`.
///
/// Pass the inference-mode model (`model.valid()`), not the autodiff one.
pub fn export_traced<B: Backend>(
    model:      &Mlp<B>,
    input_size: usize,
    path:       &Path,
) -> Result<TracedModel> {
    ensure!(
        model.input_size() == input_size,
        "Model takes {} features, cannot trace with {}",
        model.input_size(),
        input_size
    );
    let device = model
        .devices()
        .into_iter()
        .next()
        .context("Model has no parameters on any device")?;

    let example = Tensor::<B, 2>::random([1, input_size], Distribution::Normal(0.0, 1.0), &device);
    let (output, ops) = model.trace(example.clone())?;

    let example_input = example.into_data().to_vec::<f32>()
        .map_err(|e| anyhow!("Cannot read trace input: {e:?}"))?;
    let example_output = output.into_data().to_vec::<f32>()
        .map_err(|e| anyhow!("Cannot read trace output: {e:?}"))?;

    let traced = TracedModel {
        input_size,
        output_size: example_output.len(),
        ops,
        example_input,
        example_output,
    };
    traced.save(path)?;

    tracing::info!("Traced model saved to {}", path.display());
    Ok(traced)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    use crate::ml::model::MlpConfig;

    type TestBackend = NdArray<f32>;

    fn close(a: &[f32], b: &[f32]) -> bool {
        a.len() == b.len()
            && a.iter().zip(b).all(|(x, y)| (x - y).abs() <= 1e-4 * y.abs().max(1.0))
    }

    #[test]
    fn test_reloaded_trace_reproduces_model_output() {
        let _guard = crate::ml::burn_test_lock();
        let device = Default::default();
        let model  = MlpConfig::new(8, 2).with_hidden_size(32).init::<TestBackend>(&device);
        let dir    = tempfile::tempdir().unwrap();
        let path   = dir.path().join("model.json");

        let traced = export_traced(&model, 8, &path).unwrap();

        // In-memory model on the tracing input
        let input = Tensor::<TestBackend, 2>::from_data(
            TensorData::new(traced.example_input.clone(), [1, 8]), &device,
        );
        let expected = model.forward(input).into_data().to_vec::<f32>().unwrap();

        let reloaded = TracedModel::load(&path).unwrap();
        let replayed = reloaded.forward(&reloaded.example_input).unwrap();

        assert!(close(&replayed, &expected));
        assert!(close(&reloaded.example_output, &expected));
        reloaded.verify(1e-4).unwrap();
    }

    #[test]
    fn test_export_overwrites_existing_file() {
        let _guard = crate::ml::burn_test_lock();
        let device = Default::default();
        let model  = MlpConfig::new(3, 1).with_hidden_size(4).init::<TestBackend>(&device);
        let dir    = tempfile::tempdir().unwrap();
        let path   = dir.path().join("model.json");
        fs::write(&path, "stale").unwrap();

        export_traced(&model, 3, &path).unwrap();
        assert!(TracedModel::load(&path).is_ok());
    }

    #[test]
    fn test_hand_built_graph() {
        // 2 → 2 identity-ish layer, ReLU, then sum into one output
        let traced = TracedModel {
            input_size:  2,
            output_size: 1,
            ops: vec![
                TracedOp::Linear {
                    in_features: 2, out_features: 2,
                    weight: vec![1.0, 0.0, 0.0, 1.0],
                    bias:   vec![0.0, -1.0],
                },
                TracedOp::Relu,
                TracedOp::Linear {
                    in_features: 2, out_features: 1,
                    weight: vec![1.0, 1.0],
                    bias:   vec![0.5],
                },
            ],
            example_input:  vec![2.0, 0.5],
            example_output: vec![2.5],
        };
        assert_eq!(traced.forward(&[2.0, 0.5]).unwrap(), vec![2.5]);
        assert_eq!(traced.forward(&[-1.0, 3.0]).unwrap(), vec![2.5]);
        traced.verify(0.0).unwrap();
    }

    #[test]
    fn test_wrong_feature_count_is_error() {
        let traced = TracedModel {
            input_size: 2, output_size: 2,
            ops: vec![TracedOp::Relu],
            example_input: vec![0.0, 0.0], example_output: vec![0.0, 0.0],
        };
        assert!(traced.forward(&[1.0]).is_err());
    }

    #[test]
    fn test_export_rejects_wrong_input_size() {
        let _guard = crate::ml::burn_test_lock();
        let device = Default::default();
        let model  = MlpConfig::new(8, 2).with_hidden_size(4).init::<TestBackend>(&device);
        let dir    = tempfile::tempdir().unwrap();
        let path   = dir.path().join("model.json");

        assert!(export_traced(&model, 5, &path).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_verify_rejects_truncated_example() {
        let traced = TracedModel {
            input_size:  2,
            output_size: 2,
            ops:         vec![TracedOp::Relu],
            example_input:  vec![1.0, 2.0],
            example_output: vec![1.0],
        };
        assert!(traced.verify(1e-4).is_err());
    }

    #[test]
    fn test_scaler_path_sits_next_to_model() {
        assert_eq!(
            scaler_path(Path::new("out/mlp_model_traced.json")),
            PathBuf::from("out/mlp_model_traced.scalers.json")
        );
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir  = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(TracedModel::load(&path).is_err());
    }
}
