use anyhow::{anyhow, Result};
use burn::{
    nn::{Linear, LinearConfig, Relu},
    prelude::*,
};

use crate::infra::export::TracedOp;

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally, so they are not derived again here.
#[derive(Config, Debug)]
pub struct MlpConfig {
    pub input_size:  usize,
    #[config(default = 128)]
    pub hidden_size: usize,
    pub output_size: usize,
}

impl MlpConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Mlp<B> {
        Mlp {
            input:      LinearConfig::new(self.input_size, self.hidden_size).init(device),
            hidden:     LinearConfig::new(self.hidden_size, self.hidden_size).init(device),
            output:     LinearConfig::new(self.hidden_size, self.output_size).init(device),
            activation: Relu::new(),
        }
    }

    /// Expected [d_input, d_output] of each linear layer, in forward order
    pub fn layer_shapes(&self) -> [[usize; 2]; 3] {
        [
            [self.input_size, self.hidden_size],
            [self.hidden_size, self.hidden_size],
            [self.hidden_size, self.output_size],
        ]
    }
}

/// Three fully connected layers with ReLU in between:
/// input → hidden → ReLU → hidden → ReLU → output
#[derive(Module, Debug)]
pub struct Mlp<B: Backend> {
    pub input:      Linear<B>,
    pub hidden:     Linear<B>,
    pub output:     Linear<B>,
    pub activation: Relu,
}

impl<B: Backend> Mlp<B> {
    /// features: [batch, input_size] → predictions: [batch, output_size]
    pub fn forward(&self, features: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.input.forward(features);
        let x = self.activation.forward(x);
        let x = self.hidden.forward(x);
        let x = self.activation.forward(x);
        self.output.forward(x)
    }

    /// Same computation as `forward`, recording every executed op
    /// with its parameter values so the graph can run without Burn.
    pub fn trace(&self, features: Tensor<B, 2>) -> Result<(Tensor<B, 2>, Vec<TracedOp>)> {
        let mut ops = Vec::with_capacity(5);
        let mut x   = features;

        for (i, layer) in self.layers().into_iter().enumerate() {
            if i > 0 {
                x = self.activation.forward(x);
                ops.push(TracedOp::Relu);
            }
            ops.push(linear_op(layer)?);
            x = layer.forward(x);
        }

        Ok((x, ops))
    }

    pub fn layers(&self) -> [&Linear<B>; 3] {
        [&self.input, &self.hidden, &self.output]
    }

    /// Actual [d_input, d_output] of each linear layer, in forward order
    pub fn layer_shapes(&self) -> [[usize; 2]; 3] {
        self.layers().map(|l| l.weight.dims())
    }

    pub fn input_size(&self) -> usize {
        self.input.weight.dims()[0]
    }

    pub fn output_size(&self) -> usize {
        self.output.weight.dims()[1]
    }
}

fn linear_op<B: Backend>(layer: &Linear<B>) -> Result<TracedOp> {
    let [in_features, out_features] = layer.weight.dims();

    // Burn stores the weight as [d_input, d_output], row-major
    let weight = layer.weight.val().into_data().to_vec::<f32>()
        .map_err(|e| anyhow!("Cannot read linear weight: {e:?}"))?;

    let bias = match &layer.bias {
        Some(b) => b.val().into_data().to_vec::<f32>()
            .map_err(|e| anyhow!("Cannot read linear bias: {e:?}"))?,
        None => vec![0.0; out_features],
    };

    Ok(TracedOp::Linear { in_features, out_features, weight, bias })
}
