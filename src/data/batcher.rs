// ============================================================
// Layer 4 - Traction Batcher
// ============================================================
// Implements Burn's Batcher trait to convert a Vec<TractionItem>
// into tensors on the target device.
//
//   Input:  Vec of N TractionItems (F features, T targets each)
//   Output: TractionBatch { features: [N, F], targets: [N, T] }
//
// Rows are flattened in order, then reshaped, so row i of each
// tensor is item i.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::data::dataset::TractionItem;

/// A batch of scaled samples for one forward pass.
#[derive(Debug, Clone)]
pub struct TractionBatch<B: Backend> {
    /// Scaled features, shape [batch_size, feature_count]
    pub features: Tensor<B, 2>,

    /// Scaled targets, shape [batch_size, target_count]
    pub targets: Tensor<B, 2>,
}

impl<B: Backend> TractionBatch<B> {
    pub fn size(&self) -> usize {
        self.features.dims()[0]
    }
}

/// Holds the device so tensors are created on the right CPU/GPU.
#[derive(Clone, Debug)]
pub struct TractionBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> TractionBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<TractionItem, TractionBatch<B>> for TractionBatcher<B> {
    fn batch(&self, items: Vec<TractionItem>) -> TractionBatch<B> {
        let batch_size    = items.len();
        let feature_count = items.first().map_or(0, |i| i.features.len());
        let target_count  = items.first().map_or(0, |i| i.targets.len());

        let feature_flat: Vec<f32> = items
            .iter()
            .flat_map(|i| i.features.iter().copied())
            .collect();

        let target_flat: Vec<f32> = items
            .iter()
            .flat_map(|i| i.targets.iter().copied())
            .collect();

        let features = Tensor::<B, 2>::from_data(
            TensorData::new(feature_flat, [batch_size, feature_count]),
            &self.device,
        );

        let targets = Tensor::<B, 2>::from_data(
            TensorData::new(target_flat, [batch_size, target_count]),
            &self.device,
        );

        TractionBatch { features, targets }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_batch_shapes_and_row_order() {
        let device  = Default::default();
        let batcher = TractionBatcher::<TestBackend>::new(device);
        let items   = vec![
            TractionItem { features: vec![0.0, 0.1, 0.2], targets: vec![1.0, 0.0] },
            TractionItem { features: vec![1.0, 1.1, 1.2], targets: vec![0.5, 0.25] },
        ];

        let batch = batcher.batch(items);
        assert_eq!(batch.features.dims(), [2, 3]);
        assert_eq!(batch.targets.dims(),  [2, 2]);
        assert_eq!(batch.size(), 2);

        let targets = batch.targets.into_data().to_vec::<f32>().unwrap();
        assert_eq!(targets, vec![1.0, 0.0, 0.5, 0.25]);
    }
}
