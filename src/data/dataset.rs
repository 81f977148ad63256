use burn::data::dataset::Dataset;

use crate::data::collator::{BatchCollator, EncodedRow};
use crate::domain::example::AlignedExample;
use crate::domain::traits::SubwordTokenizer;
use crate::error::Result;

/// Encoded rows of one split, ready for burn's DataLoader.
///
/// Encoding happens once in `from_examples`, so batching later on
/// cannot fail.
pub struct AlignedDataset {
    rows: Vec<EncodedRow>,
}

impl AlignedDataset {
    pub fn from_examples<T: SubwordTokenizer + ?Sized>(
        examples: &[AlignedExample],
        collator: &BatchCollator<'_, T>,
    ) -> Result<Self> {
        let rows = examples
            .iter()
            .map(|e| collator.encode(e))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rows })
    }

    pub fn row_count(&self) -> usize { self.rows.len() }
}

impl Dataset<EncodedRow> for AlignedDataset {
    fn get(&self, index: usize) -> Option<EncodedRow> {
        self.rows.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.rows.len()
    }
}
