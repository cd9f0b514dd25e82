use crate::envelope::Envelope;
use crate::error::Result;
use crate::geometry::BoundingBox;
use crate::projection::SampleProjector;
use crate::sample::{CategoryTable, Sample};

/// The samples of one ingestion together with their category table and
/// envelope. Nothing is shared between datasets.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    categories: CategoryTable,
    samples: Vec<Sample>,
    envelope: Envelope,
}

impl Dataset {
    pub fn new(categories: CategoryTable) -> Self {
        Self {
            categories,
            samples: Vec::new(),
            envelope: Envelope::new(),
        }
    }

    /// Appends a sample and widens the envelope to include it.
    pub fn push(&mut self, sample: Sample) {
        self.envelope.include(&sample.location());
        self.samples.push(sample);
    }

    pub fn categories(&self) -> &CategoryTable {
        &self.categories
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    pub fn bounding_box(&self) -> Result<BoundingBox> {
        self.envelope.bounding_box()
    }

    pub fn degree_width(&self) -> Option<f64> {
        Some(self.envelope.max_lng()? - self.envelope.min_lng()?)
    }

    pub fn degree_height(&self) -> Option<f64> {
        Some(self.envelope.max_lat()? - self.envelope.min_lat()?)
    }

    /// Projector sized to this dataset's envelope.
    pub fn projector(&self, width: u32) -> Result<SampleProjector> {
        SampleProjector::new(self.bounding_box()?, width)
    }

    /// How many samples each category dominates, in table order.
    pub fn dominance_tally(&self) -> Vec<usize> {
        let mut tally = vec![0; self.categories.len()];
        for index in self.samples.iter().filter_map(Sample::dominant_category) {
            if let Some(slot) = tally.get_mut(index) {
                *slot += 1;
            }
        }
        tally
    }
}
