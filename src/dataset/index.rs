//! One administrative level's features with an R-tree over their bounding boxes.

use rstar::{RTree, RTreeObject, AABB};
use tracing::info;

use crate::models::{adm_label, AdminFeature};
use crate::overlap::BoundingBox;

/// R-tree entry pointing back into the dataset's feature list.
#[derive(Clone)]
struct IndexedFeature {
    position: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedFeature {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Immutable dataset for one administrative level.
pub struct Dataset {
    level: u8,
    features: Vec<AdminFeature>,
    tree: RTree<IndexedFeature>,
}

impl Dataset {
    /// Build the dataset and its envelope index. Features without coordinates
    /// stay in the list but are never candidates.
    pub fn build(level: u8, features: Vec<AdminFeature>) -> Self {
        let indexed: Vec<IndexedFeature> = features
            .iter()
            .enumerate()
            .filter_map(|(position, f)| {
                f.bbox.map(|bbox| IndexedFeature {
                    position,
                    envelope: bbox.envelope(),
                })
            })
            .collect();

        let tree = RTree::bulk_load(indexed);

        info!(
            "{} dataset: {} features, {} indexed",
            adm_label(level),
            features.len(),
            tree.size()
        );

        Self {
            level,
            features,
            tree,
        }
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    /// Features whose bounding box intersects `bbox` (touching included), in dataset order.
    pub fn candidates(&self, bbox: &BoundingBox) -> Vec<&AdminFeature> {
        let mut positions: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(&bbox.envelope())
            .map(|entry| entry.position)
            .collect();
        positions.sort_unstable();

        positions.into_iter().map(|p| &self.features[p]).collect()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}
