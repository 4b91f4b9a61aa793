//! Process-wide, load-once cache of datasets per level.

use std::sync::{Mutex, OnceLock, PoisonError};

use tracing::{info, warn};

use super::{Dataset, DatasetSource};
use crate::models::{adm_label, SUPPORTED_LEVELS};

/// Lazily loads each supported level at most once and serves it read-only afterwards.
///
/// A level whose dataset is missing or unreadable is not cached, so a file
/// provisioned later is picked up on the next request.
pub struct DatasetCache {
    source: Box<dyn DatasetSource>,
    slots: [OnceLock<Dataset>; SUPPORTED_LEVELS.len()],
    init_lock: Mutex<()>,
}

impl DatasetCache {
    pub fn new(source: impl DatasetSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            slots: Default::default(),
            init_lock: Mutex::new(()),
        }
    }

    /// The dataset for `level`, loading it on first use. `None` for unsupported
    /// levels and for datasets that are unavailable.
    pub fn get(&self, level: u8) -> Option<&Dataset> {
        let slot = self.slot(level)?;
        if let Some(dataset) = slot.get() {
            return Some(dataset);
        }

        let _guard = self.init_lock.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(dataset) = slot.get() {
            return Some(dataset);
        }

        match self.source.load(level) {
            Ok(Some(dataset)) => {
                info!(
                    "[{}] loaded features: {}",
                    adm_label(level),
                    dataset.len()
                );
                Some(slot.get_or_init(|| dataset))
            }
            Ok(None) => {
                warn!("{} dataset not found", adm_label(level));
                None
            }
            Err(e) => {
                warn!("{} dataset unavailable: {}", adm_label(level), e);
                None
            }
        }
    }

    /// Load every supported level now. Returns how many are available.
    pub fn preload(&self) -> usize {
        SUPPORTED_LEVELS
            .iter()
            .filter(|level| self.get(**level).is_some())
            .count()
    }

    /// How to provision missing datasets.
    pub fn provisioning_hint(&self) -> String {
        self.source.describe()
    }

    fn slot(&self, level: u8) -> Option<&OnceLock<Dataset>> {
        let index = SUPPORTED_LEVELS.iter().position(|l| *l == level)?;
        self.slots.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{parse_dataset, DatasetError};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const EMPTY_COLLECTION: &str = r#"{"type": "FeatureCollection", "features": []}"#;

    /// Counts loads and only knows ADM1.
    struct CountingSource {
        loads: Arc<AtomicUsize>,
    }

    impl DatasetSource for CountingSource {
        fn load(&self, level: u8) -> Result<Option<Dataset>, DatasetError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            if level == 1 {
                parse_dataset(level, EMPTY_COLLECTION).map(Some)
            } else {
                Ok(None)
            }
        }

        fn describe(&self) -> String {
            "counting".to_string()
        }
    }

    fn counting_cache() -> (DatasetCache, Arc<AtomicUsize>) {
        let loads = Arc::new(AtomicUsize::new(0));
        let cache = DatasetCache::new(CountingSource {
            loads: Arc::clone(&loads),
        });
        (cache, loads)
    }

    #[test]
    fn test_loaded_once() {
        let (cache, loads) = counting_cache();
        assert!(cache.get(1).is_some());
        assert!(cache.get(1).is_some());
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_missing_level_retried() {
        let (cache, loads) = counting_cache();
        assert!(cache.get(2).is_none());
        assert!(cache.get(2).is_none());
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unsupported_level_not_loaded() {
        let (cache, loads) = counting_cache();
        assert!(cache.get(3).is_none());
        assert!(cache.get(0).is_none());
        assert_eq!(loads.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_concurrent_first_access_loads_once() {
        let (cache, loads) = counting_cache();
        let cache = Arc::new(cache);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || cache.get(1).map(|d| d.level()))
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), Some(1));
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_preload() {
        let (cache, _) = counting_cache();
        assert_eq!(cache.preload(), 1);
        assert_eq!(cache.provisioning_hint(), "counting");
    }
}
