//! "Last known data for a VIN" queries over the history

use tracing::info;

use super::{History, HistoryStore};
use crate::data::{VehicleRecord, Vin};

impl History {
    /// Most recently inserted record for `vin`
    ///
    /// Insertion order decides, not the stored timestamps. The match is an
    /// exact string comparison against the normalized VIN.
    pub fn find_cached(&self, vin: &Vin) -> Option<&VehicleRecord> {
        let found = self
            .iter()
            .rev()
            .find(|entry| entry.vin.as_deref() == Some(vin.as_str()))
            .map(|entry| &entry.data);

        if found.is_some() {
            info!(%vin, "using cached data");
        }
        found
    }
}

impl HistoryStore {
    /// Loads the history and returns the latest record for `vin`, if any
    pub fn find_cached(&self, vin: &Vin) -> Option<VehicleRecord> {
        self.load().find_cached(vin).cloned()
    }
}
