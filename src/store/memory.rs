//! In-memory store keyed by record id

use super::{InvestorPatch, InvestorStore, SeriesPatch, SeriesStore};
use crate::error::StoreError;
use crate::investor::Investor;
use crate::series::Series;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    investors: BTreeMap<String, Investor>,
    series: BTreeMap<String, Series>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from existing collections
    pub fn with_records(investors: Vec<Investor>, series: Vec<Series>) -> Self {
        let mut store = Self::new();
        for investor in investors {
            store.insert_investor(investor);
        }
        for s in series {
            store.insert_series(s);
        }
        store
    }

    pub fn insert_investor(&mut self, investor: Investor) {
        self.investors.insert(investor.id.clone(), investor);
    }

    pub fn insert_series(&mut self, series: Series) {
        self.series.insert(series.id.clone(), series);
    }
}

impl InvestorStore for MemoryStore {
    fn get_investor(&self, id: &str) -> Result<Investor, StoreError> {
        self.investors
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::investor_not_found(id))
    }

    fn update_investor(&mut self, id: &str, patch: &InvestorPatch) -> Result<Investor, StoreError> {
        let investor = self
            .investors
            .get_mut(id)
            .ok_or_else(|| StoreError::investor_not_found(id))?;
        patch.apply(investor);
        Ok(investor.clone())
    }

    fn list_investors(&self) -> Result<Vec<Investor>, StoreError> {
        Ok(self.investors.values().cloned().collect())
    }
}

impl SeriesStore for MemoryStore {
    fn get_series(&self, id: &str) -> Result<Series, StoreError> {
        self.series
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::series_not_found(id))
    }

    fn update_series(&mut self, id: &str, patch: &SeriesPatch) -> Result<Series, StoreError> {
        let series = self
            .series
            .get_mut(id)
            .ok_or_else(|| StoreError::series_not_found(id))?;
        patch.apply(series);
        Ok(series.clone())
    }

    fn list_series(&self) -> Result<Vec<Series>, StoreError> {
        Ok(self.series.values().cloned().collect())
    }
}
