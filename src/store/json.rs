//! JSON file store: one array file per collection in a data directory
//!
//! Collections are loaded once on open. Each update rewrites the affected
//! file through a temp file and rename, and only then changes memory, so a
//! failed write leaves both the file and the in-memory view untouched.

use super::{InvestorPatch, InvestorStore, SeriesPatch, SeriesStore};
use crate::error::StoreError;
use crate::investor::Investor;
use crate::series::Series;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const INVESTORS_FILE: &str = "investors.json";
pub const SERIES_FILE: &str = "series.json";

#[derive(Debug)]
pub struct JsonStore {
    dir: PathBuf,
    investors: Vec<Investor>,
    series: Vec<Series>,
}

impl JsonStore {
    /// Open a data directory; missing files are treated as empty collections
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        let investors: Vec<Investor> = read_collection(&dir.join(INVESTORS_FILE))?;
        let series: Vec<Series> = read_collection(&dir.join(SERIES_FILE))?;

        log::info!(
            "Opened data directory {}: {} investors, {} series",
            dir.display(),
            investors.len(),
            series.len()
        );
        Ok(Self { dir, investors, series })
    }

    /// Create (or overwrite) a data directory with the given collections
    pub fn create<P: AsRef<Path>>(dir: P, investors: Vec<Investor>, series: Vec<Series>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        write_collection(&dir.join(INVESTORS_FILE), &investors)?;
        write_collection(&dir.join(SERIES_FILE), &series)?;
        Ok(Self { dir, investors, series })
    }
}

fn read_collection<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StoreError> {
    if !path.exists() {
        log::debug!("{} not found, starting empty", path.display());
        return Ok(Vec::new());
    }
    let text = fs::read_to_string(path)?;
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(&text)?)
}

fn write_collection<T: Serialize>(path: &Path, records: &[T]) -> Result<(), StoreError> {
    let tmp = path.with_extension("json.tmp");
    let text = serde_json::to_string_pretty(records)?;
    fs::write(&tmp, text)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

impl InvestorStore for JsonStore {
    fn get_investor(&self, id: &str) -> Result<Investor, StoreError> {
        self.investors
            .iter()
            .find(|inv| inv.id == id)
            .cloned()
            .ok_or_else(|| StoreError::investor_not_found(id))
    }

    fn update_investor(&mut self, id: &str, patch: &InvestorPatch) -> Result<Investor, StoreError> {
        let idx = self
            .investors
            .iter()
            .position(|inv| inv.id == id)
            .ok_or_else(|| StoreError::investor_not_found(id))?;

        let mut next = self.investors.clone();
        patch.apply(&mut next[idx]);
        write_collection(&self.dir.join(INVESTORS_FILE), &next)?;

        self.investors = next;
        Ok(self.investors[idx].clone())
    }

    fn list_investors(&self) -> Result<Vec<Investor>, StoreError> {
        Ok(self.investors.clone())
    }
}

impl SeriesStore for JsonStore {
    fn get_series(&self, id: &str) -> Result<Series, StoreError> {
        self.series
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| StoreError::series_not_found(id))
    }

    fn update_series(&mut self, id: &str, patch: &SeriesPatch) -> Result<Series, StoreError> {
        let idx = self
            .series
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| StoreError::series_not_found(id))?;

        let mut next = self.series.clone();
        patch.apply(&mut next[idx]);
        write_collection(&self.dir.join(SERIES_FILE), &next)?;

        self.series = next;
        Ok(self.series[idx].clone())
    }

    fn list_series(&self) -> Result<Vec<Series>, StoreError> {
        Ok(self.series.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::investor::{Investment, InvestorStatus};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("ncd_json_store_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_open_missing_dir_is_empty() {
        let dir = temp_dir("missing");
        let store = JsonStore::open(&dir).unwrap();
        assert!(store.list_investors().unwrap().is_empty());
        assert!(store.list_series().unwrap().is_empty());
    }

    #[test]
    fn test_updates_persist_across_reopen() {
        let dir = temp_dir("persist");
        let investor = Investor::new("INV-1", "Asha Rao").with_investment(Investment::new(
            "NCD-A",
            dec!(250000),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        ));
        let mut series = Series::new("NCD-A", "Series A");
        series.funds_raised = dec!(250000);
        series.investor_count = 1;

        let mut store = JsonStore::create(&dir, vec![investor], vec![series]).unwrap();
        store
            .update_investor(
                "INV-1",
                &InvestorPatch { status: Some(InvestorStatus::Exited), ..Default::default() },
            )
            .unwrap();
        store
            .update_series("NCD-A", &SeriesPatch { funds_raised: Some(dec!(0)), investor_count: Some(0) })
            .unwrap();

        let reopened = JsonStore::open(&dir).unwrap();
        assert_eq!(reopened.get_investor("INV-1").unwrap().status, InvestorStatus::Exited);
        assert_eq!(reopened.get_series("NCD-A").unwrap().investor_count, 0);
        assert!(!dir.join("series.json.tmp").exists());

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_reads_console_export() {
        let dir = temp_dir("export");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join(INVESTORS_FILE),
            r#"[{"id": "INV-7", "name": "K. Iyer", "bankAccount": "99887766",
                 "investments": [{"seriesId": "NCD-B", "amount": 75000, "investedAt": "2024-02-10"}],
                 "totalInvestment": 75000}]"#,
        )
        .unwrap();

        let store = JsonStore::open(&dir).unwrap();
        let investor = store.get_investor("INV-7").unwrap();
        assert_eq!(investor.bank_account_number.as_deref(), Some("99887766"));
        assert_eq!(investor.total_investment, dec!(75000));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = temp_dir("malformed");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(SERIES_FILE), "{not json").unwrap();

        assert!(matches!(JsonStore::open(&dir), Err(StoreError::Json(_))));
        fs::remove_dir_all(&dir).ok();
    }
}
