//! Load lock-in rule overrides from a CSV file (SeriesId,LockInMonths)

use super::{LockInRules, SeriesLockInRule};
use csv::Reader;
use std::error::Error;
use std::path::Path;

/// Raw CSV row
#[derive(Debug, serde::Deserialize)]
struct CsvRow {
    #[serde(rename = "SeriesId")]
    series_id: String,
    #[serde(rename = "LockInMonths")]
    lock_in_months: u32,
}

impl CsvRow {
    fn to_rule(self) -> Result<SeriesLockInRule, Box<dyn Error>> {
        let series_id = self.series_id.trim();
        if series_id.is_empty() {
            return Err("Lock-in rule row has an empty SeriesId".into());
        }
        Ok(SeriesLockInRule::new(series_id, self.lock_in_months))
    }
}

/// Load rules from a CSV file
pub fn load_lock_in_rules<P: AsRef<Path>>(path: P) -> Result<LockInRules, Box<dyn Error>> {
    let reader = Reader::from_path(path)?;
    collect_rules(reader)
}

/// Load rules from any reader (e.g., string buffer)
pub fn load_lock_in_rules_from_reader<R: std::io::Read>(reader: R) -> Result<LockInRules, Box<dyn Error>> {
    collect_rules(Reader::from_reader(reader))
}

fn collect_rules<R: std::io::Read>(mut reader: Reader<R>) -> Result<LockInRules, Box<dyn Error>> {
    let mut rules = LockInRules::new();

    for result in reader.deserialize() {
        let row: CsvRow = result?;
        rules.insert(row.to_rule()?);
    }

    log::debug!("Loaded {} lock-in rule overrides", rules.len());
    Ok(rules)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_rules_from_reader() {
        let data = "SeriesId,LockInMonths\nNCD-A,12\nNCD-B,36\n";
        let rules = load_lock_in_rules_from_reader(data.as_bytes()).expect("Failed to load rules");

        assert_eq!(rules.len(), 2);
        assert_eq!(rules.get("NCD-B").unwrap().lock_in_months, 36);
    }

    #[test]
    fn test_blank_series_id_rejected() {
        let data = "SeriesId,LockInMonths\n  ,12\n";
        assert!(load_lock_in_rules_from_reader(data.as_bytes()).is_err());
    }

    #[test]
    fn test_negative_months_rejected() {
        let data = "SeriesId,LockInMonths\nNCD-A,-3\n";
        assert!(load_lock_in_rules_from_reader(data.as_bytes()).is_err());
    }
}
