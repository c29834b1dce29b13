//! Autocomplete data scraped from the ledger

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use beanbills_config::Config;
use beanbills_parser::{extract_open_accounts, extract_operating_currencies, parse_header};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, DefaultErrorLogger, ErrorLogger};
use crate::includes::discover_ledgers;

/// Values offered to the entry form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Completions {
    pub payees: Vec<String>,
    pub tags: Vec<String>,
    pub links: Vec<String>,
    pub accounts: Vec<String>,
    pub currencies: Vec<String>,
}

/// Drop repeats, keeping the first occurrence of each value
fn dedup_in_order(values: Vec<String>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    values
        .into_iter()
        .filter(|value| seen.insert(value.clone()))
        .collect()
}

/// Scans the bills tree and the main ledger file
#[derive(Debug, Clone)]
pub struct CompletionExtractor {
    bills_folder: PathBuf,
    main_file: PathBuf,
}

impl CompletionExtractor {
    pub fn new(config: &Config) -> Self {
        Self {
            bills_folder: config.bills.folder.clone(),
            main_file: config.bills.main_file.clone(),
        }
    }

    pub fn extract(&self) -> CoreResult<Completions> {
        let main_text =
            std::fs::read_to_string(&self.main_file).map_err(|e| CoreError::io(&self.main_file, e))?;

        let mut payees = BTreeSet::new();
        let mut tags = BTreeSet::new();
        let mut links = BTreeSet::new();

        let ledgers = discover_ledgers(&self.bills_folder)?;
        for path in &ledgers {
            match Self::scan_file(path) {
                Ok(header) => {
                    payees.extend(header.payee.filter(|p| !p.is_empty()));
                    tags.extend(header.tags);
                    links.extend(header.link);
                }
                Err(error) => DefaultErrorLogger.log_warning(
                    &format!("skipping {}: {}", path.display(), error),
                    "extract_completions",
                ),
            }
        }

        let completions = Completions {
            payees: payees.into_iter().collect(),
            tags: tags.into_iter().collect(),
            links: links.into_iter().collect(),
            accounts: dedup_in_order(extract_open_accounts(&main_text)),
            currencies: dedup_in_order(extract_operating_currencies(&main_text)),
        };

        log::debug!(
            "Completions from {} files: {} payees, {} accounts",
            ledgers.len(),
            completions.payees.len(),
            completions.accounts.len()
        );
        Ok(completions)
    }

    fn scan_file(path: &Path) -> CoreResult<beanbills_parser::ParsedHeader> {
        let text = std::fs::read_to_string(path).map_err(|e| CoreError::io(path, e))?;
        Ok(parse_header(&text)?)
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_bill(root: &Path, folder: &str, text: &str) {
        let dir = root.join(folder);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("bill.beancount"), text).unwrap();
    }

    fn extractor(root: &Path) -> CompletionExtractor {
        let mut config = Config::default();
        config.bills.folder = root.join("bills");
        config.bills.main_file = root.join("main.beancount");
        CompletionExtractor::new(&config)
    }

    #[test]
    fn test_extract_all_fields() {
        let dir = tempfile::tempdir().unwrap();
        let bills = dir.path().join("bills");
        write_bill(
            &bills,
            "2016/02/a",
            "2016-02-12 * \"Café de 'João'\" \"dois cafés\" #portugal #coffee ^holiday-2016\n  Expenses:Coffee 5.50 EUR",
        );
        write_bill(&bills, "2016/03/b", "2016-03-01 ! \"Zara\" \"shirt\" #clothes");
        write_bill(&bills, "2016/03/c", "2016-03-02 * \"Café de 'João'\" \"again\" #coffee");
        fs::write(
            dir.path().join("main.beancount"),
            "option \"operating_currency\" \"EUR\"\noption \"operating_currency\" \"USD\"\n\
             2016-01-01 open Assets:Cash\n2016-01-01 open Expenses:Coffee\n2016-01-01 open Assets:Cash\n",
        )
        .unwrap();

        let completions = extractor(dir.path()).extract().unwrap();
        assert_eq!(completions.payees, vec!["Café de 'João'", "Zara"]);
        assert_eq!(completions.tags, vec!["#clothes", "#coffee", "#portugal"]);
        assert_eq!(completions.links, vec!["^holiday-2016"]);
        assert_eq!(completions.accounts, vec!["Assets:Cash", "Expenses:Coffee"]);
        assert_eq!(completions.currencies, vec!["EUR", "USD"]);
    }

    #[test]
    fn test_unparseable_file_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let bills = dir.path().join("bills");
        write_bill(&bills, "2016/03/bal", "2016-03-21 balance Assets:Cash 1.00 EUR");
        write_bill(&bills, "2016/03/txn", "2016-03-22 * \"Shop\" \"bread\"");
        fs::write(dir.path().join("main.beancount"), "").unwrap();

        let completions = extractor(dir.path()).extract().unwrap();
        assert_eq!(completions.payees, vec!["Shop"]);
        assert!(completions.accounts.is_empty());
    }

    #[test]
    fn test_single_string_is_narration() {
        let dir = tempfile::tempdir().unwrap();
        write_bill(&dir.path().join("bills"), "2016/03/x", "2016-03-22 * \"bread\"");
        fs::write(dir.path().join("main.beancount"), "").unwrap();

        let completions = extractor(dir.path()).extract().unwrap();
        assert!(completions.payees.is_empty());
    }

    #[test]
    fn test_missing_main_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = extractor(dir.path()).extract().unwrap_err();
        assert!(matches!(err, CoreError::IoError { .. }));
    }

    #[test]
    fn test_serializes_as_json_object() {
        let completions = Completions {
            currencies: vec!["EUR".to_string()],
            ..Default::default()
        };
        let json = serde_json::to_value(&completions).unwrap();
        assert_eq!(json["currencies"][0], "EUR");
        assert!(json["payees"].as_array().unwrap().is_empty());
    }
}
