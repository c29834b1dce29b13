//! Bill persistence
//!
//! A save creates the bill folder, writes its ledger file, copies the
//! attached documents next to it and refreshes the includes. Nothing already
//! on disk is ever overwritten, and nothing is rolled back when a later step
//! fails.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use beanbills_config::{Config, DocumentNaming};
use beanbills_parser::{render_bill, Bill, Transaction};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::includes::IncludesBuilder;
use crate::paths::PathDeriver;

/// Ledger file of a multi-directive bill
pub const BILL_FILE: &str = "bill.beancount";
/// Ledger file of a lone transaction
pub const TRANSACTION_FILE: &str = "transaction.beancount";

/// A file written by a save
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedFile {
    pub path: PathBuf,
    pub size: u64,
}

/// Outcome of a save
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedBill {
    pub dir_path: PathBuf,
    pub ledger_file: PathBuf,
    /// Every regular file of the folder, sorted by path
    pub files: Vec<SavedFile>,
}

/// Writes bills under the bills folder
#[derive(Debug, Clone)]
pub struct Store {
    deriver: PathDeriver,
    includes: IncludesBuilder,
    uploads_folder: PathBuf,
    naming: DocumentNaming,
}

impl Store {
    pub fn new(config: &Config) -> Self {
        Self {
            deriver: PathDeriver::new(config),
            includes: IncludesBuilder::new(config),
            uploads_folder: config.bills.uploads_folder.clone(),
            naming: config.bills.document_naming,
        }
    }

    pub fn deriver(&self) -> &PathDeriver {
        &self.deriver
    }

    pub fn includes(&self) -> &IncludesBuilder {
        &self.includes
    }

    /// Persist a bill into a fresh folder
    pub fn save_bill(&self, bill: &Bill) -> CoreResult<SavedBill> {
        let dir = self.deriver.ensure(bill)?;

        // bill documents first, then those attached to each transaction
        let sources: Vec<&Path> = bill
            .documents
            .iter()
            .map(|d| d.source.as_path())
            .chain(
                bill.transactions
                    .iter()
                    .flat_map(|t| t.documents.iter().map(|p| p.as_path())),
            )
            .collect();
        let names = self.stored_names(&sources);

        let ledger_file = dir.join(BILL_FILE);
        write_new(&ledger_file, &render_bill(bill, &names[..bill.documents.len()]))?;
        self.copy_documents(&dir, &sources, &names)?;

        self.finish(dir, ledger_file)
    }

    /// Persist a lone transaction into a fresh folder
    pub fn save_transaction(&self, txn: &Transaction) -> CoreResult<SavedBill> {
        let dir = self.deriver.ensure_entry(txn)?;

        let sources: Vec<&Path> = txn.documents.iter().map(|p| p.as_path()).collect();
        let names = self.stored_names(&sources);

        let ledger_file = dir.join(TRANSACTION_FILE);
        write_new(&ledger_file, &txn.to_string())?;
        self.copy_documents(&dir, &sources, &names)?;

        self.finish(dir, ledger_file)
    }

    /// Destination file names, parallel to `sources`; empty for skipped entries
    pub fn stored_names(&self, sources: &[&Path]) -> Vec<String> {
        let mut counter = 0;
        sources
            .iter()
            .map(|source| {
                let Some(file_name) = source.file_name() else {
                    return String::new();
                };
                match self.naming {
                    DocumentNaming::Original => file_name.to_string_lossy().to_string(),
                    DocumentNaming::Numbered => {
                        counter += 1;
                        match source.extension() {
                            Some(ext) => format!("doc{}.{}", counter, ext.to_string_lossy()),
                            None => format!("doc{}", counter),
                        }
                    }
                }
            })
            .collect()
    }

    fn resolve_source(&self, source: &Path) -> PathBuf {
        if source.is_absolute() {
            source.to_path_buf()
        } else {
            self.uploads_folder.join(source)
        }
    }

    fn copy_documents(&self, dir: &Path, sources: &[&Path], names: &[String]) -> CoreResult<()> {
        for (source, name) in sources.iter().zip(names) {
            if name.is_empty() {
                continue;
            }
            let from = self.resolve_source(source);
            let to = dir.join(name);

            let mut reader = fs::File::open(&from).map_err(|e| CoreError::io(&from, e))?;
            let mut writer = create_new(&to)?;
            io::copy(&mut reader, &mut writer).map_err(|e| CoreError::io(&to, e))?;
            log::debug!("Copied {} to {}", from.display(), to.display());
        }
        Ok(())
    }

    fn finish(&self, dir: PathBuf, ledger_file: PathBuf) -> CoreResult<SavedBill> {
        self.includes.rebuild()?;
        let files = list_files(&dir)?;
        log::info!("Saved {} ({} files)", dir.display(), files.len());
        Ok(SavedBill {
            dir_path: dir,
            ledger_file,
            files,
        })
    }
}

/// Open a file that must not exist yet
fn create_new(path: &Path) -> CoreResult<fs::File> {
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| match e.kind() {
            io::ErrorKind::AlreadyExists => CoreError::AlreadyExists {
                path: path.display().to_string(),
            },
            _ => CoreError::io(path, e),
        })
}

fn write_new(path: &Path, content: &str) -> CoreResult<()> {
    let mut file = create_new(path)?;
    file.write_all(content.as_bytes())
        .map_err(|e| CoreError::io(path, e))
}

fn list_files(dir: &Path) -> CoreResult<Vec<SavedFile>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| CoreError::io(dir, e))? {
        let entry = entry.map_err(|e| CoreError::io(dir, e))?;
        let metadata = entry.metadata().map_err(|e| CoreError::io(&entry.path(), e))?;
        if metadata.is_file() {
            files.push(SavedFile {
                path: entry.path(),
                size: metadata.len(),
            });
        }
    }
    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::RawBill;
    use beanbills_parser::{Balance, Document, Posting, DATE_FORMAT};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    fn config(root: &Path, naming: DocumentNaming) -> Config {
        let mut config = Config::default();
        config.bills.folder = root.join("bills");
        config.bills.main_file = root.join("main.beancount");
        config.bills.uploads_folder = root.join("uploads");
        config.bills.document_naming = naming;
        config.includes.file = root.join("includes.beancount");
        config
    }

    fn coffee() -> Transaction {
        let mut txn = Transaction::new(date("2016-02-12"));
        txn.payee = Some("Café de 'João'".to_string());
        txn.narration = Some("dois 'X' café por cabeça".to_string());
        txn.postings = vec![
            Posting::new("Assets:Bank:Checking").with_amount(Decimal::new(-550, 2), "EUR"),
            Posting::new("Expenses:Coffee"),
        ];
        txn
    }

    #[test]
    fn test_save_bill_writes_ledger_and_includes() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(&config(dir.path(), DocumentNaming::Original));
        let mut bill = Bill::from(coffee());
        bill.balances
            .push(Balance::new(date("2016-02-12"), "Assets:Cash", Decimal::new(1000, 2), "EUR"));

        let saved = store.save_bill(&bill).unwrap();
        assert!(saved.dir_path.ends_with("2016/02/2016-02-12 _ Café de 'João' _ dois 'X' café por cabeça _ -5.50 EUR"));
        assert_eq!(saved.ledger_file, saved.dir_path.join(BILL_FILE));

        let text = fs::read_to_string(&saved.ledger_file).unwrap();
        assert_eq!(text, render_bill(&bill, &[]));
        assert!(text.ends_with("2016-02-12 balance Assets:Cash 10.00 EUR"));

        assert_eq!(saved.files.len(), 1);
        assert_eq!(saved.files[0].size, text.len() as u64);

        let includes = fs::read_to_string(dir.path().join("includes.beancount")).unwrap();
        assert!(includes.starts_with("include \"bills/2016/02/"));
        assert!(includes.ends_with("/bill.beancount\""));
    }

    #[test]
    fn test_second_save_refused() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(&config(dir.path(), DocumentNaming::Original));
        let bill = Bill::from(coffee());

        let saved = store.save_bill(&bill).unwrap();
        let before = fs::read(&saved.ledger_file).unwrap();

        let mut changed = bill.clone();
        changed.balances
            .push(Balance::new(date("2016-02-12"), "Assets:Cash", Decimal::ONE, "EUR"));
        let err = store.save_bill(&changed).unwrap_err();
        assert!(matches!(err, CoreError::AlreadyExists { .. }));
        assert_eq!(fs::read(&saved.ledger_file).unwrap(), before);
    }

    #[test]
    fn test_save_bill_copies_numbered_documents() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = dir.path().join("uploads");
        fs::create_dir_all(&uploads).unwrap();
        fs::write(uploads.join("receipt.pdf"), b"%PDF").unwrap();
        fs::write(uploads.join("photo.jpg"), b"jpeg!").unwrap();

        let store = Store::new(&config(dir.path(), DocumentNaming::Numbered));
        let mut bill = Bill::from(coffee());
        bill.documents = vec![
            Document {
                date: date("2016-02-12"),
                account: "Expenses:Coffee".to_string(),
                source: PathBuf::from("receipt.pdf"),
            },
            Document {
                date: date("2016-02-12"),
                account: String::new(),
                source: PathBuf::new(),
            },
            Document {
                date: date("2016-02-12"),
                account: String::new(),
                source: uploads.join("photo.jpg"),
            },
        ];

        let saved = store.save_bill(&bill).unwrap();
        assert_eq!(fs::read(saved.dir_path.join("doc1.pdf")).unwrap(), b"%PDF");
        assert_eq!(fs::read(saved.dir_path.join("doc2.jpg")).unwrap(), b"jpeg!");
        assert_eq!(saved.files.len(), 3);
        assert!(saved.files.iter().any(|f| f.size == 5));

        let text = fs::read_to_string(&saved.ledger_file).unwrap();
        assert!(text.ends_with("2016-02-12 document Expenses:Coffee \"doc1.pdf\""));
        assert!(!text.contains("doc2.jpg"));
    }

    #[test]
    fn test_save_bill_copies_transaction_documents() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = dir.path().join("uploads");
        fs::create_dir_all(&uploads).unwrap();
        fs::write(uploads.join("receipt.pdf"), b"%PDF").unwrap();
        fs::write(uploads.join("scan.jpg"), b"jpeg").unwrap();

        let json = r#"{
            "transactions": [{
                "date": "2016-02-12", "narration": "coffee",
                "postings": [{"account": "Assets:Cash", "amount": "-5.50", "currency": "EUR"}],
                "documents": ["receipt.pdf"]
            }],
            "documents": [{"date": "2016-02-12", "account": "Expenses:Coffee", "filename": "scan.jpg"}]
        }"#;
        let bill = RawBill::from_json(json)
            .unwrap()
            .decode(beanbills_config::DecodePolicy::Strict)
            .unwrap();

        let numbered = Store::new(&config(dir.path(), DocumentNaming::Numbered));
        let saved = numbered.save_bill(&bill).unwrap();
        assert_eq!(fs::read(saved.dir_path.join("doc1.jpg")).unwrap(), b"jpeg");
        assert_eq!(fs::read(saved.dir_path.join("doc2.pdf")).unwrap(), b"%PDF");
        assert_eq!(saved.files.len(), 3);

        let text = fs::read_to_string(&saved.ledger_file).unwrap();
        assert!(text.ends_with("2016-02-12 document Expenses:Coffee \"doc1.jpg\""));
    }

    #[test]
    fn test_save_bill_duplicate_document_names() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = dir.path().join("uploads");
        fs::create_dir_all(&uploads).unwrap();
        fs::write(uploads.join("receipt.pdf"), b"%PDF").unwrap();

        let store = Store::new(&config(dir.path(), DocumentNaming::Original));
        let mut txn = coffee();
        txn.documents = vec![PathBuf::from("receipt.pdf")];
        let mut bill = Bill::from(txn);
        bill.documents.push(Document {
            date: date("2016-02-12"),
            account: String::new(),
            source: PathBuf::from("receipt.pdf"),
        });

        let err = store.save_bill(&bill).unwrap_err();
        assert!(matches!(err, CoreError::AlreadyExists { .. }));
    }

    #[test]
    fn test_missing_document_source() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(&config(dir.path(), DocumentNaming::Original));
        let mut txn = coffee();
        txn.documents = vec![PathBuf::from("nowhere.pdf")];

        let err = store.save_transaction(&txn).unwrap_err();
        assert!(matches!(err, CoreError::IoError { .. }));
        // ledger already written; no rollback
        let folder = store.deriver().entry_path(&txn);
        assert!(folder.join(TRANSACTION_FILE).is_file());
    }

    #[test]
    fn test_save_transaction_keeps_names() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = dir.path().join("uploads");
        fs::create_dir_all(&uploads).unwrap();
        fs::write(uploads.join("talão.png"), b"png").unwrap();

        let store = Store::new(&config(dir.path(), DocumentNaming::Original));
        let mut txn = coffee();
        txn.documents = vec![PathBuf::from("talão.png")];

        let saved = store.save_transaction(&txn).unwrap();
        assert_eq!(saved.ledger_file, saved.dir_path.join(TRANSACTION_FILE));
        assert_eq!(fs::read_to_string(&saved.ledger_file).unwrap(), txn.to_string());
        assert!(saved.dir_path.join("talão.png").is_file());
        assert_eq!(saved.files.len(), 2);
        assert!(saved.files[0].path < saved.files[1].path);
    }

    #[test]
    fn test_empty_bill_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(&config(dir.path(), DocumentNaming::Original));
        let err = store.save_bill(&Bill::default()).unwrap_err();
        assert!(matches!(err, CoreError::ValidationError { .. }));
        assert!(!dir.path().join("bills").exists());
    }

    #[test]
    fn test_stored_names() {
        let dir = tempfile::tempdir().unwrap();
        let numbered = Store::new(&config(dir.path(), DocumentNaming::Numbered));
        let sources = [Path::new("a/scan.pdf"), Path::new(""), Path::new("README")];
        assert_eq!(numbered.stored_names(&sources), vec!["doc1.pdf", "", "doc2"]);

        let original = Store::new(&config(dir.path(), DocumentNaming::Original));
        assert_eq!(original.stored_names(&sources), vec!["scan.pdf", "", "README"]);
    }
}
