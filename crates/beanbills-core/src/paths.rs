//! Folder derivation for bills
//!
//! Every bill lives in `<bills>/<YYYY>/<MM>/<slug>`, where the slug is the
//! sanitized `" _ "`-joined summary of the entry that names the bill.

use std::io;
use std::path::{Path, PathBuf};

use beanbills_config::{Config, SlugAmountStyle};
use beanbills_parser::{posting_amount_display, AmountStyle, Balance, Bill, Note, Transaction, DATE_FORMAT};
use beanbills_utils::sanitize_filename;
use chrono::{Datelike, NaiveDate};

use crate::error::{CoreError, CoreResult};

/// Separator between slug fields
pub const SLUG_SEPARATOR: &str = " _ ";

/// Entries that can name a bill folder
pub trait Slugged {
    fn date(&self) -> NaiveDate;

    /// Unsanitized slug fields, date first
    fn slug_fields(&self, deriver: &PathDeriver) -> Vec<String>;
}

impl Slugged for Transaction {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn slug_fields(&self, deriver: &PathDeriver) -> Vec<String> {
        let mut fields = vec![self.date.format(DATE_FORMAT).to_string()];
        if self.has_payee() {
            fields.push(self.payee_str().to_string());
        }
        fields.push(self.narration_str().to_string());
        fields.push(deriver.amount_display(self));
        fields
    }
}

impl Slugged for Balance {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn slug_fields(&self, _deriver: &PathDeriver) -> Vec<String> {
        vec![self.date.format(DATE_FORMAT).to_string(), "balance".to_string()]
    }
}

impl Slugged for Note {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn slug_fields(&self, _deriver: &PathDeriver) -> Vec<String> {
        vec![self.date.format(DATE_FORMAT).to_string(), "note".to_string()]
    }
}

/// Map the configured slug style to the formatter's
fn map_amount_style(style: SlugAmountStyle) -> AmountStyle {
    match style {
        SlugAmountStyle::Code => AmountStyle::Code,
        SlugAmountStyle::Symbol => AmountStyle::Symbol,
    }
}

/// Computes and creates bill folders
#[derive(Debug, Clone)]
pub struct PathDeriver {
    bills_folder: PathBuf,
    default_currency: String,
    amount_style: AmountStyle,
}

impl PathDeriver {
    pub fn new(config: &Config) -> Self {
        Self {
            bills_folder: config.bills.folder.clone(),
            default_currency: config.bills.default_currency.clone(),
            amount_style: map_amount_style(config.bills.slug_amount_style),
        }
    }

    pub fn bills_folder(&self) -> &Path {
        &self.bills_folder
    }

    /// Amount shown in a transaction's slug
    pub fn amount_display(&self, txn: &Transaction) -> String {
        posting_amount_display(&txn.postings, &self.default_currency, self.amount_style)
    }

    /// Sanitized folder name for an entry
    pub fn slug<E: Slugged>(&self, entry: &E) -> String {
        let joined = entry.slug_fields(self).join(SLUG_SEPARATOR);
        sanitize_filename(&joined).trim().to_string()
    }

    /// `<bills>/<YYYY>/<MM>/<slug>` for an entry
    pub fn entry_path<E: Slugged>(&self, entry: &E) -> PathBuf {
        let date = entry.date();
        self.bills_folder
            .join(format!("{:04}", date.year()))
            .join(format!("{:02}", date.month()))
            .join(self.slug(entry))
    }

    /// Folder of a bill: named after its first transaction, else first
    /// balance, else first note
    pub fn derive(&self, bill: &Bill) -> CoreResult<PathBuf> {
        if let Some(txn) = bill.transactions.first() {
            Ok(self.entry_path(txn))
        } else if let Some(bal) = bill.balances.first() {
            Ok(self.entry_path(bal))
        } else if let Some(note) = bill.notes.first() {
            Ok(self.entry_path(note))
        } else {
            Err(CoreError::ValidationError {
                message: "Need at least one transaction, balance or note".to_string(),
            })
        }
    }

    /// Derive and create the folder of a bill; never reuses an existing one
    pub fn ensure(&self, bill: &Bill) -> CoreResult<PathBuf> {
        let path = self.derive(bill)?;
        Self::create_new_dir(&path)?;
        Ok(path)
    }

    /// Derive and create the folder of a single entry
    pub fn ensure_entry<E: Slugged>(&self, entry: &E) -> CoreResult<PathBuf> {
        let path = self.entry_path(entry);
        Self::create_new_dir(&path)?;
        Ok(path)
    }

    fn create_new_dir(path: &Path) -> CoreResult<()> {
        let exists = path.try_exists().map_err(|e| CoreError::io(path, e))?;
        if exists {
            return Err(CoreError::AlreadyExists {
                path: path.display().to_string(),
            });
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CoreError::io(parent, e))?;
        }

        // non-recursive: a folder that appeared since the check must still fail
        std::fs::create_dir(path).map_err(|e| match e.kind() {
            io::ErrorKind::AlreadyExists => CoreError::AlreadyExists {
                path: path.display().to_string(),
            },
            _ => CoreError::io(path, e),
        })?;

        log::debug!("Created bill folder {}", path.display());
        Ok(())
    }
}

// ==================== Tests ====================
