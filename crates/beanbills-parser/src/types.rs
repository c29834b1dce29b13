//! Ledger entry model

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Transaction flags understood by Beancount
pub const CLEARED_FLAG: &str = "*";
pub const PENDING_FLAG: &str = "!";

/// Posting within a transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    pub flag: Option<String>,
    /// Colon-delimited account path, e.g. "Assets:Bank:Checking"
    pub account: String,
    pub amount: Decimal,
    pub currency: String,
}

impl Posting {
    /// Posting without an amount (left for Beancount to balance)
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            flag: None,
            account: account.into(),
            amount: Decimal::ZERO,
            currency: String::new(),
        }
    }

    pub fn with_amount(mut self, amount: Decimal, currency: impl Into<String>) -> Self {
        self.amount = amount;
        self.currency = currency.into();
        self
    }

    pub fn with_flag(mut self, flag: impl Into<String>) -> Self {
        self.flag = Some(flag.into());
        self
    }

    /// Amount and currency are only meaningful together; sub-cent amounts count as none
    pub fn has_amount(&self) -> bool {
        !crate::amount::round_amount(self.amount).is_zero() && !self.currency.is_empty()
    }
}

/// Transaction directive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: NaiveDate,
    pub flag: Option<String>,
    pub payee: Option<String>,
    pub narration: Option<String>,
    /// `#`-prefixed tokens, in insertion order
    pub tags: Vec<String>,
    /// `^`-prefixed token
    pub link: Option<String>,
    /// Order matters: the first posting drives amount inference
    pub postings: Vec<Posting>,
    /// Attached files to copy next to the ledger file
    pub documents: Vec<PathBuf>,
}

impl Transaction {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            flag: None,
            payee: None,
            narration: None,
            tags: Vec::new(),
            link: None,
            postings: Vec::new(),
            documents: Vec::new(),
        }
    }

    /// The flag written to the ledger: `*` unless `!` was asked for
    pub fn effective_flag(&self) -> &str {
        match self.flag.as_deref() {
            Some(PENDING_FLAG) => PENDING_FLAG,
            _ => CLEARED_FLAG,
        }
    }

    pub fn payee_str(&self) -> &str {
        self.payee.as_deref().unwrap_or("")
    }

    pub fn narration_str(&self) -> &str {
        self.narration.as_deref().unwrap_or("")
    }

    pub fn has_payee(&self) -> bool {
        !self.payee_str().is_empty()
    }
}

/// Balance assertion, optionally preceded by a pad
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    pub date: NaiveDate,
    pub amount: Decimal,
    pub currency: String,
    pub source_account: String,
    pub target_account: Option<String>,
    pub padded: bool,
}

impl Balance {
    pub fn new(
        date: NaiveDate,
        source_account: impl Into<String>,
        amount: Decimal,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            date,
            amount,
            currency: currency.into(),
            source_account: source_account.into(),
            target_account: None,
            padded: false,
        }
    }

    /// Pad `source_account` from `target` before asserting
    pub fn padded_from(mut self, target: impl Into<String>) -> Self {
        self.target_account = Some(target.into());
        self.padded = true;
        self
    }
}

/// Note directive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub date: NaiveDate,
    pub account: String,
    pub description: String,
}

/// Document directive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub date: NaiveDate,
    pub account: String,
    /// Source file to copy into the bill folder
    pub source: PathBuf,
}

impl Document {
    /// File name of the source, used when documents keep their names
    pub fn file_name(&self) -> Option<String> {
        self.source
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
    }
}

/// A batch of directives persisted together in one folder
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bill {
    pub transactions: Vec<Transaction>,
    pub balances: Vec<Balance>,
    pub notes: Vec<Note>,
    pub documents: Vec<Document>,
}

impl Bill {
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
            && self.balances.is_empty()
            && self.notes.is_empty()
            && self.documents.is_empty()
    }
}

impl From<Transaction> for Bill {
    fn from(txn: Transaction) -> Self {
        Bill {
            transactions: vec![txn],
            ..Default::default()
        }
    }
}
