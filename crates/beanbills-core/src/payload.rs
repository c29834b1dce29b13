//! Incoming bill payloads
//!
//! Submitted bills arrive as JSON with every value as text. The `Raw*`
//! structs mirror that shape; `RawBill::decode` turns them into the typed
//! ledger model in a single pass, applying the configured policy to
//! malformed dates and amounts.

use std::path::PathBuf;

use beanbills_config::DecodePolicy;
use beanbills_parser::{parse_amount, parse_date, Balance, Bill, Document, Note, Posting, Transaction};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawPosting {
    pub flag: String,
    pub account: String,
    pub amount: String,
    pub currency: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawTransaction {
    pub date: String,
    pub flag: String,
    pub payee: String,
    pub narration: String,
    pub tags: Vec<String>,
    pub link: String,
    pub postings: Vec<RawPosting>,
    /// Uploaded file names
    pub documents: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawBalance {
    pub date: String,
    pub amount: String,
    pub currency: String,
    pub source_account: String,
    pub target_account: String,
    pub padded: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawNote {
    pub date: String,
    pub account: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawDocument {
    pub date: String,
    pub account: String,
    pub filename: String,
}

/// A bill as submitted
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawBill {
    pub transactions: Vec<RawTransaction>,
    pub balances: Vec<RawBalance>,
    pub notes: Vec<RawNote>,
    pub documents: Vec<RawDocument>,
}

impl RawBill {
    pub fn from_json(text: &str) -> CoreResult<Self> {
        serde_json::from_str(text).map_err(|e| CoreError::InvalidFormat {
            field: "payload".to_string(),
            value: e.to_string(),
        })
    }

    /// Convert to the typed model
    pub fn decode(self, policy: DecodePolicy) -> CoreResult<Bill> {
        let decoder = Decoder { policy };
        let mut bill = Bill::default();

        for (i, raw) in self.transactions.into_iter().enumerate() {
            bill.transactions
                .push(decoder.transaction(raw, &format!("transactions[{}]", i))?);
        }
        for (i, raw) in self.balances.into_iter().enumerate() {
            bill.balances.push(decoder.balance(raw, &format!("balances[{}]", i))?);
        }
        for (i, raw) in self.notes.into_iter().enumerate() {
            let field = format!("notes[{}]", i);
            bill.notes.push(Note {
                date: decoder.date(&raw.date, &format!("{}.date", field))?,
                account: raw.account.trim().to_string(),
                description: raw.description,
            });
        }
        for (i, raw) in self.documents.into_iter().enumerate() {
            let field = format!("documents[{}]", i);
            bill.documents.push(Document {
                date: decoder.date(&raw.date, &format!("{}.date", field))?,
                account: raw.account.trim().to_string(),
                source: PathBuf::from(raw.filename.trim()),
            });
        }

        log::debug!(
            "Decoded bill: {} transactions, {} balances, {} notes, {} documents",
            bill.transactions.len(),
            bill.balances.len(),
            bill.notes.len(),
            bill.documents.len()
        );
        Ok(bill)
    }
}

impl RawTransaction {
    /// Decode a payload holding one transaction
    pub fn decode(self, policy: DecodePolicy) -> CoreResult<Transaction> {
        Decoder { policy }.transaction(self, "transaction")
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Tag or link with its sigil; one word only
fn token(value: String, sigil: char, field: &str) -> CoreResult<Option<String>> {
    let Some(word) = non_empty(value) else {
        return Ok(None);
    };
    if word.chars().any(char::is_whitespace) {
        return Err(CoreError::ValidationError {
            message: format!("{}: {:?} must be a single word", field, word),
        });
    }
    if word.starts_with(sigil) {
        Ok(Some(word))
    } else {
        Ok(Some(format!("{}{}", sigil, word)))
    }
}

struct Decoder {
    policy: DecodePolicy,
}

impl Decoder {
    fn date(&self, value: &str, field: &str) -> CoreResult<NaiveDate> {
        match parse_date(value) {
            Ok(date) => Ok(date),
            Err(_) if self.policy == DecodePolicy::Lenient => {
                let today = chrono::Local::now().date_naive();
                log::warn!("{}: invalid date {:?}, using {}", field, value, today);
                Ok(today)
            }
            Err(_) => Err(CoreError::InvalidFormat {
                field: field.to_string(),
                value: value.to_string(),
            }),
        }
    }

    fn amount(&self, value: &str, field: &str) -> CoreResult<Decimal> {
        match parse_amount(value) {
            Ok(amount) => Ok(amount),
            Err(_) if self.policy == DecodePolicy::Lenient => {
                log::warn!("{}: invalid amount {:?}, using 0", field, value);
                Ok(Decimal::ZERO)
            }
            Err(_) => Err(CoreError::InvalidFormat {
                field: field.to_string(),
                value: value.to_string(),
            }),
        }
    }

    fn transaction(&self, raw: RawTransaction, field: &str) -> CoreResult<Transaction> {
        let mut txn = Transaction::new(self.date(&raw.date, &format!("{}.date", field))?);
        txn.flag = non_empty(raw.flag);
        txn.payee = non_empty(raw.payee.replace('"', "'"));
        txn.narration = non_empty(raw.narration.replace('"', "'"));
        for (i, tag) in raw.tags.into_iter().enumerate() {
            if let Some(tag) = token(tag, '#', &format!("{}.tags[{}]", field, i))? {
                txn.tags.push(tag);
            }
        }
        txn.link = token(raw.link, '^', &format!("{}.link", field))?;

        for (i, posting) in raw.postings.into_iter().enumerate() {
            let posting_field = format!("{}.postings[{}]", field, i);
            if let Some(posting) = self.posting(posting, &posting_field)? {
                txn.postings.push(posting);
            }
        }

        txn.documents = raw
            .documents
            .into_iter()
            .filter_map(non_empty)
            .map(PathBuf::from)
            .collect();
        Ok(txn)
    }

    /// `None` for a blank form row
    fn posting(&self, raw: RawPosting, field: &str) -> CoreResult<Option<Posting>> {
        let account = raw.account.trim();
        if account.is_empty() {
            if raw.amount.trim().is_empty() {
                return Ok(None);
            }
            return Err(CoreError::ValidationError {
                message: format!("{}: amount {:?} without an account", field, raw.amount.trim()),
            });
        }

        let amount = self.amount(&raw.amount, &format!("{}.amount", field))?;
        let mut posting = Posting::new(account).with_amount(amount, raw.currency.trim());
        if let Some(flag) = non_empty(raw.flag) {
            posting = posting.with_flag(flag);
        }
        Ok(Some(posting))
    }

    fn balance(&self, raw: RawBalance, field: &str) -> CoreResult<Balance> {
        let date = self.date(&raw.date, &format!("{}.date", field))?;
        let amount = self.amount(&raw.amount, &format!("{}.amount", field))?;
        let mut balance = Balance::new(date, raw.source_account.trim(), amount, raw.currency.trim());

        match non_empty(raw.target_account) {
            Some(target) if raw.padded => balance = balance.padded_from(target),
            Some(target) => balance.target_account = Some(target),
            None if raw.padded => {
                return Err(CoreError::ValidationError {
                    message: format!("{}: padded balance needs a target_account", field),
                })
            }
            None => {}
        }
        Ok(balance)
    }
}

// ==================== Tests ====================
