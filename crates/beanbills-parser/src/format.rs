//! Canonical Beancount text for entries

use std::fmt;

use beanbills_utils::collapse_spaces;
use chrono::NaiveDate;

use crate::amount::{format_amount, round_amount};
use crate::types::{Balance, Bill, Document, Note, Posting, Transaction};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

fn fmt_date(date: &NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Double-quoted Beancount string
fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Prefix `token` with `sigil` unless it already carries it
pub(crate) fn with_sigil(token: &str, sigil: char) -> String {
    if token.starts_with(sigil) {
        token.to_string()
    } else {
        format!("{}{}", sigil, token)
    }
}

impl Posting {
    /// `"<flag> <account>"`, flag omitted when empty
    pub fn account_field(&self) -> String {
        let raw = format!("{} {}", self.flag.as_deref().unwrap_or(""), self.account);
        collapse_spaces(&raw).trim().to_string()
    }

    /// Posting line padded so the amount starts after `width` characters
    pub fn render(&self, width: usize) -> String {
        let mut out = self.account_field();
        let len = out.chars().count();
        if width > len {
            out.push_str(&" ".repeat(width - len));
        }
        if self.has_amount() {
            out.push_str(&format!(" {} {}", format_amount(self.amount), self.currency));
        }
        out
    }
}

impl fmt::Display for Posting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render(0))
    }
}

impl Transaction {
    /// `"payee" | "narration"`, or whichever of the two is present
    pub fn title(&self) -> String {
        let payee = self.payee_str().replace('"', "'");
        let narration = self.narration_str().replace('"', "'");

        match (payee.is_empty(), narration.is_empty()) {
            (true, true) => String::new(),
            (false, false) => format!("\"{}\" | \"{}\"", payee, narration),
            (false, true) => format!("\"{}\"", payee),
            (true, false) => format!("\"{}\"", narration),
        }
    }

    /// First line of the directive
    pub fn header(&self) -> String {
        let tags: Vec<String> = self
            .tags
            .iter()
            .filter(|t| !t.is_empty())
            .map(|t| with_sigil(t, '#'))
            .collect();
        let link = self
            .link
            .as_deref()
            .filter(|l| !l.is_empty())
            .map(|l| with_sigil(l, '^'))
            .unwrap_or_default();

        let parts = [
            fmt_date(&self.date),
            self.effective_flag().to_string(),
            self.title(),
            tags.join(" "),
            link,
        ];
        collapse_spaces(&parts.join(" ")).trim().to_string()
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.header())?;

        let longest = self
            .postings
            .iter()
            .map(|p| p.account_field().chars().count())
            .max()
            .unwrap_or(0);

        for posting in &self.postings {
            // one extra column keeps non-negative amounts aligned with the minus sign
            let mut width = longest + 1;
            if !round_amount(posting.amount).is_sign_negative() {
                width += 1;
            }
            write!(f, "\n  {}", posting.render(width))?;
        }
        Ok(())
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let date = fmt_date(&self.date);
        if self.padded {
            write!(
                f,
                "{} pad {} {}\n\n",
                date,
                self.source_account,
                self.target_account.as_deref().unwrap_or("")
            )?;
        }
        write!(
            f,
            "{} balance {} {} {}",
            date,
            self.source_account,
            format_amount(self.amount),
            self.currency
        )
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} note {} {}",
            fmt_date(&self.date),
            self.account,
            quote(&self.description)
        )
    }
}

impl Document {
    /// Directive pointing at `path`, relative to the ledger file's folder
    pub fn directive(&self, path: &str) -> String {
        format!(
            "{} document {} {}",
            fmt_date(&self.date),
            self.account,
            quote(path)
        )
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.directive(&self.source.to_string_lossy()))
    }
}

/// Render a bill, naming each document by the file it was stored as.
///
/// `stored_names` runs parallel to `bill.documents`; documents without an
/// account or without a stored name produce no directive.
pub fn render_bill(bill: &Bill, stored_names: &[String]) -> String {
    let mut blocks: Vec<String> = Vec::new();

    blocks.extend(bill.transactions.iter().map(|t| t.to_string()));
    blocks.extend(bill.balances.iter().map(|b| b.to_string()));
    blocks.extend(bill.notes.iter().map(|n| n.to_string()));

    for (doc, name) in bill.documents.iter().zip(stored_names) {
        if doc.account.is_empty() || name.is_empty() {
            continue;
        }
        blocks.push(doc.directive(name));
    }

    blocks.join("\n\n")
}

impl fmt::Display for Bill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self
            .documents
            .iter()
            .map(|d| d.file_name().unwrap_or_default())
            .collect();
        write!(f, "{}", render_bill(self, &names))
    }
}
