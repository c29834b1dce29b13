//! Beancount entry model and text codec
//!
//! Structured entries render to canonical Beancount text through their
//! `Display` impls; `parse_header` recovers the header fields of a
//! transaction from existing text.

pub mod error;
pub mod types;
pub mod amount;
pub mod format;
pub mod parser;

pub use error::ParseError;
pub use types::{Balance, Bill, Document, Note, Posting, Transaction};
pub use amount::{currency_symbol, format_amount, posting_amount_display, round_amount, AmountStyle};
pub use format::{render_bill, DATE_FORMAT};
pub use parser::{
    extract_open_accounts, extract_operating_currencies, parse_amount, parse_date,
    parse_header, ParsedHeader,
};
