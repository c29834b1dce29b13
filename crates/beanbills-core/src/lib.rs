//! Bill storage and ledger aggregation
//!
//! `Store` turns a decoded bill into a folder under the bills tree,
//! `IncludesBuilder` keeps the ledger's view of that tree current and
//! `CompletionExtractor` scrapes autocomplete values back out of it.
//! `IncludesWatcher` reruns the includes rebuild as ledger files come and go.

pub mod error;
pub mod paths;
pub mod includes;
pub mod completions;
pub mod payload;
pub mod store;
pub mod watch;

pub use error::{CoreError, CoreResult, DefaultErrorLogger, ErrorCode, ErrorLogger, ErrorSeverity};
pub use paths::{PathDeriver, Slugged, SLUG_SEPARATOR};
pub use includes::{discover_ledgers, IncludesBuilder};
pub use completions::{CompletionExtractor, Completions};
pub use payload::{RawBalance, RawBill, RawDocument, RawNote, RawPosting, RawTransaction};
pub use store::{SavedBill, SavedFile, Store, BILL_FILE, TRANSACTION_FILE};
pub use watch::{is_ledger_change, IncludesWatcher};
