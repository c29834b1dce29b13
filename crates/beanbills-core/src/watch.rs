//! Keeps the includes current while ledger files are added or removed

use std::path::Path;
use std::sync::mpsc;

use notify::event::ModifyKind;
use notify::{Event, EventKind, RecursiveMode, Watcher};

use crate::error::{CoreError, CoreResult, DefaultErrorLogger, ErrorLogger};
use crate::includes::IncludesBuilder;

const LEDGER_EXTENSION: &str = "beancount";

/// A `.beancount` file appeared, disappeared or was renamed
pub fn is_ledger_change(event: &Event) -> bool {
    let relevant = matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(_))
    );
    relevant
        && event
            .paths
            .iter()
            .any(|p| p.extension().map_or(false, |ext| ext == LEDGER_EXTENSION))
}

fn watch_error(path: &Path, error: notify::Error) -> CoreError {
    CoreError::IoError {
        path: path.display().to_string(),
        message: error.to_string(),
    }
}

/// Reruns `IncludesBuilder::rebuild` on ledger changes under the bills folder
#[derive(Debug, Clone)]
pub struct IncludesWatcher {
    builder: IncludesBuilder,
}

impl IncludesWatcher {
    pub fn new(builder: IncludesBuilder) -> Self {
        Self { builder }
    }

    /// Rebuild once, then after every batch of ledger changes.
    ///
    /// Blocks until the watcher shuts down. Failed rebuilds are logged and
    /// watching goes on.
    pub fn run(&self) -> CoreResult<()> {
        let folder = self.builder.bills_folder().to_path_buf();
        std::fs::create_dir_all(&folder).map_err(|e| CoreError::io(&folder, e))?;

        self.rebuild();

        let (tx, rx) = mpsc::channel::<notify::Result<Event>>();
        let mut watcher = notify::recommended_watcher(tx).map_err(|e| watch_error(&folder, e))?;
        watcher
            .watch(&folder, RecursiveMode::Recursive)
            .map_err(|e| watch_error(&folder, e))?;
        log::info!("Watching {} for ledger changes", folder.display());

        while let Ok(received) = rx.recv() {
            if !self.is_relevant(received) {
                continue;
            }
            // one rebuild covers everything already queued
            let queued = rx.try_iter().map(|r| self.is_relevant(r)).filter(|&hit| hit).count();
            log::debug!("Ledger change detected ({} more queued)", queued);
            self.rebuild();
        }

        log::info!("Stopped watching {}", folder.display());
        Ok(())
    }

    fn is_relevant(&self, received: notify::Result<Event>) -> bool {
        match received {
            Ok(event) => is_ledger_change(&event),
            Err(error) => {
                DefaultErrorLogger.log_warning(&error.to_string(), "watch_bills");
                false
            }
        }
    }

    fn rebuild(&self) {
        if let Err(error) = self.builder.rebuild() {
            DefaultErrorLogger.log_error(&error, "rebuild_includes");
        }
    }
}

// ==================== Tests ====================

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, DataChange, RemoveKind, RenameMode};
    use std::path::PathBuf;

    fn event(kind: EventKind, path: &str) -> Event {
        Event::new(kind).add_path(PathBuf::from(path))
    }

    #[test]
    fn test_ledger_create_and_remove() {
        let path = "bills/2016/02/x/bill.beancount";
        assert!(is_ledger_change(&event(EventKind::Create(CreateKind::File), path)));
        assert!(is_ledger_change(&event(EventKind::Remove(RemoveKind::File), path)));
        assert!(is_ledger_change(&event(
            EventKind::Modify(ModifyKind::Name(RenameMode::To)),
            path
        )));
    }

    #[test]
    fn test_other_changes_ignored() {
        assert!(!is_ledger_change(&event(
            EventKind::Create(CreateKind::File),
            "bills/2016/02/x/receipt.pdf"
        )));
        assert!(!is_ledger_change(&event(
            EventKind::Modify(ModifyKind::Data(DataChange::Content)),
            "bills/2016/02/x/bill.beancount"
        )));
        assert!(!is_ledger_change(&event(
            EventKind::Create(CreateKind::Folder),
            "bills/2016/02/x"
        )));
    }
}
