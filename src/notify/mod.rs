//! Access notification sinks.
//!
//! After a secret is decrypted the service tells the owner about it.
//! Delivery is best-effort: the service logs a failed notification and
//! still returns the plaintext.

use tracing::info;

use crate::errors::Result;
use crate::ports::Notifier;
use crate::vault::OwnerId;

/// Writes notifications to the `tracing` log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, owner: &OwnerId, message: &str) -> Result<()> {
        info!(target: "sitevault::notify", owner = %owner, "{message}");
        Ok(())
    }
}

/// Records notifications in the owner's audit log.
#[cfg(feature = "audit-log")]
#[derive(Debug, Clone)]
pub struct AuditNotifier {
    vault_dir: std::path::PathBuf,
}

#[cfg(feature = "audit-log")]
impl AuditNotifier {
    pub fn new(vault_dir: &std::path::Path) -> Self {
        Self {
            vault_dir: vault_dir.to_path_buf(),
        }
    }
}

#[cfg(feature = "audit-log")]
impl Notifier for AuditNotifier {
    fn notify(&self, owner: &OwnerId, message: &str) -> Result<()> {
        let audit = crate::audit::AuditLog::open(&self.vault_dir).ok_or_else(|| {
            crate::errors::VaultError::NotificationFailed(format!(
                "cannot open audit log in {}",
                self.vault_dir.display()
            ))
        })?;
        audit.try_log("notify", owner, None, Some(message))
    }
}

/// Fans one notification out to several sinks.
///
/// Every sink is tried; the first error (if any) is returned.
#[derive(Default)]
pub struct NotifierChain {
    sinks: Vec<Box<dyn Notifier>>,
}

impl NotifierChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: impl Notifier + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl Notifier for NotifierChain {
    fn notify(&self, owner: &OwnerId, message: &str) -> Result<()> {
        let mut first_err = None;
        for sink in &self.sinks {
            if let Err(e) = sink.notify(owner, message) {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::errors::VaultError;

    struct Recording(Rc<RefCell<Vec<String>>>);

    impl Notifier for Recording {
        fn notify(&self, _owner: &OwnerId, message: &str) -> Result<()> {
            self.0.borrow_mut().push(message.to_string());
            Ok(())
        }
    }

    struct Failing;

    impl Notifier for Failing {
        fn notify(&self, _owner: &OwnerId, _message: &str) -> Result<()> {
            Err(VaultError::NotificationFailed("smtp down".into()))
        }
    }

    #[test]
    fn chain_reaches_every_sink_even_after_failure() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let chain = NotifierChain::new()
            .with(Failing)
            .with(Recording(Rc::clone(&seen)));

        let err = chain.notify(&OwnerId::from("ab"), "viewed").unwrap_err();
        assert!(matches!(err, VaultError::NotificationFailed(_)));
        assert_eq!(*seen.borrow(), vec!["viewed".to_string()]);
    }

    #[test]
    fn empty_chain_succeeds() {
        let chain = NotifierChain::new();
        assert!(chain.is_empty());
        assert!(chain.notify(&OwnerId::from("ab"), "x").is_ok());
    }

    #[test]
    fn log_notifier_never_fails() {
        assert!(LogNotifier.notify(&OwnerId::from("ab"), "x").is_ok());
    }

    #[cfg(feature = "audit-log")]
    #[test]
    fn audit_notifier_writes_entry() {
        let dir = tempfile::TempDir::new().unwrap();
        let owner = OwnerId::from("ab");
        AuditNotifier::new(dir.path())
            .notify(&owner, "Your password for github.com was viewed")
            .unwrap();

        let audit = crate::audit::AuditLog::open(dir.path()).unwrap();
        let entries = audit.query(&owner, 10, None).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].operation, "notify");
    }

    #[cfg(feature = "audit-log")]
    #[test]
    fn audit_notifier_reports_unopenable_log() {
        let n = AuditNotifier::new(std::path::Path::new("/nonexistent/sitevault/dir"));
        assert!(n.notify(&OwnerId::from("ab"), "x").is_err());
    }
}
