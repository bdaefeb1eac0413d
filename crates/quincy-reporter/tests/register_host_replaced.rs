//! A host hook that replaced ours without chaining is wrapped again on the
//! next registration, so capture is not silently lost.
//!
//! Runs in its own test binary because the panic hook is process-wide.

use std::sync::atomic::{AtomicUsize, Ordering};

use quincy_core::{Config, ConfigBuilder, ReportStore};
use quincy_reporter::{CrashManager, Installation};

static HOST_HOOK_CALLS: AtomicUsize = AtomicUsize::new(0);

fn config(reports_dir: &std::path::Path) -> Config {
    ConfigBuilder::new()
        .endpoint_url("http://127.0.0.1:1/crash_v300.php")
        .app_package("com.example.app")
        .reports_dir(reports_dir.to_path_buf())
        .build()
}

#[test]
fn test_registration_rewraps_foreign_hook() {
    let first_dir = tempfile::tempdir().unwrap();
    let second_dir = tempfile::tempdir().unwrap();
    let third_dir = tempfile::tempdir().unwrap();

    let first = CrashManager::register(config(first_dir.path()));
    assert_eq!(first.installation(), Installation::Installed);

    let second = CrashManager::register(config(second_dir.path()));
    assert_eq!(second.installation(), Installation::Replaced);

    // The host drops our hook entirely.
    std::panic::set_hook(Box::new(|_| {
        HOST_HOOK_CALLS.fetch_add(1, Ordering::SeqCst);
    }));

    let third = CrashManager::register(config(third_dir.path()));
    assert_eq!(third.installation(), Installation::Rewrapped);

    let result = std::thread::spawn(|| panic!("NullPointer at X")).join();
    assert!(result.is_err());

    assert_eq!(HOST_HOOK_CALLS.load(Ordering::SeqCst), 1);
    assert_eq!(third.store().list().unwrap().len(), 1);
    for dir in [first_dir.path(), second_dir.path()] {
        assert!(ReportStore::new(dir.to_path_buf()).list().unwrap().is_empty());
    }
}
