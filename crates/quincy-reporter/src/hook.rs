//! Panic capture hook
//!
//! Installs a process-wide panic hook that writes every unhandled panic to
//! the report store before handing over to whichever hook was installed
//! before it.
//!
//! A global slot holds the active capture target and the identity of the
//! link installed last. Installing again swaps the capture target; a new
//! link is only added when some other hook has taken our place. A per-thread
//! flag keeps a panic from being captured twice when several links end up in
//! the same chain.

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::Cell;
use std::panic::PanicHookInfo;
use std::path::PathBuf;
use std::sync::{Arc, Weak};

use chrono::Utc;
use quincy_core::report::{self, Failure, ReportHeader};
use quincy_core::{ContextSnapshot, ReportStore};
use tracing::{debug, error};

type PanicHookFn = dyn Fn(&PanicHookInfo<'_>) + Sync + Send + 'static;
type PanicHook = Box<PanicHookFn>;

/// Writes captured failures to the report store.
#[derive(Debug, Clone)]
pub struct CaptureHook {
    snapshot: Arc<ContextSnapshot>,
    store: ReportStore,
}

impl CaptureHook {
    pub fn new(snapshot: Arc<ContextSnapshot>, store: ReportStore) -> Self {
        Self { snapshot, store }
    }

    /// Store the hook writes into.
    pub fn store(&self) -> &ReportStore {
        &self.store
    }

    /// Writes `failure` to a newly created report file.
    ///
    /// Runs synchronously on the calling thread; the process is usually
    /// about to terminate.
    pub fn capture(&self, failure: &Failure) -> anyhow::Result<PathBuf> {
        let header = ReportHeader::from_snapshot(&self.snapshot, Utc::now().to_rfc3339());
        let contents = report::render(&header, failure);
        let path = self.store.create(&contents)?;
        debug!(path = %path.display(), "Wrote unhandled panic report");
        Ok(path)
    }
}

/// Builds a [`Failure`] from a panic.
///
/// The trace holds the thread name, location, message and a forced
/// backtrace. A payload raised with [`std::panic::panic_any`] carrying an
/// [`anyhow::Error`] contributes its source chain as the cause.
pub fn failure_from_panic(info: &PanicHookInfo<'_>) -> Failure {
    let payload = info.payload();
    let message = payload_message(payload);

    let thread = std::thread::current();
    let thread_name = thread.name().unwrap_or("<unnamed>");

    let location = info
        .location()
        .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
        .unwrap_or_else(|| "<unknown>".to_string());

    let backtrace = Backtrace::force_capture();
    let trace = format!(
        "thread '{thread_name}' panicked at {location}:\n{message}\n\nstack backtrace:\n{backtrace}"
    );

    Failure::new(trace, payload_cause(payload))
}

fn payload_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(e) = payload.downcast_ref::<anyhow::Error>() {
        e.to_string()
    } else {
        "Box<dyn Any>".to_string()
    }
}

fn payload_cause(payload: &(dyn Any + Send)) -> Option<String> {
    let error = payload.downcast_ref::<anyhow::Error>()?;
    let chain: Vec<String> = error.chain().skip(1).map(ToString::to_string).collect();
    (!chain.is_empty()).then(|| chain.join(": "))
}

// ============================================================================
// Global handler chain
// ============================================================================

/// Identity of an installed [`Link`].
#[derive(Clone)]
struct LinkId {
    top: usize,
    alive: Weak<()>,
}

impl LinkId {
    /// `true` if `hook` is the link this id refers to.
    fn owns(&self, hook: &PanicHook) -> bool {
        self.alive.strong_count() > 0 && hook_address(hook) == self.top
    }
}

/// Active capture target plus the link installed last.
struct HandlerChain {
    capture: Arc<CaptureHook>,
    link: LinkId,
}

/// One installed panic hook: captures, then runs the hook it replaced.
struct Link {
    previous: PanicHook,
    // Keeps the allocation (and so `LinkId::top`) from being reused while installed.
    _alive: Arc<()>,
}

impl Link {
    fn run(&self, info: &PanicHookInfo<'_>) {
        dispatch(info, &self.previous);
    }
}

static CHAIN: parking_lot::RwLock<Option<HandlerChain>> = parking_lot::const_rwlock(None);

// Serializes `install`. `CHAIN` is never held across `take_hook`/`set_hook`,
// which contend with running hooks for the runtime's own hook lock.
static INSTALL: parking_lot::Mutex<()> = parking_lot::const_mutex(());

thread_local! {
    static CAPTURING: Cell<bool> = const { Cell::new(false) };
}

/// Outcome of [`install`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Installation {
    /// The panic hook was installed, wrapping the previous hook
    Installed,
    /// Our hook was still the active one; only its target was replaced
    Replaced,
    /// Another hook had been installed over ours; a new link now wraps it
    Rewrapped,
}

/// Installs the capture hook as the process-wide panic hook.
///
/// The first call takes the current panic hook and keeps it as the next
/// link. Later calls point the chain at `hook`; if the active panic hook is
/// no longer the link installed here, a new link is put on top of it.
///
/// A panic is captured at most once per thread even when a host hook
/// installed in between still chains to an older link.
pub fn install(hook: Arc<CaptureHook>) -> Installation {
    let _serial = INSTALL.lock();

    let installed = CHAIN.write().as_mut().map(|chain| {
        chain.capture = Arc::clone(&hook);
        chain.link.clone()
    });

    let Some(link) = installed else {
        let link = push_link(std::panic::take_hook());
        *CHAIN.write() = Some(HandlerChain {
            capture: hook,
            link,
        });
        debug!("Installed capture hook");
        return Installation::Installed;
    };

    let current = std::panic::take_hook();
    if link.owns(&current) {
        std::panic::set_hook(current);
        debug!("Capture hook already installed, replaced its target");
        return Installation::Replaced;
    }

    let link = push_link(current);
    if let Some(chain) = CHAIN.write().as_mut() {
        chain.link = link;
    }
    debug!("Panic hook was replaced by the host, wrapped it again");
    Installation::Rewrapped
}

/// Returns `true` once [`install`] has run in this process.
pub fn is_installed() -> bool {
    CHAIN.read().is_some()
}

fn push_link(previous: PanicHook) -> LinkId {
    let alive = Arc::new(());
    let id_alive = Arc::downgrade(&alive);
    let link = Link {
        previous,
        _alive: alive,
    };

    let hook: PanicHook = Box::new(move |info: &PanicHookInfo<'_>| link.run(info));
    let top = hook_address(&hook);
    std::panic::set_hook(hook);
    LinkId {
        top,
        alive: id_alive,
    }
}

fn hook_address(hook: &PanicHook) -> usize {
    (&**hook as *const PanicHookFn).cast::<()>() as usize
}

fn dispatch(info: &PanicHookInfo<'_>, previous: &PanicHook) {
    let nested = CAPTURING.try_with(|c| c.replace(true)).unwrap_or(false);

    if !nested {
        // Clone the target out so the lock is not held while running other hooks.
        let capture = CHAIN.read().as_ref().map(|chain| Arc::clone(&chain.capture));
        if let Some(capture) = capture {
            let failure = failure_from_panic(info);
            if let Err(e) = capture.capture(&failure) {
                error!(error = %format!("{e:#}"), "Failed to save crash report");
                eprintln!("Failed to save crash report: {e:#}");
            }
        }
    }

    previous(info);

    if !nested {
        let _ = CAPTURING.try_with(|c| c.set(false));
    }
}
