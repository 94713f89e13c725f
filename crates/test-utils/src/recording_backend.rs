use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use simwatch::engine::RebuildBackend;
use simwatch::types::WatchStatus;

type Hook = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct RecordingState {
    rebuilds: usize,
    fail_next: usize,
    statuses: Vec<WatchStatus>,
}

/// A rebuild backend that:
/// - counts rebuilds,
/// - fails the next N rebuilds on request,
/// - records every status change,
/// - optionally runs a hook in the middle of each rebuild.
///
/// Clones share state, so a test keeps one clone and hands the other to
/// the runtime.
#[derive(Clone, Default)]
pub struct RecordingBackend {
    state: Arc<Mutex<RecordingState>>,
    hook: Option<Hook>,
}

impl fmt::Debug for RecordingBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordingBackend")
            .field("rebuilds", &self.rebuilds())
            .finish_non_exhaustive()
    }
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hook(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.hook = Some(Arc::new(hook));
        self
    }

    pub fn rebuilds(&self) -> usize {
        self.state.lock().unwrap().rebuilds
    }

    pub fn fail_next(&self, count: usize) {
        self.state.lock().unwrap().fail_next = count;
    }

    pub fn statuses(&self) -> Vec<WatchStatus> {
        self.state.lock().unwrap().statuses.clone()
    }
}

impl RebuildBackend for RecordingBackend {
    fn rebuild(&mut self) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + '_>> {
        let state = Arc::clone(&self.state);
        let hook = self.hook.clone();

        Box::pin(async move {
            if let Some(hook) = hook {
                hook();
            }

            let mut guard = state.lock().unwrap();
            guard.rebuilds += 1;
            if guard.fail_next > 0 {
                guard.fail_next -= 1;
                return Err(anyhow!("injected rebuild failure"));
            }
            Ok(())
        })
    }

    fn status_changed(&mut self, status: WatchStatus) {
        self.state.lock().unwrap().statuses.push(status);
    }
}
