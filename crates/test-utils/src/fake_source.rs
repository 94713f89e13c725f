use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use simwatch::watch::{ChangeCallback, WatchRegistration, WatchSource};

#[derive(Default)]
struct FakeState {
    next_id: u64,
    live: HashMap<PathBuf, Vec<(u64, ChangeCallback)>>,
    total_registrations: usize,
    duplicate_violations: Vec<PathBuf>,
    failing: HashSet<PathBuf>,
}

/// A watch source that never touches the OS.
///
/// - counts live registrations per path,
/// - records every registration made while another one for the same path
///   was still live,
/// - lets tests fire a path's callbacks on demand,
/// - can be told to reject registrations for a path.
#[derive(Clone, Default)]
pub struct FakeWatchSource {
    state: Arc<Mutex<FakeState>>,
}

impl fmt::Debug for FakeWatchSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock().unwrap();
        f.debug_struct("FakeWatchSource")
            .field("live", &state.live.keys().collect::<Vec<_>>())
            .field("total_registrations", &state.total_registrations)
            .finish()
    }
}

impl FakeWatchSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_count(&self, path: impl AsRef<Path>) -> usize {
        let state = self.state.lock().unwrap();
        state.live.get(path.as_ref()).map_or(0, Vec::len)
    }

    pub fn live_paths(&self) -> BTreeSet<PathBuf> {
        let state = self.state.lock().unwrap();
        state
            .live
            .iter()
            .filter(|(_, regs)| !regs.is_empty())
            .map(|(p, _)| p.clone())
            .collect()
    }

    pub fn total_registrations(&self) -> usize {
        self.state.lock().unwrap().total_registrations
    }

    pub fn duplicate_violations(&self) -> Vec<PathBuf> {
        self.state.lock().unwrap().duplicate_violations.clone()
    }

    pub fn fail_on(&self, path: impl AsRef<Path>) {
        let mut state = self.state.lock().unwrap();
        state.failing.insert(path.as_ref().to_path_buf());
    }

    pub fn stop_failing(&self, path: impl AsRef<Path>) {
        let mut state = self.state.lock().unwrap();
        state.failing.remove(path.as_ref());
    }

    /// Invoke every live callback for `path`. Returns how many ran.
    pub fn fire(&self, path: impl AsRef<Path>) -> usize {
        let callbacks: Vec<ChangeCallback> = {
            let state = self.state.lock().unwrap();
            state
                .live
                .get(path.as_ref())
                .map(|regs| regs.iter().map(|(_, cb)| Arc::clone(cb)).collect())
                .unwrap_or_default()
        };
        for cb in callbacks.iter() {
            cb();
        }
        callbacks.len()
    }
}

impl WatchSource for FakeWatchSource {
    fn register(
        &self,
        path: &Path,
        on_change: ChangeCallback,
    ) -> Result<Box<dyn WatchRegistration>, notify::Error> {
        let mut state = self.state.lock().unwrap();
        if state.failing.contains(path) {
            return Err(notify::Error::generic("injected registration failure")
                .add_path(path.to_path_buf()));
        }

        state.next_id += 1;
        let id = state.next_id;
        state.total_registrations += 1;

        let regs = state.live.entry(path.to_path_buf()).or_default();
        let duplicate = !regs.is_empty();
        regs.push((id, on_change));
        if duplicate {
            state.duplicate_violations.push(path.to_path_buf());
        }

        Ok(Box::new(FakeRegistration {
            id,
            path: path.to_path_buf(),
            state: Arc::clone(&self.state),
        }))
    }
}

struct FakeRegistration {
    id: u64,
    path: PathBuf,
    state: Arc<Mutex<FakeState>>,
}

impl fmt::Debug for FakeRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FakeRegistration")
            .field("id", &self.id)
            .field("path", &self.path)
            .finish()
    }
}

impl WatchRegistration for FakeRegistration {}

impl Drop for FakeRegistration {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            if let Some(regs) = state.live.get_mut(&self.path) {
                regs.retain(|(id, _)| *id != self.id);
                if regs.is_empty() {
                    state.live.remove(&self.path);
                }
            }
        }
    }
}
