//! Watch-mode primitives (spec §5, §9: "watch is not part of the core").
//!
//! The core only exposes "the set of paths last planned" and "run once"; this module supplies a
//! minimal polling loop that uses those two primitives, since a production embedder is free to
//! swap in an OS file-event backend (inotify/kqueue/etc.) without depending on anything here.

use std::{
    collections::BTreeMap,
    path::PathBuf,
    time::{Duration, SystemTime},
};

use crate::error::DriverError;

fn mtimes(paths: &[PathBuf]) -> BTreeMap<PathBuf, Option<SystemTime>> {
    paths.iter().map(|p| (p.clone(), std::fs::metadata(p).and_then(|m| m.modified()).ok())).collect()
}

/// Runs one watch tick: re-runs `run_once` if `previous` is `None` (first run) or if any path in
/// `previous` has a different modification time now. Returns the new snapshot to pass to the next
/// tick, and whether a re-plan actually happened.
///
/// `run_once` returns the absolute paths the new plan touched (i.e. `last_planned_paths()`), which
/// become the set watched on the next tick — so a re-plan that drops or adds an import is picked
/// up automatically.
pub fn watch_once<F>(
    previous: Option<&BTreeMap<PathBuf, Option<SystemTime>>>,
    run_once: F,
) -> Result<(BTreeMap<PathBuf, Option<SystemTime>>, bool), DriverError>
where
    F: FnOnce() -> Result<Vec<PathBuf>, DriverError>,
{
    let changed = match previous {
        None => true,
        Some(prev) => {
            let current = mtimes(&prev.keys().cloned().collect::<Vec<_>>());
            current != *prev
        }
    };

    if !changed {
        return Ok((previous.cloned().unwrap_or_default(), false));
    }

    let planned_paths = run_once()?;
    Ok((mtimes(&planned_paths), true))
}

/// Polls forever at `interval`, coalescing any changes that happen while a re-plan is in flight
/// into the next tick (spec §5: "a subsequent change simply re-triggers after completion"). Errors
/// from `run_once` are reported via `on_error` and never stop the watcher (spec §7: "watch mode
/// catches and reports it").
pub fn watch_forever<F, E>(interval: Duration, mut run_once: F, mut on_error: E) -> !
where
    F: FnMut() -> Result<Vec<PathBuf>, DriverError>,
    E: FnMut(DriverError),
{
    let mut snapshot: Option<BTreeMap<PathBuf, Option<SystemTime>>> = None;
    loop {
        match watch_once(snapshot.as_ref(), &mut run_once) {
            Ok((new_snapshot, changed)) => {
                if changed {
                    debug!(watched_files = new_snapshot.len(), "watch: re-plan complete");
                }
                snapshot = Some(new_snapshot);
            }
            Err(err) => {
                warn!(error = %err, "watch: run_once failed, continuing");
            }
        }
        std::thread::sleep(interval);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_tick_always_runs() {
        let (_, changed) = watch_once(None, || Ok(Vec::new())).unwrap();
        assert!(changed);
    }

    #[test]
    fn unchanged_snapshot_skips_rerun() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("A.sol");
        std::fs::write(&file, "contract A {}").unwrap();

        let (snapshot, _) = watch_once(None, || Ok(vec![file.clone()])).unwrap();
        let mut called = false;
        let (_, changed) = watch_once(Some(&snapshot), || {
            called = true;
            Ok(vec![file.clone()])
        })
        .unwrap();
        assert!(!changed);
        assert!(!called);
    }

    #[test]
    fn touched_file_triggers_rerun() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("A.sol");
        std::fs::write(&file, "contract A {}").unwrap();

        let (snapshot, _) = watch_once(None, || Ok(vec![file.clone()])).unwrap();

        std::thread::sleep(Duration::from_millis(10));
        std::fs::write(&file, "contract A { uint x; }").unwrap();

        let (_, changed) = watch_once(Some(&snapshot), || Ok(vec![file.clone()])).unwrap();
        assert!(changed);
    }
}
