//! Modification-time staleness checks.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::debug;

/// Modification time of `path`, or `None` if it does not exist.
pub async fn modified(path: &Path) -> Option<SystemTime> {
  tokio::fs::metadata(path).await.ok()?.modified().ok()
}

/// Whether a rule's targets are fresh with respect to its dependencies.
///
/// Fresh means every target and every dependency exists and the oldest
/// target is no older than the newest dependency. A rule without targets is
/// never fresh.
pub async fn is_up_to_date(targets: &[PathBuf], dependencies: &[PathBuf]) -> bool {
  if targets.is_empty() {
    return false;
  }

  let mut oldest_target: Option<SystemTime> = None;
  for target in targets {
    let Some(mtime) = modified(target).await else {
      debug!(target = %target.display(), "target missing");
      return false;
    };
    oldest_target = Some(oldest_target.map_or(mtime, |t| t.min(mtime)));
  }

  let mut newest_dependency: Option<SystemTime> = None;
  for dependency in dependencies {
    let Some(mtime) = modified(dependency).await else {
      debug!(dependency = %dependency.display(), "dependency missing");
      return false;
    };
    newest_dependency = Some(newest_dependency.map_or(mtime, |t| t.max(mtime)));
  }

  match (oldest_target, newest_dependency) {
    (Some(target), Some(dependency)) => target >= dependency,
    (Some(_), None) => true,
    _ => false,
  }
}
