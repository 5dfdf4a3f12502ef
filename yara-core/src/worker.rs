//! Isolated execution with a deadline.
//!
//! Analyzer calls are synchronous and own no shared state, so a host under
//! concurrent load can run each one on its own thread and stop waiting after
//! a timeout. The abandoned thread finishes (or not) on its own; its result is
//! discarded.

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crate::{Result, YaraError};

/// Run `job` on a dedicated thread and wait at most `timeout` for it.
///
/// # Errors
///
/// Returns [`YaraError::Computation`] if the deadline passes or the job
/// panics; otherwise returns whatever the job returned.
pub fn run_isolated<T, F>(timeout: Duration, job: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    let (tx, rx) = mpsc::sync_channel(1);
    thread::Builder::new()
        .name("yara-worker".into())
        .spawn(move || {
            // The receiver may be gone after a timeout.
            let _ = tx.send(job());
        })?;

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(mpsc::RecvTimeoutError::Timeout) => {
            log::warn!("worker abandoned after {:?}", timeout);
            Err(YaraError::Computation(format!(
                "computation did not finish within {:?}",
                timeout
            )))
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => Err(YaraError::Computation(
            "worker terminated without a result".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_job_result() {
        let v = run_isolated(Duration::from_secs(5), || Ok(21 * 2)).unwrap();
        assert_eq!(v, 42);
    }

    #[test]
    fn propagates_job_error() {
        let err = run_isolated::<(), _>(Duration::from_secs(5), || {
            Err(YaraError::MissingData("sample 'x'".into()))
        })
        .unwrap_err();
        assert!(matches!(err, YaraError::MissingData(_)));
    }

    #[test]
    fn times_out() {
        let err = run_isolated(Duration::from_millis(20), || {
            thread::sleep(Duration::from_millis(500));
            Ok(())
        })
        .unwrap_err();
        assert!(matches!(err, YaraError::Computation(_)));
    }

    #[test]
    fn panic_is_computation_error() {
        let err = run_isolated::<(), _>(Duration::from_secs(5), || panic!("boom")).unwrap_err();
        assert!(matches!(err, YaraError::Computation(_)));
    }
}
