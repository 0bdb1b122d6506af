//! Private helpers for testing and benchmarking the pool packages.

use std::sync::{Arc, Barrier, mpsc};
use std::{env, panic, thread};
use std::time::Duration;

/// How long a guarded test may run before it is considered hung.
const TIMEOUT: Duration = Duration::from_secs(10);

/// Miri runs thread synchronization orders of magnitude slower.
const MIRI_TIMEOUT: Duration = Duration::from_secs(60);

/// Runs a test on a separate thread and fails it if it does not complete in time.
///
/// Concurrency bugs in pools tend to show up as hangs (e.g. a claim loop that never finds a
/// free slot), which would otherwise stall the whole test run.
///
/// When the `MUTATION_TESTING` environment variable is set to "1", the test runs directly on
/// the calling thread so that mutation testing can observe hanging mutants itself.
///
/// # Panics
///
/// Panics if the test panics or does not complete within the timeout.
///
/// # Example
///
/// ```rust
/// use testing::with_watchdog;
///
/// let answer = with_watchdog(|| 40 + 2);
/// assert_eq!(answer, 42);
/// ```
pub fn with_watchdog<F, R>(test_fn: F) -> R
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    if env::var("MUTATION_TESTING").as_deref() == Ok("1") {
        return test_fn();
    }

    let timeout = if cfg!(miri) { MIRI_TIMEOUT } else { TIMEOUT };

    let (tx, rx) = mpsc::channel();

    let test_thread = thread::Builder::new()
        .name("watchdog-guarded-test".to_string())
        .spawn(move || {
            // If the receiver is gone, the watchdog has already given up on us.
            drop(tx.send(test_fn()));
        })
        .expect("failed to spawn test thread");

    match rx.recv_timeout(timeout) {
        Ok(result) => {
            test_thread.join().expect("test thread completed successfully");
            result
        }
        Err(mpsc::RecvTimeoutError::Timeout) => {
            panic!("test did not complete within {} seconds", timeout.as_secs());
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => match test_thread.join() {
            Ok(()) => panic!("test thread exited without producing a result"),
            Err(payload) => panic::resume_unwind(payload),
        },
    }
}

/// Runs `f` on `thread_count` threads that are all released at the same moment, returning the
/// results in thread index order.
///
/// Starting all threads together maximizes the chance that they actually overlap, which is
/// what race-sensitive tests need. Each thread receives its index in `0..thread_count`.
///
/// # Panics
///
/// Panics if any of the threads panics, re-raising the first such panic.
///
/// # Example
///
/// ```rust
/// use testing::run_on_threads;
///
/// let indexes = run_on_threads(4, |index| index * 10);
/// assert_eq!(indexes, vec![0, 10, 20, 30]);
/// ```
pub fn run_on_threads<F, R>(thread_count: usize, f: F) -> Vec<R>
where
    F: Fn(usize) -> R + Send + Sync,
    R: Send,
{
    let barrier = Arc::new(Barrier::new(thread_count));
    let f = &f;

    thread::scope(|s| {
        let threads = (0..thread_count)
            .map(|index| {
                let barrier = Arc::clone(&barrier);

                s.spawn(move || {
                    barrier.wait();
                    f(index)
                })
            })
            .collect::<Vec<_>>();

        threads
            .into_iter()
            .map(|thread| match thread.join() {
                Ok(result) => result,
                Err(payload) => panic::resume_unwind(payload),
            })
            .collect()
    })
}
