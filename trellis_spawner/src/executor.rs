use std::{future::Future, pin::Pin, sync::OnceLock};
use thiserror::Error;

/// A pinned, boxed, `Send` future, suitable for spawning onto a work-stealing executor.
pub type PinnedFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
/// A pinned, boxed, non-`Send` future, suitable for spawning on the current thread only.
pub type PinnedLocalFuture<T> = Pin<Box<dyn Future<Output = T>>>;

type SpawnFn = fn(PinnedFuture<()>);
type SpawnLocalFn = fn(PinnedLocalFuture<()>);
type PollLocalFn = fn();

#[derive(Clone, Copy)]
struct ExecutorFns {
    spawn: SpawnFn,
    spawn_local: SpawnLocalFn,
    poll_local: PollLocalFn,
}

static EXECUTOR_FNS: OnceLock<ExecutorFns> = OnceLock::new();

#[cold]
#[inline(never)]
fn handle_uninitialized_spawn(_fut: PinnedFuture<()>) {
    #[cfg(feature = "tracing")]
    tracing::error!(
        "Executor::spawn() was called before any executor was initialized. No task was run. \
         Call one of `Executor::init_*` before spawning tasks."
    );
    #[cfg(all(debug_assertions, not(feature = "tracing")))]
    panic!(
        "Executor::spawn() was called before any executor was initialized. Call one of \
         `Executor::init_*` before spawning tasks."
    );
}

#[cold]
#[inline(never)]
fn handle_uninitialized_spawn_local(_fut: PinnedLocalFuture<()>) {
    #[cfg(feature = "tracing")]
    tracing::error!(
        "Executor::spawn_local() was called before any executor was initialized. No task was run."
    );
    #[cfg(all(debug_assertions, not(feature = "tracing")))]
    panic!(
        "Executor::spawn_local() was called before any executor was initialized. Call one of \
         `Executor::init_*` before spawning tasks."
    );
}

fn no_op_poll() {}

/// Errors returned while configuring the global executor.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorError {
    /// The executor has already been set; it can only be set once per program.
    #[error("Executor has already been set.")]
    AlreadySet,
}

/// Allows a consumer to inject a custom executor that does not have built-in support.
pub trait CustomExecutor {
    /// Spawns a future, for which the output is not important.
    fn spawn(&self, fut: PinnedFuture<()>);
    /// Spawns a thread-local future that does not need to implement `Send`.
    fn spawn_local(&self, fut: PinnedLocalFuture<()>);
    /// Polls the thread-local task queue, for executors that need to be polled rather
    /// than driven by their own event loop.
    fn poll_local(&self);
}

fn test_object_safety(_: &dyn CustomExecutor) {}

/// A global, executor-agnostic task spawner.
///
/// Trellis code calls `Executor::spawn`/`spawn_local` without knowing whether the
/// host is running under `tokio`, the browser's `wasm-bindgen-futures` microtask
/// queue, or a bespoke test harness. Call one of the `init_*` functions exactly once,
/// at startup, before spawning anything.
pub struct Executor;

impl Executor {
    /// Spawns a future, for which the output is not important.
    pub fn spawn(fut: impl Future<Output = ()> + Send + 'static) {
        (EXECUTOR_FNS
            .get()
            .map(|fns| fns.spawn)
            .unwrap_or(handle_uninitialized_spawn))(Box::pin(fut))
    }

    /// Spawns a thread-local future, for which the output is not important.
    pub fn spawn_local(fut: impl Future<Output = ()> + 'static) {
        (EXECUTOR_FNS
            .get()
            .map(|fns| fns.spawn_local)
            .unwrap_or(handle_uninitialized_spawn_local))(Box::pin(fut))
    }

    /// Polls the thread-local task queue, used by executors that do not drive
    /// themselves via a reactor (e.g. `futures::executor::LocalPool`).
    pub fn poll_local() {
        (EXECUTOR_FNS.get().map(|fns| fns.poll_local).unwrap_or(no_op_poll))()
    }

    /// Waits until the next "tick" of the async runtime, a kind of no-op that can be
    /// used to wait a single step before proceeding.
    pub async fn tick() {
        let (tx, rx) = futures::channel::oneshot::channel();
        Executor::spawn(async move {
            _ = tx.send(());
        });
        _ = rx.await;
    }

    /// Globally sets the [`tokio`] runtime as the executor used to spawn tasks.
    ///
    /// Returns `Err(_)` if there's already an executor set.
    #[cfg(feature = "tokio")]
    pub fn init_tokio() -> Result<(), ExecutorError> {
        EXECUTOR_FNS
            .set(ExecutorFns {
                spawn: |fut| {
                    tokio::spawn(fut);
                },
                spawn_local: |fut| {
                    tokio::task::spawn_local(fut);
                },
                poll_local: no_op_poll,
            })
            .map_err(|_| ExecutorError::AlreadySet)
    }

    /// Globally sets `wasm-bindgen-futures` as the executor used to spawn tasks.
    ///
    /// Returns `Err(_)` if there's already an executor set.
    #[cfg(feature = "wasm-bindgen")]
    pub fn init_wasm_bindgen() -> Result<(), ExecutorError> {
        EXECUTOR_FNS
            .set(ExecutorFns {
                spawn: |fut| {
                    wasm_bindgen_futures::spawn_local(fut);
                },
                spawn_local: |fut| {
                    wasm_bindgen_futures::spawn_local(fut);
                },
                poll_local: no_op_poll,
            })
            .map_err(|_| ExecutorError::AlreadySet)
    }

    /// Globally sets a thread pool built from [`futures::executor`] as the executor
    /// used to spawn tasks, and creates a `LocalPool` to spawn thread-local tasks.
    ///
    /// Returns `Err(_)` if there's already an executor set.
    #[cfg(feature = "futures-executor")]
    pub fn init_futures_executor() -> Result<(), ExecutorError> {
        use futures::{
            executor::{LocalPool, LocalSpawner, ThreadPool},
            task::{LocalSpawnExt, SpawnExt},
        };
        use std::cell::RefCell;

        thread_local! {
            static LOCAL_POOL: RefCell<LocalPool> = RefCell::new(LocalPool::new());
            static LOCAL_SPAWNER: LocalSpawner = LOCAL_POOL.with(|pool| pool.borrow().spawner());
        }

        static THREAD_POOL: OnceLock<ThreadPool> = OnceLock::new();
        let pool = ThreadPool::new().expect("could not create ThreadPool");
        _ = THREAD_POOL.set(pool);

        EXECUTOR_FNS
            .set(ExecutorFns {
                spawn: |fut| {
                    if let Some(pool) = THREAD_POOL.get() {
                        _ = pool.spawn(fut);
                    }
                },
                spawn_local: |fut| {
                    _ = LOCAL_SPAWNER.with(|spawner| spawner.spawn_local(fut));
                },
                poll_local: || {
                    LOCAL_POOL.with(|pool| pool.borrow_mut().run_until_stalled());
                },
            })
            .map_err(|_| ExecutorError::AlreadySet)
    }

    /// Globally sets a custom executor as the executor used to spawn tasks.
    ///
    /// The custom executor must be `'static`, `Send`, and `Sync`, because it is
    /// stored for the lifetime of the program.
    ///
    /// Returns `Err(_)` if there's already an executor set.
    pub fn init_custom_executor(
        executor: impl CustomExecutor + Send + Sync + 'static,
    ) -> Result<(), ExecutorError> {
        test_object_safety(&executor);
        static CUSTOM: OnceLock<Box<dyn CustomExecutor + Send + Sync>> = OnceLock::new();
        CUSTOM
            .set(Box::new(executor))
            .map_err(|_| ())
            .expect("init_custom_executor called more than once");

        EXECUTOR_FNS
            .set(ExecutorFns {
                spawn: |fut| {
                    if let Some(exec) = CUSTOM.get() {
                        exec.spawn(fut);
                    }
                },
                spawn_local: |fut| {
                    if let Some(exec) = CUSTOM.get() {
                        exec.spawn_local(fut);
                    }
                },
                poll_local: || {
                    if let Some(exec) = CUSTOM.get() {
                        exec.poll_local();
                    }
                },
            })
            .map_err(|_| ExecutorError::AlreadySet)
    }

    /// Globally sets a custom, thread-local executor. Identical to
    /// [`init_custom_executor`](Self::init_custom_executor), but does not require
    /// `Send`/`Sync`; useful on single-threaded targets like `wasm32-unknown-unknown`.
    pub fn init_local_custom_executor(
        executor: impl CustomExecutor + 'static,
    ) -> Result<(), ExecutorError> {
        LOCAL_CUSTOM
            .with(|cell| cell.set(Box::new(executor)))
            .map_err(|_| ())
            .expect("init_local_custom_executor called more than once on this thread");

        EXECUTOR_FNS
            .set(ExecutorFns {
                spawn: |fut| {
                    LOCAL_CUSTOM.with(|cell| {
                        if let Some(exec) = cell.get() {
                            exec.spawn(fut);
                        }
                    })
                },
                spawn_local: |fut| {
                    LOCAL_CUSTOM.with(|cell| {
                        if let Some(exec) = cell.get() {
                            exec.spawn_local(fut);
                        }
                    })
                },
                poll_local: || {
                    LOCAL_CUSTOM.with(|cell| {
                        if let Some(exec) = cell.get() {
                            exec.poll_local();
                        }
                    })
                },
            })
            .map_err(|_| ExecutorError::AlreadySet)
    }
}

thread_local! {
    static LOCAL_CUSTOM: std::cell::OnceCell<Box<dyn CustomExecutor>> = const { std::cell::OnceCell::new() };
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoOpExecutor;

    impl CustomExecutor for NoOpExecutor {
        fn spawn(&self, _fut: PinnedFuture<()>) {}
        fn spawn_local(&self, _fut: PinnedLocalFuture<()>) {}
        fn poll_local(&self) {}
    }

    #[test]
    fn custom_executor_is_object_safe() {
        let exec: Box<dyn CustomExecutor> = Box::new(NoOpExecutor);
        exec.poll_local();
    }
}
