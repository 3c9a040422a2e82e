use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    rc::Rc,
    sync::OnceLock,
    time::Duration,
};
use thiserror::Error;

/// Handle returned by [`Scheduler::request_animation_frame`].
pub type FrameId = u32;
/// Handle returned by [`Scheduler::set_interval`].
pub type IntervalId = u32;
/// Handle returned by [`Scheduler::set_timeout`].
pub type TimeoutId = u32;

type QueueMicrotaskFn = fn(Box<dyn FnOnce()>);
type RequestAnimationFrameFn = fn(Box<dyn FnOnce()>) -> FrameId;
type CancelAnimationFrameFn = fn(FrameId);
type SetIntervalFn = fn(Rc<dyn Fn()>, Duration) -> IntervalId;
type ClearIntervalFn = fn(IntervalId);
type SetTimeoutFn = fn(Box<dyn FnOnce()>, Duration) -> TimeoutId;
type ClearTimeoutFn = fn(TimeoutId);

#[derive(Clone, Copy)]
struct SchedulerFns {
    queue_microtask: QueueMicrotaskFn,
    request_animation_frame: RequestAnimationFrameFn,
    cancel_animation_frame: CancelAnimationFrameFn,
    set_interval: SetIntervalFn,
    clear_interval: ClearIntervalFn,
    set_timeout: SetTimeoutFn,
    clear_timeout: ClearTimeoutFn,
}

static SCHEDULER_FNS: OnceLock<SchedulerFns> = OnceLock::new();

/// Errors returned while configuring the global scheduler.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerError {
    /// A scheduler backend has already been installed; it can only be set once.
    #[error("Scheduler has already been set.")]
    AlreadySet,
}

/// A global, backend-agnostic source of microtask, animation-frame, and
/// interval/timeout scheduling.
///
/// The reactive runtime's effect flush calls [`Scheduler::queue_microtask`]; the
/// event engine's frame coalescer calls [`Scheduler::request_animation_frame`] and
/// the memory governor's sweep calls [`Scheduler::set_interval`]. None of that code
/// knows whether it is running in a browser or under [`Scheduler::init_fake`] in a
/// unit test.
pub struct Scheduler;

impl Scheduler {
    /// Queues a callback to run at microtask timing (after the current synchronous
    /// job finishes, before the next macrotask or animation frame).
    pub fn queue_microtask(task: impl FnOnce() + 'static) {
        (Self::fns().queue_microtask)(Box::new(task))
    }

    /// Requests that `task` run before the next repaint. Returns a handle that can
    /// be passed to [`Scheduler::cancel_animation_frame`].
    #[must_use]
    pub fn request_animation_frame(task: impl FnOnce() + 'static) -> FrameId {
        (Self::fns().request_animation_frame)(Box::new(task))
    }

    /// Cancels a previously requested animation frame callback, if it has not yet run.
    pub fn cancel_animation_frame(id: FrameId) {
        (Self::fns().cancel_animation_frame)(id)
    }

    /// Repeatedly runs `task` every `interval`. Returns a handle that can be passed
    /// to [`Scheduler::clear_interval`].
    #[must_use]
    pub fn set_interval(task: impl Fn() + 'static, interval: Duration) -> IntervalId {
        (Self::fns().set_interval)(Rc::new(task), interval)
    }

    /// Stops a repeating interval previously started with [`Scheduler::set_interval`].
    pub fn clear_interval(id: IntervalId) {
        (Self::fns().clear_interval)(id)
    }

    /// Runs `task` once, after `delay` has elapsed. Returns a handle that can be
    /// passed to [`Scheduler::clear_timeout`].
    #[must_use]
    pub fn set_timeout(task: impl FnOnce() + 'static, delay: Duration) -> TimeoutId {
        (Self::fns().set_timeout)(Box::new(task), delay)
    }

    /// Cancels a previously scheduled timeout, if it has not yet fired.
    pub fn clear_timeout(id: TimeoutId) {
        (Self::fns().clear_timeout)(id)
    }

    fn fns() -> SchedulerFns {
        *SCHEDULER_FNS.get().unwrap_or(&FAKE_FNS)
    }

    /// Installs the deterministic, manually-advanced scheduler used in tests (and,
    /// by default, anywhere outside a browser). Microtasks run synchronously,
    /// in-line with the call to `queue_microtask`. Animation frames and
    /// interval/timeout callbacks are held in a thread-local queue until the test
    /// explicitly steps time forward with [`Scheduler::run_animation_frame`] or
    /// [`Scheduler::advance`].
    pub fn init_fake() -> Result<(), SchedulerError> {
        SCHEDULER_FNS.set(FAKE_FNS).map_err(|_| SchedulerError::AlreadySet)
    }

    /// Runs every animation-frame callback currently queued, as a single "frame".
    /// Returns how many callbacks ran. Callbacks queued *during* this frame (e.g. an
    /// effect that requests another frame) are deferred to the next call.
    pub fn run_animation_frame() -> usize {
        FAKE_CLOCK.with(|clock| clock.run_animation_frame())
    }

    /// Advances the fake clock by `elapsed`, firing any timeouts and intervals whose
    /// deadline falls within the new time window. Intervals that fire are
    /// automatically rescheduled for their next period.
    pub fn advance(elapsed: Duration) {
        FAKE_CLOCK.with(|clock| clock.advance(elapsed))
    }
}

struct FakeClock {
    next_id: Cell<u32>,
    frames: RefCell<VecDeque<(FrameId, Box<dyn FnOnce()>)>>,
    timeouts: RefCell<Vec<FakeTimeout>>,
    intervals: RefCell<Vec<FakeInterval>>,
}

struct FakeTimeout {
    id: TimeoutId,
    remaining: Duration,
    task: Option<Box<dyn FnOnce()>>,
}

struct FakeInterval {
    id: IntervalId,
    period: Duration,
    remaining: Duration,
    task: Rc<dyn Fn()>,
}

impl FakeClock {
    fn new() -> Self {
        Self {
            next_id: Cell::new(1),
            frames: RefCell::new(VecDeque::new()),
            timeouts: RefCell::new(Vec::new()),
            intervals: RefCell::new(Vec::new()),
        }
    }

    fn next_id(&self) -> u32 {
        let id = self.next_id.get();
        self.next_id.set(id.wrapping_add(1).max(1));
        id
    }

    fn request_animation_frame(&self, task: Box<dyn FnOnce()>) -> FrameId {
        let id = self.next_id();
        self.frames.borrow_mut().push_back((id, task));
        id
    }

    fn cancel_animation_frame(&self, id: FrameId) {
        self.frames.borrow_mut().retain(|(pending, _)| *pending != id);
    }

    fn run_animation_frame(&self) -> usize {
        let due: Vec<_> = self.frames.borrow_mut().drain(..).collect();
        let ran = due.len();
        for (_, task) in due {
            task();
        }
        ran
    }

    fn set_timeout(&self, task: Box<dyn FnOnce()>, delay: Duration) -> TimeoutId {
        let id = self.next_id();
        self.timeouts.borrow_mut().push(FakeTimeout {
            id,
            remaining: delay,
            task: Some(task),
        });
        id
    }

    fn clear_timeout(&self, id: TimeoutId) {
        self.timeouts.borrow_mut().retain(|t| t.id != id);
    }

    fn set_interval(&self, task: Rc<dyn Fn()>, period: Duration) -> IntervalId {
        let id = self.next_id();
        self.intervals.borrow_mut().push(FakeInterval {
            id,
            period,
            remaining: period,
            task,
        });
        id
    }

    fn clear_interval(&self, id: IntervalId) {
        self.intervals.borrow_mut().retain(|i| i.id != id);
    }

    fn advance(&self, elapsed: Duration) {
        let mut fired_timeouts = Vec::new();
        {
            let mut timeouts = self.timeouts.borrow_mut();
            for timeout in timeouts.iter_mut() {
                timeout.remaining = timeout.remaining.saturating_sub(elapsed);
            }
            timeouts.retain_mut(|timeout| {
                if timeout.remaining.is_zero() {
                    if let Some(task) = timeout.task.take() {
                        fired_timeouts.push(task);
                    }
                    false
                } else {
                    true
                }
            });
        }
        for task in fired_timeouts {
            task();
        }

        let due_intervals: Vec<Rc<dyn Fn()>> = {
            let mut intervals = self.intervals.borrow_mut();
            let mut due = Vec::new();
            for interval in intervals.iter_mut() {
                interval.remaining = interval.remaining.saturating_sub(elapsed);
                while interval.remaining.is_zero() {
                    due.push(interval.task.clone());
                    interval.remaining += interval.period.max(Duration::from_nanos(1));
                }
            }
            due
        };
        for task in due_intervals {
            task();
        }
    }
}

thread_local! {
    static FAKE_CLOCK: FakeClock = FakeClock::new();
}

fn fake_queue_microtask(task: Box<dyn FnOnce()>) {
    task();
}

fn fake_request_animation_frame(task: Box<dyn FnOnce()>) -> FrameId {
    FAKE_CLOCK.with(|clock| clock.request_animation_frame(task))
}

fn fake_cancel_animation_frame(id: FrameId) {
    FAKE_CLOCK.with(|clock| clock.cancel_animation_frame(id))
}

fn fake_set_interval(task: Rc<dyn Fn()>, period: Duration) -> IntervalId {
    FAKE_CLOCK.with(|clock| clock.set_interval(task, period))
}

fn fake_clear_interval(id: IntervalId) {
    FAKE_CLOCK.with(|clock| clock.clear_interval(id))
}

fn fake_set_timeout(task: Box<dyn FnOnce()>, delay: Duration) -> TimeoutId {
    FAKE_CLOCK.with(|clock| clock.set_timeout(task, delay))
}

fn fake_clear_timeout(id: TimeoutId) {
    FAKE_CLOCK.with(|clock| clock.clear_timeout(id))
}

const FAKE_FNS: SchedulerFns = SchedulerFns {
    queue_microtask: fake_queue_microtask,
    request_animation_frame: fake_request_animation_frame,
    cancel_animation_frame: fake_cancel_animation_frame,
    set_interval: fake_set_interval,
    clear_interval: fake_clear_interval,
    set_timeout: fake_set_timeout,
    clear_timeout: fake_clear_timeout,
};

#[cfg(feature = "browser")]
mod browser {
    use super::*;
    use wasm_bindgen::{closure::Closure, JsCast};

    pub(super) fn queue_microtask(task: Box<dyn FnOnce()>) {
        let closure = Closure::once(task);
        let promise = js_sys::Promise::resolve(&wasm_bindgen::JsValue::NULL);
        _ = promise.then(&closure.as_ref().unchecked_ref::<js_sys::Function>().clone());
        closure.forget();
    }

    pub(super) fn request_animation_frame(task: Box<dyn FnOnce()>) -> FrameId {
        let window = web_sys::window().expect("no global `window` exists");
        let closure = Closure::once_into_js(task);
        window
            .request_animation_frame(closure.as_ref().unchecked_ref())
            .expect("requestAnimationFrame failed") as FrameId
    }

    pub(super) fn cancel_animation_frame(id: FrameId) {
        if let Some(window) = web_sys::window() {
            _ = window.cancel_animation_frame(id as i32);
        }
    }

    pub(super) fn set_interval(task: Rc<dyn Fn()>, period: Duration) -> IntervalId {
        let window = web_sys::window().expect("no global `window` exists");
        let closure = Closure::<dyn Fn()>::new(move || task());
        let id = window
            .set_interval_with_callback_and_timeout_and_arguments_0(
                closure.as_ref().unchecked_ref(),
                period.as_millis() as i32,
            )
            .expect("setInterval failed");
        closure.forget();
        id as IntervalId
    }

    pub(super) fn clear_interval(id: IntervalId) {
        if let Some(window) = web_sys::window() {
            window.clear_interval_with_handle(id as i32);
        }
    }

    pub(super) fn set_timeout(task: Box<dyn FnOnce()>, delay: Duration) -> TimeoutId {
        let window = web_sys::window().expect("no global `window` exists");
        let closure = Closure::once_into_js(task);
        let id = window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                closure.as_ref().unchecked_ref(),
                delay.as_millis() as i32,
            )
            .expect("setTimeout failed");
        id as TimeoutId
    }

    pub(super) fn clear_timeout(id: TimeoutId) {
        if let Some(window) = web_sys::window() {
            window.clear_timeout_with_handle(id as i32);
        }
    }
}

#[cfg(feature = "browser")]
impl Scheduler {
    /// Installs a real-browser scheduler backed by `queueMicrotask`,
    /// `requestAnimationFrame`, and `setInterval`/`setTimeout` on `web_sys::window`.
    pub fn init_browser() -> Result<(), SchedulerError> {
        SCHEDULER_FNS
            .set(SchedulerFns {
                queue_microtask: browser::queue_microtask,
                request_animation_frame: browser::request_animation_frame,
                cancel_animation_frame: browser::cancel_animation_frame,
                set_interval: browser::set_interval,
                clear_interval: browser::clear_interval,
                set_timeout: browser::set_timeout,
                clear_timeout: browser::clear_timeout,
            })
            .map_err(|_| SchedulerError::AlreadySet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{cell::Cell, rc::Rc};

    #[test]
    fn microtask_runs_synchronously_without_init() {
        let ran = Rc::new(Cell::new(false));
        let ran2 = ran.clone();
        Scheduler::queue_microtask(move || ran2.set(true));
        assert!(ran.get());
    }

    #[test]
    fn animation_frame_waits_for_explicit_tick() {
        let ran = Rc::new(Cell::new(false));
        let ran2 = ran.clone();
        Scheduler::request_animation_frame(move || ran2.set(true));
        assert!(!ran.get(), "callback must not run before the frame is driven");
        let count = Scheduler::run_animation_frame();
        assert_eq!(count, 1);
        assert!(ran.get());
    }

    #[test]
    fn cancelled_animation_frame_does_not_run() {
        let ran = Rc::new(Cell::new(false));
        let ran2 = ran.clone();
        let id = Scheduler::request_animation_frame(move || ran2.set(true));
        Scheduler::cancel_animation_frame(id);
        Scheduler::run_animation_frame();
        assert!(!ran.get());
    }

    #[test]
    fn timeout_fires_once_time_has_elapsed() {
        let count = Rc::new(Cell::new(0));
        let count2 = count.clone();
        Scheduler::set_timeout(move || count2.set(count2.get() + 1), Duration::from_millis(100));
        Scheduler::advance(Duration::from_millis(50));
        assert_eq!(count.get(), 0);
        Scheduler::advance(Duration::from_millis(50));
        assert_eq!(count.get(), 1);
        Scheduler::advance(Duration::from_millis(1000));
        assert_eq!(count.get(), 1, "a timeout never repeats");
    }

    #[test]
    fn interval_repeats_on_its_period() {
        let count = Rc::new(Cell::new(0));
        let count2 = count.clone();
        let id = Scheduler::set_interval(move || count2.set(count2.get() + 1), Duration::from_millis(10));
        Scheduler::advance(Duration::from_millis(35));
        assert_eq!(count.get(), 3);
        Scheduler::clear_interval(id);
        Scheduler::advance(Duration::from_millis(100));
        assert_eq!(count.get(), 3, "a cleared interval stops firing");
    }
}
