use anyhow::{Result, bail};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Lifecycle of the step driver.
///
/// Idle → Running on `start`; Running ⇄ Paused via `pause`/`resume`;
/// any state → ShuttingDown on `shutdown` (terminal).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    Paused,
    ShuttingDown,
}

/// The step function; returning `false` stops the cadence and parks the
/// scheduler back in Idle.
pub type StepFn = Box<dyn FnMut() -> bool + Send>;

struct Gate {
    state: SchedulerState,
    interval: Duration,
}

struct Inner {
    gate: Mutex<Gate>,
    changed: Condvar,
    // Held for the full duration of an invocation: step functions are
    // single-flight even against `step_once_now` from another thread.
    step_fn: Mutex<Option<StepFn>>,
}

/// Pausable step driver.
///
/// A single background worker invokes the step function on a repeating
/// cadence. The pause gate is a mutex/condvar pair checked immediately
/// before each invocation, so `pause()` guarantees no new step begins
/// while an in-flight step runs to completion. All control calls are
/// safe from any thread.
pub struct Scheduler {
    inner: Arc<Inner>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                gate: Mutex::new(Gate {
                    state: SchedulerState::Idle,
                    interval: Duration::from_millis(60),
                }),
                changed: Condvar::new(),
                step_fn: Mutex::new(None),
            }),
            worker: Mutex::new(None),
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.inner.gate.lock().unwrap().state
    }

    pub fn is_running(&self) -> bool {
        self.state() == SchedulerState::Running
    }

    /// Begin invoking `step_fn` repeatedly with `interval` between
    /// invocations. If the scheduler is already running, the cadence
    /// restarts with the new function and interval without spawning a
    /// second worker.
    pub fn start<F>(&self, step_fn: F, interval: Duration) -> Result<()>
    where
        F: FnMut() -> bool + Send + 'static,
    {
        {
            let mut gate = self.inner.gate.lock().unwrap();
            if gate.state == SchedulerState::ShuttingDown {
                bail!("scheduler is shut down");
            }
            *self.inner.step_fn.lock().unwrap() = Some(Box::new(step_fn));
            gate.interval = interval;
            gate.state = SchedulerState::Running;
            self.inner.changed.notify_all();
        }

        let mut worker = self.worker.lock().unwrap();
        if worker.is_none() {
            let inner = Arc::clone(&self.inner);
            *worker = Some(thread::spawn(move || worker_loop(&inner)));
        }
        Ok(())
    }

    /// Stop starting new invocations; an invocation already in progress
    /// runs to completion before the pause is observed by the worker.
    pub fn pause(&self) {
        let mut gate = self.inner.gate.lock().unwrap();
        if gate.state == SchedulerState::Running {
            gate.state = SchedulerState::Paused;
            self.inner.changed.notify_all();
        }
    }

    /// Release a worker blocked by `pause()`.
    pub fn resume(&self) {
        let mut gate = self.inner.gate.lock().unwrap();
        if gate.state == SchedulerState::Paused {
            gate.state = SchedulerState::Running;
            self.inner.changed.notify_all();
        }
    }

    /// Change the delay between subsequent invocations. An in-flight
    /// delay or invocation is not affected.
    pub fn set_interval(&self, interval: Duration) {
        self.inner.gate.lock().unwrap().interval = interval;
    }

    /// Invoke the step function once, synchronously, bypassing the
    /// cadence. Rejected while the scheduler is actively running.
    pub fn step_once_now(&self) -> Result<()> {
        {
            let gate = self.inner.gate.lock().unwrap();
            if gate.state == SchedulerState::Running {
                bail!("scheduler is actively running; pause it first");
            }
            if gate.state == SchedulerState::ShuttingDown {
                bail!("scheduler is shut down");
            }
        }
        let mut slot = self.inner.step_fn.lock().unwrap();
        match slot.as_mut() {
            Some(step_fn) => {
                step_fn();
                Ok(())
            }
            None => bail!("scheduler has not been started"),
        }
    }

    /// Terminal and idempotent: no further scheduling is accepted, and
    /// the worker is joined once the current invocation (if any) ends.
    pub fn shutdown(&self) {
        {
            let mut gate = self.inner.gate.lock().unwrap();
            gate.state = SchedulerState::ShuttingDown;
            self.inner.changed.notify_all();
        }
        if let Some(handle) = self.worker.lock().unwrap().take() {
            let _ = handle.join();
        }
    }

    /// Block until the cadence stops on its own (the step function
    /// returned `false`) or the scheduler is shut down.
    pub fn wait_idle(&self) {
        let mut gate = self.inner.gate.lock().unwrap();
        while matches!(
            gate.state,
            SchedulerState::Running | SchedulerState::Paused
        ) {
            gate = self.inner.changed.wait(gate).unwrap();
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(inner: &Inner) {
    loop {
        // Gate check immediately before each invocation.
        {
            let mut gate = inner.gate.lock().unwrap();
            loop {
                match gate.state {
                    SchedulerState::Running => break,
                    SchedulerState::ShuttingDown => return,
                    SchedulerState::Paused | SchedulerState::Idle => {
                        gate = inner.changed.wait(gate).unwrap();
                    }
                }
            }
        }

        let keep_going = {
            let mut slot = inner.step_fn.lock().unwrap();
            match slot.as_mut() {
                Some(step_fn) => step_fn(),
                None => true,
            }
        };
        if !keep_going {
            let mut gate = inner.gate.lock().unwrap();
            if gate.state == SchedulerState::Running {
                gate.state = SchedulerState::Idle;
            }
            inner.changed.notify_all();
            continue;
        }

        // Cadence delay; a state change wakes the worker early so
        // pause/shutdown take effect by the next tick boundary.
        let gate = inner.gate.lock().unwrap();
        if gate.state == SchedulerState::Running {
            let interval = gate.interval;
            let _ = inner.changed.wait_timeout(gate, interval).unwrap();
        }
    }
}
