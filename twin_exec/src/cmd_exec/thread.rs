//! Real time command execution on a background thread

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use log::{error, info};

use super::{CmdExecError, CmdExecutor, CmdQueue};
use crate::loco_ctrl::Rover;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Runs a [`CmdExecutor`] against a shared rover once every tick period.
///
/// Commands are fed in and cancelled through [`CmdExecThread::queue`]. Observers may lock
/// [`CmdExecThread::rover`] to read the live pose.
pub struct CmdExecThread {
    queue: CmdQueue,
    rover: Arc<Mutex<Rover>>,
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CmdExecThread {
    pub fn spawn(executor: CmdExecutor, rover: Arc<Mutex<Rover>>) -> Result<Self, CmdExecError> {
        let tick_period_s = executor.tick_period_s();
        if !(tick_period_s.is_finite() && tick_period_s > 0.0) {
            return Err(CmdExecError::InvalidTickPeriod(tick_period_s));
        }
        let period = Duration::from_secs_f64(tick_period_s);

        let queue = executor.queue();
        let stop = Arc::new(AtomicBool::new(false));

        let thread_rover = rover.clone();
        let thread_stop = stop.clone();

        let handle = thread::Builder::new()
            .name("cmd_exec".into())
            .spawn(move || exec_thread(executor, period, thread_rover, thread_stop))
            .map_err(CmdExecError::ThreadSpawnError)?;

        Ok(Self {
            queue,
            rover,
            stop,
            handle,
        })
    }

    pub fn queue(&self) -> CmdQueue {
        self.queue.clone()
    }

    pub fn rover(&self) -> Arc<Mutex<Rover>> {
        self.rover.clone()
    }

    /// Stop the thread and wait for it to finish. Pending commands are left in the queue.
    pub fn stop(self) -> Result<(), CmdExecError> {
        self.stop.store(true, Ordering::Relaxed);
        self.handle.join().map_err(|_| CmdExecError::ThreadPanicked)
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn exec_thread(
    executor: CmdExecutor,
    period: Duration,
    rover: Arc<Mutex<Rover>>,
    stop: Arc<AtomicBool>,
) {
    info!("Command execution thread started");

    while !stop.load(Ordering::Relaxed) {
        let cycle_start = Instant::now();

        match rover.lock() {
            Ok(mut r) => {
                executor.update(&mut r);
            }
            Err(_) => {
                error!("Rover lock poisoned, stopping command execution");
                break;
            }
        }

        let cycle_dur = Instant::now() - cycle_start;
        if cycle_dur < period {
            thread::sleep(period - cycle_dur);
        }
    }

    info!("Command execution thread stopped");
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::loco_ctrl::{self, RoverPose};
    use comms_if::cmd::Command;

    #[test]
    fn test_exec_thread() {
        let params = loco_ctrl::Params {
            motor_noise_std_ms: 0.0,
            ..loco_ctrl::Params::default()
        };
        let rover = Arc::new(Mutex::new(
            Rover::new(&params, RoverPose::default(), None).unwrap(),
        ));

        let exec_thread = CmdExecThread::spawn(CmdExecutor::new(&params), rover).unwrap();
        let queue = exec_thread.queue();

        queue.push(Command::move_dist(0.05, 0.05));

        let start = Instant::now();
        while !queue.is_empty() {
            assert!(
                start.elapsed() < Duration::from_secs(10),
                "Commands never finished"
            );
            thread::sleep(Duration::from_millis(5));
        }

        let x = exec_thread.rover().lock().unwrap().position_m().0;
        assert!((x - 0.05).abs() <= 0.001 + 1e-9, "x = {}", x);

        // A cancelled command stops the rover where it is
        queue.push(Command::move_dist(100.0, 100.0));
        thread::sleep(Duration::from_millis(20));
        queue.clear();
        let x = exec_thread.rover().lock().unwrap().position_m().0;
        thread::sleep(Duration::from_millis(20));
        assert_eq!(exec_thread.rover().lock().unwrap().position_m().0, x);

        exec_thread.stop().unwrap();
    }

    #[test]
    fn test_invalid_tick_period() {
        let params = loco_ctrl::Params {
            motor_noise_std_ms: 0.0,
            ..loco_ctrl::Params::default()
        };
        let rover = Arc::new(Mutex::new(
            Rover::new(&params, RoverPose::default(), None).unwrap(),
        ));

        for &tick_period_s in &[0.0, -0.001, f64::NAN] {
            let bad_params = loco_ctrl::Params {
                tick_period_s,
                ..params
            };

            assert!(matches!(
                CmdExecThread::spawn(CmdExecutor::new(&bad_params), rover.clone()),
                Err(CmdExecError::InvalidTickPeriod(_))
            ));
        }
    }
}
