//! Tick based command executor

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::cmd::{CmdKind, Command};
use log::{debug, trace};

use super::{ActiveCmd, CmdQueue};
use crate::loco_ctrl::{self, point_turn_speeds, straight_speeds, Rover};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Executes commands from a [`CmdQueue`] one tick at a time.
#[derive(Debug, Clone)]
pub struct CmdExecutor {
    queue: CmdQueue,

    /// Units: seconds
    tick_period_s: f64,

    /// Units: meters
    axle_distance_m: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CmdExecutor {
    /// Create a new executor with an empty queue.
    pub fn new(loco_params: &loco_ctrl::Params) -> Self {
        Self::with_queue(loco_params, CmdQueue::new())
    }

    /// Create a new executor consuming from an existing queue.
    pub fn with_queue(loco_params: &loco_ctrl::Params, queue: CmdQueue) -> Self {
        Self {
            queue,
            tick_period_s: loco_params.tick_period_s,
            axle_distance_m: loco_params.axle_distance_m,
        }
    }

    /// Get a handle to the executor's queue.
    pub fn queue(&self) -> CmdQueue {
        self.queue.clone()
    }

    pub fn tick_period_s(&self) -> f64 {
        self.tick_period_s
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Execute one tick.
    ///
    /// Returns the kind of the command applied this tick, or `None` if there was nothing to do.
    pub fn update(&self, rover: &mut Rover) -> Option<CmdKind> {
        let mut state = self.queue.lock();

        if !state.current.map_or(false, |a| a.is_running()) {
            state.current = state.pending.pop_front().map(|c| self.activate(c));
        }

        let active = state.current.as_mut()?;

        match (active.cmd.kind, active.wheel_speeds_ms) {
            (_, Some((left_ms, right_ms))) => rover.motor_move(left_ms, right_ms),
            (CmdKind::SetPosition { x_m, y_m }, _) => {
                rover.set_position(x_m, y_m);
                active.remaining_s = 0.0;
            }
            (CmdKind::SetHeading { heading_rad }, _) => {
                rover.set_heading(heading_rad);
                active.remaining_s = 0.0;
            }
            _ => (),
        }

        active.remaining_s -= self.tick_period_s;

        trace!(
            "Applied {:?}, {:.4} s remaining",
            active.cmd.kind,
            active.remaining_s
        );

        Some(active.cmd.kind)
    }

    /// Make a command current.
    ///
    /// Moves and point turns are spread evenly over the command's duration, which is never less
    /// than a single tick.
    fn activate(&self, cmd: Command) -> ActiveCmd {
        let time_s = cmd.duration_s.max(self.tick_period_s);

        let wheel_speeds_ms = match cmd.kind {
            CmdKind::Move { distance_m } => Some(straight_speeds(distance_m, time_s)),
            CmdKind::Rotate { angle_rad } => {
                Some(point_turn_speeds(angle_rad, time_s, self.axle_distance_m))
            }
            CmdKind::SetWheelSpeeds { left_ms, right_ms } => Some((left_ms, right_ms)),
            CmdKind::SetPosition { .. } | CmdKind::SetHeading { .. } | CmdKind::Mine => None,
        };

        debug!("Activating {:?} for {:.3} s", cmd.kind, cmd.duration_s);

        ActiveCmd {
            cmd,
            remaining_s: cmd.duration_s,
            wheel_speeds_ms,
        }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        env::Cell,
        loco_ctrl::RoverPose,
        traj_ctrl::{self, TrajCtrl},
    };
    use std::f64::consts::FRAC_PI_2;
    use util::maths::get_ang_dist_2pi;

    fn params() -> loco_ctrl::Params {
        loco_ctrl::Params {
            motor_noise_std_ms: 0.0,
            ..loco_ctrl::Params::default()
        }
    }

    fn rover() -> Rover {
        Rover::new(&params(), RoverPose::default(), None).unwrap()
    }

    /// Run the executor until it's empty, returning the number of ticks taken.
    fn run(exec: &CmdExecutor, rover: &mut Rover) -> usize {
        let mut ticks = 0;
        while !exec.is_empty() {
            exec.update(rover);
            ticks += 1;
            assert!(ticks < 1_000_000, "Executor never emptied");
        }
        ticks
    }

    #[test]
    fn test_move_duration() {
        let exec = CmdExecutor::new(&params());
        let mut rover = rover();

        exec.queue().push(Command::move_dist(0.375, 0.375));
        let ticks = run(&exec, &mut rover);

        let expected = (0.375 / exec.tick_period_s()).round() as i64;
        assert!((ticks as i64 - expected).abs() <= 1, "took {} ticks", ticks);

        // Within one tick's worth of distance
        let (x, y) = rover.position_m();
        assert!((x - 0.375).abs() <= 0.001 + 1e-9, "x = {}", x);
        assert!(y.abs() < 1e-9);
    }

    #[test]
    fn test_translated_straight_route_duration() {
        let exec = CmdExecutor::new(&params());
        let mut rover = rover();

        // Six tiles along +x
        let route = vec![Cell::new(0, 0), Cell::new(6, 0)];
        let traj_ctrl = TrajCtrl::new(traj_ctrl::Params::default(), &params(), 0.075);
        let cmds = traj_ctrl.translate(&route, &[], 0.0, None);
        assert!(cmds.iter().all(|c| c.is_move()));

        let total_s: f64 = cmds.iter().map(|c| c.duration_s).sum();
        exec.queue().extend(cmds);
        let ticks = run(&exec, &mut rover);

        let expected = total_s / exec.tick_period_s();
        assert!(
            (ticks as f64 - expected).abs() <= 1.0 + 1e-9,
            "took {} ticks, expected {}",
            ticks,
            expected
        );
        assert!((rover.position_m().0 - 0.45).abs() <= 0.001 + 1e-9);
    }

    #[test]
    fn test_rotate_converges() {
        let exec = CmdExecutor::new(&params());
        let mut rover = rover();

        exec.queue().push(Command::rotate(FRAC_PI_2, 0.2));
        let ticks = run(&exec, &mut rover);

        assert!((ticks as i64 - 200).abs() <= 1);
        let step = FRAC_PI_2 / 200.0;
        assert!(get_ang_dist_2pi(rover.heading_rad(), FRAC_PI_2).abs() <= step + 1e-9);

        let (x, y) = rover.position_m();
        assert!(x.abs() < 1e-9 && y.abs() < 1e-9);
    }

    #[test]
    fn test_zero_duration_move() {
        let exec = CmdExecutor::new(&params());
        let mut rover = rover();

        exec.queue().push(Command::move_dist(0.2, 0.0));

        assert_eq!(run(&exec, &mut rover), 1);
        assert!((rover.position_m().0 - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_instant_cmds() {
        let exec = CmdExecutor::new(&params());
        let mut rover = rover();

        exec.queue().extend(vec![
            Command::set_position(1.5, -2.0),
            Command::set_heading(0.7),
        ]);

        assert!(matches!(
            exec.update(&mut rover),
            Some(CmdKind::SetPosition { .. })
        ));
        assert_eq!(rover.position_m(), (1.5, -2.0));
        assert!(exec.queue().current().is_none());

        assert!(matches!(
            exec.update(&mut rover),
            Some(CmdKind::SetHeading { .. })
        ));
        assert_eq!(rover.heading_rad(), 0.7);
        assert!(exec.is_empty());

        assert_eq!(exec.update(&mut rover), None);
    }

    #[test]
    fn test_wheel_speeds_and_mine() {
        let exec = CmdExecutor::new(&params());
        let mut rover = rover();

        exec.queue().extend(vec![
            Command::mine(0.01),
            Command::wheel_speeds(0.5, 0.5, 0.1),
        ]);

        for _ in 0..10 {
            assert_eq!(exec.update(&mut rover), Some(CmdKind::Mine));
        }
        assert_eq!(rover.pose(), RoverPose::default());

        run(&exec, &mut rover);

        // 1 m/s forward for 0.1 s, give or take a tick
        assert!((rover.position_m().0 - 0.1).abs() <= 0.001 + 1e-9);
    }

    #[test]
    fn test_is_empty() {
        let exec = CmdExecutor::new(&params());
        let mut rover = rover();

        assert!(exec.is_empty());

        exec.queue().push(Command::move_dist(0.01, 0.01));
        assert!(!exec.is_empty());

        // Running but nothing pending
        exec.update(&mut rover);
        assert_eq!(exec.queue().num_pending(), 0);
        assert!(!exec.is_empty());
        assert!(exec.queue().current().is_some());

        run(&exec, &mut rover);
        assert!(exec.is_empty());
    }

    #[test]
    fn test_clear() {
        let exec = CmdExecutor::new(&params());
        let mut rover = rover();
        let queue = exec.queue();

        queue.extend(vec![
            Command::move_dist(1.0, 1.0),
            Command::rotate(1.0, 0.2),
        ]);
        for _ in 0..10 {
            exec.update(&mut rover);
        }

        queue.clear();
        assert!(exec.is_empty());

        let pose = rover.pose();
        assert_eq!(exec.update(&mut rover), None);
        assert_eq!(rover.pose(), pose);
    }
}
