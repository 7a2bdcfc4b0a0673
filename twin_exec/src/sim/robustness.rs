//! Searches for the narrowest route clearance which is safe under motor noise

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::{
    sync::atomic::{AtomicUsize, Ordering},
    thread,
};

use comms_if::cmd::Command;
use log::{debug, error, info, warn};
use serde::Serialize;

use super::{critical_value, Params, SimError};
use crate::{
    cmd_exec::CmdExecutor,
    env::{Cell, Environment},
    loco_ctrl::{self, Rover, RoverPose},
    nav::{PathPlanner, Route},
    traj_ctrl::{self, TrajCtrl},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Runs noisy trials of planned routes to find a safe clearance width.
#[derive(Debug, Clone)]
pub struct RobustnessSim {
    params: Params,
    loco_params: loco_ctrl::Params,
    traj_params: traj_ctrl::Params,
    planner: PathPlanner,
}

/// A route which passed the hypothesis test.
#[derive(Debug, Clone, Serialize)]
pub struct AcceptedRoute {
    /// Units: meters
    pub clearance_width_m: f64,

    pub route: Route,

    pub cmds: Vec<Command>,

    /// Number of trials which failed at this width.
    pub num_failures: usize,

    /// Failures had to stay below this for the width to be accepted.
    pub critical_value: usize,
}

// ---------------------------------------------------------------------------
// ENUMS
// ---------------------------------------------------------------------------

/// Result of a clearance search.
#[derive(Debug, Clone, Serialize)]
pub enum SimOutcome {
    /// A width was found at which the route is safe.
    Accepted(AcceptedRoute),

    /// The clearance grew until no route could be planned.
    NoFeasibleRoute {
        /// The width at which planning failed.
        ///
        /// Units: meters
        clearance_width_m: f64,
    },

    /// The clearance grew past the configured maximum without being accepted.
    WidthLimitReached {
        /// The last width tested.
        ///
        /// Units: meters
        clearance_width_m: f64,
    },
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl RobustnessSim {
    pub fn new(
        params: Params,
        loco_params: loco_ctrl::Params,
        traj_params: traj_ctrl::Params,
        planner: PathPlanner,
    ) -> Result<Self, SimError> {
        params.validate()?;
        loco_params.validate().map_err(SimError::LocoCtrlError)?;

        Ok(Self {
            params,
            loco_params,
            traj_params,
            planner,
        })
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Find the narrowest safe clearance width for the environment's route.
    ///
    /// Starting at the minimum width, the route is replanned at each width and played
    /// `num_trials` times under noise. The first width with fewer failures than the critical
    /// value is accepted. The environment's route cache holds the last planned route afterwards.
    pub fn run(&self, env: &mut Environment) -> Result<SimOutcome, SimError> {
        let crit = match critical_value(
            self.params.num_trials,
            self.params.max_failure_prob,
            self.params.significance,
        ) {
            Ok(c) => c,
            Err(e) => {
                error!("Aborting robustness run: {}", e);
                return Err(e);
            }
        };

        info!(
            "Validating routes over {} trials, rejecting at {} or more failures",
            self.params.num_trials, crit
        );

        let mut last_width_m = self.params.min_clearance_width_m;
        let mut step: u32 = 0;

        loop {
            let width_m =
                self.params.min_clearance_width_m + step as f64 * self.params.width_increment_m;

            // Allow for rounding in the accumulated width
            if width_m > self.params.max_clearance_width_m + 1e-9 {
                warn!(
                    "No safe route found up to the clearance limit of {:.3} m",
                    self.params.max_clearance_width_m
                );
                return Ok(SimOutcome::WidthLimitReached {
                    clearance_width_m: last_width_m,
                });
            }
            last_width_m = width_m;

            env.invalidate_route();
            let route = env.get_route(&self.planner, width_m, true);

            if route.is_empty() {
                warn!("No route exists with a clearance of {:.3} m", width_m);
                return Ok(SimOutcome::NoFeasibleRoute {
                    clearance_width_m: width_m,
                });
            }

            let traj_ctrl = TrajCtrl::new(
                self.traj_params.clone(),
                &self.loco_params,
                env.tile_size_m(),
            );
            let (start_heading, end_heading) = env.start_end_headings();
            let cmds = traj_ctrl.translate(
                &route,
                env.goals(),
                start_heading.unwrap_or(0.0),
                end_heading,
            );

            let num_failures = self.run_trials(env, route[0], &cmds, crit);

            info!(
                "Clearance {:.3} m: {} waypoints, {} commands, {} failures",
                width_m,
                route.len(),
                cmds.len(),
                num_failures
            );

            if num_failures < crit {
                return Ok(SimOutcome::Accepted(AcceptedRoute {
                    clearance_width_m: width_m,
                    route,
                    cmds,
                    num_failures,
                    critical_value: crit,
                }));
            }

            step += 1;
        }
    }

    /// Run every trial, returning the number which failed.
    ///
    /// Trials are spread across the worker threads. Once `crit` failures have been seen the width
    /// is rejected, so the remaining trials are skipped.
    fn run_trials(&self, env: &Environment, start: Cell, cmds: &[Command], crit: usize) -> usize {
        let num_trials = self.params.num_trials;
        let num_workers = self.params.num_workers.max(1).min(num_trials);
        let failures = AtomicUsize::new(0);

        let (x_m, y_m) = env.cell_centre_m(start);
        let start_pose = RoverPose::new(x_m, y_m, env.start_end_headings().0.unwrap_or(0.0));

        thread::scope(|s| {
            for worker in 0..num_workers {
                let failures = &failures;
                s.spawn(move || {
                    for trial in (worker..num_trials).step_by(num_workers) {
                        if failures.load(Ordering::Relaxed) >= crit {
                            break;
                        }

                        let seed = self.params.seed.wrapping_add(trial as u64);
                        if !self.run_trial(env, start_pose, cmds, seed) {
                            failures.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                });
            }
        });

        failures.load(Ordering::Relaxed)
    }

    /// Play the commands on a fresh noisy rover, returning `true` if it stayed safe throughout.
    fn run_trial(
        &self,
        env: &Environment,
        start_pose: RoverPose,
        cmds: &[Command],
        seed: u64,
    ) -> bool {
        let mut rover = match Rover::new(&self.loco_params, start_pose, Some(seed)) {
            Ok(r) => r,
            Err(e) => {
                warn!("Could not create trial rover: {}", e);
                return false;
            }
        };

        let executor = CmdExecutor::new(&self.loco_params);
        executor.queue().extend(cmds.iter().copied());

        while !executor.is_empty() {
            executor.update(&mut rover);

            if !footprint_is_safe(env, &rover) {
                let pose = rover.pose();
                debug!(
                    "Trial {} failed at ({:.3}, {:.3})",
                    seed, pose.x_m, pose.y_m
                );
                return false;
            }
        }

        true
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Check the rover's centre and the four corners of its axis aligned square footprint are all
/// on navigable tiles.
pub fn footprint_is_safe(env: &Environment, rover: &Rover) -> bool {
    let (x_m, y_m) = rover.position_m();
    let half_m = rover.params().axle_distance_m / 2.0;

    [
        (0.0, 0.0),
        (half_m, half_m),
        (half_m, -half_m),
        (-half_m, half_m),
        (-half_m, -half_m),
    ]
    .iter()
    .all(|(dx, dy)| env.is_navigable_position(x_m + dx, y_m + dy))
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        env::{EnvParams, EnvType},
        nav::PathPlannerParams,
    };

    /// A walled arena with the start and goal well away from the walls.
    fn arena() -> Environment {
        let mut env = Environment::new(12, 12, EnvParams::default()).unwrap();
        for i in 0..12 {
            env.set_tile(i, 0, EnvType::Obstacle).unwrap();
            env.set_tile(i, 11, EnvType::Obstacle).unwrap();
            env.set_tile(0, i, EnvType::Obstacle).unwrap();
            env.set_tile(11, i, EnvType::Obstacle).unwrap();
        }
        env.set_start_and_goals(Some(Cell::new(3, 3)), vec![Cell::new(8, 8)])
            .unwrap();
        env
    }

    /// The arena with a pillar beside the diagonal, narrow routes pass close enough to clip it.
    fn pillar_arena() -> Environment {
        let mut env = arena();
        env.set_tile(5, 7, EnvType::Obstacle).unwrap();
        env
    }

    fn sim(params: Params, noise_std_ms: f64) -> RobustnessSim {
        let loco_params = loco_ctrl::Params {
            motor_noise_std_ms: noise_std_ms,
            ..loco_ctrl::Params::default()
        };
        RobustnessSim::new(
            params,
            loco_params,
            traj_ctrl::Params::default(),
            PathPlanner::new(PathPlannerParams::default()),
        )
        .unwrap()
    }

    fn test_params() -> Params {
        Params {
            num_trials: 20,
            max_failure_prob: 0.25,
            significance: 0.05,
            num_workers: 3,
            seed: 42,
            ..Params::default()
        }
    }

    #[test]
    fn test_accepts_safe_route() {
        let mut env = arena();

        let outcome = sim(test_params(), loco_ctrl::Params::default().motor_noise_std_ms)
            .run(&mut env)
            .unwrap();

        match outcome {
            SimOutcome::Accepted(a) => {
                assert_eq!(a.clearance_width_m, test_params().min_clearance_width_m);
                assert_eq!(a.route.first(), Some(&Cell::new(3, 3)));
                assert_eq!(a.route.last(), Some(&Cell::new(8, 8)));
                assert_eq!(a.critical_value, 2);
                assert!(a.num_failures < 2);
                assert!(a.cmds.iter().any(|c| c.is_move()));
                assert_eq!(env.route(), Some(&a.route));
            }
            o => panic!("Expected the route to be accepted, got {:?}", o),
        }
    }

    #[test]
    fn test_width_limit() {
        let mut env = arena();
        let params = Params {
            max_clearance_width_m: test_params().min_clearance_width_m + 0.025,
            ..test_params()
        };

        // The rover can't possibly stay in the arena with this much noise
        let outcome = sim(params, 50.0).run(&mut env).unwrap();

        match outcome {
            SimOutcome::WidthLimitReached { clearance_width_m } => {
                assert!((clearance_width_m - 0.122).abs() < 1e-9)
            }
            o => panic!("Expected the width limit to be reached, got {:?}", o),
        }
    }

    #[test]
    fn test_no_feasible_route() {
        let mut env = arena();
        // Seal off the goal
        for &(x, y) in &[(7, 8), (9, 8), (8, 7), (8, 9)] {
            env.set_tile(x, y, EnvType::Obstacle).unwrap();
        }

        let outcome = sim(test_params(), 0.0).run(&mut env).unwrap();

        assert!(matches!(outcome, SimOutcome::NoFeasibleRoute { .. }));
    }

    #[test]
    fn test_invalid_critical_value() {
        let mut env = arena();
        let params = Params {
            max_failure_prob: 0.0,
            ..test_params()
        };

        assert!(matches!(
            sim(params, 0.0).run(&mut env),
            Err(SimError::InvalidCriticalValue { .. })
        ));

        // The run stops before anything is planned
        assert!(env.route().is_none());
    }

    #[test]
    fn test_stricter_failure_prob_never_narrower() {
        let run = |mut env: Environment, max_failure_prob, noise_std_ms| {
            let params = Params {
                max_failure_prob,
                ..test_params()
            };
            match sim(params, noise_std_ms).run(&mut env).unwrap() {
                SimOutcome::Accepted(a) => a.clearance_width_m,
                o => panic!("Expected a width to be accepted, got {:?}", o),
            }
        };

        let cases: [(fn() -> Environment, f64); 2] = [
            (pillar_arena, 0.0),
            (arena, loco_ctrl::Params::default().motor_noise_std_ms),
        ];

        for &(env, noise) in cases.iter() {
            let strict = run(env(), 0.25, noise);
            let loose = run(env(), 0.4, noise);

            // A lower tolerable failure probability accepts a width no narrower than a higher one
            assert!(strict >= loose, "{} < {}", strict, loose);
        }

        let widened = run(pillar_arena(), 0.25, 0.0);
        assert!(widened > test_params().min_clearance_width_m + 0.025);
        assert!(widened < test_params().min_clearance_width_m + 0.035);
    }

    #[test]
    fn test_footprint() {
        let env = arena();
        let params = loco_ctrl::Params {
            motor_noise_std_ms: 0.0,
            ..loco_ctrl::Params::default()
        };
        let (x, y) = env.cell_centre_m(Cell::new(3, 3));

        let rover = Rover::new(&params, RoverPose::new(x, y, 0.0), None).unwrap();
        assert!(footprint_is_safe(&env, &rover));

        // Corner reaches into the wall
        let (x, y) = env.cell_centre_m(Cell::new(1, 1));
        let rover = Rover::new(&params, RoverPose::new(x, y, 0.0), None).unwrap();
        assert!(!footprint_is_safe(&env, &rover));
    }
}
