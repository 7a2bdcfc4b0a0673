//! Translates routes into motion commands

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::collections::HashSet;

use comms_if::cmd::Command;
use log::debug;
use util::maths::{angle_to_dir, norm, signed_angle_between};

use super::Params;
use crate::{env::Cell, loco_ctrl};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Trajectory control, converts routes into command sequences.
#[derive(Debug, Clone)]
pub struct TrajCtrl {
    params: Params,

    /// Units: meters/second
    max_speed_ms: f64,

    /// Units: meters
    tile_size_m: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TrajCtrl {
    pub fn new(params: Params, loco_params: &loco_ctrl::Params, tile_size_m: f64) -> Self {
        Self {
            params,
            max_speed_ms: loco_params.max_speed_ms,
            tile_size_m,
        }
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Translate a route into commands.
    ///
    /// The rover is assumed to start on the first waypoint facing `start_heading_rad`. Routes
    /// with fewer than two waypoints produce no commands.
    pub fn translate(
        &self,
        route: &[Cell],
        goals: &[Cell],
        start_heading_rad: f64,
        end_heading_rad: Option<f64>,
    ) -> Vec<Command> {
        let mut cmds = Vec::new();

        if route.len() < 2 {
            return cmds;
        }

        let last_goal_idx = route.iter().rposition(|c| goals.contains(c));
        let mut mined: HashSet<Cell> = HashSet::new();

        let mut heading_rad = start_heading_rad;

        for (i, pair) in route.windows(2).enumerate() {
            let (from, to) = (pair[0], pair[1]);

            let dx = to.x as f64 - from.x as f64;
            let dy = to.y as f64 - from.y as f64;

            let turn_rad = signed_angle_between(angle_to_dir(heading_rad), (dx, dy));
            if turn_rad != 0.0 {
                cmds.push(Command::rotate(-turn_rad, self.params.rotate_duration_s));
            }

            let distance_m = norm(&from.as_f64(), &to.as_f64()).unwrap_or(0.0) * self.tile_size_m;
            cmds.push(Command::move_dist(
                distance_m,
                distance_m / self.max_speed_ms,
            ));

            heading_rad = dy.atan2(dx);

            debug!(
                "Segment {} -> {}: turn {:.4} rad, move {:.4} m",
                from, to, -turn_rad, distance_m
            );

            if goals.contains(&to) && mined.insert(to) {
                // The final goal is mined facing the other way to the rest
                let rotation_rad = if Some(i + 1) == last_goal_idx {
                    -self.params.mine_rotation_rad
                } else {
                    self.params.mine_rotation_rad
                };

                cmds.push(Command::rotate(rotation_rad, self.params.rotate_duration_s));
                cmds.push(Command::mine(self.params.mine_duration_s));
                cmds.push(Command::rotate(-rotation_rad, self.params.rotate_duration_s));
            }
        }

        if let Some(end_rad) = end_heading_rad {
            let turn_rad = signed_angle_between(angle_to_dir(heading_rad), angle_to_dir(end_rad));
            if turn_rad != 0.0 {
                cmds.push(Command::rotate(-turn_rad, self.params.rotate_duration_s));
            }
        }

        cmds
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::cmd::CmdKind;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

    fn traj_ctrl() -> TrajCtrl {
        let loco_params = loco_ctrl::Params {
            max_speed_ms: 0.5,
            ..loco_ctrl::Params::default()
        };
        TrajCtrl::new(Params::default(), &loco_params, 0.1)
    }

    fn cells(points: &[(usize, usize)]) -> Vec<Cell> {
        points.iter().map(|&(x, y)| Cell::new(x, y)).collect()
    }

    fn rotate_angle(cmd: &Command) -> f64 {
        match cmd.kind {
            CmdKind::Rotate { angle_rad } => angle_rad,
            k => panic!("Expected a rotate, got {:?}", k),
        }
    }

    #[test]
    fn test_short_routes() {
        assert!(traj_ctrl().translate(&[], &[], 0.0, Some(1.0)).is_empty());
        assert!(traj_ctrl()
            .translate(&cells(&[(2, 2)]), &cells(&[(2, 2)]), 0.0, Some(1.0))
            .is_empty());
    }

    #[test]
    fn test_aligned_straight_move() {
        let cmds = traj_ctrl().translate(&cells(&[(0, 0), (3, 0)]), &[], 0.0, Some(0.0));

        assert_eq!(cmds.len(), 1);
        match cmds[0].kind {
            CmdKind::Move { distance_m } => assert!((distance_m - 0.3).abs() < 1e-12),
            k => panic!("Expected a move, got {:?}", k),
        }
        assert!((cmds[0].duration_s - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_rotate_then_move_per_segment() {
        let route = cells(&[(0, 0), (2, 4), (4, 4)]);
        let cmds = traj_ctrl().translate(&route, &[], 0.0, Some(FRAC_PI_2));

        let kinds: Vec<bool> = cmds.iter().map(|c| c.is_rotate()).collect();
        assert_eq!(kinds, vec![true, false, true, false, true]);
        assert!(cmds[1].is_move() && cmds[3].is_move());

        // Turn to face (2, 4), back to +x, then up to the end heading
        let first = 4f64.atan2(2.0);
        assert!((rotate_angle(&cmds[0]) - first).abs() < 1e-9);
        assert!((rotate_angle(&cmds[2]) + first).abs() < 1e-9);
        assert!((rotate_angle(&cmds[4]) - FRAC_PI_2).abs() < 1e-9);

        for c in cmds.iter().filter(|c| c.is_rotate()) {
            assert_eq!(c.duration_s, 0.2);
        }
    }

    #[test]
    fn test_no_final_rotate_without_end_heading() {
        let route = cells(&[(0, 0), (1, 1)]);
        let cmds = traj_ctrl().translate(&route, &[], 0.0, None);

        assert_eq!(cmds.len(), 2);
        assert!((rotate_angle(&cmds[0]) - FRAC_PI_4).abs() < 1e-9);
    }

    #[test]
    fn test_mining_sequence() {
        let route = cells(&[(0, 0), (2, 0), (2, 3)]);
        let goals = cells(&[(2, 0), (2, 3)]);
        let cmds = traj_ctrl().translate(&route, &goals, 0.0, None);

        let mine_idxs: Vec<usize> = cmds
            .iter()
            .enumerate()
            .filter(|(_, c)| c.kind == CmdKind::Mine)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(mine_idxs.len(), 2);

        for &i in mine_idxs.iter() {
            assert_eq!(cmds[i].duration_s, 0.5);
            assert_eq!(rotate_angle(&cmds[i - 1]), -rotate_angle(&cmds[i + 1]));
        }

        // First goal turns anticlockwise, the last clockwise
        assert_eq!(rotate_angle(&cmds[mine_idxs[0] - 1]), FRAC_PI_2);
        assert_eq!(rotate_angle(&cmds[mine_idxs[1] - 1]), -FRAC_PI_2);

        // Goals visited twice are only mined once
        let route = cells(&[(0, 0), (2, 0), (0, 0), (2, 0)]);
        let cmds = traj_ctrl().translate(&route, &cells(&[(2, 0)]), 0.0, None);
        assert_eq!(cmds.iter().filter(|c| c.kind == CmdKind::Mine).count(), 1);
    }
}
