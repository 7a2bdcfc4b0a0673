//! Plans any-angle routes through an [`Environment`] using a Theta* search.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::f64::consts::FRAC_PI_2;

use log::{debug, info, trace, warn};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use util::maths::norm;

use super::{line_of_sight, NavError, Route};
use crate::env::{Cell, Environment};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Expansion order of a cell's neighbours.
const NEIGHBOURS: [(i64, i64); 4] = [(1, 0), (0, -1), (-1, 0), (0, 1)];

// -----------------------------------------------------------------------------------------------
// STRUCTS
// -----------------------------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PathPlanner {
    params: PathPlannerParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathPlannerParams {
    /// Number of parallel rays cast across the clearance band when checking line of sight.
    pub num_rays: usize,
}

/// Summary of a single leg search.
#[derive(Debug, Clone, Serialize)]
pub struct PathPlannerReport {
    pub from: Cell,
    pub to: Cell,

    /// Number of cells moved into the closed set.
    pub num_expanded: usize,

    /// Number of waypoints in the leg, zero if no path was found.
    pub num_waypoints: usize,
}

/// Working state of a single Theta* search.
struct Search<'a> {
    env: &'a Environment,
    goal: Cell,
    width: f64,
    num_rays: usize,

    /// Best known traversal cost from the start, indexed `[[y, x]]`.
    costs: Array2<f64>,
    parents: Array2<Option<Cell>>,

    /// Insertion ordered, ties are broken towards earlier entries.
    open: Vec<Cell>,
    in_open: Array2<bool>,
    closed: Array2<bool>,
}

// -----------------------------------------------------------------------------------------------
// IMPLS
// -----------------------------------------------------------------------------------------------

impl Default for PathPlannerParams {
    fn default() -> Self {
        Self { num_rays: 11 }
    }
}

impl PathPlanner {
    pub fn new(params: PathPlannerParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &PathPlannerParams {
        &self.params
    }

    /// Plan a route from the start through every goal.
    ///
    /// Returns an empty route if the input is degenerate or any goal is unreachable, see
    /// [`PathPlanner::try_plan`] for the reason.
    ///
    /// Units: `width` in tiles
    pub fn plan(
        &self,
        env: &Environment,
        start: Option<Cell>,
        goals: &[Cell],
        width: f64,
    ) -> Route {
        match self.try_plan(env, start, goals, width) {
            Ok(r) => r,
            Err(e) => {
                warn!("Route planning failed: {}", e);
                Route::new()
            }
        }
    }

    /// Plan a route from the start through every goal.
    ///
    /// Goals are visited greedily, the next goal is always the unvisited one closest in a straight
    /// line to the current position, with ties going to the earliest in `goals`. This does not
    /// guarantee the shortest overall tour.
    ///
    /// Units: `width` in tiles
    pub fn try_plan(
        &self,
        env: &Environment,
        start: Option<Cell>,
        goals: &[Cell],
        width: f64,
    ) -> Result<Route, NavError> {
        let start =
            start.ok_or_else(|| NavError::DegenerateInput("no start cell is set".into()))?;

        if goals.is_empty() {
            return Err(NavError::DegenerateInput("no goal cells are set".into()));
        }

        for cell in std::iter::once(&start).chain(goals.iter()) {
            if env.get_tile(cell.x, cell.y).is_err() {
                return Err(NavError::DegenerateInput(format!(
                    "cell {} is outside the environment",
                    cell
                )));
            }
        }

        if !(width.is_finite() && width >= 0.0) {
            return Err(NavError::DegenerateInput(format!(
                "invalid clearance width {}",
                width
            )));
        }

        info!(
            "Planning route from {} through {} goal(s) with clearance {:.3} tiles",
            start,
            goals.len(),
            width
        );

        let mut route = vec![start];
        let mut current = start;
        let mut remaining: Vec<Cell> = goals.to_vec();

        while !remaining.is_empty() {
            let next_idx = nearest_goal(current, &remaining);
            let next = remaining.remove(next_idx);

            let (leg, report) = self.plan_leg(env, current, next, width);
            debug!("Leg report: {:?}", report);

            let leg = leg?;
            for cell in leg {
                if route.last() != Some(&cell) {
                    route.push(cell);
                }
            }

            current = next;
        }

        info!("Route found with {} waypoints", route.len());

        Ok(route)
    }

    /// Plan a single leg between two cells.
    ///
    /// The returned leg begins at `start` and ends at `goal`. If they are the same cell the leg is
    /// just that cell.
    pub fn plan_leg(
        &self,
        env: &Environment,
        start: Cell,
        goal: Cell,
        width: f64,
    ) -> (Result<Route, NavError>, PathPlannerReport) {
        let mut report = PathPlannerReport {
            from: start,
            to: goal,
            num_expanded: 0,
            num_waypoints: 0,
        };

        if start == goal {
            report.num_waypoints = 1;
            return (Ok(vec![start]), report);
        }

        let mut search = Search::new(env, start, goal, width, self.params.num_rays);

        while let Some(cell) = search.poll() {
            if cell == goal {
                break;
            }

            search.closed[(cell.y, cell.x)] = true;
            report.num_expanded += 1;
            trace!("Expanding {}", cell);

            for &(dx, dy) in NEIGHBOURS.iter() {
                let neighbour = match cell.offset(dx, dy) {
                    Some(n) => n,
                    None => continue,
                };

                match env.get_tile(neighbour.x, neighbour.y) {
                    Ok(t) if !t.is_obstacle() => (),
                    _ => continue,
                }

                if !search.closed[(neighbour.y, neighbour.x)] {
                    search.update_vertex(cell, neighbour);
                }
            }
        }

        let result = search.reconstruct(start);
        if let Ok(ref route) = result {
            report.num_waypoints = route.len();
        }

        (result, report)
    }

    /// Check the clearance band between two cells using this planner's ray count.
    ///
    /// Units: `width` in tiles
    pub fn line_of_sight(&self, env: &Environment, a: Cell, b: Cell, width: f64) -> bool {
        line_of_sight(env, a, b, width, self.params.num_rays)
    }
}

impl<'a> Search<'a> {
    fn new(env: &'a Environment, start: Cell, goal: Cell, width: f64, num_rays: usize) -> Self {
        let (w, h) = env.size();

        let mut search = Self {
            env,
            goal,
            width,
            num_rays,
            costs: Array2::from_elem((h, w), f64::INFINITY),
            parents: Array2::from_elem((h, w), None),
            open: vec![start],
            in_open: Array2::from_elem((h, w), false),
            closed: Array2::from_elem((h, w), false),
        };

        search.costs[(start.y, start.x)] = 0.0;
        search.parents[(start.y, start.x)] = Some(start);
        search.in_open[(start.y, start.x)] = true;

        search
    }

    /// Remove and return the open cell with the lowest cost towards the goal.
    fn poll(&mut self) -> Option<Cell> {
        let mut best: Option<(usize, f64)> = None;

        for (i, cell) in self.open.iter().enumerate() {
            let cost = self.cost_via(*cell, self.goal);
            match best {
                Some((_, c)) if cost >= c => (),
                _ => best = Some((i, cost)),
            }
        }

        let (idx, _) = best?;
        let cell = self.open.remove(idx);
        self.in_open[(cell.y, cell.x)] = false;

        Some(cell)
    }

    /// Try to improve the neighbour `b` of the expanded cell `a`.
    ///
    /// If `b` is visible from `a`'s parent the parent is tried as `b`'s parent, otherwise `a` is.
    /// Nothing is updated if `b` isn't visible from `a` at all.
    fn update_vertex(&mut self, a: Cell, b: Cell) {
        if !line_of_sight(self.env, a, b, self.width, self.num_rays) {
            return;
        }

        let parent = self.parents[(a.y, a.x)].unwrap_or(a);

        let via = if line_of_sight(self.env, parent, b, self.width, self.num_rays) {
            parent
        } else {
            a
        };

        let cost = self.cost_via(via, b);
        if cost < self.costs[(b.y, b.x)] {
            self.costs[(b.y, b.x)] = cost;
            self.parents[(b.y, b.x)] = Some(via);

            if !self.in_open[(b.y, b.x)] {
                self.open.push(b);
                self.in_open[(b.y, b.x)] = true;
            }
        }
    }

    /// Cost of reaching `b` by a straight segment from `a`.
    fn cost_via(&self, a: Cell, b: Cell) -> f64 {
        self.costs[(a.y, a.x)] + angular_penalty(a, b) + distance(a, b)
    }

    /// Follow parents back from the goal.
    fn reconstruct(&self, start: Cell) -> Result<Route, NavError> {
        let not_found = NavError::PathNotFound {
            from: start,
            to: self.goal,
        };

        let mut reverse = vec![self.goal];
        let mut cell = self.goal;

        while cell != start {
            cell = match self.parents[(cell.y, cell.x)] {
                Some(p) if p != cell => p,
                _ => return Err(not_found),
            };
            reverse.push(cell);

            if reverse.len() > self.costs.len() {
                return Err(not_found);
            }
        }

        reverse.reverse();
        Ok(reverse)
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Penalty for the direction of travel between two cells, the absolute angle of the segment to
/// the x axis folded into `[0, pi/2]`.
fn angular_penalty(a: Cell, b: Cell) -> f64 {
    let dx = b.x as f64 - a.x as f64;
    let dy = b.y as f64 - a.y as f64;

    if dx == 0.0 {
        FRAC_PI_2
    } else {
        (dy / dx).atan().abs()
    }
}

fn distance(a: Cell, b: Cell) -> f64 {
    norm(&a.as_f64(), &b.as_f64()).unwrap_or(f64::INFINITY)
}

/// Index of the goal nearest to `from`, the first one wins ties.
fn nearest_goal(from: Cell, goals: &[Cell]) -> usize {
    let mut best = (0, f64::INFINITY);

    for (i, goal) in goals.iter().enumerate() {
        let d = distance(from, *goal);
        if d < best.1 {
            best = (i, d);
        }
    }

    best.0
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
