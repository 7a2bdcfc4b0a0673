//! Implements the [`Environment`] type

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{fs::File, io::BufReader, path::Path};

use log::{debug, info, warn};
use ndarray::Array2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{Cell, EnvError, EnvParams, EnvType};
use crate::{
    loco_ctrl::Rover,
    nav::{PathPlanner, Route},
};

// ------------------------------------------------------------------------------------------------
// DATA STRUCTURES
// ------------------------------------------------------------------------------------------------

/// The rover's operating environment.
#[derive(Debug, Clone)]
pub struct Environment {
    params: EnvParams,

    /// Tile classifications, indexed `[[y, x]]`.
    tiles: Array2<EnvType>,

    start: Option<Cell>,
    goals: Vec<Cell>,

    start_heading_rad: Option<f64>,
    end_heading_rad: Option<f64>,

    rover: Option<Rover>,

    /// The last planned route, `None` if the cache is invalid.
    route: Option<Route>,
}

/// The on-disk form of an [`Environment`].
///
/// The bound rover and the route cache are runtime state and are not saved.
#[derive(Serialize, Deserialize)]
struct SerializableEnvironment {
    params: EnvParams,
    tiles: Array2<EnvType>,
    start: Option<Cell>,
    goals: Vec<Cell>,
    start_heading_rad: Option<f64>,
    end_heading_rad: Option<f64>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Environment {
    /// Create a new empty environment with the given dimensions in tiles.
    pub fn new(width: usize, height: usize, params: EnvParams) -> Result<Self, EnvError> {
        if width == 0 || height == 0 {
            return Err(EnvError::InvalidSize(width, height));
        }

        if !(params.tile_size_m.is_finite() && params.tile_size_m > 0.0) {
            return Err(EnvError::InvalidTileSize(params.tile_size_m));
        }

        Ok(Self {
            params,
            tiles: Array2::from_elem((height, width), EnvType::Empty),
            start: None,
            goals: Vec::new(),
            start_heading_rad: None,
            end_heading_rad: None,
            rover: None,
            route: None,
        })
    }

    /// Load an environment from a JSON map file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, EnvError> {
        let file = File::open(path.as_ref())?;
        let ser: SerializableEnvironment = serde_json::from_reader(BufReader::new(file))?;

        let (height, width) = ser.tiles.dim();
        let mut env = Self::new(width, height, ser.params)?;
        env.tiles = ser.tiles;
        env.start_heading_rad = ser.start_heading_rad;
        env.end_heading_rad = ser.end_heading_rad;
        env.set_start_and_goals(ser.start, ser.goals)?;

        info!(
            "Loaded {}x{} environment from {:?}",
            width,
            height,
            path.as_ref()
        );

        Ok(env)
    }

    /// Save the environment to a JSON map file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), EnvError> {
        let ser = SerializableEnvironment {
            params: self.params,
            tiles: self.tiles.clone(),
            start: self.start,
            goals: self.goals.clone(),
            start_heading_rad: self.start_heading_rad,
            end_heading_rad: self.end_heading_rad,
        };

        serde_json::to_writer_pretty(File::create(path)?, &ser)?;

        Ok(())
    }

    pub fn params(&self) -> &EnvParams {
        &self.params
    }

    pub fn tile_size_m(&self) -> f64 {
        self.params.tile_size_m
    }

    /// Get the `(width, height)` of the environment in tiles.
    pub fn size(&self) -> (usize, usize) {
        let (height, width) = self.tiles.dim();
        (width, height)
    }

    pub fn in_bounds(&self, x: i64, y: i64) -> bool {
        let (width, height) = self.size();
        x >= 0 && y >= 0 && (x as usize) < width && (y as usize) < height
    }

    pub fn get_tile(&self, x: usize, y: usize) -> Result<EnvType, EnvError> {
        self.tiles
            .get((y, x))
            .copied()
            .ok_or(EnvError::OutOfBounds {
                x: x as i64,
                y: y as i64,
            })
    }

    pub fn set_tile(&mut self, x: usize, y: usize, tile: EnvType) -> Result<(), EnvError> {
        match self.tiles.get_mut((y, x)) {
            Some(t) => {
                *t = tile;
                Ok(())
            }
            None => Err(EnvError::OutOfBounds {
                x: x as i64,
                y: y as i64,
            }),
        }
    }

    /// Check whether the tile at the signed coordinates is an obstacle.
    pub fn is_obstacle(&self, x: i64, y: i64) -> Result<bool, EnvError> {
        if !self.in_bounds(x, y) {
            return Err(EnvError::OutOfBounds { x, y });
        }

        Ok(self.tiles[(y as usize, x as usize)].is_obstacle())
    }

    /// Set the start and goal cells, marking their tiles.
    ///
    /// Tiles of a previous start and goals are returned to `Empty`. All cells are validated before
    /// anything is changed. The route cache is left untouched, call
    /// [`Environment::invalidate_route`] to force a replan.
    pub fn set_start_and_goals(
        &mut self,
        start: Option<Cell>,
        goals: Vec<Cell>,
    ) -> Result<(), EnvError> {
        for cell in start.iter().chain(goals.iter()) {
            self.get_tile(cell.x, cell.y)?;
        }

        for cell in self.start.take().iter().chain(self.goals.iter()) {
            self.tiles[(cell.y, cell.x)] = EnvType::Empty;
        }

        if let Some(s) = start {
            self.tiles[(s.y, s.x)] = EnvType::Start;
        }
        for g in goals.iter() {
            self.tiles[(g.y, g.x)] = EnvType::Goal;
        }

        self.start = start;
        self.goals = goals;

        Ok(())
    }

    pub fn start(&self) -> Option<Cell> {
        self.start
    }

    pub fn goals(&self) -> &[Cell] {
        &self.goals
    }

    pub fn set_start_heading(&mut self, heading_rad: Option<f64>) {
        self.start_heading_rad = heading_rad;
    }

    pub fn set_end_heading(&mut self, heading_rad: Option<f64>) {
        self.end_heading_rad = heading_rad;
    }

    /// Get the `(start, end)` headings.
    pub fn start_end_headings(&self) -> (Option<f64>, Option<f64>) {
        (self.start_heading_rad, self.end_heading_rad)
    }

    /// Bind a rover to the environment, replacing any previously bound rover.
    pub fn set_rover(&mut self, rover: Rover) {
        self.rover = Some(rover);
    }

    pub fn rover(&self) -> Option<&Rover> {
        self.rover.as_ref()
    }

    pub fn rover_mut(&mut self) -> Option<&mut Rover> {
        self.rover.as_mut()
    }

    /// Unbind and return the rover.
    pub fn take_rover(&mut self) -> Option<Rover> {
        self.rover.take()
    }

    /// Get the route from the start through every goal.
    ///
    /// If a cached route exists it is returned regardless of `clearance_width_m`. Otherwise, if
    /// `generate_if_missing` is set a new route is planned and cached. An empty route is returned
    /// when no start or goals are set, when generation is not requested, or when no route exists.
    pub fn get_route(
        &mut self,
        planner: &PathPlanner,
        clearance_width_m: f64,
        generate_if_missing: bool,
    ) -> Route {
        if let Some(ref route) = self.route {
            return route.clone();
        }

        if !generate_if_missing {
            return Route::new();
        }

        if self.start.is_none() || self.goals.is_empty() {
            warn!("Cannot plan a route without a start and at least one goal");
            return Route::new();
        }

        let width_tiles = clearance_width_m / self.params.tile_size_m;
        debug!(
            "Planning with clearance {:.3} m ({:.3} tiles)",
            clearance_width_m, width_tiles
        );

        let route = planner.plan(self, self.start, &self.goals, width_tiles);
        self.route = Some(route.clone());

        route
    }

    /// Read-only access to the cached route, if there is one.
    pub fn route(&self) -> Option<&Route> {
        self.route.as_ref()
    }

    pub fn invalidate_route(&mut self) {
        self.route = None;
    }

    /// Get the world position of the centre of the given cell.
    ///
    /// Units: meters
    pub fn cell_centre_m(&self, cell: Cell) -> (f64, f64) {
        (
            (cell.x as f64 + 0.5) * self.params.tile_size_m,
            (cell.y as f64 + 0.5) * self.params.tile_size_m,
        )
    }

    /// Get the cell containing the given world position, or `None` if it's outside the grid.
    pub fn position_to_cell(&self, x_m: f64, y_m: f64) -> Option<Cell> {
        let x = (x_m / self.params.tile_size_m).floor();
        let y = (y_m / self.params.tile_size_m).floor();

        if !(x.is_finite() && y.is_finite()) || !self.in_bounds(x as i64, y as i64) {
            return None;
        }

        Some(Cell::new(x as usize, y as usize))
    }

    /// A position is navigable if it lies inside the grid on a non-obstacle tile.
    pub fn is_navigable_position(&self, x_m: f64, y_m: f64) -> bool {
        match self.position_to_cell(x_m, y_m) {
            Some(c) => !self.tiles[(c.y, c.x)].is_obstacle(),
            None => false,
        }
    }

    /// Turn each `Empty` tile into an obstacle with the given probability.
    ///
    /// Start, goal and explored tiles are never overwritten. Returns the number of obstacles
    /// placed.
    pub fn randomly_assign_obstacles<R: Rng + ?Sized>(
        &mut self,
        fraction: f64,
        rng: &mut R,
    ) -> usize {
        let fraction = fraction.max(0.0).min(1.0);
        let mut num_placed = 0;

        for tile in self.tiles.iter_mut() {
            if *tile == EnvType::Empty && rng.gen_bool(fraction) {
                *tile = EnvType::Obstacle;
                num_placed += 1;
            }
        }

        num_placed
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::nav::PathPlannerParams;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn open_env(width: usize, height: usize) -> Environment {
        Environment::new(width, height, EnvParams { tile_size_m: 1.0 }).unwrap()
    }

    #[test]
    fn test_tiles() {
        let mut env = open_env(4, 3);

        assert_eq!(env.size(), (4, 3));
        assert_eq!(env.get_tile(3, 2).unwrap(), EnvType::Empty);

        env.set_tile(3, 2, EnvType::Obstacle).unwrap();
        assert_eq!(env.get_tile(3, 2).unwrap(), EnvType::Obstacle);
        assert!(env.is_obstacle(3, 2).unwrap());

        assert!(matches!(
            env.get_tile(4, 0),
            Err(EnvError::OutOfBounds { x: 4, y: 0 })
        ));
        assert!(env.set_tile(0, 3, EnvType::Obstacle).is_err());
        assert!(env.is_obstacle(-1, 0).is_err());
    }

    #[test]
    fn test_invalid_dims() {
        assert!(matches!(
            Environment::new(0, 3, EnvParams::default()),
            Err(EnvError::InvalidSize(0, 3))
        ));
        assert!(Environment::new(3, 3, EnvParams { tile_size_m: 0.0 }).is_err());
    }

    #[test]
    fn test_start_and_goals() {
        let mut env = open_env(5, 5);

        env.set_start_and_goals(Some(Cell::new(0, 0)), vec![Cell::new(4, 4)])
            .unwrap();
        assert_eq!(env.get_tile(0, 0).unwrap(), EnvType::Start);
        assert_eq!(env.get_tile(4, 4).unwrap(), EnvType::Goal);

        // Moving the start clears the old tile
        env.set_start_and_goals(Some(Cell::new(1, 0)), vec![Cell::new(4, 4)])
            .unwrap();
        assert_eq!(env.get_tile(0, 0).unwrap(), EnvType::Empty);
        assert_eq!(env.start(), Some(Cell::new(1, 0)));

        // Out of bounds goal leaves everything unchanged
        assert!(env
            .set_start_and_goals(Some(Cell::new(2, 2)), vec![Cell::new(5, 0)])
            .is_err());
        assert_eq!(env.start(), Some(Cell::new(1, 0)));
        assert_eq!(env.get_tile(2, 2).unwrap(), EnvType::Empty);
    }

    #[test]
    fn test_route_cache() {
        let planner = PathPlanner::new(PathPlannerParams::default());
        let mut env = open_env(5, 5);

        // Nothing to plan between
        assert!(env.get_route(&planner, 0.5, true).is_empty());
        assert!(env.route().is_none());

        env.set_start_and_goals(Some(Cell::new(0, 0)), vec![Cell::new(4, 0)])
            .unwrap();

        // Not generated when asked not to
        assert!(env.get_route(&planner, 0.5, false).is_empty());

        let route = env.get_route(&planner, 0.5, true);
        assert_eq!(route, vec![Cell::new(0, 0), Cell::new(4, 0)]);

        // Cached route persists even when the grid changes
        env.set_tile(2, 0, EnvType::Obstacle).unwrap();
        assert_eq!(env.get_route(&planner, 0.5, true), route);

        env.invalidate_route();
        assert_ne!(env.get_route(&planner, 0.5, true), route);
    }

    #[test]
    fn test_empty_route_cached() {
        let planner = PathPlanner::new(PathPlannerParams::default());
        let mut env = open_env(5, 5);
        env.set_start_and_goals(Some(Cell::new(0, 2)), vec![Cell::new(4, 2)])
            .unwrap();

        // Wall the goal in against the edge of the grid
        let walls = [(3, 2), (4, 1), (4, 3)];
        for &(x, y) in walls.iter() {
            env.set_tile(x, y, EnvType::Obstacle).unwrap();
        }

        assert!(env.get_route(&planner, 0.5, true).is_empty());
        assert_eq!(env.route(), Some(&vec![]));

        // "No path" is kept until invalidated, even once a path exists
        for &(x, y) in walls.iter() {
            env.set_tile(x, y, EnvType::Empty).unwrap();
        }
        assert!(env.get_route(&planner, 0.5, true).is_empty());
        assert_eq!(env.route(), Some(&vec![]));

        env.invalidate_route();
        assert_eq!(
            env.get_route(&planner, 0.5, true),
            vec![Cell::new(0, 2), Cell::new(4, 2)]
        );
    }

    #[test]
    fn test_positions() {
        let mut env = Environment::new(4, 4, EnvParams { tile_size_m: 0.5 }).unwrap();
        env.set_tile(1, 2, EnvType::Obstacle).unwrap();

        assert_eq!(env.cell_centre_m(Cell::new(1, 2)), (0.75, 1.25));
        assert_eq!(env.position_to_cell(0.99, 0.01), Some(Cell::new(1, 0)));
        assert_eq!(env.position_to_cell(-0.01, 0.5), None);
        assert_eq!(env.position_to_cell(2.0, 0.5), None);

        assert!(env.is_navigable_position(0.1, 0.1));
        assert!(!env.is_navigable_position(0.75, 1.25));
        assert!(!env.is_navigable_position(-0.1, 0.1));
    }

    #[test]
    fn test_random_obstacles() {
        let mut env = open_env(20, 20);
        env.set_start_and_goals(Some(Cell::new(0, 0)), vec![Cell::new(19, 19)])
            .unwrap();

        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let num = env.randomly_assign_obstacles(0.3, &mut rng);

        assert!(num > 0 && num < 398);
        assert_eq!(env.get_tile(0, 0).unwrap(), EnvType::Start);
        assert_eq!(env.get_tile(19, 19).unwrap(), EnvType::Goal);
        assert_eq!(
            env.tiles.iter().filter(|t| t.is_obstacle()).count(),
            num
        );

        assert_eq!(env.randomly_assign_obstacles(0.0, &mut rng), 0);
    }

    #[test]
    fn test_save_load() {
        let mut env = open_env(6, 3);
        env.set_tile(2, 1, EnvType::Obstacle).unwrap();
        env.set_start_and_goals(Some(Cell::new(0, 1)), vec![Cell::new(5, 1), Cell::new(5, 0)])
            .unwrap();
        env.set_end_heading(Some(1.0));

        let path = std::env::temp_dir().join(format!("twin_env_{}.json", std::process::id()));
        env.save(&path).unwrap();
        let loaded = Environment::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.size(), (6, 3));
        assert_eq!(loaded.get_tile(2, 1).unwrap(), EnvType::Obstacle);
        assert_eq!(loaded.start(), Some(Cell::new(0, 1)));
        assert_eq!(loaded.goals(), env.goals());
        assert_eq!(loaded.start_end_headings(), (None, Some(1.0)));
        assert_eq!(loaded.tile_size_m(), 1.0);
    }
}
