//! Main digital twin executable entry point.
//!
//! # Architecture
//!
//! The executable runs a single batch validation of a map:
//!
//!     - Initialise the session, logging and parameters
//!     - Load the map given as the only argument
//!     - Search for the narrowest route clearance which survives the noisy trials
//!     - Save the outcome and, if a route was accepted, its hardware instructions
//!     - Play the accepted commands once without noise, archiving the rover's pose every tick
//!
//! Parameters are loaded from the `params` directory under `ROVER_TWIN_ROOT`, and all outputs are
//! written into a new session directory under `ROVER_TWIN_ROOT/sessions`.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{debug, info, warn};
use serde::Serialize;
use std::env;

// Internal
use comms_if::cmd::to_instructions;
use twin_lib::{
    cmd_exec::CmdExecutor,
    env::Environment,
    loco_ctrl::{self, Rover, RoverPose},
    nav::{PathPlanner, PathPlannerParams},
    sim::{self, AcceptedRoute, RobustnessSim, SimOutcome},
    traj_ctrl,
};
use util::{
    archive::{ArchiveError, Archived, Archiver},
    host,
    logger::{logger_init, LevelFilter},
    maths::get_ang_dist_2pi,
    session::{self, Session},
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Noise free playback of an accepted command sequence.
struct Playback {
    executor: CmdExecutor,
    rover: Rover,
    time_s: f64,
    arch_pose: Archiver,
}

/// A single row of the pose archive.
#[derive(Serialize)]
struct PoseRecord {
    time_s: f64,
    x_m: f64,
    y_m: f64,
    heading_rad: f64,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("twin_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session).wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Rover Digital Twin\n");
    info!("Running on: {}", host::get_host_info());
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let loco_params: loco_ctrl::Params =
        util::params::load("rover.toml").wrap_err("Could not load rover params")?;
    let nav_params: PathPlannerParams =
        util::params::load("nav.toml").wrap_err("Could not load nav params")?;
    let traj_params: traj_ctrl::Params =
        util::params::load("traj_ctrl.toml").wrap_err("Could not load traj_ctrl params")?;
    let sim_params: sim::Params =
        util::params::load("sim.toml").wrap_err("Could not load sim params")?;

    info!("Exec parameters loaded");

    // ---- LOAD MAP ----

    let args: Vec<String> = env::args().collect();
    debug!("CLI arguments: {:?}", args);

    if args.len() != 2 {
        return Err(eyre!("Expected path to the map file as only argument"));
    }

    let mut environment = Environment::load(&args[1]).wrap_err("Failed to load the map")?;

    // ---- ROBUSTNESS SIMULATION ----

    let sim = RobustnessSim::new(
        sim_params,
        loco_params,
        traj_params,
        PathPlanner::new(nav_params),
    )
    .wrap_err("Failed to initialise the robustness simulation")?;

    let outcome = sim
        .run(&mut environment)
        .wrap_err("Robustness simulation failed")?;

    session.save("outcome.json", outcome.clone());

    match outcome {
        SimOutcome::Accepted(accepted) => {
            info!(
                "Route accepted with a clearance of {:.3} m ({} of {} trials failed, limit {})",
                accepted.clearance_width_m,
                accepted.num_failures,
                sim.params().num_trials,
                accepted.critical_value
            );

            let instructions = to_instructions(&accepted.cmds)
                .wrap_err("Could not convert commands to instructions")?;
            session::save_with_timestamp("instructions.json", instructions);

            run_playback(&session, &mut environment, &loco_params, &accepted)?;
        }
        SimOutcome::NoFeasibleRoute { clearance_width_m } => {
            warn!(
                "No route exists with a clearance of {:.3} m, map cannot be traversed safely",
                clearance_width_m
            );
        }
        SimOutcome::WidthLimitReached { clearance_width_m } => {
            warn!(
                "No clearance up to {:.3} m passed the robustness test",
                clearance_width_m
            );
        }
    }

    // ---- SHUTDOWN ----

    session.exit();

    Ok(())
}

/// Play the accepted commands on a noise free rover, archiving its pose every tick.
///
/// The rover is bound to the environment once playback is complete.
fn run_playback(
    session: &Session,
    environment: &mut Environment,
    loco_params: &loco_ctrl::Params,
    accepted: &AcceptedRoute,
) -> Result<(), Report> {
    let start = accepted
        .route
        .first()
        .ok_or_else(|| eyre!("Accepted route is empty"))?;
    let (x_m, y_m) = environment.cell_centre_m(*start);
    let start_pose = RoverPose::new(
        x_m,
        y_m,
        environment.start_end_headings().0.unwrap_or(0.0),
    );

    let nominal_params = loco_ctrl::Params {
        motor_noise_std_ms: 0.0,
        ..*loco_params
    };

    let mut playback = Playback {
        executor: CmdExecutor::new(&nominal_params),
        rover: Rover::new(&nominal_params, start_pose, None)
            .wrap_err("Failed to create the playback rover")?,
        time_s: 0.0,
        arch_pose: Archiver::from_path(session, "playback/pose.csv")
            .wrap_err("Failed to create the pose archive")?,
    };

    playback.executor.queue().extend(accepted.cmds.iter().copied());

    info!("Starting nominal playback of {} commands", accepted.cmds.len());

    playback.write().wrap_err("Failed to archive the pose")?;
    while !playback.executor.is_empty() {
        playback.executor.update(&mut playback.rover);
        playback.time_s += playback.executor.tick_period_s();
        playback.write().wrap_err("Failed to archive the pose")?;
    }

    let pose = playback.rover.pose();
    info!(
        "Playback complete after {:.3} s, rover at ({:.3}, {:.3}) heading {:.3} rad",
        playback.time_s, pose.x_m, pose.y_m, pose.heading_rad
    );

    if let Some(end_heading_rad) = environment.start_end_headings().1 {
        info!(
            "Final heading error: {:.5} rad",
            get_ang_dist_2pi(pose.heading_rad, end_heading_rad)
        );
    }

    environment.set_rover(playback.rover);
    if let Some(rover) = environment.rover() {
        session.save("playback/final_pose.json", rover.pose());
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Archived for Playback {
    fn write(&mut self) -> Result<(), ArchiveError> {
        let pose = self.rover.pose();

        self.arch_pose.serialise(PoseRecord {
            time_s: self.time_s,
            x_m: pose.x_m,
            y_m: pose.y_m,
            heading_rad: pose.heading_rad,
        })
    }
}
