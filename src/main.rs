//! Lane Racer entry point
//!
//! Runs one headless race with a simple dodging policy and prints the final
//! report as JSON. Usage: `lane-racer [seed] [tuning.json]`.

#[cfg(not(target_arch = "wasm32"))]
use lane_racer::{Action, Simulation, Tuning, consts::*, sim::RaceState};

/// How far ahead of the player the demo policy looks for traffic
#[cfg(not(target_arch = "wasm32"))]
const LOOKAHEAD: f32 = 300.0;

#[cfg(not(target_arch = "wasm32"))]
#[derive(serde::Serialize)]
struct Report {
    seed: u64,
    steps: u64,
    total_reward: f32,
    info: lane_racer::StepInfo,
    hud: lane_racer::Hud,
}

/// Dodge the nearest car ahead, braking when both sides are blocked
#[cfg(not(target_arch = "wasm32"))]
fn dodge(state: &RaceState) -> Action {
    let player = &state.player;
    if player.is_changing_lane() {
        return Action::Idle;
    }

    let threat = |left: f32| {
        let right = left + player.size.x;
        state.opponents.iter().any(|opp| {
            opp.pos.y < player.pos.y + player.size.y
                && opp.pos.y + opp.size.y > player.pos.y - LOOKAHEAD
                && opp.pos.x < right
                && opp.pos.x + opp.size.x > left
        })
    };
    if !threat(player.pos.x) {
        return Action::Idle;
    }

    let half_lane = LANE_WIDTH / 2.0;
    for (dx, action) in [(-half_lane, Action::Left), (half_lane, Action::Right)] {
        let x = player.pos.x + dx;
        if x >= ROAD_LEFT_EDGE && x + player.size.x <= ROAD_RIGHT_EDGE && !threat(x) {
            return action;
        }
    }
    Action::Brake
}

#[cfg(not(target_arch = "wasm32"))]
fn load_tuning(path: Option<String>) -> Result<Tuning, Box<dyn std::error::Error>> {
    match path {
        Some(path) => {
            let json = std::fs::read_to_string(&path)?;
            log::info!("Loaded tuning from {path}");
            Ok(Tuning::from_json(&json)?)
        }
        None => Ok(Tuning::default()),
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let seed = match args.next() {
        Some(arg) => arg.parse()?,
        None => 42,
    };
    let tuning = load_tuning(args.next())?;

    let mut sim = Simulation::new(tuning, seed)?;
    sim.reset();

    let mut steps = 0;
    let mut total_reward = 0.0;
    // Steering is edge-triggered, so release for a step after each press
    let mut released = true;
    loop {
        let action = if released { dodge(sim.state()) } else { Action::Idle };
        released = !matches!(action, Action::Left | Action::Right);

        let result = sim.step_action(action);
        steps += 1;
        total_reward += result.reward;
        if result.done {
            break;
        }
    }

    let report = Report {
        seed,
        steps,
        total_reward,
        info: sim.info(),
        hud: sim.hud(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Lane Racer (native) starting...");

    if let Err(err) = run() {
        log::error!("{err}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The library is the deliverable on wasm; there is no browser front end
}
