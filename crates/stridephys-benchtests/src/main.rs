//! stridephys-bench — scripted rig scenarios with periodic state printouts.
//!
//!   cargo run -p stridephys-benchtests -- --scenario walk --seconds 5

use anyhow::Result;
use clap::{Parser, ValueEnum};
use glam::Quat;

use stridephys_controllers::yaw_of;
use stridephys_core::hex32;
use stridephys_core::types::Vec3;
use stridephys_rig::{Limb, Speed};
use stridephys_sim::{SimConfig, Simulation};
use stridephys_viz::DebugSettings;
use stridephys_world::SUB_DT;

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Scenario {
    /// stand still, stabilization only
    Stand,
    /// walk forward, then strafe, then stop
    Walk,
    /// repeated jump gestures, some inside the debounce window
    Jump,
    /// start with the torso rolled 0.5 rad and let the upright loop recover
    Tilt,
    /// rotate left then right for equal durations
    Rotate,
}

#[derive(Parser, Debug)]
#[command(name = "stridephys-bench")]
struct Args {
    #[arg(long, value_enum, default_value_t = Scenario::Walk)]
    scenario: Scenario,

    /// simulated seconds to run
    #[arg(long, default_value_t = 5.0)]
    seconds: f32,

    /// print a status line every N ticks (0 = never)
    #[arg(long, default_value_t = 60)]
    print_every: u32,

    /// run at the fast speed level
    #[arg(long, default_value_t = false)]
    fast: bool,

    /// dump the per-tick event ledger as JSONL every N ticks (0 = never)
    #[arg(long, default_value_t = 0)]
    json_every: u32,
}

fn tilt_of(sim: &Simulation) -> f32 {
    let rot = sim.world.body_pose(sim.rig.body(Limb::Torso)).rot;
    let yaw_q = Quat::from_rotation_y(yaw_of(rot));
    let mut t = Vec3::from((rot * yaw_q.conjugate()).to_scaled_axis());
    t.y = 0.0;
    t.length()
}

fn drive(sim: &mut Simulation, scenario: Scenario, tick: u32, total: u32) {
    let intent = sim.intent_mut();
    match scenario {
        Scenario::Stand => {}
        Scenario::Walk => {
            intent.stop();
            if tick < total / 2 {
                intent.move_forward();
            } else if tick < (3 * total) / 4 {
                intent.move_right();
            }
        }
        Scenario::Jump => {
            // gestures at 0 s, +0.05 s (debounced) and every 2 s after
            if tick == 0 || tick == 3 || tick % 120 == 0 {
                intent.jump();
            }
        }
        Scenario::Tilt => {}
        Scenario::Rotate => {
            intent.stop();
            if tick < total / 2 {
                intent.rotate_left();
            } else {
                intent.rotate_right();
            }
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut sim = Simulation::new(SimConfig {
        label: String::from("bench-rig"),
        ..SimConfig::default()
    });
    sim.world.set_debug(DebugSettings {
        json_every: args.json_every,
        ..DebugSettings::default()
    });

    if matches!(args.scenario, Scenario::Tilt) {
        let torso = sim.rig.body(Limb::Torso);
        let mut p = sim.world.body_pose(torso);
        p.rot = Quat::from_rotation_z(0.5);
        sim.world.set_body_pose(torso, p);
    }
    if args.fast {
        sim.intent_mut().set_speed(Speed::Fast);
    }

    let total = (args.seconds / SUB_DT).round().max(1.0) as u32;
    for tick in 0..total {
        drive(&mut sim, args.scenario, tick, total);
        let stats = sim.frame(SUB_DT);

        if args.print_every != 0 && tick % args.print_every == 0 {
            let p = sim.world.body_pose(sim.rig.body(Limb::Torso)).pos;
            println!(
                "tick {tick:5}  torso=({:+.3},{:+.3},{:+.3})  tilt={:.4}  contacts={}",
                p.x, p.y, p.z, tilt_of(&sim), stats.contacts,
            );
        }
    }

    let p = sim.world.body_pose(sim.rig.body(Limb::Torso)).pos;
    println!("-- {} ticks done --", total);
    println!("torso     ({:+.4}, {:+.4}, {:+.4})", p.x, p.y, p.z);
    println!("tilt      {:.5}", tilt_of(&sim));
    println!("step hash {}", hex32(&sim.world.step_hash()));
    println!("pose hash {}", hex32(&sim.pose_hash()));
    sim.snapshot().write_json("out")?;
    Ok(())
}
