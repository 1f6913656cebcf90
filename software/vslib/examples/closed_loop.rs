//! A 10kHz PID loop around a simulated first order plant.
//!
//! Demonstrated here:
//!   * Setting up logging for a run
//!   * Wiring calcs onto a shared tape
//!   * Serialization and deserialization of calcs
//!   * Back-calculation anti-windup while the actuation is clamped

use tracing::info;
use vslib::calc::{Calc, Pid, Sin};
use vslib::logging::init_logging;
use vslib::{ControllerCtx, PROTOTYPES, PidGains};

// Tape layout
const REFERENCE: usize = 0;
const MEASUREMENT: usize = 1;
const ACTUATION: usize = 2;

fn main() -> Result<(), String> {
    let mut ctx = ControllerCtx::default();
    ctx.op_name = "closed_loop_example".into();
    ctx.dt_ns = (1e9_f64 / 10_000.0).ceil() as u32; // 10 kHz
    ctx.op_dir = std::env::temp_dir().join("vslib");
    let log_path = init_logging(&ctx.op_dir, &ctx.op_name)?;
    info!("Logging to {}", log_path.display());
    info!("Available calcs: {:?}", PROTOTYPES.keys().collect::<Vec<_>>());

    // Slow sine reference between 0 and 2
    let reference = Sin::new(0.5, 0.0, 0.0, 2.0);

    // PI with a little filtered derivative action, clamped to +/-3
    let gains = PidGains {
        kp: 0.5,
        ki: 40.0,
        kd: 1e-4,
        n: 2000.0,
        f0: 50.0,
        ..Default::default()
    };
    let pid = Pid::new("sin.y".into(), "plant.y".into(), gains, -3.0, 3.0);

    // Serialize and deserialize the calcs (for demonstration purposes)
    let calcs: Vec<Box<dyn Calc>> = vec![Box::new(reference), Box::new(pid)];
    let serialized = serde_json::to_string_pretty(&calcs).map_err(|e| e.to_string())?;
    let mut calcs: Vec<Box<dyn Calc>> =
        serde_json::from_str(&serialized).map_err(|e| e.to_string())?;

    calcs[0].init(ctx.clone(), vec![], REFERENCE..REFERENCE + 1)?;
    calcs[1].init(ctx.clone(), vec![REFERENCE, MEASUREMENT], ACTUATION..ACTUATION + 1)?;

    // Plant with a 10ms time constant, discretized at the cycle period
    let alpha = (-ctx.dt_s() / 10e-3).exp();

    let mut tape = [0.0; 3];
    let mut worst_error: f64 = 0.0;
    for cycle in 0..20_000 {
        for calc in calcs.iter_mut() {
            calc.eval(&mut tape);
        }
        tape[MEASUREMENT] = alpha * tape[MEASUREMENT] + (1.0 - alpha) * tape[ACTUATION];

        if cycle >= 10_000 {
            worst_error = worst_error.max((tape[REFERENCE] - tape[MEASUREMENT]).abs());
        }
        if cycle % 2_000 == 0 {
            info!(
                "cycle {cycle}: reference {:.4}, measurement {:.4}, actuation {:.4}",
                tape[REFERENCE], tape[MEASUREMENT], tape[ACTUATION]
            );
        }
    }
    info!("Worst tracking error after settling: {worst_error:.4}");

    for calc in calcs.iter_mut() {
        calc.terminate();
    }

    Ok(())
}
