use floatclock_core::{Alerts, ModeController};

use super::{open_gateway, CmdResult};

/// Print the snapshot a fresh `run` would open with.
pub fn run() -> CmdResult {
    let controller = ModeController::load(open_gateway(), Alerts::silent());
    println!("{}", controller.snapshot().to_json()?);
    Ok(())
}
