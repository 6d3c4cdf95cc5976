//! Translate termination signals into cancellation.
//!
//! SIGINT, SIGTERM and SIGHUP all trip the run's [`CancellationToken`]; the
//! engine notices at its next suspension point and switches the bulb off.

use anyhow::{Context, Result};
use signal_hook::{
    consts::signal::{SIGHUP, SIGINT, SIGTERM},
    iterator::Signals,
};
use std::thread;

use crate::cancel::CancellationToken;

/// Spawn the signal thread. Returns a handle that can stop it again.
pub fn setup_signal_handler(
    token: CancellationToken,
    debug_enabled: bool,
) -> Result<signal_hook::iterator::Handle> {
    let mut signals =
        Signals::new([SIGINT, SIGTERM, SIGHUP]).context("failed to register signal handlers")?;
    let handle = signals.handle();

    thread::spawn(move || {
        for sig in signals.forever() {
            if debug_enabled {
                log_pipe!();
                log_debug!("Received {}", signal_name(sig));
            }

            if token.is_cancelled() {
                // Second signal while already shutting down
                log_pipe!();
                log_warning!("Already stopping, waiting for the bulb to switch off");
                continue;
            }

            token.cancel();
        }
    });

    Ok(handle)
}

fn signal_name(sig: i32) -> &'static str {
    match sig {
        SIGINT => "SIGINT",
        SIGTERM => "SIGTERM",
        SIGHUP => "SIGHUP",
        _ => "unknown signal",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_names() {
        assert_eq!(signal_name(SIGINT), "SIGINT");
        assert_eq!(signal_name(SIGHUP), "SIGHUP");
        assert_eq!(signal_name(0), "unknown signal");
    }
}
