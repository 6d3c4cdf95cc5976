//! Terminal housekeeping shared by the long-running commands.

use std::fs::File;
use std::io::{self, Write};
use std::os::unix::io::AsRawFd;
use termios::{os::linux::ECHOCTL, *};

/// Hides the cursor and suppresses `^C` echo while a sunrise is drawn.
///
/// The original terminal settings are restored on drop.
pub struct TerminalGuard {
    original_termios: Termios,
}

impl TerminalGuard {
    /// Returns `Ok(None)` when there is no controlling terminal (cron, systemd).
    pub fn new() -> io::Result<Option<Self>> {
        let tty = match File::open("/dev/tty") {
            Ok(tty) => tty,
            Err(e) if e.kind() == io::ErrorKind::NotFound || e.raw_os_error() == Some(6) => {
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        let fd = tty.as_raw_fd();

        let mut term = Termios::from_fd(fd)?;
        let original = term;
        term.c_lflag &= !ECHOCTL;
        tcsetattr(fd, TCSANOW, &term)?;

        print!("\x1b[?25l");
        io::stdout().flush()?;

        Ok(Some(Self {
            original_termios: original,
        }))
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if let Ok(tty) = File::open("/dev/tty") {
            let _ = tcsetattr(tty.as_raw_fd(), TCSANOW, &self.original_termios);
        }
        let _ = write!(io::stdout(), "\x1b[?25h");
        let _ = io::stdout().flush();
    }
}

/// `1h 05m`, `12m 30s`, `45s`.
pub fn format_wait(duration: std::time::Duration) -> String {
    let total = duration.as_secs();
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{hours}h {minutes:02}m")
    } else if minutes > 0 {
        format!("{minutes}m {seconds:02}s")
    } else {
        format!("{seconds}s")
    }
}
