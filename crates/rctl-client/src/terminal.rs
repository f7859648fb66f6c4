//! Terminal mode snapshot
//!
//! The line editor puts the terminal in raw mode while it waits for input.
//! Teardown can happen while that read is still blocked (server close,
//! signal), so the original attributes are captured up front and written back
//! on exit.

#[cfg(unix)]
mod imp {
    use std::io;
    use std::os::unix::io::AsRawFd;
    use tracing::{debug, warn};

    /// Saved terminal attributes of stdin
    pub struct TerminalSnapshot {
        original: Option<libc::termios>,
    }

    impl TerminalSnapshot {
        /// Capture the current attributes; a non-tty stdin captures nothing
        pub fn capture() -> Self {
            let fd = io::stdin().as_raw_fd();

            let mut termios = std::mem::MaybeUninit::<libc::termios>::uninit();
            let result = unsafe { libc::tcgetattr(fd, termios.as_mut_ptr()) };
            if result != 0 {
                debug!("stdin is not a terminal, nothing to restore");
                return Self { original: None };
            }

            Self {
                original: Some(unsafe { termios.assume_init() }),
            }
        }

        /// Write the captured attributes back
        pub fn restore(&self) {
            let Some(original) = self.original.as_ref() else {
                return;
            };

            let fd = io::stdin().as_raw_fd();
            let result = unsafe { libc::tcsetattr(fd, libc::TCSANOW, original) };
            if result != 0 {
                warn!("Failed to restore terminal settings");
            }
        }
    }
}

#[cfg(not(unix))]
mod imp {
    /// No-op on platforms without termios
    pub struct TerminalSnapshot;

    impl TerminalSnapshot {
        pub fn capture() -> Self {
            TerminalSnapshot
        }

        pub fn restore(&self) {}
    }
}

pub use imp::TerminalSnapshot;
