use std::fmt::Display;
use std::io::Write;
use std::thread;
use std::time::Duration;

use crate::console::Console;

/// Runs a unit of work until it stops failing, pausing a fixed interval
/// between attempts. There is no attempt limit: callers decide which
/// failures are worth handing to a `Retrier` at all.
#[derive(Debug, Clone, Copy)]
pub struct Retrier {
    interval: Duration,
}

impl Retrier {
    pub fn new(interval: Duration) -> Retrier {
        Retrier { interval: interval }
    }

    /// "Retrying <label>" goes out on a fresh line at the first failure, a
    /// dot follows every later failure, and " Done." closes the line once the
    /// work succeeds. Nothing is written if the first attempt succeeds.
    pub fn run_until_success<W, T, E, F>(&self, out: &mut Console<W>, label: &str, mut work: F) -> T
    where
        W: Write,
        E: Display,
        F: FnMut() -> Result<T, E>,
    {
        let mut failures: u32 = 0;
        loop {
            match work() {
                Ok(value) => {
                    if failures > 0 {
                        let _ = writeln!(out, " Done.");
                        let _ = out.flush();
                        info!("{} succeeded after {} retries.", label, failures);
                    }
                    return value;
                }
                Err(e) => {
                    debug!("{} failed: {}", label, e);
                    if failures == 0 {
                        let _ = out.start_line();
                        let _ = write!(out, "Retrying {}", label);
                    } else {
                        let _ = write!(out, ".");
                    }
                    let _ = out.flush();
                    failures += 1;
                    thread::sleep(self.interval);
                }
            }
        }
    }
}
