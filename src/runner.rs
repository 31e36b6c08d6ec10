use crate::backend::{IoBackend, PureBackend};
use crate::config::{Config, FRAMES_PER_SECOND};
use crate::display::Display;
use crate::error::{Error, Result};
use crate::input::{Key, KeyRing, Keyboard};
use crate::interpreter;
use crate::memory::Word;
use std::time::{Duration, Instant};
use tracing::info;

/// Load `program` into a fresh, private machine and hand it to `computation`.
/// The machine only exists for the length of this call and `computation`
/// can only borrow it, so nothing but `R` comes back out. Same program, same
/// computation: same answer, every time.
pub fn run_deterministic<R>(
    program: &[Word],
    computation: impl FnOnce(&mut PureBackend) -> R,
) -> R {
    let mut cpu = PureBackend::new();
    cpu.load_program(program);
    computation(&mut cpu)
}

/// Same again, but on a machine whose video window is wired to `display`.
/// Anything `computation` makes the machine store on screen has already been
/// passed to the display by the time this returns.
pub fn run_with_display<'a, R>(
    program: &[Word],
    display: &'a mut dyn Display,
    config: &Config,
    computation: impl FnOnce(&mut IoBackend<'a>) -> R,
) -> R {
    let mut cpu = IoBackend::new(display, config);
    cpu.load_program(program);
    computation(&mut cpu)
}

/// Interactive run: the program gets `config.clock_hz` instructions a second
/// of wall-clock time, in slices of one frame. Between slices, keys go into
/// the keyboard ring and the display is repainted. Stops after `config.steps`
/// instructions or when the user asks to quit, returning how many ran.
pub fn run_console(
    program: &[Word],
    display: &mut dyn Display,
    keyboard: &mut dyn Keyboard,
    config: &Config,
) -> Result<u64> {
    let frame = Duration::from_secs(1) / FRAMES_PER_SECOND;
    let mut cpu = IoBackend::new(display, config);
    cpu.load_program(program);
    let mut ring = KeyRing::new();
    let mut done = 0;

    info!(words = program.len(), clock_hz = config.clock_hz, "starting");
    while done < config.steps {
        let started = Instant::now();
        for key in keyboard.poll_keys()? {
            match key {
                Key::Code(code) => {
                    ring.push(&mut cpu, code)?;
                }
                Key::Quit => {
                    info!(steps = done, "quit");
                    return Ok(done);
                }
            }
        }

        let slice = config.steps_per_frame().min(config.steps - done);
        done += interpreter::run(&mut cpu, slice)?;
        cpu.display().refresh().map_err(Error::Display)?;

        // run as fast as possible then sleep, to match the clock
        if let Some(rest) = frame.checked_sub(started.elapsed()) {
            spin_sleep::sleep(rest);
        }
    }
    info!(steps = done, "step budget used up");
    Ok(done)
}
