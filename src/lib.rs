//! DCPU-16 emulator core
//!
//! ## Design
//!
//! * one interpreter, written against a `Memory` trait; it never knows
//!   what's on the other side of a load or store
//! * two memories behind that trait:
//!    - `PureBackend`: private state, lent to a computation and dropped when
//!      it returns, so a run is repeatable word for word
//!    - `IoBackend`: the same state plus a display; stores into the video
//!      window at 0x8000 are passed on as they happen
//! * abstract display so can plug alternatives; starting with TUI in-console
//! * input device, with trait for reading key-presses; keys reach the program
//!   through the keyboard ring at 0x9000, stored via the same `Memory`
//! * instructions will run as fast as possible then sleep, to match the
//!   100kHz clock; so not quite authentic
//!
//! Model
//!
//! Runner
//!  |-- run_deterministic(program, computation)
//!  |    `-- PureBackend -> computation(&mut backend) -> plain value
//!  |-- run_with_display(program, display, config, computation)
//!  |    `-- IoBackend(display) -> computation(&mut backend)
//!  `-- run_console(program, display, keyboard, config)
//!       |-- poll keys -> key ring
//!       |-- interpreter::run(backend, steps per frame)
//!       |-- display.refresh()
//!       `-- sleep out the rest of the frame
pub mod backend;
pub mod config;
pub mod display;
pub mod error;
pub mod input;
pub mod instruction;
pub mod interpreter;
pub mod memory;
pub mod runner;

pub use backend::{IoBackend, PureBackend};
pub use config::Config;
pub use display::Display;
pub use error::{Error, Result};
pub use memory::{Address, AddressSpace, Memory, Snapshot, Word};
pub use runner::{run_console, run_deterministic, run_with_display};
