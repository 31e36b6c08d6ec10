use clap::Parser;
use std::error::Error;
use std::fs;
use std::io;
use std::path::PathBuf;

use dcpu16::config::Config;
use dcpu16::display::TermDisplay;
use dcpu16::input::TermKeyboard;
use dcpu16::memory::Word;
use dcpu16::run_console;
use tracing_subscriber::EnvFilter;

/// Run a DCPU-16 program in the terminal
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    /// raw program image: 16-bit words, loaded at 0x0000
    program: PathBuf,

    /// stop after this many instructions
    #[arg(long)]
    steps: Option<u64>,

    /// instructions per second
    #[arg(long)]
    clock_hz: Option<u32>,

    /// words in the image are little-endian rather than big-endian
    #[arg(long)]
    little_endian: bool,
}

fn words_from_bytes(bytes: &[u8], little_endian: bool) -> Result<Vec<Word>, io::Error> {
    if bytes.len() % 2 != 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "program image has an odd number of bytes",
        ));
    }
    Ok(bytes
        .chunks_exact(2)
        .map(|pair| {
            let pair = [pair[0], pair[1]];
            if little_endian {
                Word::from_le_bytes(pair)
            } else {
                Word::from_be_bytes(pair)
            }
        })
        .collect())
}

fn main() -> Result<(), Box<dyn Error>> {
    // logs go to stderr, so they don't mess up the screen unless asked for
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let defaults = Config::default();
    let config = Config {
        steps: args.steps.unwrap_or(defaults.steps),
        clock_hz: args.clock_hz.unwrap_or(defaults.clock_hz),
        ..defaults
    };
    let program = words_from_bytes(&fs::read(&args.program)?, args.little_endian)?;

    // display is dropped at the end of the block, so the terminal is back to
    // normal before we print anything
    let outcome = {
        let mut display = TermDisplay::new(config.rows, config.columns)?;
        let mut keyboard = TermKeyboard::new();
        run_console(&program, &mut display, &mut keyboard, &config)
    };
    let steps = outcome?;
    println!("ran {} instructions", steps);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_words_big_endian() -> Result<(), io::Error> {
        assert_eq!(words_from_bytes(&[0xa4, 0x61, 0x70, 0x01], false)?, vec![0xa461, 0x7001]);
        Ok(())
    }

    #[test]
    fn test_words_little_endian() -> Result<(), io::Error> {
        assert_eq!(words_from_bytes(&[0x61, 0xa4], true)?, vec![0xa461]);
        Ok(())
    }

    #[test]
    fn test_odd_image_rejected() {
        assert!(words_from_bytes(&[0x00, 0x01, 0x02], false).is_err());
    }
}
