use crate::memory::Word;
use crossterm::execute;
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use std::io;
use tui::backend::CrosstermBackend;
use tui::layout::Rect;
use tui::style::{Color, Modifier, Style};
use tui::text::{Span, Spans};
use tui::widgets::{Block, Borders, Paragraph};
use tui::Terminal;

/// Display is told about every store that lands in the video window, in the
/// order the stores happen. It should abstract the implementation details, so
/// a variety of kinds of screen would work.
pub trait Display {
    /// `offset` is relative to the start of the video window
    fn on_store(&mut self, offset: usize, value: Word) -> Result<(), io::Error>;

    /// push whatever has changed out to the actual screen
    fn refresh(&mut self) -> Result<(), io::Error> {
        Ok(())
    }
}

/// one character cell of the text screen, as packed into a video word:
///   ffff bbbb B ccccccc
///   fg   bg   blink  character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cell {
    pub character: u8,
    pub blink: bool,
    pub background: u8,
    pub foreground: u8,
}

impl From<Word> for Cell {
    fn from(w: Word) -> Self {
        Cell {
            character: (w & 0x7f) as u8,
            blink: w & 0x80 != 0,
            background: ((w >> 8) & 0xf) as u8,
            foreground: ((w >> 12) & 0xf) as u8,
        }
    }
}

impl Cell {
    /// something printable; control characters and NUL show as blanks
    pub fn glyph(&self) -> char {
        match self.character {
            0x20..=0x7e => self.character as char,
            _ => ' ',
        }
    }

    fn style(&self) -> Style {
        let style = Style::default()
            .fg(palette(self.foreground))
            .bg(palette(self.background));
        if self.blink {
            style.add_modifier(Modifier::SLOW_BLINK)
        } else {
            style
        }
    }
}

/// 4-bit colour index to terminal colour, in the usual CGA order
fn palette(index: u8) -> Color {
    match index & 0xf {
        0x0 => Color::Black,
        0x1 => Color::Blue,
        0x2 => Color::Green,
        0x3 => Color::Cyan,
        0x4 => Color::Red,
        0x5 => Color::Magenta,
        0x6 => Color::Yellow,
        0x7 => Color::Gray,
        0x8 => Color::DarkGray,
        0x9 => Color::LightBlue,
        0xa => Color::LightGreen,
        0xb => Color::LightCyan,
        0xc => Color::LightRed,
        0xd => Color::LightMagenta,
        0xe => Color::LightYellow,
        _ => Color::White,
    }
}

/// the character grid, kept in step with the video window by `on_store`
pub struct TextScreen {
    rows: usize,
    columns: usize,
    cells: Vec<Cell>,
}

impl TextScreen {
    pub fn new(rows: usize, columns: usize) -> Self {
        TextScreen {
            rows,
            columns,
            cells: vec![Cell::default(); rows * columns],
        }
    }

    /// `None` if the position is off the screen
    pub fn cell(&self, row: usize, column: usize) -> Option<Cell> {
        if row >= self.rows || column >= self.columns {
            return None;
        }
        self.cells.get(row * self.columns + column).copied()
    }

    /// one row as plain text, trailing blanks included
    pub fn line(&self, row: usize) -> Option<String> {
        if row >= self.rows {
            return None;
        }
        let start = row * self.columns;
        let cells = self.cells.get(start..start + self.columns)?;
        Some(cells.iter().map(Cell::glyph).collect())
    }

    fn spans(&self) -> Vec<Spans<'static>> {
        (0..self.rows)
            .map(|row| {
                Spans::from(
                    self.cells[row * self.columns..(row + 1) * self.columns]
                        .iter()
                        .map(|c| Span::styled(c.glyph().to_string(), c.style()))
                        .collect::<Vec<_>>(),
                )
            })
            .collect()
    }
}

impl Display for TextScreen {
    fn on_store(&mut self, offset: usize, value: Word) -> Result<(), io::Error> {
        match self.cells.get_mut(offset) {
            Some(cell) => {
                *cell = Cell::from(value);
                Ok(())
            }
            None => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("offset {} is off a {}x{} screen", offset, self.columns, self.rows),
            )),
        }
    }
}

/// text screen in a terminal, rendered using TUI and crossterm
pub struct TermDisplay {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    screen: TextScreen,
    dirty: bool,
}

impl TermDisplay {
    pub fn new(rows: usize, columns: usize) -> Result<TermDisplay, io::Error> {
        terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        terminal.clear()?;
        Ok(TermDisplay {
            terminal,
            screen: TextScreen::new(rows, columns),
            dirty: true,
        })
    }
}

impl Display for TermDisplay {
    fn on_store(&mut self, offset: usize, value: Word) -> Result<(), io::Error> {
        self.screen.on_store(offset, value)?;
        self.dirty = true;
        Ok(())
    }

    fn refresh(&mut self) -> Result<(), io::Error> {
        if !self.dirty {
            return Ok(());
        }
        let screen = &self.screen;
        // one terminal cell per DCPU-16 character, plus the border
        self.terminal.draw(|f| {
            let size = Rect::new(0, 0, 2 + screen.columns as u16, 2 + screen.rows as u16);
            let text = Paragraph::new(screen.spans()).block(
                Block::default()
                    .title("DCPU-16")
                    .borders(Borders::ALL)
                    .style(Style::default().bg(Color::Black)),
            );
            f.render_widget(text, size);
        })?;
        self.dirty = false;
        Ok(())
    }
}

impl Drop for TermDisplay {
    fn drop(&mut self) {
        // nothing useful to do if the terminal won't go back to normal
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

/// useful for testing non-display routines
pub struct DummyDisplay;

impl DummyDisplay {
    pub fn new() -> Result<DummyDisplay, io::Error> {
        Ok(DummyDisplay {})
    }
}

impl Display for DummyDisplay {
    #[allow(unused)]
    fn on_store(&mut self, offset: usize, value: Word) -> Result<(), io::Error> {
        Ok(())
    }
}

/// remembers every forwarded store, for checking what the display was told
#[derive(Default)]
pub struct RecordingDisplay {
    pub stores: Vec<(usize, Word)>,
}

impl RecordingDisplay {
    pub fn new() -> Self {
        RecordingDisplay { stores: Vec::new() }
    }
}

impl Display for RecordingDisplay {
    fn on_store(&mut self, offset: usize, value: Word) -> Result<(), io::Error> {
        self.stores.push((offset, value));
        Ok(())
    }
}
