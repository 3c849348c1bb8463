use {
    anyhow::{Context, Result},
    console::{pad_str, Alignment, Term},
    itertools::Itertools,
    serde::{Deserialize, Serialize},
    std::iter::{once, repeat},
    tracing::{info, instrument},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::Display)]
#[display("{width}x{height}")]
pub struct DisplaySize {
    pub width: u32,
    pub height: u32,
}

/// Text drawn with its top edge at pixel row `y`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextLine {
    pub y: u32,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub size: DisplaySize,
    pub lines: Vec<TextLine>,
}

impl Frame {
    pub fn layout(size: DisplaySize, line_height: u32) -> FrameLayout {
        FrameLayout {
            frame: Frame { size, lines: vec![] },
            cursor: 0,
            line_height,
        }
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> + '_ {
        self.lines.iter().map(|line| line.text.as_str())
    }
}

/// Stacks lines top to bottom. Anything starting below the bottom edge is dropped.
#[derive(Debug)]
pub struct FrameLayout {
    frame: Frame,
    cursor: u32,
    line_height: u32,
}

impl FrameLayout {
    pub fn push(&mut self, text: impl Into<String>) -> &mut Self {
        if self.cursor < self.frame.size.height {
            self.frame.lines.push(TextLine {
                y: self.cursor,
                text: text.into(),
            });
        }
        self.cursor = self.cursor.saturating_add(self.line_height);
        self
    }

    pub fn cursor(&self) -> u32 {
        self.cursor
    }

    pub fn finish(self) -> Frame {
        self.frame
    }
}

pub trait DisplaySink {
    fn size(&self) -> DisplaySize;
    fn present(&mut self, frame: &Frame) -> Result<()>;
}

/// Draws the frame as a box of `columns` characters, one row per line.
pub fn render_boxed(frame: &Frame, columns: usize) -> String {
    let border = repeat('─').take(columns).collect::<String>();
    once(format!("┌{border}┐"))
        .chain(frame.texts().map(|text| format!("│{}│", pad_str(text, columns, Alignment::Left, Some("")))))
        .chain(once(format!(
            "└{}┘",
            pad_str(&frame.size.to_string(), columns, Alignment::Right, Some("")).replace(' ', "─")
        )))
        .join("\n")
}

pub struct TerminalDisplay {
    term: Term,
    size: DisplaySize,
    columns: usize,
}

impl TerminalDisplay {
    pub fn stdout(size: DisplaySize, columns: usize) -> Self {
        Self {
            term: Term::stdout(),
            size,
            columns,
        }
    }
}

impl DisplaySink for TerminalDisplay {
    fn size(&self) -> DisplaySize {
        self.size
    }

    fn present(&mut self, frame: &Frame) -> Result<()> {
        self.term
            .clear_screen()
            .and_then(|_| self.term.write_line(&render_boxed(frame, self.columns)))
            .context("drawing to terminal")
    }
}

/// Keeps every presented frame instead of drawing it.
#[derive(Debug)]
pub struct MemoryDisplay {
    size: DisplaySize,
    pub frames: Vec<Frame>,
}

impl MemoryDisplay {
    pub fn new(size: DisplaySize) -> Self {
        Self { size, frames: vec![] }
    }
    pub fn last(&self) -> Option<&Frame> {
        self.frames.last()
    }
}

impl DisplaySink for MemoryDisplay {
    fn size(&self) -> DisplaySize {
        self.size
    }

    #[instrument(skip_all, level = "DEBUG")]
    fn present(&mut self, frame: &Frame) -> Result<()> {
        frame
            .texts()
            .for_each(|text| info!("{text}"));
        self.frames.push(frame.clone());
        Ok(())
    }
}

#[derive(Debug, clap::ValueEnum, Clone, Copy, Default, PartialEq, Eq)]
pub enum Backend {
    #[default]
    Terminal,
    /// logs frames instead of drawing them
    Memory,
}

impl Backend {
    pub fn open(self, size: DisplaySize, columns: usize) -> Box<dyn DisplaySink> {
        match self {
            Backend::Terminal => Box::new(TerminalDisplay::stdout(size, columns)),
            Backend::Memory => Box::new(MemoryDisplay::new(size)),
        }
    }
}
