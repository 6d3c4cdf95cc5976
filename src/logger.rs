//! Box-drawing console output shared by every sol command.
//!
//! A session reads top to bottom as one tree:
//!
//! ```text
//! ┏ sol v0.4.0 ━━╸
//! ┃
//! ┣ Scheduling sunrise
//! ┃   Profile: Standard (30 min)
//! ┣[WARNING] Bulb not reachable, retrying once
//! ╹
//! ```
//!
//! ## Macros
//!
//! - **`log_version!`**: the `┏` header, once at startup
//! - **`log_block_start!`**: opens a block with a spacer pipe and `┣ message`
//! - **`log_indented!`**: a detail line under the current block
//! - **`log_pipe!`**: a lone `┃` spacer
//! - **`log_info!`, `log_warning!`, `log_error!`, `log_debug!`**: tagged messages
//! - **`log_error_exit!`**: an error that ends the flow, drawn with `┗`
//! - **`log_end!`**: the closing `╹`
//!
//! With `--log <file>` the same lines go, uncolored and timestamped, to a file
//! written from a background thread.

use std::io::Write;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Sender, channel};
use std::thread::JoinHandle;

static LOGGING_ENABLED: AtomicBool = AtomicBool::new(true);

// Set while a LoggerGuard is alive
static FILE_SINK: Mutex<Option<Sender<FileMessage>>> = Mutex::new(None);

enum FileMessage {
    Line(String),
    Shutdown,
}

/// Severity tag for the bracketed message macros.
#[doc(hidden)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warning,
    Error,
    Debug,
}

impl Level {
    fn tag(self) -> (&'static str, &'static str) {
        match self {
            Level::Info => ("32", "INFO"),
            Level::Warning => ("33", "WARNING"),
            Level::Error => ("31", "ERROR"),
            Level::Debug => ("36", "DEBUG"),
        }
    }
}

/// How one logical line is drawn.
#[doc(hidden)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Version,
    BlockStart,
    Indented,
    Pipe,
    Tagged(Level),
    ErrorExit,
    End,
}

/// Global switches for console output.
pub struct Log;

impl Log {
    /// Turn all output on or off. Tests switch it off to keep their output quiet.
    pub fn set_enabled(enabled: bool) {
        LOGGING_ENABLED.store(enabled, Ordering::SeqCst);
    }

    pub fn is_enabled() -> bool {
        LOGGING_ENABLED.load(Ordering::SeqCst)
    }

    /// Send all further output to `file_path` instead of stdout.
    ///
    /// Lines are written by a dedicated thread so a slow disk never stalls the
    /// pacing of a run. Output returns to stdout when the guard is dropped.
    pub fn start_file_logging(file_path: String) -> anyhow::Result<LoggerGuard> {
        let mut file = std::fs::File::create(&file_path)?;
        let (tx, rx) = channel();

        let mut sink = FILE_SINK.lock().unwrap_or_else(|e| e.into_inner());
        if sink.is_some() {
            anyhow::bail!("file logging is already active");
        }
        *sink = Some(tx.clone());

        let handle = std::thread::spawn(move || {
            while let Ok(FileMessage::Line(text)) = rx.recv() {
                file.write_all(text.as_bytes())?;
            }
            file.flush()?;
            Ok(())
        });

        Ok(LoggerGuard {
            tx,
            handle: Some(handle),
        })
    }
}

/// Keeps file logging active; flushes and closes the file on drop.
pub struct LoggerGuard {
    tx: Sender<FileMessage>,
    handle: Option<JoinHandle<anyhow::Result<()>>>,
}

impl Drop for LoggerGuard {
    fn drop(&mut self) {
        FILE_SINK.lock().unwrap_or_else(|e| e.into_inner()).take();
        let _ = self.tx.send(FileMessage::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

// Box-drawing layout of one line, without the trailing newline.
fn render(style: Style, message: &str) -> String {
    match style {
        Style::Version => format!("┏ sol v{} ━━╸", env!("CARGO_PKG_VERSION")),
        Style::BlockStart => format!("┃\n┣ {message}"),
        Style::Indented => format!("┃   {message}"),
        Style::Pipe => "┃".to_string(),
        Style::Tagged(level) => {
            let (color, tag) = level.tag();
            format!("┣[\x1b[{color}m{tag}\x1b[0m] {message}")
        }
        Style::ErrorExit => format!("┃\n┗[\x1b[31mERROR\x1b[0m] {message}"),
        Style::End => "╹".to_string(),
    }
}

// Strip ANSI color sequences (ESC [ ... m) for clean file output
fn strip_ansi_codes(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\x1b' && chars.peek() == Some(&'[') {
            chars.next();
            for ch in chars.by_ref() {
                if ch == 'm' {
                    break;
                }
            }
        } else {
            result.push(ch);
        }
    }

    result
}

fn timestamped(text: &str) -> String {
    let stamp = chrono::Local::now().format("%H:%M:%S");
    text.lines()
        .map(|line| format!("[{stamp}] {line}\n"))
        .collect()
}

/// Write one styled line to the active sink. Called by the logging macros.
#[doc(hidden)]
pub fn emit(style: Style, message: &str) {
    if !Log::is_enabled() {
        return;
    }
    let text = render(style, message);

    let sink = FILE_SINK.lock().unwrap_or_else(|e| e.into_inner());
    if let Some(tx) = sink.as_ref() {
        let _ = tx.send(FileMessage::Line(timestamped(&strip_ansi_codes(&text))));
        return;
    }
    drop(sink);

    let mut stdout = std::io::stdout().lock();
    let _ = writeln!(stdout, "{text}");
    let _ = stdout.flush();
}

/// Log the application version header.
#[macro_export]
macro_rules! log_version {
    () => {
        $crate::logger::emit($crate::logger::Style::Version, "")
    };
}

/// Open a new block of related lines.
#[macro_export]
macro_rules! log_block_start {
    ($($arg:tt)*) => {
        $crate::logger::emit($crate::logger::Style::BlockStart, &format!($($arg)*))
    };
}

/// Log a detail line under the current block.
#[macro_export]
macro_rules! log_indented {
    ($($arg:tt)*) => {
        $crate::logger::emit($crate::logger::Style::Indented, &format!($($arg)*))
    };
}

/// Log a visual pipe separator for vertical spacing.
#[macro_export]
macro_rules! log_pipe {
    () => {
        $crate::logger::emit($crate::logger::Style::Pipe, "")
    };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::logger::emit(
            $crate::logger::Style::Tagged($crate::logger::Level::Info),
            &format!($($arg)*),
        )
    };
}

#[macro_export]
macro_rules! log_warning {
    ($($arg:tt)*) => {
        $crate::logger::emit(
            $crate::logger::Style::Tagged($crate::logger::Level::Warning),
            &format!($($arg)*),
        )
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        $crate::logger::emit(
            $crate::logger::Style::Tagged($crate::logger::Level::Error),
            &format!($($arg)*),
        )
    };
}

/// Debug detail, only emitted by callers that checked `--debug`.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        $crate::logger::emit(
            $crate::logger::Style::Tagged($crate::logger::Level::Debug),
            &format!($($arg)*),
        )
    };
}

/// Log an error that ends the current flow, closing the block with `┗`.
#[macro_export]
macro_rules! log_error_exit {
    ($($arg:tt)*) => {
        $crate::logger::emit($crate::logger::Style::ErrorExit, &format!($($arg)*))
    };
}

/// Log the final termination marker.
#[macro_export]
macro_rules! log_end {
    () => {
        $crate::logger::emit($crate::logger::Style::End, "")
    };
}
