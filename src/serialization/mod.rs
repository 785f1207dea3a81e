//! Pattern-file readers and writers.
//!
//! Readers never fail on malformed content. Every problem becomes a
//! [`ParseMessage`] in either the warning or the error list of a
//! [`DeserializationResult`], so a caller sees everything wrong with a file in
//! one pass. Only unreadable input (I/O) or an unknown file type is an `Err`.

mod life105;
mod life106;
mod plaintext;
mod rle;

use std::fs;
use std::path::Path;

use log::debug;
use thiserror::Error;

use crate::domain::{CellState, Coordinate};

/// Warning and error tokens produced by the readers.
/// `line` and `column` are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseMessage {
    #[error("the file is empty")]
    UnexpectedEmptyFile,

    #[error("line {line}, column {column}: unexpected character {character:?}")]
    UnexpectedCharacter {
        line: usize,
        column: usize,
        character: char,
    },

    #[error("line {line}: blank line inside the pattern, treated as a dead row")]
    UnexpectedBlankLine { line: usize },

    #[error("line {line}: unexpected input after the end of the pattern")]
    UnexpectedInput { line: usize },

    #[error("missing `{expected}` header")]
    MissingHeader { expected: &'static str },

    #[error("line {line}: header belongs to a different format")]
    UnexpectedHeader { line: usize },

    #[error("line {line}: malformed header")]
    InvalidHeader { line: usize },

    #[error("line {line}: unsupported rule `{rule}`, reading as B3/S23")]
    UnsupportedRule { line: usize, rule: String },

    #[error("line {line}: unknown directive `{directive}`")]
    UnknownDirective { line: usize, directive: String },

    #[error("line {line}: expected two values")]
    UnexpectedShortLine { line: usize },

    #[error("line {line}: `{token}` is not a valid integer")]
    InvalidNumber { line: usize, token: String },

    #[error("line {line}: cell rows before any `#P` block are placed at the origin")]
    ImplicitBlockPosition { line: usize },

    #[error("missing `!` terminator")]
    MissingTerminator,

    #[error("line {line}: cells extend past the size declared in the header")]
    PatternExceedsBounds { line: usize },

    #[error("line {line}, column {column}: invalid run count")]
    InvalidRunCount { line: usize, column: usize },

    #[error("line {line}: coordinate out of range")]
    CoordinateOutOfRange { line: usize },
}

/// Outcome of reading a pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeserializationResult {
    Successful {
        cell_state: CellState,
        warnings: Vec<ParseMessage>,
    },
    Unsuccessful {
        warnings: Vec<ParseMessage>,
        errors: Vec<ParseMessage>,
    },
}

impl DeserializationResult {
    pub fn is_successful(&self) -> bool {
        matches!(self, DeserializationResult::Successful { .. })
    }

    pub fn cell_state(&self) -> Option<&CellState> {
        match self {
            DeserializationResult::Successful { cell_state, .. } => Some(cell_state),
            DeserializationResult::Unsuccessful { .. } => None,
        }
    }

    pub fn warnings(&self) -> &[ParseMessage] {
        match self {
            DeserializationResult::Successful { warnings, .. }
            | DeserializationResult::Unsuccessful { warnings, .. } => warnings,
        }
    }

    pub fn errors(&self) -> &[ParseMessage] {
        match self {
            DeserializationResult::Successful { .. } => &[],
            DeserializationResult::Unsuccessful { errors, .. } => errors,
        }
    }
}

/// Accumulates cells and messages while a reader walks its input
#[derive(Debug, Default)]
pub(crate) struct Collector {
    cells: Vec<Coordinate>,
    warnings: Vec<ParseMessage>,
    errors: Vec<ParseMessage>,
}

impl Collector {
    pub(crate) fn warn(&mut self, message: ParseMessage) {
        self.warnings.push(message);
    }

    pub(crate) fn error(&mut self, message: ParseMessage) {
        self.errors.push(message);
    }

    /// Record an alive cell at an `i64` position, rejecting anything outside `i32`
    pub(crate) fn alive(&mut self, x: i64, y: i64, line: usize) -> bool {
        match (i32::try_from(x), i32::try_from(y)) {
            (Ok(x), Ok(y)) => {
                self.cells.push(Coordinate::new(x, y));
                true
            }
            _ => {
                self.error(ParseMessage::CoordinateOutOfRange { line });
                false
            }
        }
    }

    pub(crate) fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub(crate) fn finish(self) -> DeserializationResult {
        if self.errors.is_empty() {
            DeserializationResult::Successful {
                cell_state: self.cells.into_iter().collect(),
                warnings: self.warnings,
            }
        } else {
            DeserializationResult::Unsuccessful {
                warnings: self.warnings,
                errors: self.errors,
            }
        }
    }
}

/// Result for input containing nothing but whitespace
pub(crate) fn empty_file() -> DeserializationResult {
    DeserializationResult::Successful {
        cell_state: CellState::empty(),
        warnings: vec![ParseMessage::UnexpectedEmptyFile],
    }
}

/// Lines with their 1-based numbers and any `\r` stripped
pub(crate) fn numbered_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.strip_suffix('\r').unwrap_or(line)))
}

#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no pattern format is associated with {0}")]
    UnknownFormat(String),
}

/// Supported pattern file formats
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CellStateFormat {
    /// `.cells`: `O` alive, `.` dead, `!` comments
    Plaintext,
    /// `.lif`: `#Life 1.05` with `#P` positioned blocks
    Life105,
    /// `.lif`: `#Life 1.06`, one coordinate pair per line
    Life106,
    /// `.rle`: run length encoded
    Rle,
}

impl CellStateFormat {
    pub fn all() -> [CellStateFormat; 4] {
        [
            CellStateFormat::Plaintext,
            CellStateFormat::Life105,
            CellStateFormat::Rle,
            CellStateFormat::Life106,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            CellStateFormat::Plaintext => "Plaintext",
            CellStateFormat::Life105 => "Life 1.05",
            CellStateFormat::Life106 => "Life 1.06",
            CellStateFormat::Rle => "RLE",
        }
    }

    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            CellStateFormat::Plaintext => &["cells", "txt"],
            CellStateFormat::Life105 | CellStateFormat::Life106 => &["lif", "life"],
            CellStateFormat::Rle => &["rle"],
        }
    }

    /// Format implied by a file's extension. `.lif` maps to Life 1.05;
    /// [`read_file`] refines it from the header.
    pub fn from_path(path: impl AsRef<Path>) -> Option<CellStateFormat> {
        let extension = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        Self::all()
            .into_iter()
            .find(|format| format.extensions().contains(&extension.as_str()))
    }

    /// Guess the format from the first meaningful line
    pub fn detect(text: &str) -> Option<CellStateFormat> {
        let first = text.lines().map(str::trim).find(|line| !line.is_empty())?;
        if first.starts_with("#Life 1.06") {
            Some(CellStateFormat::Life106)
        } else if first.starts_with("#Life 1.05") {
            Some(CellStateFormat::Life105)
        } else if first.starts_with('!') {
            Some(CellStateFormat::Plaintext)
        } else if first.starts_with("#C") || first.starts_with("#N") || first.starts_with("#O")
            || (first.starts_with('x') && first.contains('='))
        {
            Some(CellStateFormat::Rle)
        } else {
            None
        }
    }

    pub fn deserialize(&self, text: &str) -> DeserializationResult {
        match self {
            CellStateFormat::Plaintext => plaintext::deserialize(text),
            CellStateFormat::Life105 => life105::deserialize(text),
            CellStateFormat::Life106 => life106::deserialize(text),
            CellStateFormat::Rle => rle::deserialize(text),
        }
    }

    pub fn serialize(&self, cell_state: &CellState) -> String {
        match self {
            CellStateFormat::Plaintext => plaintext::serialize(cell_state),
            CellStateFormat::Life105 => life105::serialize(cell_state),
            CellStateFormat::Life106 => life106::serialize(cell_state),
            CellStateFormat::Rle => rle::serialize(cell_state),
        }
    }
}

/// Try the detected format first, then every other format, and return the
/// first successful read. If none succeeds, the first attempt's result is
/// returned.
pub fn deserialize_any(text: &str) -> DeserializationResult {
    let detected = CellStateFormat::detect(text);
    let order = detected.into_iter().chain(
        CellStateFormat::all()
            .into_iter()
            .filter(|format| Some(*format) != detected),
    );

    let mut first_failure = None;
    for format in order {
        let result = format.deserialize(text);
        if result.is_successful() {
            debug!("read pattern as {}", format.name());
            return result;
        }
        first_failure.get_or_insert(result);
    }
    first_failure.unwrap_or_else(empty_file)
}

/// Read a pattern file, choosing the reader from its extension and header
pub fn read_file(path: impl AsRef<Path>) -> Result<DeserializationResult, SerializationError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| SerializationError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let result = match CellStateFormat::from_path(path) {
        Some(CellStateFormat::Life105 | CellStateFormat::Life106) => {
            match CellStateFormat::detect(&text) {
                Some(CellStateFormat::Life106) => CellStateFormat::Life106.deserialize(&text),
                _ => CellStateFormat::Life105.deserialize(&text),
            }
        }
        Some(format) => format.deserialize(&text),
        None => deserialize_any(&text),
    };

    for warning in result.warnings() {
        debug!("{}: {}", path.display(), warning);
    }
    for error in result.errors() {
        debug!("{}: {}", path.display(), error);
    }
    Ok(result)
}

/// Write a pattern file in the format implied by its extension
pub fn write_file(
    path: impl AsRef<Path>,
    cell_state: &CellState,
) -> Result<(), SerializationError> {
    let path = path.as_ref();
    let format = CellStateFormat::from_path(path)
        .ok_or_else(|| SerializationError::UnknownFormat(path.display().to_string()))?;
    fs::write(path, format.serialize(cell_state)).map_err(|source| SerializationError::Io {
        path: path.display().to_string(),
        source,
    })
}
