use super::{Collector, DeserializationResult, ParseMessage, empty_file, numbered_lines};
use crate::domain::CellState;

const HEADER: &str = "#Life 1.06";

pub fn deserialize(text: &str) -> DeserializationResult {
    if text.trim().is_empty() {
        return empty_file();
    }

    let mut collector = Collector::default();
    let mut lines = numbered_lines(text)
        .map(|(n, line)| (n, line.trim()))
        .filter(|(_, line)| !line.is_empty())
        .peekable();

    let first = lines.peek().copied();
    match first {
        Some((_, line)) if line.starts_with(HEADER) => {
            lines.next();
        }
        Some((n, line)) if line.starts_with("#Life") => {
            collector.error(ParseMessage::UnexpectedHeader { line: n });
            lines.next();
        }
        _ => collector.warn(ParseMessage::MissingHeader { expected: HEADER }),
    }

    for (line_number, line) in lines {
        if line.starts_with('#') {
            continue;
        }
        let mut tokens = line.split_whitespace();
        let (Some(x), Some(y)) = (tokens.next(), tokens.next()) else {
            collector.error(ParseMessage::UnexpectedShortLine { line: line_number });
            continue;
        };
        if tokens.next().is_some() {
            collector.warn(ParseMessage::UnexpectedInput { line: line_number });
        }

        let mut parse = |token: &str| match token.parse::<i64>() {
            Ok(value) => Some(value),
            Err(_) => {
                collector.error(ParseMessage::InvalidNumber {
                    line: line_number,
                    token: token.to_string(),
                });
                None
            }
        };
        let x = parse(x);
        let y = parse(y);
        if let (Some(x), Some(y)) = (x, y) {
            collector.alive(x, y, line_number);
        }
    }

    collector.finish()
}

/// One line per alive cell, sorted row-major
pub fn serialize(cell_state: &CellState) -> String {
    let mut cells: Vec<_> = cell_state.alive_cells().iter().copied().collect();
    cells.sort_by_key(|c| (c.y, c.x));

    let mut out = format!("{HEADER}\n");
    for cell in cells {
        out.push_str(&format!("{} {}\n", cell.x, cell.y));
    }
    out
}
