use super::{Collector, DeserializationResult, ParseMessage, empty_file, numbered_lines};
use crate::domain::{CellState, Coordinate};

pub fn deserialize(text: &str) -> DeserializationResult {
    if text.trim().is_empty() {
        return empty_file();
    }

    let mut collector = Collector::default();
    let mut row: i64 = 0;
    let mut started = false;
    let mut pending_blank = Vec::new();

    for (line_number, line) in numbered_lines(text) {
        if line.starts_with('!') {
            continue;
        }
        let line = line.trim_end();
        if line.is_empty() {
            if started {
                pending_blank.push(line_number);
            }
            continue;
        }

        // Blank lines only count once more rows follow them
        for blank in pending_blank.drain(..) {
            collector.warn(ParseMessage::UnexpectedBlankLine { line: blank });
            row += 1;
        }
        started = true;

        for (column, character) in line.chars().enumerate() {
            match character {
                'O' => {
                    collector.alive(column as i64, row, line_number);
                }
                '.' => {}
                _ => collector.error(ParseMessage::UnexpectedCharacter {
                    line: line_number,
                    column: column + 1,
                    character,
                }),
            }
        }
        row += 1;
    }

    collector.finish()
}

pub fn serialize(cell_state: &CellState) -> String {
    let mut out = String::new();
    let Some(bounds) = cell_state.bounding_box() else {
        out.push_str("!Empty\n");
        return out;
    };
    let alive = cell_state.alive_cells();
    for y in bounds.min.y..=bounds.max.y {
        for x in bounds.min.x..=bounds.max.x {
            out.push(if alive.contains(&Coordinate::new(x, y)) { 'O' } else { '.' });
        }
        out.push('\n');
    }
    out
}
