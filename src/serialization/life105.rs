use super::{Collector, DeserializationResult, ParseMessage, empty_file, numbered_lines};
use crate::domain::{CellState, Coordinate, is_conway_rule};

const HEADER: &str = "#Life 1.05";

struct Block {
    x: i64,
    y: i64,
    row: i64,
}

fn parse_position(
    line: usize,
    arguments: &str,
    collector: &mut Collector,
) -> Option<(i64, i64)> {
    let mut tokens = arguments.split_whitespace();
    let (Some(x), Some(y)) = (tokens.next(), tokens.next()) else {
        collector.error(ParseMessage::UnexpectedShortLine { line });
        return None;
    };
    if tokens.next().is_some() {
        collector.warn(ParseMessage::UnexpectedInput { line });
    }
    let parse = |token: &str, collector: &mut Collector| match token.parse::<i64>() {
        Ok(value) => Some(value),
        Err(_) => {
            collector.error(ParseMessage::InvalidNumber {
                line,
                token: token.to_string(),
            });
            None
        }
    };
    let x = parse(x, collector);
    let y = parse(y, collector);
    Some((x?, y?))
}

pub fn deserialize(text: &str) -> DeserializationResult {
    if text.trim().is_empty() {
        return empty_file();
    }

    let mut collector = Collector::default();
    let mut block: Option<Block> = None;
    let mut first_line = true;

    for (line_number, line) in numbered_lines(text) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if first_line {
            first_line = false;
            if line.starts_with(HEADER) {
                continue;
            }
            if line.starts_with("#Life") {
                collector.error(ParseMessage::UnexpectedHeader { line: line_number });
                continue;
            }
            collector.warn(ParseMessage::MissingHeader { expected: HEADER });
        }

        if let Some(directive) = line.strip_prefix('#') {
            let name_len = directive.chars().next().map_or(0, char::len_utf8);
            let (name, arguments) = directive.split_at(name_len);
            match name {
                "D" | "C" | "N" => {}
                "R" => {
                    let rule = arguments.trim();
                    if !is_conway_rule(rule) {
                        collector.warn(ParseMessage::UnsupportedRule {
                            line: line_number,
                            rule: rule.to_string(),
                        });
                    }
                }
                "P" => {
                    if let Some((x, y)) = parse_position(line_number, arguments, &mut collector) {
                        block = Some(Block { x, y, row: 0 });
                    }
                }
                "L" if directive.starts_with("Life") => {
                    collector.error(ParseMessage::UnexpectedHeader { line: line_number });
                }
                _ => collector.warn(ParseMessage::UnknownDirective {
                    line: line_number,
                    directive: format!("#{name}"),
                }),
            }
            continue;
        }

        let current = block.get_or_insert_with(|| {
            collector.warn(ParseMessage::ImplicitBlockPosition { line: line_number });
            Block { x: 0, y: 0, row: 0 }
        });
        for (column, character) in line.chars().enumerate() {
            match character {
                '*' => {
                    collector.alive(current.x + column as i64, current.y + current.row, line_number);
                }
                '.' => {}
                _ => collector.error(ParseMessage::UnexpectedCharacter {
                    line: line_number,
                    column: column + 1,
                    character,
                }),
            }
        }
        current.row += 1;
    }

    collector.finish()
}

/// One `#P` block anchored at the bounding box, so absolute position survives
pub fn serialize(cell_state: &CellState) -> String {
    let mut out = format!("{HEADER}\n#N\n");
    let Some(bounds) = cell_state.bounding_box() else {
        return out;
    };
    let alive = cell_state.alive_cells();
    out.push_str(&format!("#P {} {}\n", bounds.min.x, bounds.min.y));
    for y in bounds.min.y..=bounds.max.y {
        for x in bounds.min.x..=bounds.max.x {
            out.push(if alive.contains(&Coordinate::new(x, y)) { '*' } else { '.' });
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::presets;

    fn cells(coords: &[(i32, i32)]) -> CellState {
        coords.iter().map(|&c| Coordinate::from(c)).collect()
    }

    #[test]
    fn test_reads_positioned_blocks() {
        let text = "#Life 1.05\n#D two blocks\n#N\n#P -1 -1\n.*\n*.\n#P 10 3\n**\n";
        let result = deserialize(text);
        assert_eq!(
            result.cell_state(),
            Some(&cells(&[(0, -1), (-1, 0), (10, 3), (11, 3)]))
        );
        assert!(result.warnings().is_empty());
    }

    #[test]
    fn test_missing_header_and_implicit_block_warn() {
        let result = deserialize("*.*\n");
        assert_eq!(result.cell_state(), Some(&cells(&[(0, 0), (2, 0)])));
        assert_eq!(
            result.warnings(),
            &[
                ParseMessage::MissingHeader { expected: HEADER },
                ParseMessage::ImplicitBlockPosition { line: 1 },
            ]
        );
    }

    #[test]
    fn test_rules() {
        let ok = deserialize("#Life 1.05\n#R 23/3\n#P 0 0\n*\n");
        assert!(ok.warnings().is_empty());

        let highlife = deserialize("#Life 1.05\n#R 23/36\n#P 0 0\n*\n");
        assert!(highlife.is_successful());
        assert_eq!(
            highlife.warnings(),
            &[ParseMessage::UnsupportedRule { line: 2, rule: "23/36".to_string() }]
        );
    }

    #[test]
    fn test_errors() {
        let result = deserialize("#Life 1.05\n#P 1\n#P a 2\n*O\n");
        assert!(!result.is_successful());
        assert_eq!(
            result.errors(),
            &[
                ParseMessage::UnexpectedShortLine { line: 2 },
                ParseMessage::InvalidNumber { line: 3, token: "a".to_string() },
                ParseMessage::UnexpectedCharacter { line: 4, column: 2, character: 'O' },
            ]
        );
    }

    #[test]
    fn test_other_life_version_is_rejected() {
        let result = deserialize("#Life 1.06\n0 0\n");
        assert!(result.errors().contains(&ParseMessage::UnexpectedHeader { line: 1 }));
    }

    #[test]
    fn test_writer_keeps_position() {
        let state = presets::glider().placed_at(Coordinate::new(-4, 9)).unwrap();
        let text = serialize(&state);
        assert!(text.starts_with("#Life 1.05\n#N\n#P -4 9\n"));
        assert_eq!(deserialize(&text).cell_state(), Some(&state));
    }
}
