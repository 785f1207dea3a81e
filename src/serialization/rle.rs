use std::collections::HashSet;

use super::{Collector, DeserializationResult, ParseMessage, empty_file, numbered_lines};
use crate::domain::{CellState, Coordinate, is_conway_rule};

const HEADER: &str = "x = <width>, y = <height>";
const LINE_LIMIT: usize = 70;

struct Header {
    width: u64,
    height: u64,
}

fn parse_header(line_number: usize, line: &str, collector: &mut Collector) -> Option<Header> {
    let mut width = None;
    let mut height = None;
    for part in line.split(',') {
        let Some((key, value)) = part.split_once('=') else {
            collector.error(ParseMessage::InvalidHeader { line: line_number });
            return None;
        };
        let value = value.trim();
        match key.trim() {
            "x" => width = value.parse::<u64>().ok(),
            "y" => height = value.parse::<u64>().ok(),
            "rule" => {
                if !is_conway_rule(value) {
                    collector.warn(ParseMessage::UnsupportedRule {
                        line: line_number,
                        rule: value.to_string(),
                    });
                }
            }
            _ => {
                collector.error(ParseMessage::InvalidHeader { line: line_number });
                return None;
            }
        }
    }
    match (width, height) {
        (Some(width), Some(height)) => Some(Header { width, height }),
        _ => {
            collector.error(ParseMessage::InvalidHeader { line: line_number });
            None
        }
    }
}

/// Cursor over the run-length body
#[derive(Default)]
struct Body {
    x: i64,
    y: i64,
    count: Option<u64>,
    terminated: bool,
    exceeded: bool,
}

impl Body {
    fn read_line(
        &mut self,
        line_number: usize,
        line: &str,
        header: Option<&Header>,
        collector: &mut Collector,
    ) {
        for (column, character) in line.chars().enumerate() {
            let column = column + 1;
            if self.terminated {
                if !character.is_whitespace() {
                    collector.warn(ParseMessage::UnexpectedInput { line: line_number });
                    return;
                }
                continue;
            }
            match character {
                '0'..='9' => {
                    let digit = u64::from(character as u8 - b'0');
                    self.count = match self.count.unwrap_or(0).checked_mul(10) {
                        Some(n) => n.checked_add(digit),
                        None => None,
                    };
                    if self.count.is_none() {
                        collector.error(ParseMessage::InvalidRunCount {
                            line: line_number,
                            column,
                        });
                    }
                }
                'b' | 'o' | '$' => {
                    let run = self.count.take().unwrap_or(1);
                    if run == 0 {
                        collector.error(ParseMessage::InvalidRunCount {
                            line: line_number,
                            column,
                        });
                        continue;
                    }
                    let Ok(run) = i64::try_from(run) else {
                        collector.error(ParseMessage::CoordinateOutOfRange { line: line_number });
                        continue;
                    };
                    match character {
                        'b' => self.x = self.x.saturating_add(run),
                        'o' => self.alive_run(run, line_number, header, collector),
                        _ => {
                            self.y = self.y.saturating_add(run);
                            self.x = 0;
                        }
                    }
                }
                '!' => self.terminated = true,
                c if c.is_whitespace() => {}
                _ => collector.error(ParseMessage::UnexpectedCharacter {
                    line: line_number,
                    column,
                    character,
                }),
            }
        }
    }

    fn alive_run(
        &mut self,
        run: i64,
        line_number: usize,
        header: Option<&Header>,
        collector: &mut Collector,
    ) {
        let end = self.x.saturating_add(run);
        if end - 1 > i64::from(i32::MAX) || self.y > i64::from(i32::MAX) {
            collector.error(ParseMessage::CoordinateOutOfRange { line: line_number });
            self.x = end;
            return;
        }
        if let Some(header) = header {
            let outside = end as u64 > header.width || self.y as u64 >= header.height;
            if outside && !self.exceeded {
                self.exceeded = true;
                collector.warn(ParseMessage::PatternExceedsBounds { line: line_number });
            }
        }
        for x in self.x..end {
            collector.alive(x, self.y, line_number);
        }
        self.x = end;
    }
}

pub fn deserialize(text: &str) -> DeserializationResult {
    if text.trim().is_empty() {
        return empty_file();
    }

    let mut collector = Collector::default();
    let mut header: Option<Header> = None;
    let mut in_body = false;
    let mut body = Body::default();

    for (line_number, line) in numbered_lines(text) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if !body.terminated && line.starts_with('#') {
            if let Some(rule) = line.strip_prefix("#r") {
                let rule = rule.trim();
                if !is_conway_rule(rule) {
                    collector.warn(ParseMessage::UnsupportedRule {
                        line: line_number,
                        rule: rule.to_string(),
                    });
                }
            }
            continue;
        }
        if !in_body {
            in_body = true;
            if line.starts_with('x') {
                header = parse_header(line_number, line, &mut collector);
                continue;
            }
            collector.error(ParseMessage::MissingHeader { expected: HEADER });
        }
        body.read_line(line_number, line, header.as_ref(), &mut collector);
        if body.terminated && collector.has_errors() {
            break;
        }
    }

    if !body.terminated {
        collector.warn(ParseMessage::MissingTerminator);
    }
    collector.finish()
}

/// Run tokens for one row; trailing dead cells are dropped
fn encode_row(alive: &HashSet<Coordinate>, y: i32, min_x: i32, max_x: i32) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut run: Option<(bool, u64)> = None;
    for x in min_x..=max_x {
        let state = alive.contains(&Coordinate::new(x, y));
        run = match run {
            Some((current, n)) if current == state => Some((current, n + 1)),
            Some((current, n)) => {
                tokens.push(run_token(n, if current { 'o' } else { 'b' }));
                Some((state, 1))
            }
            None => Some((state, 1)),
        };
    }
    if let Some((true, n)) = run {
        tokens.push(run_token(n, 'o'));
    }
    tokens
}

fn run_token(count: u64, tag: char) -> String {
    if count == 1 {
        tag.to_string()
    } else {
        format!("{count}{tag}")
    }
}

pub fn serialize(cell_state: &CellState) -> String {
    let Some(bounds) = cell_state.bounding_box() else {
        return "x = 0, y = 0, rule = B3/S23\n!\n".to_string();
    };
    let alive = cell_state.alive_cells();

    let mut tokens = Vec::new();
    let mut pending_rows = 0u64;
    for y in bounds.min.y..=bounds.max.y {
        let row = encode_row(&alive, y, bounds.min.x, bounds.max.x);
        if row.is_empty() {
            pending_rows += 1;
            continue;
        }
        if pending_rows > 0 {
            tokens.push(run_token(pending_rows, '$'));
        }
        tokens.extend(row);
        pending_rows = 1;
    }
    tokens.push("!".to_string());

    let mut out = format!(
        "x = {}, y = {}, rule = B3/S23\n",
        bounds.width(),
        bounds.height()
    );
    let mut line_length = 0;
    for token in tokens {
        if line_length + token.len() > LINE_LIMIT {
            out.push('\n');
            line_length = 0;
        }
        line_length += token.len();
        out.push_str(&token);
    }
    out.push('\n');
    out
}
