/// Conway's Game of Life (B3/S23):
/// 1. Live cell with 2-3 neighbors survives
/// 2. Dead cell with exactly 3 neighbors becomes alive
/// 3. All other cases result in death
pub const fn next_state(alive: bool, neighbors: u8) -> bool {
    matches!((alive, neighbors), (true, 2 | 3) | (false, 3))
}

/// Rule strings accepted as B3/S23 by the pattern readers
pub fn is_conway_rule(rule: &str) -> bool {
    let normalized: String = rule
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_uppercase();
    matches!(normalized.as_str(), "B3/S23" | "S23/B3" | "23/3")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_underpopulation() {
        assert!(!next_state(true, 0));
        assert!(!next_state(true, 1));
    }

    #[test]
    fn test_survival() {
        assert!(next_state(true, 2));
        assert!(next_state(true, 3));
    }

    #[test]
    fn test_overpopulation() {
        assert!(!next_state(true, 4));
        assert!(!next_state(true, 8));
    }

    #[test]
    fn test_reproduction() {
        assert!(next_state(false, 3));
        assert!(!next_state(false, 2));
        assert!(!next_state(false, 6));
    }

    #[test]
    fn test_rule_strings() {
        assert!(is_conway_rule("B3/S23"));
        assert!(is_conway_rule("b3/s23"));
        assert!(is_conway_rule("23/3"));
        assert!(!is_conway_rule("B36/S23"));
    }
}
