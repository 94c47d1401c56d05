//! Result rendering for the command line.

use owo_colors::OwoColorize;

use crate::search::SearchOutcome;
use crate::signal::format_ordering;

/// Two-line human summary of the winning ordering.
pub fn render_text(outcome: &SearchOutcome, color: bool) -> String {
    let ordering = format_ordering(&outcome.best.ordering);
    let signal = outcome.best.signal.to_string();
    let (ordering, signal) = if color {
        (
            ordering.bold().cyan().to_string(),
            signal.bold().green().to_string(),
        )
    } else {
        (ordering, signal)
    };
    format!(
        "Phase sequence with maximum thrust signal: {ordering}.\nMaximum thrust signal: {signal}."
    )
}

pub fn render_json(outcome: &SearchOutcome) -> serde_json::Result<String> {
    serde_json::to_string_pretty(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::BestResult;

    fn outcome() -> SearchOutcome {
        SearchOutcome {
            best: BestResult {
                ordering: vec![9, 8, 7, 6, 5],
                signal: 139629729,
            },
            trials: 120,
        }
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(
            render_text(&outcome(), false),
            "Phase sequence with maximum thrust signal: 9-8-7-6-5.\nMaximum thrust signal: 139629729."
        );
    }

    #[test]
    fn test_colored_text_keeps_values() {
        let text = render_text(&outcome(), true);
        assert!(text.contains("9-8-7-6-5"));
        assert!(text.contains("139629729"));
        assert!(text.contains('\u{1b}'));
    }

    #[test]
    fn test_json() {
        let value: serde_json::Value = serde_json::from_str(&render_json(&outcome()).unwrap()).unwrap();
        assert_eq!(value["best"]["signal"], 139629729);
        assert_eq!(value["best"]["ordering"][0], 9);
        assert_eq!(value["trials"], 120);
    }
}
