//! History trimming policy.
//!
//! Bounds a conversation to a character budget before it is forwarded to the
//! completion backend. Deliberately a greedy, most-recent-first,
//! single-truncation-point policy -- not a sliding window and not
//! token-aware. Characters are a conservative proxy for the model's context
//! window; exactness is traded for predictability.
//!
//! The stored history is never mutated by trimming. Only the outbound
//! projection is bounded.

use palaver_types::turn::Turn;

/// Bound `history` to at most `max_chars` characters of content.
///
/// Walks from the most recent turn backwards, including turns whole while
/// they fit. The first turn that does not fit whole is truncated to exactly
/// the remaining budget -- keeping its role and the first `remaining`
/// characters of its content -- and the walk stops there: no older turn is
/// considered after a truncation. The result is returned in chronological
/// order.
///
/// A budget of zero yields an empty result. A single turn longer than the
/// whole budget yields exactly one truncated turn.
pub fn trim_history(history: &[Turn], max_chars: usize) -> Vec<Turn> {
    let mut kept: Vec<Turn> = Vec::new();
    let mut total = 0usize;

    for turn in history.iter().rev() {
        let remaining = max_chars - total;
        if remaining == 0 {
            break;
        }

        let content_len = turn.char_len();
        if content_len > remaining {
            let truncated: String = turn.content.chars().take(remaining).collect();
            kept.push(Turn::new(turn.role, truncated));
            break;
        }

        kept.push(turn.clone());
        total += content_len;
    }

    kept.reverse();
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use palaver_types::turn::Role;

    fn turns(contents: &[&str]) -> Vec<Turn> {
        contents
            .iter()
            .enumerate()
            .map(|(i, c)| {
                if i % 2 == 0 {
                    Turn::user(*c)
                } else {
                    Turn::assistant(*c)
                }
            })
            .collect()
    }

    #[test]
    fn test_zero_budget_yields_empty() {
        let history = turns(&["hello", "world"]);
        assert!(trim_history(&history, 0).is_empty());
    }

    #[test]
    fn test_everything_fits_unchanged() {
        let history = turns(&["hello", "world"]);
        assert_eq!(trim_history(&history, 100), history);
    }

    #[test]
    fn test_single_overlong_turn_truncates_to_budget() {
        let history = vec![Turn::user("0123456789ABC")];
        let trimmed = trim_history(&history, 10);
        assert_eq!(trimmed.len(), 1);
        assert_eq!(trimmed[0].role, Role::User);
        assert_eq!(trimmed[0].content, "0123456789");
    }

    #[test]
    fn test_oldest_turn_truncated_walk_stops() {
        // Budget 8: "reply" (5) fits whole, "question" truncates to the
        // remaining 3 characters, and "dropped" is never reached.
        let history = turns(&["dropped", "question", "reply"]);
        let trimmed = trim_history(&history, 8);

        assert_eq!(trimmed.len(), 2);
        assert_eq!(trimmed[0].content, "que");
        assert_eq!(trimmed[0].role, Role::Assistant);
        assert_eq!(trimmed[1].content, "reply");
    }

    #[test]
    fn test_exact_fit_stops_without_truncation() {
        let history = turns(&["old", "abcde"]);
        let trimmed = trim_history(&history, 5);
        assert_eq!(trimmed, vec![Turn::assistant("abcde")]);
    }

    #[test]
    fn test_result_is_chronological() {
        let history = turns(&["a", "b", "c"]);
        let trimmed = trim_history(&history, 100);
        let contents: Vec<&str> = trimmed.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_idempotent() {
        let history = turns(&["some long opening message", "a reply", "another question"]);
        for budget in [0, 1, 5, 10, 25, 1000] {
            let once = trim_history(&history, budget);
            let twice = trim_history(&once, budget);
            assert_eq!(twice, once, "budget {budget}");
        }
    }

    #[test]
    fn test_multibyte_content_cut_on_char_boundary() {
        let history = vec![Turn::user("héllo wörld")];
        let trimmed = trim_history(&history, 4);
        assert_eq!(trimmed[0].content, "héll");
    }

    #[test]
    fn test_empty_history() {
        assert!(trim_history(&[], 100).is_empty());
    }
}
