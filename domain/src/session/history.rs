//! Conversation history budgeting.

use super::entities::Message;

/// Rough token estimate used for budgeting: four characters per token.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / 4
}

/// Keep the most recent messages whose estimated token total fits `max_tokens`.
///
/// Walks backwards from the newest turn and stops at the first message that
/// would overflow the budget, so the result is always a contiguous suffix in
/// the original order.
pub fn truncate_history(messages: &[Message], max_tokens: usize) -> Vec<Message> {
    let mut used = 0;
    let mut start = messages.len();

    for (idx, message) in messages.iter().enumerate().rev() {
        let tokens = estimate_tokens(&message.content);
        if used + tokens > max_tokens {
            break;
        }
        used += tokens;
        start = idx;
    }

    messages[start..].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(chars: usize) -> Message {
        Message::user("x".repeat(chars))
    }

    #[test]
    fn test_keeps_everything_under_budget() {
        let history = vec![msg(40), msg(40)];
        assert_eq!(truncate_history(&history, 100).len(), 2);
    }

    #[test]
    fn test_drops_oldest_first() {
        let history = vec![
            Message::user("a".repeat(400)),
            Message::assistant("b".repeat(40)),
            Message::user("c".repeat(40)),
        ];
        let kept = truncate_history(&history, 25);
        assert_eq!(kept.len(), 2);
        assert!(kept[0].content.starts_with('b'));
        assert!(kept[1].content.starts_with('c'));
    }

    #[test]
    fn test_stops_at_first_overflow() {
        // The oldest message would fit on its own but lies behind an oversized one.
        let history = vec![msg(4), msg(4000), msg(4)];
        let kept = truncate_history(&history, 10);
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn test_empty_history() {
        assert!(truncate_history(&[], 10).is_empty());
    }
}
