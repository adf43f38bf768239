//! Word-by-word streaming for providers without native streaming.

use docuforge_application::StreamHandle;
use docuforge_domain::StreamEvent;
use std::time::Duration;
use tokio::sync::mpsc;

/// Words of `text`, each followed by a single space.
pub fn word_chunks(text: &str) -> Vec<String> {
    text.split_whitespace().map(|word| format!("{word} ")).collect()
}

/// Stream an already generated response one word at a time.
///
/// `pacing` is slept between words; zero delivers them back to back. The
/// producer stops as soon as the handle is dropped.
pub fn paced_stream(text: String, pacing: Duration) -> StreamHandle {
    let (tx, rx) = mpsc::channel(32);
    tokio::spawn(async move {
        for chunk in word_chunks(&text) {
            if tx.send(StreamEvent::Delta(chunk)).await.is_err() {
                return;
            }
            if !pacing.is_zero() {
                tokio::time::sleep(pacing).await;
            }
        }
        let _ = tx.send(StreamEvent::Completed(text)).await;
    });
    StreamHandle::new(rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_chunks() {
        assert_eq!(word_chunks("one  two\nthree"), vec!["one ", "two ", "three "]);
        assert!(word_chunks("   ").is_empty());
    }

    #[tokio::test]
    async fn test_paced_stream_yields_words_then_completes() {
        let mut handle = paced_stream("alpha beta".to_string(), Duration::ZERO);
        assert_eq!(handle.next_event().await, Some(StreamEvent::Delta("alpha ".into())));
        assert_eq!(handle.next_event().await, Some(StreamEvent::Delta("beta ".into())));
        assert_eq!(
            handle.next_event().await,
            Some(StreamEvent::Completed("alpha beta".into()))
        );
        assert_eq!(handle.next_event().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pacing_delays_words() {
        let start = tokio::time::Instant::now();
        let text = paced_stream("a b c".to_string(), Duration::from_millis(100))
            .collect_text()
            .await
            .unwrap();
        assert_eq!(text, "a b c ");
        assert!(start.elapsed() >= Duration::from_millis(300));
    }
}
