//! Helpers for running one request from the terminal

use docuforge_application::StreamHandle;
use docuforge_domain::StreamEvent;
use std::io::Write;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// A token cancelled by the first Ctrl-C.
///
/// Abort the returned task once the request is done so later Ctrl-C
/// presses get the default behavior again.
pub fn cancel_on_ctrl_c() -> (CancellationToken, JoinHandle<()>) {
    let token = CancellationToken::new();
    let watcher = {
        let token = token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                token.cancel();
            }
        })
    };
    (token, watcher)
}

/// Print fragments as they arrive and return the complete reply.
pub async fn print_stream(mut handle: StreamHandle, out: &mut impl Write) -> String {
    let mut full = String::new();
    while let Some(event) = handle.next_event().await {
        match event {
            StreamEvent::Delta(chunk) => {
                let _ = write!(out, "{}", chunk);
                let _ = out.flush();
                full.push_str(&chunk);
            }
            StreamEvent::Completed(text) => {
                if full.is_empty() {
                    let _ = write!(out, "{}", text);
                    full = text;
                }
                break;
            }
            StreamEvent::Error(e) => {
                let _ = write!(out, "\nError: {}", e);
                break;
            }
        }
    }
    let _ = writeln!(out);
    full.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_print_stream_echoes_deltas() {
        let (tx, rx) = mpsc::channel(8);
        tx.send(StreamEvent::Delta("Hello ".into())).await.unwrap();
        tx.send(StreamEvent::Delta("there ".into())).await.unwrap();
        tx.send(StreamEvent::Completed("Hello there".into())).await.unwrap();

        let mut out = Vec::new();
        let full = print_stream(StreamHandle::new(rx), &mut out).await;
        assert_eq!(full, "Hello there");
        assert_eq!(String::from_utf8(out).unwrap(), "Hello there \n");
    }

    #[tokio::test]
    async fn test_print_stream_completed_only() {
        let mut out = Vec::new();
        let full = print_stream(StreamHandle::from_text("whole"), &mut out).await;
        assert_eq!(full, "whole");
    }

    #[tokio::test]
    async fn test_token_starts_uncancelled() {
        let (token, watcher) = cancel_on_ctrl_c();
        assert!(!token.is_cancelled());
        watcher.abort();
    }
}
