use crate::error::RunError;
use crate::orchestrator::{CancelHandle, RunOutcome};
use crate::store::{OutputAction, OutputBuffer};
use shared::models::StreamEvent;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Drain `rx` into `output`, one event at a time and in arrival order.
///
/// `on_chunk` sees each chunk right after it has been appended. Cancelling
/// closes the channel so the producer stops on its next send.
pub async fn relay(
    rx: &mut mpsc::Receiver<StreamEvent>,
    output: &mut OutputBuffer,
    run_id: Uuid,
    cancel: &CancelHandle,
    on_chunk: &mut dyn FnMut(&str),
) -> Result<RunOutcome, RunError> {
    loop {
        let event = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                rx.close();
                output.apply(OutputAction::Cancel);
                tracing::info!(%run_id, "Run cancelled");
                return Ok(RunOutcome::Cancelled);
            }
            event = rx.recv() => event,
        };

        match event {
            Some(StreamEvent::Chunk(text)) => {
                output.apply(OutputAction::Append {
                    run_id,
                    chunk: text.clone(),
                });
                on_chunk(&text);
            }
            Some(StreamEvent::Done) => {
                output.apply(OutputAction::Complete(run_id));
                tracing::debug!(%run_id, chunks = output.chunk_count(), "Run completed");
                return Ok(RunOutcome::Completed);
            }
            Some(StreamEvent::Error(message)) => {
                return Err(fail(output, RunError::Backend(message)));
            }
            None => {
                let error = RunError::Backend("stream ended before completion".to_string());
                return Err(fail(output, error));
            }
        }
    }
}

fn fail(output: &mut OutputBuffer, error: RunError) -> RunError {
    tracing::warn!("Run failed: {}", error);
    output.apply(OutputAction::Fail(error.to_string()));
    error
}

#[cfg(test)]
mod tests {
    use super::*;

    fn streaming_buffer(run_id: Uuid) -> OutputBuffer {
        let mut output = OutputBuffer::default();
        output.apply(OutputAction::Begin(run_id));
        output.apply(OutputAction::StartStreaming(run_id));
        output
    }

    #[tokio::test]
    async fn chunks_are_concatenated_in_order() {
        let (tx, mut rx) = mpsc::channel(8);
        let chunks = ["The ", "quick ", "brown ", "fox"];
        for chunk in chunks {
            tx.send(StreamEvent::Chunk(chunk.to_string())).await.unwrap();
        }
        tx.send(StreamEvent::Done).await.unwrap();

        let run_id = Uuid::new_v4();
        let mut output = streaming_buffer(run_id);
        let mut seen = Vec::new();
        let outcome = relay(
            &mut rx,
            &mut output,
            run_id,
            &CancelHandle::new(),
            &mut |chunk: &str| seen.push(chunk.to_string()),
        )
        .await
        .unwrap();

        assert_eq!(outcome, RunOutcome::Completed);
        assert_eq!(output.text(), chunks.concat());
        assert_eq!(seen, chunks);
        assert!(!output.is_streaming());
    }

    /// All lists of up to four pieces, including the empty list.
    fn chunk_lists() -> Vec<Vec<&'static str>> {
        let pieces = ["", "a", "\u{e9}t\u{e9}", "\u{65e5}\u{672c}", "\u{1f980}", "\n", " word"];
        let mut lists = vec![Vec::new()];
        let mut previous = vec![Vec::new()];
        for _ in 0..4 {
            let mut longer = Vec::new();
            for list in &previous {
                for piece in pieces {
                    let mut next: Vec<&str> = list.clone();
                    next.push(piece);
                    longer.push(next);
                }
            }
            lists.extend(longer.iter().cloned());
            previous = longer;
        }
        lists
    }

    #[tokio::test]
    async fn any_chunk_sequence_is_concatenated_in_order() {
        let lists = chunk_lists();
        assert_eq!(lists.len(), 1 + 7 + 49 + 343 + 2401);

        for chunks in lists {
            let (tx, mut rx) = mpsc::channel(chunks.len() + 1);
            for chunk in &chunks {
                tx.send(StreamEvent::Chunk(chunk.to_string())).await.unwrap();
            }
            tx.send(StreamEvent::Done).await.unwrap();

            let run_id = Uuid::new_v4();
            let mut output = streaming_buffer(run_id);
            let mut seen = Vec::new();
            let outcome = relay(
                &mut rx,
                &mut output,
                run_id,
                &CancelHandle::new(),
                &mut |chunk: &str| seen.push(chunk.to_string()),
            )
            .await
            .unwrap();

            assert_eq!(outcome, RunOutcome::Completed, "{chunks:?}");
            assert_eq!(output.text(), chunks.concat(), "{chunks:?}");
            assert_eq!(output.chunk_count(), chunks.len(), "{chunks:?}");
            assert_eq!(seen, chunks, "{chunks:?}");
            assert!(!output.is_streaming());
        }
    }

    #[tokio::test]
    async fn error_event_keeps_partial_output() {
        let (tx, mut rx) = mpsc::channel(8);
        tx.send(StreamEvent::Chunk("partial".into())).await.unwrap();
        tx.send(StreamEvent::Error("API rate limit exceeded.".into()))
            .await
            .unwrap();

        let run_id = Uuid::new_v4();
        let mut output = streaming_buffer(run_id);
        let err = relay(&mut rx, &mut output, run_id, &CancelHandle::new(), &mut |_: &str| {})
            .await
            .unwrap_err();

        assert_eq!(err, RunError::Backend("API rate limit exceeded.".into()));
        assert_eq!(output.text(), "partial");
        assert_eq!(output.error(), Some("API rate limit exceeded."));
        assert!(!output.is_streaming());
    }

    #[tokio::test]
    async fn closed_channel_without_terminal_is_an_error() {
        let (tx, mut rx) = mpsc::channel(8);
        tx.send(StreamEvent::Chunk("half".into())).await.unwrap();
        drop(tx);

        let run_id = Uuid::new_v4();
        let mut output = streaming_buffer(run_id);
        let err = relay(&mut rx, &mut output, run_id, &CancelHandle::new(), &mut |_: &str| {})
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "stream ended before completion");
        assert!(!output.is_streaming());
    }

    #[tokio::test]
    async fn cancel_closes_the_channel() {
        let (tx, mut rx) = mpsc::channel::<StreamEvent>(8);
        let cancel = CancelHandle::new();
        cancel.cancel();

        let run_id = Uuid::new_v4();
        let mut output = streaming_buffer(run_id);
        let outcome = relay(&mut rx, &mut output, run_id, &cancel, &mut |_: &str| {})
            .await
            .unwrap();

        assert_eq!(outcome, RunOutcome::Cancelled);
        assert!(tx.is_closed());
        assert!(!output.is_streaming());
        assert_eq!(output.error(), None);
    }
}
