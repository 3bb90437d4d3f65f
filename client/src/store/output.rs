use uuid::Uuid;

/// Text produced by the current run.
///
/// Each run starts a new epoch identified by its run id; chunks carrying any
/// other id are dropped. An error always leaves the buffer not streaming.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OutputBuffer {
    text: String,
    chunk_count: usize,
    streaming: bool,
    error: Option<String>,
    run_id: Option<Uuid>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutputAction {
    Begin(Uuid),
    StartStreaming(Uuid),
    Append { run_id: Uuid, chunk: String },
    Complete(Uuid),
    Fail(String),
    Cancel,
    Clear,
}

impl OutputBuffer {
    pub fn reduce(&self, action: OutputAction) -> Self {
        let mut next = self.clone();
        next.apply(action);
        next
    }

    pub fn apply(&mut self, action: OutputAction) {
        match action {
            OutputAction::Begin(run_id) => {
                *self = Self {
                    run_id: Some(run_id),
                    ..Self::default()
                };
            }
            OutputAction::StartStreaming(run_id) => {
                if self.is_current(run_id) && self.error.is_none() {
                    self.streaming = true;
                }
            }
            OutputAction::Append { run_id, chunk } => {
                if self.is_current(run_id) && self.streaming {
                    self.text.push_str(&chunk);
                    self.chunk_count += 1;
                }
            }
            OutputAction::Complete(run_id) => {
                if self.is_current(run_id) {
                    self.streaming = false;
                }
            }
            OutputAction::Fail(message) => {
                self.streaming = false;
                self.error = Some(message);
            }
            OutputAction::Cancel => self.streaming = false,
            OutputAction::Clear => *self = Self::default(),
        }
    }

    fn is_current(&self, run_id: Uuid) -> bool {
        self.run_id == Some(run_id)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn chunk_count(&self) -> usize {
        self.chunk_count
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn run_id(&self) -> Option<Uuid> {
        self.run_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn streaming(run_id: Uuid) -> OutputBuffer {
        OutputBuffer::default()
            .reduce(OutputAction::Begin(run_id))
            .reduce(OutputAction::StartStreaming(run_id))
    }

    #[test]
    fn begin_resets_text_and_error() {
        let first = Uuid::new_v4();
        let buffer = streaming(first)
            .reduce(OutputAction::Append {
                run_id: first,
                chunk: "old".into(),
            })
            .reduce(OutputAction::Fail("boom".into()));

        let second = Uuid::new_v4();
        let buffer = buffer.reduce(OutputAction::Begin(second));
        assert_eq!(buffer.text(), "");
        assert_eq!(buffer.error(), None);
        assert_eq!(buffer.run_id(), Some(second));
        assert!(!buffer.is_streaming());
    }

    #[test]
    fn stale_chunks_are_ignored() {
        let old = Uuid::new_v4();
        let current = Uuid::new_v4();
        let buffer = streaming(current)
            .reduce(OutputAction::Append {
                run_id: old,
                chunk: "late".into(),
            })
            .reduce(OutputAction::Append {
                run_id: current,
                chunk: "fresh".into(),
            });
        assert_eq!(buffer.text(), "fresh");
        assert_eq!(buffer.chunk_count(), 1);
    }

    #[test]
    fn failure_stops_streaming_and_keeps_partial_text() {
        let id = Uuid::new_v4();
        let buffer = streaming(id)
            .reduce(OutputAction::Append {
                run_id: id,
                chunk: "partial".into(),
            })
            .reduce(OutputAction::Fail("rate limited".into()))
            .reduce(OutputAction::StartStreaming(id));
        assert_eq!(buffer.text(), "partial");
        assert_eq!(buffer.error(), Some("rate limited"));
        assert!(!buffer.is_streaming());
    }

    #[test]
    fn error_never_coexists_with_streaming() {
        let id = Uuid::new_v4();
        let actions = [
            OutputAction::Begin(id),
            OutputAction::StartStreaming(id),
            OutputAction::Append {
                run_id: id,
                chunk: "a".into(),
            },
            OutputAction::Fail("x".into()),
            OutputAction::StartStreaming(id),
            OutputAction::Append {
                run_id: id,
                chunk: "b".into(),
            },
            OutputAction::Cancel,
            OutputAction::Begin(id),
            OutputAction::StartStreaming(id),
            OutputAction::Complete(id),
            OutputAction::Clear,
        ];
        let mut buffer = OutputBuffer::default();
        for action in actions {
            buffer.apply(action);
            assert!(!(buffer.error().is_some() && buffer.is_streaming()));
        }
    }

    /// Every action kind, for the current run `a` and a stale run `b`.
    fn alphabet(a: Uuid, b: Uuid) -> Vec<OutputAction> {
        let mut actions = Vec::new();
        for id in [a, b] {
            actions.push(OutputAction::Begin(id));
            actions.push(OutputAction::StartStreaming(id));
            actions.push(OutputAction::Append {
                run_id: id,
                chunk: "x".into(),
            });
            actions.push(OutputAction::Complete(id));
        }
        actions.push(OutputAction::Fail("boom".into()));
        actions.push(OutputAction::Cancel);
        actions.push(OutputAction::Clear);
        actions
    }

    #[test]
    fn no_action_sequence_reaches_an_erroring_stream() {
        const MAX_LEN: u32 = 5;
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let actions = alphabet(a, b);

        let mut frontier = vec![OutputBuffer::default()];
        let mut checked = 0;
        for _ in 0..MAX_LEN {
            let mut next = Vec::with_capacity(frontier.len() * actions.len());
            for state in &frontier {
                for action in &actions {
                    let after = state.reduce(action.clone());
                    assert!(
                        !(after.error().is_some() && after.is_streaming()),
                        "{state:?} then {action:?} gave {after:?}"
                    );
                    assert_eq!(after.text().len(), after.chunk_count(), "{after:?}");
                    next.push(after);
                }
            }
            checked += next.len();
            frontier = next;
        }

        let expected: usize = (1..=MAX_LEN).map(|n| actions.len().pow(n)).sum();
        assert_eq!(checked, expected);
    }

    #[test]
    fn chunks_after_cancel_are_dropped() {
        let id = Uuid::new_v4();
        let buffer = streaming(id).reduce(OutputAction::Cancel).reduce(OutputAction::Append {
            run_id: id,
            chunk: "late".into(),
        });
        assert_eq!(buffer.text(), "");
        assert_eq!(buffer.error(), None);
    }
}
