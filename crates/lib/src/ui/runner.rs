//! Executes network effects and feeds their results back as [`UiEvent`]s.

use super::effect::Effect;
use super::event::{Mutation, UiEvent};
use crate::channel::RealtimeSender;
use crate::history::HistoryApi;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;

/// Runs REST calls on a tokio runtime and emits realtime events. Results come
/// back on `events`; the front end drains that queue into the coordinator.
pub struct EffectRunner<A> {
    api: Arc<A>,
    channel: RealtimeSender,
    events: UnboundedSender<UiEvent>,
    handle: Handle,
}

impl<A: HistoryApi + 'static> EffectRunner<A> {
    pub fn new(api: Arc<A>, channel: RealtimeSender, events: UnboundedSender<UiEvent>, handle: Handle) -> Self {
        Self {
            api,
            channel,
            events,
            handle,
        }
    }

    /// Start every network effect and return the ones left for the host, in order.
    pub fn run(&self, effects: Vec<Effect>) -> Vec<Effect> {
        let mut host = Vec::new();
        for effect in effects {
            match effect {
                Effect::Emit(event) => {
                    if let Err(e) = self.channel.send(event) {
                        log::warn!("could not send realtime event: {}", e);
                    }
                }
                Effect::FetchSessions => {
                    let api = Arc::clone(&self.api);
                    self.spawn(async move {
                        match api.list_sessions().await {
                            Ok(sessions) => UiEvent::SessionsLoaded(sessions),
                            Err(e) => UiEvent::SessionsFailed(e.to_string()),
                        }
                    });
                }
                Effect::FetchTranscript(id) => {
                    let api = Arc::clone(&self.api);
                    self.spawn(async move {
                        match api.transcript(&id).await {
                            Ok(messages) => UiEvent::TranscriptLoaded { id, messages },
                            Err(e) => UiEvent::TranscriptFailed {
                                id,
                                error: e.to_string(),
                            },
                        }
                    });
                }
                Effect::RenameSession { id, name } => {
                    let api = Arc::clone(&self.api);
                    self.spawn(async move {
                        let error = api.rename_session(&id, &name).await.err().map(|e| e.to_string());
                        UiEvent::MutationFinished {
                            mutation: Mutation::Rename,
                            id,
                            error,
                        }
                    });
                }
                Effect::DeleteSession(id) => {
                    let api = Arc::clone(&self.api);
                    self.spawn(async move {
                        let error = api.delete_session(&id).await.err().map(|e| e.to_string());
                        UiEvent::MutationFinished {
                            mutation: Mutation::Delete,
                            id,
                            error,
                        }
                    });
                }
                other => host.push(other),
            }
        }
        host
    }

    fn spawn<F>(&self, task: F)
    where
        F: std::future::Future<Output = UiEvent> + Send + 'static,
    {
        let events = self.events.clone();
        self.handle.spawn(async move {
            let event = task.await;
            if events.send(event).is_err() {
                log::debug!("ui event queue closed; dropping result");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ClientEvent;
    use crate::history::HistoryError;
    use crate::session::{SessionSummary, TranscriptMessage};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tokio::sync::mpsc;

    #[derive(Default)]
    struct FakeApi {
        calls: Mutex<Vec<String>>,
        fail_mutations: bool,
    }

    impl FakeApi {
        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }

        fn mutation(&self) -> Result<(), HistoryError> {
            if self.fail_mutations {
                Err(HistoryError::Api("404 Not Found".into()))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl HistoryApi for FakeApi {
        async fn list_sessions(&self) -> Result<Vec<SessionSummary>, HistoryError> {
            self.record("list".into());
            Ok(vec![SessionSummary::new("s1", "First", "")])
        }

        async fn transcript(&self, id: &str) -> Result<Vec<TranscriptMessage>, HistoryError> {
            self.record(format!("transcript {}", id));
            if id == "missing" {
                return Err(HistoryError::Api("404 Not Found".into()));
            }
            Ok(vec![TranscriptMessage::agent("hi")])
        }

        async fn rename_session(&self, id: &str, name: &str) -> Result<(), HistoryError> {
            self.record(format!("rename {} {}", id, name));
            self.mutation()
        }

        async fn delete_session(&self, id: &str) -> Result<(), HistoryError> {
            self.record(format!("delete {}", id));
            self.mutation()
        }
    }

    fn runner(
        api: FakeApi,
    ) -> (
        EffectRunner<FakeApi>,
        Arc<FakeApi>,
        mpsc::UnboundedReceiver<ClientEvent>,
        mpsc::UnboundedReceiver<UiEvent>,
    ) {
        let api = Arc::new(api);
        let (channel, outbound) = RealtimeSender::channel();
        let (tx, rx) = mpsc::unbounded_channel();
        let runner = EffectRunner::new(Arc::clone(&api), channel, tx, Handle::current());
        (runner, api, outbound, rx)
    }

    #[tokio::test]
    async fn host_effects_are_returned_in_order() {
        let (runner, _api, _out, _rx) = runner(FakeApi::default());
        let host = runner.run(vec![
            Effect::ScrollToBottom,
            Effect::Emit(ClientEvent::StartMode { mode: "1".into() }),
            Effect::Download("s1".into()),
            Effect::FocusInput,
        ]);
        assert_eq!(
            host,
            vec![
                Effect::ScrollToBottom,
                Effect::Download("s1".into()),
                Effect::FocusInput
            ]
        );
    }

    #[tokio::test]
    async fn emit_goes_to_channel() {
        let (runner, _api, mut out, _rx) = runner(FakeApi::default());
        runner.run(vec![Effect::Emit(ClientEvent::UserInput {
            message: "Ada".into(),
        })]);
        assert_eq!(
            out.recv().await,
            Some(ClientEvent::UserInput {
                message: "Ada".into()
            })
        );
    }

    #[tokio::test]
    async fn emit_after_channel_closed_is_dropped() {
        let (runner, _api, out, _rx) = runner(FakeApi::default());
        drop(out);
        let host = runner.run(vec![Effect::Emit(ClientEvent::StartMode { mode: "1".into() })]);
        assert!(host.is_empty());
    }

    #[tokio::test]
    async fn fetches_post_results() {
        let (runner, api, _out, mut rx) = runner(FakeApi::default());
        runner.run(vec![Effect::FetchSessions]);
        match rx.recv().await {
            Some(UiEvent::SessionsLoaded(sessions)) => assert_eq!(sessions[0].id, "s1"),
            other => panic!("unexpected {:?}", other),
        }

        runner.run(vec![Effect::FetchTranscript("missing".into())]);
        match rx.recv().await {
            Some(UiEvent::TranscriptFailed { id, error }) => {
                assert_eq!(id, "missing");
                assert!(error.contains("404"));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(
            api.calls.lock().unwrap().clone(),
            vec!["list".to_string(), "transcript missing".to_string()]
        );
    }

    #[tokio::test]
    async fn mutations_report_errors() {
        let (runner, api, _out, mut rx) = runner(FakeApi {
            fail_mutations: true,
            ..Default::default()
        });
        runner.run(vec![Effect::RenameSession {
            id: "s1".into(),
            name: "Planning".into(),
        }]);
        match rx.recv().await {
            Some(UiEvent::MutationFinished {
                mutation: Mutation::Rename,
                id,
                error: Some(error),
            }) => {
                assert_eq!(id, "s1");
                assert!(error.contains("404 Not Found"));
            }
            other => panic!("unexpected {:?}", other),
        }
        runner.run(vec![Effect::DeleteSession("s1".into())]);
        assert!(matches!(
            rx.recv().await,
            Some(UiEvent::MutationFinished {
                mutation: Mutation::Delete,
                error: Some(_),
                ..
            })
        ));
        assert_eq!(api.calls.lock().unwrap().len(), 2);
    }
}
