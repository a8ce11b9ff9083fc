use std::pin::Pin;
use std::task::{Context, Poll};

use futures::stream::{self, BoxStream, Stream};

use crate::process::CliChild;
use crate::types::{Launch, StreamEvent};
use crate::Result;

/// Events of one `claude` run, ending after the `result` event.
///
/// If the process exits without a result, the stream yields its exit error
/// (with stderr) as the last item. Dropping the stream kills the process.
pub struct EventStream {
    inner: BoxStream<'static, Result<StreamEvent>>,
}

enum State {
    Starting(Launch, String),
    Running(CliChild),
    Done,
}

impl EventStream {
    pub fn start(launch: Launch, prompt: impl Into<String>) -> Self {
        Self::from_state(State::Starting(launch, prompt.into()))
    }

    #[cfg(test)]
    pub(crate) fn from_child(child: CliChild) -> Self {
        Self::from_state(State::Running(child))
    }

    fn from_state(initial: State) -> Self {
        let inner = stream::unfold(initial, |state| async move {
            let mut child = match state {
                State::Done => return None,
                State::Running(child) => child,
                State::Starting(launch, prompt) => match CliChild::start(&launch, &prompt).await {
                    Ok(child) => child,
                    Err(e) => return Some((Err(e), State::Done)),
                },
            };
            match child.next_event().await {
                Ok(Some(event @ StreamEvent::Result(_))) => Some((Ok(event), State::Done)),
                Ok(Some(event)) => Some((Ok(event), State::Running(child))),
                Ok(None) => child.exit_error().await.map(|e| (Err(e), State::Done)),
                Err(e) => Some((Err(e), State::Done)),
            }
        });
        Self {
            inner: Box::pin(inner),
        }
    }
}

impl Stream for EventStream {
    type Item = Result<StreamEvent>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}
