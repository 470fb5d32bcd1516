//! Push-based delivery of streamed model replies.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::{Stream, StreamExt};
use log::debug;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use formchat_client::{ClientError, TextStream};

/// Fragments buffered between the forwarding task and the consumer.
const STREAM_BUFFER: usize = 32;

/// Text fragments of the next question, in generation order.
///
/// Fed by a background task that reads the model's stream. The stream is
/// consumed at most once; dropping it stops the task and closes the upstream
/// connection. It ends after the last fragment or after the first error.
#[derive(Debug)]
pub struct QuestionStream {
    inner: ReceiverStream<Result<String, ClientError>>,
}

impl QuestionStream {
    /// Spawns a task forwarding `upstream` into a new bounded stream.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn forward(mut upstream: TextStream) -> Self {
        let (tx, rx) = mpsc::channel(STREAM_BUFFER);

        tokio::spawn(async move {
            loop {
                let next = tokio::select! {
                    () = tx.closed() => {
                        debug!("Question stream dropped by consumer");
                        return;
                    }
                    next = upstream.next() => next,
                };

                let Some(item) = next else {
                    debug!("Question stream finished");
                    return;
                };

                let failed = item.is_err();
                if tx.send(item).await.is_err() {
                    debug!("Question stream dropped by consumer");
                    return;
                }
                if failed {
                    return;
                }
            }
        });

        Self {
            inner: ReceiverStream::new(rx),
        }
    }

    /// Reads the remaining fragments and joins them.
    ///
    /// # Errors
    ///
    /// Returns the first error reported by the stream.
    pub async fn collect_text(mut self) -> Result<String, ClientError> {
        let mut text = String::new();
        while let Some(fragment) = self.next().await {
            text.push_str(&fragment?);
        }
        Ok(text)
    }
}

impl Stream for QuestionStream {
    type Item = Result<String, ClientError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
