// SPDX-FileCopyrightText: 2026 Vitrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Feedback task supervisor.
//!
//! While a backend call is in flight the user sees a single message
//! cycling through a glyph sequence. The animation is bounded: one pass
//! through the sequence, then the message is deleted. Cancellation (the
//! backend call finished) also deletes it. Deletion happens exactly once,
//! and transport errors inside the loop never surface to the flow.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use vitrina_core::types::UserId;
use vitrina_core::ChatTransport;

/// Handle to a running progress animation.
///
/// Callers must invoke [`stop`](ProgressIndicator::stop) on every exit
/// path of the supervised call; dropping the handle without stopping
/// leaves the bounded animation to finish on its own.
pub struct ProgressIndicator {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl ProgressIndicator {
    /// Sends the first glyph and spawns the animation task.
    ///
    /// A failed initial send, or an empty glyph sequence, degrades to a
    /// no-op indicator; the supervised call proceeds without feedback.
    pub async fn start(
        transport: Arc<dyn ChatTransport>,
        user: UserId,
        glyphs: &[String],
        interval: Duration,
    ) -> Self {
        let cancel = CancellationToken::new();

        let Some(first) = glyphs.first() else {
            return Self {
                cancel,
                handle: tokio::spawn(async {}),
            };
        };

        let message = match transport.send_text(user, first).await {
            Ok(id) => id,
            Err(e) => {
                warn!(%user, error = %e, "failed to start progress indicator");
                return Self {
                    cancel,
                    handle: tokio::spawn(async {}),
                };
            }
        };

        let rest: Vec<String> = glyphs[1..].to_vec();
        let token = cancel.clone();
        let handle = tokio::spawn(async move {
            for glyph in &rest {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {
                        if let Err(e) = transport.edit_text(user, &message, glyph).await {
                            warn!(%user, error = %e, "failed to update progress indicator");
                        }
                    }
                }
            }
            // Single exit point: cycle exhausted or cancelled.
            if let Err(e) = transport.delete_message(user, &message).await {
                warn!(%user, error = %e, "failed to remove progress indicator");
            }
        });

        Self { cancel, handle }
    }

    /// Cancels the animation and waits for the message to be removed.
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.handle.await {
            warn!(error = %e, "progress indicator task panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU64, Ordering};
    use vitrina_core::types::{MediaRef, MessageId};
    use vitrina_core::VitrinaError;

    #[derive(Debug, PartialEq)]
    enum Op {
        Send(String),
        Edit(String),
        Delete,
    }

    #[derive(Default)]
    struct RecordingTransport {
        ops: Mutex<Vec<Op>>,
        next_id: AtomicU64,
    }

    impl RecordingTransport {
        fn ops(&self) -> Vec<Op> {
            std::mem::take(&mut *self.ops.lock().unwrap())
        }
    }

    #[async_trait]
    impl ChatTransport for RecordingTransport {
        async fn send_text(&self, _user: UserId, text: &str) -> Result<MessageId, VitrinaError> {
            self.ops.lock().unwrap().push(Op::Send(text.to_string()));
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            Ok(MessageId(id.to_string()))
        }

        async fn send_menu(
            &self,
            _user: UserId,
            _text: &str,
            _buttons: &[(String, String)],
        ) -> Result<MessageId, VitrinaError> {
            unimplemented!("not used by the indicator")
        }

        async fn send_photo(
            &self,
            _user: UserId,
            _data: Vec<u8>,
            _caption: Option<&str>,
        ) -> Result<MessageId, VitrinaError> {
            unimplemented!("not used by the indicator")
        }

        async fn send_document(
            &self,
            _user: UserId,
            _data: Vec<u8>,
            _file_name: &str,
            _caption: Option<&str>,
        ) -> Result<MessageId, VitrinaError> {
            unimplemented!("not used by the indicator")
        }

        async fn edit_text(
            &self,
            _user: UserId,
            _message: &MessageId,
            text: &str,
        ) -> Result<(), VitrinaError> {
            self.ops.lock().unwrap().push(Op::Edit(text.to_string()));
            Ok(())
        }

        async fn delete_message(
            &self,
            _user: UserId,
            _message: &MessageId,
        ) -> Result<(), VitrinaError> {
            self.ops.lock().unwrap().push(Op::Delete);
            Ok(())
        }

        async fn download(&self, _media: &MediaRef) -> Result<Vec<u8>, VitrinaError> {
            unimplemented!("not used by the indicator")
        }
    }

    fn glyphs(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn bounded_cycle_edits_then_deletes_once() {
        let transport = Arc::new(RecordingTransport::default());
        let indicator = ProgressIndicator::start(
            transport.clone(),
            UserId(1),
            &glyphs(&["a", "b", "c"]),
            Duration::from_millis(5),
        )
        .await;

        // Let the full cycle play out before stopping.
        tokio::time::sleep(Duration::from_millis(60)).await;
        indicator.stop().await;

        let ops = transport.ops();
        assert_eq!(
            ops,
            vec![
                Op::Send("a".into()),
                Op::Edit("b".into()),
                Op::Edit("c".into()),
                Op::Delete,
            ]
        );
    }

    #[tokio::test]
    async fn cancellation_stops_edits_and_deletes_exactly_once() {
        let transport = Arc::new(RecordingTransport::default());
        let many: Vec<String> = (0..100).map(|i| i.to_string()).collect();
        let indicator = ProgressIndicator::start(
            transport.clone(),
            UserId(1),
            &many,
            Duration::from_millis(20),
        )
        .await;

        indicator.stop().await;

        // stop() awaited the task, so the op log is final.
        let ops = transport.ops();
        let deletes = ops.iter().filter(|op| **op == Op::Delete).count();
        assert_eq!(deletes, 1);
        assert_eq!(*ops.last().unwrap(), Op::Delete);
    }

    #[tokio::test]
    async fn empty_glyph_sequence_is_a_noop() {
        let transport = Arc::new(RecordingTransport::default());
        let indicator =
            ProgressIndicator::start(transport.clone(), UserId(1), &[], Duration::from_millis(1))
                .await;
        indicator.stop().await;
        assert!(transport.ops().is_empty());
    }
}
