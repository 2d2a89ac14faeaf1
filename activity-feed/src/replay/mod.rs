//! Event replay against an activity service.
//!
//! Input is read line by line; blank lines and lines starting with `#` are
//! skipped. Every other line yields exactly one result line on the output.
//! Malformed lines and rejected arguments are reported and skipped; any
//! other service failure stops the replay.

use std::sync::Arc;

use activity_repository::{ActivityError, ActivityReader, ActivityWriter, FollowOutcome};
use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, info, warn};

use crate::errors::ReplayError;
use crate::events::{ActivityEvent, EventOutcome};

/// Counts of what a replay did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReplaySummary {
    /// Publishes and follows that went through.
    pub applied: usize,
    /// Lines that were malformed or rejected by the service.
    pub rejected: usize,
    /// Stream and feed reads served.
    pub reads: usize,
}

impl ReplaySummary {
    fn record(&mut self, outcome: &EventOutcome) {
        if outcome.is_rejected() {
            self.rejected += 1;
        } else if outcome.is_read() {
            self.reads += 1;
        } else {
            self.applied += 1;
        }
    }
}

/// Applies JSON-lines activity events to a writer and reader.
pub struct Replayer {
    writer: Arc<dyn ActivityWriter>,
    reader: Arc<dyn ActivityReader>,
}

impl Replayer {
    pub fn new(writer: Arc<dyn ActivityWriter>, reader: Arc<dyn ActivityReader>) -> Self {
        Self { writer, reader }
    }

    /// Replay every event from `input`, writing one result line per event to
    /// `output`.
    pub async fn run<R, W>(
        &self,
        mut input: R,
        output: &mut W,
    ) -> Result<ReplaySummary, ReplayError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut summary = ReplaySummary::default();
        let mut line_number = 0;
        let mut buf = Vec::new();

        loop {
            buf.clear();
            if input.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }
            line_number += 1;

            let outcome = match parse_line(&buf) {
                Ok(None) => continue,
                Ok(Some(event)) => self.apply(line_number, event).await?,
                Err(error) => {
                    warn!(line = line_number, error = %error, "Skipping malformed event");
                    EventOutcome::Rejected {
                        line: line_number,
                        error,
                    }
                }
            };

            summary.record(&outcome);
            let mut encoded = serde_json::to_vec(&outcome)?;
            encoded.push(b'\n');
            output.write_all(&encoded).await?;
        }

        output.flush().await?;
        info!(
            applied = summary.applied,
            rejected = summary.rejected,
            reads = summary.reads,
            "Replay finished"
        );
        Ok(summary)
    }

    /// Apply one event, turning argument errors into a rejected outcome.
    async fn apply(&self, line: usize, event: ActivityEvent) -> Result<EventOutcome, ReplayError> {
        let op = event.name();
        debug!(line, op, "Applying event");

        match self.dispatch(line, event).await {
            Ok(outcome) => Ok(outcome),
            Err(e @ (ActivityError::InvalidArgument(_) | ActivityError::ReadLimitExceeded { .. })) => {
                warn!(line, op, error = %e, "Event rejected");
                Ok(EventOutcome::Rejected {
                    line,
                    error: e.to_string(),
                })
            }
            Err(e) => {
                error!(line, op, error = %e, "Event failed");
                Err(e.into())
            }
        }
    }

    async fn dispatch(&self, line: usize, event: ActivityEvent) -> Result<EventOutcome, ActivityError> {
        match event {
            ActivityEvent::Publish {
                entity_id,
                timestamp,
            } => {
                let receipt = self.writer.publish(&entity_id, timestamp).await?;
                Ok(EventOutcome::Published {
                    line,
                    entity_id,
                    item_id: receipt.item.id,
                    followers: receipt.propagation.followers,
                    moved: receipt.propagation.moved,
                })
            }
            ActivityEvent::Follow { user_id, entity_id } => {
                let position = match self.writer.follow(&user_id, &entity_id).await? {
                    FollowOutcome::Followed { position } => Some(position),
                    FollowOutcome::AlreadyFollowing => None,
                };
                Ok(EventOutcome::Followed {
                    line,
                    user_id,
                    entity_id,
                    position,
                })
            }
            ActivityEvent::ReadStream {
                entity_id,
                start_index,
                count,
            } => {
                let items = self.reader.read_stream(&entity_id, start_index, count).await?;
                Ok(EventOutcome::Stream {
                    line,
                    entity_id,
                    items,
                })
            }
            ActivityEvent::ReadFeed {
                user_id,
                start_index,
                count,
            } => {
                let items = self.reader.read_feed(&user_id, start_index, count).await?;
                Ok(EventOutcome::Feed {
                    line,
                    user_id,
                    items,
                })
            }
        }
    }
}

/// Decode one raw input line.
///
/// Blank lines and `#` comments yield `Ok(None)`.
fn parse_line(raw: &[u8]) -> Result<Option<ActivityEvent>, String> {
    let text =
        std::str::from_utf8(raw).map_err(|e| format!("malformed event: invalid UTF-8: {}", e))?;
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    serde_json::from_str(trimmed)
        .map(Some)
        .map_err(|e| format!("malformed event: {}", e))
}
