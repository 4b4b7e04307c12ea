//! Grouping of adjacent pairs
//!
//! [`GroupedStream`] turns a [`PairSource`] whose equal keys are adjacent into
//! a stream of `(key, ValueSequence)` groups. Values are never buffered per
//! group: each group is fed by a producer task that hands values over a
//! single-slot channel while it scans for the next key boundary.
//!
//! The channel is not a rendezvous. The producer may run ahead of the
//! consumer by at most two pairs: one queued in the channel and one held in
//! a pending send.
//!
//! Dropping a [`GroupedStream`] aborts any running producer, so the source
//! is never read after the stream is gone.
//!
//! # Caller obligations
//!
//! A [`ValueSequence`] must be drained (read until it yields `None`) or
//! dropped before the next call to [`GroupedStream::next_group`]. While an
//! undrained sequence is still held, its producer is parked on the handoff
//! and `next_group` waits for it indefinitely. Dropping the sequence
//! releases the producer, which then skips the rest of that group.
//!
//! # Faults
//!
//! A read fault inside a group closes that group's sequence like a normal
//! boundary. The fault is returned by the following `next_group` call, after
//! which the stream reports end of input.
//!
//! Grouping is by adjacency only. The input is not sorted, so
//! `[(a,1), (b,2), (a,3)]` yields three groups.

use crate::error::{ErrorCode, TaskError};
use crate::io::PairSource;
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// Capacity of the handoff channel between a group producer and its consumer
const HANDOFF_CAPACITY: usize = 1;

/// Lazy, forward-only values of one group
///
/// Values arrive in source order. The sequence ends at the group boundary.
#[derive(Debug)]
pub struct ValueSequence<V> {
    rx: mpsc::Receiver<V>,
    received: usize,
}

impl<V> ValueSequence<V> {
    fn new(rx: mpsc::Receiver<V>) -> Self {
        Self { rx, received: 0 }
    }

    /// Receive the next value, or `None` once the group has ended
    pub async fn next_value(&mut self) -> Option<V> {
        let value = self.rx.recv().await;
        if value.is_some() {
            self.received += 1;
        }
        value
    }

    /// Drain the remaining values into memory
    pub async fn collect_all(mut self) -> Vec<V> {
        let mut values = Vec::new();
        while let Some(value) = self.next_value().await {
            values.push(value);
        }
        values
    }

    /// Values received from this sequence so far
    pub fn received(&self) -> usize {
        self.received
    }
}

impl<V> Stream for ValueSequence<V> {
    type Item = V;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<V>> {
        let this = self.get_mut();
        let polled = this.rx.poll_recv(cx);
        if let Poll::Ready(Some(_)) = &polled {
            this.received += 1;
        }
        polled
    }
}

/// How a group producer stopped
enum GroupEnd<K, V> {
    /// The first pair of the next group
    Lookahead(K, V),
    Exhausted,
    Fault(TaskError),
}

/// What a finished producer hands back to the stream
struct Boundary<S, K, V> {
    source: S,
    end: GroupEnd<K, V>,
    values: usize,
}

enum State<S, K, V> {
    /// Source is idle, optionally with the first pair of the next group
    Ready { source: S, lookahead: Option<(K, V)> },
    /// A producer task owns the source
    Producing(JoinHandle<Boundary<S, K, V>>),
    /// End of input, or a fault was already reported
    Exhausted,
}

/// Stream of `(key, values)` groups over adjacent equal keys
pub struct GroupedStream<S, K, V> {
    state: State<S, K, V>,
    groups: usize,
}

impl<S, K, V> GroupedStream<S, K, V>
where
    S: PairSource<K, V> + 'static,
    K: PartialEq + Clone + Send + 'static,
    V: Send + 'static,
{
    pub fn new(source: S) -> Self {
        Self {
            state: State::Ready {
                source,
                lookahead: None,
            },
            groups: 0,
        }
    }

    /// Number of groups yielded so far
    pub fn groups(&self) -> usize {
        self.groups
    }

    /// Yield the next group.
    ///
    /// Returns as soon as the group's key is known; its values are produced
    /// concurrently while the caller drains the sequence. `Ok(None)` means
    /// end of input.
    ///
    /// Cancel safe: dropping the returned future loses no state.
    pub async fn next_group(&mut self) -> Result<Option<(K, ValueSequence<V>)>, TaskError> {
        if let State::Producing(handle) = &mut self.state {
            let joined = handle.await;
            let boundary = match joined {
                Ok(boundary) => boundary,
                Err(e) => {
                    self.state = State::Exhausted;
                    return Err(TaskError::read_with_code(
                        ErrorCode::READ_PRODUCER_FAILED,
                        "Group producer task failed",
                    )
                    .with_source(e));
                }
            };

            trace!("Previous group finished after {} values", boundary.values);
            match boundary.end {
                GroupEnd::Lookahead(key, value) => {
                    self.state = State::Ready {
                        source: boundary.source,
                        lookahead: Some((key, value)),
                    };
                }
                GroupEnd::Exhausted => {
                    self.state = State::Exhausted;
                }
                GroupEnd::Fault(err) => {
                    self.state = State::Exhausted;
                    return Err(err);
                }
            }
        }

        let (key, first) = match &mut self.state {
            State::Ready { source, lookahead } => match lookahead.take() {
                Some(pair) => pair,
                None => match source.next_pair().await {
                    Ok(Some(pair)) => pair,
                    Ok(None) => {
                        self.state = State::Exhausted;
                        return Ok(None);
                    }
                    Err(err) => {
                        debug!("Read fault in grouped input: {}", err);
                        self.state = State::Exhausted;
                        return Err(err);
                    }
                },
            },
            State::Producing(_) | State::Exhausted => return Ok(None),
        };

        let source = match std::mem::replace(&mut self.state, State::Exhausted) {
            State::Ready { source, .. } => source,
            State::Producing(_) | State::Exhausted => return Ok(None),
        };

        let (tx, rx) = mpsc::channel(HANDOFF_CAPACITY);
        let handle = tokio::spawn(produce_group(source, key.clone(), first, tx));
        self.state = State::Producing(handle);
        self.groups += 1;
        debug!("Started group {}", self.groups);

        Ok(Some((key, ValueSequence::new(rx))))
    }
}

/// Feed one group's values into `tx` until its key changes.
///
/// Dropping `tx` on return closes the consumer's sequence.
async fn produce_group<S, K, V>(
    mut source: S,
    key: K,
    first: V,
    tx: mpsc::Sender<V>,
) -> Boundary<S, K, V>
where
    S: PairSource<K, V>,
    K: PartialEq,
{
    let mut values = 1;
    // Once the consumer drops its sequence, keep reading to find the boundary.
    let mut open = tx.send(first).await.is_ok();

    let end = loop {
        match source.next_pair().await {
            Ok(Some((next_key, value))) if next_key == key => {
                values += 1;
                if open && tx.send(value).await.is_err() {
                    debug!("Value sequence dropped; skipping rest of group");
                    open = false;
                }
            }
            Ok(Some((next_key, value))) => break GroupEnd::Lookahead(next_key, value),
            Ok(None) => break GroupEnd::Exhausted,
            Err(err) => {
                debug!("Read fault in grouped input: {}", err);
                break GroupEnd::Fault(err);
            }
        }
    };

    Boundary {
        source,
        end,
        values,
    }
}

impl<S, K, V> Drop for GroupedStream<S, K, V> {
    fn drop(&mut self) {
        if let State::Producing(handle) = &self.state {
            debug!("Aborting group producer of dropped stream");
            handle.abort();
        }
    }
}

#[async_trait]
impl<S, K, V> PairSource<K, ValueSequence<V>> for GroupedStream<S, K, V>
where
    S: PairSource<K, V> + 'static,
    K: PartialEq + Clone + Send + 'static,
    V: Send + 'static,
{
    async fn next_pair(&mut self) -> Result<Option<(K, ValueSequence<V>)>, TaskError> {
        self.next_group().await
    }
}

#[cfg(test)]
mod tests;
