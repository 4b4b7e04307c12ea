use super::*;
use crate::io::VecSource;
use crate::testing::FailingSource;
use async_trait::async_trait;
use futures::StreamExt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Counts reads and panics on the read numbered `panic_on`
struct CountingSource {
    inner: VecSource<&'static str, i32>,
    reads: Arc<AtomicUsize>,
    panic_on: Option<usize>,
}

impl CountingSource {
    fn new(pairs: Vec<(&'static str, i32)>) -> Self {
        Self {
            inner: VecSource::new(pairs),
            reads: Arc::new(AtomicUsize::new(0)),
            panic_on: None,
        }
    }

    fn panic_on(mut self, read: usize) -> Self {
        self.panic_on = Some(read);
        self
    }
}

#[async_trait]
impl PairSource<&'static str, i32> for CountingSource {
    async fn next_pair(&mut self) -> Result<Option<(&'static str, i32)>, TaskError> {
        let read = self.reads.fetch_add(1, Ordering::SeqCst) + 1;
        if self.panic_on == Some(read) {
            panic!("source blew up on read {}", read);
        }
        self.inner.next_pair().await
    }
}

fn grouped<K, V>(pairs: Vec<(K, V)>) -> GroupedStream<VecSource<K, V>, K, V>
where
    K: PartialEq + Clone + Send + 'static,
    V: Send + 'static,
{
    GroupedStream::new(VecSource::new(pairs))
}

async fn drain_all<S>(stream: &mut GroupedStream<S, &'static str, i32>) -> Vec<(&'static str, Vec<i32>)>
where
    S: PairSource<&'static str, i32> + 'static,
{
    let mut groups = Vec::new();
    while let Some((key, values)) = stream.next_group().await.unwrap() {
        groups.push((key, values.collect_all().await));
    }
    groups
}

#[tokio::test]
async fn test_empty_source_is_terminal_on_first_call() {
    let mut stream = grouped::<&str, i32>(vec![]);
    assert!(stream.next_group().await.unwrap().is_none());
    assert_eq!(stream.groups(), 0);
}

#[tokio::test]
async fn test_adjacent_keys_form_one_group() {
    let mut stream = grouped(vec![("seen", 12), ("seen", 82)]);

    let (key, mut values) = stream.next_group().await.unwrap().expect("one group");
    assert_eq!(key, "seen");
    assert_eq!(values.next_value().await, Some(12));
    assert_eq!(values.next_value().await, Some(82));
    assert_eq!(values.next_value().await, None);
    assert_eq!(values.received(), 2);

    assert!(stream.next_group().await.unwrap().is_none());
}

#[tokio::test]
async fn test_key_change_starts_new_group() {
    let mut stream = grouped(vec![("a", 1), ("a", 2), ("b", 3)]);
    let groups = drain_all(&mut stream).await;

    assert_eq!(groups, vec![("a", vec![1, 2]), ("b", vec![3])]);
    assert!(stream.next_group().await.unwrap().is_none());
    assert_eq!(stream.groups(), 2);
}

#[tokio::test]
async fn test_non_adjacent_repeats_are_not_merged() {
    let mut stream = grouped(vec![("a", 1), ("b", 2), ("a", 3)]);
    let groups = drain_all(&mut stream).await;

    assert_eq!(groups, vec![("a", vec![1]), ("b", vec![2]), ("a", vec![3])]);
}

#[tokio::test]
async fn test_terminal_is_sticky() {
    let mut stream = grouped(vec![("k", 1)]);
    let (_, values) = stream.next_group().await.unwrap().unwrap();
    assert_eq!(values.collect_all().await, vec![1]);

    for _ in 0..3 {
        assert!(stream.next_group().await.unwrap().is_none());
    }
}

#[tokio::test]
async fn test_next_group_returns_before_group_is_filled() {
    // A large group: the key must be available without the producer having
    // read the whole group, since the handoff holds at most one value.
    let pairs: Vec<(&str, i32)> = (0..1000).map(|i| ("big", i)).collect();
    let mut stream = grouped(pairs);

    let (key, values) = stream.next_group().await.unwrap().unwrap();
    assert_eq!(key, "big");
    assert_eq!(values.received(), 0);

    let collected = values.collect_all().await;
    assert_eq!(collected, (0..1000).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_value_sequence_is_a_stream() {
    let mut stream = grouped(vec![("a", 1), ("a", 2), ("a", 3), ("b", 4)]);

    let (_, values) = stream.next_group().await.unwrap().unwrap();
    let doubled: Vec<i32> = values.map(|v| v * 2).collect().await;
    assert_eq!(doubled, vec![2, 4, 6]);

    let (key, values) = stream.next_group().await.unwrap().unwrap();
    assert_eq!(key, "b");
    assert_eq!(values.collect_all().await, vec![4]);
}

#[tokio::test]
async fn test_held_undrained_sequence_blocks_next_group() {
    let mut stream = grouped(vec![("a", 1), ("a", 2), ("a", 3), ("a", 4), ("b", 5)]);

    let (_, values) = stream.next_group().await.unwrap().unwrap();

    // The producer is parked on the handoff while `values` is held.
    let pending = tokio::time::timeout(Duration::from_millis(50), stream.next_group()).await;
    assert!(pending.is_err(), "next_group should wait for the open group");

    // Releasing the sequence lets the producer skip to the boundary.
    drop(values);
    let (key, values) = stream.next_group().await.unwrap().unwrap();
    assert_eq!(key, "b");
    assert_eq!(values.collect_all().await, vec![5]);
    assert!(stream.next_group().await.unwrap().is_none());
}

#[tokio::test]
async fn test_dropped_partial_sequence_skips_rest_of_group() {
    let mut stream = grouped(vec![("a", 1), ("a", 2), ("a", 3), ("b", 4), ("c", 5)]);

    let (_, mut values) = stream.next_group().await.unwrap().unwrap();
    assert_eq!(values.next_value().await, Some(1));
    drop(values);

    let groups = drain_all(&mut stream).await;
    assert_eq!(groups, vec![("b", vec![4]), ("c", vec![5])]);
}

#[tokio::test]
async fn test_mid_group_fault_surfaces_on_next_call() {
    let source = FailingSource::new(VecSource::new(vec![("a", 1), ("a", 2), ("a", 3)]), 2);
    let mut stream = GroupedStream::new(source);

    let (key, values) = stream.next_group().await.unwrap().unwrap();
    assert_eq!(key, "a");
    // The sequence ends cleanly at the fault, with the values read before it.
    assert_eq!(values.collect_all().await, vec![1, 2]);

    let err = stream.next_group().await.unwrap_err();
    assert!(err.is_read_fault());

    // Fused after the fault
    assert!(stream.next_group().await.unwrap().is_none());
}

#[tokio::test]
async fn test_fault_on_first_read_is_returned_immediately() {
    let source = FailingSource::new(VecSource::<&str, i32>::new(vec![("a", 1)]), 0);
    let mut stream = GroupedStream::new(source);

    let err = stream.next_group().await.unwrap_err();
    assert!(err.is_read_fault());
    assert!(stream.next_group().await.unwrap().is_none());
}

#[tokio::test]
async fn test_fault_at_group_boundary() {
    // Fault right after group "a" is complete: "a" is still delivered whole.
    let source = FailingSource::new(VecSource::new(vec![("a", 1), ("a", 2), ("b", 3)]), 2);
    let mut stream = GroupedStream::new(source);

    let (_, values) = stream.next_group().await.unwrap().unwrap();
    assert_eq!(values.collect_all().await, vec![1, 2]);
    assert!(stream.next_group().await.is_err());
}

#[tokio::test]
async fn test_producer_panic_is_read_fault_and_fuses() {
    let source = CountingSource::new(vec![("a", 1), ("a", 2), ("a", 3)]).panic_on(2);
    let mut stream = GroupedStream::new(source);

    let (_, values) = stream.next_group().await.unwrap().unwrap();
    assert_eq!(values.collect_all().await, vec![1]);

    let err = stream.next_group().await.unwrap_err();
    assert!(err.is_read_fault());
    assert_eq!(err.code(), ErrorCode::READ_PRODUCER_FAILED);

    assert!(stream.next_group().await.unwrap().is_none());
}

#[tokio::test]
async fn test_dropping_stream_stops_producer() {
    let pairs: Vec<(&str, i32)> = (0..10_000).map(|i| ("same", i)).collect();
    let source = CountingSource::new(pairs);
    let reads = source.reads.clone();
    let mut stream = GroupedStream::new(source);

    let (_, mut values) = stream.next_group().await.unwrap().unwrap();
    assert_eq!(values.next_value().await, Some(0));
    drop(values);
    drop(stream);

    let at_drop = reads.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(reads.load(Ordering::SeqCst), at_drop);
    assert!(at_drop < 10_000);
}

#[tokio::test]
async fn test_grouped_stream_as_pair_source() {
    let mut stream = grouped(vec![("x", 1), ("x", 2)]);
    let (key, values) = stream.next_pair().await.unwrap().unwrap();
    assert_eq!(key, "x");
    assert_eq!(values.collect_all().await, vec![1, 2]);
    assert!(stream.next_pair().await.unwrap().is_none());
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    /// Runs of equal adjacent keys, computed directly
    fn adjacent_runs(pairs: &[(u8, u32)]) -> Vec<(u8, Vec<u32>)> {
        let mut runs: Vec<(u8, Vec<u32>)> = Vec::new();
        for &(key, value) in pairs {
            match runs.last_mut() {
                Some((last, values)) if *last == key => values.push(value),
                _ => runs.push((key, vec![value])),
            }
        }
        runs
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn test_groups_match_adjacent_runs(
            pairs in prop::collection::vec((0u8..4, any::<u32>()), 0..64),
        ) {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(2)
                .enable_all()
                .build()
                .unwrap();

            let expected = adjacent_runs(&pairs);
            let observed = runtime.block_on(async {
                let mut stream = GroupedStream::new(VecSource::new(pairs.clone()));
                let mut groups = Vec::new();
                while let Some((key, values)) = stream.next_group().await.unwrap() {
                    groups.push((key, values.collect_all().await));
                }
                groups
            });

            prop_assert_eq!(observed, expected);
        }
    }
}
