//! Pass-through byte counting for upload bodies.

use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};

use futures_util::Stream;

/// Shared, monotonically increasing byte counter.
///
/// Cloning yields another handle to the same counter, so the stream that
/// increments it and the tick task that reads it can live on different
/// threads.
#[derive(Debug, Clone, Default)]
pub struct ByteCounter(Arc<AtomicU64>);

impl ByteCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `bytes` and returns the new total.
    pub fn add(&self, bytes: u64) -> u64 {
        self.0.fetch_add(bytes, Ordering::AcqRel) + bytes
    }

    /// Current total.
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }

    /// Raises the counter to `value` if it is below it. Never lowers it.
    pub fn advance_to(&self, value: u64) {
        self.0.fetch_max(value, Ordering::AcqRel);
    }
}

/// Stream adapter that counts the bytes of every chunk it forwards.
///
/// Chunks are passed through untouched and in order; errors from the
/// inner stream are forwarded as-is and do not touch the counter.
pub struct CountingStream<S> {
    inner: S,
    counter: ByteCounter,
}

impl<S> CountingStream<S> {
    pub fn new(inner: S, counter: ByteCounter) -> Self {
        Self { inner, counter }
    }
}

impl<S, B, E> Stream for CountingStream<S>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
{
    type Item = Result<B, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let polled = Pin::new(&mut this.inner).poll_next(cx);
        if let Poll::Ready(Some(Ok(chunk))) = &polled {
            this.counter.add(chunk.as_ref().len() as u64);
        }
        polled
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use futures_util::{StreamExt, stream};
    use std::io;

    fn chunks(sizes: &[usize]) -> Vec<Result<Bytes, io::Error>> {
        sizes
            .iter()
            .enumerate()
            .map(|(i, &n)| Ok(Bytes::from(vec![i as u8; n])))
            .collect()
    }

    #[test]
    fn counter_add_and_get() {
        let counter = ByteCounter::new();
        assert_eq!(counter.get(), 0);
        assert_eq!(counter.add(10), 10);
        assert_eq!(counter.add(5), 15);
        assert_eq!(counter.get(), 15);
    }

    #[test]
    fn counter_clones_share_state() {
        let a = ByteCounter::new();
        let b = a.clone();
        a.add(7);
        assert_eq!(b.get(), 7);
    }

    #[test]
    fn advance_to_never_lowers() {
        let counter = ByteCounter::new();
        counter.add(100);
        counter.advance_to(50);
        assert_eq!(counter.get(), 100);
        counter.advance_to(250);
        assert_eq!(counter.get(), 250);
    }

    #[tokio::test]
    async fn forwards_chunks_unchanged_and_in_order() {
        let counter = ByteCounter::new();
        let input = chunks(&[3, 0, 1024, 17]);
        let expected: Vec<Bytes> = input.iter().map(|c| c.as_ref().unwrap().clone()).collect();

        let counting = CountingStream::new(stream::iter(input), counter.clone());
        let out: Vec<Bytes> = counting.map(|c| c.unwrap()).collect().await;

        assert_eq!(out, expected);
        assert_eq!(counter.get(), 3 + 1024 + 17);
    }

    #[tokio::test]
    async fn counter_is_non_decreasing_and_reaches_total() {
        let sizes = [1, 4096, 65536, 7, 300_000, 1];
        let total: usize = sizes.iter().sum();
        let counter = ByteCounter::new();
        let mut counting = CountingStream::new(stream::iter(chunks(&sizes)), counter.clone());

        let mut last = 0;
        while let Some(chunk) = counting.next().await {
            chunk.unwrap();
            let now = counter.get();
            assert!(now >= last);
            last = now;
        }
        assert_eq!(counter.get(), total as u64);
    }

    #[tokio::test]
    async fn errors_pass_through_without_counting() {
        let counter = ByteCounter::new();
        let input: Vec<Result<Bytes, io::Error>> = vec![
            Ok(Bytes::from_static(b"abcd")),
            Err(io::Error::other("disk gone")),
            Ok(Bytes::from_static(b"ef")),
        ];
        let mut counting = CountingStream::new(stream::iter(input), counter.clone());

        assert_eq!(counting.next().await.unwrap().unwrap(), Bytes::from_static(b"abcd"));
        assert!(counting.next().await.unwrap().is_err());
        assert_eq!(counter.get(), 4);
        assert_eq!(counting.next().await.unwrap().unwrap(), Bytes::from_static(b"ef"));
        assert_eq!(counter.get(), 6);
        assert!(counting.next().await.is_none());
    }

    #[test]
    fn concurrent_adds() {
        use std::thread;

        let counter = ByteCounter::new();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let c = counter.clone();
                thread::spawn(move || {
                    for _ in 0..1000 {
                        c.add(3);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(counter.get(), 8 * 1000 * 3);
    }
}
