//! Stress tests for concurrency.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use metricache::{Cache, Insert, Key, ValueKind};

fn gauge(name: &str, value: f64) -> Insert {
    Insert::new(Key::new(name), "", ValueKind::Gauge, value)
}

/// Many gathers can hold snapshots at the same time.
#[test]
fn stress_concurrent_gathers() {
    let cache = Arc::new(Cache::new());
    cache.update(false, vec![gauge("up", 1.0)], &[]).unwrap();

    let num_readers = 8;
    let barrier = Arc::new(Barrier::new(num_readers));

    let handles: Vec<_> = (0..num_readers)
        .map(|_| {
            let cache = Arc::clone(&cache);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let snapshot = cache.gather().unwrap();
                assert_eq!(snapshot.families().len(), 1);
                // Every thread holds its snapshot here; if gathers
                // excluded each other this would never pass.
                barrier.wait();
                snapshot.release();
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }
}

/// An update issued while a snapshot is live must wait for its release.
#[test]
fn stress_update_blocks_until_release() {
    let cache = Arc::new(Cache::new());
    cache.update(false, vec![gauge("up", 1.0)], &[]).unwrap();

    let snapshot = cache.gather().unwrap();

    let (tx, rx) = mpsc::channel();
    let writer = {
        let cache = Arc::clone(&cache);
        thread::spawn(move || {
            cache.update(false, vec![gauge("up", 2.0)], &[]).unwrap();
            tx.send(()).unwrap();
        })
    };

    // The writer must still be blocked on the read guard.
    assert_eq!(
        rx.recv_timeout(Duration::from_millis(200)),
        Err(RecvTimeoutError::Timeout)
    );

    snapshot.release();

    // Now it can finish.
    rx.recv_timeout(Duration::from_secs(5))
        .expect("update did not complete after release");
    writer.join().unwrap();

    let snapshot = cache.gather().unwrap();
    assert_eq!(snapshot.families()[0].metrics()[0].value().get(), 2.0);
    snapshot.release();
}

/// Concurrent writers stay serialized and nothing is lost.
#[test]
fn stress_concurrent_writers() {
    let cache = Arc::new(Cache::new());

    let num_threads = 8;
    let series_per_thread = 250;

    let handles: Vec<_> = (0..num_threads)
        .map(|t| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for i in 0..series_per_thread {
                    let name = format!("thread{:02}_metric{:04}", t, i);
                    cache
                        .update(false, vec![gauge(&name, i as f64)], &[])
                        .unwrap();
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(cache.len(), num_threads * series_per_thread);
}

/// Readers under concurrent writes always observe a consistent view.
#[test]
fn stress_concurrent_read_write() {
    let cache = Arc::new(Cache::new());
    let stop = Arc::new(AtomicBool::new(false));

    // Writers keep a family of two series in lockstep; a consistent view
    // must contain either both series or neither.
    let writer = {
        let cache = Arc::clone(&cache);
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            let mut flip = false;
            while !stop.load(Ordering::Relaxed) {
                let inserts = vec![
                    Insert::new(
                        Key::with_labels("pair", vec!["half".into()], vec!["a".into()]),
                        "",
                        ValueKind::Gauge,
                        1.0,
                    ),
                    Insert::new(
                        Key::with_labels("pair", vec!["half".into()], vec!["b".into()]),
                        "",
                        ValueKind::Gauge,
                        2.0,
                    ),
                ];
                if flip {
                    cache.update(true, inserts, &[]).unwrap();
                } else {
                    let deletions = [
                        Key::with_labels("pair", vec!["half".into()], vec!["a".into()]),
                        Key::with_labels("pair", vec!["half".into()], vec!["b".into()]),
                    ];
                    cache.update(false, inserts, &[]).unwrap();
                    cache.update(false, Vec::new(), &deletions).unwrap();
                }
                flip = !flip;
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for _ in 0..500 {
                    let snapshot = cache.gather().unwrap();
                    for family in snapshot.families() {
                        if family.name() == "pair" {
                            assert_eq!(
                                family.metrics().len(),
                                2,
                                "observed a half-applied batch"
                            );
                        }
                    }
                    snapshot.release();
                }
            })
        })
        .collect();

    for h in readers {
        h.join().unwrap();
    }
    stop.store(true, Ordering::Relaxed);
    writer.join().unwrap();
}

/// Interleaved resets and incremental updates keep the indexes consistent.
#[test]
fn stress_reset_churn() {
    let cache = Arc::new(Cache::new());

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for i in 0..200 {
                    let name = format!("churn{:02}", t);
                    let reset = i % 10 == 0;
                    cache
                        .update(reset, vec![gauge(&name, i as f64)], &[])
                        .unwrap();
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    // Whatever survived the churn, the two indexes must agree.
    let expected = cache.len();
    let snapshot = cache.gather().unwrap();
    let metric_count: usize = snapshot.families().iter().map(|f| f.metrics().len()).sum();
    assert_eq!(metric_count, expected);
    snapshot.release();
}
