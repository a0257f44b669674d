//! Concurrent access example for metricache.
//!
//! Run with: cargo run --example concurrent

use std::sync::Arc;
use std::thread;
use std::time::Instant;

use metricache::{Cache, Insert, Key, ValueKind};

fn main() -> metricache::Result<()> {
    env_logger::init();

    let cache = Arc::new(Cache::new());

    println!("=== Concurrent Access Example ===\n");

    let num_writers = 4;
    let num_readers = 4;
    let batches_per_writer = 250;
    let gathers_per_reader = 500;

    let start = Instant::now();

    let mut handles = vec![];

    // Spawn writers, each owning its own set of series
    for writer_id in 0..num_writers {
        let cache = Arc::clone(&cache);
        handles.push(thread::spawn(move || {
            for i in 0..batches_per_writer {
                let key = Key::with_labels(
                    format!("worker_progress_{}", writer_id),
                    vec!["batch".to_string()],
                    vec![format!("{}", i % 10)],
                );
                let insert = Insert::new(key, "Writer progress.", ValueKind::Gauge, i as f64);
                cache
                    .update(false, vec![insert], &[])
                    .expect("update failed");
            }
            println!("Writer {} pushed {} batches", writer_id, batches_per_writer);
        }));
    }

    // Spawn readers taking snapshots in parallel
    for reader_id in 0..num_readers {
        let cache = Arc::clone(&cache);
        handles.push(thread::spawn(move || {
            let mut seen = 0usize;
            for _ in 0..gathers_per_reader {
                let snapshot = cache.gather().expect("gather failed");
                for family in snapshot.families() {
                    seen += family.metrics().len();
                }
                snapshot.release();
            }
            println!("Reader {} observed {} metric samples", reader_id, seen);
        }));
    }

    for handle in handles {
        handle.join().expect("thread panicked");
    }

    let elapsed = start.elapsed();
    println!("\nDone in {:?}", elapsed);
    println!(
        "Final state: {} metrics in {} families",
        cache.len(),
        cache.family_count()
    );

    let stats = cache.stats();
    println!(
        "Stats: {} updates, {} gathers",
        stats.updates.load(std::sync::atomic::Ordering::Relaxed),
        stats.gathers.load(std::sync::atomic::Ordering::Relaxed)
    );

    Ok(())
}
