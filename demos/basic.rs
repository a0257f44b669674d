//! Basic usage example for metricache.
//!
//! Run with: cargo run --example basic

use metricache::{Cache, Insert, Key, ValueKind};

fn main() -> metricache::Result<()> {
    env_logger::init();

    let cache = Cache::new();

    // Push a batch of samples
    cache.update(
        false,
        vec![
            Insert::new(
                Key::with_labels(
                    "http_requests_total",
                    vec!["code".to_string()],
                    vec!["200".to_string()],
                ),
                "Total HTTP requests.",
                ValueKind::Counter,
                1027.0,
            ),
            Insert::new(
                Key::with_labels(
                    "http_requests_total",
                    vec!["code".to_string()],
                    vec!["500".to_string()],
                ),
                "Total HTTP requests.",
                ValueKind::Counter,
                3.0,
            ),
            Insert::new(
                Key::new("process_open_fds"),
                "Open file descriptors.",
                ValueKind::Gauge,
                42.0,
            ),
        ],
        &[],
    )?;

    println!("Stored {} metrics in {} families", cache.len(), cache.family_count());

    // Read a consistent snapshot and print it exposition-style
    let snapshot = cache.gather()?;
    for family in snapshot.families() {
        println!("# HELP {} {}", family.name(), family.help());
        println!("# TYPE {} {}", family.name(), family.kind());
        for metric in family.metrics() {
            let labels: Vec<String> = metric
                .labels()
                .iter()
                .map(|l| format!("{}=\"{}\"", l.name, l.value))
                .collect();
            if labels.is_empty() {
                println!("{} {}", family.name(), metric.value().get());
            } else {
                println!("{}{{{}}} {}", family.name(), labels.join(","), metric.value().get());
            }
        }
    }
    snapshot.release();

    // Delete one series
    cache.update(
        false,
        Vec::new(),
        &[Key::with_labels(
            "http_requests_total",
            vec!["code".to_string()],
            vec!["500".to_string()],
        )],
    )?;
    println!("\nAfter deletion: {} metrics", cache.len());

    // Reset to a fresh population
    cache.update(
        true,
        vec![Insert::new(
            Key::new("up"),
            "Scrape success.",
            ValueKind::Gauge,
            1.0,
        )],
        &[],
    )?;
    println!("After reset: {} metrics in {} families", cache.len(), cache.family_count());

    Ok(())
}
