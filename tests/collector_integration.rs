//! End-to-end collector tests.
//!
//! Exercises the full path: directory lookup, handler registration,
//! multi-threaded hand-off, FIFO dispatch on the drain worker, and disposal
//! semantics.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::Utc;
use fanout::{
    CollectorDirectory, CollectorOptions, CsvSink, DrainPriority, MemorySink, Payload,
    SharedHandler,
};

// =============================================================================
// Test Helpers
// =============================================================================

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// =============================================================================
// End-to-End Scenario
// =============================================================================

/// The canonical lifecycle: collector "X", an accept-all sink, three ordered
/// payloads from one named producer, then disposal.
#[test]
fn test_end_to_end_lifecycle() {
    init_tracing();
    let directory = CollectorDirectory::new();
    let collector = directory.get("X").expect("collector creation");
    assert_eq!(collector.name(), "X");
    assert_eq!(collector.thread_name(), "fanout-X");

    let sink = MemorySink::new();
    assert!(collector.register_handler(Arc::clone(&sink) as SharedHandler));

    let hand_off_start = Utc::now();
    let producer = {
        let collector = Arc::clone(&collector);
        thread::Builder::new()
            .name("producer-x".to_string())
            .spawn(move || {
                assert!(collector.hand_off("A"));
                assert!(collector.hand_off("B"));
                assert!(collector.hand_off("C"));
            })
            .unwrap()
    };
    producer.join().unwrap();

    assert!(sink.wait_for(3, Duration::from_secs(5)));
    let received_by = Utc::now();

    let records = sink.records();
    assert_eq!(records.len(), 3);
    let payloads: Vec<&str> = records.iter().map(|r| r.payload.as_str()).collect();
    assert_eq!(payloads, vec!["A", "B", "C"]);
    for record in &records {
        assert_eq!(record.originator, "producer-x");
        assert!(record.ts >= hand_off_start);
        assert!(record.ts <= received_by);
    }

    collector.dispose();
    assert!(!collector.hand_off("D"));
    assert_eq!(sink.records().len(), 3);
    assert_eq!(sink.close_count(), 1);
}

// =============================================================================
// Ordering
// =============================================================================

/// Per-producer hand-off order is preserved end to end, even with several
/// producers interleaving on one collector.
#[test]
fn test_fifo_per_producer_with_parallel_producers() {
    init_tracing();
    let directory = CollectorDirectory::new();
    let collector = directory
        .get_with("interleaved", CollectorOptions::new().queue_capacity(8))
        .unwrap();
    let sink = MemorySink::new();
    collector.register_handler(Arc::clone(&sink) as SharedHandler);

    let producers: Vec<_> = (0..4)
        .map(|p| {
            let collector = Arc::clone(&collector);
            thread::Builder::new()
                .name(format!("producer-{p}"))
                .spawn(move || {
                    for i in 0..50 {
                        assert!(collector.hand_off(format!("p{p}-{i:03}")));
                    }
                })
                .unwrap()
        })
        .collect();
    for producer in producers {
        producer.join().unwrap();
    }

    collector.dispose();

    let records = sink.records();
    assert_eq!(records.len(), 200);
    for p in 0..4 {
        let origin = format!("producer-{p}");
        let mine: Vec<&str> = records
            .iter()
            .filter(|r| r.originator == origin)
            .map(|r| r.payload.as_str())
            .collect();
        assert_eq!(mine.len(), 50);
        let expected: Vec<String> = (0..50).map(|i| format!("p{p}-{i:03}")).collect();
        assert_eq!(mine, expected);
    }
}

// =============================================================================
// Selective Handling
// =============================================================================

/// Two sinks with different predicates fan out from one collector; each sees
/// only the payload types it accepts.
#[test]
fn test_selective_fan_out() {
    init_tracing();
    let directory = CollectorDirectory::new();
    let collector = directory.get("mixed").unwrap();

    let strings = MemorySink::accepting(|p| p.as_any().is::<String>() || p.as_any().is::<&str>());
    let numbers = MemorySink::accepting(|p| p.as_any().is::<u64>());
    collector.register_handler(Arc::clone(&strings) as SharedHandler);
    collector.register_handler(Arc::clone(&numbers) as SharedHandler);

    assert!(collector.hand_off("text"));
    assert!(collector.hand_off(7_u64));
    assert!(collector.hand_off("more text".to_string()));
    assert!(collector.hand_off(3.5_f64)); // accepted by neither

    collector.dispose();

    let string_payloads: Vec<String> = strings.records().iter().map(|r| r.payload.clone()).collect();
    assert_eq!(string_payloads, vec!["text", "more text"]);
    let number_payloads: Vec<String> = numbers.records().iter().map(|r| r.payload.clone()).collect();
    assert_eq!(number_payloads, vec!["7"]);

    // Both sinks closed exactly once regardless of what they accepted.
    assert_eq!(strings.close_count(), 1);
    assert_eq!(numbers.close_count(), 1);
}

// =============================================================================
// CSV Sink Through the Full Path
// =============================================================================

#[test]
fn test_csv_sink_end_to_end() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.csv");

    let directory = CollectorDirectory::new();
    let collector = directory
        .get_with("csv", CollectorOptions::new().priority(DrainPriority::Low))
        .unwrap();
    let sink = Arc::new(CsvSink::new(&path));
    collector.register_handler(Arc::clone(&sink) as SharedHandler);

    let producer = {
        let collector = Arc::clone(&collector);
        thread::Builder::new()
            .name("csv-producer".to_string())
            .spawn(move || {
                for i in 0..5 {
                    assert!(collector.hand_off(format!("row {i}")));
                }
            })
            .unwrap()
    };
    producer.join().unwrap();
    collector.dispose();

    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines[0], "timestamp,originator,payload");
    assert_eq!(lines.len(), 6);
    for (i, line) in lines[1..].iter().enumerate() {
        assert!(line.contains("csv-producer"));
        assert!(line.ends_with(&format!("row {i}")));
    }
}

// =============================================================================
// Directory Semantics
// =============================================================================

#[test]
fn test_directory_reuses_instances_across_threads() {
    init_tracing();
    let directory = Arc::new(CollectorDirectory::new());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let directory = Arc::clone(&directory);
            thread::spawn(move || directory.get("shared").unwrap())
        })
        .collect();
    let collectors: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(directory.len(), 1);
    for collector in &collectors[1..] {
        assert!(Arc::ptr_eq(&collectors[0], collector));
    }

    // One dispose is visible through every shared handle.
    collectors[0].dispose();
    for collector in &collectors {
        assert!(collector.is_disposed());
        assert!(!collector.hand_off("no more"));
    }
}
