/*
[INPUT]:  Producer count + shutdown token
[OUTPUT]: Background threads feeding synthetic messages into the recorder
[POS]:    Demo producers for exercising the viewer without an application
[UPDATE]: When changing the synthetic source set or message mix
*/

use std::thread::{self, JoinHandle};
use std::time::Duration;

use logdeck_core::{ErrorTrace, LogLevel, LogMessage, LogRecorder};
use rand::Rng;
use tokio_util::sync::CancellationToken;
use tracing::info;

const DEMO_SOURCES: &[&str] = &[
    "demo::db::pool",
    "demo::db::migrations",
    "demo::net::http",
    "demo::net::dns",
    "demo::cache",
    "demo::scheduler",
];

const DEMO_TEXTS: &[&str] = &[
    "connection checked out",
    "request completed",
    "cache miss",
    "retrying operation",
    "job scheduled",
    "slow response",
];

/// Spawns `count` threads that log until `shutdown` is cancelled.
pub fn spawn_producers(
    recorder: &LogRecorder,
    count: usize,
    shutdown: CancellationToken,
) -> Vec<JoinHandle<()>> {
    if count > 0 {
        info!(producers = count, "starting demo producers");
    }
    (0..count)
        .map(|id| {
            let recorder = recorder.clone();
            let shutdown = shutdown.clone();
            thread::spawn(move || run_producer(id, &recorder, &shutdown))
        })
        .collect()
}

fn run_producer(id: usize, recorder: &LogRecorder, shutdown: &CancellationToken) {
    let mut rng = rand::thread_rng();
    let mut sequence = 0u64;
    while !shutdown.is_cancelled() {
        recorder.message_logged(random_message(&mut rng, id, sequence));
        sequence += 1;
        thread::sleep(Duration::from_millis(rng.gen_range(50..400)));
    }
}

fn random_message(rng: &mut impl Rng, producer: usize, sequence: u64) -> LogMessage {
    let source = DEMO_SOURCES[rng.gen_range(0..DEMO_SOURCES.len())];
    let text = DEMO_TEXTS[rng.gen_range(0..DEMO_TEXTS.len())];
    // Skew towards the quieter levels.
    let level = match rng.gen_range(0..20) {
        0 => LogLevel::Error,
        1..=2 => LogLevel::Warn,
        3..=9 => LogLevel::Info,
        10..=15 => LogLevel::Debug,
        _ => LogLevel::Trace,
    };

    let message = LogMessage::new(source, level, format!("{text} (producer {producer}, #{sequence})"));
    if level == LogLevel::Error {
        let mut trace = ErrorTrace::new("operation failed");
        trace.causes.push("connection reset by peer".to_string());
        message.with_error(trace)
    } else {
        message
    }
}
