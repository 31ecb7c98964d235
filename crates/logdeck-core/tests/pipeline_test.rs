/*
[INPUT]:  Recorder, formatter, source filter, pane and UI queue wired as in the host
[OUTPUT]: End-to-end verification of the log pipeline
[POS]:    Integration test layer - producer threads to rendered document
[UPDATE]: When changing rebuild triggers or renderer handoff
*/

use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use logdeck_core::{
    ItemTextPane, LogField, LogFormatter, LogLevel, LogMessage, LogRecorder, LogSource,
    LoggingPanel, StyledText, UiQueue,
};
use tokio::runtime::Handle;

async fn drain_until(queue: &mut UiQueue, mut done: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            queue.run_pending();
            if done() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("ui queue settled in time");
}

fn plain_formatter() -> Arc<LogFormatter> {
    let formatter = LogFormatter::new();
    formatter.set_visible(LogField::Time, false);
    Arc::new(formatter)
}

#[tokio::test]
async fn combining_items_renders_one_document() {
    let (ui, mut queue) = UiQueue::new();
    let pane = ItemTextPane::new(Handle::current(), ui);
    let items = ["XYZ\n", "Foo ", "Bar", "\n", "Hello "].map(StyledText::plain);
    pane.set_data(items.into_iter());

    drain_until(&mut queue, || pane.generation() == 1).await;
    assert_eq!(pane.document_text(), "XYZ\nFoo Bar\nHello ");
}

#[tokio::test]
async fn superseded_generation_never_becomes_visible() {
    let (ui, mut queue) = UiQueue::new();
    let pane = ItemTextPane::new(Handle::current(), ui);

    let (started_tx, started_rx) = mpsc::channel::<()>();
    let (gate_tx, gate_rx) = mpsc::channel::<()>();
    let first = (0..3).map(move |i| {
        if i == 1 {
            let _ = started_tx.send(());
            let _ = gate_rx.recv();
        }
        StyledText::plain(format!("first {i}\n"))
    });
    pane.set_data(first);
    started_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("first pass started");

    pane.set_data(std::iter::once(StyledText::plain("second\n")));
    gate_tx.send(()).expect("first pass still waiting");

    drain_until(&mut queue, || {
        assert!(!pane.document_text().contains("first"));
        pane.generation() == 1
    })
    .await;

    tokio::time::sleep(Duration::from_millis(50)).await;
    queue.run_pending();
    assert_eq!(pane.document_text(), "second\n");
    assert_eq!(pane.generation(), 1);
}

#[tokio::test]
async fn update_before_install_is_caught_up() {
    let (ui, mut queue) = UiQueue::new();
    let pane = ItemTextPane::new(Handle::current(), ui);
    let recorder = LogRecorder::new();
    recorder.message_logged(LogMessage::new("app", LogLevel::Info, "early"));

    let items = recorder.stream().map(|m| StyledText::plain(format!("{}\n", m.text())));
    pane.set_data(items);
    // Not installed yet: this request is dropped, installation catches up.
    recorder.message_logged(LogMessage::new("app", LogLevel::Info, "late"));
    pane.update();

    drain_until(&mut queue, || pane.document_text() == "early\nlate\n").await;
}

#[tokio::test]
async fn panel_shows_history_and_live_messages() {
    let (ui, mut queue) = UiQueue::new();
    let recorder = LogRecorder::new();
    recorder.message_logged(LogMessage::new("db::pool", LogLevel::Warn, "pool exhausted"));

    let panel = LoggingPanel::new(
        recorder.clone(),
        plain_formatter(),
        ItemTextPane::new(Handle::current(), ui),
    );
    drain_until(&mut queue, || panel.pane().generation() == 1).await;
    assert_eq!(panel.pane().document_text(), "[WARN] [db::pool] pool exhausted\n");

    recorder.message_logged(LogMessage::new("net", LogLevel::Info, "connected"));
    drain_until(&mut queue, || {
        panel.pane().document_text()
            == "[WARN] [db::pool] pool exhausted\n[INFO] [net] connected\n"
    })
    .await;
}

#[tokio::test]
async fn filters_rebuild_the_view() {
    let (ui, mut queue) = UiQueue::new();
    let recorder = LogRecorder::new();
    for (source, level, text) in [
        ("db::pool", LogLevel::Debug, "checkout"),
        ("db::pool", LogLevel::Error, "checkout failed"),
        ("net::http", LogLevel::Info, "GET /health"),
    ] {
        recorder.message_logged(LogMessage::new(source, level, text));
    }

    let mut panel = LoggingPanel::new(
        recorder.clone(),
        plain_formatter(),
        ItemTextPane::new(Handle::current(), ui),
    );
    drain_until(&mut queue, || panel.pane().generation() == 1).await;
    assert_eq!(panel.pane().with_view(|v| v.line_count()), 3);

    panel.set_text_filter("CHECKOUT");
    drain_until(&mut queue, || panel.pane().generation() == 2).await;
    assert_eq!(
        panel.pane().document_text(),
        "[DEBUG] [db::pool] checkout\n[ERROR] [db::pool] checkout failed\n"
    );

    assert!(panel.sources().contains(&LogSource::new("db")));
    panel.with_sources(|sources| {
        sources.select([LogSource::new("db")]);
        sources.show_up_to(LogLevel::Warn);
    });
    drain_until(&mut queue, || panel.pane().generation() == 3).await;
    assert_eq!(panel.pane().document_text(), "[ERROR] [db::pool] checkout failed\n");

    panel.set_text_filter("");
    panel.with_sources(|sources| sources.clear_selection());
    panel.set_field_visible(LogField::Source, false);
    drain_until(&mut queue, || {
        panel.pane().document_text() == "[ERROR] checkout failed\n[INFO] GET /health\n"
    })
    .await;
}

#[tokio::test]
async fn clear_empties_view_and_keeps_following() {
    let (ui, mut queue) = UiQueue::new();
    let recorder = LogRecorder::new();
    recorder.message_logged(LogMessage::new("app", LogLevel::Info, "before"));

    let mut panel = LoggingPanel::new(
        recorder.clone(),
        plain_formatter(),
        ItemTextPane::new(Handle::current(), ui),
    );
    drain_until(&mut queue, || panel.pane().generation() == 1).await;

    panel.clear();
    drain_until(&mut queue, || panel.pane().generation() == 2).await;
    assert_eq!(panel.pane().document_text(), "");

    recorder.message_logged(LogMessage::new("app", LogLevel::Info, "after"));
    drain_until(&mut queue, || panel.pane().document_text() == "[INFO] [app] after\n").await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_producers_all_rendered() {
    let (ui, mut queue) = UiQueue::new();
    let recorder = LogRecorder::new();
    let mut panel = LoggingPanel::new(
        recorder.clone(),
        plain_formatter(),
        ItemTextPane::new(Handle::current(), ui),
    );

    let producers: Vec<_> = (0..4)
        .map(|p| {
            let recorder = recorder.clone();
            thread::spawn(move || {
                for i in 0..100 {
                    let source = format!("worker::w{p}");
                    recorder.message_logged(LogMessage::new(source.as_str(), LogLevel::Info, format!("tick {i}")));
                }
            })
        })
        .collect();
    for producer in producers {
        producer.join().expect("producer finished");
    }

    drain_until(&mut queue, || panel.pane().with_view(|v| v.line_count()) == 400).await;
    assert!(panel.discover_sources());
    assert_eq!(panel.sources().rows().len(), 5);
}

#[tokio::test]
async fn dropping_panel_unregisters_observer() {
    let (ui, _queue) = UiQueue::new();
    let recorder = LogRecorder::new();
    let panel = LoggingPanel::new(
        recorder.clone(),
        plain_formatter(),
        ItemTextPane::new(Handle::current(), ui),
    );
    assert_eq!(recorder.observer_count(), 1);
    drop(panel);
    assert_eq!(recorder.observer_count(), 0);
}
