//! Per-thread log capture for asserting what a code path reports.

use log::{Level, LevelFilter, Log, Metadata, Record};
use std::cell::RefCell;
use std::future::Future;
use std::sync::Once;

thread_local! {
    static RECORDS: RefCell<Option<Vec<Level>>> = RefCell::new(None);
}

struct ThreadLogger;

impl Log for ThreadLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        RECORDS.with(|records| {
            if let Some(levels) = records.borrow_mut().as_mut() {
                levels.push(record.level());
            }
        });
    }

    fn flush(&self) {}
}

static LOGGER: ThreadLogger = ThreadLogger;
static INIT: Once = Once::new();

pub struct Captured<T> {
    pub value: T,
    pub levels: Vec<Level>,
}

impl<T> Captured<T> {
    pub fn error_lines(&self) -> usize {
        self.levels.iter().filter(|level| **level == Level::Error).count()
    }
}

/// Run `future` on the current thread and collect the log levels it emitted.
/// Only works under a current-thread runtime, which `#[tokio::test]` uses.
pub async fn capture<F: Future>(future: F) -> Captured<F::Output> {
    INIT.call_once(|| {
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(LevelFilter::Trace);
        }
    });

    RECORDS.with(|records| *records.borrow_mut() = Some(Vec::new()));
    let value = future.await;
    let levels = RECORDS
        .with(|records| records.borrow_mut().take())
        .unwrap_or_default();

    Captured { value, levels }
}
