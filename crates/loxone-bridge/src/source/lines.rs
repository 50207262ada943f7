// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Event source reading JSON lines from an async reader.
//!
//! Each line carries one event: `{"uuid": "0f1e...", "value": 21.5}`.
//! Blank lines are ignored; malformed lines are logged and skipped.

use super::{ConnectOptions, EventSource, RawEvent, Session, SourceError, EVENT_CHANNEL_CAPACITY};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Event source over a line-oriented reader such as stdin.
pub struct LinesSource<R> {
    reader: Mutex<Option<R>>,
}

impl<R> LinesSource<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    pub fn new(reader: R) -> Self {
        Self {
            reader: Mutex::new(Some(reader)),
        }
    }
}

impl<R> EventSource for LinesSource<R>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    fn connect(&self, options: &ConnectOptions) -> Result<Box<dyn Session>, SourceError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| SourceError::Connect {
            host: options.host.clone(),
            reason: e.to_string(),
        })?;
        let reader = self.reader.lock().take().ok_or(SourceError::Closed)?;

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let connected = Arc::new(AtomicBool::new(true));
        let task = runtime.spawn(read_lines(reader, tx, Arc::clone(&connected)));

        tracing::debug!("Reading events for {} from line stream", options.host);

        Ok(Box::new(LinesSession {
            rx: Some(rx),
            connected,
            task: Some(task),
        }))
    }
}

async fn read_lines<R>(reader: R, tx: mpsc::Sender<RawEvent>, connected: Arc<AtomicBool>)
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match serde_json::from_str::<RawEvent>(line) {
                    Ok(event) => {
                        if tx.send(event).await.is_err() {
                            break;
                        }
                    }
                    Err(err) => tracing::warn!("Skipping malformed event line: {}", err),
                }
            }
            Ok(None) => break,
            Err(err) => {
                tracing::warn!("Event stream read failed: {}", err);
                break;
            }
        }
    }
    connected.store(false, Ordering::Relaxed);
    tracing::debug!("Event line stream ended");
}

struct LinesSession {
    rx: Option<mpsc::Receiver<RawEvent>>,
    connected: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl Session for LinesSession {
    fn events(&mut self) -> Option<mpsc::Receiver<RawEvent>> {
        self.rx.take()
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    fn close(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.connected.store(false, Ordering::Relaxed);
    }
}
