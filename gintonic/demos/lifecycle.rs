// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Times the lifecycle of a pretend screen and writes the records to stdout from a background thread.
//!
//! Run with `GINTONIC_ACCURACY=mic` to report microseconds.

use std::{io, thread, time::Duration};

use gintonic::{
    TargetId, Tracer,
    advice::LogAdvice,
    config,
    pointcut::Pointcut,
    writer::{sink::BackgroundQueue, stream::LineStream},
};

struct LinearLayoutTestActivity {
    rows: Vec<String>,
}

impl LinearLayoutTestActivity {
    fn on_create(&mut self) {
        self.rows = (0..16).map(|i| format!("row {i}")).collect();
        thread::sleep(Duration::from_millis(3));
    }

    fn on_start(&self) -> usize {
        self.rows.iter().map(String::len).sum()
    }
}

fn main() {
    tracing_subscriber::fmt::init();
    if let Err(err) = config::init_from_env() {
        eprintln!("{err}");
    }

    let (queue, handle) = BackgroundQueue::new(LineStream::new(io::stdout()));
    let tracer: Tracer<TargetId> = Tracer::builder()
        .sink(queue)
        .pointcut(Pointcut::lifecycle())
        .advice(Pointcut::lifecycle(), LogAdvice::new())
        .build();

    let mut activity = tracer.trace_annotated("LinearLayoutTestActivity", "<init>", || {
        LinearLayoutTestActivity { rows: vec![] }
    });
    let id = TargetId::of(&activity);
    tracer.wrap(id.clone(), "LinearLayoutTestActivity", "onCreate", || {
        activity.on_create()
    });
    let width = tracer.wrap(id, "LinearLayoutTestActivity", "onStart", || {
        activity.on_start()
    });
    tracing::info!(width, "screen ready");

    // writes out whatever is still queued
    drop(handle);
}
