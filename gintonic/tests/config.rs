// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

// The accuracy setting is process-wide, so this file holds a single test.

use std::time::Duration;

use gintonic::{
    Tracer, config,
    writer::{Accuracy, test_util::test_trace_sink},
};
use gintonic_timesource::{TimeSource, fakes::ManuallyAdvancedTimeSource};

#[test]
fn tracers_follow_process_wide_accuracy() {
    assert_eq!(config::accuracy(), Accuracy::Millis);

    let clock = ManuallyAdvancedTimeSource::new();
    let test_sink = test_trace_sink();
    let tracer = Tracer::builder()
        .sink(test_sink.sink)
        .time_source(TimeSource::custom(clock.clone()))
        .build();
    let step = || {
        tracer.wrap("obj1", "MainActivity", "onCreate", || {
            clock.advance(Duration::from_micros(250))
        })
    };

    step();
    config::set_accuracy_code(2).unwrap();
    step();
    let err = config::set_accuracy_code(0).unwrap_err();
    assert_eq!(err.input(), "0");
    assert_eq!(config::accuracy(), Accuracy::Micros);

    // SAFETY: no other thread in this test binary reads the environment
    unsafe { std::env::set_var(config::ACCURACY_ENV_VAR, "ms") };
    config::init_from_env().unwrap();
    assert_eq!(config::accuracy(), Accuracy::Millis);

    unsafe { std::env::set_var(config::ACCURACY_ENV_VAR, "seconds") };
    assert!(config::init_from_env().is_err());
    assert_eq!(config::accuracy(), Accuracy::Millis);

    unsafe { std::env::remove_var(config::ACCURACY_ENV_VAR) };
    config::set_accuracy(Accuracy::Micros);
    config::init_from_env().unwrap();
    assert_eq!(config::accuracy(), Accuracy::Micros);

    assert_eq!(
        test_sink.inspector.messages(),
        ["onCreate --> [0.25ms]      \n", "onCreate --> [250.0mic]      \n"]
    );
}
