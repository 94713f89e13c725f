#![allow(dead_code)]

pub use simwatch_test_utils::{
    eventually, init_tracing, make_device, make_device_mock, with_timeout, FakeWatchSource, Harness,
    RecordingBackend,
};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;
