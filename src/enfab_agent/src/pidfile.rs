// Copyright 2020-2023 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::retry::RetryPolicy;

/// Terminal error: the descriptor never became readable within the retry
/// budget. Individual miss causes are logged, not surfaced.
#[derive(Debug)]
pub enum Error {
    DescriptorUnavailable,
}

/// The descriptor the enclave publishes to its PID file once its control
/// process is up. All fields are required: a file that parses but lacks one of
/// them is a miss, not a partial success.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct EnclaveDescriptor {
    /// Credential for the status API, sent as `X-Auth-Token`.
    pub api_key: String,
    /// Advertised heartbeat interval, in seconds. Informational only.
    pub heartbeat: u64,
    /// OS process id of the enclave. Diagnostic only.
    pub pid: i32,
    /// Base URI of the local status API. Must end with a separator so that
    /// appending the status resource yields a valid URL.
    pub uri: String,
}

#[derive(Debug)]
enum ReadError {
    IoError(std::io::Error),
    SerdeError(serde_json::Error),
}

fn read_descriptor(path: &Path) -> Result<EnclaveDescriptor, ReadError> {
    let contents = std::fs::read_to_string(path).map_err(ReadError::IoError)?;
    serde_json::from_str(contents.as_str()).map_err(ReadError::SerdeError)
}

/// Poll the PID file until it holds a complete descriptor. Every miss (file
/// absent, unreadable, malformed, incomplete) is logged and retried after the
/// policy wait; only exhausting the budget surfaces an error. Each call starts
/// a fresh attempt budget.
pub fn acquire_descriptor<P: AsRef<Path>>(
    path: P,
    retry: RetryPolicy,
) -> Result<EnclaveDescriptor, Error> {
    let path = path.as_ref();
    for attempt in 1..=retry.attempt_count {
        match read_descriptor(path) {
            Ok(descriptor) => {
                debug!(
                    "Read enclave descriptor from {} on attempt {}",
                    path.display(),
                    attempt
                );
                return Ok(descriptor);
            }
            Err(e) => {
                info!(
                    "Could not read enclave PID file yet (attempt {}/{}): {:?}",
                    attempt, retry.attempt_count, e
                );
                if attempt < retry.attempt_count {
                    std::thread::sleep(retry.wait);
                }
            }
        }
    }
    Err(Error::DescriptorUnavailable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::{Duration, Instant};

    fn fast_retry() -> RetryPolicy {
        RetryPolicy::new(5, Duration::from_millis(5))
    }

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("enfab-pidfile-{}-{}", std::process::id(), name))
    }

    #[test]
    fn round_trip() {
        let path = temp_path("round-trip");
        std::fs::write(
            &path,
            r#"{"api_key":"k","heartbeat":30,"pid":123,"uri":"http://x/"}"#,
        )
        .unwrap();
        let descriptor = acquire_descriptor(&path, fast_retry()).unwrap();
        assert_eq!(descriptor.api_key, "k");
        assert_eq!(descriptor.heartbeat, 30);
        assert_eq!(descriptor.pid, 123);
        assert_eq!(descriptor.uri, "http://x/");
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn absent_file_exhausts_the_budget() {
        let path = temp_path("absent");
        let wait = Duration::from_millis(100);
        let start = Instant::now();
        assert!(matches!(
            acquire_descriptor(&path, RetryPolicy::new(5, wait)),
            Err(Error::DescriptorUnavailable)
        ));
        // 5 attempts with 4 waits between them; the final attempt's failure
        // is terminal with no trailing wait.
        let elapsed = start.elapsed();
        assert!(elapsed >= wait * 4);
        assert!(elapsed < wait * 9 / 2);
    }

    #[test]
    fn incomplete_descriptor_is_a_miss() {
        // `uri` is missing on every attempt: never a partial descriptor.
        let path = temp_path("incomplete");
        std::fs::write(&path, r#"{"api_key":"k","heartbeat":30,"pid":123}"#).unwrap();
        assert!(matches!(
            acquire_descriptor(&path, fast_retry()),
            Err(Error::DescriptorUnavailable)
        ));
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn file_appearing_mid_budget_succeeds() {
        let path = temp_path("late");
        let _ = std::fs::remove_file(&path);
        let writer_path = path.clone();
        let writer = std::thread::spawn(move || {
            // Land somewhere inside the 5-attempt window. Write-then-rename so
            // the reader never observes a half-written file.
            std::thread::sleep(Duration::from_millis(30));
            let staging = writer_path.with_extension("staging");
            let mut file = std::fs::File::create(&staging).unwrap();
            file.write_all(br#"{"api_key":"k","heartbeat":1,"pid":7,"uri":"http://y/"}"#)
                .unwrap();
            std::fs::rename(&staging, &writer_path).unwrap();
        });
        let descriptor =
            acquire_descriptor(&path, RetryPolicy::new(5, Duration::from_millis(20))).unwrap();
        assert_eq!(descriptor.uri, "http://y/");
        writer.join().unwrap();
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn fresh_budget_per_call() {
        let path = temp_path("fresh-budget");
        let _ = std::fs::remove_file(&path);
        assert!(acquire_descriptor(&path, fast_retry()).is_err());
        // A later call starts over; with the file now present it succeeds on
        // its first attempt.
        std::fs::write(
            &path,
            r#"{"api_key":"k","heartbeat":30,"pid":123,"uri":"http://x/"}"#,
        )
        .unwrap();
        assert!(acquire_descriptor(&path, fast_retry()).is_ok());
        std::fs::remove_file(&path).unwrap();
    }
}
