// Copyright 2020-2023 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
use std::time::Duration;

use crate::config;
use crate::defs;

/// Fixed-count, fixed-wait retry policy shared by both bootstrap stages.
/// Attempts are strictly sequential; the wait is inserted between attempts
/// only, never after the final one.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    pub attempt_count: usize,
    pub wait: Duration,
}

impl RetryPolicy {
    pub fn new(attempt_count: usize, wait: Duration) -> Self {
        Self {
            attempt_count,
            wait,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            defs::DEFAULT_ATTEMPT_COUNT,
            Duration::from_millis(defs::DEFAULT_RETRY_WAIT_MS),
        )
    }
}

impl From<&config::Options> for RetryPolicy {
    fn from(options: &config::Options) -> Self {
        Self::new(
            options.attempt_count,
            Duration::from_millis(options.retry_wait_ms),
        )
    }
}
