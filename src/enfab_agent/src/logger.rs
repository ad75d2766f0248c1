// Copyright 2020-2023 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
use std::fmt::Write;
use std::time::Instant;

use log;

use crate::config;
use crate::defs;

/// Plain stderr logger, with uptime-relative timestamps. The agent runs as a
/// short-lived bootstrap step, so wall-clock timestamps add nothing over what
/// the calling pipeline already records.
pub struct Logger {
    timebase: Instant,
    level: log::Level,
    enable_timestamp: bool,
}

impl Logger {
    pub fn new(log_config: Option<config::Log>) -> Self {
        let (level, enable_timestamp) = log_config
            .map(|log| {
                (
                    log.level.into(),
                    log.enable_timestamp.unwrap_or(defs::DEFAULT_LOG_TIMESTAMP),
                )
            })
            .unwrap_or((defs::DEFAULT_LOG_LEVEL, defs::DEFAULT_LOG_TIMESTAMP));
        Self {
            level,
            enable_timestamp,
            timebase: Instant::now(),
        }
    }

    fn fmt_now(&self) -> String {
        let diff = Instant::now().duration_since(self.timebase);
        let mut secs = diff.as_secs();
        let min = secs / 60;
        secs %= 60;

        format!("{:02}:{:02}.{:03}", min, secs, diff.subsec_millis())
    }
}

impl log::Log for Logger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= self.level
    }
    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            let mut msg = String::new();
            if self.enable_timestamp {
                write!(msg, "[{}] ", self.fmt_now()).unwrap_or_default();
            }
            eprintln!("{}|{:6}| {}", msg, record.level(), record.args());
        }
    }
    fn flush(&self) {}
}
