// Copyright 2020-2023 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
use serde::{Deserialize, Serialize};
use serde_yaml;

use crate::defs;

#[derive(Debug)]
pub enum Error {
    IoError(std::io::Error),
    YamlError(serde_yaml::Error),
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Enclave {
    /// Path of the enclave binary handed to the launch helper.
    pub binary_path: String,
    /// Secret authorizing the enclave to enrol with its control plane.
    pub enrolment_key: String,
    pub launch_helper: Option<String>,
    pub pid_file_path: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Log {
    pub level: LogLevel,
    pub enable_timestamp: Option<bool>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Options {
    #[serde(default = "Options::default_attempt_count")]
    pub attempt_count: usize,
    #[serde(default = "Options::default_retry_wait_ms")]
    pub retry_wait_ms: u64,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    pub enclave: Enclave,
    pub log: Option<Log>,
    #[serde(default)]
    pub options: Options,
}

impl Config {
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, Error> {
        let file = std::fs::OpenOptions::new()
            .read(true)
            .open(path)
            .map_err(Error::IoError)?;
        serde_yaml::from_reader(file).map_err(Error::YamlError)
    }
}

impl From<LogLevel> for log::Level {
    fn from(src: LogLevel) -> Self {
        match src {
            LogLevel::Error => log::Level::Error,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Trace => log::Level::Trace,
        }
    }
}

impl Options {
    fn default_attempt_count() -> usize {
        defs::DEFAULT_ATTEMPT_COUNT
    }
    fn default_retry_wait_ms() -> u64 {
        defs::DEFAULT_RETRY_WAIT_MS
    }
}

impl Default for Options {
    fn default() -> Self {
        Self {
            attempt_count: Self::default_attempt_count(),
            retry_wait_ms: Self::default_retry_wait_ms(),
        }
    }
}
