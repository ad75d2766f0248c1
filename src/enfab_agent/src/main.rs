// Copyright 2020-2023 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
extern crate enfab_client;
extern crate log;
extern crate nix;
extern crate serde;
extern crate serde_json;
extern crate serde_yaml;

mod agent;
mod config;
mod launcher;
mod logger;
mod pidfile;
mod poller;
mod retry;

use log::info;
use std::fmt;

pub mod defs {
    pub const DEFAULT_CONFIG_PATH: &str = "/etc/enclave/enfab.yaml";
    /// Where the enclave publishes its descriptor once its control process is up.
    pub const DEFAULT_PID_FILE_PATH: &str = "/etc/enclave/pid/Universe.profile.pid";
    /// Launch helper that daemonizes the enclave binary and returns.
    pub const DEFAULT_LAUNCH_HELPER: &str = "/usr/share/enclave/spawn-linux.sh";

    /// Environment variables injected into the launch helper.
    pub const ENCLAVE_BINARY_ENV: &str = "ENCLAVE_BINARY";
    pub const ENCLAVE_ENROLMENT_KEY_ENV: &str = "ENCLAVE_ENROLMENT_KEY";

    /// Fixed retry policy for both bootstrap stages: up to 5 attempts,
    /// 3 seconds apart, no backoff.
    pub const DEFAULT_ATTEMPT_COUNT: usize = 5;
    pub const DEFAULT_RETRY_WAIT_MS: u64 = 3000;

    pub const DEFAULT_LOG_LEVEL: log::Level = log::Level::Info;
    pub const DEFAULT_LOG_TIMESTAMP: bool = false;
}

#[derive(Debug)]
enum Error {
    AgentError(agent::Error),
    ConfigError(config::Error),
    ResultEncodeError(serde_json::Error),
}

impl From<Error> for i32 {
    fn from(_other: Error) -> i32 {
        // NOTE: we could discriminate between errors here to provide a more
        // specific exit code.
        1
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::AgentError(e) => write!(f, "AgentError: {:?}", e),
            Self::ConfigError(e) => write!(f, "ConfigError: {:?}", e),
            Self::ResultEncodeError(e) => write!(f, "ResultEncodeError: {:?}", e),
        }
    }
}

fn rusty_main() -> Result<(), Error> {
    let mut args = std::env::args();

    args.next();

    let config_path = args
        .next()
        .unwrap_or_else(|| defs::DEFAULT_CONFIG_PATH.to_string());
    let mut config = config::Config::from_file(config_path).map_err(Error::ConfigError)?;

    log::set_boxed_logger(Box::new(logger::Logger::new(config.log.take())))
        .map(|()| log::set_max_level(log::LevelFilter::Debug))
        .unwrap_or_else(|e| eprintln!("Warning: failed to initialize logger: {:?}", e));

    let readiness = agent::Agent::new(config)
        .bootstrap()
        .map_err(Error::AgentError)?;

    info!(
        "Enclave ready: id={}, local address={}",
        readiness.id, readiness.local_address
    );

    // The calling pipeline step consumes the result from stdout. An encoding
    // failure must exit nonzero rather than print a truthy-looking stub.
    let result = serde_json::to_string(&readiness).map_err(Error::ResultEncodeError)?;
    println!("{}", result);

    Ok(())
}

fn main() {
    match rusty_main() {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(i32::from(e))
        }
    }
}
