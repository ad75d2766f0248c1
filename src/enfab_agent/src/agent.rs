// Copyright 2020-2023 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
use log::{debug, info, warn};
use nix::sys::signal;
use nix::unistd;

use crate::config;
use crate::defs;
use crate::launcher;
use crate::pidfile;
use crate::poller;
use crate::retry::RetryPolicy;

#[derive(Debug)]
pub enum Error {
    LauncherError(launcher::Error),
    PidFileError(pidfile::Error),
    PollerError(poller::Error),
}

/// The bootstrap orchestrator. Stages run strictly in sequence
/// (launch, descriptor acquisition, readiness polling); a stage failure
/// propagates as-is and nothing is re-entered or retried across stages.
pub struct Agent {
    config: config::Config,
}

impl Agent {
    pub fn new(config: config::Config) -> Self {
        Self { config }
    }

    pub fn bootstrap(&self) -> Result<poller::Readiness, Error> {
        let retry = RetryPolicy::from(&self.config.options);
        let enclave = &self.config.enclave;

        info!("Launching enclave from {}", enclave.binary_path);
        let status = launcher::spawn_enclave(
            enclave
                .launch_helper
                .as_deref()
                .unwrap_or(defs::DEFAULT_LAUNCH_HELPER),
            enclave.binary_path.as_str(),
            enclave.enrolment_key.as_str(),
        )
        .map_err(Error::LauncherError)?;
        // The helper daemonizes the enclave; its exit status is informational.
        debug!("Enclave launch helper exited with {}", status);

        let pid_file_path = enclave
            .pid_file_path
            .as_deref()
            .unwrap_or(defs::DEFAULT_PID_FILE_PATH);
        let descriptor =
            pidfile::acquire_descriptor(pid_file_path, retry).map_err(Error::PidFileError)?;
        info!(
            "Acquired enclave descriptor: pid={}, heartbeat={}s, base uri={}",
            descriptor.pid, descriptor.heartbeat, descriptor.uri
        );
        self.probe_enclave_pid(descriptor.pid);

        let readiness =
            poller::wait_for_ready(&descriptor, retry).map_err(Error::PollerError)?;
        Ok(readiness)
    }

    /// Diagnostic only: report whether the descriptor's PID is visible from
    /// here. Readiness is decided solely by the status API.
    fn probe_enclave_pid(&self, pid: i32) {
        match signal::kill(unistd::Pid::from_raw(pid), None) {
            Ok(()) => debug!("Enclave pid {} is alive", pid),
            Err(e) => warn!("Enclave pid {} is not visible: {}", pid, e),
        }
    }
}
