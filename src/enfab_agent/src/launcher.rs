// Copyright 2020-2023 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
use log::debug;
use std::collections::HashMap;
use std::process::{Command, ExitStatus};

use crate::defs;

#[derive(Debug)]
pub enum Error {
    ExecError(std::io::Error),
}

/// Build the launch helper's environment: a snapshot of the current process
/// environment, extended with the two enclave variables. The helper gets an
/// explicit map (`env_clear` + `envs`) so nothing here mutates the agent's own
/// ambient environment.
pub fn build_environment(binary_path: &str, enrolment_key: &str) -> HashMap<String, String> {
    let mut env: HashMap<String, String> = std::env::vars().collect();
    env.insert(defs::ENCLAVE_BINARY_ENV.to_string(), binary_path.to_string());
    env.insert(
        defs::ENCLAVE_ENROLMENT_KEY_ENV.to_string(),
        enrolment_key.to_string(),
    );
    env
}

/// Run the launch helper to completion. The helper daemonizes the enclave
/// binary and exits quickly; its exit status is reported back for logging but
/// is otherwise not interpreted. Only a failure to invoke it at all is an
/// error.
pub fn spawn_enclave(
    helper_path: &str,
    binary_path: &str,
    enrolment_key: &str,
) -> Result<ExitStatus, Error> {
    let env = build_environment(binary_path, enrolment_key);
    debug!("Running enclave launch helper {}", helper_path);
    Command::new(helper_path)
        .env_clear()
        .envs(&env)
        .status()
        .map_err(Error::ExecError)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_carries_injected_variables() {
        let env = build_environment("/opt/enclave/enclaved", "sekrit");
        assert_eq!(
            env.get(defs::ENCLAVE_BINARY_ENV).map(String::as_str),
            Some("/opt/enclave/enclaved")
        );
        assert_eq!(
            env.get(defs::ENCLAVE_ENROLMENT_KEY_ENV).map(String::as_str),
            Some("sekrit")
        );
    }

    #[test]
    fn environment_carries_the_ambient_snapshot() {
        // Assert on a variable the test runner already has, rather than
        // mutating the process-global environment under parallel tests.
        let path = std::env::var("PATH").unwrap();
        let env = build_environment("/bin/true", "k");
        assert_eq!(env.get("PATH"), Some(&path));
    }

    #[test]
    fn spawn_reports_helper_exit_status() {
        let status = spawn_enclave("/bin/true", "/opt/enclave/enclaved", "k").unwrap();
        assert!(status.success());
        let status = spawn_enclave("/bin/false", "/opt/enclave/enclaved", "k").unwrap();
        assert!(!status.success());
    }

    #[test]
    fn missing_helper_is_an_exec_error() {
        assert!(spawn_enclave("/nonexistent/helper", "/bin/true", "k").is_err());
    }
}
