// Copyright 2020-2023 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0
use log::{debug, info};
use serde::Serialize;

use enfab_client::StatusClient;

use crate::pidfile::EnclaveDescriptor;
use crate::retry::RetryPolicy;

/// Terminal error: the status API never reported a provisioned address within
/// the retry budget.
#[derive(Debug)]
pub enum Error {
    ReadinessUnavailable,
}

/// The bootstrap success value, handed back to the calling pipeline step.
#[derive(Clone, Debug, Serialize)]
pub struct Readiness {
    pub id: String,
    #[serde(rename = "localAddress")]
    pub local_address: String,
}

// During enclave startup a transport error, a malformed body and a
// not-yet-provisioned profile are indistinguishable transient states, so they
// share one retry branch.
#[derive(Debug)]
enum ProbeError {
    ClientError(enfab_client::Error),
    NotReady,
}

fn probe(descriptor: &EnclaveDescriptor) -> Result<Readiness, ProbeError> {
    let client = StatusClient::new(descriptor.uri.as_str(), descriptor.api_key.as_str())
        .map_err(ProbeError::ClientError)?;
    debug!("Querying {}", client.endpoint().url());
    let status = client.fetch_status().map_err(ProbeError::ClientError)?;
    if !status.is_provisioned() {
        return Err(ProbeError::NotReady);
    }
    Ok(Readiness {
        id: status.profile.certificate.subject_distinguished_name,
        local_address: status.profile.virtual_address,
    })
}

/// Poll the enclave's status API until it reports a provisioned virtual
/// address. One authenticated GET per attempt, over a fresh connection; every
/// miss is logged and retried after the policy wait. Only exhausting the
/// budget surfaces an error.
pub fn wait_for_ready(
    descriptor: &EnclaveDescriptor,
    retry: RetryPolicy,
) -> Result<Readiness, Error> {
    for attempt in 1..=retry.attempt_count {
        match probe(descriptor) {
            Ok(readiness) => return Ok(readiness),
            Err(e) => {
                info!(
                    "Could not load enclave status yet (attempt {}/{}): {:?}",
                    attempt, retry.attempt_count, e
                );
                if attempt < retry.attempt_count {
                    std::thread::sleep(retry.wait);
                }
            }
        }
    }
    Err(Error::ReadinessUnavailable)
}
