// Copyright 2020-2021 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

/// The fabric status document served by the enclave's local status API.
///
/// The enclave reports an empty (or absent) `VirtualAddress` until its network
/// identity has been provisioned by the control plane. Certificate data is only
/// meaningful once the address is present, so absent sub-objects decode to
/// their defaults instead of failing the whole document.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct FabricStatus {
    #[serde(rename = "Profile")]
    pub profile: Profile,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Profile {
    #[serde(rename = "VirtualAddress", default)]
    pub virtual_address: String,
    #[serde(rename = "Certificate", default)]
    pub certificate: Certificate,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Certificate {
    #[serde(rename = "subjectDistinguishedName", default)]
    pub subject_distinguished_name: String,
}

impl FabricStatus {
    /// A status document denotes a reachable enclave iff its virtual address
    /// has been filled in.
    pub fn is_provisioned(&self) -> bool {
        !self.profile.virtual_address.is_empty()
    }
}
