// Copyright 2020-2021 Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

extern crate serde;
extern crate serde_json;

pub mod schema;
mod transport;

pub use transport::{Endpoint, Error, StatusClient};

pub mod defs {
    /// Resource path of the fabric status endpoint, relative to the base URI
    /// published in the enclave descriptor.
    pub const STATUS_RESOURCE: &str = "fabric/status";

    /// Default TCP port used when the base URI carries none.
    pub const DEFAULT_HTTP_PORT: u16 = 80;

    /// Connect / read / write timeout (in milliseconds) set on the status API stream.
    pub const STREAM_TIMEOUT_MS: u64 = 5000;
}

pub type Result<T> = std::result::Result<T, Error>;
