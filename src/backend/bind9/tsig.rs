// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! TSIG signing for dynamic updates.

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use hickory_client::rr::rdata::tsig::TsigAlgorithm as HickoryTsigAlgorithm;
use hickory_client::rr::Name;
use hickory_proto::rr::dnssec::tsig::TSigner;
use std::str::FromStr;

use super::types::UpdateKey;
use crate::constants::TSIG_FUDGE_TIME_SECS;
use crate::models::TsigAlgorithm;

/// Maps a key algorithm onto hickory's TSIG algorithm.
#[must_use]
pub fn hickory_algorithm(algorithm: TsigAlgorithm) -> HickoryTsigAlgorithm {
    match algorithm {
        TsigAlgorithm::HmacMd5 => HickoryTsigAlgorithm::HmacMd5,
        TsigAlgorithm::HmacSha1 => HickoryTsigAlgorithm::HmacSha1,
        TsigAlgorithm::HmacSha224 => HickoryTsigAlgorithm::HmacSha224,
        TsigAlgorithm::HmacSha256 => HickoryTsigAlgorithm::HmacSha256,
        TsigAlgorithm::HmacSha384 => HickoryTsigAlgorithm::HmacSha384,
        TsigAlgorithm::HmacSha512 => HickoryTsigAlgorithm::HmacSha512,
    }
}

/// Create a TSIG signer from update key settings.
///
/// # Errors
///
/// Returns an error if the secret is not base64 or the key name is not a DNS name.
pub fn create_tsig_signer(key: &UpdateKey) -> Result<TSigner> {
    let key_bytes = BASE64
        .decode(&key.secret)
        .context("Failed to decode TSIG key")?;

    TSigner::new(
        key_bytes,
        hickory_algorithm(key.algorithm),
        Name::from_str(&key.name).context("Invalid TSIG key name")?,
        TSIG_FUDGE_TIME_SECS,
    )
    .context("Failed to create TSIG signer")
}

#[cfg(test)]
#[path = "tsig_tests.rs"]
mod tsig_tests;
