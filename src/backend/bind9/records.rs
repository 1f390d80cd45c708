// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! DNS record management using dynamic DNS updates (RFC 2136).
//!
//! Records are converted into hickory resource records and sent as
//! TSIG-signed updates. hickory's client is synchronous, so every update runs
//! on the blocking pool.

use anyhow::Context;
use async_trait::async_trait;
use hickory_client::client::{Client, SyncClient};
use hickory_client::op::ResponseCode;
use hickory_client::rr::rdata::{self, CNAME, NS, PTR};
use hickory_client::rr::{DNSClass, Name, RData, Record as DnsRecord};
use hickory_client::udp::UdpClientConnection;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::str::FromStr;
use tracing::{error, info};

use super::tsig::create_tsig_signer;
use super::types::UpdateKey;
use crate::errors::BackendError;
use crate::models::{Record, RecordType};

type Result<T> = std::result::Result<T, BackendError>;

/// Kind of RFC 2136 update to send.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateKind {
    /// Add the record to its RRset
    Append,
    /// Remove exactly this record
    DeleteRdata,
}

impl UpdateKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::Append => "append",
            Self::DeleteRdata => "delete_by_rdata",
        }
    }
}

fn invalid(record: &Record, reason: impl Into<String>) -> BackendError {
    BackendError::InvalidRecordData {
        name: record.name.clone(),
        reason: reason.into(),
    }
}

fn parse_name(record: &Record, value: &str) -> Result<Name> {
    Name::from_str(value).map_err(|e| invalid(record, format!("invalid name '{value}': {e}")))
}

/// Convert a stored record into a hickory resource record.
///
/// SRV data is `"weight port target"` with the priority taken from the record.
///
/// # Errors
///
/// Returns [`BackendError::InvalidRecordData`] when the data does not parse for its type.
pub fn build_record(record: &Record, default_ttl: u32) -> Result<DnsRecord> {
    let owner = parse_name(record, &record.name)?;
    let data = record.data.trim();

    let rdata = match record.record_type {
        RecordType::A => {
            let addr = Ipv4Addr::from_str(data)
                .map_err(|_| invalid(record, format!("invalid IPv4 address '{data}'")))?;
            RData::A(addr.into())
        }
        RecordType::AAAA => {
            let addr = Ipv6Addr::from_str(data)
                .map_err(|_| invalid(record, format!("invalid IPv6 address '{data}'")))?;
            RData::AAAA(addr.into())
        }
        RecordType::CNAME => RData::CNAME(CNAME(parse_name(record, data)?)),
        RecordType::NS => RData::NS(NS(parse_name(record, data)?)),
        RecordType::PTR => RData::PTR(PTR(parse_name(record, data)?)),
        RecordType::MX => {
            let priority = record
                .priority
                .ok_or_else(|| invalid(record, "MX record requires a priority"))?;
            RData::MX(rdata::MX::new(priority, parse_name(record, data)?))
        }
        RecordType::SRV => {
            let priority = record
                .priority
                .ok_or_else(|| invalid(record, "SRV record requires a priority"))?;
            let parts: Vec<&str> = data.split_whitespace().collect();
            let [weight, port, target] = parts.as_slice() else {
                return Err(invalid(record, "SRV data must be 'weight port target'"));
            };
            let weight = weight
                .parse::<u16>()
                .map_err(|_| invalid(record, format!("invalid SRV weight '{weight}'")))?;
            let port = port
                .parse::<u16>()
                .map_err(|_| invalid(record, format!("invalid SRV port '{port}'")))?;
            RData::SRV(rdata::SRV::new(
                priority,
                weight,
                port,
                parse_name(record, target)?,
            ))
        }
        RecordType::TXT => {
            let text = data.trim_matches('"').to_string();
            RData::TXT(rdata::TXT::new(vec![text]))
        }
    };

    let mut dns_record = DnsRecord::from_rdata(owner, record.ttl.unwrap_or(default_ttl), rdata);
    dns_record.set_dns_class(DNSClass::IN);
    Ok(dns_record)
}

/// Sink for RFC 2136 updates against one nameserver.
#[async_trait]
pub trait RecordUpdater: Send + Sync + std::fmt::Debug {
    /// Address the updates go to.
    fn server(&self) -> SocketAddr;

    /// Apply one update for `record` in `zone_name`.
    async fn update(&self, kind: UpdateKind, zone_name: &str, record: DnsRecord) -> Result<()>;
}

/// Sends TSIG-signed dynamic updates over UDP.
#[derive(Clone, Debug)]
pub struct DynamicUpdater {
    server: SocketAddr,
    key: UpdateKey,
}

impl DynamicUpdater {
    #[must_use]
    pub fn new(server: SocketAddr, key: UpdateKey) -> Self {
        Self { server, key }
    }
}

#[async_trait]
impl RecordUpdater for DynamicUpdater {
    fn server(&self) -> SocketAddr {
        self.server
    }

    /// Fails with [`BackendError::DnsUpdate`] if the update cannot be sent or
    /// the server answers with anything other than `NOERROR`.
    async fn update(&self, kind: UpdateKind, zone_name: &str, record: DnsRecord) -> Result<()> {
        let server = self.server;
        let key = self.key.clone();
        let zone_name = zone_name.to_string();
        let fqdn = record.name().to_string();
        let fqdn_for_task = fqdn.clone();

        let outcome = tokio::task::spawn_blocking(move || -> anyhow::Result<ResponseCode> {
            let conn =
                UdpClientConnection::new(server).context("Failed to create UDP connection")?;
            let signer = create_tsig_signer(&key)?;
            let client = SyncClient::with_tsigner(conn, signer);
            let zone = Name::from_str(&zone_name)
                .with_context(|| format!("Invalid zone name: {zone_name}"))?;

            let response = match kind {
                UpdateKind::Append => client.append(record, zone, false),
                UpdateKind::DeleteRdata => client.delete_by_rdata(record, zone),
            }
            .with_context(|| format!("Failed to send DNS UPDATE for {fqdn_for_task}"))?;

            Ok(response.response_code())
        })
        .await
        .context("DNS update task failed");

        let failure = |reason: String| BackendError::DnsUpdate {
            name: fqdn.clone(),
            server: server.to_string(),
            reason,
        };

        match outcome {
            Ok(Ok(ResponseCode::NoError)) => {
                info!(record = %fqdn, server = %server, update = kind.as_str(), "DNS update applied");
                Ok(())
            }
            Ok(Ok(code)) => {
                error!(
                    record = %fqdn,
                    server = %server,
                    update = kind.as_str(),
                    response_code = ?code,
                    "DNS UPDATE rejected by server"
                );
                Err(failure(format!("response code {code:?}")))
            }
            Ok(Err(e)) | Err(e) => Err(failure(format!("{e:#}"))),
        }
    }
}

#[cfg(test)]
#[path = "records_tests.rs"]
mod records_tests;
