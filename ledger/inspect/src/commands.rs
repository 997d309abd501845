// Copyright (c) 2024 Botho Foundation

//! Subcommand implementations. Each returns its output instead of printing
//! it so the commands can be tested without a terminal.

use crate::error::InspectError;
use anyhow::{Context, Result};
use bth_ledger_types::{
    config::JsonConfig, decode, encode, BlockSummary, BlockSummaryVisitor, Digest,
    EncryptedAmount, EncryptedBalanceWindow, Error, GenesisData, GenesisKind, GenesisPayload,
    GenesisVisitor, InvalidValue, ProtocolVersion, Timestamp, UpdatesPayload, Versioned,
    WindowPolicy,
};
use std::{fmt, fs, path::Path};
use tracing::{debug, info};

/// Read a binary record, either raw or as hex text.
pub fn read_binary(path: &Path, as_hex: bool) -> Result<Vec<u8>> {
    let bytes = if as_hex {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        hex::decode(text.trim()).map_err(InspectError::from)?
    } else {
        fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?
    };
    if bytes.is_empty() {
        return Err(InspectError::EmptyInput(path.to_path_buf()).into());
    }
    debug!(path = %path.display(), len = bytes.len(), "read binary input");
    Ok(bytes)
}

/// Read a UTF-8 input file.
pub fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Decode a binary genesis record and render it as JSON.
pub fn genesis_to_json(bytes: &[u8], json: &JsonConfig) -> Result<String> {
    let genesis: GenesisData = decode(bytes).context("Failed to decode genesis data")?;
    info!(
        version = %genesis.protocol_version(),
        kind = %genesis.kind(),
        "decoded genesis data"
    );
    json.render(&genesis).context("Failed to render genesis data")
}

/// Parse a JSON genesis record and produce its binary encoding.
pub fn genesis_from_json(text: &str) -> Result<Vec<u8>> {
    let genesis: GenesisData =
        serde_json::from_str(text).context("Failed to parse genesis JSON")?;
    info!(version = %genesis.protocol_version(), "parsed genesis data");
    Ok(encode(&genesis))
}

/// What an operator wants to know about a genesis record at a glance.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GenesisReport {
    pub version: ProtocolVersion,
    pub kind: GenesisKind,
    pub genesis_time: Timestamp,
    pub accounts: usize,
    pub hash: Digest,
}

impl fmt::Display for GenesisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "protocol:     {}", self.version)?;
        writeln!(f, "kind:         {}", self.kind)?;
        writeln!(f, "genesis time: {}", self.genesis_time)?;
        writeln!(f, "accounts:     {}", self.accounts)?;
        write!(f, "hash:         {}", self.hash)
    }
}

struct DescribeGenesis;

impl GenesisVisitor for DescribeGenesis {
    type Output = (ProtocolVersion, GenesisKind, Timestamp, usize);

    fn visit<P: GenesisPayload>(self, payload: &P) -> Self::Output {
        (
            P::VERSION,
            payload.kind(),
            payload.core().genesis_time(),
            payload.accounts().len(),
        )
    }
}

/// Summarize a genesis record.
pub fn genesis_report(genesis: &GenesisData) -> GenesisReport {
    let (version, kind, genesis_time, accounts) = genesis.with_payload(DescribeGenesis);
    GenesisReport {
        version,
        kind,
        genesis_time,
        accounts,
        hash: genesis.canonical_hash(),
    }
}

/// Decode a binary genesis record and summarize it.
pub fn genesis_hash(bytes: &[u8]) -> Result<GenesisReport> {
    let genesis: GenesisData = decode(bytes).context("Failed to decode genesis data")?;
    Ok(genesis_report(&genesis))
}

struct DescribeSummary;

impl BlockSummaryVisitor for DescribeSummary {
    type Output = String;

    fn visit<P: UpdatesPayload>(self, version: ProtocolVersion, payload: &P) -> String {
        format!(
            "{version}: {} pending updates, foundation account {}",
            payload.pending_updates(),
            payload.foundation_account_index()
        )
    }
}

/// Decode a binary block summary of the given version and render it as JSON.
pub fn summary_to_json(version: u64, bytes: &[u8], json: &JsonConfig) -> Result<String> {
    let version = ProtocolVersion::try_from(version)?;
    let summary = BlockSummary::decode_for_version(version, bytes)
        .with_context(|| format!("Failed to decode {version} block summary"))?;
    info!("{}", summary.with_payload(DescribeSummary));
    json.render(&summary).context("Failed to render block summary")
}

/// Shape of an encrypted-balance window.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct WindowReport {
    pub start_index: u64,
    pub next_index: u64,
    pub len: usize,
    pub aggregated: u32,
}

impl fmt::Display for WindowReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "indices {}..{}, {} entries ({} aggregated)",
            self.start_index, self.next_index, self.len, self.aggregated
        )
    }
}

/// Parse a JSON window and check it against the configured policy.
pub fn check_window(text: &str, policy: &WindowPolicy) -> Result<WindowReport> {
    let window: EncryptedBalanceWindow<EncryptedAmount> =
        serde_json::from_str(text).context("Failed to parse encrypted balance window")?;
    policy.check(&window).map_err(|err| match err {
        Error::InvalidValue(InvalidValue::WindowTooLong { len, max }) => {
            InspectError::WindowTooLong { len, max }.into()
        }
        other => anyhow::Error::from(other),
    })?;
    Ok(WindowReport {
        start_index: window.start_index(),
        next_index: window.next_index(),
        len: window.len(),
        aggregated: window.aggregated().map_or(0, |agg| agg.count()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bth_ledger_types::{AggregatedAmount, Ciphertext};
    use tempfile::tempdir;

    fn window_json(incoming: usize, aggregated: Option<u32>) -> String {
        let window = EncryptedBalanceWindow::new(
            EncryptedAmount::zero(),
            10,
            aggregated.map(|count| AggregatedAmount::new(EncryptedAmount::zero(), count).unwrap()),
            (0..incoming).map(|_| EncryptedAmount::zero()),
        );
        serde_json::to_string(&window).unwrap()
    }

    #[test]
    fn test_check_window_reports_indices() {
        let report = check_window(&window_json(3, Some(4)), &WindowPolicy::default()).unwrap();
        assert_eq!(
            report,
            WindowReport {
                start_index: 10,
                next_index: 14,
                len: 4,
                aggregated: 4,
            }
        );
        assert_eq!(report.to_string(), "indices 10..14, 4 entries (4 aggregated)");
    }

    #[test]
    fn test_check_window_applies_policy() {
        let policy = WindowPolicy { max_incoming: 2 };
        let err = check_window(&window_json(3, None), &policy).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<InspectError>(),
            Some(InspectError::WindowTooLong { len: 3, max: 2 })
        ));
    }

    #[test]
    fn test_malformed_window_is_rejected() {
        assert!(check_window("{\"selfAmount\": \"00\"}", &WindowPolicy::default()).is_err());
    }

    #[test]
    fn test_read_binary_hex_and_empty() {
        let dir = tempdir().unwrap();
        let hex_path = dir.path().join("record.hex");
        fs::write(&hex_path, "0102ff\n").unwrap();
        assert_eq!(read_binary(&hex_path, true).unwrap(), vec![1, 2, 0xff]);

        let empty = dir.path().join("empty.bin");
        fs::write(&empty, b"").unwrap();
        let err = read_binary(&empty, false).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<InspectError>(),
            Some(InspectError::EmptyInput(_))
        ));

        fs::write(&hex_path, "zz").unwrap();
        let err = read_binary(&hex_path, true).unwrap_err();
        assert!(matches!(err.downcast_ref::<InspectError>(), Some(InspectError::Hex(_))));
    }

    #[test]
    fn test_unsupported_versions_are_reported() {
        let err = genesis_to_json(&[9, 0], &JsonConfig::default()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::UnsupportedVersion(9))
        ));
        assert!(summary_to_json(7, &[0], &JsonConfig::default()).is_err());
    }

    #[test]
    fn test_genesis_json_without_version_is_rejected() {
        let err = genesis_from_json("{\"type\": \"initial\"}").unwrap_err();
        assert!(format!("{err:#}").contains("protocolVersion"));
    }
}
