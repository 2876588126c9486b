use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// One JSONL record per accepted submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptRecord {
    /// ISO string from the API receipt (e.g. "2025-11-04T21:26:06.133Z")
    pub timestamp: String,
    /// Address the solution was submitted with
    pub address: String,
    /// Challenge id (e.g. "**D06C22")
    #[serde(alias = "challenge_id")]
    pub challenge_id: String,
    pub nonce: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

/// Holds file locations inside the keystore directory:
///   - 00receipts.jsonl: one receipt per line
///   - 00errors.jsonl: one failed submission per line
///   - 00star_rates.json: JSON array of per-day STAR rates (index 0 = day 1)
pub struct Accounting {
    receipts_path: PathBuf,
    errors_path: PathBuf,
    star_rates_path: PathBuf,
}

impl Accounting {
    /// Construct using env var KEYSTORE (default "keystore").
    pub fn new_from_env() -> Result<Self> {
        let root = std::env::var("KEYSTORE").unwrap_or_else(|_| "keystore".to_string());
        Self::new(root)
    }

    /// Construct using an explicit keystore directory.
    pub fn new<P: AsRef<Path>>(keystore_dir: P) -> Result<Self> {
        let root = keystore_dir.as_ref();
        fs::create_dir_all(root)
            .with_context(|| format!("creating keystore dir {}", root.display()))?;
        Ok(Self {
            receipts_path: root.join("00receipts.jsonl"),
            errors_path: root.join("00errors.jsonl"),
            star_rates_path: root.join("00star_rates.json"),
        })
    }

    /// Read all receipts as a full snapshot.
    pub fn read_all_receipts(&self) -> Result<Vec<ReceiptRecord>> {
        if !self.receipts_path.exists() {
            return Ok(Vec::new());
        }
        let f = OpenOptions::new()
            .read(true)
            .open(&self.receipts_path)
            .with_context(|| format!("opening {}", self.receipts_path.display()))?;
        let reader = BufReader::new(f);
        let mut out = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<ReceiptRecord>(&line) {
                Ok(rec) => out.push(rec),
                Err(e) => {
                    // keep going if there's a torn or corrupt line
                    tracing::warn!("Ignoring malformed receipt line: {e}");
                }
            }
        }
        tracing::debug!(receipts = out.len(), "read receipt log");
        Ok(out)
    }

    /// Number of failed submissions logged so far.
    pub fn count_errors(&self) -> Result<u64> {
        if !self.errors_path.exists() {
            return Ok(0);
        }
        let f = OpenOptions::new()
            .read(true)
            .open(&self.errors_path)
            .with_context(|| format!("opening {}", self.errors_path.display()))?;
        let mut total = 0;
        for line in BufReader::new(f).lines() {
            if !line?.trim().is_empty() {
                total += 1;
            }
        }
        Ok(total)
    }

    /// Persist daily STAR rates (index 0 => day 1).
    pub fn write_star_rates(&self, rates: &[f64]) -> Result<()> {
        let tmp = serde_json::to_string_pretty(rates)?;
        fs::write(&self.star_rates_path, tmp)
            .with_context(|| format!("writing {}", self.star_rates_path.display()))?;
        Ok(())
    }

    /// Load daily STAR rates (index 0 => day 1). Empty if not present.
    pub fn read_star_rates(&self) -> Result<Vec<f64>> {
        if !self.star_rates_path.exists() {
            return Ok(Vec::new());
        }
        let txt = fs::read_to_string(&self.star_rates_path)?;
        let v: Vec<f64> = serde_json::from_str(&txt)
            .with_context(|| format!("parsing {}", self.star_rates_path.display()))?;
        Ok(v)
    }
}

/// Drop operator fee receipts before aggregation.
pub fn exclude_fee_receipts(
    receipts: Vec<ReceiptRecord>,
    fee_addresses: &[String],
) -> Vec<ReceiptRecord> {
    if fee_addresses.is_empty() {
        return receipts;
    }
    let fees: HashSet<&str> = fee_addresses.iter().map(String::as_str).collect();
    receipts
        .into_iter()
        .filter(|r| !fees.contains(r.address.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn append_line(path: &Path, line: &str) {
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .unwrap();
        writeln!(f, "{}", line).unwrap();
    }

    #[test]
    fn test_missing_files_are_empty() {
        let dir = tempdir().unwrap();
        let acc = Accounting::new(dir.path().join("ks")).unwrap();
        assert!(acc.read_all_receipts().unwrap().is_empty());
        assert_eq!(acc.count_errors().unwrap(), 0);
        assert!(acc.read_star_rates().unwrap().is_empty());
    }

    #[test]
    fn test_read_receipts_skips_malformed_lines() {
        let dir = tempdir().unwrap();
        let acc = Accounting::new(dir.path()).unwrap();
        let path = dir.path().join("00receipts.jsonl");

        append_line(
            &path,
            r#"{"timestamp":"2025-11-05T10:15:00.000Z","address":"addr1","challengeId":"**D07C01","nonce":"00ff"}"#,
        );
        append_line(&path, "");
        append_line(&path, r#"{"timestamp":"2025-11-05T10:"#);
        append_line(
            &path,
            r#"{"timestamp":"2025-11-05T10:45:00.000Z","address":"addr2","challenge_id":"**D07C02","nonce":"01ff","hash":"abcd"}"#,
        );

        let receipts = acc.read_all_receipts().unwrap();
        assert_eq!(receipts.len(), 2);
        assert_eq!(receipts[0].challenge_id, "**D07C01");
        assert_eq!(receipts[0].hash, None);
        assert_eq!(receipts[1].challenge_id, "**D07C02");
        assert_eq!(receipts[1].hash.as_deref(), Some("abcd"));
    }

    #[test]
    fn test_count_errors() {
        let dir = tempdir().unwrap();
        let acc = Accounting::new(dir.path()).unwrap();
        let path = dir.path().join("00errors.jsonl");
        append_line(&path, r#"{"error":"submit failed: 400"}"#);
        append_line(&path, "   ");
        append_line(&path, r#"{"error":"timeout"}"#);
        assert_eq!(acc.count_errors().unwrap(), 2);
    }

    #[test]
    fn test_star_rates_persist() {
        let dir = tempdir().unwrap();
        let acc = Accounting::new(dir.path()).unwrap();
        acc.write_star_rates(&[10882519.0, 7692307.0, 12487254.5]).unwrap();
        assert_eq!(
            acc.read_star_rates().unwrap(),
            vec![10882519.0, 7692307.0, 12487254.5]
        );
    }

    #[test]
    fn test_star_rates_accept_integers() {
        let dir = tempdir().unwrap();
        let acc = Accounting::new(dir.path()).unwrap();
        fs::write(dir.path().join("00star_rates.json"), "[1, 2, 3]").unwrap();
        assert_eq!(acc.read_star_rates().unwrap(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_exclude_fee_receipts() {
        let make = |address: &str| ReceiptRecord {
            timestamp: "2025-11-05T10:15:00.000Z".to_string(),
            address: address.to_string(),
            challenge_id: "**D07C01".to_string(),
            nonce: "00".to_string(),
            hash: None,
        };
        let receipts = vec![make("user1"), make("fee"), make("user2"), make("fee")];

        let kept = exclude_fee_receipts(receipts.clone(), &["fee".to_string()]);
        let addrs: Vec<&str> = kept.iter().map(|r| r.address.as_str()).collect();
        assert_eq!(addrs, vec!["user1", "user2"]);

        assert_eq!(exclude_fee_receipts(receipts.clone(), &[]), receipts);
    }
}
