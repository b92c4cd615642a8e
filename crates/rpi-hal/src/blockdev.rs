//! Parsing helpers for `lsblk --json` output.

use crate::HalResult;
use serde::Deserialize;

/// One block device (disk or partition) as reported by lsblk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockDevice {
    pub label: Option<String>,
    pub path: String,
}

#[derive(Debug, Deserialize)]
struct LsblkOutput {
    #[serde(default)]
    blockdevices: Vec<LsblkEntry>,
}

#[derive(Debug, Deserialize)]
struct LsblkEntry {
    #[serde(default, alias = "LABEL")]
    label: Option<String>,
    #[serde(alias = "PATH")]
    path: String,
    #[serde(default)]
    children: Vec<LsblkEntry>,
}

/// Parse `lsblk -J` output into a flat, depth-first list.
///
/// lsblk nests partitions under their disk unless `--list` is given; both shapes are
/// accepted and yield the same order.
pub fn parse_lsblk_json(json: &str) -> HalResult<Vec<BlockDevice>> {
    let parsed: LsblkOutput = serde_json::from_str(json)?;
    let mut out = Vec::new();
    for entry in parsed.blockdevices {
        flatten(entry, &mut out);
    }
    Ok(out)
}

fn flatten(entry: LsblkEntry, out: &mut Vec<BlockDevice>) {
    out.push(BlockDevice {
        label: entry.label,
        path: entry.path,
    });
    for child in entry.children {
        flatten(child, out);
    }
}

/// Path of the first device carrying exactly `label`.
pub fn find_by_label<'a>(devices: &'a [BlockDevice], label: &str) -> Option<&'a str> {
    devices
        .iter()
        .find(|d| d.label.as_deref() == Some(label))
        .map(|d| d.path.as_str())
}
