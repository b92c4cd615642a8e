//! Parsing helpers for the plain-text mount table (`mount` output, `/proc/mounts`).

/// Mount sources (first whitespace-delimited column), in table order.
pub fn parse_sources(content: &str) -> Vec<String> {
    content
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .map(unescape_mount_path)
        .collect()
}

/// Sources whose path starts with `device`, one per mount-table entry, ordered for
/// unmounting.
///
/// A source mounted at several places appears once per mount, since unmounting by
/// device only releases the most recent one. Partitions come highest number first and
/// the bare disk last (`/dev/sda10`, `/dev/sda9`, `/dev/sda1`, `/dev/sda`).
pub fn sources_under_device(sources: &[String], device: &str) -> Vec<String> {
    let mut matched: Vec<String> = sources
        .iter()
        .filter(|source| source.starts_with(device))
        .cloned()
        .collect();
    matched.sort_by_key(|source| std::cmp::Reverse(unmount_rank(&source[device.len()..])));
    matched
}

/// `(is a partition, partition number)` for the part of a source after the disk path.
fn unmount_rank(suffix: &str) -> (bool, u64) {
    let digits_at = suffix
        .rfind(|c: char| !c.is_ascii_digit())
        .map_or(0, |i| i + 1);
    let number = suffix[digits_at..].parse().unwrap_or(0);
    (!suffix.is_empty(), number)
}

pub fn unescape_mount_path(raw: &str) -> String {
    raw.replace("\\040", " ")
        .replace("\\011", "\t")
        .replace("\\012", "\n")
        .replace("\\134", "\\")
}

#[cfg(test)]
mod tests {
    use super::*;

    const MOUNT_OUTPUT: &str = "\
/dev/nvme0n1p3 on / type btrfs (rw,relatime,seclabel,compress=zstd:1)
proc on /proc type proc (rw,nosuid,nodev,noexec,relatime)
/dev/sda1 on /run/media/me/boot type ext4 (rw,nosuid,nodev,relatime)
/dev/sda2 on /run/media/me/EFI-SYSTEM type vfat (rw,nosuid,nodev,relatime)
/dev/sdb1 on /run/media/me/backup type ext4 (rw,nosuid,nodev,relatime)
";

    #[test]
    fn parse_sources_takes_first_column() {
        let sources = parse_sources(MOUNT_OUTPUT);
        assert_eq!(
            sources,
            vec!["/dev/nvme0n1p3", "proc", "/dev/sda1", "/dev/sda2", "/dev/sdb1"]
        );
    }

    #[test]
    fn parse_sources_skips_blank_lines() {
        assert_eq!(parse_sources("\n\n/dev/sda1 on /mnt type vfat\n"), vec!["/dev/sda1"]);
    }

    #[test]
    fn sources_under_device_filters_by_prefix() {
        let sources = parse_sources(MOUNT_OUTPUT);
        let matched = sources_under_device(&sources, "/dev/sda");
        assert_eq!(matched, vec!["/dev/sda2".to_string(), "/dev/sda1".to_string()]);
    }

    #[test]
    fn sources_under_device_orders_partitions_before_disk() {
        let sources: Vec<String> = ["/dev/sda", "/dev/sda1", "/dev/sda3"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let matched = sources_under_device(&sources, "/dev/sda");
        assert_eq!(matched, vec!["/dev/sda3", "/dev/sda1", "/dev/sda"]);
    }

    #[test]
    fn sources_under_device_orders_two_digit_partitions_numerically() {
        let sources: Vec<String> = ["/dev/sda1", "/dev/sda9", "/dev/sda10"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(
            sources_under_device(&sources, "/dev/sda"),
            vec!["/dev/sda10", "/dev/sda9", "/dev/sda1"]
        );

        let sources: Vec<String> = ["/dev/mmcblk0", "/dev/mmcblk0p2", "/dev/mmcblk0p10"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(
            sources_under_device(&sources, "/dev/mmcblk0"),
            vec!["/dev/mmcblk0p10", "/dev/mmcblk0p2", "/dev/mmcblk0"]
        );
    }

    #[test]
    fn sources_under_device_keeps_one_entry_per_mount() {
        let sources: Vec<String> = ["/dev/sda4", "/dev/sda1", "/dev/sda4"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(
            sources_under_device(&sources, "/dev/sda"),
            vec!["/dev/sda4", "/dev/sda4", "/dev/sda1"]
        );
    }

    #[test]
    fn sources_under_device_ignores_other_disks() {
        let sources = parse_sources(MOUNT_OUTPUT);
        assert!(sources_under_device(&sources, "/dev/sdc").is_empty());
    }

    #[test]
    fn sources_are_unescaped() {
        let sources = parse_sources("/dev/disk/by-label/my\\040disk on /mnt type ext4\n");
        assert_eq!(sources, vec!["/dev/disk/by-label/my disk"]);
    }
}
