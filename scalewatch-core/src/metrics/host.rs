//! Host-level readings: memory, root disk, open connections, load average.

use std::path::Path;
use std::sync::Mutex;

use sysinfo::{Disks, System};

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("no disk mounted at {0}")]
    DiskNotFound(String),

    #[error("{0} reports zero capacity")]
    ZeroCapacity(&'static str),

    #[error("failed to read connection table {path}: {source}")]
    ConnectionTable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("host probe state poisoned")]
    Poisoned,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HostReadings {
    pub memory_percent: f64,
    pub disk_percent: f64,
    pub network_connections: u64,
    pub load_average_1m: f64,
}

pub trait HostProbe: Send + Sync {
    fn read(&self) -> Result<HostReadings, HostError>;
}

/// sysinfo-backed probe. Connection counts come from `/proc/net` on Linux and
/// are reported as 0 elsewhere.
pub struct SysinfoHost {
    sys: Mutex<System>,
    disk_mount: String,
}

impl SysinfoHost {
    pub fn new() -> Self {
        Self::with_disk_mount("/")
    }

    pub fn with_disk_mount(mount: impl Into<String>) -> Self {
        Self {
            sys: Mutex::new(System::new()),
            disk_mount: mount.into(),
        }
    }

    fn memory_percent(&self) -> Result<f64, HostError> {
        let mut sys = self.sys.lock().map_err(|_| HostError::Poisoned)?;
        sys.refresh_memory();

        let total = sys.total_memory();
        if total == 0 {
            return Err(HostError::ZeroCapacity("memory"));
        }
        let used = total.saturating_sub(sys.available_memory());
        Ok(percent(used, total))
    }

    fn disk_percent(&self) -> Result<f64, HostError> {
        // Mounts can change between cycles, so the list is rebuilt on every read.
        let disks = Disks::new_with_refreshed_list();
        let mount = Path::new(&self.disk_mount);
        let disk = disks
            .list()
            .iter()
            .find(|d| d.mount_point() == mount)
            .ok_or_else(|| HostError::DiskNotFound(self.disk_mount.clone()))?;

        let total = disk.total_space();
        if total == 0 {
            return Err(HostError::ZeroCapacity("disk"));
        }
        let used = total.saturating_sub(disk.available_space());
        Ok(percent(used, total))
    }
}

impl Default for SysinfoHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HostProbe for SysinfoHost {
    fn read(&self) -> Result<HostReadings, HostError> {
        Ok(HostReadings {
            memory_percent: self.memory_percent()?,
            disk_percent: self.disk_percent()?,
            network_connections: count_connections()?,
            load_average_1m: System::load_average().one,
        })
    }
}

fn percent(used: u64, total: u64) -> f64 {
    (used as f64 / total as f64) * 100.0
}

#[cfg(target_os = "linux")]
fn count_connections() -> Result<u64, HostError> {
    const TABLES: [&str; 4] = [
        "/proc/net/tcp",
        "/proc/net/tcp6",
        "/proc/net/udp",
        "/proc/net/udp6",
    ];

    let mut total = 0u64;
    for path in TABLES {
        let table = match std::fs::read_to_string(path) {
            Ok(v) => v,
            // IPv6 tables are absent when the kernel has IPv6 disabled.
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => continue,
            Err(source) => {
                return Err(HostError::ConnectionTable {
                    path: path.to_string(),
                    source,
                });
            }
        };
        total = total.saturating_add(count_table_entries(&table));
    }
    Ok(total)
}

#[cfg(not(target_os = "linux"))]
fn count_connections() -> Result<u64, HostError> {
    Ok(0)
}

/// Entries in a `/proc/net/{tcp,udp}*` table: every non-empty line after the header.
fn count_table_entries(table: &str) -> u64 {
    table
        .lines()
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .count() as u64
}
