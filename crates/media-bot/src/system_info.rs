//! Host information for the status command.

use sysinfo::System;

/// Snapshot of host facts, already formatted for display.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemInfo {
    pub hostname: String,
    pub os: String,
    pub cpu: String,
    pub cpu_cores: usize,
    pub total_ram: String,
    pub free_ram: String,
    pub uptime: String,
    pub version: String,
    /// Compiler and async runtime the binary was built with.
    pub runtime: String,
}

impl SystemInfo {
    /// Read the current host state.
    pub fn collect() -> Self {
        let sys = System::new_all();
        let cpus = sys.cpus();

        Self {
            hostname: System::host_name().unwrap_or_else(|| "unknown".into()),
            os: pretty_os(),
            cpu: cpus
                .first()
                .map(|c| c.brand().trim().to_string())
                .filter(|b| !b.is_empty())
                .unwrap_or_else(|| "N/A".into()),
            cpu_cores: cpus.len(),
            total_ram: format_bytes(sys.total_memory()),
            free_ram: format_bytes(sys.available_memory()),
            uptime: format_uptime(System::uptime()),
            version: format!("{} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            runtime: runtime_version(),
        }
    }
}

/// e.g. `rustc 1.83.0 (90b35a623 2024-11-26), tokio`.
pub fn runtime_version() -> String {
    format!("{}, tokio", env!("MEDIA_BOT_RUSTC_VERSION"))
}

fn pretty_os() -> String {
    let arch = std::env::consts::ARCH;
    match System::long_os_version().or_else(System::name) {
        Some(name) => format!("{} ({})", name, arch),
        None => format!("{} ({})", std::env::consts::OS, arch),
    }
}

/// Human-readable byte count, e.g. `1.5 KB`.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];
    if bytes == 0 {
        return "0 Bytes".into();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[unit])
}

/// Uptime as `Xd Xh Xm Xs`.
pub fn format_uptime(seconds: u64) -> String {
    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3_600;
    let minutes = (seconds % 3_600) / 60;
    let secs = seconds % 60;
    format!("{}d {}h {}m {}s", days, hours, minutes, secs)
}
