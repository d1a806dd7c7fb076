use std::fmt;

use sysinfo::System;

/// Host details reported in the startup banner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostInfo {
    pub os: String,
    pub host_name: String,
    pub family: &'static str,
}

impl HostInfo {
    pub fn detect() -> Self {
        Self {
            os: System::long_os_version()
                .or_else(System::name)
                .unwrap_or_else(|| std::env::consts::OS.to_string()),
            host_name: System::host_name().unwrap_or_else(|| "unknown".to_string()),
            family: std::env::consts::FAMILY,
        }
    }
}

impl fmt::Display for HostInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {})", self.host_name, self.os, self.family)
    }
}
