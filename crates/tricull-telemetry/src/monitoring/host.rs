// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use serde::{Deserialize, Serialize};
use sysinfo::System;

/// A snapshot of the host, stored in reports so runs on different
/// machines are not compared by accident.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostInfo {
    pub os: String,
    pub cpu_brand: String,
    pub logical_cores: usize,
    pub total_memory_mb: u64,
}

impl HostInfo {
    /// Queries the current machine through `sysinfo`.
    pub fn collect() -> Self {
        let mut system = System::new();
        system.refresh_cpu_all();
        system.refresh_memory();

        let os = match (System::name(), System::os_version()) {
            (Some(name), Some(version)) => format!("{name} {version}"),
            (Some(name), None) => name,
            _ => std::env::consts::OS.to_string(),
        };
        let cpu_brand = system
            .cpus()
            .first()
            .map(|cpu| cpu.brand().trim().to_string())
            .filter(|brand| !brand.is_empty())
            .unwrap_or_else(|| "unknown".to_string());

        let info = Self {
            os,
            cpu_brand,
            logical_cores: system.cpus().len(),
            total_memory_mb: system.total_memory() / (1024 * 1024),
        };
        log::debug!("Host: {info:?}");
        info
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collect_reports_something() {
        let info = HostInfo::collect();
        assert!(!info.os.is_empty());
        assert!(!info.cpu_brand.is_empty());
    }
}
