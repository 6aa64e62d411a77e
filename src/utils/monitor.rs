//! Process CPU and memory snapshots, logged per catalog when `--monitor` is set.

#[cfg(feature = "cli")]
use std::sync::Mutex;
#[cfg(feature = "cli")]
use std::time::{Duration, Instant};
#[cfg(feature = "cli")]
use sysinfo::{Pid, ProcessesToUpdate, System};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Copy)]
pub struct ProcessSnapshot {
    pub cpu_percent: f32,
    pub rss_mb: u64,
    pub peak_rss_mb: u64,
    pub elapsed: Duration,
}

#[cfg(feature = "cli")]
struct Sampler {
    system: System,
    pid: Pid,
    peak_rss_mb: u64,
}

#[cfg(feature = "cli")]
impl Sampler {
    fn sample(&mut self) -> Option<(f32, u64)> {
        self.system
            .refresh_processes(ProcessesToUpdate::Some(&[self.pid]), true);
        let process = self.system.process(self.pid)?;
        let rss_mb = process.memory() / (1024 * 1024);
        self.peak_rss_mb = self.peak_rss_mb.max(rss_mb);
        Some((process.cpu_usage(), rss_mb))
    }
}

/// 停用時不會建立 sysinfo 的 System
#[cfg(feature = "cli")]
pub struct SystemMonitor {
    sampler: Option<Mutex<Sampler>>,
    started: Instant,
}

#[cfg(feature = "cli")]
impl SystemMonitor {
    pub fn new(enabled: bool) -> Self {
        let sampler = if enabled {
            match sysinfo::get_current_pid() {
                Ok(pid) => Some(Mutex::new(Sampler {
                    system: System::new(),
                    pid,
                    peak_rss_mb: 0,
                })),
                Err(e) => {
                    tracing::warn!("Monitoring disabled, cannot resolve own pid: {}", e);
                    None
                }
            }
        } else {
            None
        };

        Self {
            sampler,
            started: Instant::now(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.sampler.is_some()
    }

    pub fn snapshot(&self) -> Option<ProcessSnapshot> {
        let mut sampler = self.sampler.as_ref()?.lock().ok()?;
        let (cpu_percent, rss_mb) = sampler.sample()?;
        Some(ProcessSnapshot {
            cpu_percent,
            rss_mb,
            peak_rss_mb: sampler.peak_rss_mb,
            elapsed: self.started.elapsed(),
        })
    }

    pub fn log_stats(&self, label: &str) {
        if let Some(s) = self.snapshot() {
            tracing::info!(
                "📊 {} - CPU: {:.1}%, RSS: {}MB, Peak: {}MB, Elapsed: {:.1?}",
                label,
                s.cpu_percent,
                s.rss_mb,
                s.peak_rss_mb,
                s.elapsed
            );
        }
    }

    pub fn log_final_stats(&self) {
        if let Some(s) = self.snapshot() {
            tracing::info!(
                "📊 Run finished in {:.1?}, peak RSS {}MB",
                s.elapsed,
                s.peak_rss_mb
            );
        }
    }
}

// 未啟用 cli feature 時的空實作
#[cfg(not(feature = "cli"))]
pub struct SystemMonitor;

#[cfg(not(feature = "cli"))]
impl SystemMonitor {
    pub fn new(_enabled: bool) -> Self {
        Self
    }

    pub fn is_enabled(&self) -> bool {
        false
    }

    pub fn log_stats(&self, _label: &str) {}

    pub fn log_final_stats(&self) {}
}
