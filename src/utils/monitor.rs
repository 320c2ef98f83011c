use crate::domain::model::PerformanceMetrics;
use serde::{Deserialize, Serialize};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Which CPU figure the sampler reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
pub enum CpuScope {
    /// Utilization of the whole machine.
    #[default]
    System,
    /// Utilization of this process; may exceed 100 on multi-core hosts.
    Process,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub sample_interval_ms: u64,
    pub cpu_scope: CpuScope,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            sample_interval_ms: 100,
            cpu_scope: CpuScope::System,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct ResourcePeaks {
    memory_mb: f64,
    cpu_percent: f64,
}

impl ResourcePeaks {
    fn max(self, other: ResourcePeaks) -> ResourcePeaks {
        ResourcePeaks {
            memory_mb: self.memory_mb.max(other.memory_mb),
            cpu_percent: self.cpu_percent.max(other.cpu_percent),
        }
    }
}

struct ResourceProbe {
    system: System,
    pid: Option<Pid>,
    scope: CpuScope,
}

impl ResourceProbe {
    fn new(scope: CpuScope) -> Self {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(e) => {
                tracing::warn!("Cannot resolve current PID, memory will read as 0: {}", e);
                None
            }
        };

        let mut probe = Self {
            system: System::new(),
            pid,
            scope,
        };
        // CPU 使用率需要一次基準刷新
        probe.refresh();
        probe
    }

    fn refresh(&mut self) {
        if let Some(pid) = self.pid {
            self.system.refresh_processes_specifics(
                ProcessesToUpdate::Some(&[pid]),
                true,
                ProcessRefreshKind::nothing().with_memory().with_cpu(),
            );
        }
        if self.scope == CpuScope::System {
            self.system.refresh_cpu_usage();
        }
    }

    fn sample(&mut self) -> ResourcePeaks {
        self.refresh();

        let process = self.pid.and_then(|pid| self.system.process(pid));
        let memory_mb = process
            .map(|process| process.memory() as f64 / BYTES_PER_MB)
            .unwrap_or(0.0);
        let cpu = match self.scope {
            CpuScope::System => self.system.global_cpu_usage(),
            CpuScope::Process => process.map(|process| process.cpu_usage()).unwrap_or(0.0),
        };

        ResourcePeaks {
            memory_mb: memory_mb.max(0.0),
            cpu_percent: f64::from(cpu).max(0.0),
        }
    }
}

/// Background sampling thread. Peaks are owned by the thread and handed back
/// through the join handle, so nothing is read before the join.
struct Sampler {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<ResourcePeaks>>,
}

impl Sampler {
    fn start(interval: Duration, scope: CpuScope) -> Self {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let spawned = thread::Builder::new()
            .name("perf-sampler".to_string())
            .spawn(move || {
                let mut probe = ResourceProbe::new(scope);
                let mut peaks = ResourcePeaks::default();
                loop {
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => peaks = peaks.max(probe.sample()),
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                peaks
            });

        let handle = match spawned {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::warn!("⚠️ Sampler thread could not start, metrics will be 0: {}", e);
                None
            }
        };

        Self {
            stop: Some(stop_tx),
            handle,
        }
    }

    fn finish(mut self) -> ResourcePeaks {
        self.stop_and_join()
    }

    fn stop_and_join(&mut self) -> ResourcePeaks {
        if let Some(stop) = self.stop.take() {
            // 取樣執行緒已結束時送不出去，無妨
            let _ = stop.send(());
        }
        match self.handle.take() {
            Some(handle) => handle.join().unwrap_or_else(|_| {
                tracing::warn!("⚠️ Sampler thread panicked, metrics will be 0");
                ResourcePeaks::default()
            }),
            None => ResourcePeaks::default(),
        }
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        // 操作 panic 時也要停下並 join 取樣執行緒
        self.stop_and_join();
    }
}

/// Measures elapsed time plus peak memory and CPU around one call.
#[derive(Debug, Clone)]
pub struct PerformanceMonitor {
    interval: Duration,
    scope: CpuScope,
}

impl PerformanceMonitor {
    pub fn new(config: &MonitorConfig) -> Self {
        Self {
            interval: Duration::from_millis(config.sample_interval_ms.max(1)),
            scope: config.cpu_scope,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Runs `operation` on the calling thread while one sampler thread polls
    /// resource usage. The first sample is taken one interval after start, so
    /// an operation faster than that reports memory and CPU of 0.
    pub fn measure<T, F>(&self, operation: F) -> (T, PerformanceMetrics)
    where
        F: FnOnce() -> T,
    {
        let sampler = Sampler::start(self.interval, self.scope);

        let started = Instant::now();
        let output = operation();
        let elapsed = started.elapsed();

        let peaks = sampler.finish();
        let metrics = PerformanceMetrics {
            extraction_time: elapsed.as_secs_f64(),
            memory_usage: peaks.memory_mb,
            cpu_usage: peaks.cpu_percent,
        };

        tracing::debug!(
            "📊 Time: {:.3}s, Peak memory: {:.1}MB, Peak CPU: {:.1}%",
            metrics.extraction_time,
            metrics.memory_usage,
            metrics.cpu_usage
        );

        (output, metrics)
    }
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self::new(&MonitorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{self, AssertUnwindSafe};

    fn fast_monitor(scope: CpuScope) -> PerformanceMonitor {
        PerformanceMonitor::new(&MonitorConfig {
            sample_interval_ms: 10,
            cpu_scope: scope,
        })
    }

    #[test]
    fn test_instant_operation_reports_zero_resources() {
        let monitor = PerformanceMonitor::default();

        let (value, metrics) = monitor.measure(|| 21 * 2);

        assert_eq!(value, 42);
        assert_eq!(metrics.memory_usage, 0.0);
        assert_eq!(metrics.cpu_usage, 0.0);
        assert!(metrics.extraction_time >= 0.0);
    }

    #[test]
    fn test_slow_operation_records_peaks() {
        for scope in [CpuScope::System, CpuScope::Process] {
            let monitor = fast_monitor(scope);

            let ((), metrics) = monitor.measure(|| thread::sleep(Duration::from_millis(150)));

            assert!(metrics.extraction_time >= 0.15);
            assert!(metrics.memory_usage > 0.0, "resident memory should be sampled");
            assert!(metrics.cpu_usage >= 0.0);
        }
    }

    #[test]
    fn test_error_result_is_returned_with_metrics() {
        let monitor = fast_monitor(CpuScope::System);

        let (result, metrics): (Result<(), String>, _) =
            monitor.measure(|| Err("backend failed".to_string()));

        assert_eq!(result.unwrap_err(), "backend failed");
        assert!(metrics.extraction_time >= 0.0);
    }

    #[test]
    fn test_panic_propagates_after_sampler_stops() {
        let monitor = fast_monitor(CpuScope::System);

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            monitor.measure(|| -> u32 { panic!("backend crashed") })
        }));

        assert!(outcome.is_err());
        // 監控器仍可重複使用
        let (value, _) = monitor.measure(|| 7);
        assert_eq!(value, 7);
    }

    #[test]
    fn test_zero_interval_is_clamped() {
        let monitor = PerformanceMonitor::new(&MonitorConfig {
            sample_interval_ms: 0,
            cpu_scope: CpuScope::Process,
        });
        assert_eq!(monitor.interval(), Duration::from_millis(1));
    }
}
