//! Host capabilities as seen from the plugin.
//!
//! [`HostCapabilities`] is what the host provides; every method has a
//! no-op default so a host that lacks a capability simply does not override
//! it. [`PluginHost`] wraps it for the plugin's main thread: it mirrors log
//! lines to the `log` facade and keeps the table mapping host timer ids to
//! the plugin's own timer tags.

use std::collections::HashMap;
use std::sync::Arc;

/// Host-assigned timer identifier.
pub type TimerId = u32;

/// Plugin-chosen tag identifying what a timer is for.
pub type TimerTag = u32;

/// Severity of a host log message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSeverity {
    Debug,
    Info,
    Warning,
    Error,
    Fatal,
}

impl LogSeverity {
    fn level(self) -> log::Level {
        match self {
            LogSeverity::Debug => log::Level::Debug,
            LogSeverity::Info => log::Level::Info,
            LogSeverity::Warning => log::Level::Warn,
            LogSeverity::Error | LogSeverity::Fatal => log::Level::Error,
        }
    }
}

/// Capabilities a host exposes to a plugin instance.
pub trait HostCapabilities: Send + Sync {
    /// Host name, for diagnostics.
    fn name(&self) -> &str {
        "unknown host"
    }

    /// Whether the host implements the named extension.
    fn supports_extension(&self, name: &str) -> bool {
        let _ = name;
        false
    }

    /// Write a message to the host's log.
    fn log(&self, severity: LogSeverity, message: &str) {
        let _ = (severity, message);
    }

    /// Ask the host to call `on_main_thread` soon.
    fn request_callback(&self) {}

    /// Register a periodic timer. `None` if timers are unsupported.
    fn register_timer(&self, period_ms: u32) -> Option<TimerId> {
        let _ = period_ms;
        None
    }

    /// Remove a timer registered with [`register_timer`](Self::register_timer).
    fn unregister_timer(&self, id: TimerId) -> bool {
        let _ = id;
        false
    }
}

/// Host without any capabilities.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullHost;

impl HostCapabilities for NullHost {}

/// Main-thread handle to the host.
pub struct PluginHost {
    host: Arc<dyn HostCapabilities>,
    timers: HashMap<TimerId, TimerTag>,
}

impl PluginHost {
    pub fn new(host: Arc<dyn HostCapabilities>) -> Self {
        Self {
            host,
            timers: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        self.host.name()
    }

    pub fn supports_extension(&self, name: &str) -> bool {
        self.host.supports_extension(name)
    }

    /// Log to the host and to the `log` facade.
    pub fn log(&self, severity: LogSeverity, message: &str) {
        log::log!(severity.level(), "{message}");
        self.host.log(severity, message);
    }

    /// Log which of `extensions` the host supports, at debug severity.
    pub fn log_support_matrix(&self, extensions: &[&str]) {
        let report: Vec<String> = extensions
            .iter()
            .map(|name| {
                let mark = if self.supports_extension(name) { '+' } else { '-' };
                format!("{mark}{name}")
            })
            .collect();
        self.log(
            LogSeverity::Debug,
            &format!("{} supports: {}", self.name(), report.join(" ")),
        );
    }

    /// Ask the host for an `on_main_thread` callback.
    pub fn request_callback(&self) {
        self.host.request_callback();
    }

    /// Register a periodic timer tagged `tag`. Returns `None` when the host
    /// has no timer support.
    pub fn add_timer(&mut self, period_ms: u32, tag: TimerTag) -> Option<TimerId> {
        let id = self.host.register_timer(period_ms)?;
        self.timers.insert(id, tag);
        Some(id)
    }

    /// Cancel a timer. Safe to call at any time, including from inside the
    /// timer's own callback. Returns `false` for unknown ids.
    pub fn cancel_timer(&mut self, id: TimerId) -> bool {
        if self.timers.remove(&id).is_none() {
            return false;
        }
        self.host.unregister_timer(id);
        true
    }

    /// Cancel every registered timer.
    pub fn cancel_all_timers(&mut self) {
        let ids: Vec<TimerId> = self.timers.keys().copied().collect();
        for id in ids {
            self.cancel_timer(id);
        }
    }

    /// Tag of a live timer.
    pub fn timer_tag(&self, id: TimerId) -> Option<TimerTag> {
        self.timers.get(&id).copied()
    }

    /// Number of live timers.
    pub fn timer_count(&self) -> usize {
        self.timers.len()
    }
}

impl std::fmt::Debug for PluginHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginHost")
            .field("name", &self.name())
            .field("timers", &self.timers)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct TimerHost {
        next: AtomicU32,
        removed: Mutex<Vec<TimerId>>,
    }

    impl HostCapabilities for TimerHost {
        fn register_timer(&self, _period_ms: u32) -> Option<TimerId> {
            Some(self.next.fetch_add(1, Ordering::Relaxed) + 10)
        }

        fn unregister_timer(&self, id: TimerId) -> bool {
            self.removed.lock().unwrap().push(id);
            true
        }
    }

    #[test]
    fn test_null_host_has_no_timers() {
        let mut host = PluginHost::new(Arc::new(NullHost));
        assert_eq!(host.add_timer(16, 1), None);
        assert!(!host.supports_extension("log"));
        assert!(!host.cancel_timer(3));
        host.log(LogSeverity::Info, "ignored");
    }

    #[test]
    fn test_timer_table() {
        let caps = Arc::new(TimerHost::default());
        let mut host = PluginHost::new(caps.clone());
        let a = host.add_timer(16, 100).unwrap();
        let b = host.add_timer(500, 200).unwrap();
        assert_eq!(host.timer_tag(a), Some(100));
        assert_eq!(host.timer_tag(b), Some(200));

        assert!(host.cancel_timer(a));
        assert!(!host.cancel_timer(a));
        assert_eq!(host.timer_tag(a), None);

        host.cancel_all_timers();
        assert_eq!(host.timer_count(), 0);
        assert_eq!(*caps.removed.lock().unwrap(), vec![a, b]);
    }
}
