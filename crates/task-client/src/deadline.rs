//! Per-class call deadlines.
//!
//! Every request/response call is bounded by the deadline of its operation
//! class. The table is fixed once a client is constructed; tests and
//! embedding applications inject their own through [`DeadlinePolicy`].

use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use task_protocol::TaskMethod;

use crate::error::{TaskError, TaskResult};

/// Default deadline for generic process operations.
pub const DEFAULT_PROCESS_DEADLINE: Duration = Duration::from_secs(20 * 60);
/// Default deadline for containerd operations.
pub const DEFAULT_CONTAINERD_DEADLINE: Duration = Duration::from_secs(10 * 60);
/// Default deadline for runc operations.
pub const DEFAULT_RUNC_DEADLINE: Duration = Duration::from_secs(10 * 60);
/// Longest deadline a policy accepts.
pub const MAX_DEADLINE: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Category used to pick a call's deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationClass {
    Process,
    Containerd,
    Runc,
    Kata,
    Config,
    Health,
}

impl OperationClass {
    pub const ALL: [OperationClass; 6] = [
        OperationClass::Process,
        OperationClass::Containerd,
        OperationClass::Runc,
        OperationClass::Kata,
        OperationClass::Config,
        OperationClass::Health,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            OperationClass::Process => "process",
            OperationClass::Containerd => "containerd",
            OperationClass::Runc => "runc",
            OperationClass::Kata => "kata",
            OperationClass::Config => "config",
            OperationClass::Health => "health",
        }
    }

    /// Class a method is dispatched under.
    ///
    /// `RuncGetPausePid` runs under the process deadline: it only inspects
    /// the sandbox and never drives the checkpoint engine.
    pub const fn of(method: TaskMethod) -> OperationClass {
        match method {
            TaskMethod::Start
            | TaskMethod::StartAttach
            | TaskMethod::Dump
            | TaskMethod::Restore
            | TaskMethod::RestoreAttach
            | TaskMethod::Query
            | TaskMethod::CrioRootfsDump
            | TaskMethod::CrioImagePush
            | TaskMethod::RuncGetPausePid => OperationClass::Process,
            TaskMethod::ContainerdDump
            | TaskMethod::ContainerdRestore
            | TaskMethod::ContainerdQuery
            | TaskMethod::ContainerdRootfsDump
            | TaskMethod::ContainerdRootfsRestore => OperationClass::Containerd,
            TaskMethod::RuncDump | TaskMethod::RuncRestore | TaskMethod::RuncQuery => {
                OperationClass::Runc
            }
            TaskMethod::KataDump | TaskMethod::KataRestore => OperationClass::Kata,
            TaskMethod::GetConfig => OperationClass::Config,
            TaskMethod::HealthCheck | TaskMethod::DetailedHealthCheck => OperationClass::Health,
        }
    }
}

impl fmt::Display for OperationClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maximum duration of a call, per operation class.
///
/// Deserializes from a table of whole seconds keyed by class name; missing
/// keys keep their default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "DeadlineTable")]
pub struct DeadlinePolicy {
    pub process: Duration,
    pub containerd: Duration,
    pub runc: Duration,
    pub kata: Duration,
    pub config: Duration,
    pub health: Duration,
}

impl Default for DeadlinePolicy {
    fn default() -> Self {
        Self {
            process: DEFAULT_PROCESS_DEADLINE,
            containerd: DEFAULT_CONTAINERD_DEADLINE,
            runc: DEFAULT_RUNC_DEADLINE,
            kata: DEFAULT_PROCESS_DEADLINE,
            config: DEFAULT_PROCESS_DEADLINE,
            health: DEFAULT_PROCESS_DEADLINE,
        }
    }
}

impl DeadlinePolicy {
    /// Same deadline for every class.
    pub fn uniform(deadline: Duration) -> Self {
        Self {
            process: deadline,
            containerd: deadline,
            runc: deadline,
            kata: deadline,
            config: deadline,
            health: deadline,
        }
    }

    /// Replace the deadline of one class.
    pub fn with_deadline(mut self, class: OperationClass, deadline: Duration) -> Self {
        *self.slot_mut(class) = deadline;
        self
    }

    pub fn deadline_for(&self, class: OperationClass) -> Duration {
        match class {
            OperationClass::Process => self.process,
            OperationClass::Containerd => self.containerd,
            OperationClass::Runc => self.runc,
            OperationClass::Kata => self.kata,
            OperationClass::Config => self.config,
            OperationClass::Health => self.health,
        }
    }

    /// Reject deadlines that are zero or longer than [`MAX_DEADLINE`].
    pub fn validate(&self) -> TaskResult<()> {
        for class in OperationClass::ALL {
            let deadline = self.deadline_for(class);
            if deadline.is_zero() || deadline > MAX_DEADLINE {
                return Err(TaskError::InvalidDeadline { class, deadline });
            }
        }
        Ok(())
    }

    fn slot_mut(&mut self, class: OperationClass) -> &mut Duration {
        match class {
            OperationClass::Process => &mut self.process,
            OperationClass::Containerd => &mut self.containerd,
            OperationClass::Runc => &mut self.runc,
            OperationClass::Kata => &mut self.kata,
            OperationClass::Config => &mut self.config,
            OperationClass::Health => &mut self.health,
        }
    }
}

/// Serialized shape of [`DeadlinePolicy`].
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct DeadlineTable {
    process: Option<u64>,
    containerd: Option<u64>,
    runc: Option<u64>,
    kata: Option<u64>,
    config: Option<u64>,
    health: Option<u64>,
}

impl From<DeadlineTable> for DeadlinePolicy {
    fn from(table: DeadlineTable) -> Self {
        let defaults = DeadlinePolicy::default();
        let pick = |secs: Option<u64>, fallback: Duration| {
            secs.map(Duration::from_secs).unwrap_or(fallback)
        };
        Self {
            process: pick(table.process, defaults.process),
            containerd: pick(table.containerd, defaults.containerd),
            runc: pick(table.runc, defaults.runc),
            kata: pick(table.kata, defaults.kata),
            config: pick(table.config, defaults.config),
            health: pick(table.health, defaults.health),
        }
    }
}
