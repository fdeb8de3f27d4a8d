//! Method table for the TaskService.

use std::fmt;

/// Fully qualified name of the task service.
pub const TASK_SERVICE: &str = "task.TaskService";

/// Fully qualified name of the standard gRPC health service.
pub const HEALTH_SERVICE: &str = "grpc.health.v1.Health";

/// Every remote method the client can invoke.
///
/// Each variant maps to exactly one method path and the mapping never
/// changes at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskMethod {
    // Process
    Start,
    StartAttach,
    Dump,
    Restore,
    RestoreAttach,
    Query,

    // CRI-O image distribution
    CrioRootfsDump,
    CrioImagePush,

    // Containerd
    ContainerdDump,
    ContainerdRestore,
    ContainerdQuery,
    ContainerdRootfsDump,
    ContainerdRootfsRestore,

    // Runc
    RuncGetPausePid,
    RuncDump,
    RuncRestore,
    RuncQuery,

    // Kata
    KataDump,
    KataRestore,

    // Config
    GetConfig,

    // Health
    HealthCheck,
    DetailedHealthCheck,
}

impl TaskMethod {
    /// All methods, in declaration order.
    pub const ALL: [TaskMethod; 22] = [
        TaskMethod::Start,
        TaskMethod::StartAttach,
        TaskMethod::Dump,
        TaskMethod::Restore,
        TaskMethod::RestoreAttach,
        TaskMethod::Query,
        TaskMethod::CrioRootfsDump,
        TaskMethod::CrioImagePush,
        TaskMethod::ContainerdDump,
        TaskMethod::ContainerdRestore,
        TaskMethod::ContainerdQuery,
        TaskMethod::ContainerdRootfsDump,
        TaskMethod::ContainerdRootfsRestore,
        TaskMethod::RuncGetPausePid,
        TaskMethod::RuncDump,
        TaskMethod::RuncRestore,
        TaskMethod::RuncQuery,
        TaskMethod::KataDump,
        TaskMethod::KataRestore,
        TaskMethod::GetConfig,
        TaskMethod::HealthCheck,
        TaskMethod::DetailedHealthCheck,
    ];

    /// Method name as it appears in the service definition.
    pub const fn name(self) -> &'static str {
        match self {
            TaskMethod::Start => "Start",
            TaskMethod::StartAttach => "StartAttach",
            TaskMethod::Dump => "Dump",
            TaskMethod::Restore => "Restore",
            TaskMethod::RestoreAttach => "RestoreAttach",
            TaskMethod::Query => "Query",
            TaskMethod::CrioRootfsDump => "CRIORootfsDump",
            TaskMethod::CrioImagePush => "CRIOImagePush",
            TaskMethod::ContainerdDump => "ContainerdDump",
            TaskMethod::ContainerdRestore => "ContainerdRestore",
            TaskMethod::ContainerdQuery => "ContainerdQuery",
            TaskMethod::ContainerdRootfsDump => "ContainerdRootfsDump",
            TaskMethod::ContainerdRootfsRestore => "ContainerdRootfsRestore",
            TaskMethod::RuncGetPausePid => "RuncGetPausePid",
            TaskMethod::RuncDump => "RuncDump",
            TaskMethod::RuncRestore => "RuncRestore",
            TaskMethod::RuncQuery => "RuncQuery",
            TaskMethod::KataDump => "KataDump",
            TaskMethod::KataRestore => "KataRestore",
            TaskMethod::GetConfig => "GetConfig",
            TaskMethod::HealthCheck => "Check",
            TaskMethod::DetailedHealthCheck => "DetailedHealthCheck",
        }
    }

    /// HTTP/2 path used on the wire.
    pub const fn path(self) -> &'static str {
        match self {
            TaskMethod::Start => "/task.TaskService/Start",
            TaskMethod::StartAttach => "/task.TaskService/StartAttach",
            TaskMethod::Dump => "/task.TaskService/Dump",
            TaskMethod::Restore => "/task.TaskService/Restore",
            TaskMethod::RestoreAttach => "/task.TaskService/RestoreAttach",
            TaskMethod::Query => "/task.TaskService/Query",
            TaskMethod::CrioRootfsDump => "/task.TaskService/CRIORootfsDump",
            TaskMethod::CrioImagePush => "/task.TaskService/CRIOImagePush",
            TaskMethod::ContainerdDump => "/task.TaskService/ContainerdDump",
            TaskMethod::ContainerdRestore => "/task.TaskService/ContainerdRestore",
            TaskMethod::ContainerdQuery => "/task.TaskService/ContainerdQuery",
            TaskMethod::ContainerdRootfsDump => "/task.TaskService/ContainerdRootfsDump",
            TaskMethod::ContainerdRootfsRestore => "/task.TaskService/ContainerdRootfsRestore",
            TaskMethod::RuncGetPausePid => "/task.TaskService/RuncGetPausePid",
            TaskMethod::RuncDump => "/task.TaskService/RuncDump",
            TaskMethod::RuncRestore => "/task.TaskService/RuncRestore",
            TaskMethod::RuncQuery => "/task.TaskService/RuncQuery",
            TaskMethod::KataDump => "/task.TaskService/KataDump",
            TaskMethod::KataRestore => "/task.TaskService/KataRestore",
            TaskMethod::GetConfig => "/task.TaskService/GetConfig",
            TaskMethod::HealthCheck => "/grpc.health.v1.Health/Check",
            TaskMethod::DetailedHealthCheck => "/task.TaskService/DetailedHealthCheck",
        }
    }

    /// Service the method belongs to.
    pub const fn service(self) -> &'static str {
        match self {
            TaskMethod::HealthCheck => HEALTH_SERVICE,
            _ => TASK_SERVICE,
        }
    }

    /// Whether the method is a bidirectional stream opened with a handshake.
    pub const fn is_streaming(self) -> bool {
        matches!(self, TaskMethod::StartAttach | TaskMethod::RestoreAttach)
    }
}

impl fmt::Display for TaskMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.service(), self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_paths_are_unique() {
        let paths: HashSet<_> = TaskMethod::ALL.iter().map(|m| m.path()).collect();
        assert_eq!(paths.len(), TaskMethod::ALL.len());
    }

    #[test]
    fn test_path_matches_service_and_name() {
        for method in TaskMethod::ALL {
            assert_eq!(
                method.path(),
                format!("/{}/{}", method.service(), method.name())
            );
        }
    }

    #[test]
    fn test_only_attach_methods_stream() {
        let streaming: Vec<_> = TaskMethod::ALL
            .into_iter()
            .filter(|m| m.is_streaming())
            .collect();
        assert_eq!(
            streaming,
            vec![TaskMethod::StartAttach, TaskMethod::RestoreAttach]
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(TaskMethod::Dump.to_string(), "task.TaskService/Dump");
        assert_eq!(
            TaskMethod::HealthCheck.to_string(),
            "grpc.health.v1.Health/Check"
        );
    }
}
