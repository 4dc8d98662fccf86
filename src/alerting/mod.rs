pub mod alert_type;
pub mod filter;
pub mod model;
pub mod reconcile;
pub mod rules;
pub mod service;
pub mod summary;

pub use alert_type::{default_alert_types, AlertType, AlertTypeName, CreateAlertType, Severity};
pub use filter::{
    query_alerts, AlertFilter, AlertOrder, AlertOrderBy, AlertView, Page, PageRequest,
    PaginationData, SortOrder,
};
pub use model::{
    AdditionalBackupAlert, Alert, AlertKind, AlertState, Backup, BackupType, CreationDateAlert,
    DataStoreSnapshot, MissingBackupAlert, SizeAlert, StorageFillAlert, StorageFillFact,
};
pub use reconcile::{plan_storage_fill, ReconciliationPlan, ReconciliationReport};
pub use rules::{
    evaluate_creation_time, evaluate_size, evaluate_storage_fill, storage_fill_facts, Direction,
    Evaluation, RuleThresholds, TimeEvaluation,
};
pub use service::{
    AlertingService, CreateAdditionalBackupAlert, CreateCreationDateAlert, CreateMissingBackupAlert,
    CreateSizeAlert,
};
pub use summary::{AlertStatistics, AlertSummary, RepeatedAlert, RepetitionSubject};
