pub mod ledger;
pub mod metrics;
pub mod processor;
pub mod service;
pub mod watcher;
pub mod writer;

pub use ledger::{FileState, LedgerCounts, LedgerError, StatusLedger};
pub use metrics::{MetricsSnapshot, PipelineMetrics};
pub use processor::{DocumentProcessor, DocumentSummary, ProcessError};
pub use service::{
    FileStatusReport, IngestionService, MonitoringStatus, ServiceConfig, StartOutcome, StopOutcome,
};
pub use watcher::{FolderWatcher, ScanReport, WatcherConfig, discover};
pub use writer::SummaryWriter;
