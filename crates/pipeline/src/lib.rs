//! Six-stage precision intelligence pipeline: entity scan, fingerprint
//! verification, counter-narrative strategy generation, content template
//! suggestion, performance analysis and deployment readiness.

pub mod keyword;
pub mod orchestrator;
pub mod performance;
pub mod readiness;
pub mod run;
pub mod strategy;
pub mod templates;

pub use orchestrator::{Orchestrator, PipelineError};
pub use run::{
    DeploymentVerdict, EntityScanSummary, KeywordCiaResult, PerformanceSummary, PipelineRequest,
    PipelineResponse, PipelineRun, PrecisionSummary, SeverityCounts, VerifiedItem,
};
pub use strategy::{PlaybookEntry, Strategy, StrategyPlaybook, Urgency};
pub use templates::{ContentTemplate, TemplateKind};
