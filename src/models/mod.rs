pub mod criterion;
pub mod evaluation;
pub mod file;
pub mod project;
pub mod provider;

pub use criterion::Criterion;
pub use evaluation::{DetailedAnalysis, EvaluationRequest, EvaluationResponse, Recommendation};
pub use file::{FileContent, FileRef, FileType};
pub use project::{ProgramContext, ProjectData};
pub use provider::{ProviderConfig, ProviderKind};
