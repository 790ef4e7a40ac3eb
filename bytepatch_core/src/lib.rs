pub mod buffer;
pub mod config;
pub mod engine;
pub mod error;
pub mod mutator;
pub mod observer;
pub mod pattern;
pub mod planner;
pub mod resource;
pub mod scanner;

pub use buffer::ResourceBuffer;
pub use config::BytepatchConfig;
pub use engine::{FindReplaceEngine, FindReplaceOutcome, FindReplaceRequest, RequestState};
pub use error::{ErrorKind, ErrorResponse, FindReplaceError, MutationError, ValidationError};
pub use mutator::ResourceMutator;
pub use observer::{ChangeObserver, NoOpObserver, RecordingObserver, ResourceChanged};
pub use pattern::{ReplacementPattern, SearchPattern, TextEncoding};
pub use planner::{PlanReport, ReplacementPlan, ReplacementPlanner, Verdict, ZeroMatchPolicy};
pub use resource::{CommitError, FileResource, InMemoryResource, Resource};
pub use scanner::{ByteScanner, Occurrence, find_all};
