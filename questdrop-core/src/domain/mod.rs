pub mod completion;
pub mod journey;
pub mod objective;
pub mod results;
pub mod state;

pub use completion::CompletionStatus;
pub use journey::IdentityJourney;
pub use objective::{LedgerEntrypoint, ObjectiveCode};
pub use results::{AirdropResult, HandlerResult, IdentityReport, ReconcileOutcome, SyncOutcome};
pub use state::{EligibilityRecord, SyncRecord};
