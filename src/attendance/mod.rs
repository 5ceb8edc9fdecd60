mod character;
mod report;
mod state;

pub use character::{RetrySettings, run_character};
pub use report::{FinalReport, Fragment, FragmentLevel, Report};
pub use state::{AttemptOutcome, CharacterRun, CheckInState, Transition};
