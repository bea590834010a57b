pub mod engine;
pub mod session;
pub mod states;

pub use engine::{StepEngine, StepTransitionError};
pub use session::{resolve_availability, AvailabilityMap, ConfigurationSession};
pub use states::{SessionStep, StepAction, StepContext, StepEvent, TransitionOutcome};
