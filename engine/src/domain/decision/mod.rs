//! Auditable decision records
//!
//! - `event` - the immutable `DecisionEvent` and its identity types
//! - `builder` - input canonicalization, hashing and bounded confidence

mod builder;
mod event;

pub use builder::{ConfidenceFactors, DecisionEventBuilder, InputsCanonicalizer, MAX_CONFIDENCE};
pub use event::{AgentVersion, DecisionEvent, DecisionType, outputs_hash};
