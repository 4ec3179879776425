//! Natural-language intent resolution.
//!
//! Free text goes to a language model, the structured reply is normalized
//! (missing end or start times are filled with a one hour default), both sides
//! of the exchange are logged, and the intent is dispatched to the calendar.

pub mod llm;
pub mod model;
pub mod normalize;
pub mod prompt;
pub mod resolver;

pub use llm::{LanguageModel, OpenAiModel};
pub use model::{DispatchOutcome, IntentKind, NormalizedEvent, ParsedIntent};
pub use resolver::IntentResolver;
