//! Domain events module.
//!
//! Services emit these after a successful mutation so that an embedding
//! application can refresh views or schedule follow-up work.

mod domain_event;
mod sink;

pub use domain_event::*;
pub use sink::*;
