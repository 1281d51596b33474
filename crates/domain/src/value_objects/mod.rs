//! Value objects for callback offers.

mod flags;
mod literal;
mod source_arg;

pub use flags::CallbackFlags;
pub use literal::LiteralValue;
pub use source_arg::{classify, classify_arguments, Classified, ClassifiedArguments, SourceArg};
