//! Callgate domain types.
//!
//! Pure types and rules for callback offers and dispatch: descriptors, the
//! argument quoting rule, argument merging, and invocation results. No I/O
//! and no async runtime live here.

pub mod arguments;
pub mod descriptor;
pub mod error;
pub mod invocation;
pub mod value_objects;

pub use arguments::{build_arguments, merge_positional};
pub use descriptor::{CallbackDescriptor, CallbackOptions, MAX_ARGUMENTS};
pub use error::{
    ArgumentEncodingError, DescriptorError, InvalidTargetError, InvalidTokenError,
    TargetInvocationError,
};
pub use invocation::{
    mime, CallValue, InvocationRequest, InvocationResult, RequestMethod, CLIENT_ARG_PARAM,
    TOKEN_PARAM,
};
pub use value_objects::{
    classify, classify_arguments, CallbackFlags, Classified, ClassifiedArguments, LiteralValue,
    SourceArg,
};
