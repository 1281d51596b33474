//! Argument assembly for a dispatched callback.
//!
//! Merges the literals carried in the token with the values the client
//! supplied at call time, so the operation sees its arguments in exactly the
//! order they were written when the callback was offered.

use serde_json::{Map, Value};

use crate::descriptor::{CallbackDescriptor, MAX_ARGUMENTS};
use crate::invocation::{InvocationRequest, CLIENT_ARG_PARAM, TOKEN_PARAM};

/// Merge literals and client values into one positional list.
///
/// The list spans `0..=max position`, capped at [`MAX_ARGUMENTS`]; positions
/// past the cap are ignored. The n-th client value fills the n-th client
/// position; missing client values and positions that were skipped when the
/// callback was offered are `null`.
pub fn merge_positional(
    literals: &[(usize, crate::LiteralValue)],
    client_positions: &[usize],
    client_values: &[String],
) -> Vec<Value> {
    let len = literals
        .iter()
        .map(|(position, _)| *position)
        .chain(client_positions.iter().copied())
        .filter_map(|position| position.checked_add(1))
        .filter(|len| *len <= MAX_ARGUMENTS)
        .max()
        .unwrap_or(0);

    let mut merged = vec![Value::Null; len];
    for (position, value) in literals {
        if let Some(slot) = merged.get_mut(*position) {
            *slot = value.to_json();
        }
    }
    for (index, position) in client_positions.iter().enumerate() {
        if let Some(slot) = merged.get_mut(*position) {
            *slot = client_values
                .get(index)
                .map_or(Value::Null, |v| Value::String(v.clone()));
        }
    }
    merged
}

/// Build the argument list the target operation is invoked with.
///
/// - `SUPPLY_ALL_ARGUMENTS`: a single object of every request parameter
///   except the token; when the offer declared arguments, its `p` field is
///   replaced by the merged positional list.
/// - otherwise: the merged positional list (empty without arguments).
/// - `SUPPLY_BODY`: the body, decoded as UTF-8 with invalid sequences
///   replaced, is prepended as argument 0. The body is not read otherwise.
pub fn build_arguments(descriptor: &CallbackDescriptor, request: &InvocationRequest) -> Vec<Value> {
    let flags = descriptor.flags();
    let merged = merge_positional(
        descriptor.literal_args(),
        descriptor.client_positions(),
        request.client_values(),
    );

    let mut args = if flags.supplies_all_arguments() {
        let mut object: Map<String, Value> = request
            .params
            .iter()
            .filter(|(name, _)| name.as_str() != TOKEN_PARAM)
            .map(|(name, values)| {
                let values = values.iter().cloned().map(Value::String).collect();
                (name.clone(), Value::Array(values))
            })
            .collect();
        if descriptor.has_arguments() {
            object.insert(CLIENT_ARG_PARAM.to_string(), Value::Array(merged));
        }
        vec![Value::Object(object)]
    } else {
        merged
    };

    if flags.supplies_body() {
        let body = request
            .body
            .as_deref()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .unwrap_or_default();
        args.insert(0, Value::String(body));
    }

    args
}
