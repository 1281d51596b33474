//! Callback descriptor - everything a token carries.

use serde::{Deserialize, Serialize};

use crate::error::DescriptorError;
use crate::value_objects::{CallbackFlags, ClassifiedArguments, LiteralValue};

/// Upper bound on argument positions, literal or client evaluated.
pub const MAX_ARGUMENTS: usize = 256;

/// Options supplied when a callback is offered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CallbackOptions {
    pub id: Option<String>,
    /// Forces the response content type when a value is returned.
    pub mime_type: Option<String>,
    /// Suppress the refresh directive for calls without a return value.
    pub disable_immediate_update: bool,
    /// Return the operation's value as the response body.
    pub return_value: bool,
    /// Pass every request parameter to the operation as one object.
    pub supply_all_arguments: bool,
    /// Pass the raw request body as the first argument.
    pub supply_body: bool,
}

impl CallbackOptions {
    pub fn flags(&self) -> CallbackFlags {
        let mut flags = CallbackFlags::empty();
        flags.set(
            CallbackFlags::DISABLE_IMMEDIATE_UPDATE,
            self.disable_immediate_update,
        );
        flags.set(CallbackFlags::RETURN_VALUE, self.return_value);
        flags.set(CallbackFlags::SUPPLY_ALL_ARGUMENTS, self.supply_all_arguments);
        flags.set(CallbackFlags::SUPPLY_BODY, self.supply_body);
        flags
    }
}

/// A target operation plus its arguments and behaviour flags.
///
/// Literal positions and client-evaluated positions are disjoint and each
/// list is kept in ascending order, so two descriptors built from the same
/// arguments compare equal regardless of insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackDescriptor {
    target_name: String,
    flags: CallbackFlags,
    mime_type: Option<String>,
    id: Option<String>,
    literal_args: Vec<(usize, LiteralValue)>,
    client_positions: Vec<usize>,
}

impl CallbackDescriptor {
    /// Descriptor without arguments, flags, or options.
    pub fn new(target_name: impl Into<String>) -> Self {
        Self {
            target_name: target_name.into(),
            flags: CallbackFlags::empty(),
            mime_type: None,
            id: None,
            literal_args: Vec::new(),
            client_positions: Vec::new(),
        }
    }

    /// Descriptor for an offer, taking flags and metadata from `options`.
    pub fn from_offer(
        target_name: impl Into<String>,
        options: &CallbackOptions,
        arguments: &ClassifiedArguments,
    ) -> Result<Self, DescriptorError> {
        Self::new(target_name)
            .with_flags(options.flags())
            .with_mime_type(options.mime_type.clone())
            .with_id(options.id.clone())
            .with_arguments(arguments.literals.clone(), arguments.client_positions.clone())
    }

    pub fn with_flags(mut self, flags: CallbackFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_mime_type(mut self, mime_type: Option<String>) -> Self {
        self.mime_type = mime_type;
        self
    }

    pub fn with_id(mut self, id: Option<String>) -> Self {
        self.id = id;
        self
    }

    /// Set literal and client-evaluated positions, enforcing disjointness
    /// and the [`MAX_ARGUMENTS`] bound.
    pub fn with_arguments(
        mut self,
        mut literal_args: Vec<(usize, LiteralValue)>,
        mut client_positions: Vec<usize>,
    ) -> Result<Self, DescriptorError> {
        literal_args.sort_by_key(|(position, _)| *position);
        client_positions.sort_unstable();

        let highest = literal_args
            .last()
            .map(|(position, _)| *position)
            .into_iter()
            .chain(client_positions.last().copied())
            .max();
        if let Some(position) = highest.filter(|p| *p >= MAX_ARGUMENTS) {
            return Err(DescriptorError::PositionOutOfRange {
                position,
                limit: MAX_ARGUMENTS,
            });
        }

        if let Some(pair) = literal_args.windows(2).find(|w| w[0].0 == w[1].0) {
            return Err(DescriptorError::DuplicateLiteral(pair[0].0));
        }
        if let Some(pair) = client_positions.windows(2).find(|w| w[0] == w[1]) {
            return Err(DescriptorError::DuplicateClientPosition(pair[0]));
        }
        if let Some((position, _)) = literal_args
            .iter()
            .find(|(position, _)| client_positions.binary_search(position).is_ok())
        {
            return Err(DescriptorError::Overlap(*position));
        }

        self.literal_args = literal_args;
        self.client_positions = client_positions;
        Ok(self)
    }

    pub fn target_name(&self) -> &str {
        &self.target_name
    }

    pub fn flags(&self) -> CallbackFlags {
        self.flags
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn literal_args(&self) -> &[(usize, LiteralValue)] {
        &self.literal_args
    }

    pub fn client_positions(&self) -> &[usize] {
        &self.client_positions
    }

    /// Whether the offer declared any argument list at all.
    pub fn has_arguments(&self) -> bool {
        !self.literal_args.is_empty() || !self.client_positions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::{classify_arguments, SourceArg};

    #[test]
    fn test_positions_are_normalized_to_ascending_order() {
        let a = CallbackDescriptor::new("scopes.x.run")
            .with_arguments(vec![(2, "c".into()), (0, "a".into())], vec![3, 1])
            .expect("valid positions");
        let b = CallbackDescriptor::new("scopes.x.run")
            .with_arguments(vec![(0, "a".into()), (2, "c".into())], vec![1, 3])
            .expect("valid positions");

        assert_eq!(a, b);
        assert_eq!(a.client_positions(), &[1, 3]);
    }

    #[test]
    fn test_overlapping_positions_are_rejected() {
        let err = CallbackDescriptor::new("t")
            .with_arguments(vec![(1, true.into())], vec![0, 1])
            .expect_err("overlap must be rejected");
        assert_eq!(err, DescriptorError::Overlap(1));
    }

    #[test]
    fn test_duplicate_positions_are_rejected() {
        assert_eq!(
            CallbackDescriptor::new("t").with_arguments(vec![(0, "a".into()), (0, "b".into())], vec![]),
            Err(DescriptorError::DuplicateLiteral(0))
        );
        assert_eq!(
            CallbackDescriptor::new("t").with_arguments(vec![], vec![2, 2]),
            Err(DescriptorError::DuplicateClientPosition(2))
        );
    }

    #[test]
    fn test_positions_beyond_limit_are_rejected() {
        assert_eq!(
            CallbackDescriptor::new("t").with_arguments(vec![(usize::MAX, "x".into())], vec![]),
            Err(DescriptorError::PositionOutOfRange {
                position: usize::MAX,
                limit: MAX_ARGUMENTS,
            })
        );
        assert_eq!(
            CallbackDescriptor::new("t").with_arguments(vec![], vec![0, MAX_ARGUMENTS]),
            Err(DescriptorError::PositionOutOfRange {
                position: MAX_ARGUMENTS,
                limit: MAX_ARGUMENTS,
            })
        );
        assert!(CallbackDescriptor::new("t")
            .with_arguments(vec![(MAX_ARGUMENTS - 1, true.into())], vec![])
            .is_ok());
    }

    #[test]
    fn test_from_offer_carries_options_and_arguments() {
        let options = CallbackOptions {
            id: Some("btn-1".to_string()),
            mime_type: Some("text/csv".to_string()),
            return_value: true,
            supply_body: true,
            ..Default::default()
        };
        let args = classify_arguments(&[SourceArg::from("'lit'"), SourceArg::from("field")]);

        let descriptor =
            CallbackDescriptor::from_offer("scopes.export.csv", &options, &args).expect("valid");

        assert_eq!(descriptor.target_name(), "scopes.export.csv");
        assert_eq!(descriptor.id(), Some("btn-1"));
        assert_eq!(descriptor.mime_type(), Some("text/csv"));
        assert_eq!(
            descriptor.flags(),
            CallbackFlags::RETURN_VALUE | CallbackFlags::SUPPLY_BODY
        );
        assert_eq!(descriptor.literal_args(), &[(0, LiteralValue::from("lit"))]);
        assert_eq!(descriptor.client_positions(), &[1]);
        assert!(descriptor.has_arguments());
    }
}
