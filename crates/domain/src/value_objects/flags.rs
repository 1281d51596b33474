//! Behaviour flags carried inside a callback token.

use bitflags::bitflags;

bitflags! {
    /// Behaviour switches for a single callback.
    ///
    /// Bit values are part of the token wire format and must not change.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CallbackFlags: u8 {
        /// Do not refresh client state after a call without return value.
        const DISABLE_IMMEDIATE_UPDATE = 1;
        /// Serialize the operation's return value as the response body.
        /// Takes precedence over `DISABLE_IMMEDIATE_UPDATE`.
        const RETURN_VALUE = 1 << 1;
        /// Pass every request parameter to the operation as one object.
        const SUPPLY_ALL_ARGUMENTS = 1 << 2;
        /// Pass the raw request body as the first argument.
        const SUPPLY_BODY = 1 << 3;
    }
}

impl CallbackFlags {
    /// Rebuild flags from wire bits, ignoring unknown bits.
    pub fn from_wire(bits: u8) -> Self {
        Self::from_bits_truncate(bits)
    }

    pub fn returns_value(self) -> bool {
        self.contains(Self::RETURN_VALUE)
    }

    pub fn supplies_all_arguments(self) -> bool {
        self.contains(Self::SUPPLY_ALL_ARGUMENTS)
    }

    pub fn supplies_body(self) -> bool {
        self.contains(Self::SUPPLY_BODY)
    }

    pub fn immediate_update_disabled(self) -> bool {
        self.contains(Self::DISABLE_IMMEDIATE_UPDATE)
    }
}
