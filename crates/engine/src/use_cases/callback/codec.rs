//! Callback token codec.
//!
//! Turns a [`CallbackDescriptor`] into a token that is safe to hand to an
//! untrusted client, and back. Tokens are compact JSON sealed with the
//! process-wide key and rendered as unpadded URL-safe base64, so they can be
//! appended to a query string without further escaping.

use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use callgate_domain::{
    classify_arguments, ArgumentEncodingError, CallbackDescriptor, CallbackFlags, CallbackOptions,
    DescriptorError, InvalidTargetError, InvalidTokenError, LiteralValue, SourceArg,
    CLIENT_ARG_PARAM, TOKEN_PARAM,
};

use crate::infrastructure::ports::{CipherError, OperationResolver, TokenCipherPort};

/// Serialized form of a descriptor inside the sealed token.
///
/// Field names are kept to one or two letters to keep URLs short.
#[derive(Debug, Serialize, Deserialize)]
struct WireDescriptor {
    /// Qualified target name
    m: String,
    /// Flag bits
    f: u8,
    /// Mime type override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    /// `[position, value]` literal pairs
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    a: Vec<(usize, LiteralValue)>,
    /// Client-evaluated positions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    p: Vec<usize>,
}

impl From<&CallbackDescriptor> for WireDescriptor {
    fn from(d: &CallbackDescriptor) -> Self {
        Self {
            m: d.target_name().to_string(),
            f: d.flags().bits(),
            mt: d.mime_type().map(str::to_string),
            id: d.id().map(str::to_string),
            a: d.literal_args().to_vec(),
            p: d.client_positions().to_vec(),
        }
    }
}

impl TryFrom<WireDescriptor> for CallbackDescriptor {
    type Error = DescriptorError;

    fn try_from(w: WireDescriptor) -> Result<Self, Self::Error> {
        CallbackDescriptor::new(w.m)
            .with_flags(CallbackFlags::from_wire(w.f))
            .with_mime_type(w.mt)
            .with_id(w.id)
            .with_arguments(w.a, w.p)
    }
}

/// Errors that make an offer impossible.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error(transparent)]
    InvalidTarget(#[from] InvalidTargetError),

    #[error("Invalid callback arguments: {0}")]
    Descriptor(#[from] DescriptorError),

    #[error("Failed to serialize callback descriptor: {0}")]
    Serialization(String),

    #[error(transparent)]
    Cipher(#[from] CipherError),
}

/// Everything a page needs to call back into an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackOffer {
    /// Dispatch URL including the token parameter.
    pub url: String,
    /// Dispatch path without query.
    pub path: String,
    /// The sealed token alone.
    pub token: String,
    /// `m=<token>`, for callers that send the token in a form body.
    pub token_param: String,
    /// Script fragment appending one `&p=` per client-evaluated argument,
    /// in position order. Empty when there are none.
    pub parameter_code: String,
    /// Arguments that were dropped while encoding.
    pub diagnostics: Vec<ArgumentEncodingError>,
}

impl CallbackOffer {
    /// Script expression POSTing the callback through `function`.
    ///
    /// Produces `function('<path>','m=<token>'+'&p='+...)`, so client values
    /// travel in a form body instead of the URL.
    pub fn script_call(&self, function: &str) -> String {
        format!(
            "{function}('{}','{}'{})",
            escape_js(&self.path),
            self.token_param,
            self.parameter_code
        )
    }
}

fn escape_js(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Encodes and decodes callback tokens under the process-wide key.
pub struct CallbackCodec {
    cipher: Arc<dyn TokenCipherPort>,
    resolver: Arc<dyn OperationResolver>,
    callback_path: String,
}

impl CallbackCodec {
    pub fn new(
        cipher: Arc<dyn TokenCipherPort>,
        resolver: Arc<dyn OperationResolver>,
        callback_path: impl Into<String>,
    ) -> Self {
        Self {
            cipher,
            resolver,
            callback_path: callback_path.into(),
        }
    }

    /// Seal a descriptor into a token.
    ///
    /// The target must resolve to a registered operation.
    pub fn encode(&self, descriptor: &CallbackDescriptor) -> Result<String, EncodeError> {
        if self.resolver.resolve(descriptor.target_name()).is_none() {
            return Err(InvalidTargetError::new(descriptor.target_name()).into());
        }

        let json = serde_json::to_vec(&WireDescriptor::from(descriptor))
            .map_err(|e| EncodeError::Serialization(e.to_string()))?;
        let sealed = self.cipher.seal(&json)?;
        Ok(URL_SAFE_NO_PAD.encode(sealed))
    }

    /// Open a token back into its descriptor.
    ///
    /// Fails closed: any alteration, foreign key, or structural problem is
    /// reported as the same [`InvalidTokenError`]. Target resolvability is
    /// not checked here.
    pub fn decode(&self, token: &str) -> Result<CallbackDescriptor, InvalidTokenError> {
        let sealed = URL_SAFE_NO_PAD.decode(token.trim()).map_err(|e| {
            tracing::debug!(error = %e, "Rejected callback token: not base64");
            InvalidTokenError
        })?;

        let json = self.cipher.open(&sealed).map_err(|e| {
            tracing::debug!(error = %e, "Rejected callback token: cannot open");
            InvalidTokenError
        })?;

        let wire: WireDescriptor = serde_json::from_slice(&json).map_err(|e| {
            tracing::debug!(error = %e, "Rejected callback token: malformed payload");
            InvalidTokenError
        })?;

        CallbackDescriptor::try_from(wire).map_err(|e| {
            tracing::debug!(error = %e, "Rejected callback token: invalid positions");
            InvalidTokenError
        })
    }

    /// Offer a callback: classify arguments, encode, and build the URL.
    ///
    /// Malformed arguments are dropped and reported in
    /// [`CallbackOffer::diagnostics`]; an unknown target fails the offer.
    pub fn offer(
        &self,
        target_name: &str,
        args: &[SourceArg],
        options: &CallbackOptions,
    ) -> Result<CallbackOffer, EncodeError> {
        let classified = classify_arguments(args);
        for rejected in &classified.rejected {
            tracing::warn!(
                target_name = %target_name,
                position = rejected.position(),
                error = %rejected,
                "Dropped callback argument"
            );
        }

        let descriptor = CallbackDescriptor::from_offer(target_name, options, &classified)?;
        let token = self.encode(&descriptor)?;

        let parameter_code = classified
            .client_expressions
            .iter()
            .map(|expr| format!("+'&{CLIENT_ARG_PARAM}='+encodeURIComponent({expr})"))
            .collect::<String>();
        let token_param = format!("{TOKEN_PARAM}={token}");

        Ok(CallbackOffer {
            url: format!("{}?{}", self.callback_path, token_param),
            path: self.callback_path.clone(),
            token,
            token_param,
            parameter_code,
            diagnostics: classified.rejected,
        })
    }

    /// URL for a raw callback: the operation receives the request body and
    /// every request parameter, and its return value is the response.
    pub fn callback_url(&self, target_name: &str, id: Option<&str>) -> Result<String, EncodeError> {
        let options = CallbackOptions {
            id: id.map(str::to_string),
            return_value: true,
            supply_body: true,
            supply_all_arguments: true,
            ..Default::default()
        };
        Ok(self.offer(target_name, &[], &options)?.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::cipher::{SecretKey, XChaChaTokenCipher};
    use crate::infrastructure::operations::OperationRegistry;
    use crate::infrastructure::ports::{MockOperationResolver, MockTokenCipherPort};
    use callgate_domain::{CallValue, MAX_ARGUMENTS};
    use serde_json::Value;

    const TARGET: &str = "scopes.orders.submit";

    fn registry() -> Arc<OperationRegistry> {
        let registry = OperationRegistry::new();
        registry.register_fn(TARGET, |_args: Vec<Value>| async { Ok(CallValue::none()) });
        Arc::new(registry)
    }

    fn codec_with_key(key: [u8; 32]) -> CallbackCodec {
        CallbackCodec::new(
            Arc::new(XChaChaTokenCipher::new(&SecretKey::from_bytes(key))),
            registry(),
            "/callback",
        )
    }

    fn codec() -> CallbackCodec {
        codec_with_key([42u8; 32])
    }

    fn full_descriptor() -> CallbackDescriptor {
        CallbackDescriptor::new(TARGET)
            .with_flags(CallbackFlags::RETURN_VALUE | CallbackFlags::SUPPLY_BODY)
            .with_mime_type(Some("text/csv".to_string()))
            .with_id(Some("grid".to_string()))
            .with_arguments(
                vec![
                    (0, LiteralValue::from("a")),
                    (2, LiteralValue::from(7i64)),
                    (3, LiteralValue::from(true)),
                ],
                vec![1, 4],
            )
            .expect("valid descriptor")
    }

    #[test]
    fn test_round_trip_preserves_descriptor() {
        let codec = codec();
        for descriptor in [CallbackDescriptor::new(TARGET), full_descriptor()] {
            let token = codec.encode(&descriptor).expect("encode");
            assert_eq!(codec.decode(&token), Ok(descriptor));
        }
    }

    #[test]
    fn test_decoding_twice_yields_equal_independent_descriptors() {
        let codec = codec();
        let token = codec.encode(&full_descriptor()).expect("encode");

        let first = codec.decode(&token).expect("decode");
        let second = codec.decode(&token).expect("decode");
        assert_eq!(first, second);

        let changed = first.with_id(Some("other".to_string()));
        assert_eq!(second.id(), Some("grid"));
        assert_ne!(changed, second);
    }

    #[test]
    fn test_token_does_not_reveal_target() {
        let token = codec().encode(&full_descriptor()).expect("encode");
        assert!(!token.contains("orders"));
        let raw = URL_SAFE_NO_PAD.decode(&token).expect("base64");
        assert!(!String::from_utf8_lossy(&raw).contains("orders"));
    }

    #[test]
    fn test_flipping_any_token_byte_is_rejected() {
        let codec = codec();
        let token = codec.encode(&full_descriptor()).expect("encode");

        for i in 0..token.len() {
            let mut bytes = token.clone().into_bytes();
            bytes[i] ^= 0x01;
            let tampered = String::from_utf8(bytes).expect("ascii stays ascii");
            assert_eq!(codec.decode(&tampered), Err(InvalidTokenError), "char {i}");
        }
    }

    #[test]
    fn test_flipping_any_sealed_byte_is_rejected() {
        let codec = codec();
        let token = codec.encode(&full_descriptor()).expect("encode");
        let sealed = URL_SAFE_NO_PAD.decode(&token).expect("base64");

        for i in 0..sealed.len() {
            let mut tampered = sealed.clone();
            tampered[i] ^= 0x80;
            let tampered = URL_SAFE_NO_PAD.encode(tampered);
            assert_eq!(codec.decode(&tampered), Err(InvalidTokenError), "byte {i}");
        }
    }

    #[test]
    fn test_foreign_key_and_garbage_are_rejected() {
        let token = codec().encode(&full_descriptor()).expect("encode");
        assert_eq!(codec_with_key([1u8; 32]).decode(&token), Err(InvalidTokenError));

        let codec = codec();
        assert_eq!(codec.decode(""), Err(InvalidTokenError));
        assert_eq!(codec.decode("not a token!"), Err(InvalidTokenError));
        assert_eq!(codec.decode("AAAA"), Err(InvalidTokenError));
    }

    #[test]
    fn test_authentic_but_malformed_payload_is_rejected() {
        let cipher = XChaChaTokenCipher::new(&SecretKey::from_bytes([42u8; 32]));
        let codec = codec();

        for payload in [
            br#"{"f":0}"#.as_slice(),
            br#"{"m":"x","f":0,"a":[[1,"a"]],"p":[1]}"#.as_slice(),
            b"not json".as_slice(),
        ] {
            let token = URL_SAFE_NO_PAD.encode(cipher.seal(payload).expect("seal"));
            assert_eq!(codec.decode(&token), Err(InvalidTokenError));
        }
    }

    #[test]
    fn test_decode_does_not_require_target_to_exist() {
        let codec = codec();
        let token = codec.encode(&CallbackDescriptor::new(TARGET)).expect("encode");

        let empty = CallbackCodec::new(
            Arc::new(XChaChaTokenCipher::new(&SecretKey::from_bytes([42u8; 32]))),
            Arc::new(OperationRegistry::new()),
            "/callback",
        );
        assert_eq!(empty.decode(&token).expect("decode").target_name(), TARGET);
    }

    #[test]
    fn test_unknown_target_fails_encode() {
        let mut resolver = MockOperationResolver::new();
        resolver
            .expect_resolve()
            .withf(|name| name == "scopes.nope.run")
            .times(1)
            .returning(|_| None);
        let codec = CallbackCodec::new(
            Arc::new(XChaChaTokenCipher::new(&SecretKey::from_bytes([42u8; 32]))),
            Arc::new(resolver),
            "/callback",
        );

        let err = codec
            .encode(&CallbackDescriptor::new("scopes.nope.run"))
            .expect_err("unknown target");
        assert!(matches!(err, EncodeError::InvalidTarget(ref e) if e.name == "scopes.nope.run"));
    }

    #[test]
    fn test_seal_failure_surfaces_as_cipher_error() {
        let mut cipher = MockTokenCipherPort::new();
        cipher
            .expect_seal()
            .times(1)
            .returning(|_| Err(CipherError::seal("no entropy")));
        let codec = CallbackCodec::new(Arc::new(cipher), registry(), "/callback");

        let err = codec
            .encode(&CallbackDescriptor::new(TARGET))
            .expect_err("seal fails");
        assert!(matches!(err, EncodeError::Cipher(CipherError::Seal(_))));
    }

    #[test]
    fn test_offer_applies_quoting_rule() {
        let codec = codec();
        let offer = codec
            .offer(
                TARGET,
                &[SourceArg::from("\"abc\""), SourceArg::from("x"), SourceArg::Int(5)],
                &CallbackOptions::default(),
            )
            .expect("offer");

        let descriptor = codec.decode(&offer.token).expect("decode");
        assert_eq!(
            descriptor.literal_args(),
            &[(0, LiteralValue::from("abc")), (2, LiteralValue::from(5i64))]
        );
        assert_eq!(descriptor.client_positions(), &[1]);
        assert_eq!(offer.parameter_code, "+'&p='+encodeURIComponent(x)");
        assert_eq!(offer.url, format!("/callback?m={}", offer.token));
        assert_eq!(offer.token_param, format!("m={}", offer.token));
        assert!(offer.diagnostics.is_empty());
    }

    #[test]
    fn test_offer_skips_malformed_arguments_but_still_encodes() {
        let codec = codec();
        let offer = codec
            .offer(
                TARGET,
                &[SourceArg::from("'ok'"), SourceArg::from("'broken"), SourceArg::from("y")],
                &CallbackOptions::default(),
            )
            .expect("offer");

        assert_eq!(offer.diagnostics.len(), 1);
        assert_eq!(offer.diagnostics[0].position(), 1);

        let descriptor = codec.decode(&offer.token).expect("decode");
        assert_eq!(descriptor.literal_args(), &[(0, LiteralValue::from("ok"))]);
        assert_eq!(descriptor.client_positions(), &[2]);
    }

    #[test]
    fn test_offer_for_unknown_target_fails() {
        let result = codec().offer("missing", &[SourceArg::from("'a'")], &CallbackOptions::default());
        assert!(matches!(result, Err(EncodeError::InvalidTarget(_))));
    }

    #[test]
    fn test_out_of_range_positions_fail_offer_and_decode() {
        let codec = codec();
        let mut args = vec![SourceArg::Null; MAX_ARGUMENTS];
        args.push(SourceArg::from("late"));
        let result = codec.offer(TARGET, &args, &CallbackOptions::default());
        assert!(matches!(
            result,
            Err(EncodeError::Descriptor(DescriptorError::PositionOutOfRange { .. }))
        ));

        let cipher = XChaChaTokenCipher::new(&SecretKey::from_bytes([42u8; 32]));
        let payload = format!(r#"{{"m":"{TARGET}","f":0,"a":[[{},"x"]]}}"#, u64::MAX);
        let token = URL_SAFE_NO_PAD.encode(cipher.seal(payload.as_bytes()).expect("seal"));
        assert_eq!(codec.decode(&token), Err(InvalidTokenError));
    }

    #[test]
    fn test_script_call_posts_token_and_client_values() {
        let offer = codec()
            .offer(TARGET, &[SourceArg::from("'a'"), SourceArg::from("grid.value")], &CallbackOptions::default())
            .expect("offer");

        assert_eq!(
            offer.script_call("postCallback"),
            format!(
                "postCallback('/callback','m={}'+'&p='+encodeURIComponent(grid.value))",
                offer.token
            )
        );
    }

    #[test]
    fn test_callback_url_sets_raw_callback_flags() {
        let codec = codec();
        let url = codec.callback_url(TARGET, Some("upload")).expect("url");
        let token = url.strip_prefix("/callback?m=").expect("url shape");

        let descriptor = codec.decode(token).expect("decode");
        assert_eq!(
            descriptor.flags(),
            CallbackFlags::RETURN_VALUE
                | CallbackFlags::SUPPLY_BODY
                | CallbackFlags::SUPPLY_ALL_ARGUMENTS
        );
        assert_eq!(descriptor.id(), Some("upload"));
        assert!(!descriptor.has_arguments());
    }
}
