use std::sync::Arc;

use rst_common::standard::serde_json::{self, json, Value};
use rst_common::with_logging::log::{debug, info};

use rstdev_domain::entity::ToJSON;

use crate::identity::document::did_of;
use crate::identity::types::{KeyStore, KeyType, Resolver};
use crate::message::types::TypedMessage;

use super::jwe::{self, RecipientKey, SenderKey};
use super::jws;
use super::types::{
    DIDCommError, Packing, Transport, TransportAck, TransportError, UnpackMetadata,
    UnpackedMessage, MEDIA_TYPE_PLAIN,
};

const MAX_ENVELOPE_DEPTH: usize = 3;

/// `detect_packing` reads the outermost envelope format from its framing
///
/// Nothing is decrypted or verified here
pub fn detect_packing(packed: &str) -> Result<Packing, DIDCommError> {
    let value: Value = serde_json::from_str(packed)
        .map_err(|err| DIDCommError::MalformedEnvelope(err.to_string()))?;

    let obj = value.as_object().ok_or(DIDCommError::MalformedEnvelope(
        "envelope must be a json object".to_string(),
    ))?;

    if obj.contains_key("payload") && obj.contains_key("signatures") {
        return Ok(Packing::Jws);
    }

    if obj.contains_key("protected") && obj.contains_key("recipients") && obj.contains_key("ciphertext")
    {
        let protected = obj
            .get("protected")
            .and_then(|val| val.as_str())
            .ok_or(DIDCommError::MalformedEnvelope(
                "invalid protected header".to_string(),
            ))?;

        return jwe::parse_header(protected)?.packing();
    }

    let is_typed = obj.get("type").map_or(false, |val| val.is_string())
        && obj.get("id").map_or(false, |val| val.is_string());
    let is_plain = obj.get("typ").and_then(|val| val.as_str()) == Some(MEDIA_TYPE_PLAIN)
        || obj.contains_key("body");

    if is_typed && is_plain {
        return Ok(Packing::None);
    }

    Err(DIDCommError::MalformedEnvelope(
        "unknown envelope framing".to_string(),
    ))
}

/// `DIDComm` packs and unpacks messages and hands packed messages to transports
///
/// Keys are always looked up through the [`Resolver`], private key operations
/// always go through the [`KeyStore`]
pub struct DIDComm {
    resolver: Arc<dyn Resolver>,
    keystore: Arc<dyn KeyStore>,
    transports: Vec<Arc<dyn Transport>>,
}

impl DIDComm {
    pub fn new(resolver: Arc<dyn Resolver>, keystore: Arc<dyn KeyStore>) -> Self {
        Self {
            resolver,
            keystore,
            transports: Vec::new(),
        }
    }

    pub fn add_transport(&mut self, transport: Arc<dyn Transport>) -> &mut Self {
        self.transports.push(transport);
        self
    }

    /// `pack` encodes a message into a single envelope
    ///
    /// `key_ref` selects the sender key, the signing key for `jws` and the key agreement
    /// key for `authcrypt`. When omitted, the first local key listed by the sender
    /// document is used
    pub async fn pack(
        &self,
        message: &TypedMessage,
        packing: Packing,
        key_ref: Option<&str>,
    ) -> Result<String, DIDCommError> {
        debug!("packing message {} with {}", message.id, packing);

        match packing {
            Packing::None => pack_plain(message),
            Packing::Jws => {
                let kid = self.signing_key(message, key_ref).await?;
                let payload = to_json(message)?;
                jws::sign(payload.as_bytes(), &kid, self.keystore.as_ref()).await
            }
            Packing::Authcrypt | Packing::Anoncrypt => {
                let mut plaintext = message.clone();
                if packing == Packing::Anoncrypt {
                    plaintext.from = None;
                }

                let payload = to_json(&plaintext)?;
                self.encrypt(message, payload.as_bytes(), packing, key_ref, None)
                    .await
            }
        }
    }

    /// `pack_nested` packs the message with `inner` and encrypts the produced envelope
    /// with `outer`
    ///
    /// `key_ref` applies to the inner envelope only. An `authcrypt` layer can't wrap
    /// an `anoncrypt` one, the inner plaintext has no `from` to authenticate
    pub async fn pack_nested(
        &self,
        message: &TypedMessage,
        inner: Packing,
        outer: Packing,
        key_ref: Option<&str>,
    ) -> Result<String, DIDCommError> {
        let hides_sender = outer == Packing::Authcrypt && inner == Packing::Anoncrypt;
        if !outer.is_encrypted() || inner == Packing::None || hides_sender {
            return Err(DIDCommError::UnsupportedPacking(format!(
                "{}+{}",
                outer, inner
            )));
        }

        let inner_packed = self.pack(message, inner, key_ref).await?;
        self.encrypt(
            message,
            inner_packed.as_bytes(),
            outer,
            None,
            Some(inner.media_type()),
        )
        .await
    }

    /// `unpack` unwraps every envelope layer down to the plaintext message
    ///
    /// A signer or an authenticated sender must belong to the identifier named
    /// by the message `from`. A message only protected by `anoncrypt` never
    /// carries a `from`
    pub async fn unpack(&self, packed: &str) -> Result<UnpackedMessage, DIDCommError> {
        let mut current = packed.to_string();
        let mut envelopes: Vec<Packing> = Vec::new();
        let mut signer: Option<String> = None;
        let mut sender_kid: Option<String> = None;
        let mut recipient_kid: Option<String> = None;

        loop {
            if envelopes.len() > MAX_ENVELOPE_DEPTH {
                return Err(DIDCommError::MalformedEnvelope(
                    "too many nested envelopes".to_string(),
                ));
            }

            let packing = detect_packing(&current)?;
            envelopes.push(packing);

            match packing {
                Packing::None => break,
                Packing::Jws => {
                    let verified = jws::verify(&current, self.resolver.as_ref()).await?;
                    signer.get_or_insert(verified.signer);
                    current = utf8(verified.payload)?;
                }
                Packing::Authcrypt | Packing::Anoncrypt => {
                    let decrypted =
                        jwe::decrypt(&current, self.keystore.as_ref(), self.resolver.as_ref())
                            .await?;

                    recipient_kid.get_or_insert(decrypted.recipient_kid);
                    if let Some(kid) = decrypted.sender_kid {
                        sender_kid.get_or_insert(kid);
                    }

                    current = utf8(decrypted.plaintext)?;
                }
            }
        }

        let mut message: TypedMessage = serde_json::from_str(&current)
            .map_err(|err| DIDCommError::MalformedEnvelope(err.to_string()))?;

        if let Some(kid) = &signer {
            if !is_owned_by(kid, message.from.as_deref()) {
                return Err(DIDCommError::SignatureVerification(format!(
                    "signer {} doesn't match the message sender",
                    kid
                )));
            }
        }

        if let Some(kid) = &sender_kid {
            if !is_owned_by(kid, message.from.as_deref()) {
                return Err(DIDCommError::Decryption(format!(
                    "sender {} doesn't match the message sender",
                    kid
                )));
            }
        }

        let authenticated = signer.is_some() || sender_kid.is_some();
        if !authenticated && envelopes.contains(&Packing::Anoncrypt) {
            message.from = None;
        }

        let outermost = envelopes.first().copied().unwrap_or(Packing::None);
        Ok(UnpackedMessage {
            message,
            metadata: UnpackMetadata {
                packing: outermost,
                envelopes,
                authenticated,
                signer,
                sender_kid,
                recipient_kid,
            },
        })
    }

    pub fn media_type(&self, packed: &str) -> Result<String, DIDCommError> {
        let packing = detect_packing(packed)?;
        Ok(packing.media_type().to_string())
    }

    /// `send` delivers a packed message to the messaging service of the recipient
    ///
    /// The first transport accepting the endpoint is used, a failed delivery is never retried
    pub async fn send(
        &self,
        packed: &str,
        recipient: &str,
        message_id: Option<&str>,
    ) -> Result<TransportAck, DIDCommError> {
        let doc = self.resolver.resolve(did_of(recipient)).await?;
        let endpoint = doc
            .messaging_endpoint()
            .ok_or(TransportError::EndpointUnavailable(format!(
                "{} has no messaging service",
                doc.id
            )))?;

        let transport = self
            .transports
            .iter()
            .find(|transport| transport.is_match(&endpoint))
            .ok_or(TransportError::NoTransport(endpoint.clone()))?;

        let mut ack = transport.send(packed, &endpoint).await?;
        ack.message_id = message_id.map(|id| id.to_string());

        info!(
            "message {:?} sent to {} through {}",
            ack.message_id, endpoint, ack.transport
        );

        Ok(ack)
    }

    async fn encrypt(
        &self,
        message: &TypedMessage,
        payload: &[u8],
        packing: Packing,
        key_ref: Option<&str>,
        cty: Option<&str>,
    ) -> Result<String, DIDCommError> {
        let to = message.to.as_deref().ok_or(DIDCommError::KeyNotFound(
            "message without recipient".to_string(),
        ))?;

        let recipients = self.recipient_keys(to).await?;
        let sender = match packing {
            Packing::Authcrypt => Some(self.sender_key(message, key_ref).await?),
            _ => None,
        };

        jwe::encrypt(
            payload,
            &recipients,
            sender.as_ref(),
            cty,
            self.keystore.as_ref(),
        )
        .await
    }

    async fn signing_key(
        &self,
        message: &TypedMessage,
        key_ref: Option<&str>,
    ) -> Result<String, DIDCommError> {
        let from = sender_did(message)?;
        if let Some(kid) = key_ref {
            return owned_kid(kid, from);
        }

        let doc = self.resolver.resolve(from).await?;
        let local_refs = self.keystore.available_key_refs().await;
        doc.authentication_methods()
            .into_iter()
            .find(|method| local_refs.contains(&method.id))
            .map(|method| method.id.to_owned())
            .ok_or(DIDCommError::KeyNotFound(format!(
                "no local signing key for {}",
                from
            )))
    }

    async fn sender_key(
        &self,
        message: &TypedMessage,
        key_ref: Option<&str>,
    ) -> Result<SenderKey, DIDCommError> {
        let from = sender_did(message)?;
        let kid = match key_ref {
            Some(kid) => owned_kid(kid, from)?,
            None => {
                let doc = self.resolver.resolve(from).await?;
                let local_refs = self.keystore.available_key_refs().await;
                doc.key_agreement_methods()
                    .into_iter()
                    .find(|method| local_refs.contains(&method.id))
                    .map(|method| method.id.to_owned())
                    .ok_or(DIDCommError::KeyNotFound(format!(
                        "no local key agreement key for {}",
                        from
                    )))?
            }
        };

        let info = self.keystore.public_key(&kid).await?;
        if info.key_type != KeyType::X25519 {
            return Err(DIDCommError::UnsupportedAlgorithm(format!(
                "{} is not an X25519 key",
                kid
            )));
        }

        let public: [u8; 32] = info
            .public_key
            .try_into()
            .map_err(|_| DIDCommError::KeyNotFound(format!("invalid public key: {}", kid)))?;

        Ok(SenderKey { kid, public })
    }

    async fn recipient_keys(&self, to: &str) -> Result<Vec<RecipientKey>, DIDCommError> {
        let doc = self.resolver.resolve(did_of(to)).await?;
        let recipients: Vec<RecipientKey> = doc
            .key_agreement_methods()
            .into_iter()
            .filter(|method| method.public_key_jwk.key_type() == Ok(KeyType::X25519))
            .filter_map(|method| {
                method
                    .public_key_jwk
                    .public_bytes()
                    .ok()
                    .map(|public| RecipientKey {
                        kid: method.id.to_owned(),
                        public,
                    })
            })
            .collect();

        if recipients.is_empty() {
            return Err(DIDCommError::KeyNotFound(format!(
                "no key agreement key for {}",
                doc.id
            )));
        }

        Ok(recipients)
    }
}

fn pack_plain(message: &TypedMessage) -> Result<String, DIDCommError> {
    let mut value =
        serde_json::to_value(message).map_err(|err| DIDCommError::JSONError(err.to_string()))?;

    if let Some(obj) = value.as_object_mut() {
        obj.insert("typ".to_string(), json!(MEDIA_TYPE_PLAIN));
    }

    serde_json::to_string(&value).map_err(|err| DIDCommError::JSONError(err.to_string()))
}

fn to_json(message: &TypedMessage) -> Result<String, DIDCommError> {
    message
        .to_json()
        .map_err(|err| DIDCommError::JSONError(err.to_string()))
}

fn utf8(bytes: Vec<u8>) -> Result<String, DIDCommError> {
    String::from_utf8(bytes).map_err(|err| DIDCommError::MalformedEnvelope(err.to_string()))
}

fn sender_did(message: &TypedMessage) -> Result<&str, DIDCommError> {
    message
        .from
        .as_deref()
        .map(did_of)
        .ok_or(DIDCommError::KeyNotFound(
            "message without sender".to_string(),
        ))
}

fn owned_kid(kid: &str, did: &str) -> Result<String, DIDCommError> {
    if did_of(kid) != did {
        return Err(DIDCommError::KeyNotFound(format!(
            "{} doesn't belong to {}",
            kid, did
        )));
    }

    Ok(kid.to_string())
}

fn is_owned_by(kid: &str, from: Option<&str>) -> bool {
    from.map_or(false, |from| did_of(from) == did_of(kid))
}

#[cfg(test)]
mod tests {
    use super::*;

    use rst_common::with_tokio::tokio;

    use table_test::table_test;

    use crate::didcomm::jwe::{parse_header, Jwe};
    use crate::didcomm::transport::LoopbackTransport;
    use crate::didcomm::types::MEDIA_TYPE_ENCRYPTED;
    use crate::identity::{IdentifierManager, LocalKeyStore, MemoryResolver};

    struct Parties {
        alice: DIDComm,
        bob: DIDComm,
        eve: DIDComm,
    }

    async fn engine(did: &str, resolver: Arc<MemoryResolver>) -> DIDComm {
        let keystore = Arc::new(LocalKeyStore::new());
        let manager = IdentifierManager::new(keystore.clone(), resolver.clone());
        let endpoint = format!("local://{}", did.rsplit(':').next().unwrap_or_default());
        let _ = manager.create(did, Some(endpoint)).await.unwrap();
        DIDComm::new(resolver, keystore)
    }

    async fn parties() -> Parties {
        let resolver = Arc::new(MemoryResolver::new());
        Parties {
            alice: engine("did:example:alice", resolver.clone()).await,
            bob: engine("did:example:bob", resolver.clone()).await,
            eve: engine("did:example:eve", resolver).await,
        }
    }

    fn message() -> TypedMessage {
        let mut message = TypedMessage::new(
            "https://didcomm.org/basicmessage/2.0/message",
            json!({ "content": "hello bob" }),
        );

        message
            .set_id("m1")
            .set_from("did:example:alice")
            .set_to("did:example:bob")
            .set_thid("t1");
        message
    }

    mod expect_success {
        use super::*;

        #[tokio::test]
        async fn test_roundtrip_every_packing() {
            let parties = parties().await;
            let table = vec![
                (Packing::None, Some("did:example:alice".to_string())),
                (Packing::Jws, Some("did:example:alice".to_string())),
                (Packing::Authcrypt, Some("did:example:alice".to_string())),
                (Packing::Anoncrypt, None),
            ];

            for (validator, input, expected) in table_test!(table) {
                let packed = parties.alice.pack(&message(), input, None).await.unwrap();
                let unpacked = parties.bob.unpack(&packed).await.unwrap();

                let original = message();
                assert_eq!(unpacked.message.typ, original.typ);
                assert_eq!(unpacked.message.body, original.body);
                assert_eq!(unpacked.message.to, original.to);
                assert_eq!(unpacked.message.id, original.id);
                assert_eq!(unpacked.message.thid, original.thid);
                assert_eq!(unpacked.metadata.packing, input);

                validator
                    .given(&input.to_string())
                    .when("pack and unpack")
                    .then("it should keep the sender only when it can be trusted")
                    .assert_eq(expected, unpacked.message.from);
            }
        }

        #[tokio::test]
        async fn test_unpack_metadata() {
            let parties = parties().await;

            let signed = parties.alice.pack(&message(), Packing::Jws, None).await.unwrap();
            let unpacked = parties.bob.unpack(&signed).await.unwrap();
            assert!(unpacked.metadata.authenticated);
            assert_eq!(
                unpacked.metadata.signer,
                Some("did:example:alice#key-1".to_string())
            );

            let encrypted = parties
                .alice
                .pack(&message(), Packing::Authcrypt, None)
                .await
                .unwrap();
            let unpacked = parties.bob.unpack(&encrypted).await.unwrap();
            assert!(unpacked.metadata.authenticated);
            assert_eq!(
                unpacked.metadata.sender_kid,
                Some("did:example:alice#key-x25519-1".to_string())
            );
            assert_eq!(
                unpacked.metadata.recipient_kid,
                Some("did:example:bob#key-x25519-1".to_string())
            );
        }

        #[tokio::test]
        async fn test_anoncrypt_hides_sender() {
            let parties = parties().await;
            let packed = parties
                .alice
                .pack(&message(), Packing::Anoncrypt, None)
                .await
                .unwrap();

            assert!(!packed.contains("did:example:alice"));
            let jwe: Jwe = serde_json::from_str(&packed).unwrap();
            assert!(parse_header(&jwe.protected).unwrap().skid.is_none());

            let unpacked = parties.bob.unpack(&packed).await.unwrap();
            assert!(!unpacked.metadata.authenticated);
            assert!(unpacked.message.from.is_none());
        }

        #[tokio::test]
        async fn test_nested_signed_then_anoncrypt() {
            let parties = parties().await;
            let packed = parties
                .alice
                .pack_nested(&message(), Packing::Jws, Packing::Anoncrypt, None)
                .await
                .unwrap();

            let unpacked = parties.bob.unpack(&packed).await.unwrap();
            assert_eq!(
                unpacked.metadata.envelopes,
                vec![Packing::Anoncrypt, Packing::Jws, Packing::None]
            );
            assert!(unpacked.metadata.authenticated);
            assert_eq!(unpacked.message.from, Some("did:example:alice".to_string()));
        }

        #[tokio::test]
        async fn test_media_type() {
            let parties = parties().await;
            let table = vec![
                (Packing::None, MEDIA_TYPE_PLAIN),
                (Packing::Jws, "application/didcomm-signed+json"),
                (Packing::Authcrypt, MEDIA_TYPE_ENCRYPTED),
                (Packing::Anoncrypt, MEDIA_TYPE_ENCRYPTED),
            ];

            for (validator, input, expected) in table_test!(table) {
                let packed = parties.alice.pack(&message(), input, None).await.unwrap();
                let actual = parties.alice.media_type(&packed).unwrap();

                validator
                    .given(&input.to_string())
                    .when("detect media type")
                    .then(&format!("it should be {}", expected))
                    .assert_eq(expected.to_string(), actual);
            }
        }

        #[tokio::test]
        async fn test_send_through_loopback() {
            let resolver = Arc::new(MemoryResolver::new());
            let _bob = engine("did:example:bob", resolver.clone()).await;
            let mut alice = engine("did:example:alice", resolver).await;

            let transport = Arc::new(LoopbackTransport::new());
            let mut inbox = transport.register("local://bob").await;
            alice.add_transport(transport);

            let ack = alice
                .send("packed", "did:example:bob#key-1", Some("m1"))
                .await;
            assert!(!ack.is_err());
            assert_eq!(ack.unwrap().message_id, Some("m1".to_string()));
            assert_eq!(inbox.recv().await, Some("packed".to_string()));
        }
    }

    mod expect_error {
        use super::*;

        #[tokio::test]
        async fn test_anoncrypt_unreadable_by_others() {
            let parties = parties().await;
            let packed = parties
                .alice
                .pack(&message(), Packing::Anoncrypt, None)
                .await
                .unwrap();

            let unpacked = parties.eve.unpack(&packed).await;
            assert!(matches!(unpacked, Err(DIDCommError::Decryption(_))))
        }

        #[tokio::test]
        async fn test_signer_must_match_sender() {
            let parties = parties().await;

            let payload = to_json(&message()).unwrap();
            let forged = jws::sign(
                payload.as_bytes(),
                "did:example:eve#key-1",
                parties.eve.keystore.as_ref(),
            )
            .await
            .unwrap();

            let unpacked = parties.bob.unpack(&forged).await;
            assert!(matches!(
                unpacked,
                Err(DIDCommError::SignatureVerification(_))
            ));

            let foreign = parties
                .eve
                .pack(&message(), Packing::Jws, Some("did:example:eve#key-1"))
                .await;
            assert!(matches!(foreign, Err(DIDCommError::KeyNotFound(_))))
        }

        #[tokio::test]
        async fn test_pack_without_local_keys() {
            let parties = parties().await;
            let output = parties.eve.pack(&message(), Packing::Jws, None).await;
            assert!(matches!(output, Err(DIDCommError::KeyNotFound(_))));

            let output = parties.eve.pack(&message(), Packing::Authcrypt, None).await;
            assert!(matches!(output, Err(DIDCommError::KeyNotFound(_))))
        }

        #[tokio::test]
        async fn test_pack_unresolvable_recipient() {
            let parties = parties().await;
            let mut unknown = message();
            unknown.set_to("did:example:nobody");

            let output = parties.alice.pack(&unknown, Packing::Anoncrypt, None).await;
            assert!(matches!(output, Err(DIDCommError::Resolution(_))))
        }

        #[tokio::test]
        async fn test_unsupported_nesting() {
            let parties = parties().await;
            let output = parties
                .alice
                .pack_nested(&message(), Packing::Jws, Packing::Jws, None)
                .await;
            assert!(matches!(output, Err(DIDCommError::UnsupportedPacking(_))))
        }

        #[tokio::test]
        async fn test_authcrypt_over_anoncrypt_rejected() {
            let parties = parties().await;
            let output = parties
                .alice
                .pack_nested(&message(), Packing::Anoncrypt, Packing::Authcrypt, None)
                .await;
            assert!(matches!(output, Err(DIDCommError::UnsupportedPacking(_))))
        }

        #[tokio::test]
        async fn test_malformed() {
            let parties = parties().await;
            let table = vec![
                "not json",
                "[]",
                r#"{"hello":"world"}"#,
                r#"{"protected":"!!","recipients":[],"ciphertext":""}"#,
            ];

            for raw in table {
                let output = parties.bob.unpack(raw).await;
                assert!(matches!(output, Err(DIDCommError::MalformedEnvelope(_))))
            }
        }

        #[tokio::test]
        async fn test_send_without_transport() {
            let parties = parties().await;
            let output = parties.alice.send("packed", "did:example:bob", None).await;
            assert!(matches!(
                output,
                Err(DIDCommError::Transport(TransportError::NoTransport(_)))
            ))
        }
    }
}
