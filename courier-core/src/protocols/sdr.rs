use std::sync::Arc;

use rst_common::standard::async_trait::async_trait;
use rst_common::standard::serde::{self, Deserialize, Serialize};
use rst_common::standard::serde_json::{self, json, Value};
use rst_common::with_logging::log::{debug, info, warn};

use crate::agent::helpers::{output, params};
use crate::agent::{AgentError, Capability, Context, MethodSpec, Plugin, PluginError};
use crate::agent::{
    METHOD_DATA_STORE_QUERY, METHOD_DATA_STORE_SAVE, METHOD_SEND_SELECTIVE_DISCLOSURE_REQUEST,
};
use crate::didcomm::types::Packing;
use crate::didcomm::{META_DIDCOMM, META_DIDCOMM_SENDER};
use crate::identity::did_of;
use crate::message::types::{Message, MessageError, MessageHandler, Outcome, TypedMessage};
use crate::store::types::{Filter, Record, RecordKind};

use super::exchange::ExchangeStore;
use super::outbound::dispatch;
use super::types::{
    META_DATA_STORE_SAVE_FAILED, META_SDR_RESPONSE_FAILED, META_SDR_RESPONSE_RECEIVED,
    META_SDR_RESPONSE_REJECTED, META_SDR_RESPONSE_SENT, PROTOCOL_SELECTIVE_DISCLOSURE,
    SDR_REQUEST_TYPE, SDR_RESPONSE_TYPE,
};

/// `ClaimRequest` is a single requested claim predicate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub struct ClaimRequest {
    #[serde(rename = "claimType")]
    pub claim_type: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub reason: Option<String>,

    #[serde(default)]
    pub essential: bool,
}

impl ClaimRequest {
    pub fn new(claim_type: &str) -> Self {
        Self {
            claim_type: claim_type.to_string(),
            reason: None,
            essential: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub struct RequestBody {
    pub claims: Vec<ClaimRequest>,

    /// The identifier the claims are about. Holders only answer about themselves
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub subject: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
#[serde(rename_all = "lowercase")]
pub enum ClaimStatus {
    Present,
    Absent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub struct ClaimResponse {
    #[serde(rename = "claimType")]
    pub claim_type: String,

    pub status: ClaimStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub value: Option<Value>,
}

impl ClaimResponse {
    pub fn present(claim_type: &str, value: Value) -> Self {
        Self {
            claim_type: claim_type.to_string(),
            status: ClaimStatus::Present,
            value: Some(value),
        }
    }

    pub fn absent(claim_type: &str) -> Self {
        Self {
            claim_type: claim_type.to_string(),
            status: ClaimStatus::Absent,
            value: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(crate = "self::serde")]
pub struct ResponseBody {
    pub claims: Vec<ClaimResponse>,
}

fn metadata_value(message: &Message, kind: &str) -> Option<String> {
    message
        .metadata()
        .iter()
        .find(|meta| meta.kind == kind)
        .and_then(|meta| meta.value.clone())
}

/// `reconcile` extracts exactly the requested claims from a response
///
/// The output keeps the order of the request. A requested claim missing from
/// the response, or present without a value, is marked absent. Unrequested
/// claims are dropped
pub fn reconcile(request: &RequestBody, response: &ResponseBody) -> Vec<ClaimResponse> {
    request
        .claims
        .iter()
        .map(|requested| {
            response
                .claims
                .iter()
                .find(|claim| {
                    claim.claim_type == requested.claim_type
                        && claim.status == ClaimStatus::Present
                        && claim.value.is_some()
                })
                .cloned()
                .unwrap_or_else(|| ClaimResponse::absent(&requested.claim_type))
        })
        .collect()
}

/// `SelectiveDisclosureHandler` plays both sides of the selective disclosure protocol
///
/// As a holder it answers requests from the claims found in the data store, as a
/// requester it correlates responses with the exchanges opened by
/// `sendSelectiveDisclosureRequest`
pub struct SelectiveDisclosureHandler {
    exchanges: Arc<ExchangeStore>,
}

impl SelectiveDisclosureHandler {
    pub fn new(exchanges: Arc<ExchangeStore>) -> Self {
        Self { exchanges }
    }

    async fn lookup(
        &self,
        subject: &str,
        claim: &ClaimRequest,
        ctx: &Context,
    ) -> Result<ClaimResponse, AgentError> {
        if !ctx.agent().has_method(METHOD_DATA_STORE_QUERY) {
            return Ok(ClaimResponse::absent(&claim.claim_type));
        }

        let filter = Filter::new()
            .kind(RecordKind::Claim)
            .subject(subject)
            .tag(&claim.claim_type);

        let records: Vec<Record> = ctx
            .agent()
            .execute_as(METHOD_DATA_STORE_QUERY, json!(filter), None)
            .await?;

        let response = records
            .into_iter()
            .next()
            .map(|record| ClaimResponse::present(&claim.claim_type, record.data))
            .unwrap_or_else(|| ClaimResponse::absent(&claim.claim_type));

        Ok(response)
    }

    async fn respond(
        &self,
        request: &TypedMessage,
        body: &RequestBody,
        packing: Packing,
        ctx: &Context,
    ) -> Result<Value, MessageError> {
        let holder = match (&request.from, &request.to) {
            (Some(_), Some(to)) => did_of(to).to_string(),
            _ => {
                return Err(MessageError::InvalidMessage(
                    "request without sender or recipient".to_string(),
                ))
            }
        };

        // claims about anyone other than the holder are never disclosed
        let foreign = body
            .subject
            .as_deref()
            .map(|subject| did_of(subject) != holder)
            .unwrap_or(false);

        let mut claims = Vec::new();
        for claim in body.claims.iter() {
            if foreign {
                claims.push(ClaimResponse::absent(&claim.claim_type));
                continue;
            }

            claims.push(self.lookup(&holder, claim, ctx).await?);
        }

        if foreign {
            debug!("request {} asks for claims about another subject", request.id);
        }

        let response_body = serde_json::to_value(ResponseBody { claims })
            .map_err(|err| MessageError::JSONError(err.to_string()))?;

        let response = request.reply(SDR_RESPONSE_TYPE, response_body);
        let ack = dispatch(ctx, &response, packing).await?;
        Ok(ack)
    }

    async fn handle_request(
        &self,
        message: Message,
        typed: TypedMessage,
        ctx: &Context,
    ) -> Result<Outcome, MessageError> {
        let body: RequestBody = serde_json::from_value(typed.body.clone())
            .map_err(|err| MessageError::InvalidMessage(err.to_string()))?;

        let packing = metadata_value(&message, META_DIDCOMM)
            .and_then(|value| value.parse::<Packing>().ok())
            .unwrap_or(Packing::None);

        let classified = message.classify(typed.clone());
        let classified = match self.respond(&typed, &body, packing, ctx).await {
            Ok(ack) => classified.add_metadata(META_SDR_RESPONSE_SENT, Some(ack.to_string())),
            Err(err) => {
                warn!("unable to answer disclosure request {}: {}", typed.id, err);
                classified.add_metadata(META_SDR_RESPONSE_FAILED, Some(err.to_string()))
            }
        };

        Ok(Outcome::Handled(classified))
    }

    async fn handle_response(
        &self,
        message: Message,
        typed: TypedMessage,
        ctx: &Context,
    ) -> Result<Outcome, MessageError> {
        let body: ResponseBody = serde_json::from_value(typed.body.clone())
            .map_err(|err| MessageError::InvalidMessage(err.to_string()))?;

        let thid = typed.thid.clone().ok_or(MessageError::InvalidMessage(
            "disclosure response without thid".to_string(),
        ))?;

        let sender_kid = metadata_value(&message, META_DIDCOMM_SENDER);
        let classified = message.classify(typed.clone());
        let exchange = match self
            .exchanges
            .correlate(&thid, typed.from.as_deref(), sender_kid.as_deref())
            .await
        {
            Ok(exchange) => exchange,
            Err(err) => {
                debug!("disclosure response not correlated: {}", err);
                return Ok(Outcome::Handled(
                    classified.add_metadata(META_SDR_RESPONSE_REJECTED, Some(err.to_string())),
                ));
            }
        };

        let request: RequestBody = serde_json::from_value(exchange.request)
            .map_err(|err| MessageError::JSONError(err.to_string()))?;

        let claims = reconcile(&request, &body);
        let claims_json =
            serde_json::to_value(&claims).map_err(|err| MessageError::JSONError(err.to_string()))?;

        info!("disclosure {} received with {} claims", thid, claims.len());

        let classified =
            classified.add_metadata(META_SDR_RESPONSE_RECEIVED, Some(claims_json.to_string()));

        match self.persist(&thid, &typed, claims_json, ctx).await {
            Ok(_) => Ok(Outcome::Handled(classified)),
            Err(err) => {
                warn!("unable to save disclosure {}: {}", thid, err);
                Ok(Outcome::Handled(
                    classified.add_metadata(META_DATA_STORE_SAVE_FAILED, Some(err.to_string())),
                ))
            }
        }
    }

    async fn persist(
        &self,
        thid: &str,
        typed: &TypedMessage,
        claims: Value,
        ctx: &Context,
    ) -> Result<(), AgentError> {
        if !ctx.agent().has_method(METHOD_DATA_STORE_SAVE) {
            return Ok(());
        }

        let mut record = Record::new(
            RecordKind::Disclosure,
            json!({ "thid": thid, "claims": claims }),
        );
        record.set_tag(thid);
        if let Some(from) = &typed.from {
            record.set_subject(did_of(from));
        }

        let _ = ctx
            .agent()
            .execute(METHOD_DATA_STORE_SAVE, json!(record), None)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl MessageHandler for SelectiveDisclosureHandler {
    fn name(&self) -> String {
        "selective-disclosure".to_string()
    }

    async fn handle(&self, message: Message, ctx: &Context) -> Result<Outcome, MessageError> {
        let typed = match message.parse_typed() {
            Some(typed) => typed,
            None => return Ok(Outcome::Continue(message)),
        };

        match typed.typ.as_str() {
            SDR_REQUEST_TYPE => self.handle_request(message, typed, ctx).await,
            SDR_RESPONSE_TYPE => self.handle_response(message, typed, ctx).await,
            _ => Ok(Outcome::Continue(message)),
        }
    }
}

fn default_packing() -> Packing {
    Packing::None
}

#[derive(Deserialize)]
#[serde(crate = "self::serde")]
struct SendRequestParams {
    from: String,
    to: String,
    claims: Vec<ClaimRequest>,

    #[serde(default)]
    subject: Option<String>,

    #[serde(default = "default_packing")]
    packing: Packing,
}

#[derive(Serialize)]
#[serde(crate = "self::serde")]
struct SendRequestOutput {
    id: String,
    ack: Value,
}

/// `SelectiveDisclosurePlugin` serves `sendSelectiveDisclosureRequest`
pub struct SelectiveDisclosurePlugin {
    exchanges: Arc<ExchangeStore>,
}

impl SelectiveDisclosurePlugin {
    pub fn new(exchanges: Arc<ExchangeStore>) -> Self {
        Self { exchanges }
    }

    async fn send_request(&self, args: Value, ctx: Context) -> Result<Value, PluginError> {
        let param: SendRequestParams = params(args)?;
        if param.claims.is_empty() {
            return Err(PluginError::InvalidParams(
                "at least one claim must be requested".to_string(),
            ));
        }

        let body = output(RequestBody {
            claims: param.claims,
            subject: param.subject,
        })?;

        let mut request = TypedMessage::new(SDR_REQUEST_TYPE, body.clone());
        request.set_from(&param.from).set_to(&param.to);

        let _ = if param.packing.is_authenticated() {
            self.exchanges
                .open_authenticated(&request.id, PROTOCOL_SELECTIVE_DISCLOSURE, &param.to, body)
                .await?
        } else {
            self.exchanges
                .open(
                    &request.id,
                    PROTOCOL_SELECTIVE_DISCLOSURE,
                    Some(&param.to),
                    body,
                )
                .await?
        };

        let ack = match dispatch(&ctx, &request, param.packing).await {
            Ok(ack) => ack,
            Err(err) => {
                let _ = self.exchanges.close(&request.id).await;
                return Err(PluginError::from(err));
            }
        };

        output(SendRequestOutput {
            id: request.id,
            ack,
        })
    }
}

impl Plugin for SelectiveDisclosurePlugin {
    fn name(&self) -> String {
        "selective-disclosure".to_string()
    }

    fn methods(self: Arc<Self>) -> Vec<MethodSpec> {
        let plugin = self.clone();

        vec![MethodSpec::new(
            METHOD_SEND_SELECTIVE_DISCLOSURE_REQUEST,
            Capability::SelectiveDisclosure,
        )
        .handler(move |args, ctx| {
            let plugin = plugin.clone();
            async move { plugin.send_request(args, ctx).await }
        })]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use table_test::table_test;

    use rst_common::with_tokio::tokio;

    use crate::agent::{Agent, METHOD_HANDLE_MESSAGE};
    use crate::fixtures::{Network, Party};
    use crate::message::types::ClassifiedMessage;
    use crate::store::types::DataStore;

    fn request(claims: Vec<&str>) -> RequestBody {
        RequestBody {
            claims: claims.into_iter().map(ClaimRequest::new).collect(),
            subject: None,
        }
    }

    #[test]
    fn test_reconcile() {
        let table = vec![
            (
                (
                    request(vec!["name", "email"]),
                    ResponseBody {
                        claims: vec![ClaimResponse::present("name", json!("Bob"))],
                    },
                ),
                vec![
                    ClaimResponse::present("name", json!("Bob")),
                    ClaimResponse::absent("email"),
                ],
            ),
            (
                (
                    request(vec!["name"]),
                    ResponseBody {
                        claims: vec![
                            ClaimResponse::present("phone", json!("123")),
                            ClaimResponse::present("name", json!("Bob")),
                        ],
                    },
                ),
                vec![ClaimResponse::present("name", json!("Bob"))],
            ),
            (
                (
                    request(vec!["name"]),
                    ResponseBody {
                        claims: vec![ClaimResponse {
                            claim_type: "name".to_string(),
                            status: ClaimStatus::Present,
                            value: None,
                        }],
                    },
                ),
                vec![ClaimResponse::absent("name")],
            ),
            (
                (request(vec!["email"]), ResponseBody { claims: vec![] }),
                vec![ClaimResponse::absent("email")],
            ),
        ];

        for (validator, (request, response), expected) in table_test!(table) {
            let reconciled = reconcile(&request, &response);

            validator
                .given(&format!("{:?}", request))
                .when("reconcile")
                .then(&format!("{:?}", expected))
                .assert_eq(expected, reconciled);
        }
    }

    #[test]
    fn test_claim_response_serialization() {
        let absent = serde_json::to_value(ClaimResponse::absent("email")).unwrap();
        assert_eq!(absent, json!({ "claimType": "email", "status": "absent" }));

        let present = serde_json::to_value(ClaimResponse::present("name", json!("Bob"))).unwrap();
        assert_eq!(
            present,
            json!({ "claimType": "name", "status": "present", "value": "Bob" })
        );
    }

    mod expect_success {
        use super::*;

        #[tokio::test]
        async fn test_partial_disclosure() {
            let network = Network::new();
            let mut alice = network.party("alice").await;
            let mut bob = network.party("bob").await;

            let mut claim = Record::new(RecordKind::Claim, json!("Bob"));
            claim.set_subject(&bob.did).set_tag("name");
            let _ = bob.store.save(claim).await.unwrap();

            let sent = alice
                .agent
                .execute(
                    METHOD_SEND_SELECTIVE_DISCLOSURE_REQUEST,
                    json!({
                        "from": alice.did,
                        "to": bob.did,
                        "packing": "authcrypt",
                        "claims": [
                            { "claimType": "name", "essential": true },
                            { "claimType": "email" },
                        ],
                    }),
                    None,
                )
                .await
                .unwrap();
            let request_id = sent["id"].as_str().unwrap().to_string();

            let handled = bob.receive().await.unwrap();
            assert_eq!(handled.typ(), SDR_REQUEST_TYPE);
            assert!(handled.find_metadata(META_SDR_RESPONSE_SENT).is_some());

            let raw = alice.inbox.recv().await.unwrap();
            let received: ClassifiedMessage = alice
                .agent
                .execute_as(METHOD_HANDLE_MESSAGE, json!({ "raw": raw }), None)
                .await
                .unwrap();

            assert_eq!(received.typ(), SDR_RESPONSE_TYPE);
            assert_eq!(received.message().thid, Some(request_id.clone()));
            assert_eq!(
                received.find_metadata(META_DIDCOMM).and_then(|meta| meta.value.clone()),
                Some("authcrypt".to_string())
            );

            let claims: Vec<ClaimResponse> = received
                .find_metadata(META_SDR_RESPONSE_RECEIVED)
                .and_then(|meta| meta.value.clone())
                .map(|value| serde_json::from_str(&value).unwrap())
                .unwrap();
            assert_eq!(
                claims,
                vec![
                    ClaimResponse::present("name", json!("Bob")),
                    ClaimResponse::absent("email"),
                ]
            );

            let disclosures = alice
                .store
                .query(Filter::new().kind(RecordKind::Disclosure).tag(&request_id))
                .await
                .unwrap();
            assert_eq!(disclosures.len(), 1);
            assert_eq!(disclosures[0].subject, Some(bob.did.clone()));
            assert!(alice.exchanges.is_empty().await)
        }
    }

    async fn send_request(from: &Party, to: &str, packing: &str, subject: Option<&str>) -> String {
        let mut args = json!({
            "from": from.did,
            "to": to,
            "packing": packing,
            "claims": [{ "claimType": "name" }],
        });
        if let Some(subject) = subject {
            args["subject"] = json!(subject);
        }

        let sent = from
            .agent
            .execute(METHOD_SEND_SELECTIVE_DISCLOSURE_REQUEST, args, None)
            .await
            .unwrap();
        sent["id"].as_str().unwrap().to_string()
    }

    fn forged_response(thid: &str, from: &str, to: &str) -> String {
        let mut response = TypedMessage::new(
            SDR_RESPONSE_TYPE,
            json!({ "claims": [{ "claimType": "name", "status": "present", "value": "Evil" }] }),
        );
        response.set_thid(thid).set_from(from).set_to(to);
        serde_json::to_string(&response).unwrap()
    }

    async fn handle_raw(party: &Party, raw: &str) -> ClassifiedMessage {
        party
            .agent
            .execute_as(METHOD_HANDLE_MESSAGE, json!({ "raw": raw }), None)
            .await
            .unwrap()
    }

    fn received_claims(classified: &ClassifiedMessage) -> Vec<ClaimResponse> {
        classified
            .find_metadata(META_SDR_RESPONSE_RECEIVED)
            .and_then(|meta| meta.value.clone())
            .map(|value| serde_json::from_str(&value).unwrap())
            .unwrap()
    }

    mod expect_error {
        use super::*;

        fn ctx() -> Context {
            Context::new(Agent::new(vec![]).unwrap(), None)
        }

        #[tokio::test]
        async fn test_response_from_foreign_sender_rejected() {
            let network = Network::new();
            let mut alice = network.party("alice").await;
            let mut bob = network.party("bob").await;

            let mut claim = Record::new(RecordKind::Claim, json!("Bob"));
            claim.set_subject(&bob.did).set_tag("name");
            let _ = bob.store.save(claim).await.unwrap();

            let request_id = send_request(&alice, &bob.did, "none", None).await;

            let forged = forged_response(&request_id, "did:example:mallory", &alice.did);
            let rejected = handle_raw(&alice, &forged).await;
            assert!(rejected.find_metadata(META_SDR_RESPONSE_REJECTED).is_some());
            assert!(rejected.find_metadata(META_SDR_RESPONSE_RECEIVED).is_none());
            assert_eq!(alice.exchanges.len().await, 1);

            let _ = bob.receive().await.unwrap();
            let raw = alice.inbox.recv().await.unwrap();
            let received = handle_raw(&alice, &raw).await;
            assert_eq!(
                received_claims(&received),
                vec![ClaimResponse::present("name", json!("Bob"))]
            );

            let disclosures = alice
                .store
                .query(Filter::new().kind(RecordKind::Disclosure))
                .await
                .unwrap();
            assert_eq!(disclosures.len(), 1);
            assert_eq!(disclosures[0].subject, Some(bob.did.clone()));
            assert!(alice.exchanges.is_empty().await)
        }

        #[tokio::test]
        async fn test_plaintext_response_to_authenticated_request_rejected() {
            let network = Network::new();
            let alice = network.party("alice").await;
            let bob = network.party("bob").await;

            let request_id = send_request(&alice, &bob.did, "authcrypt", None).await;

            let forged = forged_response(&request_id, &bob.did, &alice.did);
            let rejected = handle_raw(&alice, &forged).await;
            assert!(rejected.find_metadata(META_SDR_RESPONSE_REJECTED).is_some());
            assert_eq!(alice.exchanges.len().await, 1);

            let saved = alice
                .store
                .query(Filter::new().kind(RecordKind::Disclosure))
                .await
                .unwrap();
            assert!(saved.is_empty())
        }

        #[tokio::test]
        async fn test_third_party_claims_not_disclosed() {
            let network = Network::new();
            let mut alice = network.party("alice").await;
            let mut bob = network.party("bob").await;

            let mut claim = Record::new(RecordKind::Claim, json!("Carol"));
            claim.set_subject("did:example:carol").set_tag("name");
            let _ = bob.store.save(claim).await.unwrap();

            let _ = send_request(&alice, &bob.did, "none", Some("did:example:carol")).await;

            let handled = bob.receive().await.unwrap();
            assert!(handled.find_metadata(META_SDR_RESPONSE_SENT).is_some());

            let raw = alice.inbox.recv().await.unwrap();
            let received = handle_raw(&alice, &raw).await;
            assert_eq!(received_claims(&received), vec![ClaimResponse::absent("name")]);
        }

        #[tokio::test]
        async fn test_uncorrelated_response() {
            let handler = SelectiveDisclosureHandler::new(Arc::new(ExchangeStore::new()));

            let mut response = TypedMessage::new(
                SDR_RESPONSE_TYPE,
                json!({ "claims": [{ "claimType": "name", "status": "absent" }] }),
            );
            response.set_thid("unknown");
            let raw = serde_json::to_string(&response).unwrap();

            let outcome = handler.handle(Message::new(&raw), &ctx()).await.unwrap();
            match outcome {
                Outcome::Handled(classified) => {
                    assert!(classified.find_metadata(META_SDR_RESPONSE_REJECTED).is_some());
                    assert!(classified.find_metadata(META_SDR_RESPONSE_RECEIVED).is_none());
                }
                Outcome::Continue(_) => panic!("response must be handled"),
            }
        }

        #[tokio::test]
        async fn test_malformed_request() {
            let handler = SelectiveDisclosureHandler::new(Arc::new(ExchangeStore::new()));

            let mut request = TypedMessage::new(SDR_REQUEST_TYPE, json!({ "claims": "name" }));
            request.set_from("did:example:alice").set_to("did:example:bob");
            let raw = serde_json::to_string(&request).unwrap();

            let outcome = handler.handle(Message::new(&raw), &ctx()).await;
            assert!(matches!(outcome, Err(MessageError::InvalidMessage(_))))
        }

        #[tokio::test]
        async fn test_anonymous_request_not_answered() {
            let handler = SelectiveDisclosureHandler::new(Arc::new(ExchangeStore::new()));

            let mut request =
                TypedMessage::new(SDR_REQUEST_TYPE, json!({ "claims": [{ "claimType": "name" }] }));
            request.set_to("did:example:bob");
            let raw = serde_json::to_string(&request).unwrap();

            let outcome = handler.handle(Message::new(&raw), &ctx()).await.unwrap();
            match outcome {
                Outcome::Handled(classified) => {
                    assert!(classified.find_metadata(META_SDR_RESPONSE_FAILED).is_some())
                }
                Outcome::Continue(_) => panic!("request must be handled"),
            }
        }

        #[tokio::test]
        async fn test_send_without_claims() {
            let network = Network::new();
            let alice = network.party("alice").await;

            let sent = alice
                .agent
                .execute(
                    METHOD_SEND_SELECTIVE_DISCLOSURE_REQUEST,
                    json!({ "from": alice.did, "to": "did:example:bob", "claims": [] }),
                    None,
                )
                .await;
            assert!(matches!(
                sent.unwrap_err().cause(),
                Some(PluginError::InvalidParams(_))
            ))
        }
    }
}
