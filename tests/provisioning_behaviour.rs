//! Behavioural tests driving the engine end to end through its public
//! surface: a provisioning sequence whose steps submit operations, poll
//! them to completion, and mutate a versioned endpoint document, all
//! against a scripted transport.

#[path = "common/test_constants.rs"]
mod test_constants;

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use stratus::test_support::{
    Invocation, ScriptedTransport, async_submit, found, snapshot, sync_submit, versioned_submit,
};
use stratus::{
    EngineError, IdShape, Method, Mutator, OperationStatus, PollPolicy, Poller, RetryLimit, Step,
    Translator, workflow,
};
use test_constants::{DEPLOYMENT_PATH, ENDPOINT_DOCUMENT, SERVICE_PATH};

/// Treats the endpoint document as plain UTF-8 text.
struct TextTranslator;

impl Translator<String> for TextTranslator {
    fn decode(&self, body: &[u8]) -> Result<String, EngineError> {
        String::from_utf8(body.to_vec())
            .map_err(|err| EngineError::Validation(format!("document is not UTF-8: {err}")))
    }

    fn encode(&self, representation: &String) -> Result<Vec<u8>, EngineError> {
        Ok(representation.clone().into_bytes())
    }

    fn empty(&self) -> String {
        String::new()
    }
}

fn policy() -> PollPolicy {
    PollPolicy::new(Duration::from_millis(1), Duration::from_millis(200))
}

fn endpoint_rule_shape() -> IdShape {
    IdShape::exact('_', 3).fold_field(1)
}

#[tokio::test]
async fn provisioning_sequence_polls_and_mutates() {
    let transport = ScriptedTransport::new();
    // create-service answers synchronously.
    transport.push_submit(Ok(sync_submit(201, b"")));
    // create-deployment answers with an operation handle.
    transport.push_submit(Ok(async_submit(202, "op-deploy")));
    transport.push_poll(Ok(snapshot(OperationStatus::InProgress, 200)));
    transport.push_poll(Ok(snapshot(OperationStatus::Succeeded, 200)));
    // add-endpoint mutates the versioned endpoint document.
    transport.push_fetch(Ok(found(b"", Some("v7"))));
    transport.push_submit(Ok(versioned_submit(200, "v8")));

    let poller = Poller::new(&transport);
    let mutator = Mutator::new(&transport, TextTranslator);
    let cancel = CancellationToken::new();

    let rule = endpoint_rule_shape()
        .encode(&["WEB-01", "TCP", "80"])
        .expect("rule id should encode");
    assert_eq!(rule, "WEB-01_tcp_80");

    let poller_ref = &poller;
    let mutator_ref = &mutator;
    let cancel_ref = &cancel;
    let rule_line = format!("rule={rule}");

    let steps = vec![
        Step::new("create-service", move || async move {
            poller_ref
                .submit(Method::Post, SERVICE_PATH, b"<CreateHostedService/>", policy(), cancel_ref)
                .await
                .map(|_| ())
        }),
        Step::new("create-deployment", move || async move {
            poller_ref
                .submit(Method::Post, DEPLOYMENT_PATH, b"<CreateDeployment/>", policy(), cancel_ref)
                .await
                .map(|_| ())
        }),
        Step::new("add-endpoint", move || async move {
            mutator_ref
                .mutate_versioned(
                    ENDPOINT_DOCUMENT,
                    None,
                    RetryLimit::attempts(3),
                    policy(),
                    cancel_ref,
                    {
                        let line = rule_line.clone();
                        move |current| {
                            if current.is_empty() {
                                Ok(line.clone())
                            } else {
                                Ok(format!("{current}\n{line}"))
                            }
                        }
                    },
                )
                .await
                .map(|_| ())
        }),
    ];

    workflow::run(steps).await.expect("sequence should succeed");

    assert_eq!(transport.poll_count(), 2);
    assert_eq!(
        transport.submitted_bodies().last(),
        Some(&b"rule=WEB-01_tcp_80".to_vec())
    );
}

#[tokio::test]
async fn failed_endpoint_step_rolls_back_in_reverse() {
    let transport = ScriptedTransport::new();
    // Forward actions.
    transport.push_submit(Ok(sync_submit(201, b"")));
    transport.push_submit(Ok(async_submit(202, "op-deploy")));
    transport.push_poll(Ok(snapshot(OperationStatus::Succeeded, 200)));
    transport.push_fetch(Ok(found(b"", Some("v7"))));
    transport.push_submit(Ok(sync_submit(400, b"endpoint rejected")));
    // Compensations: delete deployment, then delete service.
    transport.push_submit(Ok(sync_submit(200, b"")));
    transport.push_submit(Ok(sync_submit(200, b"")));

    let poller = Poller::new(&transport);
    let mutator = Mutator::new(&transport, TextTranslator);
    let cancel = CancellationToken::new();

    let poller_ref = &poller;
    let mutator_ref = &mutator;
    let cancel_ref = &cancel;

    let steps = vec![
        Step::new("create-service", move || async move {
            poller_ref
                .submit(Method::Post, SERVICE_PATH, b"<CreateHostedService/>", policy(), cancel_ref)
                .await
                .map(|_| ())
        })
        .with_compensation(move || async move {
            poller_ref
                .submit(Method::Delete, SERVICE_PATH, &[], policy(), cancel_ref)
                .await
                .map(|_| ())
        }),
        Step::new("create-deployment", move || async move {
            poller_ref
                .submit(Method::Post, DEPLOYMENT_PATH, b"<CreateDeployment/>", policy(), cancel_ref)
                .await
                .map(|_| ())
        })
        .with_compensation(move || async move {
            poller_ref
                .submit(Method::Delete, DEPLOYMENT_PATH, &[], policy(), cancel_ref)
                .await
                .map(|_| ())
        }),
        Step::new("add-endpoint", move || async move {
            mutator_ref
                .mutate_versioned(
                    ENDPOINT_DOCUMENT,
                    None,
                    RetryLimit::attempts(1),
                    policy(),
                    cancel_ref,
                    |current| Ok(format!("{current}rule=web_tcp_80")),
                )
                .await
                .map(|_| ())
        }),
    ];

    let failure = workflow::run(steps)
        .await
        .expect_err("endpoint rejection must fail the run");

    assert_eq!(failure.step, "add-endpoint");
    assert_eq!(
        failure.error,
        EngineError::OperationFailed {
            operation_id: String::from(ENDPOINT_DOCUMENT),
            code: String::from("http-400"),
            message: String::from("endpoint rejected"),
        }
    );
    assert!(failure.compensation_warnings.is_empty());

    let deletes: Vec<String> = transport
        .invocations()
        .into_iter()
        .filter_map(|call| match call {
            Invocation::Submit { method, path, .. } if method == Method::Delete => Some(path),
            _ => None,
        })
        .collect();
    assert_eq!(
        deletes,
        vec![DEPLOYMENT_PATH.to_owned(), SERVICE_PATH.to_owned()]
    );
}
