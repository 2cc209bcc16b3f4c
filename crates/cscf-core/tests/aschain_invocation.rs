//! AS chain step evaluation tests
//!
//! Exercises the per-step decision algorithm end to end: dispositions,
//! external-AS target construction, served-user assertion, internal
//! service dispatch, and failure-policy handling.

use std::str::FromStr;
use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;

use rims_cscf_core::{
    AsChainLink, AsChainTable, AsInvocation, CallServices, ChainError, DefaultHandling,
    Disposition, Ifc, Ifcs, LocalNode, ServiceFlavor, SessionCase,
};
use rims_sip_core::{HeaderName, Method, SipMessage, Uri};

struct StaticIfc {
    matches: bool,
    invocation: AsInvocation,
}

impl Ifc for StaticIfc {
    fn filter_matches(&self, _: SessionCase, _: bool, _: &SipMessage) -> bool {
        self.matches
    }

    fn as_invocation(&self) -> AsInvocation {
        self.invocation.clone()
    }
}

fn matching(server: &str, handling: DefaultHandling) -> Box<dyn Ifc> {
    Box::new(StaticIfc {
        matches: true,
        invocation: AsInvocation::new(server, handling),
    })
}

fn non_matching() -> Box<dyn Ifc> {
    Box::new(StaticIfc {
        matches: false,
        invocation: AsInvocation::new("sip:unused.example.com", DefaultHandling::SessionTerminate),
    })
}

/// Records invocations and answers with a fixed continue decision.
struct StubServices {
    proceed: bool,
    seen: Mutex<Vec<(ServiceFlavor, String)>>,
}

impl StubServices {
    fn new(proceed: bool) -> Self {
        StubServices {
            proceed,
            seen: Mutex::new(Vec::new()),
        }
    }
}

impl CallServices for StubServices {
    fn is_internal(&self, server_name: &str) -> bool {
        server_name == "sip:mmtel.example.com"
    }

    fn invoke(&self, flavor: ServiceFlavor, _msg: &mut SipMessage, served_user: &str) -> bool {
        self.seen
            .lock()
            .unwrap()
            .push((flavor, served_user.to_string()));
        self.proceed
    }
}

fn local() -> LocalNode {
    LocalNode::new("scscf.example.com", 5058)
}

fn invite(target: &str) -> SipMessage {
    SipMessage::request(Method::Invite, Uri::from_str(target).unwrap())
}

fn chain(
    table: &Arc<AsChainTable>,
    session_case: SessionCase,
    is_registered: bool,
    ifcs: Vec<Box<dyn Ifc>>,
) -> AsChainLink {
    AsChainLink::create_as_chain(
        table,
        session_case,
        "sip:alice@example.com",
        is_registered,
        7,
        Ifcs::new(ifcs),
    )
    .unwrap()
}

#[test]
fn test_empty_chain_is_complete() {
    let table = Arc::new(AsChainTable::new());
    let mut link = chain(&table, SessionCase::Originating, true, vec![]);
    let mut msg = invite("sip:bob@example.com");

    let disposition = link.on_initial_request(None, &local(), &mut msg).unwrap();
    assert_eq!(disposition, Disposition::Complete);
    assert!(!msg.has_header(&HeaderName::PServedUser));

    link.request_destroy();
}

#[test]
fn test_exhausted_link_is_complete_regardless_of_message() {
    let table = Arc::new(AsChainTable::new());
    let link = chain(
        &table,
        SessionCase::Originating,
        true,
        vec![matching("sip:as.example.com", DefaultHandling::SessionContinue)],
    );
    let mut link = link.advance();
    assert!(link.is_complete());

    let mut msg = invite("sip:anything@anywhere.example.net");
    let disposition = link.on_initial_request(None, &local(), &mut msg).unwrap();
    assert_eq!(disposition, Disposition::Complete);

    link.request_destroy();
}

#[test]
fn test_non_matching_criteria_returns_next() {
    let table = Arc::new(AsChainTable::new());
    let mut link = chain(&table, SessionCase::Originating, true, vec![non_matching()]);
    let mut msg = invite("sip:bob@example.com");

    let disposition = link.on_initial_request(None, &local(), &mut msg).unwrap();
    assert_eq!(disposition, Disposition::Next);
    assert!(!msg.has_header(&HeaderName::PServedUser));

    // The link is not consumed; the caller advances and falls through to
    // Complete at the end of the chain.
    let mut link = link.advance();
    let disposition = link.on_initial_request(None, &local(), &mut msg).unwrap();
    assert_eq!(disposition, Disposition::Complete);

    link.request_destroy();
}

#[test]
fn test_external_as_dispatch_builds_target() {
    let table = Arc::new(AsChainTable::new());
    let mut link = chain(
        &table,
        SessionCase::Originating,
        true,
        vec![matching(
            "sip:as1.example.com;transport=tcp",
            DefaultHandling::SessionContinue,
        )],
    );
    let token = link.next_odi_token().unwrap().to_string();
    let mut msg = invite("sip:bob@example.com");

    let disposition = link.on_initial_request(None, &local(), &mut msg).unwrap();
    let target = match disposition {
        Disposition::Skip(target) => target,
        other => panic!("expected Skip, got {other:?}"),
    };

    // Request target is unchanged, on the message and in the target.
    assert_eq!(target.uri.to_string(), "sip:bob@example.com");
    assert_eq!(msg.uri().to_string(), "sip:bob@example.com");
    assert!(!target.from_store);

    // AS first, loose-routed; then the self-addressed resumption entry on
    // the same transport.
    assert_eq!(target.paths.len(), 2);
    assert_eq!(
        target.paths[0].to_string(),
        "sip:as1.example.com;transport=tcp;lr"
    );
    assert_eq!(
        target.paths[1].to_string(),
        format!("sip:odi_{token}@scscf.example.com:5058;transport=tcp;lr")
    );

    // Forgiving handling mode gets the shorter liveness timeout.
    assert_eq!(target.liveness_timeout, 2);
    assert_eq!(link.default_handling(), DefaultHandling::SessionContinue);

    assert_eq!(
        msg.header(&HeaderName::PServedUser),
        Some("<sip:alice@example.com>;sescase=orig;regstate=reg")
    );

    link.request_destroy();
}

#[test]
fn test_terminate_handling_gets_longer_timeout() {
    let table = Arc::new(AsChainTable::new());
    let mut continue_link = chain(
        &table,
        SessionCase::Originating,
        true,
        vec![matching("sip:as.example.com", DefaultHandling::SessionContinue)],
    );
    let mut terminate_link = chain(
        &table,
        SessionCase::Originating,
        true,
        vec![matching("sip:as.example.com", DefaultHandling::SessionTerminate)],
    );
    let mut msg = invite("sip:bob@example.com");

    let lenient = match continue_link.on_initial_request(None, &local(), &mut msg).unwrap() {
        Disposition::Skip(target) => target.liveness_timeout,
        other => panic!("expected Skip, got {other:?}"),
    };
    let strict = match terminate_link.on_initial_request(None, &local(), &mut msg).unwrap() {
        Disposition::Skip(target) => target.liveness_timeout,
        other => panic!("expected Skip, got {other:?}"),
    };
    assert!(strict > lenient, "{strict} should exceed {lenient}");
    assert_eq!(terminate_link.default_handling(), DefaultHandling::SessionTerminate);

    continue_link.request_destroy();
    terminate_link.request_destroy();
}

#[test]
fn test_self_route_entry_without_transport_param() {
    let table = Arc::new(AsChainTable::new());
    let mut link = chain(
        &table,
        SessionCase::Originating,
        true,
        vec![matching("sip:as2.example.com", DefaultHandling::SessionTerminate)],
    );
    let token = link.next_odi_token().unwrap().to_string();
    let mut msg = invite("sip:bob@example.com");

    match link.on_initial_request(None, &local(), &mut msg).unwrap() {
        Disposition::Skip(target) => {
            assert_eq!(target.paths[0].to_string(), "sip:as2.example.com;lr");
            assert_eq!(
                target.paths[1].to_string(),
                format!("sip:odi_{token}@scscf.example.com:5058;lr")
            );
        }
        other => panic!("expected Skip, got {other:?}"),
    }

    link.request_destroy();
}

#[test]
fn test_internal_service_continue_advances_chain() {
    let table = Arc::new(AsChainTable::new());
    let mut link = chain(
        &table,
        SessionCase::Originating,
        true,
        vec![matching("sip:mmtel.example.com", DefaultHandling::SessionTerminate)],
    );
    let services = StubServices::new(true);
    let mut msg = invite("sip:bob@example.com");

    let disposition = link
        .on_initial_request(Some(&services), &local(), &mut msg)
        .unwrap();
    assert_eq!(disposition, Disposition::Next);

    let seen = services.seen.lock().unwrap();
    assert_eq!(
        *seen,
        vec![(ServiceFlavor::Originating, "sip:alice@example.com".to_string())]
    );
    // Internal dispatch does not assert the served user on the message.
    assert!(!msg.has_header(&HeaderName::PServedUser));

    link.request_destroy();
}

#[test]
fn test_internal_service_stop_halts_chain() {
    let table = Arc::new(AsChainTable::new());
    let mut link = chain(
        &table,
        SessionCase::Terminating,
        true,
        vec![matching("sip:mmtel.example.com", DefaultHandling::SessionTerminate)],
    );
    let services = StubServices::new(false);
    let mut msg = invite("sip:alice@example.com");

    let disposition = link
        .on_initial_request(Some(&services), &local(), &mut msg)
        .unwrap();
    assert_eq!(disposition, Disposition::Stop);

    let seen = services.seen.lock().unwrap();
    assert_eq!(seen[0].0, ServiceFlavor::Terminating);

    link.request_destroy();
}

#[test]
fn test_without_services_internal_name_goes_external() {
    let table = Arc::new(AsChainTable::new());
    let mut link = chain(
        &table,
        SessionCase::Originating,
        true,
        vec![matching("sip:mmtel.example.com", DefaultHandling::SessionTerminate)],
    );
    let mut msg = invite("sip:bob@example.com");

    let disposition = link.on_initial_request(None, &local(), &mut msg).unwrap();
    assert!(matches!(disposition, Disposition::Skip(_)));

    link.request_destroy();
}

#[test]
fn test_orig_cdiv_omits_regstate() {
    let table = Arc::new(AsChainTable::new());
    let mut link = chain(
        &table,
        SessionCase::OriginatingCdiv,
        true,
        vec![matching("sip:as.example.com", DefaultHandling::SessionTerminate)],
    );
    let mut msg = invite("sip:bob@example.com");

    link.on_initial_request(None, &local(), &mut msg).unwrap();
    assert_eq!(
        msg.header(&HeaderName::PServedUser),
        Some("<sip:alice@example.com>;sescase=orig-cdiv")
    );

    link.request_destroy();
}

#[test]
fn test_unregistered_user_asserted_as_unreg() {
    let table = Arc::new(AsChainTable::new());
    let mut link = chain(
        &table,
        SessionCase::Originating,
        false,
        vec![matching("sip:as.example.com", DefaultHandling::SessionTerminate)],
    );
    let mut msg = invite("sip:bob@example.com");

    link.on_initial_request(None, &local(), &mut msg).unwrap();
    assert_eq!(
        msg.header(&HeaderName::PServedUser),
        Some("<sip:alice@example.com>;sescase=orig;regstate=unreg")
    );

    link.request_destroy();
}

#[test]
fn test_served_user_assertion_replaces_spoofed_header() {
    let table = Arc::new(AsChainTable::new());
    let mut link = chain(
        &table,
        SessionCase::Originating,
        true,
        vec![matching("sip:as.example.com", DefaultHandling::SessionTerminate)],
    );
    let mut msg = invite("sip:bob@example.com");
    msg.append_header(HeaderName::PServedUser, "<sip:mallory@example.com>");

    link.on_initial_request(None, &local(), &mut msg).unwrap();
    assert_eq!(msg.headers(&HeaderName::PServedUser).count(), 1);
    assert_eq!(
        msg.header(&HeaderName::PServedUser),
        Some("<sip:alice@example.com>;sescase=orig;regstate=reg")
    );

    link.request_destroy();
}

#[test]
fn test_malformed_as_uri_is_a_step_level_error() {
    let table = Arc::new(AsChainTable::new());
    let mut link = chain(
        &table,
        SessionCase::Originating,
        true,
        vec![matching(
            "::invalid:as.example.com",
            DefaultHandling::SessionContinue,
        )],
    );
    let mut msg = invite("sip:bob@example.com");

    let err = link.on_initial_request(None, &local(), &mut msg).unwrap_err();
    match err {
        ChainError::MalformedServerUri { server, .. } => {
            assert_eq!(server, "::invalid:as.example.com");
        }
        other => panic!("expected MalformedServerUri, got {other:?}"),
    }
    // The failure policy was recorded before parsing, so the caller can
    // degrade as if the server were unreachable.
    assert_eq!(link.default_handling(), DefaultHandling::SessionContinue);

    link.request_destroy();
}

#[test]
fn test_reset_default_handling_after_provisional_response() {
    let table = Arc::new(AsChainTable::new());
    let mut link = chain(
        &table,
        SessionCase::Originating,
        true,
        vec![matching("sip:as.example.com", DefaultHandling::SessionContinue)],
    );
    let mut msg = invite("sip:bob@example.com");

    link.on_initial_request(None, &local(), &mut msg).unwrap();
    assert_eq!(link.default_handling(), DefaultHandling::SessionContinue);

    link.reset_default_handling();
    assert_eq!(link.default_handling(), DefaultHandling::SessionTerminate);

    link.request_destroy();
}

#[test]
fn test_matches_target_compares_canonical_forms() {
    let table = Arc::new(AsChainTable::new());
    let link = chain(&table, SessionCase::Terminating, true, vec![]);

    let same = invite("sip:alice@example.com;user=phone");
    assert!(link.matches_target(&same));

    let escaped = invite("sip:%61lice@example.com");
    assert!(link.matches_target(&escaped));

    let other = invite("sip:bob@example.com");
    assert!(!link.matches_target(&other));

    link.request_destroy();
}
