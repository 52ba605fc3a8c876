//! End-to-end ballot scenarios against the public session API.

use zkvote_ballot::{
    RegistryError, SessionError, SimplifiedReason, TallyView, VerificationError, VerificationPath,
    VotingSession,
};
use zkvote_core::{PublicSignals, VoterId, VotingMode};
use zkvote_crypto::VoterSecret;
use zkvote_zkp::{
    MockCircuitInputs, MockProof, MockProofSystem, ProofBundle, ProofSystem, VerifyingKeySource,
};

fn id(s: &str) -> VoterId {
    VoterId::new(s).unwrap()
}

fn open_session(
    mode: VotingMode,
    key: VerifyingKeySource<zkvote_zkp::MockVerifyingKey>,
) -> VotingSession<MockProofSystem> {
    let session = VotingSession::new(MockProofSystem::default(), key);
    session.configure("Ship it?", ["Yes", "No"], mode).unwrap();
    session
        .load_eligible_voters(["A", "B", "C"].into_iter().map(id))
        .unwrap();
    session
}

fn keyed_session() -> VotingSession<MockProofSystem> {
    let key = VerifyingKeySource::InMemory(MockProofSystem::default().verifying_key());
    open_session(VotingMode::Anonymous, key)
}

fn prove(secret: &str, vote: u64, salt: &str) -> ProofBundle<MockProof> {
    MockProofSystem::default()
        .prove(&MockCircuitInputs {
            voter_secret: VoterSecret::new(secret),
            vote,
            max_options: 2,
            salt: salt.to_string(),
        })
        .unwrap()
}

/// Observable state used to check that failed calls change nothing.
fn observe(session: &VotingSession<MockProofSystem>) -> (Vec<bool>, TallyView, usize) {
    let voted = ["A", "B", "C"]
        .into_iter()
        .map(|v| session.verify_voter_eligibility(&id(v)).unwrap().has_voted)
        .collect();
    let ballots = session.anonymous_ballots().map(|b| b.len()).unwrap_or(0);
    (voted, session.get_tally().unwrap(), ballots)
}

#[test]
fn plaintext_three_voters_double_vote_rejected() {
    let session = open_session(VotingMode::Plaintext, VerifyingKeySource::Absent);
    session.submit_plaintext_vote(&id("A"), 0).unwrap();
    session.submit_plaintext_vote(&id("B"), 1).unwrap();
    session.submit_plaintext_vote(&id("C"), 0).unwrap();
    let err = session.submit_plaintext_vote(&id("C"), 0).unwrap_err();
    assert_eq!(err, SessionError::AlreadyVoted { voter_id: id("C") });

    match session.get_tally().unwrap() {
        TallyView::Plaintext { results, options } => {
            assert_eq!(options, vec!["Yes".to_string(), "No".to_string()]);
            assert_eq!(results.counts, vec![2, 1]);
            assert_eq!(results.total, 3);
            assert_eq!(results.max_voters, 3);
        }
        other => panic!("expected plaintext tally, got {other:?}"),
    }
}

#[test]
fn plaintext_two_voters_counts_match() {
    let session = open_session(VotingMode::Plaintext, VerifyingKeySource::Absent);
    session.submit_plaintext_vote(&id("A"), 0).unwrap();
    session.submit_plaintext_vote(&id("B"), 1).unwrap();
    let err = session.submit_plaintext_vote(&id("B"), 0).unwrap_err();
    assert!(err.is_already_voted());
    match session.get_tally().unwrap() {
        TallyView::Plaintext { results, .. } => {
            assert_eq!(results.counts, vec![1, 1]);
            assert_eq!(results.total, 2);
            assert_eq!(results.max_voters, 3);
        }
        other => panic!("expected plaintext tally, got {other:?}"),
    }
}

#[test]
fn ineligible_voter_never_mutates_state() {
    let session = keyed_session();
    let status = session.verify_voter_eligibility(&id("Z")).unwrap();
    assert!(!status.valid);
    assert!(!status.has_voted);

    let before = observe(&session);
    assert!(matches!(
        session.register_commitment(&id("Z"), &VoterSecret::new("z")),
        Err(SessionError::Registry(RegistryError::NotEligible { .. }))
    ));
    let bundle = prove("z", 0, "r");
    assert!(session
        .submit_proof(&id("Z"), &bundle.proof, &bundle.public_signals)
        .is_err());
    assert_eq!(observe(&session), before);
    assert!(!session
        .is_nullifier_consumed(&bundle.public_signals.nullifier_hash())
        .unwrap());
}

#[test]
fn absent_key_falls_back_then_blocks_second_vote() {
    let session = open_session(VotingMode::Anonymous, VerifyingKeySource::Absent);
    session
        .register_commitment(&id("A"), &VoterSecret::new("a"))
        .unwrap();

    let bundle = prove("a", 1, "r1");
    let receipt = session
        .submit_proof(&id("A"), &bundle.proof, &bundle.public_signals)
        .unwrap();
    assert_eq!(
        receipt.path,
        VerificationPath::Simplified {
            reason: SimplifiedReason::KeyUnavailable
        }
    );
    assert!(session.verify_voter_eligibility(&id("A")).unwrap().has_voted);
    assert_eq!(session.verifier().downgrade_count(), 1);

    let again = prove("a", 0, "r2");
    let err = session
        .submit_proof(&id("A"), &again.proof, &again.public_signals)
        .unwrap_err();
    assert!(err.is_already_voted());
}

#[test]
fn key_file_is_picked_up_while_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("verification_key.json");
    let session = open_session(VotingMode::Anonymous, VerifyingKeySource::File(path.clone()));
    assert!(!session.health().circuit_available);

    std::fs::write(&path, MockProofSystem::default().verifying_key_json()).unwrap();
    assert!(session.health().circuit_available);

    session
        .register_commitment(&id("B"), &VoterSecret::new("b"))
        .unwrap();
    let bundle = prove("b", 0, "r");
    let receipt = session
        .submit_proof(&id("B"), &bundle.proof, &bundle.public_signals)
        .unwrap();
    assert_eq!(receipt.path, VerificationPath::CircuitBacked);
    assert_eq!(receipt.nullifier_hash, bundle.public_signals.nullifier_hash());
}

#[test]
fn shared_secret_replay_is_rejected() {
    let session = keyed_session();
    session
        .register_commitment(&id("A"), &VoterSecret::new("shared"))
        .unwrap();
    session
        .register_commitment(&id("B"), &VoterSecret::new("shared"))
        .unwrap();

    let bundle = prove("shared", 0, "r");
    session
        .submit_proof(&id("A"), &bundle.proof, &bundle.public_signals)
        .unwrap();

    let before = observe(&session);
    let err = session
        .submit_proof(&id("B"), &bundle.proof, &bundle.public_signals)
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::Verification(VerificationError::ReplayedVote { .. })
    ));
    assert_eq!(observe(&session), before);
}

#[test]
fn every_rejection_leaves_state_unchanged() {
    let session = keyed_session();
    session
        .register_commitment(&id("A"), &VoterSecret::new("a"))
        .unwrap();
    let before = observe(&session);

    // foreign commitment
    let foreign = prove("not-a", 0, "r");
    let err = session
        .submit_proof(&id("A"), &foreign.proof, &foreign.public_signals)
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::Verification(VerificationError::CommitmentMismatch { .. })
    ));

    // forged proof
    let good = prove("a", 0, "r");
    let forged = MockProof {
        digest: "0".into(),
    };
    let err = session
        .submit_proof(&id("A"), &forged, &good.public_signals)
        .unwrap_err();
    assert_eq!(err, SessionError::Verification(VerificationError::InvalidProof));

    // out-of-range vote
    let invalid = prove("a", 5, "r");
    let err = session
        .submit_proof(&id("A"), &invalid.proof, &invalid.public_signals)
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::Verification(VerificationError::CircuitRejected { .. })
    ));

    // proof bound to a wider ballot
    let wide = MockProofSystem::default()
        .prove(&MockCircuitInputs {
            voter_secret: VoterSecret::new("a"),
            vote: 2,
            max_options: 3,
            salt: "r".into(),
        })
        .unwrap();
    let err = session
        .submit_proof(&id("A"), &wide.proof, &wide.public_signals)
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::Verification(VerificationError::OptionBoundMismatch { expected: 2, .. })
    ));

    // unregistered
    let err = session
        .submit_proof(&id("C"), &good.proof, &good.public_signals)
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::Verification(VerificationError::VoterNotRegistered { .. })
    ));

    assert_eq!(observe(&session), before);

    // and the voter can still vote afterwards
    session
        .submit_proof(&id("A"), &good.proof, &good.public_signals)
        .unwrap();
}

#[test]
fn tampered_signal_order_is_caught() {
    let session = keyed_session();
    session
        .register_commitment(&id("A"), &VoterSecret::new("a"))
        .unwrap();
    let bundle = prove("a", 1, "r");
    let mut values: Vec<String> = bundle.public_signals.clone().into();
    values.swap(0, 1);
    let swapped = PublicSignals::new(values).unwrap();
    let err = session
        .submit_proof(&id("A"), &bundle.proof, &swapped)
        .unwrap_err();
    assert_eq!(err, SessionError::Verification(VerificationError::InvalidProof));
}

#[test]
fn closing_freezes_the_result() {
    let session = keyed_session();
    for (voter, secret) in [("A", "a"), ("B", "b")] {
        session
            .register_commitment(&id(voter), &VoterSecret::new(secret))
            .unwrap();
        let bundle = prove(secret, 0, voter);
        session
            .submit_proof(&id(voter), &bundle.proof, &bundle.public_signals)
            .unwrap();
    }
    let exported = session.anonymous_ballots().unwrap();
    assert_eq!(exported.len(), 2);
    assert!(exported.iter().all(|b| b.path.is_zero_knowledge()));

    let snapshot = session.close().unwrap();
    assert_eq!(snapshot.votes_cast, 2);
    assert_eq!(snapshot.eligible_voters, 3);
    assert_eq!(snapshot.verification_downgrades, 0);
    match snapshot.tally {
        TallyView::Anonymous(summary) => {
            assert_eq!(summary.total_votes_cast, 2);
            assert_eq!(summary.registered_voters, 2);
        }
        other => panic!("expected anonymous summary, got {other:?}"),
    }
    assert!(matches!(
        session.anonymous_ballots(),
        Err(SessionError::NotOpen { .. })
    ));
}

#[test]
fn malformed_groth16_proof_is_rejected_under_loaded_key() {
    use zkvote_zkp::SnarkjsProofSystem;

    let key = VerifyingKeySource::InMemory(serde_json::json!({"protocol": "groth16"}));
    let session = VotingSession::new(SnarkjsProofSystem::new(), key);
    session.configure("Ship it?", ["Yes", "No"], VotingMode::Anonymous).unwrap();
    session.load_eligible_voters([id("A")]).unwrap();
    let commitment = session
        .register_commitment(&id("A"), &VoterSecret::new("a-secret"))
        .unwrap();

    let signals = PublicSignals::new(vec![
        "1".into(),
        "2".into(),
        "0".into(),
        "99".into(),
        commitment.as_str().into(),
    ])
    .unwrap();
    let err = session
        .submit_proof(&id("A"), &serde_json::json!("not a proof"), &signals)
        .unwrap_err();
    assert_eq!(err, SessionError::Verification(VerificationError::InvalidProof));

    assert!(!session.verify_voter_eligibility(&id("A")).unwrap().has_voted);
    assert!(!session.is_nullifier_consumed(&signals.nullifier_hash()).unwrap());
    assert!(session.anonymous_ballots().unwrap().is_empty());
    assert_eq!(session.get_tally().unwrap().votes_cast(), 0);
    assert_eq!(session.verifier().downgrade_count(), 0);
}
