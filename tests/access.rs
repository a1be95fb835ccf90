use chrono::{DateTime, Duration, TimeZone, Utc};
use remedia::{
    access::{AccessDecision, AccessGate, AccessReason, AccessWindow, PaymentStatus, Plan},
    session::StudentSession,
    types::{Language, StudentId},
};

fn created() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
}

fn window() -> AccessWindow {
    AccessWindow::with_default_trial(StudentId::from("alice"), created())
}

#[test]
fn trial_lasts_forty_eight_hours() {
    let window = window();
    let end = window.trial_end;
    assert_eq!(end - window.trial_start, Duration::hours(48));

    assert!(window.has_feature_access(end - Duration::seconds(1)));
    assert!(!window.has_feature_access(end));
    assert!(!window.has_feature_access(end + Duration::seconds(1)));
}

#[test]
fn paid_subscription_outlives_the_trial() {
    let mut window = window();
    let paid_at = window.trial_end + Duration::days(3);
    window.activate_subscription(Plan::Monthly, paid_at);

    assert_eq!(window.payment_status, PaymentStatus::Paid);
    assert_eq!(window.subscription_end, Some(paid_at + Duration::days(30)));
    assert!(window.has_feature_access(paid_at + Duration::days(29)));
    assert!(!window.has_feature_access(paid_at + Duration::days(31)));
}

#[test]
fn open_ended_subscription_never_lapses() {
    let mut window = window();
    window.set_payment_status(PaymentStatus::Paid);

    assert!(window.subscription_end.is_none());
    assert!(window.has_feature_access(created() + Duration::days(3650)));
}

#[test]
fn plan_lengths() {
    assert_eq!(Plan::Weekly.duration(), Duration::days(7));
    assert_eq!(Plan::Monthly.duration(), Duration::days(30));
    assert_eq!(Plan::Annual.duration(), Duration::days(365));
}

#[test]
fn trial_remaining_stays_in_range() {
    let window = window();

    assert_eq!(window.trial_remaining_percent(created()), 100.0);
    assert_eq!(
        window.trial_remaining_percent(created() + Duration::hours(12)),
        75.0
    );
    assert_eq!(window.trial_remaining_percent(window.trial_end), 0.0);
    assert_eq!(
        window.trial_remaining_percent(window.trial_end + Duration::days(5)),
        0.0
    );
    assert_eq!(
        window.trial_remaining_percent(created() - Duration::hours(1)),
        100.0
    );

    assert_eq!(
        window.trial_remaining(created() + Duration::hours(47)),
        Some(Duration::hours(1))
    );
    assert_eq!(window.trial_remaining(window.trial_end), None);
}

#[test]
fn feature_access_reports_its_reason() {
    let gate = AccessGate::default();
    let mut window = window();

    assert_eq!(
        gate.feature_access(&window, created()),
        AccessDecision::Granted(AccessReason::Trial)
    );
    let later = window.trial_end + Duration::hours(1);
    assert_eq!(gate.feature_access(&window, later), AccessDecision::Upgrade);

    window.activate_subscription(Plan::Weekly, later);
    assert_eq!(
        gate.feature_access(&window, later),
        AccessDecision::Granted(AccessReason::Subscription)
    );
}

#[test]
fn remediation_grant_opens_dialogue_only() {
    let gate = AccessGate::default();
    let window = window();
    let mut session = StudentSession::new("alice", Language::Fr);
    let now = window.trial_end + Duration::hours(2);

    assert_eq!(gate.dialogue_access(&window, &session, now), AccessDecision::Upgrade);

    let grant = gate.open_grant(&mut session, Some("ex-7".into()), 1, now);
    assert_eq!(grant.expires_at, now + Duration::hours(24));
    assert_eq!(
        gate.dialogue_access(&window, &session, now),
        AccessDecision::Granted(AccessReason::RemediationGrant)
    );
    assert_eq!(gate.feature_access(&window, now), AccessDecision::Upgrade);

    let lapsed = grant.expires_at;
    assert_eq!(
        gate.dialogue_access(&window, &session, lapsed),
        AccessDecision::Upgrade
    );
}

#[test]
fn grant_belongs_to_its_student() {
    let gate = AccessGate::new(Duration::hours(2));
    let bob = AccessWindow::with_default_trial(StudentId::from("bob"), created());
    let mut session = StudentSession::new("alice", Language::En);
    let now = bob.trial_end + Duration::minutes(5);

    gate.open_grant(&mut session, None, 0, now);
    assert_eq!(gate.dialogue_access(&bob, &session, now), AccessDecision::Upgrade);
}

#[test]
fn closing_access_drops_grant_and_transcript() {
    let gate = AccessGate::default();
    let window = window();
    let mut session = StudentSession::new("alice", Language::En);
    let now = window.trial_end + Duration::hours(1);

    gate.open_grant(&mut session, None, 2, now);
    session
        .tutor
        .push(remedia::dialogue::TranscriptEntry::student("Where do I start?"));
    gate.close_access(&mut session);

    assert!(session.remediation_grant.is_none());
    assert!(session.tutor.is_empty());
    assert_eq!(gate.dialogue_access(&window, &session, now), AccessDecision::Upgrade);
}
