#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    config,
    constants::{DEFAULT_GRANT_TTL_HOURS, DEFAULT_TRIAL_HOURS},
    session::StudentSession,
    types::StudentId,
};

/// Payment state of a student account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Inside or past the free trial, never paid.
    Trial,
    /// Paid subscription.
    Paid,
    /// No payment and no trial on record.
    None,
}

/// Subscription plans and their length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Plan {
    /// Seven days.
    Weekly,
    /// Thirty days.
    Monthly,
    /// A year.
    Annual,
}

impl Plan {
    /// Length of the plan.
    pub fn duration(&self) -> Duration {
        match self {
            Plan::Weekly => Duration::days(7),
            Plan::Monthly => Duration::days(30),
            Plan::Annual => Duration::days(365),
        }
    }
}

/// Trial and subscription dates of one student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessWindow {
    /// Account owner.
    pub student_id:       StudentId,
    /// Account creation time, when the trial opened.
    pub trial_start:      DateTime<Utc>,
    /// End of the free trial.
    pub trial_end:        DateTime<Utc>,
    /// Payment state.
    pub payment_status:   PaymentStatus,
    /// End of the paid subscription; `None` means open-ended.
    pub subscription_end: Option<DateTime<Utc>>,
}

impl AccessWindow {
    /// Opens the window of a new account with a trial of `trial` length.
    pub fn open(student_id: StudentId, created_at: DateTime<Utc>, trial: Duration) -> Self {
        Self {
            student_id,
            trial_start: created_at,
            trial_end: created_at + trial,
            payment_status: PaymentStatus::Trial,
            subscription_end: None,
        }
    }

    /// Opens a window with the default 48-hour trial.
    pub fn with_default_trial(student_id: StudentId, created_at: DateTime<Utc>) -> Self {
        Self::open(student_id, created_at, Duration::hours(DEFAULT_TRIAL_HOURS))
    }

    /// Records a confirmed payment for `plan`, starting now.
    pub fn activate_subscription(&mut self, plan: Plan, now: DateTime<Utc>) {
        self.payment_status = PaymentStatus::Paid;
        self.subscription_end = Some(now + plan.duration());
        tracing::info!(
            student_id = %self.student_id,
            ?plan,
            "subscription activated"
        );
    }

    /// Administrative override of the payment state.
    pub fn set_payment_status(&mut self, status: PaymentStatus) {
        self.payment_status = status;
    }

    /// True while a paid subscription is running.
    pub fn subscription_active(&self, now: DateTime<Utc>) -> bool {
        self.payment_status == PaymentStatus::Paid
            && self.subscription_end.is_none_or(|end| end > now)
    }

    /// True while the trial is running, whatever the payment state.
    pub fn trial_active(&self, now: DateTime<Utc>) -> bool {
        now < self.trial_end
    }

    /// Whether graded features are open to this student at `now`.
    pub fn has_feature_access(&self, now: DateTime<Utc>) -> bool {
        self.subscription_active(now) || self.trial_active(now)
    }

    /// Time left in the trial, if it is still running.
    pub fn trial_remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.trial_active(now).then(|| self.trial_end - now)
    }

    /// Share of the trial still left, in percent.
    pub fn trial_remaining_percent(&self, now: DateTime<Utc>) -> f64 {
        let total = (self.trial_end - self.trial_start).num_seconds();
        if total <= 0 {
            return 0.0;
        }
        let elapsed = (now - self.trial_start).num_seconds();
        (100.0 - elapsed as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
    }
}

/// Why access was granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessReason {
    /// Running paid subscription.
    Subscription,
    /// Running free trial.
    Trial,
    /// Dialogue-only grant opened by a low score.
    RemediationGrant,
}

/// Result of an access check. Denial is not an error: callers redirect to the
/// upgrade page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    /// Access is open.
    Granted(AccessReason),
    /// Access is closed; send the student to the upgrade options.
    Upgrade,
}

impl AccessDecision {
    /// True when access is open.
    pub fn is_granted(&self) -> bool {
        matches!(self, AccessDecision::Granted(_))
    }
}

/// Temporary, dialogue-only access opened after a low score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemediationGrant {
    /// Student the grant belongs to.
    pub student_id:  StudentId,
    /// Exercise whose low score opened the grant.
    pub exercise_id: Option<String>,
    /// Score that opened the grant.
    pub score:       u8,
    /// When the grant was opened.
    pub granted_at:  DateTime<Utc>,
    /// When the grant lapses.
    pub expires_at:  DateTime<Utc>,
}

impl RemediationGrant {
    /// True until the grant lapses.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Evaluates feature access and manages remediation grants on a session.
#[derive(Debug, Clone, Copy)]
pub struct AccessGate {
    /// Lifetime of a remediation grant.
    grant_ttl: Duration,
}

impl Default for AccessGate {
    fn default() -> Self {
        Self::new(Duration::hours(DEFAULT_GRANT_TTL_HOURS))
    }
}

impl AccessGate {
    /// Creates a gate whose remediation grants last `grant_ttl`.
    pub fn new(grant_ttl: Duration) -> Self {
        Self { grant_ttl }
    }

    /// Creates a gate from the global configuration.
    pub fn from_config() -> Self {
        Self::new(config::get().grant_ttl())
    }

    /// Lifetime of a remediation grant.
    pub fn grant_ttl(&self) -> Duration {
        self.grant_ttl
    }

    /// Access to graded features: subscription or trial.
    pub fn feature_access(&self, window: &AccessWindow, now: DateTime<Utc>) -> AccessDecision {
        if window.subscription_active(now) {
            AccessDecision::Granted(AccessReason::Subscription)
        } else if window.trial_active(now) {
            AccessDecision::Granted(AccessReason::Trial)
        } else {
            tracing::info!(student_id = %window.student_id, "feature access denied");
            AccessDecision::Upgrade
        }
    }

    /// Access to the guided dialogue: feature access, or an active remediation
    /// grant held by this student's session.
    pub fn dialogue_access(
        &self,
        window: &AccessWindow,
        session: &StudentSession,
        now: DateTime<Utc>,
    ) -> AccessDecision {
        match self.feature_access(window, now) {
            AccessDecision::Granted(reason) => AccessDecision::Granted(reason),
            AccessDecision::Upgrade => match &session.remediation_grant {
                Some(grant)
                    if grant.student_id == window.student_id && grant.is_active(now) =>
                {
                    AccessDecision::Granted(AccessReason::RemediationGrant)
                }
                _ => AccessDecision::Upgrade,
            },
        }
    }

    /// Opens a remediation grant on the session, replacing any earlier one.
    pub fn open_grant(
        &self,
        session: &mut StudentSession,
        exercise_id: Option<String>,
        score: u8,
        now: DateTime<Utc>,
    ) -> RemediationGrant {
        let grant = RemediationGrant {
            student_id: session.student_id.clone(),
            exercise_id,
            score,
            granted_at: now,
            expires_at: now + self.grant_ttl,
        };
        tracing::info!(
            student_id = %grant.student_id,
            exercise_id = ?grant.exercise_id,
            score,
            "remediation dialogue access granted"
        );
        session.remediation_grant = Some(grant.clone());
        grant
    }

    /// Closes remediation access: drops the grant and the whole tutoring
    /// transcript in one step.
    pub fn close_access(&self, session: &mut StudentSession) {
        session.remediation_grant = None;
        session.tutor.reset();
        tracing::info!(student_id = %session.student_id, "remediation access closed");
    }
}
