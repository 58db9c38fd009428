/// Element access policy
///
/// Decides whether an identity may view an element gallery. Non-admins
/// always see their primary element and may additionally open one other
/// element per rolling 24 hour window. The window is evaluated lazily on
/// every check; nothing expires it in the background.

pub mod guard;

pub use guard::{Navigation, Route, RouteGuard};

use crate::{
    account::AccountDirectory,
    element::{Element, ElementRef},
    error::{AppError, AppResult},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

/// Length of the bonus window in milliseconds
pub const BONUS_WINDOW_MS: i64 = 24 * 60 * 60 * 1000;

const HOUR_MS: i64 = 60 * 60 * 1000;
const MINUTE_MS: i64 = 60 * 1000;

/// The access-relevant part of an identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    pub is_admin: bool,
    pub primary: Option<Element>,
    /// Epoch milliseconds, 0 when no bonus was ever granted
    pub last_bonus_ms: i64,
    pub bonus_element: Option<Element>,
}

impl Subject {
    /// The bonus element if its grant is still inside the window
    pub fn active_bonus(&self, now: DateTime<Utc>) -> Option<(Element, i64)> {
        if self.last_bonus_ms == 0 {
            return None;
        }
        let elapsed = now.timestamp_millis() - self.last_bonus_ms;
        if elapsed >= BONUS_WINDOW_MS {
            return None;
        }
        self.bonus_element.map(|e| (e, elapsed))
    }
}

/// Why access was granted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantReason {
    Admin,
    Primary,
    Bonus,
}

/// Time left until the bonus window closes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cooldown {
    pub hours: i64,
    pub minutes: i64,
    pub remaining_ms: i64,
}

impl Cooldown {
    /// `24h - elapsed`, split into floored hours and minutes
    ///
    /// A grant stamped in the future counts as granted just now.
    pub fn from_elapsed(elapsed_ms: i64) -> Self {
        let remaining_ms = BONUS_WINDOW_MS - elapsed_ms.max(0);
        Self {
            hours: remaining_ms / HOUR_MS,
            minutes: (remaining_ms % HOUR_MS) / MINUTE_MS,
            remaining_ms,
        }
    }
}

/// Outcome of one access check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum AccessDecision {
    Granted {
        via: GrantReason,
    },
    /// The element may become today's bonus once the user confirms
    ConfirmationRequired {
        element: Element,
    },
    /// Today's bonus is already spent on another element
    Denied {
        #[serde(rename = "bonusElement")]
        bonus_element: Element,
        remaining: Cooldown,
    },
    /// Forbidden tier, admins only
    Forbidden,
}

impl AccessDecision {
    pub fn is_granted(&self) -> bool {
        matches!(self, AccessDecision::Granted { .. })
    }

    /// Label used for metrics
    pub fn label(&self) -> &'static str {
        match self {
            AccessDecision::Granted { .. } => "granted",
            AccessDecision::ConfirmationRequired { .. } => "confirmation_required",
            AccessDecision::Denied { .. } => "denied",
            AccessDecision::Forbidden => "forbidden",
        }
    }
}

/// Decide access to `target` at `now` without changing any state
pub fn evaluate(subject: &Subject, target: ElementRef, now: DateTime<Utc>) -> AccessDecision {
    if subject.is_admin {
        return AccessDecision::Granted {
            via: GrantReason::Admin,
        };
    }

    let element = match target {
        ElementRef::Forbidden(_) => return AccessDecision::Forbidden,
        ElementRef::Element(e) => e,
    };

    if subject.primary == Some(element) {
        return AccessDecision::Granted {
            via: GrantReason::Primary,
        };
    }

    match subject.active_bonus(now) {
        None => AccessDecision::ConfirmationRequired { element },
        Some((bonus, _)) if bonus == element => AccessDecision::Granted {
            via: GrantReason::Bonus,
        },
        Some((bonus, elapsed)) => AccessDecision::Denied {
            bonus_element: bonus,
            remaining: Cooldown::from_elapsed(elapsed),
        },
    }
}

/// One row of the home view
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementAccessView {
    pub id: &'static str,
    pub name: &'static str,
    pub icon: &'static str,
    pub access: AccessDecision,
}

/// Access state of every primary element, in display order
pub fn summary(subject: &Subject, now: DateTime<Utc>) -> Vec<ElementAccessView> {
    Element::ALL
        .into_iter()
        .map(|e| ElementAccessView {
            id: e.as_str(),
            name: e.name(),
            icon: e.icon(),
            access: evaluate(subject, ElementRef::Element(e), now),
        })
        .collect()
}

/// Applies the policy and records confirmed bonus grants
pub struct AccessPolicy {
    directory: Arc<AccountDirectory>,
}

impl AccessPolicy {
    pub fn new(directory: Arc<AccountDirectory>) -> Self {
        Self { directory }
    }

    /// Request access to `target`
    ///
    /// A bonus candidate stays `ConfirmationRequired` until called with
    /// `confirm`. The grant itself is decided again by the directory against
    /// the stored account, so `subject` may be stale. Denials come back as
    /// errors carrying the redirect or cooldown.
    pub async fn request(
        &self,
        account_id: Option<&str>,
        subject: &Subject,
        target: ElementRef,
        confirm: bool,
        now: DateTime<Utc>,
    ) -> AppResult<AccessDecision> {
        let mut decision = evaluate(subject, target, now);

        if let (AccessDecision::ConfirmationRequired { element }, true) = (decision, confirm) {
            let id = account_id.ok_or_else(|| {
                AppError::Internal("bonus grant without an account".to_string())
            })?;
            decision = self
                .directory
                .record_bonus_grant(id, element, now)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Account not found: {}", id)))?;
            if decision.is_granted() {
                tracing::info!("account {} used daily access on {}", id, element);
            }
        }

        crate::metrics::record_access_decision(decision.label());

        match decision {
            AccessDecision::Granted { .. } | AccessDecision::ConfirmationRequired { .. } => {
                Ok(decision)
            }
            AccessDecision::Denied {
                bonus_element,
                remaining,
            } => Err(AppError::AccessDenied {
                element: bonus_element.name().to_string(),
                hours: remaining.hours,
                minutes: remaining.minutes,
            }),
            AccessDecision::Forbidden => Err(AppError::forbidden(format!(
                "{} is reserved for administrators",
                target.name()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{account::Account, element::ForbiddenElement, store::Store};
    use chrono::Duration;

    fn user(primary: Option<Element>) -> Subject {
        Subject {
            is_admin: false,
            primary,
            last_bonus_ms: 0,
            bonus_element: None,
        }
    }

    fn with_bonus(primary: Element, at: DateTime<Utc>, bonus: Element) -> Subject {
        Subject {
            is_admin: false,
            primary: Some(primary),
            last_bonus_ms: at.timestamp_millis(),
            bonus_element: Some(bonus),
        }
    }

    #[test]
    fn test_admin_sees_everything() {
        let admin = Subject {
            is_admin: true,
            primary: None,
            last_bonus_ms: 0,
            bonus_element: None,
        };
        let now = Utc::now();
        for e in Element::ALL {
            assert!(evaluate(&admin, ElementRef::Element(e), now).is_granted());
        }
        for f in ForbiddenElement::ALL {
            assert!(evaluate(&admin, ElementRef::Forbidden(f), now).is_granted());
        }
    }

    #[test]
    fn test_primary_always_granted() {
        let now = Utc::now();
        let subjects = [
            user(Some(Element::Fire)),
            with_bonus(Element::Fire, now, Element::Water),
            with_bonus(Element::Fire, now - Duration::hours(30), Element::Water),
        ];
        for subject in subjects {
            assert_eq!(
                evaluate(&subject, ElementRef::Element(Element::Fire), now),
                AccessDecision::Granted {
                    via: GrantReason::Primary
                }
            );
        }
    }

    #[test]
    fn test_zero_state_requires_confirmation() {
        let now = Utc::now();
        let subject = user(Some(Element::Fire));
        assert_eq!(
            evaluate(&subject, ElementRef::Element(Element::Water), now),
            AccessDecision::ConfirmationRequired {
                element: Element::Water
            }
        );
    }

    #[test]
    fn test_active_bonus_same_element_granted() {
        let now = Utc::now();
        let subject = with_bonus(Element::Fire, now - Duration::hours(3), Element::Water);
        assert_eq!(
            evaluate(&subject, ElementRef::Element(Element::Water), now),
            AccessDecision::Granted {
                via: GrantReason::Bonus
            }
        );
    }

    #[test]
    fn test_active_bonus_other_element_denied_with_cooldown() {
        let now = Utc::now();
        let granted = now - Duration::hours(5) - Duration::minutes(20);
        let subject = with_bonus(Element::Fire, granted, Element::Water);

        match evaluate(&subject, ElementRef::Element(Element::Earth), now) {
            AccessDecision::Denied {
                bonus_element,
                remaining,
            } => {
                assert_eq!(bonus_element, Element::Water);
                assert_eq!(remaining.hours, 18);
                assert_eq!(remaining.minutes, 40);
                assert_eq!(
                    remaining.remaining_ms,
                    BONUS_WINDOW_MS - (now.timestamp_millis() - granted.timestamp_millis())
                );
            }
            other => panic!("expected denial, got {:?}", other),
        }
    }

    #[test]
    fn test_expired_bonus_behaves_like_zero_state() {
        let now = Utc::now();
        let exactly_expired = with_bonus(Element::Fire, now - Duration::hours(24), Element::Water);
        let long_expired = with_bonus(Element::Fire, now - Duration::days(3), Element::Water);

        for subject in [exactly_expired, long_expired] {
            assert_eq!(
                evaluate(&subject, ElementRef::Element(Element::Earth), now),
                AccessDecision::ConfirmationRequired {
                    element: Element::Earth
                }
            );
            assert_eq!(
                evaluate(&subject, ElementRef::Element(Element::Water), now),
                AccessDecision::ConfirmationRequired {
                    element: Element::Water
                }
            );
        }
    }

    #[test]
    fn test_forbidden_tier_hard_denied() {
        let now = Utc::now();
        let subject = with_bonus(Element::Fire, now, Element::Water);
        for f in ForbiddenElement::ALL {
            assert_eq!(
                evaluate(&subject, ElementRef::Forbidden(f), now),
                AccessDecision::Forbidden
            );
        }
    }

    #[test]
    fn test_cooldown_split() {
        let c = Cooldown::from_elapsed(BONUS_WINDOW_MS - 90 * MINUTE_MS - 30_000);
        assert_eq!(c.hours, 1);
        assert_eq!(c.minutes, 30);
    }

    #[test]
    fn test_future_grant_cooldown_capped_at_window() {
        let c = Cooldown::from_elapsed(-3 * HOUR_MS);
        assert_eq!(c.remaining_ms, BONUS_WINDOW_MS);
        assert_eq!((c.hours, c.minutes), (24, 0));

        let now = Utc::now();
        let skewed = with_bonus(Element::Fire, now + Duration::hours(2), Element::Water);
        match evaluate(&skewed, ElementRef::Element(Element::Earth), now) {
            AccessDecision::Denied { remaining, .. } => assert_eq!(remaining.hours, 24),
            other => panic!("expected denial, got {:?}", other),
        }
    }

    #[test]
    fn test_summary_marks_each_element() {
        let now = Utc::now();
        let subject = with_bonus(Element::Fire, now - Duration::hours(1), Element::Water);
        let rows = summary(&subject, now);

        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].id, "water");
        assert!(rows[0].access.is_granted());
        assert!(rows[1].access.is_granted());
        assert!(matches!(rows[2].access, AccessDecision::Denied { .. }));
    }

    #[test]
    fn test_summary_wire_shape() {
        let now = Utc::now();
        let subject = with_bonus(Element::Fire, now - Duration::hours(1), Element::Water);
        let json = serde_json::to_value(summary(&subject, now)).unwrap();

        assert_eq!(json[0]["id"], "water");
        assert_eq!(json[0]["access"]["decision"], "granted");
        assert_eq!(json[0]["access"]["via"], "bonus");
        assert_eq!(json[1]["access"]["via"], "primary");
        assert_eq!(json[2]["access"]["decision"], "denied");
        assert_eq!(json[2]["access"]["bonusElement"], "water");
        assert_eq!(json[2]["access"]["remaining"]["hours"], 23);

        let fresh = summary(&user(Some(Element::Fire)), now);
        let json = serde_json::to_value(&fresh).unwrap();
        assert_eq!(json[0]["access"]["decision"], "confirmation_required");
        assert_eq!(json[0]["access"]["element"], "water");
    }

    #[tokio::test]
    async fn test_confirmed_request_records_grant() {
        let directory = Arc::new(AccountDirectory::new(Store::memory(), true));
        let account = Account::new("a@x.com", "pw", Utc::now()).unwrap();
        directory.insert(account.clone()).await.unwrap();
        directory.select_element(&account.id, Element::Fire).await.unwrap();
        let policy = AccessPolicy::new(directory.clone());

        let now = Utc::now();
        let subject = user(Some(Element::Fire));
        let target = ElementRef::Element(Element::Wind);

        // Declined prompt changes nothing
        let pending = policy
            .request(Some(&account.id), &subject, target, false, now)
            .await
            .unwrap();
        assert!(matches!(pending, AccessDecision::ConfirmationRequired { .. }));
        let stored = directory.get(&account.id).await.unwrap().unwrap();
        assert_eq!(stored.last_extra_access_timestamp, 0);

        let granted = policy
            .request(Some(&account.id), &subject, target, true, now)
            .await
            .unwrap();
        assert!(granted.is_granted());
        let stored = directory.get(&account.id).await.unwrap().unwrap();
        assert_eq!(stored.last_extra_access_timestamp, now.timestamp_millis());
        assert_eq!(stored.extra_accessed_element_id, Some(Element::Wind));
    }

    #[tokio::test]
    async fn test_denied_request_is_an_error() {
        let directory = Arc::new(AccountDirectory::new(Store::memory(), true));
        let policy = AccessPolicy::new(directory);
        let now = Utc::now();
        let subject = with_bonus(Element::Fire, now - Duration::hours(2), Element::Water);

        let denied = policy
            .request(Some("id"), &subject, ElementRef::Element(Element::Earth), true, now)
            .await;
        match denied {
            Err(AppError::AccessDenied { hours, .. }) => assert_eq!(hours, 22),
            other => panic!("expected AccessDenied, got {:?}", other),
        }

        let forbidden = policy
            .request(
                Some("id"),
                &subject,
                ElementRef::Forbidden(ForbiddenElement::Hellfire),
                true,
                now,
            )
            .await;
        assert!(matches!(forbidden, Err(AppError::Authorization { .. })));
    }

    #[tokio::test]
    async fn test_concurrent_confirmations_grant_one_bonus() {
        let directory = Arc::new(AccountDirectory::new(Store::memory(), true));
        let account = Account::new("a@x.com", "pw", Utc::now()).unwrap();
        directory.insert(account.clone()).await.unwrap();
        directory.select_element(&account.id, Element::Fire).await.unwrap();
        let policy = AccessPolicy::new(directory.clone());

        // Both requests start from the same pre-grant snapshot
        let now = Utc::now();
        let subject = user(Some(Element::Fire));
        let (water, earth) = tokio::join!(
            policy.request(
                Some(&account.id),
                &subject,
                ElementRef::Element(Element::Water),
                true,
                now
            ),
            policy.request(
                Some(&account.id),
                &subject,
                ElementRef::Element(Element::Earth),
                true,
                now
            ),
        );

        let granted: Vec<Element> = [(Element::Water, &water), (Element::Earth, &earth)]
            .into_iter()
            .filter(|(_, r)| matches!(r, Ok(d) if d.is_granted()))
            .map(|(e, _)| e)
            .collect();
        assert_eq!(granted.len(), 1, "water={:?} earth={:?}", water, earth);
        assert!(
            matches!(water, Err(AppError::AccessDenied { .. }))
                || matches!(earth, Err(AppError::AccessDenied { .. }))
        );

        let stored = directory.get(&account.id).await.unwrap().unwrap();
        assert_eq!(stored.extra_accessed_element_id, Some(granted[0]));
    }

    #[tokio::test]
    async fn test_stale_snapshot_cannot_override_grant() {
        let directory = Arc::new(AccountDirectory::new(Store::memory(), true));
        let account = Account::new("a@x.com", "pw", Utc::now()).unwrap();
        directory.insert(account.clone()).await.unwrap();
        directory.select_element(&account.id, Element::Fire).await.unwrap();
        let policy = AccessPolicy::new(directory.clone());

        let now = Utc::now();
        let stale = user(Some(Element::Fire));
        policy
            .request(Some(&account.id), &stale, ElementRef::Element(Element::Wind), true, now)
            .await
            .unwrap();

        let later = now + Duration::hours(1);
        let result = policy
            .request(Some(&account.id), &stale, ElementRef::Element(Element::Water), true, later)
            .await;
        match result {
            Err(AppError::AccessDenied { hours, .. }) => assert_eq!(hours, 23),
            other => panic!("expected AccessDenied, got {:?}", other),
        }
        let stored = directory.get(&account.id).await.unwrap().unwrap();
        assert_eq!(stored.extra_accessed_element_id, Some(Element::Wind));
    }
}
