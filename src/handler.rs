use chrono::{DateTime, NaiveDate, Utc};

use crate::claims::{claim_types, Principal};
use crate::requirement::Requirement;
use crate::resource::Resource;

/// A handler's verdict on a single requirement.
///
/// Handlers may vote to satisfy a requirement or abstain; they can never
/// vote to fail one. Absence of a satisfying vote is denial (fail-closed),
/// so a missing or malformed claim always maps to `Abstain`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vote {
    Succeed,
    Abstain,
}

/// Everything a handler may inspect during one evaluation.
///
/// `now` is sampled once per `evaluate` call, so all time-dependent
/// handlers within a single evaluation agree on the current instant and
/// tests can pin it through the evaluator's clock.
pub struct EvaluationContext<'a> {
    pub principal: &'a Principal,
    pub resource: Option<&'a dyn Resource>,
    pub now: DateTime<Utc>,
}

/// Evaluates one requirement kind, optionally scoped to a resource kind.
///
/// Implementations must be side-effect free and safe to invoke concurrently;
/// any configuration is fixed at construction.
pub trait Handler: Send + Sync {
    fn evaluate(&self, cx: &EvaluationContext<'_>, requirement: &Requirement) -> Vote;
}

/// Satisfies [`Requirement::Role`] when the principal holds a role claim
/// whose value is in the allowed set, regardless of issuer.
#[derive(Debug, Default)]
pub struct RoleHandler;

impl Handler for RoleHandler {
    fn evaluate(&self, cx: &EvaluationContext<'_>, requirement: &Requirement) -> Vote {
        let Requirement::Role { allowed } = requirement else {
            return Vote::Abstain;
        };
        if cx.principal.has_claim(|c| {
            c.claim_type == claim_types::ROLE && allowed.iter().any(|r| *r == c.value)
        }) {
            Vote::Succeed
        } else {
            Vote::Abstain
        }
    }
}

/// Satisfies [`Requirement::Claim`] when the principal holds a claim of the
/// configured type with a value in the accepted set. An empty accepted set
/// accepts any value of that type.
#[derive(Debug, Default)]
pub struct ClaimValueHandler;

impl Handler for ClaimValueHandler {
    fn evaluate(&self, cx: &EvaluationContext<'_>, requirement: &Requirement) -> Vote {
        let Requirement::Claim {
            claim_type,
            accepted,
        } = requirement
        else {
            return Vote::Abstain;
        };
        if cx.principal.has_claim(|c| {
            c.claim_type == *claim_type
                && (accepted.is_empty() || accepted.iter().any(|v| *v == c.value))
        }) {
            Vote::Succeed
        } else {
            Vote::Abstain
        }
    }
}

/// Satisfies [`Requirement::MinimumAge`] when the principal's date-of-birth
/// claim puts them at or above the configured age in whole calendar years.
///
/// No date-of-birth claim, or one that does not parse as `YYYY-MM-DD`,
/// abstains.
#[derive(Debug, Default)]
pub struct MinimumAgeHandler;

impl Handler for MinimumAgeHandler {
    fn evaluate(&self, cx: &EvaluationContext<'_>, requirement: &Requirement) -> Vote {
        let Requirement::MinimumAge { years } = requirement else {
            return Vote::Abstain;
        };
        let Some(claim) = cx
            .principal
            .first_claim(|c| c.claim_type == claim_types::DATE_OF_BIRTH)
        else {
            return Vote::Abstain;
        };
        let date_of_birth = match NaiveDate::parse_from_str(&claim.value, "%Y-%m-%d") {
            Ok(d) => d,
            Err(err) => {
                tracing::warn!(value = %claim.value, %err, "unparseable date_of_birth claim");
                return Vote::Abstain;
            }
        };
        // years_since is None when the birth date lies in the future
        match cx.now.date_naive().years_since(date_of_birth) {
            Some(age) if age >= *years => Vote::Succeed,
            _ => Vote::Abstain,
        }
    }
}

/// Satisfies [`Requirement::OfficeEntry`] when the principal carries an
/// unexpired temporary badge issued by the expected issuer.
///
/// The expiry bound is exclusive: a pass expiring exactly now abstains.
#[derive(Debug)]
pub struct TemporaryPassHandler {
    issuer: String,
}

impl TemporaryPassHandler {
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
        }
    }
}

impl Handler for TemporaryPassHandler {
    fn evaluate(&self, cx: &EvaluationContext<'_>, requirement: &Requirement) -> Vote {
        if !matches!(requirement, Requirement::OfficeEntry) {
            return Vote::Abstain;
        }
        let Some(claim) = cx.principal.first_claim(|c| {
            c.claim_type == claim_types::TEMPORARY_BADGE_EXPIRY && c.issuer == self.issuer
        }) else {
            return Vote::Abstain;
        };
        let expiry = match DateTime::parse_from_rfc3339(&claim.value) {
            Ok(t) => t.with_timezone(&Utc),
            Err(err) => {
                tracing::warn!(value = %claim.value, %err, "unparseable temporary badge expiry");
                return Vote::Abstain;
            }
        };
        if expiry > cx.now {
            Vote::Succeed
        } else {
            Vote::Abstain
        }
    }
}

/// Satisfies [`Requirement::OfficeEntry`] when the principal carries a
/// badge-number claim from the expected issuer, whatever its value.
#[derive(Debug)]
pub struct BadgeHandler {
    issuer: String,
}

impl BadgeHandler {
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
        }
    }
}

impl Handler for BadgeHandler {
    fn evaluate(&self, cx: &EvaluationContext<'_>, requirement: &Requirement) -> Vote {
        if !matches!(requirement, Requirement::OfficeEntry) {
            return Vote::Abstain;
        }
        if cx
            .principal
            .has_claim(|c| c.claim_type == claim_types::BADGE_NUMBER && c.issuer == self.issuer)
        {
            Vote::Succeed
        } else {
            Vote::Abstain
        }
    }
}

/// Satisfies [`Requirement::ResourceOwner`] when the owner field of a
/// resource of type `R` textually equals the principal's configured claim
/// (name for personally owned resources, company for corporate ones).
///
/// Registered under the resource kind, so it is only ever invoked when a
/// resource is supplied; an absent resource or one of another concrete type
/// abstains.
pub struct ResourceOwnerHandler<R: 'static> {
    claim_type: String,
    owner_of: fn(&R) -> &str,
}

impl<R: 'static> ResourceOwnerHandler<R> {
    pub fn new(claim_type: impl Into<String>, owner_of: fn(&R) -> &str) -> Self {
        Self {
            claim_type: claim_type.into(),
            owner_of,
        }
    }
}

impl<R: Send + Sync + 'static> Handler for ResourceOwnerHandler<R> {
    fn evaluate(&self, cx: &EvaluationContext<'_>, requirement: &Requirement) -> Vote {
        if !matches!(requirement, Requirement::ResourceOwner) {
            return Vote::Abstain;
        }
        let Some(resource) = cx.resource.and_then(|r| r.as_any().downcast_ref::<R>()) else {
            return Vote::Abstain;
        };
        let owner = (self.owner_of)(resource);
        if cx
            .principal
            .first_claim(|c| c.claim_type == self.claim_type)
            .is_some_and(|c| c.value == owner)
        {
            Vote::Succeed
        } else {
            Vote::Abstain
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claims::{Claim, Identity};
    use chrono::TimeZone;

    const BADGE_ISSUER: &str = "https://badges.example.com";

    fn principal_with(claims: Vec<Claim>) -> Principal {
        let mut identity = Identity::authenticated("test");
        for claim in claims {
            identity.add_claim(claim);
        }
        Principal::new(identity)
    }

    fn cx<'a>(principal: &'a Principal, now: DateTime<Utc>) -> EvaluationContext<'a> {
        EvaluationContext {
            principal,
            resource: None,
            now,
        }
    }

    fn noon(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_role_handler_matches_any_issuer() {
        let p = principal_with(vec![Claim::with_issuer(
            claim_types::ROLE,
            "Administrator",
            "https://elsewhere.example.com",
        )]);
        let req = Requirement::Role {
            allowed: vec!["Administrator".into()],
        };
        assert_eq!(RoleHandler.evaluate(&cx(&p, Utc::now()), &req), Vote::Succeed);
    }

    #[test]
    fn test_role_handler_abstains_without_role() {
        let p = principal_with(vec![Claim::new(claim_types::NAME, "barry")]);
        let req = Requirement::Role {
            allowed: vec!["Administrator".into()],
        };
        assert_eq!(RoleHandler.evaluate(&cx(&p, Utc::now()), &req), Vote::Abstain);
    }

    #[test]
    fn test_claim_value_handler() {
        let p = principal_with(vec![Claim::new(claim_types::EMPLOYEE_ID, "123")]);
        let req = Requirement::Claim {
            claim_type: claim_types::EMPLOYEE_ID.into(),
            accepted: vec!["123".into(), "456".into()],
        };
        assert_eq!(
            ClaimValueHandler.evaluate(&cx(&p, Utc::now()), &req),
            Vote::Succeed
        );

        let wrong = Requirement::Claim {
            claim_type: claim_types::EMPLOYEE_ID.into(),
            accepted: vec!["789".into()],
        };
        assert_eq!(
            ClaimValueHandler.evaluate(&cx(&p, Utc::now()), &wrong),
            Vote::Abstain
        );
    }

    #[test]
    fn test_claim_value_handler_empty_accepted_matches_any() {
        let p = principal_with(vec![Claim::new(claim_types::EMPLOYEE_ID, "anything")]);
        let req = Requirement::Claim {
            claim_type: claim_types::EMPLOYEE_ID.into(),
            accepted: vec![],
        };
        assert_eq!(
            ClaimValueHandler.evaluate(&cx(&p, Utc::now()), &req),
            Vote::Succeed
        );
    }

    #[test]
    fn test_minimum_age_boundary() {
        let p = principal_with(vec![Claim::new(claim_types::DATE_OF_BIRTH, "2000-06-08")]);
        let req = Requirement::MinimumAge { years: 21 };

        // 21st birthday: exactly 21 -> succeed
        assert_eq!(
            MinimumAgeHandler.evaluate(&cx(&p, noon(2021, 6, 8)), &req),
            Vote::Succeed
        );
        // one day short of the 21st birthday: 20 -> abstain
        assert_eq!(
            MinimumAgeHandler.evaluate(&cx(&p, noon(2021, 6, 7)), &req),
            Vote::Abstain
        );
    }

    #[test]
    fn test_minimum_age_missing_claim_abstains() {
        let p = principal_with(vec![]);
        let req = Requirement::MinimumAge { years: 21 };
        assert_eq!(
            MinimumAgeHandler.evaluate(&cx(&p, Utc::now()), &req),
            Vote::Abstain
        );
    }

    #[test]
    fn test_minimum_age_malformed_claim_abstains() {
        let p = principal_with(vec![Claim::new(claim_types::DATE_OF_BIRTH, "not a date")]);
        let req = Requirement::MinimumAge { years: 21 };
        assert_eq!(
            MinimumAgeHandler.evaluate(&cx(&p, Utc::now()), &req),
            Vote::Abstain
        );
    }

    #[test]
    fn test_temporary_pass_boundaries() {
        let now = noon(2024, 3, 1);
        let handler = TemporaryPassHandler::new(BADGE_ISSUER);
        let req = Requirement::OfficeEntry;

        let pass_at = |expiry: &str| {
            let p = principal_with(vec![Claim::with_issuer(
                claim_types::TEMPORARY_BADGE_EXPIRY,
                expiry,
                BADGE_ISSUER,
            )]);
            handler.evaluate(&cx(&p, now), &req)
        };

        // one second in the future
        assert_eq!(pass_at("2024-03-01T12:00:01Z"), Vote::Succeed);
        // exactly now: bound is exclusive
        assert_eq!(pass_at("2024-03-01T12:00:00Z"), Vote::Abstain);
        // one second in the past
        assert_eq!(pass_at("2024-03-01T11:59:59Z"), Vote::Abstain);
    }

    #[test]
    fn test_temporary_pass_wrong_issuer_abstains() {
        let handler = TemporaryPassHandler::new(BADGE_ISSUER);
        let p = principal_with(vec![Claim::with_issuer(
            claim_types::TEMPORARY_BADGE_EXPIRY,
            "2099-01-01T00:00:00Z",
            "https://forged.example.com",
        )]);
        assert_eq!(
            handler.evaluate(&cx(&p, Utc::now()), &Requirement::OfficeEntry),
            Vote::Abstain
        );
    }

    #[test]
    fn test_temporary_pass_malformed_expiry_abstains() {
        let handler = TemporaryPassHandler::new(BADGE_ISSUER);
        let p = principal_with(vec![Claim::with_issuer(
            claim_types::TEMPORARY_BADGE_EXPIRY,
            "next tuesday",
            BADGE_ISSUER,
        )]);
        assert_eq!(
            handler.evaluate(&cx(&p, Utc::now()), &Requirement::OfficeEntry),
            Vote::Abstain
        );
    }

    #[test]
    fn test_badge_handler_ignores_value() {
        let handler = BadgeHandler::new(BADGE_ISSUER);
        let p = principal_with(vec![Claim::with_issuer(
            claim_types::BADGE_NUMBER,
            "whatever-1234",
            BADGE_ISSUER,
        )]);
        assert_eq!(
            handler.evaluate(&cx(&p, Utc::now()), &Requirement::OfficeEntry),
            Vote::Succeed
        );

        let no_badge = principal_with(vec![]);
        assert_eq!(
            handler.evaluate(&cx(&no_badge, Utc::now()), &Requirement::OfficeEntry),
            Vote::Abstain
        );
    }

    struct Memo {
        author: String,
    }

    impl Resource for Memo {
        fn resource_kind(&self) -> &'static str {
            "memo"
        }
        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    }

    #[test]
    fn test_resource_owner_handler() {
        let handler =
            ResourceOwnerHandler::<Memo>::new(claim_types::NAME, |m| m.author.as_str());
        let p = principal_with(vec![Claim::new(claim_types::NAME, "barry")]);

        let own = Memo {
            author: "barry".into(),
        };
        let cx_own = EvaluationContext {
            principal: &p,
            resource: Some(&own),
            now: Utc::now(),
        };
        assert_eq!(
            handler.evaluate(&cx_own, &Requirement::ResourceOwner),
            Vote::Succeed
        );

        let other = Memo {
            author: "someoneelse".into(),
        };
        let cx_other = EvaluationContext {
            principal: &p,
            resource: Some(&other),
            now: Utc::now(),
        };
        assert_eq!(
            handler.evaluate(&cx_other, &Requirement::ResourceOwner),
            Vote::Abstain
        );
    }

    #[test]
    fn test_resource_owner_handler_abstains_without_resource() {
        let handler =
            ResourceOwnerHandler::<Memo>::new(claim_types::NAME, |m| m.author.as_str());
        let p = principal_with(vec![Claim::new(claim_types::NAME, "barry")]);
        assert_eq!(
            handler.evaluate(&cx(&p, Utc::now()), &Requirement::ResourceOwner),
            Vote::Abstain
        );
    }

    #[test]
    fn test_handlers_abstain_on_foreign_requirement() {
        let p = principal_with(vec![Claim::new(claim_types::ROLE, "Administrator")]);
        let foreign = Requirement::OfficeEntry;
        assert_eq!(
            RoleHandler.evaluate(&cx(&p, Utc::now()), &foreign),
            Vote::Abstain
        );
    }
}
