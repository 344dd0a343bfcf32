//! Trigger policies for deciding when synthesis runs
//!
//! A policy looks at the per-provider responses of a turn and answers one
//! question: fire synthesis now, keep waiting, or give up on synthesis and
//! fall back to the best individual response.

use crate::core::error::DomainError;
use crate::core::provider::ProviderId;
use crate::response::ProviderResponse;
use serde::{Deserialize, Serialize};

/// Rule for deciding when the synthesis call is dispatched
///
/// - `Required(set)`: every provider in the set must succeed (default
///   `{deepseek, gemini}`)
/// - `AllSettled`: wait for every dispatched provider, fire if any succeeded
/// - `AtLeast(n)`: fire as soon as `n` providers have succeeded
///
/// # Example
///
/// ```
/// use superai_domain::aggregation::policy::TriggerPolicy;
///
/// let policy: TriggerPolicy = "atleast:2".parse().unwrap();
/// assert_eq!(policy, TriggerPolicy::AtLeast(2));
/// assert_eq!(TriggerPolicy::default().to_string(), "required:deepseek,gemini");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TriggerPolicy {
    /// Every listed provider must have succeeded
    Required(Vec<ProviderId>),

    /// Every dispatched provider has settled and at least one succeeded
    AllSettled,

    /// At least n providers succeeded
    AtLeast(usize),
}

/// What a policy concludes from the current responses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerDecision {
    Wait,
    Fire,
    Suppress,
}

impl Default for TriggerPolicy {
    fn default() -> Self {
        TriggerPolicy::Required(vec![ProviderId::DeepSeek, ProviderId::Gemini])
    }
}

impl TriggerPolicy {
    /// Decide from the current per-provider entries
    pub fn evaluate(&self, responses: &[ProviderResponse]) -> TriggerDecision {
        match self {
            TriggerPolicy::Required(required) => {
                let status_of = |id: &ProviderId| responses.iter().find(|r| &r.provider == id);

                if required
                    .iter()
                    .filter_map(status_of)
                    .any(|r| r.is_permanent_failure())
                {
                    return TriggerDecision::Suppress;
                }

                let all_succeeded = !required.is_empty()
                    && required
                        .iter()
                        .all(|id| status_of(id).is_some_and(|r| r.is_success()));
                if all_succeeded {
                    TriggerDecision::Fire
                } else {
                    TriggerDecision::Wait
                }
            }
            TriggerPolicy::AllSettled => {
                if responses.iter().any(|r| r.is_pending()) {
                    TriggerDecision::Wait
                } else if responses.iter().any(|r| r.is_success()) {
                    TriggerDecision::Fire
                } else if responses.is_empty() {
                    TriggerDecision::Wait
                } else {
                    TriggerDecision::Suppress
                }
            }
            TriggerPolicy::AtLeast(n) => {
                let successes = count(responses, |r| r.is_success());
                if successes >= *n {
                    return TriggerDecision::Fire;
                }
                let outstanding = count(responses, |r| r.is_pending() || r.is_transient_failure());
                if !responses.is_empty() && successes + outstanding < *n {
                    TriggerDecision::Suppress
                } else {
                    TriggerDecision::Wait
                }
            }
        }
    }

    /// Providers that must succeed for this policy, if it names any
    pub fn required_providers(&self) -> &[ProviderId] {
        match self {
            TriggerPolicy::Required(ids) => ids,
            _ => &[],
        }
    }

    /// Required providers that are not among `dispatched`
    ///
    /// A turn that leaves any of these out can never fire synthesis and will
    /// settle on the fallback answer.
    pub fn missing_required(&self, dispatched: &[ProviderId]) -> Vec<ProviderId> {
        self.required_providers()
            .iter()
            .filter(|id| !dispatched.contains(id))
            .cloned()
            .collect()
    }

    /// Get a human-readable description of this policy
    pub fn description(&self) -> String {
        match self {
            TriggerPolicy::Required(ids) => {
                let names: Vec<&str> = ids.iter().map(|id| id.display_name()).collect();
                format!("when {} have answered", names.join(" and "))
            }
            TriggerPolicy::AllSettled => "when every provider has settled".to_string(),
            TriggerPolicy::AtLeast(n) => format!("after at least {} successful responses", n),
        }
    }
}

fn count(responses: &[ProviderResponse], pred: impl Fn(&ProviderResponse) -> bool) -> usize {
    responses.iter().filter(|r| pred(r)).count()
}

impl std::fmt::Display for TriggerPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TriggerPolicy::Required(ids) => {
                let names: Vec<&str> = ids.iter().map(|id| id.as_str()).collect();
                write!(f, "required:{}", names.join(","))
            }
            TriggerPolicy::AllSettled => write!(f, "all"),
            TriggerPolicy::AtLeast(n) => write!(f, "atleast:{}", n),
        }
    }
}

impl std::str::FromStr for TriggerPolicy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        match lowered.as_str() {
            "all" | "all_settled" | "allsettled" => Ok(TriggerPolicy::AllSettled),
            s if s.starts_with("atleast:") || s.starts_with("at_least:") => {
                let n: usize = s
                    .split(':')
                    .nth(1)
                    .unwrap_or_default()
                    .trim()
                    .parse()
                    .map_err(|_| DomainError::InvalidPolicy(format!("invalid count in '{}'", s)))?;
                if n == 0 {
                    return Err(DomainError::InvalidPolicy(
                        "atleast needs a count of 1 or more".to_string(),
                    ));
                }
                Ok(TriggerPolicy::AtLeast(n))
            }
            s if s.starts_with("required:") => {
                let mut ids: Vec<ProviderId> = Vec::new();
                for name in s.trim_start_matches("required:").split(',') {
                    let name = name.trim();
                    if name.is_empty() {
                        continue;
                    }
                    let id = ProviderId::from(name);
                    if !ids.contains(&id) {
                        ids.push(id);
                    }
                }
                if ids.is_empty() {
                    return Err(DomainError::InvalidPolicy(
                        "required: needs at least one provider".to_string(),
                    ));
                }
                Ok(TriggerPolicy::Required(ids))
            }
            _ => Err(DomainError::InvalidPolicy(format!(
                "Unknown trigger policy: {}. Valid: required:<providers>, all, atleast:N",
                s
            ))),
        }
    }
}

impl TryFrom<String> for TriggerPolicy {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<TriggerPolicy> for String {
    fn from(policy: TriggerPolicy) -> Self {
        policy.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::{ErrorKind, ProviderError};

    fn ok(id: ProviderId) -> ProviderResponse {
        ProviderResponse::succeeded(id, "answer")
    }

    fn fail(id: ProviderId, kind: ErrorKind) -> ProviderResponse {
        ProviderResponse::failed(id, &ProviderError::new(kind, "boom"))
    }

    #[test]
    fn test_required_fires_when_all_required_succeed() {
        let policy = TriggerPolicy::default();
        let mut responses = vec![
            ProviderResponse::pending(ProviderId::Gpt),
            ok(ProviderId::Gemini),
            ProviderResponse::pending(ProviderId::DeepSeek),
        ];
        assert_eq!(policy.evaluate(&responses), TriggerDecision::Wait);

        responses[2] = ok(ProviderId::DeepSeek);
        assert_eq!(policy.evaluate(&responses), TriggerDecision::Fire);
    }

    #[test]
    fn test_required_suppressed_on_permanent_failure() {
        let policy = TriggerPolicy::default();
        let responses = vec![
            fail(ProviderId::Gemini, ErrorKind::Auth),
            ProviderResponse::pending(ProviderId::DeepSeek),
        ];
        assert_eq!(policy.evaluate(&responses), TriggerDecision::Suppress);
    }

    #[test]
    fn test_required_waits_on_transient_failure() {
        let policy = TriggerPolicy::default();
        let responses = vec![
            fail(ProviderId::Gemini, ErrorKind::RateLimited),
            ok(ProviderId::DeepSeek),
        ];
        assert_eq!(policy.evaluate(&responses), TriggerDecision::Wait);
    }

    #[test]
    fn test_all_settled() {
        let policy = TriggerPolicy::AllSettled;
        let mut responses = vec![ok(ProviderId::Gpt), ProviderResponse::pending(ProviderId::Claude)];
        assert_eq!(policy.evaluate(&responses), TriggerDecision::Wait);

        responses[1] = fail(ProviderId::Claude, ErrorKind::Auth);
        assert_eq!(policy.evaluate(&responses), TriggerDecision::Fire);

        let none = vec![fail(ProviderId::Gpt, ErrorKind::Auth)];
        assert_eq!(policy.evaluate(&none), TriggerDecision::Suppress);
        assert_eq!(policy.evaluate(&[]), TriggerDecision::Wait);
    }

    #[test]
    fn test_at_least() {
        let policy = TriggerPolicy::AtLeast(2);
        let responses = vec![
            ok(ProviderId::Gpt),
            fail(ProviderId::Claude, ErrorKind::UpstreamUnavailable),
            ProviderResponse::pending(ProviderId::Gemini),
        ];
        assert_eq!(policy.evaluate(&responses), TriggerDecision::Wait);

        let responses = vec![
            ok(ProviderId::Gpt),
            fail(ProviderId::Claude, ErrorKind::Auth),
            fail(ProviderId::Gemini, ErrorKind::NotFound),
        ];
        assert_eq!(policy.evaluate(&responses), TriggerDecision::Suppress);

        let responses = vec![ok(ProviderId::Gpt), ok(ProviderId::Llama)];
        assert_eq!(policy.evaluate(&responses), TriggerDecision::Fire);
    }

    #[test]
    fn test_missing_required() {
        let policy = TriggerPolicy::default();
        assert_eq!(
            policy.missing_required(&[ProviderId::Gpt, ProviderId::Gemini]),
            vec![ProviderId::DeepSeek]
        );
        assert!(
            policy
                .missing_required(&[ProviderId::DeepSeek, ProviderId::Gemini])
                .is_empty()
        );
        assert!(TriggerPolicy::AtLeast(2).missing_required(&[]).is_empty());
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("all".parse::<TriggerPolicy>().unwrap(), TriggerPolicy::AllSettled);
        assert_eq!(
            "ATLEAST:3".parse::<TriggerPolicy>().unwrap(),
            TriggerPolicy::AtLeast(3)
        );
        assert_eq!(
            "required: deepseek, google, deepseek".parse::<TriggerPolicy>().unwrap(),
            TriggerPolicy::Required(vec![ProviderId::DeepSeek, ProviderId::Gemini])
        );
        assert!("atleast:0".parse::<TriggerPolicy>().is_err());
        assert!("required:".parse::<TriggerPolicy>().is_err());
        assert!("majority".parse::<TriggerPolicy>().is_err());
    }

    #[test]
    fn test_policy_display_roundtrip() {
        for policy in [
            TriggerPolicy::default(),
            TriggerPolicy::AllSettled,
            TriggerPolicy::AtLeast(2),
        ] {
            let parsed: TriggerPolicy = policy.to_string().parse().unwrap();
            assert_eq!(parsed, policy);
        }
    }

    #[test]
    fn test_policy_serde_as_string() {
        let json = serde_json::to_string(&TriggerPolicy::AtLeast(2)).unwrap();
        assert_eq!(json, "\"atleast:2\"");
        let back: TriggerPolicy = serde_json::from_str("\"all\"").unwrap();
        assert_eq!(back, TriggerPolicy::AllSettled);
    }
}
