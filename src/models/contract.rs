use std::fmt;

use jiff::{SignedDuration, Timestamp};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{models::draft::ContractDraft, render::Provider};

/// How long a client has to sign once a contract is sent
pub const SIGNING_WINDOW_DAYS: i64 = 30;

const BASE36_DIGITS: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Contract {
    /// Persisted id, opaque to users
    pub id: Uuid,
    /// Human-facing identifier, `CTR-<time>-<random>`
    pub contract_id: String,
    /// Frozen copy of the draft the contract was issued from
    pub draft: ContractDraft,
    /// Issuing party at creation; later config changes do not apply
    #[serde(default)]
    pub provider: Provider,
    /// HTML rendered when the contract was issued
    pub content: String,
    pub status: ContractStatus,
    pub signable_url: String,
    pub created_at: Timestamp,
    pub sent_at: Option<Timestamp>,
    pub expires_at: Option<Timestamp>,
    pub signed_at: Option<Timestamp>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContractStatus {
    #[default]
    Draft,
    SentForSigning,
    Signed,
}

impl ContractStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ContractStatus::Draft => "draft",
            ContractStatus::SentForSigning => "sent_for_signing",
            ContractStatus::Signed => "signed",
        }
    }
}

impl fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The only two forward moves a contract can make.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    SendForSigning,
    Sign,
}

impl Transition {
    pub fn source(self) -> ContractStatus {
        match self {
            Transition::SendForSigning => ContractStatus::Draft,
            Transition::Sign => ContractStatus::SentForSigning,
        }
    }

    pub fn target(self) -> ContractStatus {
        match self {
            Transition::SendForSigning => ContractStatus::SentForSigning,
            Transition::Sign => ContractStatus::Signed,
        }
    }
}

#[derive(Debug, Error)]
pub enum StatusChangeError {
    #[error("Cannot move a contract from {from} to {to}")]
    NotAllowed {
        from: ContractStatus,
        to: ContractStatus,
    },

    #[error("Signing window falls outside the supported time range: {0}")]
    WindowOutOfRange(#[from] jiff::Error),
}

impl Contract {
    pub fn issue(
        draft: ContractDraft,
        provider: Provider,
        contract_id: String,
        content: String,
        signable_url: String,
        now: Timestamp,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            contract_id,
            draft,
            provider,
            content,
            status: ContractStatus::Draft,
            signable_url,
            created_at: now,
            sent_at: None,
            expires_at: None,
            signed_at: None,
        }
    }

    /// Applies `transition` if the contract is in its source state. On error
    /// the contract is left untouched.
    pub fn apply(&mut self, transition: Transition, now: Timestamp) -> Result<(), StatusChangeError> {
        if self.status != transition.source() {
            return Err(StatusChangeError::NotAllowed {
                from: self.status,
                to: transition.target(),
            });
        }

        match transition {
            Transition::SendForSigning => {
                let expires_at =
                    now.checked_add(SignedDuration::from_hours(SIGNING_WINDOW_DAYS * 24))?;
                self.sent_at = Some(now);
                self.expires_at = Some(expires_at);
            }
            Transition::Sign => {
                self.signed_at = Some(now);
            }
        }
        self.status = transition.target();

        Ok(())
    }

    /// Sent, unsigned and past its expiration date
    pub fn is_signing_overdue(&self, now: Timestamp) -> bool {
        self.status == ContractStatus::SentForSigning
            && self.expires_at.is_some_and(|expires_at| expires_at < now)
    }
}

/// Builds `CTR-<base36 milliseconds>-<five base36 random digits>`.
pub fn generate_contract_id(now: Timestamp, rng: &mut impl Rng) -> String {
    let millis = u64::try_from(now.as_millisecond()).unwrap_or(0);
    let suffix: String = (0..5)
        .map(|_| char::from(BASE36_DIGITS[rng.random_range(0..BASE36_DIGITS.len())]))
        .collect();

    format!("CTR-{}-{}", to_base36(millis), suffix)
}

pub fn signable_url(base_url: &str, contract_id: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), contract_id)
}

fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }

    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36_DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();

    String::from_utf8(digits).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    fn sample_contract() -> Contract {
        Contract::issue(
            ContractDraft::default(),
            Provider::default(),
            "CTR-TEST-00001".to_string(),
            String::new(),
            signable_url("https://sign.example.com/", "CTR-TEST-00001"),
            Timestamp::UNIX_EPOCH,
        )
    }

    #[test]
    fn test_to_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "Z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(1_700_000_000_000), "LOYW3V28");
    }

    #[test]
    fn test_generate_contract_id_format() {
        let mut rng = StdRng::seed_from_u64(7);
        let now: Timestamp = "2024-01-01T00:00:00Z".parse().unwrap();
        let id = generate_contract_id(now, &mut rng);

        let parts: Vec<&str> = id.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "CTR");
        assert_eq!(parts[1], to_base36(now.as_millisecond() as u64));
        assert_eq!(parts[2].len(), 5);
        assert!(parts[2].bytes().all(|b| BASE36_DIGITS.contains(&b)));
    }

    #[test]
    fn test_signable_url_is_derived_from_identifier() {
        assert_eq!(
            signable_url("https://sign.example.com/", "CTR-1-ABCDE"),
            "https://sign.example.com/CTR-1-ABCDE"
        );
    }

    #[test]
    fn test_send_sets_thirty_day_window() {
        let mut contract = sample_contract();
        let now: Timestamp = "2025-01-15T10:30:00Z".parse().unwrap();

        contract.apply(Transition::SendForSigning, now).unwrap();

        assert_eq!(contract.status, ContractStatus::SentForSigning);
        assert_eq!(contract.sent_at, Some(now));
        assert_eq!(
            contract.expires_at,
            Some("2025-02-14T10:30:00Z".parse().unwrap())
        );
        assert_eq!(contract.signed_at, None);
    }

    #[test]
    fn test_sign_requires_sent_contract() {
        let mut contract = sample_contract();
        let before = contract.clone();

        let result = contract.apply(Transition::Sign, Timestamp::UNIX_EPOCH);

        assert!(matches!(
            result,
            Err(StatusChangeError::NotAllowed {
                from: ContractStatus::Draft,
                to: ContractStatus::Signed
            })
        ));
        assert_eq!(contract, before);
    }

    #[test]
    fn test_signed_is_terminal() {
        let mut contract = sample_contract();
        let now = Timestamp::UNIX_EPOCH;
        contract.apply(Transition::SendForSigning, now).unwrap();
        contract.apply(Transition::Sign, now).unwrap();

        assert!(contract.apply(Transition::Sign, now).is_err());
        assert!(contract.apply(Transition::SendForSigning, now).is_err());
        assert_eq!(contract.status, ContractStatus::Signed);
    }

    #[test]
    fn test_signing_overdue_only_while_pending() {
        let mut contract = sample_contract();
        let sent: Timestamp = "2025-01-01T00:00:00Z".parse().unwrap();
        let later: Timestamp = "2025-03-01T00:00:00Z".parse().unwrap();

        assert!(!contract.is_signing_overdue(later));
        contract.apply(Transition::SendForSigning, sent).unwrap();
        assert!(contract.is_signing_overdue(later));
        contract.apply(Transition::Sign, later).unwrap();
        assert!(!contract.is_signing_overdue(later));
    }
}
