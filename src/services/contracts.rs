use jiff::Timestamp;
use rand::Rng;
use thiserror::Error;

use crate::{
    models::{
        contract::{
            Contract, ContractStatus, StatusChangeError, Transition, generate_contract_id,
            signable_url,
        },
        draft::{ContractDraft, ValidationError},
        store::{StatusCounts, Store},
    },
    notifications::{Dispatcher, Notification},
    render::{ContractDocument, Provider, html::render_html},
    storage::{Storage, StorageError},
};

/// Attempts at drawing an unused contract identifier before giving up
const MAX_ID_ATTEMPTS: usize = 32;

#[derive(Debug, Error)]
pub enum CreateContractError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("Could not generate an unused contract identifier")]
    IdentifierExhausted,

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub struct CreateContractParameters<'a> {
    pub draft: ContractDraft,
    pub provider: &'a Provider,
    pub signing_base_url: &'a str,
}

/// Validates the draft, renders the document once and stores the contract as
/// `Draft`. The stored content never changes afterwards.
pub fn create_contract(
    store: &mut Store,
    storage: &impl Storage,
    parameters: CreateContractParameters<'_>,
    now: Timestamp,
    rng: &mut impl Rng,
) -> Result<Contract, CreateContractError> {
    parameters.draft.validate()?;

    let contract_id = (0..MAX_ID_ATTEMPTS)
        .map(|_| generate_contract_id(now, &mut *rng))
        .find(|id| !store.contains_contract_id(id))
        .ok_or(CreateContractError::IdentifierExhausted)?;

    let content = render_html(&ContractDocument {
        contract_id: &contract_id,
        draft: &parameters.draft,
        provider: parameters.provider,
    });
    let url = signable_url(parameters.signing_base_url, &contract_id);
    let contract = Contract::issue(
        parameters.draft,
        parameters.provider.clone(),
        contract_id,
        content,
        url,
        now,
    );

    store.add_contract(contract.clone());

    if let Err(e) = storage.save(store) {
        store.remove_contract(&contract.contract_id);
        return Err(e.into());
    }

    tracing::info!(contract = %contract.contract_id, "Contract created");
    Ok(contract)
}

pub fn list_contracts(store: &Store) -> Vec<&Contract> {
    store.contracts_newest_first()
}

pub fn list_contracts_by_status(store: &Store, status: ContractStatus) -> Vec<&Contract> {
    store.contracts_with_status(status)
}

pub fn get_contract<'a>(store: &'a Store, contract_id: &str) -> Option<&'a Contract> {
    store.get_contract(contract_id)
}

pub fn status_counts(store: &Store) -> StatusCounts {
    store.status_counts()
}

#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("Cannot move contract '{contract}' from {from} to {to}")]
    InvalidTransition {
        contract: String,
        from: ContractStatus,
        to: ContractStatus,
    },

    #[error("Contract '{0}' not found")]
    ContractNotFound(String),

    #[error("Invalid timestamp: {0}")]
    Timestamp(jiff::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub struct TransitionParameters<'a> {
    pub contract_id: &'a str,
    /// Receives a copy of the notification
    pub owner_email: &'a str,
    pub now: Timestamp,
}

/// `Draft -> SentForSigning`. Opens the signing window and notifies the client
/// and owner.
pub fn mark_sent(
    store: &mut Store,
    storage: &impl Storage,
    dispatcher: &Dispatcher,
    parameters: TransitionParameters<'_>,
) -> Result<Contract, TransitionError> {
    let contract = transition(store, storage, Transition::SendForSigning, &parameters)?;
    dispatcher.dispatch(Notification::sent_for_signing(
        &contract,
        parameters.owner_email,
    ));
    Ok(contract)
}

/// `SentForSigning -> Signed`. Signed is terminal.
pub fn mark_signed(
    store: &mut Store,
    storage: &impl Storage,
    dispatcher: &Dispatcher,
    parameters: TransitionParameters<'_>,
) -> Result<Contract, TransitionError> {
    let contract = transition(store, storage, Transition::Sign, &parameters)?;
    dispatcher.dispatch(Notification::signed(&contract, parameters.owner_email));
    Ok(contract)
}

fn transition(
    store: &mut Store,
    storage: &impl Storage,
    transition: Transition,
    parameters: &TransitionParameters<'_>,
) -> Result<Contract, TransitionError> {
    let contract = store
        .get_contract_mut(parameters.contract_id)
        .ok_or_else(|| TransitionError::ContractNotFound(parameters.contract_id.to_string()))?;

    let previous = contract.clone();
    contract
        .apply(transition, parameters.now)
        .map_err(|e| match e {
            StatusChangeError::NotAllowed { from, to } => TransitionError::InvalidTransition {
                contract: previous.contract_id.clone(),
                from,
                to,
            },
            StatusChangeError::WindowOutOfRange(e) => TransitionError::Timestamp(e),
        })?;
    let updated = contract.clone();

    if let Err(e) = storage.save(store) {
        if let Some(contract) = store.get_contract_mut(&previous.contract_id) {
            *contract = previous;
        }
        return Err(e.into());
    }

    tracing::info!(
        contract = %updated.contract_id,
        status = %updated.status,
        "Contract status changed"
    );
    Ok(updated)
}

#[derive(Debug, Error)]
pub enum DeleteContractError {
    #[error("Contract '{0}' not found")]
    ContractNotFound(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub fn delete_contract(
    store: &mut Store,
    storage: &impl Storage,
    contract_id: &str,
) -> Result<Contract, DeleteContractError> {
    let index = store
        .contracts
        .iter()
        .position(|c| c.contract_id.eq_ignore_ascii_case(contract_id))
        .ok_or_else(|| DeleteContractError::ContractNotFound(contract_id.to_string()))?;
    let contract = store.contracts.remove(index);

    if let Err(e) = storage.save(store) {
        store.contracts.insert(index, contract);
        return Err(e.into());
    }

    tracing::info!(contract = %contract.contract_id, "Contract deleted");
    Ok(contract)
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::{
        models::draft::{SectionKey, ServiceField, ServiceOption, TextField},
        notifications::tests::{FailingNotifier, RecordingNotifier},
        render::layout::{Primitive, render_paginated},
        storage::memory::MemoryStorage,
    };

    const BASE_URL: &str = "https://contracts.example.com/sign/";

    fn now() -> Timestamp {
        "2025-01-15T10:30:00Z".parse().unwrap()
    }

    fn valid_draft() -> ContractDraft {
        let mut draft = ContractDraft::seeded("2025-01-15".parse().unwrap());
        draft.set_text(TextField::ClientName, "Jane Doe").unwrap();
        draft.set_text(TextField::ClientEmail, "jane@example.com").unwrap();
        draft.set_text(TextField::ProjectName, "Redesign").unwrap();
        draft.set_text(TextField::TotalCost, "5000").unwrap();
        draft
    }

    fn create(store: &mut Store, storage: &MemoryStorage, rng: &mut StdRng) -> Contract {
        let provider = Provider::default();
        create_contract(
            store,
            storage,
            CreateContractParameters {
                draft: valid_draft(),
                provider: &provider,
                signing_base_url: BASE_URL,
            },
            now(),
            rng,
        )
        .unwrap()
    }

    fn params(contract_id: &str, now: Timestamp) -> TransitionParameters<'_> {
        TransitionParameters {
            contract_id,
            owner_email: "owner@example.com",
            now,
        }
    }

    fn quiet_dispatcher() -> (Arc<RecordingNotifier>, Dispatcher) {
        let notifier = Arc::new(RecordingNotifier::default());
        let dispatcher = Dispatcher::new(notifier.clone(), Duration::ZERO);
        (notifier, dispatcher)
    }

    #[test]
    fn test_create_contract_stores_draft_with_snapshot() {
        let mut store = Store::default();
        let storage = MemoryStorage::default();
        let mut rng = StdRng::seed_from_u64(7);

        let contract = create(&mut store, &storage, &mut rng);

        assert_eq!(contract.status, ContractStatus::Draft);
        assert!(contract.contract_id.starts_with("CTR-"));
        assert_eq!(
            contract.signable_url,
            format!("https://contracts.example.com/sign/{}", contract.contract_id)
        );
        assert!(contract.content.contains("Jane Doe"));
        assert!(contract.content.contains(&contract.contract_id));
        assert_eq!(storage.load().unwrap().contracts.len(), 1);
    }

    #[test]
    fn test_create_rejects_missing_client_name() {
        let mut store = Store::default();
        let storage = MemoryStorage::default();
        let mut draft = valid_draft();
        draft.client.name = "  ".to_string();

        let result = create_contract(
            &mut store,
            &storage,
            CreateContractParameters {
                draft,
                provider: &Provider::default(),
                signing_base_url: BASE_URL,
            },
            now(),
            &mut StdRng::seed_from_u64(1),
        );

        match result {
            Err(CreateContractError::Validation(ValidationError::MissingFields(fields))) => {
                assert_eq!(fields, vec!["client name"]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
        assert!(store.contracts.is_empty());
        assert!(storage.saved.borrow().is_none());
    }

    #[test]
    fn test_identifiers_are_unique() {
        let mut store = Store::default();
        let storage = MemoryStorage::default();
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..50 {
            create(&mut store, &storage, &mut rng);
        }

        let mut ids: Vec<&str> = store.contracts.iter().map(|c| c.contract_id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 50);
    }

    #[test]
    fn test_failed_save_does_not_keep_new_contract() {
        let mut store = Store::default();
        let storage = MemoryStorage::default();
        storage.fail_saves.set(true);

        let result = create_contract(
            &mut store,
            &storage,
            CreateContractParameters {
                draft: valid_draft(),
                provider: &Provider::default(),
                signing_base_url: BASE_URL,
            },
            now(),
            &mut StdRng::seed_from_u64(3),
        );

        assert!(matches!(result, Err(CreateContractError::Storage(_))));
        assert!(store.contracts.is_empty());
    }

    #[test]
    fn test_full_lifecycle() {
        let mut store = Store::default();
        let storage = MemoryStorage::default();
        let (notifier, dispatcher) = quiet_dispatcher();
        let contract = create(&mut store, &storage, &mut StdRng::seed_from_u64(5));
        let id = contract.contract_id.clone();

        let sent_at: Timestamp = "2025-01-16T09:00:00Z".parse().unwrap();
        let sent = mark_sent(&mut store, &storage, &dispatcher, params(&id, sent_at)).unwrap();
        assert_eq!(sent.status, ContractStatus::SentForSigning);
        assert_eq!(sent.sent_at, Some(sent_at));
        assert_eq!(
            sent.expires_at,
            Some("2025-02-15T09:00:00Z".parse().unwrap())
        );

        let signed_at: Timestamp = "2025-01-20T12:00:00Z".parse().unwrap();
        let signed = mark_signed(&mut store, &storage, &dispatcher, params(&id, signed_at)).unwrap();
        assert_eq!(signed.status, ContractStatus::Signed);
        assert_eq!(signed.signed_at, Some(signed_at));
        assert_eq!(signed.content, contract.content);

        dispatcher.wait();
        let received = notifier.received.lock().unwrap();
        assert_eq!(received.len(), 2);
        assert!(received.iter().all(|n| n.recipients
            == vec!["jane@example.com".to_string(), "owner@example.com".to_string()]));

        let persisted = storage.load().unwrap();
        assert_eq!(persisted.contracts[0].status, ContractStatus::Signed);
    }

    #[test]
    fn test_signed_is_terminal() {
        let mut store = Store::default();
        let storage = MemoryStorage::default();
        let (_, dispatcher) = quiet_dispatcher();
        let id = create(&mut store, &storage, &mut StdRng::seed_from_u64(5)).contract_id;

        mark_sent(&mut store, &storage, &dispatcher, params(&id, now())).unwrap();
        mark_signed(&mut store, &storage, &dispatcher, params(&id, now())).unwrap();

        for result in [
            mark_sent(&mut store, &storage, &dispatcher, params(&id, now())),
            mark_signed(&mut store, &storage, &dispatcher, params(&id, now())),
        ] {
            match result {
                Err(TransitionError::InvalidTransition { from, .. }) => {
                    assert_eq!(from, ContractStatus::Signed)
                }
                other => panic!("expected invalid transition, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_sign_requires_sent() {
        let mut store = Store::default();
        let storage = MemoryStorage::default();
        let (notifier, dispatcher) = quiet_dispatcher();
        let id = create(&mut store, &storage, &mut StdRng::seed_from_u64(9)).contract_id;

        let result = mark_signed(&mut store, &storage, &dispatcher, params(&id, now()));

        assert!(matches!(
            result,
            Err(TransitionError::InvalidTransition {
                from: ContractStatus::Draft,
                to: ContractStatus::Signed,
                ..
            })
        ));
        assert_eq!(store.get_contract(&id).unwrap().status, ContractStatus::Draft);
        dispatcher.wait();
        assert!(notifier.received.lock().unwrap().is_empty());
    }

    #[test]
    fn test_unknown_contract() {
        let mut store = Store::default();
        let storage = MemoryStorage::default();
        let (_, dispatcher) = quiet_dispatcher();

        let result = mark_sent(&mut store, &storage, &dispatcher, params("CTR-NOPE", now()));

        assert!(matches!(result, Err(TransitionError::ContractNotFound(id)) if id == "CTR-NOPE"));
    }

    #[test]
    fn test_failed_save_reverts_transition() {
        let mut store = Store::default();
        let storage = MemoryStorage::default();
        let (notifier, dispatcher) = quiet_dispatcher();
        let id = create(&mut store, &storage, &mut StdRng::seed_from_u64(11)).contract_id;

        storage.fail_saves.set(true);
        let result = mark_sent(&mut store, &storage, &dispatcher, params(&id, now()));

        assert!(matches!(result, Err(TransitionError::Storage(_))));
        let contract = store.get_contract(&id).unwrap();
        assert_eq!(contract.status, ContractStatus::Draft);
        assert_eq!(contract.sent_at, None);
        assert_eq!(contract.expires_at, None);
        dispatcher.wait();
        assert!(notifier.received.lock().unwrap().is_empty());
    }

    #[test]
    fn test_notification_failure_does_not_fail_transition() {
        let mut store = Store::default();
        let storage = MemoryStorage::default();
        let dispatcher = Dispatcher::new(Arc::new(FailingNotifier), Duration::ZERO);
        let id = create(&mut store, &storage, &mut StdRng::seed_from_u64(13)).contract_id;

        let sent = mark_sent(&mut store, &storage, &dispatcher, params(&id, now())).unwrap();
        dispatcher.wait();

        assert_eq!(sent.status, ContractStatus::SentForSigning);
        assert_eq!(
            store.get_contract(&id).unwrap().status,
            ContractStatus::SentForSigning
        );
    }

    #[test]
    fn test_lookup_ignores_case() {
        let mut store = Store::default();
        let storage = MemoryStorage::default();
        let id = create(&mut store, &storage, &mut StdRng::seed_from_u64(17)).contract_id;

        assert!(get_contract(&store, &id.to_lowercase()).is_some());
        assert!(get_contract(&store, "CTR-MISSING").is_none());
    }

    #[test]
    fn test_list_and_counts() {
        let mut store = Store::default();
        let storage = MemoryStorage::default();
        let (_, dispatcher) = quiet_dispatcher();
        let mut rng = StdRng::seed_from_u64(19);
        let first = create(&mut store, &storage, &mut rng).contract_id;
        let second = create(&mut store, &storage, &mut rng).contract_id;
        create(&mut store, &storage, &mut rng);

        mark_sent(&mut store, &storage, &dispatcher, params(&first, now())).unwrap();
        mark_sent(&mut store, &storage, &dispatcher, params(&second, now())).unwrap();
        mark_signed(&mut store, &storage, &dispatcher, params(&second, now())).unwrap();

        assert_eq!(list_contracts(&store).len(), 3);
        let sent = list_contracts_by_status(&store, ContractStatus::SentForSigning);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].contract_id, first);
        assert_eq!(
            status_counts(&store),
            StatusCounts {
                draft: 1,
                sent_for_signing: 1,
                signed: 1
            }
        );
    }

    #[test]
    fn test_snapshot_reflects_draft_at_creation() {
        let mut store = Store::default();
        let storage = MemoryStorage::default();
        let mut draft = valid_draft();
        draft.services.website_design = true;
        draft.set_service(ServiceField::Option(ServiceOption::CustomMockups), true);
        draft.set_section(SectionKey::Timeline, false);

        let contract = create_contract(
            &mut store,
            &storage,
            CreateContractParameters {
                draft,
                provider: &Provider::default(),
                signing_base_url: BASE_URL,
            },
            now(),
            &mut StdRng::seed_from_u64(23),
        )
        .unwrap();

        assert!(contract.content.contains("Website Design (Custom Design Mockups)"));
        assert!(!contract.content.contains("MILESTONES"));
    }

    #[test]
    fn test_issued_document_keeps_issuing_provider() {
        let mut store = Store::default();
        let storage = MemoryStorage::default();
        let issuing = Provider {
            name: "Acme Studio".to_string(),
            location: "Austin, TX".to_string(),
            email: "hello@acme.test".to_string(),
        };

        let created = create_contract(
            &mut store,
            &storage,
            CreateContractParameters {
                draft: valid_draft(),
                provider: &issuing,
                signing_base_url: BASE_URL,
            },
            now(),
            &mut StdRng::seed_from_u64(31),
        )
        .unwrap();

        // A later run loads the store under a config naming another provider
        let reloaded = storage.load().unwrap();
        let contract = get_contract(&reloaded, &created.contract_id).unwrap();
        assert_eq!(contract.provider, issuing);

        let pages = render_paginated(&ContractDocument::issued(contract)).unwrap();
        let texts: Vec<&str> = pages
            .iter()
            .flat_map(|page| &page.primitives)
            .filter_map(|p| match p {
                Primitive::Text(run) => Some(run.text.as_str()),
                _ => None,
            })
            .collect();

        let default_name = Provider::default().name;
        assert!(texts.iter().any(|text| text.contains("Acme Studio")));
        assert!(!texts.iter().any(|text| text.contains(&default_name)));
        assert!(contract.content.contains("Acme Studio"));
    }

    #[test]
    fn test_delete_contract() {
        let mut store = Store::default();
        let storage = MemoryStorage::default();
        let mut rng = StdRng::seed_from_u64(29);
        let id = create(&mut store, &storage, &mut rng).contract_id;
        create(&mut store, &storage, &mut rng);

        storage.fail_saves.set(true);
        assert!(matches!(
            delete_contract(&mut store, &storage, &id),
            Err(DeleteContractError::Storage(_))
        ));
        assert_eq!(store.contracts[0].contract_id, id);

        storage.fail_saves.set(false);
        delete_contract(&mut store, &storage, &id).unwrap();
        assert!(get_contract(&store, &id).is_none());
        assert!(matches!(
            delete_contract(&mut store, &storage, &id),
            Err(DeleteContractError::ContractNotFound(_))
        ));
    }
}
