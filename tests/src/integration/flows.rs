//! # Integration Test Flows
//!
//! Multi-step scenarios where each step is validated, then applied, and the
//! next step sees the committed result:
//!
//! 1. **Name service**: contract creation, preorder, top-level and
//!    second-level registration, then the rejections a live name service
//!    must produce.
//! 2. **Contacts**: the core-height window of contact requests.
//! 3. **Determinism**: concurrent validation of one batch yields one verdict.

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use futures::future::join_all;
    use k256::ecdsa::SigningKey;
    use serde_json::json;

    use dp_01_transition_validation::fixtures;
    use dp_01_transition_validation::prelude::*;
    use dp_01_transition_validation::triggers::domain::{
        domain_name_hash, full_domain_name, salted_domain_hash, SALTED_DOMAIN_HASH_FIELD,
    };
    use dp_01_transition_validation::triggers::{
        ContactsTriggerConfig, NameServiceTriggerConfig, CONTACT_REQUEST_DOCUMENT_TYPE,
        DOMAIN_DOCUMENT_TYPE, PREORDER_DOCUMENT_TYPE,
    };

    use crate::init_tracing;

    const TOP: Identifier = Identifier::new([0xA1; 32]);
    const ALICE: Identifier = Identifier::new([0xA2; 32]);
    const BOB: Identifier = Identifier::new([0xA3; 32]);

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    struct Network {
        repository: Arc<InMemoryStateRepository>,
        validator: BatchValidator<InMemoryStateRepository, EcdsaSigner>,
        keys: BTreeMap<Identifier, SigningKey>,
    }

    impl Network {
        fn new(config: ServiceConfig) -> Self {
            init_tracing();
            let repository = Arc::new(InMemoryStateRepository::new());
            let mut keys = BTreeMap::new();
            for (seed, id) in [(1u8, TOP), (2, ALICE), (3, BOB)] {
                let key = fixtures::signing_key(seed).unwrap();
                repository.insert_identity(fixtures::identity(id, &key));
                keys.insert(id, key);
            }
            let validator = BatchValidator::new(
                Arc::clone(&repository),
                Arc::new(EcdsaSigner::new()),
                config,
            )
            .unwrap();
            Self {
                repository,
                validator,
                keys,
            }
        }

        fn signed(&self, owner: Identifier, mut transition: StateTransition) -> StateTransition {
            fixtures::sign(&mut transition, &self.keys[&owner]).unwrap();
            transition
        }

        async fn validate(
            &self,
            owner: Identifier,
            transitions: Vec<DocumentTransition>,
        ) -> ValidationResult {
            let transition = self.signed(owner, fixtures::documents_batch(owner, transitions));
            self.validator.validate_transition(&transition).await.unwrap()
        }

        /// Validates, asserts acceptance, applies.
        async fn commit(&self, transition: StateTransition) {
            let result = self.validator.validate_transition(&transition).await.unwrap();
            assert!(result.is_valid(), "rejected: {:?}", result.errors());
            self.validator.apply_transition(&transition).await.unwrap();
        }

        async fn commit_batch(&self, owner: Identifier, transitions: Vec<DocumentTransition>) {
            let transition = self.signed(owner, fixtures::documents_batch(owner, transitions));
            self.commit(transition).await;
        }
    }

    fn codes(result: &ValidationResult) -> Vec<u32> {
        result.errors().iter().map(ConsensusError::code).collect()
    }

    fn condition_messages(result: &ValidationResult) -> Vec<String> {
        result
            .errors()
            .iter()
            .filter_map(|error| match error {
                ConsensusError::State(StateError::DataTriggerCondition { message, .. }) => {
                    Some(message.clone())
                }
                _ => None,
            })
            .collect()
    }

    // =============================================================================
    // NAME SERVICE
    // =============================================================================

    struct NameService {
        network: Network,
        contract: DataContract,
    }

    /// A registration request: the preorder to commit first, then the domain.
    struct Registration {
        preorder: DocumentTransition,
        domain: DocumentTransition,
    }

    impl NameService {
        async fn deploy() -> Self {
            let entropy = [0x51; 32];
            let contract = fixtures::name_service_contract(TOP, entropy);
            let mut config = ServiceConfig::default();
            config.triggers.name_service = Some(NameServiceTriggerConfig {
                contract_id: contract.id,
                top_level_identity: TOP,
            });
            let network = Network::new(config);

            let create = network.signed(TOP, fixtures::data_contract_create(contract.clone(), entropy));
            network.commit(create).await;
            Self { network, contract }
        }

        fn registration(&self, owner: Identifier, label: &str, parent: &str, seed: u8) -> Registration {
            let normalized = label.to_lowercase();
            let name_hash = domain_name_hash(&full_domain_name(&normalized, parent));
            let salt = [seed; 8];
            let salted = salted_domain_hash(&salt, &hex::decode(&name_hash).unwrap());

            let preorder = fixtures::create_transition(
                self.contract.id,
                owner,
                PREORDER_DOCUMENT_TYPE,
                [seed; 32],
                fixtures::data(&[(SALTED_DOMAIN_HASH_FIELD, json!(salted))]),
            );
            let domain = fixtures::create_transition(
                self.contract.id,
                owner,
                DOMAIN_DOCUMENT_TYPE,
                [seed.wrapping_add(0x80); 32],
                fixtures::data(&[
                    ("label", json!(label)),
                    ("normalizedLabel", json!(normalized)),
                    ("normalizedParentDomainName", json!(parent)),
                    ("nameHash", json!(name_hash)),
                    ("preorderSalt", json!(hex::encode(salt))),
                    ("records", json!({ "identity": owner.to_hex() })),
                ]),
            );
            Registration { preorder, domain }
        }

        async fn register(&self, owner: Identifier, label: &str, parent: &str, seed: u8) -> DocumentTransition {
            let registration = self.registration(owner, label, parent, seed);
            self.network
                .commit_batch(owner, vec![registration.preorder])
                .await;
            self.network
                .commit_batch(owner, vec![registration.domain.clone()])
                .await;
            registration.domain
        }
    }

    #[tokio::test]
    async fn test_name_registration_flow() {
        let ns = NameService::deploy().await;
        ns.register(TOP, "dash", "", 1).await;
        let alice = ns.register(ALICE, "Alice", "dash", 2).await;

        let stored = ns
            .network
            .repository
            .get_document(&ns.contract.id, DOMAIN_DOCUMENT_TYPE, &alice.id())
            .unwrap();
        assert_eq!(stored.owner_id, ALICE);
        assert_eq!(stored.get_str("normalizedLabel"), Some("alice"));
    }

    #[tokio::test]
    async fn test_taken_name_collides_on_unique_index() {
        let ns = NameService::deploy().await;
        ns.register(TOP, "dash", "", 1).await;
        ns.register(ALICE, "alice", "dash", 2).await;

        let bob = ns.registration(BOB, "ALICE", "dash", 3);
        ns.network.commit_batch(BOB, vec![bob.preorder]).await;

        let result = ns.network.validate(BOB, vec![bob.domain]).await;
        assert_eq!(codes(&result), vec![4009]);
    }

    #[tokio::test]
    async fn test_only_top_level_identity_registers_top_level_names() {
        let ns = NameService::deploy().await;
        let bob = ns.registration(BOB, "bob", "", 4);
        ns.network.commit_batch(BOB, vec![bob.preorder]).await;

        let result = ns.network.validate(BOB, vec![bob.domain]).await;
        assert_eq!(
            condition_messages(&result),
            vec!["Can't create top level domain for this identity"]
        );
    }

    #[tokio::test]
    async fn test_registration_without_preorder_or_parent() {
        let ns = NameService::deploy().await;
        let orphan = ns.registration(ALICE, "alice", "missing", 5);

        let result = ns.network.validate(ALICE, vec![orphan.domain]).await;
        assert_eq!(
            condition_messages(&result),
            vec!["Parent domain is not present", "preorderDocument was not found"]
        );
    }

    #[tokio::test]
    async fn test_registered_names_are_immutable() {
        let ns = NameService::deploy().await;
        ns.register(TOP, "dash", "", 1).await;
        let alice = ns.register(ALICE, "alice", "dash", 2).await;

        let delete = fixtures::delete_transition(ns.contract.id, DOMAIN_DOCUMENT_TYPE, alice.id(), 2);
        let result = ns.network.validate(ALICE, vec![delete]).await;
        assert_eq!(condition_messages(&result), vec!["Delete action is not allowed"]);

        // the document survives
        assert!(ns
            .network
            .repository
            .get_document(&ns.contract.id, DOMAIN_DOCUMENT_TYPE, &alice.id())
            .is_some());
    }

    // =============================================================================
    // CONTACTS
    // =============================================================================

    fn contacts_contract() -> DataContract {
        let mut documents = BTreeMap::new();
        documents.insert(
            CONTACT_REQUEST_DOCUMENT_TYPE.to_string(),
            DocumentTypeDefinition::default(),
        );
        DataContract {
            id: generate_data_contract_id(&TOP, &[0x61; 32]),
            owner_id: TOP,
            documents,
        }
    }

    #[tokio::test]
    async fn test_contact_request_core_height_window() {
        let contract = contacts_contract();
        let mut config = ServiceConfig::default();
        config.triggers.contacts = Some(ContactsTriggerConfig {
            contract_id: contract.id,
        });
        let network = Network::new(config);
        network.repository.insert_data_contract(contract.clone());
        network.repository.set_latest_block_header(BlockHeader {
            height: 42,
            time_ms: 1_700_000_000_000,
            core_chain_locked_height: 100,
        });

        let request = |seed: u8, height: u64| {
            fixtures::create_transition(
                contract.id,
                ALICE,
                CONTACT_REQUEST_DOCUMENT_TYPE,
                [seed; 32],
                fixtures::data(&[("coreHeightCreatedAt", json!(height))]),
            )
        };

        let result = network.validate(ALICE, vec![request(1, 97)]).await;
        assert!(result.is_valid());

        let result = network
            .validate(ALICE, vec![request(2, 104), request(3, 90)])
            .await;
        assert_eq!(
            condition_messages(&result),
            vec!["Core height 90 is out of block height window from 95 to 105"]
        );
    }

    // =============================================================================
    // DETERMINISM
    // =============================================================================

    #[tokio::test]
    async fn test_concurrent_validation_is_deterministic() {
        let network = Network::new(ServiceConfig::default());
        let contract = fixtures::profile_contract(ALICE, [0x71; 32]);
        network.repository.insert_data_contract(contract.clone());

        let profile = |seed: u8, email: &str| {
            fixtures::create_transition(
                contract.id,
                ALICE,
                "profile",
                [seed; 32],
                fixtures::data(&[("email", json!(email))]),
            )
        };
        let committed = profile(1, "a@example.com");
        network.commit_batch(ALICE, vec![committed.clone()]).await;

        // one committed collision, one in-batch collision
        let transition = network.signed(
            ALICE,
            fixtures::documents_batch(
                ALICE,
                vec![
                    profile(2, "a@example.com"),
                    profile(3, "b@example.com"),
                    profile(4, "b@example.com"),
                ],
            ),
        );

        let runs = join_all((0..16).map(|_| network.validator.validate_transition(&transition))).await;
        let verdicts: Vec<Vec<ConsensusError>> = runs
            .into_iter()
            .map(|result| result.unwrap().errors().to_vec())
            .collect();

        assert_eq!(
            verdicts[0].iter().map(ConsensusError::code).collect::<Vec<_>>(),
            vec![1020, 4009]
        );
        assert!(verdicts.iter().all(|verdict| *verdict == verdicts[0]));
    }
}
