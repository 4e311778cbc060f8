use std::sync::Arc;
use std::time::Duration;

use agenda_core::Action;
use agenda_core::Contact;
use agenda_core::ContactDraft;
use agenda_core::ContactId;
use agenda_core::ContactOperations;
use agenda_core::DeleteOutcome;
use agenda_core::HttpAgendaClient;
use agenda_core::LoadState;
use agenda_core::OperationError;
use agenda_core::Store;
use agenda_core::operations::OperationKind;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;
use wiremock::matchers::body_json;
use wiremock::matchers::method;
use wiremock::matchers::path;

const CONTACTS_PATH: &str = "/agendas/test_agenda/contacts";

fn operations_for(server: &MockServer, store: Store) -> ContactOperations {
    let client = HttpAgendaClient::new(server.uri(), "test_agenda");
    ContactOperations::new(Arc::new(client), store)
}

fn contact(id: u64, name: &str) -> Contact {
    Contact {
        id: ContactId(id),
        name: name.to_string(),
        email: "a@x.com".to_string(),
        phone: None,
        address: None,
        image_url: None,
    }
}

fn draft(name: &str) -> ContactDraft {
    ContactDraft {
        name: name.to_string(),
        email: "a@x.com".to_string(),
        ..Default::default()
    }
}

fn store_with(contacts: Vec<Contact>) -> Store {
    let store = Store::new();
    store.dispatch(Action::Load(contacts));
    store
}

#[tokio::test]
async fn load_populates_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CONTACTS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "contacts": [
                {"id": 1, "name": "Ana", "email": "a@x.com"},
                {"id": 2, "name": "Bo", "email": "b@x.com"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ops = operations_for(&server, Store::new());
    assert_eq!(ops.load().await, LoadState::Ready { count: 2 });

    let cache = ops.store().snapshot();
    assert_eq!(cache.contacts[0].name, "Ana");
    assert_eq!(cache.contacts[1].name, "Bo");
    assert_eq!(cache.message, None);
}

#[tokio::test]
async fn load_of_missing_agenda_creates_it_and_yields_empty_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CONTACTS_PATH))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Agenda not found"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/agendas/test_agenda"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"slug": "test_agenda"})))
        .expect(1)
        .mount(&server)
        .await;

    let ops = operations_for(&server, store_with(vec![contact(9, "Stale")]));

    assert_eq!(ops.load().await, LoadState::Ready { count: 0 });
    assert!(ops.store().snapshot().is_empty());
}

#[tokio::test]
async fn failed_agenda_creation_is_a_load_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CONTACTS_PATH))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/agendas/test_agenda"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let ops = operations_for(&server, Store::new());
    let err = ops.try_load().await.unwrap_err();
    assert!(matches!(err, OperationError::AgendaCreation(_)), "got {err:?}");

    match ops.load().await {
        LoadState::Failed { message } => assert!(message.contains("agenda could not be created")),
        other => panic!("expected failure, got {other:?}"),
    }
}

#[tokio::test]
async fn load_failure_keeps_last_known_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CONTACTS_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let store = store_with(vec![contact(1, "Ana")]);
    let before = store.snapshot();
    let ops = operations_for(&server, store);

    match ops.load().await {
        LoadState::Failed { message } => assert!(message.starts_with("Error loading contacts")),
        other => panic!("expected failure, got {other:?}"),
    }
    assert_eq!(ops.store().snapshot(), before);
}

#[tokio::test]
async fn create_adds_server_record_and_sets_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CONTACTS_PATH))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({"id": 77, "name": "Ana", "email": "a@x.com"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let ops = operations_for(&server, store_with(vec![contact(1, "Bo")]));
    let created = ops.create(&draft("  Ana  ")).await.unwrap();

    assert_eq!(created.id, ContactId(77));
    let cache = ops.store().snapshot();
    let ids: Vec<ContactId> = cache.contacts.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![ContactId(1), ContactId(77)]);
    assert!(cache.message.unwrap().contains("Ana"));
}

#[tokio::test]
async fn invalid_draft_never_reaches_the_service() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CONTACTS_PATH))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let ops = operations_for(&server, Store::new());
    let bad = ContactDraft {
        name: "A".to_string(),
        email: "not-an-email".to_string(),
        ..Default::default()
    };

    let err = ops.create(&bad).await.unwrap_err();
    match err {
        OperationError::Validation(errors) => assert_eq!(errors.len(), 2),
        other => panic!("expected validation error, got {other:?}"),
    }
    assert_eq!(ops.store().snapshot(), Store::new().snapshot());
}

#[tokio::test]
async fn failed_create_leaves_cache_untouched() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CONTACTS_PATH))
        .respond_with(ResponseTemplate::new(422).set_body_string("bad"))
        .expect(1)
        .mount(&server)
        .await;

    let store = store_with(vec![contact(1, "Bo")]);
    let before = store.snapshot();
    let ops = operations_for(&server, store);

    let err = ops.create(&draft("Ana")).await.unwrap_err();
    assert_eq!(err.user_message(), "Error saving contact");
    assert_eq!(ops.store().snapshot(), before);
    assert!(!ops.is_in_flight(OperationKind::Create));
}

#[tokio::test]
async fn update_replaces_cached_record() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(format!("{CONTACTS_PATH}/1")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"id": 1, "name": "Ana B", "email": "a@x.com"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let ops = operations_for(&server, store_with(vec![contact(1, "Ana"), contact(2, "Bo")]));
    let mut edit = ops.draft_for(ContactId(1)).unwrap();
    assert_eq!(edit.name, "Ana");
    edit.name = "Ana B".to_string();

    ops.update(ContactId(1), &edit).await.unwrap();

    let cache = ops.store().snapshot();
    assert_eq!(cache.contacts[0].name, "Ana B");
    assert_eq!(cache.contacts[1], contact(2, "Bo"));
    assert!(cache.message.unwrap().contains("Ana B"));
}

#[tokio::test]
async fn edit_with_blank_image_clears_it() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(format!("{CONTACTS_PATH}/1")))
        .and(body_json(json!({
            "name": "Ana",
            "email": "a@x.com",
            "phone": "",
            "address": "",
            "image_url": ""
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(
                json!({"id": 1, "name": "Ana", "email": "a@x.com", "image_url": ""}),
            ),
        )
        .expect(1)
        .mount(&server)
        .await;

    let with_image = Contact {
        image_url: Some("https://x.com/old.png".to_string()),
        ..contact(1, "Ana")
    };
    let ops = operations_for(&server, store_with(vec![with_image]));
    let mut edit = ops.draft_for(ContactId(1)).unwrap();
    edit.image_url = Some(String::new());

    ops.update(ContactId(1), &edit).await.unwrap();

    assert_eq!(ops.store().snapshot().contacts[0].image_url, None);
}

#[tokio::test]
async fn declined_delete_makes_no_call() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let ops = operations_for(&server, store_with(vec![contact(1, "Ana")]));
    let outcome = ops.delete(ContactId(1), &false).await.unwrap();

    assert_eq!(outcome, DeleteOutcome::Cancelled);
    assert_eq!(ops.store().snapshot().len(), 1);
}

#[tokio::test]
async fn confirmed_delete_removes_record_using_local_name() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(format!("{CONTACTS_PATH}/1")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let ops = operations_for(&server, store_with(vec![contact(1, "Ana"), contact(2, "Bo")]));
    let outcome = ops.delete(ContactId(1), &true).await.unwrap();

    assert_eq!(
        outcome,
        DeleteOutcome::Deleted {
            id: ContactId(1),
            name: Some("Ana".to_string())
        }
    );
    let cache = ops.store().snapshot();
    assert_eq!(cache.contacts, vec![contact(2, "Bo")]);
    assert!(cache.message.unwrap().contains("Ana"));
}

#[tokio::test]
async fn failed_delete_keeps_record() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(format!("{CONTACTS_PATH}/1")))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let ops = operations_for(&server, store_with(vec![contact(1, "Ana")]));
    let err = ops.delete(ContactId(1), &true).await.unwrap_err();

    assert_eq!(err.user_message(), "Error deleting contact");
    assert_eq!(ops.store().snapshot().contacts, vec![contact(1, "Ana")]);
}

#[tokio::test]
async fn duplicate_submit_is_rejected_while_in_flight() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CONTACTS_PATH))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({"id": 5, "name": "Ana", "email": "a@x.com"}))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let ops = operations_for(&server, Store::new());
    let first_draft = draft("Ana");
    let second_draft = draft("Ana");
    let (first, second) = tokio::join!(ops.create(&first_draft), ops.create(&second_draft));

    assert_eq!(first.unwrap().id, ContactId(5));
    assert!(matches!(
        second.unwrap_err(),
        OperationError::InFlight(OperationKind::Create)
    ));
    assert_eq!(ops.store().snapshot().len(), 1);
}

#[tokio::test]
async fn independent_updates_run_concurrently() {
    let server = MockServer::start().await;
    for (id, name) in [(1, "Ana B"), (2, "Bo B")] {
        Mock::given(method("PUT"))
            .and(path(format!("{CONTACTS_PATH}/{id}")))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"id": id, "name": name, "email": "a@x.com"}))
                    .set_delay(Duration::from_millis(50)),
            )
            .expect(1)
            .mount(&server)
            .await;
    }

    let ops = operations_for(&server, store_with(vec![contact(1, "Ana"), contact(2, "Bo")]));
    let (ana, bo) = (draft("Ana B"), draft("Bo B"));
    let (a, b) = tokio::join!(ops.update(ContactId(1), &ana), ops.update(ContactId(2), &bo));
    a.unwrap();
    b.unwrap();

    let names: Vec<String> = ops
        .store()
        .snapshot()
        .contacts
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, vec!["Ana B".to_string(), "Bo B".to_string()]);
}

#[tokio::test]
async fn add_update_delete_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CONTACTS_PATH))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(json!({"id": 1, "name": "Ana", "email": "a@x.com"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("{CONTACTS_PATH}/1")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"id": 1, "name": "Ana B", "email": "a@x.com"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(format!("{CONTACTS_PATH}/1")))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let ops = operations_for(&server, Store::new());

    ops.create(&draft("Ana")).await.unwrap();
    let cache = ops.store().snapshot();
    assert_eq!(cache.contacts, vec![contact(1, "Ana")]);
    assert!(cache.message.unwrap().contains("Ana"));

    ops.update(ContactId(1), &draft("Ana B")).await.unwrap();
    assert_eq!(ops.store().snapshot().contacts[0].name, "Ana B");

    ops.delete(ContactId(1), &true).await.unwrap();
    let cache = ops.store().snapshot();
    assert!(cache.is_empty());
    assert!(cache.message.as_deref().unwrap().contains("Ana B"));

    ops.clear_message();
    assert_eq!(ops.store().snapshot().message, None);
}
