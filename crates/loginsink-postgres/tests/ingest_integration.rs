#![cfg(feature = "integration-tests")]

use loginsink_domain::{
    DeadLetterRepository, LoginIngestService, LoginRecord, LoginRecordRepository, RawMessage,
    RecordFailureInput,
};
use loginsink_postgres::{
    PostgresClient, PostgresConfig, PostgresDeadLetterRepository, PostgresLoginRecordRepository,
};
use std::sync::Arc;
use testcontainers::runners::AsyncRunner;
use testcontainers::ContainerAsync;
use testcontainers_modules::postgres::Postgres;

const CREATE_USER_LOGINS: &str = "CREATE TABLE user_logins (
    user_id          varchar(128),
    device_type      varchar(32),
    masked_ip        varchar(256),
    masked_device_id varchar(256),
    locale           varchar(32),
    app_version      varchar(32),
    create_date      timestamptz
)";

async fn setup_test_db() -> (ContainerAsync<Postgres>, PostgresClient) {
    let postgres = Postgres::default().start().await.unwrap();
    let host = postgres.get_host().await.unwrap();
    let port = postgres.get_host_port_ipv4(5432).await.unwrap();

    let config = PostgresConfig {
        host: host.to_string(),
        port,
        ..Default::default()
    };
    let client = PostgresClient::connect(&config).expect("failed to create client");

    // user_logins is assumed provisioned in production; error_records is
    // created on demand by the dead-letter repository.
    let conn = client.get_connection().await.unwrap();
    conn.execute(CREATE_USER_LOGINS, &[]).await.unwrap();

    (postgres, client)
}

fn ingest_service(client: &PostgresClient) -> LoginIngestService {
    LoginIngestService::new(
        Arc::new(PostgresLoginRecordRepository::new(client.clone())),
        Arc::new(PostgresDeadLetterRepository::new(client.clone())),
    )
}

async fn count(client: &PostgresClient, table: &str) -> i64 {
    let conn = client.get_connection().await.unwrap();
    let row = conn
        .query_one(&format!("SELECT count(*) FROM {table}"), &[])
        .await
        .unwrap();
    row.get(0)
}

#[tokio::test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
async fn login_record_round_trip() {
    let (_container, client) = setup_test_db().await;
    let repository = PostgresLoginRecordRepository::new(client.clone());

    let record = LoginRecord {
        user_id: "u-42".to_string(),
        device_type: "android".to_string(),
        masked_ip: "d861b7e91033ebc1c1e8e7af3929010158b3241b54ca87ef73e79c32f26400ec"
            .to_string(),
        masked_device_id: "f65a5b250b6fdc53b33518b4c6a8c2775623a6e9b29b112576a2ccae2e92790f"
            .to_string(),
        locale: "de-DE".to_string(),
        app_version: "2.3.0".to_string(),
        create_date: chrono::Utc::now(),
    };

    repository.insert_login(&record).await.unwrap();

    let conn = client.get_connection().await.unwrap();
    let row = conn
        .query_one(
            "SELECT user_id, device_type, masked_ip, masked_device_id, locale, app_version \
             FROM user_logins",
            &[],
        )
        .await
        .unwrap();

    assert_eq!(row.get::<_, String>("user_id"), record.user_id);
    assert_eq!(row.get::<_, String>("device_type"), record.device_type);
    assert_eq!(row.get::<_, String>("masked_ip"), record.masked_ip);
    assert_eq!(
        row.get::<_, String>("masked_device_id"),
        record.masked_device_id
    );
    assert_eq!(row.get::<_, String>("locale"), record.locale);
    assert_eq!(row.get::<_, String>("app_version"), record.app_version);
}

#[tokio::test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
async fn dead_letter_table_creation_is_idempotent() {
    let (_container, client) = setup_test_db().await;
    let repository = PostgresDeadLetterRepository::new(client.clone());

    let input = RecordFailureInput {
        error_message: "missing required field: locale".to_string(),
        message: serde_json::json!({"receipt_handle": "rh-1", "body": "{}"}),
        message_body: Some(serde_json::json!({"user_id": "u1"})),
    };

    // First call creates the table, second finds it already present.
    repository.record_failure(input.clone()).await.unwrap();
    repository.record_failure(input).await.unwrap();

    assert_eq!(count(&client, "error_records").await, 2);
}

#[tokio::test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
async fn valid_payload_lands_in_user_logins() {
    let (_container, client) = setup_test_db().await;
    let service = ingest_service(&client);

    let message = RawMessage {
        message_id: Some("m-1".to_string()),
        receipt_handle: "rh-1".to_string(),
        body: serde_json::json!({
            "user_id": "u1",
            "device_type": "ios",
            "ip": "1.2.3.4",
            "device_id": "d1",
            "locale": "en-US",
            "app_version": "1.0"
        })
        .to_string(),
    };

    service.process(&message).await.unwrap();

    let conn = client.get_connection().await.unwrap();
    let row = conn
        .query_one("SELECT device_type, masked_ip FROM user_logins", &[])
        .await
        .unwrap();

    assert_eq!(row.get::<_, String>("device_type"), "ios");
    assert_eq!(
        row.get::<_, String>("masked_ip"),
        "6694f83c9f476da31f5df6bcc520034e7e57d421d247b9d34f49edbfc84a764c"
    );
    assert_eq!(count(&client, "error_records").await, 0);
}

#[tokio::test]
#[cfg_attr(not(feature = "integration-tests"), ignore)]
async fn missing_locale_goes_to_dead_letter() {
    let (_container, client) = setup_test_db().await;
    let service = ingest_service(&client);

    let message = RawMessage {
        message_id: Some("m-2".to_string()),
        receipt_handle: "rh-2".to_string(),
        body: serde_json::json!({
            "user_id": "u1",
            "device_type": "ios",
            "ip": "1.2.3.4",
            "device_id": "d1",
            "app_version": "1.0"
        })
        .to_string(),
    };

    service.process(&message).await.unwrap_err();

    assert_eq!(count(&client, "user_logins").await, 0);
    assert_eq!(count(&client, "error_records").await, 1);

    let conn = client.get_connection().await.unwrap();
    let row = conn
        .query_one(
            "SELECT error_message, message, message_body FROM error_records",
            &[],
        )
        .await
        .unwrap();

    assert!(row.get::<_, String>("error_message").contains("locale"));
    let envelope: serde_json::Value = row.get("message");
    assert_eq!(envelope["receipt_handle"], "rh-2");
    let body: Option<serde_json::Value> = row.get("message_body");
    assert_eq!(body.unwrap()["user_id"], "u1");
}
