//! tests/handler_tests.rs
//! Pruebas HTTP de los endpoints con `actix_web::test`.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_rt::test;
    use actix_web::{http::StatusCode, test as atest, web, App};
    use serde_json::{json, Value};

    use crate::app;
    use crate::config::app_config::DispatchConfig;
    use crate::services::auth_service::Authenticator;
    use crate::services::campaign_service::CampaignService;
    use crate::services::contact_store::ContactStore;
    use crate::services::settings_service::SettingsService;
    use crate::tests::{Fixture, MockDelivery, OTHER_TOKEN, TOKEN};

    // App completa sobre el fixture, con el proveedor falso indicado.
    macro_rules! test_app {
        ($fx:expr, $delivery:expr) => {{
            let auth: Arc<dyn Authenticator> = $fx.auth.clone();
            let store: Arc<dyn ContactStore> = $fx.store.clone();
            let batch = $fx.dispatcher(Arc::new($delivery), DispatchConfig::default());
            atest::init_service(
                App::new()
                    .app_data(web::Data::from(auth))
                    .app_data(web::Data::new(batch))
                    .app_data(web::Data::new(CampaignService::new(store.clone())))
                    .app_data(web::Data::new(SettingsService::new(store)))
                    .configure(app::init_app),
            )
            .await
        }};
    }

    fn bearer(token: &str) -> (&'static str, String) {
        ("Authorization", format!("Bearer {token}"))
    }

    fn campaign_payload() -> Value {
        json!({
            "name": "Q3 outreach",
            "contacts": [
                { "name": "Ana", "email": "ana@example.com", "company": "Acme", "role": "CTO" },
                { "name": "Luis", "email": "luis@example.com" },
                { "name": "Eva", "email": "eva@example.com", "company": "Globex" }
            ]
        })
    }

    #[test]
    async fn test_health() {
        let fx = Fixture::new().await;
        let app = test_app!(fx, MockDelivery::new());

        let req = atest::TestRequest::get().uri("/health").to_request();
        let body: Value = atest::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!({ "status": "ok" }));
    }

    #[test]
    async fn test_preflight_returns_cors_headers() {
        let fx = Fixture::new().await;
        let app = test_app!(fx, MockDelivery::new());

        let req = atest::TestRequest::default()
            .method(actix_web::http::Method::OPTIONS)
            .uri("/api/send-bulk-emails")
            .to_request();
        let resp = atest::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let headers = resp.headers();
        assert_eq!(headers.get("Access-Control-Allow-Origin").unwrap(), "*");
        assert!(headers
            .get("Access-Control-Allow-Headers")
            .unwrap()
            .to_str()
            .unwrap()
            .contains("authorization"));
    }

    #[test]
    async fn test_send_without_credential_is_401_with_cors() {
        let fx = Fixture::new().await;
        let app = test_app!(fx, MockDelivery::new());

        let req = atest::TestRequest::post()
            .uri("/api/send-bulk-emails")
            .set_json(json!({ "campaign_id": "x" }))
            .to_request();
        let resp = atest::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            resp.headers().get("Access-Control-Allow-Origin").unwrap(),
            "*"
        );
        let body: Value = atest::read_body_json(resp).await;
        assert_eq!(body, json!({ "error": "Unauthorized" }));
    }

    #[test]
    async fn test_malformed_body_is_400() {
        let fx = Fixture::new().await;
        let app = test_app!(fx, MockDelivery::new());

        let req = atest::TestRequest::post()
            .uri("/api/send-bulk-emails")
            .insert_header(bearer(TOKEN))
            .insert_header(("Content-Type", "application/json"))
            .set_payload("{ not json")
            .to_request();
        let resp = atest::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = atest::read_body_json(resp).await;
        assert!(body["error"].is_string());
    }

    #[test]
    async fn test_full_campaign_flow() {
        let fx = Fixture::new().await;
        let delivery = MockDelivery::new().fail_for("luis@example.com");
        let app = test_app!(fx, delivery.clone());

        // Upload
        let req = atest::TestRequest::post()
            .uri("/api/campaigns")
            .insert_header(bearer(TOKEN))
            .set_json(campaign_payload())
            .to_request();
        let resp = atest::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created: Value = atest::read_body_json(resp).await;
        let id = created["id"].as_str().unwrap().to_string();
        assert_eq!(created["status"], "draft");
        assert_eq!(created["total_contacts"], 3);

        // Plantilla
        let req = atest::TestRequest::put()
            .uri(&format!("/api/campaigns/{id}/template"))
            .insert_header(bearer(TOKEN))
            .set_json(json!({ "subject": "Hola {name}", "body": "Hi {name} at {company}" }))
            .to_request();
        let updated: Value = atest::call_and_read_body_json(&app, req).await;
        assert_eq!(updated["subject"], "Hola {name}");

        // Sin settings todavía
        let req = atest::TestRequest::post()
            .uri("/api/send-bulk-emails")
            .insert_header(bearer(TOKEN))
            .set_json(json!({ "campaign_id": id }))
            .to_request();
        let resp = atest::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = atest::read_body_json(resp).await;
        assert_eq!(
            body["error"],
            "Email service not configured. Please add your Resend API key in Settings."
        );

        // Settings
        let req = atest::TestRequest::put()
            .uri("/api/settings")
            .insert_header(bearer(TOKEN))
            .set_json(json!({
                "api_key": "re_live",
                "from_email": "hello@acme.io",
                "from_name": "Acme"
            }))
            .to_request();
        let saved: Value = atest::call_and_read_body_json(&app, req).await;
        assert_eq!(saved["has_api_key"], true);
        assert_eq!(saved["email_service_provider"], "resend");
        assert!(saved.get("api_key").is_none());

        // Batch
        let req = atest::TestRequest::post()
            .uri("/api/send-bulk-emails")
            .insert_header(bearer(TOKEN))
            .set_json(json!({ "campaign_id": id, "batch_size": 10 }))
            .to_request();
        let resp = atest::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let result: Value = atest::read_body_json(resp).await;
        assert_eq!(
            result,
            json!({ "message": "Batch processing complete", "sent": 2, "failed": 1 })
        );

        let sent = delivery.sent();
        assert_eq!(sent[0].from, "Acme <hello@acme.io>");
        assert_eq!(sent[0].subject, "Hola Ana");
        assert_eq!(sent[0].html, "Hi Ana at Acme");

        // Detalle
        let req = atest::TestRequest::get()
            .uri(&format!("/api/campaigns/{id}"))
            .insert_header(bearer(TOKEN))
            .to_request();
        let detail: Value = atest::call_and_read_body_json(&app, req).await;
        assert_eq!(detail["status"], "completed");
        assert_eq!(detail["sent_count"], 2);
        assert_eq!(detail["failed_count"], 1);
        assert_eq!(
            detail["contacts"],
            json!({ "pending": 0, "processing": 0, "sent": 2, "failed": 1 })
        );

        // Contactos
        let req = atest::TestRequest::get()
            .uri(&format!("/api/campaigns/{id}/contacts"))
            .insert_header(bearer(TOKEN))
            .to_request();
        let contacts: Value = atest::call_and_read_body_json(&app, req).await;
        assert_eq!(contacts["total"], 3);
        assert_eq!(contacts["items"][1]["email"], "luis@example.com");
        assert_eq!(contacts["items"][1]["status"], "failed");
        assert!(contacts["items"][1]["error_message"].is_string());

        // Ya no es draft
        let req = atest::TestRequest::put()
            .uri(&format!("/api/campaigns/{id}/template"))
            .insert_header(bearer(TOKEN))
            .set_json(json!({ "subject": "late", "body": "late" }))
            .to_request();
        let resp = atest::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        // Página vacía
        let req = atest::TestRequest::post()
            .uri("/api/send-bulk-emails")
            .insert_header(bearer(TOKEN))
            .set_json(json!({ "campaign_id": id }))
            .to_request();
        let result: Value = atest::call_and_read_body_json(&app, req).await;
        assert_eq!(
            result,
            json!({ "message": "No pending emails to send", "sent": 0, "failed": 0 })
        );
    }

    #[test]
    async fn test_campaign_validation_errors() {
        let fx = Fixture::new().await;
        let app = test_app!(fx, MockDelivery::new());

        let cases = [
            (json!({ "name": "  ", "contacts": [{ "name": "a", "email": "a@x.io" }] }), "Please enter a campaign name"),
            (json!({ "name": "n", "contacts": [] }), "Campaign needs at least one contact"),
            (
                json!({ "name": "n", "contacts": [{ "name": "a", "email": "a@x.io" }, { "name": "b", "email": " " }] }),
                "Contact #2 is missing name or email",
            ),
        ];

        for (payload, expected) in cases {
            let req = atest::TestRequest::post()
                .uri("/api/campaigns")
                .insert_header(bearer(TOKEN))
                .set_json(payload)
                .to_request();
            let resp = atest::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            let body: Value = atest::read_body_json(resp).await;
            assert_eq!(body["error"], expected);
        }
    }

    #[test]
    async fn test_campaigns_are_scoped_to_owner() {
        let fx = Fixture::new().await;
        let id = fx.campaign_with_contacts(crate::tests::USER, 2).await;
        fx.configure_sender(crate::tests::OTHER_USER, Some("re_other")).await;
        let app = test_app!(fx, MockDelivery::new());

        let req = atest::TestRequest::get()
            .uri(&format!("/api/campaigns/{id}"))
            .insert_header(bearer(OTHER_TOKEN))
            .to_request();
        let resp = atest::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let req = atest::TestRequest::post()
            .uri("/api/send-bulk-emails")
            .insert_header(bearer(OTHER_TOKEN))
            .set_json(json!({ "campaign_id": id }))
            .to_request();
        let resp = atest::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = atest::read_body_json(resp).await;
        assert_eq!(body["error"], "Campaign not found");

        let req = atest::TestRequest::get()
            .uri("/api/campaigns")
            .insert_header(bearer(OTHER_TOKEN))
            .to_request();
        let list: Value = atest::call_and_read_body_json(&app, req).await;
        assert_eq!(list["total"], 0);

        let req = atest::TestRequest::get()
            .uri("/api/campaigns")
            .insert_header(bearer(TOKEN))
            .to_request();
        let list: Value = atest::call_and_read_body_json(&app, req).await;
        assert_eq!(list["total"], 1);
        assert_eq!(list["items"][0]["id"], id.as_str());
    }

    #[test]
    async fn test_settings_keep_key_when_omitted() {
        let fx = Fixture::new().await;
        let app = test_app!(fx, MockDelivery::new());

        let req = atest::TestRequest::get()
            .uri("/api/settings")
            .insert_header(bearer(TOKEN))
            .to_request();
        let empty: Value = atest::call_and_read_body_json(&app, req).await;
        assert_eq!(empty["has_api_key"], false);

        let req = atest::TestRequest::put()
            .uri("/api/settings")
            .insert_header(bearer(TOKEN))
            .set_json(json!({ "api_key": "re_1", "from_email": "a@acme.io" }))
            .to_request();
        atest::call_service(&app, req).await;

        // Sin api_key: se conserva
        let req = atest::TestRequest::put()
            .uri("/api/settings")
            .insert_header(bearer(TOKEN))
            .set_json(json!({ "from_name": "Acme" }))
            .to_request();
        let kept: Value = atest::call_and_read_body_json(&app, req).await;
        assert_eq!(kept["has_api_key"], true);
        assert_eq!(kept["from_name"], "Acme");
        assert_eq!(kept["from_email"], Value::Null);

        // Cadena vacía: se borra
        let req = atest::TestRequest::put()
            .uri("/api/settings")
            .insert_header(bearer(TOKEN))
            .set_json(json!({ "api_key": "" }))
            .to_request();
        let cleared: Value = atest::call_and_read_body_json(&app, req).await;
        assert_eq!(cleared["has_api_key"], false);
    }
}
