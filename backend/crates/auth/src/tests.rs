//! Use-case level tests for the auth crate, run against the in-memory store.

#[cfg(test)]
mod support {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use crate::application::config::AuthConfig;
    use crate::domain::notifier::{Notifier, NotifierError};
    use crate::domain::value_object::{otp_code::OtpCode, phone::Phone};

    pub const PHONE: &str = "+391234567890";

    /// Notifier that records what it was asked to send
    #[derive(Clone, Default)]
    pub struct RecordingNotifier {
        pub fail: bool,
        pub codes: Arc<Mutex<Vec<(String, String)>>>,
        pub welcomes: Arc<Mutex<Vec<String>>>,
    }

    impl RecordingNotifier {
        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        pub fn last_code_for(&self, phone: &str) -> Option<String> {
            self.codes
                .lock()
                .unwrap()
                .iter()
                .rev()
                .find(|(p, _)| p == phone)
                .map(|(_, c)| c.clone())
        }

        /// Welcome messages are sent from a spawned task
        pub async fn wait_for_welcomes(&self, expected: usize) -> usize {
            for _ in 0..100 {
                let n = self.welcomes.lock().unwrap().len();
                if n >= expected {
                    return n;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            self.welcomes.lock().unwrap().len()
        }
    }

    impl Notifier for RecordingNotifier {
        async fn send_code(&self, phone: &Phone, code: &OtpCode) -> Result<(), NotifierError> {
            if self.fail {
                return Err(NotifierError::Transport("connection refused".into()));
            }
            self.codes
                .lock()
                .unwrap()
                .push((phone.as_str().to_string(), code.as_str().to_string()));
            Ok(())
        }

        async fn send_welcome(&self, phone: &Phone) -> Result<(), NotifierError> {
            if self.fail {
                return Err(NotifierError::Transport("connection refused".into()));
            }
            self.welcomes.lock().unwrap().push(phone.as_str().to_string());
            Ok(())
        }
    }

    pub fn config() -> AuthConfig {
        AuthConfig::with_random_secret()
    }

    pub fn phone() -> Phone {
        Phone::from_db(PHONE.to_string())
    }
}

#[cfg(test)]
mod otp_store_tests {
    use chrono::{Duration, Utc};

    use super::support::*;
    use crate::domain::entity::otp_challenge::OtpChallenge;
    use crate::domain::repository::OtpChallengeRepository;
    use crate::domain::value_object::otp_code::OtpCode;
    use crate::infra::memory::MemoryAuthRepository;

    fn challenge(code: &str, now: chrono::DateTime<Utc>) -> OtpChallenge {
        OtpChallenge::issue(
            phone(),
            OtpCode::from_db(code.to_string()),
            now,
            Duration::minutes(5),
        )
    }

    #[tokio::test]
    async fn test_code_is_single_use() {
        let repo = MemoryAuthRepository::new();
        let now = Utc::now();
        repo.issue(&challenge("111111", now)).await.unwrap();

        assert!(repo.verify(&phone(), "111111", now).await.unwrap());
        assert!(!repo.verify(&phone(), "111111", now).await.unwrap());
    }

    #[tokio::test]
    async fn test_reissue_invalidates_previous_code() {
        let repo = MemoryAuthRepository::new();
        let now = Utc::now();
        repo.issue(&challenge("111111", now)).await.unwrap();
        repo.issue(&challenge("222222", now + Duration::seconds(1)))
            .await
            .unwrap();

        let all = repo.challenges_for(&phone()).await;
        assert_eq!(all.len(), 2);
        assert_eq!(all.iter().filter(|c| !c.verified).count(), 1);

        let later = now + Duration::seconds(2);
        assert!(!repo.verify(&phone(), "111111", later).await.unwrap());
        assert!(repo.verify(&phone(), "222222", later).await.unwrap());
    }

    #[tokio::test]
    async fn test_expired_code_rejected() {
        let repo = MemoryAuthRepository::new();
        let now = Utc::now();
        repo.issue(&challenge("333333", now)).await.unwrap();

        let after_expiry = now + Duration::minutes(5) + Duration::seconds(1);
        assert!(!repo.verify(&phone(), "333333", after_expiry).await.unwrap());
    }

    #[tokio::test]
    async fn test_wrong_attempts_counted_then_correct_code_accepted() {
        let repo = MemoryAuthRepository::new();
        let now = Utc::now();
        let issued = challenge("444444", now);
        assert_eq!(issued.expires_at - now, Duration::minutes(5));
        repo.issue(&issued).await.unwrap();

        for wrong in ["000000", "123123", "999999"] {
            assert!(!repo.verify(&phone(), wrong, now).await.unwrap());
        }

        let live = repo.find_latest_unverified(&phone()).await.unwrap().unwrap();
        assert_eq!(live.attempts, 3);

        assert!(repo.verify(&phone(), "444444", now).await.unwrap());
        let stored = repo.challenges_for(&phone()).await;
        assert!(stored[0].verified);
        assert!(repo.find_latest_unverified(&phone()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_verify_without_challenge_has_no_side_effect() {
        let repo = MemoryAuthRepository::new();
        assert!(!repo.verify(&phone(), "123456", Utc::now()).await.unwrap());
        assert!(repo.challenges_for(&phone()).await.is_empty());
    }

    #[tokio::test]
    async fn test_sweep_keeps_live_challenges() {
        let repo = MemoryAuthRepository::new();
        let now = Utc::now();
        let other = crate::domain::value_object::phone::Phone::from_db("+391112223334".into());

        repo.issue(&OtpChallenge::issue(
            other.clone(),
            OtpCode::from_db("555555".into()),
            now - Duration::minutes(10),
            Duration::minutes(5),
        ))
        .await
        .unwrap();
        repo.issue(&challenge("666666", now)).await.unwrap();

        assert_eq!(repo.sweep_expired(now).await.unwrap(), 1);
        assert!(repo.challenges_for(&other).await.is_empty());
        assert!(repo.verify(&phone(), "666666", now).await.unwrap());
    }

    #[tokio::test]
    async fn test_concurrent_verify_succeeds_once() {
        let repo = MemoryAuthRepository::new();
        let now = Utc::now();
        repo.issue(&challenge("777777", now)).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move {
                repo.verify(&phone(), "777777", now).await.unwrap()
            }));
        }

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap() {
                successes += 1;
            }
        }
        assert_eq!(successes, 1);
    }
}

#[cfg(test)]
mod request_otp_tests {
    use std::sync::Arc;

    use super::support::*;
    use crate::application::{Delivery, RequestOtpUseCase};
    use crate::domain::repository::OtpChallengeRepository;
    use crate::error::AuthError;
    use crate::infra::memory::MemoryAuthRepository;

    #[tokio::test]
    async fn test_sends_code_without_disclosure() {
        let repo = Arc::new(MemoryAuthRepository::new());
        let notifier = RecordingNotifier::default();
        let use_case = RequestOtpUseCase::new(repo.clone(), Arc::new(notifier.clone()), Arc::new(config()));

        let output = use_case.execute(Some("+39 123 456 7890")).await.unwrap();

        assert_eq!(output.phone.as_str(), PHONE);
        assert_eq!(output.delivery, Delivery::Sent);
        assert!(output.debug_otp.is_none());

        let sent = notifier.last_code_for(PHONE).unwrap();
        let stored = repo.find_latest_unverified(&phone()).await.unwrap().unwrap();
        assert!(stored.code.matches(&sent));
    }

    #[tokio::test]
    async fn test_testing_mode_skips_delivery_and_discloses() {
        let repo = Arc::new(MemoryAuthRepository::new());
        let notifier = RecordingNotifier::default();
        let mut cfg = config();
        cfg.testing_mode = true;
        let use_case = RequestOtpUseCase::new(repo.clone(), Arc::new(notifier.clone()), Arc::new(cfg));

        let output = use_case.execute(Some(PHONE)).await.unwrap();

        assert_eq!(output.delivery, Delivery::Skipped);
        assert!(notifier.codes.lock().unwrap().is_empty());
        let code = output.debug_otp.unwrap();
        assert!(repo.verify(&phone(), &code, chrono::Utc::now()).await.unwrap());
    }

    #[tokio::test]
    async fn test_delivery_failure_with_fallback_discloses() {
        let repo = Arc::new(MemoryAuthRepository::new());
        let mut cfg = config();
        cfg.disclose_on_delivery_failure = true;
        let use_case = RequestOtpUseCase::new(repo, Arc::new(RecordingNotifier::failing()), Arc::new(cfg));

        let output = use_case.execute(Some(PHONE)).await.unwrap();

        assert_eq!(output.delivery, Delivery::Failed);
        assert!(output.debug_otp.is_some());
    }

    #[tokio::test]
    async fn test_delivery_failure_without_fallback_still_succeeds() {
        let repo = Arc::new(MemoryAuthRepository::new());
        let use_case = RequestOtpUseCase::new(
            repo.clone(),
            Arc::new(RecordingNotifier::failing()),
            Arc::new(config()),
        );

        let output = use_case.execute(Some(PHONE)).await.unwrap();

        assert_eq!(output.delivery, Delivery::Failed);
        assert_eq!(output.debug_otp, None);
        assert_eq!(output.message(), "Verification code generated (delivery unavailable)");
        assert!(repo.find_latest_unverified(&phone()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_validation_happens_before_store_access() {
        let repo = Arc::new(MemoryAuthRepository::new());
        let use_case =
            RequestOtpUseCase::new(repo.clone(), Arc::new(RecordingNotifier::default()), Arc::new(config()));

        assert!(matches!(
            use_case.execute(None).await,
            Err(AuthError::MissingField("phone"))
        ));
        assert!(matches!(
            use_case.execute(Some("   ")).await,
            Err(AuthError::MissingField("phone"))
        ));
        assert!(matches!(
            use_case.execute(Some("12-34")).await,
            Err(AuthError::InvalidPhone)
        ));
        assert!(repo.challenges_for(&phone()).await.is_empty());
    }

    #[tokio::test]
    async fn test_rate_limit_per_phone() {
        let repo = Arc::new(MemoryAuthRepository::new());
        let use_case =
            RequestOtpUseCase::new(repo, Arc::new(RecordingNotifier::default()), Arc::new(config()));

        for _ in 0..5 {
            use_case.execute(Some(PHONE)).await.unwrap();
        }
        assert!(matches!(
            use_case.execute(Some(PHONE)).await,
            Err(AuthError::RateLimited)
        ));
        // Other phones are unaffected
        assert!(use_case.execute(Some("+391112223334")).await.is_ok());
    }
}

#[cfg(test)]
mod identity_tests {
    use std::sync::Arc;

    use chrono::Utc;

    use super::support::*;
    use crate::application::session_token::parse_session_token;
    use crate::application::{
        CheckSessionUseCase, IdentityBinder, RequestOtpUseCase, SignOutUseCase, VerifyOtpInput,
        VerifyOtpUseCase,
    };
    use crate::domain::entity::auth_session::AuthSession;
    use crate::domain::repository::{AccountRepository, AuthSessionRepository};
    use crate::error::AuthError;
    use crate::infra::memory::MemoryAuthRepository;

    async fn request_code(
        repo: &Arc<MemoryAuthRepository>,
        notifier: &RecordingNotifier,
        config: &Arc<crate::AuthConfig>,
    ) -> String {
        RequestOtpUseCase::new(repo.clone(), Arc::new(notifier.clone()), config.clone())
            .execute(Some(PHONE))
            .await
            .unwrap();
        notifier.last_code_for(PHONE).unwrap()
    }

    #[tokio::test]
    async fn test_first_login_creates_account_then_reuses_it() {
        let repo = Arc::new(MemoryAuthRepository::new());
        let notifier = RecordingNotifier::default();
        let config = Arc::new(config());
        let verify = VerifyOtpUseCase::new(repo.clone(), Arc::new(notifier.clone()), config.clone());

        let code = request_code(&repo, &notifier, &config).await;
        let first = verify
            .execute(VerifyOtpInput {
                phone: Some("+39 123 456 7890"),
                code: Some(&code),
            })
            .await
            .unwrap();
        assert!(first.is_new_user);
        assert_eq!(notifier.wait_for_welcomes(1).await, 1);

        let code = request_code(&repo, &notifier, &config).await;
        let second = verify
            .execute(VerifyOtpInput {
                phone: Some(PHONE),
                code: Some(&code),
            })
            .await
            .unwrap();
        assert!(!second.is_new_user);
        assert_eq!(second.account_id, first.account_id);
        assert_eq!(repo.account_count().await, 1);

        let account = repo.find_account_by_phone(&phone()).await.unwrap().unwrap();
        assert!(account.confirmed);
        assert!(account.last_login_at.is_some());
    }

    #[tokio::test]
    async fn test_failures_are_indistinguishable() {
        let repo = Arc::new(MemoryAuthRepository::new());
        let notifier = RecordingNotifier::default();
        let config = Arc::new(config());
        let verify = VerifyOtpUseCase::new(repo.clone(), Arc::new(notifier.clone()), config.clone());

        // No challenge at all
        let none = verify
            .execute(VerifyOtpInput {
                phone: Some(PHONE),
                code: Some("123456"),
            })
            .await
            .unwrap_err();

        // Wrong code
        let code = request_code(&repo, &notifier, &config).await;
        let wrong = if code == "100000" { "100001" } else { "100000" };
        let mismatch = verify
            .execute(VerifyOtpInput {
                phone: Some(PHONE),
                code: Some(wrong),
            })
            .await
            .unwrap_err();

        assert!(matches!(none, AuthError::InvalidCode));
        assert!(matches!(mismatch, AuthError::InvalidCode));
        assert_eq!(
            none.to_app_error().body(),
            mismatch.to_app_error().body()
        );
        assert_eq!(repo.account_count().await, 0);
    }

    #[tokio::test]
    async fn test_missing_fields() {
        let repo = Arc::new(MemoryAuthRepository::new());
        let verify = VerifyOtpUseCase::new(repo, Arc::new(RecordingNotifier::default()), Arc::new(config()));

        assert!(matches!(
            verify.execute(VerifyOtpInput { phone: Some(PHONE), code: None }).await,
            Err(AuthError::MissingField("otp"))
        ));
        assert!(matches!(
            verify.execute(VerifyOtpInput { phone: None, code: Some("123456") }).await,
            Err(AuthError::MissingField("phone"))
        ));
    }

    #[tokio::test]
    async fn test_testing_mode_sends_no_welcome() {
        let repo = Arc::new(MemoryAuthRepository::new());
        let notifier = RecordingNotifier::default();
        let mut cfg = config();
        cfg.testing_mode = true;
        let binder = IdentityBinder::new(repo, Arc::new(notifier.clone()), Arc::new(cfg));

        let output = binder.login_or_register(&phone()).await.unwrap();
        assert!(output.is_new_user);
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(notifier.welcomes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_first_logins_bind_one_account() {
        let repo = Arc::new(MemoryAuthRepository::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let config = Arc::new(config());

        let mut handles = Vec::new();
        for _ in 0..4 {
            let binder = IdentityBinder::new(repo.clone(), notifier.clone(), config.clone());
            handles.push(tokio::spawn(async move {
                binder.login_or_register(&phone()).await.unwrap()
            }));
        }

        let mut outputs = Vec::new();
        for handle in handles {
            outputs.push(handle.await.unwrap());
        }

        assert_eq!(repo.account_count().await, 1);
        assert_eq!(outputs.iter().filter(|o| o.is_new_user).count(), 1);
        assert!(outputs.iter().all(|o| o.account_id == outputs[0].account_id));
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let repo = Arc::new(MemoryAuthRepository::new());
        let config = Arc::new(config());
        let binder = IdentityBinder::new(repo.clone(), Arc::new(RecordingNotifier::default()), config.clone());

        let output = binder.login_or_register(&phone()).await.unwrap();
        assert!(parse_session_token(&config.session_secret, &output.session_token).is_ok());

        let check = CheckSessionUseCase::new(repo.clone(), config.clone());
        let info = check.execute(&output.session_token).await.unwrap();
        assert_eq!(info.account_id, output.account_id);

        SignOutUseCase::new(repo.clone(), config.clone())
            .execute(&output.session_token)
            .await
            .unwrap();
        assert!(matches!(
            check.execute(&output.session_token).await,
            Err(AuthError::SessionInvalid)
        ));
    }

    #[tokio::test]
    async fn test_expired_session_rejected_and_removed() {
        let repo = Arc::new(MemoryAuthRepository::new());
        let config = Arc::new(config());

        let session = AuthSession::new(
            kernel::id::AccountId::new(),
            chrono::Duration::minutes(1),
            Utc::now() - chrono::Duration::minutes(2),
        );
        repo.create_session(&session).await.unwrap();
        let token = crate::application::session_token::create_session_token(
            &config.session_secret,
            session.session_id,
        );

        let check = CheckSessionUseCase::new(repo.clone(), config);
        assert!(matches!(
            check.execute(&token).await,
            Err(AuthError::SessionInvalid)
        ));
        assert!(repo.find_session(session.session_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_credential_secret_is_session_failure() {
        let repo = Arc::new(MemoryAuthRepository::new());
        let mut cfg = config();
        cfg.credential_secret.clear();
        let binder = IdentityBinder::new(repo.clone(), Arc::new(RecordingNotifier::default()), Arc::new(cfg));

        // Hashing needs the secret, so nothing is written
        assert!(matches!(
            binder.login_or_register(&phone()).await,
            Err(AuthError::Credential(_))
        ));
        assert_eq!(repo.account_count().await, 0);
        assert_eq!(repo.session_count().await, 0);
    }
}

#[cfg(test)]
mod http_tests {
    use std::sync::Arc;

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use serde_json::Value;
    use tower::ServiceExt;

    use super::support::*;
    use crate::application::config::SameSite;
    use crate::infra::memory::MemoryAuthRepository;
    use crate::presentation::router::auth_router_generic;

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_request_otp_survives_delivery_failure_over_http() {
        let app = auth_router_generic(
            Arc::new(MemoryAuthRepository::new()),
            Arc::new(RecordingNotifier::failing()),
            Arc::new(config()),
        );

        let response = app
            .oneshot(post_json("/request-otp", r#"{"phone":"333 123 4567"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        assert!(body.get("debugOtp").is_none());
    }

    #[tokio::test]
    async fn test_otp_flow_over_http() {
        let mut cfg = config();
        cfg.testing_mode = true;
        let app = auth_router_generic(
            Arc::new(MemoryAuthRepository::new()),
            Arc::new(RecordingNotifier::default()),
            Arc::new(cfg),
        );

        let response = app
            .clone()
            .oneshot(post_json("/request-otp", r#"{"phone":"333 123 4567"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["phone"], "+393331234567");
        let code = body["debugOtp"].as_str().unwrap().to_string();

        let response = app
            .clone()
            .oneshot(post_json(
                "/verify-otp",
                &format!(r#"{{"phone":"+393331234567","otp":"{code}"}}"#),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(cookie.starts_with("dfit_session="));
        let body = json_body(response).await;
        assert_eq!(body["isNewUser"], true);

        let session_pair = cookie.split(';').next().unwrap().to_string();
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/status")
                    .header(header::COOKIE, session_pair)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["authenticated"], true);
    }

    #[tokio::test]
    async fn test_session_cookie_uses_configured_same_site() {
        let mut cfg = config();
        cfg.testing_mode = true;
        cfg.cookie_same_site = SameSite::Strict;
        let app = auth_router_generic(
            Arc::new(MemoryAuthRepository::new()),
            Arc::new(RecordingNotifier::default()),
            Arc::new(cfg),
        );

        let response = app
            .clone()
            .oneshot(post_json("/request-otp", r#"{"phone":"+393331234567"}"#))
            .await
            .unwrap();
        let code = json_body(response).await["debugOtp"]
            .as_str()
            .unwrap()
            .to_string();

        let response = app
            .oneshot(post_json(
                "/verify-otp",
                &format!(r#"{{"phone":"+393331234567","otp":"{code}"}}"#),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cookie.contains("SameSite=Strict"));
        assert!(cookie.contains("HttpOnly"));
    }

    #[tokio::test]
    async fn test_http_error_statuses() {
        let app = auth_router_generic(
            Arc::new(MemoryAuthRepository::new()),
            Arc::new(RecordingNotifier::default()),
            Arc::new(config()),
        );

        let response = app
            .clone()
            .oneshot(post_json("/request-otp", r#"{}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .clone()
            .oneshot(post_json("/request-otp", r#"{"phone":"abc"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .clone()
            .oneshot(post_json("/verify-otp", r#"{"phone":"+391234567890","otp":"123456"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = json_body(response).await;
        assert_eq!(body["error"], "Invalid or expired code");

        let response = app
            .oneshot(post_json("/verify-otp", "not json"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
