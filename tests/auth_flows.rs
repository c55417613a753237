//! End-to-end flow scenarios against the in-memory store.

use std::sync::Arc;

use anyhow::Result;

use warden::auth::{AdminLogin, AuthService, InMemoryStore, Login, SignUp, VerifyEmail};
use warden::error::{Error, ErrorKind};
use warden::policy::Policy;
use warden::seed::seed_defaults;
use warden::TokenConfig;

const SUPERADMIN_EMAIL: &str = "root@example.com";
const SUPERADMIN_PASSWORD: &str = "sup3r-secret";

async fn service() -> Result<AuthService> {
    let store = Arc::new(InMemoryStore::new());
    seed_defaults(
        store.as_ref(),
        store.as_ref(),
        SUPERADMIN_EMAIL,
        SUPERADMIN_PASSWORD,
    )
    .await?;

    let config = TokenConfig::new("integration-test-secret-material")?
        .with_issuer("idp.example.test")
        .with_audience("api.example.test");
    Ok(AuthService::new(
        store.clone(),
        store.clone(),
        store,
        config,
    ))
}

fn sign_up_alice() -> SignUp {
    SignUp {
        email: "a@x.com".to_string(),
        username: "alice".to_string(),
        password: "Passw0rd".to_string(),
    }
}

#[tokio::test]
async fn signup_issues_token_but_requires_verification() -> Result<()> {
    let service = service().await?;

    let registration = service.sign_up(sign_up_alice()).await?;
    assert!(registration.verification_required);
    assert!(!registration.user.is_verified);
    assert_eq!(registration.user.username, "alice");

    // usable token straight away, carrying the default role
    let claims = service.authenticate(&registration.token.token)?;
    assert!(claims.roles.iter().any(|role| role == "Visitor"));
    assert!(claims.has_permission("files:read"));
    Ok(())
}

#[tokio::test]
async fn login_before_verification_is_denied() -> Result<()> {
    let service = service().await?;
    service.sign_up(sign_up_alice()).await?;

    let result = service
        .login(Login {
            identifier: "a@x.com".to_string(),
            password: "Passw0rd".to_string(),
        })
        .await;

    match result {
        Err(err) => assert_eq!(err.kind(), ErrorKind::AuthorizationDenied),
        Ok(_) => panic!("unverified login must fail"),
    }
    Ok(())
}

#[tokio::test]
async fn verify_then_login_succeeds() -> Result<()> {
    let service = service().await?;
    let registration = service.sign_up(sign_up_alice()).await?;

    service
        .verify_email(VerifyEmail {
            email: "a@x.com".to_string(),
            code: registration.verification.code.clone(),
        })
        .await?;

    let session = service
        .login(Login {
            identifier: "alice".to_string(),
            password: "Passw0rd".to_string(),
        })
        .await?;
    assert!(session.user.is_verified);
    assert!(session.user.is_logged_in);
    assert!(session.user.last_login_at.is_some());
    Ok(())
}

#[tokio::test]
async fn wrong_password_and_wrong_code_stay_distinct() -> Result<()> {
    let service = service().await?;
    let registration = service.sign_up(sign_up_alice()).await?;

    let login = service
        .login(Login {
            identifier: "a@x.com".to_string(),
            password: "wrong-password".to_string(),
        })
        .await;
    assert!(matches!(login, Err(Error::WrongPassword)));

    let wrong = if registration.verification.code == "000000" {
        "000001"
    } else {
        "000000"
    };
    let verify = service
        .verify_email(VerifyEmail {
            email: "a@x.com".to_string(),
            code: wrong.to_string(),
        })
        .await;
    assert!(matches!(verify, Err(Error::WrongOtpCode)));
    Ok(())
}

#[tokio::test]
async fn otp_attempts_are_capped_across_calls() -> Result<()> {
    let service = service().await?;
    let registration = service.sign_up(sign_up_alice()).await?;
    let wrong = if registration.verification.code == "000000" {
        "000001"
    } else {
        "000000"
    };

    for _ in 0..3 {
        let result = service
            .verify_email(VerifyEmail {
                email: "a@x.com".to_string(),
                code: wrong.to_string(),
            })
            .await;
        assert!(matches!(result, Err(Error::WrongOtpCode)));
    }

    // correct code, but the cap was reached
    let result = service
        .verify_email(VerifyEmail {
            email: "a@x.com".to_string(),
            code: registration.verification.code.clone(),
        })
        .await;
    match result {
        Err(err) => assert_eq!(err.kind(), ErrorKind::AuthorizationDenied),
        Ok(()) => panic!("capped verification must fail"),
    }
    Ok(())
}

#[tokio::test]
async fn verifying_a_verified_account_conflicts() -> Result<()> {
    let service = service().await?;
    let registration = service.sign_up(sign_up_alice()).await?;

    service
        .verify_email(VerifyEmail {
            email: "a@x.com".to_string(),
            code: registration.verification.code.clone(),
        })
        .await?;

    // the code was consumed and the account is verified; conflict comes
    // before any code lookup
    let result = service
        .verify_email(VerifyEmail {
            email: "a@x.com".to_string(),
            code: registration.verification.code.clone(),
        })
        .await;
    assert!(matches!(result, Err(Error::AlreadyVerified)));
    Ok(())
}

#[tokio::test]
async fn resend_supersedes_previous_code() -> Result<()> {
    let service = service().await?;
    let registration = service.sign_up(sign_up_alice()).await?;

    let fresh = service.request_verification("a@x.com").await?;

    // the original code no longer verifies once superseded
    if fresh.code != registration.verification.code {
        let stale = service
            .verify_email(VerifyEmail {
                email: "a@x.com".to_string(),
                code: registration.verification.code.clone(),
            })
            .await;
        assert!(matches!(stale, Err(Error::WrongOtpCode)));
    }

    service
        .verify_email(VerifyEmail {
            email: "a@x.com".to_string(),
            code: fresh.code.clone(),
        })
        .await?;
    Ok(())
}

#[tokio::test]
async fn duplicate_email_or_username_conflicts() -> Result<()> {
    let service = service().await?;
    service.sign_up(sign_up_alice()).await?;

    let same_email = service
        .sign_up(SignUp {
            email: "A@X.com".to_string(),
            username: "someone-else".to_string(),
            password: "Passw0rd".to_string(),
        })
        .await;
    assert!(matches!(same_email, Err(Error::EmailTaken)));

    let same_username = service
        .sign_up(SignUp {
            email: "b@x.com".to_string(),
            username: "alice".to_string(),
            password: "Passw0rd".to_string(),
        })
        .await;
    assert!(matches!(same_username, Err(Error::UsernameTaken)));
    Ok(())
}

#[tokio::test]
async fn admin_login_requires_an_admin_role() -> Result<()> {
    let service = service().await?;
    let registration = service.sign_up(sign_up_alice()).await?;
    service
        .verify_email(VerifyEmail {
            email: "a@x.com".to_string(),
            code: registration.verification.code.clone(),
        })
        .await?;

    // valid credentials, but no Admin/SuperAdmin role: 401, not 403
    let result = service
        .admin_login(AdminLogin {
            email: "a@x.com".to_string(),
            password: "Passw0rd".to_string(),
        })
        .await;
    match result {
        Err(err) => assert_eq!(err.kind(), ErrorKind::AuthenticationFailed),
        Ok(_) => panic!("non-admin login must fail"),
    }
    Ok(())
}

#[tokio::test]
async fn admin_login_and_policy_evaluation() -> Result<()> {
    let service = service().await?;

    let session = service
        .admin_login(AdminLogin {
            email: SUPERADMIN_EMAIL.to_string(),
            password: SUPERADMIN_PASSWORD.to_string(),
        })
        .await?;

    let claims = service.authenticate(&session.token.token)?;
    assert!(claims.roles.iter().any(|role| role == "SuperAdmin"));
    assert!(claims.has_permission("roles:manage"));

    assert!(Policy::require_admin_only().evaluate(&claims));
    assert!(Policy::require_super_admin_only().evaluate(&claims));
    assert!(Policy::require_verified_user().evaluate(&claims));
    assert!(Policy::require_active_user().evaluate(&claims));
    Ok(())
}

#[tokio::test]
async fn admin_session_token_claims_are_complete() -> Result<()> {
    let service = service().await?;
    let session = service
        .admin_login(AdminLogin {
            email: SUPERADMIN_EMAIL.to_string(),
            password: SUPERADMIN_PASSWORD.to_string(),
        })
        .await?;

    let claims = service.authenticate(&session.token.token)?;
    assert_eq!(claims.subject, session.user.id.to_string());
    assert_eq!(claims.username, "superadmin");
    assert_eq!(claims.email.as_deref(), Some(SUPERADMIN_EMAIL));
    assert_eq!(claims.provider, "local");
    assert_eq!(claims.status.get("verified"), Some(&true));
    assert_eq!(claims.status.get("active"), Some(&true));
    Ok(())
}

#[tokio::test]
async fn role_administration_round_trip() -> Result<()> {
    let service = service().await?;
    let registration = service.sign_up(sign_up_alice()).await?;

    let role = service.create_role("Editor", "content management").await?;
    assert_eq!(role.name, "Editor");

    let duplicate = service.create_role("editor", "shadowed").await;
    assert!(matches!(duplicate, Err(Error::RoleExists(_))));
    let reserved = service.create_role("SuperAdmin", "").await;
    assert!(matches!(reserved, Err(Error::ReservedRole(_))));

    service.grant_permission("Editor", "files", "write").await?;
    let again = service.grant_permission("Editor", "files", "write").await;
    assert!(matches!(again, Err(Error::PermissionAlreadyGranted)));

    service.assign_role(registration.user.id, "Editor").await?;
    let twice = service.assign_role(registration.user.id, "Editor").await;
    assert!(matches!(twice, Err(Error::RoleAlreadyAssigned)));

    // the flattened claim shows up on the next issued token
    service
        .verify_email(VerifyEmail {
            email: "a@x.com".to_string(),
            code: registration.verification.code.clone(),
        })
        .await?;
    let session = service
        .login(Login {
            identifier: "alice".to_string(),
            password: "Passw0rd".to_string(),
        })
        .await?;
    let claims = service.authenticate(&session.token.token)?;
    assert!(claims.has_permission("files:write"));
    assert!(claims.roles.iter().any(|role| role == "Editor"));
    Ok(())
}

#[tokio::test]
async fn logout_clears_the_flag() -> Result<()> {
    let service = service().await?;
    let session = service
        .admin_login(AdminLogin {
            email: SUPERADMIN_EMAIL.to_string(),
            password: SUPERADMIN_PASSWORD.to_string(),
        })
        .await?;
    assert!(session.user.is_logged_in);

    service.logout(session.user.id).await?;
    let relogin = service
        .admin_login(AdminLogin {
            email: SUPERADMIN_EMAIL.to_string(),
            password: SUPERADMIN_PASSWORD.to_string(),
        })
        .await?;
    assert!(relogin.user.is_logged_in);
    Ok(())
}

#[tokio::test]
async fn unknown_account_is_not_found() -> Result<()> {
    let service = service().await?;

    let login = service
        .login(Login {
            identifier: "ghost@x.com".to_string(),
            password: "Passw0rd".to_string(),
        })
        .await;
    match login {
        Err(err) => assert_eq!(err.kind(), ErrorKind::NotFound),
        Ok(_) => panic!("unknown account must not log in"),
    }

    let verify = service
        .verify_email(VerifyEmail {
            email: "ghost@x.com".to_string(),
            code: "123456".to_string(),
        })
        .await;
    assert!(matches!(verify, Err(Error::UserNotFound)));
    Ok(())
}

#[tokio::test]
async fn tampered_token_fails_authentication() -> Result<()> {
    let service = service().await?;
    let session = service
        .admin_login(AdminLogin {
            email: SUPERADMIN_EMAIL.to_string(),
            password: SUPERADMIN_PASSWORD.to_string(),
        })
        .await?;

    let mut tampered = session.token.token.clone();
    tampered.pop();
    let result = service.authenticate(&tampered);
    match result {
        Err(err) => assert_eq!(err.kind(), ErrorKind::AuthenticationFailed),
        Ok(_) => panic!("tampered token must not authenticate"),
    }
    Ok(())
}
