mod common;

use common::{resolver, Behavior, ScriptedGateway, MODEL};
use std::time::{Duration, Instant};
use voice_router::command::processors::common::FALLBACK_HELP;
use voice_router::command::{Action, FallbackReason, Route};
use voice_router::{CommandType, GatewayError, UserRole};

#[tokio::test]
async fn test_missing_credential_never_calls_gateway() {
    let gateway = ScriptedGateway::answering("start_quiz");
    let r = resolver(gateway.clone(), false);

    let resolution = r.resolve("xyzzy plugh", UserRole::Student, MODEL).await.unwrap();

    assert_eq!(gateway.calls(), 0, "No credential must mean no gateway call");
    assert_eq!(resolution.result.action, Action::Dialog);
    assert_eq!(resolution.result.response, FALLBACK_HELP);
    assert_eq!(resolution.route, Route::Help { reason: FallbackReason::MissingCredential });
    assert!(!resolution.route.model_attempted());
}

#[tokio::test]
async fn test_missing_credential_still_uses_heuristics() {
    let gateway = ScriptedGateway::answering("unknown");
    let r = resolver(gateway.clone(), false);

    let resolution = r.resolve("a test tomorrow", UserRole::Student, MODEL).await.unwrap();

    assert_eq!(gateway.calls(), 0);
    assert_eq!(resolution.command_type, CommandType::StartQuiz);
    assert_eq!(resolution.result.target.as_deref(), Some("quiz"));
}

#[tokio::test]
async fn test_model_answer_routes_to_processor() {
    let gateway = ScriptedGateway::answering("lesson_plan");
    let r = resolver(gateway.clone(), true);

    let resolution = r
        .resolve("do something about chapter four", UserRole::Teacher, MODEL)
        .await
        .unwrap();

    assert_eq!(gateway.calls(), 1);
    assert_eq!(resolution.command_type, CommandType::LessonPlan);
    assert_eq!(resolution.result.target.as_deref(), Some("lesson-plan"));
    assert!(matches!(resolution.route, Route::Model { .. }));

    let prompt = gateway.last_prompt().unwrap();
    assert!(prompt.contains("- flashcards:"), "Menu must list the teacher's intents");
    assert!(!prompt.contains("- start_quiz:"), "Menu must not list other roles' intents");
}

#[tokio::test]
async fn test_noisy_model_answer_is_normalized() {
    let gateway = ScriptedGateway::answering("\"Class-Analytics.\"");
    let r = resolver(gateway, true);

    let resolution = r.resolve("xyzzy", UserRole::Teacher, MODEL).await.unwrap();
    assert_eq!(resolution.command_type, CommandType::ClassAnalytics);
}

#[tokio::test]
async fn test_unknown_answer_falls_to_help() {
    let gateway = ScriptedGateway::answering("unknown");
    let r = resolver(gateway.clone(), true);

    let resolution = r.resolve("xyzzy plugh", UserRole::Principal, MODEL).await.unwrap();

    assert_eq!(gateway.calls(), 1);
    assert_eq!(resolution.result.response, FALLBACK_HELP);
    assert!(matches!(
        resolution.route,
        Route::Help { reason: FallbackReason::Unmappable(_) }
    ));
    assert!(resolution.route.model_attempted());
}

#[tokio::test]
async fn test_foreign_intent_is_unmappable() {
    // A teacher-only intent offered to a student falls through to heuristics.
    let gateway = ScriptedGateway::answering("generate_test");
    let r = resolver(gateway, true);

    let resolution = r.resolve("a test tomorrow", UserRole::Student, MODEL).await.unwrap();

    assert_eq!(resolution.command_type, CommandType::StartQuiz);
    assert!(matches!(
        resolution.route,
        Route::Heuristic { reason: FallbackReason::Unmappable(_) }
    ));
}

#[tokio::test]
async fn test_hanging_gateway_is_bounded() {
    let gateway = ScriptedGateway::new(Behavior::Hang);
    let r = resolver(gateway.clone(), true);
    let bound = r.config().fallback_latency_bound();

    let started = Instant::now();
    let resolution = r.resolve("xyzzy plugh", UserRole::Teacher, MODEL).await.unwrap();
    let elapsed = started.elapsed();

    assert!(
        elapsed < bound + Duration::from_millis(500),
        "Fallback took {:?}, bound is {:?}",
        elapsed,
        bound
    );
    assert_eq!(gateway.calls(), 2, "Timeout is retried exactly once");
    assert_eq!(resolution.result.action, Action::Dialog);
    assert!(matches!(
        resolution.route,
        Route::Help { reason: FallbackReason::Gateway(_) }
    ));
}

#[tokio::test]
async fn test_server_error_is_retried_once() {
    let gateway = ScriptedGateway::new(Behavior::Fail(|| GatewayError::Status {
        status: 503,
        body: "overloaded".into(),
    }));
    let r = resolver(gateway.clone(), true);

    let resolution = r.resolve("a test", UserRole::Teacher, MODEL).await.unwrap();

    assert_eq!(gateway.calls(), 2);
    assert_eq!(resolution.command_type, CommandType::GenerateTest);
    assert!(matches!(resolution.route, Route::Heuristic { .. }));
}

#[tokio::test]
async fn test_auth_error_is_not_retried() {
    let gateway = ScriptedGateway::new(Behavior::Fail(|| GatewayError::Status {
        status: 401,
        body: "bad key".into(),
    }));
    let r = resolver(gateway.clone(), true);

    let resolution = r.resolve("xyzzy", UserRole::Student, MODEL).await.unwrap();

    assert_eq!(gateway.calls(), 1);
    assert_eq!(resolution.result.response, FALLBACK_HELP);
}
