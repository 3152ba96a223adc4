//! Team routing through the assembled service, including configured keywords.

use std::sync::Arc;

use hyperfocus::Hyperfocus;
use hyperfocus::core::types::{Role, TaskType};
use hyperfocus::io::config::HyperfocusConfig;
use hyperfocus::team::TEAM_FALLBACK;
use hyperfocus::test_support::{FailingGenerator, ScriptedGenerator};

#[tokio::test]
async fn configured_keywords_change_routing() {
    let mut config = HyperfocusConfig::default();
    config.routing.guardian.push("pomodoro".to_string());
    let generator =
        Arc::new(ScriptedGenerator::new().reply(Role::Guardian, "Try a 25 minute block."));
    let app = Hyperfocus::new(&config, generator.clone()).expect("app");

    let answer = app.team().route("ada", "Is a pomodoro enough?").await;

    assert_eq!(answer, "Try a 25 minute block.");
    assert_eq!(generator.roles_called(), vec![Role::Guardian]);
}

#[tokio::test]
async fn every_question_gets_an_answer_from_a_silent_model() {
    let app = Hyperfocus::new(&HyperfocusConfig::default(), Arc::new(FailingGenerator))
        .expect("app");
    let questions = [
        "How do I get started?",
        "When should I do deep work?",
        "I get distracted by my phone",
        "Give me the big picture for my week",
        "I'm tired and keep losing focus",
        "?",
    ];
    for question in questions {
        let answer = app.team().route("ada", question).await;
        assert_eq!(answer, TEAM_FALLBACK, "{question}");
    }
}

#[tokio::test]
async fn holistic_question_consults_three_members_with_user_history_key() {
    let generator = Arc::new(
        ScriptedGenerator::new()
            .reply(Role::Coach, "Protect two deep-work blocks.")
            .reply(Role::EnergyAdvisor, "Put them before noon.")
            .reply(Role::Guardian, "Log distractions as they come."),
    );
    let app = Hyperfocus::new(&HyperfocusConfig::default(), generator.clone()).expect("app");

    let answer = app
        .team()
        .route("grace", "What's the big picture for my routine?")
        .await;

    assert_eq!(
        answer,
        "Protect two deep-work blocks.\n\nPut them before noon.\n\nLog distractions as they come."
    );
    let requests = generator.requests();
    assert_eq!(requests.len(), 3);
    assert!(
        requests
            .iter()
            .all(|r| r.user_id.as_deref() == Some("grace") && r.schema.is_none())
    );
}

#[tokio::test]
async fn single_endpoints_fall_back_independently() {
    let generator = Arc::new(ScriptedGenerator::new().reply(Role::Coach, "One thing at a time."));
    let app = Hyperfocus::new(&HyperfocusConfig::default(), generator).expect("app");

    let categorization = app.categorizer().categorize("write report").await;
    assert_eq!(categorization.category, TaskType::Purposeful);
    assert_eq!(
        categorization.reasoning,
        "Default categorization - please review"
    );
    assert_eq!(
        app.coach().coach("ada", "Too many tabs open").await,
        "One thing at a time."
    );
}
