mod support;

use chrono::Utc;
use remedia::{
    dialogue::{
        DialogueError, DialogueReply, DialogueState, PromptMode, Speaker, TranscriptEntry,
        TutorSession,
    },
    prompts::{PromptCatalog, Subject},
    session::StudentSession,
    types::Language,
};
use support::{Reply, ScriptedCompletion, engine, expired_window};

const OPENING: &str = "Let's rephrase: you need the value of x. Can you isolate the term with x?";

#[tokio::test]
async fn first_message_gets_welcome_and_start_mode() {
    let completion = ScriptedCompletion::texts([OPENING]);
    let (engine, _) = engine(completion.clone());
    let mut session = StudentSession::new("alice", Language::En).with_level("5th grade");

    let turn = engine
        .dialogue
        .respond(&mut session, "  How do I solve 2x + 3 = 7?  ")
        .await
        .unwrap();

    assert_eq!(turn.mode, PromptMode::Start);
    assert!(!turn.degraded);
    assert_eq!(turn.reply, OPENING);

    let prompts = PromptCatalog::load();
    let lines: Vec<_> = session.tutor.transcript().cloned().collect();
    assert_eq!(lines, vec![
        TranscriptEntry::tutor(prompts.welcome(Language::En)),
        TranscriptEntry::student("How do I solve 2x + 3 = 7?"),
        TranscriptEntry::tutor(OPENING),
    ]);
    assert_eq!(session.tutor.state(), DialogueState::AwaitingStudent);
    assert_eq!(
        session.tutor.pending_question(),
        Some("Can you isolate the term with x?")
    );

    let request = &completion.requests().await[0];
    assert!(request.prompt.contains("How do I solve 2x + 3 = 7?"));
    assert!(request.prompt.contains("5th grade"));
    assert!(request.prompt.contains("MATHEMATICS"));
    assert_eq!(request.max_tokens, 400);
    assert_eq!(request.temperature, 0.7);
}

#[tokio::test]
async fn pinned_question_switches_to_continue_mode() {
    let completion = ScriptedCompletion::texts([
        OPENING,
        "Well done, 2x = 4. What is the value of x now?",
    ]);
    let (engine, _) = engine(completion.clone());
    let mut session = StudentSession::new("alice", Language::En);

    engine
        .dialogue
        .respond(&mut session, "How do I solve 2x + 3 = 7?")
        .await
        .unwrap();
    let turn = engine
        .dialogue
        .respond(&mut session, "I subtract 3 so 2x = 4")
        .await
        .unwrap();

    assert_eq!(turn.mode, PromptMode::Continue);
    assert_eq!(
        session.tutor.pending_question(),
        Some("What is the value of x now?")
    );

    let request = &completion.requests().await[1];
    assert!(request.prompt.contains("Can you isolate the term with x?"));
    assert!(request.prompt.contains("I subtract 3 so 2x = 4"));
    assert!(request.prompt.contains("👤 Student: How do I solve 2x + 3 = 7?"));
    assert!(request.prompt.contains("🤖 Teacher:"));
    assert_eq!(request.max_tokens, 450);
}

#[tokio::test]
async fn reply_without_question_clears_the_pin() {
    let completion = ScriptedCompletion::texts([OPENING, "Great job, that is correct!", OPENING]);
    let (engine, _) = engine(completion.clone());
    let mut session = StudentSession::new("alice", Language::En);

    engine.dialogue.respond(&mut session, "Help me please").await.unwrap();
    engine.dialogue.respond(&mut session, "x = 2").await.unwrap();
    assert_eq!(session.tutor.pending_question(), None);

    let turn = engine
        .dialogue
        .respond(&mut session, "Next one?")
        .await
        .unwrap();
    assert_eq!(turn.mode, PromptMode::Start);
}

#[tokio::test]
async fn failed_turn_appends_apology_and_keeps_the_pin() {
    let opening = "Reformulons : on cherche x. Peux-tu isoler le terme en x ?";
    let completion = ScriptedCompletion::new([Reply::Text(opening.into()), Reply::Fail]);
    let (engine, _) = engine(completion.clone());
    let mut session = StudentSession::new("alice", Language::Fr);

    engine.dialogue.respond(&mut session, "Aide-moi").await.unwrap();
    let pinned = session.tutor.pending_question().map(str::to_string);
    assert_eq!(pinned.as_deref(), Some("Peux-tu isoler le terme en x ?"));
    let turn = engine
        .dialogue
        .respond(&mut session, "2x = 4")
        .await
        .unwrap();

    let prompts = PromptCatalog::load();
    assert!(turn.degraded);
    assert_eq!(turn.reply, prompts.apology(Language::Fr));
    assert_eq!(session.tutor.state(), DialogueState::AwaitingStudent);
    assert_eq!(session.tutor.pending_question().map(str::to_string), pinned);
    let last = session.tutor.transcript().last().unwrap();
    assert_eq!(last.speaker, Speaker::Tutor);
}

#[tokio::test]
async fn short_messages_are_rejected_untouched() {
    let completion = ScriptedCompletion::texts([OPENING]);
    let (engine, _) = engine(completion.clone());
    let mut session = StudentSession::new("alice", Language::En);

    let err = engine.dialogue.respond(&mut session, "  ok ").await.unwrap_err();

    assert_eq!(err, DialogueError::MessageTooShort { min: 3 });
    assert!(session.tutor.is_empty());
    assert_eq!(completion.calls().await, 0);
}

#[test]
fn transcript_is_capped_at_fifteen() {
    let mut session = TutorSession::default();
    for i in 0..16 {
        session.push(TranscriptEntry::student(format!("message {i}")));
    }

    assert_eq!(session.len(), 15);
    assert_eq!(session.transcript().next().unwrap().text, "message 1");
    assert_eq!(session.transcript().last().unwrap().text, "message 15");
}

#[tokio::test]
async fn long_dialogue_never_exceeds_the_cap() {
    let replies = (0..10).map(|i| format!("Step {i}. Can you tell me the next operation?"));
    let completion = ScriptedCompletion::texts(replies);
    let (engine, _) = engine(completion);
    let mut session = StudentSession::new("alice", Language::En);

    for i in 0..10 {
        engine
            .dialogue
            .respond(&mut session, &format!("answer {i}"))
            .await
            .unwrap();
        assert!(session.tutor.len() <= 15);
    }
    assert_eq!(session.tutor.len(), 15);
    assert_eq!(
        session.tutor.transcript().last().unwrap().text,
        "Step 9. Can you tell me the next operation?"
    );
}

#[tokio::test]
async fn new_exercise_clears_everything() {
    let completion = ScriptedCompletion::texts([OPENING]);
    let (engine, _) = engine(completion);
    let mut session = StudentSession::new("alice", Language::En);
    session.tutor.subject = Subject::History;
    session.tutor.exam_mode = true;

    engine.dialogue.respond(&mut session, "Help me").await.unwrap();
    engine.dialogue.new_exercise(&mut session);

    assert!(session.tutor.is_empty());
    assert_eq!(session.tutor.state(), DialogueState::Empty);
    assert_eq!(session.tutor.pending_question(), None);
    assert_eq!(session.tutor.subject, Subject::Mathematics);
    assert!(!session.tutor.exam_mode);
}

#[tokio::test]
async fn exam_mode_and_subject_shape_the_system_prompt() {
    let completion = ScriptedCompletion::texts([OPENING]);
    let (engine, _) = engine(completion.clone());
    let mut session = StudentSession::new("alice", Language::En);
    session.tutor.subject = Subject::parse("histoire");
    session.tutor.exam_mode = true;

    engine.dialogue.respond(&mut session, "Why did the war start?").await.unwrap();

    let request = &completion.requests().await[0];
    let system = request.system_instructions.as_deref().unwrap();
    assert!(system.contains("EXAM MODE"));
    assert!(request.prompt.contains("HISTORY"));
}

#[tokio::test]
async fn gated_dialogue_follows_grants() {
    let completion = ScriptedCompletion::texts([OPENING]);
    let (engine, _) = engine(completion.clone());
    let mut session = StudentSession::new("alice", Language::En);
    let window = expired_window("alice");
    let now = Utc::now();

    let reply = engine
        .dialogue
        .respond_gated(&window, &mut session, "Help me", now)
        .await
        .unwrap();
    assert_eq!(reply, DialogueReply::Upgrade);
    assert_eq!(completion.calls().await, 0);
    assert!(session.tutor.is_empty());

    engine
        .gate
        .open_grant(&mut session, Some("ex-1".into()), 2, now);
    let reply = engine
        .dialogue
        .respond_gated(&window, &mut session, "Help me", now)
        .await
        .unwrap();
    assert!(matches!(reply, DialogueReply::Turn(_)));

    engine.gate.close_access(&mut session);
    assert!(session.remediation_grant.is_none());
    assert!(session.tutor.is_empty());
    let reply = engine
        .dialogue
        .respond_gated(&window, &mut session, "Help me", now)
        .await
        .unwrap();
    assert_eq!(reply, DialogueReply::Upgrade);
}
