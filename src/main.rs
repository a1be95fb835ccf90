#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! # remedia
//!
//! Command line front-end for the assessment and remediation engine.
//!
//! Reads `OPENAI_API_KEY` (and optionally `OPENAI_ENDPOINT`, `OPENAI_MODEL`,
//! `SUPABASE_URL`, `SUPABASE_ANON_KEY`) from the environment or a `.env` file.

use anyhow::{Context, Result};
use bpaf::*;
use chrono::Utc;
use colored::Colorize;
use dotenvy::dotenv;
use remedia::{
    Engine,
    access::AccessWindow,
    config,
    dialogue::DialogueReply,
    grading::{ExerciseContext, GradeReply, GradingOutcome},
    prompts::Subject,
    score::{ParseResult, extract_score},
    session::StudentSession,
    types::Language,
};
use tabled::{
    Table, Tabled,
    settings::{Modify, Style, Width, object::Rows},
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{EnvFilter, fmt, prelude::*, util::SubscriberInitExt};

/// Top-level CLI commands.
#[derive(Debug, Clone)]
enum Cmd {
    /// Grade one answer
    Grade {
        /// Exercise statement
        question: String,
        /// Reference answer
        expected: String,
        /// Student answer
        answer:   String,
        /// Grading language
        lang:     Language,
        /// Student identifier
        student:  String,
    },
    /// Interactive guided dialogue
    Tutor {
        /// Dialogue language
        lang:    Language,
        /// Tutor subject
        subject: Subject,
        /// School level
        level:   Option<String>,
        /// Hints only
        exam:    bool,
    },
    /// Read the score line of a saved completion
    Score {
        /// File holding the completion text
        file: String,
        /// Language of the completion
        lang: Language,
    },
}

/// Parse the command line arguments and return a `Cmd` enum
fn options() -> Cmd {
    /// parses the language flag
    fn language() -> impl Parser<Language> {
        long("lang")
            .help("Language, `fr` or `en`")
            .argument::<Language>("LANG")
            .fallback(Language::Fr)
    }

    let question = long("question")
        .short('q')
        .help("Exercise statement")
        .argument::<String>("TEXT");
    let expected = long("expected")
        .short('e')
        .help("Expected answer")
        .argument::<String>("TEXT");
    let answer = long("answer")
        .short('a')
        .help("Student answer")
        .argument::<String>("TEXT");
    let student = long("student")
        .help("Student identifier")
        .argument::<String>("ID")
        .fallback("cli-student".to_string());
    let lang = language();
    let grade = construct!(Cmd::Grade {
        question,
        expected,
        answer,
        lang,
        student
    })
    .to_options()
    .command("grade")
    .help("Grade an answer and print any remediation created");

    let subject = long("subject")
        .help("mathematics, french, history, science or geography")
        .argument::<String>("SUBJECT")
        .map(|s| Subject::parse(&s))
        .fallback(Subject::Mathematics);
    let level = long("level")
        .help("School level, e.g. `6ème`")
        .argument::<String>("LEVEL")
        .optional();
    let exam = long("exam").help("Exam mode: hints only").switch();
    let lang = language();
    let tutor = construct!(Cmd::Tutor {
        lang,
        subject,
        level,
        exam
    })
    .to_options()
    .command("tutor")
    .help("Start a guided dialogue on stdin (`/new` resets, `/quit` exits)");

    let lang = language();
    let file = positional::<String>("FILE").help("File holding a grading completion");
    let score = construct!(Cmd::Score { lang, file })
    .to_options()
    .command("score")
    .help("Extract the score line from a saved completion");

    let cmd = construct!([grade, tutor, score]);

    cmd.to_options()
        .descr("Assessment and remediation engine")
        .run()
}

/// A row of the grading summary.
#[derive(Tabled)]
struct SummaryRow {
    /// Field name
    #[tabled(rename = "Field")]
    field: String,
    /// Field value
    #[tabled(rename = "Value")]
    value: String,
}

impl SummaryRow {
    /// Convenience constructor.
    fn new(field: &str, value: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            value: value.into(),
        }
    }
}

/// Prints the result of grading
fn show_outcome(outcome: &GradingOutcome) {
    let score = match outcome.parse {
        ParseResult::Score(score) => format!("{score}/5"),
        ParseResult::Unparsed => "unparsed (0/5)".to_string(),
    };
    let mut rows = vec![
        SummaryRow::new("Submission", outcome.submission.id.to_string()),
        SummaryRow::new("Score", score),
    ];
    if let Some(suggestion) = &outcome.remediation {
        rows.push(SummaryRow::new("Remediation", suggestion.id.to_string()));
        rows.push(SummaryRow::new("Status", suggestion.status.as_str()));
    }
    if let Some(grant) = &outcome.grant {
        rows.push(SummaryRow::new(
            "Dialogue open until",
            grant.expires_at.to_rfc3339(),
        ));
    }

    eprintln!(
        "{}",
        Table::new(rows)
            .with(Modify::new(Rows::new(1..)).with(Width::wrap(60).keep_words(true)))
            .with(Style::modern())
    );
    println!("{}", outcome.result.raw_completion_text);
    if let Some(suggestion) = &outcome.remediation {
        println!("\n{}", "Remediation".bold().yellow());
        println!("{}", suggestion.generated_exercise_text);
    }
}

/// Runs the interactive dialogue loop.
async fn tutor(
    engine: &Engine,
    lang: Language,
    subject: Subject,
    level: Option<String>,
    exam: bool,
) -> Result<()> {
    let config = config::get();
    let mut session = StudentSession::new("cli-student", lang);
    session.level = level;
    session.tutor.subject = subject;
    session.tutor.exam_mode = exam;
    let window =
        AccessWindow::open(session.student_id.clone(), Utc::now(), config.trial_duration());

    let prompts = config.prompts();
    println!("{} {}", prompts.tutor_label(lang).green(), prompts.welcome(lang));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Could not read stdin")? {
        match line.trim() {
            "/quit" => break,
            "/new" => {
                engine.dialogue.new_exercise(&mut session);
                session.tutor.subject = subject;
                session.tutor.exam_mode = exam;
                continue;
            }
            _ => {}
        }

        match engine
            .dialogue
            .respond_gated(&window, &mut session, &line, Utc::now())
            .await
        {
            Ok(DialogueReply::Turn(turn)) => {
                println!("{} {}", prompts.tutor_label(lang).green(), turn.reply);
            }
            Ok(DialogueReply::Upgrade) => {
                eprintln!("{}", "Trial over: a subscription is needed.".red());
                break;
            }
            Err(e) => eprintln!("{}", e.to_string().yellow()),
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let fmt = fmt::layer()
        .without_time()
        .with_file(false)
        .with_line_number(false);
    let filter_layer =
        EnvFilter::try_from_env("REMEDIA_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt)
        .with(filter_layer)
        .init();

    let cmd = options();

    match cmd {
        Cmd::Grade {
            question,
            expected,
            answer,
            lang,
            student,
        } => {
            let engine = Engine::from_config()?;
            let mut session = StudentSession::new(student, lang);
            let window = AccessWindow::open(
                session.student_id.clone(),
                Utc::now(),
                config::get().trial_duration(),
            );
            let exercise = ExerciseContext::builder()
                .question(question)
                .expected_answer(expected)
                .build();
            match engine
                .grader
                .grade_gated(&window, &mut session, &exercise, &answer, Utc::now())
                .await
            {
                Ok(GradeReply::Graded(outcome)) => show_outcome(&outcome),
                Ok(GradeReply::Upgrade) => {
                    eprintln!("{}", "Trial over: a subscription is needed.".red())
                }
                Err(e) => eprintln!("{}", e.to_string().red()),
            }
        }
        Cmd::Tutor {
            lang,
            subject,
            level,
            exam,
        } => {
            let engine = Engine::from_config()?;
            tutor(&engine, lang, subject, level, exam).await?;
        }
        Cmd::Score { file, lang } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("Could not read `{file}`"))?;
            match extract_score(&text, lang) {
                ParseResult::Score(score) => println!("{score}/5"),
                ParseResult::Unparsed => println!("{}", "unparsed".yellow()),
            }
        }
    }

    Ok(())
}
