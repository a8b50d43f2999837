//! The `quizforge run` command.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Deserialize;

use quizforge_core::engine::{QuizEngine, QuizEngineConfig};
use quizforge_core::evaluate::Evaluation;
use quizforge_core::model::{Answer, QuestionKind, QuestionSpec, SessionAnalytics};
use quizforge_core::traits::{AssignmentRecord, LlmProvider, StudentRecord, SubtopicRecord};
use quizforge_providers::config::load_config_from;
use quizforge_providers::create_provider;
use quizforge_providers::mock::MockProvider;
use quizforge_store::MemoryStore;

/// Session data file: the students, assignments, and subtopics a session
/// can be started against.
#[derive(Debug, Deserialize)]
struct SessionFile {
    #[serde(default)]
    students: Vec<StudentRecord>,
    #[serde(default)]
    assignments: Vec<AssignmentRecord>,
    #[serde(default)]
    subtopics: Vec<SubtopicRecord>,
}

pub async fn execute(
    student: String,
    quiz: String,
    session_file: Option<PathBuf>,
    provider_name: Option<String>,
    model: Option<String>,
    config_path: Option<PathBuf>,
    demo: bool,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;

    let store = Arc::new(MemoryStore::new());

    let provider: Arc<dyn LlmProvider> = if demo {
        seed_demo_data(&store);
        Arc::new(MockProvider::with_script(demo_questions()))
    } else {
        let path = session_file
            .context("--session-file is required unless running with --demo")?;
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read session file: {}", path.display()))?;
        let data: SessionFile = toml::from_str(&content)
            .with_context(|| format!("failed to parse session file: {}", path.display()))?;
        for s in data.students {
            store.insert_student(s);
        }
        for a in data.assignments {
            store.insert_assignment(a);
        }
        for t in data.subtopics {
            store.insert_subtopic(t);
        }

        let name = provider_name.unwrap_or_else(|| config.default_provider.clone());
        let pconfig = config.providers.get(&name).with_context(|| {
            format!(
                "provider '{}' not found in config. Available: {:?}",
                name,
                config.providers.keys().collect::<Vec<_>>()
            )
        })?;
        Arc::from(create_provider(&name, pconfig)?)
    };

    let engine_config = QuizEngineConfig {
        model: model.unwrap_or_else(|| config.default_model.clone()),
        max_tokens: config.max_tokens,
        temperature: config.default_temperature,
        max_questions: config.max_questions,
    };
    let engine = QuizEngine::new(
        provider,
        store.clone(),
        store.clone(),
        store.clone(),
        engine_config,
    );

    let state = engine.initialize(&student, &quiz).await?;
    println!(
        "Quiz session: {} / {} / {}",
        state.subject, state.chapter, state.subtopic
    );
    println!("Answer each question, or type 'quit' to finish early.\n");

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut answers: Vec<Answer> = Vec::new();

    for n in 1..=state.max_questions {
        let spec = engine.next_question(&state, n, &answers).await;
        print_question(n, state.max_questions, &spec);

        let Some(submitted) = read_answer(&mut input, &spec)? else {
            break;
        };

        let evaluation = engine.evaluate(&spec, &submitted);
        print_feedback(&evaluation);

        answers.push(Answer {
            question: spec.question.clone(),
            response: submitted,
            is_correct: evaluation.is_correct,
            cognitive_analysis: evaluation.cognitive_analysis,
            answered_at: chrono::Utc::now(),
        });
    }

    let analytics = engine.finalize(&state, &answers).await?;
    tracing::debug!(
        questions = analytics.total_questions,
        score = analytics.score,
        "session complete"
    );
    print_summary(&analytics);

    Ok(())
}

fn print_question(number: u32, total: u32, spec: &QuestionSpec) {
    println!("Question {number}/{total}: {}", spec.question);
    if let QuestionKind::MultipleChoice { options, .. } = &spec.kind {
        for (i, option) in options.iter().enumerate() {
            println!("  {}. {option}", i + 1);
        }
    }
}

/// Read one answer line. Returns None on EOF or 'quit'.
///
/// For multiple-choice questions a bare option number is accepted and
/// mapped to the option text before grading.
fn read_answer(input: &mut impl BufRead, spec: &QuestionSpec) -> Result<Option<String>> {
    print!("> ");
    io::stdout().flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        println!();
        return Ok(None);
    }
    let trimmed = line.trim();
    if trimmed.eq_ignore_ascii_case("quit") {
        return Ok(None);
    }

    if let QuestionKind::MultipleChoice { options, .. } = &spec.kind {
        if let Ok(index) = trimmed.parse::<usize>() {
            if index >= 1 && index <= options.len() {
                return Ok(Some(options[index - 1].clone()));
            }
        }
    }
    Ok(Some(trimmed.to_string()))
}

fn print_feedback(evaluation: &Evaluation) {
    println!("{}", evaluation.feedback);
    if !evaluation.is_correct && !evaluation.explanation.is_empty() {
        println!("  {}", evaluation.explanation);
    }
    println!();
}

fn print_summary(analytics: &SessionAnalytics) {
    use comfy_table::{Cell, Table};

    if analytics.total_questions == 0 {
        println!("No questions answered; nothing to report.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["Score", "Correct", "Recall", "Conceptual", "Reasoning"]);

    let skill_cell = |avg: Option<f64>| match avg {
        Some(v) => format!("{:.2}", v),
        None => "-".to_string(),
    };

    table.add_row(vec![
        Cell::new(format!("{:.1}%", analytics.score)),
        Cell::new(format!(
            "{}/{}",
            analytics.correct_answers, analytics.total_questions
        )),
        Cell::new(skill_cell(analytics.skill_averages.recall)),
        Cell::new(skill_cell(analytics.skill_averages.conceptual)),
        Cell::new(skill_cell(analytics.skill_averages.reasoning)),
    ]);

    println!("{table}");
    println!("\n{}", analytics.summary);
}

/// Built-in sample data for `--demo` runs.
fn seed_demo_data(store: &MemoryStore) {
    store.insert_student(StudentRecord {
        id: "demo-student".into(),
        name: "Demo Student".into(),
    });
    store.insert_assignment(AssignmentRecord {
        id: "demo-quiz".into(),
        subject: "Biology".into(),
        chapter: "Cell Structure".into(),
        subtopic_id: "organelles".into(),
    });
    store.insert_subtopic(SubtopicRecord {
        id: "organelles".into(),
        title: "Organelles".into(),
        content: "Eukaryotic cells contain membrane-bound organelles. The nucleus \
                  stores genetic material, mitochondria produce ATP through cellular \
                  respiration, ribosomes synthesize proteins, and the Golgi apparatus \
                  packages proteins for transport."
            .into(),
    });
}

/// Canned question set served by the mock provider during `--demo` runs.
fn demo_questions() -> Vec<String> {
    vec![
        r#"{
            "type": "multiple_choice",
            "question": "Which organelle produces most of a cell's ATP?",
            "options": ["Nucleus", "Mitochondrion", "Ribosome", "Golgi apparatus"],
            "correct_answer": "Mitochondrion",
            "difficulty": 0.3,
            "explanation": "ATP synthesis happens on the inner mitochondrial membrane.",
            "cognitive_analysis": {"memory_retrieval": 0.8}
        }"#
        .to_string(),
        r#"{
            "type": "short_answer",
            "question": "Name the organelle that stores a cell's genetic material.",
            "answer_pattern": "nucleus",
            "expected_keywords": ["nucleus"],
            "difficulty": 0.4,
            "explanation": "The nucleus houses the cell's DNA.",
            "cognitive_analysis": {"memory_retrieval": 0.9}
        }"#
        .to_string(),
        r#"{
            "type": "multiple_choice",
            "question": "A cell suddenly loses its ribosomes. Which process stops first?",
            "options": ["Protein synthesis", "ATP production", "DNA replication", "Lipid storage"],
            "correct_answer": "Protein synthesis",
            "difficulty": 0.5,
            "explanation": "Ribosomes translate mRNA into proteins; without them translation halts.",
            "cognitive_analysis": {"problem_solving": 0.7, "conceptual": 0.3}
        }"#
        .to_string(),
        r#"{
            "type": "short_answer",
            "question": "Explain in one sentence why mitochondria are called the powerhouse of the cell.",
            "answer_pattern": "(atp|energy)",
            "expected_keywords": ["ATP", "energy"],
            "difficulty": 0.6,
            "explanation": "They generate most of the cell's usable energy as ATP.",
            "cognitive_analysis": {"conceptual": 0.8}
        }"#
        .to_string(),
    ]
}
