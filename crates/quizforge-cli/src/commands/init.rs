//! The `quizforge init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    // Create quizforge.toml
    if std::path::Path::new("quizforge.toml").exists() {
        println!("quizforge.toml already exists, skipping.");
    } else {
        std::fs::write("quizforge.toml", SAMPLE_CONFIG)?;
        println!("Created quizforge.toml");
    }

    // Create example session data
    std::fs::create_dir_all("sessions")?;
    let example_path = std::path::Path::new("sessions/example.toml");
    if example_path.exists() {
        println!("sessions/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_SESSION)?;
        println!("Created sessions/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Edit quizforge.toml with your API keys");
    println!("  2. Try it offline: quizforge run --demo");
    println!("  3. Run a real session: quizforge run --student alice --quiz quiz-cells --session-file sessions/example.toml");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# quizforge configuration

[providers.anthropic]
type = "anthropic"
api_key = "${ANTHROPIC_API_KEY}"

[providers.openai]
type = "openai"
api_key = "${OPENAI_API_KEY}"

[providers.ollama]
type = "ollama"
base_url = "http://localhost:11434"

default_provider = "anthropic"
default_model = "claude-sonnet-4-20250514"
default_temperature = 0.7
max_questions = 15
"#;

const EXAMPLE_SESSION: &str = r#"# Example session data: who can take which quiz, and the learning
# content questions are generated from.

[[students]]
id = "alice"
name = "Alice Johnson"

[[assignments]]
id = "quiz-cells"
subject = "Biology"
chapter = "Cell Structure"
subtopic_id = "organelles"

[[subtopics]]
id = "organelles"
title = "Organelles"
content = """
Eukaryotic cells contain membrane-bound organelles, each with a specialized
role. The nucleus stores genetic material and controls gene expression.
Mitochondria produce ATP through cellular respiration. Ribosomes synthesize
proteins from mRNA templates. The Golgi apparatus modifies and packages
proteins for transport.
"""
"#;
