//! Session finalization: reduce a completed session's answers into the
//! analytics record that gets persisted.

use std::fmt::Write as _;

use chrono::Utc;

use crate::model::{Answer, CognitiveSkill, SessionAnalytics, SessionState, SkillAverages};

/// Compute the aggregate analytics for a completed session.
///
/// Score is `100 × correct / total`. Per-skill averages are the mean of
/// that skill's recorded weight across the answers that reported it. An
/// empty answer list yields [`SessionAnalytics::empty`]; the caller must
/// not persist that.
pub fn compute_analytics(state: &SessionState, answers: &[Answer]) -> SessionAnalytics {
    if answers.is_empty() {
        return SessionAnalytics::empty(&state.student_id, &state.assigned_quiz_id, &state.subtopic);
    }

    let total = answers.len() as u32;
    let correct = answers.iter().filter(|a| a.is_correct).count() as u32;
    let score = 100.0 * correct as f64 / total as f64;

    let skill_averages = average_skill_weights(answers);
    let summary = narrative_summary(score, correct, total, &skill_averages);

    SessionAnalytics {
        score,
        skill_averages,
        total_questions: total,
        correct_answers: correct,
        answers: answers.to_vec(),
        summary,
        subtopic: state.subtopic.clone(),
        assigned_quiz_id: state.assigned_quiz_id.clone(),
        student_id: state.student_id.clone(),
        completed_at: Utc::now(),
    }
}

/// Mean recorded weight per skill across answers that reported it.
fn average_skill_weights(answers: &[Answer]) -> SkillAverages {
    let mut sums = [0.0f64; 3];
    let mut counts = [0u32; 3];

    for answer in answers {
        for (label, &weight) in &answer.cognitive_analysis {
            let Ok(skill) = label.parse::<CognitiveSkill>() else {
                continue;
            };
            let idx = skill_index(skill);
            sums[idx] += weight;
            counts[idx] += 1;
        }
    }

    let average = |skill: CognitiveSkill| {
        let idx = skill_index(skill);
        if counts[idx] == 0 {
            None
        } else {
            Some(sums[idx] / counts[idx] as f64)
        }
    };

    SkillAverages {
        recall: average(CognitiveSkill::Recall),
        conceptual: average(CognitiveSkill::Conceptual),
        reasoning: average(CognitiveSkill::Reasoning),
    }
}

fn skill_index(skill: CognitiveSkill) -> usize {
    match skill {
        CognitiveSkill::Recall => 0,
        CognitiveSkill::Conceptual => 1,
        CognitiveSkill::Reasoning => 2,
    }
}

fn narrative_summary(score: f64, correct: u32, total: u32, averages: &SkillAverages) -> String {
    let mut summary = format!(
        "Answered {correct} of {total} questions correctly ({score:.1}%)."
    );

    let mut reported: Vec<(CognitiveSkill, f64)> = CognitiveSkill::ALL
        .iter()
        .filter_map(|&skill| averages.get(skill).map(|avg| (skill, avg)))
        .collect();
    if !reported.is_empty() {
        reported.sort_by(|a, b| b.1.total_cmp(&a.1));
        let (strongest, best) = reported[0];
        let _ = write!(summary, " Strongest skill: {strongest} (avg {best:.2}).");
        if reported.len() > 1 {
            let (weakest, worst) = reported[reported.len() - 1];
            if weakest != strongest {
                let _ = write!(summary, " Focus next on {weakest} (avg {worst:.2}).");
            }
        }
    }

    summary
}
