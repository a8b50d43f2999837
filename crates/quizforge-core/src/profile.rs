//! Skill profiling: reduces an answer history into per-skill attempt and
//! correct counts.

use serde::{Deserialize, Serialize};

use crate::model::{Answer, CognitiveAnalysis, CognitiveSkill};

/// Attempt/correct counters for one skill.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillStats {
    pub count: u32,
    pub correct: u32,
}

impl SkillStats {
    /// Fraction of attempts answered correctly; `None` with no attempts.
    pub fn correct_rate(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.correct as f64 / self.count as f64)
        }
    }
}

/// Per-skill attempt/correct counts derived from an answer list.
///
/// Never stored directly: recomputed from the answers whenever needed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillProfile {
    pub recall: SkillStats,
    pub conceptual: SkillStats,
    pub reasoning: SkillStats,
}

impl SkillProfile {
    /// Classify each answer into its dominant skill bucket and count it.
    ///
    /// An answer with an empty cognitive analysis, or whose dominant label
    /// is unrecognized, contributes to no bucket.
    pub fn from_answers(answers: &[Answer]) -> Self {
        let mut profile = Self::default();
        for answer in answers {
            let Some(skill) = dominant_skill(&answer.cognitive_analysis) else {
                continue;
            };
            let stats = profile.stats_mut(skill);
            stats.count += 1;
            if answer.is_correct {
                stats.correct += 1;
            }
        }
        profile
    }

    pub fn stats(&self, skill: CognitiveSkill) -> SkillStats {
        match skill {
            CognitiveSkill::Recall => self.recall,
            CognitiveSkill::Conceptual => self.conceptual,
            CognitiveSkill::Reasoning => self.reasoning,
        }
    }

    fn stats_mut(&mut self, skill: CognitiveSkill) -> &mut SkillStats {
        match skill {
            CognitiveSkill::Recall => &mut self.recall,
            CognitiveSkill::Conceptual => &mut self.conceptual,
            CognitiveSkill::Reasoning => &mut self.reasoning,
        }
    }

    /// Combine two profiles (e.g. current session + prior chapter history).
    pub fn merge(&self, other: &Self) -> Self {
        let mut merged = *self;
        for skill in CognitiveSkill::ALL {
            let theirs = other.stats(skill);
            let stats = merged.stats_mut(skill);
            stats.count += theirs.count;
            stats.correct += theirs.correct;
        }
        merged
    }

    /// Total answers that landed in any bucket.
    pub fn total_attempts(&self) -> u32 {
        CognitiveSkill::ALL
            .iter()
            .map(|&s| self.stats(s).count)
            .sum()
    }
}

/// The max-weight entry of a cognitive analysis, classified into a skill.
///
/// Strictly-greater comparison over insertion order means ties resolve to
/// the first-encountered label. An unrecognized dominant label yields
/// `None`; a weaker recognized label does not get promoted in its place.
pub fn dominant_skill(analysis: &CognitiveAnalysis) -> Option<CognitiveSkill> {
    let mut best: Option<(&str, f64)> = None;
    for (label, &weight) in analysis {
        match best {
            Some((_, w)) if weight <= w => {}
            _ => best = Some((label.as_str(), weight)),
        }
    }
    let (label, _) = best?;
    match label.parse::<CognitiveSkill>() {
        Ok(skill) => Some(skill),
        Err(_) => {
            tracing::debug!("skipping answer with unrecognized dominant skill label: {label}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn answer(labels: &[(&str, f64)], is_correct: bool) -> Answer {
        let mut analysis = CognitiveAnalysis::new();
        for (label, weight) in labels {
            analysis.insert(label.to_string(), *weight);
        }
        Answer {
            question: "q".into(),
            response: "r".into(),
            is_correct,
            cognitive_analysis: analysis,
            answered_at: Utc::now(),
        }
    }

    #[test]
    fn empty_list_yields_zero_buckets() {
        let profile = SkillProfile::from_answers(&[]);
        assert_eq!(profile, SkillProfile::default());
        assert_eq!(profile.total_attempts(), 0);
    }

    #[test]
    fn dominant_label_is_classified() {
        let answers = vec![
            answer(&[("memory_retrieval", 0.9), ("problem_solving", 0.2)], true),
            answer(&[("problem_solving", 0.8)], false),
            answer(&[("concept_application", 0.7)], true),
        ];
        let profile = SkillProfile::from_answers(&answers);
        assert_eq!(profile.recall, SkillStats { count: 1, correct: 1 });
        assert_eq!(profile.reasoning, SkillStats { count: 1, correct: 0 });
        assert_eq!(profile.conceptual, SkillStats { count: 1, correct: 1 });
    }

    #[test]
    fn tie_breaks_to_first_encountered_label() {
        let answers = vec![answer(
            &[("problem_solving", 0.5), ("memory_retrieval", 0.5)],
            true,
        )];
        let profile = SkillProfile::from_answers(&answers);
        assert_eq!(profile.reasoning.count, 1);
        assert_eq!(profile.recall.count, 0);
    }

    #[test]
    fn unrecognized_dominant_label_is_dropped() {
        // "creativity" wins the weight contest but parses to no bucket; the
        // weaker recall label must not be promoted.
        let answers = vec![answer(&[("creativity", 0.9), ("recall", 0.3)], true)];
        let profile = SkillProfile::from_answers(&answers);
        assert_eq!(profile.total_attempts(), 0);
    }

    #[test]
    fn empty_analysis_contributes_nothing() {
        let answers = vec![answer(&[], true), answer(&[("recall", 0.6)], false)];
        let profile = SkillProfile::from_answers(&answers);
        assert_eq!(profile.total_attempts(), 1);
        assert_eq!(profile.recall, SkillStats { count: 1, correct: 0 });
    }

    #[test]
    fn attempt_sum_never_exceeds_input_length() {
        let answers = vec![
            answer(&[("recall", 0.4)], true),
            answer(&[("weird_label", 1.0)], true),
            answer(&[], false),
            answer(&[("analysis", 0.9)], true),
        ];
        let profile = SkillProfile::from_answers(&answers);
        assert!(profile.total_attempts() as usize <= answers.len());
        for skill in CognitiveSkill::ALL {
            let stats = profile.stats(skill);
            assert!(stats.correct <= stats.count);
        }
    }

    #[test]
    fn merge_adds_counts() {
        let current = SkillProfile {
            recall: SkillStats { count: 2, correct: 1 },
            ..Default::default()
        };
        let history = SkillProfile {
            recall: SkillStats { count: 3, correct: 3 },
            reasoning: SkillStats { count: 1, correct: 0 },
            ..Default::default()
        };
        let merged = current.merge(&history);
        assert_eq!(merged.recall, SkillStats { count: 5, correct: 4 });
        assert_eq!(merged.reasoning, SkillStats { count: 1, correct: 0 });
    }

    #[test]
    fn correct_rate() {
        let stats = SkillStats { count: 4, correct: 3 };
        assert_eq!(stats.correct_rate(), Some(0.75));
        assert_eq!(SkillStats::default().correct_rate(), None);
    }
}
