use crate::prompt::{GeneratedQuestion, QuestionRequest, QuestionType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A generated question as kept in the question bank, with the parameters
/// it was generated under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredQuestion {
    pub id: String,
    pub stem: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(rename = "answerIndex", default, skip_serializing_if = "Option::is_none")]
    pub answer_index: Option<usize>,
    #[serde(rename = "expectedAnswer", default, skip_serializing_if = "Option::is_none")]
    pub expected_answer: Option<String>,
    pub favorited: bool,
    pub discipline: String,
    #[serde(rename = "bloomLevel")]
    pub bloom_level: String,
    #[serde(rename = "constructionType")]
    pub construction_type: String,
    pub difficulty: String,
    #[serde(rename = "schoolYear")]
    pub school_year: String,
    pub topics: Vec<String>,
    #[serde(rename = "creationDate")]
    pub creation_date: DateTime<Utc>,
}

/// Comma-separated topics, trimmed, blanks dropped.
pub fn split_topics(topics: &str) -> Vec<String> {
    topics
        .split(',')
        .map(str::trim)
        .filter(|topic| !topic.is_empty())
        .map(str::to_string)
        .collect()
}

impl StoredQuestion {
    pub fn from_generated(
        question: GeneratedQuestion,
        request: &QuestionRequest,
        creation_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            stem: question.stem,
            question_type: question.question_type,
            options: question.options,
            answer_index: question.answer_index,
            expected_answer: question.expected_answer,
            favorited: false,
            discipline: request.discipline.clone(),
            bloom_level: request.bloom_level.clone(),
            construction_type: request.construction_type.clone(),
            difficulty: request.difficulty.clone(),
            school_year: request.school_year.clone(),
            topics: split_topics(&request.topics),
            creation_date,
        }
    }
}

/// Stamps a generated batch with ids and one shared creation time.
pub fn stamp_questions(
    questions: Vec<GeneratedQuestion>,
    request: &QuestionRequest,
) -> Vec<StoredQuestion> {
    let creation_date = Utc::now();
    questions
        .into_iter()
        .map(|question| StoredQuestion::from_generated(question, request, creation_date))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> QuestionRequest {
        QuestionRequest {
            count: 2,
            question_type: QuestionType::Objective,
            discipline: "Geografia".to_string(),
            school_year: "2º ano do Ensino Médio".to_string(),
            difficulty: "Difícil".to_string(),
            bloom_level: "Avaliar".to_string(),
            construction_type: "Análise de gráfico".to_string(),
            topics: "clima, , relevo ,hidrografia".to_string(),
            temperature: 0.4,
        }
    }

    fn generated(stem: &str) -> GeneratedQuestion {
        GeneratedQuestion {
            stem: stem.to_string(),
            question_type: QuestionType::Objective,
            options: Some(vec!["A".to_string(), "B".to_string()]),
            answer_index: Some(0),
            expected_answer: None,
        }
    }

    #[test]
    fn topics_are_split_on_commas() {
        assert_eq!(split_topics("clima, , relevo ,hidrografia"), vec!["clima", "relevo", "hidrografia"]);
        assert!(split_topics("  ").is_empty());
    }

    #[test]
    fn stamped_questions_carry_request_metadata() {
        let stored = stamp_questions(vec![generated("Qual bioma?"), generated("Qual clima?")], &request());

        assert_eq!(stored.len(), 2);
        assert_ne!(stored[0].id, stored[1].id);
        assert_eq!(stored[0].creation_date, stored[1].creation_date);
        assert!(Uuid::parse_str(&stored[0].id).is_ok());

        let first = &stored[0];
        assert_eq!(first.stem, "Qual bioma?");
        assert!(!first.favorited);
        assert_eq!(first.discipline, "Geografia");
        assert_eq!(first.bloom_level, "Avaliar");
        assert_eq!(first.construction_type, "Análise de gráfico");
        assert_eq!(first.difficulty, "Difícil");
        assert_eq!(first.school_year, "2º ano do Ensino Médio");
        assert_eq!(first.topics, vec!["clima", "relevo", "hidrografia"]);
        assert_eq!(first.answer_index, Some(0));
    }

    #[test]
    fn serialized_field_names_are_camel_case() -> Result<(), serde_json::Error> {
        let stored = StoredQuestion::from_generated(generated("Qual bioma?"), &request(), Utc::now());
        let value = serde_json::to_value(&stored)?;

        for key in ["id", "type", "answerIndex", "favorited", "bloomLevel", "constructionType", "schoolYear", "topics", "creationDate"] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
        assert!(value.get("expectedAnswer").is_none());
        Ok(())
    }
}
