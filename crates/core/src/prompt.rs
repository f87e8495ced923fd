use crate::llm::CompletionRequest;
use crate::traits::CompletionProvider;
use crate::GenerationError;
use serde::{Deserialize, Serialize};
use tracing::info;

pub const SYSTEM_INSTRUCTION: &str = "Você é um especialista em elaboração de questões para o ENEM, focado em criar itens de alta qualidade, contextualizados e alinhados com a Matriz de Referência. Siga estritamente as especificações e o formato JSON de saída.";

pub const KNOWLEDGE_AREAS: &[(&str, &[&str])] = &[
    (
        "Linguagens, Códigos e suas Tecnologias",
        &[
            "Língua Portuguesa",
            "Literatura",
            "Língua Estrangeira (Inglês)",
            "Língua Estrangeira (Espanhol)",
            "Artes",
            "Educação Física",
            "Tecnologias da Informação e Comunicação",
        ],
    ),
    ("Matemática e suas Tecnologias", &["Matemática"]),
    (
        "Ciências da Natureza e suas Tecnologias",
        &["Física", "Química", "Biologia"],
    ),
    (
        "Ciências Humanas e Sociais Aplicadas",
        &["História", "Geografia", "Filosofia", "Sociologia"],
    ),
];

pub fn knowledge_area(discipline: &str) -> Option<&'static str> {
    KNOWLEDGE_AREAS
        .iter()
        .find(|(_, disciplines)| disciplines.contains(&discipline))
        .map(|(area, _)| *area)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Objective,
    Subjective,
}

impl QuestionType {
    fn as_str(self) -> &'static str {
        match self {
            Self::Objective => "objective",
            Self::Subjective => "subjective",
        }
    }
}

#[derive(Debug, Clone)]
pub struct QuestionRequest {
    pub count: u32,
    pub question_type: QuestionType,
    pub discipline: String,
    pub school_year: String,
    pub difficulty: String,
    pub bloom_level: String,
    pub construction_type: String,
    pub topics: String,
    pub temperature: f32,
}

impl QuestionRequest {
    /// Text used to retrieve document context: the topics, or the discipline
    /// when no topics were given.
    pub fn retrieval_query(&self) -> &str {
        if self.topics.trim().is_empty() {
            &self.discipline
        } else {
            &self.topics
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedQuestion {
    pub stem: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(rename = "answerIndex", default, skip_serializing_if = "Option::is_none")]
    pub answer_index: Option<usize>,
    #[serde(rename = "expectedAnswer", default, skip_serializing_if = "Option::is_none")]
    pub expected_answer: Option<String>,
}

pub fn build_question_prompt(request: &QuestionRequest, context: &str) -> String {
    let question_type = match request.question_type {
        QuestionType::Objective => "Objetiva de múltipla escolha (A, B, C, D, E)",
        QuestionType::Subjective => "Dissertativa",
    };
    let area = knowledge_area(&request.discipline).unwrap_or("Área não identificada");
    let topics = if request.topics.trim().is_empty() {
        "Tópicos gerais da disciplina para a série especificada."
    } else {
        request.topics.trim()
    };

    let context_block = if context.trim().is_empty() {
        "Nenhum contexto adicional foi fornecido. Baseie-se no conhecimento geral da disciplina.".to_string()
    } else {
        format!("--- INÍCIO DO CONTEXTO ---\n{}\n--- FIM DO CONTEXTO ---", context.trim())
    };
    let shape = match request.question_type {
        QuestionType::Objective => "\"options\": [\"Alternativa A\", \"Alternativa B\", \"Alternativa C\", \"Alternativa D\", \"Alternativa E\"],\n    \"answerIndex\": <índice da resposta correta, de 0 a 4>",
        QuestionType::Subjective => "\"expectedAnswer\": \"A resposta detalhada esperada para a questão dissertativa.\"",
    };

    let mut prompt = String::from("# Pedido de Geração de Questões para o ENEM\n\n");

    prompt.push_str("**1. Perfil do Gerador:**\n");
    prompt.push_str("- Crie questões claras, precisas, contextualizadas e que avaliem habilidades cognitivas complexas, conforme a Taxonomia de Bloom.\n");
    prompt.push_str("- As questões devem ser originais e evitar plágio.\n");
    prompt.push_str("- Para questões objetivas, as alternativas devem ser plausíveis e apenas uma pode ser a correta. O gabarito é o índice da alternativa correta (0 para A, 1 para B, etc.).\n");
    prompt.push_str("- Para questões dissertativas, a resposta esperada deve ser um guia claro do que o aluno precisa abordar.\n\n");

    prompt.push_str("**2. Parâmetros da Geração:**\n");
    prompt.push_str(&format!(
        "- **Quantidade:** {}\n- **Tipo de Questão:** {question_type}\n- **Disciplina:** {} (Área de Conhecimento: {area})\n- **Série/Ano:** {}\n- **Nível de Dificuldade:** {}\n- **Nível de Criatividade (Temperatura):** {:.2}\n- **Nível da Taxonomia de Bloom:** {}\n- **Tipo de Construção da Questão:** {}\n- **Tópicos/Conteúdos:** {topics}\n\n",
        request.count,
        request.discipline,
        request.school_year,
        request.difficulty,
        request.temperature,
        request.bloom_level,
        request.construction_type,
    ));

    prompt.push_str("**3. Contexto Adicional (se fornecido):**\n");
    prompt.push_str(&context_block);
    prompt.push_str("\n\n");

    prompt.push_str("**4. Formato de Saída OBRIGATÓRIO (JSON Array):**\n");
    prompt.push_str("- Responda com um array de objetos JSON, um por questão, exatamente com a estrutura:\n");
    prompt.push_str(&format!(
        "```json\n[\n  {{\n    \"stem\": \"O enunciado completo da questão, incluindo texto de apoio ou imagem descrita como [Descrição da Imagem].\",\n    \"type\": \"{}\",\n    {shape}\n  }}\n]\n```\n",
        request.question_type.as_str()
    ));
    prompt.push_str("- **NÃO inclua NENHUM texto antes ou depois do array JSON.** A resposta deve começar com `[` e terminar com `]`.");

    prompt
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening fence line.
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

pub fn parse_generated_questions(raw: &str) -> Result<Vec<GeneratedQuestion>, GenerationError> {
    let questions: Vec<GeneratedQuestion> = serde_json::from_str(strip_code_fence(raw))?;

    for (index, question) in questions.iter().enumerate() {
        if question.stem.trim().is_empty() {
            return Err(GenerationError::InvalidOutput(format!(
                "question {index} has an empty stem"
            )));
        }
        if question.question_type == QuestionType::Objective {
            let options = question.options.as_deref().unwrap_or_default();
            let answer_ok = question
                .answer_index
                .is_some_and(|answer| answer < options.len());
            if options.is_empty() || !answer_ok {
                return Err(GenerationError::InvalidOutput(format!(
                    "objective question {index} needs options and a valid answerIndex"
                )));
            }
        }
    }

    Ok(questions)
}

pub async fn generate_questions<P>(
    provider: &P,
    request: &QuestionRequest,
    context: &str,
) -> Result<Vec<GeneratedQuestion>, GenerationError>
where
    P: CompletionProvider + ?Sized,
{
    let completion = CompletionRequest {
        prompt: build_question_prompt(request, context),
        system_instruction: Some(SYSTEM_INSTRUCTION.to_string()),
        temperature: Some(request.temperature),
        json_output: true,
    };

    let raw = provider.complete(&completion).await?.into_text()?;
    let questions = parse_generated_questions(&raw)?;
    info!(
        provider = provider.provider_name(),
        requested = request.count,
        received = questions.len(),
        "questions generated"
    );
    Ok(questions)
}
