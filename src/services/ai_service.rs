use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;

use crate::error::{Error, Result};
use crate::models::candidate::Candidate;
use crate::models::coding::{CodingProblem, ExecutionReport, SolutionAssessment};
use crate::models::mcq::{McqQuestion, OPTIONS_PER_QUESTION};
use crate::models::resume::{ParsedResume, RawResumeFields};
use crate::models::video::AnswerAssessment;

const SERVICE: &str = "llm";

/// Produces stage content for a candidate.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
    async fn generate_mcqs(&self, candidate: &Candidate) -> Result<Vec<McqQuestion>>;

    async fn generate_behavioral_question(&self, candidate: &Candidate) -> Result<String>;

    async fn generate_coding_problem(&self, candidate: &Candidate) -> Result<CodingProblem>;
}

/// Scores free-form candidate work.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Assessor: Send + Sync {
    async fn assess_answer(&self, question: &str, transcript: &str) -> Result<AnswerAssessment>;

    async fn assess_solution(
        &self,
        problem: &CodingProblem,
        solution: &str,
        report: &ExecutionReport,
    ) -> Result<SolutionAssessment>;
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system", content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user", content: content.into() }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatChoiceMessage>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// OpenAI-compatible chat completions client.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl LlmClient {
    pub fn new(client: Client, api_url: String, api_key: String, model: String) -> Self {
        Self {
            client,
            api_url,
            api_key,
            model,
        }
    }

    /// Returns the trimmed content of the first choice.
    pub async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        temperature: f32,
        max_tokens: Option<u32>,
    ) -> Result<String> {
        let mut payload = json!({
            "model": self.model,
            "messages": messages,
            "temperature": temperature,
            "stream": false,
        });
        if let Some(max_tokens) = max_tokens {
            payload["max_tokens"] = json!(max_tokens);
        }

        let started = Instant::now();
        let res = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::upstream(SERVICE, e.to_string()))?;

        let status = res.status();
        tracing::info!(
            model = %self.model,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "llm completion returned"
        );
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(Error::upstream(SERVICE, format!("status {}: {}", status, text)));
        }

        let body: ChatResponse = res
            .json()
            .await
            .map_err(|e| Error::upstream(SERVICE, format!("unreadable response: {}", e)))?;
        let choice = body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::upstream(SERVICE, "response has no choices"))?;

        if choice.finish_reason.as_deref() == Some("length") {
            return Err(Error::upstream(SERVICE, "completion truncated by token limit"));
        }

        choice
            .message
            .and_then(|m| m.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| Error::upstream(SERVICE, "empty completion"))
    }
}

#[derive(Clone)]
pub struct AIService {
    llm: LlmClient,
    mcq_count: usize,
}

impl AIService {
    pub fn new(llm: LlmClient, mcq_count: usize) -> Self {
        Self {
            llm,
            mcq_count: mcq_count.max(1),
        }
    }

    /// Turns heuristic resume fields into the fixed review schema.
    pub async fn normalize_resume(&self, raw: &RawResumeFields) -> Result<ParsedResume> {
        let system = "You are a robotic JSON normalizer. You respond with exactly valid JSON \
            and nothing else: no thoughts, no markdown, no extra fields, no wrappers.";
        let prompt = format!(
            r#"Normalize the raw resume data below into JSON.

Rules:
1. Use ONLY the raw data. Never invent values.
2. "designation" is the job title of the most recent role, without dates or company.
3. "experienceTimeline" entries have "title" (the full role line), "company" (the
   company named right after the title, or "") and "duration" (the date part only).
4. Drop entries that are education (Bachelor, Master, B.Tech, University).

Return exactly this structure:
{{"name":"","email":"","phone":"","location":"","summary":"","designation":"","skills":[],"experienceTimeline":[{{"title":"","company":"","duration":""}}]}}

RAW INPUT DATA:
{}"#,
            serde_json::to_string_pretty(raw)?
        );

        let content = self
            .llm
            .complete(
                vec![ChatMessage::system(system), ChatMessage::user(prompt)],
                0.3,
                Some(1024),
            )
            .await?;
        decode_parsed_resume(&content)
    }
}

fn candidate_skills(candidate: &Candidate, default: &str) -> String {
    if candidate.skills.is_empty() {
        default.to_string()
    } else {
        candidate.skills.join(", ")
    }
}

#[async_trait]
impl QuestionGenerator for AIService {
    async fn generate_mcqs(&self, candidate: &Candidate) -> Result<Vec<McqQuestion>> {
        let role = candidate
            .applied_for
            .as_deref()
            .unwrap_or("Full-Stack Developer");
        let prompt = format!(
            r#"You are an expert technical interviewer.

Generate exactly {count} high-quality multiple-choice questions for a {role} role.

Candidate skills: {skills}
Experience: {experience}

Rules:
- Medium to hard difficulty
- Exactly 4 options per question and exactly one correct answer
- "correct" is the 0-based index of the right option; vary it across questions
- Output ONLY a JSON array, no markdown, no explanation

Format:
[{{"question": "What is the output of ...?", "options": ["A) First", "B) Second", "C) Third", "D) Fourth"], "correct": 2}}]"#,
            count = self.mcq_count,
            role = role,
            skills = candidate_skills(candidate, "JavaScript, React, Node.js"),
            experience = candidate.experience.as_deref().unwrap_or("3-7 years"),
        );

        let content = self
            .llm
            .complete(vec![ChatMessage::user(prompt)], 0.4, Some(300 * self.mcq_count as u32 + 500))
            .await?;
        decode_mcqs(&content, self.mcq_count)
    }

    async fn generate_behavioral_question(&self, candidate: &Candidate) -> Result<String> {
        let prompt = format!(
            r#"Generate ONE behavioral interview question for a candidate with skills in {} and {} of experience.

Rules:
- Focus on real-world scenarios (leadership, teamwork, problem-solving, pressure)
- Make it open-ended
- Return ONLY the question text, no quotes or extra text"#,
            candidate_skills(candidate, "software development"),
            candidate.experience.as_deref().unwrap_or("a few years"),
        );

        let content = self
            .llm
            .complete(vec![ChatMessage::user(prompt)], 0.7, Some(200))
            .await?;
        decode_behavioral_question(&content)
    }

    async fn generate_coding_problem(&self, candidate: &Candidate) -> Result<CodingProblem> {
        let prompt = format!(
            r#"Generate ONE data structure and algorithm problem for a {} developer skilled in {}.

Requirements:
- Difficulty: Medium-Hard, in the style of LeetCode or HackerRank
- The solution is a JavaScript function named `solution`
- Each test case input holds one JSON value per line, one line per argument
- Include 4 test cases (2 visible, 2 hidden)

Return ONLY valid JSON:
{{
  "title": "Two Sum Variants",
  "description": "Given an array of numbers and a target...",
  "difficulty": "Medium",
  "starterCode": "function solution(nums, target) {{\n  // your code here\n}}",
  "testCases": [
    {{ "input": "[2,7,11,15]\n9", "expectedOutput": "[0,1]", "hidden": false }},
    {{ "input": "[1,5,5]\n10", "expectedOutput": "[1,2]", "hidden": true }}
  ]
}}"#,
            candidate.experience.as_deref().unwrap_or("3-5 years"),
            candidate_skills(candidate, "JavaScript, React"),
        );

        let content = self
            .llm
            .complete(vec![ChatMessage::user(prompt)], 0.6, None)
            .await?;
        decode_coding_problem(&content)
    }
}

#[async_trait]
impl Assessor for AIService {
    async fn assess_answer(&self, question: &str, transcript: &str) -> Result<AnswerAssessment> {
        let prompt = format!(
            r#"You are an expert interviewer. Score this answer (0-100) and give feedback.

Question: "{}"
Answer: "{}"

Score on relevance to the question, clarity and structure, confidence, and technical depth where applicable.

Return JSON only:
{{"score": 88, "feedback": "Strong answer with clear examples...", "relevance": 95, "clarity": 90, "confidence": 85}}"#,
            question, transcript
        );

        let content = self
            .llm
            .complete(vec![ChatMessage::user(prompt)], 0.3, None)
            .await?;
        decode_answer_assessment(&content)
    }

    async fn assess_solution(
        &self,
        problem: &CodingProblem,
        solution: &str,
        report: &ExecutionReport,
    ) -> Result<SolutionAssessment> {
        let prompt = format!(
            r#"You are a senior engineer. Evaluate this coding solution.

Problem: {}
{}

Solution:
```js
{}
```

Test Results: {}/{} passed

Score (0-100) based on correctness, efficiency, readability and edge case handling.

Return JSON only:
{{"score": 88, "feedback": "Excellent use of hash map..."}}"#,
            problem.title, problem.description, solution, report.passed, report.total
        );

        let content = self
            .llm
            .complete(vec![ChatMessage::user(prompt)], 0.3, None)
            .await?;
        decode_solution_assessment(&content)
    }
}

/// Drops a surrounding Markdown code fence, with or without a language tag.
pub fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim_end().trim_end_matches("```").trim()
}

fn decode_json<T: DeserializeOwned>(content: &str, what: &str) -> Result<T> {
    serde_json::from_str(strip_code_fence(content))
        .map_err(|e| Error::upstream(SERVICE, format!("malformed {}: {}", what, e)))
}

fn check_score(name: &str, value: i32) -> Result<()> {
    if (0..=100).contains(&value) {
        Ok(())
    } else {
        Err(Error::upstream(SERVICE, format!("{} {} outside 0-100", name, value)))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum McqEnvelope {
    List(Vec<McqQuestion>),
    Wrapped { questions: Vec<McqQuestion> },
}

pub fn decode_mcqs(content: &str, max: usize) -> Result<Vec<McqQuestion>> {
    let mut questions = match decode_json::<McqEnvelope>(content, "mcq list")? {
        McqEnvelope::List(list) => list,
        McqEnvelope::Wrapped { questions } => questions,
    };
    if questions.is_empty() {
        return Err(Error::upstream(SERVICE, "no questions generated"));
    }
    for (i, q) in questions.iter().enumerate() {
        if q.question.trim().is_empty() {
            return Err(Error::upstream(SERVICE, format!("question {} is empty", i + 1)));
        }
        if q.options.len() != OPTIONS_PER_QUESTION {
            return Err(Error::upstream(
                SERVICE,
                format!("question {} has {} options", i + 1, q.options.len()),
            ));
        }
        if usize::from(q.correct) >= OPTIONS_PER_QUESTION {
            return Err(Error::upstream(
                SERVICE,
                format!("question {} has correct index {}", i + 1, q.correct),
            ));
        }
    }
    questions.truncate(max);
    Ok(questions)
}

pub fn decode_behavioral_question(content: &str) -> Result<String> {
    let line = strip_code_fence(content)
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or_default();
    let question = line
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '\u{201c}' || c == '\u{201d}')
        .trim();
    if question.is_empty() {
        return Err(Error::upstream(SERVICE, "empty behavioral question"));
    }
    Ok(question.to_string())
}

pub fn decode_coding_problem(content: &str) -> Result<CodingProblem> {
    let problem: CodingProblem = decode_json(content, "coding problem")?;
    if problem.title.trim().is_empty() || problem.description.trim().is_empty() {
        return Err(Error::upstream(SERVICE, "coding problem lacks title or description"));
    }
    if problem.test_cases.is_empty() {
        return Err(Error::upstream(SERVICE, "coding problem has no test cases"));
    }
    Ok(problem)
}

pub fn decode_answer_assessment(content: &str) -> Result<AnswerAssessment> {
    let assessment: AnswerAssessment = decode_json(content, "answer assessment")?;
    check_score("score", assessment.score)?;
    check_score("relevance", assessment.relevance)?;
    check_score("clarity", assessment.clarity)?;
    check_score("confidence", assessment.confidence)?;
    Ok(assessment)
}

pub fn decode_solution_assessment(content: &str) -> Result<SolutionAssessment> {
    let assessment: SolutionAssessment = decode_json(content, "solution assessment")?;
    check_score("score", assessment.score)?;
    Ok(assessment)
}

pub fn decode_parsed_resume(content: &str) -> Result<ParsedResume> {
    decode_json(content, "normalized resume")
}

fn mcq(question: &str, options: [&str; 4], correct: u8) -> McqQuestion {
    McqQuestion {
        question: question.to_string(),
        options: options.iter().map(|o| o.to_string()).collect(),
        correct,
    }
}

/// Static question set served when MCQ generation fails.
pub fn fallback_mcqs() -> Vec<McqQuestion> {
    vec![
        mcq(
            "What does 'this' refer to in an arrow function?",
            ["A) Global object", "B) Parent scope", "C) undefined", "D) Function itself"],
            1,
        ),
        mcq(
            "Which React hook runs after render?",
            ["A) useState", "B) useEffect", "C) useContext", "D) useReducer"],
            1,
        ),
        mcq(
            "What is the time complexity of quicksort (average)?",
            ["A) O(n)", "B) O(n log n)", "C) O(n\u{b2})", "D) O(log n)"],
            1,
        ),
        mcq(
            "In Node.js, what is process.nextTick() used for?",
            ["A) Set timeout", "B) Defer execution", "C) Read file", "D) Make HTTP request"],
            1,
        ),
        mcq(
            "What is a closure in JavaScript?",
            ["A) A function with state", "B) A DOM method", "C) A CSS rule", "D) A database query"],
            0,
        ),
        mcq(
            "Which is not a JavaScript event loop phase?",
            ["A) Timers", "B) Poll", "C) Check", "D) Render"],
            3,
        ),
        mcq(
            "What does Promise.race() return?",
            ["A) All resolved", "B) First settled", "C) All rejected", "D) None"],
            1,
        ),
        mcq(
            "In React, what is the purpose of useMemo?",
            ["A) Store state", "B) Memoize values", "C) Side effects", "D) Context"],
            1,
        ),
    ]
}
