use std::collections::{BTreeMap, HashSet};
use std::sync::OnceLock;
use std::time::Instant;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde_json::json;

use crate::error::{Error, Result};
use crate::models::candidate::ExperienceEntry;
use crate::models::resume::{NerEntity, ParsedResume, RawResumeFields};
use crate::services::ai_service::AIService;

const SERVICE: &str = "ner";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResumeParser: Send + Sync {
    async fn parse(&self, text: &str) -> Result<ParsedResume>;
}

/// NER extraction plus heuristics, normalized through the LLM.
#[derive(Clone)]
pub struct ResumeService {
    client: Client,
    ner_url: String,
    ner_token: String,
    ai: AIService,
}

impl ResumeService {
    pub fn new(client: Client, ner_url: String, ner_token: String, ai: AIService) -> Self {
        Self {
            client,
            ner_url,
            ner_token,
            ai,
        }
    }

    async fn recognize_entities(&self, text: &str) -> Result<Vec<NerEntity>> {
        let started = Instant::now();
        let res = self
            .client
            .post(&self.ner_url)
            .bearer_auth(&self.ner_token)
            .json(&json!({ "inputs": text }))
            .send()
            .await
            .map_err(|e| Error::upstream(SERVICE, e.to_string()))?;

        let status = res.status();
        tracing::info!(
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "ner inference returned"
        );
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(Error::upstream(SERVICE, format!("status {}: {}", status, text)));
        }

        res.json()
            .await
            .map_err(|e| Error::upstream(SERVICE, format!("unreadable entities: {}", e)))
    }
}

#[async_trait]
impl ResumeParser for ResumeService {
    async fn parse(&self, text: &str) -> Result<ParsedResume> {
        if text.trim().is_empty() {
            return Err(Error::Validation(
                "No text could be extracted from the resume".to_string(),
            ));
        }
        let entities = self.recognize_entities(text).await?;
        let raw = extract_resume_fields(text, entities);
        tracing::debug!(
            skills = raw.skills.len(),
            roles = raw.experience_timeline.len(),
            "resume heuristics extracted"
        );
        self.ai.normalize_resume(&raw).await
    }
}

/// Groups entities by type, merging spans that continue the previous one and
/// dropping case-insensitive duplicates.
pub fn clean_entities(entities: Vec<NerEntity>) -> BTreeMap<String, Vec<NerEntity>> {
    let mut grouped: BTreeMap<String, Vec<NerEntity>> = BTreeMap::new();

    for entity in entities {
        let group = grouped.entry(entity.entity_group.clone()).or_default();
        let continues = group.last().is_some_and(|last| last.end == entity.start);
        if let Some(last) = group.last_mut().filter(|_| continues) {
            last.word.push_str(&entity.word);
            last.end = entity.end;
            last.score = last.score.max(entity.score);
            continue;
        }
        let word = entity.word.trim().to_string();
        if !word.is_empty() {
            group.push(NerEntity { word, ..entity });
        }
    }

    for group in grouped.values_mut() {
        let mut seen = HashSet::new();
        group.retain(|e| seen.insert(e.word.trim().to_lowercase()));
        for e in group.iter_mut() {
            e.word = e.word.trim().to_string();
        }
    }
    grouped
}

fn regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).unwrap_or_else(|e| panic!("bad pattern {}: {}", pattern, e)))
}

fn dedupe(items: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|s| !s.is_empty() && seen.insert(s.to_lowercase()))
        .collect()
}

pub fn extract_emails(text: &str) -> Vec<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = regex(&RE, r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-z]{2,}");
    dedupe(re.find_iter(text).map(|m| m.as_str().to_string()))
}

pub fn extract_phone(text: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = regex(&RE, r"(\+?\d{1,3}[\s-]?)?\d{10}");
    re.find(text)
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

pub fn extract_location(text: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = regex(
        &RE,
        r"(?i)india|delhi|punjab|haryana|bangalore|bengaluru|mumbai|pune|hyderabad|chennai|noida|gurgaon|gurugram",
    );
    text.lines()
        .map(str::trim)
        .find(|l| re.is_match(l))
        .unwrap_or_default()
        .to_string()
}

pub fn extract_summary(text: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = regex(
        &RE,
        r"(?i:summary)[ \t:]*\n([\s\S]*?)(?:\n[A-Z][A-Z ]{2,}\n|\n(?i:experience|projects)|$)",
    );
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().split_whitespace().collect::<Vec<_>>().join(" "))
        .unwrap_or_default()
}

pub fn extract_skills(text: &str, entities: &BTreeMap<String, Vec<NerEntity>>) -> Vec<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = regex(&RE, r"(?i)skills\s*:\s*([^\n]+)");

    let from_ner = entities
        .get("MISC")
        .into_iter()
        .flatten()
        .map(|e| e.word.clone());
    let from_text = re
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| {
            m.as_str()
                .split(',')
                .map(|s| s.trim().to_string())
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();
    dedupe(from_ner.chain(from_text))
}

pub fn extract_experience_years(text: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = regex(&RE, r"(?i)(\d+)\+?\s+years");
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| format!("{} years", m.as_str()))
        .unwrap_or_default()
}

/// Role lines (a job word plus a year or "present"), each followed by an
/// optional company line.
pub fn extract_experience_timeline(text: &str) -> Vec<ExperienceEntry> {
    static ROLE: OnceLock<Regex> = OnceLock::new();
    static DATED: OnceLock<Regex> = OnceLock::new();
    static COMPANY: OnceLock<Regex> = OnceLock::new();
    static DURATION: OnceLock<Regex> = OnceLock::new();
    let role = regex(&ROLE, r"(?i)intern|engineer|developer|analyst|scientist|manager");
    let dated = regex(&DATED, r"(?i)20\d{2}|present");
    let company = regex(&COMPANY, r"^[A-Z][A-Za-z &.,]+$");
    let duration = regex(
        &DURATION,
        r"(?i)((jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?\s+)?(20\d{2}|present)",
    );

    let mut timeline = Vec::new();
    let mut current: Option<ExperienceEntry> = None;

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if role.is_match(line) && dated.is_match(line) {
            if let Some(done) = current.take() {
                timeline.push(done);
            }
            let (title, span) = match duration.find(line) {
                Some(m) => (line[..m.start()].trim(), line[m.start()..].trim()),
                None => (line, ""),
            };
            let title = title
                .split("  ")
                .next()
                .unwrap_or(title)
                .trim_end_matches(|c: char| c == '|' || c == ',' || c == '-' || c.is_whitespace());
            current = Some(ExperienceEntry {
                title: title.to_string(),
                company: String::new(),
                duration: span.to_string(),
            });
        } else if let Some(entry) = current.as_mut() {
            if entry.company.is_empty() && company.is_match(line) {
                entry.company = line.to_string();
            }
        }
    }
    if let Some(done) = current {
        timeline.push(done);
    }
    timeline
}

pub fn extract_resume_fields(text: &str, entities: Vec<NerEntity>) -> RawResumeFields {
    let cleaned = clean_entities(entities);
    RawResumeFields {
        names: cleaned
            .get("PER")
            .into_iter()
            .flatten()
            .map(|e| e.word.clone())
            .collect(),
        emails: extract_emails(text),
        phone: extract_phone(text),
        location: extract_location(text),
        summary: extract_summary(text),
        skills: extract_skills(text, &cleaned),
        experience_years: extract_experience_years(text),
        experience_timeline: extract_experience_timeline(text),
    }
}
