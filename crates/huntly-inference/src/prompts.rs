//! Prompt builders for the reconciliation pipeline.
//!
//! All prompts are deterministic functions of their inputs, with excerpt
//! limits applied here so callers never ship unbounded mail bodies to the
//! generation service.

use chrono::NaiveDate;

use huntly_core::{defaults, excerpt, Message};

/// Constrained three-label classification prompt.
///
/// The model must answer with exactly one of APPLICATION, NOTIFICATION,
/// or OTHER; anything else is treated as a failed classification by the
/// caller.
pub fn classification_prompt(subject: &str, sender: &str, body_text: &str) -> String {
    format!(
        r#"Classify if this email is about an ACTUAL job application YOU submitted, or just a job recommendation/alert.

Email subject: {subject}
Email from: {sender}
Email snippet: {body}

Classify as:
- "APPLICATION" - Confirmation you submitted an application, application status update, interview request, offer, rejection
- "NOTIFICATION" - Job recommendations, job alerts, "X is hiring", job board suggestions, newsletters
- "OTHER" - Unrelated emails (GitHub notifications, SSO updates, etc.)

Return ONLY one word: APPLICATION, NOTIFICATION, or OTHER

Examples:
- "Your application to Google has been received" -> APPLICATION
- "Amazon application: Status update" -> APPLICATION
- "Interview scheduled with Microsoft" -> APPLICATION
- "You might be interested in this Software Engineer role at Meta" -> NOTIFICATION
- "LinkedIn: 10 new jobs match your preferences" -> NOTIFICATION
- "Indeed: New Machine Learning jobs" -> NOTIFICATION
- "GitHub Actions workflow failed" -> OTHER
- "Accenture is federating their identity provider" -> OTHER

Classification:"#,
        subject = excerpt(subject, defaults::CLASSIFY_SUBJECT_CHARS),
        sender = excerpt(sender, defaults::CLASSIFY_SENDER_CHARS),
        body = excerpt(body_text, defaults::CLASSIFY_BODY_CHARS),
    )
}

/// Structured extraction prompt for a single application email.
///
/// The company rule ("not the job board") is an instruction to the model,
/// not something the extractor verifies afterwards; that trust boundary is
/// documented on the extractor itself.
pub fn extraction_prompt(body_text: &str, today: NaiveDate) -> String {
    format!(
        r#"Extract structured information from this job APPLICATION email.

Email:
{body}

Return ONLY valid JSON (no markdown, no explanation) with these exact keys:
{{"company", "job_title", "status", "application_date", "deadline", "notes", "application_id"}}

Rules:
- company: Company name (not the job board like LinkedIn/Indeed/Naukri)
- job_title: Specific job title you applied for
- status: READ THE EMAIL CAREFULLY to determine status. Choose ONE:
  * "Applied" - Initial application confirmation, "we received your application"
  * "Rejected" - Rejection keywords: "unfortunately", "not selected", "not moving forward",
                 "decided to pursue other candidates", "progress with other candidates",
                 "decided to move forward with other candidates", "position has been filled",
                 "we regret to inform", "will not be proceeding", "not able to move forward"
  * "Interview" - Interview invitation, "we'd like to schedule", "next round"
  * "Offer" - Job offer, "pleased to offer", "offer letter"
  * "Assessment" - Technical test, coding challenge, assignment requested
- application_date: YYYY-MM-DD format, use today ({today}) if unknown
- deadline: YYYY-MM-DD format or null
- notes: Brief summary (location, salary, key details from the email)
- application_id: Extract the Application ID / Job ID / Reference number from the email if mentioned
  Examples: "ID: 3104541", "Job ID: JOB-2024-001", "Reference: REF-12345", "Application #12345"
  Return null if not found

IMPORTANT:
1. Carefully read the ENTIRE email to determine the correct status
2. Look for Application ID, Job ID, Reference number, or similar identifiers
3. Return ONLY the JSON object, no markdown code blocks, no explanations
"#,
        body = excerpt(body_text, defaults::EXTRACT_BODY_CHARS),
        today = today.format("%Y-%m-%d"),
    )
}

/// Batch extraction prompt over many messages.
///
/// The model performs deduplication itself under the same progression
/// policy the merge engine enforces, returning a JSON array of unique
/// applications.
pub fn batch_extraction_prompt(messages: &[Message], today: NaiveDate) -> String {
    let mut emails_text = String::from("=== EMAIL BATCH TO PROCESS ===\n\n");
    for (i, msg) in messages.iter().enumerate() {
        emails_text.push_str(&format!(
            "EMAIL {n}:\nSubject: {subject}\nFrom: {sender}\nContent: {body}\n---\n\n",
            n = i + 1,
            subject = msg.subject,
            sender = msg.sender,
            body = excerpt(&msg.body_text, defaults::BATCH_BODY_CHARS),
        ));
    }

    format!(
        r#"You are an expert at processing job application emails. You will receive multiple emails and need to extract job applications while avoiding duplicates.

EMAILS TO PROCESS:
{emails_text}

DEDUPLICATION RULES:
1. Same company + same job title = Same application
2. Status progression: Applied -> Assessment -> Interview -> Offer, Rejected is final
3. Use the most advanced status for the application
4. Combine notes from all related emails
5. Use the earliest application date
6. Preserve Application IDs when available

Return ONLY a JSON array of unique applications. Each application should have:
{{"company", "job_title", "status", "application_date", "deadline", "notes", "application_id"}}

Status options: Applied, Assessment, Interview, Offer, Rejected
application_date: YYYY-MM-DD format, use today ({today}) if unknown

Return the JSON array:"#,
        emails_text = emails_text,
        today = today.format("%Y-%m-%d"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(subject: &str, body: &str) -> Message {
        Message {
            id: "m1".to_string(),
            subject: subject.to_string(),
            sender: "jobs@acme.example".to_string(),
            snippet: String::new(),
            body_text: body.to_string(),
            received_at: None,
        }
    }

    #[test]
    fn classification_prompt_embeds_inputs() {
        let prompt = classification_prompt(
            "Your application to Acme",
            "noreply@acme.example",
            "We received it",
        );
        assert!(prompt.contains("Your application to Acme"));
        assert!(prompt.contains("noreply@acme.example"));
        assert!(prompt.contains("ONLY one word"));
    }

    #[test]
    fn classification_prompt_truncates_body() {
        let long_body = "x".repeat(5000);
        let prompt = classification_prompt("s", "f", &long_body);
        assert!(!prompt.contains(&"x".repeat(1001)));
        assert!(prompt.contains(&"x".repeat(1000)));
    }

    #[test]
    fn extraction_prompt_includes_today() {
        let today = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        let prompt = extraction_prompt("body", today);
        assert!(prompt.contains("2025-07-01"));
        assert!(prompt.contains("application_id"));
        assert!(prompt.contains("not the job board"));
    }

    #[test]
    fn batch_prompt_numbers_messages() {
        let today = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        let msgs = vec![
            message("First subject", "first body"),
            message("Second subject", "second body"),
        ];
        let prompt = batch_extraction_prompt(&msgs, today);
        assert!(prompt.contains("EMAIL 1:"));
        assert!(prompt.contains("EMAIL 2:"));
        assert!(prompt.contains("First subject"));
        assert!(prompt.contains("second body"));
        assert!(prompt.contains("JSON array"));
    }
}
