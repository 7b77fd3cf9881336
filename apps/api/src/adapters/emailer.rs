//! Email dispatch stage — cold outreach over SMTP with the resume attached.

use async_trait::async_trait;
use bytes::Bytes;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::adapters::{EmailReceipt, SendEmail, StageError};
use crate::models::job::JobPosting;
use crate::models::resume::ResumeProfile;

/// How many postings the email body references.
const BODY_JOB_LIMIT: usize = 3;

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: String,
}

impl SmtpMailer {
    pub fn new(host: &str, username: String, password: String) -> Result<Self, anyhow::Error> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(host)?
            .credentials(Credentials::new(username.clone(), password))
            .build();
        Ok(Self {
            transport,
            sender: username,
        })
    }
}

#[async_trait]
impl SendEmail for SmtpMailer {
    async fn send(
        &self,
        resume: &ResumeProfile,
        postings: &[JobPosting],
        recipient: &str,
        attachment: Bytes,
    ) -> Result<EmailReceipt, StageError> {
        let subject = build_subject(resume);
        let body = build_cold_email(resume, postings);

        let resume_part = Attachment::new("resume.pdf".to_string()).body(
            attachment.to_vec(),
            ContentType::parse("application/octet-stream")
                .map_err(|e| StageError::EmailDispatch(format!("attachment type: {e}")))?,
        );

        let message = Message::builder()
            .from(
                self.sender
                    .parse()
                    .map_err(|e| StageError::EmailDispatch(format!("bad sender address: {e}")))?,
            )
            .to(recipient
                .parse()
                .map_err(|e| StageError::EmailDispatch(format!("bad recipient address: {e}")))?)
            .subject(subject)
            .multipart(
                MultiPart::mixed()
                    .singlepart(SinglePart::plain(body))
                    .singlepart(resume_part),
            )
            .map_err(|e| StageError::EmailDispatch(format!("could not build message: {e}")))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| StageError::EmailDispatch(format!("SMTP send failed: {e}")))?;

        Ok(EmailReceipt {
            success: true,
            message: format!("Email sent to {recipient} with resume attached"),
        })
    }
}

fn build_subject(resume: &ResumeProfile) -> String {
    format!("Application for open roles — {}", resume.display_name())
}

/// Plain-text cold email referencing the candidate's skills and the top
/// postings they are applying against.
fn build_cold_email(resume: &ResumeProfile, postings: &[JobPosting]) -> String {
    let mut body = String::new();
    body.push_str("Dear Hiring Team,\n\n");
    body.push_str(&format!(
        "I am {}, and I came across your open positions. I believe my background aligns well with what you are looking for.\n\n",
        resume.display_name()
    ));

    if !resume.skills.is_empty() {
        body.push_str(&format!("Relevant skills: {}\n\n", resume.skills.join(", ")));
    }

    if !postings.is_empty() {
        body.push_str("Roles I am applying for:\n");
        for posting in postings.iter().take(BODY_JOB_LIMIT) {
            body.push_str(&format!("  - {}\n", posting.title));
        }
        body.push('\n');
    }

    body.push_str("My resume is attached. I would welcome the chance to discuss how I can contribute to your team.\n\n");
    body.push_str(&format!("Best regards,\n{}", resume.display_name()));

    if let Some(email) = &resume.email {
        body.push_str(&format!("\n{email}"));
    }
    if let Some(phone) = &resume.phone {
        body.push_str(&format!("\n{phone}"));
    }

    body
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resume() -> ResumeProfile {
        ResumeProfile {
            name: "Jane Doe".to_string(),
            phone: Some("+91 98765 43210".to_string()),
            email: Some("jane@mail.dev".to_string()),
            skills: vec!["python".to_string(), "sql".to_string()],
            raw_text: String::new(),
        }
    }

    fn posting(title: &str) -> JobPosting {
        JobPosting {
            title: title.to_string(),
            location: None,
            required_skills: vec![],
            apply_url: "https://acme.dev/jobs/1".to_string(),
            company: "Acme".to_string(),
            seniority: None,
        }
    }

    #[test]
    fn test_body_mentions_candidate_and_jobs() {
        let body = build_cold_email(&resume(), &[posting("Data Engineer"), posting("ML Engineer")]);
        assert!(body.contains("Jane Doe"));
        assert!(body.contains("python, sql"));
        assert!(body.contains("Data Engineer"));
        assert!(body.contains("ML Engineer"));
        assert!(body.contains("jane@mail.dev"));
    }

    #[test]
    fn test_body_caps_referenced_jobs() {
        let postings: Vec<JobPosting> = (0..6).map(|i| posting(&format!("Role {i}"))).collect();
        let body = build_cold_email(&resume(), &postings);
        assert!(body.contains("Role 2"));
        assert!(!body.contains("Role 3"));
    }

    #[test]
    fn test_body_without_postings_still_reads() {
        let body = build_cold_email(&resume(), &[]);
        assert!(!body.contains("Roles I am applying for"));
        assert!(body.contains("resume is attached"));
    }

    #[test]
    fn test_subject_uses_display_name() {
        assert!(build_subject(&resume()).contains("Jane Doe"));

        let anonymous = ResumeProfile {
            name: String::new(),
            ..resume()
        };
        assert!(build_subject(&anonymous).contains("Candidate"));
    }
}
