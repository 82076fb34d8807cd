//! Report notification emails

use crate::model::{OutboundEmail, ValidationReport, WaitlistEntry};
use crate::ports::Mailer;

/// Build the summary email for a finished report
pub fn report_email(to: &str, report: &ValidationReport) -> OutboundEmail {
    let fields = &report.fields;
    let mut html = String::new();

    html.push_str("<h1>Your idea validation report</h1>\n");
    html.push_str(&format!(
        "<p><strong>Idea:</strong> {}</p>\n",
        escape_html(&report.original_idea)
    ));
    html.push_str(&format!(
        "<p><strong>Verdict:</strong> {} ({}/100)</p>\n",
        fields.summary_verdict.label(),
        fields.viability_score
    ));
    html.push_str(&format!("<p>{}</p>\n", escape_html(&fields.one_line_takeaway)));

    if !fields.next_steps.is_empty() {
        html.push_str("<h2>Next steps</h2>\n<ul>\n");
        for step in &fields.next_steps {
            html.push_str(&format!("<li>{}</li>\n", escape_html(step)));
        }
        html.push_str("</ul>\n");
    }

    OutboundEmail {
        to: to.to_string(),
        subject: format!(
            "Idea report: {} ({}/100)",
            fields.summary_verdict.label(),
            fields.viability_score
        ),
        html_body: html,
    }
}

/// Confirmation for a new waitlist signup
pub fn waitlist_email(entry: &WaitlistEntry) -> OutboundEmail {
    let greeting = match entry.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => format!("Hi {},", escape_html(name)),
        _ => "Hi,".to_string(),
    };

    OutboundEmail {
        to: entry.email.clone(),
        subject: "You're on the idea-validator waitlist".to_string(),
        html_body: format!(
            "<p>{}</p>\n<p>Thanks for signing up. We'll email you as soon as your spot opens.</p>\n",
            greeting
        ),
    }
}

/// Send an email, logging and swallowing any failure
pub async fn send_best_effort(mailer: &dyn Mailer, email: &OutboundEmail) -> bool {
    match mailer.send(email).await {
        Ok(()) => {
            tracing::info!(to = %email.to, subject = %email.subject, "Notification sent");
            true
        }
        Err(e) => {
            tracing::warn!(to = %email.to, error = %e, "Failed to send notification");
            false
        }
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
