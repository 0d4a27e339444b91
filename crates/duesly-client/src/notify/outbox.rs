use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use ulid::Ulid;

use super::{DeliveryError, EmailMessage, EmailTransport};

/// Pickup-directory transport: each message becomes one RFC 5322 `.eml`
/// file for the host mail system to relay. Headers are written as UTF-8
/// (RFC 6532), bodies as 8bit parts.
#[derive(Debug, Clone)]
pub struct OutboxTransport {
    dir: PathBuf,
}

impl OutboxTransport {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl EmailTransport for OutboxTransport {
    fn send(&self, message: &EmailMessage) -> Result<String, DeliveryError> {
        if message.to.trim().is_empty() || message.to.contains(['\r', '\n']) {
            return Err(DeliveryError::Rejected(
                "recipient address is empty or malformed".to_string(),
            ));
        }

        let outbox_error = |source: std::io::Error| DeliveryError::Outbox {
            path: self.dir.display().to_string(),
            source,
        };
        fs::create_dir_all(&self.dir).map_err(outbox_error)?;

        let delivery_id = Ulid::new().to_string();
        let rendered = render_message(message, &delivery_id);

        // Written under a dot-name first so a relay never picks up a partial file.
        let staging = self.dir.join(format!(".{delivery_id}.tmp"));
        let final_path = self.dir.join(format!("{delivery_id}.eml"));
        fs::write(&staging, rendered).map_err(outbox_error)?;
        fs::rename(&staging, &final_path).map_err(outbox_error)?;

        Ok(delivery_id)
    }
}

fn render_message(message: &EmailMessage, delivery_id: &str) -> String {
    let boundary = format!("duesly-{delivery_id}");
    let mut out = String::new();
    push_header(&mut out, "From", &message.from);
    push_header(&mut out, "To", &message.to);
    push_header(&mut out, "Subject", &message.subject);
    push_header(&mut out, "Date", &Local::now().to_rfc2822());
    push_header(
        &mut out,
        "Message-ID",
        &format!("<{delivery_id}@{}>", sender_domain(&message.from)),
    );
    push_header(&mut out, "MIME-Version", "1.0");

    match &message.html_body {
        None => {
            push_header(&mut out, "Content-Type", "text/plain; charset=utf-8");
            push_header(&mut out, "Content-Transfer-Encoding", "8bit");
            out.push_str("\r\n");
            out.push_str(&crlf(&message.text_body));
            out.push_str("\r\n");
        }
        Some(html) => {
            push_header(
                &mut out,
                "Content-Type",
                &format!("multipart/alternative; boundary=\"{boundary}\""),
            );
            out.push_str("\r\n");
            push_part(&mut out, &boundary, "text/plain", &message.text_body);
            push_part(&mut out, &boundary, "text/html", html);
            out.push_str(&format!("--{boundary}--\r\n"));
        }
    }
    out
}

fn push_header(out: &mut String, name: &str, value: &str) {
    // Header injection guard: values never span lines.
    let single_line = value.replace(['\r', '\n'], " ");
    out.push_str(&format!("{name}: {single_line}\r\n"));
}

fn push_part(out: &mut String, boundary: &str, content_type: &str, body: &str) {
    out.push_str(&format!("--{boundary}\r\n"));
    out.push_str(&format!("Content-Type: {content_type}; charset=utf-8\r\n"));
    out.push_str("Content-Transfer-Encoding: 8bit\r\n\r\n");
    out.push_str(&crlf(body));
    out.push_str("\r\n");
}

fn crlf(body: &str) -> String {
    body.replace("\r\n", "\n").replace('\n', "\r\n")
}

fn sender_domain(from: &str) -> &str {
    from.rsplit_once('@')
        .map(|(_, domain)| domain.trim_end_matches('>'))
        .filter(|domain| !domain.is_empty())
        .unwrap_or("localhost")
}
