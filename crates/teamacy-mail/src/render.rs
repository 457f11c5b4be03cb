use std::sync::LazyLock;

use regex::Regex;
use teamacy_types::models::{Message, MessageKind};

pub const SITE_NAME: &str = "Teamacy";

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s<>"']+"#).expect("static regex"));

/// Punctuation that ends a sentence rather than a URL.
const TRAILING: &[char] = &['.', ',', ';', ':', ')', '!', '?'];

pub fn escape_html(text: &str) -> String {
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

/// Escape `text` and wrap every bare http(s) URL in an anchor.
///
/// URLs are found in the raw text and stop at whitespace, quotes, angle
/// brackets and trailing punctuation. Each piece is escaped separately.
pub fn linkify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;

    for m in URL_RE.find_iter(text) {
        let url = m.as_str().trim_end_matches(TRAILING);
        let href = escape_html(url);

        out.push_str(&escape_html(&text[last..m.start()]));
        out.push_str(&format!(r#"<a href="{href}">{href}</a>"#));
        last = m.start() + url.len();
    }

    out.push_str(&escape_html(&text[last..]));
    out
}

pub fn subject_line(kind: Option<MessageKind>) -> String {
    let label = match kind {
        Some(MessageKind::Enquiry) => "Enquiry",
        Some(MessageKind::Feedback) => "Feedback",
        None => "Message",
    };
    format!("New {} – {}", label, SITE_NAME)
}

/// HTML body of the admin notification for `msg`.
pub fn admin_email_html(msg: &Message) -> String {
    format!(
        "<h2>{heading}</h2>\n\
         <p><b>Name:</b> {name}</p>\n\
         <p><b>Email:</b> {email}</p>\n\
         <p><b>Subject:</b> {subject}</p>\n\
         <p>{body}</p>\n",
        heading = escape_html(&subject_line(msg.kind)),
        name = escape_html(&msg.name),
        email = escape_html(&msg.email),
        subject = escape_html(&msg.subject),
        body = msg.message_html,
    )
}
