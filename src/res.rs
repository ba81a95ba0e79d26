//! Page resources and the small amount of HTML assembly the handlers share.

use axum::response::Html;
use pulldown_cmark::{CowStr, Event, Options, Parser, Tag};

use crate::db::User;

#[macro_export]
macro_rules! include_res {
    (bytes, $p:expr) => {
        include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/res", $p))
    };
    (str, $p:expr) => {
        include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/res", $p))
    };
}

/// Braces are encoded too: pages are filled by `{placeholder}` replacement
/// and user text must never look like one.
fn braces(html: &str) -> String {
    html.replace('{', "&#123;").replace('}', "&#125;")
}

pub fn esc(text: &str) -> String {
    braces(&html_escape::encode_text(text))
}

pub fn attr(text: &str) -> String {
    braces(&html_escape::encode_double_quoted_attribute(text))
}

pub fn non_empty(text: String) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

pub fn error_block(error: Option<&str>) -> String {
    match error {
        Some(error) => format!(r#"<p class="error">{}</p>"#, esc(error)),
        None => String::new(),
    }
}

/// Percent-encodes everything outside the unreserved set, for query values.
pub fn url_component(text: &str) -> String {
    text.bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => (b as char).to_string(),
            _ => format!("%{b:02X}"),
        })
        .collect()
}

/// Relative targets and http(s)/mailto links are kept; any other scheme
/// becomes `#`.
fn link_target(dest_url: CowStr<'_>) -> CowStr<'_> {
    let allowed = match dest_url.split_once(':') {
        Some((scheme, _)) if !scheme.contains(['/', '?', '#']) => {
            matches!(scheme.to_ascii_lowercase().as_str(), "http" | "https" | "mailto")
        }
        _ => true,
    };
    if allowed { dest_url } else { CowStr::Borrowed("#") }
}

/// Message bodies are Markdown; raw HTML in them is shown as text.
pub fn markdown(body: &str) -> String {
    let parser = Parser::new_ext(body, Options::ENABLE_STRIKETHROUGH).map(|event| match event {
        Event::Html(html) | Event::InlineHtml(html) => Event::Text(html),
        Event::Start(Tag::Link { link_type, dest_url, title, id }) => Event::Start(Tag::Link {
            link_type,
            dest_url: link_target(dest_url),
            title,
            id,
        }),
        Event::Start(Tag::Image { link_type, dest_url, title, id }) => Event::Start(Tag::Image {
            link_type,
            dest_url: link_target(dest_url),
            title,
            id,
        }),
        _ => event,
    });

    let mut html_output = String::new();
    pulldown_cmark::html::push_html(&mut html_output, parser);
    braces(&html_output)
}

pub fn time(at: &chrono::DateTime<chrono::Utc>) -> String {
    at.format("%Y-%m-%d %H:%M").to_string()
}

fn nav(actor: Option<&User>) -> String {
    match actor {
        Some(user) => format!(
            r#"<a href="/user-profile/{id}">@{username}</a> <a href="/update-user">Edit profile</a> <a href="/create-room">New room</a> <a href="/logout">Logout</a>"#,
            id = user.id,
            username = esc(&user.username),
        ),
        None => r#"<a href="/login">Login</a> <a href="/register">Register</a>"#.to_owned(),
    }
}

pub fn layout(actor: Option<&User>, title: &str, body: &str) -> Html<String> {
    Html(
        include_res!(str, "/pages/layout.html")
            .replace("{title}", &esc(title))
            .replace("{nav}", &nav(actor))
            .replace("{body}", body),
    )
}
