//! Server-rendered HTML.
//!
//! Every full page shares one layout. Requests made by htmx (`HX-Request: true`)
//! receive only the page content so it can be swapped into an existing layout.

/// A page reachable at `/page/{name}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub name: &'static str,
    pub title: &'static str,
    body: &'static str,
}

const PAGES: &[Page] = &[
    Page {
        name: "dashboard",
        title: "Dashboard",
        body: "<p>You are signed in.</p>",
    },
    Page {
        name: "account",
        title: "Account",
        body: "<p>Your account is managed by this host. \
               Change your password with the system tools.</p>",
    },
];

/// Look up a page by its URL name.
#[must_use]
pub fn find(name: &str) -> Option<&'static Page> {
    PAGES.iter().find(|page| page.name == name)
}

/// Render a protected page for `username`.
#[must_use]
pub fn render_page(page: &Page, username: &str, fragment_only: bool) -> String {
    let nav: String = PAGES
        .iter()
        .map(|p| {
            format!(
                r#"<a href="/page/{name}" hx-get="/page/{name}" hx-target="main">{title}</a> "#,
                name = p.name,
                title = p.title,
            )
        })
        .collect();
    let content = format!(
        "<h1>{title}</h1>\n<p>Signed in as <strong>{user}</strong>.</p>\n{body}",
        title = page.title,
        user = escape_html(username),
        body = page.body,
    );
    if fragment_only {
        return content;
    }
    let header = format!(r#"<nav>{nav}<a href="/logout">Log out</a></nav>"#);
    layout(page.title, &header, &content)
}

/// Render the login form, with a message for a known `error` code.
#[must_use]
pub fn render_login(error: Option<&str>) -> String {
    let message = match error {
        Some("empty_fields") => r#"<p class="error">Please enter both username and password.</p>"#,
        Some("invalid_credentials") => r#"<p class="error">Invalid username or password.</p>"#,
        _ => "",
    };
    let content = format!(
        r#"<h1>Login</h1>
{message}
<form method="post" action="/login">
  <label>Username <input type="text" name="username" autocomplete="username" autofocus></label>
  <label>Password <input type="password" name="password" autocomplete="current-password"></label>
  <button type="submit">Log in</button>
</form>"#
    );
    layout("Login", "", &content)
}

fn layout(title: &str, header: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<script src="https://unpkg.com/htmx.org@2.0.4"></script>
</head>
<body>
<header>{header}</header>
<main>
{content}
</main>
</body>
</html>
"#
    )
}

fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
