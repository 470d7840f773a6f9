// ABOUTME: HTML escaping for interpolated values and generated comment markers
// ABOUTME: Escapes the five HTML-significant characters and sanitizes comment bodies

/// Escape `& < > " '` for insertion into HTML text or attribute values.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    escape_html_into(input, &mut out);
    out
}

pub fn escape_html_into(input: &str, out: &mut String) {
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
}

/// Build an HTML comment whose body can not close the comment early.
pub fn html_comment(body: &str) -> String {
    let mut safe = body.to_string();
    while safe.contains("--") {
        safe = safe.replace("--", "- -");
    }
    if safe.ends_with('-') {
        safe.push(' ');
    }
    format!("<!-- {} -->", safe)
}
