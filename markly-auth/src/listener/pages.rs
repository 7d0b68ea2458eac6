const PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{TITLE}</title>
    <style>
        body {
            margin: 0;
            font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, "Helvetica Neue", Arial, sans-serif;
            background: #14110f;
            color: #f4ecd8;
            display: flex;
            justify-content: center;
            align-items: center;
            min-height: 100vh;
        }
        .container {
            text-align: center;
            max-width: 420px;
            padding: 24px;
        }
        h1 {
            margin: 0 0 12px 0;
            font-size: 22px;
            font-weight: 600;
        }
        p {
            margin: 0;
            line-height: 1.5;
            opacity: 0.8;
        }
        .error {
            color: #fda4af;
            font-family: monospace;
            margin-top: 16px;
        }
    </style>
</head>
<body>
    <div class="container">
        <h1>{TITLE}</h1>
        <p>{BODY}</p>
        {DETAILS}
    </div>
</body>
</html>"#;

/// Fill each slot in one pass; inserted text is never scanned for slots
fn render(title: &str, body: &str, details: &str) -> String {
    let slots = [("{TITLE}", title), ("{BODY}", body), ("{DETAILS}", details)];

    let mut page = String::with_capacity(PAGE_TEMPLATE.len() + body.len() + details.len());
    let mut rest = PAGE_TEMPLATE;
    while let Some(start) = rest.find('{') {
        page.push_str(&rest[..start]);
        rest = &rest[start..];

        match slots.iter().find(|(slot, _)| rest.starts_with(*slot)) {
            Some((slot, value)) => {
                page.push_str(value);
                rest = &rest[slot.len()..];
            }
            None => {
                page.push('{');
                rest = &rest[1..];
            }
        }
    }
    page.push_str(rest);
    page
}

pub fn signed_in(name: &str) -> String {
    render(
        "Signed in to Markly",
        &format!(
            "Welcome, {}. You can close this window and return to your terminal.",
            escape(name)
        ),
        "",
    )
}

pub fn waiting() -> String {
    render("Markly", "Signing you in...", "")
}

pub fn failed(message: &str) -> String {
    render(
        "Sign-in failed",
        "Close this window and try signing in again from your terminal.",
        &format!(r#"<p class="error">{}</p>"#, escape(message)),
    )
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_page_escapes_message() {
        let page = failed("<script>alert(1)</script>");
        assert!(page.contains("&lt;script&gt;"));
        assert!(!page.contains("<script>"));
    }

    #[test]
    fn test_slot_names_in_user_text_are_kept_literally() {
        let page = signed_in("{DETAILS} {TITLE}");

        assert!(page.contains("Welcome, {DETAILS} {TITLE}."));
        assert_eq!(page.matches("<title>Signed in to Markly</title>").count(), 1);
    }

    #[test]
    fn test_style_braces_survive() {
        let page = waiting();

        assert!(page.contains("body {"));
        assert!(page.contains("<h1>Markly</h1>"));
        assert!(!page.contains("{BODY}"));
    }
}
