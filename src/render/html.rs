use std::fmt::Write;

use crate::render::{ContractDocument, Content, DOCUMENT_TITLE, client_address, or_placeholder};

const STYLE: &str = "body{font-family:Helvetica,Arial,sans-serif;max-width:800px;margin:0 auto;padding:40px;line-height:1.6;color:#1f2937}\
h1{text-align:center;letter-spacing:2px}\
h2{border-bottom:1px solid #d1d5db;padding-bottom:4px;margin-top:32px}\
.meta{text-align:center;color:#4b5563}\
.signatures{display:flex;gap:48px;margin-top:48px}\
.signature{flex:1}\
.line{border-bottom:1px solid #111827;height:32px;margin-bottom:4px}";

pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
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

/// Renders the full contract as a standalone HTML page.
pub fn render_html(document: &ContractDocument<'_>) -> String {
    let mut html = String::new();
    let draft = document.draft;
    let provider = document.provider;

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    let _ = writeln!(
        html,
        "<title>{} - {}</title>",
        escape(DOCUMENT_TITLE),
        escape(document.contract_id)
    );
    let _ = writeln!(html, "<style>{}</style>\n</head>\n<body>", STYLE);

    let _ = writeln!(html, "<h1>{}</h1>", escape(DOCUMENT_TITLE));
    let _ = writeln!(
        html,
        "<p class=\"meta\">Contract ID: {}<br>Date: {}</p>",
        escape(document.contract_id),
        escape(&document.contract_date())
    );

    let company = if draft.client.company.trim().is_empty() {
        String::new()
    } else {
        format!(" of {}", escape(draft.client.company.trim()))
    };
    let address = client_address(&draft.client);
    let location = if address.is_empty() {
        String::new()
    } else {
        format!(", located at {}", escape(&address))
    };
    let _ = writeln!(
        html,
        "<p class=\"parties\">This agreement is made between <strong>{}</strong> (&quot;Provider&quot;), located in {}, and <strong>{}</strong>{} (&quot;Client&quot;){}.</p>",
        escape(&provider.name),
        escape(&provider.location),
        escape(or_placeholder(&draft.client.name)),
        company,
        location
    );

    for section in document.sections() {
        let _ = writeln!(
            html,
            "<section id=\"{}\">\n<h2>{}</h2>",
            section.key.key(),
            escape(&section.heading())
        );
        for content in &section.content {
            render_content(&mut html, content);
        }
        html.push_str("</section>\n");
    }

    render_signatures(&mut html, document);

    html.push_str("</body>\n</html>\n");
    html
}

fn render_content(html: &mut String, content: &Content) {
    match content {
        Content::Paragraph(text) => {
            let _ = writeln!(html, "<p>{}</p>", escape(text));
        }
        Content::Subheading(text) => {
            let _ = writeln!(html, "<h3>{}</h3>", escape(text));
        }
        Content::Bullets(items) => {
            html.push_str("<ul>\n");
            for item in items {
                let _ = writeln!(html, "<li>{}</li>", escape(item));
            }
            html.push_str("</ul>\n");
        }
        Content::Fields(fields) => {
            html.push_str("<p>");
            for (index, (label, value)) in fields.iter().enumerate() {
                if index > 0 {
                    html.push_str("<br>");
                }
                let _ = write!(html, "<strong>{}:</strong> {}", escape(label), escape(value));
            }
            html.push_str("</p>\n");
        }
    }
}

fn render_signatures(html: &mut String, document: &ContractDocument<'_>) {
    let client = &document.draft.client;

    html.push_str("<section id=\"signatures\">\n<h2>SIGNATURES</h2>\n");
    html.push_str(
        "<p>By signing below, both parties agree to the terms and conditions of this agreement.</p>\n",
    );
    html.push_str("<div class=\"signatures\">\n");

    let _ = writeln!(
        html,
        "<div class=\"signature\"><p><strong>Provider</strong></p><div class=\"line\"></div><p>{}<br>Date: ____________</p></div>",
        escape(&document.provider.name)
    );

    // A missing client name leaves a blank line to be filled by hand
    let client_name = if client.name.trim().is_empty() {
        "____________________".to_string()
    } else {
        escape(client.name.trim())
    };
    let client_company = if client.company.trim().is_empty() {
        String::new()
    } else {
        format!("<br>{}", escape(client.company.trim()))
    };
    let _ = writeln!(
        html,
        "<div class=\"signature\"><p><strong>Client</strong></p><div class=\"line\"></div><p>{}{}<br>Date: ____________</p></div>",
        client_name, client_company
    );

    html.push_str("</div>\n</section>\n");
}
