use super::outline::{deck_outline, Block, DeckSlide};
use crate::core::shared::utils::escape_xml;
use crate::reports::AuditDeck;

const STYLE: &str = r#"
        * { margin: 0; padding: 0; box-sizing: border-box; }
        body { font-family: Arial, sans-serif; background: #e9ecef; color: #212529; }
        .slide {
            width: 960px;
            min-height: 540px;
            margin: 20px auto;
            padding: 48px 56px;
            background: #ffffff;
            box-shadow: 0 4px 20px rgba(0,0,0,0.15);
        }
        .slide h1 { color: #1f4e79; font-size: 40px; margin-top: 140px; }
        .slide h2 { color: #1f4e79; font-size: 30px; margin-bottom: 8px; }
        .subtitle { color: #6c757d; font-size: 18px; margin-bottom: 24px; }
        .slide p { font-size: 18px; line-height: 1.5; margin-bottom: 16px; }
        .slide ul { font-size: 18px; line-height: 1.5; margin: 0 0 16px 24px; }
        .slide table { border-collapse: collapse; font-size: 18px; margin-bottom: 16px; }
        .slide td { padding: 6px 24px 6px 0; border-bottom: 1px solid #dee2e6; }
        .slide td.value { text-align: right; font-weight: bold; }
        .notice { color: #b35c00; font-style: italic; }
"#;

fn render_block(block: &Block, notice: bool) -> String {
    match block {
        Block::Paragraph(text) if notice => {
            format!("        <p class=\"notice\">{}</p>\n", escape_xml(text))
        }
        Block::Paragraph(text) => format!("        <p>{}</p>\n", escape_xml(text)),
        Block::Bullets(items) => {
            let mut out = String::from("        <ul>\n");
            for item in items {
                out.push_str(&format!("            <li>{}</li>\n", escape_xml(item)));
            }
            out.push_str("        </ul>\n");
            out
        }
        Block::Table(rows) => {
            let mut out = String::from("        <table>\n");
            for (label, value) in rows {
                out.push_str(&format!(
                    "            <tr><td>{}</td><td class=\"value\">{}</td></tr>\n",
                    escape_xml(label),
                    escape_xml(value)
                ));
            }
            out.push_str("        </table>\n");
            out
        }
    }
}

fn render_slide(slide: &DeckSlide, is_title: bool) -> String {
    let heading = if is_title { "h1" } else { "h2" };
    let mut html = String::from("    <section class=\"slide\">\n");
    html.push_str(&format!(
        "        <{heading}>{}</{heading}>\n",
        escape_xml(&slide.title)
    ));
    if let Some(subtitle) = &slide.subtitle {
        html.push_str(&format!(
            "        <p class=\"subtitle\">{}</p>\n",
            escape_xml(subtitle)
        ));
    }
    for block in &slide.blocks {
        html.push_str(&render_block(block, is_title));
    }
    html.push_str("    </section>\n");
    html
}

/// Static slide markup meant to be pasted into Google Slides.
pub fn render_html(deck: &AuditDeck) -> String {
    let mut html = String::from(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>"#,
    );
    html.push_str(&escape_xml(&deck.title));
    html.push_str("</title>\n    <style>");
    html.push_str(STYLE);
    html.push_str("    </style>\n</head>\n<body>\n");

    for (idx, slide) in deck_outline(deck).iter().enumerate() {
        html.push_str(&render_slide(slide, idx == 0));
    }

    html.push_str("</body>\n</html>\n");
    html
}
