//! Prompt construction.
//!
//! One fixed instruction template with two placeholder slots is the entire
//! interface between this system and the model. `{{URL_PATH}}` receives the
//! raw slash-joined path so the model sees the full hierarchical context;
//! `{{OPTIONAL_DATA}}` receives serialized form fields when a submission is
//! present and is blanked otherwise. Nothing else is negotiated per request.

use std::collections::BTreeMap;

/// Submitted form fields. Ordered so the rendered prompt is deterministic
/// for a given submission.
pub type FormFields = BTreeMap<String, String>;

/// The instruction template. First line of the reply must be a MIME content
/// type; everything after is payload only. HTML replies must use full
/// document structure and rewrite relative links to carry the current path
/// prefix so navigation preserves hierarchical context.
const BASE_PROMPT: &str = r#"Generate a comprehensive and detailed response for the URL path: `{{URL_PATH}}`

The first line must be the Content-Type (use 'text/html' for HTML responses).
All subsequent lines should contain ONLY the renderable content with NO explanatory text, examples, or instructions.

For HTML responses:
- Include proper HTML structure (doctype, html, head, body tags)
- Add a relevant title and content based on the URL path
- Create rich, detailed content with multiple paragraphs explaining the topic thoroughly
- Include at least 3-4 well-developed sections with headings
- Add relevant details, examples, code snippets, or data tables when appropriate
- Use proper semantic HTML (headings, lists, tables, etc.) for structure
- Include a visually appealing layout with appropriate CSS styling
- IMPORTANT: When creating links to related topics, always use the full path that includes the current context.
  For example, if the current URL is "/stronghold-crusader" and you're linking to "units",
  use "/stronghold-crusader/units" instead of just "/units".
- Create a "Related Topics" section at the end, but ONLY after providing substantial content
- Ensure all relative links maintain the parent context of the current URL path
- Ensure the HTML is valid and immediately renderable in a browser
- Focus on providing valuable, educational content rather than just navigation

{{OPTIONAL_DATA}}
Content-Type:
"#;

/// Render the instruction template for a request.
///
/// `raw_path` is passed through un-normalized; the model is told about the
/// path exactly as the user requested it.
pub fn build_prompt(raw_path: &str, form: Option<&FormFields>) -> String {
    let optional = match form {
        Some(fields) if !fields.is_empty() => {
            let json = serde_json::to_string(fields).unwrap_or_default();
            format!("form data: {json}")
        }
        _ => String::new(),
    };
    BASE_PROMPT
        .replace("{{OPTIONAL_DATA}}", &optional)
        .replace("{{URL_PATH}}", raw_path)
}
