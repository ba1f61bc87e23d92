//! Template system for the HTML diff formatter.
//!
//! Two small Handlebars templates, compiled once into a lazily-initialized
//! registry — the same precedent as a larger template-driven renderer, scaled
//! down to the `ins`/`del` markers this crate actually emits.

use handlebars::Handlebars;
use serde::Serialize;
use std::sync::LazyLock;

const DEL: &str = r#"<del style="text-decoration: line-through;color: red;">{{text}}</del>"#;
const INS: &str = r#"<ins style="text-decoration: underline;color: green;">{{text}}</ins>"#;

/// Template names for use with the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateName {
    Del,
    Ins,
}

impl TemplateName {
    /// Returns the string name used in the handlebars registry.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Del => "del",
            Self::Ins => "ins",
        }
    }
}

/// Global template registry initialized on first use.
static TEMPLATES: LazyLock<Handlebars<'static>> = LazyLock::new(|| {
    let mut hbs = Handlebars::new();
    // The diff renderer already escapes/decides what goes in {{text}}.
    hbs.register_escape_fn(handlebars::no_escape);
    register_templates(&mut hbs);
    hbs
});

fn register_templates(hbs: &mut Handlebars<'static>) {
    hbs.register_template_string(TemplateName::Del.as_str(), DEL)
        .expect("failed to register del template");
    hbs.register_template_string(TemplateName::Ins.as_str(), INS)
        .expect("failed to register ins template");
}

/// Render a template with the given data.
///
/// # Panics
/// Panics if rendering fails, which indicates a bug in one of the two
/// templates above rather than anything caller-supplied.
pub fn render<T: Serialize>(template: TemplateName, data: &T) -> String {
    TEMPLATES
        .render(template.as_str(), data)
        .unwrap_or_else(|e| panic!("failed to render template '{}': {}", template.as_str(), e))
}

/// The one piece of data either template needs.
#[derive(Serialize)]
pub struct TextData<'a> {
    pub text: &'a str,
}
