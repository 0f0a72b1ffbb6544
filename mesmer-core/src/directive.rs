//! Advisory directive handed to the generation backend.
//!
//! The directive is metadata plus a short rendered text the host appends to
//! the generation context. The engine never inspects or constrains what the
//! backend produces from it.

use serde::Serialize;

use crate::session::SessionAttributes;

/// Built-in directive template, overridable via `directive_template` in the
/// configuration snapshot.
pub const DEFAULT_DIRECTIVE_TEMPLATE: &str = "\
[Interactive mode active]
A device called \"{item_name}\" is currently affecting your character.
Sensitivity level: {sensitivity}% - the higher the level, the stronger and \
more immediate the reactions.
Stay in character and let the device's influence show naturally in your reply.";

/// Contextual payload for an active session.
#[derive(Debug, Clone, Serialize)]
pub struct Directive {
    /// Item label captured when the session started
    pub item_name: String,
    /// Sensitivity level captured when the session started
    pub sensitivity: u8,
    /// Rendered advisory text
    pub text: String,
}

impl Directive {
    /// Render a directive from session attributes.
    ///
    /// Substitution is plain placeholder replacement: unknown placeholders
    /// pass through untouched and a template without placeholders is used
    /// as-is, so a malformed custom template can never fail the hook.
    pub fn render(template: &str, attributes: &SessionAttributes) -> Self {
        let text = template
            .replace("{item_name}", &attributes.item_name)
            .replace("{sensitivity}", &attributes.sensitivity.to_string());

        Self {
            item_name: attributes.item_name.clone(),
            sensitivity: attributes.sensitivity,
            text,
        }
    }
}
