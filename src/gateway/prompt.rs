//! Prompt template with `{nature}` and `{draft}` slots.

use crate::{EscribaError, Result};

const NATURE_SLOT: &str = "{nature}";
const DRAFT_SLOT: &str = "{draft}";

/// Default instruction: rewrite the operator's narrative as formal,
/// impersonal report language without altering any fact.
pub const DEFAULT_TEMPLATE: &str = "Atue como um Policial Militar (P2). \
Reescreva o rascunho abaixo transformando-o em um texto formal, técnico, coeso e impessoal \
para um Boletim de Ocorrência (BOPM). \
Mantenha ESTRITAMENTE todos os fatos, nomes, quantidades, placas e horários citados.\n\n\
Natureza: {nature}\n\
Rascunho: {draft}\n\n\
Saída (Apenas o texto reescrito):";

/// A validated prompt template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    /// Parse a template; both slots must appear at least once.
    pub fn new(template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        for slot in [NATURE_SLOT, DRAFT_SLOT] {
            if !template.contains(slot) {
                return Err(EscribaError::Configuration(format!(
                    "prompt template is missing the {slot} slot"
                )));
            }
        }
        Ok(Self { template })
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Fill both slots in a single left-to-right pass.
    ///
    /// Substituted text is never rescanned, so a draft that happens to
    /// contain `{nature}` reaches the model verbatim.
    pub fn render(&self, nature: &str, draft: &str) -> String {
        let mut out = String::with_capacity(self.template.len() + nature.len() + draft.len());
        let mut rest = self.template.as_str();

        while let Some(pos) = rest.find('{') {
            out.push_str(&rest[..pos]);
            let tail = &rest[pos..];
            if let Some(after) = tail.strip_prefix(NATURE_SLOT) {
                out.push_str(nature);
                rest = after;
            } else if let Some(after) = tail.strip_prefix(DRAFT_SLOT) {
                out.push_str(draft);
                rest = after;
            } else {
                out.push('{');
                rest = &tail[1..];
            }
        }
        out.push_str(rest);
        out
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_template_has_both_slots() {
        assert!(PromptTemplate::new(DEFAULT_TEMPLATE).is_ok());
    }

    #[test]
    fn missing_slot_rejected() {
        let err = PromptTemplate::new("only {draft}").unwrap_err();
        assert!(err.to_string().contains("{nature}"));
        assert!(PromptTemplate::new("only {nature}").is_err());
    }

    #[test]
    fn renders_both_slots() {
        let t = PromptTemplate::new("N={nature};D={draft}").unwrap();
        assert_eq!(t.render("Furto", "vi o cara"), "N=Furto;D=vi o cara");
    }

    #[test]
    fn substituted_text_is_not_rescanned() {
        let t = PromptTemplate::new("{draft}|{nature}").unwrap();
        assert_eq!(t.render("Roubo", "texto {nature}"), "texto {nature}|Roubo");
    }

    #[test]
    fn stray_braces_survive() {
        let t = PromptTemplate::new("{x} {nature} {{draft}} {").unwrap();
        assert_eq!(t.render("n", "d"), "{x} n {d} {");
    }

    #[test]
    fn repeated_slots_all_filled() {
        let t = PromptTemplate::new("{nature} {draft} {nature}").unwrap();
        assert_eq!(t.render("a", "b"), "a b a");
    }
}
