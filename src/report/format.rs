//! Final BOPM document assembly.
//!
//! The document is Markdown: title, occurrence date/time, team block,
//! the formal narrative and the supplementary sections.

use chrono::NaiveDateTime;

use crate::types::BopmReport;

/// Shown for an empty material or procedures section.
pub const NOTHING_RECORDED: &str = "Nada consta";

const TIMESTAMP_FORMAT: &str = "%d/%m/%Y – %H:%M";

/// Assemble the full report around `narrative`, dated `when`.
///
/// Auxiliary officers appear only when filled in.
pub fn render_document(report: &BopmReport, narrative: &str, when: NaiveDateTime) -> String {
    let team = &report.team;
    let mut team_block = format!(
        "**Equipe Policial**\n**Motorista:** {}\n**Encarregado:** {}",
        team.driver, team.commander
    );
    for (label, name) in [("1º Auxiliar", &team.aux1), ("2º Auxiliar", &team.aux2)] {
        if !name.trim().is_empty() {
            team_block.push_str(&format!("\n**{label}:** {}", name.trim()));
        }
    }

    let details = &report.details;
    format!(
        "**Título:**\n\
         BOPM #{number} ({offender})\n\
         \n\
         **Modelo:**\n\
         \n\
         **BOLETIM DE OCORRÊNCIA POLICIAL MILITAR – BOPM**\n\
         \n\
         **Data/Hora da Ocorrência:** {when}\n\
         \n\
         {team_block}\n\
         \n\
         **Relato dos Fatos:**\n\
         {narrative}\n\
         \n\
         **Natureza dos Fatos:** {nature}\n\
         \n\
         **Material Apreendido:** {material}\n\
         \n\
         **Procedimentos:** {procedures}\n\
         \n\
         **Assinatura do Responsável:** {signature}",
        number = report.number,
        offender = report.offender,
        when = when.format(TIMESTAMP_FORMAT),
        nature = report.nature,
        material = or_nothing_recorded(&details.material),
        procedures = or_nothing_recorded(&details.procedures),
        signature = details.signature.trim(),
    )
}

fn or_nothing_recorded(text: &str) -> &str {
    match text.trim() {
        "" => NOTHING_RECORDED,
        text => text,
    }
}
