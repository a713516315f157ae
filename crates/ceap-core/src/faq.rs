//! Static FAQ content.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FaqEntry {
    pub q: &'static str,
    pub a: &'static str,
}

pub const FAQ: &[FaqEntry] = &[
    FaqEntry {
        q: "Tempi medi di risposta?",
        a: "Generalmente entro 24–48 ore lavorative.",
    },
    FaqEntry {
        q: "Tempi di consegna?",
        a: "In media 2–3 settimane, variabile in base a brand e disponibilità.",
    },
    FaqEntry {
        q: "Posso inviare un file?",
        a: "Sì, accettiamo Excel/PDF con codici, quantità e note.",
    },
    FaqEntry {
        q: "Gestite componenti obsoleti?",
        a: "Sì, ricerchiamo alternative e lotti speciali.",
    },
];
