// Technician name canonicalization against the configured roster

use strsim::jaro_winkler;

const FUZZY_THRESHOLD: f64 = 0.92;

pub const DEFAULT_ROSTER: [&str; 5] = [
    "Gabriele De Palma",
    "Davide Cestone",
    "Alex Ferrario",
    "Marco Birocchi",
    "Matteo Signo",
];

pub fn is_technician_column(column: &str) -> bool {
    let lower = column.trim().to_lowercase();
    lower == "tecnico" || lower == "creato da"
}

#[derive(Debug, Clone)]
pub struct TechnicianRoster {
    names: Vec<String>,
}

impl Default for TechnicianRoster {
    fn default() -> Self {
        Self::new(DEFAULT_ROSTER.iter().map(|name| name.to_string()).collect())
    }
}

impl TechnicianRoster {
    pub fn new(names: Vec<String>) -> Self {
        let names = names
            .into_iter()
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();
        Self { names }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Title case, exact, containment, then token and fuzzy matching.
    /// Falls back to the cleaned value.
    pub fn canonicalize(&self, raw: &str) -> String {
        let cleaned = title_case(raw);
        if cleaned.is_empty() {
            return cleaned;
        }
        let lower = cleaned.to_lowercase();

        if let Some(name) = self.names.iter().find(|name| name.to_lowercase() == lower) {
            return name.clone();
        }
        if let Some(name) = self.names.iter().find(|name| {
            let candidate = name.to_lowercase();
            lower.contains(&candidate) || (lower.len() >= 4 && candidate.contains(&lower))
        }) {
            return name.clone();
        }

        let tokens: Vec<&str> = lower.split_whitespace().collect();
        if let Some(name) = self.names.iter().find(|name| {
            let candidate = name.to_lowercase();
            let parts: Vec<&str> = candidate.split_whitespace().collect();
            parts.len() >= 2 && parts.iter().all(|part| tokens.contains(part))
        }) {
            return name.clone();
        }

        self.names
            .iter()
            .map(|name| (name, jaro_winkler(&lower, &name.to_lowercase())))
            .filter(|(_, score)| *score >= FUZZY_THRESHOLD)
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(name, _)| name.clone())
            .unwrap_or(cleaned)
    }
}

pub fn title_case(value: &str) -> String {
    value
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
