//! Shared domain vocabularies used across services, handlers and the CLI

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjetoStatus {
    Planejamento,
    EmAndamento,
    Concluido,
    Cancelado,
}

/// Role a committee plays inside a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PapelComissao {
    Lider,
    Participante,
    Consultivo,
}

/// Kind of external integration being suggested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TipoIntegracao {
    Api,
    Software,
    Servico,
    Outra,
}

/// Implementation complexity of an integration suggestion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NivelComplexidade {
    Baixa,
    Media,
    Alta,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{value}' is not a valid {kind}; expected one of: {expected}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
    pub expected: String,
}

/// Implements `as_str`, `Display` and `FromStr` for a snake_case vocabulary enum.
macro_rules! vocabulary {
    ($ty:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            pub const ALL: &'static [$ty] = &[$($ty::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok($ty::$variant),)+
                    other => Err(UnknownVariant {
                        kind: $kind,
                        value: other.to_string(),
                        expected: $ty::ALL.iter().map(|v| v.as_str()).collect::<Vec<_>>().join(", "),
                    }),
                }
            }
        }
    };
}

vocabulary!(ProjetoStatus, "status", {
    Planejamento => "planejamento",
    EmAndamento => "em_andamento",
    Concluido => "concluido",
    Cancelado => "cancelado",
});

vocabulary!(PapelComissao, "papel_comissao", {
    Lider => "lider",
    Participante => "participante",
    Consultivo => "consultivo",
});

vocabulary!(TipoIntegracao, "tipo", {
    Api => "api",
    Software => "software",
    Servico => "servico",
    Outra => "outra",
});

vocabulary!(NivelComplexidade, "nivel_complexidade", {
    Baixa => "baixa",
    Media => "media",
    Alta => "alta",
});

impl Default for PapelComissao {
    fn default() -> Self {
        PapelComissao::Participante
    }
}

/// Split a comma separated list, trimming entries and dropping blanks.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Trim each entry and drop blank ones.
pub fn clean_list(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_status_case_insensitively() {
        assert_eq!("EM_ANDAMENTO".parse::<ProjetoStatus>().unwrap(), ProjetoStatus::EmAndamento);
        assert_eq!(" concluido ".parse::<ProjetoStatus>().unwrap(), ProjetoStatus::Concluido);
    }

    #[test]
    fn unknown_status_lists_expected_values() {
        let err = "arquivado".parse::<ProjetoStatus>().unwrap_err();
        assert_eq!(err.kind, "status");
        assert!(err.expected.contains("planejamento"));
        assert!(err.to_string().contains("arquivado"));
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&ProjetoStatus::EmAndamento).unwrap();
        assert_eq!(json, "\"em_andamento\"");
        let tipo: TipoIntegracao = serde_json::from_str("\"servico\"").unwrap();
        assert_eq!(tipo, TipoIntegracao::Servico);
    }

    #[test]
    fn papel_defaults_to_participante() {
        assert_eq!(PapelComissao::default(), PapelComissao::Participante);
    }

    #[test]
    fn split_list_drops_blanks() {
        assert_eq!(split_list(" sei, ,pje ,"), vec!["sei".to_string(), "pje".to_string()]);
        assert!(split_list("").is_empty());
    }
}
