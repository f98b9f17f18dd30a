//! Bidding modality (procurement procedure)

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BiddingType {
    Pregao,
    Concorrencia,
    TomadaPrecos,
    Convite,
    Leilao,
    Concurso,
}

impl BiddingType {
    pub const ALL: [BiddingType; 6] = [
        Self::Pregao,
        Self::Concorrencia,
        Self::TomadaPrecos,
        Self::Convite,
        Self::Leilao,
        Self::Concurso,
    ];

    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Pregao => "PREGAO",
            Self::Concorrencia => "CONCORRENCIA",
            Self::TomadaPrecos => "TOMADA_PRECOS",
            Self::Convite => "CONVITE",
            Self::Leilao => "LEILAO",
            Self::Concurso => "CONCURSO",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.code() == code)
    }
}

impl fmt::Display for BiddingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
