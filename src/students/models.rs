//! Student Domain Models
//! Mission: Define student and payment data structures

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Enrolled student ("aluno")
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Aluno {
    pub id: Uuid,
    pub nome: String,
    pub contato: String,
    pub telefone: String,
    pub forma_pagamento: String,
    pub valor_mensalidade: f64,
    pub data_matricula: NaiveDate,
    pub fim_plano: Option<NaiveDate>,
}

/// Recorded payment ("pagamento"), owned by exactly one aluno
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pagamento {
    pub id: Uuid,
    pub aluno_id: Uuid,
    pub data_pagamento: DateTime<Utc>,
    pub periodo: String,
}

/// Student creation request. `data_matricula` falls back to the current
/// date at call time when omitted.
#[derive(Debug, Deserialize)]
pub struct NovoAluno {
    pub nome: String,
    pub contato: String,
    pub telefone: String,
    pub forma_pagamento: String,
    pub valor_mensalidade: f64,
    #[serde(default)]
    pub data_matricula: Option<NaiveDate>,
    #[serde(default)]
    pub fim_plano: Option<NaiveDate>,
}

/// Payment registration request
#[derive(Debug, Deserialize)]
pub struct NovoPagamento {
    pub aluno_id: Uuid,
    pub periodo: String,
}

/// Student plus full payment history, as returned by the status endpoint
#[derive(Debug, Serialize)]
pub struct AlunoStatus {
    #[serde(flatten)]
    pub aluno: Aluno,
    pub pagamentos: Vec<Pagamento>,
}
