//! Student API Endpoints
//! Mission: Expose student enrollment, payments and delinquency over HTTP

use crate::students::models::{Aluno, AlunoStatus, NovoAluno, NovoPagamento, Pagamento};
use crate::students::store::StudentStore;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

/// Enroll a student - POST /alunos/
pub async fn create_aluno(
    State(store): State<Arc<StudentStore>>,
    Json(novo): Json<NovoAluno>,
) -> Result<Json<Aluno>, StudentApiError> {
    if novo.nome.trim().is_empty() {
        return Err(StudentApiError::EmptyName);
    }

    let aluno = store.create_student(novo).map_err(internal)?;
    Ok(Json(aluno))
}

/// List all students - GET /alunos/
pub async fn list_alunos(
    State(store): State<Arc<StudentStore>>,
) -> Result<Json<Vec<Aluno>>, StudentApiError> {
    let alunos = store.list_students().map_err(internal)?;
    Ok(Json(alunos))
}

/// List students with no payment on file - GET /alunos/inadimplentes/
pub async fn list_inadimplentes(
    State(store): State<Arc<StudentStore>>,
) -> Result<Json<Vec<Aluno>>, StudentApiError> {
    let alunos = store.list_delinquent().map_err(internal)?;
    Ok(Json(alunos))
}

/// Student plus payment history - GET /alunos/{id}/status
pub async fn aluno_status(
    State(store): State<Arc<StudentStore>>,
    Path(id): Path<Uuid>,
) -> Result<Json<AlunoStatus>, StudentApiError> {
    let status = store
        .student_status(&id)
        .map_err(internal)?
        .ok_or(StudentApiError::AlunoNotFound)?;

    Ok(Json(status))
}

/// Record a payment - POST /pagamentos/
pub async fn register_pagamento(
    State(store): State<Arc<StudentStore>>,
    Json(novo): Json<NovoPagamento>,
) -> Result<Json<Pagamento>, StudentApiError> {
    let pagamento = store
        .create_payment(&novo.aluno_id, &novo.periodo)
        .map_err(internal)?
        .ok_or(StudentApiError::AlunoNotFound)?;

    Ok(Json(pagamento))
}

fn internal(e: anyhow::Error) -> StudentApiError {
    warn!("Student store failure: {}", e);
    StudentApiError::InternalError
}

/// Student API errors
#[derive(Debug)]
pub enum StudentApiError {
    AlunoNotFound,
    EmptyName,
    InternalError,
}

impl IntoResponse for StudentApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            StudentApiError::AlunoNotFound => (StatusCode::NOT_FOUND, "Student not found"),
            StudentApiError::EmptyName => (StatusCode::BAD_REQUEST, "Name must not be empty"),
            StudentApiError::InternalError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        (status, message).into_response()
    }
}
