//! Student and Payment Storage
//! Mission: Persist alunos and their pagamentos, derive delinquency

use crate::db::Db;
use crate::students::models::{Aluno, AlunoStatus, NovoAluno, Pagamento};
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, OptionalExtension};
use tracing::info;
use uuid::Uuid;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS alunos (
    id TEXT PRIMARY KEY,
    nome TEXT NOT NULL,
    contato TEXT NOT NULL,
    telefone TEXT NOT NULL,
    forma_pagamento TEXT NOT NULL,
    valor_mensalidade REAL NOT NULL,
    data_matricula TEXT NOT NULL,
    fim_plano TEXT
) WITHOUT ROWID;

CREATE TABLE IF NOT EXISTS pagamentos (
    id TEXT PRIMARY KEY,
    aluno_id TEXT NOT NULL REFERENCES alunos(id),
    data_pagamento TEXT NOT NULL,
    periodo TEXT NOT NULL
) WITHOUT ROWID;

CREATE INDEX IF NOT EXISTS idx_pagamentos_aluno
    ON pagamentos(aluno_id, data_pagamento);
"#;

const ALUNO_COLUMNS: &str =
    "id, nome, contato, telefone, forma_pagamento, valor_mensalidade, data_matricula, fim_plano";

const PAGAMENTO_COLUMNS: &str = "id, aluno_id, data_pagamento, periodo";

/// Store over the `alunos` and `pagamentos` tables
pub struct StudentStore {
    db: Db,
}

impl StudentStore {
    pub fn new(db: Db) -> Result<Self> {
        db.lock()
            .execute_batch(SCHEMA_SQL)
            .context("Failed to initialize alunos schema")?;
        Ok(Self { db })
    }

    /// Persist a new aluno. The enrollment date defaults to today, resolved
    /// here at call time rather than at startup.
    pub fn create_student(&self, novo: NovoAluno) -> Result<Aluno> {
        let aluno = Aluno {
            id: Uuid::new_v4(),
            nome: novo.nome,
            contato: novo.contato,
            telefone: novo.telefone,
            forma_pagamento: novo.forma_pagamento,
            valor_mensalidade: novo.valor_mensalidade,
            data_matricula: novo
                .data_matricula
                .unwrap_or_else(|| Utc::now().date_naive()),
            fim_plano: novo.fim_plano,
        };

        self.db
            .lock()
            .execute(
                "INSERT INTO alunos (id, nome, contato, telefone, forma_pagamento,
                                     valor_mensalidade, data_matricula, fim_plano)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    aluno.id.to_string(),
                    aluno.nome,
                    aluno.contato,
                    aluno.telefone,
                    aluno.forma_pagamento,
                    aluno.valor_mensalidade,
                    aluno.data_matricula.to_string(),
                    aluno.fim_plano.map(|d| d.to_string()),
                ],
            )
            .context("Failed to insert aluno")?;

        info!("✅ Enrolled aluno: {}", aluno.nome);

        Ok(aluno)
    }

    /// All alunos in natural storage order.
    pub fn list_students(&self) -> Result<Vec<Aluno>> {
        let conn = self.db.lock();

        let mut stmt = conn.prepare(&format!("SELECT {} FROM alunos", ALUNO_COLUMNS))?;
        let alunos = stmt
            .query_map([], aluno_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(alunos)
    }

    /// One aluno plus payment history ordered by payment date.
    /// Returns `None` for an unknown id.
    pub fn student_status(&self, id: &Uuid) -> Result<Option<AlunoStatus>> {
        let conn = self.db.lock();

        let aluno = conn
            .query_row(
                &format!("SELECT {} FROM alunos WHERE id = ?1", ALUNO_COLUMNS),
                params![id.to_string()],
                aluno_from_row,
            )
            .optional()?;

        let Some(aluno) = aluno else {
            return Ok(None);
        };

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM pagamentos WHERE aluno_id = ?1 ORDER BY data_pagamento",
            PAGAMENTO_COLUMNS
        ))?;
        let pagamentos = stmt
            .query_map(params![id.to_string()], pagamento_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(AlunoStatus { aluno, pagamentos }))
    }

    /// Record a payment. Returns `None` when the aluno does not exist;
    /// the existence check and insert run under one lock.
    pub fn create_payment(&self, aluno_id: &Uuid, periodo: &str) -> Result<Option<Pagamento>> {
        let conn = self.db.lock();

        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM alunos WHERE id = ?1)",
            params![aluno_id.to_string()],
            |row| row.get(0),
        )?;
        if !exists {
            return Ok(None);
        }

        let pagamento = Pagamento {
            id: Uuid::new_v4(),
            aluno_id: *aluno_id,
            data_pagamento: Utc::now(),
            periodo: periodo.to_string(),
        };

        conn.execute(
            "INSERT INTO pagamentos (id, aluno_id, data_pagamento, periodo)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                pagamento.id.to_string(),
                pagamento.aluno_id.to_string(),
                pagamento.data_pagamento.to_rfc3339(),
                pagamento.periodo,
            ],
        )
        .context("Failed to insert pagamento")?;

        Ok(Some(pagamento))
    }

    /// Alunos with no payment on file. Derived per query, never stored.
    pub fn list_delinquent(&self) -> Result<Vec<Aluno>> {
        let conn = self.db.lock();

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM alunos a
             WHERE NOT EXISTS (SELECT 1 FROM pagamentos p WHERE p.aluno_id = a.id)",
            ALUNO_COLUMNS
        ))?;
        let alunos = stmt
            .query_map([], aluno_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(alunos)
    }
}

fn aluno_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Aluno> {
    let id: String = row.get(0)?;
    let data_matricula: String = row.get(6)?;
    let fim_plano: Option<String> = row.get(7)?;

    Ok(Aluno {
        id: Uuid::parse_str(&id).map_err(|e| text_conversion_error(0, e))?,
        nome: row.get(1)?,
        contato: row.get(2)?,
        telefone: row.get(3)?,
        forma_pagamento: row.get(4)?,
        valor_mensalidade: row.get(5)?,
        data_matricula: parse_date(&data_matricula, 6)?,
        fim_plano: fim_plano.map(|d| parse_date(&d, 7)).transpose()?,
    })
}

fn pagamento_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Pagamento> {
    let id: String = row.get(0)?;
    let aluno_id: String = row.get(1)?;
    let data_pagamento: String = row.get(2)?;

    Ok(Pagamento {
        id: Uuid::parse_str(&id).map_err(|e| text_conversion_error(0, e))?,
        aluno_id: Uuid::parse_str(&aluno_id).map_err(|e| text_conversion_error(1, e))?,
        data_pagamento: DateTime::parse_from_rfc3339(&data_pagamento)
            .map_err(|e| text_conversion_error(2, e))?
            .with_timezone(&Utc),
        periodo: row.get(3)?,
    })
}

fn parse_date(text: &str, idx: usize) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d").map_err(|e| text_conversion_error(idx, e))
}

fn text_conversion_error(
    idx: usize,
    e: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn create_test_store() -> (StudentStore, NamedTempFile) {
        let temp_file = NamedTempFile::new().unwrap();
        let db = crate::db::open(temp_file.path().to_str().unwrap()).unwrap();
        let store = StudentStore::new(db).unwrap();
        (store, temp_file)
    }

    fn novo_aluno(nome: &str) -> NovoAluno {
        NovoAluno {
            nome: nome.to_string(),
            contato: format!("{}@example.com", nome),
            telefone: "11 97777-2222".to_string(),
            forma_pagamento: "Pix".to_string(),
            valor_mensalidade: 150.0,
            data_matricula: None,
            fim_plano: None,
        }
    }

    #[test]
    fn test_create_student_defaults_enrollment_to_today() {
        let (store, _temp) = create_test_store();

        let aluno = store.create_student(novo_aluno("carla")).unwrap();
        assert_eq!(aluno.data_matricula, Utc::now().date_naive());
        assert!(aluno.fim_plano.is_none());
    }

    #[test]
    fn test_create_student_keeps_explicit_dates() {
        let (store, _temp) = create_test_store();

        let mut novo = novo_aluno("diego");
        novo.data_matricula = NaiveDate::from_ymd_opt(2025, 3, 10);
        novo.fim_plano = NaiveDate::from_ymd_opt(2026, 3, 10);

        let aluno = store.create_student(novo).unwrap();
        assert_eq!(
            aluno.data_matricula,
            NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
        );

        // Survives a storage roundtrip
        let status = store.student_status(&aluno.id).unwrap().unwrap();
        assert_eq!(status.aluno.fim_plano, NaiveDate::from_ymd_opt(2026, 3, 10));
    }

    #[test]
    fn test_list_students() {
        let (store, _temp) = create_test_store();

        assert!(store.list_students().unwrap().is_empty());

        store.create_student(novo_aluno("ana")).unwrap();
        store.create_student(novo_aluno("bia")).unwrap();

        assert_eq!(store.list_students().unwrap().len(), 2);
    }

    #[test]
    fn test_status_orders_payments_by_date() {
        let (store, _temp) = create_test_store();

        let aluno = store.create_student(novo_aluno("edu")).unwrap();
        store.create_payment(&aluno.id, "2026-01").unwrap().unwrap();
        store.create_payment(&aluno.id, "2026-02").unwrap().unwrap();

        let status = store.student_status(&aluno.id).unwrap().unwrap();
        assert_eq!(status.pagamentos.len(), 2);
        assert_eq!(status.pagamentos[0].periodo, "2026-01");
        assert_eq!(status.pagamentos[1].periodo, "2026-02");
        assert!(status.pagamentos[0].data_pagamento <= status.pagamentos[1].data_pagamento);
    }

    #[test]
    fn test_status_unknown_student_is_none() {
        let (store, _temp) = create_test_store();

        assert!(store.student_status(&Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn test_payment_for_unknown_student_inserts_nothing() {
        let (store, _temp) = create_test_store();

        let result = store.create_payment(&Uuid::new_v4(), "2026-01").unwrap();
        assert!(result.is_none());

        let count: i64 = store
            .db
            .lock()
            .query_row("SELECT COUNT(*) FROM pagamentos", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_delinquency_transitions_on_first_payment() {
        let (store, _temp) = create_test_store();

        let aluno = store.create_student(novo_aluno("fabio")).unwrap();
        let paying = store.create_student(novo_aluno("gina")).unwrap();
        store
            .create_payment(&paying.id, "2026-01")
            .unwrap()
            .unwrap();

        let delinquent = store.list_delinquent().unwrap();
        assert_eq!(delinquent.len(), 1);
        assert_eq!(delinquent[0].id, aluno.id);

        store.create_payment(&aluno.id, "2026-01").unwrap().unwrap();
        assert!(store.list_delinquent().unwrap().is_empty());
    }
}
