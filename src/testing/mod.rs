use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::database::models::Projeto;
use crate::services::projeto_service::{ProjetoInsert, ProjetoStore};
use crate::services::ServiceError;
use crate::types::PapelComissao;

/// In-memory `ProjetoStore` that records writes and fails on demand
#[derive(Default)]
pub struct FakeProjetoStore {
    projetos: Mutex<Vec<Projeto>>,
    links: Mutex<Vec<(Uuid, Uuid, PapelComissao)>>,
    tags: Mutex<Vec<(Uuid, String)>>,
    rejected_comissoes: Vec<Uuid>,
    rejected_tags: Vec<String>,
    fail_insert: bool,
}

impl FakeProjetoStore {
    pub fn reject_comissao(mut self, id: Uuid) -> Self {
        self.rejected_comissoes.push(id);
        self
    }

    pub fn reject_tag(mut self, tag: &str) -> Self {
        self.rejected_tags.push(tag.to_string());
        self
    }

    pub fn fail_insert(mut self) -> Self {
        self.fail_insert = true;
        self
    }

    pub fn projetos(&self) -> Vec<Projeto> {
        self.projetos.lock().unwrap().clone()
    }

    pub fn links(&self) -> Vec<(Uuid, Uuid, PapelComissao)> {
        self.links.lock().unwrap().clone()
    }

    pub fn tags(&self) -> Vec<(Uuid, String)> {
        self.tags.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProjetoStore for FakeProjetoStore {
    async fn insert_projeto(&self, projeto: &ProjetoInsert) -> Result<Projeto, ServiceError> {
        if self.fail_insert {
            return Err(ServiceError::Conflict("insert rejected".to_string()));
        }
        let now = Utc::now();
        let row = Projeto {
            id: Uuid::new_v4(),
            nome: projeto.nome.clone(),
            descricao: projeto.descricao.clone(),
            objetivos: projeto.objetivos.clone(),
            resultados_esperados: projeto.resultados_esperados.clone(),
            publico_alvo: projeto.publico_alvo.clone(),
            data_inicio: projeto.data_inicio,
            data_fim_prevista: projeto.data_fim_prevista,
            data_fim_real: None,
            status: projeto.status.as_str().to_string(),
            created_at: now,
            updated_at: now,
        };
        self.projetos.lock().unwrap().push(row.clone());
        Ok(row)
    }

    async fn link_comissao(&self, projeto_id: Uuid, comissao_id: Uuid, papel: PapelComissao) -> Result<(), ServiceError> {
        if self.rejected_comissoes.contains(&comissao_id) {
            return Err(ServiceError::NotFound(format!("comissao {} does not exist", comissao_id)));
        }
        self.links.lock().unwrap().push((projeto_id, comissao_id, papel));
        Ok(())
    }

    async fn add_tag(&self, projeto_id: Uuid, tag: &str) -> Result<(), ServiceError> {
        if self.rejected_tags.iter().any(|t| t == tag) {
            return Err(ServiceError::Conflict(format!("tag '{}' already exists", tag)));
        }
        self.tags.lock().unwrap().push((projeto_id, tag.to_string()));
        Ok(())
    }
}
