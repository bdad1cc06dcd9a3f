//! Configuração do leadqueue carregada a partir de `leadqueue.toml`.
//!
//! A struct [`LeadQueueConfig`] contém todos os parâmetros configuráveis.
//! Valores não presentes no arquivo usam defaults sensíveis.
//! A variável de ambiente `LEADQUEUE_BASE_URL` tem precedência sobre o arquivo.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::queue::DailyGoals;

const CONFIG_FILE: &str = "leadqueue.toml";

/// Configuração de nível superior carregada de `leadqueue.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct LeadQueueConfig {
    /// URL base da API (ex.: `http://127.0.0.1:5000/api`).
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Timeout total de cada requisição, em segundos.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Timeout de conexão, em segundos.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Tamanho padrão do lote ao gerar um novo.
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    /// Indústrias enviadas ao gerar um lote. Vazio = todas.
    #[serde(default)]
    pub industries: Vec<String>,

    /// Metas diárias por tipo de atividade.
    #[serde(default)]
    pub goals: DailyGoals,
}

// Valor padrão para a URL base: servidor local.
fn default_base_url() -> String {
    "http://127.0.0.1:5000/api".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_batch_size() -> u32 {
    25
}

impl Default for LeadQueueConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            batch_size: default_batch_size(),
            industries: Vec::new(),
            goals: DailyGoals::default(),
        }
    }
}

impl LeadQueueConfig {
    /// Carrega `leadqueue.toml` do diretório atual, ou os defaults se não existir.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    /// Carrega a configuração de um caminho explícito.
    /// Usa valores padrão se o arquivo não existir.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            toml::from_str::<LeadQueueConfig>(&contents)
                .with_context(|| format!("parsing {}", path.display()))?
        } else {
            Self::default()
        };

        // Variável de ambiente tem precedência sobre o arquivo de configuração.
        if let Ok(url) = std::env::var("LEADQUEUE_BASE_URL")
            && !url.trim().is_empty()
        {
            config.base_url = url.trim().to_string();
        }

        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}
