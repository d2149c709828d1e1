//! Configuração da aplicação via TOML.
//!
//! Guarda apenas o que é do lado do userspace (caminhos, timeouts, parâmetros
//! do self-test). Os parâmetros do sensor em si vivem no driver e são lidos
//! via [`ConfigChannel`](crate::attributes::ConfigChannel).

use crate::attributes::DEFAULT_SYSFS_PATH;
use crate::device::DEFAULT_DEV_PATH;
use crate::types::SensorMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Erros ao persistir a configuração.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Erro ao serializar config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Erro ao escrever {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Caminhos do driver.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DeviceConfig {
    /// Diretório de atributos sysfs
    pub sysfs_path: PathBuf,
    /// Character device
    pub dev_path: PathBuf,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            sysfs_path: PathBuf::from(DEFAULT_SYSFS_PATH),
            dev_path: PathBuf::from(DEFAULT_DEV_PATH),
        }
    }
}

/// Loop de monitoramento contínuo.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MonitorConfig {
    /// Timeout de cada poll em ms (-1 = sem timeout)
    pub poll_timeout_ms: i64,
    /// Capacidade da fila entre a thread do sensor e a de saída
    pub queue_capacity: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_timeout_ms: -1,
            queue_capacity: 64,
        }
    }
}

/// Parâmetros do self-test de alerta.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SelfTestConfig {
    /// Threshold aplicado durante o teste (°C)
    pub threshold_c: f64,
    /// Espera máxima, em períodos de amostragem
    pub timeout_periods: u32,
    /// Modo aplicado durante o teste
    pub mode: String,
}

impl Default for SelfTestConfig {
    fn default() -> Self {
        Self {
            // Temperatura normal do simulador fica perto de 25 °C
            threshold_c: 24.5,
            timeout_periods: 2,
            mode: SensorMode::Normal.to_string(),
        }
    }
}

/// Configuração raiz.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub device: DeviceConfig,
    pub monitor: MonitorConfig,
    pub self_test: SelfTestConfig,
}

impl AppConfig {
    /// Carrega configuração de um arquivo TOML.
    pub fn load(path: &Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(content) => match toml::from_str::<AppConfig>(&content) {
                    Ok(config) => {
                        info!("Configuração carregada de {}", path.display());
                        return config;
                    }
                    Err(e) => {
                        warn!("Erro ao parsear {}: {}", path.display(), e);
                    }
                },
                Err(e) => {
                    warn!("Erro ao ler {}: {}", path.display(), e);
                }
            }
        }

        info!("Usando configuração padrão");
        AppConfig::default()
    }

    /// Salva configuração em arquivo TOML.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Configuração salva em {}", path.display());
        Ok(())
    }

    /// Retorna o caminho padrão do simtemp.toml.
    pub fn default_path() -> PathBuf {
        let exe_dir = std::env::current_exe()
            .map(|p| p.parent().unwrap_or(Path::new(".")).to_path_buf())
            .unwrap_or_else(|_| PathBuf::from("."));
        exe_dir.join("simtemp.toml")
    }

    /// Valida a configuração e retorna lista de erros.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.device.sysfs_path.as_os_str().is_empty() {
            errors.push("Caminho sysfs não pode ser vazio".into());
        }
        if self.device.dev_path.as_os_str().is_empty() {
            errors.push("Caminho do device não pode ser vazio".into());
        }
        if self.monitor.poll_timeout_ms < -1 {
            errors.push(format!(
                "Timeout de poll inválido: {} (-1 ou >= 0)",
                self.monitor.poll_timeout_ms
            ));
        }
        if self.monitor.queue_capacity == 0 {
            errors.push("Capacidade da fila não pode ser 0".into());
        }
        if self.self_test.timeout_periods == 0 {
            errors.push("Self-test precisa de pelo menos 1 período".into());
        }
        if let Err(e) = self.self_test.mode.parse::<SensorMode>() {
            errors.push(e.to_string());
        }

        errors
    }
}
