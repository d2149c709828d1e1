//! Canal de configuração via atributos sysfs.
//!
//! Cada getter relê o atributo e cada setter escreve direto no driver:
//! nada é cacheado aqui, o device é sempre a fonte da verdade. Falhas
//! nunca sobem como erro; getters caem no valor padrão e setters retornam
//! `false`, sempre com um [`Diagnostic`] no sink.

use crate::diagnostics::{Diagnostic, DiagnosticSink};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Diretório sysfs padrão do driver.
pub const DEFAULT_SYSFS_PATH: &str = "/sys/class/simtemp/simtemp";

pub const ATTR_SAMPLING_MS: &str = "sampling_ms";
pub const ATTR_THRESHOLD_MC: &str = "threshold_mc";
pub const ATTR_MODE: &str = "mode";

pub const DEFAULT_SAMPLING_MS: u32 = 500;
pub const DEFAULT_THRESHOLD_C: f64 = 25.0;
pub const DEFAULT_MODE: &str = "normal";

// ──────────────────────────────────────────────
// Armazenamento de atributos
// ──────────────────────────────────────────────

/// Acesso texto a atributos nomeados.
pub trait AttributeStore {
    /// Lê o atributo, sem espaços/newline nas pontas.
    fn read_attr(&self, name: &str) -> io::Result<String>;

    /// Escreve o valor verbatim.
    fn write_attr(&self, name: &str, value: &str) -> io::Result<()>;
}

/// Atributos como arquivos em um diretório (layout do sysfs).
#[derive(Debug, Clone)]
pub struct SysfsStore {
    root: PathBuf,
}

impl SysfsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Default for SysfsStore {
    fn default() -> Self {
        Self::new(DEFAULT_SYSFS_PATH)
    }
}

impl AttributeStore for SysfsStore {
    fn read_attr(&self, name: &str) -> io::Result<String> {
        let content = fs::read_to_string(self.root.join(name))?;
        Ok(content.trim().to_string())
    }

    fn write_attr(&self, name: &str, value: &str) -> io::Result<()> {
        // Sem `create`: atributos sysfs não podem ser criados pelo userspace.
        let mut file = OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(self.root.join(name))?;
        file.write_all(value.as_bytes())
    }
}

// ──────────────────────────────────────────────
// ConfigChannel
// ──────────────────────────────────────────────

/// Converte °C em milésimos truncando em direção a zero (não arredonda).
///
/// `None` para NaN/infinito ou fora do `i32` que o driver armazena.
pub fn celsius_to_millidegrees(value: f64) -> Option<i32> {
    let mc = (value * 1000.0).trunc();
    if !mc.is_finite() || mc < f64::from(i32::MIN) || mc > f64::from(i32::MAX) {
        return None;
    }
    Some(mc as i32)
}

/// Getters/setters tipados sobre um [`AttributeStore`].
pub struct ConfigChannel<S = SysfsStore> {
    store: S,
    sink: Arc<dyn DiagnosticSink>,
}

impl<S: AttributeStore> ConfigChannel<S> {
    pub fn new(store: S, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self { store, sink }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Período de amostragem em ms (padrão 500).
    pub fn get_sampling_ms(&self) -> u32 {
        self.read_parsed(ATTR_SAMPLING_MS, |v| v.parse::<u32>().ok())
            .unwrap_or(DEFAULT_SAMPLING_MS)
    }

    pub fn set_sampling_ms(&self, value: u32) -> bool {
        self.write(ATTR_SAMPLING_MS, &value.to_string())
    }

    /// Threshold em °C (padrão 25.0). O atributo guarda milésimos.
    pub fn get_threshold_c(&self) -> f64 {
        self.try_get_threshold_c().unwrap_or(DEFAULT_THRESHOLD_C)
    }

    /// Threshold em °C, ou `None` se o atributo não pôde ser lido.
    pub fn try_get_threshold_c(&self) -> Option<f64> {
        self.read_parsed(ATTR_THRESHOLD_MC, |v| v.parse::<f64>().ok())
            .map(|mc| mc / 1000.0)
    }

    pub fn set_threshold_c(&self, value: f64) -> bool {
        match celsius_to_millidegrees(value) {
            Some(mc) => self.write(ATTR_THRESHOLD_MC, &mc.to_string()),
            None => {
                self.sink.emit(Diagnostic::OutOfRange {
                    attr: ATTR_THRESHOLD_MC.into(),
                    value: value.to_string(),
                });
                false
            }
        }
    }

    /// Modo de simulação (padrão `"normal"`).
    pub fn get_mode(&self) -> String {
        self.read_parsed(ATTR_MODE, |v| Some(v.to_string()))
            .unwrap_or_else(|| DEFAULT_MODE.to_string())
    }

    /// Escreve o modo sem validar contra `normal|noisy|ramp`; quem rejeita é o driver.
    pub fn set_mode(&self, mode: &str) -> bool {
        self.write(ATTR_MODE, mode)
    }

    fn read_parsed<T>(&self, attr: &str, parse: impl FnOnce(&str) -> Option<T>) -> Option<T> {
        let value = match self.store.read_attr(attr) {
            Ok(v) => v,
            Err(e) => {
                self.sink.emit(Diagnostic::AttributeUnavailable {
                    attr: attr.into(),
                    reason: e.to_string(),
                });
                return None;
            }
        };

        if value.is_empty() {
            self.sink.emit(Diagnostic::InvalidAttribute {
                attr: attr.into(),
                value,
            });
            return None;
        }

        match parse(&value) {
            Some(parsed) => {
                debug!("{attr} = {value}");
                Some(parsed)
            }
            None => {
                self.sink.emit(Diagnostic::InvalidAttribute {
                    attr: attr.into(),
                    value,
                });
                None
            }
        }
    }

    fn write(&self, attr: &str, value: &str) -> bool {
        match self.store.write_attr(attr, value) {
            Ok(()) => {
                debug!("{attr} <- {value}");
                true
            }
            Err(e) => {
                self.sink.emit(Diagnostic::WriteFailed {
                    attr: attr.into(),
                    reason: e.to_string(),
                });
                false
            }
        }
    }
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
