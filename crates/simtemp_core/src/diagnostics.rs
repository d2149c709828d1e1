//! Diagnósticos não fatais da camada do sensor.
//!
//! Falhas de configuração, leituras curtas e problemas de poll nunca sobem
//! como erro para o chamador: viram um [`Diagnostic`] entregue ao sink
//! injetado na construção do [`SimTempSensor`](crate::sensor::SimTempSensor).

use std::sync::{Arc, Mutex};
use tracing::warn;

/// Condição anômala observada sem interromper a operação.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Diagnostic {
    #[error("Leitura curta ({len}/{expected} bytes), amostra descartada")]
    ShortRead { len: usize, expected: usize },

    #[error("Atributo {attr} indisponível: {reason}")]
    AttributeUnavailable { attr: String, reason: String },

    #[error("Atributo {attr} com valor inválido: {value:?}")]
    InvalidAttribute { attr: String, value: String },

    #[error("Valor {value} fora do intervalo aceito por {attr}")]
    OutOfRange { attr: String, value: String },

    #[error("Falha ao escrever atributo {attr}: {reason}")]
    WriteFailed { attr: String, reason: String },

    #[error("Falha de leitura no device: {reason}")]
    ReadFailed { reason: String },

    #[error("Falha no poll do device: {reason}")]
    PollFailed { reason: String },

    #[error("Device sinalizou hangup/erro sem dados")]
    Hangup,
}

/// Destino dos diagnósticos.
pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, diagnostic: Diagnostic);
}

/// Sink padrão: encaminha para `tracing` no nível `warn`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&self, diagnostic: Diagnostic) {
        warn!("{diagnostic}");
    }
}

/// Sink que acumula diagnósticos em memória (útil em testes e em frontends
/// que exibem os avisos depois).
#[derive(Debug, Clone, Default)]
pub struct CollectingSink {
    entries: Arc<Mutex<Vec<Diagnostic>>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cópia dos diagnósticos recebidos até agora.
    pub fn snapshot(&self) -> Vec<Diagnostic> {
        self.entries
            .lock()
            .map(|e| e.clone())
            .unwrap_or_default()
    }

    /// Remove e retorna os diagnósticos acumulados.
    pub fn drain(&self) -> Vec<Diagnostic> {
        self.entries
            .lock()
            .map(|mut e| std::mem::take(&mut *e))
            .unwrap_or_default()
    }
}

impl DiagnosticSink for CollectingSink {
    fn emit(&self, diagnostic: Diagnostic) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(diagnostic);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collecting_sink_shares_storage_between_clones() {
        let sink = CollectingSink::new();
        let handle: Arc<dyn DiagnosticSink> = Arc::new(sink.clone());

        handle.emit(Diagnostic::Hangup);
        handle.emit(Diagnostic::ShortRead { len: 3, expected: 16 });

        assert_eq!(sink.snapshot().len(), 2);
        assert_eq!(sink.drain()[1], Diagnostic::ShortRead { len: 3, expected: 16 });
        assert!(sink.snapshot().is_empty());
    }

    #[test]
    fn short_read_message_mentions_length() {
        let msg = Diagnostic::ShortRead { len: 10, expected: 16 }.to_string();
        assert!(msg.contains("10/16"), "{msg}");
    }
}
