//! Fachada usada pela CLI e por outros consumidores.
//!
//! Junta [`ConfigChannel`], [`DeviceChannel`] e o decoder. Todas as chamadas
//! são síncronas; só [`SimTempSensor::poll_reading`] pode bloquear, e no
//! máximo pelo timeout pedido. Um consumidor que não pode bloquear sua thread
//! principal deve mover o sensor para uma thread dedicada.

use crate::attributes::{AttributeStore, ConfigChannel, SysfsStore};
use crate::config::DeviceConfig;
use crate::device::{DeviceChannel, DeviceError, ReadError, ReadinessClass, ReadinessOutcome};
use crate::diagnostics::{Diagnostic, DiagnosticSink, TracingSink};
use crate::protocol::{DecodeError, SAMPLE_SIZE, decode_sample};
use crate::types::SensorReading;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Resultado detalhado de [`SimTempSensor::poll_event`].
#[derive(Debug, Clone, PartialEq)]
pub enum PollEvent {
    Reading(SensorReading),
    /// Timeout, sinal, leitura vazia ou registro descartado. Tentar de novo.
    Empty,
    NotOpen,
    /// O device sinalizou hangup/erro; novos polls retornam na hora.
    Hangup,
    /// O `poll(2)` falhou.
    Failed,
}

impl PollEvent {
    pub fn into_reading(self) -> Option<SensorReading> {
        match self {
            PollEvent::Reading(reading) => Some(reading),
            _ => None,
        }
    }
}

/// Interface com o sensor simtemp.
pub struct SimTempSensor<S = SysfsStore> {
    config: ConfigChannel<S>,
    device: DeviceChannel,
    sink: Arc<dyn DiagnosticSink>,
}

impl SimTempSensor<SysfsStore> {
    /// Sensor nos caminhos da configuração, com diagnósticos via `tracing`.
    pub fn from_config(cfg: &DeviceConfig) -> Self {
        Self::with_sink(
            SysfsStore::new(&cfg.sysfs_path),
            &cfg.dev_path,
            Arc::new(TracingSink),
        )
    }
}

impl<S: AttributeStore> SimTempSensor<S> {
    pub fn with_sink(
        store: S,
        dev_path: impl Into<PathBuf>,
        sink: Arc<dyn DiagnosticSink>,
    ) -> Self {
        Self {
            config: ConfigChannel::new(store, Arc::clone(&sink)),
            device: DeviceChannel::new(dev_path),
            sink,
        }
    }

    // ── Configuração ──

    pub fn config(&self) -> &ConfigChannel<S> {
        &self.config
    }

    pub fn get_sampling_ms(&self) -> u32 {
        self.config.get_sampling_ms()
    }

    pub fn set_sampling_ms(&self, value: u32) -> bool {
        self.config.set_sampling_ms(value)
    }

    pub fn get_threshold_c(&self) -> f64 {
        self.config.get_threshold_c()
    }

    pub fn try_get_threshold_c(&self) -> Option<f64> {
        self.config.try_get_threshold_c()
    }

    pub fn set_threshold_c(&self, value: f64) -> bool {
        self.config.set_threshold_c(value)
    }

    pub fn get_mode(&self) -> String {
        self.config.get_mode()
    }

    pub fn set_mode(&self, mode: &str) -> bool {
        self.config.set_mode(mode)
    }

    // ── Device ──

    pub fn open_device(&mut self) -> Result<(), DeviceError> {
        self.device.open()
    }

    pub fn close_device(&mut self) {
        self.device.close();
    }

    pub fn is_open(&self) -> bool {
        self.device.is_open()
    }

    /// Espera pela classe pedida e decodifica no máximo um registro.
    ///
    /// `None` em timeout, canal fechado, sinal, hangup ou registro inválido.
    pub fn poll_reading(
        &mut self,
        timeout_ms: i64,
        class: ReadinessClass,
    ) -> Option<SensorReading> {
        self.poll_event(timeout_ms, class).into_reading()
    }

    /// Como [`poll_reading`](Self::poll_reading), mas distingue "nada desta
    /// vez" de falhas persistentes do device, para que loops contínuos possam
    /// parar ou esperar antes de tentar de novo.
    pub fn poll_event(&mut self, timeout_ms: i64, class: ReadinessClass) -> PollEvent {
        match self.device.wait_ready(timeout_ms, class) {
            ReadinessOutcome::Ready => match self.read_sample() {
                Some(reading) => PollEvent::Reading(reading),
                None => PollEvent::Empty,
            },
            ReadinessOutcome::TimedOut => PollEvent::Empty,
            ReadinessOutcome::NotOpen => PollEvent::NotOpen,
            ReadinessOutcome::Interrupted => {
                debug!("poll interrompido por sinal");
                PollEvent::Empty
            }
            ReadinessOutcome::Hangup => {
                self.sink.emit(Diagnostic::Hangup);
                PollEvent::Hangup
            }
            ReadinessOutcome::Failed(reason) => {
                self.sink.emit(Diagnostic::PollFailed { reason });
                PollEvent::Failed
            }
        }
    }

    /// Lê e decodifica um registro sem esperar prontidão. Usado para drenar
    /// o que o driver já tem em buffer.
    pub fn read_sample(&mut self) -> Option<SensorReading> {
        let data = match self.device.read_once() {
            Ok(data) => data,
            Err(ReadError::NotOpen) => return None,
            Err(ReadError::Io(e)) => {
                self.sink.emit(Diagnostic::ReadFailed {
                    reason: e.to_string(),
                });
                return None;
            }
        };

        match decode_sample(&data) {
            Ok(reading) => Some(reading),
            Err(DecodeError::NoData) => None,
            Err(DecodeError::ShortRead(len)) => {
                self.sink.emit(Diagnostic::ShortRead {
                    len,
                    expected: SAMPLE_SIZE,
                });
                None
            }
            Err(DecodeError::Deserialize(reason)) => {
                self.sink.emit(Diagnostic::ReadFailed { reason });
                None
            }
        }
    }
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
