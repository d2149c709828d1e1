//! # simtemp core
//!
//! Interface userspace do sensor de temperatura simulado `simtemp`:
//! decodificação do registro binário do `/dev/simtemp`, configuração via
//! atributos sysfs e loop de poll com distinção entre dados comuns e alerta.
//!
//! ## Módulos
//! - [`types`] – `RawSample`, `SensorReading`, flags e modos
//! - [`timestamp`] – Nanossegundos → texto UTC com milissegundos
//! - [`protocol`] – Decode do registro de 16 bytes
//! - [`diagnostics`] – Sink injetável para avisos não fatais
//! - [`attributes`] – Atributos sysfs (`sampling_ms`, `threshold_mc`, `mode`)
//! - [`device`] – Abertura, `poll(2)` e leitura do character device
//! - [`sensor`] – Fachada usada pela CLI
//! - [`selftest`] – Verificação do alerta THRS
//! - [`config`] – Configuração TOML da aplicação

pub mod types;
pub mod timestamp;
pub mod protocol;
pub mod diagnostics;
pub mod attributes;
pub mod device;
pub mod sensor;
pub mod selftest;
pub mod config;

// Re-exports convenientes
pub use types::{SensorMode, SensorReading};
pub use protocol::{SAMPLE_SIZE, decode_sample};
pub use device::{DeviceError, ReadinessClass};
pub use sensor::{PollEvent, SimTempSensor};
pub use config::AppConfig;
