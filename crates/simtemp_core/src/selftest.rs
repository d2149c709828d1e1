//! Self-test de alerta: verifica se o driver sinaliza THRS ao baixar o
//! threshold abaixo da temperatura atual.

use crate::attributes::AttributeStore;
use crate::config::SelfTestConfig;
use crate::device::ReadinessClass;
use crate::sensor::SimTempSensor;
use crate::types::SensorReading;
use tracing::{info, warn};

/// Resultado do self-test.
#[derive(Debug, Clone, PartialEq)]
pub enum SelfTestOutcome {
    /// Leitura com THRS recebida dentro do prazo.
    Passed(SensorReading),
    /// Leitura recebida, mas sem flag de alerta.
    NoAlert(SensorReading),
    /// Nenhuma leitura dentro do prazo.
    TimedOut,
}

impl SelfTestOutcome {
    pub fn passed(&self) -> bool {
        matches!(self, SelfTestOutcome::Passed(_))
    }
}

/// Relatório completo do self-test.
#[derive(Debug, Clone, PartialEq)]
pub struct SelfTestReport {
    /// Registros que já estavam no buffer antes do teste
    pub drained: Vec<SensorReading>,
    pub timeout_ms: i64,
    pub threshold_c: f64,
    /// `None` quando o threshold anterior não pôde ser lido
    pub previous_threshold_c: Option<f64>,
    pub outcome: SelfTestOutcome,
}

/// Executa o self-test com o device já aberto. Não abre nem fecha o device.
///
/// O threshold anterior é restaurado ao final. Se ele não pôde ser lido,
/// nada é escrito: o valor de teste permanece e o aviso fica no log.
pub fn run_self_test<S: AttributeStore>(
    sensor: &mut SimTempSensor<S>,
    cfg: &SelfTestConfig,
) -> SelfTestReport {
    let mut drained = Vec::new();
    while let Some(reading) = sensor.read_sample() {
        drained.push(reading);
    }
    info!("{} leituras drenadas antes do teste", drained.len());

    let timeout_ms = i64::from(cfg.timeout_periods) * i64::from(sensor.get_sampling_ms());
    let previous_threshold_c = sensor.try_get_threshold_c();

    info!(
        "Self-test: threshold {:.1}°C, modo {}, timeout {} ms",
        cfg.threshold_c, cfg.mode, timeout_ms
    );
    if !sensor.set_threshold_c(cfg.threshold_c) {
        warn!("Não foi possível aplicar o threshold de teste");
    }
    if !sensor.set_mode(&cfg.mode) {
        warn!("Não foi possível aplicar o modo de teste");
    }

    let outcome = match sensor.poll_reading(timeout_ms, ReadinessClass::Priority) {
        Some(reading) if reading.is_alert => SelfTestOutcome::Passed(reading),
        Some(reading) => SelfTestOutcome::NoAlert(reading),
        None => SelfTestOutcome::TimedOut,
    };

    match previous_threshold_c {
        Some(previous) => {
            if !sensor.set_threshold_c(previous) {
                warn!("Não foi possível restaurar o threshold {previous:.1}°C");
            }
        }
        None => warn!(
            "Threshold anterior desconhecido, mantendo {:.1}°C",
            cfg.threshold_c
        ),
    }

    SelfTestReport {
        drained,
        timeout_ms,
        threshold_c: cfg.threshold_c,
        previous_threshold_c,
        outcome,
    }
}
