//! Definição de tipos do sensor simtemp.
//!
//! `RawSample` espelha byte a byte o registro de 16 bytes emitido pelo
//! dispositivo; `SensorReading` é o valor já normalizado entregue ao chamador.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ──────────────────────────────────────────────
// Flags do registro
// ──────────────────────────────────────────────

/// Amostra nova disponível (bit 0).
pub const EVT_NEW: u32 = 0x0001;

/// Threshold cruzado / alerta (bit 1).
pub const EVT_THRS: u32 = 0x0002;

// ──────────────────────────────────────────────
// Registro bruto
// ──────────────────────────────────────────────

/// Registro binário lido do device (little-endian, 16 bytes, sem padding).
///
/// A ordem dos campos importa: o bincode serializa na ordem de declaração
/// com inteiros de largura fixa, o que reproduz exatamente o layout do driver.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawSample {
    /// Nanossegundos desde a época Unix
    pub timestamp_ns: u64,
    /// Temperatura em milésimos de grau Celsius
    pub temp_mc: i32,
    /// Bitmask de eventos (`EVT_NEW`, `EVT_THRS`)
    pub flags: u32,
}

impl RawSample {
    pub fn is_new(&self) -> bool {
        self.flags & EVT_NEW != 0
    }

    pub fn is_alert(&self) -> bool {
        self.flags & EVT_THRS != 0
    }

    /// Temperatura em °C.
    pub fn temp_c(&self) -> f64 {
        f64::from(self.temp_mc) / 1000.0
    }
}

// ──────────────────────────────────────────────
// Leitura normalizada
// ──────────────────────────────────────────────

/// Leitura de temperatura entregue ao consumidor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SensorReading {
    /// Instante UTC, `YYYY-MM-DDTHH:MM:SS.mmmZ`
    pub timestamp: String,
    /// Temperatura (°C)
    pub temp_c: f64,
    /// Flag THRS presente no registro
    pub is_alert: bool,
}

impl fmt::Display for SensorReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} temp={:.1}C alert={}",
            self.timestamp,
            self.temp_c,
            u8::from(self.is_alert)
        )
    }
}

// ──────────────────────────────────────────────
// Modo de simulação
// ──────────────────────────────────────────────

/// Modos aceitos pelo atributo `mode` do driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorMode {
    Normal,
    Noisy,
    Ramp,
}

impl SensorMode {
    pub const ALL: [SensorMode; 3] = [SensorMode::Normal, SensorMode::Noisy, SensorMode::Ramp];

    pub fn as_str(&self) -> &'static str {
        match self {
            SensorMode::Normal => "normal",
            SensorMode::Noisy => "noisy",
            SensorMode::Ramp => "ramp",
        }
    }
}

impl fmt::Display for SensorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Modo desconhecido.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Modo inválido: {0:?} (esperado normal, noisy ou ramp)")]
pub struct InvalidMode(pub String);

impl FromStr for SensorMode {
    type Err = InvalidMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SensorMode::ALL
            .into_iter()
            .find(|m| m.as_str() == s.trim())
            .ok_or_else(|| InvalidMode(s.to_string()))
    }
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
