//! Thread do sensor que faz o poll contínuo e entrega leituras via channel.

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use simtemp_core::attributes::AttributeStore;
use simtemp_core::{PollEvent, ReadinessClass, SensorReading, SimTempSensor};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Pausa após falha de poll antes de tentar de novo.
const FAILURE_BACKOFF: Duration = Duration::from_secs(2);

/// Inicia a thread de monitoramento. O sensor já deve estar aberto e passa
/// a pertencer à thread; ela termina quando o device some (hangup) ou na
/// primeira leitura entregue depois que o receiver foi descartado.
pub fn spawn_monitor_thread<S>(
    sensor: SimTempSensor<S>,
    poll_timeout_ms: i64,
    capacity: usize,
) -> Receiver<SensorReading>
where
    S: AttributeStore + Send + 'static,
{
    let (tx, rx) = bounded::<SensorReading>(capacity);

    std::thread::Builder::new()
        .name("simtemp-monitor".into())
        .spawn(move || {
            monitor_loop(sensor, &tx, poll_timeout_ms);
        })
        .expect("Falha ao criar thread do sensor");

    rx
}

fn monitor_loop<S: AttributeStore>(
    mut sensor: SimTempSensor<S>,
    tx: &Sender<SensorReading>,
    poll_timeout_ms: i64,
) {
    info!("Monitor iniciado (timeout de poll: {poll_timeout_ms} ms)");

    while sensor.is_open() {
        let reading = match sensor.poll_event(poll_timeout_ms, ReadinessClass::Ordinary) {
            PollEvent::Reading(reading) => reading,
            PollEvent::Empty => continue,
            PollEvent::NotOpen => break,
            // Hangup é persistente: repetir o poll só giraria em falso
            PollEvent::Hangup => {
                warn!("Device sinalizou hangup, encerrando monitor");
                break;
            }
            PollEvent::Failed => {
                error!("Falha no poll. Tentando novamente em {}s...", FAILURE_BACKOFF.as_secs());
                std::thread::sleep(FAILURE_BACKOFF);
                continue;
            }
        };

        match tx.try_send(reading) {
            Ok(()) => {}
            // Consumidor lento: descarta a leitura
            Err(TrySendError::Full(_)) => debug!("Fila cheia, descartando leitura"),
            Err(TrySendError::Disconnected(_)) => break,
        }
    }

    sensor.close_device();
    info!("Monitor encerrado");
}

#[cfg(test)]
mod tests {
    use super::*;
    use simtemp_core::attributes::SysfsStore;
    use simtemp_core::diagnostics::{CollectingSink, Diagnostic};
    use std::ffi::CString;
    use std::fs::OpenOptions;
    use std::os::unix::ffi::OsStrExt;
    use std::os::unix::fs::OpenOptionsExt;
    use std::sync::Arc;

    #[test]
    fn closed_sensor_ends_thread_and_channel() {
        let dir = std::env::temp_dir();
        let sensor = SimTempSensor::with_sink(
            SysfsStore::new(&dir),
            dir.join("simtemp-does-not-exist"),
            Arc::new(CollectingSink::new()),
        );

        let rx = spawn_monitor_thread(sensor, 10, 4);
        assert!(matches!(
            rx.recv_timeout(Duration::from_secs(2)),
            Err(crossbeam_channel::RecvTimeoutError::Disconnected)
        ));
    }

    #[test]
    fn hangup_stops_worker_without_spinning() {
        let dir = tempfile::tempdir().unwrap();
        let dev = dir.path().join("simtemp");
        let c_path = CString::new(dev.as_os_str().as_bytes()).unwrap();
        // SAFETY: `c_path` é uma string C válida terminada em NUL.
        let rc = unsafe { libc::mkfifo(c_path.as_ptr(), 0o600) };
        assert_eq!(rc, 0, "mkfifo falhou: {}", std::io::Error::last_os_error());

        let sink = CollectingSink::new();
        let mut sensor =
            SimTempSensor::with_sink(SysfsStore::new(dir.path()), &dev, Arc::new(sink.clone()));
        sensor.open_device().unwrap();

        // Escritor abre e fecha: o FIFO passa a reportar POLLHUP para sempre
        let writer = OpenOptions::new()
            .write(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(&dev)
            .unwrap();
        drop(writer);

        let rx = spawn_monitor_thread(sensor, -1, 4);
        assert!(matches!(
            rx.recv_timeout(Duration::from_secs(2)),
            Err(crossbeam_channel::RecvTimeoutError::Disconnected)
        ));

        let hangups = sink
            .snapshot()
            .into_iter()
            .filter(|d| *d == Diagnostic::Hangup)
            .count();
        assert_eq!(hangups, 1);
    }
}
