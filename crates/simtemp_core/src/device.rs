//! Ciclo de vida do `/dev/simtemp` e espera por prontidão via `poll(2)`.
//!
//! O driver sinaliza duas classes de prontidão independentes:
//! - `POLLIN`  – há amostra nova no ring buffer ([`ReadinessClass::Ordinary`])
//! - `POLLPRI` – o threshold foi cruzado ([`ReadinessClass::Priority`])
//!
//! Um [`DeviceChannel`] possui o descritor com exclusividade e não é `Clone`;
//! todas as operações que usam o descritor pedem `&mut self`, então só um
//! chamador por vez pode esperar ou ler. Uma espera indefinida termina apenas
//! quando o device fica pronto ou quando um sinal interrompe a thread
//! (`EINTR` → [`ReadinessOutcome::Interrupted`]).

use crate::protocol::SAMPLE_SIZE;
use std::fs::{File, OpenOptions};
use std::io::{self, Read};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Caminho padrão do character device.
pub const DEFAULT_DEV_PATH: &str = "/dev/simtemp";

/// Erros ao abrir o device.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("Device {0} não encontrado. O módulo do kernel está carregado?")]
    DeviceUnavailable(PathBuf),

    #[error("Sem permissão para abrir {0}. Execute com sudo.")]
    PermissionDenied(PathBuf),

    #[error("Falha ao abrir {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Erros de leitura.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("Device não está aberto")]
    NotOpen,

    #[error("Erro de leitura: {0}")]
    Io(#[from] io::Error),
}

// ──────────────────────────────────────────────
// Classes de prontidão
// ──────────────────────────────────────────────

/// Classe de prontidão aguardada.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessClass {
    /// Dados comuns (`POLLIN`)
    Ordinary,
    /// Alerta/urgente (`POLLPRI`)
    Priority,
}

impl ReadinessClass {
    pub fn poll_events(self) -> libc::c_short {
        match self {
            ReadinessClass::Ordinary => libc::POLLIN,
            ReadinessClass::Priority => libc::POLLPRI,
        }
    }

    /// `revents` contém o bit desta classe.
    pub fn is_signalled(self, revents: libc::c_short) -> bool {
        revents & self.poll_events() != 0
    }
}

/// Resultado de [`DeviceChannel::wait_ready`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadinessOutcome {
    Ready,
    TimedOut,
    NotOpen,
    /// Sinal recebido durante a espera.
    Interrupted,
    /// `POLLHUP`/`POLLERR`/`POLLNVAL` sem a classe pedida.
    Hangup,
    Failed(String),
}

const HANGUP_EVENTS: libc::c_short = libc::POLLHUP | libc::POLLERR | libc::POLLNVAL;

/// Converte o timeout em ms para o `c_int` do `poll(2)`; negativo = infinito.
fn poll_timeout(timeout_ms: i64) -> libc::c_int {
    if timeout_ms < 0 {
        -1
    } else {
        timeout_ms.min(i64::from(libc::c_int::MAX)) as libc::c_int
    }
}

/// Classifica um retorno positivo do `poll(2)`.
fn classify(class: ReadinessClass, revents: libc::c_short) -> ReadinessOutcome {
    if class.is_signalled(revents) {
        ReadinessOutcome::Ready
    } else if revents & HANGUP_EVENTS != 0 {
        ReadinessOutcome::Hangup
    } else {
        ReadinessOutcome::TimedOut
    }
}

// ──────────────────────────────────────────────
// DeviceChannel
// ──────────────────────────────────────────────

/// Canal exclusivo com o character device.
#[derive(Debug)]
pub struct DeviceChannel {
    path: PathBuf,
    file: Option<File>,
}

impl DeviceChannel {
    /// Cria o canal fechado.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// Abre o device read-only e não bloqueante. Chamar com o canal já
    /// aberto não faz nada.
    pub fn open(&mut self) -> Result<(), DeviceError> {
        if self.file.is_some() {
            debug!("{} já está aberto", self.path.display());
            return Ok(());
        }

        let file = OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(&self.path)
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => DeviceError::DeviceUnavailable(self.path.clone()),
                io::ErrorKind::PermissionDenied => DeviceError::PermissionDenied(self.path.clone()),
                _ => DeviceError::Io {
                    path: self.path.clone(),
                    source: e,
                },
            })?;

        info!("Device {} aberto", self.path.display());
        self.file = Some(file);
        Ok(())
    }

    /// Fecha o descritor. Idempotente.
    pub fn close(&mut self) {
        if self.file.take().is_some() {
            info!("Device {} fechado", self.path.display());
        }
    }

    /// Bloqueia até a classe pedida ficar pronta ou o timeout expirar.
    ///
    /// `timeout_ms = -1` espera indefinidamente; `0` apenas consulta.
    pub fn wait_ready(&mut self, timeout_ms: i64, class: ReadinessClass) -> ReadinessOutcome {
        let Some(file) = self.file.as_ref() else {
            return ReadinessOutcome::NotOpen;
        };

        let mut pfd = libc::pollfd {
            fd: file.as_raw_fd(),
            events: class.poll_events(),
            revents: 0,
        };

        // SAFETY: `pfd` é um único pollfd válido durante toda a chamada e o
        // descritor pertence a `file`, que está vivo.
        let rc = unsafe { libc::poll(&mut pfd, 1, poll_timeout(timeout_ms)) };

        match rc {
            0 => ReadinessOutcome::TimedOut,
            n if n > 0 => classify(class, pfd.revents),
            _ => {
                let err = io::Error::last_os_error();
                if err.kind() == io::ErrorKind::Interrupted {
                    ReadinessOutcome::Interrupted
                } else {
                    ReadinessOutcome::Failed(err.to_string())
                }
            }
        }
    }

    /// Uma única leitura de até [`SAMPLE_SIZE`] bytes, sem retry.
    ///
    /// `EAGAIN`/`EINTR` retornam um buffer vazio.
    pub fn read_once(&mut self) -> Result<Vec<u8>, ReadError> {
        let file = self.file.as_mut().ok_or(ReadError::NotOpen)?;

        let mut buf = [0u8; SAMPLE_SIZE];
        match file.read(&mut buf) {
            Ok(n) => Ok(buf[..n].to_vec()),
            Err(e)
                if e.kind() == io::ErrorKind::WouldBlock
                    || e.kind() == io::ErrorKind::Interrupted =>
            {
                Ok(Vec::new())
            }
            Err(e) => Err(ReadError::Io(e)),
        }
    }
}

impl Drop for DeviceChannel {
    fn drop(&mut self) {
        self.close();
    }
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::ffi::CString;
    use std::io::Write;
    use std::os::unix::ffi::OsStrExt;
    use std::time::{Duration, Instant};
    use tempfile::TempDir;

    /// Cria um FIFO que faz o papel do character device.
    pub(crate) fn make_fifo(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("simtemp");
        let c_path = CString::new(path.as_os_str().as_bytes()).unwrap();
        // SAFETY: `c_path` é uma string C válida terminada em NUL.
        let rc = unsafe { libc::mkfifo(c_path.as_ptr(), 0o600) };
        assert_eq!(rc, 0, "mkfifo falhou: {}", io::Error::last_os_error());
        path
    }

    /// Abre o lado de escrita (precisa do leitor já aberto).
    pub(crate) fn open_writer(path: &Path) -> File {
        OpenOptions::new()
            .write(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(path)
            .unwrap()
    }

    fn open_channel() -> (TempDir, DeviceChannel) {
        let dir = tempfile::tempdir().unwrap();
        let path = make_fifo(&dir);
        let mut channel = DeviceChannel::new(path);
        channel.open().unwrap();
        (dir, channel)
    }

    #[test]
    fn missing_device_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let mut channel = DeviceChannel::new(dir.path().join("nope"));
        assert!(matches!(
            channel.open(),
            Err(DeviceError::DeviceUnavailable(_))
        ));
        assert!(!channel.is_open());
    }

    #[test]
    fn zero_timeout_wait_does_not_block() {
        let (_dir, mut channel) = open_channel();
        let _writer = open_writer(channel.path());

        let start = Instant::now();
        assert_eq!(channel.wait_ready(0, ReadinessClass::Ordinary), ReadinessOutcome::TimedOut);
        assert!(start.elapsed() < Duration::from_millis(500));
    }

    #[test]
    fn bounded_wait_times_out() {
        let (_dir, mut channel) = open_channel();
        let _writer = open_writer(channel.path());

        let start = Instant::now();
        assert_eq!(channel.wait_ready(50, ReadinessClass::Ordinary), ReadinessOutcome::TimedOut);
        assert!(start.elapsed() >= Duration::from_millis(40));
    }

    #[test]
    fn ordinary_data_does_not_satisfy_priority() {
        let (_dir, mut channel) = open_channel();
        let mut writer = open_writer(channel.path());
        writer.write_all(&[0u8; SAMPLE_SIZE]).unwrap();

        assert_eq!(channel.wait_ready(0, ReadinessClass::Priority), ReadinessOutcome::TimedOut);
        assert_eq!(channel.wait_ready(0, ReadinessClass::Ordinary), ReadinessOutcome::Ready);
    }

    #[test]
    fn priority_only_revents_do_not_satisfy_ordinary() {
        assert_eq!(classify(ReadinessClass::Ordinary, libc::POLLPRI), ReadinessOutcome::TimedOut);
        assert_eq!(classify(ReadinessClass::Priority, libc::POLLPRI), ReadinessOutcome::Ready);
        assert_eq!(classify(ReadinessClass::Priority, libc::POLLIN), ReadinessOutcome::TimedOut);
        assert_eq!(classify(ReadinessClass::Ordinary, libc::POLLHUP), ReadinessOutcome::Hangup);
        assert_eq!(
            classify(ReadinessClass::Ordinary, libc::POLLIN | libc::POLLHUP),
            ReadinessOutcome::Ready
        );
    }

    #[test]
    fn timeout_conversion() {
        assert_eq!(poll_timeout(-1), -1);
        assert_eq!(poll_timeout(-20), -1);
        assert_eq!(poll_timeout(0), 0);
        assert_eq!(poll_timeout(1_000), 1_000);
        assert_eq!(poll_timeout(i64::MAX), libc::c_int::MAX);
    }

    #[test]
    fn read_once_is_bounded_and_never_retries() {
        let (_dir, mut channel) = open_channel();
        let mut writer = open_writer(channel.path());

        assert!(channel.read_once().unwrap().is_empty());

        writer.write_all(&[7u8; 20]).unwrap();
        assert_eq!(channel.read_once().unwrap().len(), SAMPLE_SIZE);
        assert_eq!(channel.read_once().unwrap(), vec![7u8; 4]);
        assert!(channel.read_once().unwrap().is_empty());
    }

    #[test]
    fn close_is_idempotent_and_disables_operations() {
        let (_dir, mut channel) = open_channel();

        channel.close();
        channel.close();
        assert!(!channel.is_open());
        assert_eq!(channel.wait_ready(-1, ReadinessClass::Ordinary), ReadinessOutcome::NotOpen);
        assert!(matches!(channel.read_once(), Err(ReadError::NotOpen)));
    }

    #[test]
    fn reopen_after_close() {
        let (_dir, mut channel) = open_channel();
        channel.close();
        channel.open().unwrap();
        channel.open().unwrap();
        assert!(channel.is_open());
    }
}
