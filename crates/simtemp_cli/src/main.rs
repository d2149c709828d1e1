//! # simtemp CLI
//!
//! Configura o sensor simtemp via sysfs, monitora leituras do `/dev/simtemp`
//! e executa o self-test de alerta.
//!
//! ## Uso
//! ```bash
//! simtemp                                  # Monitor contínuo
//! simtemp --sampling-ms 200 --mode ramp    # Só configura
//! simtemp --threshold 30.5 --monitor       # Configura e monitora
//! simtemp --test                           # Self-test do alerta THRS
//! simtemp --config /etc/simtemp.toml       # Config alternativa
//! ```

mod args;
mod monitor;

use args::CliArgs;
use monitor::spawn_monitor_thread;
use simtemp_core::config::AppConfig;
use simtemp_core::selftest::{SelfTestOutcome, run_self_test};
use simtemp_core::SimTempSensor;
use std::process::ExitCode;
use tracing::{error, info, warn};

fn main() -> ExitCode {
    // ── Logging ──
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // ── Argumentos ──
    let args = match CliArgs::parse(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{e}");
            eprintln!("{}", args::USAGE);
            return ExitCode::from(2);
        }
    };
    if args.help {
        println!("{}", args::USAGE);
        return ExitCode::SUCCESS;
    }

    // ── Carregar config ──
    let config_path = args.config.clone().unwrap_or_else(AppConfig::default_path);
    let config = AppConfig::load(&config_path);

    // Salva config padrão se não existir
    if !config_path.exists() {
        if let Err(e) = config.save(&config_path) {
            warn!("Não foi possível salvar config padrão: {e}");
        }
    }

    for problem in config.validate() {
        warn!("Config: {problem}");
    }

    let mut sensor = SimTempSensor::from_config(&config.device);

    // ── Configuração do sensor ──
    if let Some(ms) = args.sampling_ms {
        if sensor.set_sampling_ms(ms) {
            info!("sampling_ms = {ms}");
        } else {
            error!("Falha ao aplicar sampling_ms = {ms}");
        }
    }
    if let Some(threshold) = args.threshold {
        if sensor.set_threshold_c(threshold) {
            info!("threshold = {threshold:.3}°C");
        } else {
            error!("Falha ao aplicar threshold = {threshold}");
        }
    }
    if let Some(mode) = args.mode {
        if sensor.set_mode(mode.as_str()) {
            info!("mode = {mode}");
        } else {
            error!("Falha ao aplicar mode = {mode}");
        }
    }

    if args.test {
        return self_test(sensor, &config);
    }

    if args.monitor || !args.has_settings() {
        return monitor(sensor, &config);
    }

    ExitCode::SUCCESS
}

fn open_or_report(sensor: &mut SimTempSensor) -> bool {
    match sensor.open_device() {
        Ok(()) => true,
        Err(e) => {
            error!("{e}");
            false
        }
    }
}

fn monitor(mut sensor: SimTempSensor, config: &AppConfig) -> ExitCode {
    if !open_or_report(&mut sensor) {
        return ExitCode::FAILURE;
    }

    println!();
    println!("══════════════════════════════════════════════");
    println!("   🌡  SIMTEMP MONITOR");
    println!("══════════════════════════════════════════════");
    println!("  Device:    {}", config.device.dev_path.display());
    println!("  Sampling:  {} ms", sensor.get_sampling_ms());
    println!("  Threshold: {:.1} °C", sensor.get_threshold_c());
    println!("  Modo:      {}", sensor.get_mode());
    println!("══════════════════════════════════════════════");
    println!();

    let rx = spawn_monitor_thread(
        sensor,
        config.monitor.poll_timeout_ms,
        config.monitor.queue_capacity.max(1),
    );

    for reading in rx {
        println!("{reading}");
    }

    info!("Monitor finalizado");
    ExitCode::SUCCESS
}

fn self_test(mut sensor: SimTempSensor, config: &AppConfig) -> ExitCode {
    if !open_or_report(&mut sensor) {
        return ExitCode::FAILURE;
    }

    let report = run_self_test(&mut sensor, &config.self_test);
    sensor.close_device();

    for reading in &report.drained {
        println!("{reading}");
    }

    println!();
    println!("--- Self-test ---");
    println!("--- Timeout:   {} ms ---", report.timeout_ms);
    println!("--- Threshold: {} °C ---", report.threshold_c);
    println!("--- Modo:      {} ---", config.self_test.mode);

    match report.outcome {
        SelfTestOutcome::Passed(reading) => {
            println!("{reading}\n");
            println!("✓ Test PASSED");
            ExitCode::SUCCESS
        }
        SelfTestOutcome::NoAlert(reading) => {
            println!("{reading}\n");
            println!("✗ Test FAILED (leitura sem alerta)");
            ExitCode::FAILURE
        }
        SelfTestOutcome::TimedOut => {
            println!("✗ Test FAILED (sem alerta em {} ms)", report.timeout_ms);
            ExitCode::FAILURE
        }
    }
}
