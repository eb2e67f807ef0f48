mod config;

use std::sync::atomic::Ordering;
use std::time::Instant;

use clap::Parser;
use config::{Cli, ProviderConfig};
use mdp_core::{Provider, ThreadConfig};
use tracing::{error, info};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let config = match ProviderConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            std::process::exit(-1);
        }
    };

    if let Err(e) = run(config) {
        error!(error = %e, "provider run failed");
        std::process::exit(-1);
    }
}

fn run(config: ProviderConfig) -> Result<(), mdp_core::CoreError> {
    std::fs::create_dir_all(&config.stats_dir).map_err(|e| mdp_core::CoreError::Resource(e.to_string()))?;

    info!(
        application = %config.application_name,
        application_id = %config.application_id,
        addr = %config.bind_addr,
        threads = config.thread_count,
        "starting provider"
    );

    let thread_config = ThreadConfig {
        ticks_per_sec: config.tick_rate,
        updates_per_sec: config.update_rate,
        latency_updates_per_sec: config.latency_update_rate,
        gen_msgs_per_sec: config.generic_msg_rate,
        latency_gen_msgs_per_sec: config.generic_msg_latency_rate,
        refresh_burst_size: config.refresh_burst_size,
        open_limit: config.open_limit,
        service_id: config.service_id,
        max_output_buffers: config.output_bufs,
        ping_timeout: std::time::Duration::from_secs(6),
        packing_buffer_length: config.pack_buf_size,
        max_per_pack: config.max_pack_count,
        pre_encode: config.pre_enc,
        measure_encode: config.measure_encode,
        nano_time: config.nano_time,
        download_dictionaries: config.download_dictionaries,
        kind: config.kind,
        ni_item_count: config.item_count,
        ni_common_item_count: config.common_item_count,
        ni_thread_count: config.thread_count,
    };

    let mut provider = Provider::spawn(
        config.bind_addr,
        config.thread_count,
        config.cpu_ids.clone(),
        thread_config,
        config.kind,
        config.write_stats_interval,
        &config.stats_dir,
    )?;

    let shutdown = provider.shutdown_flag();
    ctrlc::set_handler(move || {
        shutdown.store(true, Ordering::Relaxed);
    })
    .expect("failed to install SIGINT handler");

    let deadline = Instant::now() + config.run_time;
    let shutdown = provider.shutdown_flag();
    while !shutdown.load(Ordering::Relaxed) && Instant::now() < deadline {
        std::thread::sleep(config.write_stats_interval);
        if let Err(e) = provider.collect_once() {
            error!(error = %e, "failed to write stats row");
        }
    }
    provider.request_shutdown();
    provider.join();
    provider.print_summary();
    Ok(())
}
