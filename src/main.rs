//! Seed Generator Server
//!
//! Runs a generator against the local oracle network and drives a few
//! request / fulfill / reveal cycles, logging every seed.

use std::time::Duration;

use anyhow::{bail, Context};
use tokio::sync::{broadcast, mpsc};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use seedgen::{
    DeterministicRng, GeneratorConfig, LocalOracle, RandomSeedGenerator, SeedEvent, SeedService,
    VrfKeypair, VERSION,
};

/// Cycles driven by the demo unless `SEEDGEN_DEMO_CYCLES` says otherwise.
const DEFAULT_DEMO_CYCLES: u64 = 3;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let default_level = if cfg!(feature = "debug-tracing") { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Seedgen Server v{}", VERSION);

    let config = match std::env::var("SEEDGEN_CONFIG") {
        Ok(path) => GeneratorConfig::from_json_file(&path).with_context(|| format!("loading {path}"))?,
        Err(_) => GeneratorConfig::from_env().context("reading SEEDGEN_* environment")?,
    };
    info!("Max depth: {}, oracle window: {}s", config.max_depth, config.max_pending_secs);

    let operator = match std::env::var("SEEDGEN_OPERATOR_SECRET") {
        Ok(hex_secret) => {
            let mut secret = [0u8; 32];
            hex::decode_to_slice(hex_secret.trim_start_matches("0x"), &mut secret)
                .context("SEEDGEN_OPERATOR_SECRET must be 32 bytes of hex")?;
            VrfKeypair::from_seed(secret)?
        }
        Err(_) => {
            warn!("No SEEDGEN_OPERATOR_SECRET set, using an ephemeral proving key");
            VrfKeypair::generate()
        }
    };
    info!("Key hash: {}", operator.key_hash());

    let cycles = match std::env::var("SEEDGEN_DEMO_CYCLES") {
        Ok(v) => v.parse().context("SEEDGEN_DEMO_CYCLES")?,
        Err(_) => DEFAULT_DEMO_CYCLES,
    };

    run_demo(config, operator, cycles).await
}

/// Drive `cycles` full generation cycles through the async service.
async fn run_demo(config: GeneratorConfig, operator: VrfKeypair, cycles: u64) -> anyhow::Result<()> {
    let (client, mut oracle) = LocalOracle::channel(config.oracle, config.oracle_seed);
    oracle.add_requester(config.consumer, config.max_pending_secs);

    let generator = RandomSeedGenerator::new(config.params(operator.key_hash()), client)?;
    let service = SeedService::new(generator);
    let mut events = service.subscribe();

    let (shutdown_tx, _) = broadcast::channel(1);
    let (callback_tx, callback_rx) = mpsc::channel(64);

    let oracle_task = tokio::spawn(oracle.run(
        callback_tx,
        config.delivery_interval(),
        shutdown_tx.subscribe(),
    ));
    let pump = service.clone();
    let pump_shutdown = shutdown_tx.subscribe();
    let pump_task = tokio::spawn(async move { pump.pump_callbacks(callback_rx, pump_shutdown).await });

    info!("=== Generating {} seeds ===", cycles);

    for _ in 0..cycles {
        let request_id = service.next(config.owner).await?;
        info!("Request {} submitted", request_id);

        let (sequence, input_seed) = wait_for_input(&mut events, config.max_pending_secs).await?;
        info!("Sequence {}: input seed {}", sequence, input_seed);

        let proof = operator.prove(&input_seed);
        let encoded = proof.to_bytes()?;
        let preview = service.verify_and_compute_seed(sequence, &proof).await?;
        let secret_seed = service.reveal_encoded(&encoded).await?;

        if preview != secret_seed {
            bail!("verify_and_compute_seed disagrees with reveal for sequence {sequence}");
        }
        info!("Sequence {}: secret seed {}", sequence, secret_seed);

        // Example consumption: a loot roll out of 100.
        let mut rng = DeterministicRng::from_secret_seed(&secret_seed);
        info!("Sequence {}: loot roll {}", sequence, rng.next_int(100));
    }

    let seqs = service.sequences().await;
    info!(
        "=== Done: next_request={} next_reveal={} max_depth={} ===",
        seqs.next_request, seqs.next_reveal, seqs.max_depth
    );

    let _ = shutdown_tx.send(());
    oracle_task.await?;
    pump_task.await?;
    Ok(())
}

/// Wait for the next `RandomSeedGenerated` event.
async fn wait_for_input(
    events: &mut broadcast::Receiver<SeedEvent>,
    max_pending_secs: u64,
) -> anyhow::Result<(u64, seedgen::Seed)> {
    let deadline = Duration::from_secs(max_pending_secs.max(1));
    loop {
        let event = tokio::time::timeout(deadline, events.recv())
            .await
            .context("oracle did not answer within its pending window")??;
        if let SeedEvent::RandomSeedGenerated { sequence, input_seed } = event {
            return Ok((sequence, input_seed));
        }
    }
}
