use fidelity_engine::config::EnhancerConfig;
use fidelity_engine::core::init_logging;
use fidelity_engine::enhancer::FidelityEnhancer;
use fidelity_engine::host::{LightKind, SimulatedHost};
use glam::Vec3;

const DEFAULT_DEVICE: &str = "NVIDIA GeForce RTX 4090";
const DEMO_FRAMES: u32 = 600;

fn main() {
    let mut config = EnhancerConfig::load_or_default();
    config.apply_env_overrides();
    init_logging(&config.logging);

    let device = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("FIDELITY_DEVICE").ok())
        .unwrap_or_else(|| DEFAULT_DEVICE.to_string());

    let mut host = SimulatedHost::new(device)
        .with_ray_tracing_api(true)
        .with_screen(2560, 1440);
    host.add_light(LightKind::Directional);
    host.add_light(LightKind::Point);
    host.add_probe("Atrium", Vec3::new(0.0, 3.0, 0.0));
    for texture in ["Atrium_Floor_Albedo", "Atrium_Floor_Normal", "UI_Crosshair"] {
        host.add_texture(texture);
    }
    let baseline = host.snapshot();

    let mut enhancer = FidelityEnhancer::construct(config.graphics, &host);
    enhancer.activate_after_host_ready(&mut host);
    for _ in 0..DEMO_FRAMES {
        enhancer.on_frame(&mut host, 1.0 / 120.0);
    }

    match enhancer.status().to_json() {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize status: {}", e),
    }

    enhancer.shutdown(&mut host);
    if !enhancer.ledger().is_empty() || host.snapshot() != baseline {
        eprintln!("Host settings were not fully restored");
        std::process::exit(1);
    }
}
