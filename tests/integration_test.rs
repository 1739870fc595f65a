use anyhow::{ensure, Context, Result};
use fidelity_engine::config::{EnhancerConfig, GraphicsConfig};
use fidelity_engine::core::FeatureError;
use fidelity_engine::enhancer::FidelityEnhancer;
use fidelity_engine::features::path_tracing::AUX_PROBE_PREFIX;
use fidelity_engine::features::{FeatureKind, FeatureState};
use fidelity_engine::host::{
    HostEngine, LightKind, ParamKey, ParamValue, RenderParam, SimulatedHost, TextureFilter,
    TextureParam,
};
use fidelity_engine::{QualityTier, UpscalingQuality, VendorFamily};
use glam::Vec3;

fn scene(device: &str) -> SimulatedHost {
    let mut host = SimulatedHost::new(device);
    host.add_light(LightKind::Directional);
    host.add_light(LightKind::Spot);
    host.add_probe("Atrium", Vec3::new(0.0, 3.0, 0.0));
    host
}

fn all_features() -> GraphicsConfig {
    GraphicsConfig {
        enable_ray_tracing: true,
        enable_dlss: true,
        enable_frame_generation: true,
        ..GraphicsConfig::default()
    }
}

#[test]
fn test_rtx_4090_all_features() -> Result<()> {
    let mut host = scene("NVIDIA GeForce RTX 4090");
    let before = host.snapshot();
    let config = GraphicsConfig {
        frame_generation_target_fps: 500,
        ..all_features()
    };

    let mut enhancer = FidelityEnhancer::construct(config, &host);
    ensure!(enhancer.tier() == QualityTier::Hardware, "expected Hardware tier");
    enhancer.activate_after_host_ready(&mut host);

    let params = enhancer
        .path_tracing_params()
        .context("path tracing add-on should be attached")?;
    assert_eq!((params.bounce_count, params.samples_per_pixel), (4, 8));

    let target = enhancer.target_fps().context("frame generation should be enabled")?;
    assert!((60..=240).contains(&target));
    assert_eq!(host.global(RenderParam::TargetFrameRate), ParamValue::Int(target));

    assert_eq!(enhancer.feature_state(FeatureKind::RayTracing), FeatureState::Enabled);
    assert_eq!(enhancer.feature_state(FeatureKind::Upscaling), FeatureState::Enabled);
    assert_eq!(enhancer.feature_state(FeatureKind::FrameGeneration), FeatureState::Enabled);
    assert_eq!(enhancer.feature_state(FeatureKind::PathTracing), FeatureState::Enabled);
    assert!(enhancer.diagnostics().is_empty());

    enhancer.shutdown(&mut host);
    assert!(enhancer.ledger().is_empty());
    assert_eq!(host.snapshot(), before);
    Ok(())
}

#[test]
fn test_intel_uhd_ray_tracing_only() -> Result<()> {
    let mut host = scene("Intel UHD 620");
    let config = GraphicsConfig {
        enable_ray_tracing: true,
        ..GraphicsConfig::default()
    };

    let mut enhancer = FidelityEnhancer::construct(config, &host);
    enhancer.activate_after_host_ready(&mut host);

    assert_eq!(enhancer.capabilities().vendor_family, VendorFamily::Other);
    assert_eq!(enhancer.tier(), QualityTier::Approximation);
    assert_eq!(enhancer.feature_state(FeatureKind::RayTracing), FeatureState::Enabled);
    assert_eq!(enhancer.feature_state(FeatureKind::Upscaling), FeatureState::Unsupported);
    assert_eq!(enhancer.feature_state(FeatureKind::FrameGeneration), FeatureState::Unsupported);

    let params = enhancer
        .path_tracing_params()
        .context("basic path tracing preset expected")?;
    assert_eq!((params.bounce_count, params.samples_per_pixel), (1, 2));

    enhancer.shutdown(&mut host);
    Ok(())
}

#[test]
fn test_ray_tracing_api_without_hardware_runs_software_tier() -> Result<()> {
    let mut host = scene("Intel UHD 620").with_ray_tracing_api(true);
    let before = host.snapshot();

    let mut enhancer = FidelityEnhancer::construct(all_features(), &host);
    enhancer.activate_after_host_ready(&mut host);

    assert_eq!(enhancer.tier(), QualityTier::Software);
    assert_eq!(enhancer.feature_state(FeatureKind::RayTracing), FeatureState::Enabled);
    assert_eq!(enhancer.feature_state(FeatureKind::Upscaling), FeatureState::Unsupported);
    assert_eq!(enhancer.feature_state(FeatureKind::FrameGeneration), FeatureState::Unsupported);

    let params = enhancer
        .path_tracing_params()
        .context("medium path tracing preset expected")?;
    assert_eq!((params.bounce_count, params.samples_per_pixel), (2, 4));

    enhancer.shutdown(&mut host);
    assert_eq!(host.snapshot(), before);
    Ok(())
}

#[test]
fn test_loaded_textures_restored_on_shutdown() -> Result<()> {
    let mut host = scene("NVIDIA GeForce RTX 3070");
    let albedo = host.add_texture("Castle_Wall_Albedo");
    let font = host.add_texture("Roboto Font Atlas");
    let before = host.snapshot();

    let config = GraphicsConfig {
        texture_quality: 2,
        ..GraphicsConfig::default()
    };
    let mut enhancer = FidelityEnhancer::construct(config, &host);
    enhancer.activate_after_host_ready(&mut host);

    let aniso = |id| ParamKey::Texture(id, TextureParam::AnisoLevel);
    assert_eq!(host.read(aniso(albedo))?, ParamValue::Int(8));
    assert_eq!(host.read(aniso(font))?, before[&aniso(font)]);
    assert_eq!(
        host.read(ParamKey::Texture(albedo, TextureParam::FilterMode))?,
        ParamValue::Filter(TextureFilter::Trilinear)
    );

    enhancer.shutdown(&mut host);
    assert_eq!(host.snapshot(), before);
    Ok(())
}

#[test]
fn test_disable_ray_tracing_leaves_upscaling() -> Result<()> {
    let mut host = scene("NVIDIA GeForce RTX 3080");
    let config = GraphicsConfig {
        enable_ray_tracing: true,
        enable_dlss: true,
        upscaling_quality: UpscalingQuality::Quality,
        ..GraphicsConfig::default()
    };

    let mut enhancer = FidelityEnhancer::construct(config, &host);
    enhancer.activate_after_host_ready(&mut host);
    for _ in 0..3 {
        enhancer.on_frame(&mut host, 1.0 / 60.0);
    }
    let upscaling_keys = enhancer.ledger().entries_for(FeatureKind::Upscaling);
    ensure!(!upscaling_keys.is_empty(), "upscaling should hold ledger entries");

    enhancer.set_feature_enabled(&mut host, FeatureKind::RayTracing, false);

    assert!(!enhancer.ledger().holds(FeatureKind::RayTracing));
    assert!(!enhancer.ledger().holds(FeatureKind::PathTracing));
    assert_eq!(enhancer.feature_state(FeatureKind::RayTracing), FeatureState::Disabled);
    assert!(enhancer.path_tracing_params().is_none());
    assert!(host
        .probe_names()
        .iter()
        .all(|name| !name.starts_with(AUX_PROBE_PREFIX)));

    assert_eq!(enhancer.feature_state(FeatureKind::Upscaling), FeatureState::Enabled);
    assert_eq!(enhancer.ledger().entries_for(FeatureKind::Upscaling), upscaling_keys);
    assert_eq!(host.global(RenderParam::RenderScale), ParamValue::Float(0.67));
    assert_eq!(enhancer.tier(), QualityTier::Hardware);

    enhancer.shutdown(&mut host);
    Ok(())
}

#[test]
fn test_destroyed_light_is_skipped_on_restore() -> Result<()> {
    let mut host = SimulatedHost::new("AMD Radeon RX 7800 XT");
    let doomed = host.add_light(LightKind::Point);
    let kept = host.add_light(LightKind::Directional);
    let kept_before = host.read(ParamKey::Light(kept, fidelity_engine::host::LightParam::Shadows))?;

    let config = GraphicsConfig {
        enable_ray_tracing: true,
        ..GraphicsConfig::default()
    };
    let mut enhancer = FidelityEnhancer::construct(config, &host);
    enhancer.activate_after_host_ready(&mut host);

    host.remove_light(doomed);
    enhancer.shutdown(&mut host);

    assert!(enhancer.ledger().is_empty());
    assert_eq!(
        host.read(ParamKey::Light(kept, fidelity_engine::host::LightParam::Shadows))?,
        kept_before
    );
    Ok(())
}

#[test]
fn test_configuring_disabled_upscaling_is_reported() {
    let mut host = scene("NVIDIA GeForce RTX 4080");
    let mut enhancer = FidelityEnhancer::construct(all_features(), &host);
    enhancer.activate_after_host_ready(&mut host);

    enhancer.set_feature_enabled(&mut host, FeatureKind::Upscaling, false);
    assert!(!enhancer.set_upscaling_quality(&mut host, UpscalingQuality::UltraQuality));
    assert!(matches!(
        enhancer.diagnostics().last(),
        Some(FeatureError::PreconditionNotMet { .. })
    ));

    enhancer.set_feature_enabled(&mut host, FeatureKind::Upscaling, true);
    assert!(enhancer.set_upscaling_quality(&mut host, UpscalingQuality::UltraQuality));
    assert_eq!(enhancer.upscaling_render_scale(), Some(0.77));

    enhancer.shutdown(&mut host);
}

#[test]
fn test_config_file_drives_activation() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("fidelity.toml");
    std::fs::write(
        &path,
        r#"
        [Graphics]
        EnableRayTracing = true
        TextureQuality = 3
        RenderScale = 0.75
        "#,
    )?;

    let config = EnhancerConfig::from_toml_file(&path)?;
    let mut host = scene("Intel(R) Arc(TM) A770 Graphics");
    let before = host.snapshot();

    let mut enhancer = FidelityEnhancer::construct(config.graphics, &host);
    enhancer.activate_after_host_ready(&mut host);

    assert_eq!(enhancer.capabilities().vendor_family, VendorFamily::IntelArc);
    assert_eq!(host.global(RenderParam::RenderScale), ParamValue::Float(0.75));
    assert_eq!(host.global(RenderParam::StreamingBudget), ParamValue::Int(4096));

    let status: serde_json::Value = serde_json::from_str(&enhancer.status().to_json()?)?;
    assert_eq!(status["tier"], "Hardware");
    assert_eq!(status["features"]["RenderScale"], "Enabled");

    enhancer.shutdown(&mut host);
    assert_eq!(host.snapshot(), before);
    Ok(())
}
